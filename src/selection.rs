//! Automat wyboru: co najwyżej jedna gmina wybrana naraz.
//!
//! Funkcje przyjmują bieżący stan i zwracają nowy razem z poleceniami dla
//! mapy i interfejsu. Odrzucone przejście nie zmienia stanu.

use std::time::Duration;

use geo::Coord;

use crate::{
    data::{Feature, FeatureSet},
    effect::{DetailPanel, Effect},
    error::AtlasError,
    geometry,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(String),
}

impl SelectionState {
    pub fn selected_id(&self) -> Option<&str> {
        match self {
            SelectionState::Selected(id) => Some(id),
            SelectionState::Unselected => None,
        }
    }
}

/// Dokąd i jak szybko lecieć po wyborze z wyszukiwarki lub tabeli.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recenter {
    pub zoom: f64,
    pub duration: Duration,
}

/// Gmina widoczna pod kursorem w chwili kliknięcia.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickedFeature {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: SelectionState,
    pub effects: Vec<Effect>,
}

fn detail_panel(feature: &Feature) -> DetailPanel {
    DetailPanel {
        id: feature.id.clone(),
        name: feature.name.clone(),
        attributes: feature.attributes.clone(),
    }
}

fn lookup<'a>(features: &'a FeatureSet, id: &str) -> Result<&'a Feature, AtlasError> {
    features
        .get(id)
        .ok_or_else(|| AtlasError::UnknownFeature(id.to_string()))
}

/// Wybór po identyfikatorze (wyszukiwarka, tabela).
///
/// Zamyka dymek z poprzedniego kliknięcia, żeby nie opisywał innej gminy.
pub fn select_by_id(
    features: &FeatureSet,
    id: &str,
    recenter: Option<Recenter>,
) -> Result<Transition, AtlasError> {
    let feature = lookup(features, id)?;
    let mut effects = vec![
        Effect::ClosePopup,
        Effect::Highlight(feature.id.clone()),
        Effect::OpenDetailPanel(detail_panel(feature)),
    ];
    if let Some(r) = recenter {
        effects.push(Effect::PanTo {
            center: geometry::geometry_centroid(&feature.geometry)?,
            zoom: r.zoom,
            duration: r.duration,
        });
    }
    Ok(Transition {
        state: SelectionState::Selected(feature.id.clone()),
        effects,
    })
}

/// Kliknięcie w wielokąt na mapie: dymek z nazwą w miejscu kliknięcia.
pub fn select_from_map_click(
    features: &FeatureSet,
    clicked: &ClickedFeature,
    at: Coord<f64>,
) -> Result<Transition, AtlasError> {
    let feature = lookup(features, &clicked.id)?;
    Ok(Transition {
        state: SelectionState::Selected(feature.id.clone()),
        effects: vec![
            Effect::ShowPopup { at, label: feature.name.clone() },
            Effect::Highlight(feature.id.clone()),
            Effect::OpenDetailPanel(detail_panel(feature)),
        ],
    })
}

/// Kliknięcie w tło mapy, poza wszystkimi gminami.
pub fn click_background() -> Transition {
    Transition {
        state: SelectionState::Unselected,
        effects: vec![Effect::CloseDetailPanel, Effect::ClearHighlight, Effect::ClosePopup],
    }
}

/// Jawne zamknięcie panelu szczegółów.
pub fn close_detail_panel() -> Transition {
    Transition {
        state: SelectionState::Unselected,
        effects: vec![Effect::ClearHighlight, Effect::ClosePopup],
    }
}
