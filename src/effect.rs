//! Polecenia dla warstwy mapy i interfejsu, wynik każdego przejścia sesji.

use std::time::Duration;

use geo::{Coord, Rect};
use serde_json::{Map, Value};

use crate::{
    config::{Padding, UiSettings},
    error::AtlasError,
    table::Bucket,
};

/// Zawartość panelu szczegółów.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailPanel {
    pub id: String,
    pub name: String,
    pub attributes: Map<String, Value>,
}

/// Trafienie wyszukiwarki gotowe do pokazania na liście.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Zastępuje filtr podświetlenia jednym id.
    Highlight(String),
    ClearHighlight,
    OpenDetailPanel(DetailPanel),
    CloseDetailPanel,
    PanTo {
        center: Coord<f64>,
        zoom: f64,
        duration: Duration,
    },
    FitBounds {
        bounds: Rect<f64>,
        padding: Padding,
        max_zoom: f64,
    },
    ShowPopup {
        at: Coord<f64>,
        label: String,
    },
    ClosePopup,
    /// Pusta lista oznacza komunikat "brak wyników".
    ShowSearchResults(Vec<SearchHit>),
    HideSearchResults,
    SetSearchText(String),
    ShowTable {
        filter: Bucket,
    },
    DismissTable,
    ShowError {
        message: String,
        dismiss_after: Duration,
    },
}

impl Effect {
    /// Baner z błędem, znikający po czasie z konfiguracji.
    pub fn error(err: &AtlasError, ui: &UiSettings) -> Self {
        Effect::ShowError {
            message: err.to_string(),
            dismiss_after: ui.error_banner(),
        }
    }
}
