//! Stan sesji i jedyny punkt wejścia dla zdarzeń: [`Session::handle`].
//!
//! Zdarzenia są obsługiwane po kolei, każde do końca. Wynikiem jest lista
//! poleceń dla adaptera mapy i interfejsu.

use std::{collections::HashMap, time::Instant};

use geo::Coord;

use crate::{
    config::Config,
    data::FeatureSet,
    effect::{Effect, SearchHit},
    error::AtlasError,
    search::SearchIndex,
    selection::{self, ClickedFeature, Recenter, SelectionState, Transition},
    table::{self, AttributeSelector, Bucket, BucketCounts, TableRow, Thresholds},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Zmiana tekstu w polu wyszukiwania; zapytanie czeka na koniec opóźnienia.
    SearchInput { text: String, at: Instant },
    /// Upływ czasu, uruchamia zaległe zapytanie.
    Tick(Instant),
    SearchResultPicked(String),
    SearchDismissed,
    MapClick {
        hit: Option<ClickedFeature>,
        at: Coord<f64>,
    },
    DetailPanelClosed,
    RowPicked(String),
    FilterChanged(Bucket),
}

#[derive(Clone, Debug)]
struct PendingQuery {
    text: String,
    due: Instant,
}

pub struct Session {
    config: Config,
    features: FeatureSet,
    index: SearchIndex,
    rows: Vec<TableRow>,
    /// id gminy → pozycja w `rows`.
    row_index: HashMap<String, usize>,
    thresholds: Thresholds,
    selection: SelectionState,
    table_filter: Bucket,
    pending: Option<PendingQuery>,
}

impl Session {
    /// Wczytuje dane z pliku z konfiguracji. Błąd kończy sesję.
    pub fn load(config: Config) -> Result<(Self, Vec<Effect>), AtlasError> {
        let features = FeatureSet::load(&config.data.geojson_path, &config.data)?;
        Ok(Self::from_features(features, config))
    }

    /// Buduje indeks i tabelę; pierwszym poleceniem jest dopasowanie widoku.
    pub fn from_features(features: FeatureSet, config: Config) -> (Self, Vec<Effect>) {
        let index = SearchIndex::build(&features, &config.search);
        let selector = AttributeSelector::new(&config.data);
        let rows = table::project(features.iter(), |f| selector.select(f));
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let thresholds = Thresholds::from(config.table.thresholds);

        let effects = vec![Effect::FitBounds {
            bounds: features.bounds(),
            padding: config.map.fit_padding,
            max_zoom: config.map.fit_max_zoom,
        }];
        tracing::info!(features = features.len(), "Session ready");

        let session = Self {
            config,
            features,
            index,
            rows,
            row_index,
            thresholds,
            selection: SelectionState::Unselected,
            table_filter: Bucket::All,
            pending: None,
        };
        (session, effects)
    }

    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, AtlasError> {
        tracing::trace!(?event, "Handling event");
        match event {
            Event::SearchInput { text, at } => {
                // Nowy tekst zastępuje zaległe zapytanie.
                self.pending = Some(PendingQuery {
                    text,
                    due: at + self.config.search.debounce(),
                });
                Ok(Vec::new())
            }
            Event::Tick(now) => Ok(self.run_due_query(now)),
            Event::SearchResultPicked(id) => {
                let mut effects = self.apply(selection::select_by_id(
                    &self.features,
                    &id,
                    Some(self.recenter()),
                ))?;
                effects.push(Effect::HideSearchResults);
                if let Some(f) = self.features.get(&id) {
                    effects.push(Effect::SetSearchText(f.name.clone()));
                }
                Ok(effects)
            }
            Event::SearchDismissed => Ok(vec![Effect::HideSearchResults]),
            Event::MapClick { hit: Some(clicked), at } => {
                self.apply(selection::select_from_map_click(&self.features, &clicked, at))
            }
            Event::MapClick { hit: None, .. } => self.apply(Ok(selection::click_background())),
            Event::DetailPanelClosed => self.apply(Ok(selection::close_detail_panel())),
            Event::RowPicked(id) => self.pick_row(&id),
            Event::FilterChanged(bucket) => {
                self.table_filter = bucket;
                tracing::debug!(?bucket, "Table filter changed");
                Ok(vec![Effect::ShowTable { filter: bucket }])
            }
        }
    }

    /// Kliknięcie wiersza tabeli: wybór z przelotem i schowanie tabeli.
    pub fn pick_row(&mut self, id: &str) -> Result<Vec<Effect>, AtlasError> {
        let mut effects = self.apply(selection::select_by_id(
            &self.features,
            id,
            Some(self.recenter()),
        ))?;
        effects.push(Effect::DismissTable);
        Ok(effects)
    }

    fn recenter(&self) -> Recenter {
        Recenter {
            zoom: self.config.map.selected_zoom,
            duration: self.config.map.fly_duration(),
        }
    }

    fn apply(&mut self, transition: Result<Transition, AtlasError>) -> Result<Vec<Effect>, AtlasError> {
        match transition {
            Ok(t) => {
                tracing::debug!(from = ?self.selection, to = ?t.state, "Selection transition");
                self.selection = t.state;
                Ok(t.effects)
            }
            Err(e) => {
                tracing::warn!(error = %e, selection = ?self.selection, "Transition rejected");
                Err(e)
            }
        }
    }

    fn run_due_query(&mut self, now: Instant) -> Vec<Effect> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.due);
        if !due {
            return Vec::new();
        }
        let Some(PendingQuery { text, .. }) = self.pending.take() else {
            return Vec::new();
        };
        if self.index.is_too_short(&text) {
            return vec![Effect::HideSearchResults];
        }
        let hits: Vec<SearchHit> = self
            .index
            .query(&text)
            .into_iter()
            .map(|e| SearchHit { id: e.id.clone(), name: e.display_name.clone() })
            .collect();
        tracing::debug!(query = %text, hits = hits.len(), "Search executed");
        vec![Effect::ShowSearchResults(hits)]
    }

    pub fn has_pending_query(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn table_filter(&self) -> Bucket {
        self.table_filter
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Wszystkie wiersze, posortowane.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Wiersze po zastosowaniu aktywnego filtra.
    pub fn visible_rows(&self) -> Vec<&TableRow> {
        table::filter(&self.rows, self.table_filter, self.thresholds)
    }

    pub fn bucket_counts(&self) -> BucketCounts {
        table::bucket_counts(&self.rows, self.thresholds)
    }

    /// Kubełek gminy, do kolorowania mapy.
    pub fn bucket_of(&self, id: &str) -> Option<Bucket> {
        self.row_index
            .get(id)
            .and_then(|&i| self.rows.get(i))
            .map(|r| Bucket::classify(r.metric, self.thresholds))
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
