use std::time::{Duration, Instant};

use commune_atlas::{
    AtlasError, Effect, Event, Session,
    effect::{DetailPanel, SearchHit},
    selection::ClickedFeature,
    table::Bucket,
};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    widgets::{ListState, TableState},
};

use crate::map_draw::{MapView, Popup};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel { Search, Map, Table }

/// Komunikat o błędzie, znika po czasie.
#[derive(Clone, Debug)]
pub struct Banner {
    pub message: String,
    pub until: Instant,
}

pub struct AppState {
    pub session: Session,
    pub map: MapView,
    pub active_panel: Panel,
    pub search_text: String,
    /// `None`: lista wyników schowana.
    pub search_results: Option<Vec<SearchHit>>,
    /// Kursor i przewinięcie listy wyników, zachowane między klatkami.
    pub results_state: ListState,
    pub detail: Option<DetailPanel>,
    pub popup: Option<Popup>,
    pub table_visible: bool,
    pub table_state: TableState,
    pub banner: Option<Banner>,
    pub show_help: bool,
    /// Obszary z ostatniej klatki, do obsługi myszy.
    pub results_area: Option<Rect>,
    pub table_area: Option<Rect>,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "\
Tab: zmiana panelu (szukaj → mapa → tabela)
Szukaj: wpisz nazwę, ↑/↓ + Enter wybiera
Mapa: strzałki przesuwają, +/- przybliża,
  Enter wybiera gminę w środku, Esc zamyka panel
Tabela: t pokazuje/chowa, 1-4 filtry, Enter wybiera
Mysz: klik na gminie, wyniku lub wierszu
?: pomoc, q: wyjście";

    pub fn new(session: Session, initial: Vec<Effect>) -> Self {
        let map = MapView::new(&session);
        tracing::info!(shapes = map.feature_count(), "Map ready");
        let mut state = Self {
            session,
            map,
            active_panel: Panel::Search,
            search_text: String::new(),
            search_results: None,
            results_state: ListState::default(),
            detail: None,
            popup: None,
            table_visible: false,
            table_state: TableState::default(),
            banner: None,
            show_help: false,
            results_area: None,
            table_area: None,
        };
        state.apply(initial);
        state
    }

    /// Wykonuje polecenia sesji na mapie i w interfejsie.
    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Highlight(id) => self.map.set_highlight(Some(id)),
                Effect::ClearHighlight => self.map.set_highlight(None),
                Effect::OpenDetailPanel(panel) => self.detail = Some(panel),
                Effect::CloseDetailPanel => self.detail = None,
                Effect::PanTo { center, zoom, duration } => self.map.fly_to(center, zoom, duration),
                Effect::FitBounds { bounds, padding, max_zoom } => {
                    self.map.fit_bounds(bounds, padding, max_zoom)
                }
                Effect::ShowPopup { at, label } => self.popup = Some(Popup { at, label }),
                Effect::ClosePopup => self.popup = None,
                Effect::ShowSearchResults(hits) => {
                    self.results_state = ListState::default().with_selected(Some(0));
                    self.search_results = Some(hits);
                }
                Effect::HideSearchResults => self.search_results = None,
                Effect::SetSearchText(text) => self.search_text = text,
                Effect::ShowTable { .. } => {
                    self.table_visible = true;
                    self.table_state.select(Some(0));
                }
                Effect::DismissTable => {
                    self.table_visible = false;
                    if self.active_panel == Panel::Table {
                        self.active_panel = Panel::Map;
                    }
                }
                Effect::ShowError { message, dismiss_after } => self.show_banner(message, dismiss_after),
            }
        }
    }

    pub fn show_banner(&mut self, message: String, dismiss_after: Duration) {
        self.banner = Some(Banner { message, until: Instant::now() + dismiss_after });
    }

    /// Przekazuje zdarzenie do sesji; odrzucony wybór kończy się banerem.
    pub fn dispatch(&mut self, event: Event) {
        match self.session.handle(event) {
            Ok(effects) => self.apply(effects),
            Err(err @ AtlasError::UnknownFeature(_)) => {
                let banner = Effect::error(&err, &self.session.config().ui);
                self.apply(vec![banner]);
            }
            Err(err) => {
                tracing::error!(error = %err, "Unexpected engine error");
                let banner = Effect::error(&err, &self.session.config().ui);
                self.apply(vec![banner]);
            }
        }
    }

    /// Wywoływane w każdej iteracji pętli.
    pub fn tick(&mut self, now: Instant) {
        if self.session.has_pending_query() {
            self.dispatch(Event::Tick(now));
        }
        if self.banner.as_ref().is_some_and(|b| now >= b.until) {
            self.banner = None;
        }
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        use KeyCode::*;
        if modifiers.contains(KeyModifiers::CONTROL) && key == Char('c') {
            return true;
        }
        if key == Tab {
            self.active_panel = match self.active_panel {
                Panel::Search => Panel::Map,
                Panel::Map if self.table_visible => Panel::Table,
                Panel::Map | Panel::Table => Panel::Search,
            };
            return false;
        }
        if self.show_help {
            self.show_help = false;
            return false;
        }

        match self.active_panel {
            Panel::Search => self.search_key(key),
            Panel::Map => return self.map_key(key),
            Panel::Table => return self.table_key(key),
        }
        false
    }

    fn search_key(&mut self, key: KeyCode) {
        use KeyCode::*;
        match key {
            Char(c) => {
                self.search_text.push(c);
                self.search_changed();
            }
            Backspace => {
                self.search_text.pop();
                self.search_changed();
            }
            Up => {
                let i = self.results_state.selected().unwrap_or(0);
                self.results_state.select(Some(i.saturating_sub(1)));
            }
            Down => {
                let len = self.search_results.as_ref().map_or(0, Vec::len);
                let i = self.results_state.selected().map_or(0, |i| i + 1);
                if i < len {
                    self.results_state.select(Some(i));
                }
            }
            Enter => {
                if let Some(i) = self.results_state.selected() {
                    self.pick_search_result(i);
                }
            }
            Esc => {
                self.dispatch(Event::SearchDismissed);
                self.active_panel = Panel::Map;
            }
            _ => {}
        }
    }

    fn search_changed(&mut self) {
        self.dispatch(Event::SearchInput {
            text: self.search_text.clone(),
            at: Instant::now(),
        });
    }

    fn pick_search_result(&mut self, index: usize) {
        let id = self
            .search_results
            .as_ref()
            .and_then(|hits| hits.get(index))
            .map(|hit| hit.id.clone());
        if let Some(id) = id {
            self.dispatch(Event::SearchResultPicked(id));
        }
    }

    fn map_key(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Char('?') => self.show_help = true,
            Char('t') => self.toggle_table(),
            Char('/') => self.active_panel = Panel::Search,
            Left => self.map.pan(-0.1, 0.0),
            Right => self.map.pan(0.1, 0.0),
            Up => self.map.pan(0.0, 0.1),
            Down => self.map.pan(0.0, -0.1),
            Char('+') | Char('=') => self.map.zoom_by(1.0),
            Char('-') => self.map.zoom_by(-1.0),
            Enter => {
                if let Some(center) = self.map.center() {
                    self.click_map(center);
                }
            }
            Esc => self.dispatch(Event::DetailPanelClosed),
            _ => {}
        }
        false
    }

    fn table_key(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        let len = self.session.visible_rows().len();
        match key {
            Char('q') => return true,
            Char('?') => self.show_help = true,
            Char('t') | Esc => self.toggle_table(),
            Char(c @ '1'..='4') => {
                let index = (c as usize) - ('1' as usize);
                self.dispatch(Event::FilterChanged(Bucket::ALL[index]));
            }
            Up => {
                let i = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(i.saturating_sub(1)));
            }
            Down => {
                let i = self.table_state.selected().map_or(0, |i| i + 1);
                if i < len {
                    self.table_state.select(Some(i));
                }
            }
            Enter => {
                if let Some(i) = self.table_state.selected() {
                    self.pick_row(i);
                }
            }
            _ => {}
        }
        false
    }

    fn toggle_table(&mut self) {
        if self.table_visible {
            self.apply(vec![Effect::DismissTable]);
        } else {
            self.dispatch(Event::FilterChanged(self.session.table_filter()));
            self.active_panel = Panel::Table;
        }
    }

    fn pick_row(&mut self, index: usize) {
        let id = self.session.visible_rows().get(index).map(|r| r.id.clone());
        if let Some(id) = id {
            self.dispatch(Event::RowPicked(id));
        }
    }

    /// Kliknięcie w punkt mapy: gmina pod kursorem albo tło.
    fn click_map(&mut self, at: geo::Coord<f64>) {
        let hit = self
            .map
            .feature_at(at)
            .map(|(id, name)| ClickedFeature { id: id.to_string(), name: name.to_string() });
        self.dispatch(Event::MapClick { hit, at });
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let MouseEventKind::Down(MouseButton::Left) = mouse.kind else {
            return;
        };
        let (column, row) = (mouse.column, mouse.row);

        if let Some(area) = self.results_area.filter(|a| contains(*a, column, row)) {
            // Górna ramka zajmuje jeden wiersz.
            if self.search_results.is_some() && row > area.y {
                let index = self.results_state.offset() + usize::from(row - area.y - 1);
                self.results_state.select(Some(index));
                self.pick_search_result(index);
                return;
            }
        }
        if let Some(area) = self.table_area.filter(|a| contains(*a, column, row)) {
            // Ramka i nagłówek zajmują dwa wiersze.
            if self.table_visible && row > area.y + 1 {
                let index = self.table_state.offset() + usize::from(row - area.y - 2);
                self.table_state.select(Some(index));
                self.pick_row(index);
            }
            return;
        }
        if let Some(at) = self.map.screen_to_lnglat(column, row) {
            self.active_panel = Panel::Map;
            self.click_map(at);
        } else if self.search_results.is_some() {
            self.dispatch(Event::SearchDismissed);
        }
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}
