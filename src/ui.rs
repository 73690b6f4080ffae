use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
};
use serde_json::Value;

use crate::state::{AppState, Panel};

fn panel_block(title: &str, active: bool) -> Block<'static> {
    let style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title.to_string())
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let (main, table) = if state.table_visible {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(f.area());
        (rows[0], Some(rows[1]))
    } else {
        (f.area(), None)
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(main);

    draw_search(f, state, chunks[0]);

    // Środek: mapa
    let title = match state.map.highlight().and_then(|id| state.session.features().get(id)) {
        Some(feature) => format!("Mapa – {}", feature.name),
        None => format!("Mapa – {} gmin", state.map.feature_count()),
    };
    let popup = state.popup.clone();
    state.map.render(f, chunks[1], &title, popup.as_ref());

    draw_detail(f, state, chunks[2]);

    state.table_area = table;
    if let Some(area) = table {
        draw_table(f, state, area);
    }

    if state.show_help {
        draw_help(f);
    }
    if let Some(banner) = &state.banner {
        draw_banner(f, &banner.message);
    }
}

fn draw_search(f: &mut Frame, state: &mut AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let active = state.active_panel == Panel::Search;
    let cursor = if active { "▏" } else { "" };
    let input = Paragraph::new(format!("{}{}", state.search_text, cursor))
        .block(panel_block("Szukaj gminy", active));
    f.render_widget(input, parts[0]);

    state.results_area = Some(parts[1]);
    match &state.search_results {
        Some(hits) if hits.is_empty() => {
            let empty = Paragraph::new("Nie znaleziono gminy")
                .style(Style::default().fg(Color::DarkGray))
                .block(panel_block("Wyniki", false));
            f.render_widget(empty, parts[1]);
        }
        Some(hits) => {
            let items: Vec<ListItem> = hits.iter().map(|h| ListItem::new(h.name.clone())).collect();
            let list = List::new(items)
                .block(panel_block("Wyniki", false))
                .highlight_symbol(">> ")
                .highlight_style(Style::default().fg(Color::Red));
            f.render_stateful_widget(list, parts[1], &mut state.results_state);
        }
        None => {
            let hint = Paragraph::new("Wpisz co najmniej dwa znaki")
                .style(Style::default().fg(Color::DarkGray))
                .block(panel_block("Wyniki", false))
                .wrap(Wrap { trim: true });
            f.render_widget(hint, parts[1]);
        }
    }
}

fn format_attribute(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "–".to_string(),
        other => other.to_string(),
    }
}

fn draw_detail(f: &mut Frame, state: &AppState, area: Rect) {
    let Some(detail) = &state.detail else {
        let info = Paragraph::new(format!(
            "{} gmin\n\nKliknij gminę na mapie lub wyszukaj ją po nazwie.\n\n?: pomoc",
            state.session.features().len()
        ))
        .block(panel_block("Informacje", false))
        .wrap(Wrap { trim: true });
        f.render_widget(info, area);
        return;
    };

    let metric_field = &state.session.config().data.metric_field;
    let mut lines = vec![
        Line::from(Span::styled(detail.name.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!("Kod: {}", detail.id)),
    ];
    if let Some(seconds) = state.session.features().get(&detail.id).and_then(|f| f.number(metric_field)) {
        lines.push(Line::from(format!("Dojazd: {:.0} min", seconds / 60.0)));
    }
    lines.push(Line::from(""));
    for (key, value) in &detail.attributes {
        if key == metric_field {
            continue;
        }
        lines.push(Line::from(format!("{key}: {}", format_attribute(value))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc: zamknij", Style::default().fg(Color::DarkGray))));

    let panel = Paragraph::new(lines)
        .block(panel_block("Informacje", false))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn draw_table(f: &mut Frame, state: &mut AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let thresholds = state.session.thresholds();
    let counts = state.session.bucket_counts();
    let titles: Vec<String> = commune_atlas::table::Bucket::ALL
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{} {} ({})", i + 1, b.label(thresholds), counts.get(*b)))
        .collect();
    let active_filter = state.session.table_filter();
    let selected_tab = commune_atlas::table::Bucket::ALL
        .iter()
        .position(|b| *b == active_filter)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(tabs, parts[0]);

    let label_header = state.session.config().data.label_field.clone();
    let rows: Vec<Row> = state
        .session
        .visible_rows()
        .into_iter()
        .map(|r| {
            let minutes = if r.metric.is_finite() {
                format!("{:.0} min", r.metric / 60.0)
            } else {
                "–".to_string()
            };
            Row::new(vec![
                Cell::from(r.name.clone()),
                Cell::from(r.secondary_label.clone()),
                Cell::from(minutes),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Percentage(50), Constraint::Percentage(30), Constraint::Percentage(20)],
    )
    .header(Row::new(vec!["Gmina".to_string(), label_header, "Dojazd".to_string()])
        .style(Style::default().add_modifier(Modifier::BOLD)))
    .block(panel_block("Tabela", state.active_panel == Panel::Table))
    .row_highlight_style(Style::default().fg(Color::Red))
    .highlight_symbol(">> ");
    f.render_stateful_widget(table, parts[1], &mut state.table_state);
    state.table_area = Some(parts[1]);
}

fn centered(f: &Frame, width: u16, height: u16) -> Rect {
    let area = f.area();
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(area.x + (area.width - w) / 2, area.y + (area.height - h) / 2, w, h)
}

fn draw_help(f: &mut Frame) {
    let area = centered(f, 60, 11);
    let help = Paragraph::new(AppState::HELP_TEXT)
        .block(Block::default().borders(Borders::ALL).title("Pomoc"))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

pub fn draw_banner(f: &mut Frame, message: &str) {
    let full = f.area();
    let area = Rect::new(full.x, full.y, full.width, 3.min(full.height));
    let banner = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Błąd"))
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(banner, area);
}

/// Ekran na czas wczytywania danych.
pub fn draw_loading(f: &mut Frame, path: &str) {
    let area = centered(f, 50, 3);
    let loading = Paragraph::new(format!("Wczytywanie {path}…"))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Mapa gmin"));
    f.render_widget(loading, area);
}
