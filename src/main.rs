mod ui;
mod state;
mod map_draw;

use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use commune_atlas::{Config, Effect, Session, logging};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use state::AppState;

/// Interaktywna mapa gmin z wyszukiwarką i tabelą czasów dojazdu.
#[derive(Parser, Debug)]
#[command(name = "commune-atlas", version, about)]
struct Cli {
    /// Plik konfiguracyjny JSON (brak pliku = wartości domyślne)
    #[arg(long, default_value = "atlas.json")]
    config: PathBuf,

    /// Plik GeoJSON z gminami, nadpisuje `data.geojson_path`
    #[arg(long)]
    data: Option<PathBuf>,

    /// Katalog na plik logu
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(&cli.log_dir)?;

    let mut config = Config::load_from(&cli.config)?;
    if let Some(path) = cli.data {
        config.data.geojson_path = path;
    }
    tracing::info!(data = %config.data.geojson_path.display(), "Starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "Session aborted");
    }
    result
}

fn run(terminal: &mut Term, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.data.geojson_path.display().to_string();
    terminal.draw(|f| ui::draw_loading(f, &path))?;

    let ui_settings = config.ui.clone();
    let (session, initial) = match Session::load(config) {
        Ok(loaded) => loaded,
        Err(err) => {
            // Bez ponawiania: baner, a potem koniec sesji.
            if let Effect::ShowError { message, dismiss_after } = Effect::error(&err, &ui_settings) {
                show_fatal(terminal, &message, dismiss_after)?;
            }
            return Err(err.into());
        }
    };

    let mut state = AppState::new(session, initial);
    loop {
        state.tick(Instant::now());
        terminal.draw(|f| ui::draw(f, &mut state))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) => {
                    if state.handle_input(code, modifiers) {
                        break;
                    }
                }
                Event::Mouse(mouse) => state.handle_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Pokazuje baner błędu do upływu czasu albo naciśnięcia klawisza.
fn show_fatal(terminal: &mut Term, message: &str, dismiss_after: Duration) -> io::Result<()> {
    let until = Instant::now() + dismiss_after;
    while Instant::now() < until {
        terminal.draw(|f| ui::draw_banner(f, message))?;
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(_) = event::read()? {
                break;
            }
        }
    }
    Ok(())
}
