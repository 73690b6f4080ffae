//! Logi do pliku. Terminal należy do interfejsu, więc nie ma wyjścia na stdout.
//!
//! Poziom ustawia zmienna `RUST_LOG` (domyślnie `info`).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "commune-atlas.log";

/// Trzeba go trzymać do końca programu; upuszczenie zamyka plik logu.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Zakłada katalog i czyści plik logu z poprzedniej sesji.
fn reset_log_file(log_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    fs::write(&path, "")?;
    Ok(path)
}

/// Czyści poprzedni plik logu i ustawia globalny subskrybent.
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuard, io::Error> {
    reset_log_file(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard { _file_guard: file_guard })
}
