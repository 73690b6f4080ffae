//! Ustawienia aplikacji: wartości domyślne + opcjonalny plik JSON.
//!
//! Brakujące sekcje i pola przyjmują wartości domyślne, więc pusty plik `{}`
//! daje tę samą konfigurację co brak pliku.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataSettings,
    pub map: MapSettings,
    pub search: SearchSettings,
    pub table: TableSettings,
    pub ui: UiSettings,
}

/// Skąd brać dane i jak nazywają się pola w `properties`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub geojson_path: PathBuf,
    pub id_field: String,
    pub name_field: String,
    /// Czas dojazdu w sekundach, klucz kolorowania i tabeli.
    pub metric_field: String,
    /// Druga kolumna tabeli (np. cena za m²).
    pub label_field: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            geojson_path: PathBuf::from("accessibility_work.geojson"),
            id_field: "ID".into(),
            name_field: "NOM".into(),
            metric_field: "travel_time_s".into(),
            label_field: "prix_m2_appartement".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self { top: 50.0, bottom: 50.0, left: 30.0, right: 30.0 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapSettings {
    /// `[lon, lat]` przed dopasowaniem widoku do danych.
    pub initial_center: [f64; 2],
    pub initial_zoom: f64,
    pub selected_zoom: f64,
    pub fly_duration_ms: u64,
    pub fit_padding: Padding,
    pub fit_max_zoom: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_center: [2.3, 47.0],
            initial_zoom: 8.0,
            selected_zoom: 12.0,
            fly_duration_ms: 1500,
            fit_padding: Padding::default(),
            fit_max_zoom: 10.0,
        }
    }
}

impl MapSettings {
    pub fn fly_duration(&self) -> Duration {
        Duration::from_millis(self.fly_duration_ms)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub min_query_chars: usize,
    pub max_results: usize,
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { min_query_chars: 2, max_results: 10, debounce_ms: 200 }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableSettings {
    /// Progi kubełków w sekundach: `<= low`, `(low, high]`, `> high`.
    pub thresholds: [f64; 2],
}

impl Default for TableSettings {
    fn default() -> Self {
        Self { thresholds: [600.0, 1200.0] }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub error_banner_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self { error_banner_ms: 5000 }
    }
}

impl UiSettings {
    pub fn error_banner(&self) -> Duration {
        Duration::from_millis(self.error_banner_ms)
    }
}

impl Config {
    /// Wczytuje konfigurację; brak pliku oznacza wartości domyślne.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [low, high] = self.table.thresholds;
        if !(low <= high) {
            return Err(ConfigError::InvalidValue {
                key: "table.thresholds".into(),
                reason: format!("próg dolny {low} większy od górnego {high}"),
            });
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::InvalidValue {
                key: "search.max_results".into(),
                reason: "musi być większe od zera".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("atlas.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.min_query_chars, 2);
        assert_eq!(config.map.selected_zoom, 12.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data": {{ "name_field": "nom" }}, "table": {{ "thresholds": [300, 900] }} }}"#)
            .unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.data.name_field, "nom");
        assert_eq!(config.data.id_field, "ID");
        assert_eq!(config.table.thresholds, [300.0, 900.0]);
        assert_eq!(config.ui, UiSettings::default());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "table": {{ "thresholds": [1200, 600] }} }}"#).unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "table.thresholds"));
    }
}
