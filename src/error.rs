use std::path::PathBuf;

use thiserror::Error;

/// Błędy silnika: ładowanie danych, geometria, wybór obiektu.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Nie udało się wczytać zbioru gmin. Błąd kończy sesję.
    #[error("Nie udało się wczytać danych: {0}")]
    LoadFailure(#[from] LoadError),

    /// Uszkodzona struktura współrzędnych.
    #[error("Nieprawidłowa geometria: {0}")]
    InvalidGeometry(String),

    /// Operacja odwołuje się do nieistniejącego identyfikatora.
    #[error("Nieznana gmina: {0}")]
    UnknownFeature(String),

    #[error("Pusty zbiór obiektów, brak zasięgu do wyliczenia")]
    EmptyFeatureSet,
}

/// Szczegóły błędu ładowania pliku GeoJSON.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("nie można odczytać {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("niepoprawny GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    #[error("dokument nie jest kolekcją obiektów (FeatureCollection)")]
    NotFeatureCollection,

    #[error("plik GeoJSON nie zawiera żadnej gminy")]
    Empty,

    #[error("obiekt nr {index} nie ma pola `{field}`")]
    MissingField { index: usize, field: String },

    #[error("gmina {id} nie ma geometrii")]
    MissingGeometry { id: String },

    #[error("zduplikowany identyfikator: {0}")]
    DuplicateId(String),

    #[error("gmina {id}: {reason}")]
    InvalidGeometry { id: String, reason: String },
}

/// Błędy pliku konfiguracyjnego.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("nie można odczytać konfiguracji {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("niepoprawny plik konfiguracyjny: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("niepoprawna wartość {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
