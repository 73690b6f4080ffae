//! Silnik mapy gmin: geometria, wyszukiwarka, automat wyboru i tabela.

pub mod config;
pub mod data;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod search;
pub mod selection;
pub mod session;
pub mod table;

pub use config::Config;
pub use data::{Feature, FeatureSet};
pub use effect::Effect;
pub use error::AtlasError;
pub use session::{Event, Session};
