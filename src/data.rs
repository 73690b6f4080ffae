use std::{
    collections::HashMap,
    fs,
    path::Path,
    str::FromStr,
};

use geo::{Geometry, Rect};
use geojson::{GeoJson, feature::Id};
use serde_json::{Map, Value};

use crate::{
    config::DataSettings,
    error::{AtlasError, LoadError},
    geometry::{self, FeatureGeometry},
};

/// Gmina: niezmienny rekord wczytany przy starcie.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub geometry: FeatureGeometry,
    /// Pozostałe pola z `properties`, przekazywane dalej bez interpretacji.
    pub attributes: Map<String, Value>,
}

/// Przedział cen zapisany w danych jako `"min;max"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl FromStr for PriceRange {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(';') {
            Some((min, max)) => Ok(Self {
                min: min.trim().parse()?,
                max: max.trim().parse()?,
            }),
            None => {
                let value = s.trim().parse()?;
                Ok(Self { min: value, max: value })
            }
        }
    }
}

impl Feature {
    /// Wartość liczbowa; akceptuje liczby i napisy z liczbą.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.attributes.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).and_then(Value::as_str)
    }

    pub fn price_range(&self, field: &str) -> Option<PriceRange> {
        match self.attributes.get(field)? {
            Value::Number(n) => n.as_f64().map(|v| PriceRange { min: v, max: v }),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Zbiór gmin, tylko do odczytu po wczytaniu.
#[derive(Debug)]
pub struct FeatureSet {
    features: Vec<Feature>,
    by_id: HashMap<String, usize>,
    bounds: Rect<f64>,
}

impl FeatureSet {
    pub fn load<P: AsRef<Path>>(path: P, settings: &DataSettings) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw = GeoJson::from_str(&txt).map_err(LoadError::from)?;
        let set = Self::from_geojson(raw, settings)?;
        tracing::info!(path = %path.display(), count = set.len(), "Loaded feature set");
        Ok(set)
    }

    pub fn from_geojson(raw: GeoJson, settings: &DataSettings) -> Result<Self, AtlasError> {
        let GeoJson::FeatureCollection(fc) = raw else {
            return Err(LoadError::NotFeatureCollection.into());
        };
        if fc.features.is_empty() {
            return Err(LoadError::Empty.into());
        }

        let mut features = Vec::with_capacity(fc.features.len());
        for (index, feature) in fc.features.into_iter().enumerate() {
            let mut attributes = feature.properties.unwrap_or_default();

            let id = match attributes.get(&settings.id_field) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => match &feature.id {
                    Some(Id::String(s)) => Some(s.clone()),
                    Some(Id::Number(n)) => Some(n.to_string()),
                    None => None,
                },
            }
            .ok_or_else(|| LoadError::MissingField {
                index,
                field: settings.id_field.clone(),
            })?;

            let name = attributes
                .remove(&settings.name_field)
                .and_then(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .ok_or_else(|| LoadError::MissingField {
                    index,
                    field: settings.name_field.clone(),
                })?;
            attributes.remove(&settings.id_field);

            let gj = feature
                .geometry
                .ok_or_else(|| LoadError::MissingGeometry { id: id.clone() })?;
            let geom: Geometry<f64> = gj.value.try_into().map_err(|e: geojson::Error| {
                LoadError::InvalidGeometry { id: id.clone(), reason: e.to_string() }
            })?;

            features.push(Feature {
                id,
                name,
                geometry: geom.into(),
                attributes,
            });
        }

        Self::new(features)
    }

    /// Składa zbiór z gotowych obiektów, sprawdzając unikalność id i geometrię.
    pub fn new(features: Vec<Feature>) -> Result<Self, AtlasError> {
        if features.is_empty() {
            return Err(LoadError::Empty.into());
        }
        let mut by_id = HashMap::with_capacity(features.len());
        for (i, f) in features.iter().enumerate() {
            if by_id.insert(f.id.clone(), i).is_some() {
                return Err(LoadError::DuplicateId(f.id.clone()).into());
            }
            geometry::geometry_bounds(&f.geometry).map_err(|e| LoadError::InvalidGeometry {
                id: f.id.clone(),
                reason: e.to_string(),
            })?;
        }
        let bounds = geometry::feature_set_bounds(features.iter().map(|f| &f.geometry))?;
        Ok(Self { features, by_id, bounds })
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.by_id.get(id).map(|&i| &self.features[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Zasięg całego zbioru, liczony raz przy wczytaniu.
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }
}
