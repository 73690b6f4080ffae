//! Tabela gmin: sortowanie po czasie dojazdu, kubełki i filtry.

use std::cmp::Ordering;

use serde_json::Value;

use crate::{config::DataSettings, data::Feature, search::normalize};

/// Etykieta dla brakującej wartości drugiej kolumny.
pub const MISSING_LABEL: &str = "N/A";

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub id: String,
    pub name: String,
    pub secondary_label: String,
    pub metric: f64,
}

/// To, co selektor wyciąga z gminy do tabeli.
#[derive(Clone, Debug, PartialEq)]
pub struct RowValues {
    pub secondary_label: Option<String>,
    pub metric: f64,
}

/// Progi kubełków: `<= low`, `(low, high]`, `> high`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl From<[f64; 2]> for Thresholds {
    fn from([low, high]: [f64; 2]) -> Self {
        Self { low, high }
    }
}

/// Aktywny filtr tabeli. Zawsze dokładnie jeden, domyślnie `All`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Bucket {
    #[default]
    All,
    Near,
    Medium,
    Far,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::All, Bucket::Near, Bucket::Medium, Bucket::Far];

    /// Kubełek danej wartości. NaN trafia do `Far`, żeby suma się zgadzała.
    pub fn classify(metric: f64, t: Thresholds) -> Bucket {
        if metric <= t.low {
            Bucket::Near
        } else if metric <= t.high {
            Bucket::Medium
        } else {
            Bucket::Far
        }
    }

    pub fn contains(self, metric: f64, t: Thresholds) -> bool {
        self == Bucket::All || Bucket::classify(metric, t) == self
    }

    /// Napis na przycisku filtra, progi w minutach.
    pub fn label(self, t: Thresholds) -> String {
        let (low, high) = (t.low / 60.0, t.high / 60.0);
        match self {
            Bucket::All => "Wszystkie".to_string(),
            Bucket::Near => format!("≤ {low:.0} min"),
            Bucket::Medium => format!("{low:.0}–{high:.0} min"),
            Bucket::Far => format!("> {high:.0} min"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub near: usize,
    pub medium: usize,
    pub far: usize,
}

impl BucketCounts {
    pub fn get(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::All => self.total(),
            Bucket::Near => self.near,
            Bucket::Medium => self.medium,
            Bucket::Far => self.far,
        }
    }

    pub fn total(&self) -> usize {
        self.near + self.medium + self.far
    }
}

/// Selektor kolumn na podstawie nazw pól z konfiguracji.
#[derive(Clone, Debug)]
pub struct AttributeSelector {
    metric_field: String,
    label_field: String,
}

impl AttributeSelector {
    pub fn new(settings: &DataSettings) -> Self {
        Self {
            metric_field: settings.metric_field.clone(),
            label_field: settings.label_field.clone(),
        }
    }

    /// Gmina bez czasu dojazdu ląduje na końcu tabeli.
    pub fn select(&self, feature: &Feature) -> RowValues {
        let secondary_label = match feature.attributes.get(&self.label_field) {
            Some(Value::Number(_)) => feature.number(&self.label_field).map(|v| format!("{v:.0}")),
            Some(Value::String(s)) if !s.is_empty() => Some(match feature.price_range(&self.label_field) {
                Some(r) if r.min != r.max => format!("{:.0}–{:.0}", r.min, r.max),
                Some(r) => format!("{:.0}", r.min),
                None => s.clone(),
            }),
            _ => None,
        };
        RowValues {
            secondary_label,
            metric: feature.number(&self.metric_field).unwrap_or(f64::INFINITY),
        }
    }
}

/// Porządek nazw: najpierw bez akcentów i wielkości liter, potem dokładny napis.
fn compare_names(a: &str, b: &str) -> Ordering {
    normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b))
}

/// Wiersze posortowane rosnąco po metryce, remisy po nazwie.
pub fn project<'a, I, F>(features: I, selector: F) -> Vec<TableRow>
where
    I: IntoIterator<Item = &'a Feature>,
    F: Fn(&Feature) -> RowValues,
{
    let mut rows: Vec<TableRow> = features
        .into_iter()
        .map(|f| {
            let values = selector(f);
            TableRow {
                id: f.id.clone(),
                name: f.name.clone(),
                secondary_label: values
                    .secondary_label
                    .unwrap_or_else(|| MISSING_LABEL.to_string()),
                metric: values.metric,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        a.metric
            .total_cmp(&b.metric)
            .then_with(|| compare_names(&a.name, &b.name))
    });
    rows
}

pub fn bucket_counts(rows: &[TableRow], thresholds: Thresholds) -> BucketCounts {
    rows.iter()
        .fold(BucketCounts::default(), |mut counts, row| {
            match Bucket::classify(row.metric, thresholds) {
                Bucket::Near => counts.near += 1,
                Bucket::Medium => counts.medium += 1,
                Bucket::Far | Bucket::All => counts.far += 1,
            }
            counts
        })
}

pub fn filter(rows: &[TableRow], bucket: Bucket, thresholds: Thresholds) -> Vec<&TableRow> {
    rows.iter()
        .filter(|row| bucket.contains(row.metric, thresholds))
        .collect()
}
