//! Wyszukiwarka gmin po nazwie, niewrażliwa na wielkość liter i akcenty.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{config::SearchSettings, data::FeatureSet};

/// Wpis indeksu, jeden na gminę, w kolejności zbioru.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchIndexEntry {
    pub id: String,
    pub display_name: String,
    pub normalized_name: String,
}

/// Sprowadza napis do postaci porównywalnej: małe litery, bez znaków diakrytycznych.
///
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[derive(Clone, Debug)]
pub struct SearchIndex {
    entries: Vec<SearchIndexEntry>,
    min_query_chars: usize,
    max_results: usize,
}

impl SearchIndex {
    pub fn build(features: &FeatureSet, settings: &SearchSettings) -> Self {
        let entries = features
            .iter()
            .map(|f| SearchIndexEntry {
                id: f.id.clone(),
                display_name: f.name.clone(),
                normalized_name: normalize(&f.name),
            })
            .collect::<Vec<_>>();
        tracing::debug!(entries = entries.len(), "Built search index");
        Self {
            entries,
            min_query_chars: settings.min_query_chars,
            max_results: settings.max_results,
        }
    }

    /// Zbyt krótkie zapytanie daje pustą listę (wyniki się chowają).
    pub fn is_too_short(&self, text: &str) -> bool {
        text.chars().count() < self.min_query_chars
    }

    /// Dopasowanie podnapisu w kolejności indeksu, najwyżej `max_results` trafień.
    pub fn query(&self, text: &str) -> Vec<&SearchIndexEntry> {
        if self.is_too_short(text) {
            return Vec::new();
        }
        let needle = normalize(text);
        self.entries
            .iter()
            .filter(|e| e.normalized_name.contains(&needle))
            .take(self.max_results)
            .collect()
    }
}
