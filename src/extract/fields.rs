//! Label/value extraction from item pages
//!
//! Listing pages present their attributes as a two-column table of
//! localized labels and values. When the markup changes and no table row
//! matches, the extractor falls back to scanning the visible text for
//! `label: value` lines.

use crate::config::LabelEntry;
use crate::extract::numeric::to_int;
use crate::extract::text::visible_text;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Internal field a page label maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Brand,
    Model,
    Trim,
    Year,
    MileageKm,
    PowerKw,
    Transmission,
}

impl FieldKey {
    /// Numeric fields are coerced with [`to_int`]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Year | Self::MileageKm | Self::PowerKw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Trim => "trim",
            Self::Year => "year",
            Self::MileageKm => "mileage_km",
            Self::PowerKw => "power_kw",
            Self::Transmission => "transmission",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced a [`RawFieldMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Table,
    Text,
    Nothing,
}

/// Label → raw text pairs found on one item page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldMap {
    pairs: BTreeMap<String, String>,
    strategy: Strategy,
}

impl RawFieldMap {
    fn new(pairs: BTreeMap<String, String>, strategy: Strategy) -> Self {
        let strategy = if pairs.is_empty() {
            Strategy::Nothing
        } else {
            strategy
        };
        Self { pairs, strategy }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.pairs.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// A resolved field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
}

/// Raw pairs resolved onto internal keys, numeric keys already coerced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: HashMap<FieldKey, FieldValue>,
}

impl FieldValues {
    pub fn insert(&mut self, key: FieldKey, value: FieldValue) {
        self.values.insert(key, value);
    }

    /// Non-empty text of a field
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        match self.values.get(&key) {
            Some(FieldValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, key: FieldKey) -> Option<u64> {
        match self.values.get(&key) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

struct KnownLabel {
    label: String,
    key: FieldKey,
    fallback: Regex,
}

/// Extracts label/value pairs using the configured label table
pub struct FieldExtractor {
    labels: Vec<KnownLabel>,
    row_selector: Selector,
    cell_selector: Selector,
}

impl FieldExtractor {
    pub fn new(entries: &[LabelEntry]) -> Self {
        let labels = entries
            .iter()
            .map(|entry| {
                let label = entry.label.trim().to_string();
                let pattern = format!(r"{}\s*[:\n]\s*([^\n]+)", regex::escape(&label));
                let fallback = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("escaped label always compiles");
                KnownLabel {
                    label,
                    key: entry.field,
                    fallback,
                }
            })
            .collect();

        Self {
            labels,
            row_selector: Selector::parse("tr").expect("static selector"),
            cell_selector: Selector::parse("td").expect("static selector"),
        }
    }

    /// Runs the table strategy, then the text fallback if it found nothing
    pub fn extract(&self, document: &Html) -> RawFieldMap {
        let pairs = self.from_tables(document);
        if !pairs.is_empty() {
            return RawFieldMap::new(pairs, Strategy::Table);
        }

        let text = visible_text(document);
        RawFieldMap::new(self.from_text(&text), Strategy::Text)
    }

    /// Maps raw pairs onto internal keys, coercing numeric fields
    ///
    /// A numeric field whose text holds no digits is left out, exactly like
    /// a missing label.
    pub fn resolve(&self, raw: &RawFieldMap) -> FieldValues {
        let mut values = FieldValues::default();
        for known in &self.labels {
            let Some(text) = raw.get(&known.label).filter(|v| !v.is_empty()) else {
                continue;
            };
            if known.key.is_numeric() {
                if let Some(n) = to_int(Some(text)) {
                    values.insert(known.key, FieldValue::Number(n));
                }
            } else {
                values.insert(known.key, FieldValue::Text(text.to_string()));
            }
        }
        values
    }

    fn from_tables(&self, document: &Html) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        for row in document.select(&self.row_selector) {
            let cells: Vec<ElementRef> = row.select(&self.cell_selector).collect();
            if cells.len() != 2 {
                continue;
            }
            let label = cell_text(&cells[0]);
            let value = cell_text(&cells[1]);
            if value.is_empty() {
                continue;
            }
            if let Some(known) = self.match_label(&label) {
                pairs.insert(known.label.clone(), value);
            }
        }
        pairs
    }

    fn from_text(&self, text: &str) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        for known in &self.labels {
            if let Some(value) = known
                .fallback
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .filter(|v| !v.is_empty())
            {
                pairs.insert(known.label.clone(), value.to_string());
            }
        }
        pairs
    }

    fn match_label(&self, cell: &str) -> Option<&KnownLabel> {
        let cell = cell.trim_end_matches(':').trim();
        self.labels
            .iter()
            .find(|known| known.label.to_lowercase() == cell.to_lowercase())
    }
}

/// Whitespace-collapsed text of a table cell
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
