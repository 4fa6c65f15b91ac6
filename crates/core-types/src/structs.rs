use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the long-format price panel: a single symbol's close on a single date.
///
/// The three tag fields are carried for filtering only; the analytics core reads
/// `symbol`, `date` and `close` (or a named field from `extra`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub index_type: Option<String>,
    #[serde(default)]
    pub index_category: Option<String>,
    #[serde(default)]
    pub index_name: Option<String>,
    /// Additional numeric columns (e.g. an adjusted close) keyed by column name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, f64>,
}

impl PriceRecord {
    /// Creates an untagged record.
    pub fn new(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            close,
            index_type: None,
            index_category: None,
            index_name: None,
            extra: HashMap::new(),
        }
    }

    /// Attaches the descriptive tags used by the dashboard filters.
    pub fn with_tags(
        mut self,
        index_type: impl Into<String>,
        index_category: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        self.index_type = Some(index_type.into());
        self.index_category = Some(index_category.into());
        self.index_name = Some(index_name.into());
        self
    }

    /// Adds an extra numeric field that can be pivoted instead of `close`.
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}
