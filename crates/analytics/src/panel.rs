//! Long-to-wide reshaping of the raw price panel, plus the record filters the
//! dashboard applies before any analytics run.

use chrono::NaiveDate;
use core_types::{Panel, PriceRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::AnalyticsError;

/// Which numeric field of a `PriceRecord` feeds the wide table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CloseField {
    #[default]
    Close,
    /// A column carried in `PriceRecord::extra`. Records without it are missing cells.
    Named(String),
}

impl CloseField {
    /// Maps a column name to a field; `"close"` selects the primary close.
    pub fn from_column(name: &str) -> Self {
        if name.eq_ignore_ascii_case("close") {
            CloseField::Close
        } else {
            CloseField::Named(name.to_string())
        }
    }

    fn extract(&self, record: &PriceRecord) -> Option<f64> {
        match self {
            CloseField::Close => Some(record.close),
            CloseField::Named(name) => record.extra.get(name).copied(),
        }
    }
}

/// Pivots long-format records into a date × symbol table of closing prices.
///
/// Dates are sorted ascending and symbols lexicographically. A symbol with no
/// record on a date gets a missing cell; nothing is interpolated. `(symbol,
/// date)` pairs are assumed unique: if the caller passes duplicates, the last
/// record wins.
pub fn to_wide_prices(records: &[PriceRecord]) -> Result<Panel, AnalyticsError> {
    to_wide_prices_with(records, &CloseField::Close)
}

pub fn to_wide_prices_with(
    records: &[PriceRecord],
    field: &CloseField,
) -> Result<Panel, AnalyticsError> {
    let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    let mut cells: BTreeMap<&str, BTreeMap<NaiveDate, Option<f64>>> = BTreeMap::new();
    for record in records {
        cells
            .entry(record.symbol.as_str())
            .or_default()
            .insert(record.date, field.extract(record));
    }

    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let mut columns = Vec::with_capacity(cells.len());
    let mut values = Vec::with_capacity(cells.len());
    for (symbol, by_date) in cells {
        columns.push(symbol.to_string());
        values.push(
            dates
                .iter()
                .map(|d| by_date.get(d).copied().flatten())
                .collect(),
        );
    }

    debug!(
        records = records.len(),
        dates = dates.len(),
        symbols = columns.len(),
        "pivoted price panel"
    );
    Ok(Panel::new(dates, columns, values)?)
}

/// Record-level selection mirroring the dashboard's sidebar filters.
///
/// Every criterion left unset matches all records. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelFilter {
    pub index_type: Option<String>,
    pub index_category: Option<String>,
    /// Keep only these symbols. Empty means no symbol restriction.
    pub symbols: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PanelFilter {
    pub fn matches(&self, record: &PriceRecord) -> bool {
        let tag_matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            Some(w) => actual.as_deref() == Some(w.as_str()),
            None => true,
        };

        tag_matches(&self.index_type, &record.index_type)
            && tag_matches(&self.index_category, &record.index_category)
            && (self.symbols.is_empty() || self.symbols.iter().any(|s| *s == record.symbol))
            && self.start.is_none_or(|start| record.date >= start)
            && self.end.is_none_or(|end| record.date <= end)
    }

    pub fn apply(&self, records: &[PriceRecord]) -> Vec<PriceRecord> {
        let selected: Vec<PriceRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        debug!(
            input = records.len(),
            selected = selected.len(),
            "applied panel filter"
        );
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn non_overlapping_calendars_leave_gaps() {
        let records = vec![
            PriceRecord::new("NIFTY", date(4), 100.0),
            PriceRecord::new("BANK", date(5), 50.0),
            PriceRecord::new("NIFTY", date(6), 101.0),
            PriceRecord::new("BANK", date(7), 51.0),
        ];
        let wide = to_wide_prices(&records).unwrap();

        assert_eq!(wide.dates(), &[date(4), date(5), date(6), date(7)]);
        assert_eq!(wide.columns(), &["BANK".to_string(), "NIFTY".to_string()]);
        let bank = wide.column("BANK").unwrap();
        let nifty = wide.column("NIFTY").unwrap();
        assert_eq!(bank.values(), &[None, Some(50.0), None, Some(51.0)]);
        assert_eq!(nifty.values(), &[Some(100.0), None, Some(101.0), None]);
    }

    #[test]
    fn output_is_sorted_by_date() {
        let records = vec![
            PriceRecord::new("A", date(8), 3.0),
            PriceRecord::new("A", date(1), 1.0),
            PriceRecord::new("A", date(4), 2.0),
        ];
        let wide = to_wide_prices(&records).unwrap();
        assert_eq!(wide.dates(), &[date(1), date(4), date(8)]);
        assert_eq!(wide.column("A").unwrap().values(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn empty_input_gives_empty_panel() {
        let wide = to_wide_prices(&[]).unwrap();
        assert!(wide.is_empty());
        assert_eq!(wide.n_cols(), 0);
    }

    #[test]
    fn named_field_is_pivoted() {
        let records = vec![
            PriceRecord::new("A", date(1), 10.0).with_field("adj_close", 9.5),
            PriceRecord::new("A", date(2), 11.0),
        ];
        let wide = to_wide_prices_with(&records, &CloseField::from_column("adj_close")).unwrap();
        assert_eq!(wide.column("A").unwrap().values(), &[Some(9.5), None]);
    }

    #[test]
    fn filter_applies_every_criterion() {
        let records = vec![
            PriceRecord::new("NIFTY 50", date(1), 1.0).with_tags("PRICE", "BROAD", "Nifty 50"),
            PriceRecord::new("NIFTY BANK", date(1), 1.0).with_tags("PRICE", "SECTORAL", "Nifty Bank"),
            PriceRecord::new("NIFTY 50", date(9), 1.0).with_tags("PRICE", "BROAD", "Nifty 50"),
            PriceRecord::new("NIFTY 50 TR", date(1), 1.0).with_tags("TOTAL RETURN", "BROAD", "Nifty 50 TR"),
        ];
        let filter = PanelFilter {
            index_type: Some("PRICE".into()),
            index_category: Some("BROAD".into()),
            end: Some(date(5)),
            ..Default::default()
        };
        let selected = filter.apply(&records);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].symbol, "NIFTY 50");
        assert_eq!(selected[0].date, date(1));

        let by_symbol = PanelFilter {
            symbols: vec!["NIFTY BANK".into()],
            ..Default::default()
        };
        assert_eq!(by_symbol.apply(&records).len(), 1);
    }
}
