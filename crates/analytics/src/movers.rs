//! Volatility-scaled returns and the most recent cross sections.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

use core_types::{Panel, finite};

use crate::error::AnalyticsError;
use crate::volatility::RobustVolEstimator;

/// Divides each return by the robust volatility of its own column on the same
/// row. Neither side is annualized.
///
/// Missing when the return or volatility is missing, or the volatility is zero.
pub fn zscore_panel(returns: &Panel) -> Result<Panel, AnalyticsError> {
    let estimator = RobustVolEstimator::default();
    Ok(returns.map_columns(|column| {
        let vol = estimator.estimate_values(column, false);
        column
            .iter()
            .zip(vol)
            .map(|(r, v)| match (r, v) {
                (Some(r), Some(v)) if v > 0.0 => finite(r / v),
                _ => None,
            })
            .collect()
    })?)
}

/// One row of a panel as `(symbol, value)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSnapshot {
    pub date: NaiveDate,
    /// Ascending by value, missing values last.
    pub entries: Vec<(String, Option<f64>)>,
}

impl PeriodSnapshot {
    pub fn best(&self) -> Option<(&str, f64)> {
        self.entries
            .iter()
            .rev()
            .find_map(|(symbol, value)| value.map(|v| (symbol.as_str(), v)))
    }

    pub fn worst(&self) -> Option<(&str, f64)> {
        self.entries
            .first()
            .and_then(|(symbol, value)| value.map(|v| (symbol.as_str(), v)))
    }
}

/// The last `n` rows of `panel`, newest first, each sorted by value.
pub fn latest_periods(panel: &Panel, n: usize) -> Vec<PeriodSnapshot> {
    let start = panel.n_rows().saturating_sub(n);
    (start..panel.n_rows())
        .rev()
        .map(|row| {
            let mut entries: Vec<(String, Option<f64>)> = panel
                .columns()
                .iter()
                .cloned()
                .zip(panel.row(row))
                .collect();
            entries.sort_by(|a, b| compare_missing_last(a.1, b.1).then_with(|| a.0.cmp(&b.0)));
            PeriodSnapshot {
                date: panel.dates()[row],
                entries,
            }
        })
        .collect()
}

fn compare_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
