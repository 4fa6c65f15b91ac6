//! Month-by-year return grid.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use core_types::{Panel, finite};

/// Compounded simple returns of one symbol for one calendar year, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturnRow {
    pub symbol: String,
    pub year: i32,
    /// January through December; `None` for months without observations.
    pub months: [Option<f64>; 12],
    pub ytd: Option<f64>,
}

/// Builds the calendar from a panel of log returns at any frequency finer
/// than a month.
///
/// Log returns are summed per month and per year, then shown as
/// `expm1(sum) * 100`. Rows are ordered by symbol then year and only years
/// with at least one observation appear.
pub fn monthly_return_calendar(log_returns: &Panel) -> Vec<MonthlyReturnRow> {
    let mut rows = Vec::new();
    for (col, symbol) in log_returns.columns().iter().enumerate() {
        let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
        for (date, value) in log_returns.dates().iter().zip(log_returns.column_values(col)) {
            let Some(r) = value else { continue };
            let slot = &mut years.entry(date.year()).or_insert([None; 12])[date.month0() as usize];
            *slot = Some(slot.unwrap_or(0.0) + r);
        }

        for (year, sums) in years {
            let ytd = sums.iter().flatten().sum::<f64>();
            rows.push(MonthlyReturnRow {
                symbol: symbol.clone(),
                year,
                months: sums.map(|m| m.and_then(as_percent)),
                ytd: as_percent(ytd),
            });
        }
    }
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.year.cmp(&b.year)));
    rows
}

fn as_percent(log_return: f64) -> Option<f64> {
    finite(log_return.exp_m1() * 100.0)
}
