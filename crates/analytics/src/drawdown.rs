//! Underwater curve of a return series.

use core_types::{Panel, TimeSeries, finite};

use crate::error::AnalyticsError;

/// Proportional decline of the compounded curve from its running peak.
///
/// Each return is compounded through `ln(1 + r)`; the curve is divided by its
/// causal running maximum. The result is never positive and is exactly zero at
/// every new high. Missing returns give missing drawdowns without breaking the
/// compounding of the observations around them.
pub fn drawdown_values(returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut cumulative_log = 0.0;
    let mut peak: Option<f64> = None;

    returns
        .iter()
        .map(|r| {
            let growth = (*r)?.ln_1p();
            if growth.is_nan() {
                return None;
            }
            cumulative_log += growth;
            let level = cumulative_log.exp();
            let running_max = peak.map_or(level, |p| p.max(level));
            peak = Some(running_max);
            finite(level / running_max - 1.0).map(|dd| dd.min(0.0))
        })
        .collect()
}

pub fn drawdown(returns: &TimeSeries) -> TimeSeries {
    returns
        .with_values(drawdown_values(returns.values()))
        .unwrap_or_else(|_| TimeSeries::empty(returns.name()))
}

/// Column-wise [`drawdown`].
pub fn drawdown_panel(returns: &Panel) -> Result<Panel, AnalyticsError> {
    Ok(returns.map_columns(drawdown_values)?)
}
