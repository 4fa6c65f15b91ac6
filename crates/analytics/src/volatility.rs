//! Blended fast/slow volatility estimate.
//!
//! The fast component is an exponentially weighted standard deviation; the
//! slow component is the long-window average of the fast one. The blend damps
//! abrupt jumps in the reactive estimate while staying responsive.

use core_types::{Frequency, Panel, TimeSeries, finite};

use crate::error::AnalyticsError;

pub const DEFAULT_EWM_SPAN: usize = 32;
pub const DEFAULT_LOOKBACK_YEARS: usize = 10;
pub const DEFAULT_SLOW_WEIGHT: f64 = 0.3;
pub const DEFAULT_FAST_WEIGHT: f64 = 0.7;

/// Parameters of the robust volatility blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustVolEstimator {
    pub span: usize,
    pub lookback_years: usize,
    pub slow_weight: f64,
    pub fast_weight: f64,
    pub frequency: Frequency,
}

impl Default for RobustVolEstimator {
    fn default() -> Self {
        Self {
            span: DEFAULT_EWM_SPAN,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            slow_weight: DEFAULT_SLOW_WEIGHT,
            fast_weight: DEFAULT_FAST_WEIGHT,
            frequency: Frequency::Natural,
        }
    }
}

impl RobustVolEstimator {
    pub fn for_frequency(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    /// Number of observations in the slow rolling window.
    pub fn slow_window(&self) -> usize {
        ((self.lookback_years as f64 * self.frequency.periods_per_year()).round() as usize).max(1)
    }

    pub fn estimate_values(&self, returns: &[Option<f64>], annualize: bool) -> Vec<Option<f64>> {
        let factor = if annualize {
            self.frequency.periods_per_year().sqrt()
        } else {
            1.0
        };
        let fast: Vec<Option<f64>> = ewm_std(returns, self.span)
            .into_iter()
            .map(|v| v.map(|v| v * factor))
            .collect();
        let slow = rolling_mean(&fast, self.slow_window());

        fast.iter()
            .zip(&slow)
            .map(|(fast, slow)| match (fast, slow) {
                (Some(fast), Some(slow)) => finite(self.slow_weight * slow + self.fast_weight * fast),
                _ => None,
            })
            .collect()
    }

    pub fn estimate(&self, returns: &TimeSeries, annualize: bool) -> TimeSeries {
        let values = self.estimate_values(returns.values(), annualize);
        // Same index and length as the input, so this cannot fail.
        returns
            .with_values(values)
            .unwrap_or_else(|_| TimeSeries::empty(returns.name()))
    }

    pub fn estimate_panel(&self, returns: &Panel, annualize: bool) -> Result<Panel, AnalyticsError> {
        Ok(returns.map_columns(|column| self.estimate_values(column, annualize))?)
    }
}

/// Robust volatility with the default span (32), ten-year window and 0.3/0.7 blend.
pub fn robust_vol(returns: &TimeSeries, annualize: bool) -> TimeSeries {
    RobustVolEstimator::default().estimate(returns, annualize)
}

/// Column-wise [`robust_vol`].
pub fn robust_vol_panel(returns: &Panel, annualize: bool) -> Result<Panel, AnalyticsError> {
    RobustVolEstimator::default().estimate_panel(returns, annualize)
}

/// Bias-corrected exponentially weighted standard deviation.
///
/// Uses adjusted weights `(1 - alpha)^i` with `alpha = 2 / (span + 1)`. Missing
/// observations still age the weights of earlier ones. The first observation
/// has no estimate; a series with a single observation yields only missing.
pub fn ewm_std(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut mean: Option<f64> = None;
    let mut cov = 0.0;
    let mut sum_wt = 1.0;
    let mut sum_wt2 = 1.0;
    let mut old_wt = 1.0;
    let mut nobs = 0usize;

    for value in values {
        match (mean, *value) {
            (None, Some(x)) => {
                mean = Some(x);
                nobs += 1;
            }
            (None, None) => {}
            (Some(current_mean), observation) => {
                sum_wt *= decay;
                sum_wt2 *= decay * decay;
                old_wt *= decay;
                if let Some(x) = observation {
                    nobs += 1;
                    let new_mean = if current_mean != x {
                        (old_wt * current_mean + x) / (old_wt + 1.0)
                    } else {
                        current_mean
                    };
                    cov = (old_wt * (cov + (current_mean - new_mean).powi(2))
                        + (x - new_mean).powi(2))
                        / (old_wt + 1.0);
                    mean = Some(new_mean);
                    sum_wt += 1.0;
                    sum_wt2 += 1.0;
                    old_wt += 1.0;
                }
            }
        }

        if nobs == 0 {
            out.push(None);
            continue;
        }
        let numerator = sum_wt * sum_wt;
        let denominator = numerator - sum_wt2;
        let variance = if denominator > 0.0 {
            numerator / denominator * cov
        } else {
            f64::NAN
        };
        out.push(variance.is_finite().then(|| variance.max(0.0).sqrt()));
    }
    out
}

/// Trailing mean over `window` rows, requiring at least one observation.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value {
            sum += v;
            count += 1;
        }
        if i >= window {
            if let Some(old) = values[i - window] {
                sum -= old;
                count -= 1;
            }
        }
        out.push(if count > 0 { finite(sum / count as f64) } else { None });
    }
    out
}
