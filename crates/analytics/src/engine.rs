use crate::descriptive;
use crate::drawdown::drawdown_values;
use crate::error::AnalyticsError;
use crate::report::{InstrumentStatistics, StatisticsBundle, StatisticsTable};
use crate::returns::sum_at_frequency;
use core_types::{Frequency, Panel, TimeSeries, finite};
use lazy_static::lazy_static;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Extreme tail probability of the quantile ratios.
pub const QUANT_PERCENTILE_EXTREME: f64 = 0.01;
/// Moderate probability the extreme quantile is compared against.
pub const QUANT_PERCENTILE_STD: f64 = 0.3;

lazy_static! {
    /// Φ⁻¹(0.01) / Φ⁻¹(0.30): the lower quantile ratio of a normal distribution.
    pub static ref NORMAL_DISTR_RATIO_LOWER: f64 =
        normal_quantile_ratio(QUANT_PERCENTILE_EXTREME, QUANT_PERCENTILE_STD);
    /// Φ⁻¹(0.99) / Φ⁻¹(0.70): the upper quantile ratio of a normal distribution.
    pub static ref NORMAL_DISTR_RATIO_UPPER: f64 =
        normal_quantile_ratio(1.0 - QUANT_PERCENTILE_EXTREME, 1.0 - QUANT_PERCENTILE_STD);
}

fn normal_quantile_ratio(extreme: f64, moderate: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(extreme) / n.inverse_cdf(moderate))
        .unwrap_or(f64::NAN)
}

/// A stateless calculator for the descriptive statistics of return series.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceEngine {
    frequency: Frequency,
}

impl PerformanceEngine {
    pub fn new(frequency: Frequency) -> Self {
        Self { frequency }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// The main entry point for one return series.
    ///
    /// The series is first summed into buckets of the engine's frequency; all
    /// statistics are computed on the aggregated series and annualized with
    /// the frequency's periods-per-year constant.
    pub fn calculate(&self, returns: &TimeSeries) -> Result<StatisticsBundle, AnalyticsError> {
        let mut bundle = StatisticsBundle::new(self.frequency);
        let aggregated = sum_at_frequency(returns, self.frequency)?;
        let observed: Vec<f64> = aggregated.observed().collect();

        if observed.is_empty() {
            debug!(series = returns.name(), "no observations, returning empty statistics");
            return Ok(bundle);
        }

        self.calculate_moments(&observed, &mut bundle);
        self.calculate_drawdown(aggregated.values(), &mut bundle);
        self.calculate_tail_ratios(&observed, &mut bundle);

        Ok(bundle)
    }

    /// Statistics per column, assembled into one table keyed by instrument.
    ///
    /// Columns are independent: there is no pooling across instruments.
    pub fn calculate_instruments(&self, returns: &Panel) -> Result<StatisticsTable, AnalyticsError> {
        let rows = returns
            .iter_columns()
            .map(|series| {
                Ok(InstrumentStatistics {
                    symbol: series.name().to_string(),
                    stats: self.calculate(&series)?,
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;

        debug!(instruments = rows.len(), frequency = %self.frequency, "computed statistics table");
        Ok(StatisticsTable {
            frequency: self.frequency,
            rows,
        })
    }

    /// Annualized mean, standard deviation, Sharpe-like ratio and skew.
    fn calculate_moments(&self, observed: &[f64], bundle: &mut StatisticsBundle) {
        let periods = self.frequency.periods_per_year();

        bundle.ann_mean = descriptive::mean(observed).and_then(|m| finite(m * periods));
        bundle.ann_std = descriptive::std_dev(observed).and_then(|s| finite(s * periods.sqrt()));
        // Zero dispersion makes the ratio non-finite, which is reported as missing.
        bundle.sharpe_ratio = match (bundle.ann_mean, bundle.ann_std) {
            (Some(mean), Some(std)) => finite(mean / std),
            _ => None,
        };
        bundle.skew = descriptive::skew(observed);
    }

    /// Average and deepest point of the underwater curve.
    fn calculate_drawdown(&self, values: &[Option<f64>], bundle: &mut StatisticsBundle) {
        let drawdowns: Vec<f64> = drawdown_values(values).into_iter().flatten().collect();
        bundle.avg_drawdown = descriptive::mean(&drawdowns);
        bundle.max_drawdown = descriptive::min(&drawdowns);
    }

    fn calculate_tail_ratios(&self, observed: &[f64], bundle: &mut StatisticsBundle) {
        bundle.quant_ratio_lower = quant_ratio_lower(observed);
        bundle.quant_ratio_upper = quant_ratio_upper(observed);
    }
}

/// Statistics of one series at `frequency`.
pub fn calculate_stats(
    returns: &TimeSeries,
    frequency: Frequency,
) -> Result<StatisticsBundle, AnalyticsError> {
    PerformanceEngine::new(frequency).calculate(returns)
}

/// Native-frequency statistics for every column of a return panel.
pub fn performance_stats_instruments(returns: &Panel) -> Result<StatisticsTable, AnalyticsError> {
    PerformanceEngine::new(Frequency::Natural).calculate_instruments(returns)
}

/// Observations with exact zeros removed, then demeaned.
///
/// Zeros mark non-trading placeholder periods rather than genuine flat returns.
fn demeaned_without_zeros(values: &[f64]) -> Vec<f64> {
    let non_zero: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
    match descriptive::mean(&non_zero) {
        Some(mean) => non_zero.iter().map(|v| v - mean).collect(),
        None => Vec::new(),
    }
}

/// 1st over 30th percentile of the demeaned series, relative to a normal.
///
/// 1.0 for a normal distribution; above 1 for a fat lower tail.
pub fn quant_ratio_lower(values: &[f64]) -> Option<f64> {
    quant_ratio(
        values,
        QUANT_PERCENTILE_EXTREME,
        QUANT_PERCENTILE_STD,
        *NORMAL_DISTR_RATIO_LOWER,
    )
}

/// 99th over 70th percentile of the demeaned series, relative to a normal.
pub fn quant_ratio_upper(values: &[f64]) -> Option<f64> {
    quant_ratio(
        values,
        1.0 - QUANT_PERCENTILE_EXTREME,
        1.0 - QUANT_PERCENTILE_STD,
        *NORMAL_DISTR_RATIO_UPPER,
    )
}

fn quant_ratio(values: &[f64], extreme: f64, moderate: f64, normal_ratio: f64) -> Option<f64> {
    let demeaned = demeaned_without_zeros(values);
    let extreme = descriptive::quantile(&demeaned, extreme)?;
    let moderate = descriptive::quantile(&demeaned, moderate)?;
    finite(extreme / moderate / normal_ratio)
}
