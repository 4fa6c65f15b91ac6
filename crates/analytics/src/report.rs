use core_types::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed keys of a [`StatisticsBundle`], in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKey {
    AnnMean,
    AnnStd,
    SharpeRatio,
    Skew,
    AvgDrawdown,
    MaxDrawdown,
    QuantRatioLower,
    QuantRatioUpper,
}

impl StatisticKey {
    pub const ALL: [StatisticKey; 8] = [
        StatisticKey::AnnMean,
        StatisticKey::AnnStd,
        StatisticKey::SharpeRatio,
        StatisticKey::Skew,
        StatisticKey::AvgDrawdown,
        StatisticKey::MaxDrawdown,
        StatisticKey::QuantRatioLower,
        StatisticKey::QuantRatioUpper,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StatisticKey::AnnMean => "ann_mean",
            StatisticKey::AnnStd => "ann_std",
            StatisticKey::SharpeRatio => "sharpe_ratio",
            StatisticKey::Skew => "skew",
            StatisticKey::AvgDrawdown => "avg_drawdown",
            StatisticKey::MaxDrawdown => "max_drawdown",
            StatisticKey::QuantRatioLower => "quant_ratio_lower",
            StatisticKey::QuantRatioUpper => "quant_ratio_upper",
        }
    }

    /// Rates are shown as percentages; ratios are unitless.
    pub fn is_rate(&self) -> bool {
        matches!(
            self,
            StatisticKey::AnnMean
                | StatisticKey::AnnStd
                | StatisticKey::AvgDrawdown
                | StatisticKey::MaxDrawdown
        )
    }
}

impl fmt::Display for StatisticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders one statistic for a table cell: `12.34%`, `1.23`, or `-` when missing.
pub fn format_value(key: StatisticKey, value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if key.is_rate() => format!("{:.2}%", v * 100.0),
        Some(v) => format!("{:.2}", v),
    }
}

/// Descriptive performance statistics of one return series.
///
/// Every field is `None` when the underlying computation is undefined
/// (too few observations, zero dispersion, division by zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsBundle {
    pub ann_mean: Option<f64>,
    pub ann_std: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub skew: Option<f64>,
    pub avg_drawdown: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub quant_ratio_lower: Option<f64>,
    pub quant_ratio_upper: Option<f64>,
    /// The aggregation frequency the statistics were computed at.
    pub frequency: Frequency,
}

impl StatisticsBundle {
    /// A bundle with every statistic missing.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            ann_mean: None,
            ann_std: None,
            sharpe_ratio: None,
            skew: None,
            avg_drawdown: None,
            max_drawdown: None,
            quant_ratio_lower: None,
            quant_ratio_upper: None,
            frequency,
        }
    }

    pub fn get(&self, key: StatisticKey) -> Option<f64> {
        match key {
            StatisticKey::AnnMean => self.ann_mean,
            StatisticKey::AnnStd => self.ann_std,
            StatisticKey::SharpeRatio => self.sharpe_ratio,
            StatisticKey::Skew => self.skew,
            StatisticKey::AvgDrawdown => self.avg_drawdown,
            StatisticKey::MaxDrawdown => self.max_drawdown,
            StatisticKey::QuantRatioLower => self.quant_ratio_lower,
            StatisticKey::QuantRatioUpper => self.quant_ratio_upper,
        }
    }

    /// `(key, value)` pairs in presentation order.
    pub fn entries(&self) -> Vec<(StatisticKey, Option<f64>)> {
        StatisticKey::ALL.iter().map(|k| (*k, self.get(*k))).collect()
    }
}

/// Statistics for one instrument of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentStatistics {
    pub symbol: String,
    #[serde(flatten)]
    pub stats: StatisticsBundle,
}

/// Rows = instruments, columns = the statistic keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    pub frequency: Frequency,
    pub rows: Vec<InstrumentStatistics>,
}

impl StatisticsTable {
    pub fn get(&self, symbol: &str) -> Option<&StatisticsBundle> {
        self.rows.iter().find(|r| r.symbol == symbol).map(|r| &r.stats)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Formatted cells for each instrument, in [`StatisticKey::ALL`] order.
    pub fn formatted_rows(&self) -> Vec<(String, Vec<String>)> {
        self.rows
            .iter()
            .map(|row| {
                let cells = row
                    .stats
                    .entries()
                    .into_iter()
                    .map(|(key, value)| format_value(key, value))
                    .collect();
                (row.symbol.clone(), cells)
            })
            .collect()
    }
}
