use core_types::{Frequency, ResamplePeriod, ReturnKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty file (or no file at all) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSettings,
    pub analytics: AnalyticsSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.analytics.nav_base;
        if !(base.is_finite() && base > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "analytics.nav_base must be positive, got {base}"
            )));
        }
        if self.analytics.latest_periods == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.latest_periods must be at least 1".to_string(),
            ));
        }
        if self.data.close_column.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data.close_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the long-format price file lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Path of the price CSV; may also be given on the command line.
    pub prices_path: Option<PathBuf>,
    /// Numeric column pivoted into the price panel.
    pub close_column: String,
    pub has_headers: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            prices_path: None,
            close_column: "close".to_string(),
            has_headers: true,
        }
    }
}

/// Defaults for the analytics commands; each can be overridden per command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Aggregation frequency of the statistics table.
    pub frequency: Frequency,
    pub return_kind: ReturnKind,
    /// Calendar resampling applied to returns, if any.
    pub resample: Option<ResamplePeriod>,
    /// Starting level of NAV curves.
    pub nav_base: f64,
    /// Number of recent periods shown by the movers view.
    pub latest_periods: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            frequency: Frequency::Natural,
            return_kind: ReturnKind::Log,
            resample: None,
            nav_base: 100.0,
            latest_periods: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set (e.g. "info", "analytics=debug").
    pub level: String,
    /// When set, logs are also written to daily rolling files in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
