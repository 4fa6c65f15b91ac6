//! # Index360 Analytics
//!
//! The numerical core of the index dashboard: it turns long-format price
//! records into wide panels and derives returns, volatility, drawdowns and
//! summary statistics from them.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** No I/O and no knowledge of where prices come from. The crate
//!   depends only on `core-types`.
//! - **Missing, not failing:** Numerically undefined results are `None`. Errors are
//!   reserved for structurally invalid input (unsorted index, bad parameters).
//!
//! ## Public API
//!
//! - `to_wide_prices` / `PanelFilter`: long records to a filtered wide price panel.
//! - `returns`: log or simple returns with optional calendar resampling.
//! - `robust_vol`: blended fast/slow volatility.
//! - `PerformanceEngine`: the per-instrument statistics table.
//! - `drawdown`: the underwater curve.

pub mod calendar;
pub mod correlation;
pub mod descriptive;
pub mod drawdown;
pub mod engine;
pub mod error;
pub mod movers;
pub mod nav;
pub mod panel;
pub mod report;
pub mod returns;
pub mod volatility;

pub use calendar::{MonthlyReturnRow, monthly_return_calendar};
pub use correlation::{CorrelationMatrix, correlation_matrix};
pub use drawdown::{drawdown, drawdown_panel};
pub use engine::{PerformanceEngine, calculate_stats, performance_stats_instruments};
pub use error::AnalyticsError;
pub use movers::{PeriodSnapshot, latest_periods, zscore_panel};
pub use nav::{cumulative_nav, nav_from_returns};
pub use panel::{CloseField, PanelFilter, to_wide_prices, to_wide_prices_with};
pub use report::{InstrumentStatistics, StatisticKey, StatisticsBundle, StatisticsTable, format_value};
pub use returns::{ReturnOptions, calculate_returns_wide, returns};
pub use volatility::{RobustVolEstimator, robust_vol, robust_vol_panel};
