//! # Index360 Core Types
//!
//! The shared vocabulary of the workspace: raw price records, the closed
//! enumerations that select aggregation behaviour, and the date-indexed
//! `TimeSeries`/`Panel` containers that every analytics routine consumes and
//! produces.
//!
//! Missing observations are represented explicitly as `Option<f64>`. Any
//! computation that produces a non-finite float stores `None` instead.

pub mod enums;
pub mod error;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Aggregation, Frequency, ResamplePeriod, ReturnKind};
pub use error::CoreError;
pub use series::{Panel, TimeSeries, finite};
pub use structs::PriceRecord;
