use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Business days per year used for native-frequency annualization.
///
/// A convention (256 = 16²) rather than an actual calendar count.
pub const BUSINESS_DAYS_IN_YEAR: f64 = 256.0;
pub const WEEKS_PER_YEAR: f64 = 52.25;
pub const MONTHS_PER_YEAR: f64 = 12.0;
/// Length of the fixed bins weekly statistics are summed over.
pub const DAYS_PER_WEEK_BIN: i64 = 7;

/// The aggregation granularity of a statistics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// The series' own periodicity (treated as business days).
    #[default]
    #[serde(alias = "native", alias = "day", alias = "daily")]
    Natural,
    #[serde(alias = "weekly")]
    Week,
    #[serde(alias = "monthly")]
    Month,
    #[serde(alias = "yearly", alias = "annual")]
    Year,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Natural,
        Frequency::Week,
        Frequency::Month,
        Frequency::Year,
    ];

    /// The annualization constant for this frequency.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Frequency::Natural => BUSINESS_DAYS_IN_YEAR,
            Frequency::Week => WEEKS_PER_YEAR,
            Frequency::Month => MONTHS_PER_YEAR,
            Frequency::Year => 1.0,
        }
    }

    /// How a native series is grouped before statistics at this frequency.
    /// `None` means the series is used as-is.
    ///
    /// Weekly statistics use fixed seven-day bins from the first date, not
    /// the Friday-ending calendar weeks of return resampling.
    pub fn aggregation(&self) -> Option<Aggregation> {
        match self {
            Frequency::Natural => None,
            Frequency::Week => Some(Aggregation::FixedDays(DAYS_PER_WEEK_BIN)),
            Frequency::Month => Some(Aggregation::Calendar(ResamplePeriod::MonthEnd)),
            Frequency::Year => Some(Aggregation::Calendar(ResamplePeriod::YearEnd)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Natural => "Natural",
            Frequency::Week => "Week",
            Frequency::Month => "Month",
            Frequency::Year => "Year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" | "native" | "day" | "daily" => Ok(Frequency::Natural),
            "week" | "weekly" => Ok(Frequency::Week),
            "month" | "monthly" => Ok(Frequency::Month),
            "year" | "yearly" | "annual" => Ok(Frequency::Year),
            other => {
                let expected: Vec<String> = Frequency::ALL
                    .iter()
                    .map(|f| f.name().to_ascii_lowercase())
                    .collect();
                Err(CoreError::InvalidInput(
                    "frequency".to_string(),
                    format!("'{other}', expected one of {}", expected.join(", ")),
                ))
            }
        }
    }
}

/// Grouping of a native series into the periods of a coarser frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Calendar periods labelled by their end date.
    Calendar(ResamplePeriod),
    /// Bins of this many days anchored at the first date of the series and
    /// labelled by their start date.
    FixedDays(i64),
}

impl Aggregation {
    /// Label of the bucket holding `date` in a series whose first date is `anchor`.
    pub fn bucket_label(&self, anchor: NaiveDate, date: NaiveDate) -> NaiveDate {
        match self {
            Aggregation::Calendar(period) => period.bucket_end(date),
            Aggregation::FixedDays(days) => {
                let days = (*days).max(1);
                let offset = (date - anchor).num_days().div_euclid(days) * days;
                anchor + chrono::Duration::days(offset)
            }
        }
    }
}

/// Calendar buckets used when resampling a daily series to a coarser period.
///
/// Each bucket is labelled with its period end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResamplePeriod {
    #[serde(rename = "W-FRI", alias = "weekly", alias = "week")]
    WeekEndingFriday,
    #[serde(rename = "ME", alias = "monthly", alias = "month")]
    MonthEnd,
    #[serde(rename = "QE", alias = "quarterly", alias = "quarter")]
    QuarterEnd,
    #[serde(rename = "YE", alias = "annual", alias = "year")]
    YearEnd,
}

impl ResamplePeriod {
    /// Returns the label (period end date) of the bucket containing `date`.
    pub fn bucket_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            ResamplePeriod::WeekEndingFriday => {
                let weekday = date.weekday().num_days_from_monday() as i64;
                let days_ahead = (4 - weekday).rem_euclid(7);
                date + chrono::Duration::days(days_ahead)
            }
            ResamplePeriod::MonthEnd => last_day_of_month(date.year(), date.month()),
            ResamplePeriod::QuarterEnd => {
                let quarter_end_month = ((date.month() - 1) / 3 + 1) * 3;
                last_day_of_month(date.year(), quarter_end_month)
            }
            ResamplePeriod::YearEnd => last_day_of_month(date.year(), 12),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ResamplePeriod::WeekEndingFriday => "W-FRI",
            ResamplePeriod::MonthEnd => "ME",
            ResamplePeriod::QuarterEnd => "QE",
            ResamplePeriod::YearEnd => "YE",
        }
    }
}

impl fmt::Display for ResamplePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ResamplePeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W-FRI" | "W" | "WEEK" | "WEEKLY" => Ok(ResamplePeriod::WeekEndingFriday),
            "ME" | "M" | "MONTH" | "MONTHLY" => Ok(ResamplePeriod::MonthEnd),
            "QE" | "Q" | "QUARTER" | "QUARTERLY" => Ok(ResamplePeriod::QuarterEnd),
            "YE" | "Y" | "YEAR" | "ANNUAL" | "YEARLY" => Ok(ResamplePeriod::YearEnd),
            _ => Err(CoreError::InvalidInput(
                "resample period".to_string(),
                s.to_string(),
            )),
        }
    }
}

/// The arithmetic form of a period return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// ln(P_t) - ln(P_{t-1}); additive across time.
    #[default]
    Log,
    /// P_t / P_{t-1} - 1, derived as expm1 of the log return.
    Simple,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Log => f.write_str("log"),
            ReturnKind::Simple => f.write_str("simple"),
        }
    }
}

impl FromStr for ReturnKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(ReturnKind::Log),
            "simple" | "pct" => Ok(ReturnKind::Simple),
            other => Err(CoreError::InvalidInput(
                "return kind".to_string(),
                other.to_string(),
            )),
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn periods_per_year_table() {
        assert_eq!(Frequency::Natural.periods_per_year(), 256.0);
        assert_eq!(Frequency::Week.periods_per_year(), 52.25);
        assert_eq!(Frequency::Month.periods_per_year(), 12.0);
        assert_eq!(Frequency::Year.periods_per_year(), 1.0);
    }

    #[test]
    fn week_bucket_ends_on_friday() {
        // 2024-01-01 is a Monday.
        assert_eq!(ResamplePeriod::WeekEndingFriday.bucket_end(date(2024, 1, 1)), date(2024, 1, 5));
        assert_eq!(ResamplePeriod::WeekEndingFriday.bucket_end(date(2024, 1, 5)), date(2024, 1, 5));
        assert_eq!(ResamplePeriod::WeekEndingFriday.bucket_end(date(2024, 1, 6)), date(2024, 1, 12));
    }

    #[test]
    fn weekly_statistics_bins_start_at_first_date() {
        // 2024-01-03 is a Wednesday; bins run Wednesday to Tuesday.
        let week = Frequency::Week.aggregation().unwrap();
        let anchor = date(2024, 1, 3);
        assert_eq!(week.bucket_label(anchor, anchor), anchor);
        assert_eq!(week.bucket_label(anchor, date(2024, 1, 9)), anchor);
        assert_eq!(week.bucket_label(anchor, date(2024, 1, 10)), date(2024, 1, 10));
        assert_eq!(week.bucket_label(anchor, date(2024, 1, 20)), date(2024, 1, 17));

        let month = Frequency::Month.aggregation().unwrap();
        assert_eq!(month.bucket_label(anchor, date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(Frequency::Natural.aggregation(), None);
    }

    #[test]
    fn month_quarter_and_year_ends() {
        assert_eq!(ResamplePeriod::MonthEnd.bucket_end(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(ResamplePeriod::MonthEnd.bucket_end(date(2023, 12, 1)), date(2023, 12, 31));
        assert_eq!(ResamplePeriod::QuarterEnd.bucket_end(date(2024, 5, 3)), date(2024, 6, 30));
        assert_eq!(ResamplePeriod::QuarterEnd.bucket_end(date(2024, 11, 3)), date(2024, 12, 31));
        assert_eq!(ResamplePeriod::YearEnd.bucket_end(date(2024, 5, 3)), date(2024, 12, 31));
    }

    #[test]
    fn parses_selector_strings() {
        assert_eq!("native".parse::<Frequency>().unwrap(), Frequency::Natural);
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Month);
        let err = "fortnight".parse::<Frequency>().unwrap_err();
        assert!(err.to_string().contains("natural, week, month, year"));
        assert_eq!("W-FRI".parse::<ResamplePeriod>().unwrap(), ResamplePeriod::WeekEndingFriday);
        assert_eq!("qe".parse::<ResamplePeriod>().unwrap(), ResamplePeriod::QuarterEnd);
        assert_eq!("simple".parse::<ReturnKind>().unwrap(), ReturnKind::Simple);
    }
}
