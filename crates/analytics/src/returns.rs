//! Period returns from a wide price panel, with optional calendar resampling.

use core_types::{
    Aggregation, Frequency, Panel, PriceRecord, ResamplePeriod, ReturnKind, TimeSeries, finite,
};
use tracing::debug;

use crate::error::AnalyticsError;
use crate::panel::{CloseField, to_wide_prices_with};

/// Options for [`returns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnOptions {
    pub kind: ReturnKind,
    pub resample: Option<ResamplePeriod>,
    /// Remove rows where every column is missing (typically the first row).
    pub drop_na: bool,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            kind: ReturnKind::Log,
            resample: None,
            drop_na: true,
        }
    }
}

impl ReturnOptions {
    pub fn simple() -> Self {
        Self {
            kind: ReturnKind::Simple,
            ..Self::default()
        }
    }
}

/// Computes a wide return table from a wide price table.
///
/// Log returns are computed per column at native frequency, summed within each
/// resample bucket when requested, then converted with `expm1` for simple
/// returns. Gaps inside a column are left missing, never filled.
pub fn returns(prices: &Panel, options: &ReturnOptions) -> Result<Panel, AnalyticsError> {
    let mut log = log_returns(prices)?;
    if options.drop_na {
        log = log.drop_empty_rows();
    }
    if let Some(period) = options.resample {
        log = resample_sum(&log, period)?;
    }

    let result = match options.kind {
        ReturnKind::Log => log,
        ReturnKind::Simple => log.map_columns(|column| to_simple(column))?,
    };
    debug!(
        kind = %options.kind,
        resample = ?options.resample,
        rows = result.n_rows(),
        columns = result.n_cols(),
        "computed returns"
    );
    Ok(result)
}

/// Pivots long records on `field` and computes their wide return table.
///
/// Only `symbol`, `date` and the chosen price field are read.
pub fn calculate_returns_wide(
    records: &[PriceRecord],
    field: &CloseField,
    options: &ReturnOptions,
) -> Result<Panel, AnalyticsError> {
    let prices = to_wide_prices_with(records, field)?;
    returns(&prices, options)
}

/// ln(P_t) - ln(P_{t-1}) for every column; the first row is always missing.
pub fn log_returns(prices: &Panel) -> Result<Panel, AnalyticsError> {
    Ok(prices.map_columns(log_diff)?)
}

/// Log differences of consecutive rows of one column.
///
/// A non-positive price has no finite logarithm, so any return touching it is
/// missing rather than zero.
pub fn log_diff(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    let logs: Vec<Option<f64>> = prices.iter().map(|p| p.and_then(|p| finite(p.ln()))).collect();
    let mut out = Vec::with_capacity(prices.len());
    if !prices.is_empty() {
        out.push(None);
    }
    out.extend(logs.windows(2).map(|w| match (w[0], w[1]) {
        (Some(previous), Some(current)) => finite(current - previous),
        _ => None,
    }));
    out
}

/// exp(r) - 1 applied to a column of log returns.
pub fn to_simple(log_returns: &[Option<f64>]) -> Vec<Option<f64>> {
    log_returns
        .iter()
        .map(|r| r.and_then(|r| finite(r.exp_m1())))
        .collect()
}

/// Sums each column within calendar buckets, labelled by bucket end date.
///
/// Only buckets containing at least one row are emitted. A column with no
/// observation inside a bucket is missing for that bucket.
pub fn resample_sum(panel: &Panel, period: ResamplePeriod) -> Result<Panel, AnalyticsError> {
    let groups = bucket_rows(panel.dates(), Aggregation::Calendar(period));
    let dates = groups.iter().map(|(end, _)| *end).collect();
    let values = (0..panel.n_cols())
        .map(|col| {
            let column = panel.column_values(col);
            groups
                .iter()
                .map(|(_, rows)| sum_present(rows.iter().map(|&r| column[r])))
                .collect()
        })
        .collect();
    Ok(Panel::new(dates, panel.columns().to_vec(), values)?)
}

/// Aggregates a single series to `frequency`; identity for `Frequency::Natural`.
///
/// Months and years are calendar periods labelled by their end date. Weeks are
/// seven-day bins starting at the first date of the series, labelled by their
/// start date.
pub fn sum_at_frequency(
    series: &TimeSeries,
    frequency: Frequency,
) -> Result<TimeSeries, AnalyticsError> {
    let Some(aggregation) = frequency.aggregation() else {
        return Ok(series.clone());
    };
    let groups = bucket_rows(series.dates(), aggregation);
    let dates = groups.iter().map(|(label, _)| *label).collect();
    let values = groups
        .iter()
        .map(|(_, rows)| sum_present(rows.iter().map(|&r| series.values()[r])))
        .collect();
    Ok(TimeSeries::new(series.name(), dates, values)?)
}

fn bucket_rows(
    dates: &[chrono::NaiveDate],
    aggregation: Aggregation,
) -> Vec<(chrono::NaiveDate, Vec<usize>)> {
    let Some(anchor) = dates.first().copied() else {
        return Vec::new();
    };
    let mut groups: Vec<(chrono::NaiveDate, Vec<usize>)> = Vec::new();
    for (row, date) in dates.iter().enumerate() {
        let label = aggregation.bucket_label(anchor, *date);
        match groups.last_mut() {
            Some((current, rows)) if *current == label => rows.push(row),
            _ => groups.push((label, vec![row])),
        }
    }
    groups
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
        .and_then(finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn single(prices: Vec<Option<f64>>, dates: Vec<NaiveDate>) -> Panel {
        Panel::new(dates, vec!["A".into()], vec![prices]).unwrap()
    }

    #[test]
    fn log_and_simple_returns_are_consistent() {
        let prices = single(
            vec![Some(100.0), Some(105.0), Some(110.0), Some(90.0), Some(95.0)],
            (1..=5).map(|d| date(1, d)).collect(),
        );
        let log = returns(&prices, &ReturnOptions::default()).unwrap();
        let simple = returns(&prices, &ReturnOptions::simple()).unwrap();

        assert_eq!(log.n_rows(), 4);
        assert_eq!(log.dates()[0], date(1, 2));
        let raw = [100.0_f64, 105.0, 110.0, 90.0, 95.0];
        for t in 1..raw.len() {
            let expected_log = raw[t].ln() - raw[t - 1].ln();
            assert_relative_eq!(log.value(t - 1, 0).unwrap(), expected_log, epsilon = 1e-15);
            assert_relative_eq!(
                simple.value(t - 1, 0).unwrap(),
                expected_log.exp_m1(),
                epsilon = 1e-15
            );
            assert_relative_eq!(simple.value(t - 1, 0).unwrap(), raw[t] / raw[t - 1] - 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn keep_na_retains_leading_row() {
        let prices = single(vec![Some(1.0), Some(2.0)], vec![date(1, 1), date(1, 2)]);
        let options = ReturnOptions {
            drop_na: false,
            ..ReturnOptions::default()
        };
        let kept = returns(&prices, &options).unwrap();
        assert_eq!(kept.n_rows(), 2);
        assert_eq!(kept.value(0, 0), None);
    }

    #[test]
    fn non_positive_price_yields_missing_return() {
        let prices = single(
            vec![Some(10.0), Some(0.0), Some(10.0), Some(-1.0), Some(12.0), Some(13.0)],
            (1..=6).map(|d| date(1, d)).collect(),
        );
        let log = log_returns(&prices).unwrap();
        let column = log.column("A").unwrap();
        assert_eq!(&column.values()[..5], &[None, None, None, None, None]);
        assert_relative_eq!(column.values()[5].unwrap(), (13.0_f64 / 12.0).ln(), epsilon = 1e-15);
    }

    #[test]
    fn monthly_resample_sums_daily_log_returns() {
        let dates = vec![date(1, 30), date(1, 31), date(2, 1), date(2, 2), date(2, 29), date(3, 1)];
        let prices = single(
            vec![Some(100.0), Some(101.0), Some(99.0), Some(102.0), Some(104.0), Some(103.0)],
            dates,
        );
        let options = ReturnOptions {
            resample: Some(ResamplePeriod::MonthEnd),
            ..ReturnOptions::default()
        };
        let monthly = returns(&prices, &options).unwrap();

        assert_eq!(monthly.dates(), &[date(1, 31), date(2, 29), date(3, 31)]);
        assert_relative_eq!(monthly.value(0, 0).unwrap(), (101.0_f64 / 100.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(monthly.value(1, 0).unwrap(), (104.0_f64 / 101.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(monthly.value(2, 0).unwrap(), (103.0_f64 / 104.0).ln(), epsilon = 1e-12);

        let simple = returns(
            &prices,
            &ReturnOptions {
                kind: ReturnKind::Simple,
                ..options
            },
        )
        .unwrap();
        assert_relative_eq!(simple.value(1, 0).unwrap(), 104.0 / 101.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sparse_column_keeps_internal_gaps() {
        let dates = vec![date(1, 1), date(1, 2), date(1, 3), date(1, 4)];
        let prices = Panel::new(
            dates,
            vec!["A".into(), "B".into()],
            vec![
                vec![Some(1.0), Some(1.1), Some(1.2), Some(1.3)],
                vec![Some(5.0), None, Some(5.5), Some(6.0)],
            ],
        )
        .unwrap();
        let log = returns(&prices, &ReturnOptions::default()).unwrap();
        assert_eq!(log.n_rows(), 3);
        let b = log.column("B").unwrap();
        assert_eq!(&b.values()[..2], &[None, None]);
        assert!(b.values()[2].is_some());
    }

    #[test]
    fn empty_panel_returns_empty_panel() {
        let prices = Panel::empty_with_columns(vec!["A".into()]);
        let log = returns(&prices, &ReturnOptions::default()).unwrap();
        assert_eq!(log.n_rows(), 0);
        assert_eq!(log.columns(), &["A".to_string()]);
    }

    #[test]
    fn returns_from_named_price_field() {
        let records = vec![
            PriceRecord::new("A", date(1, 1), 10.0).with_field("adj_close", 20.0),
            PriceRecord::new("A", date(1, 2), 11.0).with_field("adj_close", 30.0),
            PriceRecord::new("B", date(1, 2), 5.0),
        ];
        let adjusted = calculate_returns_wide(
            &records,
            &CloseField::from_column("adj_close"),
            &ReturnOptions::simple(),
        )
        .unwrap();
        assert_eq!(adjusted.columns(), &["A".to_string(), "B".to_string()]);
        assert_relative_eq!(adjusted.value(0, 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(adjusted.value(0, 1), None);

        let close = calculate_returns_wide(&records, &CloseField::Close, &ReturnOptions::simple()).unwrap();
        assert_relative_eq!(close.value(0, 0).unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn natural_frequency_is_identity() {
        let s = TimeSeries::from_values("A", vec![date(1, 1), date(1, 2)], vec![0.1, 0.2]).unwrap();
        assert_eq!(sum_at_frequency(&s, Frequency::Natural).unwrap(), s);
        let weekly = sum_at_frequency(&s, Frequency::Week).unwrap();
        assert_eq!(weekly.dates(), &[date(1, 1)]);
        assert_relative_eq!(weekly.get(0).unwrap(), 0.3, epsilon = 1e-15);
    }

    #[test]
    fn weekly_sums_use_seven_day_bins_from_first_date() {
        // Starts on a Wednesday, so Friday-ending weeks would split 3 + 5.
        let dates: Vec<NaiveDate> = (3..=10).map(|d| date(1, d)).collect();
        let s = TimeSeries::from_values("A", dates, vec![0.01; 8]).unwrap();
        let weekly = sum_at_frequency(&s, Frequency::Week).unwrap();

        assert_eq!(weekly.dates(), &[date(1, 3), date(1, 10)]);
        assert_relative_eq!(weekly.get(0).unwrap(), 0.07, epsilon = 1e-12);
        assert_relative_eq!(weekly.get(1).unwrap(), 0.01, epsilon = 1e-12);

        let resampled = resample_sum(
            &Panel::from_series(vec![s]).unwrap(),
            ResamplePeriod::WeekEndingFriday,
        )
        .unwrap();
        assert_eq!(resampled.dates(), &[date(1, 5), date(1, 12)]);
    }
}
