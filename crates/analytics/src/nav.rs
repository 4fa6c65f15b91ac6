//! Cumulative net asset value curves rebased to a fixed starting level.

use core_types::{Panel, ReturnKind, TimeSeries, finite};

use crate::error::AnalyticsError;

fn check_base(base: f64) -> Result<(), AnalyticsError> {
    if base.is_finite() && base > 0.0 {
        Ok(())
    } else {
        Err(AnalyticsError::invalid("nav base", format!("{base} is not a positive number")))
    }
}

/// Rebases every price column so its first positive price equals `base`.
///
/// Equivalent to compounding simple returns from the first observation.
/// Missing and non-positive prices give missing NAV points.
pub fn cumulative_nav(prices: &Panel, base: f64) -> Result<Panel, AnalyticsError> {
    check_base(base)?;
    Ok(prices.map_columns(|column| {
        let positive: Vec<Option<f64>> = column.iter().map(|p| p.filter(|p| *p > 0.0)).collect();
        let first = positive.iter().flatten().copied().next();
        positive
            .iter()
            .map(|p| match (p, first) {
                (Some(p), Some(first)) => finite(base * p / first),
                _ => None,
            })
            .collect()
    })?)
}

/// Compounds a return series into a NAV curve starting at `base`.
///
/// The row just before the first observed return is the anchor and holds
/// `base`; rows before it are missing. Later missing returns give missing NAV
/// points without interrupting the compounding.
pub fn nav_from_returns(
    returns: &TimeSeries,
    kind: ReturnKind,
    base: f64,
) -> Result<TimeSeries, AnalyticsError> {
    check_base(base)?;
    let values = returns.values();
    let first_observed = values.iter().position(Option::is_some);

    let mut level = 1.0;
    let nav = values
        .iter()
        .enumerate()
        .map(|(i, r)| match (r, first_observed) {
            (Some(r), _) => {
                level *= match kind {
                    ReturnKind::Log => r.exp(),
                    ReturnKind::Simple => 1.0 + r,
                };
                finite(base * level)
            }
            (None, Some(first)) if i + 1 == first => Some(base),
            _ => None,
        })
        .collect();
    Ok(returns.with_values(nav)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::returns::{ReturnOptions, returns};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n).map(|d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap()).collect()
    }

    #[test]
    fn round_trip_reproduces_relative_price_path() {
        let raw = [100.0, 105.0, 110.0, 90.0, 95.0];
        let prices = Panel::new(
            dates(5),
            vec!["A".into()],
            vec![raw.iter().map(|p| Some(*p)).collect()],
        )
        .unwrap();

        let options = ReturnOptions {
            kind: ReturnKind::Simple,
            drop_na: false,
            ..ReturnOptions::default()
        };
        let simple = returns(&prices, &options).unwrap();
        let nav = nav_from_returns(&simple.column("A").unwrap(), ReturnKind::Simple, 100.0).unwrap();
        for (value, expected) in nav.values().iter().zip(raw) {
            assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-9);
        }

        let log = returns(&prices, &ReturnOptions { drop_na: false, ..ReturnOptions::default() }).unwrap();
        let nav = nav_from_returns(&log.column("A").unwrap(), ReturnKind::Log, 100.0).unwrap();
        assert_relative_eq!(nav.get(3).unwrap(), 90.0, epsilon = 1e-9);

        let rebased = cumulative_nav(&prices, 100.0).unwrap();
        for (value, expected) in rebased.column_values(0).iter().zip(raw) {
            assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn late_listing_keeps_leading_gap() {
        let prices = Panel::new(dates(3), vec!["A".into()], vec![vec![None, Some(50.0), Some(55.0)]]).unwrap();
        let nav = cumulative_nav(&prices, 100.0).unwrap();
        assert_eq!(nav.value(0, 0), None);
        assert_relative_eq!(nav.value(1, 0).unwrap(), 100.0);
        assert_relative_eq!(nav.value(2, 0).unwrap(), 110.0, epsilon = 1e-12);
    }

    #[test]
    fn non_positive_prices_are_missing() {
        let prices = Panel::new(
            dates(4),
            vec!["A".into()],
            vec![vec![Some(0.0), Some(20.0), Some(-5.0), Some(30.0)]],
        )
        .unwrap();
        let nav = cumulative_nav(&prices, 100.0).unwrap();
        assert_eq!(nav.value(0, 0), None);
        assert_relative_eq!(nav.value(1, 0).unwrap(), 100.0);
        assert_eq!(nav.value(2, 0), None);
        assert_relative_eq!(nav.value(3, 0).unwrap(), 150.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_positive_base() {
        let prices = Panel::empty();
        assert!(cumulative_nav(&prices, 0.0).is_err());
        assert!(nav_from_returns(&TimeSeries::empty("A"), ReturnKind::Log, -1.0).is_err());
    }
}
