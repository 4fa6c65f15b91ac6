//! Descriptive statistics over the observed values of a series.
//!
//! Callers pass only the present values; missing observations are excluded
//! before they get here, as in standard descriptive statistics.

use core_types::finite;

/// Central moments smaller than this are treated as floating-point noise.
const MOMENT_NOISE_FLOOR: f64 = 1e-14;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs two observations.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    finite((sum_sq / (n - 1) as f64).sqrt())
}

/// Adjusted Fisher-Pearson sample skewness. Needs three observations.
///
/// A series with no dispersion has a skew of exactly zero.
pub fn skew(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mean = mean(values)?;
    let (mut m2, mut m3) = values.iter().fold((0.0, 0.0), |(m2, m3), x| {
        let d = x - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    if m2.abs() < MOMENT_NOISE_FLOOR {
        m2 = 0.0;
    }
    if m3.abs() < MOMENT_NOISE_FLOOR {
        m3 = 0.0;
    }
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    finite(n * (n - 1.0).sqrt() / (n - 2.0) * (m3 / m2.powf(1.5)))
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    finite(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
