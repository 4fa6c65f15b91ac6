use serde::Serialize;

use core_types::{Panel, finite};

/// Symmetric matrix of pairwise Pearson correlations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    /// Row-major, `values[i][j]` correlates `symbols[i]` with `symbols[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Pearson correlation over the rows where both columns are observed.
///
/// `None` with fewer than two common observations or when either side has
/// zero variance over the common rows.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    finite(sxy / (sxx * syy).sqrt()).map(|r| r.clamp(-1.0, 1.0))
}

/// Pairwise-complete correlation of every pair of columns.
pub fn correlation_matrix(returns: &Panel) -> CorrelationMatrix {
    let n = returns.n_cols();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(returns.column_values(i), returns.column_values(j));
            // The diagonal is exactly one whenever the column has dispersion.
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        symbols: returns.columns().to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn panel(columns: Vec<Vec<Option<f64>>>) -> Panel {
        let n = columns[0].len() as u32;
        let dates = (1..=n).map(|d| NaiveDate::from_ymd_opt(2023, 3, d).unwrap()).collect();
        let names = (0..columns.len()).map(|i| format!("S{i}")).collect();
        Panel::new(dates, names, columns).unwrap()
    }

    #[test]
    fn perfectly_linear_columns() {
        let p = panel(vec![
            vec![Some(0.01), Some(0.02), Some(-0.01), Some(0.03)],
            vec![Some(0.02), Some(0.04), Some(-0.02), Some(0.06)],
            vec![Some(-0.01), Some(-0.02), Some(0.01), Some(-0.03)],
        ]);
        let m = correlation_matrix(&p);
        assert_eq!(m.get("S0", "S0"), Some(1.0));
        assert_relative_eq!(m.get("S0", "S1").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.get("S0", "S2").unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(m.get("S1", "S2"), m.get("S2", "S1"));
    }

    #[test]
    fn uses_only_common_rows() {
        let x = [Some(1.0), Some(2.0), None, Some(4.0), Some(100.0)];
        let y = [Some(2.0), Some(4.0), Some(7.0), Some(8.0), None];
        assert_relative_eq!(pearson(&x, &y).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_missing() {
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
        assert_eq!(pearson(&[Some(1.0), Some(1.0)], &[Some(2.0), Some(3.0)]), None);
        let p = panel(vec![vec![Some(0.0), Some(0.0)], vec![Some(1.0), Some(2.0)]]);
        let m = correlation_matrix(&p);
        assert_eq!(m.get("S0", "S0"), None);
        assert_eq!(m.get("S1", "S1"), Some(1.0));
        assert_eq!(m.get("S0", "missing"), None);
    }
}
