use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::CoreError;

/// Maps a float to `Some` only when it is finite.
///
/// Every analytics routine stores its output through this function so that
/// NaN and infinities surface as explicit missing values.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn check_index(dates: &[NaiveDate]) -> Result<(), CoreError> {
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            return Err(CoreError::UnsortedIndex {
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// A single named, date-indexed column of optional values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Creates a series, checking that the index is strictly ascending and
    /// matches the number of values.
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(CoreError::ShapeMismatch {
                column: name,
                expected: dates.len(),
                actual: values.len(),
            });
        }
        check_index(&dates)?;
        Ok(Self {
            name,
            dates,
            values: values.into_iter().map(|v| v.and_then(finite)).collect(),
        })
    }

    /// Creates a series from raw floats; non-finite entries become missing.
    pub fn from_values(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self, CoreError> {
        Self::new(name, dates, values.into_iter().map(finite).collect())
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Iterates `(date, value)` pairs, including missing values.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Iterates only the observed (non-missing) values.
    pub fn observed(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn count(&self) -> usize {
        self.observed().count()
    }

    /// Replaces the values while keeping the index and name.
    pub fn with_values(&self, values: Vec<Option<f64>>) -> Result<Self, CoreError> {
        Self::new(self.name.clone(), self.dates.clone(), values)
    }

    /// Applies `f` to every observed value; missing stays missing.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: self.name.clone(),
            dates: self.dates.clone(),
            values: self
                .values
                .iter()
                .map(|v| v.and_then(|x| finite(f(x))))
                .collect(),
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A wide, date-indexed table: one row per date, one column per symbol.
///
/// Values are stored column-major so per-symbol transforms never touch
/// other columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl Panel {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, CoreError> {
        check_index(&dates)?;
        if columns.len() != values.len() {
            return Err(CoreError::InvalidInput(
                "panel".to_string(),
                format!("{} column names for {} columns", columns.len(), values.len()),
            ));
        }
        let mut seen = HashSet::new();
        for (name, column) in columns.iter().zip(&values) {
            if !seen.insert(name.as_str()) {
                return Err(CoreError::DuplicateColumn(name.clone()));
            }
            if column.len() != dates.len() {
                return Err(CoreError::ShapeMismatch {
                    column: name.clone(),
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
        }
        let values = values
            .into_iter()
            .map(|column| column.into_iter().map(|v| v.and_then(finite)).collect())
            .collect();
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// An empty panel with no dates and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty panel that keeps its column names.
    pub fn empty_with_columns(columns: Vec<String>) -> Self {
        let values = vec![Vec::new(); columns.len()];
        Self {
            dates: Vec::new(),
            columns,
            values,
        }
    }

    /// Assembles a panel from series that share one index.
    pub fn from_series(series: Vec<TimeSeries>) -> Result<Self, CoreError> {
        let Some(first) = series.first() else {
            return Ok(Self::empty());
        };
        let dates = first.dates.clone();
        let mut columns = Vec::with_capacity(series.len());
        let mut values = Vec::with_capacity(series.len());
        for s in series {
            if s.dates != dates {
                return Err(CoreError::InvalidInput(
                    s.name.clone(),
                    "series index differs from the first column".to_string(),
                ));
            }
            columns.push(s.name);
            values.push(s.values);
        }
        Self::new(dates, columns, values)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, index: usize) -> &[Option<f64>] {
        &self.values[index]
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(col).and_then(|c| c.get(row)).copied().flatten()
    }

    /// Returns one column as a standalone series.
    pub fn column(&self, name: &str) -> Option<TimeSeries> {
        self.column_index(name).map(|i| self.series_at(i))
    }

    fn series_at(&self, index: usize) -> TimeSeries {
        TimeSeries {
            name: self.columns[index].clone(),
            dates: self.dates.clone(),
            values: self.values[index].clone(),
        }
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = TimeSeries> + '_ {
        (0..self.columns.len()).map(|i| self.series_at(i))
    }

    /// All values of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.values.iter().map(|c| c[row]).collect()
    }

    /// Keeps only the named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Self, CoreError> {
        let mut columns = Vec::with_capacity(symbols.len());
        let mut values = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref();
            let index = self.column_index(symbol).ok_or_else(|| {
                CoreError::InvalidInput("symbol".to_string(), symbol.to_string())
            })?;
            columns.push(self.columns[index].clone());
            values.push(self.values[index].clone());
        }
        Self::new(self.dates.clone(), columns, values)
    }

    /// Transforms every column independently while keeping the index.
    pub fn map_columns(
        &self,
        f: impl Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    ) -> Result<Self, CoreError> {
        let values = self.values.iter().map(|c| f(c)).collect();
        Self::new(self.dates.clone(), self.columns.clone(), values)
    }

    /// Removes rows in which every column is missing.
    pub fn drop_empty_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&row| self.values.iter().any(|c| c[row].is_some()))
            .collect();
        self.take_rows(&keep)
    }

    /// Keeps only rows in which every column is observed.
    pub fn drop_incomplete_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&row| self.values.iter().all(|c| c[row].is_some()))
            .collect();
        self.take_rows(&keep)
    }

    /// The last `n` rows (or all rows if there are fewer).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.n_rows().saturating_sub(n);
        let keep: Vec<usize> = (start..self.n_rows()).collect();
        self.take_rows(&keep)
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|c| rows.iter().map(|&r| c[r]).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn rejects_unsorted_index() {
        let result = TimeSeries::from_values("x", vec![date(2), date(1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(CoreError::UnsortedIndex { .. })));
    }

    #[test]
    fn non_finite_values_become_missing() {
        let s = TimeSeries::from_values("x", vec![date(1), date(2)], vec![f64::NAN, 1.0]).unwrap();
        assert_eq!(s.values(), &[None, Some(1.0)]);
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn panel_shape_is_validated() {
        let result = Panel::new(vec![date(1), date(2)], vec!["A".into()], vec![vec![Some(1.0)]]);
        assert!(matches!(result, Err(CoreError::ShapeMismatch { .. })));

        let result = Panel::new(
            vec![date(1)],
            vec!["A".into(), "A".into()],
            vec![vec![Some(1.0)], vec![Some(2.0)]],
        );
        assert!(matches!(result, Err(CoreError::DuplicateColumn(_))));
    }

    #[test]
    fn drop_empty_rows_keeps_partial_rows() {
        let panel = Panel::new(
            vec![date(1), date(2), date(3)],
            vec!["A".into(), "B".into()],
            vec![vec![None, Some(1.0), None], vec![None, None, Some(2.0)]],
        )
        .unwrap();
        let trimmed = panel.drop_empty_rows();
        assert_eq!(trimmed.dates(), &[date(2), date(3)]);
        assert_eq!(trimmed.row(0), vec![Some(1.0), None]);
        assert_eq!(panel.drop_incomplete_rows().n_rows(), 0);

        let complete = Panel::new(
            vec![date(1), date(2)],
            vec!["A".into(), "B".into()],
            vec![vec![Some(1.0), Some(3.0)], vec![None, Some(4.0)]],
        )
        .unwrap()
        .drop_incomplete_rows();
        assert_eq!(complete.dates(), &[date(2)]);
    }

    #[test]
    fn select_unknown_symbol_fails() {
        let panel = Panel::new(vec![date(1)], vec!["A".into()], vec![vec![Some(1.0)]]).unwrap();
        assert!(panel.select(&["B"]).is_err());
        assert_eq!(panel.select(&["A"]).unwrap().n_cols(), 1);
    }
}
