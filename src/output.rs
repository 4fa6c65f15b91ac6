//! Terminal rendering of the analytics results: comfy-table by default,
//! pretty JSON with `--json`.

use analytics::{CorrelationMatrix, MonthlyReturnRow, PeriodSnapshot, StatisticKey, StatisticsTable};
use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Row, Table};
use core_types::Panel;
use serde::Serialize;

const MISSING: &str = "-";

/// How the cells of a numeric table are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    /// Fractions shown as percentages, e.g. `0.0123` as `1.23%`.
    Percent,
    /// Levels and ratios shown with two decimals.
    Level,
    /// Values that are already percentages, e.g. the monthly calendar.
    PercentPoints,
}

impl ValueStyle {
    fn format(self, value: Option<f64>) -> String {
        match (self, value) {
            (_, None) => MISSING.to_string(),
            (ValueStyle::Percent, Some(v)) => format!("{:.2}%", v * 100.0),
            (ValueStyle::Level, Some(v)) => format!("{v:.2}"),
            (ValueStyle::PercentPoints, Some(v)) => format!("{v:.2}"),
        }
    }
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn numeric_row(label: String, cells: impl IntoIterator<Item = String>) -> Row {
    let mut row = Row::new();
    row.add_cell(Cell::new(label));
    for cell in cells {
        row.add_cell(Cell::new(cell).set_alignment(CellAlignment::Right));
    }
    row
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Rows are dates, columns are symbols.
pub fn print_panel(panel: &Panel, style: ValueStyle, json: bool) -> Result<()> {
    if json {
        return print_json(panel);
    }
    let header = std::iter::once("date".to_string())
        .chain(panel.columns().iter().cloned())
        .collect();
    let mut table = new_table(header);
    for (row, date) in panel.dates().iter().enumerate() {
        let cells = panel.row(row).into_iter().map(|v| style.format(v));
        table.add_row(numeric_row(date.to_string(), cells));
    }
    println!("{table}");
    Ok(())
}

pub fn print_statistics(stats: &StatisticsTable, json: bool) -> Result<()> {
    if json {
        return print_json(stats);
    }
    let header = std::iter::once(format!("symbol ({})", stats.frequency))
        .chain(StatisticKey::ALL.iter().map(|k| k.name().to_string()))
        .collect();
    let mut table = new_table(header);
    for (symbol, cells) in stats.formatted_rows() {
        table.add_row(numeric_row(symbol, cells));
    }
    println!("{table}");
    Ok(())
}

pub fn print_correlation(matrix: &CorrelationMatrix, json: bool) -> Result<()> {
    if json {
        return print_json(matrix);
    }
    let header = std::iter::once(String::new())
        .chain(matrix.symbols.iter().cloned())
        .collect();
    let mut table = new_table(header);
    for (symbol, values) in matrix.symbols.iter().zip(&matrix.values) {
        let cells = values.iter().map(|v| ValueStyle::Level.format(*v));
        table.add_row(numeric_row(symbol.clone(), cells));
    }
    println!("{table}");
    Ok(())
}

pub fn print_calendar(rows: &[MonthlyReturnRow], json: bool) -> Result<()> {
    if json {
        return print_json(rows);
    }
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let header = ["symbol", "year"]
        .into_iter()
        .chain(MONTHS)
        .chain(["YTD"])
        .map(str::to_string)
        .collect();
    let mut table = new_table(header);
    for row in rows {
        let mut cells = vec![row.year.to_string()];
        cells.extend(row.months.iter().map(|m| ValueStyle::PercentPoints.format(*m)));
        cells.push(ValueStyle::PercentPoints.format(row.ytd));
        table.add_row(numeric_row(row.symbol.clone(), cells));
    }
    println!("{table}");
    Ok(())
}

/// One table per period, newest first, best mover at the top.
pub fn print_movers(snapshots: &[PeriodSnapshot], style: ValueStyle, json: bool) -> Result<()> {
    if json {
        return print_json(snapshots);
    }
    for snapshot in snapshots {
        let mut table = new_table(vec![snapshot.date.to_string(), "value".to_string()]);
        let ranked = snapshot
            .entries
            .iter()
            .filter(|(_, v)| v.is_some())
            .rev()
            .chain(snapshot.entries.iter().filter(|(_, v)| v.is_none()));
        for (symbol, value) in ranked {
            table.add_row(numeric_row(symbol.clone(), [style.format(*value)]));
        }
        println!("{table}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_styles() {
        assert_eq!(ValueStyle::Percent.format(Some(0.0123)), "1.23%");
        assert_eq!(ValueStyle::Level.format(Some(104.567)), "104.57");
        assert_eq!(ValueStyle::PercentPoints.format(Some(-3.456)), "-3.46");
        assert_eq!(ValueStyle::Percent.format(None), "-");
    }
}
