//! In-memory tabular data for the data-analysis section.
//!
//! A [`Table`] is a header row plus rows of [`Cell`]s. It is deliberately
//! small: loading ([`load`]), keyword queries ([`query`]), cleaning
//! ([`clean`]), statistics ([`stats`]) and the HTML profile ([`profile`])
//! are all built on the handful of accessors below.

pub mod clean;
pub mod load;
pub mod profile;
pub mod query;
pub mod stats;

use std::fmt;

use thiserror::Error;

pub use clean::Fill;
pub use load::{DatasetKind, is_dataset, load_table};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("unsupported dataset type '{0}' (expected .csv, .xlsx or .txt)")]
    Unsupported(String),
    #[error("error reading file: {0}")]
    Load(String),
    #[error("column '{0}' not found")]
    UnknownColumn(String),
    #[error("column '{0}' is not numerical")]
    NotNumeric(String),
    #[error("no numerical columns found in the dataset")]
    NoNumericColumns,
    #[error("no columns matching '{0}' found in the dataset")]
    NoMatchingColumns(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("report generation failed: {0}")]
    Report(String),
}

/// Strings read as missing values, in addition to the empty string.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "#NA", "<NA>",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classify a raw field: missing marker → `Empty`, float → `Number`,
    /// anything else → `Text`.
    pub fn parse(raw: &str) -> Cell {
        let t = raw.trim();
        if t.is_empty() || MISSING_MARKERS.contains(&t) {
            return Cell::Empty;
        }
        match t.parse::<f64>() {
            Ok(n) if n.is_nan() => Cell::Empty,
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Type-tagged key used for equality grouping (duplicates, value counts).
    fn key(&self) -> String {
        match self {
            Cell::Empty => "\u{0}".to_string(),
            Cell::Number(n) => format!("n{}", n),
            Cell::Text(s) => format!("t{s}"),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("nan"),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Integers without a trailing `.0`; everything else via `f64`'s `Display`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table; short rows are padded with `Empty`, long rows truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Empty);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named exactly `name`.
    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Numeric: every non-empty cell is a number and there is at least one.
    pub fn is_numeric(&self, idx: usize) -> bool {
        let mut seen = false;
        for cell in self.column_cells(idx) {
            match cell {
                Cell::Number(_) => seen = true,
                Cell::Empty => {}
                Cell::Text(_) => return false,
            }
        }
        seen
    }

    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.n_cols()).filter(|&i| self.is_numeric(i)).collect()
    }

    /// Non-missing values of a numeric column, in row order.
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column_cells(idx).filter_map(Cell::as_number).collect()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }

    /// Pipe table with a leading row-index column. `max_rows == 0` renders
    /// every row; otherwise only the first `max_rows`.
    pub fn to_markdown(&self, max_rows: usize) -> String {
        let shown = if max_rows == 0 { self.n_rows() } else { self.n_rows().min(max_rows) };
        let numeric: Vec<bool> = (0..self.n_cols()).map(|i| self.is_numeric(i)).collect();

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        let mut align = vec![true];
        align.extend(numeric.iter().copied());

        let body: Vec<Vec<String>> = self.rows[..shown]
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut cells = vec![i.to_string()];
                cells.extend(row.iter().map(|c| c.to_string()));
                cells
            })
            .collect();

        let mut out = pipe_table(&header, &align, &body);
        if shown < self.n_rows() {
            out.push_str(&format!("\n({} more rows not shown)", self.n_rows() - shown));
        }
        out
    }
}

/// Two-column pipe table for a labelled series of values.
pub fn series_markdown(index_header: &str, value_header: &str, items: &[(String, String)]) -> String {
    let header = vec![index_header.to_string(), value_header.to_string()];
    let body: Vec<Vec<String>> = items.iter().map(|(k, v)| vec![k.clone(), v.clone()]).collect();
    pipe_table(&header, &[false, true], &body)
}

fn pipe_table(header: &[String], right_align: &[bool], body: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let pad = |s: &str, i: usize| {
        let fill = widths[i].saturating_sub(s.chars().count());
        if right_align[i] {
            format!("{}{}", " ".repeat(fill), s)
        } else {
            format!("{}{}", s, " ".repeat(fill))
        }
    };

    let line = |cells: &[String]| {
        let inner: Vec<String> = cells.iter().enumerate().map(|(i, c)| pad(c, i)).collect();
        format!("| {} |", inner.join(" | "))
    };

    let rule: Vec<String> = widths
        .iter()
        .zip(right_align)
        .map(|(w, &right)| {
            if right {
                format!("{}:", "-".repeat(w + 1))
            } else {
                format!(":{}", "-".repeat(w + 1))
            }
        })
        .collect();

    let mut lines = vec![line(header), format!("|{}|", rule.join("|"))];
    lines.extend(body.iter().map(|r| line(r)));
    lines.join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small sales table shared by the dataset tests.
    pub(crate) fn sales() -> Table {
        let cols = ["City", "Customer Name", "Sales", "Profit", "Returns", "Payment Mode"];
        let rows = [
            ["Pune", "Asha", "100", "10", "1", "Card"],
            ["Delhi", "Ravi", "250", "-5", "0", "Cash"],
            ["Pune", "Asha", "50", "7", "2", "UPI"],
            ["Mumbai", "Meera", "300", "40", "", "Card"],
            ["Delhi", "Asha", "80", "3", "1", "Cash"],
        ];
        Table::new(
            cols.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|f| Cell::parse(f)).collect()).collect(),
        )
    }

    #[test]
    fn cell_parse_classifies() {
        assert_eq!(Cell::parse(" 42 "), Cell::Number(42.0));
        assert_eq!(Cell::parse("-1.5e2"), Cell::Number(-150.0));
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("NaN"), Cell::Empty);
        assert_eq!(Cell::parse("N/A"), Cell::Empty);
        assert_eq!(Cell::parse("Pune"), Cell::Text("Pune".into()));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(300.0), "300");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-5.0), "-5");
    }

    #[test]
    fn rows_are_normalised_to_header_width() {
        let t = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Number(1.0)], vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)]],
        );
        assert_eq!(t.rows()[0], vec![Cell::Number(1.0), Cell::Empty]);
        assert_eq!(t.rows()[1].len(), 2);
    }

    #[test]
    fn numeric_detection_ignores_missing() {
        let t = sales();
        let numeric: Vec<&str> = t.numeric_columns().iter().map(|&i| t.columns()[i].as_str()).collect();
        assert_eq!(numeric, vec!["Sales", "Profit", "Returns"]);
        assert_eq!(t.numeric_values(t.column_index("Returns").unwrap()), vec![1.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn markdown_has_index_and_truncation_note() {
        let md = sales().to_markdown(2);
        let lines: Vec<&str> = md.lines().collect();
        assert!(lines[0].contains("City") && lines[0].contains("Payment Mode"));
        assert!(lines[1].starts_with("|----:|:"));
        assert!(lines[2].starts_with("|   0 | Pune"));
        assert_eq!(lines.len(), 5);
        assert!(md.ends_with("(3 more rows not shown)"));
        assert_eq!(sales().to_markdown(0).lines().count(), 7);
    }

    #[test]
    fn unknown_column_errors() {
        assert!(matches!(sales().column_index("Region"), Err(DatasetError::UnknownColumn(_))));
    }
}
