//! Cleaning operations that mutate the loaded table, plus CSV export.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{Cell, DatasetError, Table, format_number, stats};

/// Default file name for `/export` without a path.
pub const EXPORT_FILE_NAME: &str = "cleaned_data.csv";

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Static(String),
    Mean,
    Median,
}

impl Fill {
    /// `static <value>`, `mean` or `median`.
    pub fn parse(args: &str) -> Option<Fill> {
        let args = args.trim();
        let (head, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        match head.to_ascii_lowercase().as_str() {
            "mean" if rest.trim().is_empty() => Some(Fill::Mean),
            "median" if rest.trim().is_empty() => Some(Fill::Median),
            "static" if !rest.trim().is_empty() => Some(Fill::Static(rest.trim().to_string())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub column: String,
    pub filled: usize,
    pub value: Cell,
    pub method: &'static str,
}

impl FillOutcome {
    pub fn describe(&self) -> String {
        match self.method {
            "static" => format!(
                "Missing values in `{}` filled with `{}` ({} cells).",
                self.column, self.value, self.filled
            ),
            method => {
                let v = self.value.as_number().unwrap_or(f64::NAN);
                format!(
                    "Missing values in `{}` filled with the {} ({:.2}) ({} cells).",
                    self.column, method, v, self.filled
                )
            }
        }
    }
}

impl Table {
    /// Remove exact duplicate rows, keeping the first occurrence.
    /// Returns how many rows were removed.
    pub fn drop_duplicates(&mut self) -> usize {
        let before = self.n_rows();
        let mut seen = HashSet::new();
        self.rows_mut().retain(|row| {
            let key: Vec<String> = row.iter().map(Cell::key).collect();
            seen.insert(key)
        });
        before - self.n_rows()
    }

    /// Names of columns holding at least one missing cell.
    pub fn columns_with_missing(&self) -> Vec<&str> {
        (0..self.n_cols())
            .filter(|&i| self.column_cells(i).any(Cell::is_empty))
            .map(|i| self.columns()[i].as_str())
            .collect()
    }

    pub fn fill_missing(&mut self, column: &str, fill: &Fill) -> Result<FillOutcome, DatasetError> {
        let idx = self.column_index(column)?;
        let (value, method) = match fill {
            Fill::Static(v) => (Cell::parse(v), "static"),
            Fill::Mean | Fill::Median => {
                if !self.is_numeric(idx) {
                    return Err(DatasetError::NotNumeric(column.to_string()));
                }
                let values = self.numeric_values(idx);
                let (v, method) = match fill {
                    Fill::Mean => (stats::mean(&values), "mean"),
                    _ => (stats::median(&values), "median"),
                };
                let v = v.ok_or_else(|| DatasetError::NotNumeric(column.to_string()))?;
                (Cell::Number(v), method)
            }
        };
        // A static value that is itself a missing marker still fills with text.
        let value = match (&value, fill) {
            (Cell::Empty, Fill::Static(raw)) => Cell::Text(raw.clone()),
            _ => value,
        };

        let mut filled = 0;
        for row in self.rows_mut().iter_mut() {
            if row[idx].is_empty() {
                row[idx] = value.clone();
                filled += 1;
            }
        }
        Ok(FillOutcome { column: column.to_string(), filled, value, method })
    }

    /// CSV text with a header row and no index column. Missing cells are empty.
    pub fn to_csv(&self) -> Result<String, DatasetError> {
        let mut w = csv::Writer::from_writer(Vec::new());
        w.write_record(self.columns()).map_err(|e| DatasetError::Export(e.to_string()))?;
        for row in self.rows() {
            let fields = row.iter().map(|c| match c {
                Cell::Empty => String::new(),
                Cell::Number(n) => format_number(*n),
                Cell::Text(s) => s.clone(),
            });
            w.write_record(fields).map_err(|e| DatasetError::Export(e.to_string()))?;
        }
        let bytes = w.into_inner().map_err(|e| DatasetError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DatasetError::Export(e.to_string()))
    }

    pub fn export_csv(&self, path: &Path) -> Result<(), DatasetError> {
        let text = self.to_csv()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DatasetError::Export(format!("{}: {e}", parent.display())))?;
        }
        fs::write(path, text).map_err(|e| DatasetError::Export(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sales;
    use crate::dataset::load::parse_csv;

    #[test]
    fn fill_parses_methods() {
        assert_eq!(Fill::parse("mean"), Some(Fill::Mean));
        assert_eq!(Fill::parse(" MEDIAN "), Some(Fill::Median));
        assert_eq!(Fill::parse("static n/a value"), Some(Fill::Static("n/a value".into())));
        assert_eq!(Fill::parse("static"), None);
        assert_eq!(Fill::parse("mode"), None);
    }

    #[test]
    fn drop_duplicates_keeps_first() {
        let mut t = parse_csv(b"a,b\n1,x\n2,y\n1,x\n1,\n1,\n").unwrap();
        assert_eq!(t.drop_duplicates(), 2);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.rows()[2], vec![Cell::Number(1.0), Cell::Empty]);
        assert_eq!(t.drop_duplicates(), 0);
    }

    #[test]
    fn number_and_text_are_not_duplicates() {
        let mut t = Table::new(
            vec!["a".into()],
            vec![vec![Cell::Number(1.0)], vec![Cell::Text("1.0x".into())]],
        );
        assert_eq!(t.drop_duplicates(), 0);
    }

    #[test]
    fn mean_and_median_fill() {
        let mut t = parse_csv(b"v\n1\nNA\n2\n9\n").unwrap();
        assert_eq!(t.columns_with_missing(), vec!["v"]);
        let mut m = t.clone();

        let out = t.fill_missing("v", &Fill::Mean).unwrap();
        assert_eq!(out.filled, 1);
        assert_eq!(t.rows()[1][0], Cell::Number(4.0));
        assert!(out.describe().contains("the mean (4.00)"));

        m.fill_missing("v", &Fill::Median).unwrap();
        assert_eq!(m.rows()[1][0], Cell::Number(2.0));
        assert!(m.columns_with_missing().is_empty());
    }

    #[test]
    fn mean_fill_rejects_text_column() {
        let mut t = sales();
        assert!(matches!(t.fill_missing("City", &Fill::Mean), Err(DatasetError::NotNumeric(_))));
        assert!(matches!(t.fill_missing("Nope", &Fill::Median), Err(DatasetError::UnknownColumn(_))));
    }

    #[test]
    fn static_fill_parses_value() {
        let mut t = sales();
        let out = t.fill_missing("Returns", &Fill::Static("0".into())).unwrap();
        assert_eq!(out.filled, 1);
        assert_eq!(t.rows()[3][4], Cell::Number(0.0));
        assert_eq!(out.describe(), "Missing values in `Returns` filled with `0` (1 cells).");
    }

    #[test]
    fn csv_export_has_header_and_no_index() {
        let t = parse_csv(b"name,score\n\"Doe, J\",1.5\nAmy,\n").unwrap();
        assert_eq!(t.to_csv().unwrap(), "name,score\n\"Doe, J\",1.5\nAmy,\n");

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/cleaned.csv");
        t.export_csv(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), t.to_csv().unwrap());
    }
}
