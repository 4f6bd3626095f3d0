//! Descriptive statistics, IQR outliers and Pearson correlation.

use super::{DatasetError, Table, format_number};

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending; `None` when empty.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted(values), 0.5)
}

/// Sample standard deviation (n − 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    /// Row indices whose value lies strictly outside `[lower, upper]`.
    pub rows: Vec<usize>,
}

impl OutlierReport {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Console summary followed by the outlying rows as a table.
    pub fn describe(&self, table: &Table) -> String {
        let mut out = format!(
            "An outlier is defined as a value outside the range: [{:.2}, {:.2}]\n",
            self.lower, self.upper
        );
        if self.rows.is_empty() {
            out.push_str("No significant outliers detected based on the IQR method.");
            return out;
        }
        out.push_str(&format!(
            "Found {} potential outliers in column `{}`.\n\n",
            self.rows.len(),
            self.column
        ));
        let subset = Table::new(
            table.columns().to_vec(),
            self.rows.iter().map(|&i| table.rows()[i].clone()).collect(),
        );
        out.push_str(&subset.to_markdown(0));
        out
    }
}

/// IQR outlier detection on a numeric column. Missing cells never count.
pub fn detect_outliers(table: &Table, column: &str) -> Result<OutlierReport, DatasetError> {
    let idx = table.column_index(column)?;
    if !table.is_numeric(idx) {
        return Err(DatasetError::NotNumeric(column.to_string()));
    }
    let values = sorted(&table.numeric_values(idx));
    let (Some(q1), Some(q3)) = (quantile(&values, 0.25), quantile(&values, 0.75)) else {
        return Err(DatasetError::NotNumeric(column.to_string()));
    };
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    let rows = table
        .column_cells(idx)
        .enumerate()
        .filter_map(|(i, c)| c.as_number().filter(|&v| v < lower || v > upper).map(|_| i))
        .collect();

    Ok(OutlierReport { column: column.to_string(), q1, q3, lower, upper, rows })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `NaN` where a pair has fewer than two complete rows or zero variance.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn to_markdown(&self) -> String {
        let header = format!("|  | {} |", self.columns.join(" | "));
        let rule = format!("|:--|{}", "--:|".repeat(self.columns.len()));
        let mut lines = vec![header, rule];
        for (name, row) in self.columns.iter().zip(&self.values) {
            let cells: Vec<String> = row
                .iter()
                .map(|v| if v.is_nan() { format_number(*v) } else { format!("{v:.3}") })
                .collect();
            lines.push(format!("| {} | {} |", name, cells.join(" | ")));
        }
        lines.join("\n")
    }
}

/// Pearson correlation between every pair of numeric columns.
pub fn correlation(table: &Table) -> Result<CorrelationMatrix, DatasetError> {
    let cols = table.numeric_columns();
    if cols.is_empty() {
        return Err(DatasetError::NoNumericColumns);
    }
    let values = cols
        .iter()
        .map(|&a| cols.iter().map(|&b| pearson(table, a, b)).collect())
        .collect();
    Ok(CorrelationMatrix {
        columns: cols.iter().map(|&i| table.columns()[i].clone()).collect(),
        values,
    })
}

fn pearson(table: &Table, a: usize, b: usize) -> f64 {
    let pairs: Vec<(f64, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| Some((r[a].as_number()?, r[b].as_number()?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}
