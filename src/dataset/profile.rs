//! HTML profiling report for a loaded dataset.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use minijinja::{Environment, context};
use serde::Serialize;
use tracing::{debug, info};

use super::{DatasetError, Table, format_number, stats};

const TEMPLATE_NAME: &str = "report.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body { font-family: sans-serif; margin: 2rem; width: auto; }
table { border-collapse: collapse; margin-bottom: 2rem; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.warn { color: #b35900; }
</style>
</head>
<body>
<h1>{{ title }}</h1>
<h2>Overview</h2>
<table>
<tr><td>Number of variables</td><td>{{ n_cols }}</td></tr>
<tr><td>Number of observations</td><td>{{ n_rows }}</td></tr>
<tr><td>Missing cells</td><td>{{ missing_cells }} ({{ missing_pct }}%)</td></tr>
<tr><td>Duplicate rows</td><td>{{ duplicate_rows }}</td></tr>
<tr><td>Generated</td><td>{{ generated }}</td></tr>
</table>
<h2>Variables</h2>
<table>
<tr><th>Column</th><th>Type</th><th>Count</th><th>Missing</th><th>Distinct</th><th>Mean</th><th>Std</th><th>Min</th><th>25%</th><th>50%</th><th>75%</th><th>Max</th></tr>
{% for c in columns %}
<tr{% if c.missing > 0 %} class="warn"{% endif %}><td>{{ c.name }}</td><td>{{ c.kind }}</td><td>{{ c.count }}</td><td>{{ c.missing }}</td><td>{{ c.distinct }}</td>
{% if c.numeric %}<td>{{ c.numeric.mean }}</td><td>{{ c.numeric.std }}</td><td>{{ c.numeric.min }}</td><td>{{ c.numeric.q1 }}</td><td>{{ c.numeric.median }}</td><td>{{ c.numeric.q3 }}</td><td>{{ c.numeric.max }}</td>
{% else %}<td colspan="7"></td>{% endif %}</tr>
{% endfor %}
</table>
{% if correlations %}
<h2>Correlations</h2>
<table>
<tr><th></th>{% for name in correlations.columns %}<th>{{ name }}</th>{% endfor %}</tr>
{% for row in correlations.rows %}<tr><td>{{ row.name }}</td>{% for v in row.values %}<td>{{ v }}</td>{% endfor %}</tr>
{% endfor %}
</table>
{% endif %}
<h2>Sample</h2>
<table>
<tr>{% for name in sample.columns %}<th>{{ name }}</th>{% endfor %}</tr>
{% for row in sample.rows %}<tr>{% for v in row %}<td>{{ v }}</td>{% endfor %}</tr>
{% endfor %}
</table>
</body>
</html>
"#;

const SAMPLE_ROWS: usize = 10;

#[derive(Debug, Serialize)]
struct ColumnProfile {
    name: String,
    kind: &'static str,
    count: usize,
    missing: usize,
    distinct: usize,
    numeric: Option<NumericProfile>,
}

#[derive(Debug, Serialize)]
struct NumericProfile {
    mean: String,
    std: String,
    min: String,
    q1: String,
    median: String,
    q3: String,
    max: String,
}

#[derive(Debug, Serialize)]
struct CorrelationRow {
    name: String,
    values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Correlations {
    columns: Vec<String>,
    rows: Vec<CorrelationRow>,
}

#[derive(Debug, Serialize)]
struct Sample {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// `report_<name up to the first dot>.html`, e.g. `sales.2024.csv` → `report_sales.html`.
pub fn report_file_name(dataset_name: &str) -> String {
    let base = Path::new(dataset_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(dataset_name);
    let stem = base.split('.').next().unwrap_or(base);
    format!("report_{stem}.html")
}

fn stat(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 => format_number(v),
        Some(v) => format!("{v:.4}"),
        None => "nan".to_string(),
    }
}

fn profile_column(table: &Table, idx: usize) -> ColumnProfile {
    let cells: Vec<_> = table.column_cells(idx).collect();
    let missing = cells.iter().filter(|c| c.is_empty()).count();
    let distinct = cells
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect::<HashSet<_>>()
        .len();

    let numeric = table.is_numeric(idx).then(|| {
        let values = table.numeric_values(idx);
        let sorted = stats::sorted(&values);
        NumericProfile {
            mean: stat(stats::mean(&values)),
            std: stat(stats::std_dev(&values)),
            min: stat(sorted.first().copied()),
            q1: stat(stats::quantile(&sorted, 0.25)),
            median: stat(stats::quantile(&sorted, 0.5)),
            q3: stat(stats::quantile(&sorted, 0.75)),
            max: stat(sorted.last().copied()),
        }
    });

    let kind = if numeric.is_some() {
        "Numeric"
    } else if missing == cells.len() {
        "Empty"
    } else {
        "Categorical"
    };

    ColumnProfile {
        name: table.columns()[idx].clone(),
        kind,
        count: cells.len() - missing,
        missing,
        distinct,
        numeric,
    }
}

/// Render the report as an HTML string.
pub fn render_report(table: &Table, dataset_name: &str) -> Result<String, DatasetError> {
    let columns: Vec<ColumnProfile> = (0..table.n_cols()).map(|i| profile_column(table, i)).collect();
    let missing_cells: usize = columns.iter().map(|c| c.missing).sum();
    let total_cells = table.n_rows() * table.n_cols();
    let missing_pct = if total_cells == 0 { 0.0 } else { missing_cells as f64 * 100.0 / total_cells as f64 };

    let mut dedup = table.clone();
    let duplicate_rows = dedup.drop_duplicates();

    let correlations = stats::correlation(table).ok().map(|m| Correlations {
        rows: m
            .columns
            .iter()
            .zip(&m.values)
            .map(|(name, row)| CorrelationRow {
                name: name.clone(),
                values: row.iter().map(|v| if v.is_nan() { "nan".into() } else { format!("{v:.3}") }).collect(),
            })
            .collect(),
        columns: m.columns,
    });

    let sample = Sample {
        columns: table.columns().to_vec(),
        rows: table
            .rows()
            .iter()
            .take(SAMPLE_ROWS)
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    };

    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| DatasetError::Report(e.to_string()))?;
    let tmpl = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| DatasetError::Report(e.to_string()))?;
    tmpl.render(context! {
        title => format!("EDA Report for {dataset_name}"),
        n_rows => table.n_rows(),
        n_cols => table.n_cols(),
        missing_cells => missing_cells,
        missing_pct => format!("{missing_pct:.1}"),
        duplicate_rows => duplicate_rows,
        generated => chrono::Utc::now().to_rfc3339(),
        columns => columns,
        correlations => correlations,
        sample => sample,
    })
    .map_err(|e| DatasetError::Report(e.to_string()))
}

/// Render the report into a temporary file, copy it to `dest`, and remove
/// the temporary file. Returns `dest`.
pub fn write_report(table: &Table, dataset_name: &str, dest: &Path) -> Result<PathBuf, DatasetError> {
    let html = render_report(table, dataset_name)?;

    let mut tmp = tempfile::Builder::new()
        .prefix("aurora-report-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| DatasetError::Report(format!("temporary file: {e}")))?;
    tmp.write_all(html.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| DatasetError::Report(format!("temporary file: {e}")))?;
    debug!(tmp = %tmp.path().display(), bytes = html.len(), "report rendered");

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::Report(format!("{}: {e}", parent.display())))?;
    }
    fs::copy(tmp.path(), dest).map_err(|e| DatasetError::Report(format!("{}: {e}", dest.display())))?;
    tmp.close().map_err(|e| DatasetError::Report(format!("temporary file: {e}")))?;

    info!(path = %dest.display(), "profiling report written");
    Ok(dest.to_path_buf())
}
