//! Reading CSV, XLSX and plain-text files into a [`Table`].

use std::fs;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use tracing::{debug, warn};

use super::{Cell, DatasetError, Table};

/// Column used when a `.txt` file is not tabular.
pub const CONTENT_COLUMN: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Csv,
    Xlsx,
    Txt,
}

impl DatasetKind {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(DatasetKind::Csv),
            "xlsx" => Ok(DatasetKind::Xlsx),
            "txt" => Ok(DatasetKind::Txt),
            _ => Err(DatasetError::Unsupported(path.display().to_string())),
        }
    }
}

pub fn is_dataset(path: &Path) -> bool {
    DatasetKind::from_path(path).is_ok()
}

/// Load the file at `path`, choosing the reader by extension.
pub fn load_table(path: &Path) -> Result<Table, DatasetError> {
    let kind = DatasetKind::from_path(path)?;
    let table = match kind {
        DatasetKind::Csv => {
            let bytes = read(path)?;
            parse_csv(&bytes)?
        }
        DatasetKind::Xlsx => load_xlsx(path)?,
        DatasetKind::Txt => {
            let bytes = read(path)?;
            match parse_csv(&bytes) {
                Ok(t) if t.n_cols() > 0 => t,
                Ok(_) => content_table(&bytes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "text file is not CSV, loading as a single column");
                    content_table(&bytes)
                }
            }
        }
    };
    debug!(path = %path.display(), ?kind, rows = table.n_rows(), cols = table.n_cols(), "dataset loaded");
    Ok(table)
}

fn read(path: &Path) -> Result<Vec<u8>, DatasetError> {
    fs::read(path).map_err(|e| DatasetError::Load(format!("{}: {e}", path.display())))
}

/// Parse CSV bytes: the first record is the header. Short rows are padded;
/// a row wider than the header is a [`DatasetError::Load`].
pub fn parse_csv(bytes: &[u8]) -> Result<Table, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::Load(e.to_string()))?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(i, h))
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DatasetError::Load(e.to_string()))?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(DatasetError::Load(format!(
                "expected {} fields in line {line}, saw {}",
                headers.len(),
                record.len()
            )));
        }
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(Table::new(headers, rows))
}

fn header_name(i: usize, raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() { format!("Unnamed: {i}") } else { name.to_string() }
}

fn content_table(bytes: &[u8]) -> Table {
    let text = String::from_utf8_lossy(bytes).into_owned();
    Table::new(vec![CONTENT_COLUMN.to_string()], vec![vec![Cell::Text(text)]])
}

fn load_xlsx(path: &Path) -> Result<Table, DatasetError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| DatasetError::Load(format!("{}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::Load(format!("{}: workbook has no sheets", path.display())))?
        .map_err(|e| DatasetError::Load(e.to_string()))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(first) => first
            .iter()
            .enumerate()
            .map(|(i, c)| header_name(i, &c.to_string()))
            .collect(),
        None => return Ok(Table::default()),
    };
    let body = rows.map(|r| r.iter().map(xlsx_cell).collect()).collect();
    Ok(Table::new(headers, body))
}

fn xlsx_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) if f.is_nan() => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(if *b { "True".into() } else { "False".into() }),
        Data::String(s) => Cell::parse(s),
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}
