//! Keyword-mapped calculations for common sales-data questions.
//!
//! A question is matched case-insensitively by substring. The result is a
//! small Markdown table that the data section hands to the model for a
//! conversational summary.

use std::collections::HashMap;

use super::{Cell, DatasetError, Table, format_number, series_markdown};

type QueryFn = fn(&Table) -> Result<String, DatasetError>;

/// Known queries. Order is irrelevant: the longest matching key wins.
const QUERIES: &[(&str, QueryFn)] = &[
    ("highest sale", highest_sale),
    ("total sum of sale", total_sum),
    ("total return", total_return),
    ("highest profit", highest_profit),
    ("top 10 city with highest sales", top_cities),
    ("top 10 customer buying frequently", top_customers),
    ("payment mode", payment_modes),
];

const TOP_N: usize = 10;

#[derive(Debug)]
pub struct QueryMatch {
    pub key: &'static str,
    pub result: Result<String, DatasetError>,
}

/// Keys recognised by [`run_query`], for `/help`.
pub fn keys() -> impl Iterator<Item = &'static str> {
    QUERIES.iter().map(|(k, _)| *k)
}

/// Find the most specific key contained in `question` and run it.
pub fn run_query(table: &Table, question: &str) -> Option<QueryMatch> {
    let q = question.trim().to_lowercase();
    let (key, f) = QUERIES
        .iter()
        .filter(|(k, _)| q.contains(k))
        .max_by_key(|(k, _)| k.len())?;
    Some(QueryMatch { key, result: f(table) })
}

fn per_column(
    table: &Table,
    cols: &[usize],
    reduce: fn(&[f64]) -> Option<f64>,
) -> Result<String, DatasetError> {
    let mut items = Vec::with_capacity(cols.len());
    for &i in cols {
        let name = &table.columns()[i];
        if !table.is_numeric(i) {
            return Err(DatasetError::NotNumeric(name.clone()));
        }
        let v = reduce(&table.numeric_values(i)).map_or_else(|| "nan".to_string(), format_number);
        items.push((name.clone(), v));
    }
    Ok(series_markdown("", "0", &items))
}

fn numeric_columns(table: &Table) -> Result<Vec<usize>, DatasetError> {
    let cols = table.numeric_columns();
    if cols.is_empty() { Err(DatasetError::NoNumericColumns) } else { Ok(cols) }
}

fn matching_columns(table: &Table, needle: &str) -> Result<Vec<usize>, DatasetError> {
    let cols: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.to_lowercase().contains(needle))
        .map(|(i, _)| i)
        .collect();
    if cols.is_empty() { Err(DatasetError::NoMatchingColumns(needle.to_string())) } else { Ok(cols) }
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn sum(values: &[f64]) -> Option<f64> {
    Some(values.iter().sum())
}

fn highest_sale(table: &Table) -> Result<String, DatasetError> {
    per_column(table, &numeric_columns(table)?, max)
}

fn total_sum(table: &Table) -> Result<String, DatasetError> {
    per_column(table, &numeric_columns(table)?, sum)
}

fn total_return(table: &Table) -> Result<String, DatasetError> {
    per_column(table, &matching_columns(table, "return")?, sum)
}

fn highest_profit(table: &Table) -> Result<String, DatasetError> {
    per_column(table, &matching_columns(table, "profit")?, max)
}

/// Groups in first-seen order, sorted descending by value; ties keep first-seen order.
fn top_n(groups: Vec<(String, f64)>) -> Vec<(String, f64)> {
    let mut groups = groups;
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups.truncate(TOP_N);
    groups
}

fn grouped<F>(table: &Table, key_col: usize, mut value: F) -> Vec<(String, f64)>
where
    F: FnMut(&[Cell]) -> f64,
{
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        if row[key_col].is_empty() {
            continue;
        }
        let key = row[key_col].to_string();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            order.push((key, 0.0));
            order.len() - 1
        });
        order[slot].1 += value(row);
    }
    order
}

fn top_cities(table: &Table) -> Result<String, DatasetError> {
    let (Ok(city), Ok(sales)) = (table.column_index("City"), table.column_index("Sales")) else {
        return Ok("Required columns not found.".to_string());
    };
    if !table.is_numeric(sales) {
        return Err(DatasetError::NotNumeric("Sales".to_string()));
    }
    let groups = grouped(table, city, |row| row[sales].as_number().unwrap_or(0.0));
    let items: Vec<(String, String)> = top_n(groups).into_iter().map(|(k, v)| (k, format_number(v))).collect();
    Ok(series_markdown("City", "Sales", &items))
}

fn top_customers(table: &Table) -> Result<String, DatasetError> {
    let Ok(customer) = table.column_index("Customer Name") else {
        return Ok("Required column 'Customer Name' not found.".to_string());
    };
    let groups = grouped(table, customer, |_| 1.0);
    let items: Vec<(String, String)> = top_n(groups).into_iter().map(|(k, v)| (k, format_number(v))).collect();
    Ok(series_markdown("Customer Name", "count", &items))
}

fn payment_modes(table: &Table) -> Result<String, DatasetError> {
    let Ok(mode) = table.column_index("Payment Mode") else {
        return Ok("Required column 'Payment Mode' not found.".to_string());
    };
    let mut seen = Vec::<String>::new();
    for cell in table.column_cells(mode) {
        let v = cell.to_string();
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    let items: Vec<(String, String)> = seen.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect();
    Ok(series_markdown("", "Payment Mode", &items))
}
