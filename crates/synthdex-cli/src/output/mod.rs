pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The row-shaped part of a result: index points, period returns or
/// normalized constituents, in that order of preference.
pub(crate) fn primary_rows(value: &Value) -> Option<&Vec<Value>> {
    let result = value.get("result")?;
    result
        .get("series")
        .and_then(|s| s.get("points"))
        .and_then(Value::as_array)
        .or_else(|| result.get("returns").and_then(Value::as_array))
        .or_else(|| result.get("constituents").and_then(Value::as_array))
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers from the first object row.
pub(crate) fn headers(rows: &[Value]) -> Vec<String> {
    rows.first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default()
}

pub(crate) fn row_cells(row: &Value, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(format_scalar).unwrap_or_default())
        .collect()
}
