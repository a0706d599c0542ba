use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_scalar, headers, primary_rows, row_cells};

/// Rows (index points, period returns, constituents) as a table, followed by
/// the build summary, exclusions and warnings when present.
pub fn print_table(value: &Value) {
    match primary_rows(value) {
        Some(rows) if !rows.is_empty() => print_rows(rows),
        Some(_) => println!("(no rows)"),
        None => print_fields(value.get("result").unwrap_or(value)),
    }

    let Some(result) = value.get("result") else {
        return;
    };
    if let Some(summary) = result.get("summary").filter(|s| s.is_object()) {
        println!("\nSummary:");
        print_fields(summary);
    }
    if let Some(Value::Array(excluded)) = result.get("excluded") {
        if !excluded.is_empty() {
            println!("\nExcluded:");
            for ex in excluded {
                println!(
                    "  - {} ({})",
                    ex.get("symbol").map(format_scalar).unwrap_or_default(),
                    ex.get("reason").map(format_scalar).unwrap_or_default()
                );
            }
        }
    }
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_rows(rows: &[Value]) {
    let headers = headers(rows);
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        builder.push_record(row_cells(row, &headers));
    }
    println!("{}", Table::from(builder));
}

fn print_fields(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                builder.push_record([key.clone(), format_scalar(val)]);
            }
        }
        other => {
            builder.push_record(["value".to_string(), format_scalar(other)]);
        }
    }
    println!("{}", Table::from(builder));
}
