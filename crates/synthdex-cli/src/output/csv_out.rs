use serde_json::Value;
use std::io;

use super::{format_scalar, headers, primary_rows, row_cells};

/// Write the row-shaped part of the result as CSV, or `field,value` pairs
/// when the result has no rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match primary_rows(value) {
        Some(rows) => {
            let headers = headers(rows);
            if !headers.is_empty() {
                let _ = wtr.write_record(&headers);
            }
            for row in rows {
                let _ = wtr.write_record(row_cells(row, &headers));
            }
        }
        None => {
            let _ = wtr.write_record(["field", "value"]);
            if let Some(Value::Object(map)) = value.get("result") {
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
        }
    }

    let _ = wtr.flush();
}
