use serde_json::Value;

use super::format_scalar;

/// Print just the headline number.
///
/// A single period return prints its change; a build prints the latest index
/// level; a weight normalization prints its percentage total.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);

    if let Some(Value::Array(returns)) = result.get("returns") {
        for r in returns {
            println!(
                "{}: {}",
                r.get("token").map(format_scalar).unwrap_or_default(),
                r.get("change_pct").map(null_as_word).unwrap_or_default()
            );
        }
        return;
    }

    let headline = result
        .get("summary")
        .and_then(|s| s.get("latest_value"))
        .or_else(|| result.get("total_pct"));
    match headline {
        Some(v) => println!("{}", null_as_word(v)),
        None if result.get("series").is_some_and(Value::is_null) => println!("null"),
        None => println!("{}", null_as_word(result)),
    }
}

fn null_as_word(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => format_scalar(other),
    }
}
