use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::period::{resolve_period_return, HistoryPoint, PeriodReturn, PeriodToken, SeriesPoint};
use crate::types::{with_metadata, ComputationOutput};
use crate::SynthIndexResult;

/// Input for period return calculation. An `IndexSeries` document
/// deserializes into this directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReturnInput {
    pub points: Vec<HistoryPoint>,
    /// Single token (`"1Y"`, `"ytd"`, ...); every token when absent.
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReturnOutput {
    pub latest_date: Option<NaiveDate>,
    pub latest_value: Option<f64>,
    pub returns: Vec<PeriodReturn>,
}

/// Resolve every lookback window against the same series.
pub fn period_return_table<P: SeriesPoint>(points: &[P]) -> Vec<PeriodReturn> {
    PeriodToken::ALL
        .into_iter()
        .filter_map(|token| resolve_period_return(points, token))
        .collect()
}

/// Calculate one or all period returns for a series.
pub fn calculate_period_returns(
    input: &PeriodReturnInput,
) -> SynthIndexResult<ComputationOutput<PeriodReturnOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let returns = match input.period.as_deref() {
        Some(raw) => {
            let token: PeriodToken = raw.parse()?;
            resolve_period_return(&input.points, token)
                .into_iter()
                .collect()
        }
        None => period_return_table(&input.points),
    };

    if returns.is_empty() {
        warnings.push("Series is empty or its latest value is missing".into());
    }
    for r in returns.iter().filter(|r| r.change_pct.is_none()) {
        warnings.push(format!("{}: no usable baseline", r.token));
    }

    let output = PeriodReturnOutput {
        latest_date: returns.first().map(|r| r.latest_date),
        latest_value: returns.first().map(|r| r.latest_value),
        returns,
    };

    Ok(with_metadata(
        "Trailing period return from first point on or after calendar target",
        &serde_json::json!({
            "calendar_arithmetic": "month/year shifts clamp to month end",
            "short_history": "earliest available point",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn daily_series(from: &str, days: i64, first: f64, last: f64) -> Vec<HistoryPoint> {
        let start = d(from);
        (0..=days)
            .map(|i| HistoryPoint {
                date: start + Duration::days(i),
                value: Some(first + (last - first) * i as f64 / days as f64),
                change_pct: None,
            })
            .collect()
    }

    #[test]
    fn test_table_has_every_token() {
        let points = daily_series("2020-01-01", 366, 100.0, 110.0);
        let table = period_return_table(&points);
        let tokens: Vec<PeriodToken> = table.iter().map(|r| r.token).collect();
        assert_eq!(tokens, PeriodToken::ALL.to_vec());
    }

    #[test]
    fn test_table_empty_series() {
        let points: Vec<HistoryPoint> = vec![];
        assert!(period_return_table(&points).is_empty());
    }

    #[test]
    fn test_single_period_request() {
        let input = PeriodReturnInput {
            points: daily_series("2020-01-01", 366, 100.0, 110.0),
            period: Some("1y".into()),
        };
        let out = calculate_period_returns(&input).unwrap();
        assert_eq!(out.result.returns.len(), 1);
        assert_eq!(out.result.returns[0].token, PeriodToken::OneYear);
        assert_eq!(out.result.latest_date, Some(d("2021-01-01")));
    }

    #[test]
    fn test_unknown_period_is_error() {
        let input = PeriodReturnInput {
            points: daily_series("2020-01-01", 10, 100.0, 110.0),
            period: Some("3Q".into()),
        };
        assert!(calculate_period_returns(&input).is_err());
    }

    #[test]
    fn test_empty_series_warns() {
        let input = PeriodReturnInput {
            points: vec![],
            period: None,
        };
        let out = calculate_period_returns(&input).unwrap();
        assert!(out.result.returns.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_index_series_json_is_accepted() {
        let json = r#"{
            "index_code": "X",
            "index_name": "X",
            "points": [
                {"date": "2024-01-02", "value": 100.0, "change_pct": null},
                {"date": "2024-01-03", "value": 101.0, "change_pct": 0.01}
            ]
        }"#;
        let input: PeriodReturnInput = serde_json::from_str(json).unwrap();
        let out = calculate_period_returns(&input).unwrap();
        assert_eq!(out.result.returns.len(), 7);
    }
}
