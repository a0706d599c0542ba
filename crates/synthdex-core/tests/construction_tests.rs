use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use synthdex_core::construction::builder::{build_index, BuildIndexInput};
use synthdex_core::construction::definition::IndexDefinition;
use synthdex_core::construction::weights::{normalize_weights, Constituent};
use synthdex_core::PriceBar;

// ===========================================================================
// End-to-end synthetic index construction
// ===========================================================================

fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn bars(rows: &[(&str, f64)]) -> Vec<PriceBar> {
    rows.iter().map(|(date, close)| PriceBar::new(date, *close)).collect()
}

fn make_input(constituents: Vec<Constituent>, prices: Vec<(&str, Vec<PriceBar>)>) -> BuildIndexInput {
    BuildIndexInput {
        definition: IndexDefinition {
            code: "TEST".into(),
            name: None,
            constituents,
            start_date: Some("2024-01-01".into()),
            base_value: Some(100.0),
        },
        prices: prices
            .into_iter()
            .map(|(s, b)| (s.to_string(), b))
            .collect::<HashMap<_, _>>(),
        as_of: Some(d("2024-12-31")),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_a_weighted_pair() {
    let input = make_input(
        vec![
            Constituent::new("A").with_weight(60.0),
            Constituent::new("B").with_weight(40.0),
        ],
        vec![
            ("A", bars(&[("2024-01-02", 100.0), ("2024-01-03", 110.0)])),
            ("B", bars(&[("2024-01-02", 50.0), ("2024-01-03", 45.0)])),
        ],
    );
    let series = build_index(&input).unwrap().result.series.unwrap();
    assert_eq!(series.points.len(), 2);
    assert!(approx_eq(series.points[0].value, 100.0, 1e-9));
    assert_eq!(series.points[0].change_pct, None);
    assert!(approx_eq(series.points[1].value, 102.0, 1e-9));
    assert!(approx_eq(series.points[1].change_pct.unwrap(), 0.02, 1e-9));
}

#[test]
fn test_scenario_b_missing_mid_series_day() {
    let input = make_input(
        vec![Constituent::new("A"), Constituent::new("B")],
        vec![
            (
                "A",
                bars(&[("2024-01-02", 10.0), ("2024-01-04", 12.0), ("2024-01-05", 13.0)]),
            ),
            (
                "B",
                bars(&[
                    ("2024-01-02", 20.0),
                    ("2024-01-03", 20.0),
                    ("2024-01-04", 22.0),
                    ("2024-01-05", 22.0),
                ]),
            ),
        ],
    );
    let series = build_index(&input).unwrap().result.series.unwrap();
    assert_eq!(series.points.len(), 4);
    // 2024-01-03: A missing and B flat -> unchanged.
    assert!(approx_eq(series.points[1].value, series.points[0].value, 1e-12));
    assert_eq!(series.points[1].change_pct, Some(0.0));
    assert!(series.points[2].change_pct.unwrap() > 0.0);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_normalized_weights_total_100() {
    let cases = vec![
        vec![Constituent::new("A").with_weight(3.3), Constituent::new("B").with_weight(7.1)],
        vec![Constituent::new("A").with_weight_pct(1.0), Constituent::new("B").with_weight_pct(2.0)],
        vec![
            Constituent::new("A").with_weight(0.0),
            Constituent::new("B").with_weight(1e-3),
            Constituent::new("C"),
        ],
    ];
    for case in cases {
        let out = normalize_weights(&case);
        let total: f64 = out.constituents.iter().filter_map(|c| c.weight_pct).sum();
        assert!(approx_eq(total, 100.0, 1e-6), "total was {total}");
    }
}

#[test]
fn test_normalization_idempotent() {
    let normalized = vec![
        Constituent::new("A").with_weight_pct(20.0),
        Constituent::new("B").with_weight_pct(30.0),
        Constituent::new("C").with_weight_pct(50.0),
    ];
    let again = normalize_weights(&normalized);
    for (a, b) in normalized.iter().zip(&again.constituents) {
        assert!(approx_eq(a.weight_pct.unwrap(), b.weight_pct.unwrap(), 1e-9));
    }
}

#[test]
fn test_effective_start_not_before_start_or_any_first_date() {
    let input = make_input(
        vec![Constituent::new("EARLY"), Constituent::new("LATE")],
        vec![
            ("EARLY", bars(&[("2023-12-01", 5.0), ("2024-01-02", 5.5), ("2024-01-10", 6.0)])),
            ("LATE", bars(&[("2024-01-08", 40.0), ("2024-01-10", 41.0)])),
        ],
    );
    let out = build_index(&input).unwrap();
    let summary = out.result.summary.unwrap();
    assert_eq!(summary.effective_start, d("2024-01-08"));
    assert!(summary.effective_start >= d("2024-01-01"));
    // EARLY's base price is its first close on or after the effective start.
    assert!(approx_eq(out.result.constituents[0].base_price, 6.0, 1e-12));
    assert_eq!(out.result.constituents[0].base_date, d("2024-01-10"));
}

#[test]
fn test_first_value_anchored_and_all_positive() {
    let mut input = make_input(
        vec![
            Constituent::new("A").with_weight_pct(70.0),
            Constituent::new("B").with_weight_pct(30.0),
        ],
        vec![
            ("A", bars(&[("2024-01-02", 3.0), ("2024-01-03", 0.5), ("2024-01-04", 9.0)])),
            ("B", bars(&[("2024-01-03", 100.0), ("2024-01-04", 1.0), ("2024-01-05", 0.01)])),
        ],
    );
    input.definition.base_value = Some(250.0);
    let series = build_index(&input).unwrap().result.series.unwrap();
    assert!(approx_eq(series.points[0].value, 250.0, 1e-9));
    assert!(series.points.iter().all(|p| p.value > 0.0));
    assert!(series.points.windows(2).all(|w| w[0].date < w[1].date));
}

#[test]
fn test_forward_fill_not_interpolated() {
    // A: 100 on D-1, nothing on D, 200 on D+1. B moves on D.
    let input = make_input(
        vec![Constituent::new("A").with_weight(1.0), Constituent::new("B").with_weight(1.0)],
        vec![
            ("A", bars(&[("2024-01-02", 100.0), ("2024-01-04", 200.0)])),
            ("B", bars(&[("2024-01-02", 10.0), ("2024-01-03", 12.0), ("2024-01-04", 12.0)])),
        ],
    );
    let series = build_index(&input).unwrap().result.series.unwrap();
    // D value = 100 * (0.5 * 100/100 + 0.5 * 12/10) = 110
    assert!(approx_eq(series.points[1].value, 110.0, 1e-9));
}

#[test]
fn test_equal_weight_fallback_with_proportional_paths() {
    let a = [10.0, 11.0, 9.5, 12.0, 12.5];
    let k = 7.0;
    let dates = ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05", "2024-01-08"];
    let a_bars: Vec<PriceBar> = dates.iter().zip(a).map(|(dt, c)| PriceBar::new(dt, c)).collect();
    let b_bars: Vec<PriceBar> = dates.iter().zip(a).map(|(dt, c)| PriceBar::new(dt, c * k)).collect();
    let input = make_input(
        vec![Constituent::new("A"), Constituent::new("B")],
        vec![("A", a_bars), ("B", b_bars)],
    );
    let out = build_index(&input).unwrap();
    assert!(approx_eq(out.result.constituents[0].share, 0.5, 1e-12));
    let series = out.result.series.unwrap();
    for (p, close) in series.points.iter().zip(a) {
        assert!(approx_eq(p.value, 100.0 * close / a[0], 1e-9));
    }
}

#[test]
fn test_all_fetches_failed_returns_no_series() {
    let input = make_input(
        vec![Constituent::new("A"), Constituent::new("B")],
        vec![("A", vec![]), ("B", vec![PriceBar { date: None, close: Some(f64::NAN) }])],
    );
    let out = build_index(&input).unwrap();
    assert!(out.result.series.is_none());
    assert_eq!(out.result.excluded.len(), 2);
    assert!(out.warnings.iter().any(|w| w.contains("Insufficient data")));
}

#[test]
fn test_invalid_base_and_start_fall_back_with_warnings() {
    let mut input = make_input(
        vec![Constituent::new("A")],
        vec![("A", bars(&[("2024-12-31", 10.0), ("2025-01-02", 11.0)]))],
    );
    input.definition.base_value = Some(0.0);
    input.definition.start_date = Some("yesterday".into());
    let out = build_index(&input).unwrap();
    assert_eq!(out.warnings.len(), 2);
    let series = out.result.series.unwrap();
    // Start fell back to as_of (2024-12-31), base to 100.
    assert_eq!(series.points[0].date, d("2024-12-31"));
    assert!(approx_eq(series.points[0].value, 100.0, 1e-9));
}

#[test]
fn test_json_input_document() {
    let json = r#"{
        "definition": {
            "code": "mix",
            "name": "Mixed",
            "constituents": [
                {"symbol": "aaa", "weightPct": 25},
                {"symbol": "bbb", "weightPct": 75}
            ],
            "startDate": "2024-01-01"
        },
        "prices": {
            "AAA": [{"date": "2024-01-02", "close": 10}, {"date": "2024-01-03", "close": 12}],
            "BBB": [{"date": "2024-01-03", "close": 4}, {"date": "2024-01-02", "close": 4}, {"date": null, "close": 1}]
        },
        "as_of": "2024-02-01"
    }"#;
    let input: BuildIndexInput = serde_json::from_str(json).unwrap();
    let series = build_index(&input).unwrap().result.series.unwrap();
    assert_eq!(series.index_code, "MIX");
    // 0.25 * 1.2 + 0.75 * 1.0 = 1.05
    assert!(approx_eq(series.points[1].value, 105.0, 1e-9));
}
