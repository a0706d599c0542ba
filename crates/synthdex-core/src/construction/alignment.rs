//! Multi-constituent time alignment.
//!
//! Cleans each constituent's raw bars, picks one effective start date valid
//! for every constituent (the latest of their first usable dates), trims each
//! series to it and builds the union timeline of trading dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::types::{parse_iso_date, PriceBar, PricePoint};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw input for one constituent.
#[derive(Debug, Clone, Copy)]
pub struct ConstituentSeries<'a> {
    pub symbol: &'a str,
    pub weight_pct: Option<f64>,
    pub bars: &'a [PriceBar],
}

/// Why a constituent did not make it into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExclusionReason {
    FetchFailed(String),
    NoPriceData,
    NoValidRows,
    NoRowsAfterEffectiveStart,
    NonPositiveBasePrice(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedConstituent {
    pub symbol: String,
    pub reason: ExclusionReason,
}

impl ExcludedConstituent {
    pub fn new(symbol: &str, reason: ExclusionReason) -> Self {
        warn!(symbol = %symbol, reason = ?reason, "constituent excluded");
        Self {
            symbol: symbol.to_string(),
            reason,
        }
    }
}

/// A constituent trimmed to the effective start.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedConstituent {
    pub symbol: String,
    pub weight_pct: Option<f64>,
    pub base_date: NaiveDate,
    /// First close on or after the effective start; always finite and > 0.
    pub base_price: f64,
    /// Ascending, unique dates, all `>= effective_start`.
    pub points: Vec<PricePoint>,
}

impl AlignedConstituent {
    /// Last strictly positive close, which is where forward-fill ends up.
    pub fn last_price(&self) -> f64 {
        self.points
            .iter()
            .rev()
            .map(|p| p.close)
            .find(|c| *c > 0.0)
            .unwrap_or(self.base_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub effective_start: NaiveDate,
    pub timeline: Vec<NaiveDate>,
    pub constituents: Vec<AlignedConstituent>,
    pub excluded: Vec<ExcludedConstituent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    Aligned(AlignedSeries),
    /// No constituent survived; nothing can be constructed.
    Insufficient { excluded: Vec<ExcludedConstituent> },
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Drop rows without a parseable date or a finite close and sort ascending.
/// A later row for an already-seen date replaces the earlier one.
pub fn clean_bars(bars: &[PriceBar]) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for bar in bars {
        let (Some(raw_date), Some(close)) = (bar.date.as_deref(), bar.close) else {
            continue;
        };
        if !close.is_finite() {
            continue;
        }
        if let Some(date) = parse_iso_date(raw_date) {
            by_date.insert(date, close);
        }
    }
    by_date
        .into_iter()
        .map(|(date, close)| PricePoint { date, close })
        .collect()
}

/// First date on or after `start`, else the series' own first date.
fn first_usable_date(points: &[PricePoint], start: NaiveDate) -> Option<NaiveDate> {
    points
        .iter()
        .find(|p| p.date >= start)
        .or_else(|| points.first())
        .map(|p| p.date)
}

/// Align constituent series against the requested start date.
pub fn align_series(inputs: &[ConstituentSeries<'_>], start: NaiveDate) -> Alignment {
    let mut excluded = Vec::new();

    let cleaned: Vec<(&ConstituentSeries<'_>, Vec<PricePoint>)> = inputs
        .iter()
        .filter_map(|input| {
            let points = clean_bars(input.bars);
            if points.is_empty() {
                excluded.push(ExcludedConstituent::new(
                    input.symbol,
                    ExclusionReason::NoValidRows,
                ));
                None
            } else {
                Some((input, points))
            }
        })
        .collect();

    let Some(effective_start) = cleaned
        .iter()
        .filter_map(|(_, points)| first_usable_date(points, start))
        .max()
    else {
        return Alignment::Insufficient { excluded };
    };

    let mut constituents = Vec::with_capacity(cleaned.len());
    for (input, points) in cleaned {
        let trimmed: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.date >= effective_start)
            .collect();
        let Some(first) = trimmed.first() else {
            excluded.push(ExcludedConstituent::new(
                input.symbol,
                ExclusionReason::NoRowsAfterEffectiveStart,
            ));
            continue;
        };
        if !(first.close.is_finite() && first.close > 0.0) {
            excluded.push(ExcludedConstituent::new(
                input.symbol,
                ExclusionReason::NonPositiveBasePrice(first.close),
            ));
            continue;
        }
        constituents.push(AlignedConstituent {
            symbol: input.symbol.to_string(),
            weight_pct: input.weight_pct,
            base_date: first.date,
            base_price: first.close,
            points: trimmed,
        });
    }

    if constituents.is_empty() {
        return Alignment::Insufficient { excluded };
    }

    let timeline: Vec<NaiveDate> = constituents
        .iter()
        .flat_map(|c| c.points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    debug!(
        %effective_start,
        constituents = constituents.len(),
        excluded = excluded.len(),
        dates = timeline.len(),
        "aligned constituent series"
    );

    Alignment::Aligned(AlignedSeries {
        effective_start,
        timeline,
        constituents,
        excluded,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bars(rows: &[(&str, f64)]) -> Vec<PriceBar> {
        rows.iter().map(|(date, close)| PriceBar::new(date, *close)).collect()
    }

    fn series<'a>(symbol: &'a str, bars: &'a [PriceBar]) -> ConstituentSeries<'a> {
        ConstituentSeries {
            symbol,
            weight_pct: None,
            bars,
        }
    }

    fn expect_aligned(a: Alignment) -> AlignedSeries {
        match a {
            Alignment::Aligned(s) => s,
            Alignment::Insufficient { excluded } => panic!("insufficient: {excluded:?}"),
        }
    }

    #[test]
    fn test_clean_drops_invalid_rows_and_sorts() {
        let raw = vec![
            PriceBar::new("2024-01-03", 11.0),
            PriceBar { date: None, close: Some(5.0) },
            PriceBar { date: Some("2024-01-04".into()), close: None },
            PriceBar::new("2024-01-05", f64::NAN),
            PriceBar::new("not a date", 7.0),
            PriceBar::new("2024-01-02", 10.0),
        ];
        let cleaned = clean_bars(&raw);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].date, d("2024-01-02"));
        assert_eq!(cleaned[1].close, 11.0);
    }

    #[test]
    fn test_clean_keeps_last_duplicate() {
        let raw = bars(&[("2024-01-02", 10.0), ("2024-01-02", 12.0)]);
        let cleaned = clean_bars(&raw);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].close, 12.0);
    }

    #[test]
    fn test_effective_start_is_latest_first_date() {
        let a = bars(&[("2024-01-02", 10.0), ("2024-01-03", 11.0), ("2024-01-04", 12.0)]);
        let b = bars(&[("2024-01-03", 50.0), ("2024-01-04", 51.0)]);
        let out = expect_aligned(align_series(&[series("A", &a), series("B", &b)], d("2024-01-01")));
        assert_eq!(out.effective_start, d("2024-01-03"));
        assert_eq!(out.constituents[0].base_price, 11.0);
        assert_eq!(out.constituents[1].base_price, 50.0);
        assert_eq!(out.timeline, vec![d("2024-01-03"), d("2024-01-04")]);
    }

    #[test]
    fn test_effective_start_never_before_requested_start() {
        let a = bars(&[("2024-01-02", 10.0), ("2024-01-10", 11.0)]);
        let b = bars(&[("2024-01-02", 20.0), ("2024-01-08", 21.0)]);
        let out = expect_aligned(align_series(&[series("A", &a), series("B", &b)], d("2024-01-05")));
        assert_eq!(out.effective_start, d("2024-01-10"));
        // B has no row on 2024-01-10 or later.
        assert_eq!(out.constituents.len(), 1);
        assert_eq!(
            out.excluded[0].reason,
            ExclusionReason::NoRowsAfterEffectiveStart
        );
    }

    #[test]
    fn test_series_entirely_before_start_uses_own_first_row() {
        let a = bars(&[("2023-01-02", 10.0), ("2023-01-03", 11.0)]);
        let out = expect_aligned(align_series(&[series("A", &a)], d("2024-01-01")));
        assert_eq!(out.effective_start, d("2023-01-02"));
        assert_eq!(out.timeline.len(), 2);
    }

    #[test]
    fn test_constituent_without_valid_rows_dropped() {
        let a = bars(&[("2024-01-02", 10.0)]);
        let b = vec![PriceBar { date: None, close: None }];
        let out = expect_aligned(align_series(&[series("A", &a), series("B", &b)], d("2024-01-01")));
        assert_eq!(out.constituents.len(), 1);
        assert_eq!(out.excluded[0].symbol, "B");
        assert_eq!(out.excluded[0].reason, ExclusionReason::NoValidRows);
    }

    #[test]
    fn test_non_positive_base_price_dropped() {
        let a = bars(&[("2024-01-02", 10.0)]);
        let b = bars(&[("2024-01-02", 0.0), ("2024-01-03", 5.0)]);
        let out = expect_aligned(align_series(&[series("A", &a), series("B", &b)], d("2024-01-01")));
        assert_eq!(out.constituents.len(), 1);
        assert_eq!(
            out.excluded[0].reason,
            ExclusionReason::NonPositiveBasePrice(0.0)
        );
    }

    #[test]
    fn test_all_dropped_is_insufficient() {
        let empty: Vec<PriceBar> = vec![];
        match align_series(&[series("A", &empty)], d("2024-01-01")) {
            Alignment::Insufficient { excluded } => assert_eq!(excluded.len(), 1),
            other => panic!("expected insufficient, got {other:?}"),
        }
    }

    #[test]
    fn test_no_inputs_is_insufficient() {
        assert!(matches!(
            align_series(&[], d("2024-01-01")),
            Alignment::Insufficient { .. }
        ));
    }

    #[test]
    fn test_timeline_is_union_of_dates() {
        let a = bars(&[("2024-01-02", 10.0), ("2024-01-04", 12.0)]);
        let b = bars(&[("2024-01-02", 20.0), ("2024-01-03", 21.0)]);
        let out = expect_aligned(align_series(&[series("A", &a), series("B", &b)], d("2024-01-01")));
        assert_eq!(
            out.timeline,
            vec![d("2024-01-02"), d("2024-01-03"), d("2024-01-04")]
        );
    }

    #[test]
    fn test_last_price_skips_non_positive_tail() {
        let a = bars(&[("2024-01-02", 10.0), ("2024-01-03", 12.0), ("2024-01-04", 0.0)]);
        let out = expect_aligned(align_series(&[series("A", &a)], d("2024-01-01")));
        assert_eq!(out.constituents[0].last_price(), 12.0);
    }
}
