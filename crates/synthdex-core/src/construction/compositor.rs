//! Buy-and-hold rebasing composite.
//!
//! `value_t = base_value * sum_i(share_i * last_price_i,t / base_price_i)`
//!
//! Shares are fixed at construction; weights drift with prices afterwards.
//! A constituent without an observation on a date keeps its last known close.

use tracing::debug;

use super::alignment::AlignedSeries;
use crate::types::IndexPoint;

/// Walk the union timeline once and emit one index point per date.
///
/// `shares` is parallel to `aligned.constituents` and should sum to 1.
pub fn composite(aligned: &AlignedSeries, shares: &[f64], base_value: f64) -> Vec<IndexPoint> {
    let constituents = &aligned.constituents;
    debug_assert_eq!(constituents.len(), shares.len());

    let mut last_prices: Vec<f64> = constituents.iter().map(|c| c.base_price).collect();
    let mut cursors: Vec<usize> = vec![0; constituents.len()];
    let mut prev_value: Option<f64> = None;
    let mut points = Vec::with_capacity(aligned.timeline.len());

    for &date in &aligned.timeline {
        for (i, c) in constituents.iter().enumerate() {
            // Both the timeline and each series are ascending; advance the
            // cursor past anything earlier than `date`.
            while cursors[i] < c.points.len() && c.points[cursors[i]].date < date {
                cursors[i] += 1;
            }
            if let Some(p) = c.points.get(cursors[i]) {
                if p.date == date && p.close > 0.0 {
                    last_prices[i] = p.close;
                }
            }
        }

        // Unreachable while base prices are validated upstream.
        if last_prices.iter().any(|p| !(*p > 0.0)) {
            debug!(%date, "skipping date with non-positive carried price");
            continue;
        }

        let factor: f64 = constituents
            .iter()
            .zip(shares)
            .zip(&last_prices)
            .map(|((c, share), last)| share * (last / c.base_price))
            .sum();
        let value = base_value * factor;

        let change_pct = match prev_value {
            Some(prev) if prev != 0.0 => Some((value - prev) / prev),
            _ => None,
        };

        points.push(IndexPoint {
            date,
            value,
            change_pct,
        });
        prev_value = Some(value);
    }

    points
}
