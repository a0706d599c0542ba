//! Constituent weight normalization.
//!
//! Constituents may carry an absolute `weight` (arbitrary scale), an explicit
//! `weight_pct`, both, or neither. Normalization is a two-phase fallback:
//!
//! 1. **Absolute** -- if the finite, non-negative `weight` values sum to a
//!    positive total, every entry with such a value gets
//!    `weight_pct = weight / total * 100`.
//! 2. **Percentage** -- otherwise the same is attempted with `weight_pct`
//!    as the source field.
//! 3. **Unweighted** -- otherwise entries pass through untouched.
//!
//! Entries without a usable value in the winning phase keep
//! `weight_pct = None`, which downstream means "share equally".
//!
//! Inputs that supply both fields inconsistently are not reconciled; the
//! absolute phase wins whenever it has a positive total.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput};
use crate::SynthIndexResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One position in a candidate index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    pub symbol: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default, alias = "weightPct")]
    pub weight_pct: Option<f64>,
}

impl Constituent {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            weight: None,
            weight_pct: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_weight_pct(mut self, weight_pct: f64) -> Self {
        self.weight_pct = Some(weight_pct);
        self
    }
}

/// Which field the normalized percentages were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBasis {
    Absolute,
    Percentage,
    Unweighted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedWeights {
    pub constituents: Vec<Constituent>,
    pub basis: WeightBasis,
}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightNormalizationInput {
    pub constituents: Vec<Constituent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightNormalizationOutput {
    pub constituents: Vec<Constituent>,
    pub basis: WeightBasis,
    /// Sum of the resolved percentages (100 unless unweighted).
    pub total_pct: f64,
    /// Symbols left without a percentage; they share equally downstream.
    pub unweighted_symbols: Vec<String>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Normalize constituent weights and wrap the result in the standard envelope.
pub fn calculate_weight_normalization(
    input: &WeightNormalizationInput,
) -> SynthIndexResult<ComputationOutput<WeightNormalizationOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let normalized = normalize_weights(&input.constituents);
    if normalized.basis == WeightBasis::Unweighted && !input.constituents.is_empty() {
        warnings.push("No positive weight or weight_pct supplied; constituents will be equally weighted".into());
    }

    let total_pct: f64 = normalized
        .constituents
        .iter()
        .filter_map(|c| c.weight_pct)
        .filter(|p| p.is_finite())
        .sum();
    let unweighted_symbols = normalized
        .constituents
        .iter()
        .filter(|c| c.weight_pct.is_none())
        .map(|c| c.symbol.clone())
        .collect();

    let output = WeightNormalizationOutput {
        constituents: normalized.constituents,
        basis: normalized.basis,
        total_pct,
        unweighted_symbols,
    };

    Ok(with_metadata(
        "Two-phase weight normalization (absolute, then percentage)",
        &serde_json::json!({ "target_total_pct": 100 }),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Normalize weights to percentages of 100 wherever derivable.
pub fn normalize_weights(entries: &[Constituent]) -> NormalizedWeights {
    let absolute: Vec<Option<f64>> = entries.iter().map(|c| weight_value(c.weight)).collect();
    if let Some(pcts) = percentages_of_total(&absolute) {
        let constituents = entries
            .iter()
            .zip(absolute.iter().zip(pcts))
            .map(|(c, (value, pct))| match value {
                Some(w) => Constituent {
                    symbol: c.symbol.clone(),
                    weight: Some(*w),
                    weight_pct: pct,
                },
                None => Constituent {
                    weight_pct: None,
                    ..c.clone()
                },
            })
            .collect();
        return NormalizedWeights {
            constituents,
            basis: WeightBasis::Absolute,
        };
    }

    let pcts: Vec<Option<f64>> = entries
        .iter()
        .map(|c| weight_value(c.weight_pct))
        .collect();
    if let Some(rescaled) = percentages_of_total(&pcts) {
        let constituents = entries
            .iter()
            .zip(rescaled)
            .map(|(c, pct)| Constituent {
                weight_pct: pct,
                ..c.clone()
            })
            .collect();
        return NormalizedWeights {
            constituents,
            basis: WeightBasis::Percentage,
        };
    }

    NormalizedWeights {
        constituents: entries.to_vec(),
        basis: WeightBasis::Unweighted,
    }
}

/// Shares used by the compositor: positive percentages rescaled to sum to 1.
/// Entries without a positive percentage get 0, unless none has one, in which
/// case every entry gets `1/n`.
pub fn resolve_shares(weight_pcts: &[Option<f64>]) -> Vec<f64> {
    let n = weight_pcts.len();
    if n == 0 {
        return Vec::new();
    }
    let positive: Vec<f64> = weight_pcts
        .iter()
        .map(|p| match p {
            Some(v) if v.is_finite() && *v > 0.0 => *v,
            _ => 0.0,
        })
        .collect();
    let max = positive.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        let total: f64 = positive.iter().map(|w| w / max).sum();
        positive.iter().map(|w| w / max / total).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}

/// Each present value as a percentage of the present total, or `None` when
/// no value is positive. Values are divided by the largest one before summing
/// so that large finite weights cannot overflow the total.
fn percentages_of_total(values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
    let max = values.iter().flatten().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return None;
    }
    let total: f64 = values.iter().flatten().map(|v| v / max).sum();
    Some(
        values
            .iter()
            .map(|v| v.map(|v| v / max / total * 100.0))
            .collect(),
    )
}

/// A finite positive value, an exact zero, or nothing.
fn weight_value(raw: Option<f64>) -> Option<f64> {
    match raw {
        Some(w) if w.is_finite() && w > 0.0 => Some(w),
        Some(w) if w == 0.0 => Some(0.0),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
