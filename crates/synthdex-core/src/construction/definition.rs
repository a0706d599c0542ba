//! User-authored index definitions and their resolution into engine inputs.
//!
//! Resolution never fails on bad numbers: a non-positive base value falls back
//! to [`DEFAULT_BASE_VALUE`] and an unparseable start date falls back to
//! "today", each with a warning. Only an index code that is empty after
//! normalization is rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::weights::{normalize_weights, Constituent, WeightBasis};
use crate::error::SynthIndexError;
use crate::types::parse_iso_date;
use crate::SynthIndexResult;

/// Index level at the effective start date when none is supplied.
pub const DEFAULT_BASE_VALUE: f64 = 100.0;

/// A synthetic index as authored by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub constituents: Vec<Constituent>,
    /// ISO date; the index begins no earlier than this.
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "baseValue")]
    pub base_value: Option<f64>,
}

/// A definition after normalization, ready for construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDefinition {
    pub code: String,
    pub name: String,
    /// Unique uppercase symbols with normalized weights, in first-seen order.
    pub constituents: Vec<Constituent>,
    pub weight_basis: WeightBasis,
    pub start_date: NaiveDate,
    pub base_value: f64,
}

/// Uppercase and strip everything outside `[A-Z0-9_-]`.
pub fn normalize_code(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Merge constituents sharing a symbol by summing their weight fields.
/// Blank symbols are dropped.
pub fn merge_duplicates(constituents: &[Constituent]) -> Vec<Constituent> {
    let mut merged: Vec<Constituent> = Vec::with_capacity(constituents.len());
    for c in constituents {
        let symbol = normalize_symbol(&c.symbol);
        if symbol.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|m| m.symbol == symbol) {
            Some(existing) => {
                existing.weight = sum_optional(existing.weight, c.weight);
                existing.weight_pct = sum_optional(existing.weight_pct, c.weight_pct);
            }
            None => merged.push(Constituent {
                symbol,
                weight: c.weight,
                weight_pct: c.weight_pct,
            }),
        }
    }
    merged
}

fn sum_optional(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Resolve a definition against `today`, appending any fallbacks applied to
/// `warnings`.
pub fn resolve_definition(
    definition: &IndexDefinition,
    today: NaiveDate,
    warnings: &mut Vec<String>,
) -> SynthIndexResult<ResolvedDefinition> {
    let code = normalize_code(&definition.code);
    if code.is_empty() {
        return Err(SynthIndexError::InvalidInput {
            field: "code".into(),
            reason: format!(
                "'{}' has no characters from [A-Z0-9_-]",
                definition.code
            ),
        });
    }

    let name = definition
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| code.clone());

    let base_value = match definition.base_value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        Some(v) => {
            let msg = format!("Base value {v} is not positive; using {DEFAULT_BASE_VALUE}");
            warn!(index = %code, base_value = v, "invalid base value");
            warnings.push(msg);
            DEFAULT_BASE_VALUE
        }
        None => DEFAULT_BASE_VALUE,
    };

    let start_date = match definition.start_date.as_deref() {
        Some(raw) => match parse_iso_date(raw) {
            Some(d) => d,
            None => {
                warn!(index = %code, start_date = raw, "unparseable start date");
                warnings.push(format!(
                    "Start date '{raw}' is not an ISO date; using {today}"
                ));
                today
            }
        },
        None => today,
    };

    let merged = merge_duplicates(&definition.constituents);
    let normalized = normalize_weights(&merged);

    Ok(ResolvedDefinition {
        code,
        name,
        constituents: normalized.constituents,
        weight_basis: normalized.basis,
        start_date,
        base_value,
    })
}
