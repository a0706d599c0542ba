//! Synthetic index construction entry points.
//!
//! [`compose_index`] is the pure core: a resolved definition plus whatever
//! price data was obtained per symbol in, an [`IndexBuild`] out. An index with
//! no surviving constituent yields `series: None`, never an error.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::info;

use super::alignment::{
    align_series, AlignedSeries, Alignment, ConstituentSeries, ExcludedConstituent,
    ExclusionReason,
};
use super::compositor::composite;
use super::definition::{normalize_symbol, resolve_definition, IndexDefinition, ResolvedDefinition};
use super::weights::resolve_shares;
use crate::types::{with_metadata, ComputationOutput, IndexSeries, PriceBar, Rate};
use crate::SynthIndexResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-symbol price data as obtained from a source, including failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchedPrices {
    pub series: HashMap<String, Vec<PriceBar>>,
    /// Symbol -> failure description.
    pub failures: HashMap<String, String>,
}

impl FetchedPrices {
    /// Build from a symbol -> bars map, normalizing symbols. Keys that
    /// normalize to the same symbol are merged in ascending key order, so on
    /// a shared date the bar under the greater raw key wins.
    pub fn from_map(map: &HashMap<String, Vec<PriceBar>>) -> Self {
        let mut series: HashMap<String, Vec<PriceBar>> = HashMap::with_capacity(map.len());
        let ordered: BTreeMap<&String, &Vec<PriceBar>> = map.iter().collect();
        for (symbol, bars) in ordered {
            series
                .entry(normalize_symbol(symbol))
                .or_default()
                .extend(bars.iter().cloned());
        }
        Self {
            series,
            failures: HashMap::new(),
        }
    }
}

/// A constituent as it entered the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstituentReport {
    pub symbol: String,
    pub weight_pct: Option<f64>,
    /// Fraction of the index at inception actually used by the compositor.
    pub share: f64,
    pub base_date: NaiveDate,
    pub base_price: f64,
    pub last_price: f64,
    pub relative_performance: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub effective_start: NaiveDate,
    pub points: usize,
    pub latest_date: NaiveDate,
    pub latest_value: f64,
    /// `latest_value / base_value - 1`
    pub total_return: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBuild {
    pub series: Option<IndexSeries>,
    pub summary: Option<BuildSummary>,
    pub constituents: Vec<ConstituentReport>,
    pub excluded: Vec<ExcludedConstituent>,
}

impl IndexBuild {
    fn insufficient(excluded: Vec<ExcludedConstituent>) -> Self {
        Self {
            series: None,
            summary: None,
            constituents: Vec::new(),
            excluded,
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Definition plus already-fetched prices keyed by symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildIndexInput {
    pub definition: IndexDefinition,
    #[serde(default)]
    pub prices: HashMap<String, Vec<PriceBar>>,
    /// Date standing in for "today" in fallbacks; local date when absent.
    #[serde(default, alias = "asOf")]
    pub as_of: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Construct an index from a definition and pre-fetched prices.
pub fn build_index(input: &BuildIndexInput) -> SynthIndexResult<ComputationOutput<IndexBuild>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let today = input.as_of.unwrap_or_else(today_local);
    let resolved = resolve_definition(&input.definition, today, &mut warnings)?;
    let fetched = FetchedPrices::from_map(&input.prices);
    let build = compose_index(&resolved, &fetched);

    Ok(wrap_build(&resolved, warnings, start, build))
}

pub(crate) fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Wrap a finished build in the standard envelope.
pub(crate) fn wrap_build(
    resolved: &ResolvedDefinition,
    mut warnings: Vec<String>,
    started: Instant,
    build: IndexBuild,
) -> ComputationOutput<IndexBuild> {
    for ex in &build.excluded {
        warnings.push(format!("Excluded {}: {:?}", ex.symbol, ex.reason));
    }
    if build.series.is_none() {
        warnings.push("Insufficient data: no constituent has usable prices".into());
    }

    let assumptions = serde_json::json!({
        "code": resolved.code,
        "start_date": resolved.start_date,
        "base_value": resolved.base_value,
        "weight_basis": resolved.weight_basis,
        "rebalancing": "none (buy-and-hold from effective start)",
        "missing_prices": "forward-filled from last close",
    });

    with_metadata(
        "Buy-and-hold rebased composite index",
        &assumptions,
        warnings,
        started.elapsed().as_micros() as u64,
        build,
    )
}

/// Align, weight and composite the constituents of `definition`.
pub fn compose_index(definition: &ResolvedDefinition, prices: &FetchedPrices) -> IndexBuild {
    let mut excluded = Vec::new();
    let mut inputs: Vec<ConstituentSeries<'_>> = Vec::with_capacity(definition.constituents.len());

    for c in &definition.constituents {
        if let Some(reason) = prices.failures.get(&c.symbol) {
            excluded.push(ExcludedConstituent::new(
                &c.symbol,
                ExclusionReason::FetchFailed(reason.clone()),
            ));
            continue;
        }
        match prices.series.get(&c.symbol) {
            Some(bars) => inputs.push(ConstituentSeries {
                symbol: &c.symbol,
                weight_pct: c.weight_pct,
                bars,
            }),
            None => excluded.push(ExcludedConstituent::new(
                &c.symbol,
                ExclusionReason::NoPriceData,
            )),
        }
    }

    let aligned = match align_series(&inputs, definition.start_date) {
        Alignment::Aligned(aligned) => aligned,
        Alignment::Insufficient { excluded: dropped } => {
            excluded.extend(dropped);
            return IndexBuild::insufficient(excluded);
        }
    };

    let shares = resolve_shares(
        &aligned
            .constituents
            .iter()
            .map(|c| c.weight_pct)
            .collect::<Vec<_>>(),
    );
    let points = composite(&aligned, &shares, definition.base_value);
    excluded.extend(aligned.excluded.iter().cloned());

    let (Some(first), Some(latest)) = (points.first(), points.last()) else {
        return IndexBuild::insufficient(excluded);
    };
    let summary = BuildSummary {
        effective_start: aligned.effective_start,
        points: points.len(),
        latest_date: latest.date,
        latest_value: latest.value,
        total_return: latest.value / definition.base_value - 1.0,
    };

    info!(
        index = %definition.code,
        constituents = aligned.constituents.len(),
        points = summary.points,
        "index constructed"
    );

    IndexBuild {
        constituents: constituent_reports(&aligned, &shares),
        series: Some(IndexSeries {
            index_code: definition.code.clone(),
            index_name: definition.name.clone(),
            points,
        }),
        summary: Some(summary),
        excluded,
    }
}

fn constituent_reports(aligned: &AlignedSeries, shares: &[f64]) -> Vec<ConstituentReport> {
    aligned
        .constituents
        .iter()
        .zip(shares)
        .map(|(c, &share)| {
            let last_price = c.last_price();
            ConstituentReport {
                symbol: c.symbol.clone(),
                weight_pct: c.weight_pct,
                share,
                base_date: c.base_date,
                base_price: c.base_price,
                last_price,
                relative_performance: last_price / c.base_price - 1.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
