use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::source::PriceSeriesFetcher;
use crate::construction::builder::{compose_index, today_local, wrap_build, FetchedPrices, IndexBuild};
use crate::construction::definition::{resolve_definition, IndexDefinition};
use crate::types::ComputationOutput;
use crate::SynthIndexResult;

/// A definition to construct against a live price source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructIndexInput {
    pub definition: IndexDefinition,
    #[serde(default, alias = "asOf")]
    pub as_of: Option<NaiveDate>,
}

/// Fetch every symbol concurrently. Failures are isolated per symbol.
pub async fn fetch_constituent_prices<F>(fetcher: &F, symbols: &[String], start: NaiveDate) -> FetchedPrices
where
    F: PriceSeriesFetcher + ?Sized,
{
    let requests = symbols.iter().map(|symbol| async move {
        let result = fetcher.fetch_daily(symbol, start).await;
        (symbol, result)
    });
    let results = join_all(requests).await;

    let mut fetched = FetchedPrices::default();
    for (symbol, result) in results {
        match result {
            Ok(bars) => {
                debug!(symbol = %symbol, bars = bars.len(), "fetched price series");
                fetched.series.insert(symbol.clone(), bars);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price fetch failed");
                fetched.failures.insert(symbol.clone(), e.to_string());
            }
        }
    }
    fetched
}

/// Resolve the definition, fetch its constituents and construct the index.
pub async fn construct_index<F>(
    fetcher: &F,
    input: &ConstructIndexInput,
) -> SynthIndexResult<ComputationOutput<IndexBuild>>
where
    F: PriceSeriesFetcher + ?Sized,
{
    let started = Instant::now();
    let mut warnings = Vec::new();

    let today = input.as_of.unwrap_or_else(today_local);
    let resolved = resolve_definition(&input.definition, today, &mut warnings)?;

    let symbols: Vec<String> = resolved
        .constituents
        .iter()
        .map(|c| c.symbol.clone())
        .collect();
    let fetched = fetch_constituent_prices(fetcher, &symbols, resolved.start_date).await;
    let build = compose_index(&resolved, &fetched);

    Ok(wrap_build(&resolved, warnings, started, build))
}
