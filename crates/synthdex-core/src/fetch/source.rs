use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::construction::definition::normalize_symbol;
use crate::error::SynthIndexError;
use crate::types::PriceBar;
use crate::SynthIndexResult;

/// Supplies daily bars for one symbol from `start` onward.
///
/// Implementations may return bars unsorted, with gaps or unusable rows,
/// or rows before `start`; the aligner copes with all of those.
#[async_trait]
pub trait PriceSeriesFetcher: Send + Sync {
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> SynthIndexResult<Vec<PriceBar>>;
}

/// A fetcher over a fixed symbol -> bars map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryPriceSource {
    /// Keys that normalize to the same symbol are merged in ascending key
    /// order.
    pub fn new(map: HashMap<String, Vec<PriceBar>>) -> Self {
        let mut source = Self::default();
        let ordered: BTreeMap<String, Vec<PriceBar>> = map.into_iter().collect();
        for (symbol, bars) in ordered {
            source.insert(&symbol, bars);
        }
        source
    }

    /// Add bars for `symbol`, appending to any already held.
    pub fn insert(&mut self, symbol: &str, bars: Vec<PriceBar>) {
        self.series
            .entry(normalize_symbol(symbol))
            .or_default()
            .extend(bars);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

#[async_trait]
impl PriceSeriesFetcher for InMemoryPriceSource {
    async fn fetch_daily(&self, symbol: &str, _start: NaiveDate) -> SynthIndexResult<Vec<PriceBar>> {
        self.series
            .get(&normalize_symbol(symbol))
            .cloned()
            .ok_or_else(|| SynthIndexError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "symbol not present in price source".into(),
            })
    }
}
