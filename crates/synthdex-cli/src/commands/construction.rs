use clap::Args;
use serde_json::Value;
use std::collections::HashMap;

use synthdex_core::construction::builder::BuildIndexInput;
use synthdex_core::construction::weights::{self, WeightNormalizationInput};
use synthdex_core::fetch::fanout::{self, ConstructIndexInput};
use synthdex_core::fetch::source::InMemoryPriceSource;
use synthdex_core::PriceBar;

use crate::input::{self, read_input};

#[derive(Args)]
pub struct NormalizeWeightsArgs {
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct BuildIndexArgs {
    /// Definition document, optionally carrying a `prices` map
    #[arg(long)]
    pub input: Option<String>,
    /// Separate symbol -> bars JSON file, merged over the input's prices
    #[arg(long)]
    pub prices: Option<String>,
}

pub fn run_normalize_weights(
    args: NormalizeWeightsArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let input_data: WeightNormalizationInput = read_input(args.input.as_deref())?;
    let result = weights::calculate_weight_normalization(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_build_index(args: BuildIndexArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input_data: BuildIndexInput = read_input(args.input.as_deref())?;

    let mut source = InMemoryPriceSource::new(input_data.prices);
    if let Some(ref path) = args.prices {
        let extra: HashMap<String, Vec<PriceBar>> = input::file::read_json(path)?;
        for (symbol, bars) in extra {
            source.insert(&symbol, bars);
        }
    }

    let construct = ConstructIndexInput {
        definition: input_data.definition,
        as_of: input_data.as_of,
    };
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let result = runtime.block_on(fanout::construct_index(&source, &construct))?;
    Ok(serde_json::to_value(result)?)
}
