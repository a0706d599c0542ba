use clap::Args;
use serde_json::Value;

use synthdex_core::returns::table::{self, PeriodReturnInput};

use crate::input::read_input;

#[derive(Args)]
pub struct PeriodReturnArgs {
    /// Index series document (`{"points": [...]}`)
    #[arg(long)]
    pub input: Option<String>,
    /// One of 1D, 5D, 1M, 6M, YTD, 1Y, 5Y; all when omitted
    #[arg(long)]
    pub period: Option<String>,
}

pub fn run_period_return(args: PeriodReturnArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: PeriodReturnInput = read_input(args.input.as_deref())?;
    if args.period.is_some() {
        input_data.period = args.period;
    }
    let result = table::calculate_period_returns(&input_data)?;
    Ok(serde_json::to_value(result)?)
}
