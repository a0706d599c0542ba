use napi::Result as NapiResult;
use napi_derive::napi;

use synthdex_core::construction::builder::{self, BuildIndexInput};
use synthdex_core::construction::weights::{self, WeightNormalizationInput};
use synthdex_core::returns::period::{self, HistoryPoint, PeriodToken};
use synthdex_core::returns::table::{self, PeriodReturnInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[napi]
pub fn normalize_weights(input_json: String) -> NapiResult<String> {
    let input: WeightNormalizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = weights::calculate_weight_normalization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Definition plus pre-fetched prices; the host owns fetching.
#[napi]
pub fn build_index(input_json: String) -> NapiResult<String> {
    let input: BuildIndexInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = builder::build_index(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Period returns
// ---------------------------------------------------------------------------

/// Change fraction for one token, or `null`.
#[napi]
pub fn period_return(points_json: String, token: String) -> NapiResult<Option<f64>> {
    let points: Vec<HistoryPoint> = serde_json::from_str(&points_json).map_err(to_napi_error)?;
    let token: PeriodToken = token.parse().map_err(to_napi_error)?;
    Ok(period::period_change_pct(&points, token))
}

#[napi]
pub fn period_return_table(input_json: String) -> NapiResult<String> {
    let input: PeriodReturnInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = table::calculate_period_returns(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
