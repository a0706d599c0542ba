use thiserror::Error;

/// Insufficient data is not an error here: construction reports it as an
/// absent series and period resolution as an absent change.
#[derive(Debug, Error)]
pub enum SynthIndexError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },
}
