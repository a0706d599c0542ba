pub mod error;
pub mod types;

#[cfg(feature = "construction")]
pub mod construction;

#[cfg(feature = "period_returns")]
pub mod returns;

#[cfg(feature = "fetch")]
pub mod fetch;

pub use error::SynthIndexError;
pub use types::*;

/// Standard result type for all synthdex operations
pub type SynthIndexResult<T> = Result<T, SynthIndexError>;
