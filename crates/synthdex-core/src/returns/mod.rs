//! Trailing period returns over any index series.
//!
//! Lookbacks use calendar arithmetic (`chrono::Months`) rather than fixed
//! day counts, so month-end and leap-day shifts clamp to valid dates.

pub mod period;
pub mod table;
