use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Index levels and closing prices.
pub type Price = f64;

/// Fractional changes (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// ISO calendar date format used on every wire boundary.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date, tolerating surrounding whitespace and a
/// trailing time component (`2024-01-02T00:00:00Z`).
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, ISO_DATE).ok()
}

/// Serde adapter applying [`parse_iso_date`] to a required date field.
pub fn deserialize_iso_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO date '{raw}'")))
}

/// A raw daily bar as supplied by a price source. Either field may be absent
/// or unusable; the aligner drops such rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub close: Option<f64>,
}

impl PriceBar {
    pub fn new(date: &str, close: f64) -> Self {
        Self {
            date: Some(date.to_string()),
            close: Some(close),
        }
    }
}

/// A validated daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Price,
}

/// One point of a constructed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub value: Price,
    pub change_pct: Option<Rate>,
}

/// A constructed synthetic index. Points are strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSeries {
    pub index_code: String,
    pub index_name: String,
    pub points: Vec<IndexPoint>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "f64".to_string(),
        },
    }
}
