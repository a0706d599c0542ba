use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SynthIndexError;
use crate::types::{deserialize_iso_date, IndexPoint, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed lookback windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodToken {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl PeriodToken {
    pub const ALL: [PeriodToken; 7] = [
        PeriodToken::OneDay,
        PeriodToken::FiveDays,
        PeriodToken::OneMonth,
        PeriodToken::SixMonths,
        PeriodToken::YearToDate,
        PeriodToken::OneYear,
        PeriodToken::FiveYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodToken::OneDay => "1D",
            PeriodToken::FiveDays => "5D",
            PeriodToken::OneMonth => "1M",
            PeriodToken::SixMonths => "6M",
            PeriodToken::YearToDate => "YTD",
            PeriodToken::OneYear => "1Y",
            PeriodToken::FiveYears => "5Y",
        }
    }

    /// Calendar date the window reaches back to from `latest`. `None` for
    /// `1D`, which is resolved by position rather than by date.
    pub fn target_date(&self, latest: NaiveDate) -> Option<NaiveDate> {
        match self {
            PeriodToken::OneDay => None,
            PeriodToken::FiveDays => latest.checked_sub_days(Days::new(5)),
            PeriodToken::OneMonth => latest.checked_sub_months(Months::new(1)),
            PeriodToken::SixMonths => latest.checked_sub_months(Months::new(6)),
            PeriodToken::YearToDate => NaiveDate::from_ymd_opt(latest.year(), 1, 1),
            PeriodToken::OneYear => latest.checked_sub_months(Months::new(12)),
            PeriodToken::FiveYears => latest.checked_sub_months(Months::new(60)),
        }
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodToken {
    type Err = SynthIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        PeriodToken::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| SynthIndexError::InvalidInput {
                field: "period".into(),
                reason: format!("Unknown period '{s}'; expected one of 1D, 5D, 1M, 6M, YTD, 1Y, 5Y"),
            })
    }
}

/// A dated observation of some index level.
pub trait SeriesPoint {
    fn date(&self) -> NaiveDate;
    fn value(&self) -> Option<f64>;
    /// Pre-computed single-day change, when the source attached one.
    fn change_pct(&self) -> Option<Rate> {
        None
    }
}

impl SeriesPoint for IndexPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> Option<f64> {
        Some(self.value).filter(|v| v.is_finite())
    }

    fn change_pct(&self) -> Option<Rate> {
        self.change_pct
    }
}

/// A point of an arbitrary historical series whose value may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(deserialize_with = "deserialize_iso_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub change_pct: Option<Rate>,
}

impl SeriesPoint for HistoryPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }

    fn change_pct(&self) -> Option<Rate> {
        self.change_pct
    }
}

/// Resolved return for one lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub token: PeriodToken,
    pub baseline_date: Option<NaiveDate>,
    pub baseline_value: Option<f64>,
    pub latest_date: NaiveDate,
    pub latest_value: f64,
    /// `None` when no baseline resolves or the baseline value is zero.
    pub change_pct: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the baseline for `token` and the change from it to the latest
/// point. Returns `None` when the series is empty or its latest value is
/// missing.
pub fn resolve_period_return<P: SeriesPoint>(points: &[P], token: PeriodToken) -> Option<PeriodReturn> {
    let mut sorted: Vec<&P> = points.iter().collect();
    sorted.sort_by_key(|p| p.date());

    let (last, history) = sorted.split_last()?;
    let latest_value = last.value()?;
    let latest_date = last.date();

    let baseline = match token {
        PeriodToken::OneDay => history.iter().rev().find(|p| p.value().is_some()),
        _ => token
            .target_date(latest_date)
            .and_then(|target| {
                sorted
                    .iter()
                    .find(|p| p.date() >= target && p.value().is_some())
            })
            .or_else(|| sorted.iter().find(|p| p.value().is_some())),
    };

    let Some(baseline) = baseline else {
        let change_pct = match token {
            PeriodToken::OneDay => last.change_pct(),
            _ => None,
        };
        return Some(PeriodReturn {
            token,
            baseline_date: None,
            baseline_value: None,
            latest_date,
            latest_value,
            change_pct,
        });
    };

    let baseline_value = baseline.value();
    let change_pct = baseline_value
        .filter(|b| *b != 0.0)
        .map(|b| (latest_value - b) / b);

    Some(PeriodReturn {
        token,
        baseline_date: Some(baseline.date()),
        baseline_value,
        latest_date,
        latest_value,
        change_pct,
    })
}

/// Shorthand for the change fraction alone.
pub fn period_change_pct<P: SeriesPoint>(points: &[P], token: PeriodToken) -> Option<Rate> {
    resolve_period_return(points, token).and_then(|r| r.change_pct)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
