//! Ledger query filters.
//!
//! Callers hand over whatever they extracted from a request as a
//! [`RawFilter`] of optional strings. [`normalize`] turns it into a
//! [`CanonicalFilter`] and never fails: a field that is present but invalid
//! is treated exactly like a missing one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::util::{DATE_FORMAT, parse_calendar_date};

/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Largest page size the lister will apply.
pub const MAX_PAGE_SIZE: u64 = 500;

const MAX_OFFSET: u64 = i64::MAX as u64;

/// Values front-ends send for "no store selected".
const ID_SENTINELS: [&str; 4] = ["", "undefined", "null", "0"];

/// Unvalidated filter parameters, as strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilter {
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    /// `absolute` (default) or `signed`.
    pub amount_mode: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// An entity id known to be a positive integer.
///
/// Only values of this type may be written into SQL text as literals; see
/// [`crate::query`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PositiveId(i64);

impl PositiveId {
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for PositiveId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("id must be positive, got {value}"))
    }
}

impl From<PositiveId> for i64 {
    fn from(value: PositiveId) -> Self {
        value.0
    }
}

/// How amount bounds are compared against the signed `amount` column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    /// Bounds apply to `|amount|`, so one range works for income and expense.
    #[default]
    Absolute,
    /// Bounds apply to the signed amount.
    Signed,
}

impl AmountMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Signed => "signed",
        }
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("signed") => Self::Signed,
            _ => Self::Absolute,
        }
    }
}

/// Free-text search term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    text: String,
    numeric: Option<f64>,
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let numeric = text.parse::<f64>().ok().filter(|v| v.is_finite());
        Some(Self {
            text: text.to_string(),
            numeric,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set when the keyword reads as a number; it then also matches amounts.
    pub fn numeric(&self) -> Option<f64> {
        self.numeric
    }
}

/// Normalized filter. Every `None` means "no condition on this field".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFilter {
    pub store_id: Option<PositiveId>,
    pub category_id: Option<PositiveId>,
    /// Inclusive from `00:00:00`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive up to `23:59:59`.
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub amount_mode: AmountMode,
    pub keyword: Option<Keyword>,
    pub page: u64,
    pub page_size: u64,
}

impl Default for CanonicalFilter {
    fn default() -> Self {
        Self {
            store_id: None,
            category_id: None,
            date_from: None,
            date_to: None,
            min_amount: None,
            max_amount: None,
            amount_mode: AmountMode::Absolute,
            keyword: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CanonicalFilter {
    /// Rows skipped before the current page. Never exceeds `i64::MAX`, the
    /// largest OFFSET the database accepts.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(MAX_OFFSET)
    }

    /// Replace the date bounds with a preset period ending `today`.
    pub fn with_time_range(mut self, range: TimeRange, today: NaiveDate) -> Self {
        let (from, to) = range.bounds(today);
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Serialize back to strings. `normalize(&f.to_raw()) == f`.
    pub fn to_raw(&self) -> RawFilter {
        RawFilter {
            store_id: self.store_id.map(|id| id.get().to_string()),
            category_id: self.category_id.map(|id| id.get().to_string()),
            start_date: self.date_from.map(|d| d.format(DATE_FORMAT).to_string()),
            end_date: self.date_to.map(|d| d.format(DATE_FORMAT).to_string()),
            min_amount: self.min_amount.map(|v| v.to_string()),
            max_amount: self.max_amount.map(|v| v.to_string()),
            amount_mode: Some(self.amount_mode.as_str().to_string()),
            keyword: self.keyword.as_ref().map(|k| k.text.clone()),
            page: Some(self.page.to_string()),
            page_size: Some(self.page_size.to_string()),
        }
    }
}

/// Build the canonical filter. Never fails.
pub fn normalize(raw: &RawFilter) -> CanonicalFilter {
    let amount_mode = AmountMode::parse(raw.amount_mode.as_deref());
    let filter = CanonicalFilter {
        store_id: parse_id(raw.store_id.as_deref()),
        category_id: parse_id(raw.category_id.as_deref()),
        date_from: raw.start_date.as_deref().and_then(parse_calendar_date),
        date_to: raw.end_date.as_deref().and_then(parse_calendar_date),
        min_amount: parse_amount(raw.min_amount.as_deref(), amount_mode),
        max_amount: parse_amount(raw.max_amount.as_deref(), amount_mode),
        amount_mode,
        keyword: raw.keyword.as_deref().and_then(Keyword::parse),
        page: parse_positive(raw.page.as_deref()).unwrap_or(1),
        page_size: parse_positive(raw.page_size.as_deref())
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE),
    };
    tracing::debug!(?raw, ?filter, "normalized ledger filter");
    filter
}

fn parse_id(raw: Option<&str>) -> Option<PositiveId> {
    let raw = raw?.trim();
    if ID_SENTINELS.contains(&raw) {
        return None;
    }
    // Some clients send ids as floats ("3.0").
    let value = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })?;
    PositiveId::new(value)
}

fn parse_amount(raw: Option<&str>, mode: AmountMode) -> Option<f64> {
    let value = raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    match mode {
        AmountMode::Absolute if value < 0.0 => None,
        _ => Some(value),
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

/// Reporting period presets, each ending today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Day,
    /// Monday to today.
    Week,
    #[default]
    Month,
    Year,
}

impl TimeRange {
    /// Unknown names fall back to [`TimeRange::Month`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "year" => Self::Year,
            _ => Self::Month,
        }
    }

    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Self::Day => Some(today),
            Self::Week => today.checked_sub_days(chrono::Days::new(u64::from(
                today.weekday().num_days_from_monday(),
            ))),
            Self::Month => today.with_day(1),
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        };
        (start.unwrap_or(today), today)
    }
}
