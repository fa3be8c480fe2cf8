//! Aggregated views of the ledger.
//!
//! Income is the sum of positive amounts and expense the sum of the
//! magnitudes of negative amounts, so `net == income - expense` always holds.

use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Bucket width of a trend series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendGrain {
    Day,
    #[default]
    Month,
    Year,
}

impl TrendGrain {
    /// Unknown input falls back to monthly buckets.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Self::Day,
            "year" | "yearly" => Self::Year,
            _ => Self::Month,
        }
    }

    /// Prefix length of a stored timestamp that identifies one bucket:
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
    pub(crate) fn prefix_len(self) -> u8 {
        match self {
            Self::Day => 10,
            Self::Month => 7,
            Self::Year => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` depending on the grain.
    pub bucket: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Which side of the ledger a breakdown covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    #[default]
    Expense,
}

impl Direction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" | "1" => Self::Income,
            _ => Self::Expense,
        }
    }

    pub(crate) fn sign_condition(self) -> &'static str {
        match self {
            Self::Income => "a.amount > 0",
            Self::Expense => "a.amount < 0",
        }
    }
}

/// Share of one category. `category_id` is `None` for entries whose
/// category was deleted; they are grouped under one uncategorized bucket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct CategoryAmount {
    pub category_id: Option<i64>,
    pub category_name: String,
    /// Always a magnitude.
    pub amount: f64,
    pub entries: i64,
}

/// Income and expense side by side for one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct CategoryComparison {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Everything a dashboard shows for one filter, computed in one transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub totals: Totals,
    pub entries: u64,
    pub trend: Vec<TrendPoint>,
    pub comparison: Vec<CategoryComparison>,
    pub income_categories: Vec<CategoryAmount>,
    pub expense_categories: Vec<CategoryAmount>,
}
