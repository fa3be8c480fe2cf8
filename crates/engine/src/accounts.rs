//! Ledger entries ("accounts").
//!
//! The sign of `amount` is the only income/expense discriminator: positive
//! amounts are income, negative amounts are expenses. Store and category
//! references are soft, so an entry outlives the store or category it points
//! at.

use sea_orm::{FromQueryResult, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    pub user_id: i64,
    pub type_id: i64,
    pub amount: f64,
    pub remark: Option<String>,
    pub transaction_time: String,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A listed ledger entry with the display names of what it references.
///
/// Names are `None` when the referenced store, category or user no longer
/// exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct AccountRow {
    pub id: i64,
    pub store_id: i64,
    pub store_name: Option<String>,
    pub user_id: i64,
    pub username: Option<String>,
    pub type_id: i64,
    pub type_name: Option<String>,
    pub amount: f64,
    pub remark: Option<String>,
    pub transaction_time: String,
    pub create_time: String,
    pub update_time: String,
}

/// One page of listed entries.
///
/// `page_size` is the size actually applied, which may differ from the one
/// requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountPage {
    pub rows: Vec<AccountRow>,
    pub page: u64,
    pub page_size: u64,
}

/// Input for a new ledger entry.
#[derive(Clone, Debug, Default)]
pub struct NewAccount {
    pub store_id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub remark: Option<String>,
    /// Business date of the entry; `None` or an unreadable value means now.
    pub transaction_time: Option<String>,
}
