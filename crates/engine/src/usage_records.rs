//! Append-only usage log. Written by many clients at once, so inserts go
//! through [`RetryPolicy`](crate::RetryPolicy).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    pub user_id: i64,
    pub item: String,
    pub quantity: f64,
    pub usage_date: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, Default)]
pub struct NewUsage {
    pub store_id: i64,
    pub user_id: i64,
    pub item: String,
    pub quantity: f64,
    /// `YYYY-MM-DD`; `None` means today.
    pub usage_date: Option<String>,
}
