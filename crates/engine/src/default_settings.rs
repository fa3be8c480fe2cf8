//! Per-user defaults used when entering new records.
//!
//! Category columns carry no foreign key, like the ledger itself; deleting a
//! category clears them instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_default_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub store_id: Option<i64>,
    pub income_type_id: Option<i64>,
    pub expense_type_id: Option<i64>,
    pub update_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// What a user's entry form starts out with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSettings {
    pub store_id: Option<i64>,
    pub income_category_id: Option<i64>,
    pub expense_category_id: Option<i64>,
}

impl From<Model> for DefaultSettings {
    fn from(model: Model) -> Self {
        Self {
            store_id: model.store_id,
            income_category_id: model.income_type_id,
            expense_category_id: model.expense_type_id,
        }
    }
}
