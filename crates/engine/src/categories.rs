//! Categories ("account types").
//!
//! The `is_expense` flag is authoritative. The numeric `kind` code is kept
//! for older readers and must agree with the flag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Display name used for entries whose category no longer exists.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn code(self) -> i32 {
        match self {
            Self::Income => 1,
            Self::Expense => 2,
        }
    }

    pub fn from_flag(is_expense: bool) -> Self {
        if is_expense {
            Self::Expense
        } else {
            Self::Income
        }
    }

    pub fn is_expense(self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl TryFrom<i32> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Income),
            2 => Ok(Self::Expense),
            other => Err(EngineError::InvalidCategory(format!(
                "unknown category kind code: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub is_expense: bool,
    pub kind: i32,
    pub sort_order: i32,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub sort_order: i32,
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = CategoryKind::from_flag(model.is_expense);
        let coded = CategoryKind::try_from(model.kind)?;
        if coded != kind {
            return Err(EngineError::InvalidCategory(format!(
                "category {} flag and kind code disagree",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            name: model.name,
            kind,
            sort_order: model.sort_order,
        })
    }
}

/// Input for a new category.
#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub is_expense: bool,
    /// Numeric kind sent by older clients; checked against `is_expense`.
    pub kind_code: Option<i32>,
    pub sort_order: i32,
}

pub(crate) fn validate_kind(is_expense: bool, code: Option<i32>) -> ResultEngine<CategoryKind> {
    let kind = CategoryKind::from_flag(is_expense);
    if let Some(code) = code
        && CategoryKind::try_from(code)? != kind
    {
        return Err(EngineError::InvalidCategory(
            "kind code contradicts the expense flag".to_string(),
        ));
    }
    Ok(kind)
}
