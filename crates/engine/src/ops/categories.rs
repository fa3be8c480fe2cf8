use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Category, EngineError, NewCategory, ResultEngine, categories, categories::validate_kind,
    default_settings, util::now_timestamp,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Create a category. Admin only.
    ///
    /// Names are unique within one side of the ledger, so "Other" may exist
    /// once as income and once as expense.
    pub async fn create_category(&self, admin_id: i64, cmd: NewCategory) -> ResultEngine<i64> {
        let name = normalize_required_name(&cmd.name, "category")?;
        let kind = validate_kind(cmd.is_expense, cmd.kind_code)?;

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let duplicate = categories::Entity::find()
                .filter(categories::Column::Name.eq(name.clone()))
                .filter(categories::Column::IsExpense.eq(kind.is_expense()))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let now = now_timestamp();
            let model = categories::ActiveModel {
                name: ActiveValue::Set(name),
                is_expense: ActiveValue::Set(kind.is_expense()),
                kind: ActiveValue::Set(kind.code()),
                sort_order: ActiveValue::Set(cmd.sort_order),
                create_time: ActiveValue::Set(now.clone()),
                update_time: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(category_id = model.id, ?kind, "category created");
            Ok(model.id)
        })
    }

    /// Every category, by sort order then id. Any known user may read them.
    pub async fn list_categories(&self, user_id: i64) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.user_role(&db_tx, user_id).await?;
            let models = categories::Entity::find()
                .order_by_asc(categories::Column::SortOrder)
                .order_by_asc(categories::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Delete a category. Admin only. Entries that used it stay and are
    /// reported as uncategorized; default settings that named it are cleared.
    pub async fn delete_category(&self, admin_id: i64, category_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let result = categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("category not exists".to_string()));
            }

            let affected = default_settings::Entity::find()
                .filter(
                    Condition::any()
                        .add(default_settings::Column::IncomeTypeId.eq(category_id))
                        .add(default_settings::Column::ExpenseTypeId.eq(category_id)),
                )
                .all(&db_tx)
                .await?;
            let cleared = affected.len();
            let now = now_timestamp();
            for settings in affected {
                let income = settings.income_type_id.filter(|id| *id != category_id);
                let expense = settings.expense_type_id.filter(|id| *id != category_id);
                let mut active: default_settings::ActiveModel = settings.into();
                active.income_type_id = ActiveValue::Set(income);
                active.expense_type_id = ActiveValue::Set(expense);
                active.update_time = ActiveValue::Set(now.clone());
                active.update(&db_tx).await?;
            }

            tracing::info!(category_id, admin_id, cleared, "category deleted");
            Ok(())
        })
    }
}
