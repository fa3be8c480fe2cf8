use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    CategoryKind, DefaultSettings, EngineError, ResultEngine, categories, default_settings,
    util::now_timestamp,
};

use super::{Engine, with_tx};

impl Engine {
    /// Remember the store `user_id` enters records for. The store must be in
    /// the user's own scope. Remembered categories are left alone.
    pub async fn set_default_store(&self, user_id: i64, store_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            self.require_store_in_scope(&db_tx, &scope, store_id)
                .await?;

            let current = default_settings::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .map(DefaultSettings::from)
                .unwrap_or_default();
            let settings = DefaultSettings {
                store_id: Some(store_id),
                ..current
            };
            self.upsert_default_settings(&db_tx, user_id, settings)
                .await?;
            tracing::debug!(user_id, store_id, "default store set");
            Ok(())
        })
    }

    /// The remembered store, if any.
    pub async fn default_store(&self, user_id: i64) -> ResultEngine<Option<i64>> {
        Ok(self
            .default_settings(user_id)
            .await?
            .and_then(|settings| settings.store_id))
    }

    /// Replace every default of `user_id` at once.
    ///
    /// A store must be in the user's scope; each category must exist and sit
    /// on the matching side of the ledger.
    pub async fn save_default_settings(
        &self,
        user_id: i64,
        settings: DefaultSettings,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            if let Some(store_id) = settings.store_id {
                self.require_store_in_scope(&db_tx, &scope, store_id)
                    .await?;
            }
            if let Some(id) = settings.income_category_id {
                require_category_kind(&db_tx, id, CategoryKind::Income).await?;
            }
            if let Some(id) = settings.expense_category_id {
                require_category_kind(&db_tx, id, CategoryKind::Expense).await?;
            }

            self.upsert_default_settings(&db_tx, user_id, settings)
                .await?;
            tracing::debug!(user_id, ?settings, "default settings saved");
            Ok(())
        })
    }

    /// Saved defaults, or `None` when the user never saved any.
    pub async fn default_settings(&self, user_id: i64) -> ResultEngine<Option<DefaultSettings>> {
        with_tx!(self, |db_tx| {
            self.user_role(&db_tx, user_id).await?;
            Ok(default_settings::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .map(DefaultSettings::from))
        })
    }

    async fn upsert_default_settings(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
        settings: DefaultSettings,
    ) -> ResultEngine<()> {
        let active = default_settings::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            store_id: ActiveValue::Set(settings.store_id),
            income_type_id: ActiveValue::Set(settings.income_category_id),
            expense_type_id: ActiveValue::Set(settings.expense_category_id),
            update_time: ActiveValue::Set(now_timestamp()),
        };
        let exists = default_settings::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .is_some();
        if exists {
            active.update(db).await?;
        } else {
            active.insert(db).await?;
        }
        Ok(())
    }
}

async fn require_category_kind(
    db: &DatabaseTransaction,
    category_id: i64,
    expected: CategoryKind,
) -> ResultEngine<()> {
    let category = categories::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
    if CategoryKind::from_flag(category.is_expense) != expected {
        return Err(EngineError::InvalidCategory(format!(
            "category {category_id} is not an {} category",
            match expected {
                CategoryKind::Income => "income",
                CategoryKind::Expense => "expense",
            }
        )));
    }
    Ok(())
}
