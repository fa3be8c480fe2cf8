use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, NewStore, ResultEngine, Scope, Store, default_settings, store_permissions,
    stores, util::now_timestamp,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Create a store. Admin only.
    pub async fn create_store(&self, admin_id: i64, cmd: NewStore) -> ResultEngine<i64> {
        let name = normalize_required_name(&cmd.name, "store")?;

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let duplicate = stores::Entity::find()
                .filter(stores::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let now = now_timestamp();
            let model = stores::ActiveModel {
                name: ActiveValue::Set(name),
                address: ActiveValue::Set(normalize_optional_text(cmd.address.as_deref())),
                phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
                create_time: ActiveValue::Set(now.clone()),
                update_time: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(store_id = model.id, admin_id, "store created");
            Ok(model.id)
        })
    }

    /// Stores visible to `user_id`, by id.
    pub async fn list_stores(&self, user_id: i64) -> ResultEngine<Vec<Store>> {
        with_tx!(self, |db_tx| {
            let query = stores::Entity::find().order_by_asc(stores::Column::Id);
            let query = match self.resolve_scope(&db_tx, user_id).await? {
                Scope::Unrestricted => query,
                Scope::RestrictedTo(ids) if ids.is_empty() => return Ok(Vec::new()),
                Scope::RestrictedTo(ids) => query.filter(stores::Column::Id.is_in(ids)),
            };
            let models = query.all(&db_tx).await?;
            Ok(models.into_iter().map(Store::from).collect())
        })
    }

    /// Delete a store. Admin only.
    ///
    /// Grants on the store are removed and default settings that point at it
    /// move to the lowest remaining store, or to none. Ledger entries are
    /// kept. All of it happens in one transaction.
    pub async fn delete_store(&self, admin_id: i64, store_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            stores::Entity::find_by_id(store_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("store not exists".to_string()))?;

            let revoked = store_permissions::Entity::delete_many()
                .filter(store_permissions::Column::StoreId.eq(store_id))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let replacement = stores::Entity::find()
                .filter(stores::Column::Id.ne(store_id))
                .order_by_asc(stores::Column::Id)
                .one(&db_tx)
                .await?
                .map(|store| store.id);
            let affected = default_settings::Entity::find()
                .filter(default_settings::Column::StoreId.eq(store_id))
                .all(&db_tx)
                .await?;
            let repointed = affected.len();
            let now = now_timestamp();
            for settings in affected {
                let mut active: default_settings::ActiveModel = settings.into();
                active.store_id = ActiveValue::Set(replacement);
                active.update_time = ActiveValue::Set(now.clone());
                active.update(&db_tx).await?;
            }

            stores::Entity::delete_by_id(store_id).exec(&db_tx).await?;

            tracing::info!(
                store_id,
                admin_id,
                revoked,
                repointed,
                ?replacement,
                "store deleted"
            );
            Ok(())
        })
    }
}
