use std::collections::BTreeSet;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Role, Scope, default_settings, store_permissions, users,
    util::now_timestamp,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Register a user and return its id.
    ///
    /// Not gated on a caller: the first admin has to come from somewhere.
    /// Front ends must restrict who reaches this.
    pub async fn create_user(
        &self,
        username: &str,
        nickname: Option<&str>,
        role: Role,
    ) -> ResultEngine<i64> {
        let username = normalize_required_name(username, "user")?;

        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(username));
            }

            let now = now_timestamp();
            let model = users::ActiveModel {
                username: ActiveValue::Set(username),
                nickname: ActiveValue::Set(normalize_optional_text(nickname)),
                role: ActiveValue::Set(role.code()),
                create_time: ActiveValue::Set(now.clone()),
                update_time: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(user_id = model.id, ?role, "user created");
            Ok(model.id)
        })
    }

    /// Let a staff user see `store_id`. Admin only. Granting twice is a no-op.
    pub async fn grant_store_permission(
        &self,
        admin_id: i64,
        user_id: i64,
        store_id: i64,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            self.require_user_exists(&db_tx, user_id).await?;
            self.require_store_in_scope(&db_tx, &Scope::Unrestricted, store_id)
                .await?;

            let existing = store_permissions::Entity::find()
                .filter(store_permissions::Column::UserId.eq(user_id))
                .filter(store_permissions::Column::StoreId.eq(store_id))
                .one(&db_tx)
                .await?;
            if existing.is_none() {
                store_permissions::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    store_id: ActiveValue::Set(store_id),
                    create_time: ActiveValue::Set(now_timestamp()),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
                tracing::info!(user_id, store_id, admin_id, "store access granted");
            }
            Ok(())
        })
    }

    /// Withdraw access to `store_id`. Admin only.
    pub async fn revoke_store_permission(
        &self,
        admin_id: i64,
        user_id: i64,
        store_id: i64,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let result = store_permissions::Entity::delete_many()
                .filter(store_permissions::Column::UserId.eq(user_id))
                .filter(store_permissions::Column::StoreId.eq(store_id))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    "store permission not exists".to_string(),
                ));
            }
            tracing::info!(user_id, store_id, admin_id, "store access revoked");
            Ok(())
        })
    }

    /// Replace the whole set of stores `user_id` may see. Admin only.
    ///
    /// Every store must exist; duplicates are ignored. An empty list leaves
    /// the user with no stores.
    pub async fn set_user_stores(
        &self,
        admin_id: i64,
        user_id: i64,
        store_ids: &[i64],
    ) -> ResultEngine<()> {
        let wanted: BTreeSet<i64> = store_ids.iter().copied().collect();

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            self.require_user_exists(&db_tx, user_id).await?;
            for store_id in &wanted {
                self.require_store_in_scope(&db_tx, &Scope::Unrestricted, *store_id)
                    .await?;
            }

            let removed = store_permissions::Entity::delete_many()
                .filter(store_permissions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let now = now_timestamp();
            for store_id in &wanted {
                store_permissions::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    store_id: ActiveValue::Set(*store_id),
                    create_time: ActiveValue::Set(now.clone()),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
            }

            tracing::info!(
                user_id,
                admin_id,
                removed,
                granted = wanted.len(),
                "store access replaced"
            );
            Ok(())
        })
    }

    /// Delete a user together with their grants and default settings.
    /// Admin only, and an admin cannot delete themselves. Ledger entries and
    /// usage records they wrote are kept.
    pub async fn delete_user(&self, admin_id: i64, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            if admin_id == user_id {
                return Err(EngineError::Forbidden(
                    "an admin cannot delete themselves".to_string(),
                ));
            }
            self.require_user_exists(&db_tx, user_id).await?;

            let revoked = store_permissions::Entity::delete_many()
                .filter(store_permissions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            default_settings::Entity::delete_by_id(user_id)
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;

            tracing::info!(user_id, admin_id, revoked, "user deleted");
            Ok(())
        })
    }
}
