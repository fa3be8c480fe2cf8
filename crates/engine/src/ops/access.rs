use std::collections::BTreeSet;

use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Role, Scope, store_permissions, stores, users};

use super::{Engine, with_tx};

impl Engine {
    /// Resolve which stores `user_id` may see.
    ///
    /// Admins get [`Scope::Unrestricted`]; staff get the stores granted to
    /// them, possibly none. An unknown user is [`EngineError::Unauthorized`].
    pub async fn scope_for(&self, user_id: i64) -> ResultEngine<Scope> {
        with_tx!(self, |db_tx| { self.resolve_scope(&db_tx, user_id).await })
    }

    pub(super) async fn user_role(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<Role> {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Unauthorized(format!("unknown user {user_id}")))?;
        Role::try_from(user.role)
    }

    pub(super) async fn resolve_scope(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<Scope> {
        if self.user_role(db, user_id).await? == Role::Admin {
            return Ok(Scope::Unrestricted);
        }
        let stores = self.permitted_store_ids(db, user_id).await?;
        tracing::debug!(user_id, stores = stores.len(), "resolved restricted scope");
        Ok(Scope::RestrictedTo(stores))
    }

    pub(super) async fn permitted_store_ids(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<BTreeSet<i64>> {
        let ids: Vec<i64> = store_permissions::Entity::find()
            .select_only()
            .column(store_permissions::Column::StoreId)
            .filter(store_permissions::Column::UserId.eq(user_id))
            .into_tuple()
            .all(db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<()> {
        match self.user_role(db, user_id).await? {
            Role::Admin => Ok(()),
            Role::Staff => Err(EngineError::Forbidden(format!(
                "user {user_id} is not an admin"
            ))),
        }
    }

    /// The store must exist and be visible in `scope`.
    pub(super) async fn require_store_in_scope(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        store_id: i64,
    ) -> ResultEngine<stores::Model> {
        let store = stores::Entity::find_by_id(store_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("store not exists".to_string()))?;
        if !scope.permits(store_id) {
            return Err(EngineError::Forbidden(format!(
                "store {store_id} is outside the caller's scope"
            )));
        }
        Ok(store)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
