use sea_orm::{ActiveValue, ConnectionTrait, FromQueryResult, TransactionTrait, prelude::*};

use crate::{
    AccountPage, AccountRow, EngineError, NewAccount, ResultEngine, accounts, categories,
    filter::{CanonicalFilter, RawFilter, normalize},
    query::{self, QueryIntent},
    util::{TIMESTAMP_FORMAT, display_timestamp, now_timestamp, parse_transaction_time},
};

use super::{Engine, normalize_optional_text, with_tx};

const LIST_SELECT: &str = "SELECT a.id, a.store_id, s.name AS store_name, \
     a.user_id, u.username AS username, a.type_id, t.name AS type_name, \
     a.amount, a.remark, a.transaction_time, a.create_time, a.update_time";

/// Stored form of a requested transaction time. Missing or unreadable input
/// falls back to the current time.
fn resolve_transaction_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now_timestamp();
    };
    match parse_transaction_time(raw) {
        Some(parsed) => parsed.format(TIMESTAMP_FORMAT).to_string(),
        None => {
            tracing::warn!(raw, "unreadable transaction time, using now");
            now_timestamp()
        }
    }
}

impl Engine {
    /// One page of entries visible to `user_id`, newest first.
    pub async fn list_accounts(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
    ) -> ResultEngine<AccountPage> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;

            let stmt = query::build(filter, &scope, QueryIntent::List).render(
                db_tx.get_database_backend(),
                LIST_SELECT,
                "",
            );
            let rows = AccountRow::find_by_statement(stmt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|mut row| {
                    row.transaction_time = display_timestamp(row.transaction_time);
                    row.create_time = display_timestamp(row.create_time);
                    row.update_time = display_timestamp(row.update_time);
                    row
                })
                .collect();

            Ok(AccountPage {
                rows,
                page: filter.page,
                page_size: filter.page_size,
            })
        })
    }

    /// [`Engine::list_accounts`] over unvalidated request input.
    pub async fn list_accounts_raw(
        &self,
        user_id: i64,
        raw: &RawFilter,
    ) -> ResultEngine<AccountPage> {
        self.list_accounts(user_id, &normalize(raw)).await
    }

    /// Number of entries matching `filter`, ignoring paging.
    pub async fn count_accounts(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;

            self.count_in(&db_tx, &scope, filter).await
        })
    }

    /// Record a ledger entry. Returns the new entry id.
    ///
    /// The sign of `amount` decides income or expense. The store must be in
    /// the caller's scope and the category must exist.
    pub async fn create_account(&self, cmd: NewAccount) -> ResultEngine<i64> {
        if !cmd.amount.is_finite() {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        }
        if cmd.amount == 0.0 {
            return Err(EngineError::InvalidAmount(
                "amount must not be zero".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, cmd.user_id).await?;
            self.require_store_in_scope(&db_tx, &scope, cmd.store_id)
                .await?;
            categories::Entity::find_by_id(cmd.category_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            let now = now_timestamp();
            let model = accounts::ActiveModel {
                store_id: ActiveValue::Set(cmd.store_id),
                user_id: ActiveValue::Set(cmd.user_id),
                type_id: ActiveValue::Set(cmd.category_id),
                amount: ActiveValue::Set(cmd.amount),
                remark: ActiveValue::Set(normalize_optional_text(cmd.remark.as_deref())),
                transaction_time: ActiveValue::Set(resolve_transaction_time(
                    cmd.transaction_time.as_deref(),
                )),
                create_time: ActiveValue::Set(now.clone()),
                update_time: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                account_id = model.id,
                store_id = cmd.store_id,
                user_id = cmd.user_id,
                "ledger entry recorded"
            );
            Ok(model.id)
        })
    }

    /// Delete one entry. The entry's store must be in the caller's scope.
    pub async fn delete_account(&self, user_id: i64, account_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            let entry = accounts::Entity::find_by_id(account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            if !scope.permits(entry.store_id) {
                return Err(EngineError::Forbidden(format!(
                    "store {} is outside the caller's scope",
                    entry.store_id
                )));
            }

            let result = accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("account not exists".to_string()));
            }

            tracing::info!(account_id, user_id, "ledger entry deleted");
            Ok(())
        })
    }
}
