use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, NewUsage, ResultEngine, usage_records,
    util::{DATE_FORMAT, now_timestamp, parse_calendar_date, today},
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Append a usage record. Returns its id.
    ///
    /// The insert runs outside any transaction and is retried on lock
    /// contention according to the engine's [`RetryPolicy`](crate::RetryPolicy).
    pub async fn record_usage(&self, cmd: NewUsage) -> ResultEngine<i64> {
        let item = normalize_required_name(&cmd.item, "item")?;
        if !cmd.quantity.is_finite() || cmd.quantity <= 0.0 {
            return Err(EngineError::InvalidAmount(
                "quantity must be a positive number".to_string(),
            ));
        }
        let usage_date = cmd
            .usage_date
            .as_deref()
            .and_then(parse_calendar_date)
            .unwrap_or_else(today)
            .format(DATE_FORMAT)
            .to_string();

        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, cmd.user_id).await?;
            self.require_store_in_scope(&db_tx, &scope, cmd.store_id)
                .await
                .map(|_| ())
        })?;

        let record = usage_records::ActiveModel {
            store_id: ActiveValue::Set(cmd.store_id),
            user_id: ActiveValue::Set(cmd.user_id),
            item: ActiveValue::Set(item),
            quantity: ActiveValue::Set(cmd.quantity),
            usage_date: ActiveValue::Set(usage_date),
            created_at: ActiveValue::Set(now_timestamp()),
            ..Default::default()
        };
        let model = self
            .retry
            .execute("usage_records", || record.clone().insert(&self.database))
            .await?;

        tracing::info!(
            usage_id = model.id,
            store_id = cmd.store_id,
            user_id = cmd.user_id,
            "usage recorded"
        );
        Ok(model.id)
    }
}
