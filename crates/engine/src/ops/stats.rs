use sea_orm::{ConnectionTrait, DatabaseTransaction, FromQueryResult, TransactionTrait};

use crate::{
    CategoryAmount, CategoryComparison, Direction, Report, ResultEngine, Scope, Totals,
    TrendGrain, TrendPoint,
    categories::UNCATEGORIZED_NAME,
    filter::CanonicalFilter,
    query::{self, QueryIntent},
};

use super::{Engine, with_tx};

const SUMS: &str = "TOTAL(CASE WHEN a.amount > 0 THEN a.amount ELSE 0 END) AS income, \
     TOTAL(CASE WHEN a.amount < 0 THEN -a.amount ELSE 0 END) AS expense, \
     TOTAL(a.amount) AS net";

#[derive(FromQueryResult)]
struct CountRow {
    total: i64,
}

fn category_columns() -> String {
    format!("t.id AS category_id, COALESCE(t.name, '{UNCATEGORIZED_NAME}') AS category_name")
}

impl Engine {
    async fn totals_in(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        filter: &CanonicalFilter,
    ) -> ResultEngine<Totals> {
        let stmt = query::build(filter, scope, QueryIntent::Aggregate).render(
            db.get_database_backend(),
            &format!("SELECT {SUMS}"),
            "",
        );
        Ok(Totals::find_by_statement(stmt)
            .one(db)
            .await?
            .unwrap_or_default())
    }

    pub(super) async fn count_in(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        filter: &CanonicalFilter,
    ) -> ResultEngine<u64> {
        let stmt = query::build(filter, scope, QueryIntent::Aggregate).render(
            db.get_database_backend(),
            "SELECT COUNT(*) AS total",
            "",
        );
        let total = CountRow::find_by_statement(stmt)
            .one(db)
            .await?
            .map_or(0, |row| row.total);
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn trend_in(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        filter: &CanonicalFilter,
        grain: TrendGrain,
    ) -> ResultEngine<Vec<TrendPoint>> {
        let select = format!(
            "SELECT SUBSTR(a.transaction_time, 1, {}) AS bucket, {SUMS}",
            grain.prefix_len()
        );
        let stmt = query::build(filter, scope, QueryIntent::Aggregate).render(
            db.get_database_backend(),
            &select,
            "GROUP BY bucket ORDER BY bucket ASC",
        );
        Ok(TrendPoint::find_by_statement(stmt).all(db).await?)
    }

    async fn breakdown_in(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        filter: &CanonicalFilter,
        direction: Direction,
    ) -> ResultEngine<Vec<CategoryAmount>> {
        let select = format!(
            "SELECT {}, TOTAL(ABS(a.amount)) AS amount, COUNT(*) AS entries",
            category_columns()
        );
        let stmt = query::build(filter, scope, QueryIntent::Aggregate)
            .and_fixed(direction.sign_condition())
            .render(
                db.get_database_backend(),
                &select,
                "GROUP BY t.id ORDER BY 3 DESC, 2 ASC",
            );
        Ok(CategoryAmount::find_by_statement(stmt).all(db).await?)
    }

    async fn comparison_in(
        &self,
        db: &DatabaseTransaction,
        scope: &Scope,
        filter: &CanonicalFilter,
    ) -> ResultEngine<Vec<CategoryComparison>> {
        let select = format!("SELECT {}, {SUMS}", category_columns());
        let stmt = query::build(filter, scope, QueryIntent::Aggregate).render(
            db.get_database_backend(),
            &select,
            "GROUP BY t.id ORDER BY 2 ASC, 1 ASC",
        );
        Ok(CategoryComparison::find_by_statement(stmt).all(db).await?)
    }

    /// Income, expense and net over every entry matching `filter`.
    pub async fn totals(&self, user_id: i64, filter: &CanonicalFilter) -> ResultEngine<Totals> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;
            self.totals_in(&db_tx, &scope, filter).await
        })
    }

    /// Totals per day, month or year, oldest bucket first. Empty buckets are
    /// omitted.
    pub async fn trend(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
        grain: TrendGrain,
    ) -> ResultEngine<Vec<TrendPoint>> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;
            self.trend_in(&db_tx, &scope, filter, grain).await
        })
    }

    /// Per-category magnitudes for one side of the ledger, largest first.
    pub async fn category_breakdown(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
        direction: Direction,
    ) -> ResultEngine<Vec<CategoryAmount>> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;
            self.breakdown_in(&db_tx, &scope, filter, direction).await
        })
    }

    /// Income and expense of every category that has matching entries,
    /// ordered by category name.
    pub async fn category_comparison(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
    ) -> ResultEngine<Vec<CategoryComparison>> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;

            self.comparison_in(&db_tx, &scope, filter).await
        })
    }

    /// Every aggregate for `filter`, read from one snapshot.
    pub async fn report(
        &self,
        user_id: i64,
        filter: &CanonicalFilter,
        grain: TrendGrain,
    ) -> ResultEngine<Report> {
        with_tx!(self, |db_tx| {
            let scope = self.resolve_scope(&db_tx, user_id).await?;
            scope.authorize_store(filter.store_id)?;

            Ok(Report {
                totals: self.totals_in(&db_tx, &scope, filter).await?,
                entries: self.count_in(&db_tx, &scope, filter).await?,
                trend: self.trend_in(&db_tx, &scope, filter, grain).await?,
                comparison: self.comparison_in(&db_tx, &scope, filter).await?,
                income_categories: self
                    .breakdown_in(&db_tx, &scope, filter, Direction::Income)
                    .await?,
                expense_categories: self
                    .breakdown_in(&db_tx, &scope, filter, Direction::Expense)
                    .await?,
            })
        })
    }
}
