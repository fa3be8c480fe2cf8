//! Builds parameterized ledger queries.
//!
//! A query is an ordered list of [`Clause`]s, each a SQL template with its own
//! bound values. The clauses are joined into SQL text only in
//! [`BuiltQuery::render`]. User input always travels as a bound value; the one
//! exception is [`inline_id_eq`], which writes a [`PositiveId`] as an integer
//! literal.

use sea_orm::{DbBackend, Statement, Value};

use crate::{
    Scope,
    filter::{AmountMode, CanonicalFilter, Keyword, PositiveId},
};

/// Ledger table with the joins every ledger query shares. Joins are left
/// joins so entries whose store, category or user was deleted still match.
pub(crate) const ACCOUNTS_FROM: &str = "FROM accounts a \
     LEFT JOIN stores s ON a.store_id = s.id \
     LEFT JOIN account_types t ON a.type_id = t.id \
     LEFT JOIN users u ON a.user_id = u.id";

const LIST_ORDER: &str = "ORDER BY a.transaction_time DESC, a.id DESC";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryIntent {
    /// Ordered newest first, one page at a time.
    List,
    /// No ordering or paging; callers add their own grouping.
    Aggregate,
}

/// One `WHERE` condition and the values bound to its placeholders.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    template: String,
    params: Vec<Value>,
}

impl Clause {
    fn bound(template: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            template: template.into(),
            params,
        }
    }

    fn fixed(template: &'static str) -> Self {
        Self::bound(template, Vec::new())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Writes `column = <id>` with the id as an integer literal.
///
/// SQLite compares an integer column against a bound text value as text, and
/// some drivers bind ids that way; a literal avoids the mismatch. Only a
/// [`PositiveId`] is accepted and the column must be a compile-time string.
fn inline_id_eq(column: &'static str, id: PositiveId) -> Clause {
    Clause::bound(format!("{column} = {}", id.get()), Vec::new())
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuiltQuery {
    clauses: Vec<Clause>,
    intent: QueryIntent,
    limit: u64,
    offset: u64,
}

/// Compose the conditions for `filter` as seen by a caller with `scope`.
pub fn build(filter: &CanonicalFilter, scope: &Scope, intent: QueryIntent) -> BuiltQuery {
    let mut clauses = Vec::new();

    if let Scope::RestrictedTo(stores) = scope {
        if stores.is_empty() {
            clauses.push(Clause::fixed("1 = 0"));
        } else {
            let placeholders = vec!["?"; stores.len()].join(", ");
            clauses.push(Clause::bound(
                format!("a.store_id IN ({placeholders})"),
                stores.iter().map(|id| Value::from(*id)).collect(),
            ));
        }
    }

    if let Some(store) = filter.store_id {
        clauses.push(inline_id_eq("a.store_id", store));
    }
    if let Some(category) = filter.category_id {
        clauses.push(inline_id_eq("a.type_id", category));
    }
    if let Some(from) = filter.date_from {
        clauses.push(Clause::bound(
            "a.transaction_time >= ?",
            vec![Value::from(format!("{} 00:00:00", from.format("%Y-%m-%d")))],
        ));
    }
    if let Some(to) = filter.date_to {
        clauses.push(Clause::bound(
            "a.transaction_time <= ?",
            vec![Value::from(format!("{} 23:59:59", to.format("%Y-%m-%d")))],
        ));
    }

    let amount = match filter.amount_mode {
        AmountMode::Absolute => "ABS(a.amount)",
        AmountMode::Signed => "a.amount",
    };
    if let Some(min) = filter.min_amount {
        clauses.push(Clause::bound(
            format!("{amount} >= ?"),
            vec![Value::from(min)],
        ));
    }
    if let Some(max) = filter.max_amount {
        clauses.push(Clause::bound(
            format!("{amount} <= ?"),
            vec![Value::from(max)],
        ));
    }

    if let Some(keyword) = &filter.keyword {
        clauses.push(keyword_clause(keyword));
    }

    BuiltQuery {
        clauses,
        intent,
        limit: filter.page_size,
        offset: filter.offset(),
    }
}

fn keyword_clause(keyword: &Keyword) -> Clause {
    let pattern = format!("%{}%", escape_like(keyword.text()));
    let mut parts = vec![
        "a.remark LIKE ? ESCAPE '\\'",
        "s.name LIKE ? ESCAPE '\\'",
        "t.name LIKE ? ESCAPE '\\'",
        "u.username LIKE ? ESCAPE '\\'",
    ];
    let mut params: Vec<Value> = (0..parts.len())
        .map(|_| Value::from(pattern.clone()))
        .collect();

    if let Some(number) = keyword.numeric() {
        parts.push("ABS(a.amount) = ?");
        params.push(Value::from(number.abs()));
        parts.push("CAST(a.amount AS TEXT) LIKE ? ESCAPE '\\'");
        params.push(Value::from(pattern));
    }

    Clause::bound(format!("({})", parts.join(" OR ")), params)
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl BuiltQuery {
    /// Add a fixed condition that carries no user input.
    pub(crate) fn and_fixed(mut self, template: &'static str) -> Self {
        self.clauses.push(Clause::fixed(template));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn intent(&self) -> QueryIntent {
        self.intent
    }

    /// ` WHERE c1 AND c2 ...`, or an empty string without conditions.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let joined = self
            .clauses
            .iter()
            .map(|c| c.template.as_str())
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {joined}")
    }

    pub fn values(&self) -> Vec<Value> {
        self.clauses
            .iter()
            .flat_map(|c| c.params.iter().cloned())
            .collect()
    }

    /// Join everything into a statement: `select`, the shared joins, the
    /// conditions, then `suffix` (grouping/ordering for aggregates). Listings
    /// also get the newest-first order and the page window.
    pub fn render(&self, backend: DbBackend, select: &str, suffix: &str) -> Statement {
        let mut sql = format!("{select} {ACCOUNTS_FROM}{}", self.where_sql());
        let mut values = self.values();

        if !suffix.is_empty() {
            sql.push(' ');
            sql.push_str(suffix);
        }
        if self.intent == QueryIntent::List {
            sql.push(' ');
            sql.push_str(LIST_ORDER);
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Value::from(i64::try_from(self.limit).unwrap_or(i64::MAX)));
            values.push(Value::from(i64::try_from(self.offset).unwrap_or(i64::MAX)));
        }

        tracing::debug!(%sql, params = values.len(), "rendered ledger query");
        Statement::from_sql_and_values(backend, sql, values)
    }
}
