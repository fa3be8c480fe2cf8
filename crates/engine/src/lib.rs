//! Permission-scoped query, aggregation and write engine for a multi-store
//! ledger.
//!
//! Every read goes through the same pipeline: the caller's [`Scope`] is
//! resolved, untrusted request input is normalized into a
//! [`CanonicalFilter`], and [`query::build`] turns both into a parameterized
//! statement. Listing, counting and every aggregate share that pipeline, so
//! they always agree on which entries match.

pub use accounts::{AccountPage, AccountRow, NewAccount};
pub use categories::{Category, CategoryKind, NewCategory, UNCATEGORIZED_NAME};
pub use default_settings::DefaultSettings;
pub use error::EngineError;
pub use filter::{
    AmountMode, CanonicalFilter, DEFAULT_PAGE_SIZE, Keyword, MAX_PAGE_SIZE, PositiveId, RawFilter,
    TimeRange, normalize,
};
pub use ops::{Engine, EngineBuilder};
pub use query::{BuiltQuery, Clause, QueryIntent};
pub use retry::{RetryPolicy, is_contention};
pub use scope::Scope;
pub use stats::{
    CategoryAmount, CategoryComparison, Direction, Report, Totals, TrendGrain, TrendPoint,
};
pub use stores::{NewStore, Store};
pub use usage_records::NewUsage;
pub use users::Role;

mod accounts;
mod categories;
mod default_settings;
mod error;
pub mod filter;
mod ops;
pub mod query;
mod retry;
mod scope;
mod stats;
mod store_permissions;
mod stores;
mod usage_records;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
