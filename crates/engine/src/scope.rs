//! Row visibility of a caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, filter::PositiveId};

/// Which stores a caller may see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Admins see every store.
    Unrestricted,
    /// Staff see only the listed stores. An empty set sees nothing.
    RestrictedTo(BTreeSet<i64>),
}

impl Scope {
    pub fn permits(&self, store_id: i64) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::RestrictedTo(stores) => stores.contains(&store_id),
        }
    }

    /// Reject an explicitly requested store the caller cannot see.
    pub fn authorize_store(&self, requested: Option<PositiveId>) -> ResultEngine<()> {
        match requested {
            Some(store) if !self.permits(store.get()) => Err(EngineError::Forbidden(format!(
                "store {} is outside the caller's scope",
                store.get()
            ))),
            _ => Ok(()),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }
}
