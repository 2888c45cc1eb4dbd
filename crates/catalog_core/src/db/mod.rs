//! SQLite storage engine: connection ownership, schema bootstrap and
//! transaction lifecycle.
//!
//! # Responsibility
//! - Open file or in-memory SQLite databases and verify they are reachable.
//! - Create the catalog tables when they are absent.
//! - Hand out transaction handles and route statements either through the
//!   ambient connection or a caller-supplied transaction.
//!
//! # Invariants
//! - Core code never touches catalog tables before `ensure_schema` succeeds.
//! - Read misses are `Ok(None)`; only mutations report `StoreError::NotFound`.
//! - The engine never retries a failed statement.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod schema;
mod store;

pub use store::{ExecScope, Store, StoreOptions, StoreTransaction, DEFAULT_BUSY_TIMEOUT};

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity table targeted by a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Product,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage engine error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Backing file unreachable or schema bootstrap failed.
    Connection(rusqlite::Error),
    /// `BEGIN`/`COMMIT`/`ROLLBACK` failed at the backend.
    Transaction(rusqlite::Error),
    /// Transaction handle misuse: foreign handle or no active transaction.
    InvalidTransaction(&'static str),
    /// Statement execution failed.
    Execution(rusqlite::Error),
    /// Update/delete matched zero rows.
    NotFound { entity: EntityKind, id: i64 },
    /// Closing the connection failed.
    Close(rusqlite::Error),
}

impl StoreError {
    /// Returns whether this error means "target row does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "database connection failed: {err}"),
            Self::Transaction(err) => write!(f, "transaction failed: {err}"),
            Self::InvalidTransaction(reason) => write!(f, "invalid transaction: {reason}"),
            Self::Execution(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Close(err) => write!(f, "failed to close database: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err)
            | Self::Transaction(err)
            | Self::Execution(err)
            | Self::Close(err) => Some(err),
            Self::InvalidTransaction(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Execution(value)
    }
}
