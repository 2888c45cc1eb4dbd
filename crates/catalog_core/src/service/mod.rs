//! Transaction-managed use-case services.
//!
//! # Responsibility
//! - Bind every mutation to exactly one storage transaction.
//! - Keep reads transaction-free.
//!
//! # Invariants
//! - A failed mutation is rolled back and its original error is returned
//!   unchanged, `NotFound` included.
//! - A failed commit replaces the mutation's success.
//! - Services hold no business rules; validation happens before they are
//!   called.

use crate::db::{ExecScope, Store, StoreResult};
use log::warn;

pub mod category_service;
pub mod product_service;

/// Runs `op` inside a fresh transaction on `store`.
///
/// Commits when `op` succeeds and rolls back when it fails. A rollback
/// failure is logged and does not mask the operation's error.
pub fn in_transaction<T>(
    store: &Store,
    op: impl FnOnce(ExecScope<'_>) -> StoreResult<T>,
) -> StoreResult<T> {
    let tx = store.begin()?;
    match op(ExecScope::Within(&tx)) {
        Ok(value) => {
            store.commit(tx)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback(tx) {
                warn!(
                    "event=tx_rollback module=service status=error error={} cause={}",
                    rollback_err, err
                );
            }
            Err(err)
        }
    }
}
