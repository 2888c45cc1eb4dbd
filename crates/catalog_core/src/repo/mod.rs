//! Row-level CRUD primitives over the catalog tables.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every operation takes an explicit `ExecScope`; none opens its own
//!   transaction.
//! - `get_*` returns `Ok(None)` on a miss; `update_*`/`delete_*` return
//!   `StoreError::NotFound` when zero rows changed.
//! - Caller-supplied ids are ignored on create.

pub mod category_repo;
pub mod product_repo;
