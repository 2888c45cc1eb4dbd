//! Core storage and use-case logic for the catalog service.
//! This crate owns the transactional CRUD contract for categories and
//! products; outer layers only translate requests into service calls.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{
    EntityKind, ExecScope, Store, StoreError, StoreOptions, StoreResult, StoreTransaction,
};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::category::{Category, CategoryId};
pub use model::product::{Product, ProductId};
pub use model::ValidationError;
pub use repo::category_repo::CategoryRepository;
pub use repo::product_repo::{ProductFilter, ProductRepository};
pub use service::category_service::CategoryService;
pub use service::in_transaction;
pub use service::product_service::ProductService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
