//! Product use-case service.
//!
//! # Invariants
//! - `list_by_category` is an exact match on the category id; it does not
//!   check that the category exists.

use crate::db::{ExecScope, Store, StoreResult};
use crate::model::category::CategoryId;
use crate::model::product::{Product, ProductId};
use crate::repo::product_repo::{ProductFilter, ProductRepository};
use crate::service::in_transaction;
use std::sync::Arc;

/// Transaction-managed facade over product storage.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<Store>,
}

impl ProductService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Gets one product; `None` when the id does not exist.
    pub fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.store.get_product(ExecScope::Ambient, id)
    }

    /// Lists products matching `filter`, ordered by id.
    pub fn list(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        self.store.list_products(ExecScope::Ambient, filter)
    }

    /// Lists products of one category.
    pub fn list_by_category(&self, category: CategoryId) -> StoreResult<Vec<Product>> {
        self.list(&ProductFilter::by_category(category))
    }

    /// Creates a product and returns the store-assigned id.
    pub fn create(&self, product: &Product) -> StoreResult<ProductId> {
        in_transaction(&self.store, |scope| {
            self.store.create_product(scope, product)
        })
    }

    /// Replaces all mutable fields of product `product.id`.
    pub fn update(&self, product: &Product) -> StoreResult<()> {
        in_transaction(&self.store, |scope| {
            self.store.update_product(scope, product)
        })
    }

    pub fn delete(&self, id: ProductId) -> StoreResult<()> {
        in_transaction(&self.store, |scope| self.store.delete_product(scope, id))
    }
}
