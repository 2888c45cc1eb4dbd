//! Category use-case service.

use crate::db::{ExecScope, Store, StoreResult};
use crate::model::category::{Category, CategoryId};
use crate::repo::category_repo::CategoryRepository;
use crate::service::in_transaction;
use std::sync::Arc;

/// Transaction-managed facade over category storage.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<Store>,
}

impl CategoryService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Gets one category; `None` when the id does not exist.
    pub fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.store.get_category(ExecScope::Ambient, id)
    }

    /// Lists all categories ordered by id.
    pub fn list(&self) -> StoreResult<Vec<Category>> {
        self.store.list_categories(ExecScope::Ambient)
    }

    /// Creates a category and returns the store-assigned id.
    pub fn create(&self, category: &Category) -> StoreResult<CategoryId> {
        in_transaction(&self.store, |scope| {
            self.store.create_category(scope, category)
        })
    }

    /// Replaces the name of category `category.id`.
    pub fn update(&self, category: &Category) -> StoreResult<()> {
        in_transaction(&self.store, |scope| {
            self.store.update_category(scope, category)
        })
    }

    /// Deletes a category. Products referencing it are left untouched.
    pub fn delete(&self, id: CategoryId) -> StoreResult<()> {
        in_transaction(&self.store, |scope| self.store.delete_category(scope, id))
    }
}
