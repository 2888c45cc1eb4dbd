//! Category repository contract and SQLite implementation.

use crate::db::{EntityKind, ExecScope, Store, StoreError, StoreResult};
use crate::model::category::{Category, CategoryId};
use rusqlite::{params, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name FROM category";

/// Data access contract for categories.
pub trait CategoryRepository {
    fn get_category(&self, scope: ExecScope<'_>, id: CategoryId) -> StoreResult<Option<Category>>;
    fn list_categories(&self, scope: ExecScope<'_>) -> StoreResult<Vec<Category>>;
    fn create_category(&self, scope: ExecScope<'_>, category: &Category) -> StoreResult<CategoryId>;
    fn update_category(&self, scope: ExecScope<'_>, category: &Category) -> StoreResult<()>;
    fn delete_category(&self, scope: ExecScope<'_>, id: CategoryId) -> StoreResult<()>;
}

impl CategoryRepository for Store {
    fn get_category(&self, scope: ExecScope<'_>, id: CategoryId) -> StoreResult<Option<Category>> {
        self.run(scope, |conn| {
            let category = conn
                .query_row(
                    &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                    [id],
                    parse_category_row,
                )
                .optional()?;
            Ok(category)
        })
    }

    fn list_categories(&self, scope: ExecScope<'_>) -> StoreResult<Vec<Category>> {
        self.run(scope, |conn| {
            let mut stmt = conn.prepare(&format!("{CATEGORY_SELECT_SQL} ORDER BY id ASC;"))?;
            let categories = stmt
                .query_map([], parse_category_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    fn create_category(&self, scope: ExecScope<'_>, category: &Category) -> StoreResult<CategoryId> {
        self.run(scope, |conn| {
            let id = conn.query_row(
                "INSERT INTO category (name) VALUES (?1) RETURNING id;",
                [category.name.as_str()],
                |row| row.get(0),
            )?;
            Ok(id)
        })
    }

    fn update_category(&self, scope: ExecScope<'_>, category: &Category) -> StoreResult<()> {
        self.run(scope, |conn| {
            let changed = conn.execute(
                "UPDATE category SET name = ?1 WHERE id = ?2;",
                params![category.name.as_str(), category.id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    entity: EntityKind::Category,
                    id: category.id,
                });
            }
            Ok(())
        })
    }

    fn delete_category(&self, scope: ExecScope<'_>, id: CategoryId) -> StoreResult<()> {
        self.run(scope, |conn| {
            let changed = conn.execute("DELETE FROM category WHERE id = ?1;", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    entity: EntityKind::Category,
                    id,
                });
            }
            Ok(())
        })
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
