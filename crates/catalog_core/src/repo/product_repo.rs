//! Product repository contract and SQLite implementation.
//!
//! # Invariants
//! - A `NULL` description column reads back as an empty string.
//! - The category filter is an exact match on `product.category`.

use crate::db::{EntityKind, ExecScope, Store, StoreError, StoreResult};
use crate::model::category::CategoryId;
use crate::model::product::{Product, ProductId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    category,
    price
FROM product";

/// Query options for listing products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only return products whose `category` equals this value.
    pub category: Option<CategoryId>,
}

impl ProductFilter {
    pub fn by_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
        }
    }
}

/// Data access contract for products.
pub trait ProductRepository {
    fn get_product(&self, scope: ExecScope<'_>, id: ProductId) -> StoreResult<Option<Product>>;
    fn list_products(&self, scope: ExecScope<'_>, filter: &ProductFilter)
        -> StoreResult<Vec<Product>>;
    fn create_product(&self, scope: ExecScope<'_>, product: &Product) -> StoreResult<ProductId>;
    fn update_product(&self, scope: ExecScope<'_>, product: &Product) -> StoreResult<()>;
    fn delete_product(&self, scope: ExecScope<'_>, id: ProductId) -> StoreResult<()>;
}

impl ProductRepository for Store {
    fn get_product(&self, scope: ExecScope<'_>, id: ProductId) -> StoreResult<Option<Product>> {
        self.run(scope, |conn| {
            let product = conn
                .query_row(
                    &format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"),
                    [id],
                    parse_product_row,
                )
                .optional()?;
            Ok(product)
        })
    }

    fn list_products(
        &self,
        scope: ExecScope<'_>,
        filter: &ProductFilter,
    ) -> StoreResult<Vec<Product>> {
        let mut sql = String::from(PRODUCT_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = filter.category {
            sql.push_str(" WHERE category = ?");
            bind_values.push(Value::Integer(category));
        }
        sql.push_str(" ORDER BY id ASC;");

        self.run(scope, |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let products = stmt
                .query_map(params_from_iter(bind_values), parse_product_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(products)
        })
    }

    fn create_product(&self, scope: ExecScope<'_>, product: &Product) -> StoreResult<ProductId> {
        self.run(scope, |conn| {
            let id = conn.query_row(
                "INSERT INTO product (name, description, category, price)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id;",
                params![
                    product.name.as_str(),
                    product.description.as_str(),
                    product.category,
                    product.price,
                ],
                |row| row.get(0),
            )?;
            Ok(id)
        })
    }

    fn update_product(&self, scope: ExecScope<'_>, product: &Product) -> StoreResult<()> {
        self.run(scope, |conn| {
            let changed = conn.execute(
                "UPDATE product
                 SET
                    name = ?1,
                    description = ?2,
                    category = ?3,
                    price = ?4
                 WHERE id = ?5;",
                params![
                    product.name.as_str(),
                    product.description.as_str(),
                    product.category,
                    product.price,
                    product.id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    entity: EntityKind::Product,
                    id: product.id,
                });
            }
            Ok(())
        })
    }

    fn delete_product(&self, scope: ExecScope<'_>, id: ProductId) -> StoreResult<()> {
        self.run(scope, |conn| {
            let changed = conn.execute("DELETE FROM product WHERE id = ?1;", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    entity: EntityKind::Product,
                    id,
                });
            }
            Ok(())
        })
    }
}

fn parse_product_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row
            .get::<_, Option<String>>("description")?
            .unwrap_or_default(),
        category: row.get("category")?,
        price: row.get("price")?,
    })
}
