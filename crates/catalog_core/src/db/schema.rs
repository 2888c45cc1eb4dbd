//! Catalog table definitions.
//!
//! # Invariants
//! - Every statement is `CREATE TABLE IF NOT EXISTS`; running the batch twice
//!   is a no-op.
//! - There is no version tracking: the schema is created, never migrated.

use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables the engine expects after bootstrap.
pub(super) const TABLES: &[&str] = &["category", "product"];

pub(super) fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
