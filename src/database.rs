//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database that backs
//! the catalogue. Rules and categories are stored as JSON keyed by slug;
//! the many-to-many link between them and the engagement counters live in
//! separate fixed-width tables.

use redb::{Database, TableDefinition};

use crate::error::AppError;
use crate::repository::Catalog;

/// Categories keyed by slug
///
/// Value: JSON-serialized `Category`
pub const TABLE_CATEGORIES: TableDefinition<&str, &str> = TableDefinition::new("categories_v1");

/// Category id -> slug, used to resolve join rows back to categories
pub const TABLE_CATEGORY_IDS: TableDefinition<u64, &str> = TableDefinition::new("category_ids_v1");

/// Rules keyed by slug
///
/// Value: JSON-serialized `RuleRecord` (no counters, no categories)
pub const TABLE_RULES: TableDefinition<&str, &str> = TableDefinition::new("rules_v1");

/// Rule id -> slug, used to resolve join rows back to rules
pub const TABLE_RULE_IDS: TableDefinition<u64, &str> = TableDefinition::new("rule_ids_v1");

/// Engagement counters keyed by rule slug
///
/// Value layout: `(views, copies, upvotes, downvotes)`
pub const TABLE_RULE_COUNTERS: TableDefinition<&str, (u64, u64, u64, u64)> =
    TableDefinition::new("rule_counters_v1");

/// Join table: `(rule_id, category_id)`
///
/// Range scans over `(rule_id, 0)..=(rule_id, u64::MAX)` list a rule's categories.
pub const TABLE_RULE_CATEGORIES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("rule_categories_v1");

/// Reverse index of the join table: `(category_id, rule_id)`
pub const TABLE_CATEGORY_RULES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("category_rules_v1");

/// Id sequences, one row per entity kind
pub const TABLE_SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

/// Creates or opens the database file and makes sure every table exists
///
/// Read transactions fail on tables that were never created, so all of them
/// are opened once here inside a single write transaction.
///
/// # Example
///
/// ```no_run
/// # use rulehub::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, AppError> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_CATEGORIES)?;
        write_txn.open_table(TABLE_CATEGORY_IDS)?;
        write_txn.open_table(TABLE_RULES)?;
        write_txn.open_table(TABLE_RULE_IDS)?;
        write_txn.open_table(TABLE_RULE_COUNTERS)?;
        write_txn.open_table(TABLE_RULE_CATEGORIES)?;
        write_txn.open_table(TABLE_CATEGORY_RULES)?;
        write_txn.open_table(TABLE_SEQUENCES)?;
    }
    write_txn.commit()?;

    Ok(db)
}
