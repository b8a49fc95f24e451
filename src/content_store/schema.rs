//! SQLite schema for the content tree.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// Every node of the tree, keyed by its absolute path. Children are ordered
/// by `id`, i.e. by insertion.
const ENTRIES_TABLE_V1: Table = Table {
    name: "entries",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("path", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("parent_path", &SqlType::Text),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        // JSON object
        sqlite_column!("properties", &SqlType::Text, non_null = true),
        sqlite_column!("modified_by", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "modified",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_entries_parent_path", "parent_path")],
};

pub const CONTENT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[ENTRIES_TABLE_V1],
    migration: None,
}];
