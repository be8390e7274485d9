//! `SQLite` schema definitions for the document store.
//!
//! Every collection of every logical database shares the `documents` table;
//! a document is addressed by `(database, collection, id)` and its body is
//! stored as JSON text.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    database TEXT NOT NULL,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (database, collection, id)
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Expression index over the work order foreign key (schema version 2).
pub const CREATE_VEHICLE_REF_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_vehicle_id
ON documents(database, collection, json_extract(body, '$.vehicle_id'))
";

/// All base schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_METADATA_TABLE,
];
