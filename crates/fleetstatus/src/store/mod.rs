//! Document store for fleetstatus.
//!
//! This module provides an embedded, `SQLite`-backed JSON document store.
//! Documents live in named collections inside a logical database and are
//! addressed by their `_id` field.

pub mod migrations;
pub mod schema;
pub mod update;

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use update::Update;

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Name of the identity field of every document.
pub const ID_FIELD: &str = "_id";

/// URI that selects an in-memory store.
pub const MEMORY_URI: &str = ":memory:";

/// Embedded JSON document store.
///
/// Provides:
/// - Insertion keyed by `_id`, rejecting duplicates
/// - Full scans, lookup by id and equality filters on dotted field paths
/// - Single-document set/unset updates applied atomically
/// - Deletion by id or by field equality
#[derive(Debug)]
pub struct DocumentStore {
    /// Path to the database file.
    path: PathBuf,
    /// Logical database name that namespaces every collection.
    database: String,
    /// Database connection.
    conn: Connection,
}

impl DocumentStore {
    /// Open or create a store at `uri` for the logical database `database`.
    ///
    /// `uri` is a file path, or [`MEMORY_URI`] for an in-memory store.
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(uri: impl AsRef<Path>, database: impl Into<String>) -> Result<Self> {
        let path = uri.as_ref().to_path_buf();
        if path.as_os_str() == MEMORY_URI {
            return Self::open_in_memory(database);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening document store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        let database = database.into();
        info!(
            "Document store opened at {} (database '{}')",
            path.display(),
            database
        );
        Ok(Self {
            path,
            database,
            conn,
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(database: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_URI),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_URI),
            database: database.into(),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the logical database name.
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Verify the connection answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not respond.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Insert a document into `collection`.
    ///
    /// Returns the document's `_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no string `_id`, the id already
    /// exists in the collection, or the database operation fails.
    pub fn insert_one(&self, collection: &str, doc: &Document) -> Result<String> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingId {
                collection: collection.to_string(),
            })?
            .to_string();

        if self.exists(collection, &id)? {
            return Err(Error::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }

        let body = serde_json::to_string(doc)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r"
            INSERT INTO documents (database, collection, id, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
            params![self.database, collection, id, body, now],
        )?;

        debug!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
            params![self.database, collection, id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get every document of `collection`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a body is corrupt.
    pub fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, body FROM documents
            WHERE database = ?1 AND collection = ?2
            ORDER BY rowid
            ",
        )?;

        let rows = stmt
            .query_map(params![self.database, collection], Self::row_to_raw)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, body)| Self::decode(collection, id, &body))
            .collect()
    }

    /// Get a document by its `_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the body is corrupt.
    pub fn find_one(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let raw = self
            .conn
            .query_row(
                r"
                SELECT id, body FROM documents
                WHERE database = ?1 AND collection = ?2 AND id = ?3
                ",
                params![self.database, collection, id],
                Self::row_to_raw,
            )
            .optional()?;

        raw.map(|(id, body)| Self::decode(collection, id, &body))
            .transpose()
    }

    /// Get every document whose string field at `path` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed, the database operation fails,
    /// or a body is corrupt.
    pub fn find_by_field(&self, collection: &str, path: &str, value: &str) -> Result<Vec<Document>> {
        let json_path = json_path(path)?;
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, body FROM documents
            WHERE database = ?1 AND collection = ?2 AND json_extract(body, ?3) = ?4
            ORDER BY rowid
            ",
        )?;

        let rows = stmt
            .query_map(
                params![self.database, collection, json_path, value],
                Self::row_to_raw,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, body)| Self::decode(collection, id, &body))
            .collect()
    }

    /// Apply `update` to the document with the given id.
    ///
    /// Returns `true` if a document matched, whether or not its content changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is malformed or the database operation fails.
    pub fn update_one(&self, collection: &str, id: &str, update: &Update) -> Result<bool> {
        self.update_one_checked(collection, id, update, Ok)
    }

    /// Apply `update` to the document with the given id, passing the merged
    /// document through `check` before it is written.
    ///
    /// `check` returns the document to store, which lets it normalize the
    /// merged fields; the `_id` is kept regardless. Read, merge, check and
    /// write happen in one transaction. If `check` fails nothing is written
    /// and its error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is malformed, `check` rejects the
    /// merged document, or the database operation fails.
    pub fn update_one_checked<F>(
        &self,
        collection: &str,
        id: &str,
        update: &Update,
        check: F,
    ) -> Result<bool>
    where
        F: FnOnce(Document) -> Result<Document>,
    {
        let tx = self.conn.unchecked_transaction()?;

        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
                params![self.database, collection, id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            debug!("No document {} in {} to update", id, collection);
            return Ok(false);
        };

        let mut doc = Self::decode(collection, id.to_string(), &body)?;
        update.apply(&mut doc)?;
        let mut doc = check(doc)?;
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let body = serde_json::to_string(&doc)?;
        tx.execute(
            r"
            UPDATE documents SET body = ?4, updated_at = ?5
            WHERE database = ?1 AND collection = ?2 AND id = ?3
            ",
            params![self.database, collection, id, body, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        debug!("Updated document {} in {}", id, collection);
        Ok(true)
    }

    /// Delete a document by id.
    ///
    /// Returns `true` if a document was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_one(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
            params![self.database, collection, id],
        )?;
        Ok(affected > 0)
    }

    /// Delete every document whose string field at `path` equals `value`.
    ///
    /// Returns the number of documents deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed or the database operation fails.
    pub fn delete_many_by_field(&self, collection: &str, path: &str, value: &str) -> Result<usize> {
        let json_path = json_path(path)?;
        let affected = self.conn.execute(
            r"
            DELETE FROM documents
            WHERE database = ?1 AND collection = ?2 AND json_extract(body, ?3) = ?4
            ",
            params![self.database, collection, json_path, value],
        )?;

        if affected > 0 {
            info!("Deleted {} documents from {}", affected, collection);
        }
        Ok(affected)
    }

    /// Count documents in `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE database = ?1 AND collection = ?2",
            params![self.database, collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get store statistics for the current logical database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT collection, COUNT(*) FROM documents
            WHERE database = ?1 GROUP BY collection ORDER BY collection
            ",
        )?;
        let collections = stmt
            .query_map([&self.database], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;

        let db_size_bytes = if self.path.as_os_str() == MEMORY_URI {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            database: self.database.clone(),
            collections,
            db_size_bytes,
        })
    }

    fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<(String, String)> {
        Ok((row.get(0)?, row.get(1)?))
    }

    fn decode(collection: &str, id: String, body: &str) -> Result<Document> {
        serde_json::from_str(body).map_err(|source| Error::CorruptDocument {
            collection: collection.to_string(),
            id,
            source,
        })
    }
}

/// Convert a dotted field path into a `SQLite` JSON path.
fn json_path(path: &str) -> Result<String> {
    let segments = update::split_path(path)?;
    Ok(format!("$.{}", segments.join(".")))
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Logical database name.
    pub database: String,
    /// Document count per non-empty collection, sorted by name.
    pub collections: Vec<(String, i64)>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Document count of a collection (0 if absent).
    #[must_use]
    pub fn count_of(&self, collection: &str) -> i64 {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .map_or(0, |(_, count)| *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLL: &str = "things";

    fn create_test_store() -> DocumentStore {
        DocumentStore::open_in_memory("test").expect("failed to create test store")
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), MEMORY_URI);
        assert_eq!(store.database_name(), "test");
        assert!(store.ping().is_ok());
    }

    #[test]
    fn test_open_memory_uri() {
        let store = DocumentStore::open(MEMORY_URI, "fleet").unwrap();
        assert_eq!(store.path().to_string_lossy(), MEMORY_URI);
    }

    #[test]
    fn test_insert_and_find_one() {
        let store = create_test_store();
        let id = store
            .insert_one(COLL, &doc(json!({"_id": "a", "name": "Van"})))
            .unwrap();
        assert_eq!(id, "a");

        let found = store.find_one(COLL, "a").unwrap().unwrap();
        assert_eq!(found["name"], json!("Van"));
    }

    #[test]
    fn test_insert_requires_string_id() {
        let store = create_test_store();
        let err = store.insert_one(COLL, &doc(json!({"name": "x"}))).unwrap_err();
        assert!(matches!(err, Error::MissingId { .. }));

        let err = store.insert_one(COLL, &doc(json!({"_id": 7}))).unwrap_err();
        assert!(matches!(err, Error::MissingId { .. }));
    }

    #[test]
    fn test_insert_duplicate_id() {
        let store = create_test_store();
        store.insert_one(COLL, &doc(json!({"_id": "a"}))).unwrap();
        let err = store.insert_one(COLL, &doc(json!({"_id": "a"}))).unwrap_err();
        assert!(matches!(err, Error::DuplicateId { .. }));

        // Same id in another collection is fine.
        assert!(store.insert_one("others", &doc(json!({"_id": "a"}))).is_ok());
    }

    #[test]
    fn test_find_one_missing() {
        let store = create_test_store();
        assert!(store.find_one(COLL, "nope").unwrap().is_none());
    }

    #[test]
    fn test_find_all_in_insertion_order() {
        let store = create_test_store();
        for id in ["c", "a", "b"] {
            store.insert_one(COLL, &doc(json!({"_id": id}))).unwrap();
        }
        let ids: Vec<_> = store
            .find_all(COLL)
            .unwrap()
            .into_iter()
            .map(|d| d["_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_databases_are_isolated() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fleet.db");

        let first = DocumentStore::open(&path, "first").unwrap();
        first.insert_one(COLL, &doc(json!({"_id": "a"}))).unwrap();
        drop(first);

        let second = DocumentStore::open(&path, "second").unwrap();
        assert!(second.find_all(COLL).unwrap().is_empty());
        assert_eq!(second.count(COLL).unwrap(), 0);
    }

    #[test]
    fn test_find_by_field() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "1", "owner": "v1"})))
            .unwrap();
        store
            .insert_one(COLL, &doc(json!({"_id": "2", "owner": "v2"})))
            .unwrap();
        store
            .insert_one(COLL, &doc(json!({"_id": "3", "owner": "v1"})))
            .unwrap();

        let found = store.find_by_field(COLL, "owner", "v1").unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find_by_field(COLL, "owner", "v9").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_nested_field() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "1", "meta": {"tag": "x"}})))
            .unwrap();
        assert_eq!(store.find_by_field(COLL, "meta.tag", "x").unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_field_rejects_bad_path() {
        let store = create_test_store();
        let err = store.find_by_field(COLL, "owner') OR 1=1 --", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_update_one() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "a", "name": "Van", "note": "x"})))
            .unwrap();

        let update = Update::new().set("name", "Truck").unset("note");
        assert!(store.update_one(COLL, "a", &update).unwrap());

        let found = store.find_one(COLL, "a").unwrap().unwrap();
        assert_eq!(found["name"], json!("Truck"));
        assert!(!found.contains_key("note"));
    }

    #[test]
    fn test_update_one_no_match() {
        let store = create_test_store();
        let update = Update::new().set("name", "Truck");
        assert!(!store.update_one(COLL, "missing", &update).unwrap());
    }

    #[test]
    fn test_noop_update_still_matches() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "a", "name": "Van"})))
            .unwrap();
        let update = Update::new().set("name", "Van");
        assert!(store.update_one(COLL, "a", &update).unwrap());
    }

    #[test]
    fn test_update_checked_rejection_writes_nothing() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "a", "name": "Van"})))
            .unwrap();

        let update = Update::new().set("name", "");
        let result = store.update_one_checked(COLL, "a", &update, |merged| {
            if merged["name"] == json!("") {
                Err(crate::model::ValidationError::new("name", "must not be empty").into())
            } else {
                Ok(merged)
            }
        });
        assert!(result.unwrap_err().is_validation());

        let found = store.find_one(COLL, "a").unwrap().unwrap();
        assert_eq!(found["name"], json!("Van"));
    }

    #[test]
    fn test_update_checked_writes_normalized_document() {
        let store = create_test_store();
        store
            .insert_one(COLL, &doc(json!({"_id": "a", "name": "Van"})))
            .unwrap();

        let update = Update::new().set("name", "  Truck ");
        let matched = store
            .update_one_checked(COLL, "a", &update, |mut merged| {
                let name = merged["name"].as_str().unwrap_or_default().trim().to_string();
                merged.insert("name".to_string(), json!(name));
                merged.remove(ID_FIELD);
                Ok(merged)
            })
            .unwrap();
        assert!(matched);

        let found = store.find_one(COLL, "a").unwrap().unwrap();
        assert_eq!(found["name"], json!("Truck"));
        assert_eq!(found[ID_FIELD], json!("a"));
    }

    #[test]
    fn test_update_cannot_change_id() {
        let store = create_test_store();
        store.insert_one(COLL, &doc(json!({"_id": "a"}))).unwrap();
        let update = Update::new().set("_id", "b");
        assert!(store.update_one(COLL, "a", &update).is_err());
        assert!(store.find_one(COLL, "a").unwrap().is_some());
    }

    #[test]
    fn test_delete_one() {
        let store = create_test_store();
        store.insert_one(COLL, &doc(json!({"_id": "a"}))).unwrap();
        assert!(store.delete_one(COLL, "a").unwrap());
        assert!(store.find_one(COLL, "a").unwrap().is_none());
        assert!(!store.delete_one(COLL, "a").unwrap());
    }

    #[test]
    fn test_delete_many_by_field() {
        let store = create_test_store();
        for (id, owner) in [("1", "v1"), ("2", "v2"), ("3", "v1")] {
            store
                .insert_one(COLL, &doc(json!({"_id": id, "owner": owner})))
                .unwrap();
        }
        assert_eq!(store.delete_many_by_field(COLL, "owner", "v1").unwrap(), 2);
        assert_eq!(store.count(COLL).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_body_is_reported() {
        let store = create_test_store();
        // The vehicle_id expression index rejects malformed JSON on insert.
        store
            .conn
            .execute_batch("DROP INDEX idx_documents_vehicle_id")
            .unwrap();
        for (id, body) in [("bad", "not json"), ("list", "[1, 2]")] {
            store
                .conn
                .execute(
                    "INSERT INTO documents VALUES ('test', ?1, ?2, ?3, 'x', 'x')",
                    [COLL, id, body],
                )
                .unwrap();
            let err = store.find_one(COLL, id).unwrap_err();
            assert!(matches!(err, Error::CorruptDocument { .. }));
        }
    }

    #[test]
    fn test_stats() {
        let store = create_test_store();
        store.insert_one("vehicles", &doc(json!({"_id": "a"}))).unwrap();
        store.insert_one("work_orders", &doc(json!({"_id": "1"}))).unwrap();
        store.insert_one("work_orders", &doc(json!({"_id": "2"}))).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.database, "test");
        assert_eq!(stats.count_of("vehicles"), 1);
        assert_eq!(stats.count_of("work_orders"), 2);
        assert_eq!(stats.count_of("missing"), 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("nested/deeper/fleet.db");

        let store = DocumentStore::open(&nested, "fleet").unwrap();
        assert!(nested.exists());
        assert_eq!(store.path(), nested);
    }
}
