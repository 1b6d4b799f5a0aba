//! SQLite storage backend for wallet-db.
//!
//! Implements `StorageBackend` using rusqlite (bundled). The connection is
//! protected by a `parking_lot::ReentrantMutex<RefCell<Connection>>` so that
//! `transaction()` can hold the lock while calling the closure, which also
//! needs to lock in order to execute SQL.

use std::cell::{Cell, RefCell};
use std::path::Path;

use parking_lot::ReentrantMutex;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use crate::collection::builder::{CollectionDef, PRIMARY_INDEX};
use crate::error::{Result, StorageError, WalletDbError};
use crate::index::types::{FieldIndex, IndexSortOrder};
use crate::types::{RawBatchResult, SerializedRecord};

use super::traits::StorageBackend;

// ============================================================================
// Value helpers
// ============================================================================

/// Convert a `serde_json::Value` to a `rusqlite::types::Value` for query params.
fn json_value_to_sql(v: &Value) -> rusqlite::types::Value {
    match v {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        // Arrays and objects stored as JSON strings in SQLite
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

/// Map a rusqlite error to a `WalletDbError`.
fn storage_err(e: rusqlite::Error) -> WalletDbError {
    WalletDbError::Storage(StorageError::Sqlite(e))
}

fn is_primary_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

const SELECT_COLS: &str = "SELECT id, collection, data, sequence FROM records";

// ============================================================================
// SqliteBackend
// ============================================================================

/// SQLite storage backend.
///
/// `ReentrantMutex` allows `transaction()` to hold the guard while the closure
/// re-acquires it for individual SQL operations.
pub struct SqliteBackend {
    conn: ReentrantMutex<RefCell<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Open (or create) a file-backed SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn)
    }

    /// Apply pragmas and create the base tables.
    fn from_connection(conn: rusqlite::Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(storage_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id         TEXT NOT NULL,
                collection TEXT NOT NULL,
                data       TEXT NOT NULL DEFAULT '{}',
                sequence   INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            );
            CREATE INDEX IF NOT EXISTS idx_records_sequence
                ON records(collection, sequence);
            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(storage_err)?;

        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema:version', '1')",
            [],
        )
        .map_err(storage_err)?;

        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
        })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Execute `f` with a shared reference to the underlying connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        f(&conn).map_err(storage_err)
    }

    /// Parse a single rusqlite row into a `SerializedRecord`.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SerializedRecord> {
        let id: String = row.get(0)?;
        let collection: String = row.get(1)?;
        let data_str: String = row.get(2)?;
        let sequence: i64 = row.get(3)?;

        let data: Value = serde_json::from_str(&data_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(SerializedRecord {
            id,
            collection,
            data,
            sequence,
        })
    }

    /// Map a row-level parse failure to `StorageError::Corruption`.
    fn row_err(collection: &str, id: &str, e: rusqlite::Error) -> WalletDbError {
        match e {
            rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
                WalletDbError::Storage(StorageError::Corruption {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    field: "data".to_string(),
                    source,
                })
            }
            other => storage_err(other),
        }
    }

    fn serialize_data(data: &Value) -> Result<String> {
        serde_json::to_string(data)
            .map_err(|e| WalletDbError::Internal(format!("serialize data: {e}")))
    }
}

// ============================================================================
// StorageBackend implementation
// ============================================================================

impl StorageBackend for SqliteBackend {
    fn register_collection(&self, def: &CollectionDef) -> Result<()> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        for index in &def.indexes {
            let index_name = format!("idx_{}_{}", def.name, index.name);
            let cols: Vec<String> = index
                .fields
                .iter()
                .map(|f| {
                    let dir = match f.order {
                        IndexSortOrder::Asc => "ASC",
                        IndexSortOrder::Desc => "DESC",
                    };
                    format!("json_extract(data, '$.{}') {dir}", f.field)
                })
                .collect();
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS {} ON records (collection, {})",
                index_name,
                cols.join(", ")
            );
            conn.execute_batch(&sql).map_err(storage_err)?;
        }
        Ok(())
    }

    fn get_raw(&self, collection: &str, id: &str) -> Result<Option<SerializedRecord>> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn
            .prepare_cached(&format!("{SELECT_COLS} WHERE collection = ?1 AND id = ?2"))
            .map_err(storage_err)?;

        stmt.query_row(params![collection, id], Self::row_to_record)
            .optional()
            .map_err(|e| Self::row_err(collection, id, e))
    }

    fn insert_raw(&self, collection: &str, id: &str, data: &Value) -> Result<SerializedRecord> {
        let data_str = Self::serialize_data(data)?;
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let inserted = conn.execute(
            "INSERT INTO records (id, collection, data, sequence) \
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(sequence), 0) + 1 FROM records))",
            params![id, collection, data_str],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_primary_key_violation(&e) => {
                return Err(WalletDbError::Storage(StorageError::UniqueConstraint {
                    collection: collection.to_string(),
                    index: PRIMARY_INDEX.to_string(),
                    existing_id: id.to_string(),
                    value: Value::String(id.to_string()),
                }));
            }
            Err(e) => return Err(storage_err(e)),
        }

        let sequence: i64 = conn
            .query_row(
                "SELECT sequence FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .map_err(storage_err)?;

        Ok(SerializedRecord {
            id: id.to_string(),
            collection: collection.to_string(),
            data: data.clone(),
            sequence,
        })
    }

    fn replace_raw(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<Option<SerializedRecord>> {
        let data_str = Self::serialize_data(data)?;
        let guard = self.conn.lock();
        let changed = guard
            .borrow()
            .execute(
                "UPDATE records SET data = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection, id, data_str],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_raw(collection, id)
    }

    fn delete_raw(&self, collection: &str, id: &str) -> Result<Option<SerializedRecord>> {
        let guard = self.conn.lock();
        let Some(existing) = self.get_raw(collection, id)? else {
            return Ok(None);
        };
        guard
            .borrow()
            .execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .map_err(storage_err)?;
        Ok(Some(existing))
    }

    fn scan_raw(&self, collection: &str) -> Result<RawBatchResult> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn
            .prepare_cached(&format!(
                "{SELECT_COLS} WHERE collection = ?1 ORDER BY sequence ASC"
            ))
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![collection], Self::row_to_record)
            .map_err(storage_err)?;
        let records: rusqlite::Result<Vec<_>> = rows.collect();
        Ok(RawBatchResult {
            records: records.map_err(|e| Self::row_err(collection, "?", e))?,
        })
    }

    fn count_raw(&self, collection: &str) -> Result<usize> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM records WHERE collection = ?1",
                params![collection],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
        })
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
        })
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // SAVEPOINTs compose with outer transactions; each invocation gets a
        // unique name so nesting never collides.
        thread_local! {
            static SP_COUNTER: Cell<u64> = const { Cell::new(0) };
        }
        let sp_name = SP_COUNTER.with(|c| {
            let n = c.get();
            c.set(n + 1);
            format!("sp_{n}")
        });

        // Held for the whole closure so no other thread interleaves writes.
        let guard = self.conn.lock();
        guard
            .borrow()
            .execute(&format!("SAVEPOINT {sp_name}"), [])
            .map_err(storage_err)?;

        match f(self) {
            Ok(v) => {
                let released = guard
                    .borrow()
                    .execute(&format!("RELEASE SAVEPOINT {sp_name}"), []);
                match released {
                    Ok(_) => Ok(v),
                    Err(e) => {
                        let _ = guard
                            .borrow()
                            .execute(&format!("ROLLBACK TO SAVEPOINT {sp_name}"), []);
                        Err(storage_err(e))
                    }
                }
            }
            Err(e) => {
                let _ = guard
                    .borrow()
                    .execute(&format!("ROLLBACK TO SAVEPOINT {sp_name}"), []);
                let _ = guard
                    .borrow()
                    .execute(&format!("RELEASE SAVEPOINT {sp_name}"), []);
                Err(e)
            }
        }
    }

    fn check_unique(
        &self,
        collection: &str,
        index: &FieldIndex,
        data: &Value,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let mut conditions: Vec<String> = vec!["collection = ?".to_string()];
        let mut params: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(collection.to_string())];

        let obj = data.as_object();

        for field in &index.fields {
            match obj.and_then(|o| o.get(&field.field)) {
                None | Some(Value::Null) => {
                    conditions.push(format!(
                        "json_extract(data, '$.{}') IS NULL",
                        field.field
                    ));
                }
                Some(v) => {
                    conditions.push(format!("json_extract(data, '$.{}') = ?", field.field));
                    params.push(json_value_to_sql(v));
                }
            }
        }

        if let Some(eid) = exclude_id {
            conditions.push("id != ?".to_string());
            params.push(rusqlite::types::Value::Text(eid.to_string()));
        }

        let sql = format!(
            "SELECT id FROM records WHERE {} LIMIT 1",
            conditions.join(" AND ")
        );

        let existing_id: Option<String> = self.with_conn(|conn| {
            conn.prepare_cached(&sql)?
                .query_row(rusqlite::params_from_iter(params), |row| {
                    row.get::<_, String>(0)
                })
                .optional()
        })?;

        if let Some(eid) = existing_id {
            let conflict_value = if index.fields.len() == 1 {
                obj.and_then(|o| o.get(&index.fields[0].field))
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                Value::Array(
                    index
                        .fields
                        .iter()
                        .map(|f| {
                            obj.and_then(|o| o.get(&f.field))
                                .cloned()
                                .unwrap_or(Value::Null)
                        })
                        .collect(),
                )
            };
            return Err(WalletDbError::Storage(StorageError::UniqueConstraint {
                collection: collection.to_string(),
                index: index.name.clone(),
                existing_id: eid,
                value: conflict_value,
            }));
        }

        Ok(())
    }
}
