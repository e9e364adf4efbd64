//! SQLite-backed row store
//!
//! Table layout:
//!
//! ```text
//! Column name   Type      Nulls  Identity
//! ------------  --------  -----  --------
//! ident         TEXT(12)  no     yes
//! parent_ident  TEXT(12)  yes    yes
//! depth         INTEGER   no     yes
//! sort_order    INTEGER   no
//! label         TEXT(32)  yes
//! ```
//!
//! Identity matching uses `IS` so a NULL parent is compared as a value.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, instrument, trace};

use crate::domain::{validate_label, HierarchyRow, RowIdentity};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::RowStore;

const TABLE: &str = "tree_path";
const COLUMNS: &str = "ident, parent_ident, depth, sort_order, label";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Row store over a single SQLite connection.
///
/// The connection is checked out (locked) for the duration of one call, and every
/// call runs in its own transaction.
#[derive(Debug)]
pub struct SqliteRowStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteRowStore {
    /// Open (creating if needed) a database file.
    ///
    /// With a schema prefix other than `main`/`temp`, a sibling database file
    /// `<prefix>.db` is attached under that name and the table lives there.
    pub fn open(path: &Path, schema_prefix: Option<&str>) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(format!("create {}", parent.display()), e))?;
        }
        let conn = Connection::open(path)?;
        let attach_target = schema_prefix.map(|prefix| {
            path.with_file_name(format!("{prefix}.db"))
                .to_string_lossy()
                .into_owned()
        });
        debug!("open: {} (schema prefix: {:?})", path.display(), schema_prefix);
        Self::init(conn, schema_prefix, attach_target.as_deref())
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(schema_prefix: Option<&str>) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, schema_prefix, Some(":memory:"))
    }

    fn init(
        conn: Connection,
        schema_prefix: Option<&str>,
        attach_target: Option<&str>,
    ) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;

        if let Some(prefix) = schema_prefix {
            validate_schema_prefix(prefix)?;
            if !matches!(prefix, "main" | "temp") {
                if let Some(target) = attach_target {
                    conn.execute(&format!("ATTACH DATABASE ?1 AS {prefix}"), [target])?;
                }
            }
        }

        let table = table_name(schema_prefix);
        let index = match schema_prefix {
            Some(prefix) => format!("{prefix}.{TABLE}_depth_parent"),
            None => format!("{TABLE}_depth_parent"),
        };
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 ident        TEXT    NOT NULL,
                 parent_ident TEXT,
                 depth        INTEGER NOT NULL,
                 sort_order   INTEGER NOT NULL,
                 label        TEXT
             );
             CREATE INDEX IF NOT EXISTS {index} ON {TABLE}(depth, parent_ident, sort_order);"
        ))?;

        Ok(Self {
            conn: Mutex::new(conn),
            table,
        })
    }

    /// Fully qualified table name, e.g. `tree_path` or `legacy.tree_path`.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn checkout(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn query_rows(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<Vec<HierarchyRow>> {
        let conn = self.checkout()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, row_from_sql)?
            .collect::<Result<Vec<_>, _>>()?;
        trace!("query returned {} rows", rows.len());
        Ok(rows)
    }

    /// Run one keyed write in its own transaction and commit iff it touched exactly one row.
    fn write_one<F>(&self, op: &str, write: F) -> StoreResult<bool>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<usize>,
    {
        let mut conn = self.checkout()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // An error drops `tx`, which rolls back
        let changed = write(&tx)?;
        finish(tx, op, changed)
    }
}

fn finish(tx: Transaction<'_>, op: &str, changed: usize) -> StoreResult<bool> {
    if changed == 1 {
        tx.commit()?;
        debug!("{op}: committed");
        Ok(true)
    } else {
        tx.rollback()?;
        debug!("{op}: {changed} rows affected, rolled back");
        Ok(false)
    }
}

impl RowStore for SqliteRowStore {
    #[instrument(level = "debug", skip(self))]
    fn fetch_all(&self) -> StoreResult<Vec<HierarchyRow>> {
        let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY rowid", self.table);
        self.query_rows(&sql, &[])
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_by_depth_and_parent(
        &self,
        depth: u16,
        parent_ident: Option<&str>,
    ) -> StoreResult<Vec<HierarchyRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE depth = ?1 AND parent_ident IS ?2 ORDER BY sort_order, rowid",
            self.table
        );
        self.query_rows(&sql, params![depth, parent_ident])
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn fetch_one(&self, identity: &RowIdentity) -> StoreResult<Option<HierarchyRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE ident = ?1 AND depth = ?2 AND parent_ident IS ?3 \
             ORDER BY sort_order LIMIT 1",
            self.table
        );
        let conn = self.checkout()?;
        let row = conn
            .query_row(
                &sql,
                params![identity.ident, identity.depth, identity.parent_ident],
                row_from_sql,
            )
            .optional()?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self), fields(identity = %row.identity()))]
    fn insert(&self, row: &HierarchyRow) -> StoreResult<bool> {
        row.validate()?;
        let exists_sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE ident = ?1 AND depth = ?2 AND parent_ident IS ?3)",
            self.table
        );
        let insert_sql = format!(
            "INSERT INTO {} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.table
        );
        self.write_one("insert", |tx| {
            let exists: bool = tx.query_row(
                &exists_sql,
                params![row.ident, row.depth, row.parent_ident],
                |r| r.get(0),
            )?;
            if exists {
                return Ok(0);
            }
            tx.execute(
                &insert_sql,
                params![row.ident, row.parent_ident, row.depth, row.sort_order, row.label],
            )
        })
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn delete(&self, identity: &RowIdentity) -> StoreResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE ident = ?1 AND depth = ?2 AND parent_ident IS ?3",
            self.table
        );
        self.write_one("delete", |tx| {
            tx.execute(
                &sql,
                params![identity.ident, identity.depth, identity.parent_ident],
            )
        })
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn update_sort_order(&self, identity: &RowIdentity, sort_order: i16) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET sort_order = ?1 WHERE ident = ?2 AND depth = ?3 AND parent_ident IS ?4",
            self.table
        );
        self.write_one("update_sort_order", |tx| {
            tx.execute(
                &sql,
                params![sort_order, identity.ident, identity.depth, identity.parent_ident],
            )
        })
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn update_label(&self, identity: &RowIdentity, label: Option<&str>) -> StoreResult<bool> {
        validate_label(label)?;
        let sql = format!(
            "UPDATE {} SET label = ?1 WHERE ident = ?2 AND depth = ?3 AND parent_ident IS ?4",
            self.table
        );
        self.write_one("update_label", |tx| {
            tx.execute(
                &sql,
                params![label, identity.ident, identity.depth, identity.parent_ident],
            )
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn clear(&self) -> StoreResult<usize> {
        let mut conn = self.checkout()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {}", self.table), [])?;
        tx.commit()?;
        debug!("clear: removed {removed} rows");
        Ok(removed)
    }
}

fn row_from_sql(r: &rusqlite::Row<'_>) -> rusqlite::Result<HierarchyRow> {
    Ok(HierarchyRow {
        ident: r.get(0)?,
        parent_ident: r.get(1)?,
        depth: r.get(2)?,
        sort_order: r.get(3)?,
        label: r.get(4)?,
    })
}

/// `tree_path` or `<prefix>.tree_path`.
pub fn table_name(schema_prefix: Option<&str>) -> String {
    match schema_prefix {
        Some(prefix) => format!("{prefix}.{TABLE}"),
        None => TABLE.to_string(),
    }
}

// Prefixes are spliced into SQL text, so only plain identifiers are accepted.
fn validate_schema_prefix(prefix: &str) -> StoreResult<()> {
    let mut chars = prefix.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidSchemaPrefix(prefix.to_string()))
    }
}
