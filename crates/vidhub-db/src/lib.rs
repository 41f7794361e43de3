pub mod migrations;

mod content;
mod relations;
mod users;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, Row, params_from_iter};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use vidhub_core::StoreError;

const READER_POOL_SIZE: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
/// Ids bound per `IN` list; SQLite caps host parameters per statement.
const ID_CHUNK: usize = 500;

/// SQLite store: one writer plus a small pool of read-only connections.
///
/// All writes go through the single writer, which is what makes the
/// refresh-token compare-and-swap and the edge uniqueness checks atomic.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| anyhow::anyhow!("Reader lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Writer lock poisoned: {}", e))?;
        f(&mut conn)
    }

    /// Read through the pool, reporting failures as store errors.
    fn read<F, T>(&self, f: F) -> vidhub_core::StoreResult<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.with_conn(f).map_err(store_error)
    }

    fn write<F, T>(&self, f: F) -> vidhub_core::StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        self.with_conn_mut(f).map_err(store_error)
    }
}

/// Unique and primary-key violations become `Conflict`; anything else is a
/// backend failure.
fn store_error(err: anyhow::Error) -> StoreError {
    if let Some(rusqlite::Error::SqliteFailure(failure, _)) = err.downcast_ref::<rusqlite::Error>() {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return StoreError::Conflict;
        }
    }
    StoreError::Backend(err)
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    Ok(parse_timestamp(&raw))
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Column defaults are "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// `?1, ?2, ...` for an IN list of `n` values.
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn id_params(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

/// `SELECT {columns} FROM {table} WHERE id IN (...)`, one statement per chunk.
fn select_by_ids<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    ids: &[Uuid],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK) {
        let sql = format!(
            "SELECT {} FROM {} WHERE id IN ({})",
            columns,
            table,
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        for row in stmt.query_map(params_from_iter(id_params(chunk)), map)? {
            rows.push(row?);
        }
    }
    Ok(rows)
}
