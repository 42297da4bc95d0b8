use anyhow::{Context, Result, anyhow};
use libsql::{Builder, Connection, Value};
use std::{path::Path, sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;

use crate::constants::*;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    username       TEXT    UNIQUE NOT NULL,
    name           TEXT,
    password_hash  TEXT    NOT NULL,
    created_at     INTEGER NOT NULL
);
"#;

const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id           TEXT    PRIMARY KEY,
    user_id      TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    description  TEXT    NOT NULL,
    amount       REAL    NOT NULL CHECK (amount > 0),
    type         TEXT    NOT NULL CHECK (type IN ('income', 'expense')),
    card_brand   TEXT,
    occurred_at  INTEGER NOT NULL,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
"#;

const CREATE_ENTRIES_OCCURRED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_entries_user_occurred ON entries (user_id, occurred_at DESC, created_at DESC);";

const CREATE_ENTRIES_TYPE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_entries_user_type ON entries (user_id, type);";

const SCHEMA: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_ENTRIES_TABLE,
    CREATE_ENTRIES_OCCURRED_INDEX,
    CREATE_ENTRIES_TYPE_INDEX,
];

/// Shared connection handle; reads take the read lock, writes and
/// transactions take the write lock.
pub type Db = Arc<RwLock<Connection>>;

/// Owns the open database for the lifetime of the process.
pub struct Database {
    _db: libsql::Database,
    conn: Db,
}

impl Database {
    /// Opens (creating if needed) `cashflow.db` under `data_dir` and applies the
    /// schema. Gives up after a short timeout instead of hanging on a locked file.
    pub async fn open(data_dir: &str) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("failed to create data directory {data_dir}"))?;
        let path = Path::new(data_dir).join(DATABASE_FILE);

        let connect = async {
            let db = Builder::new_local(&path).build().await?;
            let conn = db.connect()?;
            Ok::<_, libsql::Error>((db, conn))
        };
        let (db, conn) = tokio::time::timeout(Duration::from_secs(DB_CONNECT_TIMEOUT_SECS), connect)
            .await
            .map_err(|_| anyhow!("timed out opening database at {}", path.display()))??;

        conn.busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS))?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        for statement in SCHEMA {
            conn.execute(statement, ()).await?;
        }

        info!(path = %path.display(), "database ready");
        Ok(Self {
            _db: db,
            conn: Arc::new(RwLock::new(conn)),
        })
    }

    pub fn handle(&self) -> Db {
        Arc::clone(&self.conn)
    }

    /// Waits for in-flight statements to release the connection, then drops it.
    pub async fn close(self) {
        let _guard = self.conn.write().await;
        info!("database closed");
    }
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"))
}

/// SQLite hands back `SUM` results as either integers or reals.
pub fn value_as_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Real(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        Value::Null => Ok(0.0),
        other => Err(anyhow!("expected a numeric column, got {other:?}")),
    }
}

pub fn value_as_opt_string(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(anyhow!("expected a text column, got {other:?}")),
    }
}

/// Timestamps are stored as Unix milliseconds.
pub fn to_millis(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_millis(millis: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .with_context(|| format!("timestamp out of range: {millis}"))
}

/// Drops sub-millisecond precision so a value survives a storage round trip.
pub fn truncate_millis(ts: OffsetDateTime) -> OffsetDateTime {
    ts.replace_millisecond(ts.millisecond()).unwrap_or(ts)
}
