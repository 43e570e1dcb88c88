//! SQLite-backed usage counter via libsql. Implements UsageCounterPort.
//!
//! One `users` table keyed by Telegram user id. The first message from a user
//! inserts a row with `requests = 1`; later messages only bump `requests`.
//! Profile columns keep the values seen on first contact.
//! Database file: <data_dir>/users.db

use crate::domain::{DomainError, Sender};
use crate::ports::UsageCounterPort;
use libsql::{Connection, Database, params};
use std::path::{Path, PathBuf};
use tracing::info;

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    is_bot INTEGER NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT,
    user_name TEXT,
    language_code TEXT,
    requests INTEGER NOT NULL
)"#;

/// Single statement upsert; concurrent messages from one user cannot lose an increment.
const UPSERT_USER: &str = r#"
INSERT INTO users (id, is_bot, first_name, last_name, user_name, language_code, requests)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
ON CONFLICT (id) DO UPDATE SET requests = requests + 1
"#;

pub struct SqliteUsageStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteUsageStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Call this once at startup; the returned store is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::CounterStore(e.to_string()))?;
        let db_path = base.join("users.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::CounterStore(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::CounterStore(e.to_string()))?;

        // WAL lets the per-message tasks write without blocking readers.
        pragma(&conn, "PRAGMA journal_mode=WAL").await?;
        pragma(&conn, "PRAGMA synchronous=NORMAL").await?;

        conn.execute(USERS_TABLE, ())
            .await
            .map_err(|e| DomainError::CounterStore(e.to_string()))?;

        info!(path = %db_path.display(), "usage store ready");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Current request count for a user, `None` if never seen.
    pub async fn requests_for(&self, user_id: i64) -> Result<Option<i64>, DomainError> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT requests FROM users WHERE id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DomainError::CounterStore(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| DomainError::CounterStore(e.to_string()))?
        {
            Some(row) => {
                let requests: i64 = row
                    .get(0)
                    .map_err(|e| DomainError::CounterStore(e.to_string()))?;
                Ok(Some(requests))
            }
            None => Ok(None),
        }
    }

    async fn connection(&self) -> Result<Connection, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::CounterStore(e.to_string()))?;
        // Wait for a competing writer instead of failing with SQLITE_BUSY.
        pragma(&conn, "PRAGMA busy_timeout=5000").await?;
        Ok(conn)
    }
}

/// PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
async fn pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::CounterStore(format!("{} failed: {}", sql, e)))?;
    while rows
        .next()
        .await
        .map_err(|e| DomainError::CounterStore(e.to_string()))?
        .is_some()
    {}
    Ok(())
}

#[async_trait::async_trait]
impl UsageCounterPort for SqliteUsageStore {
    async fn ensure_user_and_increment(&self, sender: &Sender) -> Result<(), DomainError> {
        let conn = self.connection().await?;
        conn.execute(
            UPSERT_USER,
            params![
                sender.id,
                sender.is_bot as i64,
                sender.first_name.as_str(),
                sender.last_name.as_deref(),
                sender.username.as_deref(),
                sender.language_code.as_deref()
            ],
        )
        .await
        .map_err(|e| DomainError::CounterStore(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(id: i64, username: Option<&str>) -> Sender {
        Sender {
            id,
            is_bot: false,
            first_name: "Taras".to_string(),
            last_name: None,
            username: username.map(String::from),
            language_code: Some("uk".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_message_creates_then_increments() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteUsageStore::connect(dir.path()).await.unwrap();

        assert_eq!(store.requests_for(1).await.unwrap(), None);

        store.ensure_user_and_increment(&sender(1, Some("t"))).await.unwrap();
        assert_eq!(store.requests_for(1).await.unwrap(), Some(1));

        store.ensure_user_and_increment(&sender(1, None)).await.unwrap();
        store.ensure_user_and_increment(&sender(1, None)).await.unwrap();
        assert_eq!(store.requests_for(1).await.unwrap(), Some(3));

        store.ensure_user_and_increment(&sender(2, None)).await.unwrap();
        assert_eq!(store.requests_for(2).await.unwrap(), Some(1));
        assert_eq!(store.requests_for(1).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_counts_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteUsageStore::connect(dir.path()).await.unwrap();
            store.ensure_user_and_increment(&sender(7, None)).await.unwrap();
            assert!(store.path().ends_with("users.db"));
        }
        let store = SqliteUsageStore::connect(dir.path()).await.unwrap();
        store.ensure_user_and_increment(&sender(7, None)).await.unwrap();
        assert_eq!(store.requests_for(7).await.unwrap(), Some(2));
    }
}
