//! SQLite-backed task token store: pending confirmation links survive restarts.
//!
//! Consumption is one `DELETE ... RETURNING` statement, so two requests racing
//! on the same token cannot both read the row.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::{ActionKind, BazaarError, Result, StoredTask, TaskArgs, TaskToken, TaskTokenStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::store::is_expired;

pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
    ttl: Option<Duration>,
}

impl SqliteTaskStore {
    /// Open or create the task database.
    pub fn open(path: &Path, ttl: Option<Duration>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| BazaarError::Store(format!("DB open: {e}")))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        let store = Self {
            conn: Mutex::new(conn),
            ttl,
        };
        store.migrate()?;
        tracing::info!("Task store opened at {}", path.display());
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.lock()?
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS pending_tasks (
                token TEXT PRIMARY KEY,
                action TEXT NOT NULL,        -- ActionKind name, e.g. 'activate-user'
                args TEXT NOT NULL,          -- JSON, schema fixed by action
                created_at TEXT NOT NULL     -- RFC3339 UTC
            );
            CREATE INDEX IF NOT EXISTS idx_pending_tasks_created ON pending_tasks(created_at);
            ",
            )
            .map_err(|e| BazaarError::Store(format!("Migration: {e}")))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BazaarError::Store(format!("Lock: {e}")))
    }

    /// Number of pending tasks.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM pending_tasks", [], |r| r.get(0))
            .map_err(|e| BazaarError::Store(format!("Count: {e}")))?;
        Ok(n as usize)
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl TaskTokenStore for SqliteTaskStore {
    async fn put(&self, args: &TaskArgs) -> Result<TaskToken> {
        let token = TaskToken::new();
        let payload = args.to_payload()?;
        self.lock()?
            .execute(
                "INSERT INTO pending_tasks (token, action, args, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![token.to_string(), args.kind().as_str(), payload, timestamp(Utc::now())],
            )
            .map_err(|e| BazaarError::Store(format!("Insert task: {e}")))?;
        Ok(token)
    }

    async fn take(&self, token: &TaskToken) -> Result<StoredTask> {
        let row = self
            .lock()?
            .query_row(
                "DELETE FROM pending_tasks WHERE token = ?1 RETURNING action, args, created_at",
                params![token.to_string()],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| BazaarError::Store(format!("Take task: {e}")))?;

        let Some((action, payload, created_at)) = row else {
            return Err(BazaarError::TokenNotFound(token.to_string()));
        };

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| BazaarError::Store(format!("Bad created_at for {token}: {e}")))?;
        let kind: ActionKind = action.parse()?;
        let args = TaskArgs::from_payload(kind, &payload)?;
        let task = StoredTask {
            token: *token,
            kind,
            args,
            created_at,
        };

        if is_expired(self.ttl, &task) {
            tracing::debug!("Token {token} expired");
            return Err(BazaarError::TokenNotFound(token.to_string()));
        }
        Ok(task)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let Some(ttl) = self.ttl else { return Ok(0) };
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| BazaarError::Config(format!("TTL out of range: {e}")))?;
        let cutoff = timestamp(Utc::now() - ttl);
        self.lock()?
            .execute("DELETE FROM pending_tasks WHERE created_at < ?1", params![cutoff])
            .map_err(|e| BazaarError::Store(format!("Purge: {e}")))
    }
}
