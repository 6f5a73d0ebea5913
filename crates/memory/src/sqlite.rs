//! SQLite transcript backend.
//!
//! One table, `transcript`, append-only. Rows are ordered by their integer
//! rowid so two messages written within the same millisecond keep their order.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tierline_core::error::StoreError;
use tierline_core::memory::{SessionOwner, TranscriptEntry, TranscriptStore};
use tierline_core::message::{Message, Role};
use tracing::{debug, info, warn};

/// A durable SQLite transcript store.
pub struct SqliteTranscript {
    pool: SqlitePool,
}

impl SqliteTranscript {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // A single connection keeps `:memory:` databases shared across queries.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite transcript initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transcript (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                agent_id    TEXT NOT NULL,
                company_id  TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("transcript table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transcript_session ON transcript(session_id, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let role = Role::parse(&role).unwrap_or_else(|| {
            warn!(role = %role, "Unknown role in transcript, reading as system");
            Role::System
        });
        let timestamp = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Message {
            role,
            content,
            timestamp,
        })
    }
}

#[async_trait]
impl TranscriptStore for SqliteTranscript {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, entry: TranscriptEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO transcript (session_id, agent_id, company_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.session_id)
        .bind(&entry.agent_id)
        .bind(&entry.company_id)
        .bind(entry.message.role.as_str())
        .bind(&entry.message.content)
        .bind(entry.message.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("append: {e}")))?;
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM transcript WHERE session_id = ? ORDER BY iid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("load: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn count(&self, session_id: &str) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transcript WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("count: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n.max(0) as usize)
    }

    async fn owner(&self, session_id: &str) -> Result<Option<SessionOwner>, StoreError> {
        let row = sqlx::query(
            "SELECT agent_id, company_id FROM transcript WHERE session_id = ? ORDER BY iid ASC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("owner: {e}")))?;

        row.map(|row| {
            Ok(SessionOwner {
                agent_id: row
                    .try_get("agent_id")
                    .map_err(|e| StoreError::QueryFailed(format!("owner column: {e}")))?,
                company_id: row
                    .try_get("company_id")
                    .map_err(|e| StoreError::QueryFailed(format!("owner column: {e}")))?,
            })
        })
        .transpose()
    }
}
