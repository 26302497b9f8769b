//! Session persistence: conversation state, confirmed items, and the transcript.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::interview::domains::Domain;
use crate::interview::session::{ChatTurn, Role, SessionState};
use crate::models::session::{ItemRow, SessionRow, TranscriptRow};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_session(&self, session_id: Uuid) -> Result<Option<SessionState>>;

    async fn save_session(&self, session_id: Uuid, state: &SessionState) -> Result<()>;

    /// Stores the confirmed item. A second commit for the same session overwrites the first.
    async fn commit_record(&self, session_id: Uuid, domain: Domain, record: &Value) -> Result<()>;

    async fn append_transcript(&self, session_id: Uuid, role: Role, text: &str) -> Result<()>;

    /// The last `limit` turns, oldest first.
    async fn recent_transcript(&self, session_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>>;

    /// The whole transcript, oldest first.
    async fn transcript(&self, session_id: Uuid) -> Result<Vec<ChatTurn>>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_turns(rows: Vec<TranscriptRow>) -> Result<Vec<ChatTurn>> {
    rows.into_iter()
        .map(|row| {
            Ok(ChatTurn {
                role: row.role.parse()?,
                text: row.content,
            })
        })
        .collect()
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load_session(&self, session_id: Uuid) -> Result<Option<SessionState>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM interview_sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load session")?;

        row.map(|r| {
            serde_json::from_value(r.state)
                .with_context(|| format!("corrupt state for session {session_id}"))
        })
        .transpose()
    }

    async fn save_session(&self, session_id: Uuid, state: &SessionState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interview_sessions (session_id, domain, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id) DO UPDATE
            SET domain = EXCLUDED.domain,
                state = EXCLUDED.state,
                updated_at = NOW()
            "#,
        )
        .bind(session_id)
        .bind(state.domain.as_str())
        .bind(Json(state))
        .execute(&self.pool)
        .await
        .context("failed to save session")?;
        Ok(())
    }

    async fn commit_record(&self, session_id: Uuid, domain: Domain, record: &Value) -> Result<()> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO interview_items (session_id, domain, record)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id) DO UPDATE
            SET domain = EXCLUDED.domain,
                record = EXCLUDED.record,
                committed_at = NOW()
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(domain.as_str())
        .bind(record)
        .fetch_one(&self.pool)
        .await
        .context("failed to commit item")?;

        debug!("Committed {} item for session {} at {}", row.domain, row.session_id, row.committed_at);
        Ok(())
    }

    async fn append_transcript(&self, session_id: Uuid, role: Role, text: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO interview_transcript (session_id, role, content) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(text)
        .execute(&self.pool)
        .await
        .context("failed to append transcript")?;
        Ok(())
    }

    async fn recent_transcript(&self, session_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>> {
        let rows = sqlx::query_as::<_, TranscriptRow>(
            r#"
            SELECT * FROM (
                SELECT * FROM interview_transcript
                WHERE session_id = $1
                ORDER BY id DESC
                LIMIT $2
            ) recent
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("failed to read transcript")?;

        to_turns(rows)
    }

    async fn transcript(&self, session_id: Uuid) -> Result<Vec<ChatTurn>> {
        let rows = sqlx::query_as::<_, TranscriptRow>(
            "SELECT * FROM interview_transcript WHERE session_id = $1 ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to read transcript")?;

        to_turns(rows)
    }
}
