// ABOUTME: SQLite persistence for conversations and their ordered turns
// ABOUTME: Turn appends are guarded by an optimistic turn_count check inside one transaction

use rehearse_core::{generate_id, now_rfc3339, ConversationStatus, Purpose, TurnRole};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::{InterviewError, Result};
use crate::types::{Conversation, Page, SeedQuestion, Turn};

const CONVERSATION_COLUMNS: &str = "id, seed_question_id, seed_question_text, category, status, turn_count, created_at, updated_at";

/// A turn that has not been written yet
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub role: TurnRole,
    pub content: String,
    pub evaluator_note: Option<String>,
    pub purpose: Option<Purpose>,
}

impl NewTurn {
    pub fn prompt(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Prompt,
            content: content.into(),
            evaluator_note: None,
            purpose: None,
        }
    }

    pub fn response(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Response,
            content: content.into(),
            evaluator_note: None,
            purpose: None,
        }
    }

    pub fn with_evaluation(mut self, evaluator_note: impl Into<String>, purpose: Purpose) -> Self {
        self.evaluator_note = Some(evaluator_note.into());
        self.purpose = Some(purpose);
        self
    }
}

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new ONGOING conversation with the seed question as its first turn.
    /// Fails with a database unique violation if the seed already has an ongoing conversation.
    pub async fn create(&self, seed: &SeedQuestion) -> Result<(Conversation, Turn)> {
        let id = generate_id();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, seed_question_id, seed_question_text, category, status, turn_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&seed.id)
        .bind(&seed.text)
        .bind(seed.category.as_str())
        .bind(ConversationStatus::Ongoing.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let seed_turn = insert_turn(&mut tx, &id, 0, &NewTurn::prompt(seed.text.clone())).await?;

        tx.commit().await?;

        info!("Created conversation {} for seed question {}", id, seed.id);

        let conversation = Conversation {
            id,
            seed_question_id: seed.id.clone(),
            seed_question_text: seed.text.clone(),
            category: seed.category,
            status: ConversationStatus::Ongoing,
            turn_count: 1,
            created_at: now.clone(),
            updated_at: now,
        };

        Ok((conversation, seed_turn))
    }

    pub async fn get(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE id = ?",
            CONVERSATION_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load conversation {}: {}", conversation_id, e);
            InterviewError::Database(e)
        })?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    pub async fn find_ongoing_by_seed(&self, seed_question_id: &str) -> Result<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE seed_question_id = ? AND status = 'ONGOING'",
            CONVERSATION_COLUMNS
        ))
        .bind(seed_question_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    /// Turns in transcript order; position ties fall back to creation time
    pub async fn turns(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, position, role, content, evaluator_note, purpose, created_at
            FROM turns
            WHERE conversation_id = ?
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load turns for {}: {}", conversation_id, e);
            InterviewError::Database(e)
        })?;

        rows.iter().map(turn_from_row).collect()
    }

    /// Conversations newest first
    pub async fn list(&self, page: Page) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM conversations ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            CONVERSATION_COLUMNS
        ))
        .bind(page.sql_limit())
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(conversation_from_row).collect()
    }

    /// Conversations seeded from a question set, in question order
    pub async fn list_for_question_set(&self, question_set_id: &str) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.seed_question_id, c.seed_question_text, c.category, c.status,
                   c.turn_count, c.created_at, c.updated_at
            FROM conversations c
            JOIN questions q ON q.id = c.seed_question_id
            WHERE q.question_set_id = ?
            ORDER BY q.position ASC, c.created_at ASC
            "#,
        )
        .bind(question_set_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(conversation_from_row).collect()
    }

    /// Append `turns` after exactly `expected_turn_count` existing turns, optionally
    /// closing the conversation, as one atomic unit.
    ///
    /// The UPDATE only matches while the conversation is still ONGOING with the
    /// expected count, so a caller working from a stale read appends nothing.
    pub async fn append_turns(
        &self,
        conversation_id: &str,
        expected_turn_count: i64,
        turns: &[NewTurn],
        close: bool,
    ) -> Result<Vec<Turn>> {
        let new_count = expected_turn_count + turns.len() as i64;
        let status = if close {
            ConversationStatus::Ended
        } else {
            ConversationStatus::Ongoing
        };

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE conversations
            SET turn_count = ?, status = ?, updated_at = ?
            WHERE id = ? AND turn_count = ? AND status = 'ONGOING'
            "#,
        )
        .bind(new_count)
        .bind(status.as_str())
        .bind(now_rfc3339())
        .bind(conversation_id)
        .bind(expected_turn_count)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM conversations WHERE id = ?")
                    .bind(conversation_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(match current.as_deref() {
                None => InterviewError::ConversationNotFound(conversation_id.to_string()),
                Some("ENDED") => InterviewError::ConversationAlreadyEnded(conversation_id.to_string()),
                Some(_) => {
                    warn!(
                        "Conversation {} changed since turn {} was read",
                        conversation_id, expected_turn_count
                    );
                    InterviewError::ConcurrentModification(conversation_id.to_string())
                }
            });
        }

        let mut written = Vec::with_capacity(turns.len());
        for (offset, turn) in turns.iter().enumerate() {
            let position = expected_turn_count + offset as i64;
            written.push(insert_turn(&mut tx, conversation_id, position, turn).await?);
        }

        tx.commit().await?;

        debug!(
            "Appended {} turn(s) to {} (turn_count {} -> {}, status {})",
            turns.len(),
            conversation_id,
            expected_turn_count,
            new_count,
            status
        );

        Ok(written)
    }
}

async fn insert_turn(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    conversation_id: &str,
    position: i64,
    turn: &NewTurn,
) -> Result<Turn> {
    let id = generate_id();
    let created_at = now_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO turns (id, conversation_id, position, role, content, evaluator_note, purpose, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(conversation_id)
    .bind(position)
    .bind(turn.role.as_str())
    .bind(&turn.content)
    .bind(&turn.evaluator_note)
    .bind(turn.purpose.map(|p| p.as_str()))
    .bind(&created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!("Failed to insert turn {} of {}: {}", position, conversation_id, e);
        InterviewError::Database(e)
    })?;

    Ok(Turn {
        id,
        conversation_id: conversation_id.to_string(),
        position,
        role: turn.role,
        content: turn.content.clone(),
        evaluator_note: turn.evaluator_note.clone(),
        purpose: turn.purpose,
        created_at,
    })
}

fn conversation_from_row(row: &SqliteRow) -> Result<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        seed_question_id: row.try_get("seed_question_id")?,
        seed_question_text: row.try_get("seed_question_text")?,
        category: row.try_get::<String, _>("category")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        turn_count: row.try_get("turn_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn turn_from_row(row: &SqliteRow) -> Result<Turn> {
    Ok(Turn {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        position: row.try_get("position")?,
        role: row.try_get::<String, _>("role")?.parse()?,
        content: row.try_get("content")?,
        evaluator_note: row.try_get("evaluator_note")?,
        purpose: row
            .try_get::<Option<String>, _>("purpose")?
            .map(|p| p.parse::<Purpose>())
            .transpose()?,
        created_at: row.try_get("created_at")?,
    })
}
