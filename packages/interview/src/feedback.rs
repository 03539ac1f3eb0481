// ABOUTME: Feedback finalizer producing the single closing report for an ended conversation
// ABOUTME: Gated on ENDED status; a second request returns the stored report without regenerating

use std::sync::Arc;

use rehearse_core::{generate_id, now_rfc3339};
use rehearse_storage::is_unique_violation;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::error::{InterviewError, Result};
use crate::generation::GenerationService;
use crate::store::ConversationStore;
use crate::types::{Feedback, Turn};

/// Serialize a transcript as `ROLE: content` lines for the feedback prompt
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct FeedbackFinalizer {
    conversations: ConversationStore,
    generation: Arc<GenerationService>,
}

impl FeedbackFinalizer {
    pub fn new(conversations: ConversationStore, generation: Arc<GenerationService>) -> Self {
        Self {
            conversations,
            generation,
        }
    }

    fn pool(&self) -> &SqlitePool {
        self.conversations.pool()
    }

    /// Generate and persist the feedback for an ended conversation.
    ///
    /// Feedback is created at most once per conversation; later calls return
    /// the stored record.
    pub async fn generate(&self, conversation_id: &str) -> Result<Feedback> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| InterviewError::ConversationNotFound(conversation_id.to_string()))?;

        if !conversation.status.is_ended() {
            return Err(InterviewError::ConversationNotEnded(conversation.id));
        }

        if let Some(existing) = self.find(&conversation.id).await? {
            info!("Returning stored feedback for conversation {}", conversation.id);
            return Ok(existing);
        }

        let turns = self.conversations.turns(&conversation.id).await?;
        if turns.is_empty() {
            return Err(InterviewError::InvalidInput(format!(
                "conversation {} has no turns",
                conversation.id
            )));
        }

        let transcript = render_transcript(&turns);
        let result = self
            .generation
            .final_feedback(&conversation.id, &transcript)
            .await?;

        let feedback = Feedback {
            id: generate_id(),
            conversation_id: conversation.id.clone(),
            content: result.content,
            strengths: result.strengths,
            improvement_points: result.improvement_points,
            overall_impression: result.overall_impression,
            additional_advice: result.additional_advice,
            created_at: now_rfc3339(),
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO feedback (
                id, conversation_id, content, strengths, improvement_points,
                overall_impression, additional_advice, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&feedback.id)
        .bind(&feedback.conversation_id)
        .bind(&feedback.content)
        .bind(&feedback.strengths)
        .bind(&feedback.improvement_points)
        .bind(&feedback.overall_impression)
        .bind(&feedback.additional_advice)
        .bind(&feedback.created_at)
        .execute(self.pool())
        .await;

        match inserted {
            Ok(_) => {
                info!("Stored feedback {} for conversation {}", feedback.id, conversation.id);
                Ok(feedback)
            }
            // A concurrent finalize won; its record is the one that counts
            Err(e) if is_unique_violation(&e) => self
                .find(&conversation.id)
                .await?
                .ok_or(InterviewError::Database(e)),
            Err(e) => {
                error!("Failed to store feedback for {}: {}", conversation.id, e);
                Err(InterviewError::Database(e))
            }
        }
    }

    /// Stored feedback for a conversation
    pub async fn get(&self, conversation_id: &str) -> Result<Feedback> {
        self.find(conversation_id)
            .await?
            .ok_or_else(|| InterviewError::FeedbackNotFound(conversation_id.to_string()))
    }

    async fn find(&self, conversation_id: &str) -> Result<Option<Feedback>> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, content, strengths, improvement_points,
                   overall_impression, additional_advice, created_at
            FROM feedback
            WHERE conversation_id = ?
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(feedback_from_row).transpose()
    }
}

fn feedback_from_row(row: &SqliteRow) -> Result<Feedback> {
    Ok(Feedback {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        content: row.try_get("content")?,
        strengths: row.try_get("strengths")?,
        improvement_points: row.try_get("improvement_points")?,
        overall_impression: row.try_get("overall_impression")?,
        additional_advice: row.try_get("additional_advice")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_core::TurnRole;

    fn turn(position: i64, role: TurnRole, content: &str) -> Turn {
        Turn {
            id: format!("turn-{:04}", position),
            conversation_id: "conv-0001".to_string(),
            position,
            role,
            content: content.to_string(),
            evaluator_note: None,
            purpose: None,
            created_at: "2026-10-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_render_transcript_tags_each_line_with_role() {
        let turns = vec![
            turn(0, TurnRole::Prompt, "Why did you choose PostgreSQL?"),
            turn(1, TurnRole::Response, "For ACID guarantees"),
        ];

        assert_eq!(
            render_transcript(&turns),
            "PROMPT: Why did you choose PostgreSQL?\nRESPONSE: For ACID guarantees"
        );
    }
}
