// ABOUTME: Question-set generation from portfolio text and the persisted question catalog
// ABOUTME: Stores generated questions and eagerly opens one conversation per question

use std::sync::Arc;

use async_trait::async_trait;
use rehearse_core::{generate_id, now_rfc3339, QuestionCategory};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{error, info, warn};

use crate::contracts::{GeneratedQuestion, QuestionSetResult};
use crate::conversation::ConversationEngine;
use crate::error::{InterviewError, Result};
use crate::generation::GenerationService;
use crate::types::{CatalogEntry, Question, QuestionSet, SeedQuestion};

/// Source of seed questions for new conversations
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Look up a question by id; a category mismatch counts as not found
    async fn lookup(&self, category: QuestionCategory, question_id: &str) -> Result<Option<CatalogEntry>>;
}

pub struct QuestionService {
    pool: SqlitePool,
    generation: Arc<GenerationService>,
    conversations: Arc<ConversationEngine>,
}

impl QuestionService {
    pub fn new(
        pool: SqlitePool,
        generation: Arc<GenerationService>,
        conversations: Arc<ConversationEngine>,
    ) -> Self {
        Self {
            pool,
            generation,
            conversations,
        }
    }

    /// Generate, persist and seed conversations for a portfolio's question set
    pub async fn generate_question_set(&self, portfolio: &str) -> Result<QuestionSet> {
        let portfolio = portfolio.trim();
        if portfolio.is_empty() {
            return Err(InterviewError::InvalidInput("portfolio text is empty".to_string()));
        }

        let generated = self.generation.question_set(portfolio).await?;
        let mut question_set = self.persist(portfolio, &generated).await?;

        info!(
            "Generated question set {} with {} questions",
            question_set.id,
            question_set.questions.len()
        );

        // The set is already committed; a question whose conversation fails to
        // open keeps `conversation_id = None` and can be started later on demand
        for question in &mut question_set.questions {
            let seed = SeedQuestion {
                id: question.id.clone(),
                text: question.text.clone(),
                category: question.category,
            };
            match self.conversations.start(seed).await {
                Ok(view) => question.conversation_id = Some(view.conversation.id),
                Err(e) => warn!(
                    "Could not open a conversation for question {} in set {}: {}",
                    question.id, question_set.id, e
                ),
            }
        }

        Ok(question_set)
    }

    async fn persist(&self, portfolio: &str, generated: &QuestionSetResult) -> Result<QuestionSet> {
        let set_id = generate_id();
        let created_at = now_rfc3339();

        let mut entries: Vec<(QuestionCategory, &str, &GeneratedQuestion)> = Vec::new();
        for tech in &generated.tech_stack {
            for q in &tech.questions {
                entries.push((QuestionCategory::TechStack, tech.stack.as_str(), q));
            }
        }
        for project in &generated.projects {
            for q in &project.questions {
                entries.push((QuestionCategory::Project, project.project_name.as_str(), q));
            }
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO question_sets (id, original_text, created_at) VALUES (?, ?, ?)")
            .bind(&set_id)
            .bind(portfolio)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert question set: {}", e);
                InterviewError::Database(e)
            })?;

        let mut questions = Vec::with_capacity(entries.len());
        for (position, (category, subject, generated_question)) in entries.into_iter().enumerate() {
            let question = Question {
                id: generate_id(),
                question_set_id: set_id.clone(),
                category,
                subject: subject.to_string(),
                text: generated_question.text.clone(),
                purpose: generated_question.purpose,
                position: position as i64,
                conversation_id: None,
                created_at: created_at.clone(),
            };

            sqlx::query(
                r#"
                INSERT INTO questions (
                    id, question_set_id, category, subject, question_text, purpose, position, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&question.id)
            .bind(&question.question_set_id)
            .bind(question.category.as_str())
            .bind(&question.subject)
            .bind(&question.text)
            .bind(question.purpose.as_str())
            .bind(question.position)
            .bind(&question.created_at)
            .execute(&mut *tx)
            .await?;

            questions.push(question);
        }

        tx.commit().await?;

        Ok(QuestionSet {
            id: set_id,
            original_text: portfolio.to_string(),
            questions,
            created_at,
        })
    }

    /// Most recently generated question set
    pub async fn latest(&self) -> Result<QuestionSet> {
        let row = sqlx::query(
            "SELECT id, original_text, created_at FROM question_sets ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| InterviewError::QuestionSetNotFound("no question set has been generated".to_string()))?;

        self.hydrate(&row).await
    }

    pub async fn get(&self, question_set_id: &str) -> Result<QuestionSet> {
        let row = sqlx::query("SELECT id, original_text, created_at FROM question_sets WHERE id = ?")
            .bind(question_set_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| InterviewError::QuestionSetNotFound(question_set_id.to_string()))?;

        self.hydrate(&row).await
    }

    async fn hydrate(&self, row: &SqliteRow) -> Result<QuestionSet> {
        let id: String = row.try_get("id")?;

        let rows = sqlx::query(
            r#"
            SELECT q.id, q.question_set_id, q.category, q.subject, q.question_text, q.purpose,
                   q.position, q.created_at,
                   (SELECT c.id FROM conversations c
                    WHERE c.seed_question_id = q.id
                    ORDER BY c.created_at DESC, c.rowid DESC LIMIT 1) AS conversation_id
            FROM questions q
            WHERE q.question_set_id = ?
            ORDER BY q.position ASC
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let questions = rows.iter().map(question_from_row).collect::<Result<Vec<_>>>()?;

        Ok(QuestionSet {
            id,
            original_text: row.try_get("original_text")?,
            questions,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl QuestionCatalog for QuestionService {
    async fn lookup(&self, category: QuestionCategory, question_id: &str) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query("SELECT question_text, purpose FROM questions WHERE id = ? AND category = ?")
            .bind(question_id)
            .bind(category.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(CatalogEntry {
                question_text: row.try_get("question_text")?,
                purpose: row.try_get::<String, _>("purpose")?.parse()?,
            })),
            None => Ok(None),
        }
    }
}

fn question_from_row(row: &SqliteRow) -> Result<Question> {
    Ok(Question {
        id: row.try_get("id")?,
        question_set_id: row.try_get("question_set_id")?,
        category: row.try_get::<String, _>("category")?.parse()?,
        subject: row.try_get("subject")?,
        text: row.try_get("question_text")?,
        purpose: row.try_get::<String, _>("purpose")?.parse()?,
        position: row.try_get("position")?,
        conversation_id: row.try_get("conversation_id")?,
        created_at: row.try_get("created_at")?,
    })
}
