// ABOUTME: InterviewService facade wiring generation, conversations, feedback and questions together
// ABOUTME: Exposes the transport-agnostic operations; all capabilities are injected at construction

use std::sync::Arc;

use rehearse_ai::TextGenerator;
use rehearse_cache::{KeyValueCache, MemoryCache, SqliteCache};
use rehearse_config::{CacheBackend, InterviewConfig};
use rehearse_core::QuestionCategory;
use rehearse_prompts::PromptManager;
use sqlx::SqlitePool;
use tracing::info;

use crate::conversation::ConversationEngine;
use crate::error::{InterviewError, Result};
use crate::feedback::FeedbackFinalizer;
use crate::generation::{GenerationService, GenerationSettings};
use crate::questions::{QuestionCatalog, QuestionService};
use crate::store::ConversationStore;
use crate::types::{ConversationView, Feedback, Page, QuestionSet, SeedQuestion};

/// Build the generation cache selected by `config`, if any
pub fn cache_from_config(config: &InterviewConfig, pool: &SqlitePool) -> Option<Arc<dyn KeyValueCache>> {
    match config.cache_backend {
        CacheBackend::Memory => {
            info!("Using in-memory generation cache ({} entries)", config.cache_capacity);
            Some(Arc::new(MemoryCache::new(config.cache_capacity)))
        }
        CacheBackend::Sqlite => {
            info!("Using SQLite generation cache");
            Some(Arc::new(SqliteCache::new(pool.clone())))
        }
        CacheBackend::Disabled => {
            info!("Generation cache disabled");
            None
        }
    }
}

pub struct InterviewService {
    conversations: Arc<ConversationEngine>,
    feedback: FeedbackFinalizer,
    questions: QuestionService,
}

impl InterviewService {
    /// Wire the service using the embedded prompts, overridden from `config.prompts_dir` when set
    pub fn new(
        pool: SqlitePool,
        generator: Arc<dyn TextGenerator>,
        cache: Option<Arc<dyn KeyValueCache>>,
        config: &InterviewConfig,
    ) -> Result<Self> {
        let prompts = match &config.prompts_dir {
            Some(dir) => PromptManager::with_overrides(dir)?,
            None => PromptManager::new()?,
        };

        Ok(Self::with_prompts(pool, generator, cache, prompts, config))
    }

    pub fn with_prompts(
        pool: SqlitePool,
        generator: Arc<dyn TextGenerator>,
        cache: Option<Arc<dyn KeyValueCache>>,
        prompts: PromptManager,
        config: &InterviewConfig,
    ) -> Self {
        let generation = Arc::new(GenerationService::new(
            generator,
            cache,
            prompts,
            GenerationSettings::from(config),
        ));
        let store = ConversationStore::new(pool.clone());

        let conversations = Arc::new(ConversationEngine::new(
            store.clone(),
            generation.clone(),
            config.max_turns,
            config.seed_policy,
        ));
        let feedback = FeedbackFinalizer::new(store, generation.clone());
        let questions = QuestionService::new(pool, generation, conversations.clone());

        Self {
            conversations,
            feedback,
            questions,
        }
    }

    pub fn conversations(&self) -> &ConversationEngine {
        &self.conversations
    }

    pub fn feedback(&self) -> &FeedbackFinalizer {
        &self.feedback
    }

    pub fn questions(&self) -> &QuestionService {
        &self.questions
    }

    pub async fn generate_question_set(&self, portfolio: &str) -> Result<QuestionSet> {
        self.questions.generate_question_set(portfolio).await
    }

    pub async fn latest_question_set(&self) -> Result<QuestionSet> {
        self.questions.latest().await
    }

    pub async fn question_set(&self, question_set_id: &str) -> Result<QuestionSet> {
        self.questions.get(question_set_id).await
    }

    /// Start (or with the reuse policy, resume) a conversation on a catalog question
    pub async fn start_conversation(
        &self,
        category: QuestionCategory,
        seed_question_id: &str,
    ) -> Result<ConversationView> {
        let entry = self
            .questions
            .lookup(category, seed_question_id)
            .await?
            .ok_or_else(|| InterviewError::QuestionNotFound(format!("{} {}", category, seed_question_id)))?;

        self.conversations
            .start(SeedQuestion {
                id: seed_question_id.to_string(),
                text: entry.question_text,
                category,
            })
            .await
    }

    pub async fn advance_conversation(&self, conversation_id: &str, user_response: &str) -> Result<ConversationView> {
        self.conversations.advance(conversation_id, user_response).await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationView> {
        self.conversations.get(conversation_id).await
    }

    pub async fn list_conversations(&self, page: Page) -> Result<Vec<ConversationView>> {
        self.conversations.list(page).await
    }

    pub async fn list_conversations_for_set(&self, question_set_id: &str) -> Result<Vec<ConversationView>> {
        self.conversations.list_for_question_set(question_set_id).await
    }

    pub async fn generate_feedback(&self, conversation_id: &str) -> Result<Feedback> {
        self.feedback.generate(conversation_id).await
    }

    pub async fn get_feedback(&self, conversation_id: &str) -> Result<Feedback> {
        self.feedback.get(conversation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_storage::connect_in_memory;

    #[tokio::test]
    async fn test_cache_backend_selection() {
        let pool = connect_in_memory().await.unwrap();

        let mut config = InterviewConfig::default();
        assert!(cache_from_config(&config, &pool).is_some());

        config.cache_backend = CacheBackend::Sqlite;
        assert!(cache_from_config(&config, &pool).is_some());

        config.cache_backend = CacheBackend::Disabled;
        assert!(cache_from_config(&config, &pool).is_none());
    }
}
