// ABOUTME: Conversation state machine: start from a seed, advance turn by turn, close at the turn budget
// ABOUTME: Sole authority for turn sequencing; generation happens before any turn is written

use std::sync::Arc;

use rehearse_config::SeedPolicy;
use rehearse_core::{ConversationStatus, TurnRole};
use rehearse_storage::is_unique_violation;
use tracing::{info, warn};

use crate::error::{InterviewError, Result};
use crate::generation::{FollowUpRequest, GenerationService};
use crate::store::{ConversationStore, NewTurn};
use crate::types::{Conversation, ConversationView, Page, SeedQuestion, Turn};

/// Closing prompt appended when a conversation reaches its turn budget
pub const COMPLETION_MESSAGE: &str =
    "Thanks, that gives me a good picture. Let's move on to the next question.";

pub struct ConversationEngine {
    store: ConversationStore,
    generation: Arc<GenerationService>,
    max_turns: i64,
    seed_policy: SeedPolicy,
}

impl ConversationEngine {
    /// `max_turns` counts every turn (seed prompt included) after which the
    /// conversation closes instead of generating another follow-up.
    pub fn new(
        store: ConversationStore,
        generation: Arc<GenerationService>,
        max_turns: usize,
        seed_policy: SeedPolicy,
    ) -> Self {
        Self {
            store,
            generation,
            max_turns: max_turns as i64,
            seed_policy,
        }
    }

    /// Start a conversation whose first turn is the seed question.
    ///
    /// With [`SeedPolicy::Reuse`] an existing ongoing conversation for the same
    /// seed is returned unchanged; with [`SeedPolicy::Reject`] it is an error.
    pub async fn start(&self, seed: SeedQuestion) -> Result<ConversationView> {
        if seed.id.trim().is_empty() {
            return Err(InterviewError::InvalidInput("seed question id is empty".to_string()));
        }
        if seed.text.trim().is_empty() {
            return Err(InterviewError::InvalidInput(format!(
                "seed question {} has no text",
                seed.id
            )));
        }

        if let Some(existing) = self.store.find_ongoing_by_seed(&seed.id).await? {
            return self.resolve_existing(existing).await;
        }

        match self.store.create(&seed).await {
            Ok((conversation, seed_turn)) => Ok(ConversationView {
                conversation,
                turns: vec![seed_turn],
                completion_message: None,
            }),
            // Lost a race with another start for the same seed
            Err(InterviewError::Database(e)) if is_unique_violation(&e) => {
                let existing = self
                    .store
                    .find_ongoing_by_seed(&seed.id)
                    .await?
                    .ok_or(InterviewError::Database(e))?;
                self.resolve_existing(existing).await
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_existing(&self, existing: Conversation) -> Result<ConversationView> {
        match self.seed_policy {
            SeedPolicy::Reuse => {
                info!(
                    "Reusing ongoing conversation {} for seed question {}",
                    existing.id, existing.seed_question_id
                );
                self.view(existing).await
            }
            SeedPolicy::Reject => Err(InterviewError::DuplicateSeed {
                seed_question_id: existing.seed_question_id,
                conversation_id: existing.id,
            }),
        }
    }

    /// Record the candidate's answer and either ask a follow-up or close the conversation
    pub async fn advance(&self, conversation_id: &str, user_response: &str) -> Result<ConversationView> {
        let user_response = user_response.trim();
        if user_response.is_empty() {
            return Err(InterviewError::InvalidInput("response text is empty".to_string()));
        }

        let conversation = self.load(conversation_id).await?;
        if conversation.status.is_ended() {
            return Err(InterviewError::ConversationAlreadyEnded(conversation.id));
        }

        let count_after_response = conversation.turn_count + 1;

        if count_after_response >= self.max_turns {
            info!(
                "Conversation {} reached {} turns, closing",
                conversation.id, count_after_response
            );
            self.store
                .append_turns(
                    &conversation.id,
                    conversation.turn_count,
                    &[
                        NewTurn::response(user_response),
                        NewTurn::prompt(COMPLETION_MESSAGE),
                    ],
                    true,
                )
                .await?;
        } else {
            let turns = self.store.turns(&conversation.id).await?;
            let last_prompt = turns
                .iter()
                .rev()
                .find(|t| t.role == TurnRole::Prompt)
                .map(|t| t.content.as_str())
                .unwrap_or(conversation.seed_question_text.as_str());

            let follow_up = self
                .generation
                .follow_up(&FollowUpRequest {
                    seed_question_id: &conversation.seed_question_id,
                    seed_question: &conversation.seed_question_text,
                    last_prompt,
                    user_response,
                })
                .await
                .map_err(|e| {
                    warn!("Follow-up generation failed for {}: {}", conversation.id, e);
                    InterviewError::Generation(e)
                })?;

            self.store
                .append_turns(
                    &conversation.id,
                    conversation.turn_count,
                    &[
                        NewTurn::response(user_response),
                        NewTurn::prompt(follow_up.question.text)
                            .with_evaluation(follow_up.evaluator_feedback, follow_up.question.purpose),
                    ],
                    false,
                )
                .await?;
        }

        self.get(&conversation.id).await
    }

    /// Read-only transcript and status
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationView> {
        let conversation = self.load(conversation_id).await?;
        self.view(conversation).await
    }

    /// Conversations with full transcripts, newest first
    pub async fn list(&self, page: Page) -> Result<Vec<ConversationView>> {
        let conversations = self.store.list(page).await?;
        self.views(conversations).await
    }

    /// Conversations seeded from one question set, in question order
    pub async fn list_for_question_set(&self, question_set_id: &str) -> Result<Vec<ConversationView>> {
        let conversations = self.store.list_for_question_set(question_set_id).await?;
        self.views(conversations).await
    }

    async fn load(&self, conversation_id: &str) -> Result<Conversation> {
        self.store
            .get(conversation_id)
            .await?
            .ok_or_else(|| InterviewError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn view(&self, conversation: Conversation) -> Result<ConversationView> {
        let turns: Vec<Turn> = self.store.turns(&conversation.id).await?;
        let completion_message = match conversation.status {
            ConversationStatus::Ended => Some(COMPLETION_MESSAGE.to_string()),
            ConversationStatus::Ongoing => None,
        };

        Ok(ConversationView {
            conversation,
            turns,
            completion_message,
        })
    }

    async fn views(&self, conversations: Vec<Conversation>) -> Result<Vec<ConversationView>> {
        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            views.push(self.view(conversation).await?);
        }
        Ok(views)
    }
}
