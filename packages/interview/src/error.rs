// ABOUTME: Error types for the interview package
// ABOUTME: Caller-facing InterviewError plus the internal GenerationError of the generation layer

use rehearse_core::ParseEnumError;
use rehearse_prompts::PromptError;
use rehearse_storage::StorageError;
use thiserror::Error;

/// Failures of a single generation operation. Display output never echoes
/// the model's raw text; `Parse::raw` is kept for logging only.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model response is not valid JSON: {message}")]
    Parse { raw: String, message: String },

    #[error("Model response failed validation: {0}")]
    Validation(String),

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Generation provider error: {0}")]
    Provider(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl GenerationError {
    /// Whether another attempt with the same inputs could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::Parse { .. } | GenerationError::Validation(_) | GenerationError::Timeout(_)
        )
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

#[derive(Error, Debug)]
pub enum InterviewError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Feedback not found for conversation: {0}")]
    FeedbackNotFound(String),

    #[error("Conversation has already ended: {0}")]
    ConversationAlreadyEnded(String),

    #[error("Conversation has not ended yet: {0}")]
    ConversationNotEnded(String),

    #[error("Seed question {seed_question_id} already has an ongoing conversation: {conversation_id}")]
    DuplicateSeed {
        seed_question_id: String,
        conversation_id: String,
    },

    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    #[error("Question set not found: {0}")]
    QuestionSetNotFound(String),

    #[error("Conversation {0} was modified concurrently, reload and try again")]
    ConcurrentModification(String),

    #[error("Generation failed, please try again")]
    Generation(#[from] GenerationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid stored value: {0}")]
    InvalidRecord(#[from] ParseEnumError),

    #[error("Prompt configuration error: {0}")]
    Prompts(#[from] PromptError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl InterviewError {
    /// Whether the caller may resubmit the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InterviewError::Generation(_) | InterviewError::ConcurrentModification(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InterviewError>;
