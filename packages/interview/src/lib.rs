// ABOUTME: Rehearse interview library - question sets, conversations and closing feedback
// ABOUTME: Wraps model calls in a cached, validated generation layer and persists transcripts in SQLite

pub mod contracts;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod generation;
pub mod questions;
pub mod service;
pub mod store;
pub mod types;

pub use contracts::{
    FeedbackResult, FollowUpResult, GeneratedQuestion, ProjectQuestions, QuestionSetResult,
    TechQuestions,
};
pub use conversation::{ConversationEngine, COMPLETION_MESSAGE};
pub use error::{GenerationError, GenerationResult, InterviewError, Result};
pub use feedback::{render_transcript, FeedbackFinalizer};
pub use generation::{FollowUpRequest, GenerationService, GenerationSettings};
pub use questions::{QuestionCatalog, QuestionService};
pub use service::{cache_from_config, InterviewService};
pub use store::ConversationStore;
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{InterviewError, Result};
    pub use crate::service::InterviewService;
    pub use crate::types::{
        Conversation, ConversationView, Feedback, Page, Question, QuestionSet, SeedQuestion, Turn,
    };
    pub use rehearse_core::{ConversationStatus, Purpose, QuestionCategory, TurnRole};
}
