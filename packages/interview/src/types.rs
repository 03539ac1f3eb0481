// ABOUTME: Type definitions for interview conversations, turns, feedback and question sets
// ABOUTME: Plain records reconstructed from SQLite rows; relationships are held by id

use rehearse_core::{ConversationStatus, Purpose, QuestionCategory, TurnRole};
use serde::{Deserialize, Serialize};

/// One interview thread anchored to a seed question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub seed_question_id: String,
    pub seed_question_text: String,
    pub category: QuestionCategory,
    pub status: ConversationStatus,
    pub turn_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// One role-tagged message in a conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub id: String,
    pub conversation_id: String,
    pub position: i64,
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    pub created_at: String,
}

/// A conversation together with its ordered transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub turns: Vec<Turn>,
    /// Closing message, present once the conversation has ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<String>,
}

impl ConversationView {
    pub fn status(&self) -> ConversationStatus {
        self.conversation.status
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Closing report for an ended conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub strengths: String,
    pub improvement_points: String,
    pub overall_impression: String,
    pub additional_advice: String,
    pub created_at: String,
}

/// The seed a conversation is started from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedQuestion {
    pub id: String,
    pub text: String,
    pub category: QuestionCategory,
}

/// Question catalog answer for a (category, id) lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub question_text: String,
    pub purpose: Purpose,
}

/// Questions generated from one portfolio text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionSet {
    pub id: String,
    pub original_text: String,
    pub questions: Vec<Question>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub question_set_id: String,
    pub category: QuestionCategory,
    /// Technology name for TECH_STACK questions, project name for PROJECT questions
    pub subject: String,
    pub text: String,
    pub purpose: Purpose,
    pub position: i64,
    /// Most recent conversation seeded from this question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub created_at: String,
}

/// Limit/offset window for conversation listings. The default returns everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// SQLite treats a negative LIMIT as "no limit"
    pub(crate) fn sql_limit(&self) -> i64 {
        self.limit.map(i64::from).unwrap_or(-1)
    }
}
