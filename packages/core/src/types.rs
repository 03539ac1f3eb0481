// ABOUTME: Shared enums for interview questions, turns and conversation lifecycle
// ABOUTME: String codes here are the values stored in SQLite and exchanged with the model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Intent of an interview question. Every generated question carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    TechChoice,
    Implementation,
    ProblemSolving,
    OutcomeEvaluation,
}

impl Purpose {
    pub const ALL: [Purpose; 4] = [
        Purpose::TechChoice,
        Purpose::Implementation,
        Purpose::ProblemSolving,
        Purpose::OutcomeEvaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::TechChoice => "TECH_CHOICE",
            Purpose::Implementation => "IMPLEMENTATION",
            Purpose::ProblemSolving => "PROBLEM_SOLVING",
            Purpose::OutcomeEvaluation => "OUTCOME_EVALUATION",
        }
    }

    /// Human readable label, also accepted when parsing model output
    pub fn label(&self) -> &'static str {
        match self {
            Purpose::TechChoice => "technology choice",
            Purpose::Implementation => "implementation approach",
            Purpose::ProblemSolving => "problem solving",
            Purpose::OutcomeEvaluation => "outcome evaluation",
        }
    }
}

impl FromStr for Purpose {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Purpose::ALL
            .into_iter()
            .find(|p| p.as_str() == trimmed || p.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEnumError::new("purpose", s))
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which catalog a seed question came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionCategory {
    TechStack,
    Project,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::TechStack => "TECH_STACK",
            QuestionCategory::Project => "PROJECT",
        }
    }
}

impl FromStr for QuestionCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TECH_STACK" | "TECHSTACK" => Ok(QuestionCategory::TechStack),
            "PROJECT" => Ok(QuestionCategory::Project),
            _ => Err(ParseEnumError::new("question category", s)),
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who authored a turn: the interviewer (PROMPT) or the candidate (RESPONSE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnRole {
    Prompt,
    Response,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::Prompt => "PROMPT",
            TurnRole::Response => "RESPONSE",
        }
    }
}

impl FromStr for TurnRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROMPT" => Ok(TurnRole::Prompt),
            "RESPONSE" => Ok(TurnRole::Response),
            _ => Err(ParseEnumError::new("turn role", s)),
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation lifecycle. Only ONGOING -> ENDED is a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    Ongoing,
    Ended,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Ongoing => "ONGOING",
            ConversationStatus::Ended => "ENDED",
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, ConversationStatus::Ended)
    }
}

impl FromStr for ConversationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONGOING" => Ok(ConversationStatus::Ongoing),
            "ENDED" => Ok(ConversationStatus::Ended),
            _ => Err(ParseEnumError::new("conversation status", s)),
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
