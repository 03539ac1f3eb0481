// ABOUTME: Shared fixtures for interview integration tests
// ABOUTME: Mock text generator, canned model responses and in-memory service setup

#![allow(dead_code)]

use std::sync::Arc;

use mockall::mock;
use rehearse_ai::{AIServiceResult, GenerationRequest, TextGenerator};
use rehearse_config::{CacheBackend, InterviewConfig};
use rehearse_core::{QuestionCategory, TurnRole};
use rehearse_interview::{cache_from_config, InterviewService, SeedQuestion, Turn};
use rehearse_storage::connect_in_memory;
use sqlx::SqlitePool;

mock! {
    pub Generator {}

    #[async_trait::async_trait]
    impl TextGenerator for Generator {
        async fn generate(&self, request: &GenerationRequest) -> AIServiceResult<String>;
    }
}

pub const FOLLOW_UP_JSON: &str = r#"{
  "follow_up": [
    {
      "question": { "text": "Which isolation level did you run with?", "purpose": "IMPLEMENTATION" },
      "evaluator_feedback": "Knows the ACID vocabulary; probing for depth."
    }
  ]
}"#;

pub const FEEDBACK_JSON: &str = r#"{
  "content": "Clear answers about PostgreSQL transactions.",
  "strengths": "Precise terminology.",
  "improvementPoints": "Quantify the impact of decisions.",
  "overallImpression": "Confident and structured.",
  "additionalAdvice": "Prepare one concrete incident story."
}"#;

pub const QUESTION_SET_JSON: &str = r#"```json
{
  "tech_stack": [
    { "stack": "PostgreSQL", "questions": [
      { "id": 1, "text": "Why did you choose PostgreSQL?", "purpose": "TECH_CHOICE" }
    ]},
    { "stack": "Redis", "questions": [
      { "id": 1, "text": "How did you size the Redis cache?", "purpose": "IMPLEMENTATION" }
    ]}
  ],
  "projects": [
    { "project_name": "Checkout", "tech_stack": ["PostgreSQL", "Redis"], "questions": [
      { "id": 1, "text": "What slowed checkout down and how did you fix it?", "purpose": "PROBLEM_SOLVING" }
    ]}
  ]
}
```"#;

pub const SEED_TEXT: &str = "Why did you choose PostgreSQL?";

pub fn is_follow_up(request: &GenerationRequest) -> bool {
    request.prompt.contains("Candidate answer")
}

pub fn is_feedback(request: &GenerationRequest) -> bool {
    request.prompt.contains("Transcript:")
}

pub fn is_question_set(request: &GenerationRequest) -> bool {
    request.prompt.contains("Portfolio:")
}

pub fn test_config() -> InterviewConfig {
    InterviewConfig {
        max_turns: 8,
        cache_backend: CacheBackend::Memory,
        generation_max_attempts: 1,
        ..InterviewConfig::default()
    }
}

pub async fn service_with(
    generator: impl TextGenerator + 'static,
    config: InterviewConfig,
) -> (InterviewService, SqlitePool) {
    let pool = connect_in_memory().await.unwrap();
    let cache = cache_from_config(&config, &pool);
    let service = InterviewService::new(pool.clone(), Arc::new(generator), cache, &config).unwrap();
    (service, pool)
}

pub fn seed(id: &str) -> SeedQuestion {
    SeedQuestion {
        id: id.to_string(),
        text: SEED_TEXT.to_string(),
        category: QuestionCategory::TechStack,
    }
}

pub async fn stored_turn_count(pool: &SqlitePool, conversation_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM turns WHERE conversation_id = ?")
        .bind(conversation_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// PROMPT, RESPONSE, PROMPT, ... ending in a PROMPT
pub fn assert_alternating(turns: &[Turn]) {
    assert!(!turns.is_empty());
    for (index, turn) in turns.iter().enumerate() {
        let expected = if index % 2 == 0 {
            TurnRole::Prompt
        } else {
            TurnRole::Response
        };
        assert_eq!(turn.role, expected, "turn {} has the wrong role", index);
        assert_eq!(turn.position, index as i64);
    }
    assert_eq!(turns.last().map(|t| t.role), Some(TurnRole::Prompt));
}
