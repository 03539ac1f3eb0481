// ABOUTME: JSON response contracts for the three generation operations
// ABOUTME: Decodes raw model text and validates it into typed results

use rehearse_core::Purpose;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

/// A generated question with its validated purpose
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedQuestion {
    pub text: String,
    pub purpose: Purpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechQuestions {
    pub stack: String,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectQuestions {
    pub project_name: String,
    pub tech_stack: Vec<String>,
    pub questions: Vec<GeneratedQuestion>,
}

/// Validated question-set generation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionSetResult {
    pub tech_stack: Vec<TechQuestions>,
    pub projects: Vec<ProjectQuestions>,
}

impl QuestionSetResult {
    pub fn question_count(&self) -> usize {
        self.tech_stack.iter().map(|t| t.questions.len()).sum::<usize>()
            + self.projects.iter().map(|p| p.questions.len()).sum::<usize>()
    }
}

/// Validated follow-up generation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpResult {
    pub question: GeneratedQuestion,
    pub evaluator_feedback: String,
}

/// Validated final-feedback generation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    pub content: String,
    pub strengths: String,
    pub improvement_points: String,
    pub overall_impression: String,
    pub additional_advice: String,
}

// Wire shapes: every field optional so that missing data is reported as a
// validation failure rather than a parse failure.

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTechEntry {
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
struct RawProjectEntry {
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    tech_stack: Option<Vec<String>>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
struct RawQuestionSet {
    #[serde(default)]
    tech_stack: Option<Vec<RawTechEntry>>,
    #[serde(default)]
    projects: Option<Vec<RawProjectEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawFollowUpItem {
    #[serde(default)]
    question: Option<RawQuestion>,
    #[serde(default)]
    evaluator_feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFollowUp {
    #[serde(default)]
    follow_up: Option<Vec<RawFollowUpItem>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedback {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    strengths: Option<String>,
    #[serde(default)]
    improvement_points: Option<String>,
    #[serde(default)]
    overall_impression: Option<String>,
    #[serde(default)]
    additional_advice: Option<String>,
}

fn decode<T: DeserializeOwned>(text: &str) -> GenerationResult<T> {
    serde_json::from_str(text).map_err(|e| GenerationError::Parse {
        raw: text.to_string(),
        message: e.to_string(),
    })
}

fn invalid(message: impl Into<String>) -> GenerationError {
    GenerationError::Validation(message.into())
}

fn required(value: Option<String>, field: &str) -> GenerationResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(invalid(format!("missing or empty `{}`", field))),
    }
}

fn validate_question(raw: RawQuestion, context: &str) -> GenerationResult<GeneratedQuestion> {
    let text = required(raw.text, &format!("{} question text", context))?;
    let purpose_raw = raw
        .purpose
        .ok_or_else(|| invalid(format!("question `{}` has no purpose", text)))?;
    let purpose = purpose_raw
        .parse::<Purpose>()
        .map_err(|_| invalid(format!("question `{}` has invalid purpose `{}`", text, purpose_raw)))?;
    Ok(GeneratedQuestion { text, purpose })
}

fn validate_questions(raw: Option<Vec<RawQuestion>>, context: &str) -> GenerationResult<Vec<GeneratedQuestion>> {
    let questions = raw.unwrap_or_default();
    if questions.is_empty() {
        return Err(invalid(format!("{} has no questions", context)));
    }
    questions
        .into_iter()
        .map(|q| validate_question(q, context))
        .collect()
}

/// Parse and validate a question-set response
pub fn parse_question_set(text: &str) -> GenerationResult<QuestionSetResult> {
    let raw: RawQuestionSet = decode(text)?;

    let (Some(raw_tech), Some(raw_projects)) = (raw.tech_stack, raw.projects) else {
        return Err(invalid("response is missing `tech_stack` or `projects`"));
    };

    let mut tech_stack = Vec::with_capacity(raw_tech.len());
    for entry in raw_tech {
        let stack = required(entry.stack, "tech_stack.stack")?;
        let questions = validate_questions(entry.questions, &format!("technology `{}`", stack))?;
        tech_stack.push(TechQuestions { stack, questions });
    }

    let mut projects = Vec::with_capacity(raw_projects.len());
    for entry in raw_projects {
        let project_name = required(entry.project_name, "projects.project_name")?;
        let tech_stack = entry
            .tech_stack
            .ok_or_else(|| invalid(format!("project `{}` has no tech_stack", project_name)))?;
        let questions = validate_questions(entry.questions, &format!("project `{}`", project_name))?;
        projects.push(ProjectQuestions {
            project_name,
            tech_stack,
            questions,
        });
    }

    let result = QuestionSetResult {
        tech_stack,
        projects,
    };
    if result.question_count() == 0 {
        return Err(invalid("question set contains no questions"));
    }
    Ok(result)
}

/// Parse and validate a follow-up response. Exactly one item is accepted.
pub fn parse_follow_up(text: &str) -> GenerationResult<FollowUpResult> {
    let raw: RawFollowUp = decode(text)?;

    if let Some(reason) = raw.error {
        return Err(invalid(format!("model declined to follow up: {}", reason)));
    }

    let mut items = raw
        .follow_up
        .ok_or_else(|| invalid("response is missing `follow_up`"))?;
    if items.len() != 1 {
        return Err(invalid(format!(
            "expected exactly one follow_up item, got {}",
            items.len()
        )));
    }
    let item = items.remove(0);

    let question = item
        .question
        .ok_or_else(|| invalid("follow_up item has no question"))?;
    let question = validate_question(question, "follow-up")?;
    let evaluator_feedback = required(item.evaluator_feedback, "evaluator_feedback")?;

    Ok(FollowUpResult {
        question,
        evaluator_feedback,
    })
}

/// Parse and validate a final-feedback response
pub fn parse_feedback(text: &str) -> GenerationResult<FeedbackResult> {
    let raw: RawFeedback = decode(text)?;

    Ok(FeedbackResult {
        content: required(raw.content, "content")?,
        strengths: required(raw.strengths, "strengths")?,
        improvement_points: required(raw.improvement_points, "improvementPoints")?,
        overall_impression: required(raw.overall_impression, "overallImpression")?,
        additional_advice: required(raw.additional_advice, "additionalAdvice")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_TECH_SET: &str = r#"{
        "tech_stack": [
            { "stack": "PostgreSQL", "questions": [
                { "id": 1, "text": "Why PostgreSQL over MySQL?", "purpose": "TECH_CHOICE" }
            ]},
            { "stack": "Redis", "questions": [
                { "id": 1, "text": "How did you pick eviction policies?", "purpose": "IMPLEMENTATION" },
                { "id": 2, "text": "What broke under load?", "purpose": "problem solving" }
            ]}
        ],
        "projects": [
            { "project_name": "Shop", "tech_stack": ["PostgreSQL", "Redis"], "questions": [
                { "id": 1, "text": "What did caching improve?", "purpose": "OUTCOME_EVALUATION" }
            ]}
        ]
    }"#;

    #[test]
    fn test_question_set_with_two_technologies() {
        let result = parse_question_set(TWO_TECH_SET).unwrap();

        assert_eq!(result.tech_stack.len(), 2);
        assert!(result.tech_stack.iter().all(|t| !t.questions.is_empty()));
        assert_eq!(result.tech_stack[1].questions[1].purpose, Purpose::ProblemSolving);
        assert_eq!(result.projects[0].tech_stack, vec!["PostgreSQL", "Redis"]);
        assert_eq!(result.question_count(), 4);
    }

    #[test]
    fn test_question_set_missing_purpose_is_validation_error() {
        let text = r#"{"tech_stack":[{"stack":"Go","questions":[{"id":1,"text":"Why Go?"}]}],"projects":[]}"#;
        let err = parse_question_set(text).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(ref m) if m.contains("no purpose")));
    }

    #[test]
    fn test_question_set_rejects_unknown_purpose() {
        let text = r#"{"tech_stack":[{"stack":"Go","questions":[{"text":"Why Go?","purpose":"CURIOSITY"}]}],"projects":[]}"#;
        assert!(matches!(
            parse_question_set(text),
            Err(GenerationError::Validation(_))
        ));
    }

    #[test]
    fn test_question_set_requires_both_lists() {
        let text = r#"{"tech_stack":[]}"#;
        assert!(matches!(
            parse_question_set(text),
            Err(GenerationError::Validation(_))
        ));
    }

    #[test]
    fn test_question_set_with_no_entries_is_rejected() {
        let text = r#"{"tech_stack":[],"projects":[]}"#;
        assert!(matches!(
            parse_question_set(text),
            Err(GenerationError::Validation(ref m)) if m.contains("no questions")
        ));
    }

    #[test]
    fn test_question_set_entry_without_questions_is_rejected() {
        let text = r#"{"tech_stack":[{"stack":"Go","questions":[]}],"projects":[]}"#;
        assert!(matches!(
            parse_question_set(text),
            Err(GenerationError::Validation(_))
        ));

        let text = r#"{"tech_stack":[],"projects":[{"project_name":"X","questions":[{"text":"q","purpose":"IMPLEMENTATION"}]}]}"#;
        assert!(matches!(
            parse_question_set(text),
            Err(GenerationError::Validation(ref m)) if m.contains("tech_stack")
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error_with_raw_text() {
        let err = parse_question_set("Sure! Here are your questions").unwrap_err();
        match err {
            GenerationError::Parse { raw, message } => {
                assert_eq!(raw, "Sure! Here are your questions");
                assert!(!message.is_empty());
            }
            other => panic!("Expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_follow_up_happy_path() {
        let text = r#"{"follow_up":[{"question":{"text":"Which isolation level did you use?","purpose":"IMPLEMENTATION"},"evaluator_feedback":"Knows ACID basics"}]}"#;
        let result = parse_follow_up(text).unwrap();
        assert_eq!(result.question.text, "Which isolation level did you use?");
        assert_eq!(result.question.purpose, Purpose::Implementation);
        assert_eq!(result.evaluator_feedback, "Knows ACID basics");
    }

    #[test]
    fn test_follow_up_requires_exactly_one_item() {
        let item = r#"{"question":{"text":"q","purpose":"IMPLEMENTATION"},"evaluator_feedback":"f"}"#;
        let two = format!(r#"{{"follow_up":[{},{}]}}"#, item, item);
        assert!(matches!(parse_follow_up(&two), Err(GenerationError::Validation(_))));
        assert!(matches!(
            parse_follow_up(r#"{"follow_up":[]}"#),
            Err(GenerationError::Validation(_))
        ));
    }

    #[test]
    fn test_follow_up_empty_feedback_and_error_object_are_rejected() {
        let text = r#"{"follow_up":[{"question":{"text":"q","purpose":"IMPLEMENTATION"},"evaluator_feedback":"  "}]}"#;
        assert!(matches!(parse_follow_up(text), Err(GenerationError::Validation(_))));

        let declined = r#"{"error": "no valid answer"}"#;
        assert!(matches!(
            parse_follow_up(declined),
            Err(GenerationError::Validation(ref m)) if m.contains("no valid answer")
        ));
    }

    #[test]
    fn test_feedback_requires_all_five_fields() {
        let full = r#"{"content":"c","strengths":"s","improvementPoints":"i","overallImpression":"o","additionalAdvice":"a"}"#;
        let result = parse_feedback(full).unwrap();
        assert_eq!(result.improvement_points, "i");

        let missing = r#"{"content":"c","strengths":"s","improvementPoints":"i","overallImpression":"o"}"#;
        assert!(matches!(
            parse_feedback(missing),
            Err(GenerationError::Validation(ref m)) if m.contains("additionalAdvice")
        ));
    }

    #[test]
    fn test_validated_results_round_trip_through_cache_format() {
        let result = parse_feedback(
            r#"{"content":"c","strengths":"s","improvementPoints":"i","overallImpression":"o","additionalAdvice":"a"}"#,
        )
        .unwrap();
        let cached = serde_json::to_string(&result).unwrap();
        assert!(cached.contains("improvementPoints"));
        assert_eq!(parse_feedback(&cached).unwrap(), result);
    }
}
