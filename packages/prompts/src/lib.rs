// ABOUTME: Centralized prompt management for the interview generation operations
// ABOUTME: Loads JSON prompt documents (embedded or from disk) and substitutes {{parameters}}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prompt ids shipped with the crate
pub const QUESTION_SET_PROMPT: &str = "question_set";
pub const FOLLOW_UP_PROMPT: &str = "follow_up";
pub const FINAL_FEEDBACK_PROMPT: &str = "final_feedback";
pub const INTERVIEWER_SYSTEM_PROMPT: &str = "interviewer";

const EMBEDDED_PROMPTS: &[(&str, &str)] = &[
    (
        "interview/question_set.json",
        include_str!("../interview/question_set.json"),
    ),
    (
        "interview/follow_up.json",
        include_str!("../interview/follow_up.json"),
    ),
    (
        "interview/final_feedback.json",
        include_str!("../interview/final_feedback.json"),
    ),
    (
        "system/interviewer.json",
        include_str!("../system/interviewer.json"),
    ),
];

const CATEGORIES: &[&str] = &["interview", "system"];

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Unknown prompt '{0}'")]
    NotFound(String),

    #[error("Prompt parameter '{0}' was not supplied")]
    MissingParameter(String),

    #[error("Could not read prompt document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt document {0} needs a non-empty id, category and template")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub version: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    pub description: String,
}

/// One prompt document: a `{{name}}` template plus the parameters it requires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub category: String,
    pub template: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(rename = "outputSchema", default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PromptMetadata>,
}

impl Prompt {
    fn from_json(content: &str, source: &str) -> Result<Self, PromptError> {
        let prompt: Prompt = serde_json::from_str(content)?;
        let blank = |field: &str| field.trim().is_empty();
        if blank(&prompt.id) || blank(&prompt.category) || blank(&prompt.template) {
            return Err(PromptError::InvalidFormat(source.to_string()));
        }
        Ok(prompt)
    }

    /// Fill the template in a single pass. Every declared parameter must be
    /// supplied; substituted values are never re-scanned for placeholders.
    pub fn render(&self, parameters: &[(&str, &str)]) -> Result<String, PromptError> {
        let values: HashMap<&str, &str> = parameters.iter().copied().collect();
        if let Some(missing) = self
            .parameters
            .iter()
            .find(|name| !values.contains_key(name.as_str()))
        {
            return Err(PromptError::MissingParameter(missing.clone()));
        }

        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            match after_open.find("}}") {
                Some(close) => {
                    let name = &after_open[..close];
                    match values.get(name.trim()) {
                        Some(value) => rendered.push_str(value),
                        None => {
                            rendered.push_str("{{");
                            rendered.push_str(name);
                            rendered.push_str("}}");
                        }
                    }
                    rest = &after_open[close + 2..];
                }
                None => {
                    rendered.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        rendered.push_str(rest);

        Ok(rendered)
    }
}

#[derive(Debug, Clone)]
pub struct PromptManager {
    prompts: HashMap<String, Prompt>,
}

impl PromptManager {
    /// The prompt documents compiled into the binary
    pub fn new() -> Result<Self, PromptError> {
        let prompts = EMBEDDED_PROMPTS
            .iter()
            .map(|(source, content)| Prompt::from_json(content, source))
            .map(|prompt| prompt.map(|p| (p.id.clone(), p)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { prompts })
    }

    /// Embedded prompts, replaced by any `<category>/<id>.json` documents under `prompts_dir`
    pub fn with_overrides(prompts_dir: impl AsRef<Path>) -> Result<Self, PromptError> {
        let mut manager = Self::new()?;

        for category in CATEGORIES {
            let dir = prompts_dir.as_ref().join(category);
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    let content = fs::read_to_string(&path)?;
                    let prompt = Prompt::from_json(&content, &path.display().to_string())?;
                    manager.prompts.insert(prompt.id.clone(), prompt);
                }
            }
        }

        Ok(manager)
    }

    /// Render a prompt with its parameters
    pub fn get_prompt(&self, prompt_id: &str, parameters: &[(&str, &str)]) -> Result<String, PromptError> {
        self.find(prompt_id)?.render(parameters)
    }

    /// The template of a `system` category prompt, used verbatim
    pub fn get_system_prompt(&self, prompt_id: &str) -> Result<String, PromptError> {
        let prompt = self.find(prompt_id)?;
        if prompt.category != "system" {
            return Err(PromptError::NotFound(prompt_id.to_string()));
        }
        Ok(prompt.template.clone())
    }

    fn find(&self, prompt_id: &str) -> Result<&Prompt, PromptError> {
        self.prompts
            .get(prompt_id)
            .ok_or_else(|| PromptError::NotFound(prompt_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_system_prompt() {
        let manager = PromptManager::new().unwrap();
        let prompt = manager.get_system_prompt(INTERVIEWER_SYSTEM_PROMPT).unwrap();
        assert!(prompt.contains("technical interviewer"));
    }

    #[test]
    fn test_load_prompt_with_parameters() {
        let manager = PromptManager::new().unwrap();
        let prompt = manager
            .get_prompt(FINAL_FEEDBACK_PROMPT, &[("transcript", "PROMPT: Why Rust?")])
            .unwrap();
        assert!(prompt.contains("PROMPT: Why Rust?"));
        assert!(prompt.contains("improvementPoints"));
        assert!(!prompt.contains("{{transcript}}"));
    }

    #[test]
    fn test_follow_up_prompt_fills_every_placeholder() {
        let manager = PromptManager::new().unwrap();
        let prompt = manager
            .get_prompt(
                FOLLOW_UP_PROMPT,
                &[
                    ("seed_question_id", "q-1"),
                    ("seed_question", "Why PostgreSQL?"),
                    ("last_prompt", "Why PostgreSQL?"),
                    ("user_response", "For ACID guarantees"),
                ],
            )
            .unwrap();
        assert!(prompt.contains("For ACID guarantees"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_missing_parameter_error() {
        let manager = PromptManager::new().unwrap();
        let result = manager.get_prompt(QUESTION_SET_PROMPT, &[]);
        assert!(matches!(result, Err(PromptError::MissingParameter(p)) if p == "portfolio"));
    }

    #[test]
    fn test_prompt_not_found() {
        let manager = PromptManager::new().unwrap();
        let result = manager.get_prompt("nonexistent", &[]);
        assert!(matches!(result, Err(PromptError::NotFound(_))));
        assert!(manager.get_system_prompt(FOLLOW_UP_PROMPT).is_err());
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let manager = PromptManager::new().unwrap();
        let prompt = manager
            .get_prompt(FINAL_FEEDBACK_PROMPT, &[("transcript", "RESPONSE: I typed {{transcript}}")])
            .unwrap();
        assert_eq!(prompt.matches("RESPONSE: I typed {{transcript}}").count(), 1);
    }

    #[test]
    fn test_overrides_replace_embedded_prompts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("interview")).unwrap();
        fs::write(
            dir.path().join("interview").join("final_feedback.json"),
            r#"{"id":"final_feedback","name":"Short","category":"interview","template":"Summarize {{transcript}}","parameters":["transcript"]}"#,
        )
        .unwrap();

        let manager = PromptManager::with_overrides(dir.path()).unwrap();
        let prompt = manager
            .get_prompt(FINAL_FEEDBACK_PROMPT, &[("transcript", "t")])
            .unwrap();
        assert_eq!(prompt, "Summarize t");

        // Untouched prompts still come from the embedded set
        assert!(manager.get_system_prompt(INTERVIEWER_SYSTEM_PROMPT).is_ok());
    }
}
