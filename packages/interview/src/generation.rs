// ABOUTME: Generation cache and validator wrapping the external text generator
// ABOUTME: Fingerprints inputs, serves cache hits, bounds attempts and timeouts, caches validated results

use std::sync::Arc;
use std::time::Duration;

use rehearse_ai::{strip_code_fences, GenerationRequest, TextGenerator};
use rehearse_cache::{fingerprint, KeyValueCache};
use rehearse_config::InterviewConfig;
use rehearse_core::truncate;
use rehearse_prompts::{
    PromptManager, FINAL_FEEDBACK_PROMPT, FOLLOW_UP_PROMPT, INTERVIEWER_SYSTEM_PROMPT,
    QUESTION_SET_PROMPT,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::contracts::{
    parse_feedback, parse_follow_up, parse_question_set, FeedbackResult, FollowUpResult,
    QuestionSetResult,
};
use crate::error::{GenerationError, GenerationResult};

/// Cache namespaces; bump the version when a contract changes shape
pub const QUESTION_SET_OPERATION: &str = "questions:v1";
pub const FOLLOW_UP_OPERATION: &str = "follow_up:v1";
pub const FINAL_FEEDBACK_OPERATION: &str = "final_feedback:v1";

/// Question sets are generated from the whole portfolio in one pass
const QUESTION_SET_SCOPE: &str = "combined";

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub cache_ttl: Duration,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub cache_follow_ups: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&InterviewConfig::default())
    }
}

impl From<&InterviewConfig> for GenerationSettings {
    fn from(config: &InterviewConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            timeout: config.generation_timeout(),
            max_attempts: config.generation_max_attempts.max(1),
            cache_follow_ups: config.cache_follow_ups,
        }
    }
}

/// Inputs for a follow-up generation
#[derive(Debug, Clone)]
pub struct FollowUpRequest<'a> {
    pub seed_question_id: &'a str,
    pub seed_question: &'a str,
    pub last_prompt: &'a str,
    pub user_response: &'a str,
}

pub struct GenerationService {
    generator: Arc<dyn TextGenerator>,
    cache: Option<Arc<dyn KeyValueCache>>,
    prompts: PromptManager,
    settings: GenerationSettings,
}

impl GenerationService {
    /// `cache = None` degrades every operation to a direct generator call
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cache: Option<Arc<dyn KeyValueCache>>,
        prompts: PromptManager,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            generator,
            cache,
            prompts,
            settings,
        }
    }

    /// Generate technology and project questions for a portfolio
    pub async fn question_set(&self, portfolio: &str) -> GenerationResult<QuestionSetResult> {
        let prompt = self
            .prompts
            .get_prompt(QUESTION_SET_PROMPT, &[("portfolio", portfolio)])?;

        self.run(
            QUESTION_SET_OPERATION,
            &[portfolio, QUESTION_SET_SCOPE],
            true,
            prompt,
            parse_question_set,
        )
        .await
    }

    /// Generate the next interviewer question for a candidate answer
    pub async fn follow_up(&self, request: &FollowUpRequest<'_>) -> GenerationResult<FollowUpResult> {
        let prompt = self.prompts.get_prompt(
            FOLLOW_UP_PROMPT,
            &[
                ("seed_question_id", request.seed_question_id),
                ("seed_question", request.seed_question),
                ("last_prompt", request.last_prompt),
                ("user_response", request.user_response),
            ],
        )?;

        self.run(
            FOLLOW_UP_OPERATION,
            &[
                request.seed_question_id,
                request.last_prompt,
                request.user_response,
            ],
            self.settings.cache_follow_ups,
            prompt,
            parse_follow_up,
        )
        .await
    }

    /// Generate the closing report from a serialized transcript
    pub async fn final_feedback(
        &self,
        conversation_id: &str,
        transcript: &str,
    ) -> GenerationResult<FeedbackResult> {
        let prompt = self
            .prompts
            .get_prompt(FINAL_FEEDBACK_PROMPT, &[("transcript", transcript)])?;

        self.run(
            FINAL_FEEDBACK_OPERATION,
            &[conversation_id, transcript],
            true,
            prompt,
            parse_feedback,
        )
        .await
    }

    async fn run<T, F>(
        &self,
        operation: &str,
        params: &[&str],
        use_cache: bool,
        prompt: String,
        validate: F,
    ) -> GenerationResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&str) -> GenerationResult<T>,
    {
        let key = fingerprint(operation, params);
        let cache = if use_cache { self.cache.as_deref() } else { None };

        match cache {
            Some(cache) => {
                if let Some(hit) = self.read_cached::<T>(cache, &key).await {
                    info!("Cache HIT for {}", key);
                    return Ok(hit);
                }
                info!("Cache MISS for {}", key);
            }
            None => debug!("Cache SKIPPED for {}", key),
        }

        let system_prompt = self.prompts.get_system_prompt(INTERVIEWER_SYSTEM_PROMPT)?;
        let request = GenerationRequest::new(prompt).with_system_prompt(system_prompt);

        let result = self.generate_validated(operation, &request, &validate).await?;

        if let Some(cache) = cache {
            self.write_cached(cache, &key, &result).await;
        }

        Ok(result)
    }

    async fn generate_validated<T, F>(
        &self,
        operation: &str,
        request: &GenerationRequest,
        validate: &F,
    ) -> GenerationResult<T>
    where
        F: Fn(&str) -> GenerationResult<T>,
    {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = match self.call_generator(request).await {
                Ok(raw) => {
                    let text = strip_code_fences(&raw);
                    debug!("Raw {} response (first 5000 chars): {}", operation, truncate(text, 5000));
                    validate(text)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        "{} attempt {}/{} failed, retrying: {}",
                        operation, attempt, max_attempts, e
                    );
                }
                Err(e) => {
                    if let GenerationError::Parse { raw, message } = &e {
                        error!(
                            "{} response parsing failed: {}. Response snippet: {}",
                            operation,
                            message,
                            truncate(raw, 500)
                        );
                    } else {
                        error!("{} generation failed after {} attempt(s): {}", operation, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn call_generator(&self, request: &GenerationRequest) -> GenerationResult<String> {
        match tokio::time::timeout(self.settings.timeout, self.generator.generate(request)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(GenerationError::Provider(e.to_string())),
            Err(_) => Err(GenerationError::Timeout(self.settings.timeout.as_secs())),
        }
    }

    /// Any cache failure is treated as a miss
    async fn read_cached<T: DeserializeOwned>(&self, cache: &dyn KeyValueCache, key: &str) -> Option<T> {
        let value = match cache.get(key).await {
            Ok(value) => value?,
            Err(e) => {
                warn!("Cache read failed for {}, generating directly: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&value) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                if let Err(e) = cache.delete(key).await {
                    warn!("Failed to delete cache entry {}: {}", key, e);
                }
                None
            }
        }
    }

    async fn write_cached<T: Serialize>(&self, cache: &dyn KeyValueCache, key: &str, result: &T) {
        let value = match serde_json::to_string(result) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize result for {}: {}", key, e);
                return;
            }
        };

        match cache.set(key, &value, self.settings.cache_ttl).await {
            Ok(()) => debug!("Cached {} for {}s", key, self.settings.cache_ttl.as_secs()),
            Err(e) => warn!("Cache write failed for {}: {}", key, e),
        }
    }
}
