// ABOUTME: AI service integration for Rehearse
// ABOUTME: Anthropic API client behind the TextGenerator capability

pub mod service;

// Re-export service types
pub use service::{
    strip_code_fences, AIResponse, AIService, AIServiceError, AIServiceResult, GenerationRequest,
    TextGenerator, Usage,
};
