//! services/api/src/adapters/quiz_llm.rs
//!
//! This module contains the adapter for the quiz-generating LLM.
//! It implements the `QuizGenerationService` port from the `core` crate:
//! one chat completion per quiz, no streaming, no multi-turn state.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use companion_core::ports::{PortError, PortResult, QuizGenerationService};
use companion_core::quiz::{generation_system_prompt, generation_user_prompt, QuizQuestion};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuizAdapter {
    /// Creates a new `OpenAiQuizAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Strips markdown code fences that models wrap around JSON output.
    fn strip_fences(content: &str) -> String {
        content
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string()
    }
}

//=========================================================================================
// `QuizGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGenerationService for OpenAiQuizAdapter {
    /// Requests one batch of multiple-choice questions as a raw JSON array.
    ///
    /// Parse failures surface as `Validation` errors; the caller decides
    /// whether to retry. There is no placeholder fallback.
    async fn generate_questions(
        &self,
        subject: &str,
        topic: &str,
    ) -> PortResult<Vec<QuizQuestion>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(generation_system_prompt(subject, topic))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(generation_user_prompt(subject, topic))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(3000u32)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected(
                    "Quiz generation LLM response contained no text content.".to_string(),
                )
            })?;

        let cleaned = Self::strip_fences(&content);
        let questions: Vec<QuizQuestion> = serde_json::from_str(&cleaned).map_err(|e| {
            PortError::Validation(format!("Generated quiz was not a valid question array: {}", e))
        })?;

        Ok(questions)
    }
}
