//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI's Chat API,
//! capturing both the assistant response and token usage for every call.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatgate::clients::openai::OpenAIClient;
//! use chatgate::client_wrapper::{ClientWrapper, Message, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let secret_key = std::env::var("OPENAI_API_KEY")?;
//!     let client = OpenAIClient::new_with_model_string(&secret_key, "gpt-4o-mini");
//!
//!     let resp = client
//!         .send_message(&[
//!             Message::new(Role::System, "You are an assistant."),
//!             Message::new(Role::User, "Hello!"),
//!         ])
//!         .await?;
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage() {
//!         println!("Tokens: {}", usage.total_tokens);
//!     }
//!     Ok(())
//! }
//! ```
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use openai_rust::chat;
use openai_rust2 as openai_rust;

use crate::chatgate::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::chatgate::clients::common::send_and_track;
use crate::chatgate::http_client_pool::{get_or_create_client, DEFAULT_TIMEOUT_SECS};

/// Base URL of the public OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// LLM round-trips get this multiple of the downstream service timeout.
pub const LLM_TIMEOUT_FACTOR: u64 = 10;

/// Model used by the chat endpoint unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client wrapper for OpenAI's Chat Completions API.
///
/// Holds the selected model identifier plus an internal [`TokenUsage`] slot so
/// callers can inspect how many tokens each request consumed.
pub struct OpenAIClient {
    /// Underlying SDK client pointing at the REST endpoint.
    client: openai_rust::Client,
    /// Model name injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
    /// Whole-request timeout of the pooled HTTP client.
    timeout_secs: u64,
}

impl OpenAIClient {
    /// Construct a client against the public OpenAI endpoint.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, OPENAI_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        Self::new_with_service_timeout(secret_key, model_name, base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Like [`new_with_base_url`](Self::new_with_base_url), scaling the
    /// configured downstream timeout by [`LLM_TIMEOUT_FACTOR`].
    pub fn new_with_service_timeout(
        secret_key: &str,
        model_name: &str,
        base_url: &str,
        service_timeout_secs: u64,
    ) -> Self {
        let timeout_secs = service_timeout_secs.saturating_mul(LLM_TIMEOUT_FACTOR);
        let http = get_or_create_client(base_url, timeout_secs);
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(secret_key, http, base_url),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
            timeout_secs,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let formatted_messages: Vec<chat::Message> = messages
            .iter()
            .map(|msg| chat::Message {
                role: msg.role.as_str().to_owned(),
                content: msg.content.clone(),
            })
            .collect();

        let content = send_and_track(
            &self.client,
            &self.model,
            formatted_messages,
            Some("/v1/chat/completions".to_string()),
            &self.token_usage,
        )
        .await
        .map_err(|e| {
            log::error!("OpenAIClient::send_message(...): {}", e);
            e
        })?;

        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_reports_model_and_no_usage_before_first_call() {
        let client = OpenAIClient::new_with_model_string("test-key", "gpt-4o-mini");
        assert_eq!(client.model_name(), "gpt-4o-mini");
        assert!(client.get_last_usage().is_none());
        assert_eq!(client.timeout_secs(), DEFAULT_TIMEOUT_SECS * LLM_TIMEOUT_FACTOR);
    }

    #[test]
    fn test_llm_timeout_follows_service_timeout() {
        let client = OpenAIClient::new_with_service_timeout(
            "test-key",
            "gpt-4o-mini",
            "http://localhost:1",
            7,
        );
        assert_eq!(client.timeout_secs(), 70);
    }
}
