//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! The chat endpoint only needs an OpenAI compatible chat-completions backend; any
//! self-hosted server that speaks the same API works through
//! [`OpenAIClient::new_with_base_url`](openai::OpenAIClient::new_with_base_url).

pub mod common;

pub mod openai;
