//! # chatgate
//!
//! A chatbot backend that lets a large language model answer questions by
//! calling a fixed set of REST microservices: students, courses, professors,
//! products and movies.
//!
//! The pieces, leaves first:
//!
//! * **Service tools** ([`services`]): one thin async wrapper per downstream
//!   endpoint. Each issues one HTTP request and answers with a sentence the
//!   model can read, including for empty results and failures.
//! * **Tool registry** ([`tool_protocol::ToolRegistry`]): named server groups
//!   (`student-course-professor`, `webflux`, `json-to-java`) flattened into one
//!   ordered tool catalogue.
//! * **Agent** ([`Agent`]): prompt-driven tool loop over any
//!   [`ClientWrapper`], with per-session history kept in a [`SessionStore`].
//! * **Endpoint** ([`chat_server`]): `POST /chat` forwarding a query and an
//!   optional session key to the agent.
//!
//! ## Wiring it together
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatgate::{Agent, ChatGateConfig, JsonlSessionStore};
//! use chatgate::clients::openai::OpenAIClient;
//! use chatgate::chat_server::ChatServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     chatgate::init_logger();
//!     let config = ChatGateConfig::from_env();
//!
//!     let registry = chatgate::services::default_registry(
//!         &config.services,
//!         config.http_timeout_secs,
//!     )
//!     .await?;
//!     let client = OpenAIClient::new_with_model_string(
//!         config.openai_api_key.as_deref().unwrap_or_default(),
//!         &config.model,
//!     );
//!     let sessions = JsonlSessionStore::open(&config.session_dir)?;
//!
//!     let agent = Agent::new(Arc::new(client), Arc::new(registry), Arc::new(sessions));
//!     let server = ChatServer::start(&config.bind_addr, Arc::new(agent), config.default_session).await?;
//!     server.wait().await
//! }
//! ```
//!
//! Logging goes through the `log` facade; call [`init_logger`] once and steer
//! it with `RUST_LOG`.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Install the `env_logger` backend. Safe to call more than once.
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::try_init();
    });
}

pub mod chatgate;

pub use chatgate::agent;
pub use chatgate::agent::{Agent, AgentResponse, ChatAgent};
pub use chatgate::chat_server;
pub use chatgate::client_wrapper;
pub use chatgate::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use chatgate::clients;
pub use chatgate::config;
pub use chatgate::config::{ChatGateConfig, ServiceEndpoints};
pub use chatgate::http_client_pool;
pub use chatgate::services;
pub use chatgate::session_store;
pub use chatgate::session_store::{InMemorySessionStore, JsonlSessionStore, SessionStore};
pub use chatgate::tool_protocol;
pub use chatgate::tool_protocol::ToolRegistry;
pub use chatgate::tool_protocols;
