//! HTTP front door for the chat agent.
//!
//! | route | behaviour |
//! |---|---|
//! | `GET /` | liveness message |
//! | `POST /chat?session_id=<key>` | body `{"query": "..."}` → `{"answer": "..."}` |
//!
//! `session_id` defaults to the configured session key. A query of `exit` or
//! `quit` (any case) is answered with a farewell without reaching the agent.
//! Agent failures become HTTP 500 with `{"error": "..."}`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::chatgate::agent::ChatAgent;

pub const STATUS_MESSAGE: &str = "ChatBot API is running with service tools + persistent session memory!";
pub const FAREWELL_MESSAGE: &str = "Exiting the chat. Goodbye!";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct SessionParams {
    session_id: Option<String>,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<dyn ChatAgent>,
    default_session: Arc<str>,
}

/// `true` for the words that end a conversation.
///
/// Matching ignores case but not surrounding whitespace.
pub fn is_exit_command(query: &str) -> bool {
    query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit")
}

/// Build the router without binding a socket.
pub fn router(agent: Arc<dyn ChatAgent>, default_session: impl Into<String>) -> Router {
    let default_session: String = default_session.into();
    let state = AppState {
        agent,
        default_session: Arc::from(default_session),
    };
    Router::new()
        .route("/", get(status))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({ "message": STATUS_MESSAGE }))
}

async fn chat(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if is_exit_command(&request.query) {
        return Json(ChatResponse {
            answer: FAREWELL_MESSAGE.to_string(),
        })
        .into_response();
    }

    let session_id = params
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.default_session.to_string());

    match state.agent.invoke(&session_id, &request.query).await {
        Ok(response) => {
            log::debug!(
                "session '{}': answered after {} tool call(s)",
                session_id,
                response.tool_calls_made
            );
            Json(ChatResponse {
                answer: response.content,
            })
            .into_response()
        }
        Err(e) => {
            log::error!("session '{}': agent failed: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// A running server: where it listens and the task driving it.
pub struct ChatServerInstance {
    pub addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
}

impl ChatServerInstance {
    pub fn get_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the server task ends.
    pub async fn wait(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.handle.await??;
        Ok(())
    }

    /// Stop serving.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

pub struct ChatServer;

impl ChatServer {
    /// Bind `addr` (port 0 picks a free one) and serve in a background task.
    pub async fn start(
        addr: &str,
        agent: Arc<dyn ChatAgent>,
        default_session: impl Into<String>,
    ) -> Result<ChatServerInstance, Box<dyn Error + Send + Sync>> {
        let app = router(agent, default_session);
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        log::info!("chat endpoint listening on http://{}", addr);

        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(ChatServerInstance { addr, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(!is_exit_command("  quit "));
        assert!(is_exit_command("Exit"));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command(""));
    }
}
