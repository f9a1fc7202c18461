use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chatgate::chat_server::{router, ChatServer, FAREWELL_MESSAGE, STATUS_MESSAGE};
use chatgate::client_wrapper::{ClientWrapper, Message, Role};
use chatgate::session_store::InMemorySessionStore;
use chatgate::tool_protocol::ToolRegistry;
use chatgate::{Agent, AgentResponse, ChatAgent};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Records every invocation and answers with a fixed text.
#[derive(Default)]
struct RecordingAgent {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingAgent {
    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAgent for RecordingAgent {
    async fn invoke(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<AgentResponse, Box<dyn Error + Send + Sync>> {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), query.to_string()));
        if self.fail {
            return Err("model unavailable".into());
        }
        Ok(AgentResponse {
            content: format!("answer to {}", query),
            tokens_used: None,
            tool_calls_made: 0,
        })
    }
}

fn chat_request(uri: &str, query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_status_route() {
    let app = router(Arc::new(RecordingAgent::default()), "default_session");
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "message": STATUS_MESSAGE }));
}

#[tokio::test]
async fn test_exit_short_circuits_without_invoking_agent() {
    let agent = Arc::new(RecordingAgent::default());
    for word in ["exit", "EXIT", "Quit"] {
        let app = router(agent.clone(), "default_session");
        let response = app.oneshot(chat_request("/chat", word)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "answer": FAREWELL_MESSAGE }));
    }
    assert!(agent.calls().is_empty());
}

#[tokio::test]
async fn test_padded_exit_reaches_agent() {
    let agent = Arc::new(RecordingAgent::default());
    let app = router(agent.clone(), "default_session");
    let response = app.oneshot(chat_request("/chat", " exit ")).await.unwrap();
    assert_eq!(json_body(response).await, json!({ "answer": "answer to  exit " }));
    assert_eq!(
        agent.calls(),
        vec![("default_session".to_string(), " exit ".to_string())]
    );
}

#[tokio::test]
async fn test_query_is_forwarded_with_session() {
    let agent = Arc::new(RecordingAgent::default());
    let app = router(agent.clone(), "default_session");

    let response = app
        .clone()
        .oneshot(chat_request("/chat?session_id=abc", "hello"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({ "answer": "answer to hello" }));

    let response = app.oneshot(chat_request("/chat", "again")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        agent.calls(),
        vec![
            ("abc".to_string(), "hello".to_string()),
            ("default_session".to_string(), "again".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_agent_failure_is_500() {
    let agent = Arc::new(RecordingAgent {
        fail: true,
        ..Default::default()
    });
    let app = router(agent, "default_session");
    let response = app.oneshot(chat_request("/chat", "hi")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "model unavailable" }));
}

/// Echoes how many messages it was sent, so history growth is visible.
struct CountingClient;

#[async_trait]
impl ClientWrapper for CountingClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        Ok(Message::new(Role::Assistant, format!("seen {}", messages.len())))
    }

    fn model_name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn test_session_continuity_through_endpoint() {
    let agent = Agent::new(
        Arc::new(CountingClient),
        Arc::new(ToolRegistry::empty()),
        Arc::new(InMemorySessionStore::new()),
    );
    let app = router(Arc::new(agent), "default_session");

    let first = app
        .clone()
        .oneshot(chat_request("/chat?session_id=s1", "one"))
        .await
        .unwrap();
    assert_eq!(json_body(first).await, json!({ "answer": "seen 2" }));

    // system + previous user/assistant pair + new query
    let second = app
        .clone()
        .oneshot(chat_request("/chat?session_id=s1", "two"))
        .await
        .unwrap();
    assert_eq!(json_body(second).await, json!({ "answer": "seen 4" }));

    let other = app
        .oneshot(chat_request("/chat?session_id=s2", "one"))
        .await
        .unwrap();
    assert_eq!(json_body(other).await, json!({ "answer": "seen 2" }));
}

#[tokio::test]
async fn test_server_binds_and_serves() {
    let server = ChatServer::start(
        "127.0.0.1:0",
        Arc::new(RecordingAgent::default()),
        "default_session",
    )
    .await
    .unwrap();

    let url = format!("http://{}/chat", server.get_addr());
    let body: Value = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "query": "ping" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "answer": "answer to ping" }));
    server.shutdown();
}
