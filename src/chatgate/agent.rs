//! The chat agent: an LLM client plus the tool registry plus session memory.
//!
//! Every [`Agent::invoke`] call rebuilds the prompt from scratch:
//!
//! ```text
//! [system prompt + tool catalogue] + stored session history + user query
//! ```
//!
//! The model asks for a tool by answering with a JSON fragment shaped like
//! `{"tool_call": {"name": "...", "parameters": {...}}}`, possibly wrapped in
//! prose. The agent dispatches it through the [`ToolRegistry`], feeds the
//! result back as a user message and asks again, until the model answers
//! without a tool call or the iteration cap is hit. Which tool to call is
//! entirely the model's decision.
//!
//! All messages of the turn except the system prompt are appended to the
//! [`SessionStore`] under the session key once the turn is complete, so a
//! later call with the same key sees the whole exchange.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::chatgate::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::chatgate::session_store::SessionStore;
use crate::chatgate::tool_protocol::ToolRegistry;

/// Upper bound on tool executions per invocation unless configured otherwise.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

/// Instructions given to the model ahead of the tool catalogue.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Always use the registered tools when they are relevant. \
Do NOT answer directly if a tool exists for the user request. \
For example: - If the query asks about \"courses of student <id>\", always call get_courses_by_student_id.";

/// What one invocation produced.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Final assistant message text.
    pub content: String,
    /// Usage summed over every LLM round-trip, when the client reports it.
    pub tokens_used: Option<TokenUsage>,
    /// Number of tools actually executed.
    pub tool_calls_made: usize,
}

/// Errors surfaced by [`Agent::invoke`].
#[derive(Debug)]
pub enum AgentError {
    /// The LLM call itself failed.
    Llm(String),
    /// Session history could not be read or written.
    Session(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Llm(msg) => write!(f, "LLM request failed: {}", msg),
            AgentError::Session(msg) => write!(f, "session memory failed: {}", msg),
        }
    }
}

impl Error for AgentError {}

/// The boundary the HTTP layer talks to.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Answer `query` in the context of `session_id`.
    async fn invoke(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<AgentResponse, Box<dyn Error + Send + Sync>>;
}

/// A tool request extracted from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub parameters: JsonValue,
}

pub struct Agent {
    client: Arc<dyn ClientWrapper>,
    registry: Arc<ToolRegistry>,
    sessions: Arc<dyn SessionStore>,
    system_prompt: String,
    max_tool_iterations: usize,
}

impl Agent {
    pub fn new(
        client: Arc<dyn ClientWrapper>,
        registry: Arc<ToolRegistry>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client,
            registry,
            sessions,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// System prompt followed by the tool catalogue and the calling convention.
    pub fn system_message(&self) -> String {
        let mut prompt = self.system_prompt.clone();
        let tools = self.registry.all_tools();
        if tools.is_empty() {
            return prompt;
        }

        prompt.push_str("\n\nYou have access to the following tools:\n");
        for tool in tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            if !tool.parameters.is_empty() {
                prompt.push_str("  Parameters:\n");
                for param in &tool.parameters {
                    prompt.push_str(&format!(
                        "    - {} ({:?}{}): {}\n",
                        param.name,
                        param.param_type,
                        if param.required { ", required" } else { "" },
                        param.description.as_deref().unwrap_or("No description")
                    ));
                }
            }
        }
        prompt.push_str(
            "\nTo use a tool, respond with a JSON object in the following format:\n\
             {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
             After tool execution, I'll provide the result and you can continue.\n",
        );
        prompt
    }

    async fn ask(
        &self,
        prompt: &[Message],
        usage: &mut Option<TokenUsage>,
    ) -> Result<Message, AgentError> {
        let reply = self
            .client
            .send_message(prompt)
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;
        if let Some(last) = self.client.get_last_usage() {
            usage.get_or_insert_with(TokenUsage::default).accumulate(&last);
        }
        Ok(reply)
    }

    /// Run the tool and phrase the outcome for the model.
    async fn run_tool(&self, call: ToolCall) -> String {
        log::info!("tool call: {} {}", call.name, call.parameters);
        match self.registry.execute_tool(&call.name, call.parameters).await {
            Ok(result) if result.success => format!(
                "Tool '{}' executed successfully. Result: {}",
                call.name,
                result.as_text()
            ),
            Ok(result) => format!(
                "Tool '{}' failed. Error: {}",
                call.name,
                result.error.unwrap_or_else(|| "Unknown error".to_string())
            ),
            Err(e) => {
                log::warn!("tool '{}' could not run: {}", call.name, e);
                format!("Tool execution error: {}", e)
            }
        }
    }
}

#[async_trait]
impl ChatAgent for Agent {
    async fn invoke(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<AgentResponse, Box<dyn Error + Send + Sync>> {
        let history = self
            .sessions
            .load(session_id)
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;
        log::debug!(
            "session '{}': {} stored message(s), model {}",
            session_id,
            history.len(),
            self.client.model_name()
        );

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(Message::new(Role::System, self.system_message()));
        prompt.extend(history);
        let turn_start = prompt.len();
        prompt.push(Message::new(Role::User, query));

        let mut usage = None;
        let mut tool_calls_made = 0;
        let mut reply = self.ask(&prompt, &mut usage).await?;

        while let Some(call) = parse_tool_call(&reply.content) {
            if tool_calls_made >= self.max_tool_iterations {
                log::warn!(
                    "session '{}': tool iteration cap ({}) reached",
                    session_id,
                    self.max_tool_iterations
                );
                reply.content = format!(
                    "{}\n\n[Warning: Maximum tool iterations reached]",
                    reply.content
                );
                break;
            }
            tool_calls_made += 1;

            let tool_message = self.run_tool(call).await;
            prompt.push(reply);
            prompt.push(Message::new(Role::User, tool_message));
            reply = self.ask(&prompt, &mut usage).await?;
        }

        let content = reply.content.clone();
        prompt.push(reply);
        self.sessions
            .append(session_id, &prompt[turn_start..])
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;

        Ok(AgentResponse {
            content,
            tokens_used: usage,
            tool_calls_made,
        })
    }
}

/// Extract the first `{"tool_call": {...}}` fragment from model output.
///
/// The fragment may be surrounded by prose; its end is found by counting
/// braces outside string literals.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start = response.find("{\"tool_call\"")?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;
    for (offset, ch) in response[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let parsed: JsonValue = serde_json::from_str(&response[start..end?]).ok()?;
    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?;
    let parameters = call
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| JsonValue::Object(Default::default()));
    Some(ToolCall {
        name: name.to_string(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tool_call_inside_prose() {
        let text = "Let me check.\n{\"tool_call\": {\"name\": \"get_titles\", \"parameters\": {}}}\nOne moment.";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.name, "get_titles");
        assert_eq!(call.parameters, json!({}));
    }

    #[test]
    fn test_parse_tool_call_ignores_braces_in_strings() {
        let text = r#"{"tool_call": {"name": "get_products_by_name", "parameters": {"name": "a}b{"}}}"#;
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.parameters, json!({"name": "a}b{"}));
    }

    #[test]
    fn test_parse_tool_call_handles_multibyte_prefix() {
        let text = "Voilà: {\"tool_call\": {\"name\": \"get_all_movies\"}}";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.name, "get_all_movies");
        assert_eq!(call.parameters, json!({}));
    }

    #[test]
    fn test_plain_answers_are_not_tool_calls() {
        assert!(parse_tool_call("Student 1 takes Math.").is_none());
        assert!(parse_tool_call("{\"tool_call\": {\"name\": 3}}").is_none());
        assert!(parse_tool_call("{\"tool_call\": {\"name\": \"x\"").is_none());
    }
}
