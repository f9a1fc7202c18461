//! Tool Protocol Abstraction Layer
//!
//! Tools are grouped by the downstream service ("server group") that provides
//! them. Each group is backed by one [`ToolProtocol`] implementation and the
//! [`ToolRegistry`] stitches the groups together into the flat, ordered tool
//! list the agent advertises to the model.
//!
//! # Architecture
//!
//! ```text
//! Agent → ToolRegistry → [group "student-course-professor" → ToolProtocol]
//!                      → [group "webflux"                  → ToolProtocol]
//!                      → [group "json-to-java"             → ToolProtocol]
//! ```
//!
//! # Example
//!
//! ```rust
//! use chatgate::tool_protocol::{ToolParameter, ToolParameterType};
//!
//! let param = ToolParameter::new("student_id", ToolParameterType::Integer)
//!     .with_description("Identifier of the student")
//!     .required();
//! assert!(param.required);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Represents the result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful
    pub success: bool,
    /// The output data from the tool
    pub output: JsonValue,
    /// Optional error message if execution failed
    pub error: Option<String>,
    /// Metadata about the execution (outcome classification, timing, ...)
    pub metadata: HashMap<String, JsonValue>,
}

impl ToolResult {
    /// Convenience constructor for successful tool execution.
    pub fn success(output: JsonValue) -> Self {
        Self {
            success: true,
            output,
            error: None,
            metadata: HashMap::new(),
        }
    }

    /// Convenience constructor for failed tool execution.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            output: JsonValue::Null,
            error: Some(error),
            metadata: HashMap::new(),
        }
    }

    /// Attach protocol or application specific metadata to the result.
    pub fn with_metadata(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Render the result as the plain text the model gets to read.
    pub fn as_text(&self) -> String {
        match (&self.output, &self.error) {
            (_, Some(err)) if !self.success => err.clone(),
            (JsonValue::String(s), _) => s.clone(),
            (other, _) => other.to_string(),
        }
    }
}

/// Defines the type of a tool parameter.
///
/// Service tools only take primitives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
}

/// Defines a parameter for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<JsonValue>,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
            default: None,
        }
    }

    /// Add a human readable description that will surface in the tool catalogue.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Provide a default value that will be used when the LLM omits the parameter.
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Metadata about a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Trait for implementing tool execution protocols
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a tool with the given parameters
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Get metadata about available tools, in registration order
    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    /// Protocol identifier (e.g. "custom")
    fn protocol_name(&self) -> &str;
}

/// Error types for tool operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Requested tool is not registered in the current registry/protocol.
    NotFound(String),
    /// Tool execution completed with an application level failure.
    ExecutionFailed(String),
    /// The provided JSON parameters failed validation or coercion.
    InvalidParameters(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool not found: {}", name),
            ToolError::ExecutionFailed(msg) => write!(f, "Tool execution failed: {}", msg),
            ToolError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
        }
    }
}

impl Error for ToolError {}

// ---- Argument coercion ----
//
// The model is loose with JSON types: ids arrive as `3`, `3.0` or `"3"`.

/// Read an integer argument, accepting JSON numbers and numeric strings.
pub fn optional_i64(parameters: &JsonValue, name: &str) -> Result<Option<i64>, ToolError> {
    match parameters.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be an integer", name))),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ToolError::InvalidParameters(format!("'{}' must be an integer", name))),
        Some(_) => Err(ToolError::InvalidParameters(format!(
            "'{}' must be an integer",
            name
        ))),
    }
}

/// Read a required integer argument.
pub fn required_i64(parameters: &JsonValue, name: &str) -> Result<i64, ToolError> {
    optional_i64(parameters, name)?
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}'", name)))
}

/// Read a required floating point argument, accepting numbers and numeric strings.
pub fn required_f64(parameters: &JsonValue, name: &str) -> Result<f64, ToolError> {
    match parameters.get(name) {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be a number", name))),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ToolError::InvalidParameters(format!("'{}' must be a number", name))),
        None | Some(JsonValue::Null) => {
            Err(ToolError::InvalidParameters(format!("missing '{}'", name)))
        }
        Some(_) => Err(ToolError::InvalidParameters(format!(
            "'{}' must be a number",
            name
        ))),
    }
}

/// Read a string argument. Numbers are stringified.
pub fn optional_str(parameters: &JsonValue, name: &str) -> Option<String> {
    match parameters.get(name) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a required string argument.
pub fn required_str(parameters: &JsonValue, name: &str) -> Result<String, ToolError> {
    optional_str(parameters, name)
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}'", name)))
}

/// One named server group: a protocol plus the tool list discovered from it.
struct ServerGroup {
    name: String,
    protocol: Arc<dyn ToolProtocol>,
    tools: Vec<ToolMetadata>,
}

/// Registry for managing the tools available to the agent.
///
/// Built once at start-up and shared read-only (usually behind an `Arc`).
/// Groups keep their registration order; re-registering a group replaces its
/// tools in place. Tool names are not deduplicated: [`all_tools`](Self::all_tools)
/// returns every entry, and dispatch by name resolves to the *last* entry with
/// that name.
pub struct ToolRegistry {
    groups: Vec<ServerGroup>,
}

impl ToolRegistry {
    /// Create a registry with no groups.
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Register (or replace) the tool list for `group_name`.
    ///
    /// The protocol's tools are listed once, here; later changes inside the
    /// protocol are not picked up.
    pub async fn register(
        &mut self,
        group_name: &str,
        protocol: Arc<dyn ToolProtocol>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let tools = protocol.list_tools().await?;

        for (i, tool) in tools.iter().enumerate() {
            let shadowed_elsewhere = self
                .groups
                .iter()
                .filter(|g| g.name != group_name)
                .any(|g| g.tools.iter().any(|t| t.name == tool.name));
            let shadowed_in_group = tools[..i].iter().any(|t| t.name == tool.name);
            if shadowed_elsewhere || shadowed_in_group {
                log::warn!(
                    "tool '{}' from group '{}' shadows an earlier tool with the same name",
                    tool.name,
                    group_name
                );
            }
        }

        let group = ServerGroup {
            name: group_name.to_string(),
            protocol,
            tools,
        };
        match self.groups.iter_mut().find(|g| g.name == group_name) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
        Ok(())
    }

    /// Flatten every group's tools: group registration order, then list order.
    pub fn all_tools(&self) -> Vec<&ToolMetadata> {
        self.groups.iter().flat_map(|g| g.tools.iter()).collect()
    }

    /// Group names in registration order.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Borrow the tool list of a single group.
    pub fn tools_in_group(&self, group_name: &str) -> Option<&[ToolMetadata]> {
        self.groups
            .iter()
            .find(|g| g.name == group_name)
            .map(|g| g.tools.as_slice())
    }

    /// Borrow the metadata that dispatch would use for `name`.
    pub fn get_tool(&self, name: &str) -> Option<&ToolMetadata> {
        self.all_tools().into_iter().rev().find(|t| t.name == name)
    }

    /// Names listed more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for tool in self.all_tools() {
            let name = tool.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Total number of tool entries, duplicates included.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execute a named tool with serialized parameters.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let group = self
            .groups
            .iter()
            .rev()
            .find(|g| g.tools.iter().any(|t| t.name == tool_name))
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        log::debug!(
            "dispatching tool '{}' to group '{}' ({})",
            tool_name,
            group.name,
            group.protocol.protocol_name()
        );
        group.protocol.execute(tool_name, parameters).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockProtocol {
        label: &'static str,
        tools: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _parameters: JsonValue,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            Ok(ToolResult::success(json!(format!(
                "{} handled {}",
                self.label, tool_name
            ))))
        }

        async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
            Ok(self
                .tools
                .iter()
                .map(|name| ToolMetadata::new(*name, "mock tool"))
                .collect())
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    fn mock(label: &'static str, tools: Vec<&'static str>) -> Arc<dyn ToolProtocol> {
        Arc::new(MockProtocol { label, tools })
    }

    #[test]
    fn test_tool_parameter_builder() {
        let param = ToolParameter::new("course_id", ToolParameterType::Integer)
            .with_description("A course")
            .required()
            .with_default(json!(1));

        assert_eq!(param.name, "course_id");
        assert_eq!(param.param_type, ToolParameterType::Integer);
        assert_eq!(param.description, Some("A course".to_string()));
        assert!(param.required);
        assert_eq!(param.default, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_all_tools_is_concatenation_in_registration_order() {
        let mut registry = ToolRegistry::empty();
        registry
            .register("school", mock("school", vec!["a", "b", "c"]))
            .await
            .unwrap();
        registry
            .register("shop", mock("shop", vec!["d"]))
            .await
            .unwrap();

        let names: Vec<&str> = registry.all_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.group_names(), vec!["school", "shop"]);
    }

    #[tokio::test]
    async fn test_reregistering_group_keeps_position_and_replaces_tools() {
        let mut registry = ToolRegistry::empty();
        registry.register("first", mock("v1", vec!["a"])).await.unwrap();
        registry.register("second", mock("s", vec!["b"])).await.unwrap();
        registry
            .register("first", mock("v2", vec!["x", "y"]))
            .await
            .unwrap();

        assert_eq!(registry.group_names(), vec!["first", "second"]);
        let names: Vec<&str> = registry.all_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "b"]);
        assert!(registry.tools_in_group("first").unwrap().len() == 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_kept_and_last_registration_wins_dispatch() {
        let mut registry = ToolRegistry::empty();
        registry
            .register("early", mock("early", vec!["shared", "only_early"]))
            .await
            .unwrap();
        registry
            .register("late", mock("late", vec!["shared"]))
            .await
            .unwrap();

        assert_eq!(registry.all_tools().len(), 3);
        assert_eq!(registry.duplicate_names(), vec!["shared"]);

        let result = registry.execute_tool("shared", json!({})).await.unwrap();
        assert_eq!(result.as_text(), "late handled shared");

        let result = registry.execute_tool("only_early", json!({})).await.unwrap();
        assert_eq!(result.as_text(), "early handled only_early");
    }

    #[tokio::test]
    async fn test_duplicate_within_one_group_is_detected() {
        let mut registry = ToolRegistry::empty();
        registry
            .register("school", mock("school", vec!["by_student", "other", "by_student"]))
            .await
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.duplicate_names(), vec!["by_student"]);
        assert!(ToolRegistry::empty().duplicate_names().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::empty();
        let err = registry
            .execute_tool("missing", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_integer_coercion_accepts_numbers_and_numeric_strings() {
        let params = json!({"a": 3, "b": "7", "c": 4.0, "d": "x", "e": 2.5});
        assert_eq!(required_i64(&params, "a").unwrap(), 3);
        assert_eq!(required_i64(&params, "b").unwrap(), 7);
        assert_eq!(required_i64(&params, "c").unwrap(), 4);
        assert!(required_i64(&params, "d").is_err());
        assert!(required_i64(&params, "e").is_err());
        assert!(required_i64(&params, "missing").is_err());
        assert_eq!(optional_i64(&params, "missing").unwrap(), None);
    }

    #[test]
    fn test_float_and_string_coercion() {
        let params = json!({"price": "19.5", "max": 10, "name": "Ada", "id": 12});
        assert_eq!(required_f64(&params, "price").unwrap(), 19.5);
        assert_eq!(required_f64(&params, "max").unwrap(), 10.0);
        assert_eq!(required_str(&params, "name").unwrap(), "Ada");
        assert_eq!(required_str(&params, "id").unwrap(), "12");
        assert!(required_str(&params, "nope").is_err());
    }

    #[test]
    fn test_tool_result_text_rendering() {
        assert_eq!(ToolResult::success(json!("plain")).as_text(), "plain");
        assert_eq!(ToolResult::success(json!({"k": 1})).as_text(), "{\"k\":1}");
        assert_eq!(ToolResult::failure("boom".into()).as_text(), "boom");
    }
}
