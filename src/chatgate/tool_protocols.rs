//! Tool Protocol Implementations
//!
//! [`CustomToolProtocol`] turns async Rust closures into tools. Every service
//! group in [`services`](crate::services) is one `CustomToolProtocol` whose
//! closures call the downstream REST API.
//!
//! ```rust
//! use chatgate::tool_protocol::{ToolMetadata, ToolProtocol, ToolResult};
//! use chatgate::tool_protocols::{async_tool, CustomToolProtocol};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let protocol = CustomToolProtocol::new();
//! protocol
//!     .register_async_tool(
//!         ToolMetadata::new("ping", "Answer with pong"),
//!         async_tool(|_params| async { Ok(ToolResult::success("pong".into())) }),
//!     )
//!     .await;
//!
//! let result = protocol.execute("ping", serde_json::json!({})).await.unwrap();
//! assert_eq!(result.as_text(), "pong");
//! # }
//! ```

use crate::chatgate::tool_protocol::{ToolError, ToolMetadata, ToolProtocol, ToolResult};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Boxed future returned by every tool function.
pub type ToolFuture =
    Pin<Box<dyn Future<Output = Result<ToolResult, Box<dyn Error + Send + Sync>>> + Send>>;

/// Type alias for asynchronous tool functions exposed via the custom adapter.
pub type AsyncToolFunction = Arc<dyn Fn(JsonValue) -> ToolFuture + Send + Sync>;

/// Wrap an `async` closure into an [`AsyncToolFunction`].
pub fn async_tool<F, Fut>(function: F) -> AsyncToolFunction
where
    F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, Box<dyn Error + Send + Sync>>> + Send + 'static,
{
    Arc::new(move |params| -> ToolFuture { Box::pin(function(params)) })
}

/// Custom function-calling tool adapter.
///
/// Listing preserves registration order and keeps every registered entry.
/// Registering a name twice replaces the function, so both listed entries
/// dispatch to the latest one.
pub struct CustomToolProtocol {
    tools: Arc<RwLock<Vec<ToolMetadata>>>,
    functions: Arc<RwLock<HashMap<String, AsyncToolFunction>>>,
}

impl CustomToolProtocol {
    /// Create an empty adapter ready to accept new tool registrations.
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(Vec::new())),
            functions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an asynchronous tool function.
    ///
    /// Returns `true` when the name was already taken and the earlier
    /// function is now shadowed.
    pub async fn register_async_tool(
        &self,
        metadata: ToolMetadata,
        function: AsyncToolFunction,
    ) -> bool {
        let name = metadata.name.clone();
        self.tools.write().await.push(metadata);
        let shadowed = self
            .functions
            .write()
            .await
            .insert(name.clone(), function)
            .is_some();
        if shadowed {
            log::warn!(
                "tool '{}' registered twice; calls now go to the later registration",
                name
            );
        }
        shadowed
    }

    /// Number of listed entries.
    pub async fn len(&self) -> usize {
        self.tools.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tools.read().await.is_empty()
    }
}

impl Default for CustomToolProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProtocol for CustomToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        // Clone the Arc out so the lock is not held across the call.
        let function = {
            let functions = self.functions.read().await;
            functions.get(tool_name).cloned()
        };

        match function {
            Some(func) => func(parameters).await,
            None => Err(Box::new(ToolError::NotFound(tool_name.to_string()))),
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(self.tools.read().await.clone())
    }

    fn protocol_name(&self) -> &str {
        "custom"
    }
}
