//! Downstream service tools.
//!
//! Each submodule wraps one REST microservice. A tool function issues a single
//! request through a [`ServiceClient`] and answers with a sentence: the
//! collection rendered as names, a fixed "nothing found" line, or an
//! `"Error ..."` line. Failures never escape as `Err`; only bad arguments do.
//!
//! [`default_registry`] groups them the way the chat agent sees them:
//!
//! | group | tools |
//! |---|---|
//! | `student-course-professor` | student, then course, then professor tools |
//! | `webflux` | product tools |
//! | `json-to-java` | movie tools |

use std::error::Error;
use std::sync::Arc;

use crate::chatgate::config::ServiceEndpoints;
use crate::chatgate::tool_protocol::{ToolRegistry, ToolResult};
use crate::chatgate::tool_protocols::CustomToolProtocol;

/// Register `$handler(&ServiceClient, &JsonValue)` as a tool on `$protocol`.
macro_rules! register_tool {
    ($protocol:expr, $client:expr, $metadata:expr, $handler:path) => {{
        let client = $client.clone();
        $protocol
            .register_async_tool(
                $metadata,
                $crate::chatgate::tool_protocols::async_tool(move |params| {
                    let client = client.clone();
                    async move { $handler(&client, &params).await }
                }),
            )
            .await;
    }};
}

pub mod client;
pub mod course;
pub mod movie;
pub mod product;
pub mod professor;
pub mod render;
pub mod student;

pub use client::{Lookup, ServiceClient, ServiceError};
pub use render::{parse_id_set, RenderedItem};

/// What every tool function returns.
pub type ToolOutput = Result<ToolResult, Box<dyn Error + Send + Sync>>;

pub const STUDENT_COURSE_PROFESSOR_GROUP: &str = "student-course-professor";
pub const WEBFLUX_GROUP: &str = "webflux";
pub const JSON_TO_JAVA_GROUP: &str = "json-to-java";

/// Student, course and professor tools in one protocol.
///
/// Both the student and the course service expose `get_courses_by_student_id`;
/// the course variant is registered later and answers dispatch.
pub async fn student_course_professor_tools(
    endpoints: &ServiceEndpoints,
    timeout_secs: u64,
) -> CustomToolProtocol {
    let protocol = CustomToolProtocol::new();
    student::register_tools(
        &protocol,
        &ServiceClient::with_timeout(&endpoints.student, timeout_secs),
    )
    .await;
    course::register_tools(
        &protocol,
        &ServiceClient::with_timeout(&endpoints.course, timeout_secs),
    )
    .await;
    professor::register_tools(
        &protocol,
        &ServiceClient::with_timeout(&endpoints.professor, timeout_secs),
    )
    .await;
    protocol
}

pub async fn webflux_tools(endpoints: &ServiceEndpoints, timeout_secs: u64) -> CustomToolProtocol {
    let protocol = CustomToolProtocol::new();
    product::register_tools(
        &protocol,
        &ServiceClient::with_timeout(&endpoints.webflux, timeout_secs),
    )
    .await;
    protocol
}

pub async fn json_to_java_tools(
    endpoints: &ServiceEndpoints,
    timeout_secs: u64,
) -> CustomToolProtocol {
    let protocol = CustomToolProtocol::new();
    movie::register_tools(
        &protocol,
        &ServiceClient::with_timeout(&endpoints.json_to_java, timeout_secs),
    )
    .await;
    protocol
}

/// Build the registry with all three server groups, in their fixed order.
pub async fn default_registry(
    endpoints: &ServiceEndpoints,
    timeout_secs: u64,
) -> Result<ToolRegistry, Box<dyn Error + Send + Sync>> {
    let mut registry = ToolRegistry::empty();
    registry
        .register(
            STUDENT_COURSE_PROFESSOR_GROUP,
            Arc::new(student_course_professor_tools(endpoints, timeout_secs).await),
        )
        .await?;
    registry
        .register(
            WEBFLUX_GROUP,
            Arc::new(webflux_tools(endpoints, timeout_secs).await),
        )
        .await?;
    registry
        .register(
            JSON_TO_JAVA_GROUP,
            Arc::new(json_to_java_tools(endpoints, timeout_secs).await),
        )
        .await?;
    Ok(registry)
}
