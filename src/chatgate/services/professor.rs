//! Professor service tools.

use serde_json::{json, Value as JsonValue};

use super::client::{Lookup, ServiceClient};
use super::render::{field_text, list_reply, reply, Outcome};
use super::ToolOutput;
use crate::chatgate::tool_protocol::{
    required_i64, required_str, ToolMetadata, ToolParameter, ToolParameterType,
};
use crate::chatgate::tool_protocols::CustomToolProtocol;

pub async fn professor_for_course(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let course_id = required_i64(params, "course_id")?;
    let path = format!("/courses/{}/professor", course_id);
    Ok(match client.get_resource(&path).await {
        Ok(Lookup::Found(professor)) => reply(
            Outcome::Ok,
            format!(
                "Professor for course {}: {}",
                course_id,
                field_text(&professor, "name", "Unknown")
            ),
        ),
        Ok(Lookup::NotFound) => reply(
            Outcome::NotFound,
            format!("No professor found for course {}.", course_id),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching professor for course {}: {}", course_id, e),
        ),
    })
}

pub async fn professors_with_multiple_courses(
    client: &ServiceClient,
    _params: &JsonValue,
) -> ToolOutput {
    Ok(match client.get_json("/multiple-courses", &[]).await {
        Ok(body) => list_reply(
            &body,
            "Professors with multiple courses",
            "No professors found with multiple courses.".to_string(),
        ),
        Err(e) => reply(Outcome::Error, format!("Error fetching professors: {}", e)),
    })
}

pub async fn students_by_professor(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let professor_id = required_i64(params, "professor_id")?;
    let path = format!("/{}/students", professor_id);
    Ok(match client.get_json(&path, &[]).await {
        Ok(body) => list_reply(
            &body,
            &format!("Students taught by professor {}", professor_id),
            format!("No students found for professor {}.", professor_id),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!(
                "Error fetching students for professor {}: {}",
                professor_id, e
            ),
        ),
    })
}

pub async fn create_professor(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let name = required_str(params, "name")?;
    let payload = json!({ "id": null, "name": name });
    Ok(match client.post_json("/create", &payload).await {
        Ok(professor) => reply(
            Outcome::Ok,
            format!(
                "Professor created: {} (ID: {})",
                field_text(&professor, "name", "unknown"),
                field_text(&professor, "id", "unknown")
            ),
        ),
        Err(e) => reply(Outcome::Error, format!("Error creating professor: {}", e)),
    })
}

/// Register the professor tools on `protocol`, in catalogue order.
pub async fn register_tools(protocol: &CustomToolProtocol, client: &ServiceClient) {
    let id_param = |name: &str, description: &str| {
        ToolParameter::new(name, ToolParameterType::Integer)
            .with_description(description)
            .required()
    };

    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_professor_for_course",
            "Fetch the professor for a given course ID.",
        )
        .with_parameter(id_param("course_id", "Identifier of the course")),
        professor_for_course
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_professors_with_multiple_courses",
            "Fetch professors who teach multiple courses.",
        ),
        professors_with_multiple_courses
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_by_professor",
            "Fetch students taught by a specific professor.",
        )
        .with_parameter(id_param("professor_id", "Identifier of the professor")),
        students_by_professor
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("create_professor", "Create a new professor with the given name.")
            .with_parameter(
                ToolParameter::new("name", ToolParameterType::String)
                    .with_description("Full name of the professor")
                    .required(),
            ),
        create_professor
    );
}
