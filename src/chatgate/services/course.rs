//! Course service tools.

use serde_json::{json, Value as JsonValue};

use super::client::ServiceClient;
use super::render::{field_text, list_reply, reply, Outcome};
use super::ToolOutput;
use crate::chatgate::tool_protocol::{
    optional_i64, required_i64, required_str, ToolMetadata, ToolParameter, ToolParameterType,
};
use crate::chatgate::tool_protocols::CustomToolProtocol;

pub async fn courses_for_student(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let student_id = required_i64(params, "student_id")?;
    let path = format!("/students/{}/courses", student_id);
    Ok(match client.get_json(&path, &[]).await {
        Ok(body) => list_reply(
            &body,
            &format!("Courses for student {}", student_id),
            format!("No courses found for student {}.", student_id),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching courses for student {}: {}", student_id, e),
        ),
    })
}

pub async fn courses_with_students(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/with-students", &[]).await {
        Ok(body) => reply(Outcome::Ok, format!("Courses with students: {}", body)),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching courses with students: {}", e),
        ),
    })
}

pub async fn courses_with_professors(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/with-professors", &[]).await {
        Ok(body) => reply(Outcome::Ok, format!("Courses with professors: {}", body)),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching courses with professors: {}", e),
        ),
    })
}

pub async fn create_course(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let name = required_str(params, "name")?;
    let mut payload = json!({ "id": null, "name": name });
    if let Some(professor_id) = optional_i64(params, "professor_id")? {
        payload["professor"] = json!({ "id": professor_id });
    }

    Ok(match client.post_json("/create", &payload).await {
        Ok(course) => reply(
            Outcome::Ok,
            format!(
                "Course created: {} (ID: {})",
                field_text(&course, "name", "unknown"),
                field_text(&course, "id", "unknown")
            ),
        ),
        Err(e) => reply(Outcome::Error, format!("Error creating course: {}", e)),
    })
}

/// Register the course tools on `protocol`, in catalogue order.
pub async fn register_tools(protocol: &CustomToolProtocol, client: &ServiceClient) {
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_courses_by_student_id",
            "Fetch all courses for a given student ID.",
        )
        .with_parameter(
            ToolParameter::new("student_id", ToolParameterType::Integer)
                .with_description("Identifier of the student")
                .required(),
        ),
        courses_for_student
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_all_courses_with_students",
            "Fetch all courses with their enrolled students.",
        ),
        courses_with_students
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_courses_with_professors",
            "Fetch all courses with their professors.",
        ),
        courses_with_professors
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "create_course",
            "Create a new course with a name and optional professor ID.",
        )
        .with_parameter(
            ToolParameter::new("name", ToolParameterType::String)
                .with_description("Course name")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("professor_id", ToolParameterType::Integer)
                .with_description("Professor teaching the course"),
        ),
        create_course
    );
}
