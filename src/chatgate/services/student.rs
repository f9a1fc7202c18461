//! Student service tools.

use serde_json::{json, Value as JsonValue};

use super::client::ServiceClient;
use super::render::{field_text, id_query, list_reply, parse_id_set, reply, Outcome};
use super::ToolOutput;
use crate::chatgate::tool_protocol::{
    optional_str, required_i64, required_str, ToolMetadata, ToolParameter, ToolParameterType,
    ToolResult,
};
use crate::chatgate::tool_protocols::CustomToolProtocol;

pub async fn courses_by_student_id(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let student_id = required_i64(params, "student_id")?;
    Ok(match client.get_json(&format!("/{}/courses", student_id), &[]).await {
        Ok(body) => list_reply(
            &body,
            &format!("Courses enrolled by student {}", student_id),
            format!("No courses found for student with ID {}.", student_id),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching courses for student {}: {}", student_id, e),
        ),
    })
}

/// Shared by the two "enrolled in any of these courses" tools.
async fn students_by_course_id_list(client: &ServiceClient, raw_ids: &str) -> ToolResult {
    let ids = parse_id_set(raw_ids);
    match client.get_json("/by-courses", &id_query(&ids)).await {
        Ok(body) => list_reply(
            &body,
            &format!("Students enrolled in courses {}", raw_ids),
            format!("No students found for course IDs: {}.", raw_ids),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching students for course IDs {}: {}", raw_ids, e),
        ),
    }
}

pub async fn students_by_course_ids(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let course_ids = required_str(params, "course_ids")?;
    Ok(students_by_course_id_list(client, &course_ids).await)
}

pub async fn students_by_courses(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let ids = required_str(params, "ids")?;
    Ok(students_by_course_id_list(client, &ids).await)
}

pub async fn students_with_common_courses(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/common-courses", &[]).await {
        Ok(body) => list_reply(
            &body,
            "Students with common courses",
            "No students found with common courses.".to_string(),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching students with common courses: {}", e),
        ),
    })
}

pub async fn common_courses_grouped(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/common-courses-grouped", &[]).await {
        Ok(body) => list_reply(
            &body,
            "Common courses among student groups",
            "No common courses found among student groups.".to_string(),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching common courses among student groups: {}", e),
        ),
    })
}

pub async fn students_sharing_a_course(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let student_id = required_str(params, "student_id")?;
    let path = format!("/{}/similar-students", urlencoding::encode(student_id.trim()));
    Ok(match client.get_json(&path, &[]).await {
        Ok(body) => list_reply(
            &body,
            "Students who share at least one course",
            "No students found who share at least one course.".to_string(),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching students who share at least one course: {}", e),
        ),
    })
}

pub async fn students_with_no_courses(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/students-with-no-courses", &[]).await {
        Ok(body) => list_reply(
            &body,
            "Students with no courses",
            "All students are enrolled in at least one course.".to_string(),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching students with no courses: {}", e),
        ),
    })
}

pub async fn students_with_no_course_and_professor(
    client: &ServiceClient,
    _params: &JsonValue,
) -> ToolOutput {
    Ok(
        match client
            .get_json("/students-with-no-course-and-professors", &[])
            .await
        {
            Ok(body) => list_reply(
                &body,
                "Students with no courses and no assigned professor",
                "All students are either enrolled in courses or have an assigned professor."
                    .to_string(),
            ),
            Err(e) => reply(
                Outcome::Error,
                format!(
                    "Error fetching students with no courses and no assigned professor: {}",
                    e
                ),
            ),
        },
    )
}

pub async fn students_in_all_courses(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let ids = parse_id_set(&required_str(params, "ids")?);
    Ok(match client.get_json("/by-all-courses", &id_query(&ids)).await {
        Ok(body) => list_reply(
            &body,
            "Students enrolled in all courses",
            "No students found who are enrolled in all courses.".to_string(),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching students enrolled in all courses: {}", e),
        ),
    })
}

pub async fn enroll_student(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let student_id = required_i64(params, "student_id")?;
    let course_id = required_i64(params, "course_id")?;
    let path = format!("/{}/enroll/{}", student_id, course_id);
    Ok(match client.post_empty(&path).await {
        Ok(text) if text.trim().is_empty() => {
            reply(Outcome::Ok, "Student enrolled successfully.".to_string())
        }
        Ok(text) => reply(Outcome::Ok, text),
        Err(e) => reply(
            Outcome::Error,
            format!(
                "Error enrolling student {} in course {}: {}",
                student_id, course_id, e
            ),
        ),
    })
}

pub async fn create_student(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let name = required_str(params, "name")?;
    let courses: Vec<JsonValue> = optional_str(params, "course_ids")
        .map(|raw| {
            parse_id_set(&raw)
                .into_iter()
                .map(|id| json!({ "id": id }))
                .collect()
        })
        .unwrap_or_default();
    let payload = json!({ "id": null, "name": name, "courses": courses });

    Ok(match client.post_json("/create", &payload).await {
        Ok(student) => reply(
            Outcome::Ok,
            format!(
                "Student created: {} (ID: {})",
                field_text(&student, "name", "unknown"),
                field_text(&student, "id", "unknown")
            ),
        ),
        Err(e) => reply(Outcome::Error, format!("Error creating student: {}", e)),
    })
}

/// Register the student tools on `protocol`, in catalogue order.
pub async fn register_tools(protocol: &CustomToolProtocol, client: &ServiceClient) {
    let student_id = || {
        ToolParameter::new("student_id", ToolParameterType::Integer)
            .with_description("Identifier of the student")
            .required()
    };
    let id_list = |name: &str| {
        ToolParameter::new(name, ToolParameterType::String)
            .with_description("Comma-separated course IDs, e.g. \"1,2,3\"")
            .required()
    };

    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_courses_by_student_id",
            "Fetch the list of courses a student is enrolled in, given the student's ID. \
             Use for queries like \"Get courses for student 1\" or \"Which classes is student 2 taking?\"",
        )
        .with_parameter(student_id()),
        courses_by_student_id
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_by_course_ids",
            "Fetch students enrolled in at least one of the given course IDs (comma-separated).",
        )
        .with_parameter(id_list("course_ids")),
        students_by_course_ids
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_with_common_courses",
            "Fetch students who share at least one course with the other students.",
        ),
        students_with_common_courses
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_course_from_common_courses_grouped",
            "Fetch courses that are common among groups of students.",
        ),
        common_courses_grouped
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_shares_atleast_one_course",
            "Fetch students who share at least one course with the given student id.",
        )
        .with_parameter(
            ToolParameter::new("student_id", ToolParameterType::String)
                .with_description("Identifier of the student")
                .required(),
        ),
        students_sharing_a_course
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_with_no_courses",
            "Fetch students who are not enrolled in any courses.",
        ),
        students_with_no_courses
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_with_no_course_and_professor",
            "Fetch students who are not enrolled in any courses and have no assigned professor.",
        ),
        students_with_no_course_and_professor
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_by_courses",
            "Fetch students enrolled in at least one of the given course IDs (comma-separated). \
             Example: ids=\"1,2,3\"",
        )
        .with_parameter(id_list("ids")),
        students_by_courses
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_students_in_all_courses",
            "Fetch students who are enrolled in all of the given courses.",
        )
        .with_parameter(id_list("ids")),
        students_in_all_courses
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "enroll_student_in_course",
            "Enroll a student in a course by student ID and course ID.",
        )
        .with_parameter(student_id())
        .with_parameter(
            ToolParameter::new("course_id", ToolParameterType::Integer)
                .with_description("Identifier of the course")
                .required(),
        ),
        enroll_student
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "create_student",
            "Create a new student with a name and optional comma-separated course IDs.",
        )
        .with_parameter(
            ToolParameter::new("name", ToolParameterType::String)
                .with_description("Full name of the student")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("course_ids", ToolParameterType::String)
                .with_description("Comma-separated course IDs to enroll in")
                .with_default(json!("")),
        ),
        create_student
    );
}
