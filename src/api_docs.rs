use crate::api;
use crate::domain;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::students::create_student,
        api::students::bulk_create_students,
        api::students::list_students,
        api::students::get_student,
        api::students::update_student,
        api::students::delete_student,
        api::students::enroll,
        api::students::unenroll,
        api::courses::create_course,
        api::courses::list_courses,
        api::courses::get_course,
        api::courses::update_course,
        api::courses::delete_course,
        api::courses::list_course_students,
    ),
    components(
        schemas(
            domain::Student,
            domain::Course,
            domain::CreateStudentInput,
            domain::BulkCreateStudentsInput,
            domain::UpdateStudentInput,
            domain::CreateCourseInput,
            domain::UpdateCourseInput,
            domain::BulkCreateReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "students", description = "Student records"),
        (name = "courses", description = "Course records"),
        (name = "enrollment", description = "Student/course associations")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-KEY"))),
            );
        }
    }
}
