pub mod courses;
pub mod error;
pub mod extract;
pub mod students;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::infrastructure::AppState;
use crate::infrastructure::auth::require_api_key;

/// Every route below sits behind the API key check.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Students
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/bulk", post(students::bulk_create_students))
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        // Enrollment
        .route("/students/:id/enroll/:course_id", post(students::enroll))
        .route("/students/:id/unenroll/:course_id", post(students::unenroll))
        .route("/courses/:id/students", get(courses::list_course_students))
        // Courses
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .with_state(state)
}
