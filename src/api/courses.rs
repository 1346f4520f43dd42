use axum::{Json, extract::State, http::StatusCode};

use super::extract::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::domain::{
    Course, CourseFilter, CreateCourseInput, DomainError, RosterFilter, Student,
    UpdateCourseInput,
};
use crate::infrastructure::AppState;

#[utoipa::path(
    post,
    path = "/courses/",
    tag = "courses",
    request_body = CreateCourseInput,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 422, description = "Invalid payload")
    ),
    security(("api_key" = []))
)]
pub async fn create_course(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCourseInput>,
) -> Result<(StatusCode, Json<Course>), DomainError> {
    let course = state.course_repo.create(input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/courses/",
    tag = "courses",
    params(CourseFilter),
    responses(
        (status = 200, description = "One page of courses", body = [Course]),
        (status = 422, description = "Invalid pagination or sort key")
    ),
    security(("api_key" = []))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<CourseFilter>,
) -> Result<Json<Vec<Course>>, DomainError> {
    let courses = state.course_repo.find_all(filter).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Course not found")
    ),
    security(("api_key" = []))
)]
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Course>, DomainError> {
    state
        .course_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(DomainError::NotFound("Course not found"))
}

#[utoipa::path(
    put,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = i32, Path, description = "Course id")),
    request_body = UpdateCourseInput,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 404, description = "Course not found")
    ),
    security(("api_key" = []))
)]
pub async fn update_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(input): ValidatedJson<UpdateCourseInput>,
) -> Result<Json<Course>, DomainError> {
    let course = state.course_repo.update(id, input).await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course and its enrollments deleted"),
        (status = 404, description = "Course not found")
    ),
    security(("api_key" = []))
)]
pub async fn delete_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, DomainError> {
    state.course_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/courses/{id}/students",
    tag = "enrollment",
    params(("id" = i32, Path, description = "Course id"), RosterFilter),
    responses(
        (status = 200, description = "Students enrolled in the course", body = [Student]),
        (status = 404, description = "Course not found")
    ),
    security(("api_key" = []))
)]
pub async fn list_course_students(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedQuery(filter): ValidatedQuery<RosterFilter>,
) -> Result<Json<Vec<Student>>, DomainError> {
    let students = state.student_repo.find_by_course(id, filter).await?;
    Ok(Json(students))
}
