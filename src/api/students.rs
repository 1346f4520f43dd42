use axum::{Json, extract::State, http::StatusCode};

use super::extract::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::domain::{
    BulkCreateReport, BulkCreateStudentsInput, CreateStudentInput, DomainError, Student,
    StudentFilter, UpdateStudentInput,
};
use crate::infrastructure::AppState;

#[utoipa::path(
    post,
    path = "/students/",
    tag = "students",
    request_body = CreateStudentInput,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 409, description = "Email already exists"),
        (status = 422, description = "Invalid payload")
    ),
    security(("api_key" = []))
)]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateStudentInput>,
) -> Result<(StatusCode, Json<Student>), DomainError> {
    let student = state.student_repo.create(input).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Creates every candidate whose email is free; fails only when none is.
#[utoipa::path(
    post,
    path = "/students/bulk",
    tag = "students",
    request_body = BulkCreateStudentsInput,
    responses(
        (status = 201, description = "Some or all students created", body = BulkCreateReport),
        (status = 409, description = "No student could be created")
    ),
    security(("api_key" = []))
)]
pub async fn bulk_create_students(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<BulkCreateStudentsInput>,
) -> Result<(StatusCode, Json<BulkCreateReport>), DomainError> {
    let report = state.student_repo.bulk_create(input.students).await?;

    if report.created.is_empty() && !report.errors.is_empty() {
        return Err(DomainError::BulkRejected(report.errors));
    }

    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/students/",
    tag = "students",
    params(StudentFilter),
    responses(
        (status = 200, description = "One page of students", body = [Student]),
        (status = 422, description = "Invalid pagination or sort key")
    ),
    security(("api_key" = []))
)]
pub async fn list_students(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<StudentFilter>,
) -> Result<Json<Vec<Student>>, DomainError> {
    let students = state.student_repo.find_all(filter).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student with its courses", body = Student),
        (status = 404, description = "Student not found")
    ),
    security(("api_key" = []))
)]
pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Student>, DomainError> {
    state
        .student_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(DomainError::NotFound("Student not found"))
}

#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    request_body = UpdateStudentInput,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Email already exists")
    ),
    security(("api_key" = []))
)]
pub async fn update_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(input): ValidatedJson<UpdateStudentInput>,
) -> Result<Json<Student>, DomainError> {
    let student = state.student_repo.update(id, input).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student and its enrollments deleted"),
        (status = 404, description = "Student not found")
    ),
    security(("api_key" = []))
)]
pub async fn delete_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, DomainError> {
    state.student_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/students/{id}/enroll/{course_id}",
    tag = "enrollment",
    params(
        ("id" = i32, Path, description = "Student id"),
        ("course_id" = i32, Path, description = "Course id")
    ),
    responses(
        (status = 200, description = "Student with its courses", body = Student),
        (status = 404, description = "Student or course not found")
    ),
    security(("api_key" = []))
)]
pub async fn enroll(
    State(state): State<AppState>,
    ApiPath((id, course_id)): ApiPath<(i32, i32)>,
) -> Result<Json<Student>, DomainError> {
    let student = state.student_repo.enroll(id, course_id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    post,
    path = "/students/{id}/unenroll/{course_id}",
    tag = "enrollment",
    params(
        ("id" = i32, Path, description = "Student id"),
        ("course_id" = i32, Path, description = "Course id")
    ),
    responses(
        (status = 200, description = "Student with its courses", body = Student),
        (status = 404, description = "Student or course not found")
    ),
    security(("api_key" = []))
)]
pub async fn unenroll(
    State(state): State<AppState>,
    ApiPath((id, course_id)): ApiPath<(i32, i32)>,
) -> Result<Json<Student>, DomainError> {
    let student = state.student_repo.unenroll(id, course_id).await?;
    Ok(Json(student))
}
