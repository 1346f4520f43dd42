use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use registrar::db;
use registrar::infrastructure::AppState;
use registrar::models::{student, student_course};
use registrar::server;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

const API_KEY: &str = "test-key";

// Helper to create a test app over a fresh in-memory database
async fn setup_test_app() -> (Router, AppState) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(db, API_KEY);
    (server::build_router(state.clone(), &[]), state)
}

// Helper to send an authenticated request and decode the JSON body
async fn send(app: &Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("X-API-KEY", API_KEY);

    let req = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn create_student(app: &Router, name: &str, email: &str, age: i32) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/students/",
        Some(json!({ "name": name, "email": email, "age": age })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

async fn create_course(app: &Router, title: &str, credits: i32) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/courses/",
        Some(json!({ "title": title, "credits": credits })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

async fn enrollment_rows(state: &AppState) -> u64 {
    student_course::Entity::find()
        .count(state.db())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_and_get_student() {
    let (app, _) = setup_test_app().await;

    let id = create_student(&app, "Ada Lovelace", "Ada@Example.com", 36).await;

    let (status, json) = send(&app, "GET", &format!("/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Ada Lovelace");
    assert_eq!(json["email"], "ada@example.com");
    assert_eq!(json["age"], 36);
    assert_eq!(json["courses"], json!([]));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict_and_creates_nothing() {
    let (app, state) = setup_test_app().await;
    create_student(&app, "Ada", "ada@example.com", 36).await;

    let (status, json) = send(
        &app,
        "POST",
        "/students/",
        Some(json!({ "name": "Imposter", "email": "ADA@example.com", "age": 20 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Email already exists");
    let total = student::Entity::find().count(state.db()).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_create_student_validation() {
    let (app, _) = setup_test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/students/",
        Some(json!({ "name": "A", "email": "a@example.com", "age": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/students/",
        Some(json!({ "name": "Ada", "email": "not-an-email", "age": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "POST", "/students/", Some(json!({ "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bulk_create_intra_batch_duplicates() {
    let (app, state) = setup_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/students/bulk",
        Some(json!({ "students": [
            { "name": "Ada", "email": "x@example.com", "age": 20 },
            { "name": "Bob", "email": "x@example.com", "age": 21 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["details"],
        json!(["Duplicate emails in payload: x@example.com"])
    );
    let total = student::Entity::find().count(state.db()).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_bulk_create_partial_success() {
    let (app, state) = setup_test_app().await;
    create_student(&app, "Existing", "old@example.com", 40).await;

    let (status, json) = send(
        &app,
        "POST",
        "/students/bulk",
        Some(json!({ "students": [
            { "name": "Ada", "email": "old@example.com", "age": 20 },
            { "name": "Bob", "email": "new@example.com", "age": 21 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created = json["created"].as_array().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["name"], "Bob");
    assert_eq!(json["errors"], json!(["Emails already exist: old@example.com"]));

    let total = student::Entity::find().count(state.db()).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_bulk_create_all_new_keeps_input_order() {
    let (app, _) = setup_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/students/bulk",
        Some(json!({ "students": [
            { "name": "Zed", "email": "zed@example.com", "age": 30 },
            { "name": "Amy", "email": "amy@example.com", "age": 31 },
            { "name": "Max", "email": "max@example.com", "age": 32 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let names: Vec<&str> = json["created"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Zed", "Amy", "Max"]);
    assert_eq!(json["errors"], json!([]));
}

#[tokio::test]
async fn test_bulk_create_rejects_invalid_record() {
    let (app, state) = setup_test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/students/bulk",
        Some(json!({ "students": [
            { "name": "Ada", "email": "ada@example.com", "age": 20 },
            { "name": "B", "email": "b@example.com", "age": 21 }
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let total = student::Entity::find().count(state.db()).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_enroll_twice_is_idempotent() {
    let (app, state) = setup_test_app().await;
    let student_id = create_student(&app, "Ada", "ada@example.com", 36).await;
    let course_id = create_course(&app, "Analytical Engines", 5).await;
    let uri = format!("/students/{}/enroll/{}", student_id, course_id);

    let (status, first) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["courses"], second["courses"]);
    assert_eq!(second["courses"].as_array().unwrap().len(), 1);
    assert_eq!(second["courses"][0]["title"], "Analytical Engines");
    assert_eq!(enrollment_rows(&state).await, 1);
}

#[tokio::test]
async fn test_enroll_missing_side_is_not_found() {
    let (app, _) = setup_test_app().await;
    let student_id = create_student(&app, "Ada", "ada@example.com", 36).await;
    let course_id = create_course(&app, "Analytical Engines", 5).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/students/{}/enroll/999", student_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Student or course not found");

    let (status, json) = send(
        &app,
        "POST",
        &format!("/students/999/enroll/{}", course_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Student or course not found");
}

#[tokio::test]
async fn test_unenroll_not_enrolled_is_noop() {
    let (app, state) = setup_test_app().await;
    let student_id = create_student(&app, "Ada", "ada@example.com", 36).await;
    let enrolled = create_course(&app, "Algebra", 3).await;
    let other = create_course(&app, "Botany", 2).await;

    send(
        &app,
        "POST",
        &format!("/students/{}/enroll/{}", student_id, enrolled),
        None,
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/students/{}/unenroll/{}", student_id, other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["courses"].as_array().unwrap().len(), 1);
    assert_eq!(json["courses"][0]["title"], "Algebra");
    assert_eq!(enrollment_rows(&state).await, 1);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/students/{}/unenroll/{}", student_id, enrolled),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["courses"], json!([]));
    assert_eq!(enrollment_rows(&state).await, 0);
}

#[tokio::test]
async fn test_list_students_pagination_bounds() {
    let (app, _) = setup_test_app().await;
    for i in 0..12 {
        create_student(&app, &format!("Student {:02}", i), &format!("s{}@example.com", i), 20).await;
    }

    let (status, json) = send(&app, "GET", "/students/?skip=0&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 10);

    let (status, json) = send(&app, "GET", "/students/?skip=10&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    // Default page size
    let (status, json) = send(&app, "GET", "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 10);

    let (status, _) = send(&app, "GET", "/students/?limit=101", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "GET", "/students/?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "GET", "/students/?skip=-1", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_offset_beyond_storage_range_is_rejected() {
    let (app, _) = setup_test_app().await;
    create_student(&app, "Ada", "ada@example.com", 36).await;

    let (status, json) = send(&app, "GET", "/students/?skip=18446744073709551615", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());

    let (status, _) = send(&app, "GET", "/courses/?skip=9223372036854775808", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send(&app, "GET", "/students/?skip=9223372036854775807", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_bulk_create_large_batch() {
    let (app, state) = setup_test_app().await;

    let students: Vec<Value> = (0..8000)
        .map(|i| json!({"name": format!("Student {}", i), "email": format!("s{}@example.com", i), "age": 20}))
        .collect();
    let (status, json) = send(&app, "POST", "/students/bulk", Some(json!({ "students": students }))).await;

    assert_eq!(status, StatusCode::CREATED);
    let created = json["created"].as_array().unwrap();
    assert_eq!(created.len(), 8000);
    assert_eq!(created[0]["email"], "s0@example.com");
    assert_eq!(created[7999]["email"], "s7999@example.com");
    assert_eq!(json["errors"], json!([]));

    let total = student::Entity::find().count(state.db()).await.unwrap();
    assert_eq!(total, 8000);
}

#[tokio::test]
async fn test_list_students_filter_and_order() {
    let (app, _) = setup_test_app().await;
    create_student(&app, "Charlie Brown", "charlie@example.com", 30).await;
    create_student(&app, "alice brown", "alice@example.com", 25).await;
    create_student(&app, "Bob Smith", "bob@example.com", 20).await;

    let (status, json) = send(&app, "GET", "/students/?name=BROWN&order_by=name", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Charlie Brown", "alice brown"]);

    let (status, json) = send(&app, "GET", "/students/?order_by=age", None).await;
    assert_eq!(status, StatusCode::OK);
    let ages: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![20, 25, 30]);

    let (status, _) = send(&app, "GET", "/students/?order_by=email", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_student_changes_only_given_fields() {
    let (app, _) = setup_test_app().await;
    let id = create_student(&app, "Ada", "ada@example.com", 36).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/students/{}", id),
        Some(json!({ "age": 37 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Ada");
    assert_eq!(json["email"], "ada@example.com");
    assert_eq!(json["age"], 37);

    let (status, _) = send(&app, "PUT", "/students/999", Some(json!({ "age": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_student_to_taken_email_is_conflict() {
    let (app, _) = setup_test_app().await;
    create_student(&app, "Ada", "ada@example.com", 36).await;
    let bob = create_student(&app, "Bob", "bob@example.com", 30).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/students/{}", bob),
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, json) = send(&app, "GET", &format!("/students/{}", bob), None).await;
    assert_eq!(json["email"], "bob@example.com");
}

#[tokio::test]
async fn test_delete_student_removes_enrollments() {
    let (app, state) = setup_test_app().await;
    let student_id = create_student(&app, "Ada", "ada@example.com", 36).await;
    let course_id = create_course(&app, "Algebra", 3).await;
    send(
        &app,
        "POST",
        &format!("/students/{}/enroll/{}", student_id, course_id),
        None,
    )
    .await;

    let (status, json) = send(&app, "DELETE", &format!("/students/{}", student_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);
    assert_eq!(enrollment_rows(&state).await, 0);

    let (status, _) = send(&app, "GET", &format!("/students/{}", student_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/students/{}", student_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_crud() {
    let (app, _) = setup_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({ "title": "Algebra", "description": "Groups and rings", "credits": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_i64().unwrap();
    assert_eq!(json["description"], "Groups and rings");

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/courses/{}", id),
        Some(json!({ "credits": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Algebra");
    assert_eq!(json["credits"], 6);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/courses/{}", id),
        Some(json!({ "credits": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "DELETE", &format!("/courses/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, "GET", &format!("/courses/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Course not found");
}

#[tokio::test]
async fn test_create_course_validation() {
    let (app, _) = setup_test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({ "title": "X", "credits": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({ "title": "Algebra", "credits": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_courses_filter_and_order() {
    let (app, _) = setup_test_app().await;
    create_course(&app, "Organic Chemistry", 4).await;
    create_course(&app, "Astronomy", 3).await;
    create_course(&app, "Biochemistry", 4).await;

    let (status, json) = send(&app, "GET", "/courses/?title=chem&order_by=title", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Biochemistry", "Organic Chemistry"]);

    let (status, _) = send(&app, "GET", "/courses/?order_by=credits", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_course_removes_enrollments() {
    let (app, state) = setup_test_app().await;
    let student_id = create_student(&app, "Ada", "ada@example.com", 36).await;
    let course_id = create_course(&app, "Algebra", 3).await;
    send(
        &app,
        "POST",
        &format!("/students/{}/enroll/{}", student_id, course_id),
        None,
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/courses/{}", course_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(enrollment_rows(&state).await, 0);

    let (_, json) = send(&app, "GET", &format!("/students/{}", student_id), None).await;
    assert_eq!(json["courses"], json!([]));
}

#[tokio::test]
async fn test_course_roster() {
    let (app, state) = setup_test_app().await;
    let course_id = create_course(&app, "Algebra", 3).await;
    let other_course = create_course(&app, "Botany", 2).await;
    let zed = create_student(&app, "Zed", "zed@example.com", 19).await;
    let amy = create_student(&app, "Amy", "amy@example.com", 22).await;
    create_student(&app, "Outsider", "out@example.com", 30).await;

    for student_id in [zed, amy] {
        send(
            &app,
            "POST",
            &format!("/students/{}/enroll/{}", student_id, course_id),
            None,
        )
        .await;
    }
    send(
        &app,
        "POST",
        &format!("/students/{}/enroll/{}", amy, other_course),
        None,
    )
    .await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/courses/{}/students?order_by=name", course_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let roster = json.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["name"], "Amy");
    assert_eq!(roster[0]["courses"].as_array().unwrap().len(), 2);
    assert_eq!(roster[1]["name"], "Zed");

    let (status, json) = send(
        &app,
        "GET",
        &format!("/courses/{}/students?limit=1", course_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/courses/999/students", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let enrolled_in_course = student_course::Entity::find()
        .filter(student_course::Column::CourseId.eq(course_id as i32))
        .count(state.db())
        .await
        .unwrap();
    assert_eq!(enrolled_in_course, 2);
}

#[tokio::test]
async fn test_non_numeric_id_is_validation_error() {
    let (app, _) = setup_test_app().await;

    let (status, _) = send(&app, "GET", "/students/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
