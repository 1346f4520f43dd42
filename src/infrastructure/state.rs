//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{CourseRepository, StudentRepository};
use crate::infrastructure::auth::ApiKeySecret;
use crate::infrastructure::{SeaOrmCourseRepository, SeaOrmStudentRepository};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Student repository, also owns enrollment
    pub student_repo: Arc<dyn StudentRepository>,
    /// Course repository
    pub course_repo: Arc<dyn CourseRepository>,
    api_key: ApiKeySecret,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, api_key: impl Into<Arc<str>>) -> Self {
        let student_repo = Arc::new(SeaOrmStudentRepository::new(db.clone()));
        let course_repo = Arc::new(SeaOrmCourseRepository::new(db.clone()));

        Self {
            db,
            student_repo,
            course_repo,
            api_key: ApiKeySecret::new(api_key),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl axum::extract::FromRef<AppState> for ApiKeySecret {
    fn from_ref(state: &AppState) -> Self {
        state.api_key.clone()
    }
}
