//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::DomainError;

/// Largest page a list endpoint will return.
pub const MAX_PAGE_SIZE: u64 = 100;

fn default_limit() -> u64 {
    10
}

/// Offset pagination shared by every list operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

/// Sort keys accepted when listing students
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StudentOrder {
    Name,
    Age,
}

/// Sort keys accepted when listing courses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourseOrder {
    Title,
}

/// Filter criteria for student queries
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilter {
    /// Number of records to skip
    #[serde(default)]
    #[validate(range(max = 9223372036854775807u64, message = "skip is out of range"))]
    pub skip: u64,
    /// Page size, at most 100
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u64,
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
    #[param(inline)]
    pub order_by: Option<StudentOrder>,
}

/// Filter criteria for course queries
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilter {
    /// Number of records to skip
    #[serde(default)]
    #[validate(range(max = 9223372036854775807u64, message = "skip is out of range"))]
    pub skip: u64,
    /// Page size, at most 100
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u64,
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    #[param(inline)]
    pub order_by: Option<CourseOrder>,
}

/// Listing the students enrolled in one course
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RosterFilter {
    /// Number of records to skip
    #[serde(default)]
    #[validate(range(max = 9223372036854775807u64, message = "skip is out of range"))]
    pub skip: u64,
    /// Page size, at most 100
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u64,
    #[param(inline)]
    pub order_by: Option<StudentOrder>,
}

macro_rules! impl_paged {
    ($($filter:ty),+) => {
        $(
            impl $filter {
                pub fn page(&self) -> Page {
                    Page {
                        skip: self.skip,
                        limit: self.limit.min(MAX_PAGE_SIZE),
                    }
                }
            }
        )+
    };
}

impl_paged!(StudentFilter, CourseFilter, RosterFilter);

impl Default for StudentFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            name: None,
            order_by: None,
        }
    }
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            title: None,
            order_by: None,
        }
    }
}

impl Default for RosterFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            order_by: None,
        }
    }
}

/// Course data for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub credits: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Student data for API responses, with the courses it is enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub courses: Vec<Course>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a student
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentInput {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub age: i32,
}

/// Input for creating many students in one call
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkCreateStudentsInput {
    #[validate(nested)]
    pub students: Vec<CreateStudentInput>,
}

/// Input for updating a student; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentInput {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub age: Option<i32>,
}

impl UpdateStudentInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }
}

/// Input for creating a course
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseInput {
    #[validate(length(min = 2, message = "title must be at least 2 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "credits must be positive"))]
    pub credits: i32,
}

/// Input for updating a course; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseInput {
    #[validate(length(min = 2, message = "title must be at least 2 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "credits must be positive"))]
    pub credits: Option<i32>,
}

impl UpdateCourseInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.credits.is_none()
    }
}

/// Result of a bulk create: the rows written plus aggregate rejection messages
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkCreateReport {
    pub created: Vec<Student>,
    pub errors: Vec<String>,
}

/// Repository trait for Student entity, including enrollment
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Find students matching the filter, one page at a time
    async fn find_all(&self, filter: StudentFilter) -> Result<Vec<Student>, DomainError>;

    /// Find a student by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, DomainError>;

    /// Create a new student
    async fn create(&self, input: CreateStudentInput) -> Result<Student, DomainError>;

    /// Create the non-conflicting subset of `inputs` in a single batch
    async fn bulk_create(
        &self,
        inputs: Vec<CreateStudentInput>,
    ) -> Result<BulkCreateReport, DomainError>;

    /// Apply the fields present in `input`
    async fn update(&self, id: i32, input: UpdateStudentInput) -> Result<Student, DomainError>;

    /// Delete a student and its enrollments
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    /// Enroll a student in a course; enrolling twice is a no-op
    async fn enroll(&self, student_id: i32, course_id: i32) -> Result<Student, DomainError>;

    /// Remove an enrollment; removing a missing one is a no-op
    async fn unenroll(&self, student_id: i32, course_id: i32) -> Result<Student, DomainError>;

    /// Students enrolled in a course
    async fn find_by_course(
        &self,
        course_id: i32,
        filter: RosterFilter,
    ) -> Result<Vec<Student>, DomainError>;
}

/// Repository trait for Course entity
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Find courses matching the filter, one page at a time
    async fn find_all(&self, filter: CourseFilter) -> Result<Vec<Course>, DomainError>;

    /// Find a course by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Course>, DomainError>;

    /// Create a new course
    async fn create(&self, input: CreateCourseInput) -> Result<Course, DomainError>;

    /// Apply the fields present in `input`
    async fn update(&self, id: i32, input: UpdateCourseInput) -> Result<Course, DomainError>;

    /// Delete a course and its enrollments
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}
