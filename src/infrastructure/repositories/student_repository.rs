//! SeaORM implementation of StudentRepository
//!
//! Enrollment lives here too: the association rows are only ever reached
//! through a student.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};

use super::contains_ignore_case;
use crate::domain::{
    BulkCreateReport, Course, CreateStudentInput, DomainError, RosterFilter, Student,
    StudentFilter, StudentOrder, StudentRepository, UpdateStudentInput, normalize_email,
    plan_bulk_insert,
};
use crate::models::course::{self, Entity as CourseEntity};
use crate::models::student::{self, ActiveModel, Column, Entity as StudentEntity};
use crate::models::student_course::{self, Entity as StudentCourseEntity};

fn to_student(model: student::Model, mut courses: Vec<course::Model>) -> Student {
    courses.sort_by_key(|c| c.id);
    Student {
        id: model.id,
        name: model.name,
        email: model.email,
        age: model.age,
        courses: courses.into_iter().map(Course::from).collect(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Attach each student's courses with one extra query for the whole page.
async fn with_courses<C: ConnectionTrait>(
    db: &C,
    students: Vec<student::Model>,
) -> Result<Vec<Student>, DbErr> {
    if students.is_empty() {
        return Ok(Vec::new());
    }

    let courses = students
        .load_many_to_many(CourseEntity, StudentCourseEntity, db)
        .await?;

    Ok(students
        .into_iter()
        .zip(courses)
        .map(|(s, c)| to_student(s, c))
        .collect())
}

async fn load_student<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Student>, DbErr> {
    let Some(model) = StudentEntity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let courses = model.find_related(CourseEntity).all(db).await?;
    Ok(Some(to_student(model, courses)))
}

/// Both ends of an enrollment must exist; which one is missing is not reported.
async fn ensure_pair_exists<C: ConnectionTrait>(
    db: &C,
    student_id: i32,
    course_id: i32,
) -> Result<(), DomainError> {
    let student = StudentEntity::find_by_id(student_id).one(db).await?;
    let course = CourseEntity::find_by_id(course_id).one(db).await?;

    if student.is_none() || course.is_none() {
        return Err(DomainError::NotFound("Student or course not found"));
    }
    Ok(())
}

fn apply_order<Q: QueryOrder>(query: Q, order_by: Option<StudentOrder>) -> Q {
    match order_by {
        Some(StudentOrder::Name) => query.order_by_asc(Column::Name),
        Some(StudentOrder::Age) => query.order_by_asc(Column::Age),
        None => query,
    }
}

fn new_student(input: CreateStudentInput, now: &str) -> ActiveModel {
    ActiveModel {
        name: Set(input.name),
        email: Set(normalize_email(&input.email)),
        age: Set(input.age),
        created_at: Set(now.to_string()),
        updated_at: Set(now.to_string()),
        ..Default::default()
    }
}

/// Emails per `IN (...)` lookup, one bind each.
const LOOKUP_CHUNK: usize = 500;

/// Rows per multi-row insert; each student binds five values.
const INSERT_CHUNK: usize = 100;

/// Keeps every statement under SQLite's bind-variable limit.
async fn existing_emails<C: ConnectionTrait>(
    db: &C,
    emails: &[String],
) -> Result<HashSet<String>, DbErr> {
    let mut existing = HashSet::new();
    for chunk in emails.chunks(LOOKUP_CHUNK) {
        existing.extend(
            StudentEntity::find()
                .select_only()
                .column(Column::Email)
                .filter(Column::Email.is_in(chunk.iter().cloned()))
                .into_tuple::<String>()
                .all(db)
                .await?,
        );
    }
    Ok(existing)
}

async fn insert_students<C: ConnectionTrait>(
    db: &C,
    rows: Vec<ActiveModel>,
) -> Result<(), DomainError> {
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<ActiveModel> = rows.by_ref().take(INSERT_CHUNK).collect();
        StudentEntity::insert_many(chunk)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// SeaORM-based implementation of StudentRepository
pub struct SeaOrmStudentRepository {
    db: DatabaseConnection,
}

impl SeaOrmStudentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StudentRepository for SeaOrmStudentRepository {
    async fn find_all(&self, filter: StudentFilter) -> Result<Vec<Student>, DomainError> {
        let page = filter.page();
        let mut query = StudentEntity::find();

        if let Some(name) = &filter.name
            && !name.is_empty()
        {
            query = query.filter(contains_ignore_case(Column::Name, name));
        }

        let students = apply_order(query, filter.order_by)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok(with_courses(&self.db, students).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, DomainError> {
        Ok(load_student(&self.db, id).await?)
    }

    async fn create(&self, input: CreateStudentInput) -> Result<Student, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        // A taken email fails on the unique index and maps to a conflict.
        let result = new_student(input, &now).insert(&self.db).await?;
        tracing::info!(student_id = result.id, "Created student");

        Ok(to_student(result, Vec::new()))
    }

    async fn bulk_create(
        &self,
        inputs: Vec<CreateStudentInput>,
    ) -> Result<BulkCreateReport, DomainError> {
        let candidates: Vec<CreateStudentInput> = inputs
            .into_iter()
            .map(|mut c| {
                c.email = normalize_email(&c.email);
                c
            })
            .collect();

        if candidates.is_empty() {
            return Ok(BulkCreateReport {
                created: Vec::new(),
                errors: Vec::new(),
            });
        }

        let txn = self.db.begin().await?;

        let emails: Vec<String> = candidates.iter().map(|c| c.email.clone()).collect();
        let existing = existing_emails(&txn, &emails).await?;

        let plan = plan_bulk_insert(candidates, &existing);
        for error in &plan.errors {
            tracing::warn!("Bulk create rejected candidates: {}", error);
        }

        if plan.accepted.is_empty() {
            return Ok(BulkCreateReport {
                created: Vec::new(),
                errors: plan.errors,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let accepted_emails: Vec<String> = plan.accepted.iter().map(|c| c.email.clone()).collect();
        let rows: Vec<ActiveModel> = plan
            .accepted
            .into_iter()
            .map(|c| new_student(c, &now))
            .collect();

        // Raced inserts of the same email fail here and roll the whole batch back.
        insert_students(&txn, rows).await?;

        let mut created = Vec::with_capacity(accepted_emails.len());
        for chunk in accepted_emails.chunks(LOOKUP_CHUNK) {
            created.extend(
                StudentEntity::find()
                    .filter(Column::Email.is_in(chunk.iter().cloned()))
                    .all(&txn)
                    .await?,
            );
        }

        txn.commit().await?;

        let position: HashMap<&str, usize> = accepted_emails
            .iter()
            .enumerate()
            .map(|(i, e)| (e.as_str(), i))
            .collect();
        created.sort_by_key(|m| position.get(m.email.as_str()).copied());
        tracing::info!(
            created = created.len(),
            rejected_classes = plan.errors.len(),
            "Bulk created students"
        );

        Ok(BulkCreateReport {
            created: created
                .into_iter()
                .map(|m| to_student(m, Vec::new()))
                .collect(),
            errors: plan.errors,
        })
    }

    async fn update(&self, id: i32, input: UpdateStudentInput) -> Result<Student, DomainError> {
        let student = StudentEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound("Student not found"))?;

        if !input.is_empty() {
            let mut active_model: ActiveModel = student.into();
            if let Some(name) = input.name {
                active_model.name = Set(name);
            }
            if let Some(email) = input.email {
                active_model.email = Set(normalize_email(&email));
            }
            if let Some(age) = input.age {
                active_model.age = Set(age);
            }
            active_model.updated_at = Set(chrono::Utc::now().to_rfc3339());

            active_model.update(&self.db).await?;
            tracing::info!(student_id = id, "Updated student");
        }

        load_student(&self.db, id)
            .await?
            .ok_or(DomainError::NotFound("Student not found"))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        if StudentEntity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(DomainError::NotFound("Student not found"));
        }

        let unlinked = StudentCourseEntity::delete_many()
            .filter(student_course::Column::StudentId.eq(id))
            .exec(&txn)
            .await?;
        StudentEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            student_id = id,
            enrollments_removed = unlinked.rows_affected,
            "Deleted student"
        );

        Ok(())
    }

    async fn enroll(&self, student_id: i32, course_id: i32) -> Result<Student, DomainError> {
        let txn = self.db.begin().await?;
        ensure_pair_exists(&txn, student_id, course_id).await?;

        let link = student_course::ActiveModel {
            student_id: Set(student_id),
            course_id: Set(course_id),
        };
        let inserted = StudentCourseEntity::insert(link)
            .on_conflict(
                OnConflict::columns([
                    student_course::Column::StudentId,
                    student_course::Column::CourseId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let student = load_student(&txn, student_id)
            .await?
            .ok_or(DomainError::NotFound("Student or course not found"))?;
        txn.commit().await?;

        if inserted == 0 {
            tracing::debug!(student_id, course_id, "Already enrolled");
        } else {
            tracing::info!(student_id, course_id, "Enrolled student");
        }

        Ok(student)
    }

    async fn unenroll(&self, student_id: i32, course_id: i32) -> Result<Student, DomainError> {
        let txn = self.db.begin().await?;
        ensure_pair_exists(&txn, student_id, course_id).await?;

        let removed = StudentCourseEntity::delete_many()
            .filter(student_course::Column::StudentId.eq(student_id))
            .filter(student_course::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await?;

        let student = load_student(&txn, student_id)
            .await?
            .ok_or(DomainError::NotFound("Student or course not found"))?;
        txn.commit().await?;

        if removed.rows_affected > 0 {
            tracing::info!(student_id, course_id, "Unenrolled student");
        }

        Ok(student)
    }

    async fn find_by_course(
        &self,
        course_id: i32,
        filter: RosterFilter,
    ) -> Result<Vec<Student>, DomainError> {
        if CourseEntity::find_by_id(course_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(DomainError::NotFound("Course not found"));
        }

        let page = filter.page();
        let query = StudentEntity::find()
            .join(
                JoinType::InnerJoin,
                student_course::Relation::Student.def().rev(),
            )
            .filter(student_course::Column::CourseId.eq(course_id));

        let students = apply_order(query, filter.order_by)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok(with_courses(&self.db, students).await?)
    }
}
