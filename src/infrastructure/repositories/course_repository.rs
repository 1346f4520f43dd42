//! SeaORM implementation of CourseRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use super::contains_ignore_case;
use crate::domain::{
    Course, CourseFilter, CourseOrder, CourseRepository, CreateCourseInput, DomainError,
    UpdateCourseInput,
};
use crate::models::course::{self, ActiveModel, Column, Entity as CourseEntity};
use crate::models::student_course::{self, Entity as StudentCourseEntity};

impl From<course::Model> for Course {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            credits: model.credits,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// SeaORM-based implementation of CourseRepository
pub struct SeaOrmCourseRepository {
    db: DatabaseConnection,
}

impl SeaOrmCourseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseRepository for SeaOrmCourseRepository {
    async fn find_all(&self, filter: CourseFilter) -> Result<Vec<Course>, DomainError> {
        let page = filter.page();
        let mut query = CourseEntity::find();

        if let Some(title) = &filter.title
            && !title.is_empty()
        {
            query = query.filter(contains_ignore_case(Column::Title, title));
        }

        if let Some(CourseOrder::Title) = filter.order_by {
            query = query.order_by_asc(Column::Title);
        }

        let courses = query
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok(courses.into_iter().map(Course::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Course>, DomainError> {
        let course = CourseEntity::find_by_id(id).one(&self.db).await?;
        Ok(course.map(Course::from))
    }

    async fn create(&self, input: CreateCourseInput) -> Result<Course, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let course = ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            credits: Set(input.credits),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = course.insert(&self.db).await?;
        tracing::info!(course_id = result.id, "Created course");

        Ok(Course::from(result))
    }

    async fn update(&self, id: i32, input: UpdateCourseInput) -> Result<Course, DomainError> {
        let course = CourseEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound("Course not found"))?;

        if input.is_empty() {
            return Ok(Course::from(course));
        }

        let mut active_model: ActiveModel = course.into();
        if let Some(title) = input.title {
            active_model.title = Set(title);
        }
        if let Some(description) = input.description {
            active_model.description = Set(Some(description));
        }
        if let Some(credits) = input.credits {
            active_model.credits = Set(credits);
        }
        active_model.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active_model.update(&self.db).await?;
        tracing::info!(course_id = id, "Updated course");

        Ok(Course::from(model))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        if CourseEntity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(DomainError::NotFound("Course not found"));
        }

        let unlinked = StudentCourseEntity::delete_many()
            .filter(student_course::Column::CourseId.eq(id))
            .exec(&txn)
            .await?;
        CourseEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            course_id = id,
            enrollments_removed = unlinked.rows_affected,
            "Deleted course"
        );

        Ok(())
    }
}
