//! Repository implementations using SeaORM

pub mod course_repository;
pub mod student_repository;

pub use course_repository::SeaOrmCourseRepository;
pub use student_repository::SeaOrmStudentRepository;

use sea_orm::ColumnTrait;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};

/// `LOWER(column) LIKE '%needle%'`, independent of the backend's LIKE collation.
pub(crate) fn contains_ignore_case<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
        .like(format!("%{}%", needle.to_lowercase()))
}
