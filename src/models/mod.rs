pub mod course;
pub mod student;
pub mod student_course;
