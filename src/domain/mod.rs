//! Domain layer - Pure business abstractions
//!
//! Trait definitions, request/response shapes and domain error types.
//! Storage-specific code lives in `infrastructure`.

pub mod bulk;
pub mod errors;
pub mod repositories;

pub use bulk::{BulkPlan, normalize_email, plan_bulk_insert};
pub use errors::DomainError;
pub use repositories::*;
