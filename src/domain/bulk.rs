//! Conflict detection for bulk student creation
//!
//! Splits a batch of candidates into the ones that can be inserted and
//! aggregate messages for the ones that cannot. A candidate is rejected when
//! its email repeats inside the batch or already exists in storage.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::CreateStudentInput;

/// Canonical form used for storage and every uniqueness comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Outcome of [`plan_bulk_insert`]
#[derive(Debug, Default)]
pub struct BulkPlan {
    /// Candidates to insert, in input order
    pub accepted: Vec<CreateStudentInput>,
    /// One message per rejection class, never one per record
    pub errors: Vec<String>,
}

/// Emails occurring more than once in `candidates`.
pub fn duplicate_emails(candidates: &[CreateStudentInput]) -> BTreeSet<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for candidate in candidates {
        *seen.entry(candidate.email.as_str()).or_insert(0) += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(email, _)| email.to_string())
        .collect()
}

/// Decide which candidates to insert, given the subset of their emails that
/// already exist in storage. Emails are expected to be normalized.
pub fn plan_bulk_insert(
    candidates: Vec<CreateStudentInput>,
    existing: &HashSet<String>,
) -> BulkPlan {
    let duplicates = duplicate_emails(&candidates);
    let conflicts: BTreeSet<&String> = existing.iter().collect();

    let mut errors = Vec::new();
    if !duplicates.is_empty() {
        errors.push(format!(
            "Duplicate emails in payload: {}",
            duplicates.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !conflicts.is_empty() {
        errors.push(format!(
            "Emails already exist: {}",
            conflicts
                .iter()
                .map(|e| e.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let accepted = candidates
        .into_iter()
        .filter(|c| !duplicates.contains(&c.email) && !existing.contains(&c.email))
        .collect();

    BulkPlan { accepted, errors }
}
