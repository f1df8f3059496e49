//! Validation boundary.
//!
//! Everything that arrives as free text (dates, team names, worker names,
//! frequencies, statuses) is converted into the closed types from `shared`
//! here, so the rest of the domain never handles unchecked strings.

use shared::{DateKey, Frequency, JobStatus, TeamId, Worker};

use crate::domain::error::{DomainError, DomainResult};

/// Upper bound on a single schedule read
pub const MAX_RANGE_DAYS: u32 = 62;

pub fn date_key(field: &str, value: &str) -> DomainResult<DateKey> {
    DateKey::parse(value.trim()).map_err(|e| DomainError::validation(field, e.to_string()))
}

pub fn team(field: &str, value: &str) -> DomainResult<TeamId> {
    value
        .trim()
        .parse::<TeamId>()
        .map_err(|e| DomainError::validation(field, e))
}

/// Parse worker names, keeping order and duplicates.
/// The first name outside the roster is reported.
pub fn workers(field: &str, names: &[String]) -> DomainResult<Vec<Worker>> {
    names
        .iter()
        .map(|name| {
            name.trim()
                .parse::<Worker>()
                .map_err(|e| DomainError::validation(field, e))
        })
        .collect()
}

pub fn frequency(field: &str, value: &str) -> DomainResult<Frequency> {
    value
        .trim()
        .to_lowercase()
        .parse::<Frequency>()
        .map_err(|e| DomainError::validation(field, e))
}

pub fn status(field: &str, value: &str) -> DomainResult<JobStatus> {
    value
        .trim()
        .to_lowercase()
        .parse::<JobStatus>()
        .map_err(|e| DomainError::validation(field, e))
}

/// Required free-text field; returns the trimmed value
pub fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub fn hours(field: &str, value: f64) -> DomainResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(
            field,
            format!("must be a non-negative number, got {}", value),
        ));
    }
    Ok(value)
}

/// Optional free text: blank collapses to `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn range_days(field: &str, value: u32) -> DomainResult<u32> {
    if value == 0 || value > MAX_RANGE_DAYS {
        return Err(DomainError::validation(
            field,
            format!("must be between 1 and {}", MAX_RANGE_DAYS),
        ));
    }
    Ok(value)
}
