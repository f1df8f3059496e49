//! Recurring job projection.
//!
//! Recurring rules are never expanded into stored jobs. Each time the
//! schedule is read, the rules are projected onto the requested days and the
//! resulting virtual jobs are merged into the snapshot being returned. Pausing
//! a rule, adding an exception or editing its address therefore takes effect
//! on every later read with no backfill.
//!
//! A rule occurs on `date` when all of these hold:
//!
//! 1. `date` falls on the same weekday as the rule's start date
//! 2. `date` is not before the start date
//! 3. the distance from the start date is a whole number of intervals
//!    (7 days weekly, 14 days fortnightly), so fortnightly rules take every
//!    second matching weekday counted from the start date
//! 4. `date` is not one of the rule's exceptions
//!
//! and, at merge time, no team slot of that date already holds a job carrying
//! the rule's id. That last check keeps projection idempotent and lets a
//! materialized instance replace the virtual one.

use shared::{DateKey, Job, RecurringRule, Schedule};
use tracing::debug;

use crate::domain::schedule_service::ensure_slot;

/// Deterministic id of a rule's occurrence on `date`
pub fn instance_id(rule_id: &str, date: &DateKey) -> String {
    format!("{}_{}", rule_id, date)
}

/// Whether `rule` is due on `date` (pause flag not considered)
pub fn occurs_on(rule: &RecurringRule, date: &DateKey) -> bool {
    if date.day_of_week() != rule.start_date.day_of_week() {
        return false;
    }

    let diff_days = DateKey::days_between(&rule.start_date, date);
    if diff_days < 0 {
        return false;
    }
    if diff_days % rule.frequency.interval_days() != 0 {
        return false;
    }

    !rule.exceptions.contains(date)
}

/// The virtual job a rule contributes on `date`
pub fn virtual_job(rule: &RecurringRule, date: &DateKey) -> Job {
    let mut job = Job::new(instance_id(&rule.id, date), &rule.street, &rule.house_number);
    job.client_name = non_empty(&rule.client_name);
    job.notes = non_empty(&rule.notes);
    job.time_interval_label = non_empty(&rule.time_interval_label);
    job.expected_hours = rule.expected_hours;
    job.recurring_id = Some(rule.id.clone());
    job.is_recurring = true;
    job.frequency = Some(rule.frequency);
    job
}

/// Merge the occurrences of `rules` on `dates` into `schedule` in place.
///
/// Returns how many virtual jobs were added.
pub fn project_into(schedule: &mut Schedule, rules: &[RecurringRule], dates: &[DateKey]) -> usize {
    let mut added = 0;

    for rule in rules.iter().filter(|rule| !rule.paused) {
        for date in dates {
            if !occurs_on(rule, date) {
                continue;
            }

            if holds_instance(schedule, rule, date) {
                continue;
            }

            ensure_slot(schedule, *date, rule.team_id)
                .addresses
                .push(virtual_job(rule, date));
            added += 1;
        }
    }

    debug!(
        "Projected {} recurring job(s) from {} rule(s) over {} day(s)",
        added,
        rules.len(),
        dates.len()
    );
    added
}

/// Pure form of [`project_into`]: returns a new snapshot, leaving the input untouched
pub fn project(schedule: &Schedule, rules: &[RecurringRule], dates: &[DateKey]) -> Schedule {
    let mut snapshot = schedule.clone();
    project_into(&mut snapshot, rules, dates);
    snapshot
}

/// Whether any team slot on `date` already holds a job carrying the rule's id.
/// A materialized instance stays put when its rule later moves teams.
fn holds_instance(schedule: &Schedule, rule: &RecurringRule, date: &DateKey) -> bool {
    schedule.get(date).map_or(false, |day| {
        day.values().any(|slot| {
            slot.addresses
                .iter()
                .any(|job| job.recurring_id.as_deref() == Some(rule.id.as_str()))
        })
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
