//! # Recurring Rule Service
//!
//! Owns the `recurring-jobs` document: the list of weekly/fortnightly
//! templates that the projection engine expands at read time.
//!
//! ## Key Responsibilities
//!
//! - **Rule lifecycle**: create, patch, delete
//! - **Exceptions**: suppress single occurrences without touching the rest
//!   of the rule (set semantics, dates are never removed)
//! - **Write serialization**: every mutation holds the store's write gate
//!   for its whole read-modify-write cycle

use chrono::Utc;
use shared::{CreateRecurringJobRequest, DateKey, EditRecurringJobRequest, RecurringRule};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::validation;
use crate::storage::{read_document, write_document, JsonStore, RECURRING_JOBS_KEY};

#[derive(Clone)]
pub struct RecurringService {
    store: Arc<dyn JsonStore>,
    write_gate: Arc<Mutex<()>>,
}

impl RecurringService {
    pub fn new(store: Arc<dyn JsonStore>) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Every stored rule, paused ones included
    pub async fn list(&self) -> DomainResult<Vec<RecurringRule>> {
        let rules = self.load().await?;
        info!("Loaded {} recurring rule(s)", rules.len());
        Ok(rules)
    }

    pub async fn get(&self, rule_id: &str) -> DomainResult<RecurringRule> {
        self.load()
            .await?
            .into_iter()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| DomainError::not_found(format!("recurring job {}", rule_id)))
    }

    pub async fn create(&self, request: CreateRecurringJobRequest) -> DomainResult<RecurringRule> {
        info!(
            "Creating recurring job: {} {} for {} from {}",
            request.house_number, request.street, request.team_id, request.start_date
        );

        let rule = RecurringRule {
            id: Uuid::new_v4().to_string(),
            client_name: validation::optional_text(request.client_name.as_deref())
                .unwrap_or_default(),
            street: validation::required("street", &request.street)?,
            house_number: validation::required("houseNumber", &request.house_number)?,
            notes: validation::optional_text(request.notes.as_deref()).unwrap_or_default(),
            team_id: validation::team("teamId", &request.team_id)?,
            start_date: validation::date_key("startDate", &request.start_date)?,
            frequency: validation::frequency("frequency", &request.frequency)?,
            time_interval_label: validation::optional_text(request.time_interval_label.as_deref())
                .unwrap_or_default(),
            expected_hours: validation::hours(
                "expectedHours",
                request.expected_hours.unwrap_or_default(),
            )?,
            exceptions: Vec::new(),
            paused: false,
            created_at: Utc::now().to_rfc3339(),
        };

        let _guard = self.write_gate.lock().await;
        let mut rules = self.load().await?;
        rules.push(rule.clone());
        self.save(
            &rules,
            &format!(
                "Add recurring job {} {} ({})",
                rule.house_number,
                rule.street,
                rule.frequency.as_str()
            ),
        )
        .await?;

        info!("Created recurring job {}", rule.id);
        Ok(rule)
    }

    /// Apply the fields present in `patch`; absent fields keep their value
    pub async fn edit(
        &self,
        rule_id: &str,
        patch: EditRecurringJobRequest,
    ) -> DomainResult<RecurringRule> {
        info!("Editing recurring job {}", rule_id);

        let street = patch
            .street
            .as_deref()
            .map(|v| validation::required("street", v))
            .transpose()?;
        let house_number = patch
            .house_number
            .as_deref()
            .map(|v| validation::required("houseNumber", v))
            .transpose()?;
        let team_id = patch
            .team_id
            .as_deref()
            .map(|v| validation::team("teamId", v))
            .transpose()?;
        let start_date = patch
            .start_date
            .as_deref()
            .map(|v| validation::date_key("startDate", v))
            .transpose()?;
        let frequency = patch
            .frequency
            .as_deref()
            .map(|v| validation::frequency("frequency", v))
            .transpose()?;
        let expected_hours = patch
            .expected_hours
            .map(|v| validation::hours("expectedHours", v))
            .transpose()?;

        let _guard = self.write_gate.lock().await;
        let mut rules = self.load().await?;
        let rule = find_mut(&mut rules, rule_id)?;

        if let Some(client_name) = patch.client_name {
            rule.client_name = client_name.trim().to_string();
        }
        if let Some(street) = street {
            rule.street = street;
        }
        if let Some(house_number) = house_number {
            rule.house_number = house_number;
        }
        if let Some(notes) = patch.notes {
            rule.notes = notes.trim().to_string();
        }
        if let Some(team_id) = team_id {
            rule.team_id = team_id;
        }
        if let Some(start_date) = start_date {
            rule.start_date = start_date;
        }
        if let Some(frequency) = frequency {
            rule.frequency = frequency;
        }
        if let Some(label) = patch.time_interval_label {
            rule.time_interval_label = label.trim().to_string();
        }
        if let Some(expected_hours) = expected_hours {
            rule.expected_hours = expected_hours;
        }
        if let Some(paused) = patch.paused {
            rule.paused = paused;
        }

        let updated = rule.clone();
        self.save(&rules, &format!("Edit recurring job {}", rule_id))
            .await?;

        info!("Updated recurring job {}", rule_id);
        Ok(updated)
    }

    /// Remove a rule and return it. Materialized instances stay in the schedule.
    pub async fn delete(&self, rule_id: &str) -> DomainResult<RecurringRule> {
        info!("Deleting recurring job {}", rule_id);

        let _guard = self.write_gate.lock().await;
        let mut rules = self.load().await?;
        let position = rules
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or_else(|| {
                warn!("Recurring job not found: {}", rule_id);
                DomainError::not_found(format!("recurring job {}", rule_id))
            })?;
        let removed = rules.remove(position);

        self.save(
            &rules,
            &format!(
                "Delete recurring job {} {}",
                removed.house_number, removed.street
            ),
        )
        .await?;
        Ok(removed)
    }

    /// Suppress the occurrence on `date`. Adding a date twice is a no-op.
    pub async fn add_exception(&self, rule_id: &str, date: &str) -> DomainResult<RecurringRule> {
        let date = validation::date_key("date", date)?;
        info!("Adding exception {} to recurring job {}", date, rule_id);

        let _guard = self.write_gate.lock().await;
        let mut rules = self.load().await?;
        let rule = find_mut(&mut rules, rule_id)?;

        if rule.exceptions.contains(&date) {
            info!("Recurring job {} already skips {}", rule_id, date);
            return Ok(rule.clone());
        }

        rule.exceptions.push(date);
        let updated = rule.clone();
        self.save(
            &rules,
            &format!("Skip recurring job {} on {}", rule_id, date),
        )
        .await?;
        Ok(updated)
    }

    /// The stored rule `rule_id`, provided it is due on `date`
    pub(crate) async fn rule_for_instance(
        &self,
        rule_id: &str,
        date: &DateKey,
    ) -> DomainResult<RecurringRule> {
        let rule = self.get(rule_id).await?;
        if !crate::domain::projection::occurs_on(&rule, date) {
            return Err(DomainError::validation(
                "date",
                format!("recurring job {} does not occur on {}", rule_id, date),
            ));
        }
        Ok(rule)
    }

    async fn load(&self) -> DomainResult<Vec<RecurringRule>> {
        Ok(read_document(self.store.as_ref(), RECURRING_JOBS_KEY).await?)
    }

    async fn save(&self, rules: &[RecurringRule], description: &str) -> DomainResult<()> {
        Ok(write_document(self.store.as_ref(), RECURRING_JOBS_KEY, &rules, description).await?)
    }
}

fn find_mut<'a>(rules: &'a mut [RecurringRule], rule_id: &str) -> DomainResult<&'a mut RecurringRule> {
    rules
        .iter_mut()
        .find(|rule| rule.id == rule_id)
        .ok_or_else(|| DomainError::not_found(format!("recurring job {}", rule_id)))
}
