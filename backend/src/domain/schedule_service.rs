//! # Schedule Service
//!
//! Owns the `schedule` document: date → team → slot. Every mutation is one
//! read-modify-write cycle over the whole document, serialized behind a write
//! gate. Reads never take the gate and run the recurring projection before
//! returning.
//!
//! ## Key Responsibilities
//!
//! - **Reads**: persisted schedule, padded with empty slots, with recurring
//!   jobs projected in
//! - **Job lifecycle**: add, edit, cancel (soft delete), complete, delete
//! - **Assignments**: replace a slot's workers, clear many days at once
//! - **Recurring instances**: materialize or cancel a single occurrence

use shared::{
    AddJobRequest, DateKey, EditJobRequest, Job, JobStatus, RecurringRule, RosterResponse,
    Schedule, ScheduleQuery, ScheduleResponse, TeamDaySlot, TeamId, Worker,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::projection;
use crate::domain::recurring_service::RecurringService;
use crate::domain::validation;
use crate::storage::{read_document, write_document, JsonStore, SCHEDULE_KEY};

/// The slot for `team` on `date`, created empty if absent
pub fn ensure_slot(schedule: &mut Schedule, date: DateKey, team: TeamId) -> &mut TeamDaySlot {
    schedule.entry(date).or_default().entry(team).or_default()
}

/// Empty slots for both teams on `days` consecutive days from `start`
pub fn default_window(start: DateKey, days: u32) -> Schedule {
    let mut schedule = Schedule::new();
    pad(&mut schedule, &start.run(days));
    schedule
}

/// Make sure both teams have a slot on each of `dates`
fn pad(schedule: &mut Schedule, dates: &[DateKey]) {
    for date in dates {
        for team in TeamId::ALL {
            ensure_slot(schedule, *date, team);
        }
    }
}

/// The fixed teams and worker roster
pub fn roster() -> RosterResponse {
    RosterResponse {
        teams: TeamId::ALL.to_vec(),
        workers: Worker::ROSTER.to_vec(),
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn JsonStore>,
    write_gate: Arc<Mutex<()>>,
    recurring: RecurringService,
    window_days: u32,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn JsonStore>, recurring: RecurringService, window_days: u32) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
            recurring,
            window_days: window_days.max(1),
        }
    }

    /// Snapshot for a date range, recurring jobs included.
    ///
    /// Without `start`/`days` the whole persisted schedule is returned along
    /// with the rolling window from today. With either, only the requested
    /// days are returned. An unreadable schedule degrades to empty slots.
    pub async fn get_schedule(&self, query: &ScheduleQuery) -> DomainResult<ScheduleResponse> {
        let start = match query.start.as_deref() {
            Some(raw) => validation::date_key("start", raw)?,
            None => DateKey::today(),
        };
        let days = match query.days {
            Some(days) => validation::range_days("days", days)?,
            None => self.window_days,
        };
        let ranged = query.start.is_some() || query.days.is_some();
        let dates = start.run(days);
        info!("Reading schedule: {} day(s) from {}", days, start);

        let persisted = match self.load().await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!("Schedule unavailable, serving an empty window: {}", e);
                Schedule::new()
            }
        };

        let mut snapshot: Schedule = if ranged {
            persisted
                .into_iter()
                .filter(|(date, _)| dates.contains(date))
                .collect()
        } else {
            persisted
        };
        pad(&mut snapshot, &dates);

        let rules = self.recurring.list().await?;
        let keys: Vec<DateKey> = snapshot.keys().copied().collect();
        projection::project_into(&mut snapshot, &rules, &keys);

        Ok(ScheduleResponse {
            start,
            days,
            schedule: snapshot,
        })
    }

    /// Append a new pending job. Non-empty `selected_workers` replace the
    /// slot's assignment.
    pub async fn add_job(&self, request: AddJobRequest) -> DomainResult<Job> {
        info!(
            "Adding job {} {} on {} for {}",
            request.house_number, request.street, request.date, request.team
        );

        let date = validation::date_key("date", &request.date)?;
        let team = validation::team("team", &request.team)?;
        let street = validation::required("street", &request.street)?;
        let house_number = validation::required("houseNumber", &request.house_number)?;
        let workers = validation::workers("selected_workers", &request.selected_workers)?;
        let expected_hours =
            validation::hours("expectedHours", request.expected_hours.unwrap_or_default())?;

        let mut job = Job::new(Uuid::new_v4().to_string(), &street, &house_number);
        job.client_name = validation::optional_text(request.client_name.as_deref());
        job.notes = validation::optional_text(request.notes.as_deref());
        job.time_interval_label = validation::optional_text(request.time_interval_label.as_deref());
        job.expected_hours = expected_hours;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let slot = ensure_slot(&mut schedule, date, team);
        slot.addresses.push(job.clone());
        if !workers.is_empty() {
            slot.assigned_workers = workers;
        }

        self.save(
            &schedule,
            &format!("Add job {} {} on {} for {}", house_number, street, date, team),
        )
        .await?;

        info!("Added job {} on {} for {}", job.id, date, team);
        Ok(job)
    }

    /// Soft delete. Cancelling a cancelled job is a no-op and writes nothing.
    pub async fn cancel_job(&self, date: &str, team: &str, job_id: &str) -> DomainResult<Job> {
        info!("Cancelling job {} on {} for {}", job_id, date, team);
        self.set_status(date, team, job_id, JobStatus::Cancelled).await
    }

    /// Mark done. Idempotent like cancel; a cancelled job cannot be completed.
    pub async fn complete_job(&self, date: &str, team: &str, job_id: &str) -> DomainResult<Job> {
        info!("Completing job {} on {} for {}", job_id, date, team);
        self.set_status(date, team, job_id, JobStatus::Completed).await
    }

    async fn set_status(
        &self,
        date: &str,
        team: &str,
        job_id: &str,
        status: JobStatus,
    ) -> DomainResult<Job> {
        let date = validation::date_key("date", date)?;
        let team = validation::team("team", team)?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let job = find_job(&mut schedule, &date, team, job_id)?;

        if job.status == status {
            debug!("Job {} is already {}", job_id, status.as_str());
            return Ok(job.clone());
        }
        if status == JobStatus::Completed && job.status == JobStatus::Cancelled {
            return Err(DomainError::validation(
                "status",
                format!("job {} is cancelled and cannot be completed", job_id),
            ));
        }

        job.status = status;
        let updated = job.clone();
        self.save(
            &schedule,
            &format!("Mark job {} {} on {}", job_id, status.as_str(), date),
        )
        .await?;
        Ok(updated)
    }

    /// Permanently remove a job from its slot
    pub async fn delete_job(&self, date: &str, team: &str, job_id: &str) -> DomainResult<Job> {
        info!("Deleting job {} on {} for {}", job_id, date, team);

        let date = validation::date_key("date", date)?;
        let team = validation::team("team", team)?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let slot = find_slot(&mut schedule, &date, team)?;
        let position = slot
            .addresses
            .iter()
            .position(|job| job.id == job_id)
            .ok_or_else(|| DomainError::not_found(format!("job {}", job_id)))?;
        let removed = slot.addresses.remove(position);

        self.save(
            &schedule,
            &format!(
                "Delete job {} {} on {} for {}",
                removed.house_number, removed.street, date, team
            ),
        )
        .await?;
        Ok(removed)
    }

    pub async fn edit_job(
        &self,
        date: &str,
        team: &str,
        job_id: &str,
        request: EditJobRequest,
    ) -> DomainResult<Job> {
        info!("Editing job {} on {} for {}", job_id, date, team);

        let date = validation::date_key("date", date)?;
        let team = validation::team("team", team)?;
        let patch = JobPatch::validate(request)?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let job = find_job(&mut schedule, &date, team, job_id)?;
        patch.apply(job)?;
        let updated = job.clone();

        self.save(&schedule, &format!("Edit job {} on {}", job_id, date))
            .await?;
        Ok(updated)
    }

    /// Replace the slot's assigned workers, creating the slot if needed
    pub async fn update_assigned_workers(
        &self,
        date: &str,
        team: &str,
        workers: &[String],
    ) -> DomainResult<TeamDaySlot> {
        info!("Assigning {:?} on {} for {}", workers, date, team);

        let date = validation::date_key("date", date)?;
        let team = validation::team("team", team)?;
        let workers = validation::workers("workers", workers)?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let slot = ensure_slot(&mut schedule, date, team);
        slot.assigned_workers = workers;
        let updated = slot.clone();

        self.save(&schedule, &format!("Assign workers on {} for {}", date, team))
            .await?;
        Ok(updated)
    }

    /// Clear both teams' workers on every listed day that exists, in a single
    /// cycle. Unknown days are skipped. Returns how many days were cleared.
    pub async fn clear_assignments(&self, dates: &[String]) -> DomainResult<usize> {
        info!("Clearing assignments on {} day(s)", dates.len());

        let dates = dates
            .iter()
            .map(|raw| validation::date_key("dates", raw))
            .collect::<DomainResult<Vec<_>>>()?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;

        let mut cleared = 0;
        for date in &dates {
            let Some(day) = schedule.get_mut(date) else {
                debug!("No schedule on {}, skipping", date);
                continue;
            };
            for slot in day.values_mut() {
                slot.assigned_workers.clear();
            }
            cleared += 1;
        }

        if cleared == 0 {
            return Ok(0);
        }
        self.save(
            &schedule,
            &format!("Clear assignments on {} day(s)", cleared),
        )
        .await?;
        Ok(cleared)
    }

    /// Turn one occurrence of a rule into a stored job and patch it. An
    /// already materialized occurrence is patched in place.
    pub async fn edit_recurring_instance(
        &self,
        rule_id: &str,
        date: &str,
        request: EditJobRequest,
    ) -> DomainResult<Job> {
        info!("Editing occurrence of recurring job {} on {}", rule_id, date);

        let date = validation::date_key("date", date)?;
        let patch = JobPatch::validate(request)?;
        let rule = self.recurring.rule_for_instance(rule_id, &date).await?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;

        if find_instance(&mut schedule, &rule, &date).is_none() {
            ensure_slot(&mut schedule, date, rule.team_id)
                .addresses
                .push(projection::virtual_job(&rule, &date));
        }
        let job = find_instance(&mut schedule, &rule, &date).ok_or_else(|| {
            DomainError::not_found(format!("job {}", projection::instance_id(rule_id, &date)))
        })?;
        patch.apply(job)?;
        let updated = job.clone();

        self.save(
            &schedule,
            &format!("Edit recurring job {} on {}", rule_id, date),
        )
        .await?;
        Ok(updated)
    }

    /// Skip one occurrence of a rule. A materialized job for that day is
    /// cancelled as well.
    pub async fn cancel_recurring_instance(
        &self,
        rule_id: &str,
        date: &str,
    ) -> DomainResult<RecurringRule> {
        info!("Cancelling occurrence of recurring job {} on {}", rule_id, date);

        let rule = self.recurring.add_exception(rule_id, date).await?;
        let date = validation::date_key("date", date)?;

        let _guard = self.write_gate.lock().await;
        let mut schedule = self.load().await?;
        let Some(job) = find_instance(&mut schedule, &rule, &date) else {
            return Ok(rule);
        };
        if job.status == JobStatus::Cancelled {
            return Ok(rule);
        }
        job.status = JobStatus::Cancelled;

        self.save(
            &schedule,
            &format!("Cancel recurring job {} on {}", rule_id, date),
        )
        .await?;
        Ok(rule)
    }

    async fn load(&self) -> DomainResult<Schedule> {
        Ok(read_document(self.store.as_ref(), SCHEDULE_KEY).await?)
    }

    async fn save(&self, schedule: &Schedule, description: &str) -> DomainResult<()> {
        Ok(write_document(self.store.as_ref(), SCHEDULE_KEY, schedule, description).await?)
    }
}

fn find_slot<'a>(
    schedule: &'a mut Schedule,
    date: &DateKey,
    team: TeamId,
) -> DomainResult<&'a mut TeamDaySlot> {
    schedule
        .get_mut(date)
        .ok_or_else(|| DomainError::not_found(format!("schedule for {}", date)))?
        .get_mut(&team)
        .ok_or_else(|| DomainError::not_found(format!("{} on {}", team, date)))
}

fn find_job<'a>(
    schedule: &'a mut Schedule,
    date: &DateKey,
    team: TeamId,
    job_id: &str,
) -> DomainResult<&'a mut Job> {
    find_slot(schedule, date, team)?
        .addresses
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| DomainError::not_found(format!("job {}", job_id)))
}

/// A stored job for `rule` on `date`, in whichever team slot it landed
fn find_instance<'a>(
    schedule: &'a mut Schedule,
    rule: &RecurringRule,
    date: &DateKey,
) -> Option<&'a mut Job> {
    schedule
        .get_mut(date)?
        .values_mut()
        .flat_map(|slot| slot.addresses.iter_mut())
        .find(|job| job.recurring_id.as_deref() == Some(rule.id.as_str()))
}

/// A validated job edit. Blank optional text clears the field.
struct JobPatch {
    street: Option<String>,
    house_number: Option<String>,
    client_name: Option<Option<String>>,
    notes: Option<Option<String>>,
    time_interval_label: Option<Option<String>>,
    expected_hours: Option<f64>,
    status: Option<JobStatus>,
}

impl JobPatch {
    fn validate(request: EditJobRequest) -> DomainResult<Self> {
        Ok(Self {
            street: request
                .street
                .as_deref()
                .map(|v| validation::required("street", v))
                .transpose()?,
            house_number: request
                .house_number
                .as_deref()
                .map(|v| validation::required("houseNumber", v))
                .transpose()?,
            client_name: request
                .client_name
                .map(|v| validation::optional_text(Some(v.as_str()))),
            notes: request.notes.map(|v| validation::optional_text(Some(v.as_str()))),
            time_interval_label: request
                .time_interval_label
                .map(|v| validation::optional_text(Some(v.as_str()))),
            expected_hours: request
                .expected_hours
                .map(|v| validation::hours("expectedHours", v))
                .transpose()?,
            status: request
                .status
                .as_deref()
                .map(|v| validation::status("status", v))
                .transpose()?,
        })
    }

    /// Write the patch onto `job`. A cancelled job cannot be marked completed
    /// here either; nothing is changed when that transition is requested.
    fn apply(self, job: &mut Job) -> DomainResult<()> {
        if self.status == Some(JobStatus::Completed) && job.status == JobStatus::Cancelled {
            return Err(DomainError::validation(
                "status",
                format!("job {} is cancelled and cannot be completed", job.id),
            ));
        }

        let address_changed = self.street.is_some() || self.house_number.is_some();

        if let Some(street) = self.street {
            job.street = street;
        }
        if let Some(house_number) = self.house_number {
            job.house_number = house_number;
        }
        if let Some(client_name) = self.client_name {
            job.client_name = client_name;
        }
        if let Some(notes) = self.notes {
            job.notes = notes;
        }
        if let Some(label) = self.time_interval_label {
            job.time_interval_label = label;
        }
        if let Some(expected_hours) = self.expected_hours {
            job.expected_hours = expected_hours;
        }
        if let Some(status) = self.status {
            job.status = status;
        }

        if address_changed {
            job.refresh_maps_url();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use shared::{CreateRecurringJobRequest, EditRecurringJobRequest};

    fn setup_test() -> (ScheduleService, RecurringService, MemoryStore) {
        let store = MemoryStore::new();
        let shared_store: Arc<dyn JsonStore> = Arc::new(store.clone());
        let recurring = RecurringService::new(shared_store.clone());
        let service = ScheduleService::new(shared_store, recurring.clone(), 7);
        (service, recurring, store)
    }

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).unwrap()
    }

    fn job_request(date: &str, team: &str) -> AddJobRequest {
        AddJobRequest {
            date: date.to_string(),
            team: team.to_string(),
            street: "Main Street".to_string(),
            house_number: "42".to_string(),
            ..Default::default()
        }
    }

    fn range(start: &str, days: u32) -> ScheduleQuery {
        ScheduleQuery {
            start: Some(start.to_string()),
            days: Some(days),
        }
    }

    async fn stored(service: &ScheduleService) -> Schedule {
        service.load().await.unwrap()
    }

    async fn weekly_rule(recurring: &RecurringService) -> RecurringRule {
        recurring
            .create(CreateRecurringJobRequest {
                street: "Oak Ave".to_string(),
                house_number: "5".to_string(),
                team_id: "Team_A".to_string(),
                start_date: "02-03-2026".to_string(),
                frequency: "weekly".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_default_window_has_both_teams() {
        let window = default_window(key("30-12-2026"), 3);
        let dates: Vec<String> = window.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["30-12-2026", "31-12-2026", "01-01-2027"]);
        for day in window.values() {
            assert_eq!(day.len(), 2);
            assert!(day.values().all(|slot| slot.addresses.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_add_job_builds_maps_url() {
        let (service, _recurring, store) = setup_test();

        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.maps_url.ends_with("42%20Main%20Street"));
        assert!(Uuid::parse_str(&job.id).is_ok());

        let schedule = stored(&service).await;
        let slot = &schedule[&key("17-02-2026")][&TeamId::TeamA];
        assert_eq!(slot.addresses, vec![job]);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_add_job_replaces_workers_only_when_given() {
        let (service, _recurring, _store) = setup_test();

        let mut request = job_request("17-02-2026", "Team_B");
        request.selected_workers = vec!["Ana".to_string(), "Beatriz".to_string()];
        service.add_job(request).await.unwrap();

        service
            .add_job(job_request("17-02-2026", "Team_B"))
            .await
            .unwrap();

        let mut request = job_request("17-02-2026", "Team_B");
        request.selected_workers = vec!["Carla".to_string()];
        service.add_job(request).await.unwrap();

        let schedule = stored(&service).await;
        let slot = &schedule[&key("17-02-2026")][&TeamId::TeamB];
        assert_eq!(slot.assigned_workers, vec![Worker::Carla]);
        assert_eq!(slot.addresses.len(), 3);
    }

    #[tokio::test]
    async fn test_add_job_rejects_unknown_worker() {
        let (service, _recurring, store) = setup_test();

        let mut request = job_request("17-02-2026", "Team_A");
        request.selected_workers = vec!["Zed".to_string()];
        let err = service.add_job(request).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("Zed"));
        assert_eq!(err.field(), Some("selected_workers"));
        assert_eq!(store.write_count(), 0);
        assert!(stored(&service).await.is_empty());
    }

    #[tokio::test]
    async fn test_add_job_validation_names_field() {
        let (service, _recurring, _store) = setup_test();

        let err = service
            .add_job(job_request("30-02-2026", "Team_A"))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("date"));

        let err = service
            .add_job(job_request("17-02-2026", "Team_C"))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("team"));

        let mut request = job_request("17-02-2026", "Team_A");
        request.house_number = "".to_string();
        let err = service.add_job(request).await.unwrap_err();
        assert_eq!(err.field(), Some("houseNumber"));
    }

    #[tokio::test]
    async fn test_cancel_job_is_idempotent() {
        let (service, _recurring, store) = setup_test();
        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();
        let writes = store.write_count();

        let first = service
            .cancel_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        let after_first = stored(&service).await;
        let second = service
            .cancel_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();

        assert_eq!(first.status, JobStatus::Cancelled);
        assert_eq!(first, second);
        assert_eq!(stored(&service).await, after_first);
        assert_eq!(store.write_count(), writes + 1);
    }

    #[tokio::test]
    async fn test_cancel_missing_job_is_not_found() {
        let (service, _recurring, _store) = setup_test();
        service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();

        for (date, team, id) in [
            ("18-02-2026", "Team_A", "x"),
            ("17-02-2026", "Team_B", "x"),
            ("17-02-2026", "Team_A", "x"),
        ] {
            let err = service.cancel_job(date, team, id).await.unwrap_err();
            assert!(matches!(err, DomainError::NotFound(_)), "{}", err);
        }
    }

    #[tokio::test]
    async fn test_complete_job() {
        let (service, _recurring, store) = setup_test();
        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();

        let done = service
            .complete_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        let writes = store.write_count();
        service
            .complete_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        assert_eq!(store.write_count(), writes);

        service
            .cancel_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        let err = service
            .complete_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("status"));
    }

    #[tokio::test]
    async fn test_delete_job_is_permanent() {
        let (service, _recurring, _store) = setup_test();
        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();

        let removed = service
            .delete_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        assert_eq!(removed.id, job.id);

        let schedule = stored(&service).await;
        assert!(schedule[&key("17-02-2026")][&TeamId::TeamA].addresses.is_empty());

        let err = service
            .delete_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_job_recomputes_maps_url() {
        let (service, _recurring, _store) = setup_test();
        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();

        let patch = EditJobRequest {
            street: Some("High Street".to_string()),
            notes: Some("Ring twice".to_string()),
            ..Default::default()
        };
        let updated = service
            .edit_job("17-02-2026", "Team_A", &job.id, patch)
            .await
            .unwrap();

        assert_eq!(updated.street, "High Street");
        assert_eq!(updated.house_number, "42");
        assert!(updated.maps_url.ends_with("42%20High%20Street"));
        assert_eq!(updated.notes.as_deref(), Some("Ring twice"));
        assert_eq!(updated.status, JobStatus::Pending);

        let err = service
            .edit_job(
                "17-02-2026",
                "Team_A",
                &job.id,
                EditJobRequest {
                    street: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("street"));
    }

    #[tokio::test]
    async fn test_edit_job_cannot_complete_cancelled_job() {
        let (service, _recurring, store) = setup_test();
        let job = service
            .add_job(job_request("17-02-2026", "Team_A"))
            .await
            .unwrap();
        service
            .cancel_job("17-02-2026", "Team_A", &job.id)
            .await
            .unwrap();
        let writes = store.write_count();

        let err = service
            .edit_job(
                "17-02-2026",
                "Team_A",
                &job.id,
                EditJobRequest {
                    notes: Some("Done after all".to_string()),
                    status: Some("completed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("status"));
        assert_eq!(store.write_count(), writes);

        let schedule = stored(&service).await;
        let kept = &schedule[&key("17-02-2026")][&TeamId::TeamA].addresses[0];
        assert_eq!(kept.status, JobStatus::Cancelled);
        assert_eq!(kept.notes, None);

        // Reopening a cancelled job is still allowed
        let reopened = service
            .edit_job(
                "17-02-2026",
                "Team_A",
                &job.id,
                EditJobRequest {
                    status: Some("pending".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_workers_creates_slot() {
        let (service, _recurring, _store) = setup_test();

        let slot = service
            .update_assigned_workers(
                "20-02-2026",
                "Team_B",
                &["Elisa".to_string(), "Elisa".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(slot.assigned_workers, vec![Worker::Elisa, Worker::Elisa]);

        let schedule = stored(&service).await;
        assert!(schedule[&key("20-02-2026")].contains_key(&TeamId::TeamB));
        assert!(!schedule[&key("20-02-2026")].contains_key(&TeamId::TeamA));

        let err = service
            .update_assigned_workers("20-02-2026", "Team_B", &["Zed".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("workers"));
    }

    #[tokio::test]
    async fn test_clear_assignments_skips_absent_dates() {
        let (service, _recurring, store) = setup_test();
        for team in ["Team_A", "Team_B"] {
            service
                .update_assigned_workers("17-02-2026", team, &["Ana".to_string()])
                .await
                .unwrap();
        }
        let writes = store.write_count();

        let cleared = service
            .clear_assignments(&["17-02-2026".to_string(), "18-02-2026".to_string()])
            .await
            .unwrap();

        assert_eq!(cleared, 1);
        assert_eq!(store.write_count(), writes + 1);
        let schedule = stored(&service).await;
        let day = &schedule[&key("17-02-2026")];
        assert!(day.values().all(|slot| slot.assigned_workers.is_empty()));
        assert!(!schedule.contains_key(&key("18-02-2026")));

        // Nothing to clear, nothing written
        service
            .clear_assignments(&["01-01-2027".to_string()])
            .await
            .unwrap();
        assert_eq!(store.write_count(), writes + 1);
    }

    #[tokio::test]
    async fn test_get_schedule_pads_and_orders_range() {
        let (service, _recurring, _store) = setup_test();
        service
            .add_job(job_request("31-12-2026", "Team_A"))
            .await
            .unwrap();
        service
            .add_job(job_request("15-01-2027", "Team_A"))
            .await
            .unwrap();

        let response = service.get_schedule(&range("30-12-2026", 3)).await.unwrap();
        let dates: Vec<String> = response.schedule.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["30-12-2026", "31-12-2026", "01-01-2027"]);
        assert_eq!(
            response.schedule[&key("31-12-2026")][&TeamId::TeamA].addresses.len(),
            1
        );
        assert!(response.schedule[&key("30-12-2026")].contains_key(&TeamId::TeamB));
    }

    #[tokio::test]
    async fn test_get_schedule_rejects_bad_range() {
        let (service, _recurring, _store) = setup_test();
        let err = service.get_schedule(&range("30-12-2026", 0)).await.unwrap_err();
        assert_eq!(err.field(), Some("days"));
        let err = service.get_schedule(&range("2026-12-30", 3)).await.unwrap_err();
        assert_eq!(err.field(), Some("start"));
    }

    #[tokio::test]
    async fn test_get_schedule_degrades_on_unreadable_schedule() {
        let (service, _recurring, store) = setup_test();
        store.seed(SCHEDULE_KEY, json!("not a schedule")).unwrap();

        let response = service.get_schedule(&ScheduleQuery::default()).await.unwrap();
        assert_eq!(response.days, 7);
        assert_eq!(response.schedule.len(), 7);
        assert!(response.schedule.contains_key(&DateKey::today()));
    }

    #[tokio::test]
    async fn test_get_schedule_migrates_legacy_slots_every_read() {
        let (service, _recurring, store) = setup_test();
        store.seed(
            SCHEDULE_KEY,
            json!({
                "17-02-2026": {
                    "Team_A": [{"id": "j1", "street": "Main Street", "houseNumber": "42"}]
                }
            }),
        )
        .unwrap();

        for _ in 0..2 {
            let response = service.get_schedule(&range("17-02-2026", 1)).await.unwrap();
            let slot = &response.schedule[&key("17-02-2026")][&TeamId::TeamA];
            assert!(slot.assigned_workers.is_empty());
            assert_eq!(slot.addresses.len(), 1);
            assert_eq!(slot.addresses[0].id, "j1");
        }
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_off_roster_worker_does_not_hide_schedule() {
        let (service, _recurring, store) = setup_test();
        store
            .seed(
                SCHEDULE_KEY,
                json!({
                    "17-02-2026": {
                        "Team_A": {
                            "assignedWorkers": ["Ana"],
                            "addresses": [{"id": "j1", "street": "Main Street", "houseNumber": "42"}]
                        }
                    },
                    "18-02-2026": {
                        "Team_B": {"assignedWorkers": ["Maria", "Elisa"], "addresses": []}
                    }
                }),
            )
            .unwrap();

        let response = service.get_schedule(&range("17-02-2026", 2)).await.unwrap();
        let first = &response.schedule[&key("17-02-2026")][&TeamId::TeamA];
        assert_eq!(first.addresses.len(), 1);
        assert_eq!(first.assigned_workers, vec![Worker::Ana]);
        let second = &response.schedule[&key("18-02-2026")][&TeamId::TeamB];
        assert_eq!(second.assigned_workers, vec![Worker::Elisa]);

        service
            .add_job(job_request("18-02-2026", "Team_B"))
            .await
            .unwrap();
        let schedule = stored(&service).await;
        assert_eq!(schedule[&key("17-02-2026")][&TeamId::TeamA].addresses.len(), 1);
        assert_eq!(schedule[&key("18-02-2026")][&TeamId::TeamB].addresses.len(), 1);
    }

    #[tokio::test]
    async fn test_get_schedule_projects_recurring_jobs_without_persisting() {
        let (service, recurring, _store) = setup_test();
        let rule = weekly_rule(&recurring).await;

        let response = service.get_schedule(&range("02-03-2026", 8)).await.unwrap();
        let monday = &response.schedule[&key("02-03-2026")][&TeamId::TeamA];
        assert_eq!(monday.addresses.len(), 1);
        assert_eq!(monday.addresses[0].id, format!("{}_02-03-2026", rule.id));
        let next = &response.schedule[&key("09-03-2026")][&TeamId::TeamA];
        assert_eq!(next.addresses.len(), 1);
        assert!(response.schedule[&key("03-03-2026")][&TeamId::TeamA]
            .addresses
            .is_empty());

        assert!(stored(&service).await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_recurring_instance_suppresses_one_occurrence() {
        let (service, _recurring, _store) = setup_test();
        let rule = weekly_rule(&service.recurring).await;

        let updated = service
            .cancel_recurring_instance(&rule.id, "09-03-2026")
            .await
            .unwrap();
        assert_eq!(updated.exceptions, vec![key("09-03-2026")]);

        let response = service.get_schedule(&range("02-03-2026", 15)).await.unwrap();
        let count = |date: &str| response.schedule[&key(date)][&TeamId::TeamA].addresses.len();
        assert_eq!(count("02-03-2026"), 1);
        assert_eq!(count("09-03-2026"), 0);
        assert_eq!(count("16-03-2026"), 1);
    }

    #[tokio::test]
    async fn test_edit_recurring_instance_materializes_once() {
        let (service, recurring, _store) = setup_test();
        let rule = weekly_rule(&recurring).await;

        let patch = EditJobRequest {
            notes: Some("Bring ladder".to_string()),
            ..Default::default()
        };
        let job = service
            .edit_recurring_instance(&rule.id, "09-03-2026", patch)
            .await
            .unwrap();
        assert_eq!(job.id, format!("{}_09-03-2026", rule.id));
        assert_eq!(job.recurring_id.as_deref(), Some(rule.id.as_str()));
        assert_eq!(job.notes.as_deref(), Some("Bring ladder"));

        let patch = EditJobRequest {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        let job = service
            .edit_recurring_instance(&rule.id, "09-03-2026", patch)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.notes.as_deref(), Some("Bring ladder"));

        let response = service.get_schedule(&range("09-03-2026", 1)).await.unwrap();
        let jobs = &response.schedule[&key("09-03-2026")][&TeamId::TeamA].addresses;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Completed);

        // Cancelling the occurrence also cancels the stored job
        service
            .cancel_recurring_instance(&rule.id, "09-03-2026")
            .await
            .unwrap();
        let schedule = stored(&service).await;
        assert_eq!(
            schedule[&key("09-03-2026")][&TeamId::TeamA].addresses[0].status,
            JobStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_edited_instance_stays_single_after_rule_changes_team() {
        let (service, recurring, _store) = setup_test();
        let rule = weekly_rule(&recurring).await;

        service
            .edit_recurring_instance(
                &rule.id,
                "09-03-2026",
                EditJobRequest {
                    status: Some("completed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        recurring
            .edit(
                &rule.id,
                EditRecurringJobRequest {
                    team_id: Some("Team_B".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let response = service.get_schedule(&range("09-03-2026", 8)).await.unwrap();
        let day = &response.schedule[&key("09-03-2026")];
        let instances: Vec<&Job> = day
            .values()
            .flat_map(|slot| slot.addresses.iter())
            .filter(|job| job.recurring_id.as_deref() == Some(rule.id.as_str()))
            .collect();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].status, JobStatus::Completed);
        assert!(day[&TeamId::TeamB].addresses.is_empty());

        let next = &response.schedule[&key("16-03-2026")];
        assert!(next[&TeamId::TeamA].addresses.is_empty());
        assert_eq!(next[&TeamId::TeamB].addresses.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_recurring_instance_rejects_off_days() {
        let (service, recurring, store) = setup_test();
        let rule = weekly_rule(&recurring).await;
        let writes = store.write_count();

        let err = service
            .edit_recurring_instance(&rule.id, "10-03-2026", EditJobRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("date"));

        let err = service
            .edit_recurring_instance("missing", "09-03-2026", EditJobRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_roster() {
        let roster = roster();
        assert_eq!(roster.teams, vec![TeamId::TeamA, TeamId::TeamB]);
        assert_eq!(roster.workers.len(), 6);
    }
}
