use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub mod date_key;

pub use date_key::{DateKey, InvalidDateKey};

/// Base of the map-search deep link attached to every job
pub const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Build the map-search link for an address.
///
/// The query is `"{house_number} {street}"`, percent-encoded (space as `%20`).
pub fn maps_url(street: &str, house_number: &str) -> String {
    let query = format!("{} {}", house_number.trim(), street.trim());
    format!("{}{}", MAPS_SEARCH_URL, urlencoding::encode(&query))
}

/// One of the two cleaning teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TeamId {
    #[serde(rename = "Team_A")]
    TeamA,
    #[serde(rename = "Team_B")]
    TeamB,
}

impl TeamId {
    pub const ALL: [TeamId; 2] = [TeamId::TeamA, TeamId::TeamB];

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamId::TeamA => "Team_A",
            TeamId::TeamB => "Team_B",
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamId::ALL
            .into_iter()
            .find(|team| team.as_str() == s)
            .ok_or_else(|| format!("unknown team '{}'", s))
    }
}

/// The fixed worker roster. Names outside this set are rejected when a
/// schedule is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Worker {
    Ana,
    Beatriz,
    Carla,
    Daniela,
    Elisa,
    Fernanda,
}

impl Worker {
    pub const ROSTER: [Worker; 6] = [
        Worker::Ana,
        Worker::Beatriz,
        Worker::Carla,
        Worker::Daniela,
        Worker::Elisa,
        Worker::Fernanda,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Worker::Ana => "Ana",
            Worker::Beatriz => "Beatriz",
            Worker::Carla => "Carla",
            Worker::Daniela => "Daniela",
            Worker::Elisa => "Elisa",
            Worker::Fernanda => "Fernanda",
        }
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Worker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Worker::ROSTER
            .into_iter()
            .find(|worker| worker.as_str() == s)
            .ok_or_else(|| format!("unknown worker '{}'", s))
    }
}

/// Lifecycle of a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Completed,
    /// Soft delete: the job stays in the schedule but is not worked
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// How often a recurring rule repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Fortnightly,
}

impl Frequency {
    /// Days between consecutive occurrences
    pub fn interval_days(&self) -> i64 {
        match self {
            Frequency::Weekly => 7,
            Frequency::Fortnightly => 14,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Fortnightly => "fortnightly",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "fortnightly" => Ok(Frequency::Fortnightly),
            other => Err(format!("unknown frequency '{}'", other)),
        }
    }
}

/// A cleaning job at one address.
///
/// Projected recurring instances carry `recurring_id`; they are synthesized at
/// read time and never persisted unless explicitly materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub street: String,
    #[serde(alias = "house_number")]
    pub house_number: String,
    #[serde(default)]
    pub status: JobStatus,
    /// Derived from street and house number, see [`maps_url`]
    #[serde(default)]
    pub maps_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "client_name")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Free-text display label such as "9:00 - 12:00"
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "time_interval")]
    pub time_interval_label: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "recurring_id")]
    pub recurring_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
}

impl Job {
    /// A pending job with its map link computed
    pub fn new(id: String, street: &str, house_number: &str) -> Self {
        let street = street.trim().to_string();
        let house_number = house_number.trim().to_string();
        Self {
            id,
            maps_url: maps_url(&street, &house_number),
            street,
            house_number,
            status: JobStatus::Pending,
            client_name: None,
            notes: None,
            time_interval_label: None,
            expected_hours: 0.0,
            recurring_id: None,
            is_recurring: false,
            frequency: None,
        }
    }

    pub fn refresh_maps_url(&mut self) {
        self.maps_url = maps_url(&self.street, &self.house_number);
    }
}

/// Workers and jobs for one team on one day
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDaySlot {
    /// Display/assignment order; duplicates are allowed
    pub assigned_workers: Vec<Worker>,
    pub addresses: Vec<Job>,
}

/// On-disk shapes a team slot has had. Older data stored a bare list of jobs
/// per team with no worker assignment. Worker names stay raw text here: the
/// roster is enforced when a slot is written, not when it is read back.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSlot {
    Legacy(Vec<Job>),
    Current {
        #[serde(default, rename = "assignedWorkers", alias = "assigned_workers")]
        assigned_workers: Vec<String>,
        #[serde(default)]
        addresses: Vec<Job>,
    },
}

/// Stored names that are no longer on the roster are dropped from the slot
fn roster_workers(names: Vec<String>) -> Vec<Worker> {
    names
        .into_iter()
        .filter_map(|name| match name.parse::<Worker>() {
            Ok(worker) => Some(worker),
            Err(e) => {
                warn!("Ignoring stored assignment: {}", e);
                None
            }
        })
        .collect()
}

// Every read goes through here, so legacy slots are migrated on each load
impl<'de> Deserialize<'de> for TeamDaySlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredSlot::deserialize(deserializer)? {
            StoredSlot::Legacy(addresses) => TeamDaySlot {
                assigned_workers: Vec::new(),
                addresses,
            },
            StoredSlot::Current {
                assigned_workers,
                addresses,
            } => TeamDaySlot {
                assigned_workers: roster_workers(assigned_workers),
                addresses,
            },
        })
    }
}

/// Team slots for a single day; a team is present only once referenced
pub type DaySchedule = BTreeMap<TeamId, TeamDaySlot>;

/// The whole schedule, ordered by calendar day
pub type Schedule = BTreeMap<DateKey, DaySchedule>;

/// A weekly or fortnightly template that projects jobs onto matching days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    pub id: String,
    #[serde(default)]
    pub client_name: String,
    pub street: String,
    pub house_number: String,
    #[serde(default)]
    pub notes: String,
    pub team_id: TeamId,
    pub start_date: DateKey,
    pub frequency: Frequency,
    #[serde(default)]
    pub time_interval_label: String,
    #[serde(default)]
    pub expected_hours: f64,
    /// Days whose occurrence is suppressed; kept free of duplicates
    #[serde(default)]
    pub exceptions: Vec<DateKey>,
    #[serde(default)]
    pub paused: bool,
    pub created_at: String,
}

/// A saved address used to pre-fill jobs and recurring rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub street: String,
    pub house_number: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub expected_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_time_interval: Option<String>,
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Range selector for reading the schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleQuery {
    /// First day (`DD-MM-YYYY`); defaults to today
    pub start: Option<String>,
    /// Number of days; defaults to the configured rolling window
    pub days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub start: DateKey,
    pub days: u32,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddJobRequest {
    pub date: String,
    #[serde(alias = "team_id", alias = "teamId")]
    pub team: String,
    pub street: String,
    #[serde(alias = "house_number")]
    pub house_number: String,
    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "time_interval_label")]
    pub time_interval_label: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
    /// When non-empty, replaces the slot's assigned workers
    #[serde(default, alias = "selected_workers")]
    pub selected_workers: Vec<String>,
}

/// Field-by-field patch for a job; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditJobRequest {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, alias = "house_number")]
    pub house_number: Option<String>,
    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "time_interval_label")]
    pub time_interval_label: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkersRequest {
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearAssignmentsRequest {
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecurringJobRequest {
    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,
    pub street: String,
    #[serde(alias = "house_number")]
    pub house_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(alias = "team_id", alias = "team")]
    pub team_id: String,
    #[serde(alias = "start_date")]
    pub start_date: String,
    pub frequency: String,
    #[serde(default, alias = "time_interval_label")]
    pub time_interval_label: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
}

/// Field-by-field patch for a recurring rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecurringJobRequest {
    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, alias = "house_number")]
    pub house_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "team_id", alias = "team")]
    pub team_id: Option<String>,
    #[serde(default, alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default, alias = "time_interval_label")]
    pub time_interval_label: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
    #[serde(default)]
    pub paused: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelRecurringInstanceRequest {
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringJobListResponse {
    pub recurring_jobs: Vec<RecurringRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    pub street: String,
    #[serde(alias = "house_number")]
    pub house_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
    #[serde(default, alias = "default_frequency")]
    pub default_frequency: Option<String>,
    #[serde(default, alias = "default_time_interval")]
    pub default_time_interval: Option<String>,
}

/// Field-by-field patch for a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, alias = "house_number")]
    pub house_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "expected_hours")]
    pub expected_hours: Option<f64>,
    #[serde(default, alias = "default_frequency")]
    pub default_frequency: Option<String>,
    #[serde(default, alias = "default_time_interval")]
    pub default_time_interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<Client>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterResponse {
    pub teams: Vec<TeamId>,
    pub workers: Vec<Worker>,
}

/// Generic acknowledgement for operations without a richer result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}
