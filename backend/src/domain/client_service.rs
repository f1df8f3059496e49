//! Saved client addresses.
//!
//! Clients only pre-fill job and rule creation. Nothing references them by
//! id, so deleting a client leaves existing jobs and rules untouched.

use shared::{Client, CreateClientRequest, EditClientRequest};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::validation;
use crate::storage::{read_document, write_document, JsonStore, CLIENTS_KEY};

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn JsonStore>,
    write_gate: Arc<Mutex<()>>,
}

impl ClientService {
    pub fn new(store: Arc<dyn JsonStore>) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<Client>> {
        let clients = self.load().await?;
        info!("Found {} client(s)", clients.len());
        Ok(clients)
    }

    pub async fn add(&self, request: CreateClientRequest) -> DomainResult<Client> {
        info!("Adding client: {}", request.name);

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: validation::required("name", &request.name)?,
            street: validation::required("street", &request.street)?,
            house_number: validation::required("houseNumber", &request.house_number)?,
            notes: validation::optional_text(request.notes.as_deref()).unwrap_or_default(),
            expected_hours: validation::hours(
                "expectedHours",
                request.expected_hours.unwrap_or_default(),
            )?,
            default_frequency: optional_frequency(request.default_frequency.as_deref())?,
            default_time_interval: validation::optional_text(
                request.default_time_interval.as_deref(),
            ),
        };

        let _guard = self.write_gate.lock().await;
        let mut clients = self.load().await?;
        clients.push(client.clone());
        self.save(&clients, &format!("Add client {}", client.name))
            .await?;

        info!("Added client {} with ID: {}", client.name, client.id);
        Ok(client)
    }

    pub async fn edit(&self, client_id: &str, patch: EditClientRequest) -> DomainResult<Client> {
        info!("Editing client {}", client_id);

        let name = patch
            .name
            .as_deref()
            .map(|v| validation::required("name", v))
            .transpose()?;
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
        let expected_hours = patch
            .expected_hours
            .map(|v| validation::hours("expectedHours", v))
            .transpose()?;
        let default_frequency = match patch.default_frequency.as_deref() {
            Some(raw) => Some(optional_frequency(Some(raw))?),
            None => None,
        };

        let _guard = self.write_gate.lock().await;
        let mut clients = self.load().await?;
        let client = clients
            .iter_mut()
            .find(|client| client.id == client_id)
            .ok_or_else(|| DomainError::not_found(format!("client {}", client_id)))?;

        if let Some(name) = name {
            client.name = name;
        }
        if let Some(street) = street {
            client.street = street;
        }
        if let Some(house_number) = house_number {
            client.house_number = house_number;
        }
        if let Some(notes) = patch.notes {
            client.notes = notes.trim().to_string();
        }
        if let Some(expected_hours) = expected_hours {
            client.expected_hours = expected_hours;
        }
        // An empty string clears the default
        if let Some(default_frequency) = default_frequency {
            client.default_frequency = default_frequency;
        }
        if let Some(interval) = patch.default_time_interval {
            client.default_time_interval = validation::optional_text(Some(interval.as_str()));
        }

        let updated = client.clone();
        self.save(&clients, &format!("Edit client {}", updated.name))
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, client_id: &str) -> DomainResult<Client> {
        info!("Deleting client {}", client_id);

        let _guard = self.write_gate.lock().await;
        let mut clients = self.load().await?;
        let Some(position) = clients.iter().position(|client| client.id == client_id) else {
            warn!("Client not found: {}", client_id);
            return Err(DomainError::not_found(format!("client {}", client_id)));
        };
        let removed = clients.remove(position);

        self.save(&clients, &format!("Delete client {}", removed.name))
            .await?;
        Ok(removed)
    }

    async fn load(&self) -> DomainResult<Vec<Client>> {
        Ok(read_document(self.store.as_ref(), CLIENTS_KEY).await?)
    }

    async fn save(&self, clients: &[Client], description: &str) -> DomainResult<()> {
        Ok(write_document(self.store.as_ref(), CLIENTS_KEY, &clients, description).await?)
    }
}

/// Blank means "no default"; anything else must be a known frequency
fn optional_frequency(raw: Option<&str>) -> DomainResult<Option<shared::Frequency>> {
    validation::optional_text(raw)
        .map(|value| validation::frequency("defaultFrequency", &value))
        .transpose()
}
