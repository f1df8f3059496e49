//! # Cleaning Scheduler Backend
//!
//! Assigns cleaning jobs to two fixed teams across a rolling window, tracks
//! job status and expands weekly/fortnightly templates into the schedule at
//! read time.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (axum REST handlers)
//!     ↓
//! Domain Layer (services, validation, recurring projection)
//!     ↓
//! Storage Layer (JsonStore: file, git or memory)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Build the configured store and the services on top of it
//! - Assemble the `/api` router with CORS for the frontend origin

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::domain::{ClientService, RecurringService, ScheduleService};
use crate::io::rest::{client_apis, recurring_apis, schedule_apis};
use crate::storage::JsonStore;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub schedule_service: ScheduleService,
    pub recurring_service: RecurringService,
    pub client_service: ClientService,
}

impl AppState {
    /// Wire every service to the same store
    pub fn with_store(store: Arc<dyn JsonStore>, window_days: u32) -> Self {
        let recurring_service = RecurringService::new(store.clone());
        let client_service = ClientService::new(store.clone());
        let schedule_service = ScheduleService::new(store, recurring_service.clone(), window_days);

        Self {
            schedule_service,
            recurring_service,
            client_service,
        }
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up storage");
    let store = storage::open_store(config)?;

    info!("Setting up domain model");
    Ok(AppState::with_store(store, config.window_days))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin '{}'", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/schedule", schedule_apis::router())
        .nest("/recurring", recurring_apis::router())
        .nest("/clients", client_apis::router())
        .route("/roster", get(schedule_apis::get_roster));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
