//! # Domain Module
//!
//! Business logic for the cleaning scheduler. Services here validate input,
//! run read-modify-write cycles against the store and never know which
//! backend they are talking to.
//!
//! ## Services
//!
//! - **ScheduleService**: jobs, assignments and the projected schedule view
//! - **RecurringService**: weekly/fortnightly templates and their exceptions
//! - **ClientService**: saved client addresses
//!
//! The recurring projection itself lives in [`projection`] as pure functions.

pub mod client_service;
pub mod error;
pub mod projection;
pub mod recurring_service;
pub mod schedule_service;
pub mod validation;

pub use client_service::ClientService;
pub use error::{DomainError, DomainResult};
pub use recurring_service::RecurringService;
pub use schedule_service::ScheduleService;
