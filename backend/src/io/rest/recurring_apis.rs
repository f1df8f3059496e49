//! # REST API for Recurring Jobs
//!
//! Rule CRUD plus the per-occurrence actions (skip one date, edit one date).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use tracing::{error, info};

use crate::io::rest::ApiError;
use crate::AppState;
use shared::{
    CancelRecurringInstanceRequest, CreateRecurringJobRequest, EditJobRequest,
    EditRecurringJobRequest, RecurringJobListResponse,
};

/// Create a router for recurring job APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recurring_jobs).post(create_recurring_job))
        .route(
            "/:id",
            get(get_recurring_job)
                .put(edit_recurring_job)
                .delete(delete_recurring_job),
        )
        .route("/:id/cancel-instance", post(cancel_recurring_instance))
        .route("/:id/instances/:date", put(edit_recurring_instance))
}

pub async fn list_recurring_jobs(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/recurring");

    match state.recurring_service.list().await {
        Ok(recurring_jobs) => {
            (StatusCode::OK, Json(RecurringJobListResponse { recurring_jobs })).into_response()
        }
        Err(e) => {
            error!("Failed to list recurring jobs: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_recurring_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/recurring/{}", id);

    match state.recurring_service.get(&id).await {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(e) => {
            error!("Failed to get recurring job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn create_recurring_job(
    State(state): State<AppState>,
    Json(request): Json<CreateRecurringJobRequest>,
) -> impl IntoResponse {
    info!("POST /api/recurring - request: {:?}", request);

    match state.recurring_service.create(request).await {
        Ok(rule) => (StatusCode::CREATED, Json(rule)).into_response(),
        Err(e) => {
            error!("Failed to create recurring job: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn edit_recurring_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditRecurringJobRequest>,
) -> impl IntoResponse {
    info!("PUT /api/recurring/{} - request: {:?}", id, request);

    match state.recurring_service.edit(&id, request).await {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(e) => {
            error!("Failed to edit recurring job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_recurring_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/recurring/{}", id);

    match state.recurring_service.delete(&id).await {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(e) => {
            error!("Failed to delete recurring job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Skip a single occurrence
pub async fn cancel_recurring_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CancelRecurringInstanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/recurring/{}/cancel-instance - date: {}", id, request.date);

    match state
        .schedule_service
        .cancel_recurring_instance(&id, &request.date)
        .await
    {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(e) => {
            error!("Failed to cancel occurrence of {} on {}: {}", id, request.date, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Edit a single occurrence, storing it as a concrete job
pub async fn edit_recurring_instance(
    State(state): State<AppState>,
    Path((id, date)): Path<(String, String)>,
    Json(request): Json<EditJobRequest>,
) -> impl IntoResponse {
    info!("PUT /api/recurring/{}/instances/{} - request: {:?}", id, date, request);

    match state
        .schedule_service
        .edit_recurring_instance(&id, &date, request)
        .await
    {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to edit occurrence of {} on {}: {}", id, date, e);
            ApiError::from(e).into_response()
        }
    }
}
