//! # REST API for the Schedule
//!
//! Reading the schedule, job lifecycle and worker assignments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use tracing::{error, info};

use crate::domain::schedule_service;
use crate::io::rest::ApiError;
use crate::AppState;
use shared::{
    AckResponse, AddJobRequest, ClearAssignmentsRequest, EditJobRequest, ScheduleQuery,
    UpdateWorkersRequest,
};

/// Create a router for schedule related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_schedule))
        .route("/jobs", post(add_job))
        .route("/clear-assignments", post(clear_assignments))
        .route("/:date/:team/jobs/:id", put(edit_job).delete(delete_job))
        .route("/:date/:team/jobs/:id/cancel", post(cancel_job))
        .route("/:date/:team/jobs/:id/complete", post(complete_job))
        .route("/:date/:team/workers", put(update_workers))
}

/// Get the schedule for a range, recurring jobs included
pub async fn get_schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> impl IntoResponse {
    info!("GET /api/schedule - query: {:?}", query);

    match state.schedule_service.get_schedule(&query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to read schedule: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn add_job(
    State(state): State<AppState>,
    Json(request): Json<AddJobRequest>,
) -> impl IntoResponse {
    info!("POST /api/schedule/jobs - request: {:?}", request);

    match state.schedule_service.add_job(request).await {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to add job: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn edit_job(
    State(state): State<AppState>,
    Path((date, team, id)): Path<(String, String, String)>,
    Json(request): Json<EditJobRequest>,
) -> impl IntoResponse {
    info!("PUT /api/schedule/{}/{}/jobs/{} - request: {:?}", date, team, id, request);

    match state.schedule_service.edit_job(&date, &team, &id, request).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to edit job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Path((date, team, id)): Path<(String, String, String)>,
) -> impl IntoResponse {
    info!("POST /api/schedule/{}/{}/jobs/{}/cancel", date, team, id);

    match state.schedule_service.cancel_job(&date, &team, &id).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to cancel job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn complete_job(
    State(state): State<AppState>,
    Path((date, team, id)): Path<(String, String, String)>,
) -> impl IntoResponse {
    info!("POST /api/schedule/{}/{}/jobs/{}/complete", date, team, id);

    match state.schedule_service.complete_job(&date, &team, &id).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to complete job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path((date, team, id)): Path<(String, String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/schedule/{}/{}/jobs/{}", date, team, id);

    match state.schedule_service.delete_job(&date, &team, &id).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => {
            error!("Failed to delete job {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn update_workers(
    State(state): State<AppState>,
    Path((date, team)): Path<(String, String)>,
    Json(request): Json<UpdateWorkersRequest>,
) -> impl IntoResponse {
    info!("PUT /api/schedule/{}/{}/workers - request: {:?}", date, team, request);

    match state
        .schedule_service
        .update_assigned_workers(&date, &team, &request.workers)
        .await
    {
        Ok(slot) => {
            let response = AckResponse {
                success: true,
                message: format!(
                    "Assigned {} worker(s) to {} on {}",
                    slot.assigned_workers.len(),
                    team,
                    date
                ),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update workers on {} for {}: {}", date, team, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn clear_assignments(
    State(state): State<AppState>,
    Json(request): Json<ClearAssignmentsRequest>,
) -> impl IntoResponse {
    info!("POST /api/schedule/clear-assignments - request: {:?}", request);

    match state.schedule_service.clear_assignments(&request.dates).await {
        Ok(cleared) => {
            let response = AckResponse {
                success: true,
                message: format!("Cleared assignments on {} day(s)", cleared),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to clear assignments: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Teams and workers, for populating pickers
pub async fn get_roster() -> impl IntoResponse {
    info!("GET /api/roster");
    (StatusCode::OK, Json(schedule_service::roster()))
}
