//! # REST API for Clients

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use tracing::{error, info};

use crate::io::rest::ApiError;
use crate::AppState;
use shared::{ClientListResponse, CreateClientRequest, EditClientRequest};

/// Create a router for client APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(add_client))
        .route("/:id", put(edit_client).delete(delete_client))
}

pub async fn list_clients(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/clients");

    match state.client_service.list().await {
        Ok(clients) => (StatusCode::OK, Json(ClientListResponse { clients })).into_response(),
        Err(e) => {
            error!("Failed to list clients: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn add_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> impl IntoResponse {
    info!("POST /api/clients - request: {:?}", request);

    match state.client_service.add(request).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => {
            error!("Failed to add client: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn edit_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditClientRequest>,
) -> impl IntoResponse {
    info!("PUT /api/clients/{} - request: {:?}", id, request);

    match state.client_service.edit(&id, request).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => {
            error!("Failed to edit client {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/clients/{}", id);

    match state.client_service.delete(&id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => {
            error!("Failed to delete client {}: {}", id, e);
            ApiError::from(e).into_response()
        }
    }
}
