//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::http::{CreateRoomRequest, CreateRoomResponse},
    ui::state::AppState,
    usecase::CreateRoomError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a room with a generated access code
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), (StatusCode, Json<serde_json::Value>)> {
    match state.create_room_usecase.execute(request.title, None).await {
        Ok(code) => Ok((
            StatusCode::CREATED,
            Json(CreateRoomResponse {
                code: code.into_string(),
            }),
        )),
        Err(e) => {
            let status = match e {
                CreateRoomError::Invalid(_) => StatusCode::BAD_REQUEST,
                CreateRoomError::CodeTaken(_) => StatusCode::CONFLICT,
                CreateRoomError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::warn!("Failed to create room: {}", e);
            Err((status, Json(serde_json::json!({"error": e.to_string()}))))
        }
    }
}
