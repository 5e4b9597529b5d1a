//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Request body of `POST /api/rooms`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub title: String,
}

/// Response body of `POST /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
}
