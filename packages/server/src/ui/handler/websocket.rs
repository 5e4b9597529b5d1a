//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Query, State, ws::WebSocketUpgrade},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::ui::{session::run_session, state::AppState};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Access code of the room. A missing code is handled like an unknown one.
    #[serde(default)]
    pub code: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let address = state.origin_id_factory.client_address(peer.ip(), &headers);
    let origin_id = state.origin_id_factory.derive(&address);
    let access_code = query.code.unwrap_or_default();

    ws.on_upgrade(move |socket| run_session(socket, state, access_code, origin_id))
}
