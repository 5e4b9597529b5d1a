//! Data Transfer Objects (DTOs) for the sync server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs
//! - `http`: HTTP API DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
