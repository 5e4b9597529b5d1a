//! Infrastructure layer: concrete store, WebSocket pusher, DTOs and origin ids.

pub mod dto;
pub mod message_pusher;
pub mod origin;
pub mod repository;
