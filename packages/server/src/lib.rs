//! Real-time room synchronization server for collaborative roleplay rooms.
//!
//! Clients connect over WebSocket with a room access code, receive a snapshot
//! of the room, submit operations and receive every other member's changes.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
