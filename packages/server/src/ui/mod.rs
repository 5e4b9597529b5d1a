//! Axum server: routes, connection sessions and the per-session operation pipeline.

mod handler;
pub mod pipeline;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::{Server, default_broadcast_bindings};
