//! インメモリ実装

pub mod room;

pub use room::InMemoryRoomStore;
