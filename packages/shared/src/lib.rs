//! Utilities shared by the rpsync packages.

pub mod logger;
pub mod time;
