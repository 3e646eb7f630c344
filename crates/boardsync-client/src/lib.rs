//! boardsync client: CLI parsing, configuration, and pipeline wiring.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod sync;
