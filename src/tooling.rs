//! Tooling & Integration Layer
//!
//! Transports over [`crate::service::ChatService`]: the command-line interface
//! and the HTTP server, plus their output formatting.

pub mod cli;
pub mod format;
pub mod server;

pub use cli::{Cli, CliContext, Commands};
pub use server::{build_router, serve, AppState};
