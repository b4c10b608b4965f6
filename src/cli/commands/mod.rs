//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`autowire env`, `autowire resolve`)
//! - Shared settings loading
//! - Consistent global flag handling

pub mod dispatcher;
pub mod env;
pub mod resolve;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
