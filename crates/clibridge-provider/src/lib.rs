//! Assistant CLI bridge for clibridge.
//!
//! Builds invocation arguments for the external assistant CLI, runs it behind
//! the [`ProcessExecutor`] seam, and normalizes its JSON (or plain text) output
//! into a [`RunResult`].

mod access_mode;
mod assistant_bridge;
mod cli_executable;
mod command_builder;
mod process_executor;
mod response_parser;
mod types;

pub use access_mode::AccessMode;
pub use assistant_bridge::*;
pub use cli_executable::resolve_executable;
pub use command_builder::*;
pub use process_executor::*;
pub use response_parser::*;
pub use types::*;
