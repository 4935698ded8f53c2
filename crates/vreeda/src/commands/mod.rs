//! Command dispatch: bridges CLI args to core operations and output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Auth(args) => auth::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        // Completions never reach dispatch.
        Command::Completions(_) => Ok(()),
    }
}
