//! Command dispatch: bridges CLI args -> console queries -> output formatting.

pub mod alarms;
pub mod colors;
pub mod config_cmd;
pub mod events;
pub mod objects;
pub mod util;

use firedesk_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a database-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Objects(args) => objects::handle(console, args, global).await,
        Command::Alarms(args) => alarms::handle(console, args, global).await,
        Command::Events(args) => events::handle(console, args, global).await,
        // Handled before a store is opened
        Command::Colors(_) | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command dispatched without a database handler".into(),
        )),
    }
}
