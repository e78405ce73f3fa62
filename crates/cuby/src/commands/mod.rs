//! Command dispatch: bridges CLI args -> core/api calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod set;
pub mod status;
pub mod watch;

use cuby_core::IntegrationConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: IntegrationConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => {
            let client = config.build_client()?;
            devices::handle(&client, args, global).await
        }
        Command::Set(args) => {
            let client = config.build_client()?;
            set::handle(&client, args, global).await
        }
        Command::Status => status::handle(config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
