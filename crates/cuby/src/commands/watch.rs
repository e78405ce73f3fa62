//! Continuous polling until Ctrl-C or `--count` cycles.

use std::time::Duration;

use cuby_core::{EntityCollection, IntegrationConfig, setup_integration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status;

pub async fn handle(
    config: IntegrationConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut entities = EntityCollection::new();
    setup_integration(config, &mut entities).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            on_signal.cancel();
        }
    });

    let limit = args.count;
    let mut cycles = 0u32;
    let stop = cancel.clone();
    entities
        .poll_until_cancelled(Duration::from_secs(args.interval), &cancel, |entities, failures| {
            cycles += 1;
            status::report_failures(failures);
            output::print_output(&status::render(entities, global), global.quiet);
            if limit.is_some_and(|n| cycles >= n) {
                stop.cancel();
            } else if !global.quiet {
                eprintln!();
            }
        })
        .await;

    Ok(())
}
