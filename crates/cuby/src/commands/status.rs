//! One-shot setup + poll of every entity on the account.

use cuby_core::{EntityCollection, EntitySnapshot, IntegrationConfig, PollFailure, setup_integration};
use tabled::Tabled;
use tracing::warn;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
pub(super) struct EntityRow {
    #[tabled(rename = "Entity")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Available")]
    available: String,
}

impl EntityRow {
    pub(super) fn new(s: &EntitySnapshot, color: bool) -> Self {
        Self {
            id: s.unique_id.clone(),
            name: s.name.clone(),
            platform: s.platform.to_string(),
            state: s.state.clone().unwrap_or_else(|| "-".into()),
            available: if s.available {
                output::paint_status("yes", Some(true), color)
            } else {
                output::paint_status("no", Some(false), color)
            },
        }
    }
}

/// Render a snapshot of the collection in the selected format.
pub(super) fn render(entities: &EntityCollection, global: &GlobalOpts) -> String {
    let color = output::should_color(&global.color);
    let snapshot = entities.snapshot();
    output::render_list(
        &global.output,
        &snapshot,
        |s| EntityRow::new(s, color),
        |s| format!("{}\t{}", s.unique_id, s.state.as_deref().unwrap_or("-")),
    )
}

pub(super) fn report_failures(failures: &[PollFailure]) {
    for failure in failures {
        warn!(entity = %failure.unique_id, error = %failure.error, "poll failed");
    }
}

pub async fn handle(config: IntegrationConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let mut entities = EntityCollection::new();
    let integration = setup_integration(config, &mut entities).await?;
    tracing::info!(devices = integration.device_count(), "integration ready");

    let failures = entities.update_all().await;
    report_failures(&failures);

    output::print_output(&render(&entities, global), global.quiet);
    Ok(())
}
