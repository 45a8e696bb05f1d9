//! Command implementations.

pub mod configure;
pub mod results;
pub mod run;
pub mod tenants;

pub use self::configure::execute_config;
pub use self::results::execute_results;
pub use self::run::{execute_run, execute_run_all};
pub use self::tenants::execute_tenants;

use crate::error::{CliError, Result};
use crate::output::Formatter;
use docket_domain::{ProgressEvent, Section, TenantId};
use docket_pipeline::DocketService;
use docket_store::FileConfigStore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::warn;

/// Service the commands operate on.
pub type Service = DocketService<FileConfigStore>;

pub(crate) fn tenant_id(raw: &str) -> Result<TenantId> {
    TenantId::parse(raw).map_err(CliError::InvalidInput)
}

pub(crate) fn section(raw: &str) -> Result<Section> {
    raw.parse().map_err(CliError::InvalidInput)
}

/// Print progress events as they arrive until every sender is gone.
pub(crate) fn spawn_printer(
    mut events: UnboundedReceiver<ProgressEvent>,
    formatter: Formatter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            // Rejections are reported once, by the caller, on exit.
            if matches!(event, ProgressEvent::Error { .. })
                && formatter.format() == crate::config::OutputFormat::Table
            {
                continue;
            }
            match formatter.format_event(&event) {
                Ok(line) if line.is_empty() => {}
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "Could not format progress event"),
            }
        }
    })
}
