//! Run commands implementation.

use super::{spawn_printer, tenant_id, Service};
use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::Formatter;
use docket_pipeline::{ChannelSink, RunOptions};
use std::sync::Arc;
use tracing::debug;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let tenant = tenant_id(&args.tenant)?;
    let options = RunOptions {
        dry_run: args.dry_run,
        file_filter: args.filter,
    };

    let (sink, events) = ChannelSink::new();
    let printer = spawn_printer(events, *formatter);
    let result = service.run_batch(&tenant, options, Arc::new(sink)).await;

    // The sink is gone once the run returns, so the printer drains and stops.
    if let Err(e) = printer.await {
        debug!(error = %e, "Progress printer ended abnormally");
    }

    let summary = result?;
    debug!(tenant = %tenant, total = summary.total, "Run finished");
    Ok(())
}

/// Execute the run-all command.
pub async fn execute_run_all(service: &Service, formatter: &Formatter) -> Result<()> {
    let (sink, events) = ChannelSink::new();
    let printer = spawn_printer(events, *formatter);
    let result = service.run_all_tenants(Arc::new(sink)).await;

    if let Err(e) = printer.await {
        debug!(error = %e, "Progress printer ended abnormally");
    }

    let report = result?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}
