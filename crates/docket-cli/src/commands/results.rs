//! Results command implementation.

use super::{spawn_printer, tenant_id, Service};
use crate::cli::{ResultsAction, ResultsArgs};
use crate::error::Result;
use crate::output::Formatter;
use docket_pipeline::{ChannelSink, RetryRequest};
use docket_store::ListQuery;
use std::sync::Arc;
use tracing::debug;

/// Execute the results command.
pub async fn execute_results(
    args: ResultsArgs,
    service: &Service,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ResultsAction::List {
            tenant,
            status,
            limit,
            offset,
        } => {
            let query = ListQuery {
                status: status.map(Into::into),
                limit,
                offset,
            };
            let page = service.list_results(&tenant_id(&tenant)?, &query)?;
            println!("{}", formatter.format_results(&page)?);
        }
        ResultsAction::Show { tenant, id } => {
            let record = service.get_result(&tenant_id(&tenant)?, &id)?;
            println!("{}", formatter.format_record(&record)?);
        }
        ResultsAction::Retry { tenant, all, ids } => {
            let tenant = tenant_id(&tenant)?;
            let request = if all {
                RetryRequest::all()
            } else {
                RetryRequest::ids(ids)
            };

            let (sink, events) = ChannelSink::new();
            let printer = spawn_printer(events, *formatter);
            let result = service
                .retry_results(&tenant, request, Arc::new(sink))
                .await;
            if let Err(e) = printer.await {
                debug!(error = %e, "Progress printer ended abnormally");
            }
            result?;
        }
    }
    Ok(())
}
