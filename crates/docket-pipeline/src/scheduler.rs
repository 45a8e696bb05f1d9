//! Bounded-concurrency batch execution
//!
//! A run is prepared on the caller's task (tenant lookup, folder check, lock,
//! config resolution, worklist) and then driven on a spawned task that owns
//! the tenant lock. Dropping the caller or the observer therefore never
//! cancels dispatched extraction calls, and the lock is released when the
//! run actually finishes.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::namer::{OutputNamer, PlaceholderNamer};
use crate::normalize::normalize;
use crate::prompt::PromptBuilder;
use crate::registry::{RunGuard, RunRegistry};
use crate::retry::RetryingExecutor;
use crate::worklist::{scan_folder, WorkItem};
use docket_domain::{
    BatchSummary, ConfigStore, Outcome, ProgressEvent, ProgressSink, RecordId, RecordMeta,
    ResolvedConfig, Tenant, TenantId,
};
use docket_gateway::{ExtractionGateway, ExtractionRequest};
use docket_resolver::ConfigResolver;
use docket_store::ResultLog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Options of a single-tenant batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Enumerate and report the worklist without extracting anything
    #[serde(default)]
    pub dry_run: bool,

    /// Only documents whose name contains this text, ignoring case
    #[serde(default)]
    pub file_filter: Option<String>,
}

/// Which failed records to retry
///
/// Exactly one of `result_ids` (non-empty) or `all: true` must be given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryRequest {
    /// Specific record ids
    #[serde(default)]
    pub result_ids: Option<Vec<String>>,

    /// Every failed record of the tenant
    #[serde(default)]
    pub all: Option<bool>,
}

enum RetrySelection {
    All,
    Ids(HashSet<RecordId>),
}

impl RetryRequest {
    /// Retry every failed record
    pub fn all() -> Self {
        Self {
            result_ids: None,
            all: Some(true),
        }
    }

    /// Retry the given records
    pub fn ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            result_ids: Some(ids.into_iter().map(|id| id.to_string()).collect()),
            all: None,
        }
    }

    fn selection(&self) -> Result<RetrySelection, PipelineError> {
        match (&self.result_ids, self.all) {
            (Some(_), Some(_)) => Err(PipelineError::BadRequest(
                "give either resultIds or all, not both".to_string(),
            )),
            (None, Some(true)) => Ok(RetrySelection::All),
            (None, Some(false)) => Err(PipelineError::BadRequest(
                "all must be true when given".to_string(),
            )),
            (Some(ids), None) if ids.is_empty() => Err(PipelineError::BadRequest(
                "resultIds must not be empty".to_string(),
            )),
            (Some(ids), None) => Ok(RetrySelection::Ids(
                ids.iter()
                    .filter_map(|raw| match RecordId::parse(raw) {
                        Ok(id) => Some(id),
                        Err(_) => {
                            debug!(id = %raw, "Skipping malformed result id");
                            None
                        }
                    })
                    .collect(),
            )),
            (None, None) => Err(PipelineError::BadRequest(
                "give resultIds or all".to_string(),
            )),
        }
    }
}

/// Summary of a retry run
pub type RetrySummary = BatchSummary;

/// Result of one tenant in all-tenants mode
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRun {
    /// Tenant id
    pub tenant: TenantId,

    /// Summary, or why the tenant's batch was rejected
    pub result: Result<BatchSummary, String>,
}

/// Outcome of an all-tenants run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllTenantsReport {
    /// Per-tenant results, in run order
    pub runs: Vec<TenantRun>,

    /// Sum of every tenant summary
    pub total: BatchSummary,
}

/// A run that passed its preconditions and holds the tenant lock
struct PreparedRun {
    guard: RunGuard,
    config: ResolvedConfig,
    items: Vec<WorkItem>,
    dry_run: bool,
}

/// Runs batches and retries for tenants
///
/// At most `concurrency` extraction calls are in flight per run, and at most
/// one run per tenant.
pub struct BatchScheduler<S: ConfigStore> {
    resolver: Arc<ConfigResolver<S>>,
    log: Arc<ResultLog>,
    executor: Arc<RetryingExecutor>,
    namer: Arc<dyn OutputNamer>,
    registry: RunRegistry,
    config: PipelineConfig,
}

impl<S> BatchScheduler<S>
where
    S: ConfigStore,
    S::Error: Display,
{
    /// Create a scheduler
    pub fn new(
        resolver: Arc<ConfigResolver<S>>,
        log: Arc<ResultLog>,
        gateway: Arc<dyn ExtractionGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            executor: Arc::new(RetryingExecutor::from_config(gateway, &config)),
            resolver,
            log,
            namer: Arc::new(PlaceholderNamer),
            registry: RunRegistry::new(),
            config,
        }
    }

    /// Replace the output namer
    pub fn with_namer(mut self, namer: Arc<dyn OutputNamer>) -> Self {
        self.namer = namer;
        self
    }

    /// Tenants with a run in flight
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Pipeline settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn tenant(&self, id: &TenantId) -> Result<Tenant, PipelineError> {
        self.resolver
            .store()
            .get_tenant(id)
            .map_err(|e| PipelineError::Store(e.to_string()))?
            .ok_or_else(|| PipelineError::NotFound(format!("tenant {}", id)))
    }

    /// Run a batch over the tenant's folder
    ///
    /// Rejections (unknown tenant, missing folder, run in flight) are reported
    /// as a single `error` event and nothing is started.
    pub async fn run_batch(
        &self,
        tenant: &TenantId,
        options: RunOptions,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchSummary, PipelineError> {
        let prepared = match self.prepare_batch(tenant, &options).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Batch rejected");
                sink.emit(ProgressEvent::Error {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        self.launch(prepared, sink).await
    }

    async fn prepare_batch(
        &self,
        tenant: &TenantId,
        options: &RunOptions,
    ) -> Result<PreparedRun, PipelineError> {
        let record = self.tenant(tenant)?;
        let is_dir = tokio::fs::metadata(&record.folder)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(PipelineError::FolderMissing(record.folder));
        }

        let guard = self.registry.try_acquire(tenant)?;
        let config = self.resolver.get_resolved_config(tenant)?.resolved();
        let items = scan_folder(
            &record.folder,
            &self.config,
            options.file_filter.as_deref(),
        )
        .await?;

        Ok(PreparedRun {
            guard,
            config,
            items,
            dry_run: options.dry_run,
        })
    }

    /// Re-run failed records of a tenant, replacing them in place
    pub async fn retry_results(
        &self,
        tenant: &TenantId,
        request: RetryRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RetrySummary, PipelineError> {
        let prepared = match self.prepare_retry(tenant, &request).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Retry rejected");
                sink.emit(ProgressEvent::Error {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        self.launch(prepared, sink).await
    }

    async fn prepare_retry(
        &self,
        tenant: &TenantId,
        request: &RetryRequest,
    ) -> Result<PreparedRun, PipelineError> {
        let selection = request.selection()?;
        let record = self.tenant(tenant)?;

        // Targets are chosen under the tenant lock so a retry that finished in
        // the meantime cannot leave stale `failed` entries in the selection.
        let guard = self.registry.try_acquire(tenant)?;

        let log = self.log.clone();
        let id = tenant.clone();
        let failed = tokio::task::spawn_blocking(move || log.list_failed(&id))
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))??;

        let targets: Vec<WorkItem> = failed
            .into_iter()
            .filter(|r| match &selection {
                RetrySelection::All => true,
                RetrySelection::Ids(ids) => ids.contains(&r.id),
            })
            .map(|r| WorkItem::retry(&record.folder, r.original_filename, r.id))
            .collect();
        if targets.is_empty() {
            return Err(PipelineError::NoFailures(tenant.to_string()));
        }

        let config = self.resolver.get_resolved_config(tenant)?.resolved();

        Ok(PreparedRun {
            guard,
            config,
            items: targets,
            dry_run: false,
        })
    }

    /// Run every tenant's batch, one tenant after another
    pub async fn run_all_tenants(
        &self,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<AllTenantsReport, PipelineError> {
        let tenants = self
            .resolver
            .store()
            .list_tenants()
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        let count = tenants.len();
        info!(count, "Running all tenants");

        let mut report = AllTenantsReport::default();
        for (idx, tenant) in tenants.into_iter().enumerate() {
            sink.emit(ProgressEvent::ClientStarting {
                tenant: tenant.id.to_string(),
                index: idx + 1,
                count,
            });

            let result = self
                .run_batch(&tenant.id, RunOptions::default(), sink.clone())
                .await;
            match &result {
                Ok(summary) => {
                    report.total.merge(summary);
                    sink.emit(ProgressEvent::ClientDone {
                        tenant: tenant.id.to_string(),
                        summary: Some(*summary),
                        error: None,
                    });
                }
                Err(e) => {
                    sink.emit(ProgressEvent::ClientDone {
                        tenant: tenant.id.to_string(),
                        summary: None,
                        error: Some(e.to_string()),
                    });
                }
            }
            report.runs.push(TenantRun {
                tenant: tenant.id,
                result: result.map_err(|e| e.to_string()),
            });
        }

        info!(
            count,
            success = report.total.success,
            failed = report.total.failed,
            "All tenants finished"
        );
        Ok(report)
    }

    async fn launch(
        &self,
        prepared: PreparedRun,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchSummary, PipelineError> {
        let PreparedRun {
            guard,
            config,
            items,
            dry_run,
        } = prepared;

        let context = Arc::new(RunContext {
            tenant: guard.tenant().clone(),
            prompt: PromptBuilder::new(&config).build(),
            config,
            total: items.len(),
            log: self.log.clone(),
            executor: self.executor.clone(),
            namer: self.namer.clone(),
            sink,
        });
        let concurrency = self.config.concurrency.max(1);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            context.run(items, concurrency, dry_run).await
        });
        handle.await.map_err(|e| {
            error!(error = %e, "Batch task failed");
            PipelineError::Internal(e.to_string())
        })
    }
}

/// What a spawned run needs, shared by its item tasks
struct RunContext {
    tenant: TenantId,
    config: ResolvedConfig,
    prompt: String,
    total: usize,
    log: Arc<ResultLog>,
    executor: Arc<RetryingExecutor>,
    namer: Arc<dyn OutputNamer>,
    sink: Arc<dyn ProgressSink>,
}

struct ItemResult {
    filename: String,
    outcome: Outcome,
    output_filename: Option<String>,
}

impl RunContext {
    fn emit(&self, event: ProgressEvent) {
        if !self.sink.emit(event) {
            debug!(tenant = %self.tenant, "Observer gone, event dropped");
        }
    }

    async fn run(
        self: Arc<Self>,
        items: Vec<WorkItem>,
        concurrency: usize,
        dry_run: bool,
    ) -> BatchSummary {
        let started = Instant::now();
        let total = self.total;
        info!(tenant = %self.tenant, total, concurrency, dry_run, "Batch starting");
        self.emit(ProgressEvent::Starting {
            tenant: self.tenant.to_string(),
            total,
            dry_run,
        });

        let mut summary = BatchSummary::with_total(total);

        if dry_run {
            for (idx, item) in items.into_iter().enumerate() {
                self.emit(ProgressEvent::Analyzing {
                    filename: item.filename,
                    current: idx + 1,
                    total,
                });
            }
        } else if total > 0 {
            let semaphore = Arc::new(Semaphore::new(concurrency));
            let mut tasks = JoinSet::new();
            for (idx, item) in items.into_iter().enumerate() {
                let context = self.clone();
                let semaphore = semaphore.clone();
                tasks.spawn(async move { context.process(idx + 1, item, semaphore).await });
            }

            let mut finished = 0;
            while let Some(joined) = tasks.join_next().await {
                finished += 1;
                match joined {
                    Ok(done) => {
                        summary.record(&done.outcome);
                        match &done.outcome {
                            Outcome::Success { .. } => self.emit(ProgressEvent::Completed {
                                filename: done.filename,
                                current: finished,
                                total,
                                output_filename: done.output_filename,
                            }),
                            Outcome::Failure { error, .. } => self.emit(ProgressEvent::Failed {
                                filename: done.filename,
                                current: finished,
                                total,
                                error: error.clone(),
                            }),
                        }
                    }
                    Err(e) => {
                        error!(tenant = %self.tenant, error = %e, "Item task failed");
                        summary.failed += 1;
                        self.emit(ProgressEvent::Warning {
                            message: format!("A document task failed: {}", e),
                        });
                    }
                }
            }
        }

        info!(
            tenant = %self.tenant,
            total,
            success = summary.success,
            failed = summary.failed,
            tokens = summary.token_usage.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );
        self.emit(ProgressEvent::Done { summary });
        summary
    }

    async fn process(
        &self,
        position: usize,
        item: WorkItem,
        semaphore: Arc<Semaphore>,
    ) -> ItemResult {
        let permit = semaphore.acquire_owned().await.ok();
        self.emit(ProgressEvent::Analyzing {
            filename: item.filename.clone(),
            current: position,
            total: self.total,
        });

        let outcome = match tokio::fs::read(&item.path).await {
            Ok(bytes) => {
                let request = ExtractionRequest::new(
                    item.filename.clone(),
                    bytes,
                    self.prompt.clone(),
                    self.config.model.clone(),
                );
                self.executor.execute(&request, self.sink.as_ref()).await
            }
            Err(e) => {
                warn!(
                    tenant = %self.tenant,
                    filename = %item.filename,
                    error = %e,
                    "Cannot read document"
                );
                Outcome::Failure {
                    error: format!("Cannot read {}: {}", item.filename, e),
                    raw_response: None,
                    duration_ms: 0,
                    attempts: 0,
                }
            }
        };
        drop(permit);

        let (outcome, output_filename) = match outcome {
            Outcome::Success {
                extraction,
                duration_ms,
                attempts,
            } => {
                let extraction = normalize(&self.config, extraction);
                let name = self
                    .namer
                    .output_name(&self.config, &extraction.fields, &item.filename);
                (
                    Outcome::Success {
                        extraction,
                        duration_ms,
                        attempts,
                    },
                    name,
                )
            }
            failure => (failure, None),
        };

        let meta = RecordMeta {
            original_filename: item.filename.clone(),
            output_filename: output_filename.clone(),
        };
        self.persist(item.retry_of, &outcome, meta).await;

        ItemResult {
            filename: item.filename,
            outcome,
            output_filename,
        }
    }

    /// Write the record; failures are downgraded to a warning
    async fn persist(
        &self,
        retry_of: Option<RecordId>,
        outcome: &Outcome,
        meta: RecordMeta,
    ) {
        let log = self.log.clone();
        let tenant = self.tenant.clone();
        let owned = outcome.clone();
        let filename = meta.original_filename.clone();

        let written = tokio::task::spawn_blocking(move || match retry_of {
            Some(id) => log.update(&tenant, id, &owned, &meta),
            None => log.append(&tenant, &owned, &meta),
        })
        .await;

        let message = match written {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        warn!(
            tenant = %self.tenant,
            filename = %filename,
            error = %message,
            "Result log write failed"
        );
        self.emit(ProgressEvent::Warning {
            message: format!("Could not record result for {}: {}", filename, message),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_selection_rules() {
        assert!(matches!(
            RetryRequest::all().selection(),
            Ok(RetrySelection::All)
        ));
        assert!(matches!(
            RetryRequest::default().selection(),
            Err(PipelineError::BadRequest(_))
        ));
        assert!(matches!(
            RetryRequest::ids(Vec::<String>::new()).selection(),
            Err(PipelineError::BadRequest(_))
        ));

        let both = RetryRequest {
            result_ids: Some(vec![RecordId::new().to_string()]),
            all: Some(true),
        };
        assert!(matches!(both.selection(), Err(PipelineError::BadRequest(_))));

        let not_all = RetryRequest {
            result_ids: None,
            all: Some(false),
        };
        assert!(matches!(not_all.selection(), Err(PipelineError::BadRequest(_))));
    }

    #[test]
    fn test_retry_selection_skips_malformed_ids() {
        let id = RecordId::new();
        match RetryRequest::ids([id.to_string(), "nope".to_string()]).selection() {
            Ok(RetrySelection::Ids(ids)) => {
                assert_eq!(ids.len(), 1);
                assert!(ids.contains(&id));
            }
            _ => panic!("expected id selection"),
        }
    }

    #[test]
    fn test_run_options_wire_shape() {
        let options: RunOptions =
            serde_json::from_str(r#"{"dryRun": true, "fileFilter": "march"}"#).unwrap();
        assert!(options.dry_run);
        assert_eq!(options.file_filter.as_deref(), Some("march"));

        let request: RetryRequest = serde_json::from_str(r#"{"all": true}"#).unwrap();
        assert_eq!(request, RetryRequest::all());
    }
}
