//! Transport-agnostic operations
//!
//! [`DocketService`] is what adapters (the CLI, a future HTTP layer) call. It
//! decodes raw section payloads, maps every lower-layer error onto
//! [`PipelineError`], and opens each progress stream with a `connected` event.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::namer::OutputNamer;
use crate::scheduler::{AllTenantsReport, BatchScheduler, RetryRequest, RetrySummary, RunOptions};
use docket_domain::{
    AnnotatedConfig, BatchSummary, ConfigStore, GlobalConfig, GlobalSection, OverrideSection,
    ProgressEvent, ProgressSink, RecordId, ResultRecord, Section, Tenant, TenantId,
};
use docket_gateway::ExtractionGateway;
use docket_resolver::{ConfigResolver, ValidationConfig, Validator};
use docket_store::{ListQuery, ResultLog, ResultPage};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Configuration, tenant, run and result operations over one store
pub struct DocketService<S: ConfigStore> {
    resolver: Arc<ConfigResolver<S>>,
    log: Arc<ResultLog>,
    scheduler: BatchScheduler<S>,
}

impl<S> DocketService<S>
where
    S: ConfigStore,
    S::Error: Display,
{
    /// Create a service
    ///
    /// Fails with [`PipelineError::Config`] when the pipeline settings are invalid.
    pub fn new(
        store: Arc<S>,
        log: Arc<ResultLog>,
        gateway: Arc<dyn ExtractionGateway>,
        config: PipelineConfig,
        validation: ValidationConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let resolver = Arc::new(ConfigResolver::new(store, Validator::new(validation)));
        let scheduler = BatchScheduler::new(resolver.clone(), log.clone(), gateway, config);
        Ok(Self {
            resolver,
            log,
            scheduler,
        })
    }

    /// Replace the output namer
    pub fn with_namer(mut self, namer: Arc<dyn OutputNamer>) -> Self {
        self.scheduler = self.scheduler.with_namer(namer);
        self
    }

    /// Underlying scheduler
    pub fn scheduler(&self) -> &BatchScheduler<S> {
        &self.scheduler
    }

    fn store_err(e: S::Error) -> PipelineError {
        PipelineError::Store(e.to_string())
    }

    // Configuration

    /// Effective configuration of a tenant with provenance
    pub fn get_resolved_config(&self, tenant: &TenantId) -> Result<AnnotatedConfig, PipelineError> {
        Ok(self.resolver.get_resolved_config(tenant)?)
    }

    /// Replace one override section from a raw payload
    pub fn put_override(
        &self,
        tenant: &TenantId,
        section: Section,
        payload: Value,
    ) -> Result<AnnotatedConfig, PipelineError> {
        let section =
            OverrideSection::from_json(section, payload).map_err(PipelineError::Validation)?;
        Ok(self.resolver.put_override(tenant, section)?)
    }

    /// Reset one override section to the global values
    pub fn delete_override(
        &self,
        tenant: &TenantId,
        section: Section,
    ) -> Result<AnnotatedConfig, PipelineError> {
        Ok(self.resolver.delete_override(tenant, section)?)
    }

    /// Replace one section of the global record from a raw payload
    pub fn put_global_section(
        &self,
        section: Section,
        payload: Value,
    ) -> Result<GlobalConfig, PipelineError> {
        let section =
            GlobalSection::from_json(section, payload).map_err(PipelineError::Validation)?;
        Ok(self.resolver.put_global_section(section)?)
    }

    /// Current global record
    pub fn global(&self) -> Result<GlobalConfig, PipelineError> {
        Ok(self.resolver.global()?)
    }

    // Tenants

    /// Every tenant, ordered by id
    pub fn list_tenants(&self) -> Result<Vec<Tenant>, PipelineError> {
        self.resolver.store().list_tenants().map_err(Self::store_err)
    }

    /// One tenant
    pub fn get_tenant(&self, tenant: &TenantId) -> Result<Tenant, PipelineError> {
        self.resolver
            .store()
            .get_tenant(tenant)
            .map_err(Self::store_err)?
            .ok_or_else(|| PipelineError::NotFound(format!("tenant {}", tenant)))
    }

    /// Create or update a tenant
    pub fn put_tenant(&self, tenant: Tenant) -> Result<Tenant, PipelineError> {
        if tenant.name.trim().is_empty() {
            return Err(PipelineError::Validation(
                "tenant name must not be empty".to_string(),
            ));
        }
        self.resolver
            .store()
            .put_tenant(&tenant)
            .map_err(Self::store_err)?;
        info!(tenant = %tenant.id, folder = %tenant.folder.display(), "Tenant saved");
        Ok(tenant)
    }

    // Runs

    /// Run one tenant's batch
    pub async fn run_batch(
        &self,
        tenant: &TenantId,
        options: RunOptions,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchSummary, PipelineError> {
        sink.emit(ProgressEvent::Connected);
        self.scheduler.run_batch(tenant, options, sink).await
    }

    /// Run every tenant's batch sequentially
    pub async fn run_all_tenants(
        &self,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<AllTenantsReport, PipelineError> {
        sink.emit(ProgressEvent::Connected);
        self.scheduler.run_all_tenants(sink).await
    }

    /// Retry failed results of a tenant
    pub async fn retry_results(
        &self,
        tenant: &TenantId,
        request: RetryRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RetrySummary, PipelineError> {
        sink.emit(ProgressEvent::Connected);
        self.scheduler.retry_results(tenant, request, sink).await
    }

    // Results

    /// Newest-first page of a tenant's results
    pub fn list_results(
        &self,
        tenant: &TenantId,
        query: &ListQuery,
    ) -> Result<ResultPage, PipelineError> {
        self.get_tenant(tenant)?;
        Ok(self.log.list(tenant, query)?)
    }

    /// One result record
    pub fn get_result(&self, tenant: &TenantId, id: &str) -> Result<ResultRecord, PipelineError> {
        let id = RecordId::parse(id).map_err(PipelineError::BadRequest)?;
        Ok(self.log.get(tenant, id)?)
    }
}
