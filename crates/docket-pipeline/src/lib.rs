//! Docket Pipeline
//!
//! Batch extraction over tenant document folders.
//!
//! # Overview
//!
//! A batch resolves the tenant's configuration once, enumerates the tenant
//! folder, and fans the documents out to the extraction gateway under a
//! bounded concurrency limit. Every finished document becomes one record in
//! the tenant's result log, and an ordered stream of progress events tells
//! the observer what is happening.
//!
//! # Architecture
//!
//! ```text
//! folder → worklist → RetryingExecutor → gateway
//!                            ↓
//!              normalize → name → ResultLog
//!                            ↓
//!                      ProgressSink
//! ```
//!
//! # Key Features
//!
//! - **Bounded retry**: transient gateway errors are retried with
//!   exponential backoff; everything else fails immediately
//! - **Bounded concurrency**: at most `concurrency` calls in flight per batch
//! - **Per-tenant exclusion**: a second run for a busy tenant is rejected
//! - **Detached runs**: a disconnected observer never cancels in-flight work
//! - **Retries in place**: failed records are re-run and replaced, keeping ids
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use docket_domain::TenantId;
//! use docket_gateway::MockGateway;
//! use docket_pipeline::{ChannelSink, DocketService, PipelineConfig, RunOptions};
//! use docket_resolver::ValidationConfig;
//! use docket_store::{FileConfigStore, ResultLog};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileConfigStore::new("/var/lib/docket")?);
//! let log = Arc::new(ResultLog::new("/var/lib/docket"));
//! let service = DocketService::new(
//!     store,
//!     log,
//!     Arc::new(MockGateway::new()),
//!     PipelineConfig::default(),
//!     ValidationConfig::default(),
//! )?;
//!
//! let (sink, mut events) = ChannelSink::new();
//! let tenant = TenantId::parse("acme")?;
//! let summary = service
//!     .run_batch(&tenant, RunOptions::default(), Arc::new(sink))
//!     .await?;
//!
//! while let Ok(event) = events.try_recv() {
//!     println!("{}", event.status());
//! }
//! println!("{} of {} succeeded", summary.success, summary.total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod namer;
mod normalize;
mod progress;
mod prompt;
mod registry;
mod retry;
mod scheduler;
mod service;
mod worklist;

pub use config::{PipelineConfig, RetryPolicy};
pub use error::PipelineError;
pub use namer::{OutputNamer, PlaceholderNamer};
pub use normalize::normalize;
pub use progress::{ChannelSink, CollectingSink, NullSink};
pub use prompt::PromptBuilder;
pub use registry::{RunGuard, RunRegistry};
pub use retry::RetryingExecutor;
pub use scheduler::{
    AllTenantsReport, BatchScheduler, RetryRequest, RetrySummary, RunOptions, TenantRun,
};
pub use service::DocketService;
pub use worklist::{scan_folder, WorkItem};
