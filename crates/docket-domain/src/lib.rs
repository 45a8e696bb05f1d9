//! Docket Domain Layer
//!
//! Core data model for the Docket document-extraction service. This crate holds
//! no I/O: it defines the configuration records, provenance annotations, result
//! records and progress events that every other layer exchanges, plus the trait
//! seams infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Global configuration**: the single ruleset (fields, tags, prompt, output
//!   template, model) shared by every tenant
//! - **Tenant override**: independently stored replacement sections for one tenant
//! - **Annotated configuration**: the effective configuration for a tenant, with
//!   every value tagged as coming from the global record or the override
//! - **Result record**: the persisted outcome of one document's processing attempt
//! - **Progress event**: one entry in the ordered stream sent to an observer
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure implementations live in other crates
//! - Serialization shapes here are the persisted and wire shapes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod field;
pub mod progress;
pub mod provenance;
pub mod record;
pub mod tag;
pub mod tenant;
pub mod traits;

// Re-exports for convenience
pub use config::{
    GlobalConfig, GlobalSection, OutputTemplate, OverrideSection, PromptTemplate, Section,
    TenantOverride,
};
pub use field::{FieldDef, FieldType};
pub use progress::{ProgressEvent, ProgressSink};
pub use provenance::{
    Annotated, AnnotatedConfig, AnnotatedParameter, AnnotatedTag, ResolvedConfig, Source,
};
pub use record::{
    BatchSummary, Extraction, Outcome, RecordId, RecordMeta, RecordStatus, ResultRecord,
    TokenUsage,
};
pub use tag::{TagDef, TagOverride, TagParameter};
pub use tenant::{Tenant, TenantId};
pub use traits::ConfigStore;
