//! Docket Configuration Resolver
//!
//! Merges the global ruleset with a tenant's override sections and annotates
//! every resolved value with its provenance. Also validates configuration
//! payloads before they reach the store.
//!
//! The resolver provides:
//! - Pure merge functions (`resolve_annotated`, `resolve`)
//! - Payload validation shared by global and override writes
//! - Store-backed operations (`ConfigResolver`) for reading, overriding and
//!   resetting configuration
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use docket_domain::TenantId;
//! use docket_resolver::{ConfigResolver, Validator};
//! use docket_store::FileConfigStore;
//!
//! let store = Arc::new(FileConfigStore::new("/var/lib/docket").unwrap());
//! let resolver = ConfigResolver::new(store, Validator::default());
//! let annotated = resolver.get_resolved_config(&TenantId::parse("acme").unwrap());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod resolver;
mod validator;

pub use config::ValidationConfig;
pub use error::{RejectionReason, ResolverError};
pub use resolver::{resolve, resolve_annotated, tag_overrides, ConfigResolver};
pub use validator::{is_tag_id, Validator};
