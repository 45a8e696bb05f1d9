//! Docket Storage Layer
//!
//! File-backed persistence for the configuration records and the per-tenant
//! result logs.
//!
//! # Architecture
//!
//! - One JSON file per record under a single data root
//! - Every write goes through a same-directory temp file and an atomic rename
//! - The global record is cached in memory and invalidated only by admin writes
//! - Result log writes are serialized per tenant
//!
//! # Examples
//!
//! ```no_run
//! use docket_domain::traits::ConfigStore;
//! use docket_store::FileConfigStore;
//!
//! let store = FileConfigStore::new("/var/lib/docket").unwrap();
//! let global = store.load_global().unwrap();
//! println!("model: {}", global.model);
//! ```

#![warn(missing_docs)]

pub mod atomic;
pub mod config_store;
pub mod error;
pub mod result_log;

pub use config_store::FileConfigStore;
pub use error::{Result, StoreError};
pub use result_log::{ListQuery, ResultLog, ResultPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
