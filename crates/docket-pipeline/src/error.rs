//! Error types for the pipeline

use docket_resolver::ResolverError;
use docket_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by pipeline and service operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unknown tenant or result id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed configuration payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// A batch is already in flight for this tenant
    #[error("A batch is already running for tenant {0}")]
    AlreadyRunning(String),

    /// The tenant's document folder does not exist
    #[error("Document folder missing: {}", .0.display())]
    FolderMissing(PathBuf),

    /// A retry selection contained no failed records
    #[error("No failed results to retry for tenant {0}")]
    NoFailures(String),

    /// A request was malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storage error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ResolverError> for PipelineError {
    fn from(e: ResolverError) -> Self {
        match e {
            ResolverError::NotFound(id) => PipelineError::NotFound(format!("tenant {}", id)),
            ResolverError::Validation { .. } => PipelineError::Validation(e.to_string()),
            ResolverError::Store(msg) => PipelineError::Store(msg),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => PipelineError::NotFound(what),
            other => PipelineError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::Section;

    #[test]
    fn test_resolver_error_mapping() {
        let err: PipelineError = ResolverError::NotFound("acme".to_string()).into();
        assert!(matches!(err, PipelineError::NotFound(_)));

        let err: PipelineError = ResolverError::Validation {
            section: Section::Fields,
            reasons: vec![],
        }
        .into();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: PipelineError = StoreError::NotFound("result x".to_string()).into();
        assert!(matches!(err, PipelineError::NotFound(_)));
        let err: PipelineError = StoreError::Lock("x".to_string()).into();
        assert!(matches!(err, PipelineError::Store(_)));
    }
}
