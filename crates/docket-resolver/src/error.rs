//! Resolver error types

use docket_domain::Section;
use thiserror::Error;

/// Why a configuration payload was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The list must contain at least one entry
    #[error("must not be empty")]
    Empty,

    /// The list is longer than allowed
    #[error("has {actual} entries, at most {limit} allowed")]
    TooMany {
        /// Configured limit
        limit: usize,
        /// Entries supplied
        actual: usize,
    },

    /// A required value is blank
    #[error("{0} is required")]
    Missing(String),

    /// A key or id appears twice
    #[error("duplicate key '{0}'")]
    Duplicate(String),

    /// A key or id has a forbidden shape
    #[error("invalid identifier '{value}': {expected}")]
    InvalidIdentifier {
        /// Offending value
        value: String,
        /// What was expected
        expected: &'static str,
    },

    /// An override names a tag the global record does not define
    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    /// An override names a parameter the global tag does not define
    #[error("unknown parameter '{parameter}' on tag '{tag}'")]
    UnknownParameter {
        /// Tag id
        tag: String,
        /// Parameter name
        parameter: String,
    },

    /// Unbalanced `{`/`}` in a template
    #[error("malformed template '{0}'")]
    MalformedTemplate(String),
}

/// Errors that can occur during resolver operations
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Payload failed validation
    #[error("Invalid {section} payload: {}", join_reasons(.reasons))]
    Validation {
        /// Section being written
        section: Section,
        /// Every problem found
        reasons: Vec<RejectionReason>,
    },

    /// Unknown tenant
    #[error("Tenant not found: {0}")]
    NotFound(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),
}

fn join_reasons(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
