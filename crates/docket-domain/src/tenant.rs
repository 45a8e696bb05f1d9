//! Tenant module - isolated customer scopes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a tenant ("client")
///
/// Restricted to lowercase ASCII letters, digits, `-` and `_` so that an id can
/// be used directly as a path component by storage backends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse and validate a tenant id
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::TenantId;
    ///
    /// assert!(TenantId::parse("acme-corp").is_ok());
    /// assert!(TenantId::parse("../etc").is_err());
    /// assert!(TenantId::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("tenant id must not be empty".to_string());
        }
        if s.len() > 64 {
            return Err(format!("tenant id '{}' exceeds 64 characters", s));
        }
        let valid = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(format!(
                "tenant id '{}' may only contain lowercase letters, digits, '-' and '_'",
                s
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered tenant with its own document folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique identifier
    pub id: TenantId,

    /// Human-readable name
    pub name: String,

    /// Folder holding the tenant's input documents
    pub folder: PathBuf,
}

impl Tenant {
    /// Create a tenant record
    pub fn new(id: TenantId, name: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            id,
            name: name.into(),
            folder: folder.into(),
        }
    }
}
