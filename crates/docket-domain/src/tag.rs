//! Tag definitions - classification labels applied to documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named parameter of a tag (e.g. a threshold the prompt refers to)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagParameter {
    /// Parameter name, unique within its tag
    pub name: String,

    /// What the parameter controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current value
    #[serde(default)]
    pub value: String,
}

/// Definition of a tag the extraction may apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDef {
    /// Unique lowercase alphanumeric id
    pub id: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// When the tag applies, as told to the model
    #[serde(default)]
    pub instructions: String,

    /// Whether the tag is active
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Named parameters, in display order
    #[serde(default)]
    pub parameters: Vec<TagParameter>,
}

fn default_enabled() -> bool {
    true
}

impl TagDef {
    /// Create an enabled tag without parameters
    pub fn new(id: impl Into<String>, instructions: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            instructions: instructions.into(),
            enabled: true,
            parameters: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(TagParameter {
            name: name.into(),
            description: None,
            value: value.into(),
        });
        self
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&TagParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Tenant-level adjustment of a single global tag
///
/// Both parts are optional and applied independently: a tenant may toggle a
/// tag without touching its parameters, or change one parameter and leave the
/// rest at their global values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagOverride {
    /// Replacement for the tag's `enabled` flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Replacement values keyed by parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl TagOverride {
    /// Override only the enabled flag
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter override
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}
