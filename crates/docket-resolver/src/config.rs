//! Validation limits

use serde::{Deserialize, Serialize};

/// Limits applied to configuration payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum number of fields in a field list
    pub max_fields: usize,

    /// Maximum number of tag definitions
    pub max_tags: usize,

    /// Maximum number of parameters on one tag
    pub max_parameters_per_tag: usize,

    /// Maximum number of prompt rules
    pub max_rules: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_fields: 100,
            max_tags: 50,
            max_parameters_per_tag: 10,
            max_rules: 30,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (effectively unbounded)
    pub fn permissive() -> Self {
        Self {
            max_fields: usize::MAX,
            max_tags: usize::MAX,
            max_parameters_per_tag: usize::MAX,
            max_rules: usize::MAX,
        }
    }

    /// Create a strict configuration (small payloads only)
    pub fn strict() -> Self {
        Self {
            max_fields: 40,
            max_tags: 20,
            max_parameters_per_tag: 5,
            max_rules: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.max_fields, 100);
        assert_eq!(config.max_tags, 50);
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert_eq!(config.max_rules, usize::MAX);
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert!(config.max_fields < ValidationConfig::default().max_fields);
        assert_eq!(config.max_parameters_per_tag, 5);
    }
}
