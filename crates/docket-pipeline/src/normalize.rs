//! Normalization of raw extractions against the resolved field list

use docket_domain::{Extraction, ResolvedConfig};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Shape an extraction to the resolved configuration
///
/// Every configured field is present, in configured order, coerced to its
/// type; missing or blank values get the field's default. Keys the
/// configuration does not define are dropped, as are tags that are unknown or
/// disabled.
pub fn normalize(config: &ResolvedConfig, extraction: Extraction) -> Extraction {
    let mut fields = Map::new();
    for field in &config.fields {
        let value = match extraction.fields.get(&field.key) {
            None | Some(Value::Null) => field.default_value(),
            Some(Value::String(s)) if s.trim().is_empty() => field.default_value(),
            Some(raw) => field.field_type.coerce(raw),
        };
        fields.insert(field.key.clone(), value);
    }

    let enabled: HashSet<&str> = config.enabled_tags().map(|t| t.id.as_str()).collect();
    let mut seen = HashSet::new();
    let tags = extraction
        .tags
        .into_iter()
        .filter(|t| enabled.contains(t.as_str()) && seen.insert(t.clone()))
        .collect();

    Extraction {
        fields,
        tags,
        usage: extraction.usage,
    }
}
