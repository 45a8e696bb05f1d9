//! Payload validation for global and override sections
//!
//! Global writes and tenant override writes share the same per-section rules.
//! Tag overrides are additionally checked against the global tag list.

use crate::error::{RejectionReason, ResolverError};
use crate::ValidationConfig;
use docket_domain::{
    FieldDef, GlobalConfig, GlobalSection, OutputTemplate, OverrideSection, PromptTemplate,
    TagDef, TagOverride,
};
use std::collections::{BTreeMap, HashSet};

/// Validates configuration payloads before they are stored
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator with the given limits
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active limits
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one section of a global write
    pub fn validate_global(&self, section: &GlobalSection) -> Result<(), ResolverError> {
        let reasons = match section {
            GlobalSection::Fields(fields) => self.check_fields(fields),
            GlobalSection::Tags(tags) => self.check_tags(tags),
            GlobalSection::Prompt(prompt) => self.check_prompt(prompt),
            GlobalSection::Output(output) => check_output(output),
            GlobalSection::Model(model) => check_model(model),
        };
        into_result(section.section(), reasons)
    }

    /// Validate one section of a tenant override write
    pub fn validate_override(
        &self,
        section: &OverrideSection,
        global: &GlobalConfig,
    ) -> Result<(), ResolverError> {
        let reasons = match section {
            OverrideSection::Fields(fields) => self.check_fields(fields),
            OverrideSection::Tags(tags) => check_tag_overrides(tags, global),
            OverrideSection::Prompt(prompt) => self.check_prompt(prompt),
            OverrideSection::Output(output) => check_output(output),
            OverrideSection::Model(model) => check_model(model),
        };
        into_result(section.section(), reasons)
    }

    fn check_fields(&self, fields: &[FieldDef]) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        if fields.is_empty() {
            reasons.push(RejectionReason::Empty);
            return reasons;
        }
        if fields.len() > self.config.max_fields {
            reasons.push(RejectionReason::TooMany {
                limit: self.config.max_fields,
                actual: fields.len(),
            });
        }

        let mut seen = HashSet::new();
        for (idx, field) in fields.iter().enumerate() {
            let key = field.key.as_str();
            if key.trim().is_empty() {
                reasons.push(RejectionReason::Missing(format!("fields[{}].key", idx)));
                continue;
            }
            // Stored as given, so surrounding whitespace is rejected here.
            if !is_field_key(key) {
                reasons.push(RejectionReason::InvalidIdentifier {
                    value: field.key.clone(),
                    expected: "letters, digits, '_' or '-'",
                });
            }
            if !seen.insert(key) {
                reasons.push(RejectionReason::Duplicate(key.to_string()));
            }
        }
        reasons
    }

    fn check_tags(&self, tags: &[TagDef]) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        if tags.is_empty() {
            reasons.push(RejectionReason::Empty);
            return reasons;
        }
        if tags.len() > self.config.max_tags {
            reasons.push(RejectionReason::TooMany {
                limit: self.config.max_tags,
                actual: tags.len(),
            });
        }

        let mut seen = HashSet::new();
        for (idx, tag) in tags.iter().enumerate() {
            if tag.id.is_empty() {
                reasons.push(RejectionReason::Missing(format!("tags[{}].id", idx)));
                continue;
            }
            if !is_tag_id(&tag.id) {
                reasons.push(RejectionReason::InvalidIdentifier {
                    value: tag.id.clone(),
                    expected: "lowercase letters and digits",
                });
            }
            if !seen.insert(tag.id.as_str()) {
                reasons.push(RejectionReason::Duplicate(tag.id.clone()));
            }
            if tag.instructions.trim().is_empty() {
                reasons.push(RejectionReason::Missing(format!("tags[{}].instructions", idx)));
            }
            if tag.parameters.len() > self.config.max_parameters_per_tag {
                reasons.push(RejectionReason::TooMany {
                    limit: self.config.max_parameters_per_tag,
                    actual: tag.parameters.len(),
                });
            }

            let mut names = HashSet::new();
            for (pidx, param) in tag.parameters.iter().enumerate() {
                if param.name.trim().is_empty() {
                    reasons.push(RejectionReason::Missing(format!(
                        "tags[{}].parameters[{}].name",
                        idx, pidx
                    )));
                } else if !names.insert(param.name.as_str()) {
                    reasons.push(RejectionReason::Duplicate(format!("{}.{}", tag.id, param.name)));
                }
            }
        }
        reasons
    }

    fn check_prompt(&self, prompt: &PromptTemplate) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        if prompt.preamble.trim().is_empty() {
            reasons.push(RejectionReason::Missing("prompt.preamble".to_string()));
        }
        if prompt.rules.len() > self.config.max_rules {
            reasons.push(RejectionReason::TooMany {
                limit: self.config.max_rules,
                actual: prompt.rules.len(),
            });
        }
        for (idx, rule) in prompt.rules.iter().enumerate() {
            if rule.trim().is_empty() {
                reasons.push(RejectionReason::Missing(format!("prompt.rules[{}]", idx)));
            }
        }
        reasons
    }
}

fn check_tag_overrides(
    overrides: &BTreeMap<String, TagOverride>,
    global: &GlobalConfig,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    if overrides.is_empty() {
        reasons.push(RejectionReason::Empty);
        return reasons;
    }

    for (id, adjustment) in overrides {
        let Some(tag) = global.tag(id) else {
            reasons.push(RejectionReason::UnknownTag(id.clone()));
            continue;
        };
        for name in adjustment.parameters.keys() {
            if tag.parameter(name).is_none() {
                reasons.push(RejectionReason::UnknownParameter {
                    tag: id.clone(),
                    parameter: name.clone(),
                });
            }
        }
    }
    reasons
}

fn check_output(output: &OutputTemplate) -> Vec<RejectionReason> {
    let template = output.filename_template.trim();
    if template.is_empty() {
        return vec![RejectionReason::Missing("output.filename_template".to_string())];
    }

    let mut depth = 0i32;
    for c in template.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if !(0..=1).contains(&depth) {
            return vec![RejectionReason::MalformedTemplate(template.to_string())];
        }
    }
    if depth != 0 {
        return vec![RejectionReason::MalformedTemplate(template.to_string())];
    }
    Vec::new()
}

fn check_model(model: &str) -> Vec<RejectionReason> {
    if model.trim().is_empty() {
        vec![RejectionReason::Missing("model".to_string())]
    } else {
        Vec::new()
    }
}

fn into_result(
    section: docket_domain::Section,
    reasons: Vec<RejectionReason>,
) -> Result<(), ResolverError> {
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ResolverError::Validation { section, reasons })
    }
}

/// Tag ids are lowercase ASCII letters and digits
pub fn is_tag_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn is_field_key(key: &str) -> bool {
    key.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::Section;

    fn reasons(err: ResolverError) -> Vec<RejectionReason> {
        match err {
            ResolverError::Validation { reasons, .. } => reasons,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_fields_rejected() {
        let validator = Validator::default();
        let err = validator
            .validate_override(&OverrideSection::Fields(vec![]), &GlobalConfig::default())
            .unwrap_err();
        assert_eq!(reasons(err), vec![RejectionReason::Empty]);
    }

    #[test]
    fn test_duplicate_and_blank_keys() {
        let validator = Validator::default();
        let fields = vec![
            FieldDef::new("amount", "Amount"),
            FieldDef::new("amount", "Again"),
            FieldDef::new(" ", "Blank"),
        ];
        let found = reasons(
            validator
                .validate_global(&GlobalSection::Fields(fields))
                .unwrap_err(),
        );
        assert!(found.contains(&RejectionReason::Duplicate("amount".to_string())));
        assert!(found.contains(&RejectionReason::Missing("fields[2].key".to_string())));
    }

    #[test]
    fn test_keys_with_surrounding_whitespace_rejected() {
        let validator = Validator::default();
        let fields = vec![FieldDef::new(" amount", "Amount"), FieldDef::new("amount", "Again")];
        let err = validator
            .validate_override(&OverrideSection::Fields(fields), &GlobalConfig::default())
            .unwrap_err();
        let found = reasons(err);
        assert!(found.contains(&RejectionReason::InvalidIdentifier {
            value: " amount".to_string(),
            expected: "letters, digits, '_' or '-'",
        }));
        assert!(!found.iter().any(|r| matches!(r, RejectionReason::Duplicate(_))));
    }

    #[test]
    fn test_field_limit() {
        let validator = Validator::new(ValidationConfig {
            max_fields: 1,
            ..ValidationConfig::default()
        });
        let fields = vec![FieldDef::new("a", "A"), FieldDef::new("b", "B")];
        let found = reasons(
            validator
                .validate_global(&GlobalSection::Fields(fields))
                .unwrap_err(),
        );
        assert_eq!(found, vec![RejectionReason::TooMany { limit: 1, actual: 2 }]);
    }

    #[test]
    fn test_tag_ids_must_be_lowercase_alnum() {
        let validator = Validator::default();
        let tags = vec![TagDef::new("Urgent", "x"), TagDef::new("high-value", "y")];
        let found = reasons(validator.validate_global(&GlobalSection::Tags(tags)).unwrap_err());
        assert_eq!(found.len(), 2);
        assert!(validator
            .validate_global(&GlobalSection::Tags(vec![TagDef::new("vat21", "z")]))
            .is_ok());
    }

    #[test]
    fn test_tag_parameters_unique() {
        let validator = Validator::default();
        let tag = TagDef::new("urgent", "Due soon")
            .with_parameter("days", "7")
            .with_parameter("days", "3");
        let found = reasons(
            validator
                .validate_global(&GlobalSection::Tags(vec![tag]))
                .unwrap_err(),
        );
        assert_eq!(found, vec![RejectionReason::Duplicate("urgent.days".to_string())]);
    }

    #[test]
    fn test_tag_override_must_reference_global() {
        let validator = Validator::default();
        let global = GlobalConfig::default();

        let mut map = BTreeMap::new();
        map.insert("urgent".to_string(), TagOverride::enabled(false).with_parameter("days", "3"));
        assert!(validator
            .validate_override(&OverrideSection::Tags(map.clone()), &global)
            .is_ok());

        map.insert("missing".to_string(), TagOverride::enabled(true));
        map.insert("urgent".to_string(), TagOverride::default().with_parameter("hours", "1"));
        let err = validator
            .validate_override(&OverrideSection::Tags(map), &global)
            .unwrap_err();
        assert!(matches!(&err, ResolverError::Validation { section: Section::Tags, .. }));
        assert_eq!(reasons(err).len(), 2);
    }

    #[test]
    fn test_prompt_and_model() {
        let validator = Validator::default();
        let prompt = PromptTemplate {
            preamble: " ".to_string(),
            rules: vec!["ok".to_string(), "".to_string()],
            suffix: String::new(),
        };
        let found = reasons(
            validator
                .validate_global(&GlobalSection::Prompt(prompt))
                .unwrap_err(),
        );
        assert_eq!(found.len(), 2);
        assert!(validator
            .validate_global(&GlobalSection::Model("  ".to_string()))
            .is_err());
    }

    #[test]
    fn test_output_template_braces() {
        let check = |t: &str| {
            check_output(&OutputTemplate {
                filename_template: t.to_string(),
            })
        };
        assert!(check("{date}_{vendor}").is_empty());
        assert!(check("plain").is_empty());
        assert_eq!(check("{date").len(), 1);
        assert_eq!(check("date}").len(), 1);
        assert_eq!(check("{{date}}").len(), 1);
        assert_eq!(check("").len(), 1);
    }
}
