//! Provenance annotations - where each resolved value came from

use crate::config::{OutputTemplate, PromptTemplate, Section};
use crate::field::FieldDef;
use crate::tag::{TagDef, TagParameter};
use serde::{Deserialize, Serialize};

/// Origin of a resolved configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Inherited from the global record
    Global,
    /// Set by the tenant's override
    Override,
}

impl Source {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Global => "global",
            Source::Override => "override",
        }
    }
}

/// A value paired with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotated<T> {
    /// The effective value
    pub value: T,

    /// Where it came from
    pub source: Source,
}

impl<T> Annotated<T> {
    /// Annotate a value inherited from the global record
    pub fn global(value: T) -> Self {
        Self {
            value,
            source: Source::Global,
        }
    }

    /// Annotate a value set by an override
    pub fn overridden(value: T) -> Self {
        Self {
            value,
            source: Source::Override,
        }
    }
}

/// A tag parameter with its own provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedParameter {
    /// Parameter name
    pub name: String,

    /// Description from the global definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Effective value
    pub value: String,

    /// Where the value came from
    pub source: Source,
}

/// A tag with provenance tracked per tag, per flag and per parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTag {
    /// Tag id
    pub id: String,

    /// Display label
    pub label: String,

    /// Model instructions
    pub instructions: String,

    /// Effective enabled flag
    pub enabled: bool,

    /// `Override` when the tenant has any adjustment for this tag
    pub source: Source,

    /// Where the enabled flag came from
    pub enabled_source: Source,

    /// Parameters with individual provenance
    pub parameters: Vec<AnnotatedParameter>,
}

impl AnnotatedTag {
    /// Strip annotations
    pub fn to_tag(&self) -> TagDef {
        TagDef {
            id: self.id.clone(),
            label: self.label.clone(),
            instructions: self.instructions.clone(),
            enabled: self.enabled,
            parameters: self
                .parameters
                .iter()
                .map(|p| TagParameter {
                    name: p.name.clone(),
                    description: p.description.clone(),
                    value: p.value.clone(),
                })
                .collect(),
        }
    }
}

/// Effective configuration of one tenant with every leaf annotated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedConfig {
    /// Field list, each field annotated
    pub fields: Vec<Annotated<FieldDef>>,

    /// Tags with per-part provenance
    pub tags: Vec<AnnotatedTag>,

    /// Prompt template
    pub prompt: Annotated<PromptTemplate>,

    /// Output naming
    pub output: Annotated<OutputTemplate>,

    /// Model id
    pub model: Annotated<String>,
}

impl AnnotatedConfig {
    /// Strip annotations into the plain effective configuration
    pub fn resolved(&self) -> ResolvedConfig {
        ResolvedConfig {
            fields: self.fields.iter().map(|f| f.value.clone()).collect(),
            tags: self.tags.iter().map(AnnotatedTag::to_tag).collect(),
            prompt: self.prompt.value.clone(),
            output: self.output.value.clone(),
            model: self.model.value.clone(),
        }
    }

    /// Every provenance label belonging to a section, leaf by leaf
    ///
    /// For tags this yields each tag's flag source followed by each of its
    /// parameter sources.
    pub fn section_sources(&self, section: Section) -> Vec<Source> {
        match section {
            Section::Fields => self.fields.iter().map(|f| f.source).collect(),
            Section::Tags => self
                .tags
                .iter()
                .flat_map(|t| {
                    std::iter::once(t.enabled_source).chain(t.parameters.iter().map(|p| p.source))
                })
                .collect(),
            Section::Prompt => vec![self.prompt.source],
            Section::Output => vec![self.output.source],
            Section::Model => vec![self.model.source],
        }
    }
}

/// Effective configuration of one tenant at one instant
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Fields to extract, in output order
    pub fields: Vec<FieldDef>,

    /// All tags, enabled or not
    pub tags: Vec<TagDef>,

    /// Prompt template
    pub prompt: PromptTemplate,

    /// Output naming
    pub output: OutputTemplate,

    /// Model id
    pub model: String,
}

impl ResolvedConfig {
    /// Tags currently enabled
    pub fn enabled_tags(&self) -> impl Iterator<Item = &TagDef> {
        self.tags.iter().filter(|t| t.enabled)
    }

    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnotatedConfig {
        AnnotatedConfig {
            fields: vec![Annotated::overridden(FieldDef::new("amount", "Amount"))],
            tags: vec![AnnotatedTag {
                id: "urgent".to_string(),
                label: "Urgent".to_string(),
                instructions: "Overdue".to_string(),
                enabled: false,
                source: Source::Override,
                enabled_source: Source::Override,
                parameters: vec![AnnotatedParameter {
                    name: "days".to_string(),
                    description: None,
                    value: "7".to_string(),
                    source: Source::Global,
                }],
            }],
            prompt: Annotated::global(PromptTemplate {
                preamble: "Extract".to_string(),
                rules: vec![],
                suffix: String::new(),
            }),
            output: Annotated::global(OutputTemplate {
                filename_template: "{amount}".to_string(),
            }),
            model: Annotated::global("m".to_string()),
        }
    }

    #[test]
    fn test_resolved_strips_annotations() {
        let resolved = sample().resolved();
        assert_eq!(resolved.fields.len(), 1);
        assert_eq!(resolved.tags[0].parameters[0].value, "7");
        assert_eq!(resolved.enabled_tags().count(), 0);
        assert!(resolved.field("amount").is_some());
    }

    #[test]
    fn test_section_sources() {
        let config = sample();
        assert_eq!(config.section_sources(Section::Fields), vec![Source::Override]);
        assert_eq!(
            config.section_sources(Section::Tags),
            vec![Source::Override, Source::Global]
        );
        assert_eq!(config.section_sources(Section::Model), vec![Source::Global]);
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&Annotated::overridden(1)).unwrap();
        assert_eq!(json, r#"{"value":1,"source":"override"}"#);
    }
}
