//! Configuration records - the global ruleset and per-tenant overrides

use crate::field::{FieldDef, FieldType};
use crate::tag::{TagDef, TagOverride};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prompt text wrapped around the generated field and tag instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Opening instructions
    pub preamble: String,

    /// Numbered rules appended after the field list
    #[serde(default)]
    pub rules: Vec<String>,

    /// Closing instructions (output format reminders)
    #[serde(default)]
    pub suffix: String,
}

/// Output naming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTemplate {
    /// Filename template with `{field_key}` placeholders
    pub filename_template: String,
}

/// The single global configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Fields to extract, in output order
    pub fields: Vec<FieldDef>,

    /// Tags the extraction may apply
    #[serde(default)]
    pub tags: Vec<TagDef>,

    /// Prompt template
    pub prompt: PromptTemplate,

    /// Output naming
    pub output: OutputTemplate,

    /// Extraction model id
    pub model: String,
}

impl Default for GlobalConfig {
    /// Starter ruleset used until an administrator writes a global record
    fn default() -> Self {
        Self {
            fields: vec![
                FieldDef::new("invoice_number", "Invoice number"),
                FieldDef::new("date", "Invoice date").with_type(FieldType::Date),
                FieldDef::new("vendor", "Vendor"),
                FieldDef::new("amount", "Total amount")
                    .with_type(FieldType::Number)
                    .with_instructions("Grand total including tax, digits only"),
            ],
            tags: vec![TagDef::new("urgent", "Payment is overdue or due within a few days")
                .with_parameter("days", "7")],
            prompt: PromptTemplate {
                preamble: "Extract the following fields from the attached document.".to_string(),
                rules: vec![
                    "Use an empty value when a field is not present.".to_string(),
                    "Never invent values.".to_string(),
                ],
                suffix: "Respond with a single JSON object and nothing else.".to_string(),
            },
            output: OutputTemplate {
                filename_template: "{date}_{vendor}_{invoice_number}".to_string(),
            },
            model: "extraction-default".to_string(),
        }
    }
}

impl GlobalConfig {
    /// Replace one whole section
    pub fn apply(&mut self, section: GlobalSection) {
        match section {
            GlobalSection::Fields(fields) => self.fields = fields,
            GlobalSection::Tags(tags) => self.tags = tags,
            GlobalSection::Prompt(prompt) => self.prompt = prompt,
            GlobalSection::Output(output) => self.output = output,
            GlobalSection::Model(model) => self.model = model,
        }
    }

    /// Look up a global tag by id
    pub fn tag(&self, id: &str) -> Option<&TagDef> {
        self.tags.iter().find(|t| t.id == id)
    }
}

/// Independently stored override sections of one tenant
///
/// A section is `None` until the tenant first customizes it, and returns to
/// `None` when the section is reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantOverride {
    /// Replacement field list (replaces the global list wholesale)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,

    /// Per-tag adjustments keyed by tag id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, TagOverride>>,

    /// Replacement prompt template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptTemplate>,

    /// Replacement output naming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputTemplate>,

    /// Replacement model id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TenantOverride {
    /// Whether the given section is currently overridden
    pub fn has(&self, section: Section) -> bool {
        match section {
            Section::Fields => self.fields.is_some(),
            Section::Tags => self.tags.is_some(),
            Section::Prompt => self.prompt.is_some(),
            Section::Output => self.output.is_some(),
            Section::Model => self.model.is_some(),
        }
    }

    /// Replace (never merge) one section
    pub fn set(&mut self, section: OverrideSection) {
        match section {
            OverrideSection::Fields(fields) => self.fields = Some(fields),
            OverrideSection::Tags(tags) => self.tags = Some(tags),
            OverrideSection::Prompt(prompt) => self.prompt = Some(prompt),
            OverrideSection::Output(output) => self.output = Some(output),
            OverrideSection::Model(model) => self.model = Some(model),
        }
    }

    /// Remove one section entirely
    pub fn clear(&mut self, section: Section) {
        match section {
            Section::Fields => self.fields = None,
            Section::Tags => self.tags = None,
            Section::Prompt => self.prompt = None,
            Section::Output => self.output = None,
            Section::Model => self.model = None,
        }
    }

    /// Whether no section is overridden
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| !self.has(*s))
    }
}

/// Names of the independently overridable configuration sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Field definitions
    Fields,
    /// Tag definitions
    Tags,
    /// Prompt template
    Prompt,
    /// Output/filename template
    Output,
    /// Model id
    Model,
}

impl Section {
    /// Every section, in display order
    pub const ALL: [Section; 5] = [
        Section::Fields,
        Section::Tags,
        Section::Prompt,
        Section::Output,
        Section::Model,
    ];

    /// Get the section name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Fields => "fields",
            Section::Tags => "tags",
            Section::Prompt => "prompt",
            Section::Output => "output",
            Section::Model => "model",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fields" => Ok(Section::Fields),
            "tags" => Ok(Section::Tags),
            "prompt" => Ok(Section::Prompt),
            "output" | "filename" => Ok(Section::Output),
            "model" => Ok(Section::Model),
            other => Err(format!("Unknown configuration section: {}", other)),
        }
    }
}

/// Payload of a tenant override write for one section
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideSection {
    /// Full replacement field list
    Fields(Vec<FieldDef>),
    /// Per-tag adjustments keyed by tag id
    Tags(BTreeMap<String, TagOverride>),
    /// Full replacement prompt
    Prompt(PromptTemplate),
    /// Full replacement output naming
    Output(OutputTemplate),
    /// Replacement model id
    Model(String),
}

impl OverrideSection {
    /// Section this payload belongs to
    pub fn section(&self) -> Section {
        match self {
            OverrideSection::Fields(_) => Section::Fields,
            OverrideSection::Tags(_) => Section::Tags,
            OverrideSection::Prompt(_) => Section::Prompt,
            OverrideSection::Output(_) => Section::Output,
            OverrideSection::Model(_) => Section::Model,
        }
    }

    /// Decode a transport payload for the given section
    pub fn from_json(section: Section, payload: Value) -> Result<Self, String> {
        let decoded = match section {
            Section::Fields => serde_json::from_value(payload).map(OverrideSection::Fields),
            Section::Tags => serde_json::from_value(payload).map(OverrideSection::Tags),
            Section::Prompt => serde_json::from_value(payload).map(OverrideSection::Prompt),
            Section::Output => serde_json::from_value(payload).map(OverrideSection::Output),
            Section::Model => serde_json::from_value(payload).map(OverrideSection::Model),
        };
        decoded.map_err(|e| format!("Malformed {} payload: {}", section, e))
    }

    /// Encode the payload for storage
    pub fn to_json(&self) -> Value {
        let encoded = match self {
            OverrideSection::Fields(v) => serde_json::to_value(v),
            OverrideSection::Tags(v) => serde_json::to_value(v),
            OverrideSection::Prompt(v) => serde_json::to_value(v),
            OverrideSection::Output(v) => serde_json::to_value(v),
            OverrideSection::Model(v) => serde_json::to_value(v),
        };
        encoded.unwrap_or(Value::Null)
    }
}

/// Payload of an administrative write of one global section
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalSection {
    /// Field definitions
    Fields(Vec<FieldDef>),
    /// Tag definitions
    Tags(Vec<TagDef>),
    /// Prompt template
    Prompt(PromptTemplate),
    /// Output naming
    Output(OutputTemplate),
    /// Model id
    Model(String),
}

impl GlobalSection {
    /// Section this payload belongs to
    pub fn section(&self) -> Section {
        match self {
            GlobalSection::Fields(_) => Section::Fields,
            GlobalSection::Tags(_) => Section::Tags,
            GlobalSection::Prompt(_) => Section::Prompt,
            GlobalSection::Output(_) => Section::Output,
            GlobalSection::Model(_) => Section::Model,
        }
    }

    /// Decode a transport payload for the given section
    pub fn from_json(section: Section, payload: Value) -> Result<Self, String> {
        let decoded = match section {
            Section::Fields => serde_json::from_value(payload).map(GlobalSection::Fields),
            Section::Tags => serde_json::from_value(payload).map(GlobalSection::Tags),
            Section::Prompt => serde_json::from_value(payload).map(GlobalSection::Prompt),
            Section::Output => serde_json::from_value(payload).map(GlobalSection::Output),
            Section::Model => serde_json::from_value(payload).map(GlobalSection::Model),
        };
        decoded.map_err(|e| format!("Malformed {} payload: {}", section, e))
    }
}
