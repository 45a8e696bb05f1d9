//! Field definitions - what gets extracted from each document

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Data type of an extracted field
///
/// Each type carries its own default value, coercion and display formatting so
/// downstream code dispatches on the variant instead of comparing type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Numeric value (amounts, quantities)
    Number,
    /// Yes/no flag
    Boolean,
    /// Date, kept as the textual form the document uses
    Date,
    /// List of values
    Array,
}

impl FieldType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
        }
    }

    /// Parse a type from its name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "string" => Some(FieldType::Text),
            "number" => Some(FieldType::Number),
            "boolean" | "bool" => Some(FieldType::Boolean),
            "date" => Some(FieldType::Date),
            "array" | "list" => Some(FieldType::Array),
            _ => None,
        }
    }

    /// Value used when the extraction did not produce this field
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Text | FieldType::Date => Value::String(String::new()),
            FieldType::Number => Value::from(0),
            FieldType::Boolean => Value::Bool(false),
            FieldType::Array => Value::Array(Vec::new()),
        }
    }

    /// Coerce an extracted value into this type
    ///
    /// Values that cannot be interpreted fall back to [`FieldType::default_value`].
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::FieldType;
    /// use serde_json::json;
    ///
    /// assert_eq!(FieldType::Number.coerce(&json!("$1,234.50")), json!(1234.5));
    /// assert_eq!(FieldType::Boolean.coerce(&json!("Yes")), json!(true));
    /// assert_eq!(FieldType::Array.coerce(&json!("a, b")), json!(["a", "b"]));
    /// ```
    pub fn coerce(&self, value: &Value) -> Value {
        match self {
            FieldType::Text | FieldType::Date => match value {
                Value::Null => self.default_value(),
                Value::String(s) => Value::String(s.trim().to_string()),
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .map(|v| FieldType::Text.format(v))
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                other => Value::String(FieldType::Text.format(other)),
            },
            FieldType::Number => match value {
                Value::Number(_) => value.clone(),
                Value::String(s) => parse_number(s)
                    .map(number_value)
                    .unwrap_or_else(|| self.default_value()),
                Value::Bool(b) => Value::from(u8::from(*b)),
                _ => self.default_value(),
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => value.clone(),
                Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" | "ja" | "oui" => Value::Bool(true),
                    _ => Value::Bool(false),
                },
                _ => self.default_value(),
            },
            FieldType::Array => match value {
                Value::Array(_) => value.clone(),
                Value::Null => self.default_value(),
                Value::String(s) => Value::Array(
                    s.split([',', ';'])
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                ),
                other => Value::Array(vec![other.clone()]),
            },
        }
    }

    /// Render a value of this type for display
    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                _ => n.to_string(),
            },
            Value::Array(items) => items
                .iter()
                .map(|v| self.format(v))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(_) => value.to_string(),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok()
}

fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Definition of one field to extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Unique key within a field list
    pub key: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Data type of the field
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Extra guidance given to the extraction model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Explicit default overriding the type's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    /// Create a text field with the given key and label
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type: FieldType::Text,
            instructions: None,
            default: None,
        }
    }

    /// Set the field type
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Set extraction instructions
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Default value for this field when extraction produced nothing
    pub fn default_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.field_type.default_value())
    }
}
