//! Output file naming

use docket_domain::ResolvedConfig;
use serde_json::{Map, Value};

/// Decides the output name of a successfully extracted document
pub trait OutputNamer: Send + Sync {
    /// Name for the output, or `None` when no usable name can be formed
    fn output_name(
        &self,
        config: &ResolvedConfig,
        fields: &Map<String, Value>,
        original_filename: &str,
    ) -> Option<String>;
}

/// Fills `{field_key}` placeholders of the output template
///
/// Values are rendered with their field type, stripped of characters unsafe
/// in file names, and the original extension is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderNamer;

impl OutputNamer for PlaceholderNamer {
    fn output_name(
        &self,
        config: &ResolvedConfig,
        fields: &Map<String, Value>,
        original_filename: &str,
    ) -> Option<String> {
        let template = &config.output.filename_template;
        let mut stem = String::new();
        let mut rest = template.as_str();

        while let Some(open) = rest.find('{') {
            stem.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                stem.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let key = &after[..close];
            if let (Some(field), Some(value)) = (config.field(key), fields.get(key)) {
                stem.push_str(&field.field_type.format(value));
            }
            rest = &after[close + 1..];
        }
        stem.push_str(rest);

        let stem = sanitize(&stem);
        if stem.is_empty() {
            return None;
        }

        match original_filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Some(format!("{}.{}", stem, ext)),
            _ => Some(stem),
        }
    }
}

/// Replace characters unsafe in file names and collapse separators
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_sep = true;
    for c in raw.trim().chars() {
        let c = if c.is_alphanumeric() || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' {
            if !last_sep {
                out.push('_');
            }
            last_sep = true;
        } else {
            out.push(c);
            last_sep = false;
        }
    }
    out.trim_end_matches('_').to_string()
}
