//! Extraction prompt construction

use docket_domain::{ResolvedConfig, TagDef};

/// Builds the extraction prompt from a resolved configuration
pub struct PromptBuilder<'a> {
    config: &'a ResolvedConfig,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder over a resolved configuration
    pub fn new(config: &'a ResolvedConfig) -> Self {
        Self { config }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let prompt = &self.config.prompt;
        let mut out = String::new();

        // 1. Preamble
        out.push_str(prompt.preamble.trim());
        out.push_str("\n\n");

        // 2. Fields
        out.push_str("Fields to extract:\n");
        for field in &self.config.fields {
            let label = if field.label.is_empty() {
                &field.key
            } else {
                &field.label
            };
            out.push_str(&format!(
                "- {} ({}): {}",
                field.key,
                field.field_type.as_str(),
                label
            ));
            if let Some(instructions) = &field.instructions {
                out.push_str(". ");
                out.push_str(instructions.trim());
            }
            out.push('\n');
        }

        // 3. Enabled tags
        let tags: Vec<&TagDef> = self.config.enabled_tags().collect();
        if !tags.is_empty() {
            out.push_str("\nTags (list every id that applies under \"tags\"):\n");
            for tag in tags {
                out.push_str(&format!("- {}: {}\n", tag.id, render_tag_instructions(tag)));
            }
        }

        // 4. Rules
        if !prompt.rules.is_empty() {
            out.push_str("\nRules:\n");
            for (idx, rule) in prompt.rules.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", idx + 1, rule.trim()));
            }
        }

        // 5. Output shape
        let keys: Vec<String> = self
            .config
            .fields
            .iter()
            .map(|f| format!("\"{}\": ...", f.key))
            .collect();
        out.push_str(&format!(
            "\nOutput format: {{\"fields\": {{{}}}, \"tags\": [...]}}\n",
            keys.join(", ")
        ));

        if !prompt.suffix.trim().is_empty() {
            out.push('\n');
            out.push_str(prompt.suffix.trim());
            out.push('\n');
        }

        out
    }
}

/// Tag instructions with `{parameter}` placeholders filled in
///
/// Parameters the text does not mention are appended in parentheses.
fn render_tag_instructions(tag: &TagDef) -> String {
    let mut text = tag.instructions.trim().to_string();
    let mut unmentioned = Vec::new();
    for param in &tag.parameters {
        let placeholder = format!("{{{}}}", param.name);
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, &param.value);
        } else {
            unmentioned.push(format!("{}={}", param.name, param.value));
        }
    }
    if !unmentioned.is_empty() {
        text.push_str(&format!(" ({})", unmentioned.join(", ")));
    }
    text
}
