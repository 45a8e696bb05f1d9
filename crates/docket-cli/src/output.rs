//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use docket_domain::{
    AnnotatedConfig, BatchSummary, GlobalConfig, ProgressEvent, RecordStatus, ResultRecord,
    Source, Tenant,
};
use docket_pipeline::AllTenantsReport;
use docket_store::ResultPage;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Output format in use.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    fn table(header: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut builder = Builder::default();
        builder.push_record(header.iter().map(|h| h.to_string()));
        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a tenant list.
    pub fn format_tenants(&self, tenants: &[Tenant]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Self::json(tenants);
        }
        if tenants.is_empty() {
            return Ok(self.colorize("No tenants found.", "yellow"));
        }

        let rows = tenants
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.name.clone(),
                    t.folder.display().to_string(),
                ]
            })
            .collect();
        Ok(Self::table(&["ID", "Name", "Folder"], rows))
    }

    /// Format an effective configuration with provenance.
    pub fn format_annotated(&self, config: &AnnotatedConfig) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Self::json(config);
        }

        let mut rows = Vec::new();
        for field in &config.fields {
            let def = &field.value;
            rows.push(vec![
                "fields".to_string(),
                def.key.clone(),
                format!("{} ({})", def.label, def.field_type.as_str()),
                self.source(field.source),
            ]);
        }
        for tag in &config.tags {
            rows.push(vec![
                "tags".to_string(),
                tag.id.clone(),
                if tag.enabled { "enabled" } else { "disabled" }.to_string(),
                self.source(tag.enabled_source),
            ]);
            for param in &tag.parameters {
                rows.push(vec![
                    "tags".to_string(),
                    format!("{}.{}", tag.id, param.name),
                    param.value.clone(),
                    self.source(param.source),
                ]);
            }
        }
        rows.push(vec![
            "prompt".to_string(),
            "preamble".to_string(),
            truncate(&config.prompt.value.preamble, 48),
            self.source(config.prompt.source),
        ]);
        rows.push(vec![
            "prompt".to_string(),
            "rules".to_string(),
            config.prompt.value.rules.len().to_string(),
            self.source(config.prompt.source),
        ]);
        rows.push(vec![
            "output".to_string(),
            "filename_template".to_string(),
            config.output.value.filename_template.clone(),
            self.source(config.output.source),
        ]);
        rows.push(vec![
            "model".to_string(),
            "model".to_string(),
            config.model.value.clone(),
            self.source(config.model.source),
        ]);

        Ok(Self::table(&["Section", "Item", "Value", "Source"], rows))
    }

    /// Format the global configuration (always JSON; the record is nested).
    pub fn format_global(&self, config: &GlobalConfig) -> Result<String> {
        Self::json(config)
    }

    /// Format a page of results.
    pub fn format_results(&self, page: &ResultPage) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Self::json(page);
        }
        if page.records.is_empty() {
            return Ok(self.colorize("No results found.", "yellow"));
        }

        let rows = page
            .records
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.original_filename.clone(),
                    self.status(r.status),
                    r.output_filename.clone().unwrap_or_default(),
                    r.token_usage.total().to_string(),
                    r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]
            })
            .collect();
        let mut out = Self::table(
            &["ID", "File", "Status", "Output", "Tokens", "Timestamp"],
            rows,
        );
        out.push_str(&format!(
            "\n{} of {} result(s){}",
            page.records.len(),
            page.total,
            if page.has_more { ", more available" } else { "" }
        ));
        Ok(out)
    }

    /// Format one result record (always JSON; fields are free-form).
    pub fn format_record(&self, record: &ResultRecord) -> Result<String> {
        Self::json(record)
    }

    /// Format a batch summary.
    pub fn format_summary(&self, summary: &BatchSummary) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Self::json(summary);
        }
        let line = format!(
            "{} document(s): {} succeeded, {} failed, {} tokens",
            summary.total,
            summary.success,
            summary.failed,
            summary.token_usage.total()
        );
        Ok(if summary.failed == 0 {
            self.success(&line)
        } else {
            self.warning(&line)
        })
    }

    /// Format an all-tenants report.
    pub fn format_report(&self, report: &AllTenantsReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            let runs: Vec<serde_json::Value> = report
                .runs
                .iter()
                .map(|run| match &run.result {
                    Ok(summary) => serde_json::json!({"tenant": run.tenant, "summary": summary}),
                    Err(error) => serde_json::json!({"tenant": run.tenant, "error": error}),
                })
                .collect();
            return Self::json(&serde_json::json!({"runs": runs, "total": report.total}));
        }

        let rows = report
            .runs
            .iter()
            .map(|run| match &run.result {
                Ok(s) => vec![
                    run.tenant.to_string(),
                    s.total.to_string(),
                    s.success.to_string(),
                    s.failed.to_string(),
                    String::new(),
                ],
                Err(e) => vec![
                    run.tenant.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    e.clone(),
                ],
            })
            .collect();
        let mut out = Self::table(&["Tenant", "Total", "Success", "Failed", "Error"], rows);
        out.push('\n');
        out.push_str(&self.format_summary(&report.total)?);
        Ok(out)
    }

    /// Format one progress event as a single line.
    pub fn format_event(&self, event: &ProgressEvent) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string(event)?);
        }

        let line = match event {
            ProgressEvent::Connected => self.info("Connected"),
            ProgressEvent::Starting {
                tenant,
                total,
                dry_run,
            } => self.info(&format!(
                "{}: {} document(s){}",
                tenant,
                total,
                if *dry_run { " (dry run)" } else { "" }
            )),
            ProgressEvent::Analyzing {
                filename,
                current,
                total,
            } => format!("  [{}/{}] analyzing {}", current, total, filename),
            ProgressEvent::Retrying {
                filename,
                attempt,
                max_attempts,
                delay_ms,
                error,
            } => self.warning(&format!(
                "  {} attempt {}/{} failed ({}), retrying in {}ms",
                filename, attempt, max_attempts, error, delay_ms
            )),
            ProgressEvent::Completed {
                filename,
                current,
                total,
                output_filename,
            } => self.success(&format!(
                "  [{}/{}] {}{}",
                current,
                total,
                filename,
                output_filename
                    .as_ref()
                    .map(|o| format!(" -> {}", o))
                    .unwrap_or_default()
            )),
            ProgressEvent::Failed {
                filename,
                current,
                total,
                error,
            } => self.error(&format!("  [{}/{}] {}: {}", current, total, filename, error)),
            ProgressEvent::Warning { message } => self.warning(message),
            ProgressEvent::Done { summary } => self.format_summary(summary)?,
            ProgressEvent::Error { error } => self.error(error),
            ProgressEvent::ClientStarting {
                tenant,
                index,
                count,
            } => self.info(&format!("Tenant {} ({}/{})", tenant, index, count)),
            ProgressEvent::ClientDone { tenant, error, .. } => match error {
                Some(error) => self.error(&format!("Tenant {} skipped: {}", tenant, error)),
                None => self.info(&format!("Tenant {} done", tenant)),
            },
            ProgressEvent::Unknown => String::new(),
        };
        Ok(line)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn source(&self, source: Source) -> String {
        match source {
            Source::Global => source.as_str().to_string(),
            Source::Override => self.colorize(source.as_str(), "cyan"),
        }
    }

    fn status(&self, status: RecordStatus) -> String {
        match status {
            RecordStatus::Success => self.colorize(status.as_str(), "green"),
            RecordStatus::Failed => self.colorize(status.as_str(), "red"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::{TenantId, TenantOverride, TokenUsage};

    fn plain() -> Formatter {
        Formatter::new(OutputFormat::Table, false)
    }

    fn annotated() -> AnnotatedConfig {
        let mut overrides = TenantOverride::default();
        overrides.model = Some("tenant-model".to_string());
        docket_resolver::resolve_annotated(&GlobalConfig::default(), &overrides)
    }

    #[test]
    fn test_annotated_table() {
        let output = plain().format_annotated(&annotated()).unwrap();
        assert!(output.contains("Source"));
        assert!(output.contains("invoice_number"));
        assert!(output.contains("urgent.days"));
        assert!(output.contains("tenant-model"));
        assert!(output.contains("override"));
    }

    #[test]
    fn test_annotated_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_annotated(&annotated()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["model"]["source"], "override");
    }

    #[test]
    fn test_tenant_table() {
        let tenants = vec![Tenant::new(
            TenantId::parse("acme").unwrap(),
            "Acme",
            "/docs/acme",
        )];
        let output = plain().format_tenants(&tenants).unwrap();
        assert!(output.contains("Folder"));
        assert!(output.contains("/docs/acme"));
        assert!(plain().format_tenants(&[]).unwrap().contains("No tenants"));
    }

    #[test]
    fn test_event_lines() {
        let formatter = plain();
        let line = formatter
            .format_event(&ProgressEvent::Analyzing {
                filename: "a.pdf".to_string(),
                current: 2,
                total: 5,
            })
            .unwrap();
        assert_eq!(line, "  [2/5] analyzing a.pdf");

        let json = Formatter::new(OutputFormat::Json, false)
            .format_event(&ProgressEvent::Connected)
            .unwrap();
        assert_eq!(json, r#"{"status":"connected"}"#);
    }

    #[test]
    fn test_summary_line() {
        let summary = BatchSummary {
            total: 3,
            success: 1,
            failed: 2,
            token_usage: TokenUsage::new(10, 5),
        };
        let line = plain().format_summary(&summary).unwrap();
        assert_eq!(line, "⚠ 3 document(s): 1 succeeded, 2 failed, 15 tokens");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_colorize_disabled() {
        assert_eq!(plain().success("test"), "✓ test");
    }
}
