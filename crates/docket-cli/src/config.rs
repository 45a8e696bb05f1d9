//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use docket_gateway::{ExtractionGateway, HttpGateway};
use docket_pipeline::{DocketService, PipelineConfig};
use docket_resolver::ValidationConfig;
use docket_store::{FileConfigStore, ResultLog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding configuration records and result logs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Extraction service connection
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Batch pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Extraction service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Extraction endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docket").join("config.toml"))
    }

    /// Load configuration from a file, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config
            .pipeline
            .validate()
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Build the extraction gateway described by this configuration.
    pub fn gateway(&self) -> Result<Arc<dyn ExtractionGateway>> {
        let mut gateway =
            HttpGateway::with_timeout(&self.gateway.endpoint, self.pipeline.request_timeout_secs)?;
        if let Ok(key) = std::env::var(&self.gateway.api_key_env) {
            gateway = gateway.with_api_key(key);
        }
        Ok(Arc::new(gateway))
    }

    /// Open the service over the data directory.
    pub fn open_service(
        &self,
        gateway: Arc<dyn ExtractionGateway>,
    ) -> Result<DocketService<FileConfigStore>> {
        let store = Arc::new(FileConfigStore::new(&self.data_dir)?);
        let log = Arc::new(ResultLog::new(&self.data_dir));
        Ok(DocketService::new(
            store,
            log,
            gateway,
            self.pipeline.clone(),
            ValidationConfig::default(),
        )?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            settings: Settings::default(),
            gateway: GatewaySettings::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".docket").join("data"))
        .unwrap_or_else(|| PathBuf::from(".docket/data"))
}

fn default_endpoint() -> String {
    "http://localhost:8787/v1/extract".to_string()
}

fn default_api_key_env() -> String {
    "DOCKET_API_KEY".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

/// Read a JSON payload given inline or as `@path`.
pub fn read_payload(raw: &str) -> Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("Payload is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.gateway.api_key_env, "DOCKET_API_KEY");
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data_dir = dir.path().join("data");
        config.settings.format = OutputFormat::Json;
        config.pipeline.concurrency = 6;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/srv/docket\"\n\n[pipeline]\nretry_attempts = 0\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/docket"));
        assert_eq!(config.pipeline.retry_attempts, 0);
        assert_eq!(config.pipeline.concurrency, 3);
    }

    #[test]
    fn test_invalid_pipeline_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nconcurrency = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_read_payload() {
        assert_eq!(read_payload("\"m\"").unwrap(), serde_json::json!("m"));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fields.json");
        fs::write(&path, r#"[{"key": "amount"}]"#).unwrap();
        let value = read_payload(&format!("@{}", path.display())).unwrap();
        assert_eq!(value[0]["key"], "amount");

        assert!(matches!(read_payload("{nope"), Err(CliError::InvalidInput(_))));
    }
}
