//! HTTP extraction service adapter
//!
//! Posts the document (base64) and prompt as JSON to a configured endpoint and
//! reads back the model's text answer plus usage.
//!
//! # Examples
//!
//! ```no_run
//! use docket_gateway::HttpGateway;
//!
//! let gateway = HttpGateway::new("http://localhost:8080/v1/extract")
//!     .unwrap()
//!     .with_api_key("secret");
//! ```

use crate::error::GatewayError;
use crate::parser::parse_extraction;
use crate::{ExtractionGateway, ExtractionRequest};
use async_trait::async_trait;
use base64::Engine;
use docket_domain::{Extraction, TokenUsage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for extraction requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP client for the extraction service
pub struct HttpGateway {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Request body for the extraction endpoint
#[derive(Serialize)]
struct ExtractBody<'a> {
    model: &'a str,
    prompt: &'a str,
    filename: &'a str,
    document: String,
}

/// Response from the extraction endpoint
#[derive(Deserialize)]
struct ExtractResponse {
    text: String,
    #[serde(default)]
    usage: UsageBody,
}

#[derive(Deserialize, Default)]
struct UsageBody {
    #[serde(default, alias = "inputTokens")]
    input_tokens: u64,
    #[serde(default, alias = "outputTokens")]
    output_tokens: u64,
}

impl HttpGateway {
    /// Create a gateway for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a gateway with a custom request timeout
    pub fn with_timeout(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GatewayError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: None,
            client,
            timeout_secs,
        })
    }

    /// Authenticate with a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExtractionGateway for HttpGateway {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, GatewayError> {
        let body = ExtractBody {
            model: &request.model,
            prompt: &request.prompt,
            filename: &request.filename,
            document: base64::engine::general_purpose::STANDARD.encode(&request.bytes),
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::Communication(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::from_status(status.as_u16(), error_text));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| GatewayError::Communication(format!("Failed to read body: {}", e)))?;
        let parsed: ExtractResponse =
            serde_json::from_str(&raw).map_err(|e| GatewayError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
                raw: raw.clone(),
            })?;

        debug!(
            filename = %request.filename,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Extraction response received"
        );

        parse_extraction(
            &parsed.text,
            TokenUsage::new(parsed.usage.input_tokens, parsed.usage.output_tokens),
        )
    }
}
