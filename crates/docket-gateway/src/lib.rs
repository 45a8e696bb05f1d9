//! Docket Extraction Gateway
//!
//! The boundary to the external document-extraction service. One call takes a
//! document and a prompt and returns structured fields plus usage, or a
//! classified failure.
//!
//! # Providers
//!
//! - `MockGateway`: Scripted responses for testing, with call and concurrency
//!   instrumentation
//! - `HttpGateway`: JSON-over-HTTP service integration
//!
//! # Examples
//!
//! ```
//! use docket_gateway::{ExtractionGateway, ExtractionRequest, GatewayError, MockGateway};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let gateway = MockGateway::new();
//! gateway.push_error("scan.pdf", GatewayError::RateLimited("slow down".into()));
//!
//! let request = ExtractionRequest::new("scan.pdf", vec![], "prompt", "model");
//! assert!(gateway.extract(&request).await.is_err());
//! assert!(gateway.extract(&request).await.is_ok());
//! assert_eq!(gateway.call_count(), 2);
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod parser;

use async_trait::async_trait;
use docket_domain::Extraction;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use parser::parse_extraction;

/// One document submitted for extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Document name
    pub filename: String,
    /// Document bytes
    pub bytes: Vec<u8>,
    /// Rendered prompt
    pub prompt: String,
    /// Model id
    pub model: String,
}

impl ExtractionRequest {
    /// Create a request
    pub fn new(
        filename: impl Into<String>,
        bytes: Vec<u8>,
        prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            prompt: prompt.into(),
            model: model.into(),
        }
    }
}

/// Trait for the single-document extraction call
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Extract fields and tags from one document
    async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, GatewayError>;
}

type Script = HashMap<String, VecDeque<Result<Extraction, GatewayError>>>;

/// Mock gateway for deterministic testing
///
/// Responses are scripted per filename and consumed in order; once a file's
/// script is exhausted the default extraction is returned. Clones share
/// scripts and counters.
#[derive(Debug, Clone)]
pub struct MockGateway {
    default_response: Extraction,
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl MockGateway {
    /// Create a mock returning an empty extraction for every call
    pub fn new() -> Self {
        Self::with_default(Extraction::default())
    }

    /// Create a mock returning the given extraction by default
    pub fn with_default(default_response: Extraction) -> Self {
        Self {
            default_response,
            script: Arc::new(Mutex::new(HashMap::new())),
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulate service latency on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response for a file
    pub fn push_ok(&self, filename: impl Into<String>, extraction: Extraction) {
        self.push(filename, Ok(extraction));
    }

    /// Queue a failure for a file
    pub fn push_error(&self, filename: impl Into<String>, error: GatewayError) {
        self.push(filename, Err(error));
    }

    fn push(&self, filename: impl Into<String>, response: Result<Extraction, GatewayError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(filename.into())
            .or_default()
            .push_back(response);
    }

    /// Number of extract calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of calls made for one file
    pub fn calls_for(&self, filename: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.filename == filename)
            .count()
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionGateway for MockGateway {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, GatewayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&request.filename)
            .and_then(VecDeque::pop_front);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        scripted.unwrap_or_else(|| Ok(self.default_response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::TokenUsage;

    fn request(filename: &str) -> ExtractionRequest {
        ExtractionRequest::new(filename, b"%PDF".to_vec(), "prompt", "model")
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let mut default = Extraction::default();
        default.usage = TokenUsage::new(3, 4);
        let gateway = MockGateway::with_default(default);

        let result = gateway.extract(&request("a.pdf")).await.unwrap();
        assert_eq!(result.usage.total(), 7);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_script_consumed_in_order() {
        let gateway = MockGateway::new();
        gateway.push_error("a.pdf", GatewayError::RateLimited("1".to_string()));
        gateway.push_error("a.pdf", GatewayError::Timeout(1));

        assert!(matches!(
            gateway.extract(&request("a.pdf")).await,
            Err(GatewayError::RateLimited(_))
        ));
        assert!(matches!(
            gateway.extract(&request("a.pdf")).await,
            Err(GatewayError::Timeout(_))
        ));
        assert!(gateway.extract(&request("a.pdf")).await.is_ok());
        assert!(gateway.extract(&request("b.pdf")).await.is_ok());
        assert_eq!(gateway.calls_for("a.pdf"), 3);
        assert_eq!(gateway.calls_for("b.pdf"), 1);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_counters() {
        let first = MockGateway::new();
        let second = first.clone();
        first.extract(&request("a.pdf")).await.unwrap();
        assert_eq!(second.call_count(), 1);
        assert_eq!(second.requests()[0].filename, "a.pdf");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_tracks_max_in_flight() {
        let gateway = MockGateway::new().with_delay(Duration::from_millis(50));
        let a = request("a.pdf");
        let b = request("b.pdf");
        let (ra, rb) = tokio::join!(gateway.extract(&a), gateway.extract(&b));
        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(gateway.max_in_flight(), 2);
    }
}
