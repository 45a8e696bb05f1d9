//! Result records - the persisted outcome of processing one document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::AddAssign;

/// Unique identifier for a result record based on UUIDv7
///
/// UUIDv7 ids sort chronologically and need no coordination between writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::RecordId;
    ///
    /// let a = RecordId::new();
    /// let b = RecordId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a RecordId from its string form
    pub fn parse(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid record id '{}': {}", s, e))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final status of a processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Fields were extracted
    Success,
    /// Extraction failed after the retry budget
    Failed,
}

impl RecordStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::Failed => "failed",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(RecordStatus::Success),
            "failed" => Some(RecordStatus::Failed),
            _ => None,
        }
    }
}

/// Token usage reported by the extraction service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Tokens sent to the model
    pub input_tokens: u64,
    /// Tokens generated by the model
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Create a usage value
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Input plus output tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// Structured output of a successful extraction call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Extracted values keyed by field key
    pub fields: Map<String, Value>,

    /// Ids of the tags that apply
    #[serde(default)]
    pub tags: Vec<String>,

    /// Usage metrics of the call
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Result of running one document through the retrying executor
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The extraction succeeded on some attempt
    Success {
        /// Extracted data
        extraction: Extraction,
        /// Wall time across all attempts, including backoff
        duration_ms: u64,
        /// Attempts used (1-based)
        attempts: u32,
    },
    /// Every attempt failed, or a terminal failure occurred
    Failure {
        /// Last error message
        error: String,
        /// Raw service response kept for diagnosis, already truncated
        raw_response: Option<String>,
        /// Wall time across all attempts, including backoff
        duration_ms: u64,
        /// Attempts used (1-based)
        attempts: u32,
    },
}

impl Outcome {
    /// Whether the outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Usage to account for; failures always report zero
    pub fn usage(&self) -> TokenUsage {
        match self {
            Outcome::Success { extraction, .. } => extraction.usage,
            Outcome::Failure { .. } => TokenUsage::default(),
        }
    }

    /// Total wall time
    pub fn duration_ms(&self) -> u64 {
        match self {
            Outcome::Success { duration_ms, .. } | Outcome::Failure { duration_ms, .. } => {
                *duration_ms
            }
        }
    }
}

/// Descriptive data stored alongside an outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMeta {
    /// Name of the input document
    pub original_filename: String,

    /// Name the output was given, when one was produced
    pub output_filename: Option<String>,
}

impl RecordMeta {
    /// Meta for a document without an output name
    pub fn new(original_filename: impl Into<String>) -> Self {
        Self {
            original_filename: original_filename.into(),
            output_filename: None,
        }
    }
}

/// Persisted record of one document's processing attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Stable identifier, kept across retries
    pub id: RecordId,

    /// Name of the input document
    pub original_filename: String,

    /// Name of the produced output, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Final status
    pub status: RecordStatus,

    /// Extracted values keyed by field key
    #[serde(default)]
    pub extracted_fields: Map<String, Value>,

    /// Applied tag ids
    #[serde(default)]
    pub tags: Vec<String>,

    /// Token usage (zero for failures)
    #[serde(default)]
    pub token_usage: TokenUsage,

    /// When this content was written
    pub timestamp: DateTime<Utc>,

    /// Error message of a failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Truncated raw response of a terminal parse failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,

    /// Processing time in milliseconds
    #[serde(default)]
    pub duration_ms: u64,

    /// Timestamp of the content this record replaced on retry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retried_from: Option<DateTime<Utc>>,
}

impl ResultRecord {
    /// Build a record from an outcome
    pub fn from_outcome(
        id: RecordId,
        outcome: &Outcome,
        meta: &RecordMeta,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id,
            original_filename: meta.original_filename.clone(),
            output_filename: None,
            status: RecordStatus::Failed,
            extracted_fields: Map::new(),
            tags: Vec::new(),
            token_usage: outcome.usage(),
            timestamp,
            error: None,
            raw_response: None,
            duration_ms: outcome.duration_ms(),
            retried_from: None,
        };

        match outcome {
            Outcome::Success { extraction, .. } => {
                record.status = RecordStatus::Success;
                record.extracted_fields = extraction.fields.clone();
                record.tags = extraction.tags.clone();
                record.output_filename = meta.output_filename.clone();
            }
            Outcome::Failure {
                error,
                raw_response,
                ..
            } => {
                record.error = Some(error.clone());
                record.raw_response = raw_response.clone();
            }
        }

        record
    }

    /// Whether this record is a failure
    pub fn is_failed(&self) -> bool {
        self.status == RecordStatus::Failed
    }
}

/// Counters aggregated over one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Documents in the worklist
    pub total: usize,
    /// Documents extracted successfully
    pub success: usize,
    /// Documents that failed
    pub failed: usize,
    /// Aggregated token usage
    pub token_usage: TokenUsage,
}

impl BatchSummary {
    /// Zeroed summary for a worklist of the given size
    pub fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Account one finished document
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_success() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.token_usage += outcome.usage();
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: &BatchSummary) {
        self.total += other.total;
        self.success += other.success;
        self.failed += other.failed;
        self.token_usage += other.token_usage;
    }
}
