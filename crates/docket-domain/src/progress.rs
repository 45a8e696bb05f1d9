//! Progress events streamed to an observer while a batch runs

use crate::record::BatchSummary;
use serde::{Deserialize, Serialize};

/// One entry of the ordered progress stream
///
/// Serialized with a `status` discriminator (`starting`, `analyzing`,
/// `client-starting`, ...). Statuses this version does not know decode to
/// [`ProgressEvent::Unknown`], so older observers keep working when new
/// statuses are introduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "status",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ProgressEvent {
    /// The observer is attached
    Connected,

    /// A batch is about to process its worklist
    Starting {
        /// Tenant id
        tenant: String,
        /// Worklist size
        total: usize,
        /// Whether this is a dry run
        dry_run: bool,
    },

    /// A document was picked up
    Analyzing {
        /// Document name
        filename: String,
        /// 1-based position in the worklist
        current: usize,
        /// Worklist size
        total: usize,
    },

    /// An attempt failed with a retryable error and the next one is scheduled
    Retrying {
        /// Document name
        filename: String,
        /// Attempt that just failed (1-based)
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
        /// Backoff before the next attempt
        delay_ms: u64,
        /// Error of the failed attempt
        error: String,
    },

    /// A document was extracted
    Completed {
        /// Document name
        filename: String,
        /// Documents finished so far
        current: usize,
        /// Worklist size
        total: usize,
        /// Name the output was given
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_filename: Option<String>,
    },

    /// A document failed
    Failed {
        /// Document name
        filename: String,
        /// Documents finished so far
        current: usize,
        /// Worklist size
        total: usize,
        /// Final error
        error: String,
    },

    /// Something went wrong that did not fail the batch
    Warning {
        /// Human-readable description
        message: String,
    },

    /// The batch finished
    Done {
        /// Aggregated counters
        summary: BatchSummary,
    },

    /// The batch could not start or was rejected
    Error {
        /// Human-readable description
        error: String,
    },

    /// All-tenants mode moved on to the next tenant
    ClientStarting {
        /// Tenant id
        tenant: String,
        /// 1-based position among tenants
        index: usize,
        /// Number of tenants
        count: usize,
    },

    /// All-tenants mode finished one tenant
    ClientDone {
        /// Tenant id
        tenant: String,
        /// Summary when the tenant's batch ran
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<BatchSummary>,
        /// Error when the tenant's batch was rejected
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A status this version does not understand
    #[serde(other)]
    Unknown,
}

impl ProgressEvent {
    /// Status discriminator as it appears on the wire
    pub fn status(&self) -> &'static str {
        match self {
            ProgressEvent::Connected => "connected",
            ProgressEvent::Starting { .. } => "starting",
            ProgressEvent::Analyzing { .. } => "analyzing",
            ProgressEvent::Retrying { .. } => "retrying",
            ProgressEvent::Completed { .. } => "completed",
            ProgressEvent::Failed { .. } => "failed",
            ProgressEvent::Warning { .. } => "warning",
            ProgressEvent::Done { .. } => "done",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::ClientStarting { .. } => "client-starting",
            ProgressEvent::ClientDone { .. } => "client-done",
            ProgressEvent::Unknown => "unknown",
        }
    }

    /// Whether this event ends a single-tenant stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Done { .. } | ProgressEvent::Error { .. })
    }
}

/// Ordered, one-way event channel to an observer
///
/// Implementations must preserve emit order. `emit` returns `false` once the
/// observer has gone away; callers keep working and simply stop caring about
/// delivery.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: ProgressEvent) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let event = ProgressEvent::Retrying {
            filename: "a.pdf".to_string(),
            attempt: 1,
            max_attempts: 3,
            delay_ms: 1000,
            error: "rate limited".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "retrying");
        assert_eq!(value["maxAttempts"], 3);
        assert_eq!(value["delayMs"], 1000);

        let value = serde_json::to_value(ProgressEvent::ClientStarting {
            tenant: "acme".to_string(),
            index: 1,
            count: 2,
        })
        .unwrap();
        assert_eq!(value["status"], "client-starting");
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let event: ProgressEvent =
            serde_json::from_value(json!({"status": "paused", "filename": "a.pdf"})).unwrap();
        assert_eq!(event, ProgressEvent::Unknown);
    }

    #[test]
    fn test_decode_known_status() {
        let event: ProgressEvent = serde_json::from_value(json!({
            "status": "failed",
            "filename": "b.pdf",
            "current": 2,
            "total": 3,
            "error": "bad json"
        }))
        .unwrap();
        assert_eq!(event.status(), "failed");
        assert!(!event.is_terminal());
        assert!(ProgressEvent::Error { error: "x".to_string() }.is_terminal());
    }
}
