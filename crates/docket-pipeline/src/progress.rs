//! Progress sinks

use docket_domain::{ProgressEvent, ProgressSink};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Forwards events over an unbounded channel
///
/// Once the receiver is dropped, emits report the observer as gone and events
/// are discarded; the run itself is unaffected.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the observer
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) -> bool {
        true
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Status names of the events received so far
    pub fn statuses(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ProgressEvent::status)
            .collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_reports_disconnect() {
        let (sink, rx) = ChannelSink::new();
        assert!(sink.emit(ProgressEvent::Connected));
        drop(rx);
        assert!(!sink.emit(ProgressEvent::Connected));
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(ProgressEvent::Connected);
        sink.emit(ProgressEvent::Warning {
            message: "x".to_string(),
        });
        assert_eq!(rx.recv().await, Some(ProgressEvent::Connected));
        assert_eq!(rx.recv().await.map(|e| e.status()), Some("warning"));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.emit(ProgressEvent::Connected);
        assert_eq!(sink.statuses(), vec!["connected"]);
        assert!(NullSink.emit(ProgressEvent::Connected));
    }
}
