//! Fire-and-forget domain events. Emission is decoupled from the
//! triggering operation: a failed publish is logged and dropped, never
//! propagated, retried, or allowed to delay the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::EventRoutes;
use crate::error::{AssetError, AssetResult};

/// Kinds of committed state changes worth telling downstream about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Upload,
    Delete,
    Enroll,
    StatusChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Delete => "delete",
            Self::Enroll => "enroll",
            Self::StatusChanged => "status_changed",
        }
    }
}

/// An immutable fact emitted after a committed state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub subject_id: String,
    pub payload: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new<S: Into<String>>(kind: EventKind, subject_id: S) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            payload: serde_json::Value::Null,
            at: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Best-effort delivery boundary to the message broker. Implementations
/// must not block: accept or fail immediately.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, queue: &str, event: DomainEvent) -> AssetResult<()>;
}

/// Routes events to queues and swallows delivery failures locally
pub struct EventNotifier {
    sink: Arc<dyn EventSink>,
    routes: EventRoutes,
}

impl EventNotifier {
    pub fn new<S: EventSink + 'static>(sink: S, routes: EventRoutes) -> Self {
        Self {
            sink: Arc::new(sink),
            routes,
        }
    }

    pub fn from_arc(sink: Arc<dyn EventSink>, routes: EventRoutes) -> Self {
        Self { sink, routes }
    }

    fn queue_for(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Upload | EventKind::StatusChanged => &self.routes.processing_queue,
            EventKind::Delete | EventKind::Enroll => &self.routes.notification_queue,
        }
    }

    /// Publish an event. Failures are recovered here: logged, dropped,
    /// invisible to the triggering operation.
    pub async fn notify(&self, event: DomainEvent) {
        let queue = self.queue_for(event.kind).to_string();
        let kind = event.kind;
        let subject = event.subject_id.clone();
        if let Err(e) = self.sink.publish(&queue, event).await {
            warn!(
                queue = %queue,
                kind = kind.as_str(),
                subject_id = %subject,
                error = %e,
                "event delivery failed; dropping"
            );
        }
    }
}

/// Bounded channel sink. A full or closed channel is a delivery failure,
/// recovered by the notifier; the sender never waits.
pub struct ChannelSink {
    tx: mpsc::Sender<(String, DomainEvent)>,
}

impl ChannelSink {
    /// Create a sink and the consumer end of its channel
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<(String, DomainEvent)>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, queue: &str, event: DomainEvent) -> AssetResult<()> {
        self.tx
            .try_send((queue.to_string(), event))
            .map_err(|e| AssetError::storage_msg(format!("event channel rejected send: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifier_routes_by_kind() {
        let (sink, mut rx) = ChannelSink::bounded(8);
        let notifier = EventNotifier::new(sink, EventRoutes::default());

        notifier
            .notify(DomainEvent::new(EventKind::Upload, "a1"))
            .await;
        notifier
            .notify(DomainEvent::new(EventKind::Delete, "a1"))
            .await;

        let (queue, event) = rx.recv().await.unwrap();
        assert_eq!(queue, "file.processing.queue");
        assert_eq!(event.kind, EventKind::Upload);

        let (queue, event) = rx.recv().await.unwrap();
        assert_eq!(queue, "notification.queue");
        assert_eq!(event.kind, EventKind::Delete);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let (sink, rx) = ChannelSink::bounded(1);
        drop(rx); // closed channel: every publish fails
        let notifier = EventNotifier::new(sink, EventRoutes::default());

        // Must not panic, error, or block
        notifier
            .notify(DomainEvent::new(EventKind::Upload, "a1"))
            .await;
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_waiting() {
        let (sink, _rx) = ChannelSink::bounded(1);
        let notifier = EventNotifier::new(sink, EventRoutes::default());

        notifier
            .notify(DomainEvent::new(EventKind::Upload, "a1"))
            .await;
        // Second send hits a full channel and is dropped immediately
        notifier
            .notify(DomainEvent::new(EventKind::Upload, "a2"))
            .await;
    }

    #[test]
    fn event_serializes_with_stable_type_field() {
        let event = DomainEvent::new(EventKind::Upload, "a1")
            .with_payload(serde_json::json!({"object_name": "k_notes.pdf"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "upload");
        assert_eq!(json["subject_id"], "a1");
        assert_eq!(json["payload"]["object_name"], "k_notes.pdf");
    }
}
