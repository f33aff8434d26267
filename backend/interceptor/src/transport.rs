//! Best-effort delivery of approval events.
//!
//! Two independent channels: network egress to the collector and the system
//! clipboard. Each channel tries its preferred primitive, then one fallback,
//! then gives up. Nothing here returns an error to the caller; outcomes are
//! only visible through the optional [`DeliveryObserver`].

use std::rc::Rc;

use approvetap_core::{OutboundMessage, Report};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("{0}")]
    Failed(String),
}

/// Network capability of the page.
pub trait Egress {
    /// Queue `body` for delivery without waiting for a response.
    fn beacon(&self, url: &str, body: &str) -> Result<(), TransportError>;

    /// Start a POST of `body`; the response is never inspected.
    fn post(&self, url: &str, body: &str) -> Result<(), TransportError>;
}

/// Clipboard capability of the page.
pub trait ClipboardWriter {
    /// Start an asynchronous clipboard write.
    ///
    /// Implementations whose write is rejected only after this returns must
    /// run [`ClipboardWriter::copy_legacy`] themselves.
    fn write_async(&self, text: &str) -> Result<(), TransportError>;

    /// Synchronous copy through a temporary off-screen text field.
    fn copy_legacy(&self, text: &str) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    Beacon,
    Post,
    AsyncClipboard,
    LegacyCopy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub method: DeliveryMethod,
    pub outcome: Result<(), TransportError>,
}

/// Notified of every delivery attempt, successful or not.
pub type DeliveryObserver = Rc<dyn Fn(&DeliveryAttempt)>;

pub struct Transport {
    hook_url: String,
    egress: Rc<dyn Egress>,
    clipboard: Rc<dyn ClipboardWriter>,
    observer: Option<DeliveryObserver>,
}

impl Transport {
    pub fn new(
        hook_url: impl Into<String>,
        egress: Rc<dyn Egress>,
        clipboard: Rc<dyn ClipboardWriter>,
        observer: Option<DeliveryObserver>,
    ) -> Self {
        Self {
            hook_url: hook_url.into(),
            egress,
            clipboard,
            observer,
        }
    }

    /// Relay `message` to the collector. Beacon first, POST if the beacon
    /// could not be queued.
    pub fn send(&self, message: &OutboundMessage) {
        let body = match message.to_json() {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Dropping unserializable message");
                return;
            }
        };

        let beacon = self.egress.beacon(&self.hook_url, &body);
        let delivered = beacon.is_ok();
        self.record(DeliveryMethod::Beacon, beacon);
        if delivered {
            return;
        }
        let post = self.egress.post(&self.hook_url, &body);
        self.record(DeliveryMethod::Post, post);
    }

    /// Put the report on the clipboard as plain text.
    pub fn copy(&self, report: &Report) {
        let text = report.to_string();
        let primary = self.clipboard.write_async(&text);
        let written = primary.is_ok();
        self.record(DeliveryMethod::AsyncClipboard, primary);
        if written {
            return;
        }
        let legacy = self.clipboard.copy_legacy(&text);
        self.record(DeliveryMethod::LegacyCopy, legacy);
    }

    fn record(&self, method: DeliveryMethod, outcome: Result<(), TransportError>) {
        if let Err(e) = &outcome {
            debug!(?method, error = %e, "Delivery attempt failed");
        }
        if let Some(observer) = &self.observer {
            observer(&DeliveryAttempt { method, outcome });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{RecordingClipboard, RecordingEgress};
    use approvetap_core::ApprovalEvent;
    use chrono::Utc;
    use std::cell::RefCell;

    fn message() -> OutboundMessage {
        OutboundMessage::approve_clicked(ApprovalEvent::unresolved(Utc::now()))
    }

    fn transport(
        egress: Rc<RecordingEgress>,
        clipboard: Rc<RecordingClipboard>,
    ) -> (Transport, Rc<RefCell<Vec<DeliveryAttempt>>>) {
        let attempts = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&attempts);
        let observer: DeliveryObserver = Rc::new(move |a: &DeliveryAttempt| sink.borrow_mut().push(a.clone()));
        (
            Transport::new("http://collector/hook", egress, clipboard, Some(observer)),
            attempts,
        )
    }

    #[test]
    fn beacon_success_skips_post() {
        let egress = Rc::new(RecordingEgress::default());
        let (transport, attempts) = transport(egress.clone(), Rc::new(RecordingClipboard::default()));
        transport.send(&message());

        assert_eq!(egress.beacons().len(), 1);
        assert!(egress.posts().is_empty());
        let (url, body) = &egress.beacons()[0];
        assert_eq!(url, "http://collector/hook");
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["event"], "approve_clicked");
        assert_eq!(attempts.borrow().len(), 1);
    }

    #[test]
    fn missing_beacon_falls_back_to_post() {
        let egress = Rc::new(RecordingEgress::without_beacon());
        let (transport, attempts) = transport(egress.clone(), Rc::new(RecordingClipboard::default()));
        transport.send(&message());

        assert_eq!(egress.posts().len(), 1);
        let methods: Vec<_> = attempts.borrow().iter().map(|a| a.method).collect();
        assert_eq!(methods, vec![DeliveryMethod::Beacon, DeliveryMethod::Post]);
        assert_eq!(
            attempts.borrow()[0].outcome,
            Err(TransportError::Unavailable("sendBeacon"))
        );
    }

    #[test]
    fn total_network_failure_is_swallowed() {
        let egress = Rc::new(RecordingEgress::offline());
        let (transport, attempts) = transport(egress, Rc::new(RecordingClipboard::default()));
        transport.send(&message());
        assert!(attempts.borrow().iter().all(|a| a.outcome.is_err()));
        assert_eq!(attempts.borrow().len(), 2);
    }

    #[test]
    fn clipboard_falls_back_to_legacy_copy() {
        let clipboard = Rc::new(RecordingClipboard::without_async());
        let (transport, attempts) = transport(Rc::new(RecordingEgress::default()), clipboard.clone());
        let report = Report::from_event(&message().detail);
        transport.copy(&report);

        assert_eq!(clipboard.legacy_copies(), vec![report.to_string()]);
        let methods: Vec<_> = attempts.borrow().iter().map(|a| a.method).collect();
        assert_eq!(methods, vec![DeliveryMethod::AsyncClipboard, DeliveryMethod::LegacyCopy]);
    }

    #[test]
    fn async_clipboard_success_skips_legacy() {
        let clipboard = Rc::new(RecordingClipboard::default());
        let (transport, _) = transport(Rc::new(RecordingEgress::default()), clipboard.clone());
        transport.copy(&Report::from_event(&message().detail));
        assert_eq!(clipboard.async_writes().len(), 1);
        assert!(clipboard.legacy_copies().is_empty());
    }

    #[test]
    fn works_without_observer() {
        let transport = Transport::new(
            "http://collector/hook",
            Rc::new(RecordingEgress::offline()),
            Rc::new(RecordingClipboard::broken()),
            None,
        );
        transport.send(&message());
        transport.copy(&Report::from_event(&message().detail));
    }
}
