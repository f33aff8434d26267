use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel substituted for every field the extractor could not resolve.
pub const NOT_AVAILABLE: &str = "N/A";

/// Event name carried by every outbound approval message.
pub const APPROVE_CLICKED: &str = "approve_clicked";

/// Everything the page showed at the moment an approval control was clicked.
///
/// Built once per click and never mutated afterwards. Scalar fields always
/// hold a value: unresolved ones carry [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub timestamp: DateTime<Utc>,
    /// Trimmed label of the clicked control.
    pub text: String,
    /// Non-empty detail lines in document order.
    #[serde(default)]
    pub details: Vec<String>,
    /// Highlighted option labels, restricted to the known vocabulary.
    #[serde(default)]
    pub selected: Vec<String>,
    pub expiration: String,
    pub app_name: String,
    pub is_new_app: bool,
    pub computer: String,
}

impl ApprovalEvent {
    /// An event with every field set to its sentinel.
    pub fn unresolved(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            text: NOT_AVAILABLE.to_string(),
            details: Vec::new(),
            selected: Vec::new(),
            expiration: NOT_AVAILABLE.to_string(),
            app_name: NOT_AVAILABLE.to_string(),
            is_new_app: false,
            computer: NOT_AVAILABLE.to_string(),
        }
    }

    /// Detail line at `index`, or the sentinel when the page showed fewer lines.
    pub fn detail(&self, index: usize) -> &str {
        self.details
            .get(index)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }
}

/// Wire envelope posted to the collector and exposed at the inspection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub event: String,
    pub detail: ApprovalEvent,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

impl OutboundMessage {
    pub fn approve_clicked(detail: ApprovalEvent) -> Self {
        let ts = detail.timestamp.timestamp_millis();
        Self {
            event: APPROVE_CLICKED.to_string(),
            detail,
            ts,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unresolved_event_is_fully_populated() {
        let event = ApprovalEvent::unresolved(Utc::now());
        assert_eq!(event.text, NOT_AVAILABLE);
        assert_eq!(event.expiration, NOT_AVAILABLE);
        assert_eq!(event.app_name, NOT_AVAILABLE);
        assert_eq!(event.computer, NOT_AVAILABLE);
        assert!(!event.is_new_app);
        assert_eq!(event.detail(2), NOT_AVAILABLE);
    }

    #[test]
    fn message_carries_event_name_and_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = OutboundMessage::approve_clicked(ApprovalEvent::unresolved(ts));
        assert_eq!(msg.event, "approve_clicked");
        assert_eq!(msg.ts, ts.timestamp_millis());

        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "approve_clicked");
        assert_eq!(json["detail"]["app_name"], "N/A");
        assert!(json["detail"]["details"].is_array());
    }
}
