//! Approval Event Logger
//!
//! Each message the collector receives or the injector observes becomes one
//! `approval_events` entry, followed by one entry per detail line.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::redact::{redact_sensitive_data, redact_value};

pub const APPROVAL_TARGET: &str = "approval_events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// Posted to the collector's hook endpoint.
    Collector,
    /// Read from the page by the injector loop.
    Injector,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalLogEntry {
    pub source: MessageSource,
    pub logged_at: DateTime<Utc>,
    /// JSON of the whole payload with its string values redacted.
    pub payload: String,
    /// Redacted `detail.details` lines, in order.
    pub details: Vec<String>,
}

/// `detail.details` of an outbound message. Non-string items are rendered
/// as JSON.
pub fn detail_lines(payload: &Value) -> Vec<String> {
    payload
        .pointer("/detail/details")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct ApprovalLogger;

impl ApprovalLogger {
    pub fn log_message(source: MessageSource, payload: &Value) -> ApprovalLogEntry {
        let entry = ApprovalLogEntry {
            source,
            logged_at: Utc::now(),
            payload: redact_value(payload).to_string(),
            details: detail_lines(payload)
                .iter()
                .map(|line| redact_sensitive_data(line))
                .collect(),
        };

        info!(target: APPROVAL_TARGET, source = ?entry.source, payload = %entry.payload, "Approval event");
        for (index, line) in entry.details.iter().enumerate() {
            info!(target: APPROVAL_TARGET, source = ?entry.source, index, detail = %line, "Approval detail");
        }
        entry
    }
}
