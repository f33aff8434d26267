//! Telemetry and structured logging for approvetap.
//!
//! Console + rolling NDJSON file output, redaction, and the approval event logger
//! shared by the collector and the injector loop.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{detail_lines, ApprovalLogEntry, ApprovalLogger, MessageSource, APPROVAL_TARGET};
pub use logger::init_logger;
pub use redact::{redact_sensitive_data, redact_value};
