//! `approvetap render`: five-line report from a saved message.

use std::path::Path;

use anyhow::{Context, Result};
use approvetap_core::{ApprovalEvent, Report};
use serde_json::Value;

/// Accepts an outbound message (`{"event", "detail", "ts"}`) or a bare
/// approval event.
pub fn render_report(raw: &str) -> Result<Report> {
    let value: Value = serde_json::from_str(raw).context("Input is not JSON")?;
    let event = match value.get("detail") {
        Some(detail) if detail.is_object() => detail.clone(),
        _ => value,
    };
    let event: ApprovalEvent =
        serde_json::from_value(event).context("Input is not an approval event")?;
    Ok(Report::from_event(&event))
}

pub fn run(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("{}", render_report(&raw)?);
    Ok(())
}
