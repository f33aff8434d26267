//! Five-line clipboard report derived from an [`ApprovalEvent`].

use std::fmt;

use crate::event::{ApprovalEvent, NOT_AVAILABLE};
use crate::options::{first_of, OptionKind};

/// Index of the detail line naming who the request was approved for.
const REQUESTER_DETAIL_INDEX: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    lines: [String; 5],
}

impl Report {
    pub fn from_event(event: &ApprovalEvent) -> Self {
        let headline = format!(
            "Approved application request for {} on {} for {}",
            short_app_name(&event.app_name),
            event.computer,
            event.detail(REQUESTER_DETAIL_INDEX),
        );
        let application = if event.is_new_app {
            format!("Created application: {}", event.app_name)
        } else {
            format!("Used matching application: {}", event.app_name)
        };
        let scope = first_of(&event.selected, OptionKind::Scope).unwrap_or(NOT_AVAILABLE);
        let elevation = first_of(&event.selected, OptionKind::Elevation).unwrap_or(NOT_AVAILABLE);
        let expiration = if event.expiration.trim().is_empty() {
            NOT_AVAILABLE
        } else {
            event.expiration.as_str()
        };

        Self {
            lines: [
                headline,
                application,
                scope.to_string(),
                expiration.to_string(),
                elevation.to_string(),
            ],
        }
    }

    pub fn lines(&self) -> &[String; 5] {
        &self.lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Second hyphen-delimited segment of an application name, or the name itself.
///
/// `"ORG-MyApp-Prod"` becomes `"MyApp"`; names without a usable second
/// segment are returned unchanged.
pub fn short_app_name(name: &str) -> String {
    name.split('-')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .nth(1)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}
