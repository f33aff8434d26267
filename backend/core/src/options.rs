//! The closed vocabulary of option labels the console highlights.
//!
//! Only these eight labels survive extraction; anything else the page marks
//! as selected is ignored.

use serde::{Deserialize, Serialize};

/// Breadth of the grant.
pub const SCOPE_OPTIONS: [&str; 3] = ["This Computer", "Computer Group", "Entire Organization"];

/// How the approved application is permitted to run.
pub const PERMISSION_OPTIONS: [&str; 2] = ["Permit", "Permit with Ringfence"];

/// Privilege behavior granted to the application.
pub const ELEVATION_OPTIONS: [&str; 3] = ["No Elevation", "Elevate", "Silent Elevation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Scope,
    Permission,
    Elevation,
}

impl OptionKind {
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            OptionKind::Scope => &SCOPE_OPTIONS,
            OptionKind::Permission => &PERMISSION_OPTIONS,
            OptionKind::Elevation => &ELEVATION_OPTIONS,
        }
    }
}

/// Classify a label against the vocabulary. Matching is exact.
pub fn classify(label: &str) -> Option<OptionKind> {
    [OptionKind::Scope, OptionKind::Permission, OptionKind::Elevation]
        .into_iter()
        .find(|kind| kind.labels().contains(&label))
}

pub fn is_allowed(label: &str) -> bool {
    classify(label).is_some()
}

/// First label of `kind` among `selected`, in the order given.
pub fn first_of<'a>(selected: &'a [String], kind: OptionKind) -> Option<&'a str> {
    selected
        .iter()
        .map(String::as_str)
        .find(|label| classify(label) == Some(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_has_eight_labels() {
        let all: Vec<_> = SCOPE_OPTIONS
            .iter()
            .chain(PERMISSION_OPTIONS.iter())
            .chain(ELEVATION_OPTIONS.iter())
            .collect();
        assert_eq!(all.len(), 8);
        assert!(all.iter().all(|l| is_allowed(l)));
    }

    #[test]
    fn classify_is_exact() {
        assert_eq!(classify("Elevate"), Some(OptionKind::Elevation));
        assert_eq!(classify("elevate"), None);
        assert_eq!(classify("Permit with Ringfence"), Some(OptionKind::Permission));
        assert_eq!(classify("Deny"), None);
    }

    #[test]
    fn first_of_respects_order() {
        let selected = vec![
            "Permit".to_string(),
            "Computer Group".to_string(),
            "This Computer".to_string(),
        ];
        assert_eq!(first_of(&selected, OptionKind::Scope), Some("Computer Group"));
        assert_eq!(first_of(&selected, OptionKind::Elevation), None);
    }
}
