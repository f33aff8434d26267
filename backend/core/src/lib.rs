//! Shared model for approvetap: the approval event, its wire envelope, the
//! option vocabulary, the clipboard report and the selector table.

pub mod event;
pub mod options;
pub mod report;
pub mod selectors;

pub use event::{ApprovalEvent, OutboundMessage, APPROVE_CLICKED, NOT_AVAILABLE};
pub use options::{OptionKind, ELEVATION_OPTIONS, PERMISSION_OPTIONS, SCOPE_OPTIONS};
pub use report::{short_app_name, Report};
pub use selectors::{InterceptorSettings, SelectorTable};
