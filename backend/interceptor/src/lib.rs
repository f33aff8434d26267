//! In-page approval interceptor.
//!
//! Finds approval controls on the management console, hooks them exactly
//! once, and on click snapshots the approval context into an
//! [`ApprovalEvent`](approvetap_core::ApprovalEvent). The event goes to the
//! collector and a five-line report goes to the clipboard, both best effort.
//!
//! Everything runs against the [`Dom`] and [`ChangeSource`] capabilities so
//! the whole engine can be driven by [`memory::MemoryDom`] in tests. The
//! `web` feature binds them to the live page on `wasm32`.

pub mod dom;
pub mod engine;
pub mod extractor;
pub mod hooks;
pub mod matcher;
pub mod memory;
pub mod scanner;
pub mod transport;
pub mod watcher;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use dom::{ClickHandler, Dom};
pub use engine::{Capabilities, Engine, InspectionHook, Installer};
pub use extractor::Extractor;
pub use hooks::{ApprovalHandler, HookRegistry};
pub use matcher::{is_approve_control, is_approve_label};
pub use scanner::Scanner;
pub use transport::{
    ClipboardWriter, DeliveryAttempt, DeliveryMethod, DeliveryObserver, Egress, Transport,
    TransportError,
};
pub use watcher::{ChangeListener, ChangeSource, ChangeWatcher, ManualChangeSource, SubscriptionId};
