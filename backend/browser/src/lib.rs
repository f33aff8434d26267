//! Host-side browser driver.
//!
//! Launches Chrome with the operator's profile, attaches over the DevTools
//! protocol, opens the management console and keeps the interceptor
//! injected while polling the page for new approval events.

pub mod bundle;
pub mod cdp_client;
pub mod error;
pub mod injector;
pub mod launcher;
pub mod page_control;
pub mod session;

pub use bundle::EngineBundle;
pub use cdp_client::CdpClient;
pub use error::CdpError;
pub use injector::{inspection_expression, InjectionScript, Injector, LastEventTracker};
pub use launcher::{chrome_args, ChromeProcess};
pub use page_control::{PageControl, PageEvaluator};
pub use session::{ChromeSessionRunner, SessionController, SessionRunner, StartOutcome, StopOutcome};
