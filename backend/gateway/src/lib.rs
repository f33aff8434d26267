//! approvetap collector gateway
//!
//! Receives approval events from the page and exposes browser session
//! control over HTTP.

pub mod collector;
pub mod control;
pub mod health_api;
pub mod server;

pub use server::{CollectedEvent, GatewayState, build_router, start_server};
