//! approvetap configuration schema.
//!
//! Every section and field is optional in the file; [`crate::defaults`]
//! fills the gaps and [`crate::settings`] turns the result into concrete
//! values for each component.

use approvetap_core::SelectorTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTapConfig {
    /// HTTP collector receiving approval events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<CollectorConfig>,

    /// Browser session driven by the injector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserConfig>,

    /// Settings handed to the in-page engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interceptor: Option<InterceptorConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Path of the endpoint the page posts approval events to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// Management console opened at session start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    /// Chrome user data directory (keeps the console login between runs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<PathBuf>,
    /// Profile inside the user data directory, e.g. `Default` or `Profile 1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_binary: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_port: Option<u16>,
    /// Script bundle evaluated in the page on every injection tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_script: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_interval_secs: Option<u64>,
}

/// In-page engine settings. An unset `hookUrl` follows the collector's
/// effective port and `hookPath`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_key: Option<String>,
    /// Missing roles keep their built-in selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SelectorTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Level: "error" | "warn" | "info" | "debug" | "trace"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory of the rolling NDJSON log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}
