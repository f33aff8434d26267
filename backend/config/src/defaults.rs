//! Config defaults: fills every unset field of a parsed config.

use std::path::PathBuf;

use approvetap_core::InterceptorSettings;

use crate::schema::{
    ApproveTapConfig, BrowserConfig, CollectorConfig, InterceptorConfig, LoggingConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOOK_PATH: &str = "/hook";

pub const DEFAULT_PORTAL_URL: &str = "https://portal.threatlocker.com/";
pub const DEFAULT_DEBUG_PORT: u16 = 9222;
pub const DEFAULT_INJECT_SCRIPT: &str = "dist/approvetap.js";
pub const DEFAULT_INJECT_INTERVAL_SECS: u64 = 5;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ApproveTapConfig) -> ApproveTapConfig {
    let config = apply_collector_defaults(config);
    let config = apply_browser_defaults(config);
    let config = apply_interceptor_defaults(config);
    apply_logging_defaults(config)
}

fn apply_collector_defaults(mut config: ApproveTapConfig) -> ApproveTapConfig {
    let collector = config.collector.get_or_insert_with(CollectorConfig::default);
    collector.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    collector.port.get_or_insert(DEFAULT_PORT);
    collector
        .hook_path
        .get_or_insert_with(|| DEFAULT_HOOK_PATH.to_string());
    config
}

/// `headless`, `debugPort`, `injectScript` and the interval. Profile and
/// binary stay unset: Chrome's own defaults apply.
fn apply_browser_defaults(mut config: ApproveTapConfig) -> ApproveTapConfig {
    let browser = config.browser.get_or_insert_with(BrowserConfig::default);
    browser
        .portal_url
        .get_or_insert_with(|| DEFAULT_PORTAL_URL.to_string());
    browser.headless.get_or_insert(false);
    browser.debug_port.get_or_insert(DEFAULT_DEBUG_PORT);
    browser
        .inject_script
        .get_or_insert_with(|| PathBuf::from(DEFAULT_INJECT_SCRIPT));
    browser
        .inject_interval_secs
        .get_or_insert(DEFAULT_INJECT_INTERVAL_SECS);
    config
}

/// Everything but `hookUrl`, which is resolved against the collector in
/// [`ApproveTapConfig::interceptor_settings`] so later port changes carry over.
fn apply_interceptor_defaults(mut config: ApproveTapConfig) -> ApproveTapConfig {
    let builtin = InterceptorSettings::default();
    let interceptor = config
        .interceptor
        .get_or_insert_with(InterceptorConfig::default);
    interceptor
        .marker_attribute
        .get_or_insert(builtin.marker_attribute);
    interceptor.inspection_key.get_or_insert(builtin.inspection_key);
    interceptor.handle_key.get_or_insert(builtin.handle_key);
    interceptor.selectors.get_or_insert(builtin.selectors);
    config
}

fn apply_logging_defaults(mut config: ApproveTapConfig) -> ApproveTapConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| PathBuf::from(DEFAULT_LOG_DIR));
    config
}
