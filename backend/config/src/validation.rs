//! Config validation with field paths in every message.

use crate::schema::ApproveTapConfig;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &ApproveTapConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_collector(config, &mut report);
    validate_browser(config, &mut report);
    validate_interceptor(config, &mut report);
    report
}

/// Routes the collector registers next to the hook endpoint.
pub const RESERVED_PATHS: &[&str] = &["/start", "/stop", "/status", "/events/last", "/api/health"];

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_collector(config: &ApproveTapConfig, report: &mut ValidationReport) {
    let Some(collector) = &config.collector else { return };
    if let Some(port) = collector.port {
        if port == 0 {
            report.error("collector.port", "port must be > 0");
        } else if port < 1024 {
            report.warn(
                "collector.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if let Some(path) = &collector.hook_path {
        if !path.starts_with('/') {
            report.error("collector.hookPath", "hookPath must start with '/'");
        } else if RESERVED_PATHS.contains(&path.as_str()) {
            report.error(
                "collector.hookPath",
                format!("{path} is already served by the collector"),
            );
        }
    }
}

fn validate_browser(config: &ApproveTapConfig, report: &mut ValidationReport) {
    let Some(browser) = &config.browser else { return };
    if let Some(url) = &browser.portal_url {
        if !is_http_url(url) {
            report.error("browser.portalUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
    if browser.inject_interval_secs == Some(0) {
        report.error("browser.injectIntervalSecs", "injectIntervalSecs must be >= 1");
    }
    if let Some(script) = &browser.inject_script {
        if !script.exists() {
            report.warn(
                "browser.injectScript",
                format!("{} does not exist; injection will fail until it is built", script.display()),
            );
        }
    }
}

fn validate_interceptor(config: &ApproveTapConfig, report: &mut ValidationReport) {
    if config.interceptor.is_none() {
        return;
    }
    let interceptor = config.interceptor_settings();
    if !is_http_url(&interceptor.hook_url) {
        report.error(
            "interceptor.hookUrl",
            format!("'{}' is not an http(s) URL", interceptor.hook_url),
        );
    }
    for (path, value) in [
        ("interceptor.markerAttribute", &interceptor.marker_attribute),
        ("interceptor.inspectionKey", &interceptor.inspection_key),
        ("interceptor.handleKey", &interceptor.handle_key),
    ] {
        if value.trim().is_empty() {
            report.error(path, "must not be empty");
        }
    }
    for (role, selector) in interceptor.selectors.entries() {
        if selector.trim().is_empty() {
            report.error(format!("interceptor.selectors.{role}"), "selector must not be empty");
        }
    }
}
