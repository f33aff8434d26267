//! `approvetap-config`: approvetap runtime configuration.
//!
//! Provides:
//! - Typed config schema (collector, browser, interceptor, logging)
//! - YAML loading from `$APPROVETAP_CONFIG_DIR` or `~/.approvetap/`
//! - `${ENV_VAR}` substitution and `APPROVETAP_*` overrides
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod schema;
pub mod settings;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use overrides::{apply_env_overrides, apply_env_overrides_with};
pub use schema::{ApproveTapConfig, BrowserConfig, CollectorConfig, InterceptorConfig, LoggingConfig};
pub use settings::{BrowserSettings, CollectorSettings, LogSettings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<ApproveTapConfig> {
    let raw_config = load_config(path).await?;
    prepare_with(raw_config, &std::env::vars().collect())
}

/// Everything after parsing, against an explicit environment.
///
/// Validation warnings are logged. Errors abort with every message listed.
pub fn prepare_with(raw: ApproveTapConfig, env: &HashMap<String, String>) -> Result<ApproveTapConfig> {
    let value: Value =
        serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: ApproveTapConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("invalid configuration:\n  {}", messages.join("\n  "));
    }
    Ok(config)
}
