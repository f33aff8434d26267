//! `APPROVETAP_*` environment overrides, applied after the file is loaded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use crate::schema::{ApproveTapConfig, BrowserConfig, CollectorConfig, InterceptorConfig};

pub const PORTAL_URL: &str = "APPROVETAP_PORTAL_URL";
pub const HEADLESS: &str = "APPROVETAP_HEADLESS";
pub const USER_DATA_DIR: &str = "APPROVETAP_USER_DATA_DIR";
pub const PROFILE_DIR: &str = "APPROVETAP_PROFILE_DIR";
pub const CHROME_BINARY: &str = "APPROVETAP_CHROME_BINARY";
pub const INJECT_INTERVAL_SEC: &str = "APPROVETAP_INJECT_INTERVAL_SEC";
pub const PORT: &str = "APPROVETAP_PORT";
pub const HOOK_URL: &str = "APPROVETAP_HOOK_URL";

pub fn apply_env_overrides(config: ApproveTapConfig) -> Result<ApproveTapConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Empty values are ignored.
pub fn apply_env_overrides_with(
    mut config: ApproveTapConfig,
    env: &HashMap<String, String>,
) -> Result<ApproveTapConfig> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    let browser = config.browser.get_or_insert_with(BrowserConfig::default);
    if let Some(url) = get(PORTAL_URL) {
        browser.portal_url = Some(url.to_string());
    }
    if let Some(flag) = get(HEADLESS) {
        browser.headless = Some(flag.eq_ignore_ascii_case("true"));
    }
    if let Some(dir) = get(USER_DATA_DIR) {
        browser.user_data_dir = Some(PathBuf::from(dir));
    }
    if let Some(profile) = get(PROFILE_DIR) {
        browser.profile_dir = Some(profile.to_string());
    }
    if let Some(binary) = get(CHROME_BINARY) {
        browser.chrome_binary = Some(PathBuf::from(binary));
    }
    if let Some(secs) = get(INJECT_INTERVAL_SEC) {
        browser.inject_interval_secs = Some(parse(INJECT_INTERVAL_SEC, secs)?);
    }

    if let Some(port) = get(PORT) {
        config
            .collector
            .get_or_insert_with(CollectorConfig::default)
            .port = Some(parse(PORT, port)?);
    }
    if let Some(url) = get(HOOK_URL) {
        config
            .interceptor
            .get_or_insert_with(InterceptorConfig::default)
            .hook_url = Some(url.to_string());
    }
    Ok(config)
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key}={raw:?} is not a valid value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn overrides_browser_and_collector() {
        let cfg = apply_env_overrides_with(
            ApproveTapConfig::default(),
            &env(&[
                (PORTAL_URL, "https://portal.example.test/"),
                (HEADLESS, "TRUE"),
                (PROFILE_DIR, "Profile 2"),
                (INJECT_INTERVAL_SEC, "10"),
                (PORT, "5100"),
                (HOOK_URL, "http://collector:5100/hook"),
            ]),
        )
        .unwrap();
        let browser = cfg.browser.unwrap();
        assert_eq!(browser.portal_url.as_deref(), Some("https://portal.example.test/"));
        assert_eq!(browser.headless, Some(true));
        assert_eq!(browser.profile_dir.as_deref(), Some("Profile 2"));
        assert_eq!(browser.inject_interval_secs, Some(10));
        assert_eq!(cfg.collector.unwrap().port, Some(5100));
        assert_eq!(
            cfg.interceptor.unwrap().hook_url.as_deref(),
            Some("http://collector:5100/hook")
        );
    }

    #[test]
    fn headless_is_false_unless_true() {
        let cfg = apply_env_overrides_with(ApproveTapConfig::default(), &env(&[(HEADLESS, "yes")])).unwrap();
        assert_eq!(cfg.browser.unwrap().headless, Some(false));
    }

    #[test]
    fn empty_values_are_ignored() {
        let cfg = apply_env_overrides_with(ApproveTapConfig::default(), &env(&[(PORT, ""), (PORTAL_URL, "  ")])).unwrap();
        assert!(cfg.collector.is_none());
        assert!(cfg.browser.unwrap().portal_url.is_none());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = apply_env_overrides_with(ApproveTapConfig::default(), &env(&[(INJECT_INTERVAL_SEC, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(INJECT_INTERVAL_SEC));
    }
}
