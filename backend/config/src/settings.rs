//! Concrete per-component settings resolved from a loaded config.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use approvetap_core::InterceptorSettings;

use crate::defaults::*;
use crate::schema::ApproveTapConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub bind: String,
    pub port: u16,
    pub hook_path: String,
}

impl CollectorSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("collector.bind {:?} is not an IP address", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Where a page on this machine reaches the hook endpoint.
    pub fn local_hook_url(&self) -> String {
        format!("http://localhost:{}{}", self.port, self.hook_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub portal_url: String,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    pub profile_dir: Option<String>,
    pub chrome_binary: Option<PathBuf>,
    pub debug_port: u16,
    pub inject_script: PathBuf,
    pub inject_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub dir: PathBuf,
}

impl ApproveTapConfig {
    pub fn collector_settings(&self) -> CollectorSettings {
        let c = self.collector.clone().unwrap_or_default();
        CollectorSettings {
            bind: c.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: c.port.unwrap_or(DEFAULT_PORT),
            hook_path: c.hook_path.unwrap_or_else(|| DEFAULT_HOOK_PATH.to_string()),
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        let b = self.browser.clone().unwrap_or_default();
        BrowserSettings {
            portal_url: b.portal_url.unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string()),
            headless: b.headless.unwrap_or(false),
            user_data_dir: b.user_data_dir,
            profile_dir: b.profile_dir,
            chrome_binary: b.chrome_binary,
            debug_port: b.debug_port.unwrap_or(DEFAULT_DEBUG_PORT),
            inject_script: b
                .inject_script
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INJECT_SCRIPT)),
            inject_interval: Duration::from_secs(
                b.inject_interval_secs
                    .unwrap_or(DEFAULT_INJECT_INTERVAL_SECS)
                    .max(1),
            ),
        }
    }

    /// An unset `hookUrl` points at this config's collector on localhost.
    pub fn interceptor_settings(&self) -> InterceptorSettings {
        let builtin = InterceptorSettings::default();
        let i = self.interceptor.clone().unwrap_or_default();
        InterceptorSettings {
            hook_url: i
                .hook_url
                .unwrap_or_else(|| self.collector_settings().local_hook_url()),
            marker_attribute: i.marker_attribute.unwrap_or(builtin.marker_attribute),
            inspection_key: i.inspection_key.unwrap_or(builtin.inspection_key),
            handle_key: i.handle_key.unwrap_or(builtin.handle_key),
            selectors: i.selectors.unwrap_or(builtin.selectors),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        let l = self.logging.clone().unwrap_or_default();
        LogSettings {
            level: l.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            dir: l.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }
}
