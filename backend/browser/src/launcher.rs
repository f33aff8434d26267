//! Chrome process launch and DevTools endpoint discovery.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use approvetap_config::BrowserSettings;
use serde_json::Value;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::CdpError;

const DISCOVERY_ATTEMPTS: u32 = 30;
const DISCOVERY_DELAY: Duration = Duration::from_millis(500);

/// Command-line flags for a session.
pub fn chrome_args(settings: &BrowserSettings) -> Vec<String> {
    let mut args = Vec::new();
    if settings.headless {
        args.push("--headless=new".to_string());
    }
    if let Some(dir) = &settings.user_data_dir {
        args.push(format!("--user-data-dir={}", dir.display()));
    }
    if let Some(profile) = &settings.profile_dir {
        args.push(format!("--profile-directory={profile}"));
    }
    args.extend(
        [
            "--disable-blink-features=AutomationControlled",
            "--disable-features=IsolateOrigins,site-per-process",
            "--start-maximized",
            "--no-first-run",
            "--no-default-browser-check",
        ]
        .map(String::from),
    );
    args.push(format!("--remote-debugging-port={}", settings.debug_port));
    args
}

/// Platform default when `chromeBinary` is not configured.
pub fn default_chrome_binary() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe")
    } else {
        PathBuf::from("google-chrome")
    }
}

/// First `page` target's WebSocket URL in a `/json/list` response.
pub fn pick_page_target(targets: &[Value]) -> Option<String> {
    targets
        .iter()
        .filter(|t| t.get("type").and_then(Value::as_str) == Some("page"))
        .find_map(|t| t.get("webSocketDebuggerUrl").and_then(Value::as_str))
        .map(str::to_string)
}

/// A running Chrome. Killed when dropped.
pub struct ChromeProcess {
    child: Child,
    debug_port: u16,
}

impl ChromeProcess {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, CdpError> {
        let binary = settings
            .chrome_binary
            .clone()
            .unwrap_or_else(default_chrome_binary);
        let args = chrome_args(settings);
        info!(binary = %binary.display(), headless = settings.headless, port = settings.debug_port, "Launching Chrome");
        debug!(?args, "Chrome arguments");

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(CdpError::Launch)?;
        Ok(Self {
            child,
            debug_port: settings.debug_port,
        })
    }

    pub fn debug_port(&self) -> u16 {
        self.debug_port
    }

    /// Poll `/json/list` until a page target shows up.
    pub async fn page_ws_url(&self) -> Result<String, CdpError> {
        discover_page_ws_url(self.debug_port, DISCOVERY_ATTEMPTS, DISCOVERY_DELAY).await
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "Failed to kill Chrome");
        } else {
            info!("Chrome stopped");
        }
    }
}

pub async fn discover_page_ws_url(port: u16, attempts: u32, delay: Duration) -> Result<String, CdpError> {
    let url = format!("http://127.0.0.1:{port}/json/list");
    let mut last_error = None;
    for _ in 0..attempts.max(1) {
        match fetch_targets(&url).await {
            Ok(targets) => {
                if let Some(ws) = pick_page_target(&targets) {
                    return Ok(ws);
                }
            }
            Err(e) => last_error = Some(e),
        }
        tokio::time::sleep(delay).await;
    }
    Err(last_error.map_or(CdpError::NoPageTarget(port), CdpError::Discovery))
}

async fn fetch_targets(url: &str) -> Result<Vec<Value>, reqwest::Error> {
    reqwest::get(url).await?.error_for_status()?.json().await
}
