//! Session lifecycle: at most one browser + injector loop at a time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use approvetap_config::BrowserSettings;
use approvetap_core::InterceptorSettings;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::cdp_client::CdpClient;
use crate::injector::{InjectionScript, Injector};
use crate::launcher::ChromeProcess;
use crate::page_control::PageControl;

const STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Brings a browser session up.
#[async_trait]
pub trait SessionRunner: Send + Sync + 'static {
    /// Returns the task driving the session. The task must finish shortly
    /// after `stop` turns true, releasing the browser.
    async fn launch(&self, stop: watch::Receiver<bool>) -> Result<JoinHandle<()>>;
}

/// Chrome + CDP + injector loop.
pub struct ChromeSessionRunner {
    browser: BrowserSettings,
    interceptor: InterceptorSettings,
}

impl ChromeSessionRunner {
    pub fn new(browser: BrowserSettings, interceptor: InterceptorSettings) -> Self {
        Self { browser, interceptor }
    }
}

#[async_trait]
impl SessionRunner for ChromeSessionRunner {
    async fn launch(&self, stop: watch::Receiver<bool>) -> Result<JoinHandle<()>> {
        let script = InjectionScript::load(&self.browser.inject_script, &self.interceptor).await?;
        let chrome = ChromeProcess::launch(&self.browser).await?;
        let ws_url = chrome
            .page_ws_url()
            .await
            .context("Chrome did not expose a page target")?;
        let page = PageControl::new(CdpClient::connect(&ws_url).await?);
        page.navigate(&self.browser.portal_url)
            .await
            .with_context(|| format!("Failed to open {}", self.browser.portal_url))?;

        let injector = Injector::new(
            page,
            script,
            &self.interceptor.inspection_key,
            self.browser.inject_interval,
        );
        Ok(tokio::spawn(async move {
            injector.run(stop).await;
            chrome.shutdown().await;
        }))
    }
}

struct ActiveSession {
    stop: watch::Sender<bool>,
    /// Awaits the runner's task, then bumps `ended`.
    task: JoinHandle<()>,
    runner_task: AbortHandle,
}

pub struct SessionController {
    runner: Arc<dyn SessionRunner>,
    active: Mutex<Option<ActiveSession>>,
    /// Count of sessions that have finished, for any reason.
    ended: Arc<watch::Sender<u64>>,
}

impl SessionController {
    pub fn new(runner: Arc<dyn SessionRunner>) -> Self {
        Self {
            runner,
            active: Mutex::new(None),
            ended: Arc::new(watch::channel(0).0),
        }
    }

    pub fn chrome(browser: BrowserSettings, interceptor: InterceptorSettings) -> Self {
        Self::new(Arc::new(ChromeSessionRunner::new(browser, interceptor)))
    }

    /// Start a session unless one is already live.
    pub async fn start(&self) -> Result<StartOutcome> {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|s| !s.task.is_finished()) {
            return Ok(StartOutcome::AlreadyRunning);
        }
        let (stop, stop_rx) = watch::channel(false);
        let runner_task = self.runner.launch(stop_rx).await?;
        let abort = runner_task.abort_handle();
        let ended = Arc::clone(&self.ended);
        let task = tokio::spawn(async move {
            if let Err(e) = runner_task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Session task failed");
                }
            }
            ended.send_modify(|count| *count += 1);
        });
        *active = Some(ActiveSession {
            stop,
            task,
            runner_task: abort,
        });
        info!("Browser session started");
        Ok(StartOutcome::Started)
    }

    /// Signal the session to end and wait for it to release the browser.
    pub async fn stop(&self) -> StopOutcome {
        let Some(session) = self.active.lock().await.take() else {
            return StopOutcome::NotRunning;
        };
        let _ = session.stop.send(true);
        let mut task = session.task;
        if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
            warn!("Session did not stop in time; aborting");
            session.runner_task.abort();
            let _ = task.await;
        }
        info!("Browser session stopped");
        StopOutcome::Stopped
    }

    /// Resolves when the current session ends, whether stopped or because
    /// the browser went away. Returns at once when nothing is running.
    pub async fn wait_ended(&self) {
        let mut ended = self.ended.subscribe();
        if !self.is_running().await {
            return;
        }
        let _ = ended.changed().await;
    }

    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }
}
