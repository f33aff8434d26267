//! Periodic injection of the interceptor bundle and polling of the page's
//! last-event slot.
//!
//! The bundle is evaluated inside an async function that has `settings` (the
//! serialized `InterceptorSettings`) in scope, and must install the
//! interceptor with them. When the page already carries the installation
//! handle the bundle is skipped and the handle only rescans. See
//! [`crate::bundle`] for how the bundle is produced.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use approvetap_core::InterceptorSettings;
use approvetap_logging::{ApprovalLogger, MessageSource};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bundle::EngineBundle;
use crate::error::CdpError;
use crate::page_control::PageEvaluator;

#[derive(Debug, Clone)]
pub struct InjectionScript {
    expression: String,
}

impl InjectionScript {
    pub fn new(bundle: &str, settings: &InterceptorSettings) -> Result<Self, serde_json::Error> {
        let settings_json = serde_json::to_string(settings)?;
        let handle_key = serde_json::to_string(&settings.handle_key)?;
        let expression = format!(
            r#"(async () => {{
  const settings = {settings_json};
  const handle = window[{handle_key}];
  if (handle && typeof handle.scan === "function") {{
    handle.scan();
    return "rescanned";
  }}
{bundle}
  return "installed";
}})()"#
        );
        Ok(Self { expression })
    }

    /// `path` is either a bundle written by [`EngineBundle::write`] or the
    /// `wasm-bindgen` output directory it is built from.
    pub async fn load(path: &Path, settings: &InterceptorSettings) -> Result<Self> {
        let bundle = if path.is_dir() {
            EngineBundle::load(path).await?.script()
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read inject script: {}", path.display()))?
        };
        Ok(Self::new(&bundle, settings)?)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// Expression reading the page-global last-event slot.
pub fn inspection_expression(key: &str) -> String {
    let key = serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string());
    format!("window[{key}] || null")
}

/// Suppresses messages already reported, by `ts`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastEventTracker {
    last_ts: i64,
}

impl LastEventTracker {
    /// `true` if `event` is an object whose `ts` is strictly newer than
    /// anything seen before. A missing `ts` counts as 0.
    pub fn observe(&mut self, event: &Value) -> bool {
        if !event.is_object() {
            return false;
        }
        let ts = match event.get("ts") {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
            _ => 0,
        };
        if ts > self.last_ts {
            self.last_ts = ts;
            true
        } else {
            false
        }
    }

    pub fn last_ts(&self) -> i64 {
        self.last_ts
    }
}

pub struct Injector<P: PageEvaluator> {
    page: P,
    script: InjectionScript,
    inspection: String,
    tracker: LastEventTracker,
    interval: Duration,
}

impl<P: PageEvaluator> Injector<P> {
    pub fn new(page: P, script: InjectionScript, inspection_key: &str, interval: Duration) -> Self {
        Self {
            page,
            script,
            inspection: inspection_expression(inspection_key),
            tracker: LastEventTracker::default(),
            interval,
        }
    }

    /// Inject once and read the slot. Returns the message if it is new.
    pub async fn tick(&mut self) -> Result<Option<Value>, CdpError> {
        let state = self.page.evaluate(self.script.expression()).await?;
        debug!(%state, "Injection evaluated");
        let event = self.page.evaluate(&self.inspection).await?;
        Ok(self.tracker.observe(&event).then_some(event))
    }

    /// Tick every interval until `stop` turns true or the page goes away.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Injector loop started");
        loop {
            if *stop.borrow() {
                break;
            }
            match self.tick().await {
                Ok(Some(event)) => {
                    ApprovalLogger::log_message(MessageSource::Injector, &event);
                }
                Ok(None) => {}
                Err(CdpError::Closed) => {
                    warn!("Browser connection lost");
                    break;
                }
                Err(e) => warn!(error = %e, "Injection tick failed"),
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!(last_ts = self.tracker.last_ts(), "Injector loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Answers injection with "installed" and inspection from a queue.
    #[derive(Clone, Default)]
    struct FakePage {
        slots: Arc<Mutex<VecDeque<Result<Value, String>>>>,
        evaluated: Arc<Mutex<Vec<String>>>,
        closed: bool,
    }

    impl FakePage {
        fn with_slots(slots: Vec<Value>) -> Self {
            Self {
                slots: Arc::new(Mutex::new(slots.into_iter().map(Ok).collect())),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PageEvaluator for FakePage {
        async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
            if self.closed {
                return Err(CdpError::Closed);
            }
            self.evaluated.lock().unwrap().push(expression.to_string());
            if expression.starts_with("(async") {
                return Ok(json!("installed"));
            }
            match self.slots.lock().unwrap().pop_front() {
                Some(Ok(v)) => Ok(v),
                Some(Err(e)) => Err(CdpError::Script(e)),
                None => Ok(Value::Null),
            }
        }
    }

    fn script() -> InjectionScript {
        InjectionScript::new("  globalThis.installed = settings;", &InterceptorSettings::default()).unwrap()
    }

    #[test]
    fn expression_embeds_settings_and_guard() {
        let expr = script().expression().to_string();
        assert!(expr.contains(r#"window["__tl_injector__"]"#));
        assert!(expr.contains(r#""hookUrl":"http://localhost:5000/hook""#));
        assert!(expr.contains("globalThis.installed = settings;"));
        assert!(expr.find("handle.scan()") < expr.find("globalThis.installed"));
    }

    #[test]
    fn inspection_reads_configured_key() {
        assert_eq!(inspection_expression("__tl_last_event"), r#"window["__tl_last_event"] || null"#);
    }

    #[test]
    fn tracker_reports_strictly_newer_only() {
        let mut tracker = LastEventTracker::default();
        assert!(!tracker.observe(&Value::Null));
        assert!(!tracker.observe(&json!({"event": "approve_clicked"})));
        assert!(tracker.observe(&json!({"ts": 10})));
        assert!(!tracker.observe(&json!({"ts": 10})));
        assert!(!tracker.observe(&json!({"ts": 9})));
        assert!(tracker.observe(&json!({"ts": 11.7})));
        assert_eq!(tracker.last_ts(), 11);
    }

    #[tokio::test]
    async fn tick_reports_each_message_once() {
        let event = json!({"event": "approve_clicked", "detail": {"details": ["a"]}, "ts": 100});
        let page = FakePage::with_slots(vec![Value::Null, event.clone(), event.clone()]);
        let mut injector = Injector::new(page.clone(), script(), "__tl_last_event", Duration::from_millis(1));

        assert_eq!(injector.tick().await.unwrap(), None);
        assert_eq!(injector.tick().await.unwrap(), Some(event));
        assert_eq!(injector.tick().await.unwrap(), None);
        // Inject + inspect on every tick.
        assert_eq!(page.evaluated.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_loop() {
        let page = FakePage::default();
        page.slots.lock().unwrap().push_back(Err("boom".into()));
        page.slots.lock().unwrap().push_back(Ok(json!({"ts": 1})));
        let injector = Injector::new(page.clone(), script(), "k", Duration::from_millis(5));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(injector.run(rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(page.evaluated.lock().unwrap().len() >= 4);
    }

    #[tokio::test]
    async fn loop_ends_when_page_is_gone() {
        let page = FakePage {
            closed: true,
            ..FakePage::default()
        };
        let injector = Injector::new(page, script(), "k", Duration::from_secs(60));
        let (_tx, rx) = watch::channel(false);
        tokio::time::timeout(Duration::from_secs(1), injector.run(rx)).await.unwrap();
    }

    #[tokio::test]
    async fn expression_from_pkg_dir_installs_with_settings() {
        let dir = tempfile::tempdir().unwrap();
        crate::bundle::tests::write_pkg(dir.path());
        let script = InjectionScript::load(dir.path(), &InterceptorSettings::default())
            .await
            .unwrap();
        let expr = script.expression();
        let settings = expr.find("const settings = {").unwrap();
        let guard = expr.find("return \"rescanned\";").unwrap();
        let install = expr.find("wasm_bindgen.install(settings);").unwrap();
        assert!(settings < guard && guard < install);
        assert!(expr.contains("\"hookUrl\":\"http://localhost:5000/hook\""));
    }
}
