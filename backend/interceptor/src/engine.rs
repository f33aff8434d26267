//! Engine assembly and the installation guard.

use std::cell::RefCell;
use std::rc::Rc;

use approvetap_core::{InterceptorSettings, OutboundMessage, Report};
use tracing::info;

use crate::dom::Dom;
use crate::extractor::Extractor;
use crate::hooks::HookRegistry;
use crate::scanner::Scanner;
use crate::transport::{ClipboardWriter, DeliveryObserver, Egress, Transport};
use crate::watcher::{ChangeSource, ChangeWatcher};

/// Receives every message stored in the last-event slot.
pub type InspectionHook = Rc<dyn Fn(&OutboundMessage)>;

/// Page capabilities the engine is installed against.
pub struct Capabilities<D: Dom> {
    pub dom: Rc<D>,
    pub changes: Rc<dyn ChangeSource>,
    pub egress: Rc<dyn Egress>,
    pub clipboard: Rc<dyn ClipboardWriter>,
    pub observer: Option<DeliveryObserver>,
    pub inspection: Option<InspectionHook>,
}

impl<D: Dom> Capabilities<D> {
    pub fn new(
        dom: Rc<D>,
        changes: Rc<dyn ChangeSource>,
        egress: Rc<dyn Egress>,
        clipboard: Rc<dyn ClipboardWriter>,
    ) -> Self {
        Self {
            dom,
            changes,
            egress,
            clipboard,
            observer: None,
            inspection: None,
        }
    }

    pub fn with_observer(mut self, observer: DeliveryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_inspection(mut self, inspection: InspectionHook) -> Self {
        self.inspection = Some(inspection);
        self
    }
}

/// What happens once an approval click has been detected.
struct ClickPipeline<D: Dom> {
    extractor: Extractor<D>,
    transport: Transport,
    last_event: RefCell<Option<OutboundMessage>>,
    inspection: Option<InspectionHook>,
}

impl<D: Dom> ClickPipeline<D> {
    fn handle(&self, label: &str) {
        let event = self.extractor.extract(label);
        let report = Report::from_event(&event);
        let message = OutboundMessage::approve_clicked(event);

        *self.last_event.borrow_mut() = Some(message.clone());
        if let Some(inspect) = &self.inspection {
            inspect(&message);
        }

        self.transport.send(&message);
        self.transport.copy(&report);
    }
}

/// An installed interception engine.
pub struct Engine<D: Dom> {
    scanner: Rc<Scanner<D>>,
    pipeline: Rc<ClickPipeline<D>>,
    _watcher: ChangeWatcher,
}

impl<D: Dom> Engine<D> {
    /// Wire every component, hook what is already on the page and start
    /// watching for changes.
    pub fn init(settings: InterceptorSettings, caps: Capabilities<D>) -> Rc<Self> {
        let pipeline = Rc::new(ClickPipeline {
            extractor: Extractor::new(Rc::clone(&caps.dom), settings.selectors.clone()),
            transport: Transport::new(
                settings.hook_url.clone(),
                caps.egress,
                caps.clipboard,
                caps.observer,
            ),
            last_event: RefCell::new(None),
            inspection: caps.inspection,
        });

        let weak = Rc::downgrade(&pipeline);
        let registry = HookRegistry::new(
            &caps.dom,
            settings.marker_attribute.clone(),
            Rc::new(move |label: &str| {
                if let Some(pipeline) = weak.upgrade() {
                    pipeline.handle(label);
                }
            }),
        );
        let scanner = Rc::new(Scanner::new(
            Rc::clone(&caps.dom),
            settings.selectors.approve_control.clone(),
            registry,
        ));

        let initial = scanner.scan();
        let watcher = ChangeWatcher::watch(caps.changes, &scanner);
        info!(hooked = initial, hook_url = %settings.hook_url, "Approval interceptor installed");

        Rc::new(Self {
            scanner,
            pipeline,
            _watcher: watcher,
        })
    }

    pub fn scan(&self) -> usize {
        self.scanner.scan()
    }

    /// The most recent outbound message, if any click happened.
    pub fn last_event(&self) -> Option<OutboundMessage> {
        self.pipeline.last_event.borrow().clone()
    }

    /// Listeners attached since installation.
    pub fn hooked_controls(&self) -> usize {
        self.scanner.registry().installed()
    }
}

/// Guards against installing the engine twice on one page.
pub struct Installer<D: Dom> {
    instance: Option<Rc<Engine<D>>>,
}

impl<D: Dom> Default for Installer<D> {
    fn default() -> Self {
        Self { instance: None }
    }
}

impl<D: Dom> Installer<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install on first call; afterwards only rescan the existing instance.
    /// `setup` is not invoked on re-entry.
    pub fn install_with<F>(&mut self, setup: F) -> Rc<Engine<D>>
    where
        F: FnOnce() -> (InterceptorSettings, Capabilities<D>),
    {
        if let Some(engine) = &self.instance {
            engine.scan();
            return Rc::clone(engine);
        }
        let (settings, caps) = setup();
        let engine = Engine::init(settings, caps);
        self.instance = Some(Rc::clone(&engine));
        engine
    }

    pub fn instance(&self) -> Option<&Rc<Engine<D>>> {
        self.instance.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{El, MemoryDom, NodeId, RecordingClipboard, RecordingEgress};
    use crate::transport::{DeliveryAttempt, DeliveryMethod};
    use std::cell::Cell;

    struct Page {
        dom: Rc<MemoryDom>,
        egress: Rc<RecordingEgress>,
        clipboard: Rc<RecordingClipboard>,
        attempts: Rc<RefCell<Vec<DeliveryAttempt>>>,
        inspected: Rc<Cell<usize>>,
    }

    impl Page {
        fn new() -> Self {
            Self {
                dom: Rc::new(MemoryDom::new()),
                egress: Rc::new(RecordingEgress::default()),
                clipboard: Rc::new(RecordingClipboard::default()),
                attempts: Rc::new(RefCell::new(Vec::new())),
                inspected: Rc::new(Cell::new(0)),
            }
        }

        fn setup(&self) -> (InterceptorSettings, Capabilities<MemoryDom>) {
            let attempts = Rc::clone(&self.attempts);
            let inspected = Rc::clone(&self.inspected);
            let caps = Capabilities::new(
                self.dom.clone(),
                self.dom.clone(),
                self.egress.clone(),
                self.clipboard.clone(),
            )
            .with_observer(Rc::new(move |a: &DeliveryAttempt| attempts.borrow_mut().push(a.clone())))
            .with_inspection(Rc::new(move |_: &OutboundMessage| inspected.set(inspected.get() + 1)));
            (InterceptorSettings::default(), caps)
        }

        fn build_console(&self) -> NodeId {
            let dom = &self.dom;
            let body = dom.body();
            let details = dom.append(body, El::new("div").class("approval-request-details"));
            for line in ["Req #123", "Jane Doe", "DEV-01"] {
                dom.append(details, El::new("p").text(line));
            }
            dom.append(body, El::new("button").class("Mui-selected").attr("aria-label", "This Computer"));
            dom.append(body, El::new("button").class("Mui-selected").attr("aria-label", "Elevate"));
            let slider = dom.append(body, El::new("div").class("expiration-slider"));
            dom.append(slider, El::new("span").class("MuiSlider-valueLabelLabel").text("30 minutes"));
            dom.append(body, El::new("span").class("computer-name").text("DEV-01 (online)"));
            let dropdown = dom.append(body, El::new("div").class("application-dropdown"));
            dom.append(dropdown, El::new("div").class("selected-value").attr("aria-label", "ORG-MyApp-Prod"));
            dom.append(body, El::new("button").text("Approve"))
        }
    }

    #[test]
    fn end_to_end_approval_report() {
        let page = Page::new();
        let approve = page.build_console();
        let mut installer = Installer::new();
        let engine = installer.install_with(|| page.setup());

        page.dom.click(approve);

        let expected = "Approved application request for MyApp on DEV-01 for DEV-01\n\
                        Used matching application: ORG-MyApp-Prod\n\
                        This Computer\n\
                        30 minutes\n\
                        Elevate";
        assert_eq!(page.clipboard.async_writes(), vec![expected.to_string()]);

        let last = engine.last_event().expect("last event stored");
        assert_eq!(last.event, "approve_clicked");
        assert_eq!(last.detail.text, "Approve");
        assert_eq!(last.detail.details, vec!["Req #123", "Jane Doe", "DEV-01"]);
        assert_eq!(page.inspected.get(), 1);

        let beacons = page.egress.beacons();
        assert_eq!(beacons.len(), 1);
        let sent: OutboundMessage = serde_json::from_str(&beacons[0].1).unwrap();
        assert_eq!(sent, last);
        assert_eq!(beacons[0].0, InterceptorSettings::default().hook_url);

        let methods: Vec<_> = page.attempts.borrow().iter().map(|a| a.method).collect();
        assert_eq!(methods, vec![DeliveryMethod::Beacon, DeliveryMethod::AsyncClipboard]);
    }

    #[test]
    fn missing_slider_reports_sentinel_expiration() {
        let page = Page::new();
        let approve = page.dom.append(page.dom.body(), El::new("button").text("Approve"));
        let _engine = Installer::new().install_with(|| page.setup());

        page.dom.click(approve);
        let report = page.clipboard.async_writes().pop().unwrap();
        assert_eq!(report.lines().nth(3), Some("N/A"));
    }

    #[test]
    fn reinstall_only_rescans() {
        let page = Page::new();
        let approve = page.dom.append(page.dom.body(), El::new("button").text("Approve"));
        let mut installer = Installer::new();
        let first = installer.install_with(|| page.setup());
        let setups = Cell::new(0);
        let second = installer.install_with(|| {
            setups.set(setups.get() + 1);
            page.setup()
        });

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(setups.get(), 0);
        assert_eq!(page.dom.capture_listener_count(approve), 1);

        page.dom.click(approve);
        assert_eq!(page.egress.beacons().len(), 1);
        assert_eq!(page.clipboard.async_writes().len(), 1);
    }

    #[test]
    fn controls_rendered_later_are_hooked() {
        let page = Page::new();
        let engine = Installer::new().install_with(|| page.setup());
        assert_eq!(engine.hooked_controls(), 0);

        let dialog = page.dom.append(page.dom.body(), El::new("div").class("dialog"));
        let approve = page.dom.append(dialog, El::new("button").text("Approve"));
        assert_eq!(engine.hooked_controls(), 1);

        page.dom.click(approve);
        assert!(engine.last_event().is_some());
    }

    #[test]
    fn capture_handler_sees_dom_before_host_handler_mutates_it() {
        let page = Page::new();
        let slider = page.dom.append(page.dom.body(), El::new("div").class("expiration-slider"));
        let value = page
            .dom
            .append(slider, El::new("span").class("MuiSlider-valueLabelLabel").text("1 hour"));
        let approve = page.dom.append(page.dom.body(), El::new("button").text("Approve"));
        let _engine = Installer::new().install_with(|| page.setup());

        let dom = Rc::downgrade(&page.dom);
        page.dom.on_host_click(
            approve,
            Rc::new(move || {
                if let Some(dom) = dom.upgrade() {
                    dom.remove(value);
                }
            }),
        );

        page.dom.click(approve);
        let report = page.clipboard.async_writes().pop().unwrap();
        assert_eq!(report.lines().nth(3), Some("1 hour"));
    }

    #[test]
    fn each_click_overwrites_last_event() {
        let page = Page::new();
        let approve = page.dom.append(page.dom.body(), El::new("button").text("Approve"));
        let engine = Installer::new().install_with(|| page.setup());

        page.dom.click(approve);
        let first = engine.last_event().unwrap();
        page.dom.set_text(approve, "Approved");
        page.dom.click(approve);
        let second = engine.last_event().unwrap();

        assert_eq!(first.detail.text, "Approve");
        assert_eq!(second.detail.text, "Approved");
        assert_eq!(page.inspected.get(), 2);
    }
}
