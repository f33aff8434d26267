//! Live-page backend.
//!
//! Binds [`Dom`], [`ChangeSource`], [`Egress`] and [`ClipboardWriter`] to the
//! browser through `web-sys`, and exports `install` to the page. Only built
//! for `wasm32` with the `web` feature.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approvetap_core::{InterceptorSettings, OutboundMessage};
use js_sys::{Array, Function, Promise, Reflect, JSON};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, Headers, HtmlDocument, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    MutationObserver, MutationObserverInit, Node, RequestInit, RequestMode, Window,
};

use crate::dom::{ClickHandler, Dom};
use crate::engine::{Capabilities, Engine, Installer};
use crate::transport::{ClipboardWriter, Egress, TransportError};
use crate::watcher::{ChangeListener, ChangeSource, SubscriptionId};

thread_local! {
    static INSTALLER: RefCell<Installer<WebDom>> = RefCell::new(Installer::new());
}

fn js_failure(err: JsValue) -> TransportError {
    TransportError::Failed(
        err.as_string()
            .unwrap_or_else(|| format!("{err:?}")),
    )
}

pub struct WebDom {
    document: Document,
}

impl Dom for WebDom {
    type Node = Element;

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.get(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(_) => {
                debug!(selector, "Selector rejected by the page");
                Vec::new()
            }
        }
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    /// `innerText`, falling back to `textContent`.
    fn text(&self, node: &Element) -> String {
        let inner = node
            .dyn_ref::<HtmlElement>()
            .map(HtmlElement::inner_text)
            .unwrap_or_default();
        if inner.is_empty() {
            node.text_content().unwrap_or_default()
        } else {
            inner
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if node.set_attribute(name, value).is_err() {
            debug!(name, "Could not set attribute");
        }
    }

    fn value(&self, node: &Element) -> Option<String> {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        node.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
    }

    fn listen_click_capture(&self, node: &Element, handler: ClickHandler) {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| handler());
        if node
            .add_event_listener_with_callback_and_bool("click", closure.as_ref().unchecked_ref(), true)
            .is_err()
        {
            debug!("Could not attach click listener");
        }
        // Lives as long as the element; there is no teardown.
        closure.forget();
    }
}

type MutationCallback = Closure<dyn FnMut(Array, MutationObserver)>;

/// Child-list mutations of one subtree, through `MutationObserver`.
pub struct MutationSource {
    target: Node,
    next_id: Cell<u64>,
    observers: RefCell<Vec<(SubscriptionId, MutationObserver, MutationCallback)>>,
}

impl MutationSource {
    pub fn new(target: Node) -> Self {
        Self {
            target,
            next_id: Cell::new(0),
            observers: RefCell::new(Vec::new()),
        }
    }
}

impl ChangeSource for MutationSource {
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let callback: MutationCallback =
            Closure::new(move |_records: Array, _observer: MutationObserver| listener());
        let Ok(observer) = MutationObserver::new(callback.as_ref().unchecked_ref()) else {
            debug!("MutationObserver unavailable; controls rendered later will not be hooked");
            return id;
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if observer.observe_with_options(&self.target, &init).is_err() {
            debug!("MutationObserver refused the target");
        }
        self.observers.borrow_mut().push((id, observer, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.borrow_mut().retain(|(sub, observer, _)| {
            if *sub == id {
                observer.disconnect();
                false
            } else {
                true
            }
        });
    }
}

pub struct WebEgress {
    window: Window,
}

impl Egress for WebEgress {
    fn beacon(&self, url: &str, body: &str) -> Result<(), TransportError> {
        let navigator = self.window.navigator();
        if !Reflect::has(&navigator, &JsValue::from_str("sendBeacon")).unwrap_or(false) {
            return Err(TransportError::Unavailable("sendBeacon"));
        }
        navigator
            .send_beacon_with_opt_str(url, Some(body))
            .map(|_queued| ())
            .map_err(js_failure)
    }

    fn post(&self, url: &str, body: &str) -> Result<(), TransportError> {
        let headers = Headers::new().map_err(js_failure)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_failure)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::NoCors);
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(body));

        let pending = self.window.fetch_with_str_and_init(url, &init);
        spawn_local(async move {
            if JsFuture::from(pending).await.is_err() {
                debug!("Collector POST rejected");
            }
        });
        Ok(())
    }
}

pub struct WebClipboard {
    window: Window,
    document: Document,
}

impl ClipboardWriter for WebClipboard {
    fn write_async(&self, text: &str) -> Result<(), TransportError> {
        let navigator = self.window.navigator();
        let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard")).map_err(js_failure)?;
        if clipboard.is_undefined() || clipboard.is_null() {
            return Err(TransportError::Unavailable("navigator.clipboard"));
        }
        let write_text = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or(TransportError::Unavailable("navigator.clipboard.writeText"))?;
        let pending: Promise = write_text
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(js_failure)?
            .dyn_into()
            .map_err(|_| TransportError::Failed("writeText did not return a promise".into()))?;

        let document = self.document.clone();
        let text = text.to_string();
        spawn_local(async move {
            if JsFuture::from(pending).await.is_err() {
                if let Err(e) = copy_with_text_field(&document, &text) {
                    debug!(error = %e, "Clipboard fallback failed");
                }
            }
        });
        Ok(())
    }

    fn copy_legacy(&self, text: &str) -> Result<(), TransportError> {
        copy_with_text_field(&self.document, text)
    }
}

/// Off-screen read-only textarea + `execCommand("copy")`.
fn copy_with_text_field(document: &Document, text: &str) -> Result<(), TransportError> {
    let field: HtmlTextAreaElement = document
        .create_element("textarea")
        .map_err(js_failure)?
        .dyn_into()
        .map_err(|_| TransportError::Failed("textarea is not an HtmlTextAreaElement".into()))?;
    field.set_value(text);
    field.set_attribute("readonly", "").map_err(js_failure)?;
    let style = field.style();
    style.set_property("position", "absolute").map_err(js_failure)?;
    style.set_property("left", "-9999px").map_err(js_failure)?;

    let body = document
        .body()
        .ok_or(TransportError::Unavailable("document.body"))?;
    body.append_child(&field).map_err(js_failure)?;
    field.select();
    let copied = document
        .dyn_ref::<HtmlDocument>()
        .ok_or(TransportError::Unavailable("execCommand"))
        .and_then(|html| html.exec_command("copy").map_err(js_failure));
    field.remove();

    match copied? {
        true => Ok(()),
        false => Err(TransportError::Failed("execCommand('copy') returned false".into())),
    }
}

fn publish(window: &Window, key: &str, message: &OutboundMessage) {
    let Ok(json) = message.to_json() else {
        return;
    };
    match JSON::parse(&json) {
        Ok(value) => {
            if Reflect::set(window, &JsValue::from_str(key), &value).is_err() {
                debug!(key, "Could not publish last event");
            }
        }
        Err(_) => debug!("Last event is not valid JSON"),
    }
}

/// Handle to the installed engine, kept by the page.
#[wasm_bindgen]
pub struct Injector {
    engine: Rc<Engine<WebDom>>,
}

#[wasm_bindgen]
impl Injector {
    /// Rescan the page; returns the number of newly hooked controls.
    pub fn scan(&self) -> usize {
        self.engine.scan()
    }

    #[wasm_bindgen(js_name = lastEvent)]
    pub fn last_event(&self) -> JsValue {
        self.engine
            .last_event()
            .and_then(|m| m.to_json().ok())
            .and_then(|json| JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL)
    }
}

fn settings_from_js(raw: &JsValue) -> Result<InterceptorSettings, JsValue> {
    if raw.is_undefined() || raw.is_null() {
        return Ok(InterceptorSettings::default());
    }
    let json = JSON::stringify(raw)?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Install the interceptor on the current page, or rescan if it already is.
///
/// `settings` is an `InterceptorSettings` object; `undefined` uses defaults.
#[wasm_bindgen]
pub fn install(settings: JsValue) -> Result<Injector, JsValue> {
    let settings = settings_from_js(&settings)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let handle_key = settings.handle_key.clone();

    let engine = INSTALLER.with(|installer| {
        installer.borrow_mut().install_with(|| {
            let target: Node = match document.body() {
                Some(body) => body.into(),
                None => document.clone().into(),
            };
            let inspect_window = window.clone();
            let inspection_key = settings.inspection_key.clone();
            let caps = Capabilities::new(
                Rc::new(WebDom {
                    document: document.clone(),
                }),
                Rc::new(MutationSource::new(target)),
                Rc::new(WebEgress {
                    window: window.clone(),
                }),
                Rc::new(WebClipboard {
                    window: window.clone(),
                    document: document.clone(),
                }),
            )
            .with_inspection(Rc::new(move |message: &OutboundMessage| {
                publish(&inspect_window, &inspection_key, message)
            }));
            (settings, caps)
        })
    });

    let handle = JsValue::from(Injector {
        engine: Rc::clone(&engine),
    });
    Reflect::set(&window, &JsValue::from_str(&handle_key), &handle)?;
    Ok(Injector { engine })
}
