//! Per-element hook installation.
//!
//! The marker attribute lives on the element itself, so it survives any
//! number of rescans and disappears together with the element.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::info;

use crate::dom::Dom;

/// Marker value written on hooked elements.
pub const HOOKED: &str = "1";

/// Receives the trimmed label of a clicked approval control.
pub type ApprovalHandler = Rc<dyn Fn(&str)>;

pub struct HookRegistry<D: Dom> {
    dom: Weak<D>,
    marker: String,
    on_approve: ApprovalHandler,
    installed: Cell<usize>,
}

impl<D: Dom> HookRegistry<D> {
    pub fn new(dom: &Rc<D>, marker: impl Into<String>, on_approve: ApprovalHandler) -> Self {
        Self {
            dom: Rc::downgrade(dom),
            marker: marker.into(),
            on_approve,
            installed: Cell::new(0),
        }
    }

    pub fn is_hooked(&self, target: &D::Node) -> bool {
        self.dom
            .upgrade()
            .and_then(|dom| dom.attribute(target, &self.marker))
            .as_deref()
            == Some(HOOKED)
    }

    /// Hook `target` unless it already carries the marker.
    ///
    /// Returns `true` when a listener was attached by this call.
    pub fn hook(&self, target: &D::Node, label: &str) -> bool {
        let Some(dom) = self.dom.upgrade() else {
            return false;
        };
        if dom.attribute(target, &self.marker).as_deref() == Some(HOOKED) {
            return false;
        }
        dom.set_attribute(target, &self.marker, HOOKED);

        let weak = Rc::downgrade(&dom);
        let node = target.clone();
        let fallback = label.to_string();
        let on_approve = Rc::clone(&self.on_approve);
        dom.listen_click_capture(
            target,
            Rc::new(move || {
                let current = weak
                    .upgrade()
                    .map(|dom| dom.text(&node).trim().to_string())
                    .unwrap_or_default();
                let label = if current.is_empty() { fallback.as_str() } else { current.as_str() };
                info!(label, "Approve click detected");
                on_approve(label);
            }),
        );

        self.installed.set(self.installed.get() + 1);
        info!(label, total = self.installed.get(), "Hooked approve control");
        true
    }

    /// Number of listeners this registry has attached.
    pub fn installed(&self) -> usize {
        self.installed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{El, MemoryDom};
    use std::cell::RefCell;

    fn registry(dom: &Rc<MemoryDom>) -> (HookRegistry<MemoryDom>, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let reg = HookRegistry::new(
            dom,
            "data-tl-hooked",
            Rc::new(move |label: &str| sink.borrow_mut().push(label.to_string())),
        );
        (reg, seen)
    }

    #[test]
    fn second_hook_is_a_no_op() {
        let dom = Rc::new(MemoryDom::new());
        let button = dom.append(dom.body(), El::new("button").text("Approve"));
        let (reg, seen) = registry(&dom);

        assert!(reg.hook(&button, "Approve"));
        assert!(!reg.hook(&button, "Approve"));
        assert_eq!(dom.capture_listener_count(button), 1);
        assert_eq!(dom.attribute(&button, "data-tl-hooked").as_deref(), Some("1"));

        dom.click(button);
        assert_eq!(*seen.borrow(), vec!["Approve".to_string()]);
    }

    #[test]
    fn label_is_read_at_click_time() {
        let dom = Rc::new(MemoryDom::new());
        let button = dom.append(dom.body(), El::new("button").text("Approve"));
        let (reg, seen) = registry(&dom);
        reg.hook(&button, "Approve");

        dom.set_text(button, "  Approve now ");
        dom.click(button);
        assert_eq!(*seen.borrow(), vec!["Approve now".to_string()]);
    }

    #[test]
    fn premarked_element_is_left_alone() {
        let dom = Rc::new(MemoryDom::new());
        let button = dom.append(
            dom.body(),
            El::new("button").text("Approve").attr("data-tl-hooked", "1"),
        );
        let (reg, _) = registry(&dom);
        assert!(!reg.hook(&button, "Approve"));
        assert!(reg.is_hooked(&button));
        assert_eq!(dom.capture_listener_count(button), 0);
        assert_eq!(reg.installed(), 0);
    }
}
