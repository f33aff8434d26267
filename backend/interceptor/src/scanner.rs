use std::rc::Rc;

use tracing::debug;

use crate::dom::Dom;
use crate::hooks::HookRegistry;
use crate::matcher::is_approve_label;

/// One pass over the document: find approval controls and hook them.
pub struct Scanner<D: Dom> {
    dom: Rc<D>,
    control_selector: String,
    registry: HookRegistry<D>,
}

impl<D: Dom> Scanner<D> {
    pub fn new(dom: Rc<D>, control_selector: impl Into<String>, registry: HookRegistry<D>) -> Self {
        Self {
            dom,
            control_selector: control_selector.into(),
            registry,
        }
    }

    /// Scan the current document. Returns the number of newly hooked controls.
    pub fn scan(&self) -> usize {
        let candidates = self.dom.query_all(&self.control_selector);
        let mut hooked = 0;
        for candidate in candidates {
            let label = self.dom.text(&candidate);
            if !is_approve_label(&label) {
                continue;
            }
            let target = self.resolve_target(&candidate);
            if self.registry.hook(&target, label.trim()) {
                hooked += 1;
            }
        }
        if hooked > 0 {
            debug!(hooked, "Scan hooked new controls");
        }
        hooked
    }

    /// The clickable wrapper enclosing `candidate`, or `candidate` itself
    /// when no ancestor belongs to the control selector set.
    pub fn resolve_target(&self, candidate: &D::Node) -> D::Node {
        self.dom
            .parent(candidate)
            .and_then(|parent| self.dom.closest(&parent, &self.control_selector))
            .unwrap_or_else(|| candidate.clone())
    }

    pub fn registry(&self) -> &HookRegistry<D> {
        &self.registry
    }
}
