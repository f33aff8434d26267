//! In-memory page used to exercise the engine without a browser.
//!
//! [`MemoryDom`] keeps a small element tree, dispatches clicks with a
//! capture phase followed by a bubble phase, and reports child-list changes
//! as a [`ChangeSource`]. [`RecordingEgress`] and [`RecordingClipboard`]
//! stand in for the page's network and clipboard.

mod fakes;
mod selector;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::dom::{ClickHandler, Dom};
use crate::watcher::{ChangeListener, ChangeSource, ListenerList, SubscriptionId};

pub use fakes::{RecordingClipboard, RecordingEgress};
pub use selector::{SelectorError, SelectorList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Builder for an element to append.
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
}

impl El {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: &str) -> Self {
        let classes = self.attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    text: String,
    value: Option<String>,
    children: Vec<NodeId>,
}

impl ElementData {
    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }
}

pub struct MemoryDom {
    nodes: RefCell<Vec<ElementData>>,
    capture: RefCell<HashMap<NodeId, Vec<ClickHandler>>>,
    bubble: RefCell<HashMap<NodeId, Vec<ClickHandler>>>,
    changes: ListenerList,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// A document containing only `<body>`.
    pub fn new() -> Self {
        let body = ElementData {
            tag: "body".into(),
            attrs: BTreeMap::new(),
            parent: None,
            text: String::new(),
            value: None,
            children: Vec::new(),
        };
        Self {
            nodes: RefCell::new(vec![body]),
            capture: RefCell::new(HashMap::new()),
            bubble: RefCell::new(HashMap::new()),
            changes: ListenerList::default(),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append(&self, parent: NodeId, el: El) -> NodeId {
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            let id = NodeId(nodes.len());
            nodes.push(ElementData {
                tag: el.tag,
                attrs: el.attrs,
                parent: Some(parent),
                text: el.text,
                value: el.value,
                children: Vec::new(),
            });
            nodes[parent.0].children.push(id);
            id
        };
        self.changes.notify();
        id
    }

    /// Detach `node` and its subtree from the document.
    pub fn remove(&self, node: NodeId) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let Some(parent) = nodes[node.0].parent.take() else {
                return;
            };
            nodes[parent.0].children.retain(|c| *c != node);
        }
        self.changes.notify();
    }

    /// Replace the element's own text. Children are kept.
    pub fn set_text(&self, node: NodeId, text: &str) {
        self.nodes.borrow_mut()[node.0].text = text.to_string();
        self.changes.notify();
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.nodes.borrow_mut()[node.0].value = Some(value.to_string());
    }

    /// Register a page handler that runs in the bubble phase.
    pub fn on_host_click(&self, node: NodeId, handler: ClickHandler) {
        self.bubble.borrow_mut().entry(node).or_default().push(handler);
    }

    pub fn capture_listener_count(&self, node: NodeId) -> usize {
        self.capture.borrow().get(&node).map_or(0, Vec::len)
    }

    /// Dispatch a click: capture listeners from the body down to `node`,
    /// then bubble listeners from `node` back up.
    pub fn click(&self, node: NodeId) {
        let mut path = vec![node];
        {
            let nodes = self.nodes.borrow();
            let mut cursor = nodes[node.0].parent;
            while let Some(parent) = cursor {
                path.push(parent);
                cursor = nodes[parent.0].parent;
            }
        }

        for id in path.iter().rev() {
            let handlers = self.capture.borrow().get(id).cloned().unwrap_or_default();
            for handler in handlers {
                handler();
            }
        }
        for id in &path {
            let handlers = self.bubble.borrow().get(id).cloned().unwrap_or_default();
            for handler in handlers {
                handler();
            }
        }
    }

    fn connected_elements(&self) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack = vec![self.body()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id.0].children.iter().rev());
        }
        out
    }

    fn parse(selector: &str) -> Option<SelectorList> {
        match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(e) => {
                debug!(error = %e, "Ignoring selector");
                None
            }
        }
    }

    fn text_of(nodes: &[ElementData], node: NodeId) -> String {
        let mut out = nodes[node.0].text.clone();
        for child in &nodes[node.0].children {
            out.push_str(&Self::text_of(nodes, *child));
        }
        out
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(list) = Self::parse(selector) else {
            return Vec::new();
        };
        let candidates = self.connected_elements();
        let nodes = self.nodes.borrow();
        candidates
            .into_iter()
            .filter(|id| list.matches(*id, &nodes))
            .collect()
    }

    fn query_within(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        let list = Self::parse(selector)?;
        let nodes = self.nodes.borrow();
        let mut stack: Vec<NodeId> = nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if list.matches(id, &nodes) {
                return Some(id);
            }
            stack.extend(nodes[id.0].children.iter().rev());
        }
        None
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = Self::parse(selector)?;
        let nodes = self.nodes.borrow();
        let mut cursor = Some(*node);
        while let Some(id) = cursor {
            if list.matches(id, &nodes) {
                return Some(id);
            }
            cursor = nodes[id.0].parent;
        }
        None
    }

    fn text(&self, node: &NodeId) -> String {
        Self::text_of(&self.nodes.borrow(), *node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn value(&self, node: &NodeId) -> Option<String> {
        let nodes = self.nodes.borrow();
        let el = &nodes[node.0];
        el.is_form_control()
            .then(|| el.value.clone().unwrap_or_default())
    }

    fn listen_click_capture(&self, node: &NodeId, handler: ClickHandler) {
        self.capture.borrow_mut().entry(*node).or_default().push(handler);
    }
}

impl ChangeSource for MemoryDom {
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        self.changes.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.changes.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn queries_follow_document_order() {
        let dom = MemoryDom::new();
        let a = dom.append(dom.body(), El::new("div").class("box"));
        let b = dom.append(a, El::new("p").text("one"));
        let c = dom.append(dom.body(), El::new("p").text("two"));
        assert_eq!(dom.query_all("p"), vec![b, c]);
        assert_eq!(dom.query_all(".box p"), vec![b]);
        assert_eq!(dom.query_all(".box > p"), vec![b]);
        assert_eq!(dom.query_within(&a, "p"), Some(b));
        assert_eq!(dom.text(&a), "one");
    }

    #[test]
    fn removed_subtrees_disappear() {
        let dom = MemoryDom::new();
        let a = dom.append(dom.body(), El::new("div"));
        dom.append(a, El::new("button").text("x"));
        dom.remove(a);
        assert!(dom.query_all("button").is_empty());
    }

    #[test]
    fn attribute_selectors_and_closest() {
        let dom = MemoryDom::new();
        let wrap = dom.append(dom.body(), El::new("div").attr("role", "button").id("w"));
        let span = dom.append(wrap, El::new("span"));
        assert_eq!(dom.closest(&span, "[role='button']"), Some(wrap));
        assert_eq!(dom.closest(&span, "#w"), Some(wrap));
        assert_eq!(dom.closest(&span, "[role=link]"), None);
    }

    #[test]
    fn value_only_for_form_controls() {
        let dom = MemoryDom::new();
        let input = dom.append(dom.body(), El::new("input"));
        let div = dom.append(dom.body(), El::new("div").value("ignored"));
        assert_eq!(dom.value(&input).as_deref(), Some(""));
        dom.set_value(input, "typed");
        assert_eq!(dom.value(&input).as_deref(), Some("typed"));
        assert_eq!(dom.value(&div), None);
    }

    #[test]
    fn capture_runs_before_bubble() {
        let dom = MemoryDom::new();
        let button = dom.append(dom.body(), El::new("button"));
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        dom.on_host_click(button, Rc::new(move || o1.borrow_mut().push("host")));
        dom.listen_click_capture(&dom.body(), Rc::new(move || o2.borrow_mut().push("capture")));
        dom.click(button);
        assert_eq!(*order.borrow(), vec!["capture", "host"]);
    }

    #[test]
    fn child_list_changes_notify_subscribers() {
        let dom = MemoryDom::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = dom.subscribe(Rc::new(move || c.set(c.get() + 1)));
        let div = dom.append(dom.body(), El::new("div"));
        dom.set_attribute(&div, "data-x", "1");
        dom.remove(div);
        assert_eq!(count.get(), 2);
        dom.unsubscribe(id);
        dom.append(dom.body(), El::new("div"));
        assert_eq!(count.get(), 2);
    }
}
