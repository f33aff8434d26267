//! The document capability the engine runs against.
//!
//! The engine never touches a browser API directly. Production binds this
//! trait to the live page; tests bind it to [`crate::memory::MemoryDom`].

use std::rc::Rc;

/// Callback invoked for a click, during the capture phase.
pub type ClickHandler = Rc<dyn Fn()>;

pub trait Dom: 'static {
    /// Handle to one element. Cloning a handle never clones the element.
    type Node: Clone + 'static;

    /// Every element matching `selector`, in document order. An invalid
    /// selector yields nothing.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    /// First descendant of `scope` matching `selector`.
    fn query_within(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Rendered text of the element, untrimmed.
    fn text(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Current value of a form control; `None` for anything else.
    fn value(&self, node: &Self::Node) -> Option<String>;

    /// Attach `handler` to `node` for clicks, in the capture phase.
    fn listen_click_capture(&self, node: &Self::Node, handler: ClickHandler);
}
