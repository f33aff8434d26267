//! Rescan-on-change wiring.
//!
//! Any child-list change anywhere in the document triggers a full rescan.
//! Nothing is debounced or filtered; duplicate work is absorbed by the hook
//! marker.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::dom::Dom;
use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type ChangeListener = Rc<dyn Fn()>;

/// A source of document-change notifications.
pub trait ChangeSource {
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process listener list, shared by the in-memory document and tests.
#[derive(Default)]
pub struct ListenerList {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, ChangeListener)>>,
}

impl ListenerList {
    pub fn add(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(sub, _)| *sub != id);
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener. Listeners may subscribe or unsubscribe while
    /// being notified.
    pub fn notify(&self) {
        let snapshot: Vec<ChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

/// Change source fired by hand.
#[derive(Default)]
pub struct ManualChangeSource {
    listeners: ListenerList,
}

impl ManualChangeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.listeners.notify();
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ChangeSource for ManualChangeSource {
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

/// Keeps a scanner subscribed to a change source.
pub struct ChangeWatcher {
    source: Rc<dyn ChangeSource>,
    subscription: SubscriptionId,
}

impl ChangeWatcher {
    pub fn watch<D: Dom>(source: Rc<dyn ChangeSource>, scanner: &Rc<Scanner<D>>) -> Self {
        let weak: Weak<Scanner<D>> = Rc::downgrade(scanner);
        let subscription = source.subscribe(Rc::new(move || {
            if let Some(scanner) = weak.upgrade() {
                scanner.scan();
            }
        }));
        Self { source, subscription }
    }

    /// Stop receiving notifications. The page engine never calls this.
    pub fn stop(self) {
        self.source.unsubscribe(self.subscription);
    }
}
