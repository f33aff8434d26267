//! Click-time extraction of the approval context.
//!
//! Runs synchronously inside the capture-phase click handler, so it sees the
//! page as it was before the console reacts to the click. Every field is
//! resolved independently; a miss only affects that field.

use std::rc::Rc;

use approvetap_core::options::is_allowed;
use approvetap_core::{ApprovalEvent, SelectorTable, NOT_AVAILABLE};
use chrono::Utc;
use tracing::debug;

use crate::dom::Dom;

const ACCESSIBLE_LABEL: &str = "aria-label";

pub struct Extractor<D: Dom> {
    dom: Rc<D>,
    selectors: SelectorTable,
}

impl<D: Dom> Extractor<D> {
    pub fn new(dom: Rc<D>, selectors: SelectorTable) -> Self {
        Self { dom, selectors }
    }

    pub fn extract(&self, label: &str) -> ApprovalEvent {
        let (app_name, is_new_app) = self.application();
        ApprovalEvent {
            timestamp: Utc::now(),
            text: non_empty(label.trim()).unwrap_or_else(sentinel),
            details: self.detail_lines(),
            selected: self.highlighted_options(),
            expiration: self.expiration(),
            app_name,
            is_new_app,
            computer: self.computer(),
        }
    }

    fn detail_lines(&self) -> Vec<String> {
        self.dom
            .query_all(&self.selectors.detail_text)
            .iter()
            .filter_map(|node| non_empty(self.dom.text(node).trim()))
            .collect()
    }

    fn highlighted_options(&self) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();
        for node in self.dom.query_all(&self.selectors.highlighted_option) {
            let Some(label) = self.dom.attribute(&node, ACCESSIBLE_LABEL) else {
                continue;
            };
            let label = label.trim();
            if is_allowed(label) && !selected.iter().any(|s| s == label) {
                selected.push(label.to_string());
            }
        }
        selected
    }

    fn expiration(&self) -> String {
        self.dom
            .query(&self.selectors.slider_container)
            .and_then(|container| self.dom.query_within(&container, &self.selectors.slider_value))
            .and_then(|value| non_empty(self.dom.text(&value).trim()))
            .unwrap_or_else(|| {
                debug!("Expiration slider not found");
                sentinel()
            })
    }

    /// Typed new-application name wins over the dropdown selection.
    fn application(&self) -> (String, bool) {
        let typed = self
            .dom
            .query(&self.selectors.app_name_input)
            .and_then(|input| self.dom.value(&input))
            .and_then(|value| non_empty(value.trim()));
        if let Some(name) = typed {
            return (name, true);
        }

        let picked = self
            .dom
            .query(&self.selectors.app_dropdown_value)
            .and_then(|node| self.dom.attribute(&node, ACCESSIBLE_LABEL))
            .and_then(|label| non_empty(label.trim()));
        match picked {
            Some(name) => (name, false),
            None => {
                debug!("Application name not resolved");
                (sentinel(), false)
            }
        }
    }

    fn computer(&self) -> String {
        self.dom
            .query(&self.selectors.device_label)
            .and_then(|node| {
                self.dom
                    .text(&node)
                    .split_whitespace()
                    .next()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                debug!("Device label not found");
                sentinel()
            })
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn sentinel() -> String {
    NOT_AVAILABLE.to_string()
}
