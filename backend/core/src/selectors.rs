//! Selector table and injection settings.
//!
//! The selectors are bound to the console's markup. They are kept as data so
//! a markup change on the host page is a configuration edit, not a rebuild.

use serde::{Deserialize, Serialize};

/// CSS selectors keyed by the logical role each one resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorTable {
    /// Structural set of clickable elements. Also used to resolve the
    /// clickable wrapper around a matched label.
    pub approve_control: String,
    /// Paragraphs describing the request.
    pub detail_text: String,
    /// Option buttons currently shown as selected. Their `aria-label` is read.
    pub highlighted_option: String,
    pub slider_container: String,
    /// Value label inside the slider container.
    pub slider_value: String,
    /// Free-text input used when approving into a new application.
    pub app_name_input: String,
    /// Selected-value element of the application dropdown. Its `aria-label` is read.
    pub app_dropdown_value: String,
    /// Element whose first word is the computer name.
    pub device_label: String,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            approve_control: "button, [role='button'], input[type='button'], input[type='submit'], .MuiButton-root".into(),
            detail_text: ".approval-request-details p".into(),
            highlighted_option: ".Mui-selected[aria-label], [aria-pressed='true'][aria-label]".into(),
            slider_container: ".expiration-slider".into(),
            slider_value: ".MuiSlider-valueLabelLabel".into(),
            app_name_input: "input[name='newApplicationName']".into(),
            app_dropdown_value: ".application-dropdown .selected-value".into(),
            device_label: ".computer-name".into(),
        }
    }
}

impl SelectorTable {
    /// `(role, selector)` pairs in a stable order, for validation and logging.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("approveControl", self.approve_control.as_str()),
            ("detailText", self.detail_text.as_str()),
            ("highlightedOption", self.highlighted_option.as_str()),
            ("sliderContainer", self.slider_container.as_str()),
            ("sliderValue", self.slider_value.as_str()),
            ("appNameInput", self.app_name_input.as_str()),
            ("appDropdownValue", self.app_dropdown_value.as_str()),
            ("deviceLabel", self.device_label.as_str()),
        ]
    }
}

/// Everything the in-page engine needs at installation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptorSettings {
    /// Collector endpoint receiving outbound messages.
    pub hook_url: String,
    /// Attribute marking an element as already hooked.
    pub marker_attribute: String,
    /// Page-global variable holding the latest outbound message.
    pub inspection_key: String,
    /// Page-global variable holding the installed engine handle.
    pub handle_key: String,
    pub selectors: SelectorTable,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            hook_url: "http://localhost:5000/hook".into(),
            marker_attribute: "data-tl-hooked".into(),
            inspection_key: "__tl_last_event".into(),
            handle_key: "__tl_injector__".into(),
            selectors: SelectorTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let table: SelectorTable =
            serde_json::from_str(r##"{"deviceLabel": "#device"}"##).unwrap();
        assert_eq!(table.device_label, "#device");
        assert_eq!(table.slider_container, SelectorTable::default().slider_container);
    }

    #[test]
    fn entries_cover_every_role() {
        let table = SelectorTable::default();
        assert!(table.entries().iter().all(|(_, sel)| !sel.trim().is_empty()));
    }
}
