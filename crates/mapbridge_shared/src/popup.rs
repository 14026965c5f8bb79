//! Popup presentation options.

use serde::{Deserialize, Serialize};

/// Popup configuration options. Unset fields keep the drawing library's default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    /// Maximum width in pixels.
    pub max_width: Option<u32>,
    /// Minimum width in pixels.
    pub min_width: Option<u32>,
    /// Maximum height in pixels; content scrolls beyond it.
    pub max_height: Option<u32>,
    /// Pan the map so the opened popup is visible.
    pub auto_pan: Option<bool>,
    /// Keep the popup in view while panning.
    pub keep_in_view: Option<bool>,
    /// Show a close button.
    pub close_button: Option<bool>,
    /// Close when another popup opens.
    pub auto_close: Option<bool>,
    /// Close on the escape key.
    pub close_on_escape_key: Option<bool>,
    /// Extra CSS class.
    pub class_name: Option<String>,
}

impl PopupOptions {
    /// Conventional sizing: 300px wide at most, closable, auto-panning.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            max_width: Some(300),
            min_width: Some(50),
            max_height: None,
            auto_pan: Some(true),
            keep_in_view: Some(false),
            close_button: Some(true),
            auto_close: Some(true),
            close_on_escape_key: Some(true),
            class_name: None,
        }
    }
}
