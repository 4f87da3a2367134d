use scene::hover::HoverChange;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::config::ElementIds;
use crate::error::ViewerError;

/// CSS transform placing the tooltip's top-left corner at a client coordinate.
pub fn translate_css(x_px: f64, y_px: f64) -> String {
    format!("translate({x_px}px, {y_px}px)")
}

pub fn display_css(visible: bool) -> &'static str {
    if visible { "block" } else { "none" }
}

/// The hover popup: a positioned container with label and value children.
#[derive(Debug, Clone)]
pub struct Tooltip {
    root: HtmlElement,
    label: Element,
    value: Element,
}

impl Tooltip {
    pub fn from_document(document: &Document, ids: &ElementIds) -> Result<Self, ViewerError> {
        let find = |id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| ViewerError::MissingElement(id.to_string()))
        };
        let root = find(ids.tooltip.as_str())?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ViewerError::MissingElement(ids.tooltip.clone()))?;
        Ok(Self {
            root,
            label: find(ids.label.as_str())?,
            value: find(ids.value.as_str())?,
        })
    }

    pub fn set_visible(&self, visible: bool) {
        self.set_style("display", display_css(visible));
    }

    pub fn move_to(&self, x_px: f64, y_px: f64) {
        self.set_style("transform", &translate_css(x_px, y_px));
    }

    pub fn set_content(&self, label: &str, value: &str) {
        self.label.set_text_content(Some(label));
        self.value.set_text_content(Some(value));
    }

    /// Only writes to the DOM when the hovered bar changed.
    pub fn apply(&self, change: &HoverChange) {
        match change {
            HoverChange::Unchanged => {}
            HoverChange::Entered { label, value, .. } => {
                self.set_content(label, value);
                self.set_visible(true);
            }
            HoverChange::Cleared => self.set_visible(false),
        }
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Err(err) = self.root.style().set_property(property, value) {
            tracing::warn!(property, ?err, "tooltip style update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{display_css, translate_css};

    #[test]
    fn tooltip_css_values() {
        assert_eq!(translate_css(12.5, 40.0), "translate(12.5px, 40px)");
        assert_eq!(display_css(true), "block");
        assert_eq!(display_css(false), "none");
    }
}
