// Accessbar injected stylesheets
// The host-document stylesheet backing the root classes and data attributes the effects set,
// the color-blindness SVG filters, and the widget's own shadow-root stylesheet.

use crate::dom::{Document, NodeId};
use crate::types::errors::DomError;

pub const DOCUMENT_STYLES_ID: &str = "a11y-document-styles";
pub const COLOR_FILTERS_ID: &str = "a11y-color-filters";

/// `(filter id, feColorMatrix values)` for each supported color-vision deficiency.
pub const COLOR_FILTERS: [(&str, &str); 3] = [
    (
        "protanopia-filter",
        "0.567, 0.433, 0, 0, 0  0.558, 0.442, 0, 0, 0  0, 0.242, 0.758, 0, 0  0, 0, 0, 1, 0",
    ),
    (
        "deuteranopia-filter",
        "0.625, 0.375, 0, 0, 0  0.7, 0.3, 0, 0, 0  0, 0.3, 0.7, 0, 0  0, 0, 0, 1, 0",
    ),
    (
        "tritanopia-filter",
        "0.95, 0.05, 0, 0, 0  0, 0.433, 0.567, 0, 0  0, 0.475, 0.525, 0, 0  0, 0, 0, 1, 0",
    ),
];

/// Font stacks behind `html[data-font-style]`.
const FONT_STACKS: [(&str, &str); 5] = [
    ("dyslexic", "'OpenDyslexic', 'Comic Sans MS', sans-serif"),
    ("readable", "'Atkinson Hyperlegible', Verdana, sans-serif"),
    ("serif", "Georgia, 'Times New Roman', serif"),
    ("sans", "Arial, Helvetica, sans-serif"),
    ("mono", "'Courier New', monospace"),
];

/// Global rules keyed on the root classes and attributes the effect engine toggles.
/// Every rule skips the widget host so the widget keeps its own look.
pub fn document_stylesheet(host_id: &str) -> String {
    let not_host = format!(":not(#{})", host_id);
    let mut css = String::new();

    for (style, stack) in FONT_STACKS {
        css.push_str(&format!(
            "html[data-font-style=\"{style}\"] body *{not_host} {{ font-family: {stack} !important; }}\n"
        ));
    }
    for (id, _) in COLOR_FILTERS {
        let name = id.trim_end_matches("-filter");
        css.push_str(&format!(
            "html[data-color-blind=\"{name}\"] body > *{not_host} {{ filter: url(#{id}); }}\n"
        ));
    }

    css.push_str(&format!(
        "\
html.high-contrast body > *{not_host} {{ filter: contrast(1.5); }}
html.grayscale-mode body > *{not_host} {{ filter: grayscale(100%); }}
html.invert-colors body > *{not_host} {{ filter: invert(100%) hue-rotate(180deg); }}
html.dark-mode body {{ background-color: #121212; }}
html.highlight-links a{not_host} {{ outline: 2px solid #f59e0b !important; background-color: #fef3c7 !important; }}
html.highlight-headings :is(h1, h2, h3, h4, h5, h6){not_host} {{ outline: 2px dashed #3b82f6 !important; }}
html.large-buttons :is(button, [role=\"button\"], input[type=\"submit\"]){not_host} {{ min-height: 44px; min-width: 44px; font-size: 1.125em; }}
html.keyboard-navigation *:focus{not_host} {{ outline: 3px solid #2563eb !important; outline-offset: 2px; }}
html.hide-images img, html.hide-images svg:not(#{COLOR_FILTERS_ID}) {{ visibility: hidden !important; }}
html.show-image-descriptions img[data-alt]{not_host} {{ outline: 2px solid #10b981; }}
html.plain-text-mode body *{not_host} {{ background-image: none !important; box-shadow: none !important; }}
html[data-plain-text-size=\"small\"].plain-text-mode body {{ font-size: 14px; }}
html[data-plain-text-size=\"medium\"].plain-text-mode body {{ font-size: 18px; }}
html[data-plain-text-size=\"large\"].plain-text-mode body {{ font-size: 22px; }}
html.pause-animations *, html.reduce-motion * {{ animation-play-state: paused !important; transition: none !important; }}
html.reduce-motion * {{ scroll-behavior: auto !important; }}
html.stop-videos video {{ visibility: hidden; }}
"
    ));
    css
}

/// Stylesheet injected only inside the shadow root.
pub const WIDGET_STYLESHEET: &str = "\
:host { all: initial; }
#a11y-react-root { font-family: system-ui, sans-serif; font-size: 16px; color: #111827; }
.a11y-launcher { width: 56px; height: 56px; border-radius: 9999px; border: none; background: #2563eb; color: #ffffff; cursor: pointer; }
.a11y-panel[hidden] { display: none; }
.magnifier-lens { background: #ffffff; border: 4px solid #3b82f6; display: flex; align-items: center; justify-content: center; overflow: hidden; font-size: 24px; font-weight: 700; }
";

/// Adds `<style id="a11y-document-styles">` to `<head>` unless present. Returns whether it was added.
pub fn inject_document_styles(doc: &mut Document, host_id: &str) -> Result<bool, DomError> {
    if doc.get_element_by_id(DOCUMENT_STYLES_ID).is_some() {
        return Ok(false);
    }
    let style = doc.create_element("style");
    doc.set_attribute(style, "id", DOCUMENT_STYLES_ID)?;
    doc.set_text_content(style, &document_stylesheet(host_id))?;
    doc.append_child(doc.head(), style)?;
    Ok(true)
}

/// Adds the hidden `<svg>` holding the three color filters to `<head>` unless present.
pub fn inject_color_filters(doc: &mut Document) -> Result<bool, DomError> {
    if doc.get_element_by_id(COLOR_FILTERS_ID).is_some() {
        return Ok(false);
    }
    let svg = doc.create_element("svg");
    doc.set_attribute(svg, "id", COLOR_FILTERS_ID)?;
    doc.set_attribute(svg, "width", "0")?;
    doc.set_attribute(svg, "height", "0")?;
    doc.set_style(svg, "position", "absolute", false)?;
    let defs = doc.create_element("defs");
    for (id, values) in COLOR_FILTERS {
        let filter = doc.create_element("filter");
        doc.set_attribute(filter, "id", id)?;
        let matrix = doc.create_element("feColorMatrix");
        doc.set_attribute(matrix, "type", "matrix")?;
        doc.set_attribute(matrix, "values", values)?;
        doc.append_child(filter, matrix)?;
        doc.append_child(defs, filter)?;
    }
    doc.append_child(svg, defs)?;
    doc.append_child(doc.head(), svg)?;
    Ok(true)
}

/// Appends the widget stylesheet to `shadow`.
pub fn inject_widget_styles(doc: &mut Document, shadow: NodeId) -> Result<NodeId, DomError> {
    let style = doc.create_element("style");
    doc.set_text_content(style, WIDGET_STYLESHEET)?;
    doc.append_child(shadow, style)?;
    Ok(style)
}
