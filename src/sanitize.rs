//! Input sanitizer for pasted or uploaded SVG text.
//!
//! The import pipeline treats sanitizing as a collaborator behind the [`Sanitizer`]
//! trait: raw text in, cleaned text out. [`SvgSanitizer`] applies an SVG allowlist
//! profile:
//!
//! - scripting and embedding elements (`script`, `foreignObject`, `iframe`, animation
//!   elements that can rewrite links, …) are removed with their whole subtree;
//! - any other element outside the SVG allowlist is unwrapped: the tag goes, its
//!   children stay;
//! - event-handler attributes (`on*`), attributes from foreign namespaces, and link
//!   attributes pointing at `javascript:`, `vbscript:` or non-image `data:` URLs are
//!   dropped.
//!
//! Comments and processing instructions do not survive.

#[cfg(test)]
#[path = "sanitize_test.rs"]
mod sanitize_test;

use roxmltree::{Node, NodeType};

use crate::export::{escape_attr, escape_text};
use crate::import::ParseError;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Elements kept as-is.
const ALLOWED_ELEMENTS: &[&str] = &[
    "a", "circle", "clipPath", "defs", "desc", "ellipse", "feBlend", "feColorMatrix",
    "feComponentTransfer", "feComposite", "feConvolveMatrix", "feDiffuseLighting",
    "feDisplacementMap", "feDistantLight", "feDropShadow", "feFlood", "feFuncA", "feFuncB",
    "feFuncG", "feFuncR", "feGaussianBlur", "feImage", "feMerge", "feMergeNode", "feMorphology",
    "feOffset", "fePointLight", "feSpecularLighting", "feSpotLight", "feTile", "feTurbulence",
    "filter", "g", "image", "line", "linearGradient", "marker", "mask", "metadata", "path",
    "pattern", "polygon", "polyline", "radialGradient", "rect", "stop", "style", "svg", "switch",
    "symbol", "text", "textPath", "title", "tspan", "use", "view",
];

/// Elements removed together with everything inside them.
const FORBIDDEN_SUBTREES: &[&str] = &[
    "script", "foreignObject", "iframe", "object", "embed", "noscript", "template", "audio",
    "video", "canvas", "applet", "frame", "frameset", "link", "meta", "base", "handler",
    "listener", "animate", "animateColor", "animateMotion", "animateTransform", "set", "discard",
];

/// Attributes holding URLs that get scheme-checked.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction"];

/// Cleans raw markup before it is parsed into a tree.
pub trait Sanitizer {
    /// Return cleaned markup, or an error when the input cannot be read as markup at all.
    fn sanitize(&self, raw: &str) -> Result<String, ParseError>;
}

/// Allowlist sanitizer using the SVG profile described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgSanitizer;

impl Sanitizer for SvgSanitizer {
    fn sanitize(&self, raw: &str) -> Result<String, ParseError> {
        let doc = parse_document(raw)?;
        let mut out = String::with_capacity(raw.len());
        let mut removed = 0usize;
        write_element(doc.root_element(), true, &mut out, &mut removed);
        if removed > 0 {
            tracing::debug!(removed, "sanitizer stripped disallowed content");
        }
        Ok(out)
    }
}

/// Parse markup with the options shared by the sanitizer and the importer.
///
/// Internal DTDs are accepted (many editors emit a `DOCTYPE`); entity expansion limits
/// are enforced by the parser.
pub(crate) fn parse_document(text: &str) -> Result<roxmltree::Document<'_>, ParseError> {
    let options = roxmltree::ParsingOptions { allow_dtd: true, ..roxmltree::ParsingOptions::default() };
    roxmltree::Document::parse_with_options(text, options).map_err(|e| ParseError::Malformed(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Keep,
    Unwrap,
    Drop,
}

fn element_verdict(node: Node<'_, '_>) -> Verdict {
    let name = node.tag_name().name();
    if FORBIDDEN_SUBTREES.iter().any(|f| f.eq_ignore_ascii_case(name)) {
        return Verdict::Drop;
    }
    match node.tag_name().namespace() {
        None | Some(SVG_NS) if ALLOWED_ELEMENTS.contains(&name) => Verdict::Keep,
        _ => Verdict::Unwrap,
    }
}

fn write_node(node: Node<'_, '_>, out: &mut String, removed: &mut usize) {
    match node.node_type() {
        NodeType::Element => write_element(node, false, out, removed),
        NodeType::Text => {
            if let Some(text) = node.text() {
                out.push_str(&escape_text(text));
            }
        }
        NodeType::Root | NodeType::Comment | NodeType::PI => {}
    }
}

/// The document element is never unwrapped, only stripped of its attributes, so the
/// output always has exactly one root.
fn write_element(node: Node<'_, '_>, is_document_root: bool, out: &mut String, removed: &mut usize) {
    let verdict = element_verdict(node);
    if verdict == Verdict::Drop {
        *removed += 1;
        return;
    }
    if verdict == Verdict::Unwrap && !is_document_root {
        *removed += 1;
        for child in node.children() {
            write_node(child, out, removed);
        }
        return;
    }

    let name = node.tag_name().name();
    out.push('<');
    out.push_str(name);
    if verdict == Verdict::Keep {
        if name == "svg" {
            write_namespace_declarations(node, out);
        }
        write_attributes(node, out, removed);
    }
    out.push('>');
    for child in node.children() {
        write_node(child, out, removed);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_namespace_declarations(node: Node<'_, '_>, out: &mut String) {
    out.push_str(" xmlns=\"");
    out.push_str(SVG_NS);
    out.push('"');
    let uses_xlink = node
        .descendants()
        .any(|n| n.attributes().any(|a| a.namespace() == Some(XLINK_NS)));
    if uses_xlink {
        out.push_str(" xmlns:xlink=\"");
        out.push_str(XLINK_NS);
        out.push('"');
    }
}

fn write_attributes(node: Node<'_, '_>, out: &mut String, removed: &mut usize) {
    for attr in node.attributes() {
        let prefix = match attr.namespace() {
            None => "",
            Some(XLINK_NS) => "xlink:",
            Some(XML_NS) => "xml:",
            Some(_) => {
                *removed += 1;
                continue;
            }
        };
        let name = attr.name();
        if is_event_handler(name) || (is_url_attribute(name) && !is_safe_url(attr.value())) {
            *removed += 1;
            continue;
        }
        out.push(' ');
        out.push_str(prefix);
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(attr.value()));
        out.push('"');
    }
}

fn is_event_handler(name: &str) -> bool {
    name.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("on"))
}

fn is_url_attribute(name: &str) -> bool {
    URL_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(name))
}

/// Whether a URL value is safe to keep. Whitespace and control characters are ignored
/// when sniffing the scheme, as browsers do.
fn is_safe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(32)
        .collect::<String>()
        .to_ascii_lowercase();
    if normalized.starts_with("javascript:") || normalized.starts_with("vbscript:") {
        return false;
    }
    if normalized.starts_with("data:") {
        return normalized.starts_with("data:image/");
    }
    true
}
