//! Import pipeline: raw text → sanitizer → XML parse → document tree.
//!
//! The first element whose local name is `svg` becomes the root. Everything outside it
//! is ignored. Each element becomes a [`Node`] carrying all of its attributes (namespace
//! declarations are materialised as `xmlns`/`xmlns:p` attributes so they survive
//! serialization); each non-blank text child becomes a text leaf holding the trimmed
//! text. Comments and processing instructions are dropped.

#[cfg(test)]
#[path = "import_test.rs"]
mod import_test;

use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use crate::consts::{ID_ATTR, SVG_MIME, SVG_TAG};
use crate::error::ErrorCode;
use crate::sanitize::{Sanitizer, XML_NS, parse_document};
use crate::tree::{IdGen, Node, NodeId, NodeRef};

const NO_SVG_MESSAGE: &str = "no svg tag found";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{NO_SVG_MESSAGE}")]
    NoSvgRoot,
    #[error("malformed markup: {0}")]
    Malformed(String),
    #[error("unsupported file '{name}' ({mime}); expected an .svg file")]
    UnsupportedFile { name: String, mime: String },
    #[error("file is not valid UTF-8")]
    InvalidEncoding,
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSvgRoot => "E_NO_SVG_ROOT",
            Self::Malformed(_) => "E_MALFORMED",
            Self::UnsupportedFile { .. } => "E_UNSUPPORTED_FILE",
            Self::InvalidEncoding => "E_INVALID_ENCODING",
        }
    }

    /// Unreadable markup has no locatable root either, so both read the same to users.
    fn user_message(&self) -> String {
        match self {
            Self::NoSvgRoot | Self::Malformed(_) => NO_SVG_MESSAGE.to_owned(),
            Self::UnsupportedFile { .. } | Self::InvalidEncoding => self.to_string(),
        }
    }
}

/// Sanitize and parse `raw` into a fresh tree. Synthetic ids come from `ids`.
///
/// # Errors
///
/// [`ParseError::Malformed`] when the text is not well-formed markup, and
/// [`ParseError::NoSvgRoot`] when no `svg` element survives sanitizing.
pub fn import_tree(raw: &str, sanitizer: &dyn Sanitizer, ids: &mut IdGen) -> Result<NodeRef, ParseError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let cleaned = sanitizer.sanitize(raw)?;
    let doc = parse_document(&cleaned)?;
    let svg = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == SVG_TAG)
        .ok_or(ParseError::NoSvgRoot)?;
    let mut taken = HashSet::new();
    Ok(Rc::new(build_node(svg, true, ids, &mut taken)))
}

/// Decode an uploaded file into text, checking its type first.
///
/// # Errors
///
/// [`ParseError::UnsupportedFile`] unless the MIME type is `image/svg+xml` or the name
/// ends in `.svg`; [`ParseError::InvalidEncoding`] when the bytes are not UTF-8.
pub fn decode_file(name: &str, mime: &str, bytes: &[u8]) -> Result<String, ParseError> {
    if !is_svg_file(name, mime) {
        return Err(ParseError::UnsupportedFile { name: name.to_owned(), mime: mime.to_owned() });
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidEncoding)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_owned())
}

/// Whether an upload looks like SVG by MIME type (parameters ignored) or extension.
#[must_use]
pub fn is_svg_file(name: &str, mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(SVG_MIME)
        || Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn build_node(el: roxmltree::Node<'_, '_>, is_root: bool, ids: &mut IdGen, taken: &mut HashSet<NodeId>) -> Node {
    let id = match el.attribute("id").map(str::trim) {
        Some(existing) if !existing.is_empty() && !taken.contains(existing) => existing.to_owned(),
        _ => ids.fresh(taken),
    };
    taken.insert(id.clone());

    let mut node = Node::element(id, qualified_tag(el));
    for (key, value) in namespace_declarations(el, is_root) {
        node.set_attr(&key, &value);
    }
    for attr in el.attributes() {
        let key = qualified_attr(el, attr.namespace(), attr.name());
        if key != ID_ATTR {
            node.set_attr(&key, attr.value());
        }
    }

    for child in el.children() {
        if child.is_element() {
            node.children.push(Rc::new(build_node(child, false, ids, taken)));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            let leaf_id = ids.fresh(taken);
            taken.insert(leaf_id.clone());
            node.children.push(Rc::new(Node::text_leaf(leaf_id, text)));
        }
    }
    node
}

/// Namespace declarations to write on `el`: everything in scope on the root, only new
/// or rebound prefixes below it.
fn namespace_declarations(el: roxmltree::Node<'_, '_>, is_root: bool) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = if is_root {
        Vec::new()
    } else {
        el.parent_element()
            .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default()
    };
    el.namespaces()
        .filter(|ns| ns.uri() != XML_NS)
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| match ns.name() {
            Some(prefix) => (format!("xmlns:{prefix}"), ns.uri().to_owned()),
            None => ("xmlns".to_owned(), ns.uri().to_owned()),
        })
        .collect()
}

fn qualified_tag(el: roxmltree::Node<'_, '_>) -> String {
    let name = el.tag_name().name();
    match el.tag_name().namespace().and_then(|uri| el.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_owned(),
    }
}

fn qualified_attr(el: roxmltree::Node<'_, '_>, namespace: Option<&str>, name: &str) -> String {
    match namespace {
        None => name.to_owned(),
        Some(XML_NS) => format!("xml:{name}"),
        Some(uri) => match el.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
            _ => name.to_owned(),
        },
    }
}
