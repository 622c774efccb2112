//! Presentation attributes vs. inline `style` declarations.
//!
//! SVG lets `fill`, `stroke` and friends live either as bare attributes or inside the
//! `style` attribute (`key: value; key: value`), and the `style` form wins when both are
//! present. Reads therefore check `style` first. Color writes go to both places so a
//! consumer that only looks at one of them still sees the same value; every other
//! property is written as a bare attribute only.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use crate::tree::Node;

/// Properties whose writes are mirrored into the `style` attribute.
pub const MIRRORED_PROPERTIES: [&str; 2] = ["fill", "stroke"];

/// Whether writes of `key` are mirrored into `style`.
#[must_use]
pub fn is_mirrored(key: &str) -> bool {
    MIRRORED_PROPERTIES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(key))
}

/// Split a `style` value into `(property, value)` pairs, in source order.
///
/// Empty declarations and declarations without a property name are skipped.
#[must_use]
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Join declarations back into `key: value; key: value` form.
#[must_use]
pub fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Value of `key` inside the node's `style` attribute. The last declaration wins.
#[must_use]
pub fn style_value(node: &Node, key: &str) -> Option<String> {
    let style = node.attr("style")?;
    parse_style(style)
        .into_iter()
        .rev()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// The value that actually renders: `style` first, then the bare attribute.
#[must_use]
pub fn get_effective(node: &Node, key: &str) -> Option<String> {
    style_value(node, key).or_else(|| {
        node.attr(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    })
}

/// Set or remove `key` inside the `style` attribute.
///
/// The first existing declaration is updated in place and later duplicates are
/// dropped. `None` removes every declaration of `key`; a `style` left with no
/// declarations is removed entirely.
pub fn set_style_property(node: &mut Node, key: &str, value: Option<&str>) {
    let mut decls = node.attr("style").map(parse_style).unwrap_or_default();
    let mut replaced = false;
    decls.retain_mut(|(k, v)| {
        if !k.eq_ignore_ascii_case(key) {
            return true;
        }
        match value {
            Some(new) if !replaced => {
                replaced = true;
                new.clone_into(v);
                true
            }
            _ => false,
        }
    });
    if let (Some(new), false) = (value, replaced) {
        decls.push((key.to_owned(), new.to_owned()));
    }

    if decls.is_empty() {
        node.remove_attr("style");
    } else {
        node.set_attr("style", &format_style(&decls));
    }
}

/// Write a presentation property.
///
/// Mirrored properties (see [`MIRRORED_PROPERTIES`]) are written into `style` and as a
/// bare attribute; anything else only as a bare attribute. An empty or absent value
/// removes the property instead of writing an empty string.
pub fn set_property(node: &mut Node, key: &str, value: Option<&str>) {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    if is_mirrored(key) {
        set_style_property(node, key, value);
    }
    match value {
        Some(v) => node.set_attr(key, v),
        None => {
            node.remove_attr(key);
        }
    }
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16);
    let parsed = match hex.len() {
        3 => (
            channel(&hex[0..1].repeat(2)),
            channel(&hex[1..2].repeat(2)),
            channel(&hex[2..3].repeat(2)),
        ),
        6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
        _ => return None,
    };
    match parsed {
        (Ok(r), Ok(g), Ok(b)) => Some((r, g, b)),
        _ => None,
    }
}
