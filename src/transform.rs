//! Codec for the `transform` attribute.
//!
//! The editor only produces `translate(x y)` and `rotate(angle)`, in that order. Parsing
//! looks at the first occurrence of each and ignores everything else; numbers that do not
//! parse become `0`. During a drag the existing string is kept verbatim as a prefix and a
//! fresh `translate(...)` is appended, so content this codec does not understand survives.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

/// A `translate(x y)` component.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translate {
    pub x: f64,
    pub y: f64,
}

impl Translate {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The parts of a transform string this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translate: Option<Translate>,
    /// Rotation in degrees.
    pub rotate: Option<f64>,
}

/// Extract the first `translate(...)` and first `rotate(...)`.
///
/// A single-argument translate moves along x only. Malformed numbers read as `0`.
#[must_use]
pub fn parse(transform: &str) -> Transform {
    let translate = function_args(transform, "translate").map(|args| {
        let mut nums = args.iter().map(|a| coerce(a));
        let x = nums.next().unwrap_or(0.0);
        let y = nums.next().unwrap_or(0.0);
        Translate { x, y }
    });
    let rotate = function_args(transform, "rotate").map(|args| args.first().map_or(0.0, |a| coerce(a)));
    Transform { translate, rotate }
}

/// Emit `translate(x y)` and/or `rotate(angle)`, space-joined.
///
/// Returns an empty string when both parts are absent; callers remove the attribute
/// rather than writing it empty.
#[must_use]
pub fn build(translate: Option<Translate>, rotate: Option<f64>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(t) = translate {
        parts.push(format!("translate({} {})", format_number(t.x), format_number(t.y)));
    }
    if let Some(angle) = rotate {
        parts.push(format!("rotate({})", format_number(angle)));
    }
    parts.join(" ")
}

/// Transform for a drag: the baseline captured at pointer-down, unparsed, followed by a
/// translate of `(dx, dy)` in document units.
///
/// Always computed from the fixed baseline, never from the previous frame's output, so
/// successive pointer moves do not compound.
#[must_use]
pub fn compose_drag(baseline: &str, dx: f64, dy: f64) -> String {
    let delta = build(Some(Translate::new(dx, dy)), None);
    let baseline = baseline.trim();
    if baseline.is_empty() {
        delta
    } else {
        format!("{baseline} {delta}")
    }
}

/// Rebuild `current` keeping its translate and replacing the rotation.
#[must_use]
pub fn with_rotation(current: &str, angle: f64) -> String {
    build(parse(current).translate, Some(angle))
}

/// Format with at most three decimals and no trailing zeros (`10`, `2.5`, `-0.333`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.abs() < f64::EPSILON {
        return "0".to_owned();
    }
    let text = format!("{rounded:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Arguments of the first `name(...)` call in `source`, split on commas and whitespace.
fn function_args(source: &str, name: &str) -> Option<Vec<String>> {
    let mut search_from = 0;
    while let Some(offset) = source[search_from..].find(name) {
        let start = search_from + offset;
        let after_name = start + name.len();
        search_from = after_name;

        // Reject matches inside a longer identifier (e.g. `xrotate(`).
        let preceded_by_ident = source[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if preceded_by_ident {
            continue;
        }

        let rest = source[after_name..].trim_start();
        let Some(body) = rest.strip_prefix('(') else {
            continue;
        };
        let Some(close) = body.find(')') else {
            return None;
        };
        let args = body[..close]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|a| !a.is_empty())
            .map(str::to_owned)
            .collect();
        return Some(args);
    }
    None
}

fn coerce(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
