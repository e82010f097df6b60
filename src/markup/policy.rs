//! Sanitizer allow-list.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Key in [`SanitizePolicy::allowed_attributes`] that applies to every element.
pub const ANY_ELEMENT: &str = "*";

/// Elements removed unless `allow_vulnerable_tags` is set, even when listed.
pub const VULNERABLE_TAGS: &[&str] = &["script", "style"];

const DEFAULT_TAGS: &[&str] = &[
    "svg",
    "g",
    "defs",
    "use",
    "symbol",
    "path",
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "title",
    "desc",
    "linearGradient",
    "radialGradient",
    "stop",
    "clipPath",
    "mask",
    "filter",
    "animate",
    "animateTransform",
    "set",
];

const DEFAULT_ATTRIBUTES: &[&str] = &[
    // presentation & geometry
    "id",
    "class",
    "fill",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "fill-rule",
    "fill-opacity",
    "stroke-opacity",
    "opacity",
    "vector-effect",
    "x",
    "y",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "x1",
    "y1",
    "x2",
    "y2",
    "width",
    "height",
    "viewBox",
    "preserveAspectRatio",
    "d",
    "points",
];

const DEFAULT_URL_ATTRIBUTES: &[&str] = &["href", "xlink:href", "src"];

/// Allow-list rule table for the content sanitizer.
///
/// Element and attribute names are matched case-sensitively (XML mode).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizePolicy {
    /// Elements kept in the output. Everything else is dropped with its subtree.
    pub allowed_tags: BTreeSet<String>,

    /// Attributes kept per element name; [`ANY_ELEMENT`] applies everywhere.
    pub allowed_attributes: BTreeMap<String, BTreeSet<String>>,

    /// URL schemes permitted in [`url_attributes`](Self::url_attributes).
    pub allowed_schemes: BTreeSet<String>,

    /// Attributes whose values are URLs and get scheme-checked.
    pub url_attributes: BTreeSet<String>,

    /// Permit `//host/path` references.
    pub allow_protocol_relative: bool,

    /// Permit `script`/`style` when they appear in `allowed_tags`.
    pub allow_vulnerable_tags: bool,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        let mut allowed_attributes = BTreeMap::new();
        allowed_attributes.insert(ANY_ELEMENT.to_string(), to_set(DEFAULT_ATTRIBUTES));
        Self {
            allowed_tags: to_set(DEFAULT_TAGS),
            allowed_attributes,
            allowed_schemes: to_set(&["https"]),
            url_attributes: to_set(DEFAULT_URL_ATTRIBUTES),
            allow_protocol_relative: true,
            allow_vulnerable_tags: false,
        }
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl SanitizePolicy {
    pub fn allows_tag(&self, tag: &str) -> bool {
        if !self.allow_vulnerable_tags && VULNERABLE_TAGS.contains(&tag) {
            return false;
        }
        self.allowed_tags.contains(tag)
    }

    /// Whether `attr` may appear on `tag`, ignoring its value.
    pub fn allows_attribute(&self, tag: &str, attr: &str) -> bool {
        // Event handlers are never allowed, whatever the table says.
        if attr.len() > 2 && attr.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("on")) {
            return false;
        }
        [tag, ANY_ELEMENT].iter().any(|key| {
            self.allowed_attributes
                .get(*key)
                .is_some_and(|set| set.contains(attr))
        })
    }

    /// Whether a URL-valued attribute's value may be kept.
    pub fn allows_url(&self, value: &str) -> bool {
        let trimmed: String = value
            .chars()
            .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
            .collect();

        // Browsers read `\` as `/`, so `/\host` and `\\host` are
        // protocol-relative too.
        let lead = trimmed.as_bytes().get(..2);
        if lead.is_some_and(|l| l.iter().all(|b| matches!(b, b'/' | b'\\'))) {
            return self.allow_protocol_relative;
        }

        match scheme_of(&trimmed) {
            Some(scheme) => self.allowed_schemes.contains(&scheme.to_ascii_lowercase()),
            // Fragments and relative references carry no scheme.
            None => true,
        }
    }

    pub fn is_url_attribute(&self, attr: &str) -> bool {
        self.url_attributes.contains(attr)
    }
}

/// The scheme of `value` if it starts with `scheme:` before any `/`, `?` or `#`.
fn scheme_of(value: &str) -> Option<&str> {
    let end = value.find([':', '/', '?', '#'])?;
    if !value[end..].starts_with(':') || end == 0 {
        return None;
    }
    let scheme = &value[..end];
    let mut chars = scheme.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (first_ok && rest_ok).then_some(scheme)
}
