//! Allow-list sanitizer for fetched SVG markup.
//!
//! # Responsibilities
//! - Drop elements outside the allow-list together with their subtree
//! - Drop attributes outside the allow-list, event handlers, and URL
//!   attributes with a forbidden scheme
//! - Drop comments, processing instructions, doctypes and unknown entities
//! - Re-serialize what is left in one canonical form
//!
//! # Design Decisions
//! - Canonical output (escaped text and attribute values, empty elements stay
//!   self-closing) makes `sanitize(sanitize(x)) == sanitize(x)`
//! - Attribute values are unescaped for checking and re-escaped for output;
//!   they are never interpreted beyond the scheme check
//! - Empty output from non-empty input is an error: it usually means the whole
//!   payload was disallowed

use std::collections::BTreeMap;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IconError, IconResult};
use crate::markup::policy::SanitizePolicy;

fn failed(msg: impl std::fmt::Display) -> IconError {
    IconError::SanitizationFailed(msg.to_string())
}

/// Filter `markup` through `policy`.
pub fn sanitize(markup: &str, policy: &SanitizePolicy) -> IconResult<String> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);

    let mut out = String::with_capacity(markup.len());
    // Depth inside a dropped element; 0 means we are emitting.
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event().map_err(failed)? {
            Event::Start(e) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                let tag = tag_name(&e)?;
                if policy.allows_tag(tag) {
                    write_start(&mut out, tag, &e, policy, false);
                } else {
                    tracing::debug!(tag = %tag, "Dropping disallowed element");
                    skip_depth = 1;
                }
            }
            Event::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                let tag = std::str::from_utf8(e.name().into_inner()).map_err(failed)?;
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Event::Empty(e) => {
                if skip_depth > 0 {
                    continue;
                }
                let tag = tag_name(&e)?;
                if policy.allows_tag(tag) {
                    write_start(&mut out, tag, &e, policy, true);
                } else {
                    tracing::debug!(tag = %tag, "Dropping disallowed element");
                }
            }
            Event::Text(e) => {
                if skip_depth > 0 {
                    continue;
                }
                let raw = e.decode().map_err(failed)?;
                // Text holding an unknown entity is dropped rather than guessed at.
                if let Ok(text) = unescape(&raw) {
                    out.push_str(&escape(text.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if skip_depth > 0 {
                    continue;
                }
                let name = e.decode().map_err(failed)?;
                if let Ok(resolved) = unescape(&format!("&{name};")) {
                    out.push_str(&escape(resolved.as_ref()));
                }
            }
            Event::CData(e) => {
                if skip_depth > 0 {
                    continue;
                }
                let text = reader.decoder().decode(&e).map_err(failed)?;
                out.push_str(&escape(text.as_ref()));
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if out.trim().is_empty() && !markup.trim().is_empty() {
        return Err(failed("nothing left after sanitization"));
    }
    Ok(out)
}

fn tag_name<'a>(e: &'a BytesStart<'_>) -> IconResult<&'a str> {
    std::str::from_utf8(e.name().into_inner()).map_err(failed)
}

fn write_start(
    out: &mut String,
    tag: &str,
    e: &BytesStart<'_>,
    policy: &SanitizePolicy,
    self_closing: bool,
) {
    out.push('<');
    out.push_str(tag);

    // Malformed or duplicate attributes are skipped, not fatal.
    for attr in e.attributes().flatten() {
        let Ok(key) = std::str::from_utf8(attr.key.as_ref()) else {
            continue;
        };
        if !policy.allows_attribute(tag, key) {
            continue;
        }
        let Ok(raw) = std::str::from_utf8(&attr.value) else {
            continue;
        };
        let Ok(value) = unescape(raw) else {
            continue;
        };
        if policy.is_url_attribute(key) && !policy.allows_url(&value) {
            tracing::debug!(tag = %tag, attribute = %key, "Dropping URL with forbidden scheme");
            continue;
        }
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_ref()));
        out.push('"');
    }

    out.push_str(if self_closing { "/>" } else { ">" });
}

/// Root attributes that are never carried over from fetched markup while
/// sanitization is on: event handlers, inline style and links.
pub fn filter_root_attributes(attributes: BTreeMap<String, String>) -> BTreeMap<String, String> {
    attributes
        .into_iter()
        .filter(|(name, _)| {
            let lower = name.to_ascii_lowercase();
            !lower.starts_with("on") && lower != "style" && lower != "href" && lower != "xlink:href"
        })
        .collect()
}
