//! SVG document parsing.
//!
//! Structural parsing only: the body is tokenized with `quick-xml`, nothing
//! embedded in it is ever evaluated.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IconError, IconResult};

/// A parsed `<svg>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSvg {
    /// Root element attributes, values unescaped.
    pub attributes: BTreeMap<String, String>,
    /// Raw markup between the root's start and end tags, trimmed.
    pub inner: String,
}

fn invalid(msg: impl std::fmt::Display) -> IconError {
    IconError::InvalidMarkup(msg.to_string())
}

/// Parse a response body that should hold exactly one `<svg>` root element.
pub fn parse_svg(body: &str) -> IconResult<ParsedSvg> {
    if body.trim().is_empty() {
        return Err(invalid("empty body"));
    }

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(false);

    let (attributes, self_closing) = loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(e) => break (root_attributes(&e)?, false),
            Event::Empty(e) => break (root_attributes(&e)?, true),
            Event::Text(t) => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(invalid("text before root element"));
                }
            }
            Event::Eof => return Err(invalid("no root element")),
            Event::End(_) | Event::CData(_) | Event::GeneralRef(_) => {
                return Err(invalid("content before root element"));
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    };

    let inner = if self_closing {
        String::new()
    } else {
        let start = position(&reader);
        let mut depth = 0usize;
        let end = loop {
            let before = position(&reader);
            match reader.read_event().map_err(invalid)? {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => break before,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(invalid("unclosed <svg> element")),
                _ => {}
            }
        };
        body.get(start..end)
            .ok_or_else(|| invalid("root element boundaries out of range"))?
            .trim()
            .to_string()
    };

    // A single root: only whitespace and markup declarations may follow.
    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Eof => break,
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            Event::Comment(_) | Event::PI(_) => {}
            _ => return Err(invalid("content after root element")),
        }
    }

    Ok(ParsedSvg { attributes, inner })
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn root_attributes(e: &BytesStart<'_>) -> IconResult<BTreeMap<String, String>> {
    if e.name().as_ref() != b"svg" {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        return Err(invalid(format!("root element is <{name}>, expected <svg>")));
    }

    let mut attributes = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(invalid)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(invalid)?;
        let raw = std::str::from_utf8(&attr.value).map_err(invalid)?;
        let value = quick_xml::escape::unescape(raw).map_err(invalid)?;
        attributes.insert(key.to_string(), value.into_owned());
    }
    Ok(attributes)
}
