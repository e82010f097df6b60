//! Icon request and result types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IconError, IconResult};

/// Identifier substituted for anything that is not `collection:name`.
pub const FALLBACK_ICON: &str = "material-symbols:error";

static ICON_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+:[a-z0-9-]+$").expect("valid icon id pattern"));

/// A validated `collection:name` icon identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconId {
    collection: String,
    name: String,
}

impl IconId {
    /// Validate `raw`, returning `None` when it is not `collection:name`.
    pub fn parse(raw: &str) -> Option<Self> {
        if !ICON_ID_PATTERN.is_match(raw) {
            return None;
        }
        let (collection, name) = raw.split_once(':')?;
        Some(Self {
            collection: collection.to_string(),
            name: name.to_string(),
        })
    }

    /// Validate `raw`, substituting [`FALLBACK_ICON`] for malformed input.
    pub fn parse_or_fallback(raw: &str) -> Self {
        match Self::parse(raw) {
            Some(id) => id,
            None => {
                tracing::debug!(icon = %raw, fallback = FALLBACK_ICON, "Malformed icon identifier");
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        Self {
            collection: "material-symbols".to_string(),
            name: "error".to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flip {
    #[serde(rename = "horizontal")]
    Horizontal,
    #[serde(rename = "vertical")]
    Vertical,
    #[serde(rename = "horizontal,vertical")]
    Both,
}

impl fmt::Display for Flip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flip::Horizontal => "horizontal",
            Flip::Vertical => "vertical",
            Flip::Both => "horizontal,vertical",
        })
    }
}

impl FromStr for Flip {
    type Err = IconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Flip::Horizontal),
            "vertical" => Ok(Flip::Vertical),
            "horizontal,vertical" | "vertical,horizontal" => Ok(Flip::Both),
            other => Err(IconError::InvalidParameter(format!("flip: unknown value '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotate {
    #[serde(rename = "90deg")]
    Deg90,
    #[serde(rename = "180deg")]
    Deg180,
    #[serde(rename = "270deg")]
    Deg270,
}

impl fmt::Display for Rotate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rotate::Deg90 => "90deg",
            Rotate::Deg180 => "180deg",
            Rotate::Deg270 => "270deg",
        })
    }
}

impl FromStr for Rotate {
    type Err = IconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "90deg" | "1" => Ok(Rotate::Deg90),
            "180deg" | "2" => Ok(Rotate::Deg180),
            "270deg" | "3" => Ok(Rotate::Deg270),
            other => Err(IconError::InvalidParameter(format!("rotate: unknown value '{other}'"))),
        }
    }
}

/// Requested icon size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSize {
    Auto,
    Unset,
    None,
    Pixels(u32),
}

impl fmt::Display for IconSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconSize::Auto => f.write_str("auto"),
            IconSize::Unset => f.write_str("unset"),
            IconSize::None => f.write_str("none"),
            IconSize::Pixels(px) => write!(f, "{px}"),
        }
    }
}

impl FromStr for IconSize {
    type Err = IconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(IconSize::Auto),
            "unset" => Ok(IconSize::Unset),
            "none" => Ok(IconSize::None),
            other => other
                .parse::<u32>()
                .map(IconSize::Pixels)
                .map_err(|_| IconError::InvalidParameter(format!("size: unknown value '{other}'"))),
        }
    }
}

/// The closed set of rendering parameters forwarded to the icon API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RenderParams {
    pub color: Option<String>,
    pub flip: Option<Flip>,
    pub rotate: Option<Rotate>,
    pub size: Option<IconSize>,
    pub download: Option<bool>,
    pub bbox: Option<bool>,
}

impl RenderParams {
    /// Set one parameter from its wire name and textual value.
    pub fn set(&mut self, name: &str, value: &str) -> IconResult<()> {
        match name {
            "color" => self.color = Some(value.to_string()),
            "flip" => self.flip = Some(value.parse()?),
            "rotate" => self.rotate = Some(value.parse()?),
            "size" => self.size = Some(value.parse()?),
            "download" => self.download = Some(parse_bool(name, value)?),
            "box" => self.bbox = Some(parse_bool(name, value)?),
            other => {
                return Err(IconError::InvalidParameter(format!("unknown parameter '{other}'")));
            }
        }
        Ok(())
    }

    /// Build from `name=value` pairs in any order.
    pub fn from_pairs<'a, I>(pairs: I) -> IconResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (name, value) in pairs {
            params.set(name, value)?;
        }
        Ok(params)
    }

    /// Present parameters as `(wire name, value)`, unsorted.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(color) = &self.color {
            pairs.push(("color", color.clone()));
        }
        if let Some(flip) = self.flip {
            pairs.push(("flip", flip.to_string()));
        }
        if let Some(rotate) = self.rotate {
            pairs.push(("rotate", rotate.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        if let Some(download) = self.download {
            pairs.push(("download", download.to_string()));
        }
        if let Some(bbox) = self.bbox {
            pairs.push(("box", bbox.to_string()));
        }
        pairs
    }
}

fn parse_bool(name: &str, value: &str) -> IconResult<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(IconError::InvalidParameter(format!("{name}: expected a boolean, got '{other}'"))),
    }
}

/// A request for one icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconRequest {
    pub identifier: String,
    pub params: RenderParams,
}

impl IconRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            params: RenderParams::default(),
        }
    }

    pub fn with_params(mut self, params: RenderParams) -> Self {
        self.params = params;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.params.color = Some(color.into());
        self
    }

    pub fn flip(mut self, flip: Flip) -> Self {
        self.params.flip = Some(flip);
        self
    }

    pub fn rotate(mut self, rotate: Rotate) -> Self {
        self.params.rotate = Some(rotate);
        self
    }

    pub fn size(mut self, size: IconSize) -> Self {
        self.params.size = Some(size);
        self
    }

    pub fn download(mut self, download: bool) -> Self {
        self.params.download = Some(download);
        self
    }

    pub fn bbox(mut self, bbox: bool) -> Self {
        self.params.bbox = Some(bbox);
        self
    }
}

/// Resolved, render-ready icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconData {
    /// Root `<svg>` attributes: configured defaults overlaid by fetched ones.
    pub attributes: BTreeMap<String, String>,
    /// Inner markup, without the enclosing `<svg>` element.
    pub vector: String,
}

impl IconData {
    /// Render the complete `<svg>` element.
    pub fn to_svg(&self) -> String {
        let mut out = String::from("<svg");
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&quick_xml::escape::escape(value.as_str()));
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.vector);
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_id_validation() {
        let id = IconId::parse("mdi:github").unwrap();
        assert_eq!(id.collection(), "mdi");
        assert_eq!(id.name(), "github");
        assert_eq!(id.to_string(), "mdi:github");

        assert!(IconId::parse("material-symbols:home-2").is_some());
        assert!(IconId::parse("MDI:github").is_none());
        assert!(IconId::parse("mdi:github:extra").is_none());
        assert!(IconId::parse("mdi/github").is_none());
        assert!(IconId::parse(":github").is_none());
        assert!(IconId::parse("").is_none());
    }

    #[test]
    fn test_fallback_substitution() {
        let id = IconId::parse_or_fallback("../etc/passwd");
        assert_eq!(id.to_string(), FALLBACK_ICON);
    }

    #[test]
    fn test_params_from_pairs() {
        let params = RenderParams::from_pairs([
            ("rotate", "90deg"),
            ("color", "red"),
            ("flip", "horizontal,vertical"),
            ("size", "24"),
            ("box", "true"),
        ])
        .unwrap();
        assert_eq!(params.rotate, Some(Rotate::Deg90));
        assert_eq!(params.flip, Some(Flip::Both));
        assert_eq!(params.size, Some(IconSize::Pixels(24)));
        assert_eq!(params.bbox, Some(true));
        assert_eq!(params.color.as_deref(), Some("red"));
    }

    #[test]
    fn test_params_reject_unknown() {
        assert!(matches!(
            RenderParams::from_pairs([("opacity", "1")]),
            Err(IconError::InvalidParameter(_))
        ));
        assert!(matches!(
            RenderParams::from_pairs([("rotate", "45deg")]),
            Err(IconError::InvalidParameter(_))
        ));
        assert!(matches!(
            RenderParams::from_pairs([("download", "yes")]),
            Err(IconError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_to_svg_escapes_attributes() {
        let mut attributes = BTreeMap::new();
        attributes.insert("viewBox".to_string(), "0 0 24 24".to_string());
        attributes.insert("data-x".to_string(), "a\"b".to_string());
        let data = IconData {
            attributes,
            vector: "<path d=\"M0 0\"/>".to_string(),
        };
        assert_eq!(
            data.to_svg(),
            "<svg data-x=\"a&quot;b\" viewBox=\"0 0 24 24\"><path d=\"M0 0\"/></svg>"
        );
    }
}
