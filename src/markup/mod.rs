//! SVG markup handling.
//!
//! # Data Flow
//! ```text
//! response body (String)
//!     → parser.rs (single <svg> root: attributes + raw inner markup)
//!     → sanitizer.rs (allow-list filter, only when a policy is active)
//!         inner markup  → sanitize(inner, policy)
//!         root attrs    → filter_root_attributes
//!     → IconData { attributes, vector }
//! ```
//!
//! # Design Decisions
//! - Markup is tokenized, never evaluated
//! - The policy is plain data so it can live in configuration files
//! - Sanitized output is canonical and re-sanitizing it is a no-op

pub mod parser;
pub mod policy;
pub mod sanitizer;

pub use parser::{parse_svg, ParsedSvg};
pub use policy::SanitizePolicy;
pub use sanitizer::{filter_root_attributes, sanitize};
