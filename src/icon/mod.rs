//! Icon request model and canonicalization.
//!
//! # Data Flow
//! ```text
//! IconRequest { identifier, params }
//!     → key.rs: IconId::parse_or_fallback (never fails)
//!     → key.rs: sorted, form-urlencoded params
//!     → CanonicalRequest { id, query, key }
//!     → CanonicalRequest::url(hosts, i) per failover attempt
//! ```

pub mod key;
pub mod types;

pub use key::{canonicalize, CanonicalRequest};
pub use types::{Flip, IconData, IconId, IconRequest, IconSize, RenderParams, Rotate, FALLBACK_ICON};
