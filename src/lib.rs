//! Icon resolution and caching engine.
//!
//! Turns `collection:name` icon requests into sanitized, render-ready SVG,
//! coalescing identical requests and failing over between API hosts.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod icon;
pub mod markup;
pub mod observability;

pub use config::schema::{ConfigPatch, Configuration};
pub use engine::IconEngine;
pub use error::{IconError, IconResult};
pub use icon::{IconData, IconRequest, RenderParams};
