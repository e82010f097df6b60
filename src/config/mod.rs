//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)                      IconEngine::configure(patch)
//!     → loader.rs (parse into ConfigPatch)     │
//!     → schema.rs ConfigPatch::apply ◀─────────┘
//!     → validation.rs (semantic checks)
//!     → registry.rs (atomic swap of Arc<Configuration>)
//!     → readers load a snapshot per request
//! ```
//!
//! # Design Decisions
//! - A configuration is immutable once activated; changes build a new one
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Sanitization is all-or-nothing: the rule table only exists while enabled

pub mod loader;
pub mod registry;
pub mod schema;
pub mod validation;

pub use registry::ConfigurationRegistry;
pub use schema::{
    CachePolicy, ConfigPatch, Configuration, FailoverConfig, HostList, RequestOptions,
};
