//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and `HostList` handle syntactic checks)
//! - Validate value ranges (cache capacity > 0, jitter ratio within 0..=1)
//! - Reject default attribute names that could not be serialized safely
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: Configuration → Result<(), Vec<ValidationError>>
//! - Runs before a configuration is accepted into the registry

use std::fmt;

use crate::config::schema::{CachePolicy, Configuration};
use crate::error::IconError;

/// One failed semantic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a candidate configuration.
pub fn validate_config(config: &Configuration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hosts.is_empty() {
        errors.push(ValidationError::new("hosts", "at least one host is required"));
    }

    if let CachePolicy::Bounded(0) = config.cache {
        errors.push(ValidationError::new("cache", "capacity must be a positive integer"));
    }

    let ratio = config.failover.jitter_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::new(
            "failover.jitter_ratio",
            format!("must be between 0.0 and 1.0, got {ratio}"),
        ));
    }

    for name in config.default_attributes.keys() {
        if !is_attribute_name(name) {
            errors.push(ValidationError::new(
                "default_attributes",
                format!("invalid attribute name '{name}'"),
            ));
        }
    }

    for name in config.request.headers.keys() {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            errors.push(ValidationError::new(
                "request.headers",
                format!("invalid header name '{name}'"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}

/// Collapse validation failures into the engine error type.
pub fn into_icon_error(errors: Vec<ValidationError>) -> IconError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    IconError::InvalidConfiguration(joined)
}
