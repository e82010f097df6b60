//! Error taxonomy for icon resolution.
//!
//! Only [`IconError::ExhaustedHosts`] ever reaches a `resolve_icon` caller.
//! Markup, sanitization and transport errors are per-host failures that the
//! failover pipeline absorbs.

use thiserror::Error;

/// Errors that can occur while configuring the engine or resolving an icon.
///
/// `Clone` because a single fetch chain hands its outcome to every caller
/// coalesced onto it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IconError {
    /// Rejected configuration (zero cache capacity, empty host list, bad host).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Unknown or malformed render parameter at the parsing boundary.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Response body is empty or not a single-root SVG document.
    #[error("Invalid markup: {0}")]
    InvalidMarkup(String),

    /// Sanitizer produced nothing from non-empty input, or could not read it.
    #[error("Sanitization failed: {0}")]
    SanitizationFailed(String),

    /// Non-2xx status or network failure (timeouts included).
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Every host in the list was tried and failed.
    #[error("All {attempts} hosts failed, last error: {last_error}")]
    ExhaustedHosts {
        attempts: usize,
        last_error: Box<IconError>,
    },
}

impl IconError {
    /// Build a transport error from an HTTP status.
    pub fn status(status: u16) -> Self {
        IconError::Transport {
            status: Some(status),
            message: format!("upstream returned HTTP {status}"),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IconError::InvalidConfiguration(_) => "invalid_configuration",
            IconError::InvalidParameter(_) => "invalid_parameter",
            IconError::InvalidMarkup(_) => "invalid_markup",
            IconError::SanitizationFailed(_) => "sanitization_failed",
            IconError::Transport { status: Some(_), .. } => "http_status",
            IconError::Transport { status: None, .. } => "network",
            IconError::ExhaustedHosts { .. } => "exhausted",
        }
    }

    /// True for the per-host failures the pipeline retries on another host.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IconError::InvalidMarkup(_)
                | IconError::SanitizationFailed(_)
                | IconError::Transport { .. }
        )
    }
}

/// Result type for icon operations.
pub type IconResult<T> = Result<T, IconError>;
