// ── Core error types ──
//
// User-facing errors from vreeda-core. Consumers never see raw HTTP
// status handling or JSON parse failures directly; the
// `From<vreeda_api::Error>` impl translates transport-layer errors into
// domain variants.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::PersistenceError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Device control ───────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device {device_id} is offline")]
    DeviceDisconnected { device_id: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    // ── Sign-in ──────────────────────────────────────────────────────
    #[error("Sign-in failed: {message}")]
    AuthExchange { message: String },

    #[error("Invalid session: {message}")]
    InvalidSession { message: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    // ── Input / configuration ────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if a retry might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed { .. } => true,
            Self::Gateway(e) => e.is_transient(),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vreeda_api::Error> for CoreError {
    fn from(err: vreeda_api::Error) -> Self {
        let status = err.status();
        match err {
            vreeda_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vreeda_api::Error::TokenExchange { message, .. } => CoreError::AuthExchange { message },
            vreeda_api::Error::IdToken(message) => CoreError::AuthExchange { message },
            vreeda_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            vreeda_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vreeda_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vreeda_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            vreeda_api::Error::InvalidRequest(message) => CoreError::ValidationFailed {
                message: message.into(),
            },
            vreeda_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
