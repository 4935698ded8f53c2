use thiserror::Error;

/// Top-level error type for the `vreeda-api` crate.
///
/// Covers every failure mode across both HTTP surfaces: the device API
/// and the OAuth identity provider. `vreeda-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device API rejected the bearer token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The identity provider rejected or failed the code exchange.
    #[error("Token exchange failed: {message}")]
    TokenExchange { status: Option<u16>, message: String },

    /// The `id_token` returned by the provider could not be decoded.
    #[error("Invalid id_token: {0}")]
    IdToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device API ──────────────────────────────────────────────────
    /// Non-success status returned by the device API.
    #[error("Device API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request was rejected locally before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            Self::TokenExchange { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_drives_helpers() {
        let throttled = Error::Api {
            status: 429,
            message: "slow down".into(),
        };
        assert!(throttled.is_transient());
        assert_eq!(throttled.status(), Some(429));

        let missing = Error::Api {
            status: 404,
            message: "no such device".into(),
        };
        assert!(!missing.is_transient());
        assert!(!missing.is_auth_expired());
        assert_eq!(missing.status(), Some(404));
    }

    #[test]
    fn token_exchange_without_status() {
        let err = Error::TokenExchange {
            status: None,
            message: "invalid_grant".into(),
        };
        assert_eq!(err.status(), None);
        assert!(Error::Authentication { message: "expired".into() }.is_auth_expired());
    }
}
