//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vreeda_config::ConfigError;
use vreeda_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const OFFLINE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(vreeda::connection_failed),
        help(
            "Check the device API URL and your network connection.\n\
             Use --insecure (-k) only for local development proxies."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(vreeda::timeout),
        help("Increase the timeout with --timeout or try again.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vreeda::auth_failed),
        help(
            "The access token was rejected or has expired.\n\
             Run: vreeda auth url, then vreeda auth sign-in --code <code>"
        )
    )]
    AuthFailed { message: String },

    #[error("Sign-in failed: {message}")]
    #[diagnostic(
        code(vreeda::sign_in_failed),
        help("Authorization codes are single-use and short-lived. Start again with: vreeda auth url")
    )]
    SignInFailed { message: String },

    #[error("Not signed in")]
    #[diagnostic(
        code(vreeda::not_signed_in),
        help("Run: vreeda auth url, then vreeda auth sign-in --code <code>\nSession file: {path}")
    )]
    NotSignedIn { path: String },

    #[error("Session is invalid: {message}")]
    #[diagnostic(
        code(vreeda::invalid_session),
        help("Sign in again, or sign out with: vreeda auth sign-out")
    )]
    InvalidSession { message: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vreeda::not_found),
        help("Run: vreeda {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Device {device} is offline")]
    #[diagnostic(
        code(vreeda::device_offline),
        help("State changes are only sent to connected devices.")
    )]
    DeviceOffline { device: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(vreeda::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vreeda::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vreeda::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vreeda config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device API configured")]
    #[diagnostic(
        code(vreeda::no_config),
        help(
            "Create a profile with: vreeda config init\n\
             Or pass --api-url / set VREEDA_API_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{profile}' has no {what} configured")]
    #[diagnostic(
        code(vreeda::missing_setting),
        help(
            "Add it to the profile with: vreeda config init\n\
             Secrets can be stored with: vreeda config set-secret <kind>"
        )
    )]
    MissingSetting { profile: String, what: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(code(vreeda::keyring))]
    Keyring { message: String },

    #[error(transparent)]
    #[diagnostic(code(vreeda::config))]
    Config(Box<figment::Error>),

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Local storage error: {message}")]
    #[diagnostic(code(vreeda::storage))]
    Storage { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(vreeda::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::SignInFailed { .. }
            | Self::NotSignedIn { .. }
            | Self::InvalidSession { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::DeviceOffline { .. } => exit_code::OFFLINE,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::DeviceDisconnected { device_id } => {
                CliError::DeviceOffline { device: device_id }
            }

            // The device id is already in the user's command line.
            CoreError::Gateway(e) => CliError::from(CoreError::from(e.source)),

            CoreError::AuthExchange { message } => CliError::SignInFailed { message },

            CoreError::InvalidSession { message } => CliError::InvalidSession { message },

            CoreError::Persistence(e) => CliError::Storage {
                message: e.to_string(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Missing { profile, what } => CliError::MissingSetting { profile, what },
            ConfigError::UnknownProfile(name) => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
