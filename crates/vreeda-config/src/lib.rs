//! Shared configuration for the vreeda CLI.
//!
//! TOML profiles, secret resolution (env + keyring + plaintext), and
//! translation to `vreeda_core::{ApiConfig, AuthConfig}`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vreeda_core::{ApiConfig, AuthConfig, IdentityProviderConfig, TlsVerification};

const KEYRING_SERVICE: &str = "vreeda";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' has no {what} configured")]
    Missing { profile: String, what: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named deployment: device API plus identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Device API base, e.g. "https://app.example.com/api/vreeda/".
    pub api_url: String,

    /// Device API access token (plaintext; prefer keyring or env var).
    pub access_token: Option<String>,
    /// Environment variable holding the device API access token.
    pub access_token_env: Option<String>,

    /// Azure AD B2C tenant name.
    pub tenant: Option<String>,
    /// Sign-in user flow.
    #[serde(default = "default_user_flow")]
    pub user_flow: String,
    pub client_id: Option<String>,
    /// Client secret (plaintext; prefer keyring or env var).
    pub client_secret: Option<String>,
    pub client_secret_env: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Overrides the tenant-derived authorize endpoint.
    pub authorize_url: Option<String>,
    /// Overrides the tenant-derived token endpoint.
    pub token_url: Option<String>,

    /// HMAC key for session tokens (plaintext; prefer keyring or env var).
    pub session_secret: Option<String>,
    pub session_secret_env: Option<String>,
    /// Session lifetime in days.
    pub session_max_age_days: Option<u64>,

    /// Where sessions and user contexts are stored.
    pub data_dir: Option<PathBuf>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
    /// Skip TLS verification.
    pub insecure: Option<bool>,
    /// Override timeout.
    pub timeout: Option<u64>,
}

fn default_user_flow() -> String {
    "B2C_1_signin".into()
}
fn default_redirect_uri() -> String {
    "http://localhost:3000/api/auth/callback/azure-ad-b2c".into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vreeda", "vreeda")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Data directory for a profile: its `data_dir`, else a per-profile
/// subdirectory of the platform data dir.
pub fn data_dir(profile: Option<&Profile>, profile_name: &str) -> PathBuf {
    if let Some(dir) = profile.and_then(|p| p.data_dir.clone()) {
        return dir;
    }
    project_dirs()
        .map_or_else(
            || dirs_fallback(".local/share"),
            |dirs| dirs.data_dir().to_path_buf(),
        )
        .join(profile_name)
}

fn dirs_fallback(sub: &str) -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
        .join(sub)
        .join("vreeda")
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, layering defaults, the file, then `VREEDA_` env vars
/// (nested keys separated by `__`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VREEDA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

/// The secrets a profile can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    ClientSecret,
    SessionSecret,
    AccessToken,
}

impl SecretKind {
    /// Keyring account suffix, also used in messages.
    pub fn key(self) -> &'static str {
        match self {
            Self::ClientSecret => "client-secret",
            Self::SessionSecret => "session-secret",
            Self::AccessToken => "access-token",
        }
    }

    /// Environment variable checked when the profile names none.
    pub fn default_env(self) -> &'static str {
        match self {
            Self::ClientSecret => "VREEDA_CLIENT_SECRET",
            Self::SessionSecret => "VREEDA_SESSION_SECRET",
            Self::AccessToken => "VREEDA_ACCESS_TOKEN",
        }
    }

    fn profile_fields(self, profile: &Profile) -> (Option<&str>, Option<&str>) {
        match self {
            Self::ClientSecret => (
                profile.client_secret_env.as_deref(),
                profile.client_secret.as_deref(),
            ),
            Self::SessionSecret => (
                profile.session_secret_env.as_deref(),
                profile.session_secret.as_deref(),
            ),
            Self::AccessToken => (
                profile.access_token_env.as_deref(),
                profile.access_token.as_deref(),
            ),
        }
    }
}

fn keyring_entry(kind: SecretKind, profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{}", kind.key()))
}

/// Look a secret up: profile env var, default env var, keyring, plaintext.
pub fn find_secret(kind: SecretKind, profile: &Profile, profile_name: &str) -> Option<SecretString> {
    let (env_name, plaintext) = kind.profile_fields(profile);

    // 1. Env vars
    for name in env_name.into_iter().chain([kind.default_env()]) {
        if let Ok(val) = std::env::var(name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(kind, profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|s| SecretString::from(s.to_owned()))
}

pub fn resolve_secret(
    kind: SecretKind,
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    find_secret(kind, profile, profile_name).ok_or_else(|| ConfigError::Missing {
        profile: profile_name.into(),
        what: kind.key().into(),
    })
}

/// Store a secret in the system keyring.
pub fn store_secret(kind: SecretKind, profile_name: &str, value: &str) -> Result<(), ConfigError> {
    keyring_entry(kind, profile_name)?.set_password(value)?;
    Ok(())
}

// ── Translation to runtime configs ──────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn tls_of(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

fn timeout_of(profile: &Profile) -> Duration {
    Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout))
}

fn required<'a>(
    value: Option<&'a str>,
    profile_name: &str,
    what: &str,
) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            profile: profile_name.into(),
            what: what.into(),
        })
}

/// Build an `ApiConfig` from a profile. The access token is optional.
pub fn profile_to_api_config(profile: &Profile, profile_name: &str) -> Result<ApiConfig, ConfigError> {
    let url = parse_url("api_url", required(Some(profile.api_url.as_str()), profile_name, "api_url")?)?;
    Ok(ApiConfig {
        url,
        access_token: find_secret(SecretKind::AccessToken, profile, profile_name),
        tls: tls_of(profile),
        timeout: timeout_of(profile),
    })
}

/// Build an `AuthConfig` from a profile; every provider setting is required.
pub fn profile_to_auth_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<AuthConfig, ConfigError> {
    let client_id = required(profile.client_id.as_deref(), profile_name, "client_id")?;
    let tenant = required(profile.tenant.as_deref(), profile_name, "tenant")?;

    let provider = IdentityProviderConfig {
        client_id: client_id.into(),
        client_secret: resolve_secret(SecretKind::ClientSecret, profile, profile_name)?,
        tenant: tenant.into(),
        user_flow: profile.user_flow.clone(),
        redirect_uri: parse_url("redirect_uri", &profile.redirect_uri)?,
        authorize_url: profile
            .authorize_url
            .as_deref()
            .map(|u| parse_url("authorize_url", u))
            .transpose()?,
        token_url: profile
            .token_url
            .as_deref()
            .map(|u| parse_url("token_url", u))
            .transpose()?,
    };

    let session_max_age = profile
        .session_max_age_days
        .map_or(vreeda_core::config::DEFAULT_SESSION_MAX_AGE, |days| {
            Duration::from_secs(days.saturating_mul(24 * 60 * 60))
        });

    Ok(AuthConfig {
        provider,
        session_secret: resolve_secret(SecretKind::SessionSecret, profile, profile_name)?,
        session_max_age,
        tls: tls_of(profile),
        timeout: timeout_of(profile),
    })
}
