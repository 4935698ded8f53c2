//! CLI configuration: a thin layer over `vreeda_config` that applies
//! `GlobalOpts` overrides (--api-url, --access-token, --insecure, ...).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use vreeda_core::{ApiConfig, AuthConfig, SessionCodec, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vreeda_config::{Config, Profile, SecretKind, config_path, load_config_or_default};

const SESSION_FILE: &str = "session.jwt";
const CONTEXTS_FILE: &str = "user_contexts.redb";

/// The loaded config plus the profile selected for this invocation.
pub struct Resolved {
    pub config: Config,
    pub name: String,
}

impl Resolved {
    pub fn load(global: &GlobalOpts) -> Self {
        let config = load_config_or_default();
        let name = config.profile_name(global.profile.as_deref()).to_owned();
        Self { config, name }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.config.profiles.get(&self.name)
    }

    /// The selected profile, or an error listing the ones that exist.
    pub fn require_profile(&self) -> Result<&Profile, CliError> {
        self.profile().ok_or_else(|| CliError::ProfileNotFound {
            name: self.name.clone(),
            available: available_profiles(&self.config),
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        vreeda_config::data_dir(self.profile(), &self.name)
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join(SESSION_FILE)
    }

    pub fn contexts_path(&self) -> PathBuf {
        self.data_dir().join(CONTEXTS_FILE)
    }
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn apply_transport_flags(global: &GlobalOpts, tls: &mut TlsVerification, timeout: &mut Duration) {
    if global.insecure {
        *tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        *timeout = Duration::from_secs(secs);
    }
}

/// Device API settings: flags, then profile, then the stored session's token.
pub fn resolve_api_config(resolved: &Resolved, global: &GlobalOpts) -> Result<ApiConfig, CliError> {
    let mut api = match (global.api_url.as_deref(), resolved.profile()) {
        // An explicit URL still inherits the profile's token and TLS settings.
        (Some(raw), Some(profile)) => {
            let profile = Profile {
                api_url: raw.to_owned(),
                ..profile.clone()
            };
            vreeda_config::profile_to_api_config(&profile, &resolved.name)?
        }
        (Some(raw), None) => {
            let url: url::Url = raw.parse().map_err(|e| CliError::Validation {
                field: "api-url".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })?;
            ApiConfig::new(url)
        }
        (None, Some(profile)) => vreeda_config::profile_to_api_config(profile, &resolved.name)?,
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(token) = &global.access_token {
        api.access_token = Some(SecretString::from(token.clone()));
    }
    if api.access_token.is_none() {
        api.access_token = session_access_token(resolved);
    }

    apply_transport_flags(global, &mut api.tls, &mut api.timeout);
    Ok(api)
}

/// Access token from the stored session, if one exists and still decodes.
fn session_access_token(resolved: &Resolved) -> Option<SecretString> {
    let token = std::fs::read_to_string(resolved.session_path()).ok()?;
    let codec = session_codec(resolved).ok()?;
    match codec.decode(token.trim()) {
        Ok(session) => Some(session.access_token),
        Err(e) => {
            debug!(error = %e, "stored session not usable");
            None
        }
    }
}

/// Full sign-in settings for the selected profile.
pub fn resolve_auth_config(resolved: &Resolved, global: &GlobalOpts) -> Result<AuthConfig, CliError> {
    let profile = resolved.require_profile()?;
    let mut auth = vreeda_config::profile_to_auth_config(profile, &resolved.name)?;
    apply_transport_flags(global, &mut auth.tls, &mut auth.timeout);
    Ok(auth)
}

/// Session codec from the session secret alone; no provider settings needed.
pub fn session_codec(resolved: &Resolved) -> Result<SessionCodec, CliError> {
    let profile = resolved.profile().cloned().unwrap_or_default();
    let secret = vreeda_config::resolve_secret(SecretKind::SessionSecret, &profile, &resolved.name)?;
    let max_age = profile.session_max_age_days.map_or(
        vreeda_core::config::DEFAULT_SESSION_MAX_AGE,
        |days| Duration::from_secs(days.saturating_mul(24 * 60 * 60)),
    );
    let max_age = chrono::Duration::from_std(max_age).map_err(|e| CliError::Validation {
        field: "session_max_age_days".into(),
        reason: e.to_string(),
    })?;
    Ok(SessionCodec::new(&secret, max_age)?)
}

/// Write the session token readable only by the current user.
pub fn store_session(resolved: &Resolved, token: &SecretString) -> Result<PathBuf, CliError> {
    let path = resolved.session_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, token.expose_secret())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(path)
}

pub fn read_session(resolved: &Resolved) -> Result<String, CliError> {
    let path = resolved.session_path();
    std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CliError::NotSignedIn {
            path: path.display().to_string(),
        },
        _ => CliError::Io(e),
    })
}
