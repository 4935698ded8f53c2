// ── Runtime configuration ──
//
// These types describe how to reach the device API and the identity
// provider. They carry credential data and transport tuning but never
// touch disk; the CLI builds them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vreeda_api::{
    ApiCredentials, DeviceApiClient, OAuthClient, ProviderEndpoints, TlsMode, TransportConfig,
};

use crate::auth::SessionCodec;
use crate::error::CoreError;

/// Default session lifetime: 30 days.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development proxies only).
    DangerAcceptInvalid,
}

impl TlsVerification {
    fn to_tls_mode(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

fn transport(tls: &TlsVerification, timeout: Duration) -> TransportConfig {
    TransportConfig {
        tls: tls.to_tls_mode(),
        timeout,
    }
}

/// How to reach the device API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Directory holding `list-devices` and `patch-device`.
    pub url: Url,
    /// Access token captured at sign-in. `None` sends no credentials.
    pub access_token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            access_token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn build_client(&self) -> Result<DeviceApiClient, CoreError> {
        let credentials = match &self.access_token {
            Some(token) => ApiCredentials::Bearer {
                token: token.clone(),
            },
            None => ApiCredentials::Anonymous,
        };
        Ok(DeviceApiClient::new(
            self.url.as_str(),
            &credentials,
            &transport(&self.tls, self.timeout),
        )?)
    }
}

/// Registration of this application with the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Azure AD B2C tenant name (the `{tenant}` in `{tenant}.b2clogin.com`).
    pub tenant: String,
    /// Sign-in user flow, e.g. `B2C_1_signin`.
    pub user_flow: String,
    /// Where the provider sends the browser back with the code.
    pub redirect_uri: Url,
    /// Overrides the tenant-derived authorize endpoint.
    pub authorize_url: Option<Url>,
    /// Overrides the tenant-derived token endpoint.
    pub token_url: Option<Url>,
}

impl IdentityProviderConfig {
    pub fn endpoints(&self) -> Result<ProviderEndpoints, CoreError> {
        let derived = ProviderEndpoints::azure_b2c(&self.tenant, &self.user_flow)?;
        Ok(ProviderEndpoints {
            authorize: self.authorize_url.clone().unwrap_or(derived.authorize),
            token: self.token_url.clone().unwrap_or(derived.token),
        })
    }
}

/// Everything the sign-in flow needs.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub provider: IdentityProviderConfig,
    /// HMAC key for application session tokens.
    pub session_secret: SecretString,
    pub session_max_age: Duration,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl AuthConfig {
    pub fn build_provider(&self) -> Result<OAuthClient, CoreError> {
        Ok(OAuthClient::new(
            self.provider.endpoints()?,
            self.provider.client_id.clone(),
            self.provider.client_secret.clone(),
            self.provider.redirect_uri.clone(),
            &transport(&self.tls, self.timeout),
        )?)
    }

    pub fn session_codec(&self) -> Result<SessionCodec, CoreError> {
        let max_age = chrono::Duration::from_std(self.session_max_age).map_err(|e| {
            CoreError::Config {
                message: format!("session max age out of range: {e}"),
            }
        })?;
        SessionCodec::new(&self.session_secret, max_age)
    }
}
