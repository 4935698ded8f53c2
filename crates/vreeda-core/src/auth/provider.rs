use std::future::Future;

use url::Url;
use vreeda_api::OAuthClient;

use crate::error::CoreError;

/// Identity returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// OAuth token set returned by the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absolute access-token expiry in epoch seconds.
    pub expires_at: Option<i64>,
}

impl std::fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Outcome of a completed authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub profile: ProviderProfile,
    pub tokens: ProviderTokens,
}

/// An OAuth identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Where to send the user to sign in. `state` comes back on the callback.
    fn authorization_url(&self, state: &str) -> Url;

    /// Exchange the callback's authorization code.
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<SignInResult, CoreError>> + Send;
}

impl IdentityProvider for OAuthClient {
    fn authorization_url(&self, state: &str) -> Url {
        OAuthClient::authorization_url(self, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<SignInResult, CoreError> {
        let resp = OAuthClient::exchange_code(self, code).await?;
        let claims = resp.id_claims()?;

        Ok(SignInResult {
            profile: ProviderProfile {
                email: claims.primary_email().map(str::to_owned),
                sub: claims.sub,
                name: claims.name,
            },
            tokens: ProviderTokens {
                expires_at: resp.expires_at(),
                access_token: resp.access_token,
                refresh_token: resp.refresh_token,
            },
        })
    }
}
