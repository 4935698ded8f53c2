// OAuth 2.0 authorization-code client for the identity provider.
//
// Builds the authorize URL and performs the code exchange against the
// token endpoint. The provider's `id_token` is only decoded for its
// profile claims; signature verification belongs to the provider
// boundary and is not performed here.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Authorize and token endpoints of an OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize: Url,
    pub token: Url,
}

impl ProviderEndpoints {
    /// Endpoints for an Azure AD B2C tenant and user flow.
    pub fn azure_b2c(tenant: &str, user_flow: &str) -> Result<Self, Error> {
        let base = format!(
            "https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{user_flow}/oauth2/v2.0/"
        );
        let base = Url::parse(&base)?;
        Ok(Self {
            authorize: base.join("authorize")?,
            token: base.join("token")?,
        })
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to the response.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry in epoch seconds, when the provider sends one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute access-token expiry in epoch seconds.
    ///
    /// Prefers `expires_at`; otherwise derives it from `expires_in`.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs))
    }

    /// Decode the profile claims carried by `id_token`.
    pub fn id_claims(&self) -> Result<IdTokenClaims, Error> {
        let token = self
            .id_token
            .as_deref()
            .ok_or_else(|| Error::IdToken("provider response has no id_token".into()))?;
        IdTokenClaims::decode(token)
    }
}

/// Profile claims read from the provider's `id_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Azure AD B2C reports addresses as a list.
    #[serde(default)]
    pub emails: Option<Vec<String>>,
}

impl IdTokenClaims {
    /// Decode the payload of an `id_token` without verifying it.
    pub fn decode(token: &str) -> Result<Self, Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| Error::IdToken(e.to_string()))?;
        Ok(data.claims)
    }

    /// The primary email, falling back to the first of `emails`.
    pub fn primary_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or_else(|| self.emails.as_ref()?.first().map(String::as_str))
    }
}

/// Error body returned by the token endpoint.
#[derive(Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization-code client for one registered application.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    endpoints: ProviderEndpoints,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: Url,
    scope: String,
}

impl OAuthClient {
    pub fn new(
        endpoints: ProviderEndpoints,
        client_id: String,
        client_secret: SecretString,
        redirect_uri: Url,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            endpoints,
            client_id,
            client_secret,
            redirect_uri,
        ))
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        endpoints: ProviderEndpoints,
        client_id: String,
        client_secret: SecretString,
        redirect_uri: Url,
    ) -> Self {
        // The API scope is the application's own client id.
        let scope = format!("{client_id} offline_access openid");
        Self {
            http,
            endpoints,
            client_id,
            client_secret,
            redirect_uri,
            scope,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// URL the user visits to sign in. `state` is echoed back on the callback.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("response_mode", "query")
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        if code.trim().is_empty() {
            return Err(Error::InvalidRequest("authorization code must not be empty"));
        }

        debug!("POST {}", self.endpoints.token);

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let resp = self
            .http
            .post(self.endpoints.token.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OAuthErrorResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                },
            );
            return Err(Error::TokenExchange {
                status: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("token response: {e}"),
            body,
        })
    }
}
