use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials for calling the device API.
///
/// The device API accepts the OAuth access token captured at sign-in
/// as a bearer token.
#[derive(Debug, Clone)]
pub enum ApiCredentials {
    /// OAuth access token sent as `Authorization: Bearer <token>`.
    Bearer { token: SecretString },
    /// No credentials; the endpoint authenticates by other means
    /// (e.g. a same-origin proxy holding the session cookie).
    Anonymous,
}

impl ApiCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::from(token.into()),
        }
    }

    /// Default headers carrying these credentials.
    pub(crate) fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Self::Bearer { token } = self {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("invalid access token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}
