// Signed application sessions (HS256 JWT).
//
// The session carries the subject id and the provider access token
// captured at sign-in; decoding returns exactly those values until the
// token expires.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::provider::SignInResult;
use crate::error::CoreError;
use crate::model::{Session, SessionUser};

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    id: String,
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    iat: i64,
    exp: i64,
}

/// A freshly issued session token and its decoded form.
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub token: SecretString,
    pub session: Session,
}

/// Issues and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: chrono::Duration,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &SecretString, max_age: chrono::Duration) -> Result<Self, CoreError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(CoreError::Config {
                message: "session secret must not be empty".into(),
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            max_age,
        })
    }

    pub fn max_age(&self) -> chrono::Duration {
        self.max_age
    }

    /// Seal a sign-in into a session token.
    pub fn issue(&self, sign_in: &SignInResult) -> Result<SignedSession, CoreError> {
        let now = Utc::now();
        let expires = now + self.max_age;
        let profile = &sign_in.profile;

        let claims = SessionClaims {
            sub: profile.sub.clone(),
            id: profile.sub.clone(),
            access_token: sign_in.tokens.access_token.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CoreError::Internal(format!("cannot sign session: {e}")))?;

        Ok(SignedSession {
            token: SecretString::from(token),
            session: Self::to_session(claims)?,
        })
    }

    /// Verify a session token and recover its contents.
    pub fn decode(&self, token: &str) -> Result<Session, CoreError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<SessionClaims>(token.trim(), &self.decoding, &validation)
            .map_err(|e| CoreError::InvalidSession {
                message: e.to_string(),
            })?;
        Self::to_session(data.claims)
    }

    fn to_session(claims: SessionClaims) -> Result<Session, CoreError> {
        let expires: DateTime<Utc> =
            DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| CoreError::InvalidSession {
                message: format!("expiry {} is out of range", claims.exp),
            })?;
        Ok(Session {
            user: SessionUser {
                id: claims.sub,
                name: claims.name,
                email: claims.email,
            },
            access_token: SecretString::from(claims.access_token),
            expires,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::{ProviderProfile, ProviderTokens};

    fn codec(max_age: chrono::Duration) -> SessionCodec {
        SessionCodec::new(&SecretString::from("test-secret".to_string()), max_age).expect("codec")
    }

    fn sign_in() -> SignInResult {
        SignInResult {
            profile: ProviderProfile {
                sub: "abc".into(),
                name: Some("A".into()),
                email: Some("a@x.com".into()),
            },
            tokens: ProviderTokens {
                access_token: "T1".into(),
                refresh_token: Some("R1".into()),
                expires_at: Some(1_700_000_000),
            },
        }
    }

    #[test]
    fn decoded_session_matches_issue_time_values() {
        let codec = codec(chrono::Duration::days(30));
        let signed = codec.issue(&sign_in()).expect("issue");

        let session = codec.decode(signed.token.expose_secret()).expect("decode");
        assert_eq!(session.user_id(), "abc");
        assert_eq!(session.access_token.expose_secret(), "T1");
        assert_eq!(session.user.email.as_deref(), Some("a@x.com"));
        assert_eq!(session.expires, signed.session.expires);
    }

    #[test]
    fn payload_carries_id_and_access_token() {
        let signed = codec(chrono::Duration::days(1)).issue(&sign_in()).expect("issue");
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        let raw = jsonwebtoken::decode::<serde_json::Value>(
            signed.token.expose_secret(),
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .expect("decode");
        assert_eq!(raw.claims["id"], "abc");
        assert_eq!(raw.claims["accessToken"], "T1");
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let signed = codec(chrono::Duration::days(1)).issue(&sign_in()).expect("issue");
        let other =
            SessionCodec::new(&SecretString::from("other".to_string()), chrono::Duration::days(1))
                .expect("codec");
        let err = other.decode(signed.token.expose_secret()).expect_err("bad sig");
        assert!(matches!(err, CoreError::InvalidSession { .. }));
    }

    #[test]
    fn expired_session_is_rejected() {
        let codec = codec(chrono::Duration::hours(-1));
        let signed = codec.issue(&sign_in()).expect("issue");
        assert!(codec.decode(signed.token.expose_secret()).is_err());
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let err = SessionCodec::new(&SecretString::from(String::new()), chrono::Duration::days(1))
            .expect_err("empty");
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
