// ── Persisted per-user API credentials ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::ProviderTokens;

/// The OAuth token pair stored for a user.
///
/// `refresh_token_expiration` is never populated: the provider does not
/// report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expiration: Option<DateTime<Utc>>,
    pub refresh_token_expiration: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Capture the provider's tokens. A missing refresh token is stored empty.
    pub fn from_provider(tokens: &ProviderTokens) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone().unwrap_or_default(),
            access_token_expiration: tokens
                .expires_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            refresh_token_expiration: None,
        }
    }
}

/// One record per user identity, overwritten on every sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    pub api_access_tokens: TokenPair,
    pub updated_at: DateTime<Utc>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>, tokens: TokenPair) -> Self {
        Self {
            user_id: user_id.into(),
            api_access_tokens: tokens,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_converted_from_epoch_seconds() {
        let tokens = ProviderTokens {
            access_token: "T1".into(),
            refresh_token: Some("R1".into()),
            expires_at: Some(1_700_000_000),
        };
        let pair = TokenPair::from_provider(&tokens);
        assert_eq!(
            pair.access_token_expiration.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
        assert_eq!(pair.refresh_token, "R1");
        assert!(pair.refresh_token_expiration.is_none());
    }

    #[test]
    fn missing_refresh_token_is_stored_empty() {
        let tokens = ProviderTokens {
            access_token: "T1".into(),
            refresh_token: None,
            expires_at: None,
        };
        let pair = TokenPair::from_provider(&tokens);
        assert_eq!(pair.refresh_token, "");
        assert!(pair.access_token_expiration.is_none());
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let ctx = UserContext::new("abc", TokenPair::default());
        let json = serde_json::to_value(&ctx).expect("serialize");
        assert!(json.get("userId").is_some());
        assert!(json["apiAccessTokens"].get("refreshTokenExpiration").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
