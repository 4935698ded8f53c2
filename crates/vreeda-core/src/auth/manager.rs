// Sign-in state machine.
//
//   Unauthenticated ──exchange──▶ TokenIssued ──sign session──▶ SessionEstablished
//
// A failed exchange leaves the manager Unauthenticated. A failed
// user-context write is logged and does not block sign-in: the session
// token already carries the access token.

use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use super::provider::{IdentityProvider, SignInResult};
use super::session::{SessionCodec, SignedSession};
use crate::error::CoreError;
use crate::model::{Session, TokenPair};
use crate::store::UserContextRepository;

/// Where the current sign-in cycle stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    /// The provider returned an identity and token set.
    TokenIssued { user_id: String },
    /// A signed session holds the captured access token.
    SessionEstablished { user_id: String },
}

/// Drives one authorization-code sign-in through an injected provider
/// and user-context store.
pub struct AuthSessionManager<P, S> {
    provider: P,
    store: S,
    codec: SessionCodec,
    phase: watch::Sender<AuthPhase>,
}

impl<P: IdentityProvider, S: UserContextRepository> AuthSessionManager<P, S> {
    pub fn new(provider: P, store: S, codec: SessionCodec) -> Self {
        let (phase, _) = watch::channel(AuthPhase::Unauthenticated);
        Self {
            provider,
            store,
            codec,
            phase,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.phase.subscribe()
    }

    /// Authorization URL plus the random `state` the callback must echo.
    pub fn authorization_url(&self) -> (Url, String) {
        let state = uuid::Uuid::new_v4().simple().to_string();
        (self.provider.authorization_url(&state), state)
    }

    /// Complete sign-in with the callback's authorization code.
    pub async fn sign_in(&self, code: &str) -> Result<SignedSession, CoreError> {
        let result = match self.exchange(code).await {
            Ok(result) => result,
            Err(e) => {
                self.phase.send_replace(AuthPhase::Unauthenticated);
                warn!(error = %e, "sign-in exchange failed");
                return Err(e);
            }
        };

        let user_id = result.profile.sub.clone();
        self.phase.send_replace(AuthPhase::TokenIssued {
            user_id: user_id.clone(),
        });

        self.record_tokens(&result).await;

        let signed = match self.codec.issue(&result) {
            Ok(signed) => signed,
            Err(e) => {
                self.phase.send_replace(AuthPhase::Unauthenticated);
                return Err(e);
            }
        };

        info!(user_id = %user_id, expires = %signed.session.expires, "session established");
        self.phase
            .send_replace(AuthPhase::SessionEstablished { user_id });
        Ok(signed)
    }

    /// Decode a session token without contacting the provider.
    pub fn session(&self, token: &str) -> Result<Session, CoreError> {
        self.codec.decode(token)
    }

    /// Adopt an existing session token, e.g. one saved by an earlier run.
    pub fn resume(&self, token: &str) -> Result<Session, CoreError> {
        let session = self.codec.decode(token)?;
        self.phase.send_replace(AuthPhase::SessionEstablished {
            user_id: session.user.id.clone(),
        });
        Ok(session)
    }

    pub fn sign_out(&self) {
        self.phase.send_replace(AuthPhase::Unauthenticated);
    }

    async fn exchange(&self, code: &str) -> Result<SignInResult, CoreError> {
        let result = self.provider.exchange_code(code).await?;
        if result.profile.sub.trim().is_empty() {
            return Err(CoreError::AuthExchange {
                message: "provider returned no subject id".into(),
            });
        }
        Ok(result)
    }

    async fn record_tokens(&self, result: &SignInResult) {
        let user_id = &result.profile.sub;
        let pair = TokenPair::from_provider(&result.tokens);
        match self.store.upsert(user_id, pair).await {
            Ok(ctx) => info!(user_id = %ctx.user_id, "user context updated"),
            Err(e) => warn!(user_id = %user_id, error = %e, "failed to update user context"),
        }
    }
}

impl<P, S> std::fmt::Debug for AuthSessionManager<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::auth::{ProviderProfile, ProviderTokens};
    use crate::model::UserContext;
    use crate::store::{MemoryUserContextStore, PersistenceError};

    struct FakeProvider {
        result: Result<SignInResult, String>,
    }

    impl FakeProvider {
        fn ok() -> Self {
            Self {
                result: Ok(SignInResult {
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
                }),
            }
        }

        fn rejecting() -> Self {
            Self {
                result: Err("invalid_grant: code expired".into()),
            }
        }
    }

    impl IdentityProvider for FakeProvider {
        fn authorization_url(&self, state: &str) -> Url {
            let mut url = Url::parse("https://login.example.com/authorize").expect("url");
            url.query_pairs_mut().append_pair("state", state);
            url
        }

        async fn exchange_code(&self, _code: &str) -> Result<SignInResult, CoreError> {
            self.result
                .clone()
                .map_err(|message| CoreError::AuthExchange { message })
        }
    }

    struct BrokenStore;

    impl UserContextRepository for BrokenStore {
        async fn upsert(
            &self,
            _user_id: &str,
            _tokens: TokenPair,
        ) -> Result<UserContext, PersistenceError> {
            Err(PersistenceError::Backend {
                message: "database unavailable".into(),
            })
        }

        async fn get(&self, _user_id: &str) -> Result<Option<UserContext>, PersistenceError> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<UserContext>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    fn codec() -> SessionCodec {
        SessionCodec::new(
            &secrecy::SecretString::from("secret".to_string()),
            chrono::Duration::days(30),
        )
        .expect("codec")
    }

    #[tokio::test]
    async fn sign_in_records_context_and_establishes_session() {
        let manager = AuthSessionManager::new(FakeProvider::ok(), MemoryUserContextStore::new(), codec());
        assert_eq!(manager.phase(), AuthPhase::Unauthenticated);

        let signed = manager.sign_in("code-1").await.expect("sign in");

        let ctx = manager
            .store()
            .get("abc")
            .await
            .expect("get")
            .expect("stored");
        assert_eq!(ctx.user_id, "abc");
        assert_eq!(ctx.api_access_tokens.access_token, "T1");
        assert_eq!(ctx.api_access_tokens.refresh_token, "R1");
        assert_eq!(
            ctx.api_access_tokens
                .access_token_expiration
                .map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
        assert!(ctx.api_access_tokens.refresh_token_expiration.is_none());

        let session = manager
            .session(signed.token.expose_secret())
            .expect("session");
        assert_eq!(session.user_id(), "abc");
        assert_eq!(session.access_token.expose_secret(), "T1");
        assert_eq!(
            manager.phase(),
            AuthPhase::SessionEstablished {
                user_id: "abc".into()
            }
        );
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_sign_in() {
        let manager = AuthSessionManager::new(FakeProvider::ok(), BrokenStore, codec());
        let signed = manager.sign_in("code-1").await.expect("sign in");
        assert_eq!(signed.session.user_id(), "abc");
        assert!(matches!(manager.phase(), AuthPhase::SessionEstablished { .. }));
    }

    #[tokio::test]
    async fn rejected_exchange_stays_unauthenticated() {
        let manager =
            AuthSessionManager::new(FakeProvider::rejecting(), MemoryUserContextStore::new(), codec());
        let err = manager.sign_in("stale").await.expect_err("rejected");
        assert!(matches!(err, CoreError::AuthExchange { .. }));
        assert_eq!(manager.phase(), AuthPhase::Unauthenticated);
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn resume_and_sign_out_drive_phase() {
        let manager = AuthSessionManager::new(FakeProvider::ok(), MemoryUserContextStore::new(), codec());
        let token = manager.codec().issue(&FakeProvider::ok().result.expect("ok")).expect("issue");

        let session = manager.resume(token.token.expose_secret()).expect("resume");
        assert!(matches!(manager.phase(), AuthPhase::SessionEstablished { .. }));
        assert_eq!(session.access_token.expose_secret(), "T1");

        manager.sign_out();
        assert_eq!(manager.phase(), AuthPhase::Unauthenticated);
    }

    #[test]
    fn authorization_url_carries_fresh_state() {
        let manager = AuthSessionManager::new(FakeProvider::ok(), MemoryUserContextStore::new(), codec());
        let (url, state) = manager.authorization_url();
        let (_, second) = manager.authorization_url();
        assert_ne!(state, second);
        assert!(url.query_pairs().any(|(k, v)| k == "state" && v == state));
    }
}
