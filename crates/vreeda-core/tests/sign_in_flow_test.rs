#![allow(clippy::unwrap_used)]
// End-to-end sign-in against a mocked identity provider, persisted to redb.

use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vreeda_core::{
    AuthConfig, AuthPhase, AuthSessionManager, CoreError, IdentityProviderConfig,
    RedbUserContextStore, TlsVerification, UserContextRepository,
};

fn auth_config(server: &MockServer) -> AuthConfig {
    let base = Url::parse(&server.uri()).unwrap();
    AuthConfig {
        provider: IdentityProviderConfig {
            client_id: "app-123".into(),
            client_secret: SecretString::from("client-secret".to_string()),
            tenant: "contoso".into(),
            user_flow: "B2C_1_signin".into(),
            redirect_uri: Url::parse("http://localhost:3000/api/auth/callback").unwrap(),
            authorize_url: Some(base.join("/authorize").unwrap()),
            token_url: Some(base.join("/token").unwrap()),
        },
        session_secret: SecretString::from("session-secret".to_string()),
        session_max_age: Duration::from_secs(30 * 24 * 60 * 60),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
    }
}

fn id_token() -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({ "sub": "abc", "name": "A", "email": "a@x.com" }),
        &EncodingKey::from_secret(b"provider-key"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_sign_in_persists_user_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "expires_at": 1_700_000_000,
            "id_token": id_token(),
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = auth_config(&server);
    let store = RedbUserContextStore::open(dir.path().join("contexts.redb")).unwrap();
    let manager = AuthSessionManager::new(
        config.build_provider().unwrap(),
        store,
        config.session_codec().unwrap(),
    );

    let (url, state) = manager.authorization_url();
    assert!(url.as_str().starts_with(&format!("{}/authorize", server.uri())));
    assert!(url.query_pairs().any(|(k, v)| k == "state" && v == state));

    let signed = manager.sign_in("the-code").await.unwrap();
    assert_eq!(signed.session.user_id(), "abc");
    assert_eq!(
        manager.phase(),
        AuthPhase::SessionEstablished {
            user_id: "abc".into()
        }
    );

    // A second sign-in overwrites the same record.
    manager.sign_in("the-code").await.unwrap();
    let all = manager.store().list().await.unwrap();
    assert_eq!(all.len(), 1);

    let ctx = &all[0];
    assert_eq!(ctx.user_id, "abc");
    assert_eq!(ctx.api_access_tokens.access_token, "T1");
    assert_eq!(ctx.api_access_tokens.refresh_token, "R1");
    assert_eq!(
        ctx.api_access_tokens.access_token_expiration.unwrap().to_rfc3339(),
        "2023-11-14T22:13:20+00:00"
    );

    let session = manager.session(signed.token.expose_secret()).unwrap();
    assert_eq!(session.access_token.expose_secret(), "T1");
}

#[tokio::test]
async fn test_provider_rejection_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code expired",
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = auth_config(&server);
    let manager = AuthSessionManager::new(
        config.build_provider().unwrap(),
        RedbUserContextStore::open(dir.path().join("contexts.redb")).unwrap(),
        config.session_codec().unwrap(),
    );

    let err = manager.sign_in("stale").await.unwrap_err();
    match err {
        CoreError::AuthExchange { message } => assert!(message.contains("invalid_grant")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(manager.phase(), AuthPhase::Unauthenticated);
    assert!(manager.store().list().await.unwrap().is_empty());
}
