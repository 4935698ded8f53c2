// ── Application session ──

use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Identity recovered from the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A decoded application session.
///
/// `user.id` and `access_token` are exactly the values captured when the
/// provider issued the tokens; nothing refreshes them during the session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: SecretString,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}
