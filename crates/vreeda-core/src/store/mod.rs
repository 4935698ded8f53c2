// ── User context persistence ──
//
// One record per user identity, written once per successful sign-in.
// Every backend must make the match-then-write of `upsert` atomic
// under the user id.

mod memory;
mod redb_store;

use std::future::Future;

use thiserror::Error;

use crate::model::{TokenPair, UserContext};

pub use self::memory::MemoryUserContextStore;
pub use self::redb_store::RedbUserContextStore;

/// A user context could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("User id must not be empty")]
    EmptyUserId,

    #[error("Storage backend error: {message}")]
    Backend { message: String },

    #[error("Stored record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keyed storage for [`UserContext`] records.
pub trait UserContextRepository: Send + Sync {
    /// Insert or replace the token pair for `user_id`.
    ///
    /// An existing record keeps its identity but has `api_access_tokens`
    /// overwritten wholesale and `updated_at` bumped.
    fn upsert(
        &self,
        user_id: &str,
        tokens: TokenPair,
    ) -> impl Future<Output = Result<UserContext, PersistenceError>> + Send;

    fn get(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserContext>, PersistenceError>> + Send;

    /// All records, ordered by user id.
    fn list(&self) -> impl Future<Output = Result<Vec<UserContext>, PersistenceError>> + Send;
}

/// An absent backend: reads come back empty and writes fail, so callers
/// that tolerate persistence errors keep working without storage.
impl<S: UserContextRepository> UserContextRepository for Option<S> {
    async fn upsert(
        &self,
        user_id: &str,
        tokens: TokenPair,
    ) -> Result<UserContext, PersistenceError> {
        match self {
            Some(store) => store.upsert(user_id, tokens).await,
            None => Err(PersistenceError::Backend {
                message: "no user context store is open".into(),
            }),
        }
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserContext>, PersistenceError> {
        match self {
            Some(store) => store.get(user_id).await,
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<UserContext>, PersistenceError> {
        match self {
            Some(store) => store.list().await,
            None => Ok(Vec::new()),
        }
    }
}

/// Apply an upsert to whatever is currently stored under the key.
fn merge(existing: Option<UserContext>, user_id: &str, tokens: TokenPair) -> UserContext {
    match existing {
        Some(mut ctx) => {
            ctx.api_access_tokens = tokens;
            ctx.updated_at = chrono::Utc::now();
            ctx
        }
        None => UserContext::new(user_id, tokens),
    }
}

fn check_user_id(user_id: &str) -> Result<(), PersistenceError> {
    if user_id.trim().is_empty() {
        return Err(PersistenceError::EmptyUserId);
    }
    Ok(())
}
