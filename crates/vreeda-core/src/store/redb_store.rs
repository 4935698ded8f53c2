// redb-backed store: one JSON document per user id in a single table.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use super::{PersistenceError, UserContextRepository, check_user_id, merge};
use crate::model::{TokenPair, UserContext};

const USER_CONTEXTS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_contexts");

fn backend(e: impl Into<redb::Error>) -> PersistenceError {
    PersistenceError::Backend {
        message: e.into().to_string(),
    }
}

/// Durable store in a redb file. Write transactions are serialized by
/// redb, so read-then-write inside one transaction is atomic.
#[derive(Clone)]
pub struct RedbUserContextStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbUserContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbUserContextStore").finish_non_exhaustive()
    }
}

impl RedbUserContextStore {
    /// Open or create the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Backend {
                message: format!("cannot create {}: {e}", parent.display()),
            })?;
        }

        let db = Database::create(path).map_err(backend)?;
        let txn = db.begin_write().map_err(backend)?;
        {
            txn.open_table(USER_CONTEXTS).map_err(backend)?;
        }
        txn.commit().map_err(backend)?;

        debug!(path = %path.display(), "opened user context store");
        Ok(Self { db: Arc::new(db) })
    }

    fn upsert_blocking(
        db: &Database,
        user_id: &str,
        tokens: TokenPair,
    ) -> Result<UserContext, PersistenceError> {
        let txn = db.begin_write().map_err(backend)?;
        let ctx = {
            let mut table = txn.open_table(USER_CONTEXTS).map_err(backend)?;
            let existing = match table.get(user_id).map_err(backend)? {
                Some(raw) => Some(serde_json::from_slice::<UserContext>(raw.value())?),
                None => None,
            };
            let ctx = merge(existing, user_id, tokens);
            let bytes = serde_json::to_vec(&ctx)?;
            table.insert(user_id, bytes.as_slice()).map_err(backend)?;
            ctx
        };
        txn.commit().map_err(backend)?;
        Ok(ctx)
    }

    fn get_blocking(db: &Database, user_id: &str) -> Result<Option<UserContext>, PersistenceError> {
        let txn = db.begin_read().map_err(backend)?;
        let table = txn.open_table(USER_CONTEXTS).map_err(backend)?;
        match table.get(user_id).map_err(backend)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    fn list_blocking(db: &Database) -> Result<Vec<UserContext>, PersistenceError> {
        let txn = db.begin_read().map_err(backend)?;
        let table = txn.open_table(USER_CONTEXTS).map_err(backend)?;
        let mut all = Vec::new();
        // Keys iterate in order, so the result is sorted by user id.
        for entry in table.iter().map_err(backend)? {
            let (_, raw) = entry.map_err(backend)?;
            all.push(serde_json::from_slice(raw.value())?);
        }
        Ok(all)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, PersistenceError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| PersistenceError::Backend {
                message: format!("storage task failed: {e}"),
            })?
    }
}

impl UserContextRepository for RedbUserContextStore {
    async fn upsert(&self, user_id: &str, tokens: TokenPair) -> Result<UserContext, PersistenceError> {
        check_user_id(user_id)?;
        let user_id = user_id.to_owned();
        self.blocking(move |db| Self::upsert_blocking(db, &user_id, tokens))
            .await
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserContext>, PersistenceError> {
        let user_id = user_id.to_owned();
        self.blocking(move |db| Self::get_blocking(db, &user_id)).await
    }

    async fn list(&self) -> Result<Vec<UserContext>, PersistenceError> {
        self.blocking(Self::list_blocking).await
    }
}
