use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{PersistenceError, UserContextRepository, check_user_id, merge};
use crate::model::{TokenPair, UserContext};

/// Process-local store. The entry lock makes each upsert atomic.
#[derive(Debug, Default)]
pub struct MemoryUserContextStore {
    records: DashMap<String, UserContext>,
}

impl MemoryUserContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl UserContextRepository for MemoryUserContextStore {
    async fn upsert(&self, user_id: &str, tokens: TokenPair) -> Result<UserContext, PersistenceError> {
        check_user_id(user_id)?;
        let ctx = match self.records.entry(user_id.to_owned()) {
            Entry::Occupied(mut slot) => {
                let merged = merge(Some(slot.get().clone()), user_id, tokens);
                slot.insert(merged.clone());
                merged
            }
            Entry::Vacant(slot) => slot.insert(merge(None, user_id, tokens)).clone(),
        };
        Ok(ctx)
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserContext>, PersistenceError> {
        Ok(self.records.get(user_id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> Result<Vec<UserContext>, PersistenceError> {
        let mut all: Vec<UserContext> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(all)
    }
}
