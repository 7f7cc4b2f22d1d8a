//! In-memory tag store — the default backend and the one tests run against.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::platform::GuildId;
use crate::store::traits::{MutateFn, TagStore};
use crate::tags::model::TagRecord;

/// Volatile store keyed guild → name → record. The interior write lock
/// serializes all mutations, which satisfies the per-key requirement.
#[derive(Default)]
pub struct MemoryTagStore {
    guilds: RwLock<HashMap<GuildId, HashMap<String, TagRecord>>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn get_all(&self, guild: GuildId) -> Result<HashMap<String, TagRecord>, StoreError> {
        let guilds = self.guilds.read().await;
        Ok(guilds.get(&guild).cloned().unwrap_or_default())
    }

    async fn get(&self, guild: GuildId, name: &str) -> Result<Option<TagRecord>, StoreError> {
        let guilds = self.guilds.read().await;
        Ok(guilds.get(&guild).and_then(|tags| tags.get(name)).cloned())
    }

    async fn put(&self, record: TagRecord) -> Result<(), StoreError> {
        let mut guilds = self.guilds.write().await;
        guilds
            .entry(record.guild)
            .or_default()
            .insert(record.name.clone(), record);
        Ok(())
    }

    async fn mutate(
        &self,
        guild: GuildId,
        name: &str,
        op: MutateFn,
    ) -> Result<Option<TagRecord>, StoreError> {
        let mut guilds = self.guilds.write().await;
        let Some(record) = guilds.get_mut(&guild).and_then(|tags| tags.get_mut(name)) else {
            return Ok(None);
        };
        op(record);
        Ok(Some(record.clone()))
    }

    async fn remove(&self, guild: GuildId, name: &str) -> Result<Option<TagRecord>, StoreError> {
        let mut guilds = self.guilds.write().await;
        Ok(guilds.get_mut(&guild).and_then(|tags| tags.remove(name)))
    }

    async fn clear(&self, guild: GuildId) -> Result<(), StoreError> {
        let mut guilds = self.guilds.write().await;
        guilds.remove(&guild);
        Ok(())
    }

    async fn guild_names(&self) -> Result<HashMap<GuildId, HashSet<String>>, StoreError> {
        let guilds = self.guilds.read().await;
        Ok(guilds
            .iter()
            .map(|(guild, tags)| (*guild, tags.keys().cloned().collect()))
            .collect())
    }
}
