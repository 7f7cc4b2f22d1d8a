//! Tag name cache — per-guild name sets for the message-intercept fast path.
//!
//! Lets `handle_message` reject non-tag messages in O(1) without touching the
//! store. False positives are harmless (the following store fetch misses);
//! false negatives hide live tags, so every name-membership-changing store
//! mutation must be followed by `refresh`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::platform::GuildId;
use crate::store::TagStore;

/// In-memory guild → name-set mirror of the store, eventually consistent.
///
/// Owned explicitly and injected into the pipeline: hydrated once at startup,
/// refreshed after mutations, dropped on shutdown. Interior lock lets
/// concurrent invocations read while a mutation refreshes.
pub struct TagNameCache {
    store: Arc<dyn TagStore>,
    names: RwLock<HashMap<GuildId, HashSet<String>>>,
}

impl TagNameCache {
    pub fn new(store: Arc<dyn TagStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            names: RwLock::new(HashMap::new()),
        })
    }

    /// O(1) membership check.
    pub async fn contains(&self, guild: GuildId, name: &str) -> bool {
        let names = self.names.read().await;
        names.get(&guild).is_some_and(|set| set.contains(name))
    }

    /// Reload one guild's name set from the store.
    pub async fn refresh(&self, guild: GuildId) -> Result<(), StoreError> {
        let tags = self.store.get_all(guild).await?;
        let set: HashSet<String> = tags.into_keys().collect();
        debug!(guild = %guild, names = set.len(), "Refreshed tag name cache");

        let mut names = self.names.write().await;
        if set.is_empty() {
            names.remove(&guild);
        } else {
            names.insert(guild, set);
        }
        Ok(())
    }

    /// Load every guild's name set from a full store snapshot. Startup only.
    pub async fn hydrate_all(&self) -> Result<(), StoreError> {
        let snapshot = self.store.guild_names().await?;
        info!(guilds = snapshot.len(), "Hydrated tag name cache");

        let mut names = self.names.write().await;
        *names = snapshot;
        Ok(())
    }

    /// Drop a guild's entry without consulting the store (used by `clear`).
    pub async fn evict(&self, guild: GuildId) {
        let mut names = self.names.write().await;
        names.remove(&guild);
    }
}
