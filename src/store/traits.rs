//! Persistent tag store trait — single async interface for all backends.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::platform::GuildId;
use crate::tags::model::TagRecord;

/// Scoped read-modify-write operation, applied under the store's write lock.
pub type MutateFn = Box<dyn FnOnce(&mut TagRecord) + Send>;

/// Backend-agnostic persistent store: durable per-guild map name → TagRecord.
///
/// Implementations must serialize writes per guild key — `mutate` is the
/// race-safe path for counter increments and body edits.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// All tags stored for a guild.
    async fn get_all(&self, guild: GuildId) -> Result<HashMap<String, TagRecord>, StoreError>;

    /// Exact-name lookup.
    async fn get(&self, guild: GuildId, name: &str) -> Result<Option<TagRecord>, StoreError>;

    /// Insert or overwrite a record under `(record.guild, record.name)`.
    async fn put(&self, record: TagRecord) -> Result<(), StoreError>;

    /// Apply `op` to a record in one read-modify-write. Returns the updated
    /// record, or `None` when the tag does not exist (op not applied).
    async fn mutate(
        &self,
        guild: GuildId,
        name: &str,
        op: MutateFn,
    ) -> Result<Option<TagRecord>, StoreError>;

    /// Remove a tag, returning the removed record if it existed.
    async fn remove(&self, guild: GuildId, name: &str) -> Result<Option<TagRecord>, StoreError>;

    /// Remove every tag in a guild.
    async fn clear(&self, guild: GuildId) -> Result<(), StoreError>;

    /// Name sets for every guild — the cache hydration snapshot.
    async fn guild_names(&self) -> Result<HashMap<GuildId, HashSet<String>>, StoreError>;
}
