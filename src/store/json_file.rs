//! JSON-file tag store.
//!
//! On-disk layout is exactly guild → name → {author, uses, tag, created_at},
//! one JSON document for the whole store. The full map is rewritten after
//! every mutation; writes are serialized by the interior lock.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::platform::{GuildId, UserId};
use crate::store::traits::{MutateFn, TagStore};
use crate::tags::model::TagRecord;

/// One tag as persisted on disk. Name and guild live in the enclosing keys.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTag {
    author: u64,
    uses: u64,
    tag: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

type DiskLayout = HashMap<String, HashMap<String, StoredTag>>;

/// File-backed store with the in-memory map as source of truth between
/// flushes.
pub struct JsonFileStore {
    path: PathBuf,
    guilds: RwLock<HashMap<GuildId, HashMap<String, TagRecord>>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading existing data if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let guilds = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let disk: DiskLayout = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                from_disk(disk)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        debug!(path = %path.display(), guilds = guilds.len(), "Opened tag store");
        Ok(Self {
            path,
            guilds: RwLock::new(guilds),
        })
    }

    /// Flush the current map to disk. Called under the write lock so flushes
    /// never interleave.
    async fn persist(
        &self,
        guilds: &HashMap<GuildId, HashMap<String, TagRecord>>,
    ) -> Result<(), StoreError> {
        let disk = to_disk(guilds);
        let raw = serde_json::to_string_pretty(&disk)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

fn from_disk(disk: DiskLayout) -> Result<HashMap<GuildId, HashMap<String, TagRecord>>, StoreError> {
    let mut guilds = HashMap::new();
    for (guild_key, tags) in disk {
        let guild_id: u64 = guild_key
            .parse()
            .map_err(|_| StoreError::Serialization(format!("bad guild key `{guild_key}`")))?;
        let guild = GuildId(guild_id);
        let records = tags
            .into_iter()
            .map(|(name, stored)| {
                let record = TagRecord {
                    name: name.clone(),
                    guild,
                    owner: UserId(stored.author),
                    template: stored.tag,
                    uses: stored.uses,
                    created_at: stored.created_at,
                };
                (name, record)
            })
            .collect();
        guilds.insert(guild, records);
    }
    Ok(guilds)
}

fn to_disk(guilds: &HashMap<GuildId, HashMap<String, TagRecord>>) -> DiskLayout {
    guilds
        .iter()
        .map(|(guild, tags)| {
            let stored = tags
                .iter()
                .map(|(name, record)| {
                    (
                        name.clone(),
                        StoredTag {
                            author: record.owner.0,
                            uses: record.uses,
                            tag: record.template.clone(),
                            created_at: record.created_at,
                        },
                    )
                })
                .collect();
            (guild.to_string(), stored)
        })
        .collect()
}

#[async_trait]
impl TagStore for JsonFileStore {
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
        self.persist(&guilds).await
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
        let updated = record.clone();
        self.persist(&guilds).await?;
        Ok(Some(updated))
    }

    async fn remove(&self, guild: GuildId, name: &str) -> Result<Option<TagRecord>, StoreError> {
        let mut guilds = self.guilds.write().await;
        let removed = guilds.get_mut(&guild).and_then(|tags| tags.remove(name));
        if removed.is_some() {
            self.persist(&guilds).await?;
        }
        Ok(removed)
    }

    async fn clear(&self, guild: GuildId) -> Result<(), StoreError> {
        let mut guilds = self.guilds.write().await;
        if guilds.remove(&guild).is_some() {
            self.persist(&guilds).await?;
        }
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
