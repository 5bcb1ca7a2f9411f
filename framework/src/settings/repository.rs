use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use twilight_model::id::{marker::GuildMarker, Id};

use super::store::{merge, SettingsPatch, SettingsRecord};
use crate::Error;

/// Where settings records are persisted.
#[async_trait]
pub trait SettingsRepository<R: SettingsRecord>: Send + Sync {
    async fn get_or_create(&self, guild_id: Id<GuildMarker>) -> Result<R, Error>;

    /// Merge `patch` into the stored record and return what was persisted.
    async fn upsert(&self, guild_id: Id<GuildMarker>, patch: SettingsPatch) -> Result<R, Error>;

    async fn upsert_field(
        &self,
        guild_id: Id<GuildMarker>,
        key: &str,
        value: Value,
    ) -> Result<R, Error> {
        let mut patch = SettingsPatch::new();
        patch.insert(key.to_string(), value);
        self.upsert(guild_id, patch).await
    }
}

/// Keeps records in process memory, for tests and single process setups.
pub struct MemoryRepository<R: SettingsRecord> {
    records: Mutex<HashMap<Id<GuildMarker>, R>>,
}

impl<R: SettingsRecord> MemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl<R: SettingsRecord> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: SettingsRecord> SettingsRepository<R> for MemoryRepository<R> {
    async fn get_or_create(&self, guild_id: Id<GuildMarker>) -> Result<R, Error> {
        Ok(self.records.lock().entry(guild_id).or_default().clone())
    }

    async fn upsert(&self, guild_id: Id<GuildMarker>, patch: SettingsPatch) -> Result<R, Error> {
        let mut records = self.records.lock();
        let record = records.entry(guild_id).or_default();
        *record = merge(record, patch)?;
        Ok(record.clone())
    }
}
