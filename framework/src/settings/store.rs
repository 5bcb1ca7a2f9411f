use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use twilight_model::id::{marker::GuildMarker, Id};

use super::repository::SettingsRepository;
use crate::{error::ConfigError, Error};

/// A partial settings record, field name to new value.
pub type SettingsPatch = serde_json::Map<String, Value>;

/// Per-guild settings struct. Fields are looked up through the record's JSON
/// object form, so every field has to serialize, `None` included.
pub trait SettingsRecord:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
}

impl<R> SettingsRecord for R where
    R: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
}

pub fn to_object<R: SettingsRecord>(record: &R) -> Result<SettingsPatch, Error> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(format!("settings record serialized to {} instead of an object", other).into()),
    }
}

pub fn from_object<R: SettingsRecord>(object: SettingsPatch) -> Result<R, Error> {
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Apply `patch` on top of `record`.
pub fn merge<R: SettingsRecord>(record: &R, patch: SettingsPatch) -> Result<R, Error> {
    let mut object = to_object(record)?;
    object.extend(patch);
    from_object(object)
}

pub fn check_fields<'a, R: SettingsRecord>(
    keys: impl IntoIterator<Item = &'a String>,
) -> Result<(), Error> {
    let fields = to_object(&R::default())?;
    for key in keys {
        if !fields.contains_key(key) {
            return Err(ConfigError::UnknownField(key.clone()).into());
        }
    }
    Ok(())
}

/// Something holding cached per-guild state that can be dropped.
pub trait GuildCache: Send + Sync {
    fn name(&self) -> &str;
    fn clear(&self, guild_id: Id<GuildMarker>);
}

/// Read-through cache of one settings record per guild, optionally backed by
/// a repository.
pub struct SettingsStore<R: SettingsRecord> {
    name: String,
    repository: Option<Arc<dyn SettingsRepository<R>>>,
    cache: Arc<RwLock<HashMap<Id<GuildMarker>, R>>>,
}

impl<R: SettingsRecord> Clone for SettingsStore<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            repository: self.repository.clone(),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R: SettingsRecord> SettingsStore<R> {
    /// A store that only lives in memory.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            repository: None,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_repository(name: &str, repository: Arc<dyn SettingsRepository<R>>) -> Self {
        Self {
            repository: Some(repository),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_repository(&self) -> bool {
        self.repository.is_some()
    }

    pub fn is_cached(&self, guild_id: Id<GuildMarker>) -> bool {
        self.cache.read().contains_key(&guild_id)
    }

    /// Cached record, or whatever the repository has (creating it if needed).
    /// Without a repository an uncached guild has no record.
    pub async fn get(&self, guild_id: Id<GuildMarker>) -> Result<Option<R>, Error> {
        let cached = self.cache.read().get(&guild_id).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let Some(repository) = &self.repository else {
            return Ok(None);
        };

        let record = repository.get_or_create(guild_id).await?;
        self.cache.write().insert(guild_id, record.clone());

        tracing::trace!(store = %self.name, %guild_id, "loaded settings");

        Ok(Some(record))
    }

    /// One field of the record, `None` if there's no record or the field is null.
    pub async fn get_value(
        &self,
        guild_id: Id<GuildMarker>,
        key: &str,
    ) -> Result<Option<Value>, Error> {
        check_fields::<R>([&key.to_string()])?;

        let Some(record) = self.get(guild_id).await? else {
            return Ok(None);
        };

        Ok(to_object(&record)?.remove(key).filter(|value| !value.is_null()))
    }

    pub async fn get_typed<V: DeserializeOwned>(
        &self,
        guild_id: Id<GuildMarker>,
        key: &str,
    ) -> Result<Option<V>, Error> {
        match self.get_value(guild_id, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Write `patch` through the repository and cache what it persisted.
    /// Without a repository the patch is merged into the cached record.
    pub async fn set(&self, guild_id: Id<GuildMarker>, patch: SettingsPatch) -> Result<R, Error> {
        check_fields::<R>(patch.keys())?;

        let record = match &self.repository {
            Some(repository) => repository.upsert(guild_id, patch).await?,
            None => {
                let current = self.cache.read().get(&guild_id).cloned().unwrap_or_default();
                merge(&current, patch)?
            }
        };

        self.cache.write().insert(guild_id, record.clone());
        Ok(record)
    }

    /// Write a single field. Without a repository this changes the cached
    /// record in place instead of going through [`SettingsStore::set`].
    pub async fn set_value(
        &self,
        guild_id: Id<GuildMarker>,
        key: &str,
        value: Value,
    ) -> Result<R, Error> {
        check_fields::<R>([&key.to_string()])?;

        if let Some(repository) = &self.repository {
            let record = repository.upsert_field(guild_id, key, value).await?;
            self.cache.write().insert(guild_id, record.clone());
            return Ok(record);
        }

        let mut cache = self.cache.write();
        let record = cache.entry(guild_id).or_default();
        let mut object = to_object(record)?;
        object.insert(key.to_string(), value);
        *record = from_object(object)?;

        Ok(record.clone())
    }

    /// Forget the cached record, the repository keeps it.
    pub fn clear(&self, guild_id: Id<GuildMarker>) {
        self.cache.write().remove(&guild_id);
    }
}

impl<R: SettingsRecord> GuildCache for SettingsStore<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&self, guild_id: Id<GuildMarker>) {
        SettingsStore::clear(self, guild_id);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_utils::{CountingRepository, TestSettings};

    fn guild() -> Id<GuildMarker> {
        Id::new(1)
    }

    fn patch(value: Value) -> SettingsPatch {
        match value {
            Value::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[tokio::test]
    async fn get_reads_through_once() {
        let repository = Arc::new(CountingRepository::default());
        let store = SettingsStore::<TestSettings>::with_repository("test", repository.clone());

        let first = store.get(guild()).await.expect("get");
        let second = store.get(guild()).await.expect("get");

        assert_eq!(repository.gets(), 1);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn get_without_repository_is_none() {
        let store = SettingsStore::<TestSettings>::new("test");
        assert_eq!(store.get(guild()).await.expect("get"), None);
        assert_eq!(store.get_value(guild(), "roleID").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_caches_persisted_record() {
        let repository = Arc::new(CountingRepository::default());
        let store = SettingsStore::<TestSettings>::with_repository("test", repository.clone());

        // the repository trims whitespace, like a server-side normaliser would
        store
            .set(guild(), patch(json!({ "prefix": "  !  " })))
            .await
            .expect("set");

        let record = store.get(guild()).await.expect("get").expect("record");
        assert_eq!(record.prefix.as_deref(), Some("!"));
        assert_eq!(repository.upserts(), 1);
        assert_eq!(repository.gets(), 0);
    }

    #[tokio::test]
    async fn set_without_repository_merges_into_cache() {
        let store = SettingsStore::<TestSettings>::new("test");

        store
            .set(guild(), patch(json!({ "prefix": "!" })))
            .await
            .expect("set");
        store
            .set(guild(), patch(json!({ "enabled": true })))
            .await
            .expect("set");

        let record = store.get(guild()).await.expect("get").expect("record");
        assert_eq!(record.prefix.as_deref(), Some("!"));
        assert_eq!(record.enabled, Some(true));
    }

    // set_value goes through the repository's single-field upsert when there is
    // one, and edits the cached record directly when there isn't
    #[tokio::test]
    async fn set_value_paths_differ_by_repository() {
        let repository = Arc::new(CountingRepository::default());
        let backed = SettingsStore::<TestSettings>::with_repository("test", repository.clone());
        backed
            .set_value(guild(), "prefix", json!(" ? "))
            .await
            .expect("set_value");
        assert_eq!(repository.field_upserts(), 1);
        assert_eq!(
            backed.get_typed::<String>(guild(), "prefix").await.expect("get"),
            Some("?".to_string())
        );

        let memory = SettingsStore::<TestSettings>::new("test");
        memory
            .set_value(guild(), "prefix", json!(" ? "))
            .await
            .expect("set_value");
        assert_eq!(
            memory.get_typed::<String>(guild(), "prefix").await.expect("get"),
            Some(" ? ".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_fields_never_reach_the_repository() {
        let repository = Arc::new(CountingRepository::default());
        let store = SettingsStore::<TestSettings>::with_repository("test", repository.clone());

        let err = store
            .set(guild(), patch(json!({ "nope": 1 })))
            .await
            .expect_err("unknown field");

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownField("nope".into()))
        );
        assert_eq!(repository.upserts(), 0);
    }

    #[tokio::test]
    async fn clear_only_drops_the_cache() {
        let repository = Arc::new(CountingRepository::default());
        let store = SettingsStore::<TestSettings>::with_repository("test", repository.clone());

        store.get(guild()).await.expect("get");
        GuildCache::clear(&store, guild());
        assert!(!store.is_cached(guild()));

        store.get(guild()).await.expect("get");
        assert_eq!(repository.gets(), 2);
    }
}
