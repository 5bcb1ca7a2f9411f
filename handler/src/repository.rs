use std::marker::PhantomData;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use twilight_model::id::{marker::GuildMarker, Id};

use lantern_framework::{
    settings::{store::merge, SettingsPatch, SettingsRecord, SettingsRepository},
    Error,
};

use crate::context::RedisPool;

/// Keeps one JSON document per guild in redis.
pub struct RedisRepository<R: SettingsRecord> {
    redis: RedisPool,
    namespace: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: SettingsRecord> RedisRepository<R> {
    pub fn new(redis: RedisPool, namespace: &str) -> Self {
        Self {
            redis,
            namespace: namespace.to_string(),
            _record: PhantomData,
        }
    }

    fn key(&self, guild_id: Id<GuildMarker>) -> String {
        format!("lantern:settings:{}:{}", self.namespace, guild_id)
    }

    async fn load(&self, key: &str) -> Result<Option<R>, Error> {
        let raw: Option<String> = self.redis.get().await?.get(key).await?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn store(&self, key: &str, record: &R) -> Result<(), Error> {
        self.redis
            .get()
            .await?
            .set::<_, _, ()>(key, serde_json::to_string(record)?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<R: SettingsRecord> SettingsRepository<R> for RedisRepository<R> {
    async fn get_or_create(&self, guild_id: Id<GuildMarker>) -> Result<R, Error> {
        let key = self.key(guild_id);
        if let Some(record) = self.load(&key).await? {
            return Ok(record);
        }

        tracing::debug!(%guild_id, namespace = %self.namespace, "creating settings record");
        let record = R::default();
        self.store(&key, &record).await?;
        Ok(record)
    }

    async fn upsert(&self, guild_id: Id<GuildMarker>, patch: SettingsPatch) -> Result<R, Error> {
        let key = self.key(guild_id);
        let current = self.load(&key).await?.unwrap_or_default();

        let record = merge(&current, patch)?;
        self.store(&key, &record).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use bb8_redis::RedisConnectionManager;

    use super::*;
    use crate::modules::settings::GuildSettings;

    #[tokio::test]
    async fn keys_are_namespaced_per_guild() {
        // build_unchecked doesn't connect, so no server is needed
        let manager = RedisConnectionManager::new("redis://localhost").expect("manager");
        let pool = bb8::Pool::builder().build_unchecked(manager);
        let repository = RedisRepository::<GuildSettings>::new(pool, "guild");

        assert_eq!(repository.key(Id::new(42)), "lantern:settings:guild:42");
    }
}
