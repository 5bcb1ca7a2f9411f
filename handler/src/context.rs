use bb8_redis::RedisConnectionManager;

use lantern_framework::settings::SettingsStore;

use crate::modules::settings::GuildSettings;

pub type RedisPool = bb8::Pool<RedisConnectionManager>;

/// Shared services every handler gets a clone of.
#[derive(Clone)]
pub struct Services {
    pub redis: RedisPool,
    pub settings: SettingsStore<GuildSettings>,
}

pub type CommandContext = lantern_framework::CommandContext<Services>;
pub type AutocompleteContext = lantern_framework::AutocompleteContext<Services>;
pub type EventContext = lantern_framework::EventContext<Services>;
