use serde::{Deserialize, Serialize};
use serde_envfile::Error;
use twilight_model::id::{
    marker::{GuildMarker, UserMarker},
    Id,
};

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub discord_token: String,
    pub redis_url: String,

    /// comma separated user ids allowed to run owner only commands
    #[serde(default)]
    pub owner_ids: Option<String>,
    /// sync every command to this guild only, for development
    #[serde(default)]
    pub dev_guild_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        serde_envfile::from_env()
    }

    /// Invalid entries are logged and skipped.
    pub fn owners(&self) -> Vec<Id<UserMarker>> {
        self.owner_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .filter_map(|id| match id.parse::<u64>().ok().and_then(Id::new_checked) {
                Some(id) => Some(id),
                None => {
                    tracing::warn!("ignoring invalid owner id {:?}", id);
                    None
                }
            })
            .collect()
    }

    pub fn dev_guild(&self) -> Option<Id<GuildMarker>> {
        self.dev_guild_id.and_then(Id::new_checked)
    }
}
