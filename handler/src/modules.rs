use lantern_framework::{settings::SettingsStore, Module};

use crate::{context::Services, modules::settings::GuildSettings};

pub mod core;
pub mod settings;

/// Every module the bot runs, in registration order.
pub(crate) fn all(settings: &SettingsStore<GuildSettings>) -> Vec<Module<Services>> {
    vec![self::core::build(), self::settings::build(settings)]
}
