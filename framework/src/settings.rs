pub mod emoji;
pub mod option;
pub mod repository;
pub mod store;

pub use option::{
    EditOutcome, EnumValue, GuildSettingOption, OptionKind, SettingOption, DEFAULT_TIMEOUT,
    TIMED_OUT_MESSAGE,
};
pub use repository::{MemoryRepository, SettingsRepository};
pub use store::{GuildCache, SettingsPatch, SettingsRecord, SettingsStore};
