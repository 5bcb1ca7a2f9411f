use serde::{Deserialize, Serialize};
use twilight_gateway::{Event, EventType};
use twilight_model::{channel::ChannelType, guild::Permissions};
use twilight_util::builder::command::StringBuilder;

use lantern_framework::{
    context::EventPayload,
    handler_func,
    settings::{EnumValue, GuildSettingOption, OptionKind, SettingOption, SettingsStore},
    transport::{AutocompleteChoice, MAX_AUTOCOMPLETE_CHOICES},
    CommandNode, Error, Module, ModuleBuilder, UserError,
};

use crate::context::{AutocompleteContext, CommandContext, EventContext, Services};

/// Everything `/config` can change for a server. Ids are kept as strings.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GuildSettings {
    pub log_channel_id: Option<String>,
    pub moderator_role_ids: Option<Vec<String>>,
    pub welcome_enabled: Option<bool>,
    pub welcome_channel_id: Option<String>,
    pub welcome_message: Option<String>,
    pub starboard_threshold: Option<i64>,
    pub starboard_emoji_id: Option<String>,
    pub starboard_emoji_name: Option<String>,
    pub language: Option<String>,
}

pub(crate) fn options(store: &SettingsStore<GuildSettings>) -> Vec<GuildSettingOption<GuildSettings>> {
    let text_channels = vec![ChannelType::GuildText, ChannelType::GuildAnnouncement];

    vec![
        GuildSettingOption::new(
            "Log channel",
            "Where moderation actions get posted",
            OptionKind::Channel {
                channel_types: text_channels.clone(),
            },
        )
        .nullable()
        .bind(store, "log_channel_id"),
        GuildSettingOption::new(
            "Moderator roles",
            "Roles allowed to use moderation commands",
            OptionKind::RoleArray {
                minimum: None,
                maximum: Some(10),
            },
        )
        .nullable()
        .bind(store, "moderator_role_ids"),
        GuildSettingOption::new(
            "Welcome messages",
            "Greet new members",
            OptionKind::Boolean,
        )
        .bind(store, "welcome_enabled"),
        GuildSettingOption::new(
            "Welcome channel",
            "Where new members are greeted",
            OptionKind::Channel {
                channel_types: text_channels,
            },
        )
        .nullable()
        .bind(store, "welcome_channel_id"),
        GuildSettingOption::new(
            "Welcome text",
            "The greeting, {user} is replaced with a mention",
            OptionKind::String {
                minimum: Some(3),
                maximum: Some(1000),
            },
        )
        .nullable()
        .bind(store, "welcome_message"),
        GuildSettingOption::new(
            "Starboard threshold",
            "Reactions needed before a message is pinned to the starboard",
            OptionKind::Integer {
                minimum: Some(1),
                maximum: Some(100),
            },
        )
        .bind(store, "starboard_threshold"),
        GuildSettingOption::new(
            "Starboard emoji",
            "The reaction that counts towards the starboard",
            OptionKind::EmojiPair,
        )
        .nullable()
        .bind_pair(store, "starboard_emoji_id", "starboard_emoji_name"),
        GuildSettingOption::new(
            "Language",
            "Language of the bot's messages",
            OptionKind::Enum {
                values: vec![
                    EnumValue::new("English", "en"),
                    EnumValue::new("Nederlands", "nl"),
                    EnumValue::new("Deutsch", "de"),
                ],
            },
        )
        .bind(store, "language"),
    ]
}

pub(crate) fn build(store: &SettingsStore<GuildSettings>) -> Module<Services> {
    let config = CommandNode::group("config", "View or change this server's settings")
        .guild_only()
        .subcommand(
            CommandNode::leaf("view", "Show the current settings", handler_func!(view))
                .permissions(Permissions::MANAGE_GUILD),
        )
        .subcommand(
            CommandNode::leaf("edit", "Change a setting", handler_func!(edit))
                .permissions(Permissions::MANAGE_GUILD)
                .autocomplete_option(
                    StringBuilder::new("setting", "The setting to change")
                        .required(true)
                        .build(),
                    handler_func!(complete_setting),
                ),
        );

    options(store)
        .into_iter()
        .fold(
            ModuleBuilder::<Services>::new("settings")
                .name("Settings")
                .description("Per server configuration")
                .store(store)
                .command(config)
                .event(EventType::GuildDelete, handler_func!(guild_removed)),
            |builder, option| builder.setting(option),
        )
        .build()
}

async fn view(ctx: CommandContext) -> Result<(), Error> {
    let mut lines = Vec::new();
    for option in options(&ctx.services.settings) {
        lines.push(format!("**{}**: {}", option.name(), option.view(&ctx.handle).await?));
    }

    ctx.reply_ephemeral(lines.join("\n")).await
}

async fn edit(ctx: CommandContext) -> Result<(), Error> {
    let name = ctx.get_arg_string("setting")?;
    let Some(option) = options(&ctx.services.settings)
        .into_iter()
        .find(|option| option.name().eq_ignore_ascii_case(name.trim()))
    else {
        return Err(UserError::new(format!("There's no setting called \"{}\".", name)).into());
    };

    let outcome = option.edit(&ctx.handle).await?;
    tracing::debug!(setting = option.name(), ?outcome, "setting edit finished");

    Ok(())
}

/// Setting names containing `query`, ignoring case.
fn matching(
    options: &[GuildSettingOption<GuildSettings>],
    query: &str,
) -> Vec<AutocompleteChoice> {
    let query = query.trim().to_lowercase();
    options
        .iter()
        .filter(|option| option.name().to_lowercase().contains(&query))
        .take(MAX_AUTOCOMPLETE_CHOICES)
        .map(|option| AutocompleteChoice::new(option.name(), option.name()))
        .collect()
}

async fn complete_setting(ctx: AutocompleteContext) -> Result<Vec<AutocompleteChoice>, Error> {
    Ok(matching(&options(&ctx.services.settings), &ctx.query()))
}

async fn guild_removed(ctx: EventContext) -> Result<(), Error> {
    let EventPayload::Gateway(Event::GuildDelete(guild)) = &ctx.event else {
        return Ok(());
    };

    ctx.registry.clear_guild(guild.id);
    tracing::debug!(guild = %guild.id, "dropped cached guild state");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lantern_framework::{settings::store::check_fields, Registry};

    use super::*;

    fn store() -> SettingsStore<GuildSettings> {
        SettingsStore::new("guild")
    }

    #[test]
    fn every_option_is_bound_to_a_field() {
        let options = options(&store());
        let keys: Vec<String> = options
            .iter()
            .map(|option| option.key().expect("bound").to_string())
            .collect();

        assert_eq!(keys.len(), options.len());
        check_fields::<GuildSettings>(&keys).expect("known fields");
    }

    #[test]
    fn option_names_are_unique() {
        let options = options(&store());
        let names: HashSet<String> = options
            .iter()
            .map(|option| option.name().to_lowercase())
            .collect();
        assert_eq!(names.len(), options.len());
    }

    #[test]
    fn autocomplete_filters_by_name() {
        let options = options(&store());

        let names: Vec<String> = matching(&options, "WELCOME")
            .into_iter()
            .map(|choice| choice.name)
            .collect();
        assert_eq!(
            names,
            vec!["Welcome messages", "Welcome channel", "Welcome text"]
        );

        assert_eq!(matching(&options, "").len(), options.len());
        assert!(matching(&options, "nope").is_empty());
    }

    #[tokio::test]
    async fn module_exposes_config_command_and_settings() {
        let store = store();
        let mut module = build(&store);
        module.initialize().await.expect("initialize");

        let mut registry = Registry::new();
        registry.register(&mut module).expect("register");

        let edit = registry.find_command("config edit").expect("config edit");
        assert_eq!(edit.default_member_permissions(), Some(Permissions::MANAGE_GUILD));
        assert_eq!(
            registry.config("settings").map(|config| config.len()),
            Some(options(&store).len())
        );
        assert_eq!(registry.global_commands().len(), 1);
    }
}
