use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use twilight_model::{
    application::{
        command::{Command, CommandOptionType},
        interaction::application_command::{CommandDataOption, CommandOptionValue},
    },
    channel::message::component::ComponentType,
    id::{marker::GuildMarker, Id},
};

use crate::{
    command::CommandNode,
    context::{CommandContext, Context, InteractionContext},
    interaction::{
        CommandInput, ComponentInput, Interaction, InteractionData, InteractionHandle, ModalField,
        ModalInput,
    },
    settings::{store::merge, SettingsPatch, SettingsRepository},
    transport::{CustomEmoji, Reply, Response, Transport},
    waiter::Waiter,
    Error, EventMeta,
};

#[derive(Clone, Debug, Default)]
pub struct Services;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TestSettings {
    pub enabled: Option<bool>,
    pub limit: Option<i64>,
    pub ratio: Option<f64>,
    pub prefix: Option<String>,
    pub mode: Option<String>,
    #[serde(rename = "roleID")]
    pub role_id: Option<String>,
    pub roles: Option<Vec<String>>,
    pub channel_id: Option<String>,
    pub channels: Option<Vec<String>>,
    pub emoji_id: Option<String>,
    pub emoji_name: Option<String>,
}

/// Records everything sent to Discord.
#[derive(Default)]
pub struct MockTransport {
    emojis: Vec<CustomEmoji>,
    responses: Mutex<Vec<Response>>,
    edits: Mutex<Vec<Reply>>,
    global_commands: Mutex<Option<Vec<Command>>>,
    guild_commands: Mutex<HashMap<Id<GuildMarker>, Vec<Command>>>,
}

impl MockTransport {
    pub fn with_emojis(emojis: Vec<CustomEmoji>) -> Self {
        Self {
            emojis,
            ..Default::default()
        }
    }

    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().clone()
    }

    pub fn edits(&self) -> Vec<Reply> {
        self.edits.lock().clone()
    }

    pub fn global_commands(&self) -> Option<Vec<Command>> {
        self.global_commands.lock().clone()
    }

    pub fn guild_commands(&self, guild_id: Id<GuildMarker>) -> Option<Vec<Command>> {
        self.guild_commands.lock().get(&guild_id).cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn respond(&self, _interaction: &Interaction, response: Response) -> Result<(), Error> {
        self.responses.lock().push(response);
        Ok(())
    }

    async fn edit_original(&self, _interaction: &Interaction, reply: Reply) -> Result<(), Error> {
        self.edits.lock().push(reply);
        Ok(())
    }

    async fn guild_emojis(&self, _guild_id: Id<GuildMarker>) -> Result<Vec<CustomEmoji>, Error> {
        Ok(self.emojis.clone())
    }

    async fn set_global_commands(&self, commands: &[Command]) -> Result<(), Error> {
        *self.global_commands.lock() = Some(commands.to_vec());
        Ok(())
    }

    async fn set_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: &[Command],
    ) -> Result<(), Error> {
        self.guild_commands
            .lock()
            .insert(guild_id, commands.to_vec());
        Ok(())
    }
}

/// In-memory repository that counts calls and trims string values on write,
/// standing in for a store that normalises what it persists.
#[derive(Default)]
pub struct CountingRepository {
    records: Mutex<HashMap<Id<GuildMarker>, TestSettings>>,
    patches: Mutex<Vec<SettingsPatch>>,
    gets: AtomicUsize,
    upserts: AtomicUsize,
    field_upserts: AtomicUsize,
}

impl CountingRepository {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn field_upserts(&self) -> usize {
        self.field_upserts.load(Ordering::SeqCst)
    }

    pub fn last_patch(&self) -> Option<SettingsPatch> {
        self.patches.lock().last().cloned()
    }

    fn write(&self, guild_id: Id<GuildMarker>, patch: SettingsPatch) -> Result<TestSettings, Error> {
        let patch: SettingsPatch = patch
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, Value::String(text.trim().to_string())),
                other => (key, other),
            })
            .collect();

        let mut records = self.records.lock();
        let record = records.entry(guild_id).or_default();
        *record = merge(record, patch)?;
        Ok(record.clone())
    }
}

#[async_trait]
impl SettingsRepository<TestSettings> for CountingRepository {
    async fn get_or_create(&self, guild_id: Id<GuildMarker>) -> Result<TestSettings, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().entry(guild_id).or_default().clone())
    }

    async fn upsert(
        &self,
        guild_id: Id<GuildMarker>,
        patch: SettingsPatch,
    ) -> Result<TestSettings, Error> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.patches.lock().push(patch.clone());
        self.write(guild_id, patch)
    }

    async fn upsert_field(
        &self,
        guild_id: Id<GuildMarker>,
        key: &str,
        value: Value,
    ) -> Result<TestSettings, Error> {
        self.field_upserts.fetch_add(1, Ordering::SeqCst);
        let mut patch = SettingsPatch::new();
        patch.insert(key.to_string(), value);
        self.write(guild_id, patch)
    }
}

pub fn command_interaction(id: u64, name: &str, options: Vec<CommandDataOption>) -> Interaction {
    Interaction::new(
        Id::new(id),
        "token",
        InteractionData::Command(CommandInput::new(name, options)),
    )
}

pub fn component_interaction(id: u64, custom_id: &str, values: &[&str]) -> Interaction {
    Interaction::new(
        Id::new(id),
        "token",
        InteractionData::Component(ComponentInput {
            custom_id: custom_id.to_string(),
            component_type: ComponentType::TextSelectMenu,
            values: values.iter().map(|value| value.to_string()).collect(),
        }),
    )
}

pub fn modal_interaction(id: u64, custom_id: &str, fields: &[(&str, &str)]) -> Interaction {
    Interaction::new(
        Id::new(id),
        "token",
        InteractionData::Modal(ModalInput {
            custom_id: custom_id.to_string(),
            fields: fields
                .iter()
                .map(|(custom_id, value)| ModalField {
                    custom_id: custom_id.to_string(),
                    value: Some(value.to_string()),
                })
                .collect(),
        }),
    )
}

pub fn sub(name: &str, options: Vec<CommandDataOption>) -> CommandDataOption {
    CommandDataOption {
        name: name.to_string(),
        value: CommandOptionValue::SubCommand(options),
    }
}

pub fn sub_group(name: &str, options: Vec<CommandDataOption>) -> CommandDataOption {
    CommandDataOption {
        name: name.to_string(),
        value: CommandOptionValue::SubCommandGroup(options),
    }
}

pub fn focused(name: &str, text: &str) -> CommandDataOption {
    CommandDataOption {
        name: name.to_string(),
        value: CommandOptionValue::Focused(text.to_string(), CommandOptionType::String),
    }
}

pub fn focused_integer(name: &str, text: &str) -> CommandDataOption {
    CommandDataOption {
        name: name.to_string(),
        value: CommandOptionValue::Focused(text.to_string(), CommandOptionType::Integer),
    }
}

pub fn context(transport: Arc<MockTransport>) -> Context<Services> {
    Context::new(Id::new(1), Services, transport)
}

pub fn interaction_context(
    interaction: Interaction,
) -> (InteractionContext<Services>, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::default());
    let ctx = InteractionContext::new(EventMeta::new(0), &context(transport.clone()), interaction);
    (ctx, transport)
}

pub fn command_context(
    node: &CommandNode<Services>,
    options: Vec<CommandDataOption>,
) -> CommandContext<Services> {
    let (ctx, _) = interaction_context(command_interaction(1, node.name(), options.clone()));
    CommandContext {
        meta: ctx.meta,
        application_id: ctx.application_id,
        services: ctx.services,
        handle: ctx.handle,
        command: CommandInput::new(node.name(), options.clone()),
        path: node.path().to_string(),
        options,
    }
}

/// A handle for a command run in `guild`, answering through `transport`.
pub fn command_handle_with(guild: u64, transport: Arc<MockTransport>) -> InteractionHandle {
    InteractionHandle::new(
        command_interaction(1, "config", vec![]).guild(Id::new(guild)),
        transport,
        Waiter::new(),
    )
}

pub fn command_handle(id: u64) -> (InteractionHandle, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::default());
    let handle = InteractionHandle::new(
        command_interaction(id, "config", vec![]).guild(Id::new(1)),
        transport.clone(),
        Waiter::new(),
    );
    (handle, transport)
}
