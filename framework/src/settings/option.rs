use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use twilight_model::{
    channel::ChannelType,
    id::{marker::GuildMarker, Id},
};

use super::{
    emoji,
    store::{SettingsRecord, SettingsStore},
};
use crate::{
    error::{ConfigError, UserError},
    interaction::InteractionHandle,
    BoxFuture, Error,
};

mod edit;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const TIMED_OUT_MESSAGE: &str = "Timed out waiting for a response, nothing was changed.";

const NONE: &str = "*None*";

/// How an edit attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// the new value was written
    Committed,
    /// the user picked what was already stored, nothing written
    Unchanged,
    /// the input didn't validate, the user was told why
    Rejected,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub label: String,
    pub value: String,
}

impl EnumValue {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

pub type CustomViewFunc = fn(InteractionHandle) -> BoxFuture<'static, Result<String, Error>>;

pub type CustomEditFunc = fn(InteractionHandle) -> BoxFuture<'static, Result<EditOutcome, Error>>;

#[derive(Clone)]
pub enum OptionKind {
    Boolean,
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Float {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    /// bounds are in characters
    String {
        minimum: Option<usize>,
        maximum: Option<usize>,
    },
    Enum {
        values: Vec<EnumValue>,
    },
    Channel {
        channel_types: Vec<ChannelType>,
    },
    ChannelArray {
        channel_types: Vec<ChannelType>,
        minimum: Option<u8>,
        maximum: Option<u8>,
    },
    Role,
    RoleArray {
        minimum: Option<u8>,
        maximum: Option<u8>,
    },
    /// stored as two fields, the emoji id (custom emoji only) and its name
    EmojiPair,
    /// stores and renders itself, the option only names it
    Custom {
        view: CustomViewFunc,
        edit: CustomEditFunc,
    },
}

/// A guild setting as shown in a configuration menu.
#[async_trait]
pub trait SettingOption: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Current value formatted for display.
    async fn view(&self, handle: &InteractionHandle) -> Result<String, Error>;

    /// Run the interactive edit flow on `handle`, which must not have been
    /// responded to yet.
    async fn edit(&self, handle: &InteractionHandle) -> Result<EditOutcome, Error>;
}

struct Binding<R: SettingsRecord> {
    store: SettingsStore<R>,
    key: String,
    /// name field of an emoji pair
    secondary: Option<String>,
}

pub struct GuildSettingOption<R: SettingsRecord> {
    name: String,
    description: String,
    nullable: bool,
    timeout: Duration,
    kind: OptionKind,
    binding: Option<Binding<R>>,
}

impl<R: SettingsRecord> GuildSettingOption<R> {
    pub fn new(name: &str, description: &str, kind: OptionKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            nullable: false,
            timeout: DEFAULT_TIMEOUT,
            kind,
            binding: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// How long to wait for the user to answer a prompt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bind(mut self, store: &SettingsStore<R>, key: &str) -> Self {
        self.binding = Some(Binding {
            store: store.clone(),
            key: key.to_string(),
            secondary: None,
        });
        self
    }

    pub fn bind_pair(mut self, store: &SettingsStore<R>, id_key: &str, name_key: &str) -> Self {
        self.binding = Some(Binding {
            store: store.clone(),
            key: id_key.to_string(),
            secondary: Some(name_key.to_string()),
        });
        self
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn key(&self) -> Option<&str> {
        self.binding.as_ref().map(|binding| binding.key.as_str())
    }

    fn binding(&self) -> Result<&Binding<R>, ConfigError> {
        let binding = self
            .binding
            .as_ref()
            .ok_or_else(|| ConfigError::UnboundOption(self.name.clone()))?;

        if matches!(self.kind, OptionKind::EmojiPair) && binding.secondary.is_none() {
            return Err(ConfigError::UnboundOption(self.name.clone()));
        }

        Ok(binding)
    }

    async fn view_value(
        &self,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
    ) -> Result<String, Error> {
        let value = binding.store.get_value(guild_id, &binding.key).await?;
        let secondary = match &binding.secondary {
            Some(key) => binding.store.get_value(guild_id, key).await?,
            None => None,
        };

        Ok(self.render(value, secondary))
    }

    fn render(&self, value: Option<Value>, secondary: Option<Value>) -> String {
        if let OptionKind::EmojiPair = self.kind {
            return match (
                value.as_ref().and_then(as_text),
                secondary.as_ref().and_then(as_text),
            ) {
                (Some(id), Some(name)) => emoji::mention(&id, &name),
                (None, Some(name)) => name,
                _ => NONE.to_string(),
            };
        }

        let Some(value) = value else {
            return NONE.to_string();
        };

        match (&self.kind, value) {
            (OptionKind::Boolean, Value::Bool(true)) => "Enabled".to_string(),
            (OptionKind::Boolean, Value::Bool(false)) => "Disabled".to_string(),
            (OptionKind::Enum { values }, value) => {
                let raw = as_text(&value);
                values
                    .iter()
                    .find(|option| raw.as_deref() == Some(option.value.as_str()))
                    .map(|option| option.label.clone())
                    .or(raw)
                    .unwrap_or_else(|| NONE.to_string())
            }
            (OptionKind::Channel { .. }, value) => mention_or_none(&value, "<#", ">"),
            (OptionKind::Role, value) => mention_or_none(&value, "<@&", ">"),
            (OptionKind::ChannelArray { .. }, value) => mention_list(&value, "<#", ">"),
            (OptionKind::RoleArray { .. }, value) => mention_list(&value, "<@&", ">"),
            (_, Value::String(text)) if text.is_empty() => NONE.to_string(),
            (_, Value::String(text)) => text,
            (_, other) => other.to_string(),
        }
    }
}

fn guild_of(handle: &InteractionHandle) -> Result<Id<GuildMarker>, Error> {
    handle
        .interaction()
        .guild_id
        .ok_or_else(|| UserError::new("Settings can only be changed inside a server.").into())
}

/// Ids are stored as strings, but accept numbers too.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn mention_or_none(value: &Value, prefix: &str, suffix: &str) -> String {
    as_text(value)
        .map(|id| format!("{}{}{}", prefix, id, suffix))
        .unwrap_or_else(|| NONE.to_string())
}

fn mention_list(value: &Value, prefix: &str, suffix: &str) -> String {
    let Value::Array(items) = value else {
        return NONE.to_string();
    };

    let mentions: Vec<String> = items
        .iter()
        .filter_map(as_text)
        .map(|id| format!("{}{}{}", prefix, id, suffix))
        .collect();

    if mentions.is_empty() {
        NONE.to_string()
    } else {
        mentions.join(", ")
    }
}

#[async_trait]
impl<R: SettingsRecord> SettingOption for GuildSettingOption<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn view(&self, handle: &InteractionHandle) -> Result<String, Error> {
        if let OptionKind::Custom { view, .. } = &self.kind {
            return view(handle.clone()).await;
        }

        let binding = self.binding()?;
        let guild_id = guild_of(handle)?;
        self.view_value(binding, guild_id).await
    }

    async fn edit(&self, handle: &InteractionHandle) -> Result<EditOutcome, Error> {
        if let OptionKind::Custom { edit, .. } = &self.kind {
            return edit(handle.clone()).await;
        }

        let binding = self.binding()?;
        let guild_id = guild_of(handle)?;

        tracing::debug!(setting = %self.name, %guild_id, "editing setting");

        let outcome = match &self.kind {
            OptionKind::Boolean => self.toggle(handle, binding, guild_id).await?,
            OptionKind::Integer { .. } | OptionKind::Float { .. } | OptionKind::String { .. } => {
                self.edit_text(handle, binding, guild_id).await?
            }
            OptionKind::EmojiPair => self.edit_emoji(handle, binding, guild_id).await?,
            OptionKind::Enum { .. }
            | OptionKind::Channel { .. }
            | OptionKind::ChannelArray { .. }
            | OptionKind::Role
            | OptionKind::RoleArray { .. } => self.edit_select(handle, binding, guild_id).await?,
            OptionKind::Custom { .. } => return Err(ConfigError::UnboundOption(self.name.clone()).into()),
        };

        tracing::debug!(setting = %self.name, %guild_id, ?outcome, "setting edit finished");

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        test_utils::{command_handle, MockTransport, TestSettings},
        transport::Response,
    };

    fn store() -> SettingsStore<TestSettings> {
        SettingsStore::new("test")
    }

    async fn seed(store: &SettingsStore<TestSettings>, value: Value) {
        let Value::Object(patch) = value else {
            panic!("seed must be an object");
        };
        store.set(Id::new(1), patch).await.expect("seed");
    }

    async fn view(option: &GuildSettingOption<TestSettings>) -> String {
        let (handle, _) = command_handle(1);
        option.view(&handle).await.expect("view")
    }

    #[tokio::test]
    async fn renders_each_kind() {
        let store = store();
        seed(
            &store,
            json!({
                "enabled": false,
                "limit": 5,
                "prefix": "!",
                "mode": "strict",
                "roleID": "222",
                "roles": ["1", "2"],
                "channel_id": "3",
                "channels": [],
                "emoji_id": "44",
                "emoji_name": "blob",
            }),
        )
        .await;

        let cases = [
            (OptionKind::Boolean, "enabled", "Disabled"),
            (
                OptionKind::Integer {
                    minimum: None,
                    maximum: None,
                },
                "limit",
                "5",
            ),
            (
                OptionKind::String {
                    minimum: None,
                    maximum: None,
                },
                "prefix",
                "!",
            ),
            (
                OptionKind::Enum {
                    values: vec![EnumValue::new("Strict mode", "strict")],
                },
                "mode",
                "Strict mode",
            ),
            (OptionKind::Role, "roleID", "<@&222>"),
            (
                OptionKind::RoleArray {
                    minimum: None,
                    maximum: None,
                },
                "roles",
                "<@&1>, <@&2>",
            ),
            (
                OptionKind::Channel {
                    channel_types: vec![],
                },
                "channel_id",
                "<#3>",
            ),
            (
                OptionKind::ChannelArray {
                    channel_types: vec![],
                    minimum: None,
                    maximum: None,
                },
                "channels",
                NONE,
            ),
            (
                OptionKind::Float {
                    minimum: None,
                    maximum: None,
                },
                "ratio",
                NONE,
            ),
        ];

        for (kind, key, expected) in cases {
            let option = GuildSettingOption::new(key, "test", kind).bind(&store, key);
            assert_eq!(view(&option).await, expected, "{}", key);
        }

        let emoji = GuildSettingOption::new("emoji", "test", OptionKind::EmojiPair).bind_pair(
            &store,
            "emoji_id",
            "emoji_name",
        );
        assert_eq!(view(&emoji).await, "<:blob:44>");
    }

    #[tokio::test]
    async fn unbound_options_are_config_errors() {
        let (handle, transport) = command_handle(1);

        let option = GuildSettingOption::<TestSettings>::new("role", "test", OptionKind::Role);
        let err = option.view(&handle).await.expect_err("unbound");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnboundOption("role".into()))
        );
        let err = option.edit(&handle).await.expect_err("unbound");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnboundOption("role".into()))
        );

        // an emoji pair needs both of its fields
        let emoji = GuildSettingOption::new("emoji", "test", OptionKind::EmojiPair)
            .bind(&store(), "emoji_id");
        assert!(emoji.view(&handle).await.is_err());

        assert!(transport.responses().is_empty());
    }

    async fn custom_view(handle: InteractionHandle) -> Result<String, Error> {
        Ok(format!("custom for {}", handle.interaction().id))
    }

    async fn custom_edit(handle: InteractionHandle) -> Result<EditOutcome, Error> {
        handle.reply_ephemeral("handled elsewhere").await?;
        Ok(EditOutcome::Unchanged)
    }

    #[tokio::test]
    async fn custom_options_need_no_binding() {
        let option = GuildSettingOption::<TestSettings>::new(
            "custom",
            "test",
            OptionKind::Custom {
                view: crate::handler_func!(custom_view),
                edit: crate::handler_func!(custom_edit),
            },
        );
        let (handle, transport) = command_handle(1);

        assert_eq!(option.view(&handle).await.expect("view"), "custom for 1");
        assert_eq!(
            option.edit(&handle).await.expect("edit"),
            EditOutcome::Unchanged
        );
        assert!(matches!(
            transport.responses().as_slice(),
            [Response::Message(_)]
        ));
    }

    #[tokio::test]
    async fn dms_are_rejected_for_users() {
        let option = GuildSettingOption::new("role", "test", OptionKind::Role).bind(&store(), "roleID");
        let transport = std::sync::Arc::new(MockTransport::default());
        let handle = InteractionHandle::new(
            crate::test_utils::command_interaction(1, "config", vec![]),
            transport,
            crate::waiter::Waiter::new(),
        );

        let err = option.view(&handle).await.expect_err("no guild");
        assert!(err.downcast_ref::<UserError>().is_some());
    }
}
