use async_trait::async_trait;
use twilight_model::{
    application::command::Command,
    channel::message::{component::TextInput, Component},
    id::{
        marker::{EmojiMarker, GuildMarker},
        Id,
    },
};

use crate::{interaction::Interaction, Error};

/// Discord won't accept more than this many autocomplete choices.
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

/// Message content for replies and edits. `components: None` leaves existing
/// components alone on edits, `Some(vec![])` removes them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    pub content: Option<String>,
    pub ephemeral: bool,
    pub components: Option<Vec<Component>>,
}

impl Reply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components = Some(components.into_iter().collect());
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components = Some(Vec::new());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AutocompleteValue {
    String(String),
    Integer(i64),
    Number(f64),
}

impl From<String> for AutocompleteValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AutocompleteValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for AutocompleteValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AutocompleteValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: AutocompleteValue,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<AutocompleteValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The initial response to an interaction, every interaction gets exactly one.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Pong,
    /// a new message in the channel
    Message(Reply),
    /// edit the message the component is attached to
    UpdateMessage(Reply),
    DeferredUpdate,
    Modal(Modal),
    Autocomplete(Vec<AutocompleteChoice>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomEmoji {
    pub id: Id<EmojiMarker>,
    pub name: String,
    pub animated: bool,
}

/// Everything the core needs from the Discord REST API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn respond(&self, interaction: &Interaction, response: Response) -> Result<(), Error>;

    /// Edit the response created by [`Transport::respond`].
    async fn edit_original(&self, interaction: &Interaction, reply: Reply) -> Result<(), Error>;

    async fn guild_emojis(&self, guild_id: Id<GuildMarker>) -> Result<Vec<CustomEmoji>, Error>;

    async fn set_global_commands(&self, commands: &[Command]) -> Result<(), Error>;

    async fn set_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: &[Command],
    ) -> Result<(), Error>;
}
