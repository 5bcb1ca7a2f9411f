use twilight_model::{
    application::interaction::application_command::{CommandDataOption, CommandOptionValue},
    guild::Permissions,
    id::{
        marker::{ApplicationMarker, ChannelMarker, GuildMarker, RoleMarker, UserMarker},
        Id,
    },
};

use crate::{
    interaction::{CommandInput, Interaction, InteractionHandle},
    transport::Reply,
    Error, EventMeta,
};

#[derive(Clone, Debug)]
pub struct CommandContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub handle: InteractionHandle,

    pub command: CommandInput,
    /// qualified name of the executed node, eg. `config edit`
    pub path: String,
    /// options of the executed node, with subcommand nesting stripped
    pub options: Vec<CommandDataOption>,
}

impl<T: Clone + Send + Sync> CommandContext<T> {
    pub fn interaction(&self) -> &Interaction {
        self.handle.interaction()
    }

    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.handle.interaction().guild_id
    }

    pub fn user_id(&self) -> Option<Id<UserMarker>> {
        self.handle.interaction().user_id
    }

    pub fn member_permissions(&self) -> Permissions {
        self.handle
            .interaction()
            .member_permissions
            .unwrap_or_else(Permissions::empty)
    }

    pub async fn reply(&self, message: impl Into<String>) -> Result<(), Error> {
        self.handle.reply(message).await
    }

    pub async fn reply_ephemeral(&self, message: impl Into<String>) -> Result<(), Error> {
        self.handle.reply_ephemeral(message).await
    }

    pub async fn create_message(&self, reply: Reply) -> Result<(), Error> {
        self.handle.create_message(reply).await
    }

    pub fn get_arg(&self, name: &str) -> Option<&CommandOptionValue> {
        self.options
            .iter()
            .find(|opt| opt.name == name)
            .map(|opt| &opt.value)
    }

    pub fn get_arg_string_optional(&self, name: &str) -> Result<Option<String>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(format!("option '{}' isn't a string: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_string(&self, name: &str) -> Result<String, Error> {
        self.get_arg_string_optional(name)?
            .ok_or_else(|| format!("missing option '{}'", name).into())
    }

    pub fn get_arg_integer(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Integer(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option '{}' isn't an integer: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_number(&self, name: &str) -> Result<Option<f64>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Number(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option '{}' isn't a number: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_bool(&self, name: &str) -> Result<Option<bool>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Boolean(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option '{}' isn't a boolean: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_channel(&self, name: &str) -> Result<Option<Id<ChannelMarker>>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Channel(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option '{}' isn't a channel: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_role(&self, name: &str) -> Result<Option<Id<RoleMarker>>, Error> {
        match self.get_arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Role(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option '{}' isn't a role: {:?}", name, other).into()),
        }
    }
}
