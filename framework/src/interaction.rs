use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use twilight_model::{
    application::{
        command::CommandType,
        interaction::{
            application_command::{CommandData, CommandDataOption},
            InteractionData as TwilightInteractionData, InteractionType,
        },
    },
    channel::message::component::ComponentType,
    gateway::payload::incoming::InteractionCreate,
    guild::Permissions,
    id::{
        marker::{ChannelMarker, GenericMarker, GuildMarker, InteractionMarker, UserMarker},
        Id,
    },
};

use crate::{
    transport::{Modal, Reply, Response, Transport},
    waiter::{WaitKind, Waiter},
    Error,
};

/// A decoded interaction, the only shape of input the dispatch pipeline deals with.
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    pub id: Id<InteractionMarker>,
    pub token: String,
    pub guild_id: Option<Id<GuildMarker>>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub user_id: Option<Id<UserMarker>>,
    /// permissions the bot has where the interaction happened
    pub app_permissions: Option<Permissions>,
    pub member_permissions: Option<Permissions>,
    pub locale: Option<String>,
    pub data: InteractionData,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionData {
    Ping,
    Command(CommandInput),
    Autocomplete(CommandInput),
    Component(ComponentInput),
    Modal(ModalInput),
}

impl InteractionData {
    pub fn kind(&self) -> InteractionType {
        match self {
            Self::Ping => InteractionType::Ping,
            Self::Command(_) => InteractionType::ApplicationCommand,
            Self::Autocomplete(_) => InteractionType::ApplicationCommandAutocomplete,
            Self::Component(_) => InteractionType::MessageComponent,
            Self::Modal(_) => InteractionType::ModalSubmit,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandInput {
    pub name: String,
    pub kind: CommandType,
    pub options: Vec<CommandDataOption>,
    pub target_id: Option<Id<GenericMarker>>,
}

impl CommandInput {
    pub fn new(name: impl Into<String>, options: Vec<CommandDataOption>) -> Self {
        Self {
            name: name.into(),
            kind: CommandType::ChatInput,
            options,
            target_id: None,
        }
    }
}

impl From<&CommandData> for CommandInput {
    fn from(data: &CommandData) -> Self {
        Self {
            name: data.name.clone(),
            kind: data.kind,
            options: data.options.clone(),
            target_id: data.target_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComponentInput {
    pub custom_id: String,
    pub component_type: ComponentType,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModalInput {
    pub custom_id: String,
    pub fields: Vec<ModalField>,
}

impl ModalInput {
    pub fn value(&self, custom_id: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.custom_id == custom_id)
            .and_then(|field| field.value.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModalField {
    pub custom_id: String,
    pub value: Option<String>,
}

impl Interaction {
    pub fn new(id: Id<InteractionMarker>, token: impl Into<String>, data: InteractionData) -> Self {
        Self {
            id,
            token: token.into(),
            guild_id: None,
            channel_id: None,
            user_id: None,
            app_permissions: None,
            member_permissions: None,
            locale: None,
            data,
        }
    }

    pub fn guild(mut self, guild_id: Id<GuildMarker>) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn user(mut self, user_id: Id<UserMarker>) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn kind(&self) -> InteractionType {
        self.data.kind()
    }

    /// Pings and autocomplete requests can't be answered with a message.
    pub fn can_reply(&self) -> bool {
        matches!(
            self.data,
            InteractionData::Command(_)
                | InteractionData::Component(_)
                | InteractionData::Modal(_)
        )
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Component(component) => Some(&component.custom_id),
            InteractionData::Modal(modal) => Some(&modal.custom_id),
            _ => None,
        }
    }
}

pub fn parse(event: &InteractionCreate) -> Result<Interaction, Error> {
    let data = match (event.kind, &event.data) {
        (InteractionType::Ping, _) => InteractionData::Ping,
        (
            InteractionType::ApplicationCommand,
            Some(TwilightInteractionData::ApplicationCommand(command)),
        ) => InteractionData::Command(CommandInput::from(&**command)),
        (
            InteractionType::ApplicationCommandAutocomplete,
            Some(TwilightInteractionData::ApplicationCommand(command)),
        ) => InteractionData::Autocomplete(CommandInput::from(&**command)),
        (
            InteractionType::MessageComponent,
            Some(TwilightInteractionData::MessageComponent(component)),
        ) => InteractionData::Component(ComponentInput {
            custom_id: component.custom_id.clone(),
            component_type: component.component_type,
            values: component.values.clone(),
        }),
        (InteractionType::ModalSubmit, Some(TwilightInteractionData::ModalSubmit(modal))) => {
            InteractionData::Modal(ModalInput {
                custom_id: modal.custom_id.clone(),
                fields: modal
                    .components
                    .iter()
                    .flat_map(|row| row.components.iter())
                    .map(|field| ModalField {
                        custom_id: field.custom_id.clone(),
                        value: field.value.clone(),
                    })
                    .collect(),
            })
        }
        (kind, None) => return Err(format!("no interaction data for {:?}", kind).into()),
        (kind, Some(_)) => {
            return Err(format!("data doesn't match interaction type {:?}", kind).into())
        }
    };

    Ok(Interaction {
        id: event.id,
        token: event.token.clone(),
        guild_id: event.guild_id,
        channel_id: event.channel.as_ref().map(|channel| channel.id),
        user_id: event.author_id(),
        app_permissions: event.app_permissions,
        member_permissions: event.member.as_ref().and_then(|member| member.permissions),
        locale: event.locale.clone(),
        data,
    })
}

/// An interaction together with the means to answer it.
#[derive(Clone)]
pub struct InteractionHandle {
    interaction: Interaction,
    transport: Arc<dyn Transport>,
    waiter: Waiter,
    acknowledged: Arc<AtomicBool>,
}

impl std::fmt::Debug for InteractionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionHandle")
            .field("interaction", &self.interaction)
            .field("acknowledged", &self.is_acknowledged())
            .finish()
    }
}

impl InteractionHandle {
    pub fn new(interaction: Interaction, transport: Arc<dyn Transport>, waiter: Waiter) -> Self {
        Self {
            interaction,
            transport,
            waiter,
            acknowledged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    pub async fn respond(&self, response: Response) -> Result<(), Error> {
        self.transport.respond(&self.interaction, response).await?;
        self.acknowledged.store(true, Ordering::Release);
        Ok(())
    }

    pub async fn create_message(&self, reply: Reply) -> Result<(), Error> {
        self.respond(Response::Message(reply)).await
    }

    pub async fn reply(&self, message: impl Into<String>) -> Result<(), Error> {
        self.create_message(Reply::new(message)).await
    }

    pub async fn reply_ephemeral(&self, message: impl Into<String>) -> Result<(), Error> {
        self.create_message(Reply::new(message).ephemeral()).await
    }

    pub async fn edit_parent(&self, reply: Reply) -> Result<(), Error> {
        self.respond(Response::UpdateMessage(reply)).await
    }

    pub async fn defer_update(&self) -> Result<(), Error> {
        self.respond(Response::DeferredUpdate).await
    }

    pub async fn create_modal(&self, modal: Modal) -> Result<(), Error> {
        self.respond(Response::Modal(modal)).await
    }

    pub async fn edit_original(&self, reply: Reply) -> Result<(), Error> {
        self.transport.edit_original(&self.interaction, reply).await
    }

    pub async fn await_message_component(
        &self,
        custom_id: &str,
        timeout: Duration,
    ) -> Option<InteractionHandle> {
        self.waiter
            .wait(WaitKind::Component, custom_id, timeout)
            .await
            .map(|interaction| self.derive(interaction))
    }

    pub async fn await_modal_submit(
        &self,
        custom_id: &str,
        timeout: Duration,
    ) -> Option<InteractionHandle> {
        self.waiter
            .wait(WaitKind::Modal, custom_id, timeout)
            .await
            .map(|interaction| self.derive(interaction))
    }

    fn derive(&self, interaction: Interaction) -> Self {
        Self::new(interaction, Arc::clone(&self.transport), self.waiter.clone())
    }
}
