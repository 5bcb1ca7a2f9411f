use std::sync::Arc;

use async_trait::async_trait;
use twilight_http::Client;
use twilight_model::{
    application::command::{Command, CommandOptionChoice, CommandOptionChoiceValue},
    channel::message::{
        component::{ActionRow, Component},
        MessageFlags,
    },
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::{
        marker::{ApplicationMarker, GuildMarker},
        Id,
    },
};
use twilight_util::builder::InteractionResponseDataBuilder;

use lantern_framework::{
    transport::{AutocompleteChoice, AutocompleteValue, CustomEmoji, Modal},
    Error, Interaction, Reply, Response, Transport,
};

/// [`Transport`] on top of the Discord REST API.
pub struct TwilightTransport {
    client: Arc<Client>,
    application_id: Id<ApplicationMarker>,
}

impl TwilightTransport {
    pub fn new(client: Arc<Client>, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            client,
            application_id,
        }
    }
}

fn reply_data(reply: Reply) -> InteractionResponseData {
    let mut builder = InteractionResponseDataBuilder::new();
    if let Some(content) = reply.content {
        builder = builder.content(content);
    }
    if reply.ephemeral {
        builder = builder.flags(MessageFlags::EPHEMERAL);
    }
    if let Some(components) = reply.components {
        builder = builder.components(components);
    }
    builder.build()
}

fn modal_data(modal: Modal) -> InteractionResponseData {
    // every text input needs a row of its own
    let rows = modal.inputs.into_iter().map(|input| {
        Component::ActionRow(ActionRow {
            components: vec![Component::TextInput(input)],
        })
    });

    InteractionResponseDataBuilder::new()
        .custom_id(modal.custom_id)
        .title(modal.title)
        .components(rows)
        .build()
}

fn choice(choice: AutocompleteChoice) -> CommandOptionChoice {
    CommandOptionChoice {
        name: choice.name,
        name_localizations: None,
        value: match choice.value {
            AutocompleteValue::String(value) => CommandOptionChoiceValue::String(value),
            AutocompleteValue::Integer(value) => CommandOptionChoiceValue::Integer(value),
            AutocompleteValue::Number(value) => CommandOptionChoiceValue::Number(value),
        },
    }
}

pub fn interaction_response(response: Response) -> InteractionResponse {
    let (kind, data) = match response {
        Response::Pong => (InteractionResponseType::Pong, None),
        Response::Message(reply) => (
            InteractionResponseType::ChannelMessageWithSource,
            Some(reply_data(reply)),
        ),
        Response::UpdateMessage(reply) => {
            (InteractionResponseType::UpdateMessage, Some(reply_data(reply)))
        }
        Response::DeferredUpdate => (InteractionResponseType::DeferredUpdateMessage, None),
        Response::Modal(modal) => (InteractionResponseType::Modal, Some(modal_data(modal))),
        Response::Autocomplete(choices) => (
            InteractionResponseType::ApplicationCommandAutocompleteResult,
            Some(
                InteractionResponseDataBuilder::new()
                    .choices(choices.into_iter().map(choice))
                    .build(),
            ),
        ),
    };

    InteractionResponse { kind, data }
}

#[async_trait]
impl Transport for TwilightTransport {
    async fn respond(&self, interaction: &Interaction, response: Response) -> Result<(), Error> {
        self.client
            .interaction(self.application_id)
            .create_response(
                interaction.id,
                &interaction.token,
                &interaction_response(response),
            )
            .await?;

        Ok(())
    }

    async fn edit_original(&self, interaction: &Interaction, reply: Reply) -> Result<(), Error> {
        let client = self.client.interaction(self.application_id);
        let mut request = client.update_response(&interaction.token);

        // fields left as None keep their current value
        if let Some(content) = reply.content.as_deref() {
            request = request.content(Some(content));
        }
        if let Some(components) = reply.components.as_deref() {
            request = request.components(Some(components));
        }

        request.await?;
        Ok(())
    }

    async fn guild_emojis(&self, guild_id: Id<GuildMarker>) -> Result<Vec<CustomEmoji>, Error> {
        let emojis = self.client.emojis(guild_id).await?.model().await?;

        Ok(emojis
            .into_iter()
            .map(|emoji| CustomEmoji {
                id: emoji.id,
                name: emoji.name,
                animated: emoji.animated,
            })
            .collect())
    }

    async fn set_global_commands(&self, commands: &[Command]) -> Result<(), Error> {
        self.client
            .interaction(self.application_id)
            .set_global_commands(commands)
            .await?;

        Ok(())
    }

    async fn set_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: &[Command],
    ) -> Result<(), Error> {
        self.client
            .interaction(self.application_id)
            .set_guild_commands(guild_id, commands)
            .await?;

        Ok(())
    }
}
