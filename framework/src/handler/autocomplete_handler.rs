use std::sync::Arc;

use async_trait::async_trait;
use twilight_model::application::command::CommandOptionType;

use super::Handler;
use crate::{
    command::find_focused,
    context::{AutocompleteContext, InteractionContext},
    error::ConfigError,
    interaction::InteractionData,
    registry::Registry,
    transport::{AutocompleteValue, Response, MAX_AUTOCOMPLETE_CHOICES},
    Error,
};

/// Answers autocomplete requests with the choices of the focused option's callback.
pub struct AutocompleteRouter<T: Clone + Send + Sync> {
    registry: Arc<Registry<T>>,
}

impl<T: Clone + Send + Sync> AutocompleteRouter<T> {
    pub fn new(registry: Arc<Registry<T>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for AutocompleteRouter<T> {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        let InteractionData::Autocomplete(command) = &ctx.interaction().data else {
            return Err(ConfigError::UnexpectedInteraction("autocomplete").into());
        };

        let root = self
            .registry
            .commands
            .get(&command.name)
            .ok_or_else(|| ConfigError::UnknownCommand(command.name.clone()))?;

        let (option, typed, _) = find_focused(&command.options)
            .ok_or_else(|| ConfigError::NoFocusedOption(command.name.clone()))?;
        let (node, _) = root.resolve(&command.options)?;

        let parameter = node
            .parameter_named(option)
            .ok_or_else(|| ConfigError::UnknownOption {
                command: node.path().to_string(),
                option: option.to_string(),
            })?;
        let func = parameter
            .autocomplete
            .ok_or_else(|| ConfigError::MissingAutocomplete {
                command: node.path().to_string(),
                option: option.to_string(),
            })?;

        // parse by the declared option type, not whatever kind the client sent
        let value = if !parameter.is_numeric() {
            Some(AutocompleteValue::from(typed))
        } else if parameter.option.kind == CommandOptionType::Integer {
            typed.parse::<i64>().map(AutocompleteValue::from).ok()
        } else {
            typed
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(AutocompleteValue::from)
        };
        let Some(value) = value else {
            // half-typed numbers just don't get suggestions
            return ctx.handle.respond(Response::Autocomplete(Vec::new())).await;
        };

        let mut choices = func(AutocompleteContext {
            meta: ctx.meta.clone(),
            application_id: ctx.application_id,
            services: ctx.services.clone(),
            handle: ctx.handle.clone(),
            command: command.clone(),
            option: option.to_string(),
            value,
        })
        .await?;
        choices.truncate(MAX_AUTOCOMPLETE_CHOICES);

        ctx.handle.respond(Response::Autocomplete(choices)).await
    }
}
