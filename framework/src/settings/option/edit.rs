use std::str::FromStr;

use serde_json::Value;
use twilight_model::{
    channel::message::component::{
        ActionRow, Component, SelectDefaultValue, SelectMenu, SelectMenuOption, SelectMenuType,
        TextInput, TextInputStyle,
    },
    id::{
        marker::{ChannelMarker, GuildMarker, RoleMarker},
        Id,
    },
};

use super::{as_text, Binding, EditOutcome, GuildSettingOption, OptionKind, TIMED_OUT_MESSAGE};
use crate::{
    interaction::{InteractionData, InteractionHandle},
    settings::{emoji, store::SettingsPatch, SettingsRecord},
    transport::{Modal, Reply},
    Error,
};

const INPUT_ID: &str = "value";

/// Discord's limit for modal titles and input labels.
const LABEL_LIMIT: usize = 45;

/// Discord's limit for select menu values.
const SELECT_LIMIT: u8 = 25;

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn patch(key: &str, value: Value) -> SettingsPatch {
    let mut patch = SettingsPatch::new();
    patch.insert(key.to_string(), value);
    patch
}

impl<R: SettingsRecord> GuildSettingOption<R> {
    fn prompt_id(&self, binding: &Binding<R>, handle: &InteractionHandle) -> String {
        format!("setting:{}:{}", binding.key, handle.interaction().id)
    }

    /// Flips the stored value, null counts as off.
    pub(super) async fn toggle(
        &self,
        handle: &InteractionHandle,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
    ) -> Result<EditOutcome, Error> {
        let enabled = match binding.store.get_value(guild_id, &binding.key).await? {
            Some(Value::Bool(enabled)) => !enabled,
            _ => true,
        };

        let outcome = self
            .commit(binding, guild_id, patch(&binding.key, Value::Bool(enabled)))
            .await?;
        self.confirm(handle, binding, guild_id, outcome, false)
            .await?;

        Ok(outcome)
    }

    pub(super) async fn edit_text(
        &self,
        handle: &InteractionHandle,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
    ) -> Result<EditOutcome, Error> {
        let current = binding.store.get_value(guild_id, &binding.key).await?;
        let max_length = match self.kind {
            OptionKind::String {
                maximum: Some(maximum),
                ..
            } => u16::try_from(maximum).ok(),
            _ => None,
        };

        let Some((response, text)) = self
            .prompt_text(handle, binding, current.as_ref().and_then(as_text), max_length)
            .await?
        else {
            return self.time_out(handle).await;
        };

        let value = match self.parse_text(&text) {
            Ok(value) => value,
            Err(message) => return self.reject(&response, message, false).await,
        };

        let outcome = self
            .commit(binding, guild_id, patch(&binding.key, value))
            .await?;
        self.confirm(&response, binding, guild_id, outcome, false)
            .await?;

        Ok(outcome)
    }

    pub(super) async fn edit_emoji(
        &self,
        handle: &InteractionHandle,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
    ) -> Result<EditOutcome, Error> {
        let name_key = binding.secondary.as_deref().unwrap_or(&binding.key);
        let current = binding.store.get_value(guild_id, name_key).await?;

        let Some((response, text)) = self
            .prompt_text(handle, binding, current.as_ref().and_then(as_text), None)
            .await?
        else {
            return self.time_out(handle).await;
        };

        let resolved =
            emoji::resolve(&text, guild_id, handle.transport().as_ref()).await?;
        let (id, name) = match resolved {
            Some(emoji) => {
                let (id, name) = emoji.into_pair();
                (id.map(Value::String).unwrap_or(Value::Null), Value::String(name))
            }
            None if self.nullable => (Value::Null, Value::Null),
            None if text.is_empty() => {
                return self
                    .reject(&response, format!("**{}** can't be empty.", self.name), false)
                    .await
            }
            None => {
                return self
                    .reject(
                        &response,
                        format!("Couldn't find an emoji matching `{}`.", text),
                        false,
                    )
                    .await
            }
        };

        let mut changes = patch(&binding.key, id);
        changes.insert(name_key.to_string(), name);

        let outcome = self.commit(binding, guild_id, changes).await?;
        self.confirm(&response, binding, guild_id, outcome, false)
            .await?;

        Ok(outcome)
    }

    pub(super) async fn edit_select(
        &self,
        handle: &InteractionHandle,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
    ) -> Result<EditOutcome, Error> {
        let current = binding.store.get_value(guild_id, &binding.key).await?;
        let custom_id = self.prompt_id(binding, handle);

        handle
            .create_message(
                Reply::new(format!("Pick a new value for **{}**.", self.name))
                    .ephemeral()
                    .components([Component::from(ActionRow {
                        components: vec![self.select_menu(&custom_id, current.as_ref()).into()],
                    })]),
            )
            .await?;

        let Some(response) = handle
            .await_message_component(&custom_id, self.timeout)
            .await
        else {
            return self.time_out(handle).await;
        };

        let values = match &response.interaction().data {
            InteractionData::Component(component) => component.values.clone(),
            _ => Vec::new(),
        };

        let value = match self.selection(values) {
            Ok(value) => value,
            Err(message) => return self.reject(&response, message, true).await,
        };

        let outcome = self
            .commit(binding, guild_id, patch(&binding.key, value))
            .await?;
        self.confirm(&response, binding, guild_id, outcome, true)
            .await?;

        Ok(outcome)
    }

    /// Shows a single input modal and waits for it, `None` on timeout.
    async fn prompt_text(
        &self,
        handle: &InteractionHandle,
        binding: &Binding<R>,
        current: Option<String>,
        max_length: Option<u16>,
    ) -> Result<Option<(InteractionHandle, String)>, Error> {
        let custom_id = self.prompt_id(binding, handle);

        handle
            .create_modal(Modal {
                custom_id: custom_id.clone(),
                title: truncate(&format!("Edit {}", self.name), LABEL_LIMIT),
                inputs: vec![TextInput {
                    custom_id: INPUT_ID.into(),
                    label: truncate(&self.name, LABEL_LIMIT),
                    max_length,
                    min_length: None,
                    placeholder: Some(truncate(&self.description, 100)),
                    // empty submissions are validated here instead
                    required: Some(false),
                    style: TextInputStyle::Short,
                    value: current,
                }],
            })
            .await?;

        let Some(response) = handle.await_modal_submit(&custom_id, self.timeout).await else {
            return Ok(None);
        };

        let text = match &response.interaction().data {
            InteractionData::Modal(modal) => modal.value(INPUT_ID).unwrap_or_default().trim().to_string(),
            _ => String::new(),
        };

        Ok(Some((response, text)))
    }

    fn parse_text(&self, text: &str) -> Result<Value, String> {
        if text.is_empty() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(format!("**{}** can't be empty.", self.name))
            };
        }

        match &self.kind {
            OptionKind::Integer { minimum, maximum } => {
                let number = text
                    .parse::<i64>()
                    .map_err(|_| format!("`{}` isn't a whole number.", text))?;
                check_bounds(number, *minimum, *maximum)?;
                Ok(Value::from(number))
            }
            OptionKind::Float { minimum, maximum } => {
                let number = text
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| format!("`{}` isn't a number.", text))?;
                check_bounds(number, *minimum, *maximum)?;
                Ok(Value::from(number))
            }
            OptionKind::String { minimum, maximum } => {
                let length = text.chars().count();
                if let Some(minimum) = minimum.filter(|minimum| length < *minimum) {
                    return Err(format!("Must be at least {} characters long.", minimum));
                }
                if let Some(maximum) = maximum.filter(|maximum| length > *maximum) {
                    return Err(format!("Can't be longer than {} characters.", maximum));
                }
                Ok(Value::String(text.to_string()))
            }
            _ => Ok(Value::String(text.to_string())),
        }
    }

    fn select_menu(&self, custom_id: &str, current: Option<&Value>) -> SelectMenu {
        let current_ids: Vec<String> = match current {
            Some(Value::Array(items)) => items.iter().filter_map(as_text).collect(),
            Some(value) => as_text(value).into_iter().collect(),
            None => Vec::new(),
        };
        let min_values = Some(if self.nullable { 0 } else { 1 });

        let mut menu = SelectMenu {
            custom_id: custom_id.to_string(),
            kind: SelectMenuType::Text,
            options: None,
            placeholder: Some(truncate(&self.description, 150)),

            // defaults
            disabled: false,
            max_values: Some(1),
            min_values,
            default_values: None,
            channel_types: None,
        };

        match &self.kind {
            OptionKind::Enum { values } => {
                menu.options = Some(
                    values
                        .iter()
                        .map(|option| SelectMenuOption {
                            default: current_ids.contains(&option.value),
                            description: None,
                            emoji: None,
                            label: option.label.clone(),
                            value: option.value.clone(),
                        })
                        .collect(),
                );
            }
            OptionKind::Channel { channel_types } => {
                menu.kind = SelectMenuType::Channel;
                menu.channel_types = (!channel_types.is_empty()).then(|| channel_types.clone());
                menu.default_values = Some(channel_defaults(&current_ids));
            }
            OptionKind::ChannelArray {
                channel_types,
                minimum,
                maximum,
            } => {
                menu.kind = SelectMenuType::Channel;
                menu.channel_types = (!channel_types.is_empty()).then(|| channel_types.clone());
                menu.default_values = Some(channel_defaults(&current_ids));
                menu.min_values = minimum.or(min_values);
                menu.max_values = Some(maximum.unwrap_or(SELECT_LIMIT));
            }
            OptionKind::Role => {
                menu.kind = SelectMenuType::Role;
                menu.default_values = Some(role_defaults(&current_ids));
            }
            OptionKind::RoleArray { minimum, maximum } => {
                menu.kind = SelectMenuType::Role;
                menu.default_values = Some(role_defaults(&current_ids));
                menu.min_values = minimum.or(min_values);
                menu.max_values = Some(maximum.unwrap_or(SELECT_LIMIT));
            }
            _ => (),
        }

        menu
    }

    /// The value a select menu response maps to. Nothing selected clears the
    /// setting, which only nullable settings allow.
    fn selection(&self, values: Vec<String>) -> Result<Value, String> {
        if values.is_empty() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(format!("**{}** needs a value, nothing was selected.", self.name))
            };
        }

        match self.kind {
            OptionKind::ChannelArray { .. } | OptionKind::RoleArray { .. } => Ok(Value::Array(
                values.into_iter().map(Value::String).collect(),
            )),
            _ => Ok(values
                .into_iter()
                .next()
                .map(Value::String)
                .unwrap_or(Value::Null)),
        }
    }

    /// Writes `changes` unless every field already has that value.
    async fn commit(
        &self,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
        changes: SettingsPatch,
    ) -> Result<EditOutcome, Error> {
        let mut changed = false;
        for (key, value) in &changes {
            let current = binding
                .store
                .get_value(guild_id, key)
                .await?
                .unwrap_or(Value::Null);
            if &current != value {
                changed = true;
                break;
            }
        }

        if !changed {
            return Ok(EditOutcome::Unchanged);
        }

        binding.store.set(guild_id, changes).await?;
        Ok(EditOutcome::Committed)
    }

    /// Acknowledge `response` with the new value, replacing the prompt when
    /// it came from one of our select menus.
    async fn confirm(
        &self,
        response: &InteractionHandle,
        binding: &Binding<R>,
        guild_id: Id<GuildMarker>,
        outcome: EditOutcome,
        replace_prompt: bool,
    ) -> Result<(), Error> {
        let view = self.view_value(binding, guild_id).await?;
        let content = match outcome {
            EditOutcome::Unchanged => format!("**{}** is already set to {}.", self.name, view),
            _ => format!("**{}** is now set to {}.", self.name, view),
        };

        if replace_prompt {
            response
                .edit_parent(Reply::new(content).clear_components())
                .await
        } else {
            response.create_message(Reply::new(content).ephemeral()).await
        }
    }

    async fn reject(
        &self,
        response: &InteractionHandle,
        message: String,
        replace_prompt: bool,
    ) -> Result<EditOutcome, Error> {
        if replace_prompt {
            response
                .edit_parent(Reply::new(message).clear_components())
                .await?;
        } else {
            response
                .create_message(Reply::new(message).ephemeral())
                .await?;
        }
        Ok(EditOutcome::Rejected)
    }

    async fn time_out(&self, handle: &InteractionHandle) -> Result<EditOutcome, Error> {
        // modal prompts leave no message behind, so this edit may have nothing to edit
        if let Err(err) = handle
            .edit_original(Reply::new(TIMED_OUT_MESSAGE).clear_components())
            .await
        {
            tracing::debug!(?err, setting = %self.name, "couldn't edit timed out prompt");
        }

        Ok(EditOutcome::TimedOut)
    }
}

fn check_bounds<N: PartialOrd + std::fmt::Display + Copy>(
    number: N,
    minimum: Option<N>,
    maximum: Option<N>,
) -> Result<(), String> {
    if let Some(minimum) = minimum.filter(|minimum| number < *minimum) {
        return Err(format!("Must be at least {}.", minimum));
    }
    if let Some(maximum) = maximum.filter(|maximum| number > *maximum) {
        return Err(format!("Must be at most {}.", maximum));
    }
    Ok(())
}

fn channel_defaults(ids: &[String]) -> Vec<SelectDefaultValue> {
    ids.iter()
        .filter_map(|id| Id::<ChannelMarker>::from_str(id).ok())
        .map(SelectDefaultValue::Channel)
        .collect()
}

fn role_defaults(ids: &[String]) -> Vec<SelectDefaultValue> {
    ids.iter()
        .filter_map(|id| Id::<RoleMarker>::from_str(id).ok())
        .map(SelectDefaultValue::Role)
        .collect()
}
