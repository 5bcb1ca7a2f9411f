use twilight_model::id::{
    marker::{ApplicationMarker, GuildMarker},
    Id,
};

use crate::{
    interaction::{CommandInput, InteractionHandle},
    transport::AutocompleteValue,
    EventMeta,
};

#[derive(Clone, Debug)]
pub struct AutocompleteContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub handle: InteractionHandle,

    pub command: CommandInput,
    /// name of the focused option
    pub option: String,
    /// what the user typed so far, already coerced for numeric options
    pub value: AutocompleteValue,
}

impl<T: Clone + Send + Sync> AutocompleteContext<T> {
    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.handle.interaction().guild_id
    }

    /// The typed-so-far text, numbers formatted back to a string.
    pub fn query(&self) -> String {
        match &self.value {
            AutocompleteValue::String(value) => value.clone(),
            AutocompleteValue::Integer(value) => value.to_string(),
            AutocompleteValue::Number(value) => value.to_string(),
        }
    }
}
