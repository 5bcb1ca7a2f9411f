use std::sync::Arc;

use twilight_model::id::{marker::ApplicationMarker, Id};

use crate::{
    interaction::{Interaction, InteractionHandle},
    transport::Transport,
    waiter::Waiter,
    EventMeta,
};

pub mod autocomplete_context;
pub mod command_context;
pub mod component_interaction_context;
pub mod event_context;
pub mod modal_context;

pub use autocomplete_context::AutocompleteContext;
pub use command_context::CommandContext;
pub use component_interaction_context::ComponentInteractionContext;
pub use event_context::{EventContext, EventPayload};
pub use modal_context::ModalContext;

/// Shared state handed to every dispatch.
pub struct Context<T: Clone + Send + Sync> {
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub transport: Arc<dyn Transport>,
    pub waiter: Waiter,
}

impl<T: Clone + Send + Sync> Context<T> {
    pub fn new(
        application_id: Id<ApplicationMarker>,
        services: T,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            application_id,
            services,
            transport,
            waiter: Waiter::new(),
        }
    }

    pub fn handle(&self, interaction: Interaction) -> InteractionHandle {
        InteractionHandle::new(interaction, Arc::clone(&self.transport), self.waiter.clone())
    }
}

impl<T: Clone + Send + Sync> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            application_id: self.application_id,
            services: self.services.clone(),
            transport: Arc::clone(&self.transport),
            waiter: self.waiter.clone(),
        }
    }
}

/// What middleware and the per-type handlers see of an interaction.
#[derive(Clone, Debug)]
pub struct InteractionContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub handle: InteractionHandle,
}

impl<T: Clone + Send + Sync> InteractionContext<T> {
    pub fn new(meta: EventMeta, ctx: &Context<T>, interaction: Interaction) -> Self {
        Self {
            meta,
            application_id: ctx.application_id,
            services: ctx.services.clone(),
            handle: ctx.handle(interaction),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        self.handle.interaction()
    }
}
