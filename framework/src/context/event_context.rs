use std::sync::Arc;

use twilight_gateway::Event;
use twilight_model::id::{marker::ApplicationMarker, Id};

use crate::{interaction::Interaction, registry::Registry, transport::Transport, EventMeta};

#[derive(Clone, Debug)]
pub enum EventPayload {
    Gateway(Event),
    /// an interaction on its way through the dispatch pipeline
    Interaction(Interaction),
}

#[derive(Clone)]
pub struct EventContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub transport: Arc<dyn Transport>,
    pub registry: Arc<Registry<T>>,

    pub event: EventPayload,
}
