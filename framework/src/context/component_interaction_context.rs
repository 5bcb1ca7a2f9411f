use twilight_model::id::{marker::ApplicationMarker, Id};

use crate::{
    interaction::{ComponentInput, Interaction, InteractionHandle},
    transport::Reply,
    Error, EventMeta,
};

#[derive(Clone, Debug)]
pub struct ComponentInteractionContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub handle: InteractionHandle,

    pub component: ComponentInput,
}

impl<T: Clone + Send + Sync> ComponentInteractionContext<T> {
    pub fn interaction(&self) -> &Interaction {
        self.handle.interaction()
    }

    pub async fn update(&self, reply: Reply) -> Result<(), Error> {
        self.handle.edit_parent(reply).await
    }
}
