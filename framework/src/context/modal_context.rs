use twilight_model::id::{marker::ApplicationMarker, Id};

use crate::{
    interaction::{InteractionHandle, ModalInput},
    EventMeta,
};

#[derive(Clone, Debug)]
pub struct ModalContext<T: Clone + Send + Sync> {
    pub meta: EventMeta,
    pub application_id: Id<ApplicationMarker>,
    pub services: T,
    pub handle: InteractionHandle,

    pub data: ModalInput,
}
