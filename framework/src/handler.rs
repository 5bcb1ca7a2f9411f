use async_trait::async_trait;

use crate::{context::InteractionContext, Error};

pub mod autocomplete_handler;
pub mod command_handler;
pub mod component_interaction_handler;
pub mod event_handler;
pub mod modal_handler;
pub mod ping_handler;

pub use autocomplete_handler::AutocompleteRouter;
pub use command_handler::CommandRouter;
pub use component_interaction_handler::ComponentRouter;
pub use modal_handler::ModalRouter;
pub use ping_handler::PingHandler;

pub trait InteractionHandler<T> {
    fn key(&self) -> T;
}

/// Terminal handler for one interaction type, picked by the dispatcher once
/// all middleware ran.
#[async_trait]
pub trait Handler<T: Clone + Send + Sync>: Send + Sync {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error>;
}
