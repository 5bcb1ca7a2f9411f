use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

pub use command::CommandNode;
pub use context::{
    AutocompleteContext, CommandContext, ComponentInteractionContext, Context, EventContext,
    InteractionContext, ModalContext,
};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, UserError};
pub use interaction::{Interaction, InteractionHandle};
pub use module::{builder::ModuleBuilder, Module};
pub use registry::Registry;
pub use transport::{Reply, Response, Transport};
pub use waiter::Waiter;

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod interaction;
pub mod macros;
pub mod middleware;
pub mod module;
pub mod registry;
pub mod settings;
pub mod transport;
pub mod waiter;

#[cfg(test)]
pub(crate) mod test_utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventMeta {
    pub uuid: uuid::Uuid, // used for tracing
    pub shard: u32,
}

impl EventMeta {
    pub fn new(shard: u32) -> Self {
        Self {
            uuid: uuid::Uuid::now_v7(),
            shard,
        }
    }
}
