use std::sync::Arc;

use async_trait::async_trait;

use super::{Handler, InteractionHandler};
use crate::{
    context::{InteractionContext, ModalContext},
    error::ConfigError,
    interaction::InteractionData,
    registry::Registry,
    BoxFuture, Error,
};

pub type ModalFunc<T> = fn(ModalContext<T>) -> BoxFuture<'static, Result<(), Error>>;

#[derive(Clone)]
pub struct ModalHandler<T: Clone + Send + Sync> {
    pub module: String,
    pub custom_id: String,
    pub func: ModalFunc<T>,
}

impl<T: Clone + Send + Sync> ModalHandler<T> {
    pub fn new(module: &str, custom_id: &str, func: ModalFunc<T>) -> Self {
        Self {
            module: module.to_string(),
            custom_id: custom_id.to_string(),
            func,
        }
    }

    pub async fn run(&self, ctx: ModalContext<T>) -> Result<(), Error> {
        (self.func)(ctx).await
    }
}

impl<T: Clone + Send + Sync> InteractionHandler<String> for ModalHandler<T> {
    fn key(&self) -> String {
        self.custom_id.clone()
    }
}

pub struct ModalRouter<T: Clone + Send + Sync> {
    registry: Arc<Registry<T>>,
}

impl<T: Clone + Send + Sync> ModalRouter<T> {
    pub fn new(registry: Arc<Registry<T>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for ModalRouter<T> {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        let InteractionData::Modal(modal) = &ctx.interaction().data else {
            return Err(ConfigError::UnexpectedInteraction("modal submit").into());
        };

        if ctx.handle.waiter().resolve(ctx.interaction()) {
            return Ok(());
        }

        let Some(handler) = self.registry.modals.find(&modal.custom_id) else {
            tracing::debug!(custom_id = %modal.custom_id, "unhandled modal submit");
            return Ok(());
        };

        handler
            .run(ModalContext {
                meta: ctx.meta.clone(),
                application_id: ctx.application_id,
                services: ctx.services.clone(),
                handle: ctx.handle.clone(),
                data: modal.clone(),
            })
            .await
    }
}
