use std::sync::Arc;

use async_trait::async_trait;

use super::{Handler, InteractionHandler};
use crate::{
    context::{ComponentInteractionContext, InteractionContext},
    error::ConfigError,
    interaction::InteractionData,
    registry::Registry,
    BoxFuture, Error,
};

pub type ComponentInteractionFunc<T> =
    fn(ComponentInteractionContext<T>) -> BoxFuture<'static, Result<(), Error>>;

#[derive(Clone)]
pub struct ComponentInteractionHandler<T: Clone + Send + Sync> {
    pub module: String,
    pub custom_id: String,
    pub func: ComponentInteractionFunc<T>,
}

impl<T: Clone + Send + Sync> ComponentInteractionHandler<T> {
    pub fn new(module: &str, custom_id: &str, func: ComponentInteractionFunc<T>) -> Self {
        Self {
            module: module.to_string(),
            custom_id: custom_id.to_string(),
            func,
        }
    }

    pub async fn run(&self, ctx: ComponentInteractionContext<T>) -> Result<(), Error> {
        (self.func)(ctx).await
    }
}

impl<T: Clone + Send + Sync> InteractionHandler<String> for ComponentInteractionHandler<T> {
    fn key(&self) -> String {
        self.custom_id.clone()
    }
}

/// Gives component clicks to a pending wait, or the handler registered for
/// their `custom_id`.
pub struct ComponentRouter<T: Clone + Send + Sync> {
    registry: Arc<Registry<T>>,
}

impl<T: Clone + Send + Sync> ComponentRouter<T> {
    pub fn new(registry: Arc<Registry<T>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for ComponentRouter<T> {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        let InteractionData::Component(component) = &ctx.interaction().data else {
            return Err(ConfigError::UnexpectedInteraction("message component").into());
        };

        if ctx.handle.waiter().resolve(ctx.interaction()) {
            return Ok(());
        }

        let Some(handler) = self.registry.components.find(&component.custom_id) else {
            tracing::debug!(custom_id = %component.custom_id, "unhandled component interaction");
            return Ok(());
        };

        handler
            .run(ComponentInteractionContext {
                meta: ctx.meta.clone(),
                application_id: ctx.application_id,
                services: ctx.services.clone(),
                handle: ctx.handle.clone(),
                component: component.clone(),
            })
            .await
    }
}
