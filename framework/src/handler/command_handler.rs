use std::sync::Arc;

use async_trait::async_trait;
use twilight_model::guild::Permissions;

use super::Handler;
use crate::{
    context::{CommandContext, InteractionContext},
    error::{ConfigError, UserError},
    interaction::InteractionData,
    registry::Registry,
    Error,
};

/// Resolves application commands to a node in the command tree and runs it.
pub struct CommandRouter<T: Clone + Send + Sync> {
    registry: Arc<Registry<T>>,
}

impl<T: Clone + Send + Sync> CommandRouter<T> {
    pub fn new(registry: Arc<Registry<T>>) -> Self {
        Self { registry }
    }
}

fn permission_names(permissions: Permissions) -> String {
    permissions
        .iter_names()
        .map(|(name, _)| format!("`{}`", name.to_lowercase().replace('_', " ")))
        .collect::<Vec<String>>()
        .join(", ")
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for CommandRouter<T> {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        let InteractionData::Command(command) = &ctx.interaction().data else {
            return Err(ConfigError::UnexpectedInteraction("application command").into());
        };

        let root = self
            .registry
            .commands
            .get(&command.name)
            .ok_or_else(|| ConfigError::UnknownCommand(command.name.clone()))?;
        let (node, options) = root.resolve(&command.options)?;

        // app_permissions is missing on ping-style payloads, nothing to check then
        if let (Some(required), Some(granted)) = (
            node.required_app_permissions(),
            ctx.interaction().app_permissions,
        ) {
            let missing = required.difference(granted);
            if !missing.is_empty() {
                return Err(UserError::new(format!(
                    "I need the following permissions for /{}: {}",
                    node.path(),
                    permission_names(missing)
                ))
                .into());
            }
        }

        tracing::info!(command = node.path(), "processing command");

        node.execute(CommandContext {
            meta: ctx.meta.clone(),
            application_id: ctx.application_id,
            services: ctx.services.clone(),
            handle: ctx.handle.clone(),
            command: command.clone(),
            path: node.path().to_string(),
            options: options.to_vec(),
        })
        .await
    }
}
