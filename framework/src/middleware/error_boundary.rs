use async_trait::async_trait;

use super::{Middleware, Next};
use crate::{
    context::InteractionContext, error::UserError, interaction::InteractionHandle,
    transport::Reply, Error,
};

pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong while handling that, please try again later.";

/// Catches every error from the rest of the chain. A [`UserError`] is shown
/// to the user as-is, anything else is logged and answered with a generic
/// message. Register it first so it wraps all other middleware.
pub struct ErrorBoundary;

async fn report(handle: &InteractionHandle, message: &str) {
    if !handle.interaction().can_reply() {
        return;
    }

    let reply = Reply::new(message).ephemeral();
    let result = if handle.is_acknowledged() {
        handle.edit_original(reply).await
    } else {
        handle.create_message(reply).await
    };

    if let Err(err) = result {
        tracing::warn!("couldn't report error to user: {}", err);
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Middleware<T> for ErrorBoundary {
    async fn handle(&self, ctx: &InteractionContext<T>, next: Next<'_, T>) -> Result<(), Error> {
        let Err(err) = next.run(ctx).await else {
            return Ok(());
        };

        let interaction = ctx.interaction();
        if let Some(user_error) = err.downcast_ref::<UserError>() {
            tracing::debug!(id = %interaction.id, "user error: {}", user_error);
            report(&ctx.handle, &user_error.0).await;
            return Ok(());
        }

        tracing::error!(
            id = %interaction.id,
            kind = ?interaction.kind(),
            uuid = %ctx.meta.uuid,
            "error handling interaction: {}",
            err
        );
        report(&ctx.handle, GENERIC_ERROR_MESSAGE).await;

        Ok(())
    }
}
