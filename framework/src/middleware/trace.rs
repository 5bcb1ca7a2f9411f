use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use super::{Middleware, Next};
use crate::{context::InteractionContext, Error};

/// Runs the rest of the chain inside an `interaction` span and logs how long
/// it took.
pub struct TraceInteractions;

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Middleware<T> for TraceInteractions {
    async fn handle(&self, ctx: &InteractionContext<T>, next: Next<'_, T>) -> Result<(), Error> {
        let interaction = ctx.interaction();
        let span = tracing::info_span!(
            "interaction",
            id = %interaction.id,
            kind = ?interaction.kind(),
            guild = ?interaction.guild_id,
            custom_id = interaction.custom_id(),
            uuid = %ctx.meta.uuid,
        );

        let started = Instant::now();
        let result = next.run(ctx).instrument(span.clone()).await;

        span.in_scope(|| {
            tracing::debug!(
                elapsed = ?started.elapsed(),
                ok = result.is_ok(),
                "interaction handled"
            )
        });

        result
    }
}
