use std::sync::Arc;

use async_trait::async_trait;

use crate::{context::InteractionContext, dispatcher::Dispatcher, Error};

pub mod error_boundary;
pub mod trace;

pub use error_boundary::ErrorBoundary;
pub use trace::TraceInteractions;

/// Cross-cutting step in front of the interaction handlers. Middleware runs
/// in registration order, code after `next.run(..)` runs in reverse order.
///
/// A middleware can return without calling `next` to stop the interaction
/// from going any further.
#[async_trait]
pub trait Middleware<T: Clone + Send + Sync + 'static>: Send + Sync {
    async fn handle(&self, ctx: &InteractionContext<T>, next: Next<'_, T>) -> Result<(), Error>;
}

/// The rest of the chain after the current middleware.
pub struct Next<'a, T: Clone + Send + Sync + 'static> {
    middlewares: &'a [Arc<dyn Middleware<T>>],
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Clone + Send + Sync + 'static> Next<'a, T> {
    pub(crate) fn new(middlewares: &'a [Arc<dyn Middleware<T>>], dispatcher: &'a Dispatcher<T>) -> Self {
        Self {
            middlewares,
            dispatcher,
        }
    }

    pub async fn run(self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        match self.middlewares.split_first() {
            Some((current, rest)) => current.handle(ctx, Next::new(rest, self.dispatcher)).await,
            None => self.dispatcher.terminal(ctx).await,
        }
    }
}
