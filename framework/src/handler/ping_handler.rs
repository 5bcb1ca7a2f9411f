use async_trait::async_trait;

use super::Handler;
use crate::{context::InteractionContext, transport::Response, Error};

pub struct PingHandler;

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for PingHandler {
    async fn handle(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        ctx.handle.respond(Response::Pong).await
    }
}
