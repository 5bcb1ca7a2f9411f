use std::{collections::HashMap, sync::Arc};

use twilight_gateway::{Event, EventType};
use twilight_model::application::interaction::InteractionType;

use crate::{
    context::{Context, EventContext, EventPayload, InteractionContext},
    handler::{
        AutocompleteRouter, CommandRouter, ComponentRouter, Handler, ModalRouter, PingHandler,
    },
    interaction::{self, Interaction},
    middleware::{Middleware, Next},
    registry::Registry,
    Error, EventMeta,
};

/// Runs interactions through the middleware chain into the handler for their
/// type, and gateway events into the bound event handlers.
pub struct Dispatcher<T: Clone + Send + Sync + 'static> {
    registry: Arc<Registry<T>>,
    context: Context<T>,
    middlewares: Vec<Arc<dyn Middleware<T>>>,
    handlers: HashMap<InteractionType, Arc<dyn Handler<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Dispatcher<T> {
    /// A dispatcher with handlers for every interaction type Discord sends
    /// today and no middleware.
    pub fn new(registry: Arc<Registry<T>>, context: Context<T>) -> Self {
        let mut handlers: HashMap<InteractionType, Arc<dyn Handler<T>>> = HashMap::new();
        handlers.insert(InteractionType::Ping, Arc::new(PingHandler));
        handlers.insert(
            InteractionType::ApplicationCommand,
            Arc::new(CommandRouter::new(Arc::clone(&registry))),
        );
        handlers.insert(
            InteractionType::ApplicationCommandAutocomplete,
            Arc::new(AutocompleteRouter::new(Arc::clone(&registry))),
        );
        handlers.insert(
            InteractionType::MessageComponent,
            Arc::new(ComponentRouter::new(Arc::clone(&registry))),
        );
        handlers.insert(
            InteractionType::ModalSubmit,
            Arc::new(ModalRouter::new(Arc::clone(&registry))),
        );

        Self {
            registry,
            context,
            middlewares: Vec::new(),
            handlers,
        }
    }

    /// Append a middleware, the first one added runs first.
    pub fn middleware(mut self, middleware: impl Middleware<T> + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Handle `kind` with `handler`, replacing the default one if any.
    pub fn handler(mut self, kind: InteractionType, handler: impl Handler<T> + 'static) -> Self {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    /// Stop handling `kind`, such interactions then pass the middleware and
    /// are dropped without a response.
    pub fn without_handler(mut self, kind: InteractionType) -> Self {
        self.handlers.remove(&kind);
        self
    }

    pub fn registry(&self) -> &Arc<Registry<T>> {
        &self.registry
    }

    pub fn context(&self) -> &Context<T> {
        &self.context
    }

    pub async fn dispatch(&self, meta: EventMeta, interaction: Interaction) -> Result<(), Error> {
        let ctx = InteractionContext::new(meta, &self.context, interaction);
        Next::new(&self.middlewares, self).run(&ctx).await
    }

    /// End of the middleware chain.
    pub(crate) async fn terminal(&self, ctx: &InteractionContext<T>) -> Result<(), Error> {
        self.emit(
            ctx.meta.clone(),
            EventType::InteractionCreate,
            EventPayload::Interaction(ctx.interaction().clone()),
        )
        .await;

        let kind = ctx.interaction().kind();
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::debug!(?kind, "no handler for interaction type");
            return Ok(());
        };

        handler.handle(ctx).await
    }

    /// Run every handler bound to `kind`, a failing handler doesn't stop the rest.
    pub async fn emit(&self, meta: EventMeta, kind: EventType, payload: EventPayload) {
        let handlers = self.registry.events.get_all(kind);
        if handlers.is_empty() {
            return;
        }

        tracing::debug!("running event handlers for {:?}", kind);

        for handler in handlers {
            let ctx = EventContext {
                meta: meta.clone(),
                application_id: self.context.application_id,
                services: self.context.services.clone(),
                transport: Arc::clone(&self.context.transport),
                registry: Arc::clone(&self.registry),

                event: payload.clone(),
            };

            if let Err(err) = handler.run(ctx).await {
                tracing::warn!(
                    module = %handler.module,
                    uuid = %handler.uuid,
                    "error running event handler: {}",
                    err
                );
            }
        }
    }

    /// Entry point for gateway events. Interactions go through the pipeline,
    /// everything else straight to the event handlers.
    pub async fn handle(&self, meta: EventMeta, event: Event) {
        let create = match event {
            Event::InteractionCreate(create) => create,
            event => {
                let kind = event.kind();
                self.emit(meta, kind, EventPayload::Gateway(event)).await;
                return;
            }
        };

        let interaction = match interaction::parse(&create) {
            Ok(interaction) => interaction,
            Err(err) => {
                tracing::warn!(id = %create.id, "couldn't decode interaction: {}", err);
                return;
            }
        };

        if let Err(err) = self.dispatch(meta, interaction).await {
            tracing::warn!("error handling interaction: {}", err);
        }
    }
}
