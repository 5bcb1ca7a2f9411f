mod config;
mod context;
mod middleware;
mod modules;
mod repository;
mod transport;

use std::sync::Arc;

use bb8_redis::RedisConnectionManager;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;
use twilight_gateway::{Event, EventTypeFlags, Intents, Message, Shard, ShardId};

use lantern_framework::{
    middleware::{ErrorBoundary, TraceInteractions},
    settings::SettingsStore,
    Context, Dispatcher, Error, EventMeta, Registry,
};

use config::Config;
use context::Services;
use middleware::{Cooldowns, OwnerOnly};
use repository::RedisRepository;
use transport::TwilightTransport;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // load .env into environment vars, ignore if not found
    match dotenvy::dotenv().map(|_| ()) {
        Err(err) if err.not_found() => {
            tracing::warn!("no .env file found");
        }
        result => result?,
    };

    // create config from environment vars
    let config = Config::from_env()?;

    // set-up logging, RUST_LOG decides what gets through
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Arc::new(twilight_http::Client::new(config.discord_token.clone()));
    let app = client.current_user_application().await?.model().await?;

    // create the redis connection
    let manager = RedisConnectionManager::new(config.redis_url.clone())?;
    let redis = bb8::Pool::builder().build(manager).await?;

    let settings = SettingsStore::with_repository(
        "guild",
        Arc::new(RedisRepository::new(redis.clone(), "guild")),
    );
    let services = Services { redis, settings };

    // load modules
    let mut registry = Registry::new();
    for mut module in modules::all(&services.settings) {
        module.initialize().await?;
        registry.register(&mut module)?;
    }
    let registry = Arc::new(registry);

    // register commands
    let transport = Arc::new(TwilightTransport::new(Arc::clone(&client), app.id));
    match config.dev_guild() {
        Some(guild_id) => registry.sync_guild(transport.as_ref(), guild_id).await?,
        None => registry.sync_global(transport.as_ref()).await?,
    }

    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&registry), Context::new(app.id, services, transport))
            .middleware(ErrorBoundary)
            .middleware(TraceInteractions)
            .middleware(OwnerOnly::new(config.owners(), Arc::clone(&registry)))
            .middleware(Cooldowns::new(Arc::clone(&registry))),
    );

    let mut shard = Shard::new(ShardId::ONE, config.discord_token, Intents::GUILDS);

    // start main loop
    tracing::info!("starting main loop...");
    loop {
        match shard.next().await {
            Some(Ok(Message::Text(text))) => {
                let event = match twilight_gateway::parse(text, EventTypeFlags::all()) {
                    Ok(Some(event)) => Event::from(event),
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::warn!(?err, "couldn't parse gateway event");
                        continue;
                    }
                };

                let meta = EventMeta::new(shard.id().number());
                tracing::debug!(
                    event = ?event.kind(),
                    uuid = ?meta.uuid,
                    shard = meta.shard,
                    "event received",
                );

                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.handle(meta, event).await });
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::warn!(?frame, "gateway connection closed");
            }
            Some(Err(err)) => {
                tracing::error!(?err, "error receiving discord message");
            }
            None => {
                tracing::error!("gateway stream ended");
                break;
            }
        }
    }

    Ok(())
}
