use std::time::Instant;

use bb8_redis::redis;
use twilight_gateway::{Event, EventType};

use lantern_framework::{
    context::EventPayload, handler_func, CommandNode, Error, Module, ModuleBuilder, UserError,
};

use crate::context::{CommandContext, EventContext, Services};

pub(crate) fn build() -> Module<Services> {
    ModuleBuilder::<Services>::new("core")
        .name("Core")
        .description("Health checks and maintenance")
        .command(CommandNode::leaf(
            "ping",
            "Check whether the bot is alive",
            handler_func!(ping),
        ))
        .command(
            CommandNode::group("cache", "Inspect cached data")
                .owner_only()
                .guild_only()
                .subcommand(CommandNode::leaf(
                    "clear",
                    "Forget cached settings of this server",
                    handler_func!(clear_cache),
                )),
        )
        .event(EventType::Ready, handler_func!(ready))
        .build()
}

async fn ping(ctx: CommandContext) -> Result<(), Error> {
    let started = Instant::now();
    let _: String = redis::cmd("PING")
        .query_async(&mut *ctx.services.redis.get().await?)
        .await?;

    ctx.reply(format!("Pong! redis answered in {:.1?}", started.elapsed()))
        .await
}

async fn clear_cache(ctx: CommandContext) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Err(UserError::new("This only works inside a server.").into());
    };

    let cached = ctx.services.settings.is_cached(guild_id);
    ctx.services.settings.clear(guild_id);
    tracing::info!(guild = %guild_id, cached, "cleared settings cache");

    ctx.reply_ephemeral(if cached {
        "Cached settings dropped, they'll be reloaded on next use."
    } else {
        "Nothing was cached for this server."
    })
    .await
}

async fn ready(ctx: EventContext) -> Result<(), Error> {
    let EventPayload::Gateway(Event::Ready(ready)) = &ctx.event else {
        return Ok(());
    };

    tracing::info!(
        shard = ctx.meta.shard,
        guilds = ready.guilds.len(),
        "connected as {}",
        ready.user.name
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use lantern_framework::Registry;

    use super::*;

    #[tokio::test]
    async fn cache_commands_are_owner_only() {
        let mut module = build();
        module.initialize().await.expect("initialize");
        let mut registry = Registry::new();
        registry.register(&mut module).expect("register");

        let cache = registry.find_command("cache").expect("cache");
        assert!(cache.is_owner_only());
        assert!(!registry.find_command("ping").expect("ping").is_owner_only());
        assert!(registry.find_command("cache clear").is_some());
        assert_eq!(registry.events().get_all(EventType::Ready).len(), 1);
    }
}
