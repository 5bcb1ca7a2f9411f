use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use twilight_model::id::{marker::UserMarker, Id};

use lantern_framework::{
    interaction::InteractionData,
    middleware::{Middleware, Next},
    CommandNode, Error, Interaction, InteractionContext, Registry, UserError,
};

/// The node a command interaction will run along with its top-level command,
/// `None` for anything else or commands the router will reject anyway.
fn resolve<'a, T: Clone + Send + Sync>(
    registry: &'a Registry<T>,
    interaction: &'a Interaction,
) -> Option<(&'a CommandNode<T>, &'a CommandNode<T>)> {
    let InteractionData::Command(command) = &interaction.data else {
        return None;
    };

    let root = registry.commands().get(&command.name)?;
    let (node, _) = root.resolve(&command.options).ok()?;
    Some((root.as_ref(), node))
}

/// Stops commands marked `owner_only` from running for anyone not listed.
pub struct OwnerOnly<T: Clone + Send + Sync> {
    owners: HashSet<Id<UserMarker>>,
    registry: Arc<Registry<T>>,
}

impl<T: Clone + Send + Sync> OwnerOnly<T> {
    pub fn new(owners: impl IntoIterator<Item = Id<UserMarker>>, registry: Arc<Registry<T>>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
            registry,
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Middleware<T> for OwnerOnly<T> {
    async fn handle(&self, ctx: &InteractionContext<T>, next: Next<'_, T>) -> Result<(), Error> {
        let interaction = ctx.interaction();
        if let Some((root, node)) = resolve(&self.registry, interaction) {
            let restricted = root.is_owner_only() || node.is_owner_only();
            let is_owner = interaction
                .user_id
                .is_some_and(|user| self.owners.contains(&user));

            if restricted && !is_owner {
                tracing::info!(user = ?interaction.user_id, command = node.path(), "denied owner only command");
                return Err(UserError::new("This command can only be used by the bot owners.").into());
            }
        }

        next.run(ctx).await
    }
}

/// Rate limits commands per user using each command's cooldown.
pub struct Cooldowns<T: Clone + Send + Sync> {
    registry: Arc<Registry<T>>,
    /// when each (user, command) may run again
    expires: Mutex<HashMap<(Id<UserMarker>, String), Instant>>,
}

impl<T: Clone + Send + Sync> Cooldowns<T> {
    pub fn new(registry: Arc<Registry<T>>) -> Self {
        Self {
            registry,
            expires: Mutex::new(HashMap::new()),
        }
    }

    /// Time left before `user` may run `path` again, starting a new cooldown
    /// when there's none.
    fn check(&self, user: Id<UserMarker>, path: &str, cooldown: Duration) -> Option<Duration> {
        let now = Instant::now();
        let mut expires = self.expires.lock();

        // forget expired entries so the map doesn't grow forever
        expires.retain(|_, until| *until > now);

        let key = (user, path.to_string());
        if let Some(until) = expires.get(&key) {
            return Some(until.duration_since(now));
        }

        expires.insert(key, now + cooldown);
        None
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Middleware<T> for Cooldowns<T> {
    async fn handle(&self, ctx: &InteractionContext<T>, next: Next<'_, T>) -> Result<(), Error> {
        let interaction = ctx.interaction();
        if let (Some((_, node)), Some(user)) =
            (resolve(&self.registry, interaction), interaction.user_id)
        {
            let cooldown = node.cooldown_duration();
            if !cooldown.is_zero() {
                if let Some(remaining) = self.check(user, node.path(), cooldown) {
                    return Err(UserError::new(format!(
                        "Slow down! You can use /{} again in {} seconds.",
                        node.path(),
                        remaining.as_secs_f64().ceil()
                    ))
                    .into());
                }
            }
        }

        next.run(ctx).await
    }
}
