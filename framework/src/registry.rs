use std::{
    collections::{hash_map::Values, HashMap},
    hash::Hash,
    sync::Arc,
};

use twilight_gateway::EventType;
use twilight_model::{
    application::command::Command,
    id::{marker::GuildMarker, Id},
};

use crate::{
    command::CommandNode,
    handler::{
        component_interaction_handler::ComponentInteractionHandler, event_handler::EventHandler,
        modal_handler::ModalHandler, InteractionHandler,
    },
    settings::{GuildCache, SettingOption},
    transport::Transport,
    Error,
};

/// Handlers keyed by `custom_id`.
pub struct InteractionRegistry<K: Eq + Hash, V: InteractionHandler<K>> {
    interactions: HashMap<K, V>,
}

impl<K: Eq + Hash, V: InteractionHandler<K>> InteractionRegistry<K, V> {
    pub fn new() -> Self {
        Self {
            interactions: HashMap::new(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.interactions.values()
    }

    pub fn insert(&mut self, val: V) -> Option<V> {
        self.interactions.insert(val.key(), val)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.interactions.get(key)
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

impl<V: InteractionHandler<String>> InteractionRegistry<String, V> {
    /// Exact `custom_id` first, then whatever comes before the first `:`, so
    /// `page:3` ends up at the handler for `page`.
    pub fn find(&self, custom_id: &str) -> Option<&V> {
        if let Some(handler) = self.interactions.get(custom_id) {
            return Some(handler);
        }

        let (prefix, _) = custom_id.split_once(':')?;
        self.interactions.get(prefix)
    }
}

impl<K: Eq + Hash, V: InteractionHandler<K>> Default for InteractionRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level command nodes by name.
pub struct CommandRegistry<T: Clone + Send + Sync> {
    commands: HashMap<String, Arc<CommandNode<T>>>,
}

impl<T: Clone + Send + Sync> CommandRegistry<T> {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn insert(&mut self, node: Arc<CommandNode<T>>) -> Option<Arc<CommandNode<T>>> {
        self.commands.insert(node.name().to_string(), node)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CommandNode<T>>> {
        self.commands.get(name)
    }

    /// Look a node up by its qualified path, `config edit`.
    pub fn find(&self, path: &str) -> Option<&CommandNode<T>> {
        let mut parts = path.split_whitespace();
        let mut node = self.commands.get(parts.next()?)?.as_ref();
        for part in parts {
            node = node.child(part)?;
        }
        Some(node)
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<CommandNode<T>>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<T: Clone + Send + Sync> Default for CommandRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Event bindings per event type, in registration order.
pub struct EventRegistry<T: Clone + Send + Sync> {
    handlers: HashMap<EventType, Vec<EventHandler<T>>>,
}

impl<T: Clone + Send + Sync> EventRegistry<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Returns false when this exact binding was already present.
    pub fn insert(&mut self, val: EventHandler<T>) -> bool {
        let handlers = self.handlers.entry(val.event).or_default();
        if handlers.contains(&val) {
            return false;
        }

        handlers.push(val);
        true
    }

    pub fn get_all(&self, key: EventType) -> &[EventHandler<T>] {
        self.handlers.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What the registry remembers about a registered module.
pub struct ModuleEntry<T: Clone + Send + Sync> {
    pub name: String,
    pub description: String,
    pub guild_scoped: bool,
    pub commands: Vec<Arc<CommandNode<T>>>,
    pub settings: Vec<Arc<dyn SettingOption>>,
    pub stores: Vec<Arc<dyn GuildCache>>,
}

pub struct Registry<T: Clone + Send + Sync> {
    modules: HashMap<String, ModuleEntry<T>>,

    pub(crate) commands: CommandRegistry<T>,
    pub(crate) components: InteractionRegistry<String, ComponentInteractionHandler<T>>,
    pub(crate) modals: InteractionRegistry<String, ModalHandler<T>>,
    pub(crate) events: EventRegistry<T>,
}

impl<T: Clone + Send + Sync> Registry<T> {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            commands: CommandRegistry::new(),
            components: InteractionRegistry::new(),
            modals: InteractionRegistry::new(),
            events: EventRegistry::new(),
        }
    }

    pub(crate) fn track(&mut self, id: &str, entry: ModuleEntry<T>) {
        self.modules.insert(id.to_string(), entry);
    }

    pub fn commands(&self) -> &CommandRegistry<T> {
        &self.commands
    }

    pub fn events(&self) -> &EventRegistry<T> {
        &self.events
    }

    pub fn components(&self) -> &InteractionRegistry<String, ComponentInteractionHandler<T>> {
        &self.components
    }

    pub fn modals(&self) -> &InteractionRegistry<String, ModalHandler<T>> {
        &self.modals
    }

    pub fn find_command(&self, path: &str) -> Option<&CommandNode<T>> {
        self.commands.find(path)
    }

    pub fn module(&self, id: &str) -> Option<&ModuleEntry<T>> {
        self.modules.get(id)
    }

    pub fn global_commands(&self) -> Vec<Command> {
        self.modules
            .values()
            .filter(|m| !m.guild_scoped) // filter out guild scoped modules
            .flat_map(|m| m.commands.iter().map(|node| node.to_command()))
            .collect()
    }

    pub fn module_commands(&self, module: &str) -> Option<Vec<Command>> {
        Some(
            self.modules
                .get(module)?
                .commands
                .iter()
                .map(|node| node.to_command())
                .collect(),
        )
    }

    pub fn guild_module_names(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, m)| m.guild_scoped)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Setting options of a module, in declaration order.
    pub fn config(&self, module: &str) -> Option<&[Arc<dyn SettingOption>]> {
        self.modules.get(module).map(|m| m.settings.as_slice())
    }

    /// Every setting option across all modules.
    pub fn settings(&self) -> impl Iterator<Item = &Arc<dyn SettingOption>> {
        self.modules.values().flat_map(|m| m.settings.iter())
    }

    /// Drop cached settings for a guild from every module's stores.
    pub fn clear_guild(&self, guild_id: Id<GuildMarker>) {
        for store in self.modules.values().flat_map(|m| m.stores.iter()) {
            store.clear(guild_id);
        }
    }

    pub async fn sync_global(&self, transport: &dyn Transport) -> Result<(), Error> {
        let commands = self.global_commands();

        tracing::info!(
            "setting global commands [{}]",
            commands
                .iter()
                .map(|cmd| cmd.name.clone())
                .collect::<Vec<String>>()
                .join(", ")
        );

        transport.set_global_commands(&commands).await
    }

    pub async fn sync_guild(
        &self,
        transport: &dyn Transport,
        guild_id: Id<GuildMarker>,
    ) -> Result<(), Error> {
        let commands: Vec<Command> = self
            .modules
            .values()
            .flat_map(|m| m.commands.iter().map(|node| node.to_command()))
            .collect();

        tracing::debug!(
            "setting commands [{}] for guild {}",
            commands
                .iter()
                .map(|cmd| cmd.name.clone())
                .collect::<Vec<String>>()
                .join(", "),
            guild_id
        );

        transport.set_guild_commands(guild_id, &commands).await
    }
}

impl<T: Clone + Send + Sync> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
