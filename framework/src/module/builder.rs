use std::{collections::HashSet, sync::Arc};

use twilight_gateway::EventType;

use super::{Module, ModuleSet, Source};
use crate::{
    command::CommandNode,
    handler::{
        component_interaction_handler::{ComponentInteractionFunc, ComponentInteractionHandler},
        event_handler::EventFunc,
        modal_handler::{ModalFunc, ModalHandler},
    },
    settings::{GuildCache, SettingOption, SettingsRecord, SettingsStore},
    BoxFuture, Error,
};

pub struct ModuleBuilder<T: Clone + Send + Sync> {
    id: String,
    name: String,
    description: String,
    guild_scoped: bool,

    dependencies: Vec<Source<Module<T>>>,
    commands: Vec<Source<Vec<CommandNode<T>>>>,
    events: Vec<Source<Vec<(EventType, EventFunc<T>)>>>,
    components: Vec<ComponentInteractionHandler<T>>,
    modals: Vec<ModalHandler<T>>,
    settings: Vec<Arc<dyn SettingOption>>,
    stores: Vec<Arc<dyn GuildCache>>,
}

impl<T: Clone + Send + Sync + 'static> ModuleBuilder<T> {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            guild_scoped: false,

            dependencies: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
            components: Vec::new(),
            modals: Vec::new(),
            settings: Vec::new(),
            stores: Vec::new(),
        }
    }

    pub fn build(self) -> Module<T> {
        Module {
            id: self.id,
            name: self.name,
            description: self.description,
            guild_scoped: self.guild_scoped,

            pending_dependencies: self.dependencies,
            pending_commands: self.commands,
            pending_events: self.events,

            dependencies: ModuleSet::new(),
            commands: Vec::new(),
            events: Vec::new(),
            components: self.components,
            modals: self.modals,
            settings: self.settings,
            stores: self.stores,

            registered: HashSet::new(),
            initialized: false,
        }
    }

    /// Display name, defaults to the id.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    /// Commands of guild scoped modules are synced per guild instead of globally.
    pub fn guild(mut self) -> Self {
        self.guild_scoped = true;
        self
    }

    pub fn command(mut self, node: CommandNode<T>) -> Self {
        self.commands.push(Source::Ready(vec![node]));
        self
    }

    /// Commands built during [`Module::initialize`], after dependencies.
    pub fn commands_with<F>(mut self, loader: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<CommandNode<T>>, Error>> + Send + 'static,
    {
        self.commands.push(Source::Lazy(Box::new(loader)));
        self
    }

    pub fn component(mut self, custom_id: &str, func: ComponentInteractionFunc<T>) -> Self {
        self.components
            .push(ComponentInteractionHandler::new(&self.id, custom_id, func));
        self
    }

    pub fn modal(mut self, custom_id: &str, func: ModalFunc<T>) -> Self {
        self.modals.push(ModalHandler::new(&self.id, custom_id, func));
        self
    }

    pub fn event(mut self, event: EventType, func: EventFunc<T>) -> Self {
        self.events.push(Source::Ready(vec![(event, func)]));
        self
    }

    pub fn events_with<F>(mut self, loader: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<(EventType, EventFunc<T>)>, Error>>
            + Send
            + 'static,
    {
        self.events.push(Source::Lazy(Box::new(loader)));
        self
    }

    pub fn setting(mut self, option: impl SettingOption + 'static) -> Self {
        self.settings.push(Arc::new(option));
        self
    }

    /// Track a store so [`crate::Registry::clear_guild`] reaches it.
    pub fn store<R: SettingsRecord>(mut self, store: &SettingsStore<R>) -> Self {
        self.stores.push(Arc::new(store.clone()));
        self
    }

    /// A module initialized and registered together with this one.
    pub fn dependency(mut self, module: Module<T>) -> Self {
        self.dependencies.push(Source::Ready(module));
        self
    }

    pub fn dependency_with<F>(mut self, loader: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<Module<T>, Error>> + Send + 'static,
    {
        self.dependencies.push(Source::Lazy(Box::new(loader)));
        self
    }
}
