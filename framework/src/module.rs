use std::{collections::HashSet, sync::Arc};

use twilight_gateway::EventType;
use uuid::Uuid;

use crate::{
    command::CommandNode,
    error::ConfigError,
    handler::{
        component_interaction_handler::ComponentInteractionHandler,
        event_handler::{EventFunc, EventHandler},
        modal_handler::ModalHandler,
    },
    registry::{ModuleEntry, Registry},
    settings::{GuildCache, SettingOption},
    BoxFuture, Error,
};

pub mod builder;
pub mod dependencies;

pub use dependencies::ModuleSet;

/// Produces something a module owns once the module is initialized.
pub type Loader<V> = Box<dyn FnOnce() -> BoxFuture<'static, Result<V, Error>> + Send>;

pub(crate) enum Source<V> {
    Ready(V),
    Lazy(Loader<V>),
}

impl<V> Source<V> {
    async fn resolve(self) -> Result<V, Error> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Lazy(loader) => loader().await,
        }
    }
}

/// A bundle of commands, events, interaction handlers and settings that's
/// initialized once and then registered into a [`Registry`].
pub struct Module<T: Clone + Send + Sync> {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) guild_scoped: bool,

    pub(crate) pending_dependencies: Vec<Source<Module<T>>>,
    pub(crate) pending_commands: Vec<Source<Vec<CommandNode<T>>>>,
    pub(crate) pending_events: Vec<Source<Vec<(EventType, EventFunc<T>)>>>,

    pub(crate) dependencies: ModuleSet<T>,
    pub(crate) commands: Vec<Arc<CommandNode<T>>>,
    pub(crate) events: Vec<EventHandler<T>>,
    pub(crate) components: Vec<ComponentInteractionHandler<T>>,
    pub(crate) modals: Vec<ModalHandler<T>>,
    pub(crate) settings: Vec<Arc<dyn SettingOption>>,
    pub(crate) stores: Vec<Arc<dyn GuildCache>>,

    registered: HashSet<Uuid>,
    initialized: bool,
}

impl<T: Clone + Send + Sync + 'static> Module<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_guild_scoped(&self) -> bool {
        self.guild_scoped
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Empty until [`Module::initialize`] has run.
    pub fn commands(&self) -> &[Arc<CommandNode<T>>] {
        &self.commands
    }

    pub fn events(&self) -> &[EventHandler<T>] {
        &self.events
    }

    pub fn dependencies(&self) -> &ModuleSet<T> {
        &self.dependencies
    }

    /// Setting options in declaration order.
    pub fn config(&self) -> &[Arc<dyn SettingOption>] {
        &self.settings
    }

    /// Resolve dependencies, then commands, then events. Dependencies go
    /// first as their services may be needed to build the commands.
    pub fn initialize(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            if self.initialized {
                return Err(ConfigError::AlreadyInitialized(self.id.clone()).into());
            }

            for source in std::mem::take(&mut self.pending_dependencies) {
                let mut dependency = source.resolve().await?;
                dependency.initialize().await?;

                if !self.dependencies.add(dependency) {
                    tracing::warn!(module = %self.id, "ignoring duplicate dependency");
                }
            }

            for source in std::mem::take(&mut self.pending_commands) {
                for node in source.resolve().await? {
                    self.commands.push(Arc::new(node.initialize()?));
                }
            }

            for source in std::mem::take(&mut self.pending_events) {
                for (event, func) in source.resolve().await? {
                    self.events.push(EventHandler::new(&self.id, event, func));
                }
            }

            self.initialized = true;

            tracing::debug!(
                module = %self.id,
                commands = self.commands.len(),
                events = self.events.len(),
                dependencies = self.dependencies.len(),
                "initialized module"
            );

            Ok(())
        })
    }

    /// Copy commands and interaction handlers into `registry`, dependencies
    /// included. Returns how many commands were new.
    pub fn register_commands(&mut self, registry: &mut Registry<T>) -> Result<usize, ConfigError> {
        if !self.initialized {
            return Err(ConfigError::NotInitialized(self.id.clone()));
        }

        let mut added = 0;
        for dependency in self.dependencies.iter_mut() {
            added += dependency.register_commands(registry)?;
        }

        for node in &self.commands {
            if self.registered.insert(node.uuid()) {
                registry.commands.insert(Arc::clone(node));
                added += 1;
            }
        }

        // keyed by custom_id, inserting again just replaces the same handler
        for component in &self.components {
            registry.components.insert(component.clone());
        }
        for modal in &self.modals {
            registry.modals.insert(modal.clone());
        }

        registry.track(
            &self.id,
            ModuleEntry {
                name: self.name.clone(),
                description: self.description.clone(),
                guild_scoped: self.guild_scoped,
                commands: self.commands.clone(),
                settings: self.settings.clone(),
                stores: self.stores.clone(),
            },
        );

        Ok(added)
    }

    /// Bind events into `registry`, dependencies included. Returns how many
    /// bindings were new.
    pub fn register_events(&mut self, registry: &mut Registry<T>) -> Result<usize, ConfigError> {
        if !self.initialized {
            return Err(ConfigError::NotInitialized(self.id.clone()));
        }

        let mut added = 0;
        for dependency in self.dependencies.iter_mut() {
            added += dependency.register_events(registry)?;
        }

        for handler in &self.events {
            if self.registered.insert(handler.uuid) && registry.events.insert(handler.clone()) {
                added += 1;
            }
        }

        Ok(added)
    }
}

impl<T: Clone + Send + Sync + 'static> Registry<T> {
    /// Register everything an initialized module provides.
    pub fn register(&mut self, module: &mut Module<T>) -> Result<(), ConfigError> {
        let commands = module.register_commands(self)?;
        let events = module.register_events(self)?;

        tracing::info!(module = %module.id, commands, events, "registered module");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use twilight_model::guild::Permissions;

    use super::*;
    use crate::{
        context::{CommandContext, EventContext},
        handler_func,
        module::builder::ModuleBuilder,
        settings::{GuildSettingOption, OptionKind, SettingsStore},
        test_utils::{Services, TestSettings},
    };

    async fn noop(_ctx: CommandContext<Services>) -> Result<(), Error> {
        Ok(())
    }

    async fn on_event(_ctx: EventContext<Services>) -> Result<(), Error> {
        Ok(())
    }

    fn ping() -> CommandNode<Services> {
        CommandNode::leaf("ping", "test", handler_func!(noop))
    }

    async fn lazy_commands() -> Result<Vec<CommandNode<Services>>, Error> {
        Ok(vec![CommandNode::group("roles", "test")
            .subcommand(
                CommandNode::leaf("add", "test", handler_func!(noop))
                    .permissions(Permissions::MANAGE_ROLES),
            )
            .subcommand(
                CommandNode::leaf("list", "test", handler_func!(noop))
                    .permissions(Permissions::VIEW_AUDIT_LOG),
            )])
    }

    async fn core_module() -> Result<Module<Services>, Error> {
        Ok(ModuleBuilder::new("core")
            .command(CommandNode::leaf("stats", "test", handler_func!(noop)))
            .event(EventType::Ready, handler_func!(on_event))
            .build())
    }

    fn module() -> Module<Services> {
        ModuleBuilder::new("roles")
            .name("Roles")
            .command(ping())
            .commands_with(|| Box::pin(lazy_commands()))
            .event(EventType::GuildCreate, handler_func!(on_event))
            .event(EventType::InteractionCreate, handler_func!(on_event))
            .dependency_with(|| Box::pin(core_module()))
            .build()
    }

    #[tokio::test]
    async fn nothing_is_resolved_before_initialize() {
        let mut module = module();
        assert!(module.commands().is_empty());
        assert!(module.events().is_empty());
        assert!(module.dependencies().is_empty());

        let mut registry = Registry::new();
        assert_eq!(
            module.register_commands(&mut registry),
            Err(ConfigError::NotInitialized("roles".into()))
        );

        module.initialize().await.expect("initialize");
        assert_eq!(module.commands().len(), 2);
        assert_eq!(module.events().len(), 2);
        assert!(module.dependencies().get("core").is_some_and(Module::is_initialized));
    }

    #[tokio::test]
    async fn initialize_only_once() {
        let mut module = module();
        module.initialize().await.expect("initialize");

        let err = module.initialize().await.expect_err("second initialize");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::AlreadyInitialized("roles".into()))
        );
    }

    #[tokio::test]
    async fn invalid_commands_fail_initialize() {
        let mut module = ModuleBuilder::<Services>::new("broken")
            .command(CommandNode::group("empty", "test"))
            .build();

        let err = module.initialize().await.expect_err("empty group");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EmptyGroup("empty".into()))
        );
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn failing_dependency_fails_the_module() {
        async fn broken() -> Result<Module<Services>, Error> {
            Err("database unavailable".into())
        }

        let mut module = ModuleBuilder::<Services>::new("roles")
            .command(ping())
            .dependency_with(|| Box::pin(broken()))
            .build();

        assert!(module.initialize().await.is_err());
        assert!(module.commands().is_empty());
    }

    #[tokio::test]
    async fn registering_twice_changes_nothing() {
        let mut module = module();
        module.initialize().await.expect("initialize");

        let mut registry = Registry::new();
        registry.register(&mut module).expect("register");
        let sizes = (registry.commands().len(), registry.events().len());
        assert_eq!(sizes, (3, 3));

        for _ in 0..3 {
            assert_eq!(module.register_commands(&mut registry), Ok(0));
            assert_eq!(module.register_events(&mut registry), Ok(0));
            registry.register(&mut module).expect("register");
        }

        assert_eq!((registry.commands().len(), registry.events().len()), sizes);
        assert!(registry.module("roles").is_some());
        assert!(registry.module("core").is_some());
    }

    #[tokio::test]
    async fn group_permissions_are_folded() {
        let mut module = module();
        module.initialize().await.expect("initialize");

        let roles = module
            .commands()
            .iter()
            .find(|node| node.name() == "roles")
            .expect("roles command");
        assert_eq!(
            roles.default_member_permissions(),
            Some(Permissions::MANAGE_ROLES | Permissions::VIEW_AUDIT_LOG)
        );
    }

    #[tokio::test]
    async fn settings_are_exposed_in_order() {
        let store = SettingsStore::<TestSettings>::new("test");
        let mut module = ModuleBuilder::<Services>::new("config")
            .guild()
            .store(&store)
            .setting(GuildSettingOption::new("enabled", "test", OptionKind::Boolean).bind(&store, "enabled"))
            .setting(GuildSettingOption::new("role", "test", OptionKind::Role).bind(&store, "roleID"))
            .build();
        module.initialize().await.expect("initialize");

        let names: Vec<&str> = module.config().iter().map(|option| option.name()).collect();
        assert_eq!(names, vec!["enabled", "role"]);

        let mut registry = Registry::new();
        registry.register(&mut module).expect("register");
        let names: Vec<&str> = registry
            .config("config")
            .unwrap_or_default()
            .iter()
            .map(|option| option.name())
            .collect();
        assert_eq!(names, vec!["enabled", "role"]);
        assert_eq!(registry.guild_module_names(), vec!["config".to_string()]);
        assert!(registry.global_commands().is_empty());
    }
}
