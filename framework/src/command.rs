use std::{collections::HashMap, time::Duration};

use twilight_model::{
    application::{
        command::{Command, CommandOption, CommandOptionType, CommandType},
        interaction::{
            application_command::{CommandDataOption, CommandOptionValue},
            InteractionContextType,
        },
    },
    guild::Permissions,
};
use twilight_util::builder::command::{CommandBuilder, SubCommandBuilder, SubCommandGroupBuilder};
use uuid::Uuid;

use crate::{
    context::{AutocompleteContext, CommandContext},
    error::ConfigError,
    transport::AutocompleteChoice,
    BoxFuture, Error,
};

pub type CommandFunc<T> = fn(CommandContext<T>) -> BoxFuture<'static, Result<(), Error>>;

pub type AutocompleteFunc<T> =
    fn(AutocompleteContext<T>) -> BoxFuture<'static, Result<Vec<AutocompleteChoice>, Error>>;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Deepest position a group may sit at, top level is 0.
const MAX_GROUP_DEPTH: usize = 1;

#[derive(Clone)]
pub struct Parameter<T: Clone + Send + Sync> {
    pub option: CommandOption,
    pub autocomplete: Option<AutocompleteFunc<T>>,
}

impl<T: Clone + Send + Sync> Parameter<T> {
    pub fn name(&self) -> &str {
        &self.option.name
    }

    /// Integer and number options get their typed-so-far text parsed before autocomplete.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.option.kind,
            CommandOptionType::Integer | CommandOptionType::Number
        )
    }

    fn descriptor(&self) -> CommandOption {
        let mut option = self.option.clone();
        if matches!(
            option.kind,
            CommandOptionType::String | CommandOptionType::Integer | CommandOptionType::Number
        ) {
            option.autocomplete = Some(self.autocomplete.is_some());
        }
        option
    }
}

#[derive(Clone)]
enum NodeKind<T: Clone + Send + Sync> {
    Leaf {
        parameters: Vec<Parameter<T>>,
        func: CommandFunc<T>,
    },
    Group {
        children: Vec<CommandNode<T>>,
    },
}

/// One entry of the command tree, either a leaf that runs something or a
/// group of subcommands.
#[derive(Clone)]
pub struct CommandNode<T: Clone + Send + Sync> {
    uuid: Uuid,
    name: String,
    description: String,
    name_localizations: HashMap<String, String>,
    description_localizations: HashMap<String, String>,
    kind: CommandType,
    app_permissions: Option<Permissions>,
    default_member_permissions: Option<Permissions>,
    cooldown: Duration,
    contexts: Vec<InteractionContextType>,
    owner_only: bool,
    path: String,
    misuse: Option<ConfigError>,
    body: NodeKind<T>,
}

impl<T: Clone + Send + Sync> CommandNode<T> {
    fn new(name: &str, description: &str, body: NodeKind<T>) -> Self {
        Self {
            uuid: Uuid::now_v7(),
            name: name.to_string(),
            description: description.to_string(),
            name_localizations: HashMap::new(),
            description_localizations: HashMap::new(),
            kind: CommandType::ChatInput,
            app_permissions: None,
            default_member_permissions: None,
            cooldown: DEFAULT_COOLDOWN,
            contexts: vec![
                InteractionContextType::Guild,
                InteractionContextType::BotDm,
                InteractionContextType::PrivateChannel,
            ],
            owner_only: false,
            path: name.to_string(),
            misuse: None,
            body,
        }
    }

    pub fn leaf(name: &str, description: &str, func: CommandFunc<T>) -> Self {
        Self::new(
            name,
            description,
            NodeKind::Leaf {
                parameters: Vec::new(),
                func,
            },
        )
    }

    pub fn group(name: &str, description: &str) -> Self {
        Self::new(
            name,
            description,
            NodeKind::Group {
                children: Vec::new(),
            },
        )
    }

    pub fn kind(mut self, kind: CommandType) -> Self {
        self.kind = kind;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.default_member_permissions = Some(permissions);
        self
    }

    pub fn app_permissions(mut self, permissions: Permissions) -> Self {
        self.app_permissions = Some(permissions);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn contexts(mut self, contexts: impl IntoIterator<Item = InteractionContextType>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }

    pub fn guild_only(self) -> Self {
        self.contexts([InteractionContextType::Guild])
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn localize_name(mut self, locale: &str, name: &str) -> Self {
        self.name_localizations
            .insert(locale.to_string(), name.to_string());
        self
    }

    pub fn localize_description(mut self, locale: &str, description: &str) -> Self {
        self.description_localizations
            .insert(locale.to_string(), description.to_string());
        self
    }

    pub fn option(self, option: CommandOption) -> Self {
        self.parameter(Parameter {
            option,
            autocomplete: None,
        })
    }

    pub fn autocomplete_option(self, option: CommandOption, func: AutocompleteFunc<T>) -> Self {
        self.parameter(Parameter {
            option,
            autocomplete: Some(func),
        })
    }

    fn parameter(mut self, parameter: Parameter<T>) -> Self {
        match &mut self.body {
            NodeKind::Leaf { parameters, .. } => parameters.push(parameter),
            NodeKind::Group { .. } => {
                self.misuse
                    .get_or_insert(ConfigError::NotALeaf(self.name.clone()));
            }
        }
        self
    }

    pub fn subcommand(mut self, child: CommandNode<T>) -> Self {
        match &mut self.body {
            NodeKind::Group { children } => children.push(child),
            NodeKind::Leaf { .. } => {
                self.misuse
                    .get_or_insert(ConfigError::NotAGroup(self.name.clone()));
            }
        }
        self
    }

    /// Validates the tree, assigns qualified paths and folds the member
    /// permissions of children into their groups.
    pub fn initialize(mut self) -> Result<Self, ConfigError> {
        self.seal(None, 0)?;
        Ok(self)
    }

    fn seal(&mut self, parent: Option<&str>, depth: usize) -> Result<(), ConfigError> {
        self.path = match parent {
            Some(parent) => format!("{} {}", parent, self.name),
            None => self.name.clone(),
        };

        if let Some(err) = self.misuse.take() {
            return Err(err);
        }

        let NodeKind::Group { children } = &mut self.body else {
            return Ok(());
        };

        if depth > MAX_GROUP_DEPTH {
            return Err(ConfigError::NestingTooDeep(self.path.clone()));
        }
        if children.is_empty() {
            return Err(ConfigError::EmptyGroup(self.path.clone()));
        }

        let mut seen = std::collections::HashSet::new();
        let mut permissions = self.default_member_permissions;
        for child in children.iter_mut() {
            if !seen.insert(child.name.clone()) {
                return Err(ConfigError::DuplicateChild(
                    self.path.clone(),
                    child.name.clone(),
                ));
            }

            child.seal(Some(&self.path), depth + 1)?;

            if let Some(child_permissions) = child.default_member_permissions {
                permissions = Some(permissions.unwrap_or_else(Permissions::empty) | child_permissions);
            }
        }
        self.default_member_permissions = permissions;

        Ok(())
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Space separated name including parents, `config edit`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn command_type(&self) -> CommandType {
        self.kind
    }

    pub fn default_member_permissions(&self) -> Option<Permissions> {
        self.default_member_permissions
    }

    pub fn required_app_permissions(&self) -> Option<Permissions> {
        self.app_permissions
    }

    pub fn cooldown_duration(&self) -> Duration {
        self.cooldown
    }

    pub fn is_owner_only(&self) -> bool {
        self.owner_only
    }

    pub fn is_group(&self) -> bool {
        matches!(self.body, NodeKind::Group { .. })
    }

    pub fn children(&self) -> &[CommandNode<T>] {
        match &self.body {
            NodeKind::Group { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    pub fn parameters(&self) -> &[Parameter<T>] {
        match &self.body {
            NodeKind::Leaf { parameters, .. } => parameters,
            NodeKind::Group { .. } => &[],
        }
    }

    pub fn parameter_named(&self, name: &str) -> Option<&Parameter<T>> {
        self.parameters().iter().find(|param| param.name() == name)
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode<T>> {
        self.children().iter().find(|child| child.name == name)
    }

    pub async fn execute(&self, ctx: CommandContext<T>) -> Result<(), Error> {
        match &self.body {
            NodeKind::Leaf { func, .. } => (func)(ctx).await,
            NodeKind::Group { .. } => Err(ConfigError::GroupNotExecutable(self.path.clone()).into()),
        }
    }

    /// Walks the subcommand options of an invocation down to the node that
    /// should run, returning it along with its own options.
    pub fn resolve<'a>(
        &'a self,
        options: &'a [CommandDataOption],
    ) -> Result<(&'a CommandNode<T>, &'a [CommandDataOption]), ConfigError> {
        if !self.is_group() {
            return Ok((self, options));
        }

        let Some((name, nested)) = options.iter().find_map(|opt| match &opt.value {
            CommandOptionValue::SubCommand(nested) | CommandOptionValue::SubCommandGroup(nested) => {
                Some((&opt.name, nested))
            }
            _ => None,
        }) else {
            return Err(ConfigError::GroupNotExecutable(self.path.clone()));
        };

        let child = self
            .child(name)
            .ok_or_else(|| ConfigError::UnknownCommand(format!("{} {}", self.path, name)))?;

        child.resolve(nested)
    }

    /// Catalog entry for a top-level node.
    pub fn to_command(&self) -> Command {
        let mut builder = CommandBuilder::new(self.name.clone(), self.description.clone(), self.kind);
        if let Some(permissions) = self.default_member_permissions {
            builder = builder.default_member_permissions(permissions);
        }

        let mut command = builder.build();
        command.options = self.option_descriptors();
        command.contexts = Some(self.contexts.clone());
        if !self.name_localizations.is_empty() {
            command.name_localizations = Some(self.name_localizations.clone());
        }
        if !self.description_localizations.is_empty() {
            command.description_localizations = Some(self.description_localizations.clone());
        }

        command
    }

    fn option_descriptors(&self) -> Vec<CommandOption> {
        match &self.body {
            NodeKind::Group { children } => children.iter().map(Self::to_option).collect(),
            NodeKind::Leaf { parameters, .. } => {
                parameters.iter().map(Parameter::descriptor).collect()
            }
        }
    }

    fn to_option(&self) -> CommandOption {
        let mut option = if self.is_group() {
            SubCommandGroupBuilder::new(self.name.clone(), self.description.clone()).build()
        } else {
            SubCommandBuilder::new(self.name.clone(), self.description.clone()).build()
        };

        option.options = Some(self.option_descriptors());
        if !self.name_localizations.is_empty() {
            option.name_localizations = Some(self.name_localizations.clone());
        }
        if !self.description_localizations.is_empty() {
            option.description_localizations = Some(self.description_localizations.clone());
        }

        option
    }
}

/// Depth first search for the option the user is typing in, along with the
/// name of the subcommand it belongs to.
pub fn find_focused(options: &[CommandDataOption]) -> Option<(&str, &str, CommandOptionType)> {
    for option in options {
        match &option.value {
            CommandOptionValue::Focused(value, kind) => {
                return Some((option.name.as_str(), value.as_str(), *kind))
            }
            CommandOptionValue::SubCommand(nested)
            | CommandOptionValue::SubCommandGroup(nested) => {
                if let Some(found) = find_focused(nested) {
                    return Some(found);
                }
            }
            _ => (),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use twilight_util::builder::command::{IntegerBuilder, StringBuilder};

    use super::*;
    use crate::test_utils::{focused, sub, sub_group, Services};

    async fn noop(_ctx: CommandContext<Services>) -> Result<(), Error> {
        Ok(())
    }

    async fn suggest(
        _ctx: AutocompleteContext<Services>,
    ) -> Result<Vec<AutocompleteChoice>, Error> {
        Ok(vec![])
    }

    fn leaf(name: &str) -> CommandNode<Services> {
        CommandNode::leaf(name, "test", crate::handler_func!(noop))
    }

    #[test]
    fn group_permissions_are_folded() {
        let cases = [
            (Permissions::MANAGE_GUILD, Permissions::BAN_MEMBERS),
            (Permissions::MANAGE_GUILD, Permissions::MANAGE_GUILD),
            (
                Permissions::MANAGE_GUILD | Permissions::KICK_MEMBERS,
                Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS,
            ),
        ];

        for (a, b) in cases {
            let node = CommandNode::group("mod", "test")
                .subcommand(leaf("a").permissions(a))
                .subcommand(leaf("b").permissions(b))
                .initialize()
                .expect("valid tree");

            assert_eq!(node.default_member_permissions(), Some(a | b));
        }
    }

    #[test]
    fn group_keeps_its_own_permissions() {
        let node = CommandNode::group("mod", "test")
            .permissions(Permissions::ADMINISTRATOR)
            .subcommand(leaf("a").permissions(Permissions::BAN_MEMBERS))
            .initialize()
            .expect("valid tree");

        assert_eq!(
            node.default_member_permissions(),
            Some(Permissions::ADMINISTRATOR | Permissions::BAN_MEMBERS)
        );
    }

    #[test]
    fn paths_are_qualified() {
        let node = CommandNode::group("config", "test")
            .subcommand(CommandNode::group("roles", "test").subcommand(leaf("add")))
            .initialize()
            .expect("valid tree");

        let add = &node.children()[0].children()[0];
        assert_eq!(add.path(), "config roles add");
    }

    #[test]
    fn invalid_trees_are_rejected() {
        assert_eq!(
            CommandNode::<Services>::group("empty", "test")
                .initialize()
                .err(),
            Some(ConfigError::EmptyGroup("empty".into()))
        );

        assert_eq!(
            CommandNode::group("dupe", "test")
                .subcommand(leaf("a"))
                .subcommand(leaf("a"))
                .initialize()
                .err(),
            Some(ConfigError::DuplicateChild("dupe".into(), "a".into()))
        );

        assert_eq!(
            CommandNode::group("a", "test")
                .subcommand(
                    CommandNode::group("b", "test")
                        .subcommand(CommandNode::group("c", "test").subcommand(leaf("d")))
                )
                .initialize()
                .err(),
            Some(ConfigError::NestingTooDeep("a b c".into()))
        );

        assert_eq!(
            leaf("ping").subcommand(leaf("pong")).initialize().err(),
            Some(ConfigError::NotAGroup("ping".into()))
        );
    }

    #[tokio::test]
    async fn groups_cannot_execute() {
        let node = CommandNode::group("config", "test")
            .subcommand(leaf("view"))
            .initialize()
            .expect("valid tree");

        let ctx = crate::test_utils::command_context(&node, vec![]);
        let err = node.execute(ctx).await.expect_err("group executed");

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::GroupNotExecutable("config".into()))
        );
    }

    #[test]
    fn resolve_walks_subcommands() {
        let node = CommandNode::group("config", "test")
            .subcommand(CommandNode::group("roles", "test").subcommand(leaf("add")))
            .subcommand(leaf("view"))
            .initialize()
            .expect("valid tree");

        let options = vec![sub_group(
            "roles",
            vec![sub("add", vec![focused("role", "ad")])],
        )];
        let (resolved, rest) = node.resolve(&options).expect("resolves");

        assert_eq!(resolved.path(), "config roles add");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "role");
    }

    #[test]
    fn find_focused_at_any_depth() {
        let options = vec![sub_group(
            "a",
            vec![
                sub("b", vec![]),
                sub(
                    "c",
                    vec![
                        CommandDataOption {
                            name: "first".into(),
                            value: CommandOptionValue::String("x".into()),
                        },
                        focused("second", "typed"),
                    ],
                ),
            ],
        )];

        assert_eq!(
            find_focused(&options),
            Some(("second", "typed", CommandOptionType::String))
        );
        assert_eq!(find_focused(&[]), None);
    }

    #[test]
    fn descriptor_lists_children_and_autocomplete() {
        let node = CommandNode::group("config", "test")
            .subcommand(
                leaf("edit")
                    .autocomplete_option(
                        StringBuilder::new("setting", "which one").required(true).build(),
                        crate::handler_func!(suggest),
                    )
                    .option(IntegerBuilder::new("amount", "how many").build()),
            )
            .initialize()
            .expect("valid tree");

        let command = node.to_command();
        assert_eq!(command.name, "config");
        assert_eq!(command.options.len(), 1);

        let edit = &command.options[0];
        assert_eq!(edit.kind, CommandOptionType::SubCommand);

        let params = edit.options.as_deref().unwrap_or_default();
        assert_eq!(params[0].autocomplete, Some(true));
        assert_eq!(params[1].autocomplete, Some(false));
    }
}
