use thiserror::Error;

/// Mistakes in how commands, modules and settings are wired together. These are
/// never shown to users, they're meant to blow up in development and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("command group /{0} can't be executed directly")]
    GroupNotExecutable(String),
    #[error("command group /{0} has no subcommands")]
    EmptyGroup(String),
    #[error("command /{0} has more than one child named {1}")]
    DuplicateChild(String, String),
    #[error("command /{0} is nested too deeply, groups can only contain subcommands")]
    NestingTooDeep(String),
    #[error("command /{0} can't have subcommands, it's not a group")]
    NotAGroup(String),
    #[error("command /{0} can't have options, it's a group")]
    NotALeaf(String),
    #[error("unknown command /{0}")]
    UnknownCommand(String),
    #[error("autocomplete request for /{0} has no focused option")]
    NoFocusedOption(String),
    #[error("command /{command} has no option named {option}")]
    UnknownOption { command: String, option: String },
    #[error("option {option} of /{command} has no autocomplete handler")]
    MissingAutocomplete { command: String, option: String },
    #[error("setting \"{0}\" isn't bound to a store")]
    UnboundOption(String),
    #[error("settings record has no field {0}")]
    UnknownField(String),
    #[error("module {0} is already initialized")]
    AlreadyInitialized(String),
    #[error("module {0} isn't initialized yet")]
    NotInitialized(String),
    #[error("unexpected interaction data, expected {0}")]
    UnexpectedInteraction(&'static str),
}

/// An error that's safe to show to the user as-is, raised deliberately by
/// command code. The error boundary middleware renders it as an ephemeral
/// message instead of a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct UserError(pub String);

impl UserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
