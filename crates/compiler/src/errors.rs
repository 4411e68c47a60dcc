use bayeslink_core::{IndexedVecError, ModelError, ValueKind};

use crate::config::ConfigError;

// COMPILE ERROR
// ================================================================================================

/// Every condition that aborts a compilation.
///
/// Recoverable conditions, such as a later extension bundle shadowing a converter, are logged
/// instead and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("no converter handles value {} of content type '{kind}'", display_name(id))]
    UnconvertibleValue { id: Option<Box<str>>, kind: ValueKind },
    #[error("no converter handles generator '{kind}' producing {}", display_name(output))]
    UnconvertibleGenerator { kind: Box<str>, output: Option<Box<str>> },
    #[error(
        "{} is state, but its target is a {shape}, which no sampler can move",
        display_name(id)
    )]
    UnexpectedStateShape { id: Option<Box<str>>, shape: &'static str },
    #[error("'{consumer}' depends on {}, which has no target object yet", display_name(dependency))]
    MissingDependency { consumer: Box<str>, dependency: Option<Box<str>> },
    #[error("generator '{generator}' has no parameter named '{param}'")]
    MissingParameter { generator: Box<str>, param: Box<str> },
    #[error("tree move strategy '{strategy}' produced no moves for tree {}", display_name(tree))]
    MoveSynthesisFailure { strategy: Box<str>, tree: Option<Box<str>> },
    #[error("cannot use {} as a {expected} parameter, its target is a {found}", display_name(id))]
    Coercion { id: Option<Box<str>>, expected: &'static str, found: &'static str },
    #[error("invalid run configuration: {0}")]
    InvalidRunConfig(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Graph(#[from] IndexedVecError),
}

fn display_name(id: &Option<Box<str>>) -> String {
    match id {
        Some(id) => format!("'{id}'"),
        None => "an anonymous value".to_string(),
    }
}

// REGISTRY ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(
        "bundle '{bundle}' registers tree move strategy '{second}', but '{first}' is already active"
    )]
    DuplicateTreeMoveStrategy { first: Box<str>, second: Box<str>, bundle: Box<str> },
    #[error("no extension bundle named '{0}' has been registered")]
    UnknownBundle(Box<str>),
}
