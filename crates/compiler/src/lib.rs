//! Compiles probabilistic graphical models into the object graph of a Bayesian inference engine.
//!
//! The pipeline is:
//! 1. Build a [Registry] once from the [ExtensionBundle]s of the model domains in use.
//! 2. Compile a [GraphicalModel](bayeslink_core::GraphicalModel) with a [Compiler]: values are
//!    materialised, generator converters restructure their outputs, then generators are wired.
//! 3. Synthesis groups the distributions into a posterior and adds default moves and loggers.
//!
//! The resulting [CompiledModel] is handed to a serializer, which is not part of this crate.
//!
//! Quick start:
//! ```ignore
//! use bayeslink_compiler::{Compiler, Registry, RunConfig};
//! use bayeslink_lib_phylo::PhyloBundle;
//!
//! let registry = Registry::builder().with_bundle(PhyloBundle).build()?;
//! let config = RunConfig::new(10_000_000)?.with_file_stem("primates");
//! let compiled = Compiler::new(&registry).with_config(config).compile(&model)?;
//! ```
//!
//! Module map (data flow):
//! - `registry`: converter tables, extension bundles and the tree move strategy override.
//! - `context`: the node to target mapping, state classification, retraction, slice views.
//! - `compiler`: the three conversion passes.
//! - `synthesis`: posterior, default moves and loggers.
//! - `compiled`: the compiled model and its run metadata.
//! - `config`: run settings.

// Conversion.
mod compiler;
mod context;
mod registry;

// Output.
mod compiled;
mod synthesis;

mod config;
mod errors;

#[cfg(test)]
mod tests;

pub use self::{
    compiled::{CompiledModel, RunMetadata},
    compiler::Compiler,
    config::{ChainKind, ConfigError, CoupledChains, RunConfig},
    context::{CompilationContext, ExtraLogger, SourceNode, StateEntry},
    errors::{CompileError, RegistryError},
    registry::{
        ExtensionBundle, GeneratorConverter, Registry, RegistryBuilder, TreeMoveStrategy,
        ValueConverter,
    },
    synthesis::{
        DefaultTreeMoves, FILE_LOGGER_ID, LIKELIHOOD_ID, POSTERIOR_ID, PRIOR_ID, Posterior,
        SCREEN_LOGGER_ID, WEIGHT_EXPONENT, add_up_down_operator, operator_weight,
    },
};

/// Logging setup for binaries and tests, reading filters from `BAYESLINK_LOG`.
#[cfg(feature = "logging")]
pub mod testing {
    /// Installs an `env_logger` for the process. Later calls are no-ops.
    pub fn init_logging() {
        let _ = env_logger::Builder::from_env("BAYESLINK_LOG").format_timestamp(None).try_init();
    }
}
