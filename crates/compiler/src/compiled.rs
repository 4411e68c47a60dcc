use bayeslink_core::{Logger, Operator, TargetGraph, TargetId, TargetObject};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ChainKind, Posterior, RunConfig};

// RUN METADATA
// ================================================================================================

/// The settings of the inference run, with every default resolved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunMetadata {
    pub chain_length: u64,
    pub log_every: u64,
    /// Samples the file logger writes over the whole chain.
    pub logged_samples: u64,
    pub pre_burnin: u64,
    pub sample_from_prior: bool,
    pub chain: ChainKind,
}

impl RunMetadata {
    /// Resolves `config` for a state of `state_dimension` scalar slots.
    pub fn new(config: &RunConfig, state_dimension: usize) -> Self {
        let pre_burnin = config
            .pre_burnin()
            .unwrap_or(state_dimension as u64 * RunConfig::PRE_BURNIN_PER_DIMENSION);
        Self {
            chain_length: config.chain_length(),
            log_every: config.log_every(),
            logged_samples: config.logged_samples(),
            pre_burnin,
            sample_from_prior: config.sample_from_prior(),
            chain: *config.chain(),
        }
    }
}

// COMPILED MODEL
// ================================================================================================

/// Everything a serializer needs to write one inference run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompiledModel {
    pub(crate) graph: TargetGraph,
    pub(crate) posterior: Posterior,
    pub(crate) state: Vec<TargetId>,
    pub(crate) operators: Vec<Operator>,
    pub(crate) loggers: Vec<Logger>,
    pub(crate) reachable: Vec<TargetId>,
    pub(crate) run: RunMetadata,
}

impl CompiledModel {
    /// Every object of the compilation, including retracted ones no root reaches.
    #[inline(always)]
    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    #[inline(always)]
    pub fn posterior(&self) -> &Posterior {
        &self.posterior
    }

    /// The objects the engine samples, in the order they were classified.
    #[inline]
    pub fn state(&self) -> &[TargetId] {
        &self.state
    }

    /// The moves, sorted by identifier.
    #[inline]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[inline]
    pub fn loggers(&self) -> &[Logger] {
        &self.loggers
    }

    /// The objects to serialize: everything the posterior, the state, the moves and the loggers
    /// reference, each listed after its own references.
    #[inline]
    pub fn reachable(&self) -> &[TargetId] {
        &self.reachable
    }

    #[inline(always)]
    pub fn run(&self) -> &RunMetadata {
        &self.run
    }

    /// The reachable object named `id`.
    pub fn find(&self, id: &str) -> Option<(TargetId, &TargetObject)> {
        self.reachable
            .iter()
            .map(|&target| (target, &self.graph[target]))
            .find(|(_, object)| object.id() == Some(id))
    }

    pub fn operator(&self, id: &str) -> Option<&Operator> {
        self.operators.iter().find(|op| op.id() == id)
    }

    /// The prior distributions, in conversion order.
    pub fn prior(&self) -> &[TargetId] {
        self.graph[self.posterior.prior].kind().elements()
    }

    /// The likelihood distributions, in conversion order.
    pub fn likelihood(&self) -> &[TargetId] {
        self.graph[self.posterior.likelihood].kind().elements()
    }
}
