//! Posterior & Move Synthesis: turns a complete target graph into a runnable model.
//!
//! Synthesis groups the converted distributions into prior and likelihood, creates the default
//! move of every state object, and lays out the loggers. Everything it produces is ordered
//! deterministically, so compiling the same model twice yields identical output.

mod loggers;
mod operators;
mod posterior;
mod tree;

pub use self::{
    loggers::{FILE_LOGGER_ID, SCREEN_LOGGER_ID},
    operators::{WEIGHT_EXPONENT, add_up_down_operator, operator_weight},
    posterior::{LIKELIHOOD_ID, POSTERIOR_ID, PRIOR_ID, Posterior},
    tree::DefaultTreeMoves,
};
use crate::{CompilationContext, CompileError, CompiledModel, RunConfig, RunMetadata};

pub(crate) fn synthesize(mut cx: CompilationContext<'_>) -> Result<CompiledModel, CompileError> {
    let posterior = posterior::build_posterior(&mut cx)?;
    let operators = operators::synthesize_moves(&cx)?;
    let loggers = loggers::synthesize_loggers(&cx, &posterior);

    let state: Vec<_> = cx.state().iter().map(|entry| entry.target).collect();
    let state_dimension: usize = state
        .iter()
        .map(|&target| {
            let object = &cx.graph()[target];
            object
                .as_tree()
                .map(|tree| tree.internal_node_count())
                .or_else(|| object.as_parameter().map(|p| p.dimension()))
                .unwrap_or(0)
        })
        .sum();
    let run = RunMetadata::new(cx.config(), state_dimension);
    log::info!(
        target: "synthesis",
        "chain length {}, pre-burn-in {}, logging every {} ({} samples)",
        run.chain_length,
        run.pre_burnin,
        run.log_every,
        run.logged_samples,
    );
    if run.logged_samples < RunConfig::NUM_SAMPLES / 2 {
        log::warn!(
            target: "synthesis",
            "only {} samples will be logged, the posterior may be poorly summarised",
            run.logged_samples,
        );
    }

    let graph = cx.into_graph();
    let roots = std::iter::once(posterior.posterior)
        .chain(state.iter().copied())
        .chain(
            operators
                .iter()
                .flat_map(|op| std::iter::once(op).chain(op.children()))
                .flat_map(|op| op.targets().iter().map(|input| input.target)),
        )
        .chain(loggers.iter().flat_map(|logger| logger.targets()));
    let reachable = graph.reachable_from(roots);

    Ok(CompiledModel {
        graph,
        posterior,
        state,
        operators,
        loggers,
        reachable,
        run,
    })
}
