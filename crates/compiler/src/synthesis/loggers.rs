use bayeslink_core::{Loggable, Logger, LoggerKind, TargetId};
use itertools::Itertools;

use super::Posterior;
use crate::{CompilationContext, RunConfig};

pub const SCREEN_LOGGER_ID: &str = "ScreenLogger";
pub const FILE_LOGGER_ID: &str = "Logger";

/// The screen logger, the file logger, one tree logger per sampled tree, then the extra loggers
/// converters asked for.
pub(crate) fn synthesize_loggers(
    cx: &CompilationContext<'_>,
    posterior: &Posterior,
) -> Vec<Logger> {
    let config = cx.config();
    let graph = cx.graph();
    let stem = config.file_stem();
    let log_every = config.log_every();

    let (trees, parameters): (Vec<TargetId>, Vec<TargetId>) = cx
        .state()
        .iter()
        .map(|entry| entry.target)
        .partition(|&target| graph[target].as_tree().is_some());
    let trees: Vec<(String, TargetId)> = trees
        .into_iter()
        .map(|tree| {
            let id = graph[tree].id().map(str::to_string).unwrap_or_else(|| tree.to_string());
            (id, tree)
        })
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect();

    let densities = [posterior.posterior, posterior.likelihood, posterior.prior]
        .into_iter()
        .map(Loggable::Target);

    let mut loggers = Vec::with_capacity(2 + trees.len() + cx.extra_loggers().len());
    loggers.push(Logger {
        id: Some(SCREEN_LOGGER_ID.into()),
        kind: LoggerKind::Screen,
        log_every: log_every * RunConfig::SCREEN_LOG_FACTOR,
        items: densities.clone().chain(parameters.iter().copied().map(Loggable::Target)).collect(),
    });

    let logged_parameters = parameters.iter().copied().filter(|&target| {
        let logged = graph[target].id().is_none_or(|id| config.is_logged(id));
        if !logged {
            log::debug!(target: "synthesis", "{} is not logged", graph[target]);
        }
        logged
    });
    loggers.push(Logger {
        id: Some(FILE_LOGGER_ID.into()),
        kind: LoggerKind::File { file_name: format!("{stem}.log").into() },
        log_every,
        items: densities
            .chain(logged_parameters.map(Loggable::Target))
            .chain(trees.iter().map(|&(_, tree)| Loggable::TreeStatistics(tree)))
            .chain(cx.extra_loggables().iter().copied().map(Loggable::Target))
            .unique()
            .collect(),
    });

    let several_trees = trees.len() > 1;
    for (id, tree) in &trees {
        let file_name = if several_trees {
            format!("{stem}.{id}.trees")
        } else {
            format!("{stem}.trees")
        };
        loggers.push(Logger {
            id: Some(format!("{id}.treeLogger").into()),
            kind: LoggerKind::Tree { file_name: file_name.into(), tree: *tree },
            log_every,
            items: vec![Loggable::Target(*tree)],
        });
    }

    for extra in cx.extra_loggers() {
        loggers.push(Logger {
            id: Some(format!("{}.logger", extra.suffix).into()),
            kind: LoggerKind::File { file_name: format!("{stem}.{}.log", extra.suffix).into() },
            log_every,
            items: extra.items.clone(),
        });
    }
    loggers
}
