use alloc::{boxed::Box, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::TargetId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoggerKind {
    /// Progress printed to the terminal.
    Screen,
    /// Tab-separated samples of the logged items.
    File { file_name: Box<str> },
    /// Sampled trees of one tree state object.
    Tree { file_name: Box<str>, tree: TargetId },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Loggable {
    Target(TargetId),
    /// Summary statistics (height, length) of a tree.
    TreeStatistics(TargetId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Logger {
    pub id: Option<Box<str>>,
    pub kind: LoggerKind,
    pub log_every: u64,
    pub items: Vec<Loggable>,
}

impl Logger {
    pub fn file_name(&self) -> Option<&str> {
        match &self.kind {
            LoggerKind::Screen => None,
            LoggerKind::File { file_name } | LoggerKind::Tree { file_name, .. } => Some(file_name),
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.items.iter().map(|item| match item {
            Loggable::Target(id) | Loggable::TreeStatistics(id) => *id,
        })
    }
}
