//! The output of compilation: an arena of [TargetObject]s plus the operators and loggers an
//! inference run needs.

mod logger;
mod object;
mod operator;

use alloc::{collections::BTreeSet, vec::Vec};
use core::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{
    logger::{Loggable, Logger, LoggerKind},
    object::{
        AlignmentObject, Input, Parameter, ParameterValues, Sequence, TargetKind, TargetObject,
        TreeObject,
    },
    operator::{Operator, OperatorClass, OperatorParam},
};
use crate::index::{EnumeratedIter, IndexVec, IndexedVecError};

crate::newtype_id!(
    /// Handle of a [TargetObject] in a [TargetGraph].
    TargetId
);

// TARGET GRAPH
// ================================================================================================

/// Owns every target object created during one compilation.
///
/// Objects are never removed. Retracting an object only unmaps it, so a stale handle still
/// resolves but is no longer reachable from the posterior.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetGraph {
    objects: IndexVec<TargetId, TargetObject>,
}

impl TargetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: TargetObject) -> Result<TargetId, IndexedVecError> {
        self.objects.push(object)
    }

    #[inline]
    pub fn get(&self, id: TargetId) -> Option<&TargetObject> {
        self.objects.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetObject> {
        self.objects.get_mut(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> EnumeratedIter<'_, TargetId, TargetObject> {
        self.objects.iter_enumerated()
    }

    /// The first object carrying identifier `id`.
    pub fn find(&self, id: &str) -> Option<TargetId> {
        self.iter().find(|(_, object)| object.id() == Some(id)).map(|(handle, _)| handle)
    }

    /// The objects reachable from `roots`, every object listed after everything it references.
    ///
    /// Each object appears once, in depth-first post-order over the roots as given.
    pub fn reachable_from(&self, roots: impl IntoIterator<Item = TargetId>) -> Vec<TargetId> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack: Vec<(TargetId, bool)> = Vec::new();
        for root in roots {
            stack.push((root, false));
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id);
                    continue;
                }
                if !seen.insert(id) {
                    continue;
                }
                let Some(object) = self.get(id) else {
                    continue;
                };
                stack.push((id, true));
                let children: Vec<TargetId> = object.references().collect();
                let unseen = children.into_iter().rev().filter(|c| !seen.contains(c));
                stack.extend(unseen.map(|c| (c, false)));
            }
        }
        order
    }
}

impl Index<TargetId> for TargetGraph {
    type Output = TargetObject;

    #[inline]
    fn index(&self, id: TargetId) -> &Self::Output {
        &self.objects[id]
    }
}
