use bayeslink_core::{Namespace, TargetId, TargetKind, ValueId};

use super::CompilationContext;
use crate::CompileError;

/// One object the inference engine samples.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub target: TargetId,
    /// The random value that made the object state, `None` for objects converters added
    /// directly without one.
    pub origin: Option<ValueId>,
}

// STATE CLASSIFICATION
// ================================================================================================

impl CompilationContext<'_> {
    /// True for a value whose content is fixed to data: by the model, or by the run config.
    pub fn is_observed(&self, value: ValueId) -> bool {
        if self.model.is_observed(value) {
            return true;
        }
        let value = self.model.value(value);
        value.namespace() == Namespace::Model
            && value.id().is_some_and(|id| self.config.is_observed(id))
    }

    /// True once `value` was classified as observed rather than state.
    pub fn is_recorded_observed(&self, value: ValueId) -> bool {
        self.observed.contains(&value)
    }

    pub fn observed_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.observed.iter().copied()
    }

    #[inline]
    pub fn is_state(&self, target: TargetId) -> bool {
        self.state_set.contains(&target)
    }

    /// The state in the order it was classified.
    pub fn state(&self) -> &[StateEntry] {
        &self.state
    }

    /// True when `target` was added to the state with its moves left to the caller.
    pub fn skips_moves(&self, target: TargetId) -> bool {
        self.skip_moves.contains(&target)
    }

    /// Decides whether the value just recorded against `target` contributes state.
    ///
    /// Only random values qualify. An observed random value is recorded as observed instead.
    pub(super) fn classify_state(
        &mut self,
        value: ValueId,
        target: TargetId,
    ) -> Result<(), CompileError> {
        if !self.model.value(value).is_random() {
            return Ok(());
        }
        if self.is_observed(value) {
            if self.observed.insert(value) {
                log::debug!(
                    target: "context",
                    "{} is observed, not sampled",
                    self.describe(value),
                );
            }
            return Ok(());
        }
        self.add_state_shape(value, target)
    }

    /// Adds the primitives behind `target` to the state.
    fn add_state_shape(&mut self, value: ValueId, target: TargetId) -> Result<(), CompileError> {
        match self.graph[target].kind() {
            TargetKind::Parameter(_) | TargetKind::Tree(_) => {
                self.insert_state(target, Some(value));
                Ok(())
            },
            TargetKind::Concatenation(items) | TargetKind::Vector(items) => {
                let items = items.clone();
                for item in items {
                    if self.graph[item].kind().is_state_capable() {
                        self.insert_state(item, Some(value));
                    } else {
                        log::debug!(
                            target: "context",
                            "element {} of {} is not sampled",
                            self.graph[item],
                            self.describe(value),
                        );
                    }
                }
                Ok(())
            },
            TargetKind::Slice { parent, .. } => {
                let parent = *parent;
                if self.graph[parent].kind().is_state_capable() {
                    self.insert_state(parent, Some(value));
                    Ok(())
                } else {
                    Err(CompileError::UnexpectedStateShape {
                        id: self.model.value(value).id().map(Into::into),
                        shape: "slice of a non-parameter",
                    })
                }
            },
            // Simulated alignments are regenerated by their likelihood, never moved.
            TargetKind::Alignment(_) => Ok(()),
            other => Err(CompileError::UnexpectedStateShape {
                id: self.model.value(value).id().map(Into::into),
                shape: other.name(),
            }),
        }
    }

    pub(super) fn insert_state(&mut self, target: TargetId, origin: Option<ValueId>) {
        if !self.state_set.insert(target) {
            return;
        }
        if let Some(object) = self.graph.get_mut(target)
            && let TargetKind::Parameter(parameter) = object.kind_mut()
        {
            parameter.estimate = true;
        }
        log::debug!(target: "context", "{} is state", self.graph[target]);
        self.state.push(StateEntry { target, origin });
    }
}
