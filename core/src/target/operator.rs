use alloc::{boxed::Box, vec::Vec};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Input, TargetId};

/// The proposal an [Operator] makes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatorClass {
    Scale,
    RandomWalk,
    IntRandomWalk,
    DeltaExchange,
    BitFlip,
    TreeScale,
    RootAgeScale,
    Exchange { narrow: bool },
    NodeUniform,
    SubtreeSlide,
    WilsonBalding,
    UpDown,
    /// Wraps child operators and picks among them adaptively.
    AdaptiveSampler,
    /// An engine class contributed by an extension.
    Custom(Box<str>),
}

impl OperatorClass {
    /// True for moves that act on a tree input.
    pub const fn is_tree_move(&self) -> bool {
        matches!(
            self,
            Self::TreeScale
                | Self::RootAgeScale
                | Self::Exchange { .. }
                | Self::NodeUniform
                | Self::SubtreeSlide
                | Self::WilsonBalding
        )
    }
}

impl fmt::Display for OperatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scale => f.write_str("scale"),
            Self::RandomWalk => f.write_str("random walk"),
            Self::IntRandomWalk => f.write_str("integer random walk"),
            Self::DeltaExchange => f.write_str("delta exchange"),
            Self::BitFlip => f.write_str("bit flip"),
            Self::TreeScale => f.write_str("tree scale"),
            Self::RootAgeScale => f.write_str("root age scale"),
            Self::Exchange { narrow: true } => f.write_str("narrow exchange"),
            Self::Exchange { narrow: false } => f.write_str("wide exchange"),
            Self::NodeUniform => f.write_str("node uniform"),
            Self::SubtreeSlide => f.write_str("subtree slide"),
            Self::WilsonBalding => f.write_str("Wilson-Balding"),
            Self::UpDown => f.write_str("up-down"),
            Self::AdaptiveSampler => f.write_str("adaptive sampler"),
            Self::Custom(class) => f.write_str(class),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatorParam {
    Real(f64),
    Integer(i64),
    Boolean(bool),
}

impl From<f64> for OperatorParam {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for OperatorParam {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for OperatorParam {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// One inference move, wired to the state objects it proposes new values for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operator {
    id: Box<str>,
    class: OperatorClass,
    weight: f64,
    targets: Vec<Input>,
    params: Vec<(Box<str>, OperatorParam)>,
    children: Vec<Operator>,
}

impl Operator {
    pub fn new(id: impl Into<Box<str>>, class: OperatorClass, weight: f64) -> Self {
        Self {
            id: id.into(),
            class,
            weight,
            targets: Vec::new(),
            params: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_target(mut self, role: impl Into<Box<str>>, target: TargetId) -> Self {
        self.targets.push(Input { name: role.into(), target });
        self
    }

    pub fn with_param(
        mut self,
        name: impl Into<Box<str>>,
        value: impl Into<OperatorParam>,
    ) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Operator) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline(always)]
    pub fn class(&self) -> &OperatorClass {
        &self.class
    }

    #[inline(always)]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn targets(&self) -> &[Input] {
        &self.targets
    }

    pub fn target(&self, role: &str) -> Option<TargetId> {
        self.targets.iter().find(|t| t.name.as_ref() == role).map(|t| t.target)
    }

    /// The tree this operator moves, if any.
    #[inline]
    pub fn tree(&self) -> Option<TargetId> {
        self.target("tree")
    }

    pub fn param(&self, name: &str) -> Option<OperatorParam> {
        self.params.iter().find(|(n, _)| n.as_ref() == name).map(|(_, v)| *v)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, OperatorParam)> {
        self.params.iter().map(|(n, v)| (n.as_ref(), *v))
    }

    #[inline]
    pub fn children(&self) -> &[Operator] {
        &self.children
    }

    /// The operators that actually propose: the children of a sampler, otherwise itself.
    pub fn actual_moves(&self) -> &[Operator] {
        match self.class {
            OperatorClass::AdaptiveSampler => &self.children,
            _ => core::slice::from_ref(self),
        }
    }

    /// True when both operators make the same kind of tree move on the same tree.
    pub fn duplicates_tree_move(&self, other: &Operator) -> bool {
        self.class.is_tree_move()
            && self.class == other.class
            && self.tree().is_some()
            && self.tree() == other.tree()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, weight {:.3})", self.id, self.class, self.weight)
    }
}
