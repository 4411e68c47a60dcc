use alloc::{boxed::Box, vec::Vec};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::TargetId;

// TARGET OBJECT
// ================================================================================================

/// One node of the target engine's object graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetObject {
    id: Option<Box<str>>,
    kind: TargetKind,
    inputs: Vec<Input>,
}

/// A named reference from one target object to another.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Input {
    pub name: Box<str>,
    pub target: TargetId,
}

/// Constructors
impl TargetObject {
    pub fn new(kind: TargetKind) -> Self {
        Self { id: None, kind, inputs: Vec::new() }
    }

    pub fn with_id(mut self, id: impl Into<Box<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Like [Self::with_id], for identifiers that may be absent.
    pub fn with_optional_id(mut self, id: Option<impl Into<Box<str>>>) -> Self {
        self.id = id.map(Into::into);
        self
    }

    pub fn with_input(mut self, name: impl Into<Box<str>>, target: TargetId) -> Self {
        self.inputs.push(Input { name: name.into(), target });
        self
    }

    pub fn parameter(parameter: Parameter) -> Self {
        Self::new(TargetKind::Parameter(parameter))
    }

    pub fn distribution(class: impl Into<Box<str>>) -> Self {
        Self::new(TargetKind::Distribution { class: class.into() })
    }

    pub fn function(class: impl Into<Box<str>>) -> Self {
        Self::new(TargetKind::Function { class: class.into() })
    }
}

/// Accessors
impl TargetObject {
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<Box<str>>) {
        self.id = Some(id.into());
    }

    #[inline(always)]
    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    #[inline(always)]
    pub fn kind_mut(&mut self) -> &mut TargetKind {
        &mut self.kind
    }

    #[inline]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The first input named `name`.
    pub fn input(&self, name: &str) -> Option<TargetId> {
        self.inputs.iter().find(|input| input.name.as_ref() == name).map(|input| input.target)
    }

    pub fn add_input(&mut self, name: impl Into<Box<str>>, target: TargetId) {
        self.inputs.push(Input { name: name.into(), target });
    }

    #[inline]
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match &self.kind {
            TargetKind::Parameter(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_tree(&self) -> Option<&TreeObject> {
        match &self.kind {
            TargetKind::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Every object this one references: named inputs first, then structural members.
    pub fn references(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.inputs.iter().map(|input| input.target).chain(self.kind.members())
    }
}

impl fmt::Display for TargetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} '{}'", self.kind.name(), id),
            None => write!(f, "anonymous {}", self.kind.name()),
        }
    }
}

// TARGET KIND
// ================================================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TargetKind {
    /// A constant or sampled parameter vector.
    Parameter(Parameter),
    Tree(TreeObject),
    Alignment(AlignmentObject),
    /// A named leaf shared by trees and alignments.
    Taxon,
    /// A deterministic function of its inputs.
    Function { class: Box<str> },
    /// A density over its `x` input.
    Distribution { class: Box<str> },
    /// An element-wise concatenation of independently created objects.
    Concatenation(Vec<TargetId>),
    /// A plain vector of independently created objects.
    Vector(Vec<TargetId>),
    /// A view of one position of `parent`, which keeps the storage.
    Slice { parent: TargetId, index: usize },
    /// A grouping of distributions whose densities multiply.
    Compound(Vec<TargetId>),
}

impl TargetKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Parameter(_) => "parameter",
            Self::Tree(_) => "tree",
            Self::Alignment(_) => "alignment",
            Self::Taxon => "taxon",
            Self::Function { .. } => "function",
            Self::Distribution { .. } => "distribution",
            Self::Concatenation(_) => "concatenation",
            Self::Vector(_) => "vector",
            Self::Slice { .. } => "slice",
            Self::Compound(_) => "compound distribution",
        }
    }

    /// The class name for functions and distributions.
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Function { class } | Self::Distribution { class } => Some(class),
            _ => None,
        }
    }

    /// True for objects a sampler can move directly.
    #[inline]
    pub const fn is_state_capable(&self) -> bool {
        matches!(self, Self::Parameter(_) | Self::Tree(_))
    }

    /// True for containers of independently created objects.
    #[inline]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Concatenation(_) | Self::Vector(_))
    }

    /// Members of a container, in order.
    pub fn elements(&self) -> &[TargetId] {
        match self {
            Self::Concatenation(items) | Self::Vector(items) | Self::Compound(items) => items,
            _ => &[],
        }
    }

    /// Structural references that are not named inputs.
    pub fn members(&self) -> impl Iterator<Item = TargetId> + '_ {
        let empty: &[TargetId] = &[];
        let (items, parent) = match self {
            Self::Concatenation(items) | Self::Vector(items) | Self::Compound(items) => {
                (items.as_slice(), None)
            },
            Self::Slice { parent, .. } => (empty, Some(*parent)),
            Self::Tree(tree) => (tree.taxa.as_slice(), None),
            _ => (empty, None),
        };
        let sequences: &[Sequence] = match self {
            Self::Alignment(alignment) => alignment.sequences.as_slice(),
            _ => &[],
        };
        items
            .iter()
            .copied()
            .chain(parent)
            .chain(sequences.iter().map(|sequence| sequence.taxon))
    }
}

// PARAMETERS
// ================================================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParameterValues {
    Real(Vec<f64>),
    Integer(Vec<i64>),
    Boolean(Vec<bool>),
}

impl ParameterValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Real(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn element_type(&self) -> &'static str {
        match self {
            Self::Real(_) => "real",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
        }
    }

    /// The values widened to reals, `None` for booleans.
    pub fn to_real(&self) -> Option<Vec<f64>> {
        match self {
            Self::Real(v) => Some(v.clone()),
            Self::Integer(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Boolean(_) => None,
        }
    }

    /// The values rounded to the nearest integer, `None` for booleans.
    pub fn to_integer(&self) -> Option<Vec<i64>> {
        match self {
            Self::Real(v) => Some(v.iter().map(|&x| round_half_away(x)).collect()),
            Self::Integer(v) => Some(v.clone()),
            Self::Boolean(_) => None,
        }
    }

    /// Element `index` as a single-element value list.
    pub fn element(&self, index: usize) -> Option<ParameterValues> {
        match self {
            Self::Real(v) => v.get(index).map(|&x| Self::Real(vec![x])),
            Self::Integer(v) => v.get(index).map(|&x| Self::Integer(vec![x])),
            Self::Boolean(v) => v.get(index).map(|&x| Self::Boolean(vec![x])),
        }
    }
}

// `f64::round` lives in std, and this crate does not require it.
fn round_half_away(x: f64) -> i64 {
    let truncated = x as i64;
    let frac = x - truncated as f64;
    if frac >= 0.5 {
        truncated + 1
    } else if frac <= -0.5 {
        truncated - 1
    } else {
        truncated
    }
}

/// A parameter vector with optional bounds.
///
/// `estimate` is set once the parameter is classified as state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    pub values: ParameterValues,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Column count when the values are a flattened matrix.
    pub minor_dimension: Option<usize>,
    /// Per-element labels, e.g. state names of frequencies.
    pub keys: Vec<Box<str>>,
    pub estimate: bool,
}

impl Parameter {
    pub fn new(values: ParameterValues) -> Self {
        Self {
            values,
            lower: None,
            upper: None,
            minor_dimension: None,
            keys: Vec::new(),
            estimate: false,
        }
    }

    pub fn real(values: impl Into<Vec<f64>>) -> Self {
        Self::new(ParameterValues::Real(values.into()))
    }

    pub fn integer(values: impl Into<Vec<i64>>) -> Self {
        Self::new(ParameterValues::Integer(values.into()))
    }

    pub fn boolean(values: impl Into<Vec<bool>>) -> Self {
        Self::new(ParameterValues::Boolean(values.into()))
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_minor_dimension(mut self, columns: usize) -> Self {
        self.minor_dimension = Some(columns);
        self
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_real(&self) -> bool {
        matches!(self.values, ParameterValues::Real(_))
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self.values, ParameterValues::Integer(_))
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self.values, ParameterValues::Boolean(_))
    }
}

// TREES AND ALIGNMENTS
// ================================================================================================

/// A time tree whose leaves reference shared taxon objects.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeObject {
    pub taxa: Vec<TargetId>,
    pub root_height: f64,
    pub newick: Option<Box<str>>,
}

impl TreeObject {
    #[inline]
    pub fn internal_node_count(&self) -> usize {
        self.taxa.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentObject {
    /// The engine's data type name, after type mapping.
    pub data_type: Box<str>,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    pub taxon: TargetId,
    pub data: Box<str>,
}
