#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod index;
pub mod model;
pub mod symbols;
pub mod target;

pub use self::{
    index::{DenseIdMap, Idx, IndexVec, IndexedVecError},
    model::{
        AlignmentData, Domain, Generator, GeneratorCategory, GeneratorId, GeneratorSpec,
        GraphicalModel, ModelBuilder, ModelError, Namespace, SliceOrigin, TreeData, Value,
        ValueData, ValueId, ValueKind,
    },
    target::{
        AlignmentObject, Input, Loggable, Logger, LoggerKind, Operator, OperatorClass,
        OperatorParam, Parameter, ParameterValues, Sequence, TargetGraph, TargetId, TargetKind,
        TargetObject, TreeObject,
    },
};
