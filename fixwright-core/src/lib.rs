//! Declarative test-fixture engine.
//!
//! Given a tree-shaped specification of a target operation's parameters,
//! the engine synthesizes a fully-populated, possibly-random object graph
//! conforming to each parameter's declared type, honoring every explicit
//! override in the specification — and, after the operation runs, walks the
//! same kind of specification tree against the produced result to assert
//! equality, containment, size and class constraints field by field.
//!
//! The class universe is explicit: callers register every type the engine
//! may touch in a [`ClassRegistry`], and generation works against those
//! descriptors through [`TypeExpr`] type expressions, including generic
//! parameters and wildcard bounds.

pub mod class;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod generator;
pub mod param;
pub mod types;
pub mod value;
pub mod verify;

pub use class::{
    ClassDef, ClassId, ClassKind, ClassRegistry, CtorDef, FieldDef, MethodDef, ScalarKind,
    StructDef,
};
pub use config::{
    DeepMerger, EmptyParamLoader, EngineConfig, MapParamLoader, ParamLoader, ParamMerger,
};
pub use context::{AssignmentMark, Context, MAX_DEPTH};
pub use convert::{DefaultValueConverter, ValueConverter};
pub use error::{GenerateError, GenerateErrorKind};
pub use generator::ObjectGenerator;
pub use param::{
    ParamNode, ATTR_CLASS, ATTR_DEFINITION, ATTR_REFERENCE, ATTR_SIZE, DYNAMIC_CLASS,
};
pub use types::{TypeExpr, TypeMap};
pub use value::{MapValue, ObjectValue, SeqKind, SeqValue, SyntheticValue, Value};
pub use verify::{ExecutionVerifier, VerificationResult};
