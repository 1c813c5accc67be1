//! Embeddable dynamic-language runtime.
//!
//! The [`Context`] owns one interpreter instance: the value arena, the
//! tracing collector, per-module globals, the builtin classes, the
//! exception state, and the call-trace stack. Every user-visible entity is
//! a heap value addressed by [`ObjId`]; every operator dispatches through
//! attribute lookup of a fixed dunder name.
//!
//! Fallible operations return `Result<ObjId, Raised>`; `Err(Raised)` means
//! the Context's current exception is set.

pub mod core;

mod builtins;
mod builtins_registry;
mod calls;
mod context;
mod exceptions;
mod iter;
mod methods;
mod modules;
mod op_dispatch;
pub mod unwind;
mod util;

pub use crate::core::attrs::AttrTable;
pub use crate::core::value::{
    BoundFrame, Finalizer, FinalizerFn, FuncImpl, Function, NativeFn, Param, Payload, ScriptBody,
    ScriptFn,
};
pub use builtins_registry::{BuiltinProvider, BuiltinRegistry, StdBuiltinProvider};
pub use context::{Config, Context};
pub use exceptions::{ExcKind, OpResult, Raised, TraceFrame, UnitResult};
pub use modules::{Frontend, ModuleLoader};
pub use op_dispatch::{BinOp, UnOp};
pub use util::capabilities::{
    Capabilities, Clock, FileSystem, Lcg64, RngAlgorithm, StdFileSystem, SystemClock,
};

pub use plume_core::{HashKey, ObjId, SourcePos};
