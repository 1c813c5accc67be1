//! Runtime value representation.
//!
//! Every user-visible entity is an `Obj` living in the Context's arena and
//! addressed by `ObjId`. Inter-value edges are plain handles; reachability
//! alone keeps a slot alive.

use std::any::Any;
use std::rc::Rc;

use ahash::RandomState;
use indexmap::IndexMap;
use plume_core::{fast_hasher, HashKey, ObjId};

use crate::core::attrs::AttrTable;
use crate::{Context, OpResult};

/// Insertion-ordered map used wherever iteration order is observable.
pub type OrderedMap<K, V> = IndexMap<K, V, RandomState>;

pub fn ordered_map_new<K: std::hash::Hash + Eq, V>() -> OrderedMap<K, V> {
    IndexMap::with_hasher(fast_hasher())
}

pub fn ordered_map_with_capacity<K: std::hash::Hash + Eq, V>(cap: usize) -> OrderedMap<K, V> {
    IndexMap::with_capacity_and_hasher(cap, fast_hasher())
}

/// One mapping slot. The original key handle is kept so iteration can hand
/// back real values, not key snapshots.
#[derive(Clone, Copy, Debug)]
pub struct MapEntry {
    pub key: ObjId,
    pub value: ObjId,
}

pub type Mapping = OrderedMap<HashKey, MapEntry>;
pub type SetData = OrderedMap<HashKey, ObjId>;

/// Native callable. `argv` already includes the bound `self`, if any.
pub type NativeFn = fn(&mut Context, &[ObjId]) -> OpResult;

/// Finalizers run exactly once during sweep and must not allocate through
/// the Context. Failures are reported through the print sink.
pub type FinalizerFn = fn(&mut Context, ObjId, Option<Rc<dyn Any>>) -> Result<(), crate::Raised>;

#[derive(Clone)]
pub struct Finalizer {
    pub fptr: FinalizerFn,
    pub userdata: Option<Rc<dyn Any>>,
}

#[derive(Clone)]
pub enum FuncImpl {
    Native(NativeFn),
    Script(Rc<ScriptFn>),
}

/// Callable descriptor.
pub struct Function {
    pub imp: FuncImpl,
    /// Receiver installed by attribute lookup. Single-use bound view.
    pub self_obj: Option<ObjId>,
    pub is_method: bool,
    pub pretty_name: String,
    pub module: String,
    pub userdata: Option<Rc<dyn Any>>,
}

#[derive(Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<ObjId>,
}

/// Compiled-function descriptor. The body itself belongs to the executor;
/// the runtime only owns the parameter list and the captured environment.
pub struct ScriptFn {
    pub params: Vec<Param>,
    pub star_args: Option<String>,
    pub star_kwargs: Option<String>,
    pub captures: Vec<(String, ObjId)>,
    pub body: Rc<dyn ScriptBody>,
}

/// The executor's half of a compiled function: runs a body against the
/// locals the call machinery bound for it.
pub trait ScriptBody {
    fn run(&self, ctx: &mut Context, frame: &BoundFrame) -> OpResult;
}

/// Locals for one script-function invocation, fully bound per the argument
/// rules: declared parameters, then the `*args` tuple and `**kwargs` map if
/// declared, plus the function's captures.
pub struct BoundFrame {
    pub locals: Vec<(String, ObjId)>,
    pub captures: Vec<(String, ObjId)>,
}

impl BoundFrame {
    pub fn get(&self, name: &str) -> Option<ObjId> {
        self.locals
            .iter()
            .rev()
            .chain(self.captures.iter().rev())
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }
}

/// Class descriptor.
pub struct ClassDesc {
    pub name: String,
    pub module: String,
    pub bases: Vec<ObjId>,
    /// Template copied into each new instance's attribute table.
    pub instance_attrs: AttrTable,
    /// Constructor thunk. Invoked with the class available through
    /// `Context::ctor_class`.
    pub ctor: NativeFn,
}

pub struct UserdataCell {
    pub tag: String,
    pub data: Rc<dyn Any>,
}

pub enum Payload {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<ObjId>),
    List(Vec<ObjId>),
    Map(Mapping),
    Set(SetData),
    Func(Box<Function>),
    Class(Box<ClassDesc>),
    /// Instance of a user or prelude class; the payload is the class name.
    Instance(Rc<str>),
    Userdata(UserdataCell),
}

/// One arena slot.
pub struct Obj {
    pub payload: Payload,
    pub attrs: AttrTable,
    pub finalizer: Option<Finalizer>,
    /// Explicit strong edges added by host code via the link-reference API.
    pub links: Vec<ObjId>,
}

impl Obj {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            attrs: AttrTable::new(),
            finalizer: None,
            links: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        match &self.payload {
            Payload::None => "NoneType",
            Payload::Bool(_) => "bool",
            Payload::Int(_) => "int",
            Payload::Float(_) => "float",
            Payload::Str(_) => "str",
            Payload::Tuple(_) => "tuple",
            Payload::List(_) => "list",
            Payload::Map(_) => "dict",
            Payload::Set(_) => "set",
            Payload::Func(_) => "function",
            Payload::Class(_) => "class",
            Payload::Instance(name) => name,
            Payload::Userdata(u) => &u.tag,
        }
    }
}
