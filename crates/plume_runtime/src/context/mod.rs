//! The Context: one interpreter instance.
//!
//! Owns the arena, the per-module globals, the builtin registry, the
//! exception state, the trace stack, and the in-flight kwargs stack. All
//! public operations go through `&mut Context`; Contexts share nothing, so
//! a host may own several on separate threads.

mod config;
mod gc;

pub use config::Config;

use std::any::Any;
use std::rc::Rc;

use plume_core::{fast_map_new, FastHashMap, HashKey, ObjId};

use crate::core::attrs::AttrTable;
use crate::core::heap::Heap;
use crate::core::value::{
    ordered_map_new, ClassDesc, Finalizer, FinalizerFn, FuncImpl, Function, Mapping, NativeFn, Obj,
    OrderedMap, Payload, ScriptFn, SetData, UserdataCell,
};
use crate::exceptions::{ExcKind, Raised, TraceFrame};
use crate::modules::{Frontend, ModuleLoader};
use crate::util::capabilities::{Capabilities, Clock, FileSystem, RngAlgorithm};
use crate::{OpResult, UnitResult};

/// What a running native function can reach through the Context: the
/// registration userdata of a plain function, or the class under
/// construction for a constructor thunk.
pub(crate) enum FnUserdata {
    None,
    Class(ObjId),
    Host(Rc<dyn Any>),
}

/// Handles the bootstrap wires up once at Context creation.
#[derive(Default)]
pub(crate) struct Builtins {
    pub object: Option<ObjId>,
    pub type_class: Option<ObjId>,
    pub none_class: Option<ObjId>,
    pub bool_class: Option<ObjId>,
    pub int_class: Option<ObjId>,
    pub float_class: Option<ObjId>,
    pub str_class: Option<ObjId>,
    pub tuple_class: Option<ObjId>,
    pub list_class: Option<ObjId>,
    pub dict_class: Option<ObjId>,
    pub set_class: Option<ObjId>,
    pub function_class: Option<ObjId>,
    pub module_class: Option<ObjId>,
    pub range_class: Option<ObjId>,
    pub range_iter_class: Option<ObjId>,
    pub seq_iter_class: Option<ObjId>,
    pub none: Option<ObjId>,
    pub true_: Option<ObjId>,
    pub false_: Option<ObjId>,
    pub isinstance: Option<ObjId>,
    pub exc: FastHashMap<ExcKind, ObjId>,
}

impl Builtins {
    pub fn new() -> Self {
        Self {
            exc: fast_map_new(),
            ..Default::default()
        }
    }

    /// Every handle owned by the registry, for the GC root set.
    pub fn all(&self) -> Vec<ObjId> {
        let fields = [
            self.object,
            self.type_class,
            self.none_class,
            self.bool_class,
            self.int_class,
            self.float_class,
            self.str_class,
            self.tuple_class,
            self.list_class,
            self.dict_class,
            self.set_class,
            self.function_class,
            self.module_class,
            self.range_class,
            self.range_iter_class,
            self.seq_iter_class,
            self.none,
            self.true_,
            self.false_,
            self.isinstance,
        ];
        let mut out: Vec<ObjId> = fields.into_iter().flatten().collect();
        out.extend(self.exc.values().copied());
        out
    }
}

pub struct Context {
    pub(crate) heap: Heap,
    pub(crate) config: Config,
    pub(crate) caps: Capabilities,
    pub(crate) builtins: Builtins,
    /// name -> value, per loaded module, in load order.
    pub(crate) globals: OrderedMap<String, OrderedMap<String, ObjId>>,
    pub(crate) module_loaders: FastHashMap<String, ModuleLoader>,
    /// Stack of module names; the top is the currently executing module.
    pub(crate) current_module: Vec<String>,
    pub(crate) import_path: String,
    pub(crate) frontend: Option<Box<dyn Frontend>>,

    pub(crate) current_exception: Option<ObjId>,
    pub(crate) exception_trace: Vec<TraceFrame>,
    pub(crate) current_trace: Vec<TraceFrame>,

    /// One entry per in-flight call; `None` until lazily materialized.
    pub(crate) kwargs_stack: Vec<Option<ObjId>>,
    pub(crate) userdata_stack: Vec<FnUserdata>,

    /// Counted pins held by native code across allocations.
    pub(crate) protected: FastHashMap<ObjId, usize>,
    pub(crate) argv: Option<ObjId>,

    pub(crate) gc_lock: bool,
    pub(crate) finalizing: bool,
    pub(crate) last_live_count: usize,
    pub(crate) raising_oom: bool,
    /// Exception construction in flight; relaxes the recursion guard so a
    /// RecursionError can itself be built at the depth limit.
    pub(crate) in_raise: bool,

    pub(crate) rng_state: u64,
    pub(crate) output: String,
    pub(crate) print_hook: Option<Box<dyn FnMut(&str)>>,
    pub(crate) error_hook: Option<Box<dyn FnMut(&str)>>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let config = config.normalized();
        let mut ctx = Self {
            heap: Heap::new(),
            // Bootstrap runs unrestricted; the host's limits apply after.
            config: Config::default(),
            caps: Capabilities::default(),
            builtins: Builtins::new(),
            globals: ordered_map_new(),
            module_loaders: fast_map_new(),
            current_module: vec!["__main__".to_string()],
            import_path: String::new(),
            frontend: None,
            current_exception: None,
            exception_trace: Vec::new(),
            current_trace: Vec::new(),
            kwargs_stack: Vec::new(),
            userdata_stack: Vec::new(),
            protected: fast_map_new(),
            argv: None,
            gc_lock: false,
            finalizing: false,
            last_live_count: 0,
            raising_oom: false,
            in_raise: false,
            rng_state: 0x9e3779b97f4a7c15,
            output: String::new(),
            print_hook: None,
            error_hook: None,
        };
        ctx.globals.insert("__main__".to_string(), ordered_map_new());

        crate::builtins::bootstrap(&mut ctx).expect("builtin bootstrap must succeed");

        ctx.register_module("math", crate::modules::math::load);
        ctx.register_module("random", crate::modules::random::load);
        ctx.register_module("time", crate::modules::time::load);
        ctx.register_module("sys", crate::modules::sys::load);
        if config.enable_os_access {
            ctx.register_module("os", crate::modules::os::load);
        }

        let mut items = Vec::with_capacity(config.argv.len());
        for arg in &config.argv {
            let s = ctx.new_str(arg).expect("argv allocation must succeed");
            ctx.protect(s);
            items.push(s);
        }
        let tuple = ctx.new_tuple(&items).expect("argv allocation must succeed");
        for s in items {
            ctx.unprotect(s);
        }
        ctx.argv = Some(tuple);

        // The allocation cap must at least cover what bootstrap created.
        let mut config = config;
        config.max_alloc = config.max_alloc.max(ctx.heap.live_count() + 64);
        ctx.config = config;
        ctx.last_live_count = ctx.heap.live_count();
        ctx
    }

    // ---- allocation --------------------------------------------------

    /// Allocate a raw value. Runs the collector first when the trigger
    /// policy or the allocation cap demands it.
    pub(crate) fn alloc(&mut self, payload: Payload) -> OpResult {
        self.maybe_collect();
        if self.heap.live_count() >= self.config.max_alloc && !self.raising_oom {
            self.collect_garbage();
            if self.heap.live_count() >= self.config.max_alloc {
                self.raising_oom = true;
                let raised = self.raise(ExcKind::MemoryError, "allocation limit reached");
                self.raising_oom = false;
                return Err(raised);
            }
        }
        debug_assert!(!self.finalizing, "finalizers must not allocate");
        Ok(self.heap.alloc(Obj::new(payload)))
    }

    /// Allocate a value whose attribute table parents `class`'s instance
    /// template, so its methods resolve.
    pub(crate) fn alloc_of_class(&mut self, payload: Payload, class: ObjId) -> OpResult {
        let id = self.alloc(payload)?;
        let template = match &self.heap.get(class).payload {
            Payload::Class(c) => c.instance_attrs.clone(),
            _ => unreachable!("alloc_of_class requires a class"),
        };
        self.heap.get_mut(id).attrs.add_parent(&template, false);
        Ok(id)
    }

    // ---- value construction ------------------------------------------

    pub fn none(&self) -> ObjId {
        self.builtins.none.expect("context not bootstrapped")
    }

    /// Bools are canonicalized to the two singletons.
    pub fn new_bool(&self, value: bool) -> ObjId {
        if value {
            self.builtins.true_.expect("context not bootstrapped")
        } else {
            self.builtins.false_.expect("context not bootstrapped")
        }
    }

    pub fn new_int(&mut self, value: i64) -> OpResult {
        let class = self.int_class();
        self.alloc_of_class(Payload::Int(value), class)
    }

    pub fn new_float(&mut self, value: f64) -> OpResult {
        let class = self.float_class();
        self.alloc_of_class(Payload::Float(value), class)
    }

    pub fn new_str(&mut self, value: &str) -> OpResult {
        let class = self.str_class();
        self.alloc_of_class(Payload::Str(value.to_string()), class)
    }

    pub fn new_tuple(&mut self, items: &[ObjId]) -> OpResult {
        let class = self.tuple_class();
        self.alloc_of_class(Payload::Tuple(items.to_vec()), class)
    }

    pub fn new_list(&mut self, items: &[ObjId]) -> OpResult {
        let class = self.list_class();
        self.alloc_of_class(Payload::List(items.to_vec()), class)
    }

    pub fn new_map(&mut self) -> OpResult {
        let class = self.dict_class();
        self.alloc_of_class(Payload::Map(ordered_map_new()), class)
    }

    pub fn new_set(&mut self) -> OpResult {
        let class = self.set_class();
        self.alloc_of_class(Payload::Set(ordered_map_new()), class)
    }

    pub fn new_function(&mut self, pretty_name: &str, f: NativeFn) -> OpResult {
        self.new_function_full(pretty_name, f, false, None)
    }

    pub fn new_function_with_userdata(
        &mut self,
        pretty_name: &str,
        f: NativeFn,
        userdata: Rc<dyn Any>,
    ) -> OpResult {
        self.new_function_full(pretty_name, f, false, Some(userdata))
    }

    pub(crate) fn new_function_full(
        &mut self,
        pretty_name: &str,
        f: NativeFn,
        is_method: bool,
        userdata: Option<Rc<dyn Any>>,
    ) -> OpResult {
        let class = self.function_class();
        let module = self.current_module_name().to_string();
        self.alloc_of_class(
            Payload::Func(Box::new(Function {
                imp: FuncImpl::Native(f),
                self_obj: None,
                is_method,
                pretty_name: pretty_name.to_string(),
                module,
                userdata,
            })),
            class,
        )
    }

    /// A compiled function handed over by the frontend.
    pub fn new_script_function(&mut self, pretty_name: &str, script: Rc<ScriptFn>) -> OpResult {
        let class = self.function_class();
        let module = self.current_module_name().to_string();
        self.alloc_of_class(
            Payload::Func(Box::new(Function {
                imp: FuncImpl::Script(script),
                self_obj: None,
                is_method: false,
                pretty_name: pretty_name.to_string(),
                module,
                userdata: None,
            })),
            class,
        )
    }

    pub fn new_userdata(&mut self, tag: &str, data: Rc<dyn Any>) -> OpResult {
        let object = self.object_class();
        self.alloc_of_class(
            Payload::Userdata(UserdataCell {
                tag: tag.to_string(),
                data,
            }),
            object,
        )
    }

    // ---- interrogation -----------------------------------------------

    pub fn is_none(&self, v: ObjId) -> bool {
        Some(v) == self.builtins.none
    }

    pub fn is_bool(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Bool(_))
    }

    pub fn is_int(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Int(_))
    }

    pub fn is_float(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Float(_))
    }

    pub fn is_int_or_float(&self, v: ObjId) -> bool {
        matches!(
            self.heap.get(v).payload,
            Payload::Int(_) | Payload::Float(_)
        )
    }

    pub fn is_str(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Str(_))
    }

    pub fn is_tuple(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Tuple(_))
    }

    pub fn is_list(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::List(_))
    }

    pub fn is_map(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Map(_))
    }

    pub fn is_set(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Set(_))
    }

    pub fn is_class(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Class(_))
    }

    pub fn is_function(&self, v: ObjId) -> bool {
        matches!(self.heap.get(v).payload, Payload::Func(_))
    }

    pub fn get_bool(&self, v: ObjId) -> Option<bool> {
        match self.heap.get(v).payload {
            Payload::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_int(&self, v: ObjId) -> Option<i64> {
        match self.heap.get(v).payload {
            Payload::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Ints widen; use `get_int` if the distinction matters.
    pub fn get_float(&self, v: ObjId) -> Option<f64> {
        match self.heap.get(v).payload {
            Payload::Int(i) => Some(i as f64),
            Payload::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn get_str(&self, v: ObjId) -> Option<&str> {
        match &self.heap.get(v).payload {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_get_userdata(&self, v: ObjId, tag: &str) -> Option<Rc<dyn Any>> {
        match &self.heap.get(v).payload {
            Payload::Userdata(u) if u.tag == tag => Some(u.data.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self, v: ObjId) -> &str {
        self.heap.get(v).type_name()
    }

    // ---- attributes --------------------------------------------------

    /// Attribute lookup without raising; a resolved method gets its `self`
    /// bound to `obj` before return.
    pub fn has_attribute(&mut self, obj: ObjId, name: &str) -> Option<ObjId> {
        let found = self.heap.get(obj).attrs.get(name)?;
        self.bind_if_method(found, obj);
        Some(found)
    }

    /// Attribute lookup; raises AttributeError on a miss.
    pub fn get_attribute(&mut self, obj: ObjId, name: &str) -> OpResult {
        match self.has_attribute(obj, name) {
            Some(v) => Ok(v),
            None => Err(self.raise_attribute_error(obj, name)),
        }
    }

    /// Writes always go to the receiver's local map.
    pub fn set_attribute(&mut self, obj: ObjId, name: &str, value: ObjId) {
        self.heap.get_mut(obj).attrs.set(name, value);
    }

    /// Lookup skipping `obj`'s own table. With `base` given, search that
    /// class's instance template instead of the parent chain.
    pub fn get_attribute_from_base(
        &mut self,
        obj: ObjId,
        name: &str,
        base: Option<ObjId>,
    ) -> Option<ObjId> {
        let found = match base {
            None => self.heap.get(obj).attrs.get_from_base(name),
            Some(base) => match &self.heap.get(base).payload {
                Payload::Class(c) => c.instance_attrs.get(name),
                _ => None,
            },
        }?;
        self.bind_if_method(found, obj);
        Some(found)
    }

    pub(crate) fn bind_if_method(&mut self, found: ObjId, receiver: ObjId) {
        if let Payload::Func(f) = &mut self.heap.get_mut(found).payload {
            if f.is_method {
                f.self_obj = Some(receiver);
            }
        }
    }

    // ---- class machinery ---------------------------------------------

    /// Add an attribute to a class's instance template, visible to existing
    /// and future instances through the parent chain.
    pub fn add_attribute_to_class(&mut self, class: ObjId, name: &str, value: ObjId) {
        if let Payload::Class(c) = &self.heap.get(class).payload {
            c.instance_attrs.set(name, value);
        }
    }

    /// Install a native method on a class's instance template.
    pub fn bind_method(&mut self, class: ObjId, name: &str, f: NativeFn) -> OpResult {
        let class_name = match &self.heap.get(class).payload {
            Payload::Class(c) => c.name.clone(),
            _ => unreachable!("bind_method requires a class"),
        };
        let pretty = format!("{class_name}.{name}");
        let method = self.new_function_full(&pretty, f, true, None)?;
        self.add_attribute_to_class(class, name, method);
        Ok(method)
    }

    /// The class a value belongs to.
    pub fn class_of(&self, v: ObjId) -> Option<ObjId> {
        match &self.heap.get(v).payload {
            Payload::None => self.builtins.none_class,
            Payload::Bool(_) => self.builtins.bool_class,
            Payload::Int(_) => self.builtins.int_class,
            Payload::Float(_) => self.builtins.float_class,
            Payload::Str(_) => self.builtins.str_class,
            Payload::Tuple(_) => self.builtins.tuple_class,
            Payload::List(_) => self.builtins.list_class,
            Payload::Map(_) => self.builtins.dict_class,
            Payload::Set(_) => self.builtins.set_class,
            Payload::Func(_) => self.builtins.function_class,
            Payload::Class(_) => self.builtins.type_class,
            Payload::Instance(_) => self.heap.get(v).attrs.get("__class__"),
            Payload::Userdata(_) => self.builtins.object,
        }
    }

    /// Breadth-first search of `obj`'s class and its bases for any of
    /// `classes`; returns the matched class.
    pub fn is_instance(&self, obj: ObjId, classes: &[ObjId]) -> Option<ObjId> {
        let mut queue: Vec<ObjId> = match self.class_of(obj) {
            Some(c) => vec![c],
            None => return None,
        };
        let mut seen: Vec<ObjId> = Vec::new();
        while let Some(class) = queue.pop() {
            if seen.contains(&class) {
                continue;
            }
            seen.push(class);
            if classes.contains(&class) {
                return Some(class);
            }
            if let Payload::Class(c) = &self.heap.get(class).payload {
                queue.extend_from_slice(&c.bases);
            }
        }
        None
    }

    // ---- globals -----------------------------------------------------

    pub(crate) fn current_module_name(&self) -> &str {
        self.current_module.last().expect("module stack is never empty")
    }

    /// Read a global of the currently executing module.
    pub fn get_global(&self, name: &str) -> Option<ObjId> {
        self.globals
            .get(self.current_module_name())
            .and_then(|g| g.get(name).copied())
    }

    /// Bind a global of the currently executing module.
    pub fn set_global(&mut self, name: &str, value: ObjId) {
        let module = self.current_module_name().to_string();
        self.globals
            .entry(module)
            .or_insert_with(ordered_map_new)
            .insert(name.to_string(), value);
    }

    // ---- GC-facing host API -------------------------------------------

    /// Pin a value across allocations. Counted: protect twice, unprotect
    /// twice.
    pub fn protect(&mut self, v: ObjId) {
        *self.protected.entry(v).or_insert(0) += 1;
    }

    pub fn unprotect(&mut self, v: ObjId) {
        match self.protected.get_mut(&v) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                self.protected.remove(&v);
            }
            None => debug_assert!(false, "unprotect without matching protect"),
        }
    }

    /// Scoped protection: the values stay pinned for the duration of `f`.
    pub fn with_protected<T>(
        &mut self,
        vals: &[ObjId],
        f: impl FnOnce(&mut Context) -> T,
    ) -> T {
        for &v in vals {
            self.protect(v);
        }
        let out = f(self);
        for &v in vals {
            self.unprotect(v);
        }
        out
    }

    /// Add an explicit strong edge so `child` stays alive as long as
    /// `parent` does.
    pub fn link_reference(&mut self, parent: ObjId, child: ObjId) {
        self.heap.get_mut(parent).links.push(child);
    }

    pub fn unlink_reference(&mut self, parent: ObjId, child: ObjId) {
        let links = &mut self.heap.get_mut(parent).links;
        if let Some(pos) = links.iter().position(|&c| c == child) {
            links.remove(pos);
        }
    }

    pub fn set_finalizer(&mut self, v: ObjId, fptr: FinalizerFn, userdata: Option<Rc<dyn Any>>) {
        self.heap.get_mut(v).finalizer = Some(Finalizer { fptr, userdata });
    }

    // ---- call-adjacent state ------------------------------------------

    /// The kwargs Map of the innermost call, materialized on first use.
    /// During bootstrap, while the dict class does not exist yet, callers
    /// must tolerate the absence and not ask.
    pub fn kwargs(&mut self) -> OpResult {
        debug_assert!(!self.kwargs_stack.is_empty(), "kwargs outside of a call");
        if let Some(Some(kw)) = self.kwargs_stack.last() {
            return Ok(*kw);
        }
        let kw = self.new_map()?;
        if let Some(slot) = self.kwargs_stack.last_mut() {
            *slot = Some(kw);
        }
        Ok(kw)
    }

    /// Registration userdata of the innermost native function, if any.
    pub fn function_userdata(&self) -> Option<Rc<dyn Any>> {
        match self.userdata_stack.last() {
            Some(FnUserdata::Host(ud)) => Some(ud.clone()),
            _ => None,
        }
    }

    /// The class whose constructor thunk is currently running.
    pub(crate) fn ctor_class(&self) -> Option<ObjId> {
        match self.userdata_stack.last() {
            Some(FnUserdata::Class(c)) => Some(*c),
            _ => None,
        }
    }

    // ---- host plumbing -------------------------------------------------

    /// Send text to the print sink. Without a hook installed, output
    /// accumulates and is drained with `take_output`.
    pub fn emit(&mut self, text: &str) {
        if let Some(hook) = self.print_hook.as_mut() {
            hook(text);
        } else {
            self.output.push_str(text);
        }
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn set_print_hook(&mut self, hook: Box<dyn FnMut(&str)>) {
        self.print_hook = Some(hook);
    }

    /// Diagnostic tap: called with `Kind: message` every time an exception
    /// object is installed.
    pub fn set_error_hook(&mut self, hook: Box<dyn FnMut(&str)>) {
        self.error_hook = Some(hook);
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.caps.clock = clock;
    }

    pub fn set_file_system(&mut self, fs: Box<dyn FileSystem>) {
        self.caps.fs = fs;
    }

    pub fn set_rng_algorithm(&mut self, rng: Box<dyn RngAlgorithm>) {
        self.caps.rng = rng;
    }

    pub fn set_rng_seed(&mut self, seed: u64) {
        self.rng_state = seed;
    }

    pub fn set_frontend(&mut self, frontend: Box<dyn Frontend>) {
        self.frontend = Some(frontend);
    }

    pub(crate) fn rng_next_u64(&mut self) -> u64 {
        self.caps.rng.next_u64(&mut self.rng_state)
    }

    /// Update the source position of the innermost trace frame. Called by
    /// the executor as it advances through compiled code.
    pub fn update_trace_position(&mut self, pos: plume_core::SourcePos, line_text: &str) {
        if let Some(frame) = self.current_trace.last_mut() {
            frame.pos = pos;
            frame.line_text = line_text.to_string();
        }
    }

    pub fn call_depth(&self) -> usize {
        self.current_trace.len()
    }

    // ---- internal accessors -------------------------------------------

    pub(crate) fn object_class(&self) -> ObjId {
        self.builtins.object.expect("context not bootstrapped")
    }

    pub(crate) fn int_class(&self) -> ObjId {
        self.builtins.int_class.expect("context not bootstrapped")
    }

    pub(crate) fn float_class(&self) -> ObjId {
        self.builtins.float_class.expect("context not bootstrapped")
    }

    pub(crate) fn str_class(&self) -> ObjId {
        self.builtins.str_class.expect("context not bootstrapped")
    }

    pub(crate) fn tuple_class(&self) -> ObjId {
        self.builtins.tuple_class.expect("context not bootstrapped")
    }

    pub(crate) fn list_class(&self) -> ObjId {
        self.builtins.list_class.expect("context not bootstrapped")
    }

    pub(crate) fn dict_class(&self) -> ObjId {
        self.builtins.dict_class.expect("context not bootstrapped")
    }

    pub(crate) fn set_class(&self) -> ObjId {
        self.builtins.set_class.expect("context not bootstrapped")
    }

    pub(crate) fn function_class(&self) -> ObjId {
        self.builtins.function_class.expect("context not bootstrapped")
    }

    pub fn exc_class(&self, kind: ExcKind) -> ObjId {
        *self
            .builtins
            .exc
            .get(&kind)
            .expect("context not bootstrapped")
    }

    // ---- payload helpers for the method layer -------------------------

    pub(crate) fn payload_mut(&mut self, v: ObjId) -> &mut Payload {
        &mut self.heap.get_mut(v).payload
    }

    /// Snapshot a hashable value into a mapping key; TypeError for anything
    /// mutable.
    pub(crate) fn hash_key(&mut self, v: ObjId) -> Result<HashKey, Raised> {
        enum Snap {
            Done(HashKey),
            Tuple(Vec<ObjId>),
            Unhashable(String),
        }
        let snap = match &self.heap.get(v).payload {
            Payload::None => Snap::Done(HashKey::None),
            Payload::Bool(b) => Snap::Done(HashKey::Bool(*b)),
            Payload::Int(i) => Snap::Done(HashKey::Int(*i)),
            Payload::Float(f) => Snap::Done(HashKey::from_float(*f)),
            Payload::Str(s) => Snap::Done(HashKey::from_str(s)),
            Payload::Tuple(items) => Snap::Tuple(items.clone()),
            other => Snap::Unhashable(match other {
                Payload::Instance(name) => name.to_string(),
                Payload::Userdata(u) => u.tag.clone(),
                Payload::List(_) => "list".to_string(),
                Payload::Map(_) => "dict".to_string(),
                Payload::Set(_) => "set".to_string(),
                Payload::Func(_) => "function".to_string(),
                _ => "class".to_string(),
            }),
        };
        match snap {
            Snap::Done(key) => Ok(key),
            Snap::Tuple(items) => {
                let mut keys = Vec::with_capacity(items.len());
                for item in items {
                    keys.push(self.hash_key(item)?);
                }
                Ok(HashKey::Tuple(keys.into()))
            }
            Snap::Unhashable(ty) => {
                Err(self.raise(ExcKind::TypeError, &format!("unhashable type: '{ty}'")))
            }
        }
    }

    /// Guard a container growing to `len` elements.
    pub(crate) fn check_collection_size(&mut self, len: usize) -> UnitResult {
        if len > self.config.max_collection_size {
            return Err(self.raise(ExcKind::MemoryError, "collection size limit exceeded"));
        }
        Ok(())
    }

    pub(crate) fn map_ref(&self, v: ObjId) -> Option<&Mapping> {
        match &self.heap.get(v).payload {
            Payload::Map(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn set_ref(&self, v: ObjId) -> Option<&SetData> {
        match &self.heap.get(v).payload {
            Payload::Set(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn class_ref(&self, v: ObjId) -> Option<&ClassDesc> {
        match &self.heap.get(v).payload {
            Payload::Class(c) => Some(c),
            _ => None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
