//! Builtin class bootstrap and class machinery.
//!
//! Classes come up in a fixed order so the cyclic dependencies resolve:
//! raw class objects first, then `object` wired as the universal ancestor,
//! then subclassing, methods, singletons, and finally the prelude layer
//! (exception hierarchy, `range`, the generic sequence iterator,
//! `isinstance`) registered into the `__builtins__` module and star-imported
//! into `__main__`.

pub(crate) mod functions;

use std::rc::Rc;

use plume_core::ObjId;

use crate::builtins_registry::{BuiltinProvider, BuiltinRegistry, StdBuiltinProvider};
use crate::core::attrs::AttrTable;
use crate::core::value::{ClassDesc, Payload};
use crate::exceptions::ExcKind;
use crate::methods;
use crate::methods::common::{arg_int, expect_argc, expect_argc_range};
use crate::{Context, OpResult, Raised, UnitResult};

pub(crate) fn bootstrap(ctx: &mut Context) -> UnitResult {
    // No collection until every class is reachable from the registry.
    ctx.gc_lock = true;
    let result = bootstrap_inner(ctx);
    ctx.gc_lock = false;
    result
}

fn bootstrap_inner(ctx: &mut Context) -> UnitResult {
    let object = raw_class(ctx, "object", default_construct)?;
    ctx.builtins.object = Some(object);
    let type_class = raw_class(ctx, "type", type_construct)?;
    ctx.builtins.type_class = Some(type_class);
    let none_class = raw_class(ctx, "NoneType", none_construct)?;
    ctx.builtins.none_class = Some(none_class);
    let bool_class = raw_class(ctx, "bool", bool_construct)?;
    ctx.builtins.bool_class = Some(bool_class);
    let int_class = raw_class(ctx, "int", int_construct)?;
    ctx.builtins.int_class = Some(int_class);
    let float_class = raw_class(ctx, "float", float_construct)?;
    ctx.builtins.float_class = Some(float_class);
    let str_class = raw_class(ctx, "str", str_construct)?;
    ctx.builtins.str_class = Some(str_class);
    let tuple_class = raw_class(ctx, "tuple", tuple_construct)?;
    ctx.builtins.tuple_class = Some(tuple_class);
    let list_class = raw_class(ctx, "list", list_construct)?;
    ctx.builtins.list_class = Some(list_class);
    let dict_class = raw_class(ctx, "dict", dict_construct)?;
    ctx.builtins.dict_class = Some(dict_class);
    let set_class = raw_class(ctx, "set", set_construct)?;
    ctx.builtins.set_class = Some(set_class);
    let function_class = raw_class(ctx, "function", function_construct)?;
    ctx.builtins.function_class = Some(function_class);
    let module_class = raw_class(ctx, "module", default_construct)?;
    ctx.builtins.module_class = Some(module_class);

    // object is its own ancestor: the class object inherits the instance
    // methods, and every other table chains to its template.
    let object_template = template_of(ctx, object);
    ctx.heap.get(object).attrs.add_parent(&object_template, false);
    let empty_bases = ctx.new_tuple(&[])?;
    ctx.set_attribute(object, "__bases__", empty_bases);

    let subclasses = [
        type_class,
        none_class,
        bool_class,
        int_class,
        float_class,
        str_class,
        tuple_class,
        list_class,
        dict_class,
        set_class,
        function_class,
        module_class,
    ];
    let bases_tuple = ctx.new_tuple(&[object])?;
    for class in subclasses {
        let template = template_of(ctx, class);
        template.add_parent(&object_template, false);
        ctx.heap.get(class).attrs.add_parent(&object_template, false);
        ctx.set_attribute(class, "__bases__", bases_tuple);
        if let Payload::Class(c) = ctx.payload_mut(class) {
            c.bases = vec![object];
        }
    }

    ctx.current_module.push("__builtins__".to_string());

    for class in std::iter::once(object).chain(subclasses) {
        let f = ctx.new_function_full("__str__", class_str, true, None)?;
        ctx.set_attribute(class, "__str__", f);
    }

    ctx.builtins.none = Some(ctx.alloc_of_class(Payload::None, none_class)?);
    ctx.builtins.true_ = Some(ctx.alloc_of_class(Payload::Bool(true), bool_class)?);
    ctx.builtins.false_ = Some(ctx.alloc_of_class(Payload::Bool(false), bool_class)?);

    methods::object::install(ctx, object)?;
    methods::none::install(ctx, none_class)?;
    methods::bool::install(ctx, bool_class)?;
    methods::int::install(ctx, int_class)?;
    methods::float::install(ctx, float_class)?;
    methods::str::install(ctx, str_class)?;
    methods::tuple::install(ctx, tuple_class)?;
    methods::list::install(ctx, list_class)?;
    methods::dict::install(ctx, dict_class)?;
    methods::set::install(ctx, set_class)?;
    methods::function::install(ctx, function_class)?;

    for (name, class) in [
        ("object", object),
        ("type", type_class),
        ("NoneType", none_class),
        ("bool", bool_class),
        ("int", int_class),
        ("float", float_class),
        ("str", str_class),
        ("tuple", tuple_class),
        ("list", list_class),
        ("dict", dict_class),
        ("set", set_class),
    ] {
        ctx.set_global(name, class);
    }

    let mut registry = BuiltinRegistry::new();
    StdBuiltinProvider.install(&mut registry);
    registry.install_into(ctx)?;

    install_exceptions(ctx)?;
    install_iterators(ctx)?;
    ctx.builtins.isinstance = ctx.get_global("isinstance");

    ctx.current_module.pop();

    ctx.import_all_from_module("__builtins__")?;
    Ok(())
}

fn raw_class(ctx: &mut Context, name: &str, ctor: crate::NativeFn) -> OpResult {
    let class = ctx.alloc(Payload::Class(Box::new(ClassDesc {
        name: name.to_string(),
        module: "__builtins__".to_string(),
        bases: Vec::new(),
        instance_attrs: AttrTable::new(),
        ctor,
    })))?;
    if let Payload::Class(c) = &ctx.heap.get(class).payload {
        c.instance_attrs.set("__class__", class);
    }
    Ok(class)
}

fn template_of(ctx: &Context, class: ObjId) -> AttrTable {
    match &ctx.heap.get(class).payload {
        Payload::Class(c) => c.instance_attrs.clone(),
        _ => unreachable!("template_of requires a class"),
    }
}

// ---- user-facing class machinery --------------------------------------

impl Context {
    /// Create a class. With no bases given, the class derives from `object`.
    pub fn new_class(&mut self, name: &str, bases: &[ObjId]) -> OpResult {
        for &base in bases {
            if !self.is_class(base) {
                let ty = self.heap.get(base).type_name().to_string();
                return Err(self.raise(
                    ExcKind::TypeError,
                    &format!("base must be a class, not '{ty}'"),
                ));
            }
        }
        let module = self.current_module_name().to_string();
        let class = self.alloc(Payload::Class(Box::new(ClassDesc {
            name: name.to_string(),
            module,
            bases: Vec::new(),
            instance_attrs: AttrTable::new(),
            ctor: default_construct,
        })))?;
        self.protect(class);
        let result = self.finish_class(class, name, bases);
        self.unprotect(class);
        result
    }

    fn finish_class(&mut self, class: ObjId, name: &str, bases: &[ObjId]) -> OpResult {
        let object = self.object_class();
        let object_template = template_of(self, object);
        let template = template_of(self, class);
        template.set("__class__", class);
        self.heap.get(class).attrs.add_parent(&object_template, false);

        let actual_bases: Vec<ObjId> = if bases.is_empty() {
            vec![object]
        } else {
            bases.to_vec()
        };
        for &base in &actual_bases {
            let base_template = template_of(self, base);
            template.add_parent(&base_template, false);
        }
        if let Payload::Class(c) = self.payload_mut(class) {
            c.bases = actual_bases.clone();
        }

        let bases_tuple = self.new_tuple(&actual_bases)?;
        self.set_attribute(class, "__bases__", bases_tuple);

        let str_fn = self.new_function_full("__str__", class_str, true, None)?;
        self.set_attribute(class, "__str__", str_fn);

        // Default __init__ forwards to the first base's __init__ so missing
        // constructors chain upward.
        let init_name = format!("{name}.__init__");
        let init_fn =
            self.new_function_full(&init_name, class_default_init, true, Some(Rc::new(class)))?;
        self.link_reference(init_fn, class);
        self.add_attribute_to_class(class, "__init__", init_fn);

        Ok(class)
    }
}

/// Allocate an instance of `class` without invoking `__init__`: tag it with
/// the class name and copy the instance-attribute template.
pub(crate) fn blank_instance(ctx: &mut Context, class: ObjId) -> OpResult {
    let (name, template) = match &ctx.heap.get(class).payload {
        Payload::Class(c) => (c.name.clone(), c.instance_attrs.clone()),
        _ => unreachable!("blank_instance requires a class"),
    };
    let instance = ctx.alloc(Payload::Instance(name.into()))?;
    ctx.heap.get_mut(instance).attrs = template.copy();
    Ok(instance)
}

/// The constructor thunk shared by user classes: allocate the instance,
/// then invoke `__init__` if the class provides one. A `__init__` returning
/// anything but None is a TypeError.
pub(crate) fn default_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    let class = ctx.ctor_class().expect("constructor without a class");
    let instance = blank_instance(ctx, class)?;
    ctx.protect(instance);
    let result = run_init(ctx, instance, argv);
    ctx.unprotect(instance);
    result?;
    Ok(instance)
}

fn run_init(ctx: &mut Context, instance: ObjId, argv: &[ObjId]) -> UnitResult {
    let Some(init) = ctx.has_attribute(instance, "__init__") else {
        return Ok(());
    };
    if !ctx.is_function(init) {
        return Ok(());
    }
    let kwargs = ctx.kwargs()?;
    let ret = ctx.call(init, argv, Some(kwargs))?;
    if !ctx.is_none(ret) {
        return Err(ctx.raise(
            ExcKind::TypeError,
            "__init__() returned a non NoneType type",
        ));
    }
    Ok(())
}

/// The `__init__` installed on every class by `new_class`: forward to the
/// first base's `__init__`, if any.
fn class_default_init(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    if argv.is_empty() {
        return Err(ctx.raise_argument_count_error(0, None));
    }
    let class = match ctx
        .function_userdata()
        .as_deref()
        .and_then(|ud| ud.downcast_ref::<ObjId>())
    {
        Some(&class) => class,
        None => return Ok(ctx.none()),
    };
    let bases = match ctx.class_ref(class) {
        Some(c) => c.bases.clone(),
        None => return Ok(ctx.none()),
    };
    if let Some(&first) = bases.first() {
        if let Some(base_init) = ctx.get_attribute_from_base(argv[0], "__init__", Some(first)) {
            let kwargs = ctx.kwargs()?;
            let ret = ctx.call(base_init, &argv[1..], Some(kwargs))?;
            if !ctx.is_none(ret) {
                return Err(ctx.raise(
                    ExcKind::TypeError,
                    "__init__() returned a non NoneType type",
                ));
            }
        }
    }
    Ok(ctx.none())
}

fn class_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let name = ctx
        .class_ref(argv[0])
        .map(|c| c.name.clone())
        .unwrap_or_default();
    ctx.new_str(&format!("<class '{name}'>"))
}

// ---- builtin class constructors ---------------------------------------

fn none_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    Ok(ctx.none())
}

fn bool_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return Ok(ctx.new_bool(false));
    }
    ctx.convert_bool(argv[0])
}

fn int_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return ctx.new_int(0);
    }
    ctx.convert_int(argv[0])
}

fn float_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return ctx.new_float(0.0);
    }
    ctx.convert_float(argv[0])
}

fn str_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return ctx.new_str("");
    }
    ctx.convert_str(argv[0])
}

fn tuple_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return ctx.new_tuple(&[]);
    }
    let items = collect_iterable(ctx, argv[0])?;
    let tuple = ctx.new_tuple(&items);
    for &v in &items {
        ctx.unprotect(v);
    }
    tuple
}

fn list_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    if argv.is_empty() {
        return ctx.new_list(&[]);
    }
    let items = collect_iterable(ctx, argv[0])?;
    let list = ctx.new_list(&items);
    for &v in &items {
        ctx.unprotect(v);
    }
    list
}

fn dict_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    ctx.new_map()
}

fn set_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    let set = ctx.new_set()?;
    if argv.is_empty() {
        return Ok(set);
    }
    ctx.protect(set);
    let source = argv[0];
    let result = ctx.iterate(source, |ctx, item| {
        let key = ctx.hash_key(item)?;
        if let Payload::Set(s) = &mut ctx.heap.get_mut(set).payload {
            s.entry(key).or_insert(item);
        }
        Ok(true)
    });
    ctx.unprotect(set);
    result?;
    Ok(set)
}

fn function_construct(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
    Err(ctx.raise(ExcKind::TypeError, "cannot create 'function' instances"))
}

fn type_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    match ctx.class_of(argv[0]) {
        Some(class) => Ok(class),
        None => Err(ctx.raise(ExcKind::TypeError, "value has no class")),
    }
}

/// Iterate into a Vec, protecting every element. Callers unprotect after
/// storing the elements somewhere reachable.
fn collect_iterable(ctx: &mut Context, obj: ObjId) -> Result<Vec<ObjId>, Raised> {
    let mut items: Vec<ObjId> = Vec::new();
    let result = ctx.iterate(obj, |ctx, item| {
        ctx.protect(item);
        items.push(item);
        Ok(true)
    });
    if let Err(raised) = result {
        for &v in &items {
            ctx.unprotect(v);
        }
        return Err(raised);
    }
    Ok(items)
}

// ---- prelude layer ----------------------------------------------------

fn install_exceptions(ctx: &mut Context) -> UnitResult {
    let base = ctx.new_class("BaseException", &[])?;
    ctx.bind_method(base, "__init__", exception_init)?;
    ctx.bind_method(base, "__str__", exception_str)?;
    ctx.builtins.exc.insert(ExcKind::BaseException, base);
    ctx.set_global("BaseException", base);

    // ALL is ordered parents-first.
    for kind in ExcKind::ALL {
        let Some(parent_kind) = kind.parent() else {
            continue;
        };
        let parent = ctx.exc_class(parent_kind);
        let class = ctx.new_class(kind.name(), &[parent])?;
        ctx.builtins.exc.insert(kind, class);
        ctx.set_global(kind.name(), class);
    }
    Ok(())
}

fn exception_init(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, 2)?;
    let msg = if argv.len() == 2 {
        argv[1]
    } else {
        ctx.new_str("")?
    };
    ctx.set_attribute(argv[0], "message", msg);
    Ok(ctx.none())
}

fn exception_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    match ctx.has_attribute(argv[0], "message") {
        Some(msg) if ctx.is_str(msg) => Ok(msg),
        _ => ctx.new_str(""),
    }
}

fn install_iterators(ctx: &mut Context) -> UnitResult {
    let iterator = ctx.new_class("iterator", &[])?;
    if let Payload::Class(c) = ctx.payload_mut(iterator) {
        c.ctor = internal_construct_error;
    }
    ctx.bind_method(iterator, "__iter__", iter_self)?;
    ctx.bind_method(iterator, "__next__", seq_iter_next)?;
    ctx.builtins.seq_iter_class = Some(iterator);

    let range_iterator = ctx.new_class("range_iterator", &[])?;
    if let Payload::Class(c) = ctx.payload_mut(range_iterator) {
        c.ctor = internal_construct_error;
    }
    ctx.bind_method(range_iterator, "__iter__", iter_self)?;
    ctx.bind_method(range_iterator, "__next__", range_iter_next)?;
    ctx.builtins.range_iter_class = Some(range_iterator);

    let range = ctx.new_class("range", &[])?;
    if let Payload::Class(c) = ctx.payload_mut(range) {
        c.ctor = range_construct;
    }
    ctx.bind_method(range, "__iter__", range_iter)?;
    ctx.builtins.range_class = Some(range);
    ctx.set_global("range", range);
    Ok(())
}

fn internal_construct_error(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
    Err(ctx.raise(
        ExcKind::TypeError,
        "cannot construct iterator instances directly",
    ))
}

fn iter_self(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

/// Generic iterator over anything with `__len__` and `__getitem__`.
pub(crate) fn new_seq_iter(ctx: &mut Context, seq: ObjId) -> OpResult {
    let class = ctx
        .builtins
        .seq_iter_class
        .expect("context not bootstrapped");
    ctx.protect(seq);
    let result = (|ctx: &mut Context| {
        let inst = blank_instance(ctx, class)?;
        ctx.set_attribute(inst, "seq", seq);
        ctx.protect(inst);
        let zero = ctx.new_int(0);
        ctx.unprotect(inst);
        ctx.set_attribute(inst, "i", zero?);
        Ok(inst)
    })(ctx);
    ctx.unprotect(seq);
    result
}

fn seq_iter_next(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let iter = argv[0];
    let seq = ctx.get_attribute(iter, "seq")?;
    let i_obj = ctx.get_attribute(iter, "i")?;
    let i = ctx.get_int(i_obj).unwrap_or(0);
    let len = ctx.value_len(seq)? as i64;
    if i >= len {
        return Err(ctx.raise(ExcKind::StopIteration, ""));
    }
    let item = ctx.get_index(seq, i_obj)?;
    ctx.protect(item);
    let next = ctx.new_int(i + 1);
    ctx.unprotect(item);
    ctx.set_attribute(iter, "i", next?);
    Ok(item)
}

fn range_construct(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, 3)?;
    let (start, stop, step) = match argv.len() {
        1 => (0, arg_int(ctx, argv, 0)?, 1),
        2 => (arg_int(ctx, argv, 0)?, arg_int(ctx, argv, 1)?, 1),
        _ => (
            arg_int(ctx, argv, 0)?,
            arg_int(ctx, argv, 1)?,
            arg_int(ctx, argv, 2)?,
        ),
    };
    if step == 0 {
        return Err(ctx.raise(ExcKind::ValueError, "range() step must not be zero"));
    }
    let class = ctx.ctor_class().expect("constructor without a class");
    let instance = blank_instance(ctx, class)?;
    ctx.protect(instance);
    let result = (|ctx: &mut Context| {
        for (name, value) in [("start", start), ("stop", stop), ("step", step)] {
            let v = ctx.new_int(value)?;
            ctx.set_attribute(instance, name, v);
        }
        Ok(instance)
    })(ctx);
    ctx.unprotect(instance);
    result
}

fn range_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let class = ctx
        .builtins
        .range_iter_class
        .expect("context not bootstrapped");
    let start = ctx.get_attribute(argv[0], "start")?;
    let stop = ctx.get_attribute(argv[0], "stop")?;
    let step = ctx.get_attribute(argv[0], "step")?;
    let inst = blank_instance(ctx, class)?;
    ctx.set_attribute(inst, "cur", start);
    ctx.set_attribute(inst, "stop", stop);
    ctx.set_attribute(inst, "step", step);
    Ok(inst)
}

fn range_iter_next(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let iter = argv[0];
    let cur_obj = ctx.get_attribute(iter, "cur")?;
    let cur = ctx.get_int(cur_obj).unwrap_or(0);
    let stop = {
        let v = ctx.get_attribute(iter, "stop")?;
        ctx.get_int(v).unwrap_or(0)
    };
    let step = {
        let v = ctx.get_attribute(iter, "step")?;
        ctx.get_int(v).unwrap_or(1)
    };
    let done = if step > 0 { cur >= stop } else { cur <= stop };
    if done {
        return Err(ctx.raise(ExcKind::StopIteration, ""));
    }
    let next = ctx.new_int(cur + step)?;
    ctx.set_attribute(iter, "cur", next);
    Ok(cur_obj)
}
