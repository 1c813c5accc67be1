//! Object model: constructors, interrogation, attribute resolution with
//! multiple inheritance, and the instance lifecycle.

mod common;

use common::*;
use plume_runtime::{Context, ObjId, OpResult, UnOp};
use std::rc::Rc;

fn ret_one(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
    ctx.new_int(1)
}

fn ret_two(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
    ctx.new_int(2)
}

#[test]
fn constructors_and_interrogation() {
    let mut ctx = Context::new();
    let i = int(&mut ctx, 42);
    assert!(ctx.is_int(i));
    assert_eq!(ctx.get_int(i), Some(42));

    let f = float(&mut ctx, 2.5);
    assert!(ctx.is_float(f));
    assert_eq!(ctx.get_float(f), Some(2.5));

    let st = s(&mut ctx, "hi");
    assert!(ctx.is_str(st));
    assert_eq!(ctx.get_str(st), Some("hi"));

    let t = ctx.new_tuple(&[i, f]).unwrap();
    assert!(ctx.is_tuple(t));
    let l = ctx.new_list(&[st]).unwrap();
    assert!(ctx.is_list(l));
    let m = ctx.new_map().unwrap();
    assert!(ctx.is_map(m));
    let set = ctx.new_set().unwrap();
    assert!(ctx.is_set(set));

    assert!(ctx.is_none(ctx.none()));
    assert!(ctx.is_bool(ctx.new_bool(true)));
}

#[test]
fn bools_are_canonical_singletons() {
    let ctx = Context::new();
    assert_eq!(ctx.new_bool(true), ctx.new_bool(true));
    assert_eq!(ctx.new_bool(false), ctx.new_bool(false));
    assert_ne!(ctx.new_bool(true), ctx.new_bool(false));
}

#[test]
fn attribute_writes_are_local_to_the_receiver() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    let x1 = ctx.call(a, &[], None).unwrap();
    ctx.set_global("x1", x1);
    let x2 = ctx.call(a, &[], None).unwrap();

    let v = int(&mut ctx, 10);
    ctx.set_attribute(x1, "field", v);
    assert!(ctx.has_attribute(x1, "field").is_some());
    assert!(ctx.has_attribute(x2, "field").is_none());

    assert!(ctx.get_attribute(x2, "field").is_err());
    assert!(pending_kind(&ctx, "AttributeError"));
    ctx.clear_exception();
}

#[test]
fn method_resolution_through_bases() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    ctx.bind_method(a, "f", ret_one).unwrap();
    let b = ctx.new_class("B", &[a]).unwrap();
    let inst = ctx.call(b, &[], None).unwrap();
    let r = ctx.call_method(inst, "f", &[], None).unwrap();
    assert_eq!(as_int(&ctx, r), 1);
}

#[test]
fn resolution_order_is_depth_first_left_to_right() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    ctx.bind_method(a, "m", ret_one).unwrap();
    let b = ctx.new_class("B", &[]).unwrap();
    ctx.bind_method(b, "m", ret_two).unwrap();
    let c = ctx.new_class("C", &[a, b]).unwrap();
    let inst = ctx.call(c, &[], None).unwrap();
    let r = ctx.call_method(inst, "m", &[], None).unwrap();
    assert_eq!(as_int(&ctx, r), 1);
}

#[test]
fn bases_and_class_are_exposed() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    let bases = ctx.get_attribute(a, "__bases__").unwrap();
    assert!(ctx.is_tuple(bases));
    let object = global_class(&ctx, "object");
    let first = {
        let idx = int(&mut ctx, 0);
        ctx.get_index(bases, idx).unwrap()
    };
    assert_eq!(first, object);

    let inst = ctx.call(a, &[], None).unwrap();
    let class = ctx.get_attribute(inst, "__class__").unwrap();
    assert_eq!(class, a);
}

#[test]
fn init_runs_with_arguments_and_binds_self() {
    fn point_init(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
        // self, x
        ctx.set_attribute(argv[0], "x", argv[1]);
        Ok(ctx.none())
    }

    let mut ctx = Context::new();
    let point = ctx.new_class("Point", &[]).unwrap();
    ctx.bind_method(point, "__init__", point_init).unwrap();
    let seven = int(&mut ctx, 7);
    let inst = ctx.call(point, &[seven], None).unwrap();
    let x = ctx.get_attribute(inst, "x").unwrap();
    assert_eq!(as_int(&ctx, x), 7);
}

#[test]
fn init_returning_a_value_is_a_type_error() {
    fn bad_init(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
        ctx.new_int(5)
    }

    let mut ctx = Context::new();
    let bad = ctx.new_class("Bad", &[]).unwrap();
    ctx.bind_method(bad, "__init__", bad_init).unwrap();
    assert!(ctx.call(bad, &[], None).is_err());
    assert!(pending_kind(&ctx, "TypeError"));
}

#[test]
fn subclass_init_chains_to_first_base() {
    fn base_init(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
        let marker = ctx.new_str("base")?;
        ctx.set_attribute(argv[0], "made_by", marker);
        Ok(ctx.none())
    }

    let mut ctx = Context::new();
    let base = ctx.new_class("Base", &[]).unwrap();
    ctx.bind_method(base, "__init__", base_init).unwrap();
    let derived = ctx.new_class("Derived", &[base]).unwrap();
    let inst = ctx.call(derived, &[], None).unwrap();
    let made_by = ctx.get_attribute(inst, "made_by").unwrap();
    assert_eq!(as_str(&ctx, made_by), "base");
}

#[test]
fn bound_methods_carry_their_receiver() {
    fn get_tag(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
        ctx.get_attribute(argv[0], "tag")
    }

    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    ctx.bind_method(a, "get_tag", get_tag).unwrap();
    let inst = ctx.call(a, &[], None).unwrap();
    ctx.set_global("inst", inst);
    let tag = int(&mut ctx, 99);
    ctx.set_attribute(inst, "tag", tag);

    // Looking the method up binds self; calling it needs no receiver.
    let method = ctx.get_attribute(inst, "get_tag").unwrap();
    let r = ctx.call(method, &[], None).unwrap();
    assert_eq!(as_int(&ctx, r), 99);
}

#[test]
fn instances_dispatch_call_through_dunder() {
    fn call_impl(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
        // self, x
        Ok(argv[1])
    }

    let mut ctx = Context::new();
    let functor = ctx.new_class("Functor", &[]).unwrap();
    ctx.bind_method(functor, "__call__", call_impl).unwrap();
    let inst = ctx.call(functor, &[], None).unwrap();
    ctx.set_global("inst", inst);
    let five = int(&mut ctx, 5);
    let r = ctx.call(inst, &[five], None).unwrap();
    assert_eq!(as_int(&ctx, r), 5);
}

#[test]
fn type_of_a_value_is_its_class() {
    let mut ctx = Context::new();
    let type_class = global_class(&ctx, "type");
    let int_class = global_class(&ctx, "int");
    let five = int(&mut ctx, 5);
    let class = ctx.call(type_class, &[five], None).unwrap();
    assert_eq!(class, int_class);
}

#[test]
fn class_str_names_the_class() {
    let mut ctx = Context::new();
    let a = ctx.new_class("Widget", &[]).unwrap();
    let shown = ctx.unary_op(UnOp::Str, a).unwrap();
    assert_eq!(as_str(&ctx, shown), "<class 'Widget'>");
}

#[test]
fn userdata_round_trips_through_its_tag() {
    let mut ctx = Context::new();
    let payload: Rc<dyn std::any::Any> = Rc::new(1234u32);
    let ud = ctx.new_userdata("Widget", payload).unwrap();
    let got = ctx.try_get_userdata(ud, "Widget").expect("tag matches");
    assert_eq!(got.downcast_ref::<u32>(), Some(&1234));
    assert!(ctx.try_get_userdata(ud, "Other").is_none());
}

#[test]
fn mutable_values_are_not_hashable() {
    let mut ctx = Context::new();
    let m = ctx.new_map().unwrap();
    let l = ctx.new_list(&[]).unwrap();
    let v = int(&mut ctx, 1);
    assert!(ctx.set_index(m, l, v).is_err());
    assert!(pending_kind(&ctx, "TypeError"));
    ctx.clear_exception();
}

#[test]
fn equal_tuples_are_the_same_mapping_key() {
    let mut ctx = Context::new();
    let m = ctx.new_map().unwrap();
    ctx.set_global("m", m);
    let one_a = int(&mut ctx, 1);
    let one_b = int(&mut ctx, 1);
    let k1 = ctx.new_tuple(&[one_a]).unwrap();
    let k2 = ctx.new_tuple(&[one_b]).unwrap();
    let v1 = int(&mut ctx, 10);
    ctx.set_index(m, k1, v1).unwrap();
    let got = ctx.get_index(m, k2).unwrap();
    assert_eq!(as_int(&ctx, got), 10);
}

#[test]
fn lookup_from_base_skips_the_override() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    ctx.bind_method(a, "m", ret_one).unwrap();
    let b = ctx.new_class("B", &[a]).unwrap();
    ctx.bind_method(b, "m", ret_two).unwrap();
    let inst = ctx.call(b, &[], None).unwrap();
    ctx.set_global("inst", inst);

    let direct = ctx.call_method(inst, "m", &[], None).unwrap();
    assert_eq!(as_int(&ctx, direct), 2);
    let from_base = ctx
        .call_method_from_base(inst, "m", &[], None, Some(a))
        .unwrap();
    assert_eq!(as_int(&ctx, from_base), 1);
}

#[test]
fn raise_helper_rejects_non_exception_values() {
    let mut ctx = Context::new();
    let five = int(&mut ctx, 5);
    ctx.raise_object(five);
    assert!(pending_kind(&ctx, "TypeError"));
}
