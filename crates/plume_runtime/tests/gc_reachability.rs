//! Collector behavior: reachability, cycles, protection, finalizers, and
//! the allocation cap.

mod common;

use common::*;
use plume_runtime::{Config, Context, ObjId};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn rooted_values_survive_collection() {
    let mut ctx = Context::new();
    let v = int(&mut ctx, 7);
    ctx.set_global("keep", v);
    ctx.collect_garbage();
    assert!(ctx.is_alive(v));
    assert_eq!(ctx.get_int(v), Some(7));
}

#[test]
fn unreachable_values_are_reclaimed() {
    let mut ctx = Context::new();
    let v = int(&mut ctx, 7);
    assert!(ctx.is_alive(v));
    ctx.collect_garbage();
    assert!(!ctx.is_alive(v));
}

#[test]
fn container_edges_keep_elements_alive() {
    let mut ctx = Context::new();
    let elem = int(&mut ctx, 1);
    let list = ctx.new_list(&[elem]).unwrap();
    ctx.set_global("keep", list);
    ctx.collect_garbage();
    assert!(ctx.is_alive(elem));
}

#[test]
fn self_referential_map_lives_until_the_edge_is_cut() {
    let mut ctx = Context::new();
    let d = ctx.new_map().unwrap();
    ctx.set_global("d", d);
    let k = s(&mut ctx, "k");
    ctx.set_index(d, k, d).unwrap();

    // The cycle is rooted through the global.
    ctx.collect_garbage();
    assert!(ctx.is_alive(d));

    // Cut the self-edge, drop the root: the cycle is reclaimable.
    let none = ctx.none();
    ctx.set_index(d, k, none).unwrap();
    ctx.set_global("d", none);
    ctx.collect_garbage();
    assert!(!ctx.is_alive(d));
}

#[test]
fn cyclic_garbage_is_reclaimed_without_roots() {
    let mut ctx = Context::new();
    let a = ctx.new_list(&[]).unwrap();
    ctx.protect(a);
    let b = ctx.new_list(&[a]).unwrap();
    ctx.call_method(a, "append", &[b], None).unwrap();
    ctx.unprotect(a);

    // A two-node cycle with no external references.
    ctx.collect_garbage();
    assert!(!ctx.is_alive(a));
    assert!(!ctx.is_alive(b));
}

#[test]
fn protection_is_counted() {
    let mut ctx = Context::new();
    let v = int(&mut ctx, 5);
    ctx.protect(v);
    ctx.protect(v);
    ctx.collect_garbage();
    assert!(ctx.is_alive(v));
    ctx.unprotect(v);
    ctx.collect_garbage();
    assert!(ctx.is_alive(v));
    ctx.unprotect(v);
    ctx.collect_garbage();
    assert!(!ctx.is_alive(v));
}

#[test]
fn with_protected_pins_for_the_closure() {
    let mut ctx = Context::new();
    let v = int(&mut ctx, 5);
    let alive_inside = ctx.with_protected(&[v], |ctx| {
        ctx.collect_garbage();
        ctx.is_alive(v)
    });
    assert!(alive_inside);
    ctx.collect_garbage();
    assert!(!ctx.is_alive(v));
}

#[test]
fn linked_references_keep_children_alive() {
    let mut ctx = Context::new();
    let parent = ctx.new_list(&[]).unwrap();
    ctx.set_global("parent", parent);
    let child = int(&mut ctx, 3);
    ctx.link_reference(parent, child);
    ctx.collect_garbage();
    assert!(ctx.is_alive(child));

    ctx.unlink_reference(parent, child);
    ctx.collect_garbage();
    assert!(!ctx.is_alive(child));
}

#[test]
fn attribute_edges_are_traversed() {
    let mut ctx = Context::new();
    let owner = ctx.new_list(&[]).unwrap();
    ctx.set_global("owner", owner);
    let held = s(&mut ctx, "held");
    ctx.set_attribute(owner, "extra", held);
    ctx.collect_garbage();
    assert!(ctx.is_alive(held));
}

fn counting_finalizer(
    _ctx: &mut Context,
    _dead: ObjId,
    userdata: Option<Rc<dyn Any>>,
) -> Result<(), plume_runtime::Raised> {
    if let Some(ud) = userdata {
        if let Some(counter) = ud.downcast_ref::<Cell<u32>>() {
            counter.set(counter.get() + 1);
        }
    }
    Ok(())
}

#[test]
fn finalizers_run_exactly_once() {
    let mut ctx = Context::new();
    let counter: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    let v = int(&mut ctx, 1);
    ctx.set_finalizer(v, counting_finalizer, Some(counter.clone()));

    ctx.collect_garbage();
    assert_eq!(counter.get(), 1);
    ctx.collect_garbage();
    assert_eq!(counter.get(), 1);
}

#[test]
fn finalizers_do_not_run_for_live_values() {
    let mut ctx = Context::new();
    let counter: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    let v = int(&mut ctx, 1);
    ctx.set_global("keep", v);
    ctx.set_finalizer(v, counting_finalizer, Some(counter.clone()));
    ctx.collect_garbage();
    assert_eq!(counter.get(), 0);
}

#[test]
fn context_drop_runs_remaining_finalizers() {
    let counter: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    {
        let mut ctx = Context::new();
        let v = int(&mut ctx, 1);
        ctx.set_global("keep", v);
        ctx.set_finalizer(v, counting_finalizer, Some(counter.clone()));
    }
    assert_eq!(counter.get(), 1);
}

#[test]
fn allocation_cap_raises_memory_error() {
    let mut ctx = Context::with_config(Config {
        max_alloc: 1,
        ..Config::default()
    });
    let list = ctx.new_list(&[]).unwrap();
    ctx.set_global("keep", list);

    let mut hit = false;
    for i in 0..100_000 {
        match ctx.new_int(i) {
            Ok(v) => {
                ctx.call_method(list, "append", &[v], None).unwrap();
            }
            Err(_) => {
                hit = true;
                break;
            }
        }
    }
    assert!(hit, "the allocation cap should trip");
    assert!(pending_kind(&ctx, "MemoryError"));
}

#[test]
fn collection_count_stabilizes_after_garbage() {
    let mut ctx = Context::new();
    ctx.collect_garbage();
    let baseline = ctx.live_values();
    for i in 0..200 {
        let _ = int(&mut ctx, i);
    }
    ctx.collect_garbage();
    assert_eq!(ctx.live_values(), baseline);
}

#[test]
fn argv_tuple_is_rooted() {
    let mut ctx = Context::with_config(Config {
        argv: vec!["prog".to_string(), "arg1".to_string()],
        ..Config::default()
    });
    ctx.collect_garbage();
    let sys = ctx.import_module("sys", None).unwrap();
    let argv = ctx.get_attribute(sys, "argv").unwrap();
    assert!(ctx.is_tuple(argv));
    let one = int(&mut ctx, 1);
    let second = ctx.get_index(argv, one).unwrap();
    assert_eq!(as_str(&ctx, second), "arg1");
}
