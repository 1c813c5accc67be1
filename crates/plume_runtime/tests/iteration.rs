//! The iteration protocol: the StopIteration driver, range, container
//! iterators, insertion order, and unpacking.

mod common;

use common::*;
use plume_runtime::{BinOp, Context, ObjId, Raised, UnOp};

fn collect_ints(ctx: &mut Context, obj: ObjId) -> Result<Vec<i64>, Raised> {
    let mut out = Vec::new();
    ctx.iterate(obj, |ctx, item| {
        out.push(ctx.get_int(item).expect("int item"));
        Ok(true)
    })?;
    Ok(out)
}

fn make_range(ctx: &mut Context, args: &[i64]) -> ObjId {
    let range = global_class(ctx, "range");
    let argv: Vec<ObjId> = args.iter().map(|&a| int(ctx, a)).collect();
    ctx.call(range, &argv, None).expect("range() succeeds")
}

#[test]
fn range_yields_its_sequence() {
    let mut ctx = Context::new();
    let r = make_range(&mut ctx, &[3]);
    ctx.set_global("r", r);
    assert_eq!(collect_ints(&mut ctx, r).unwrap(), [0, 1, 2]);

    let r = make_range(&mut ctx, &[2, 5]);
    ctx.set_global("r", r);
    assert_eq!(collect_ints(&mut ctx, r).unwrap(), [2, 3, 4]);

    let r = make_range(&mut ctx, &[5, 0, -2]);
    ctx.set_global("r", r);
    assert_eq!(collect_ints(&mut ctx, r).unwrap(), [5, 3, 1]);
}

#[test]
fn range_step_zero_is_a_value_error() {
    let mut ctx = Context::new();
    let range = global_class(&ctx, "range");
    let argv: Vec<ObjId> = [0, 5, 0].iter().map(|&a| int(&mut ctx, a)).collect();
    assert!(ctx.call(range, &argv, None).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
}

#[test]
fn stop_iteration_is_caught_and_cleared() {
    let mut ctx = Context::new();
    let r = make_range(&mut ctx, &[2]);
    ctx.set_global("r", r);
    collect_ints(&mut ctx, r).unwrap();
    assert!(ctx.current_exception().is_none());
}

#[test]
fn squares_accumulate_into_a_list() {
    let mut ctx = Context::new();
    let list = ctx.new_list(&[]).unwrap();
    ctx.set_global("a", list);
    let r = make_range(&mut ctx, &[3]);
    ctx.set_global("r", r);
    ctx.iterate(r, |ctx, item| {
        let square = ctx.binary_op(BinOp::Mul, item, item)?;
        ctx.call_method(list, "append", &[square], None)?;
        Ok(true)
    })
    .unwrap();

    let print = ctx.get_global("print").unwrap();
    ctx.call(print, &[list], None).unwrap();
    assert_eq!(ctx.take_output(), "[0, 1, 4]\n");
}

#[test]
fn lists_tuples_and_strings_iterate() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let list = ctx.new_list(&items).unwrap();
    ctx.set_global("l", list);
    assert_eq!(collect_ints(&mut ctx, list).unwrap(), [1, 2, 3]);

    let tuple = ctx.new_tuple(&items).unwrap();
    ctx.set_global("t", tuple);
    assert_eq!(collect_ints(&mut ctx, tuple).unwrap(), [1, 2, 3]);

    let text = s(&mut ctx, "ab");
    ctx.set_global("s", text);
    let mut chars = Vec::new();
    ctx.iterate(text, |ctx, item| {
        chars.push(as_str(ctx, item));
        Ok(true)
    })
    .unwrap();
    assert_eq!(chars, ["a", "b"]);
}

#[test]
fn early_stop_ends_iteration_cleanly() {
    let mut ctx = Context::new();
    let r = make_range(&mut ctx, &[100]);
    ctx.set_global("r", r);
    let mut seen = 0;
    ctx.iterate(r, |_, _| {
        seen += 1;
        Ok(seen < 3)
    })
    .unwrap();
    assert_eq!(seen, 3);
    assert!(ctx.current_exception().is_none());
}

#[test]
fn map_iteration_follows_insertion_order_with_stable_slots() {
    let mut ctx = Context::new();
    let d = ctx.new_map().unwrap();
    ctx.set_global("d", d);
    let (ka, kb) = (s(&mut ctx, "a"), s(&mut ctx, "b"));
    let (v1, v2, v3) = (
        int(&mut ctx, 1),
        int(&mut ctx, 2),
        int(&mut ctx, 3),
    );
    ctx.set_index(d, ka, v1).unwrap();
    ctx.set_index(d, kb, v2).unwrap();
    // Re-assigning an existing key keeps its original slot.
    ctx.set_index(d, ka, v3).unwrap();

    let mut keys = Vec::new();
    ctx.iterate(d, |ctx, item| {
        keys.push(as_str(ctx, item));
        Ok(true)
    })
    .unwrap();
    assert_eq!(keys, ["a", "b"]);

    let got = ctx.get_index(d, ka).unwrap();
    assert_eq!(as_int(&ctx, got), 3);
}

#[test]
fn set_iteration_follows_insertion_order() {
    let mut ctx = Context::new();
    let set = ctx.new_set().unwrap();
    ctx.set_global("s", set);
    for v in [3, 1, 2, 3] {
        let item = int(&mut ctx, v);
        ctx.call_method(set, "add", &[item], None).unwrap();
    }
    assert_eq!(collect_ints(&mut ctx, set).unwrap(), [3, 1, 2]);
}

#[test]
fn list_of_iterator_preserves_length() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=4).map(|i| int(&mut ctx, i)).collect();
    let source = ctx.new_list(&items).unwrap();
    ctx.set_global("src", source);

    let list_class = global_class(&ctx, "list");
    let copied = ctx.call(list_class, &[source], None).unwrap();
    ctx.set_global("copy", copied);

    let len_src = ctx.unary_op(UnOp::Len, source).unwrap();
    let len_copy = ctx.unary_op(UnOp::Len, copied).unwrap();
    assert_eq!(as_int(&ctx, len_src), as_int(&ctx, len_copy));
}

#[test]
fn tuple_list_round_trip() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let source = ctx.new_list(&items).unwrap();
    ctx.set_global("src", source);

    let tuple_class = global_class(&ctx, "tuple");
    let as_tuple = ctx.call(tuple_class, &[source], None).unwrap();
    ctx.set_global("t", as_tuple);
    let list_class = global_class(&ctx, "list");
    let back = ctx.call(list_class, &[as_tuple], None).unwrap();
    ctx.set_global("back", back);

    let eq = ctx.binary_op(BinOp::Eq, source, back).unwrap();
    assert!(as_bool(&ctx, eq));
}

#[test]
fn unpack_demands_an_exact_count() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let list = ctx.new_list(&items).unwrap();
    ctx.set_global("l", list);

    let got = ctx.unpack(list, 3).unwrap();
    assert_eq!(got.len(), 3);
    assert_eq!(as_int(&ctx, got[2]), 3);

    assert!(ctx.unpack(list, 2).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
    ctx.clear_exception();

    assert!(ctx.unpack(list, 4).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
}

#[test]
fn iterating_a_non_iterable_raises() {
    let mut ctx = Context::new();
    let n = int(&mut ctx, 5);
    let result = ctx.iterate(n, |_, _| Ok(true));
    assert!(result.is_err());
    assert!(pending_kind(&ctx, "AttributeError"));
}
