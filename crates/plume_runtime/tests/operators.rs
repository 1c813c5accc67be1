//! Operator dispatch, arithmetic edge cases, and boundary behaviors.

mod common;

use common::*;
use plume_runtime::{BinOp, Context, ObjId, OpResult, UnOp};

fn int_op(ctx: &mut Context, op: BinOp, a: i64, b: i64) -> OpResult {
    let lhs = int(ctx, a);
    let rhs = int(ctx, b);
    ctx.binary_op(op, lhs, rhs)
}

#[test]
fn addition_produces_a_sum() {
    let mut ctx = Context::new();
    let r = int_op(&mut ctx, BinOp::Add, 1, 2).unwrap();
    assert_eq!(as_int(&ctx, r), 3);
}

#[test]
fn print_writes_to_the_sink() {
    let mut ctx = Context::new();
    let sum = int_op(&mut ctx, BinOp::Add, 1, 2).unwrap();
    let print = ctx.get_global("print").unwrap();
    ctx.call(print, &[sum], None).unwrap();
    assert_eq!(ctx.take_output(), "3\n");
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    let mut ctx = Context::new();
    let lhs = int(&mut ctx, 1);
    let rhs = float(&mut ctx, 2.5);
    let r = ctx.binary_op(BinOp::Add, lhs, rhs).unwrap();
    assert!(ctx.is_float(r));
    assert_eq!(ctx.get_float(r), Some(3.5));
}

#[test]
fn true_division_always_yields_float() {
    let mut ctx = Context::new();
    let r = int_op(&mut ctx, BinOp::Div, 7, 2).unwrap();
    assert!(ctx.is_float(r));
    assert_eq!(ctx.get_float(r), Some(3.5));
}

#[test]
fn floor_division_and_modulo_use_floored_semantics() {
    let cases = [
        (7, 2, 3, 1),
        (-7, 2, -4, 1),
        (7, -2, -4, -1),
        (-7, -2, 3, -1),
    ];
    let mut ctx = Context::new();
    for (a, b, q, m) in cases {
        let quotient = int_op(&mut ctx, BinOp::FloorDiv, a, b).unwrap();
        assert_eq!(as_int(&ctx, quotient), q, "{a} // {b}");
        let remainder = int_op(&mut ctx, BinOp::Mod, a, b).unwrap();
        assert_eq!(as_int(&ctx, remainder), m, "{a} % {b}");
    }
}

#[test]
fn division_by_zero_raises() {
    let mut ctx = Context::new();
    for op in [BinOp::Div, BinOp::FloorDiv, BinOp::Mod] {
        assert!(int_op(&mut ctx, op, 1, 0).is_err());
        assert!(pending_kind(&ctx, "ZeroDivisionError"));
        ctx.clear_exception();
    }
}

#[test]
fn float_zero_division_raises_instead_of_nan() {
    let mut ctx = Context::new();
    let lhs = float(&mut ctx, 0.0);
    let rhs = float(&mut ctx, 0.0);
    assert!(ctx.binary_op(BinOp::Div, lhs, rhs).is_err());
    assert!(pending_kind(&ctx, "ZeroDivisionError"));
}

#[test]
fn shift_amounts_clamp_to_the_word_width() {
    let mut ctx = Context::new();
    let r = int_op(&mut ctx, BinOp::Shl, 1, 65).unwrap();
    assert_eq!(as_int(&ctx, r), 0);
    let r = int_op(&mut ctx, BinOp::Shr, -1, 65).unwrap();
    assert_eq!(as_int(&ctx, r), -1);
    let r = int_op(&mut ctx, BinOp::Shr, 12345, 64).unwrap();
    assert_eq!(as_int(&ctx, r), 0);
}

#[test]
fn negative_shift_raises_value_error() {
    let mut ctx = Context::new();
    assert!(int_op(&mut ctx, BinOp::Shl, 1, -1).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
}

#[test]
fn string_replication() {
    let mut ctx = Context::new();
    let base = s(&mut ctx, "ab");
    for (n, expected) in [(0, ""), (3, "ababab"), (-1, "")] {
        let count = int(&mut ctx, n);
        let r = ctx.binary_op(BinOp::Mul, base, count).unwrap();
        assert_eq!(as_str(&ctx, r), expected, "\"ab\" * {n}");
    }
}

#[test]
fn integer_overflow_is_reported() {
    let mut ctx = Context::new();
    assert!(int_op(&mut ctx, BinOp::Add, i64::MAX, 1).is_err());
    assert!(pending_kind(&ctx, "OverflowError"));
}

#[test]
fn negative_indexing_and_bounds() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let list = ctx.new_list(&items).unwrap();
    ctx.set_global("l", list);

    let minus_one = int(&mut ctx, -1);
    let last = ctx.get_index(list, minus_one).unwrap();
    assert_eq!(as_int(&ctx, last), 3);

    let minus_four = int(&mut ctx, -4);
    assert!(ctx.get_index(list, minus_four).is_err());
    assert!(pending_kind(&ctx, "IndexError"));
}

#[test]
fn equality_falls_back_to_identity() {
    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    let x = ctx.call(a, &[], None).unwrap();
    ctx.set_global("x", x);
    let y = ctx.call(a, &[], None).unwrap();
    ctx.set_global("y", y);

    let same = ctx.binary_op(BinOp::Eq, x, x).unwrap();
    assert!(as_bool(&ctx, same));
    let different = ctx.binary_op(BinOp::Eq, x, y).unwrap();
    assert!(!as_bool(&ctx, different));

    // != is the negation of ==.
    let ne = ctx.binary_op(BinOp::Ne, x, y).unwrap();
    assert!(as_bool(&ctx, ne));
}

#[test]
fn comparison_must_return_bool() {
    fn eq_returns_int(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
        ctx.new_int(5)
    }

    let mut ctx = Context::new();
    let a = ctx.new_class("A", &[]).unwrap();
    ctx.bind_method(a, "__eq__", eq_returns_int).unwrap();
    let x = ctx.call(a, &[], None).unwrap();
    ctx.set_global("x", x);
    let y = int(&mut ctx, 0);
    assert!(ctx.binary_op(BinOp::Eq, x, y).is_err());
    assert!(pending_kind(&ctx, "TypeError"));
}

#[test]
fn containment_dispatches_on_the_container() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let list = ctx.new_list(&items).unwrap();
    ctx.set_global("l", list);
    let two = int(&mut ctx, 2);
    let hit = ctx.binary_op(BinOp::In, two, list).unwrap();
    assert!(as_bool(&ctx, hit));
    let nine = int(&mut ctx, 9);
    let miss = ctx.binary_op(BinOp::NotIn, nine, list).unwrap();
    assert!(as_bool(&ctx, miss));

    let hay = s(&mut ctx, "abc");
    let needle = s(&mut ctx, "b");
    let hit = ctx.binary_op(BinOp::In, needle, hay).unwrap();
    assert!(as_bool(&ctx, hit));
}

#[test]
fn boolean_operators_convert_via_nonzero() {
    let mut ctx = Context::new();
    let zero = int(&mut ctx, 0);
    let two = int(&mut ctx, 2);
    let and = ctx.binary_op(BinOp::And, zero, two).unwrap();
    assert!(!as_bool(&ctx, and));
    let or = ctx.binary_op(BinOp::Or, zero, two).unwrap();
    assert!(as_bool(&ctx, or));

    let not = ctx.unary_op(UnOp::Not, zero).unwrap();
    assert!(as_bool(&ctx, not));
}

#[test]
fn conversions_enforce_result_types() {
    let mut ctx = Context::new();
    let n = int(&mut ctx, 42);
    let shown = ctx.unary_op(UnOp::Str, n).unwrap();
    assert_eq!(as_str(&ctx, shown), "42");

    let text = s(&mut ctx, " 17 ");
    let parsed = ctx.unary_op(UnOp::Int, text).unwrap();
    assert_eq!(as_int(&ctx, parsed), 17);

    let bad = s(&mut ctx, "nope");
    assert!(ctx.unary_op(UnOp::Int, bad).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
    ctx.clear_exception();

    let letters = s(&mut ctx, "abc");
    let len = ctx.unary_op(UnOp::Len, letters).unwrap();
    assert_eq!(as_int(&ctx, len), 3);
}

#[test]
fn hash_is_consistent_with_equality() {
    let mut ctx = Context::new();
    let one = int(&mut ctx, 1);
    let one_f = float(&mut ctx, 1.0);
    let eq = ctx.binary_op(BinOp::Eq, one, one_f).unwrap();
    assert!(as_bool(&ctx, eq));
    let h1 = ctx.unary_op(UnOp::Hash, one).unwrap();
    let h2 = ctx.unary_op(UnOp::Hash, one_f).unwrap();
    assert_eq!(as_int(&ctx, h1), as_int(&ctx, h2));

    let sa = s(&mut ctx, "x");
    let sb = s(&mut ctx, "x");
    let h1 = ctx.unary_op(UnOp::Hash, sa).unwrap();
    let h2 = ctx.unary_op(UnOp::Hash, sb).unwrap();
    assert_eq!(as_int(&ctx, h1), as_int(&ctx, h2));
}

#[test]
fn unary_arithmetic() {
    let mut ctx = Context::new();
    let five = int(&mut ctx, 5);
    let neg = ctx.unary_op(UnOp::Neg, five).unwrap();
    assert_eq!(as_int(&ctx, neg), -5);
    let inv = ctx.unary_op(UnOp::BitNot, five).unwrap();
    assert_eq!(as_int(&ctx, inv), !5);
    let pos = ctx.unary_op(UnOp::Pos, five).unwrap();
    assert_eq!(as_int(&ctx, pos), 5);
}

#[test]
fn print_hook_replaces_the_buffer() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut ctx = Context::new();
    let lines: Rc<RefCell<String>> = Rc::new(RefCell::new(String::new()));
    let sink = lines.clone();
    ctx.set_print_hook(Box::new(move |text| sink.borrow_mut().push_str(text)));

    let v = int(&mut ctx, 8);
    let print = ctx.get_global("print").unwrap();
    ctx.call(print, &[v], None).unwrap();
    assert_eq!(&*lines.borrow(), "8\n");
    assert_eq!(ctx.take_output(), "");
}

#[test]
fn string_index_assignment_goes_through_setitem() {
    let mut ctx = Context::new();
    let items: Vec<ObjId> = (1..=3).map(|i| int(&mut ctx, i)).collect();
    let list = ctx.new_list(&items).unwrap();
    ctx.set_global("l", list);
    let zero = int(&mut ctx, 0);
    let nine = int(&mut ctx, 9);
    ctx.set_index(list, zero, nine).unwrap();
    let got = ctx.get_index(list, zero).unwrap();
    assert_eq!(as_int(&ctx, got), 9);
}
