use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::{arg_int, expect_argc, norm_index, values_equal};
use crate::util::display::display_value;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__len__", tuple_len)?;
    ctx.bind_method(class, "__getitem__", tuple_getitem)?;
    ctx.bind_method(class, "__eq__", tuple_eq)?;
    ctx.bind_method(class, "__contains__", tuple_contains)?;
    ctx.bind_method(class, "__hash__", tuple_hash)?;
    ctx.bind_method(class, "__str__", tuple_str)?;
    ctx.bind_method(class, "__iter__", tuple_iter)?;
    ctx.bind_method(class, "__nonzero__", tuple_nonzero)?;
    Ok(())
}

fn self_items(ctx: &Context, argv: &[ObjId]) -> Vec<ObjId> {
    match &ctx.heap.get(argv[0]).payload {
        Payload::Tuple(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn tuple_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_items(ctx, argv).len();
    ctx.new_int(n as i64)
}

fn tuple_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let empty = self_items(ctx, argv).is_empty();
    Ok(ctx.new_bool(!empty))
}

fn tuple_getitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let items = self_items(ctx, argv);
    let index = arg_int(ctx, argv, 1)?;
    match norm_index(index, items.len()) {
        Some(i) => Ok(items[i]),
        None => Err(ctx.raise(ExcKind::IndexError, "tuple index out of range")),
    }
}

fn tuple_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    Ok(ctx.new_bool(values_equal(ctx, argv[0], argv[1])))
}

fn tuple_contains(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let found = self_items(ctx, argv)
        .iter()
        .any(|&item| values_equal(ctx, item, argv[1]));
    Ok(ctx.new_bool(found))
}

fn tuple_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let key = ctx.hash_key(argv[0])?;
    ctx.new_int(key.digest() as i64)
}

fn tuple_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = display_value(ctx, argv[0]);
    ctx.new_str(&s)
}

fn tuple_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    crate::builtins::new_seq_iter(ctx, argv[0])
}
