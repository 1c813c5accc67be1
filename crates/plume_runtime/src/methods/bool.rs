use plume_core::{HashKey, ObjId};

use crate::core::value::Payload;
use crate::methods::common::expect_argc;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__nonzero__", bool_nonzero)?;
    ctx.bind_method(class, "__int__", bool_int)?;
    ctx.bind_method(class, "__float__", bool_float)?;
    ctx.bind_method(class, "__str__", bool_str)?;
    ctx.bind_method(class, "__eq__", bool_eq)?;
    ctx.bind_method(class, "__hash__", bool_hash)?;
    Ok(())
}

fn self_bool(ctx: &Context, argv: &[ObjId]) -> bool {
    matches!(ctx.heap.get(argv[0]).payload, Payload::Bool(true))
}

fn bool_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn bool_int(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let b = self_bool(ctx, argv);
    ctx.new_int(i64::from(b))
}

fn bool_float(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let b = self_bool(ctx, argv);
    ctx.new_float(if b { 1.0 } else { 0.0 })
}

fn bool_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let b = self_bool(ctx, argv);
    ctx.new_str(if b { "True" } else { "False" })
}

fn bool_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let result = match ctx.heap.get(argv[1]).payload {
        Payload::Bool(other) => self_bool(ctx, argv) == other,
        _ => false,
    };
    Ok(ctx.new_bool(result))
}

fn bool_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let b = self_bool(ctx, argv);
    ctx.new_int(HashKey::Bool(b).digest() as i64)
}
