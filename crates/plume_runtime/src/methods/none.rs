use plume_core::{HashKey, ObjId};

use crate::methods::common::expect_argc;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__nonzero__", none_nonzero)?;
    ctx.bind_method(class, "__str__", none_str)?;
    ctx.bind_method(class, "__eq__", none_eq)?;
    ctx.bind_method(class, "__hash__", none_hash)?;
    Ok(())
}

fn none_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(ctx.new_bool(false))
}

fn none_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    ctx.new_str("None")
}

fn none_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    Ok(ctx.new_bool(ctx.is_none(argv[1])))
}

fn none_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    ctx.new_int(HashKey::None.digest() as i64)
}
