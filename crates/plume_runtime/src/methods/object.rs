//! Methods of `object`, inherited by every value through the universal
//! template ancestor. Equality defaults to identity; `__ne__` is always the
//! negation of `__eq__`.

use plume_core::ObjId;

use crate::exceptions::ExcKind;
use crate::methods::common::expect_argc;
use crate::util::display::display_value;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__str__", obj_str)?;
    ctx.bind_method(class, "__eq__", obj_eq)?;
    ctx.bind_method(class, "__ne__", obj_ne)?;
    ctx.bind_method(class, "__nonzero__", obj_nonzero)?;
    Ok(())
}

fn obj_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = display_value(ctx, argv[0]);
    ctx.new_str(&s)
}

fn obj_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    Ok(ctx.new_bool(argv[0] == argv[1]))
}

fn obj_ne(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let eq = ctx.call_method(argv[0], "__eq__", &[argv[1]], None)?;
    match ctx.get_bool(eq) {
        Some(b) => Ok(ctx.new_bool(!b)),
        None => Err(ctx.raise(ExcKind::TypeError, "__eq__() returned a non bool type")),
    }
}

fn obj_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(ctx.new_bool(true))
}
