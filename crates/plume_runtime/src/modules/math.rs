//! The `math` module.

use plume_core::ObjId;

use crate::exceptions::ExcKind;
use crate::methods::common::{arg_num, expect_argc};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn load(ctx: &mut Context) -> UnitResult {
    let pi = ctx.new_float(std::f64::consts::PI)?;
    ctx.set_global("pi", pi);
    let e = ctx.new_float(std::f64::consts::E)?;
    ctx.set_global("e", e);

    for (name, fun) in [
        ("sqrt", math_sqrt as crate::NativeFn),
        ("sin", math_sin),
        ("cos", math_cos),
        ("tan", math_tan),
        ("floor", math_floor),
        ("ceil", math_ceil),
        ("log", math_log),
        ("pow", math_pow),
    ] {
        let f = ctx.new_function(name, fun)?;
        ctx.set_global(name, f);
    }
    Ok(())
}

fn math_sqrt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    if x < 0.0 {
        return Err(ctx.raise(ExcKind::ValueError, "math domain error"));
    }
    ctx.new_float(x.sqrt())
}

fn math_sin(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    ctx.new_float(x.sin())
}

fn math_cos(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    ctx.new_float(x.cos())
}

fn math_tan(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    ctx.new_float(x.tan())
}

fn math_floor(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    ctx.new_int(x.floor() as i64)
}

fn math_ceil(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    ctx.new_int(x.ceil() as i64)
}

fn math_log(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let x = arg_num(ctx, argv, 0)?;
    if x <= 0.0 {
        return Err(ctx.raise(ExcKind::ValueError, "math domain error"));
    }
    ctx.new_float(x.ln())
}

fn math_pow(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let x = arg_num(ctx, argv, 0)?;
    let y = arg_num(ctx, argv, 1)?;
    ctx.new_float(x.powf(y))
}
