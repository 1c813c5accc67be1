//! Float dunders. Division and modulo by zero raise ZeroDivisionError on
//! floats too; there is no NaN-producing division.

use plume_core::{HashKey, ObjId};

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::expect_argc;
use crate::methods::int::{floor_mod_f64, num_of, Num};
use crate::util::display::float_repr;
use crate::{Context, OpResult, Raised, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__nonzero__", float_nonzero)?;
    ctx.bind_method(class, "__int__", float_int)?;
    ctx.bind_method(class, "__float__", float_float)?;
    ctx.bind_method(class, "__str__", float_str)?;
    ctx.bind_method(class, "__hash__", float_hash)?;
    ctx.bind_method(class, "__eq__", float_eq)?;
    ctx.bind_method(class, "__lt__", float_lt)?;
    ctx.bind_method(class, "__le__", float_le)?;
    ctx.bind_method(class, "__gt__", float_gt)?;
    ctx.bind_method(class, "__ge__", float_ge)?;
    ctx.bind_method(class, "__pos__", float_pos)?;
    ctx.bind_method(class, "__neg__", float_neg)?;
    ctx.bind_method(class, "__add__", float_add)?;
    ctx.bind_method(class, "__sub__", float_sub)?;
    ctx.bind_method(class, "__mul__", float_mul)?;
    ctx.bind_method(class, "__truediv__", float_truediv)?;
    ctx.bind_method(class, "__floordiv__", float_floordiv)?;
    ctx.bind_method(class, "__mod__", float_mod)?;
    ctx.bind_method(class, "__pow__", float_pow)?;
    Ok(())
}

fn self_float(ctx: &Context, argv: &[ObjId]) -> f64 {
    match ctx.heap.get(argv[0]).payload {
        Payload::Float(f) => f,
        _ => 0.0,
    }
}

fn operand_error(ctx: &mut Context, op: &str, rhs: ObjId) -> Raised {
    let ty = ctx.heap.get(rhs).type_name().to_string();
    ctx.raise(
        ExcKind::TypeError,
        &format!("unsupported operand type(s) for {op}: 'float' and '{ty}'"),
    )
}

fn rhs_num(ctx: &mut Context, argv: &[ObjId], op: &str) -> Result<f64, Raised> {
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => Ok(b as f64),
        Some(Num::Float(b)) => Ok(b),
        None => Err(operand_error(ctx, op, argv[1])),
    }
}

fn float_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let f = self_float(ctx, argv);
    Ok(ctx.new_bool(f != 0.0))
}

fn float_int(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let f = self_float(ctx, argv);
    if f.is_nan() {
        return Err(ctx.raise(ExcKind::ValueError, "cannot convert float NaN to integer"));
    }
    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(ctx.raise(
            ExcKind::OverflowError,
            "float too large to convert to integer",
        ));
    }
    ctx.new_int(f.trunc() as i64)
}

fn float_float(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn float_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let f = self_float(ctx, argv);
    ctx.new_str(&float_repr(f))
}

fn float_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let f = self_float(ctx, argv);
    ctx.new_int(HashKey::from_float(f).digest() as i64)
}

fn float_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let result = match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => a == b as f64,
        Some(Num::Float(b)) => a == b,
        None => false,
    };
    Ok(ctx.new_bool(result))
}

fn float_compare(
    ctx: &mut Context,
    argv: &[ObjId],
    op: &str,
    cmp: fn(f64, f64) -> bool,
) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => Ok(ctx.new_bool(cmp(a, b as f64))),
        Some(Num::Float(b)) => Ok(ctx.new_bool(cmp(a, b))),
        None => {
            let ty = ctx.heap.get(argv[1]).type_name().to_string();
            Err(ctx.raise(
                ExcKind::TypeError,
                &format!("'{op}' not supported between instances of 'float' and '{ty}'"),
            ))
        }
    }
}

fn float_lt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    float_compare(ctx, argv, "<", |a, b| a < b)
}

fn float_le(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    float_compare(ctx, argv, "<=", |a, b| a <= b)
}

fn float_gt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    float_compare(ctx, argv, ">", |a, b| a > b)
}

fn float_ge(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    float_compare(ctx, argv, ">=", |a, b| a >= b)
}

fn float_pos(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn float_neg(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let f = self_float(ctx, argv);
    ctx.new_float(-f)
}

fn float_add(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "+")?;
    ctx.new_float(a + b)
}

fn float_sub(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "-")?;
    ctx.new_float(a - b)
}

fn float_mul(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "*")?;
    ctx.new_float(a * b)
}

fn float_truediv(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "/")?;
    if b == 0.0 {
        return Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"));
    }
    ctx.new_float(a / b)
}

fn float_floordiv(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "//")?;
    if b == 0.0 {
        return Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"));
    }
    ctx.new_float((a / b).floor())
}

fn float_mod(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "%")?;
    if b == 0.0 {
        return Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"));
    }
    ctx.new_float(floor_mod_f64(a, b))
}

fn float_pow(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_float(ctx, argv);
    let b = rhs_num(ctx, argv, "**")?;
    if a == 0.0 && b < 0.0 {
        return Err(ctx.raise(
            ExcKind::ZeroDivisionError,
            "0.0 cannot be raised to a negative power",
        ));
    }
    ctx.new_float(a.powf(b))
}
