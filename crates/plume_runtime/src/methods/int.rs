//! Integer dunders. Floored division semantics: `a % b` takes the sign of
//! `b` and `a // b` is the floor of the true quotient. Mixed int/float
//! arithmetic promotes to float. Shift counts must be non-negative and are
//! clamped to the word width.

use plume_core::{HashKey, ObjId};

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::expect_argc;
use crate::{Context, OpResult, Raised, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__nonzero__", int_nonzero)?;
    ctx.bind_method(class, "__int__", int_int)?;
    ctx.bind_method(class, "__float__", int_float)?;
    ctx.bind_method(class, "__str__", int_str)?;
    ctx.bind_method(class, "__hash__", int_hash)?;
    ctx.bind_method(class, "__eq__", int_eq)?;
    ctx.bind_method(class, "__lt__", int_lt)?;
    ctx.bind_method(class, "__le__", int_le)?;
    ctx.bind_method(class, "__gt__", int_gt)?;
    ctx.bind_method(class, "__ge__", int_ge)?;
    ctx.bind_method(class, "__pos__", int_pos)?;
    ctx.bind_method(class, "__neg__", int_neg)?;
    ctx.bind_method(class, "__invert__", int_invert)?;
    ctx.bind_method(class, "__add__", int_add)?;
    ctx.bind_method(class, "__sub__", int_sub)?;
    ctx.bind_method(class, "__mul__", int_mul)?;
    ctx.bind_method(class, "__truediv__", int_truediv)?;
    ctx.bind_method(class, "__floordiv__", int_floordiv)?;
    ctx.bind_method(class, "__mod__", int_mod)?;
    ctx.bind_method(class, "__pow__", int_pow)?;
    ctx.bind_method(class, "__and__", int_bitand)?;
    ctx.bind_method(class, "__or__", int_bitor)?;
    ctx.bind_method(class, "__xor__", int_bitxor)?;
    ctx.bind_method(class, "__lshift__", int_shl)?;
    ctx.bind_method(class, "__rshift__", int_shr)?;
    Ok(())
}

#[derive(Clone, Copy)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

pub(crate) fn num_of(ctx: &Context, v: ObjId) -> Option<Num> {
    match ctx.heap.get(v).payload {
        Payload::Int(i) => Some(Num::Int(i)),
        Payload::Float(f) => Some(Num::Float(f)),
        _ => None,
    }
}

fn self_int(ctx: &Context, argv: &[ObjId]) -> i64 {
    match ctx.heap.get(argv[0]).payload {
        Payload::Int(i) => i,
        _ => 0,
    }
}

fn operand_error(ctx: &mut Context, op: &str, rhs: ObjId) -> Raised {
    let ty = ctx.heap.get(rhs).type_name().to_string();
    ctx.raise(
        ExcKind::TypeError,
        &format!("unsupported operand type(s) for {op}: 'int' and '{ty}'"),
    )
}

/// Floored quotient: rounds toward negative infinity.
pub(crate) fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Floored remainder: takes the sign of the divisor.
pub(crate) fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

pub(crate) fn floor_mod_f64(a: f64, b: f64) -> f64 {
    a - b * (a / b).floor()
}

fn int_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    Ok(ctx.new_bool(i != 0))
}

fn int_int(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn int_float(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    ctx.new_float(i as f64)
}

fn int_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    ctx.new_str(&i.to_string())
}

fn int_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    ctx.new_int(HashKey::Int(i).digest() as i64)
}

fn int_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    let result = match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => a == b,
        Some(Num::Float(b)) => a as f64 == b,
        None => false,
    };
    Ok(ctx.new_bool(result))
}

fn int_compare(
    ctx: &mut Context,
    argv: &[ObjId],
    op: &str,
    cmp: fn(f64, f64) -> bool,
) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv) as f64;
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => Ok(ctx.new_bool(cmp(a, b as f64))),
        Some(Num::Float(b)) => Ok(ctx.new_bool(cmp(a, b))),
        None => {
            let ty = ctx.heap.get(argv[1]).type_name().to_string();
            Err(ctx.raise(
                ExcKind::TypeError,
                &format!("'{op}' not supported between instances of 'int' and '{ty}'"),
            ))
        }
    }
}

fn int_lt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_compare(ctx, argv, "<", |a, b| a < b)
}

fn int_le(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_compare(ctx, argv, "<=", |a, b| a <= b)
}

fn int_gt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_compare(ctx, argv, ">", |a, b| a > b)
}

fn int_ge(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_compare(ctx, argv, ">=", |a, b| a >= b)
}

fn int_pos(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn int_neg(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    match i.checked_neg() {
        Some(n) => ctx.new_int(n),
        None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
    }
}

fn int_invert(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let i = self_int(ctx, argv);
    ctx.new_int(!i)
}

fn int_add(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => match a.checked_add(b) {
            Some(n) => ctx.new_int(n),
            None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
        },
        Some(Num::Float(b)) => ctx.new_float(a as f64 + b),
        None => Err(operand_error(ctx, "+", argv[1])),
    }
}

fn int_sub(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => match a.checked_sub(b) {
            Some(n) => ctx.new_int(n),
            None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
        },
        Some(Num::Float(b)) => ctx.new_float(a as f64 - b),
        None => Err(operand_error(ctx, "-", argv[1])),
    }
}

fn int_mul(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => match a.checked_mul(b) {
            Some(n) => ctx.new_int(n),
            None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
        },
        Some(Num::Float(b)) => ctx.new_float(a as f64 * b),
        None => Err(operand_error(ctx, "*", argv[1])),
    }
}

fn int_truediv(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    let b = match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) => b as f64,
        Some(Num::Float(b)) => b,
        None => return Err(operand_error(ctx, "/", argv[1])),
    };
    if b == 0.0 {
        return Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"));
    }
    ctx.new_float(a as f64 / b)
}

fn int_floordiv(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(0)) => Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero")),
        Some(Num::Int(b)) => ctx.new_int(floor_div_i64(a, b)),
        Some(Num::Float(b)) if b == 0.0 => {
            Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"))
        }
        Some(Num::Float(b)) => ctx.new_float((a as f64 / b).floor()),
        None => Err(operand_error(ctx, "//", argv[1])),
    }
}

fn int_mod(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(0)) => Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero")),
        Some(Num::Int(b)) => ctx.new_int(floor_mod_i64(a, b)),
        Some(Num::Float(b)) if b == 0.0 => {
            Err(ctx.raise(ExcKind::ZeroDivisionError, "division by zero"))
        }
        Some(Num::Float(b)) => ctx.new_float(floor_mod_f64(a as f64, b)),
        None => Err(operand_error(ctx, "%", argv[1])),
    }
}

fn int_pow(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match num_of(ctx, argv[1]) {
        Some(Num::Int(b)) if b >= 0 => {
            let exp = u32::try_from(b)
                .map_err(|_| ctx.raise(ExcKind::OverflowError, "integer overflow"))?;
            match a.checked_pow(exp) {
                Some(n) => ctx.new_int(n),
                None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
            }
        }
        Some(Num::Int(b)) => {
            if a == 0 {
                return Err(ctx.raise(
                    ExcKind::ZeroDivisionError,
                    "0 cannot be raised to a negative power",
                ));
            }
            ctx.new_float((a as f64).powf(b as f64))
        }
        Some(Num::Float(b)) => {
            if a == 0 && b < 0.0 {
                return Err(ctx.raise(
                    ExcKind::ZeroDivisionError,
                    "0 cannot be raised to a negative power",
                ));
            }
            ctx.new_float((a as f64).powf(b))
        }
        None => Err(operand_error(ctx, "**", argv[1])),
    }
}

fn int_bitwise(
    ctx: &mut Context,
    argv: &[ObjId],
    op: &str,
    apply: fn(i64, i64) -> i64,
) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    match ctx.heap.get(argv[1]).payload {
        Payload::Int(b) => ctx.new_int(apply(a, b)),
        _ => Err(operand_error(ctx, op, argv[1])),
    }
}

fn int_bitand(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_bitwise(ctx, argv, "&", |a, b| a & b)
}

fn int_bitor(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_bitwise(ctx, argv, "|", |a, b| a | b)
}

fn int_bitxor(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    int_bitwise(ctx, argv, "^", |a, b| a ^ b)
}

/// Shift amounts are clamped to the 64-bit word width.
fn shift_amount(ctx: &mut Context, argv: &[ObjId], op: &str) -> Result<u32, Raised> {
    match ctx.heap.get(argv[1]).payload {
        Payload::Int(b) if b < 0 => Err(ctx.raise(ExcKind::ValueError, "negative shift count")),
        Payload::Int(b) => Ok(b.min(64) as u32),
        _ => Err(operand_error(ctx, op, argv[1])),
    }
}

fn int_shl(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    let amount = shift_amount(ctx, argv, "<<")?;
    let result = if amount >= 64 {
        0
    } else {
        ((a as u64) << amount) as i64
    };
    ctx.new_int(result)
}

fn int_shr(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_int(ctx, argv);
    let amount = shift_amount(ctx, argv, ">>")?;
    let result = if amount >= 64 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else {
        a >> amount
    };
    ctx.new_int(result)
}
