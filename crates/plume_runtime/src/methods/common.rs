//! Shared helpers for native method implementations.

use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::{ExcKind, Raised};
use crate::{Context, UnitResult};

pub(crate) fn expect_argc(ctx: &mut Context, argv: &[ObjId], n: usize) -> UnitResult {
    if argv.len() != n {
        return Err(ctx.raise_argument_count_error(argv.len(), Some(n)));
    }
    Ok(())
}

pub(crate) fn expect_argc_range(
    ctx: &mut Context,
    argv: &[ObjId],
    min: usize,
    max: usize,
) -> UnitResult {
    if argv.len() < min || argv.len() > max {
        return Err(ctx.raise_argument_count_error(argv.len(), None));
    }
    Ok(())
}

fn argument_type_error(ctx: &mut Context, argv: &[ObjId], i: usize, expected: &str) -> Raised {
    let got = ctx.heap.get(argv[i]).type_name().to_string();
    ctx.raise(
        ExcKind::TypeError,
        &format!("argument {} expected type {expected} but got {got}", i + 1),
    )
}

pub(crate) fn arg_int(ctx: &mut Context, argv: &[ObjId], i: usize) -> Result<i64, Raised> {
    match ctx.heap.get(argv[i]).payload {
        Payload::Int(v) => Ok(v),
        _ => Err(argument_type_error(ctx, argv, i, "int")),
    }
}

pub(crate) fn arg_num(ctx: &mut Context, argv: &[ObjId], i: usize) -> Result<f64, Raised> {
    match ctx.heap.get(argv[i]).payload {
        Payload::Int(v) => Ok(v as f64),
        Payload::Float(v) => Ok(v),
        _ => Err(argument_type_error(ctx, argv, i, "int or float")),
    }
}

pub(crate) fn arg_str(ctx: &mut Context, argv: &[ObjId], i: usize) -> Result<String, Raised> {
    match &ctx.heap.get(argv[i]).payload {
        Payload::Str(s) => Ok(s.clone()),
        _ => Err(argument_type_error(ctx, argv, i, "str")),
    }
}

/// Resolve a possibly-negative index against `len`; None when out of range.
pub(crate) fn norm_index(index: i64, len: usize) -> Option<usize> {
    let idx = if index < 0 {
        index + len as i64
    } else {
        index
    };
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}

/// Structural equality used by container methods: numeric values compare
/// across int/float, sequences compare elementwise, everything else
/// compares by identity.
pub(crate) fn values_equal(ctx: &Context, a: ObjId, b: ObjId) -> bool {
    if a == b {
        return true;
    }
    enum Shape {
        Bool(bool),
        Num(f64),
        Str,
        NoneV,
        Seq(Vec<ObjId>),
        Other,
    }
    let shape_of = |v: ObjId| match &ctx.heap.get(v).payload {
        Payload::None => Shape::NoneV,
        Payload::Bool(x) => Shape::Bool(*x),
        Payload::Int(x) => Shape::Num(*x as f64),
        Payload::Float(x) => Shape::Num(*x),
        Payload::Str(_) => Shape::Str,
        Payload::Tuple(items) => Shape::Seq(items.clone()),
        Payload::List(items) => Shape::Seq(items.clone()),
        Payload::Map(_)
        | Payload::Set(_)
        | Payload::Func(_)
        | Payload::Class(_)
        | Payload::Instance(_)
        | Payload::Userdata(_) => Shape::Other,
    };
    match (shape_of(a), shape_of(b)) {
        (Shape::NoneV, Shape::NoneV) => true,
        (Shape::Bool(x), Shape::Bool(y)) => x == y,
        (Shape::Num(x), Shape::Num(y)) => x == y,
        (Shape::Str, Shape::Str) => {
            let (Payload::Str(x), Payload::Str(y)) =
                (&ctx.heap.get(a).payload, &ctx.heap.get(b).payload)
            else {
                return false;
            };
            x == y
        }
        (Shape::Seq(x), Shape::Seq(y)) => {
            // Tuples and lists do not compare equal to each other.
            let same_kind = matches!(
                (&ctx.heap.get(a).payload, &ctx.heap.get(b).payload),
                (Payload::Tuple(_), Payload::Tuple(_)) | (Payload::List(_), Payload::List(_))
            );
            same_kind
                && x.len() == y.len()
                && x.iter().zip(&y).all(|(&ea, &eb)| values_equal(ctx, ea, eb))
        }
        _ => false,
    }
}
