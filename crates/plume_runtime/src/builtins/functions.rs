//! Free builtin functions registered into the `__builtins__` module.

use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::{expect_argc, expect_argc_range};
use crate::{Context, OpResult};

pub(crate) fn builtin_print(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    let mut parts: Vec<String> = Vec::with_capacity(argv.len());
    for &arg in argv {
        let s = ctx.convert_str(arg)?;
        parts.push(ctx.get_str(s).unwrap_or_default().to_string());
    }
    let mut line = parts.join(" ");
    line.push('\n');
    ctx.emit(&line);
    Ok(ctx.none())
}

pub(crate) fn builtin_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    ctx.convert_len(argv[0])
}

pub(crate) fn builtin_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    ctx.convert_hash(argv[0])
}

pub(crate) fn builtin_repr(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    ctx.convert_repr(argv[0])
}

pub(crate) fn builtin_abs(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    match ctx.heap.get(argv[0]).payload {
        Payload::Int(i) => match i.checked_abs() {
            Some(n) => ctx.new_int(n),
            None => Err(ctx.raise(ExcKind::OverflowError, "integer overflow")),
        },
        Payload::Float(f) => ctx.new_float(f.abs()),
        _ => {
            let ty = ctx.heap.get(argv[0]).type_name().to_string();
            Err(ctx.raise(
                ExcKind::TypeError,
                &format!("abs() expected int or float, got {ty}"),
            ))
        }
    }
}

pub(crate) fn builtin_isinstance(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let classes: Vec<ObjId> = match &ctx.heap.get(argv[1]).payload {
        Payload::Class(_) => vec![argv[1]],
        Payload::Tuple(items) => items.clone(),
        _ => {
            return Err(ctx.raise(
                ExcKind::TypeError,
                "isinstance() arg 2 must be a class or tuple of classes",
            ));
        }
    };
    for &class in &classes {
        if !ctx.is_class(class) {
            return Err(ctx.raise(
                ExcKind::TypeError,
                "isinstance() arg 2 must be a class or tuple of classes",
            ));
        }
    }
    Ok(ctx.new_bool(ctx.is_instance(argv[0], &classes).is_some()))
}

pub(crate) fn builtin_min(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, usize::MAX)?;
    reduce_extreme(ctx, argv, crate::op_dispatch::BinOp::Lt)
}

pub(crate) fn builtin_max(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, usize::MAX)?;
    reduce_extreme(ctx, argv, crate::op_dispatch::BinOp::Gt)
}

fn reduce_extreme(ctx: &mut Context, argv: &[ObjId], op: crate::op_dispatch::BinOp) -> OpResult {
    let mut best = argv[0];
    for &candidate in &argv[1..] {
        let wins = ctx.binary_op(op, candidate, best)?;
        if ctx.get_bool(wins).unwrap_or(false) {
            best = candidate;
        }
    }
    Ok(best)
}
