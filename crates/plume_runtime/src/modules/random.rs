//! The `random` module, backed by the injectable `RngAlgorithm` capability.

use plume_core::ObjId;

use crate::exceptions::ExcKind;
use crate::methods::common::{arg_int, expect_argc};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn load(ctx: &mut Context) -> UnitResult {
    for (name, fun) in [
        ("seed", random_seed as crate::NativeFn),
        ("random", random_random),
        ("randint", random_randint),
    ] {
        let f = ctx.new_function(name, fun)?;
        ctx.set_global(name, f);
    }
    Ok(())
}

fn random_seed(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let seed = arg_int(ctx, argv, 0)?;
    ctx.set_rng_seed(seed as u64);
    Ok(ctx.none())
}

fn random_random(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    let bits = ctx.rng_next_u64() >> 11;
    ctx.new_float(bits as f64 / (1u64 << 53) as f64)
}

fn random_randint(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let lo = arg_int(ctx, argv, 0)?;
    let hi = arg_int(ctx, argv, 1)?;
    if lo > hi {
        return Err(ctx.raise(ExcKind::ValueError, "empty range for randint()"));
    }
    let span = (hi - lo) as u64 + 1;
    let value = lo + (ctx.rng_next_u64() % span) as i64;
    ctx.new_int(value)
}
