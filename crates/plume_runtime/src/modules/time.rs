//! The `time` module, backed by the injectable `Clock` capability.

use plume_core::ObjId;

use crate::methods::common::{arg_num, expect_argc};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn load(ctx: &mut Context) -> UnitResult {
    for (name, fun) in [
        ("time", time_time as crate::NativeFn),
        ("millis", time_millis),
        ("sleep", time_sleep),
    ] {
        let f = ctx.new_function(name, fun)?;
        ctx.set_global(name, f);
    }
    Ok(())
}

fn time_time(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    let millis = ctx.caps.clock.unix_millis();
    ctx.new_float(millis as f64 / 1000.0)
}

fn time_millis(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    let millis = ctx.caps.clock.unix_millis();
    ctx.new_int(millis)
}

fn time_sleep(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let secs = arg_num(ctx, argv, 0)?;
    if secs > 0.0 {
        ctx.caps.clock.sleep_millis((secs * 1000.0) as u64);
    }
    Ok(ctx.none())
}
