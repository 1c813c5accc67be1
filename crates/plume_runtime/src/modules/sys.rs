//! The `sys` module: argv, exit, isatty.

use plume_core::ObjId;

use crate::exceptions::ExcKind;
use crate::methods::common::{expect_argc_range, arg_str};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn load(ctx: &mut Context) -> UnitResult {
    let argv = ctx.argv.expect("argv is initialized at context creation");
    ctx.set_global("argv", argv);
    let isatty = ctx.new_bool(ctx.config.isatty);
    ctx.set_global("isatty", isatty);
    let exit = ctx.new_function("exit", sys_exit)?;
    ctx.set_global("exit", exit);
    Ok(())
}

fn sys_exit(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 0, 1)?;
    let message = if argv.is_empty() {
        String::new()
    } else {
        arg_str(ctx, argv, 0)?
    };
    Err(ctx.raise(ExcKind::SystemExit, &message))
}
