//! The `os` module. Registered only when the host enables OS access.

use plume_core::ObjId;

use crate::exceptions::ExcKind;
use crate::methods::common::{arg_str, expect_argc};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn load(ctx: &mut Context) -> UnitResult {
    for (name, fun) in [
        ("getcwd", os_getcwd as crate::NativeFn),
        ("exists", os_exists),
        ("read_file", os_read_file),
    ] {
        let f = ctx.new_function(name, fun)?;
        ctx.set_global(name, f);
    }
    Ok(())
}

fn os_getcwd(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 0)?;
    match std::env::current_dir() {
        Ok(path) => {
            let path = path.to_string_lossy().to_string();
            ctx.new_str(&path)
        }
        Err(e) => {
            let msg = e.to_string();
            Err(ctx.raise(ExcKind::OsError, &msg))
        }
    }
}

fn os_exists(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let path = arg_str(ctx, argv, 0)?;
    Ok(ctx.new_bool(ctx.caps.fs.exists(&path)))
}

fn os_read_file(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let path = arg_str(ctx, argv, 0)?;
    if ctx.caps.fs.is_dir(&path) {
        return Err(ctx.raise(
            ExcKind::IsADirectoryError,
            &format!("is a directory: '{path}'"),
        ));
    }
    match ctx.caps.fs.read_to_string(&path) {
        Ok(content) => ctx.new_str(&content),
        Err(e) => Err(ctx.raise(ExcKind::OsError, &e)),
    }
}
