//! Shared helpers for the runtime integration tests.
#![allow(dead_code)]

use plume_runtime::{Context, ObjId};

pub fn int(ctx: &mut Context, v: i64) -> ObjId {
    ctx.new_int(v).expect("int allocation")
}

pub fn float(ctx: &mut Context, v: f64) -> ObjId {
    ctx.new_float(v).expect("float allocation")
}

pub fn s(ctx: &mut Context, v: &str) -> ObjId {
    ctx.new_str(v).expect("str allocation")
}

pub fn as_int(ctx: &Context, v: ObjId) -> i64 {
    ctx.get_int(v).expect("expected an int")
}

pub fn as_bool(ctx: &Context, v: ObjId) -> bool {
    ctx.get_bool(v).expect("expected a bool")
}

pub fn as_str(ctx: &Context, v: ObjId) -> String {
    ctx.get_str(v).expect("expected a str").to_string()
}

/// The class bound to `name` in the current module's globals.
pub fn global_class(ctx: &Context, name: &str) -> ObjId {
    ctx.get_global(name).unwrap_or_else(|| panic!("no global '{name}'"))
}

/// Kind of the currently pending exception, by builtin class name.
pub fn pending_kind(ctx: &Context, name: &str) -> bool {
    let Some(exc) = ctx.current_exception() else {
        return false;
    };
    let class = global_class(ctx, name);
    ctx.is_instance(exc, &[class]).is_some()
}
