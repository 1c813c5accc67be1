use plume_core::ObjId;

use crate::core::value::Payload;
use crate::methods::common::expect_argc;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__str__", function_str)?;
    Ok(())
}

fn function_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let name = match &ctx.heap.get(argv[0]).payload {
        Payload::Func(f) => f.pretty_name.clone(),
        _ => String::new(),
    };
    ctx.new_str(&format!("<function {name}>"))
}
