use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::expect_argc;
use crate::util::display::display_value;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__len__", set_len)?;
    ctx.bind_method(class, "__contains__", set_contains)?;
    ctx.bind_method(class, "__str__", set_str)?;
    ctx.bind_method(class, "__iter__", set_iter)?;
    ctx.bind_method(class, "__nonzero__", set_nonzero)?;
    ctx.bind_method(class, "add", set_add)?;
    ctx.bind_method(class, "remove", set_remove)?;
    ctx.bind_method(class, "discard", set_discard)?;
    Ok(())
}

fn self_len(ctx: &Context, argv: &[ObjId]) -> usize {
    ctx.set_ref(argv[0]).map(|s| s.len()).unwrap_or(0)
}

fn set_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    ctx.new_int(n as i64)
}

fn set_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    Ok(ctx.new_bool(n != 0))
}

fn set_contains(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    let found = ctx.set_ref(argv[0]).is_some_and(|s| s.contains_key(&key));
    Ok(ctx.new_bool(found))
}

fn set_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = display_value(ctx, argv[0]);
    ctx.new_str(&s)
}

fn set_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let elems: Vec<ObjId> = ctx
        .set_ref(argv[0])
        .map(|s| s.values().copied().collect())
        .unwrap_or_default();
    let list = ctx.new_list(&elems)?;
    ctx.protect(list);
    let iter = crate::builtins::new_seq_iter(ctx, list);
    ctx.unprotect(list);
    iter
}

fn set_add(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    let len = self_len(ctx, argv);
    ctx.check_collection_size(len + 1)?;
    if let Payload::Set(s) = &mut ctx.heap.get_mut(argv[0]).payload {
        s.entry(key).or_insert(argv[1]);
    }
    Ok(ctx.none())
}

fn set_remove(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    let removed = match &mut ctx.heap.get_mut(argv[0]).payload {
        Payload::Set(s) => s.shift_remove(&key),
        _ => None,
    };
    match removed {
        Some(_) => Ok(ctx.none()),
        None => {
            let shown = display_value(ctx, argv[1]);
            Err(ctx.raise(ExcKind::KeyError, &shown))
        }
    }
}

fn set_discard(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    if let Payload::Set(s) = &mut ctx.heap.get_mut(argv[0]).payload {
        s.shift_remove(&key);
    }
    Ok(ctx.none())
}
