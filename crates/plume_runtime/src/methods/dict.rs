//! Map (dict) methods. Keys must be hashable; iteration follows insertion
//! order, and re-assigning an existing key keeps its original slot.

use plume_core::ObjId;

use crate::core::value::{MapEntry, Payload};
use crate::exceptions::ExcKind;
use crate::methods::common::{expect_argc, expect_argc_range};
use crate::util::display::display_value;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__len__", dict_len)?;
    ctx.bind_method(class, "__getitem__", dict_getitem)?;
    ctx.bind_method(class, "__setitem__", dict_setitem)?;
    ctx.bind_method(class, "__contains__", dict_contains)?;
    ctx.bind_method(class, "__str__", dict_str)?;
    ctx.bind_method(class, "__iter__", dict_iter)?;
    ctx.bind_method(class, "__nonzero__", dict_nonzero)?;
    ctx.bind_method(class, "get", dict_get)?;
    ctx.bind_method(class, "keys", dict_keys)?;
    ctx.bind_method(class, "values", dict_values)?;
    ctx.bind_method(class, "items", dict_items)?;
    ctx.bind_method(class, "pop", dict_pop)?;
    ctx.bind_method(class, "clear", dict_clear)?;
    Ok(())
}

fn self_len(ctx: &Context, argv: &[ObjId]) -> usize {
    ctx.map_ref(argv[0]).map(|m| m.len()).unwrap_or(0)
}

fn missing_key(ctx: &mut Context, key: ObjId) -> crate::Raised {
    let shown = display_value(ctx, key);
    ctx.raise(ExcKind::KeyError, &shown)
}

fn dict_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    ctx.new_int(n as i64)
}

fn dict_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    Ok(ctx.new_bool(n != 0))
}

fn dict_getitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    match ctx.map_ref(argv[0]).and_then(|m| m.get(&key)) {
        Some(entry) => Ok(entry.value),
        None => Err(missing_key(ctx, argv[1])),
    }
}

fn dict_setitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 3)?;
    let key = ctx.hash_key(argv[1])?;
    let len = self_len(ctx, argv);
    ctx.check_collection_size(len + 1)?;
    let entry = MapEntry {
        key: argv[1],
        value: argv[2],
    };
    if let Payload::Map(m) = &mut ctx.heap.get_mut(argv[0]).payload {
        m.insert(key, entry);
    }
    Ok(ctx.none())
}

fn dict_contains(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let key = ctx.hash_key(argv[1])?;
    let found = ctx.map_ref(argv[0]).is_some_and(|m| m.contains_key(&key));
    Ok(ctx.new_bool(found))
}

fn dict_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = display_value(ctx, argv[0]);
    ctx.new_str(&s)
}

/// Iterating a dict yields its keys, in insertion order.
fn dict_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let keys: Vec<ObjId> = ctx
        .map_ref(argv[0])
        .map(|m| m.values().map(|e| e.key).collect())
        .unwrap_or_default();
    let list = ctx.new_list(&keys)?;
    ctx.protect(list);
    let iter = crate::builtins::new_seq_iter(ctx, list);
    ctx.unprotect(list);
    iter
}

fn dict_get(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 2, 3)?;
    let key = ctx.hash_key(argv[1])?;
    match ctx.map_ref(argv[0]).and_then(|m| m.get(&key)) {
        Some(entry) => Ok(entry.value),
        None if argv.len() == 3 => Ok(argv[2]),
        None => Ok(ctx.none()),
    }
}

fn dict_keys(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let keys: Vec<ObjId> = ctx
        .map_ref(argv[0])
        .map(|m| m.values().map(|e| e.key).collect())
        .unwrap_or_default();
    ctx.new_list(&keys)
}

fn dict_values(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let values: Vec<ObjId> = ctx
        .map_ref(argv[0])
        .map(|m| m.values().map(|e| e.value).collect())
        .unwrap_or_default();
    ctx.new_list(&values)
}

fn dict_items(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let entries: Vec<(ObjId, ObjId)> = ctx
        .map_ref(argv[0])
        .map(|m| m.values().map(|e| (e.key, e.value)).collect())
        .unwrap_or_default();
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let pair = ctx.new_tuple(&[k, v])?;
        ctx.protect(pair);
        pairs.push(pair);
    }
    let list = ctx.new_list(&pairs);
    for &p in &pairs {
        ctx.unprotect(p);
    }
    list
}

fn dict_pop(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 2, 3)?;
    let key = ctx.hash_key(argv[1])?;
    let removed = match &mut ctx.heap.get_mut(argv[0]).payload {
        // shift_remove keeps the remaining entries in insertion order.
        Payload::Map(m) => m.shift_remove(&key),
        _ => None,
    };
    match removed {
        Some(entry) => Ok(entry.value),
        None if argv.len() == 3 => Ok(argv[2]),
        None => Err(missing_key(ctx, argv[1])),
    }
}

fn dict_clear(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    if let Payload::Map(m) = &mut ctx.heap.get_mut(argv[0]).payload {
        m.clear();
    }
    Ok(ctx.none())
}
