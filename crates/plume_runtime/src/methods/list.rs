use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::{arg_int, expect_argc, expect_argc_range, norm_index, values_equal};
use crate::util::display::display_value;
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__len__", list_len)?;
    ctx.bind_method(class, "__getitem__", list_getitem)?;
    ctx.bind_method(class, "__setitem__", list_setitem)?;
    ctx.bind_method(class, "__eq__", list_eq)?;
    ctx.bind_method(class, "__contains__", list_contains)?;
    ctx.bind_method(class, "__str__", list_str)?;
    ctx.bind_method(class, "__iter__", list_iter)?;
    ctx.bind_method(class, "__nonzero__", list_nonzero)?;
    ctx.bind_method(class, "append", list_append)?;
    ctx.bind_method(class, "insert", list_insert)?;
    ctx.bind_method(class, "pop", list_pop)?;
    ctx.bind_method(class, "remove", list_remove)?;
    ctx.bind_method(class, "extend", list_extend)?;
    ctx.bind_method(class, "clear", list_clear)?;
    ctx.bind_method(class, "index", list_index)?;
    ctx.bind_method(class, "reverse", list_reverse)?;
    Ok(())
}

fn self_len(ctx: &Context, argv: &[ObjId]) -> usize {
    match &ctx.heap.get(argv[0]).payload {
        Payload::List(items) => items.len(),
        _ => 0,
    }
}

fn self_items(ctx: &Context, argv: &[ObjId]) -> Vec<ObjId> {
    match &ctx.heap.get(argv[0]).payload {
        Payload::List(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn list_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    ctx.new_int(n as i64)
}

fn list_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = self_len(ctx, argv);
    Ok(ctx.new_bool(n != 0))
}

fn list_getitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let index = arg_int(ctx, argv, 1)?;
    let items = self_items(ctx, argv);
    match norm_index(index, items.len()) {
        Some(i) => Ok(items[i]),
        None => Err(ctx.raise(ExcKind::IndexError, "list index out of range")),
    }
}

fn list_setitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 3)?;
    let index = arg_int(ctx, argv, 1)?;
    let len = self_len(ctx, argv);
    let Some(i) = norm_index(index, len) else {
        return Err(ctx.raise(ExcKind::IndexError, "list assignment index out of range"));
    };
    let value = argv[2];
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items[i] = value;
    }
    Ok(ctx.none())
}

fn list_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    Ok(ctx.new_bool(values_equal(ctx, argv[0], argv[1])))
}

fn list_contains(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let found = self_items(ctx, argv)
        .iter()
        .any(|&item| values_equal(ctx, item, argv[1]));
    Ok(ctx.new_bool(found))
}

fn list_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = display_value(ctx, argv[0]);
    ctx.new_str(&s)
}

fn list_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    crate::builtins::new_seq_iter(ctx, argv[0])
}

fn list_append(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let len = self_len(ctx, argv);
    ctx.check_collection_size(len + 1)?;
    let value = argv[1];
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items.push(value);
    }
    Ok(ctx.none())
}

fn list_insert(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 3)?;
    let index = arg_int(ctx, argv, 1)?;
    let len = self_len(ctx, argv);
    ctx.check_collection_size(len + 1)?;
    // Out-of-range insert positions clamp to the ends.
    let i = if index < 0 {
        (index + len as i64).max(0) as usize
    } else {
        (index as usize).min(len)
    };
    let value = argv[2];
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items.insert(i, value);
    }
    Ok(ctx.none())
}

fn list_pop(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, 2)?;
    let len = self_len(ctx, argv);
    let index = if argv.len() == 2 {
        arg_int(ctx, argv, 1)?
    } else {
        -1
    };
    let Some(i) = norm_index(index, len) else {
        return Err(ctx.raise(ExcKind::IndexError, "pop index out of range"));
    };
    let removed = match &mut ctx.heap.get_mut(argv[0]).payload {
        Payload::List(items) => items.remove(i),
        _ => return Err(ctx.raise(ExcKind::TypeError, "pop() requires a list")),
    };
    Ok(removed)
}

fn list_remove(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let items = self_items(ctx, argv);
    let Some(i) = items.iter().position(|&item| values_equal(ctx, item, argv[1])) else {
        return Err(ctx.raise(ExcKind::ValueError, "value not in list"));
    };
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items.remove(i);
    }
    Ok(ctx.none())
}

fn list_extend(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let receiver = argv[0];
    let max = ctx.config.max_collection_size;
    ctx.iterate(argv[1], |ctx, item| {
        let len = match &ctx.heap.get(receiver).payload {
            Payload::List(items) => items.len(),
            _ => 0,
        };
        if len + 1 > max {
            return Err(ctx.raise(ExcKind::MemoryError, "collection size limit exceeded"));
        }
        if let Payload::List(items) = &mut ctx.heap.get_mut(receiver).payload {
            items.push(item);
        }
        Ok(true)
    })?;
    Ok(ctx.none())
}

fn list_clear(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items.clear();
    }
    Ok(ctx.none())
}

fn list_index(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let items = self_items(ctx, argv);
    match items.iter().position(|&item| values_equal(ctx, item, argv[1])) {
        Some(i) => ctx.new_int(i as i64),
        None => Err(ctx.raise(ExcKind::ValueError, "value not in list")),
    }
}

fn list_reverse(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    if let Payload::List(items) = &mut ctx.heap.get_mut(argv[0]).payload {
        items.reverse();
    }
    Ok(ctx.none())
}
