//! String dunders and convenience methods. Indexing and length are in
//! characters, not bytes. Replication with a non-positive count yields the
//! empty string.

use plume_core::{HashKey, ObjId};

use crate::core::value::Payload;
use crate::exceptions::ExcKind;
use crate::methods::common::{arg_int, arg_str, expect_argc, expect_argc_range, norm_index};
use crate::{Context, OpResult, UnitResult};

pub(crate) fn install(ctx: &mut Context, class: ObjId) -> UnitResult {
    ctx.bind_method(class, "__nonzero__", str_nonzero)?;
    ctx.bind_method(class, "__int__", str_int)?;
    ctx.bind_method(class, "__float__", str_float)?;
    ctx.bind_method(class, "__str__", str_str)?;
    ctx.bind_method(class, "__hash__", str_hash)?;
    ctx.bind_method(class, "__eq__", str_eq)?;
    ctx.bind_method(class, "__lt__", str_lt)?;
    ctx.bind_method(class, "__le__", str_le)?;
    ctx.bind_method(class, "__gt__", str_gt)?;
    ctx.bind_method(class, "__ge__", str_ge)?;
    ctx.bind_method(class, "__add__", str_add)?;
    ctx.bind_method(class, "__mul__", str_mul)?;
    ctx.bind_method(class, "__len__", str_len)?;
    ctx.bind_method(class, "__getitem__", str_getitem)?;
    ctx.bind_method(class, "__contains__", str_contains)?;
    ctx.bind_method(class, "__iter__", str_iter)?;
    ctx.bind_method(class, "upper", str_upper)?;
    ctx.bind_method(class, "lower", str_lower)?;
    ctx.bind_method(class, "strip", str_strip)?;
    ctx.bind_method(class, "split", str_split)?;
    ctx.bind_method(class, "join", str_join)?;
    ctx.bind_method(class, "find", str_find)?;
    ctx.bind_method(class, "replace", str_replace)?;
    ctx.bind_method(class, "startswith", str_startswith)?;
    ctx.bind_method(class, "endswith", str_endswith)?;
    Ok(())
}

fn self_str(ctx: &Context, argv: &[ObjId]) -> String {
    match &ctx.heap.get(argv[0]).payload {
        Payload::Str(s) => s.clone(),
        _ => String::new(),
    }
}

fn str_nonzero(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let empty = matches!(&ctx.heap.get(argv[0]).payload, Payload::Str(s) if s.is_empty());
    Ok(ctx.new_bool(!empty))
}

fn str_int(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    match s.trim().parse::<i64>() {
        Ok(i) => ctx.new_int(i),
        Err(_) => Err(ctx.raise(
            ExcKind::ValueError,
            &format!("invalid literal for int(): '{s}'"),
        )),
    }
}

fn str_float(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    match s.trim().parse::<f64>() {
        Ok(f) => ctx.new_float(f),
        Err(_) => Err(ctx.raise(
            ExcKind::ValueError,
            &format!("could not convert string to float: '{s}'"),
        )),
    }
}

fn str_str(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    Ok(argv[0])
}

fn str_hash(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    ctx.new_int(HashKey::from_str(&s).digest() as i64)
}

fn str_eq(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let result = match (&ctx.heap.get(argv[0]).payload, &ctx.heap.get(argv[1]).payload) {
        (Payload::Str(a), Payload::Str(b)) => a == b,
        _ => false,
    };
    Ok(ctx.new_bool(result))
}

fn str_compare(
    ctx: &mut Context,
    argv: &[ObjId],
    op: &str,
    cmp: fn(&str, &str) -> bool,
) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let verdict = match (&ctx.heap.get(argv[0]).payload, &ctx.heap.get(argv[1]).payload) {
        (Payload::Str(a), Payload::Str(b)) => Some(cmp(a, b)),
        _ => None,
    };
    match verdict {
        Some(b) => Ok(ctx.new_bool(b)),
        None => {
            let ty = ctx.heap.get(argv[1]).type_name().to_string();
            Err(ctx.raise(
                ExcKind::TypeError,
                &format!("'{op}' not supported between instances of 'str' and '{ty}'"),
            ))
        }
    }
}

fn str_lt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    str_compare(ctx, argv, "<", |a, b| a < b)
}

fn str_le(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    str_compare(ctx, argv, "<=", |a, b| a <= b)
}

fn str_gt(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    str_compare(ctx, argv, ">", |a, b| a > b)
}

fn str_ge(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    str_compare(ctx, argv, ">=", |a, b| a >= b)
}

fn str_add(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let a = self_str(ctx, argv);
    let b = arg_str(ctx, argv, 1)?;
    ctx.new_str(&(a + &b))
}

fn str_mul(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let n = arg_int(ctx, argv, 1)?;
    if n <= 0 {
        return ctx.new_str("");
    }
    let n = n as usize;
    ctx.check_collection_size(s.len().saturating_mul(n))?;
    ctx.new_str(&s.repeat(n))
}

fn str_len(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let n = match &ctx.heap.get(argv[0]).payload {
        Payload::Str(s) => s.chars().count(),
        _ => 0,
    };
    ctx.new_int(n as i64)
}

fn str_getitem(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let index = arg_int(ctx, argv, 1)?;
    let len = s.chars().count();
    match norm_index(index, len).and_then(|i| s.chars().nth(i)) {
        Some(c) => ctx.new_str(&c.to_string()),
        None => Err(ctx.raise(ExcKind::IndexError, "string index out of range")),
    }
}

fn str_contains(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let needle = arg_str(ctx, argv, 1)?;
    Ok(ctx.new_bool(s.contains(&needle)))
}

fn str_iter(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    crate::builtins::new_seq_iter(ctx, argv[0])
}

fn str_upper(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    ctx.new_str(&s.to_uppercase())
}

fn str_lower(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    ctx.new_str(&s.to_lowercase())
}

fn str_strip(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 1)?;
    let s = self_str(ctx, argv);
    ctx.new_str(s.trim())
}

fn str_split(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc_range(ctx, argv, 1, 2)?;
    let s = self_str(ctx, argv);
    let parts: Vec<String> = if argv.len() == 2 {
        let sep = arg_str(ctx, argv, 1)?;
        if sep.is_empty() {
            return Err(ctx.raise(ExcKind::ValueError, "empty separator"));
        }
        s.split(&sep).map(str::to_string).collect()
    } else {
        s.split_whitespace().map(str::to_string).collect()
    };
    let mut items = Vec::with_capacity(parts.len());
    for part in &parts {
        let v = ctx.new_str(part)?;
        ctx.protect(v);
        items.push(v);
    }
    let list = ctx.new_list(&items);
    for &v in &items {
        ctx.unprotect(v);
    }
    list
}

fn str_join(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let sep = self_str(ctx, argv);
    let mut parts: Vec<String> = Vec::new();
    ctx.iterate(argv[1], |ctx, item| {
        match &ctx.heap.get(item).payload {
            Payload::Str(s) => {
                parts.push(s.clone());
                Ok(true)
            }
            _ => {
                let ty = ctx.heap.get(item).type_name().to_string();
                Err(ctx.raise(
                    ExcKind::TypeError,
                    &format!("join() expected str items, got {ty}"),
                ))
            }
        }
    })?;
    ctx.new_str(&parts.join(&sep))
}

fn str_find(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let needle = arg_str(ctx, argv, 1)?;
    match s.find(&needle) {
        Some(byte_pos) => {
            let char_pos = s[..byte_pos].chars().count();
            ctx.new_int(char_pos as i64)
        }
        None => ctx.new_int(-1),
    }
}

fn str_replace(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 3)?;
    let s = self_str(ctx, argv);
    let from = arg_str(ctx, argv, 1)?;
    let to = arg_str(ctx, argv, 2)?;
    if from.is_empty() {
        return Err(ctx.raise(ExcKind::ValueError, "empty pattern"));
    }
    ctx.new_str(&s.replace(&from, &to))
}

fn str_startswith(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let prefix = arg_str(ctx, argv, 1)?;
    Ok(ctx.new_bool(s.starts_with(&prefix)))
}

fn str_endswith(ctx: &mut Context, argv: &[ObjId]) -> OpResult {
    expect_argc(ctx, argv, 2)?;
    let s = self_str(ctx, argv);
    let suffix = arg_str(ctx, argv, 1)?;
    Ok(ctx.new_bool(s.ends_with(&suffix)))
}
