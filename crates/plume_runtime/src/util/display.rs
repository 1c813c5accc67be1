//! Default string rendering for builtin payloads.
//!
//! Used by the `__str__` implementations of the container types and by
//! `print`. Self-referential containers render as `[...]`, `(...)`, or
//! `{...}` instead of recursing forever.

use plume_core::ObjId;

use crate::core::value::Payload;
use crate::Context;

pub(crate) fn display_value(ctx: &Context, v: ObjId) -> String {
    let mut seen: Vec<ObjId> = Vec::new();
    display_inner(ctx, v, &mut seen)
}

fn display_inner(ctx: &Context, v: ObjId, seen: &mut Vec<ObjId>) -> String {
    match &ctx.heap.get(v).payload {
        Payload::None => "None".to_string(),
        Payload::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Payload::Int(i) => i.to_string(),
        Payload::Float(f) => float_repr(*f),
        Payload::Str(s) => s.clone(),
        Payload::Tuple(items) => {
            if seen.contains(&v) {
                return "(...)".to_string();
            }
            seen.push(v);
            let parts: Vec<String> = items.iter().map(|&e| display_inner(ctx, e, seen)).collect();
            seen.pop();
            if parts.len() == 1 {
                format!("({},)", parts[0])
            } else {
                format!("({})", parts.join(", "))
            }
        }
        Payload::List(items) => {
            if seen.contains(&v) {
                return "[...]".to_string();
            }
            seen.push(v);
            let parts: Vec<String> = items.iter().map(|&e| display_inner(ctx, e, seen)).collect();
            seen.pop();
            format!("[{}]", parts.join(", "))
        }
        Payload::Map(map) => {
            if seen.contains(&v) {
                return "{...}".to_string();
            }
            seen.push(v);
            let parts: Vec<String> = map
                .values()
                .map(|e| {
                    format!(
                        "{}: {}",
                        display_inner(ctx, e.key, seen),
                        display_inner(ctx, e.value, seen)
                    )
                })
                .collect();
            seen.pop();
            format!("{{{}}}", parts.join(", "))
        }
        Payload::Set(set) => {
            if set.is_empty() {
                return "set()".to_string();
            }
            if seen.contains(&v) {
                return "{...}".to_string();
            }
            seen.push(v);
            let parts: Vec<String> = set.values().map(|&e| display_inner(ctx, e, seen)).collect();
            seen.pop();
            format!("{{{}}}", parts.join(", "))
        }
        Payload::Func(f) => format!("<function {}>", f.pretty_name),
        Payload::Class(c) => format!("<class '{}'>", c.name),
        Payload::Instance(name) => format!("<{name} object>"),
        Payload::Userdata(u) => format!("<{} userdata>", u.tag),
    }
}

/// Round-trippable float rendering; integral values keep a trailing `.0`.
pub(crate) fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e16 {
        return format!("{f:.1}");
    }
    format!("{f}")
}

#[cfg(test)]
mod tests {
    use super::float_repr;

    #[test]
    fn integral_floats_keep_a_decimal_point() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(-3.0), "-3.0");
        assert_eq!(float_repr(0.0), "0.0");
    }

    #[test]
    fn fractional_floats_round_trip() {
        for &f in &[0.1, 1.5, -2.25, 3.141592653589793, 1e300, 5e-324] {
            assert_eq!(float_repr(f).parse::<f64>().unwrap(), f);
        }
    }

    #[test]
    fn special_values_have_names() {
        assert_eq!(float_repr(f64::NAN), "nan");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-inf");
    }
}
