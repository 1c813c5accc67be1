//! Module registration, imports, the frontend seam, and the os gate.

mod common;

use common::*;
use plume_runtime::{
    Config, Context, Frontend, ObjId, OpResult, UnitResult,
};

fn fixture_loader(ctx: &mut Context) -> UnitResult {
    let answer = ctx.new_int(42)?;
    ctx.set_global("answer", answer);
    Ok(())
}

#[test]
fn registered_modules_load_once_and_expose_globals() {
    let mut ctx = Context::new();
    ctx.register_module("fixture", fixture_loader);

    let module = ctx.import_module("fixture", None).unwrap();
    let answer = ctx.get_attribute(module, "answer").unwrap();
    assert_eq!(as_int(&ctx, answer), 42);

    let name = ctx.get_attribute(module, "__name__").unwrap();
    assert_eq!(as_str(&ctx, name), "fixture");

    // The module object is bound in the importer's globals.
    assert!(ctx.get_global("fixture").is_some());
}

#[test]
fn import_with_alias_binds_the_alias() {
    let mut ctx = Context::new();
    ctx.register_module("fixture", fixture_loader);
    ctx.import_module("fixture", Some("fx")).unwrap();
    assert!(ctx.get_global("fx").is_some());
    assert!(ctx.get_global("fixture").is_none());
}

#[test]
fn import_from_binds_one_name() {
    let mut ctx = Context::new();
    ctx.register_module("fixture", fixture_loader);
    let v = ctx.import_from_module("fixture", "answer", None).unwrap();
    assert_eq!(as_int(&ctx, v), 42);
    assert_eq!(ctx.get_global("answer").map(|g| as_int(&ctx, g)), Some(42));
}

#[test]
fn import_from_missing_name_is_an_import_error() {
    let mut ctx = Context::new();
    ctx.register_module("fixture", fixture_loader);
    assert!(ctx.import_from_module("fixture", "nope", None).is_err());
    assert!(pending_kind(&ctx, "ImportError"));
}

#[test]
fn import_all_copies_every_global() {
    let mut ctx = Context::new();
    ctx.register_module("fixture", fixture_loader);
    ctx.import_all_from_module("fixture").unwrap();
    assert_eq!(ctx.get_global("answer").map(|g| as_int(&ctx, g)), Some(42));
}

#[test]
fn unknown_module_is_an_import_error() {
    let mut ctx = Context::new();
    assert!(ctx.import_module("no_such_module", None).is_err());
    assert!(pending_kind(&ctx, "ImportError"));
}

#[test]
fn math_module_has_constants_and_functions() {
    let mut ctx = Context::new();
    let math = ctx.import_module("math", None).unwrap();
    let pi = ctx.get_attribute(math, "pi").unwrap();
    let val = ctx.get_float(pi).unwrap();
    assert!((val - std::f64::consts::PI).abs() < 1e-12);

    let sqrt = ctx.get_attribute(math, "sqrt").unwrap();
    let nine = float(&mut ctx, 9.0);
    let three = ctx.call(sqrt, &[nine], None).unwrap();
    assert_eq!(ctx.get_float(three), Some(3.0));

    let minus = float(&mut ctx, -1.0);
    assert!(ctx.call(sqrt, &[minus], None).is_err());
    assert!(pending_kind(&ctx, "ValueError"));
}

#[test]
fn random_module_is_deterministic_under_a_seed() {
    let mut ctx = Context::new();
    let random = ctx.import_module("random", None).unwrap();
    let seed = ctx.get_attribute(random, "seed").unwrap();
    ctx.set_global("seed_fn", seed);
    let randint = ctx.get_attribute(random, "randint").unwrap();
    ctx.set_global("randint_fn", randint);

    let draw = |ctx: &mut Context| -> i64 {
        let s = ctx.get_global("seed_fn").unwrap();
        let n = {
            let k = ctx.new_int(7).unwrap();
            ctx.call(s, &[k], None).unwrap();
            let lo = ctx.new_int(0).unwrap();
            let hi = ctx.new_int(100).unwrap();
            let r = ctx.get_global("randint_fn").unwrap();
            ctx.call(r, &[lo, hi], None).unwrap()
        };
        ctx.get_int(n).unwrap()
    };

    let a = draw(&mut ctx);
    let b = draw(&mut ctx);
    assert_eq!(a, b, "same seed, same draw");
}

#[test]
fn os_module_is_gated_by_config() {
    let mut closed = Context::new();
    assert!(closed.import_module("os", None).is_err());
    assert!(pending_kind(&closed, "ImportError"));

    let mut open = Context::with_config(Config {
        enable_os_access: true,
        ..Config::default()
    });
    let os = open.import_module("os", None).unwrap();
    assert!(open.get_attribute(os, "getcwd").is_ok());
}

#[test]
fn sys_module_reflects_config() {
    let mut ctx = Context::with_config(Config {
        isatty: true,
        argv: vec!["plume".to_string()],
        ..Config::default()
    });
    let sys = ctx.import_module("sys", None).unwrap();
    let isatty = ctx.get_attribute(sys, "isatty").unwrap();
    assert!(as_bool(&ctx, isatty));
}

/// A frontend whose "compiled program" is a fixed native function.
struct MarkerFrontend;

impl Frontend for MarkerFrontend {
    fn compile(
        &self,
        ctx: &mut Context,
        _source: &str,
        _module: &str,
        pretty_name: &str,
    ) -> OpResult {
        fn body(ctx: &mut Context, _argv: &[ObjId]) -> OpResult {
            let marker = ctx.new_str("compiled and ran")?;
            ctx.set_global("marker", marker);
            Ok(ctx.none())
        }
        ctx.new_function(pretty_name, body)
    }
}

#[test]
fn execute_goes_through_the_frontend() {
    let mut ctx = Context::new();
    ctx.set_frontend(Box::new(MarkerFrontend));
    ctx.execute("whatever", "snippet").unwrap();
    assert_eq!(
        ctx.get_global("marker").map(|g| as_str(&ctx, g)),
        Some("compiled and ran".to_string())
    );
}

#[test]
fn execute_without_a_frontend_is_an_error() {
    let mut ctx = Context::new();
    assert!(ctx.execute("x = 1", "snippet").is_err());
    assert!(pending_kind(&ctx, "RuntimeError"));
}

#[test]
fn builtins_are_star_imported_into_main() {
    let ctx = Context::new();
    for name in ["print", "len", "hash", "isinstance", "range", "ValueError"] {
        assert!(ctx.get_global(name).is_some(), "missing builtin '{name}'");
    }
}
