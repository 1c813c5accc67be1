//! Registry for free builtin functions.
//!
//! Hosts can extend or replace the standard set by implementing
//! `BuiltinProvider` and installing into a fresh registry before handing it
//! to the Context.

use crate::builtins::functions;
use crate::core::value::NativeFn;
use crate::{Context, UnitResult};

pub struct BuiltinRegistry {
    entries: Vec<(String, NativeFn)>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &str, fun: NativeFn) {
        self.entries.push((name.to_string(), fun));
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Create function values and bind them as globals of the currently
    /// executing module.
    pub fn install_into(self, ctx: &mut Context) -> UnitResult {
        for (name, fun) in self.entries {
            let f = ctx.new_function(&name, fun)?;
            ctx.set_global(&name, f);
        }
        Ok(())
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub trait BuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry);
}

pub struct StdBuiltinProvider;

impl BuiltinProvider for StdBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        registry.register("print", functions::builtin_print);
        registry.register("len", functions::builtin_len);
        registry.register("hash", functions::builtin_hash);
        registry.register("repr", functions::builtin_repr);
        registry.register("abs", functions::builtin_abs);
        registry.register("min", functions::builtin_min);
        registry.register("max", functions::builtin_max);
        registry.register("isinstance", functions::builtin_isinstance);
    }
}
