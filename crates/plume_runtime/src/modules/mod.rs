//! Module registration and imports.
//!
//! A module is a named globals table. Registered loaders populate it
//! natively; anything else is resolved as a source file on the import path
//! and compiled through the registered `Frontend`. Importing a module also
//! materializes a module object whose attributes mirror the globals.

pub(crate) mod math;
pub(crate) mod os;
pub(crate) mod random;
pub(crate) mod sys;
pub(crate) mod time;

use plume_core::ObjId;

use crate::core::value::ordered_map_new;
use crate::exceptions::ExcKind;
use crate::{Context, OpResult, UnitResult};

/// Populates the current module's globals when it is first imported.
pub type ModuleLoader = fn(&mut Context) -> UnitResult;

/// The compiler seam. `compile` returns a callable Function value whose
/// invocation executes the module body (or expression) in `module`'s
/// globals.
pub trait Frontend {
    fn compile(
        &self,
        ctx: &mut Context,
        source: &str,
        module: &str,
        pretty_name: &str,
    ) -> OpResult;
}

impl Context {
    pub fn register_module(&mut self, name: &str, loader: ModuleLoader) {
        self.module_loaders.insert(name.to_string(), loader);
    }

    pub fn set_import_path(&mut self, path: &str) {
        self.import_path = path.to_string();
        if !self.import_path.is_empty() && !self.import_path.ends_with(['/', '\\']) {
            self.import_path.push('/');
        }
    }

    /// Compile and run source in the currently executing module, through
    /// the registered frontend.
    pub fn execute(&mut self, source: &str, pretty_name: &str) -> OpResult {
        let Some(frontend) = self.frontend.take() else {
            return Err(self.raise(
                ExcKind::RuntimeError,
                "no frontend registered; cannot compile source",
            ));
        };
        let module = self.current_module_name().to_string();
        let compiled = frontend.compile(self, source, &module, pretty_name);
        self.frontend = Some(frontend);
        let body = compiled?;
        self.call(body, &[], None)
    }

    /// Import a module and bind a module object under `alias` (defaulting
    /// to the module name) in the current module's globals.
    pub fn import_module(&mut self, name: &str, alias: Option<&str>) -> OpResult {
        self.load_module(name)?;

        let module_class = self
            .builtins
            .module_class
            .expect("context not bootstrapped");
        let module_obj = self.call(module_class, &[], None)?;
        self.protect(module_obj);
        let result = (|ctx: &mut Context| {
            let name_val = ctx.new_str(name)?;
            ctx.set_attribute(module_obj, "__name__", name_val);
            let bindings: Vec<(String, ObjId)> = ctx
                .globals
                .get(name)
                .map(|g| g.iter().map(|(k, &v)| (k.clone(), v)).collect())
                .unwrap_or_default();
            for (var, val) in bindings {
                ctx.set_attribute(module_obj, &var, val);
            }
            Ok(module_obj)
        })(self);
        self.unprotect(module_obj);
        let module_obj = result?;
        self.set_global(alias.unwrap_or(name), module_obj);
        Ok(module_obj)
    }

    /// Import one name from a module into the current module's globals.
    pub fn import_from_module(&mut self, module: &str, name: &str, alias: Option<&str>) -> OpResult {
        self.load_module(module)?;
        let value = self
            .globals
            .get(module)
            .and_then(|g| g.get(name).copied());
        match value {
            Some(v) => {
                self.set_global(alias.unwrap_or(name), v);
                Ok(v)
            }
            None => Err(self.raise(
                ExcKind::ImportError,
                &format!("cannot import '{name}' from '{module}'"),
            )),
        }
    }

    /// Import every global of a module into the current module's globals.
    pub fn import_all_from_module(&mut self, module: &str) -> UnitResult {
        self.load_module(module)?;
        let bindings: Vec<(String, ObjId)> = self
            .globals
            .get(module)
            .map(|g| g.iter().map(|(k, &v)| (k.clone(), v)).collect())
            .unwrap_or_default();
        for (var, val) in bindings {
            self.set_global(&var, val);
        }
        Ok(())
    }

    /// Idempotent load: run the registered loader, or compile the module's
    /// source file. A failed load leaves no trace in the globals.
    fn load_module(&mut self, name: &str) -> UnitResult {
        if self.globals.contains_key(name) {
            return Ok(());
        }
        self.globals.insert(name.to_string(), ordered_map_new());
        self.current_module.push(name.to_string());

        let result = (|ctx: &mut Context| {
            if name != "__builtins__" {
                ctx.import_all_from_module("__builtins__")?;
            }
            match ctx.module_loaders.get(name) {
                Some(&loader) => loader(ctx),
                None => ctx.load_file_module(name),
            }
        })(self);

        self.current_module.pop();
        if result.is_err() {
            self.globals.shift_remove(name);
        }
        result
    }

    fn load_file_module(&mut self, name: &str) -> UnitResult {
        let path = format!("{}{name}.plm", self.import_path);
        let source = match self.caps.fs.read_to_string(&path) {
            Ok(source) => source,
            Err(_) => {
                return Err(self.raise(
                    ExcKind::ImportError,
                    &format!("no module named '{name}'"),
                ));
            }
        };
        self.execute(&source, name)?;
        Ok(())
    }
}
