//! Call machinery: kwargs validation, bound-method self prepending, script
//! parameter binding, trace-frame push/pop, recursion guard.

use std::rc::Rc;

use plume_core::{HashKey, ObjId};
use smallvec::SmallVec;

use crate::context::FnUserdata;
use crate::core::value::{BoundFrame, FuncImpl, MapEntry, NativeFn, Payload, ScriptFn};
use crate::exceptions::{ExcKind, Raised, TraceFrame};
use crate::{Context, OpResult, UnitResult};

enum Target {
    Func {
        imp: FuncImpl,
        self_obj: Option<ObjId>,
        name: String,
        module: String,
        userdata: Option<Rc<dyn std::any::Any>>,
    },
    Class {
        ctor: NativeFn,
        module: String,
    },
}

impl Context {
    /// Invoke a callable. Functions and classes are called directly; any
    /// other value dispatches through `__call__`.
    pub fn call(&mut self, callable: ObjId, argv: &[ObjId], kwargs: Option<ObjId>) -> OpResult {
        let direct = matches!(
            self.heap.get(callable).payload,
            Payload::Func(_) | Payload::Class(_)
        );
        if !direct {
            return self.call_method(callable, "__call__", argv, kwargs);
        }

        if let Some(kw) = kwargs {
            self.check_kwargs(kw)?;
        }

        if !self.in_raise && self.current_trace.len() >= self.config.max_recursion {
            return Err(self.raise(ExcKind::RecursionError, "maximum recursion depth exceeded"));
        }

        self.protect(callable);
        for &a in argv {
            self.protect(a);
        }
        if let Some(kw) = kwargs {
            self.protect(kw);
        }
        let ret = self.call_pinned(callable, argv, kwargs);
        if let Some(kw) = kwargs {
            self.unprotect(kw);
        }
        for &a in argv {
            self.unprotect(a);
        }
        self.unprotect(callable);
        ret
    }

    /// Look up `name` on `obj` (binding `self`) and call it.
    pub fn call_method(
        &mut self,
        obj: ObjId,
        name: &str,
        argv: &[ObjId],
        kwargs: Option<ObjId>,
    ) -> OpResult {
        let method = self.get_attribute(obj, name)?;
        self.call(method, argv, kwargs)
    }

    /// Like `call_method`, but resolve through a base class, skipping the
    /// receiver's own table.
    pub fn call_method_from_base(
        &mut self,
        obj: ObjId,
        name: &str,
        argv: &[ObjId],
        kwargs: Option<ObjId>,
        base: Option<ObjId>,
    ) -> OpResult {
        match self.get_attribute_from_base(obj, name, base) {
            Some(method) => self.call(method, argv, kwargs),
            None => Err(self.raise_attribute_error(obj, name)),
        }
    }

    fn check_kwargs(&mut self, kw: ObjId) -> UnitResult {
        let verdict = match &self.heap.get(kw).payload {
            Payload::Map(m) => m.keys().all(|k| k.is_str()),
            _ => {
                return Err(self.raise(ExcKind::TypeError, "keyword arguments must be a dict"));
            }
        };
        if !verdict {
            return Err(self.raise(
                ExcKind::TypeError,
                "keyword arguments must use string keys",
            ));
        }
        Ok(())
    }

    fn call_pinned(&mut self, callable: ObjId, argv: &[ObjId], kwargs: Option<ObjId>) -> OpResult {
        let target = match &self.heap.get(callable).payload {
            Payload::Func(f) => Target::Func {
                imp: f.imp.clone(),
                self_obj: f.self_obj,
                name: f.pretty_name.clone(),
                module: f.module.clone(),
                userdata: f.userdata.clone(),
            },
            Payload::Class(c) => Target::Class {
                ctor: c.ctor,
                module: c.module.clone(),
            },
            _ => unreachable!("call_pinned requires a function or class"),
        };

        match target {
            Target::Func {
                imp,
                self_obj,
                name,
                module,
                userdata,
            } => {
                let mut args: SmallVec<[ObjId; 4]> = SmallVec::with_capacity(argv.len() + 1);
                if let Some(receiver) = self_obj {
                    self.protect(receiver);
                    args.push(receiver);
                }
                args.extend_from_slice(argv);

                self.current_module.push(module.clone());
                self.userdata_stack.push(match userdata {
                    Some(ud) => FnUserdata::Host(ud),
                    None => FnUserdata::None,
                });
                self.kwargs_stack.push(kwargs);
                self.current_trace.push(TraceFrame {
                    module,
                    func: name,
                    ..TraceFrame::default()
                });

                let ret = match imp {
                    FuncImpl::Native(f) => f(self, &args),
                    FuncImpl::Script(sf) => self.call_script(&sf, &args, kwargs),
                };

                self.current_trace.pop();
                self.kwargs_stack.pop();
                self.userdata_stack.pop();
                self.current_module.pop();
                if let Some(receiver) = self_obj {
                    self.unprotect(receiver);
                }
                ret
            }
            Target::Class { ctor, module } => {
                self.current_module.push(module);
                self.userdata_stack.push(FnUserdata::Class(callable));
                self.kwargs_stack.push(kwargs);
                let ret = ctor(self, argv);
                self.kwargs_stack.pop();
                self.userdata_stack.pop();
                self.current_module.pop();
                ret
            }
        }
    }

    fn call_script(&mut self, sf: &Rc<ScriptFn>, argv: &[ObjId], kwargs: Option<ObjId>) -> OpResult {
        let locals = self.bind_script_args(sf, argv, kwargs)?;
        for &(_, v) in &locals {
            self.protect(v);
        }
        let frame = BoundFrame {
            locals,
            captures: sf.captures.clone(),
        };
        let ret = sf.body.run(self, &frame);
        for &(_, v) in &frame.locals {
            self.unprotect(v);
        }
        ret
    }

    /// Bind call arguments to a script function's declared parameters.
    ///
    /// Positional arguments fill parameters left to right; keywords fill the
    /// rest by name; unfilled parameters fall back to their defaults. Excess
    /// positional arguments go to `*args`, excess keywords to `**kwargs`,
    /// and TypeError otherwise.
    fn bind_script_args(
        &mut self,
        sf: &ScriptFn,
        argv: &[ObjId],
        kwargs: Option<ObjId>,
    ) -> Result<Vec<(String, ObjId)>, Raised> {
        let mut temps: SmallVec<[ObjId; 2]> = SmallVec::new();
        let result = self.bind_script_args_inner(sf, argv, kwargs, &mut temps);
        for &t in &temps {
            self.unprotect(t);
        }
        result
    }

    fn bind_script_args_inner(
        &mut self,
        sf: &ScriptFn,
        argv: &[ObjId],
        kwargs: Option<ObjId>,
        temps: &mut SmallVec<[ObjId; 2]>,
    ) -> Result<Vec<(String, ObjId)>, Raised> {
        let declared = sf.params.len();
        let mut bound: Vec<Option<ObjId>> = vec![None; declared];
        for (slot, &arg) in bound.iter_mut().zip(argv.iter()) {
            *slot = Some(arg);
        }

        let star_args_val = if argv.len() > declared {
            if sf.star_args.is_none() {
                return Err(self.raise_argument_count_error(argv.len(), Some(declared)));
            }
            let t = self.new_tuple(&argv[declared..])?;
            self.protect(t);
            temps.push(t);
            Some(t)
        } else if sf.star_args.is_some() {
            let t = self.new_tuple(&[])?;
            self.protect(t);
            temps.push(t);
            Some(t)
        } else {
            None
        };

        let star_kwargs_val = if sf.star_kwargs.is_some() {
            let m = self.new_map()?;
            self.protect(m);
            temps.push(m);
            Some(m)
        } else {
            None
        };

        let kw_entries: Vec<(String, ObjId, ObjId)> = match kwargs {
            None => Vec::new(),
            Some(kw) => match &self.heap.get(kw).payload {
                Payload::Map(m) => m
                    .iter()
                    .filter_map(|(k, e)| k.as_str().map(|s| (s.to_string(), e.key, e.value)))
                    .collect(),
                _ => Vec::new(),
            },
        };

        for (name, key, value) in kw_entries {
            if let Some(pos) = sf.params.iter().position(|p| p.name == name) {
                if bound[pos].is_some() {
                    return Err(self.raise(
                        ExcKind::TypeError,
                        &format!("got multiple values for argument '{name}'"),
                    ));
                }
                bound[pos] = Some(value);
            } else if let Some(bucket) = star_kwargs_val {
                if let Payload::Map(m) = &mut self.heap.get_mut(bucket).payload {
                    m.insert(HashKey::from_str(&name), MapEntry { key, value });
                }
            } else {
                return Err(self.raise(
                    ExcKind::TypeError,
                    &format!("got an unexpected keyword argument '{name}'"),
                ));
            }
        }

        let mut locals: Vec<(String, ObjId)> = Vec::with_capacity(declared + 2);
        for (param, slot) in sf.params.iter().zip(bound) {
            let value = match slot.or(param.default) {
                Some(v) => v,
                None => {
                    let name = param.name.clone();
                    return Err(self.raise(
                        ExcKind::TypeError,
                        &format!("missing required argument: '{name}'"),
                    ));
                }
            };
            locals.push((param.name.clone(), value));
        }
        if let (Some(name), Some(v)) = (&sf.star_args, star_args_val) {
            locals.push((name.clone(), v));
        }
        if let (Some(name), Some(v)) = (&sf.star_kwargs, star_kwargs_val) {
            locals.push((name.clone(), v));
        }
        Ok(locals)
    }
}
