//! The iteration protocol driver.
//!
//! `iterate` obtains an iterator with `__iter__`, then calls `__next__`
//! until StopIteration is raised, which it catches and clears. Any other
//! exception propagates.

use plume_core::ObjId;

use crate::exceptions::{ExcKind, Raised};
use crate::{Context, UnitResult};

impl Context {
    /// Drive the iteration protocol over `obj`. The callback returns
    /// `Ok(true)` to continue, `Ok(false)` to stop early.
    pub fn iterate<F>(&mut self, obj: ObjId, mut callback: F) -> UnitResult
    where
        F: FnMut(&mut Context, ObjId) -> Result<bool, Raised>,
    {
        let iter = self.call_method(obj, "__iter__", &[], None)?;
        self.protect(iter);
        let result = self.drive(iter, &mut callback);
        self.unprotect(iter);
        result
    }

    fn drive(
        &mut self,
        iter: ObjId,
        callback: &mut dyn FnMut(&mut Context, ObjId) -> Result<bool, Raised>,
    ) -> UnitResult {
        loop {
            match self.call_method(iter, "__next__", &[], None) {
                Ok(item) => {
                    self.protect(item);
                    let verdict = callback(self, item);
                    self.unprotect(item);
                    if !verdict? {
                        return Ok(());
                    }
                }
                Err(raised) => {
                    let stop = self.exc_class(ExcKind::StopIteration);
                    if let Some(exc) = self.current_exception {
                        if self.is_instance(exc, &[stop]).is_some() {
                            self.clear_exception();
                            return Ok(());
                        }
                    }
                    return Err(raised);
                }
            }
        }
    }

    /// Iterate `obj` into exactly `count` values; ValueError when the
    /// iterator yields more or fewer.
    pub fn unpack(&mut self, obj: ObjId, count: usize) -> Result<Vec<ObjId>, Raised> {
        let mut out: Vec<ObjId> = Vec::with_capacity(count);
        let result = self.iterate(obj, |ctx, item| {
            if out.len() >= count {
                return Err(ctx.raise(ExcKind::ValueError, "too many values to unpack"));
            }
            ctx.protect(item);
            out.push(item);
            Ok(true)
        });
        let gathered = out.len();
        for &v in &out {
            self.unprotect(v);
        }
        result?;
        if gathered < count {
            return Err(self.raise(ExcKind::ValueError, "not enough values to unpack"));
        }
        Ok(out)
    }
}
