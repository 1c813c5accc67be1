//! Collection: root gathering, sweep, finalizers, trigger policy.

use plume_core::ObjId;

use crate::context::FnUserdata;
use crate::Context;

impl Context {
    /// Run a full mark-and-sweep cycle.
    ///
    /// Roots: the current exception, every module's globals, the protection
    /// multiset, in-flight kwargs Maps, constructor classes on the userdata
    /// stack, the builtin registry, and the argv tuple. Unreached values
    /// have their finalizer run once, then their slot is released.
    pub fn collect_garbage(&mut self) {
        if self.gc_lock {
            return;
        }

        let mut roots: Vec<ObjId> = Vec::new();
        if let Some(exc) = self.current_exception {
            roots.push(exc);
        }
        for module_globals in self.globals.values() {
            roots.extend(module_globals.values().copied());
        }
        roots.extend(self.protected.keys().copied());
        roots.extend(self.kwargs_stack.iter().flatten().copied());
        for entry in &self.userdata_stack {
            if let FnUserdata::Class(class) = entry {
                roots.push(*class);
            }
        }
        roots.extend(self.builtins.all());
        if let Some(argv) = self.argv {
            roots.push(argv);
        }

        self.heap.clear_marks();
        self.heap.mark_from(&roots);

        let dead = self.heap.unreachable();

        // Finalizers see the object intact but must not allocate; the lock
        // holds until every slot is released.
        self.gc_lock = true;
        self.finalizing = true;
        for &id in &dead {
            let finalizer = self.heap.get_mut(id).finalizer.take();
            if let Some(fin) = finalizer {
                if (fin.fptr)(self, id, fin.userdata).is_err() {
                    let line = format!("Exception ignored in finalizer: {}", self.error_message());
                    self.clear_exception();
                    self.emit(&line);
                }
            }
        }
        self.finalizing = false;
        for id in dead {
            self.heap.release(id);
        }
        self.gc_lock = false;

        self.last_live_count = self.heap.live_count();
    }

    /// Collect when the live count has outgrown the last post-collection
    /// count by the configured factor. Never runs under the GC lock.
    pub(crate) fn maybe_collect(&mut self) {
        if self.gc_lock {
            return;
        }
        let threshold = (self.last_live_count as f64 * self.config.gc_run_factor) as usize;
        if self.heap.live_count() > threshold.max(64) {
            self.collect_garbage();
        }
    }

    /// Live value count, for tests and host instrumentation.
    pub fn live_values(&self) -> usize {
        self.heap.live_count()
    }

    /// Whether a handle still points at a live slot. Only meaningful for
    /// instrumentation; user code never sees dangling handles.
    pub fn is_alive(&self, v: ObjId) -> bool {
        self.heap.contains(v)
    }
}

impl Drop for Context {
    /// Destroying the Context runs every remaining finalizer once, so host
    /// resources held in userdata are released with the arena.
    fn drop(&mut self) {
        let live: Vec<ObjId> = (0..self.heap.slot_count())
            .map(ObjId)
            .filter(|&id| self.heap.contains(id))
            .collect();
        self.gc_lock = true;
        self.finalizing = true;
        for id in live {
            let finalizer = self.heap.get_mut(id).finalizer.take();
            if let Some(fin) = finalizer {
                let _ = (fin.fptr)(self, id, fin.userdata);
            }
        }
        self.finalizing = false;
        self.gc_lock = false;
    }
}
