//! Try/except/finally unwind protocol.
//!
//! The instruction dispatcher owns the jump addresses; the runtime owns the
//! bookkeeping. The executor pushes a `TryFrame` on entering a try body and
//! consults the `Unwinder` at four points:
//!
//! - an exception became pending -> `on_raise`
//! - break/continue/return crosses try frames -> `on_jump` with the number
//!   of frames the jump leaves (the finally-count)
//! - the try body fell through normally -> `leave_try`
//! - a finally body finished -> `finally_complete`
//!
//! Handler matching itself (isinstance against the declared types, binding
//! the exception name, clearing the slot) stays in the executor: this
//! module only decides where control goes next.

use plume_core::ObjId;

/// One entered `try` statement.
#[derive(Clone, Copy, Debug)]
pub struct TryFrame {
    /// Address of the except-dispatch block, taken at most once.
    pub catch_addr: Option<usize>,
    /// Address of the finally body, run on every exit path.
    pub finally_addr: Option<usize>,
    /// Executor value-stack depth to restore before jumping.
    pub stack_len: usize,
}

/// A control transfer waiting for intervening finally bodies to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingAction {
    /// Keep unwinding the pending exception outward.
    Raise,
    Return(ObjId),
    Break,
    Continue,
}

/// Where to go after consulting the unwinder.
#[derive(Clone, Copy, Debug)]
pub struct Jump {
    pub addr: usize,
    pub stack_len: usize,
}

/// Outcome of a completed finally body.
#[derive(Clone, Copy, Debug)]
pub enum FinallyExit {
    /// No queued action; fall through after the try statement.
    Normal,
    /// Another handler or finally body claims control.
    Jump(Jump),
    /// All finallys have run; the executor performs the action itself
    /// (propagates the exception, returns, breaks, continues).
    Perform(PendingAction),
}

#[derive(Default)]
pub struct Unwinder {
    frames: Vec<TryFrame>,
    pending: Option<(PendingAction, usize)>,
}

impl Unwinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_try(&mut self, frame: TryFrame) {
        self.frames.push(frame);
    }

    /// The try body (or a handler body) completed normally. Returns the
    /// finally to run, if any; otherwise the frame is discarded.
    pub fn leave_try(&mut self) -> Option<Jump> {
        let frame = self.frames.last()?;
        match frame.finally_addr {
            Some(addr) => Some(Jump {
                addr,
                stack_len: frame.stack_len,
            }),
            None => {
                self.frames.pop();
                None
            }
        }
    }

    /// An exception became pending. Unwind to the nearest handler: each
    /// frame offers its except block once, then its finally with the raise
    /// re-queued. Returns None when the exception surfaces past every frame.
    pub fn on_raise(&mut self) -> Option<Jump> {
        while let Some(frame) = self.frames.last_mut() {
            if let Some(addr) = frame.catch_addr.take() {
                return Some(Jump {
                    addr,
                    stack_len: frame.stack_len,
                });
            }
            if let Some(addr) = frame.finally_addr {
                self.pending = Some((PendingAction::Raise, usize::MAX));
                return Some(Jump {
                    addr,
                    stack_len: frame.stack_len,
                });
            }
            self.frames.pop();
        }
        None
    }

    /// break/continue/return leaving `frames_exited` try frames. Runs the
    /// intervening finally bodies innermost-first; returns None when no
    /// finally intervenes and the executor should jump immediately.
    pub fn on_jump(&mut self, action: PendingAction, frames_exited: usize) -> Option<Jump> {
        debug_assert!(action != PendingAction::Raise, "use on_raise for exceptions");
        let mut remaining = frames_exited;
        while remaining > 0 {
            let Some(frame) = self.frames.last() else {
                break;
            };
            if let Some(addr) = frame.finally_addr {
                self.pending = Some((action, remaining - 1));
                return Some(Jump {
                    addr,
                    stack_len: frame.stack_len,
                });
            }
            self.frames.pop();
            remaining -= 1;
        }
        None
    }

    /// A finally body finished; its frame is discarded and any queued
    /// action resumes.
    pub fn finally_complete(&mut self) -> FinallyExit {
        self.frames.pop();
        match self.pending.take() {
            None => FinallyExit::Normal,
            Some((PendingAction::Raise, _)) => match self.on_raise() {
                Some(jump) => FinallyExit::Jump(jump),
                None => FinallyExit::Perform(PendingAction::Raise),
            },
            Some((action, frames_left)) => match self.on_jump(action, frames_left) {
                Some(jump) => FinallyExit::Jump(jump),
                None => FinallyExit::Perform(action),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(catch: Option<usize>, finally: Option<usize>) -> TryFrame {
        TryFrame {
            catch_addr: catch,
            finally_addr: finally,
            stack_len: 0,
        }
    }

    #[test]
    fn raise_goes_to_the_handler_first() {
        let mut u = Unwinder::new();
        u.push_try(frame(Some(10), Some(20)));
        let jump = u.on_raise().expect("handler");
        assert_eq!(jump.addr, 10);
        // Handler completed; fall through to the finally.
        let fin = u.leave_try().expect("finally");
        assert_eq!(fin.addr, 20);
        assert!(matches!(u.finally_complete(), FinallyExit::Normal));
        assert_eq!(u.depth(), 0);
    }

    #[test]
    fn reraise_inside_handler_runs_the_finally_then_surfaces() {
        let mut u = Unwinder::new();
        u.push_try(frame(Some(10), Some(20)));
        u.on_raise().expect("handler");
        // The handler re-raised: the catch slot is spent, only the finally
        // remains, with the raise queued behind it.
        let fin = u.on_raise().expect("finally");
        assert_eq!(fin.addr, 20);
        assert!(matches!(
            u.finally_complete(),
            FinallyExit::Perform(PendingAction::Raise)
        ));
    }

    #[test]
    fn uncaught_exception_surfaces_past_all_frames() {
        let mut u = Unwinder::new();
        u.push_try(frame(None, None));
        assert!(u.on_raise().is_none());
        assert_eq!(u.depth(), 0);
    }

    #[test]
    fn nested_finallys_run_innermost_first_on_raise() {
        let mut u = Unwinder::new();
        u.push_try(frame(None, Some(100)));
        u.push_try(frame(None, Some(200)));
        let first = u.on_raise().expect("inner finally");
        assert_eq!(first.addr, 200);
        match u.finally_complete() {
            FinallyExit::Jump(j) => assert_eq!(j.addr, 100),
            other => panic!("expected outer finally, got {other:?}"),
        }
        assert!(matches!(
            u.finally_complete(),
            FinallyExit::Perform(PendingAction::Raise)
        ));
    }

    #[test]
    fn break_through_two_finallys_runs_both_in_order() {
        let mut u = Unwinder::new();
        u.push_try(frame(None, Some(100)));
        u.push_try(frame(None, Some(200)));
        let first = u.on_jump(PendingAction::Break, 2).expect("inner finally");
        assert_eq!(first.addr, 200);
        match u.finally_complete() {
            FinallyExit::Jump(j) => assert_eq!(j.addr, 100),
            other => panic!("expected outer finally, got {other:?}"),
        }
        assert!(matches!(
            u.finally_complete(),
            FinallyExit::Perform(PendingAction::Break)
        ));
        assert_eq!(u.depth(), 0);
    }

    #[test]
    fn return_stops_at_the_loop_boundary() {
        let mut u = Unwinder::new();
        u.push_try(frame(None, Some(100)));
        u.push_try(frame(None, None));
        // The jump exits only the inner frame, which has no finally.
        assert!(u.on_jump(PendingAction::Break, 1).is_none());
        assert_eq!(u.depth(), 1);
    }

    #[test]
    fn normal_fall_through_still_runs_the_finally() {
        let mut u = Unwinder::new();
        u.push_try(frame(Some(10), Some(20)));
        let fin = u.leave_try().expect("finally");
        assert_eq!(fin.addr, 20);
        assert!(matches!(u.finally_complete(), FinallyExit::Normal));
    }

    #[test]
    fn return_value_is_carried_through_the_finally() {
        let mut u = Unwinder::new();
        u.push_try(frame(None, Some(50)));
        let jump = u
            .on_jump(PendingAction::Return(ObjId(7)), 1)
            .expect("finally");
        assert_eq!(jump.addr, 50);
        match u.finally_complete() {
            FinallyExit::Perform(PendingAction::Return(v)) => assert_eq!(v, ObjId(7)),
            other => panic!("expected queued return, got {other:?}"),
        }
    }
}
