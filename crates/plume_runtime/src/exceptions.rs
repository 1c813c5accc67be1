//! Exception state: the current-exception slot, trace snapshots, raise
//! helpers, and traceback formatting.
//!
//! Every fallible runtime primitive returns `Result<ObjId, Raised>`.
//! `Err(Raised)` carries no data: it means "the Context's current exception
//! is set, check there". Callers propagate with `?` and must not clobber a
//! pending exception with a new one.

use plume_core::{ObjId, SourcePos};

use crate::Context;

/// Zero-sized sentinel: an exception is pending on the Context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Raised;

pub type OpResult = Result<ObjId, Raised>;
pub type UnitResult = Result<(), Raised>;

/// The closed set of builtin exception kinds. Each has a corresponding
/// builtin class with `BaseException` as an ancestor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExcKind {
    BaseException,
    SystemExit,
    Exception,
    StopIteration,
    ArithmeticError,
    OverflowError,
    ZeroDivisionError,
    AttributeError,
    ImportError,
    LookupError,
    IndexError,
    KeyError,
    MemoryError,
    NameError,
    OsError,
    IsADirectoryError,
    RuntimeError,
    NotImplementedError,
    RecursionError,
    SyntaxError,
    TypeError,
    ValueError,
}

impl ExcKind {
    pub const ALL: [ExcKind; 22] = [
        ExcKind::BaseException,
        ExcKind::SystemExit,
        ExcKind::Exception,
        ExcKind::StopIteration,
        ExcKind::ArithmeticError,
        ExcKind::OverflowError,
        ExcKind::ZeroDivisionError,
        ExcKind::AttributeError,
        ExcKind::ImportError,
        ExcKind::LookupError,
        ExcKind::IndexError,
        ExcKind::KeyError,
        ExcKind::MemoryError,
        ExcKind::NameError,
        ExcKind::OsError,
        ExcKind::IsADirectoryError,
        ExcKind::RuntimeError,
        ExcKind::NotImplementedError,
        ExcKind::RecursionError,
        ExcKind::SyntaxError,
        ExcKind::TypeError,
        ExcKind::ValueError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExcKind::BaseException => "BaseException",
            ExcKind::SystemExit => "SystemExit",
            ExcKind::Exception => "Exception",
            ExcKind::StopIteration => "StopIteration",
            ExcKind::ArithmeticError => "ArithmeticError",
            ExcKind::OverflowError => "OverflowError",
            ExcKind::ZeroDivisionError => "ZeroDivisionError",
            ExcKind::AttributeError => "AttributeError",
            ExcKind::ImportError => "ImportError",
            ExcKind::LookupError => "LookupError",
            ExcKind::IndexError => "IndexError",
            ExcKind::KeyError => "KeyError",
            ExcKind::MemoryError => "MemoryError",
            ExcKind::NameError => "NameError",
            ExcKind::OsError => "OSError",
            ExcKind::IsADirectoryError => "IsADirectoryError",
            ExcKind::RuntimeError => "RuntimeError",
            ExcKind::NotImplementedError => "NotImplementedError",
            ExcKind::RecursionError => "RecursionError",
            ExcKind::SyntaxError => "SyntaxError",
            ExcKind::TypeError => "TypeError",
            ExcKind::ValueError => "ValueError",
        }
    }

    /// Direct parent in the builtin hierarchy. `BaseException` has none.
    pub fn parent(self) -> Option<ExcKind> {
        Some(match self {
            ExcKind::BaseException => return None,
            ExcKind::SystemExit => ExcKind::BaseException,
            ExcKind::Exception => ExcKind::BaseException,
            ExcKind::StopIteration => ExcKind::Exception,
            ExcKind::ArithmeticError => ExcKind::Exception,
            ExcKind::OverflowError => ExcKind::ArithmeticError,
            ExcKind::ZeroDivisionError => ExcKind::ArithmeticError,
            ExcKind::AttributeError => ExcKind::Exception,
            ExcKind::ImportError => ExcKind::Exception,
            ExcKind::LookupError => ExcKind::Exception,
            ExcKind::IndexError => ExcKind::LookupError,
            ExcKind::KeyError => ExcKind::LookupError,
            ExcKind::MemoryError => ExcKind::Exception,
            ExcKind::NameError => ExcKind::Exception,
            ExcKind::OsError => ExcKind::Exception,
            ExcKind::IsADirectoryError => ExcKind::OsError,
            ExcKind::RuntimeError => ExcKind::Exception,
            ExcKind::NotImplementedError => ExcKind::RuntimeError,
            ExcKind::RecursionError => ExcKind::RuntimeError,
            ExcKind::SyntaxError => ExcKind::Exception,
            ExcKind::TypeError => ExcKind::Exception,
            ExcKind::ValueError => ExcKind::Exception,
        })
    }
}

/// One entry in the call stack.
#[derive(Clone, Debug, Default)]
pub struct TraceFrame {
    pub pos: SourcePos,
    pub line_text: String,
    pub module: String,
    pub func: String,
    pub syntax_error: bool,
}

pub(crate) const DEFAULT_FUNC_NAME: &str = "<unnamed>";

impl Context {
    /// Build an instance of the builtin exception class for `kind`, make it
    /// the current exception, and snapshot the trace.
    ///
    /// Returns `Raised` so call sites read `return Err(ctx.raise(..))`. If
    /// constructing the exception itself fails, the pending exception from
    /// that failure is left in place instead.
    pub fn raise(&mut self, kind: ExcKind, message: &str) -> Raised {
        let class = self.exc_class(kind);
        let prev = self.in_raise;
        self.in_raise = true;
        let exc = (|ctx: &mut Context| {
            let msg = ctx.new_str(message)?;
            ctx.protect(msg);
            let exc = ctx.call(class, &[msg], None);
            ctx.unprotect(msg);
            exc
        })(self);
        self.in_raise = prev;
        match exc {
            Ok(exc) => self.raise_object(exc),
            Err(raised) => raised,
        }
    }

    /// Install `exception` as the current exception. Raising a value that is
    /// not a `BaseException` instance raises TypeError instead.
    pub fn raise_object(&mut self, exception: ObjId) -> Raised {
        let base = self.exc_class(ExcKind::BaseException);
        if self.is_instance(exception, &[base]).is_none() {
            return self.raise(ExcKind::TypeError, "exceptions must derive from BaseException");
        }
        self.current_exception = Some(exception);
        self.exception_trace = self.current_trace.clone();
        if self.error_hook.is_some() {
            let line = self.exception_line(exception);
            if let Some(hook) = self.error_hook.as_mut() {
                hook(&line);
            }
        }
        Raised
    }

    pub fn current_exception(&self) -> Option<ObjId> {
        self.current_exception
    }

    pub fn clear_exception(&mut self) {
        self.current_exception = None;
        self.exception_trace.clear();
    }

    /// Snapshot of the trace captured when the current exception was raised.
    pub fn exception_trace(&self) -> &[TraceFrame] {
        &self.exception_trace
    }

    /// `AttributeError` for a missing attribute, phrased with the receiver's
    /// type name.
    pub fn raise_attribute_error(&mut self, obj: ObjId, name: &str) -> Raised {
        let ty = self.heap.get(obj).type_name().to_string();
        self.raise(
            ExcKind::AttributeError,
            &format!("'{ty}' object has no attribute '{name}'"),
        )
    }

    pub fn raise_argument_count_error(&mut self, given: usize, expected: Option<usize>) -> Raised {
        let msg = match expected {
            Some(expected) => format!(
                "function takes {expected} argument(s) but {given} {} given",
                if given == 1 { "was" } else { "were" }
            ),
            None => format!("function does not take {given} argument(s)"),
        };
        self.raise(ExcKind::TypeError, &msg)
    }

    /// Push a syntax-error frame and raise SyntaxError. The caret in the
    /// formatted traceback points at `pos.column`.
    pub fn raise_syntax_error(
        &mut self,
        message: &str,
        module: &str,
        pos: SourcePos,
        line_text: &str,
    ) -> Raised {
        self.current_trace.push(TraceFrame {
            pos,
            line_text: line_text.to_string(),
            module: module.to_string(),
            func: DEFAULT_FUNC_NAME.to_string(),
            syntax_error: true,
        });
        let raised = self.raise(ExcKind::SyntaxError, message);
        self.current_trace.pop();
        raised
    }

    /// Format the current exception and its frozen trace, or "Ok" when no
    /// exception is pending.
    pub fn error_message(&self) -> String {
        let Some(exception) = self.current_exception else {
            return "Ok".to_string();
        };

        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in &self.exception_trace {
            out.push_str("  ");
            out.push_str(&format!("Module {}", frame.module));
            if frame.pos.is_known() {
                out.push_str(&format!(", Line {}", frame.pos.line + 1));
            }
            if frame.func != DEFAULT_FUNC_NAME {
                out.push_str(&format!(", Function {}()", frame.func));
            }
            out.push('\n');

            if !frame.line_text.is_empty() {
                let line: String = frame
                    .line_text
                    .chars()
                    .map(|c| if c == '\t' { ' ' } else { c })
                    .collect();
                let skip = line.chars().take_while(|&c| c == ' ').count();
                out.push_str("    ");
                out.push_str(line.trim_start_matches(' '));
                out.push('\n');
                let column = frame.pos.column as usize;
                if frame.syntax_error && skip <= column {
                    out.push_str(&" ".repeat(column + 4 - skip));
                    out.push_str("^\n");
                }
            }
        }

        out.push_str(&self.exception_line(exception));
        out.push('\n');
        out
    }

    /// `Kind: message`, or just `Kind` when the message is empty.
    fn exception_line(&self, exception: ObjId) -> String {
        let mut line = self.heap.get(exception).type_name().to_string();
        if let Some(msg) = self.heap.get(exception).attrs.get_local("message") {
            if let crate::core::value::Payload::Str(s) = &self.heap.get(msg).payload {
                if !s.is_empty() {
                    line.push_str(": ");
                    line.push_str(s);
                }
            }
        }
        line
    }
}
