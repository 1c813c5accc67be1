//! Operators and conversions, all routed through dunder lookup on the left
//! operand (the container for `in`). Result constraints are enforced here:
//! comparisons and `__contains__` must yield Bool, conversions must yield
//! the matching type.

use plume_core::ObjId;

use crate::core::value::Payload;
use crate::exceptions::{ExcKind, Raised};
use crate::{Context, OpResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Pos,
    Neg,
    BitNot,
    Not,
    Bool,
    Int,
    Float,
    Str,
    Repr,
    Len,
    Hash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    And,
    Or,
}

impl BinOp {
    fn dunder(self) -> &'static str {
        match self {
            BinOp::Add => "__add__",
            BinOp::Sub => "__sub__",
            BinOp::Mul => "__mul__",
            BinOp::Div => "__truediv__",
            BinOp::FloorDiv => "__floordiv__",
            BinOp::Mod => "__mod__",
            BinOp::Pow => "__pow__",
            BinOp::BitAnd => "__and__",
            BinOp::BitOr => "__or__",
            BinOp::BitXor => "__xor__",
            BinOp::Shl => "__lshift__",
            BinOp::Shr => "__rshift__",
            BinOp::Eq => "__eq__",
            BinOp::Ne => "__ne__",
            BinOp::Lt => "__lt__",
            BinOp::Le => "__le__",
            BinOp::Gt => "__gt__",
            BinOp::Ge => "__ge__",
            BinOp::In => "__contains__",
            BinOp::NotIn | BinOp::And | BinOp::Or => unreachable!("composite operator"),
        }
    }
}

impl Context {
    pub fn unary_op(&mut self, op: UnOp, v: ObjId) -> OpResult {
        match op {
            UnOp::Pos => self.call_method(v, "__pos__", &[], None),
            UnOp::Neg => self.call_method(v, "__neg__", &[], None),
            UnOp::BitNot => self.call_method(v, "__invert__", &[], None),
            UnOp::Not => {
                let b = self.to_bool(v)?;
                Ok(self.new_bool(!b))
            }
            UnOp::Bool => self.convert_bool(v),
            UnOp::Int => self.convert_int(v),
            UnOp::Float => self.convert_float(v),
            UnOp::Str => self.convert_str(v),
            UnOp::Repr => self.convert_repr(v),
            UnOp::Len => self.convert_len(v),
            UnOp::Hash => self.convert_hash(v),
        }
    }

    pub fn binary_op(&mut self, op: BinOp, lhs: ObjId, rhs: ObjId) -> OpResult {
        match op {
            BinOp::Add
            | BinOp::Sub
            | BinOp::Mul
            | BinOp::Div
            | BinOp::FloorDiv
            | BinOp::Mod
            | BinOp::Pow
            | BinOp::BitAnd
            | BinOp::BitOr
            | BinOp::BitXor
            | BinOp::Shl
            | BinOp::Shr => self.call_method(lhs, op.dunder(), &[rhs], None),
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let result = self.call_method(lhs, op.dunder(), &[rhs], None)?;
                self.expect_bool_result(result, op.dunder())
            }
            BinOp::In => {
                // `x in c` dispatches on the container.
                let result = self.call_method(rhs, "__contains__", &[lhs], None)?;
                self.expect_bool_result(result, "__contains__")
            }
            BinOp::NotIn => {
                let contained = self.binary_op(BinOp::In, lhs, rhs)?;
                let b = self.get_bool(contained).unwrap_or(false);
                Ok(self.new_bool(!b))
            }
            BinOp::And => {
                if !self.to_bool(lhs)? {
                    return Ok(self.new_bool(false));
                }
                let b = self.to_bool(rhs)?;
                Ok(self.new_bool(b))
            }
            BinOp::Or => {
                if self.to_bool(lhs)? {
                    return Ok(self.new_bool(true));
                }
                let b = self.to_bool(rhs)?;
                Ok(self.new_bool(b))
            }
        }
    }

    pub fn get_index(&mut self, obj: ObjId, index: ObjId) -> OpResult {
        self.call_method(obj, "__getitem__", &[index], None)
    }

    pub fn set_index(&mut self, obj: ObjId, index: ObjId, value: ObjId) -> OpResult {
        self.call_method(obj, "__setitem__", &[index, value], None)
    }

    fn expect_bool_result(&mut self, result: ObjId, dunder: &str) -> OpResult {
        if self.is_bool(result) {
            Ok(result)
        } else {
            Err(self.raise(
                ExcKind::TypeError,
                &format!("{dunder}() returned a non bool type"),
            ))
        }
    }

    // ---- checked conversions ------------------------------------------

    /// `bool(v)` as a plain Rust bool.
    pub fn to_bool(&mut self, v: ObjId) -> Result<bool, Raised> {
        let b = self.convert_bool(v)?;
        Ok(matches!(self.heap.get(b).payload, Payload::Bool(true)))
    }

    pub(crate) fn convert_bool(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__nonzero__", &[], None)?;
        if self.is_bool(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__nonzero__() returned a non bool type"))
        }
    }

    pub(crate) fn convert_int(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__int__", &[], None)?;
        if self.is_int(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__int__() returned a non int type"))
        }
    }

    pub(crate) fn convert_float(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__float__", &[], None)?;
        if self.is_float(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__float__() returned a non float type"))
        }
    }

    pub(crate) fn convert_str(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__str__", &[], None)?;
        if self.is_str(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__str__() returned a non str type"))
        }
    }

    pub(crate) fn convert_repr(&mut self, v: ObjId) -> OpResult {
        if let Payload::Str(s) = &self.heap.get(v).payload {
            let quoted = format!("'{s}'");
            return self.new_str(&quoted);
        }
        self.convert_str(v)
    }

    pub(crate) fn convert_len(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__len__", &[], None)?;
        if self.is_int(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__len__() returned a non int type"))
        }
    }

    pub(crate) fn convert_hash(&mut self, v: ObjId) -> OpResult {
        let result = self.call_method(v, "__hash__", &[], None)?;
        if self.is_int(result) {
            Ok(result)
        } else {
            Err(self.raise(ExcKind::TypeError, "__hash__() returned a non int type"))
        }
    }

    /// `len(v)` as a plain count.
    pub fn value_len(&mut self, v: ObjId) -> Result<usize, Raised> {
        let n = self.convert_len(v)?;
        match self.heap.get(n).payload {
            Payload::Int(i) if i >= 0 => Ok(i as usize),
            _ => Err(self.raise(ExcKind::ValueError, "__len__() returned a negative length")),
        }
    }
}
