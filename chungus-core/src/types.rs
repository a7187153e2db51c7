//! Type system for Chungus.
//!
//! The language has a handful of value types, a dynamic `any` used for
//! parameters and array elements, and `void` for functions without `ret`.
//! This module only knows about types; resolving names and walking the tree
//! is done by [`crate::typecheck`].

use core::fmt;

use crate::ast::{BinaryOp, CastTarget, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Str,
    Bool,
    Array,
    /// Dynamically typed: accepted everywhere, accepts everything.
    Any,
    /// Result of calling a function without `ret`.
    Void,
}

impl Type {
    /// `int`, `float` or `any`.
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Any)
    }

    /// Usable as an array index: `int` or `any`.
    pub fn is_index(self) -> bool {
        matches!(self, Type::Int | Type::Any)
    }

    /// Usable as an indexable or growable array: `array` or `any`.
    pub fn is_array_like(self) -> bool {
        matches!(self, Type::Array | Type::Any)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Str => "string",
            Type::Bool => "bool",
            Type::Array => "array",
            Type::Any => "any",
            Type::Void => "void",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of inferring an expression.
///
/// `Unknown` means an error was already recorded for the expression (or one
/// of its operands); consumers propagate it without reporting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inferred {
    Known(Type),
    Unknown,
}

impl Inferred {
    pub fn known(self) -> Option<Type> {
        match self {
            Inferred::Known(ty) => Some(ty),
            Inferred::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Inferred::Unknown
    }

    /// The known type, or `fallback` when unknown.
    pub fn or(self, fallback: Type) -> Type {
        self.known().unwrap_or(fallback)
    }
}

impl From<Type> for Inferred {
    fn from(ty: Type) -> Self {
        Inferred::Known(ty)
    }
}

impl fmt::Display for Inferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inferred::Known(ty) => ty.fmt(f),
            Inferred::Unknown => f.write_str("unknown"),
        }
    }
}

/// Whether a value of type `from` may be stored where `to` is expected.
///
/// The table is one-directional and deliberately asymmetric:
///
/// | from \ to | int | float | string | bool |
/// |-----------|-----|-------|--------|------|
/// | int       | yes | yes   | yes    | yes  |
/// | float     | no  | yes   | yes    | no   |
/// | string    | no  | no    | yes    | no   |
/// | bool      | no  | no    | no     | yes  |
///
/// `array` only matches `array`, `any` matches everything in both
/// directions, and nothing can be stored into `void`.
pub fn is_compatible(from: Type, to: Type) -> bool {
    use Type::*;
    match (from, to) {
        (_, Void) | (Void, _) => false,
        (Any, _) | (_, Any) => true,
        (Int, Int | Float | Str | Bool) => true,
        (Float, Float | Str) => true,
        (Str, Str) => true,
        (Bool, Bool) => true,
        (Array, Array) => true,
        _ => false,
    }
}

/// Result type of `lhs op rhs`, or `None` when the operator does not apply.
pub fn binary_result(op: BinaryOp, lhs: Type, rhs: Type) -> Option<Type> {
    use Type::*;
    if op.is_arithmetic() {
        return match (lhs, rhs) {
            (Int, Int) => Some(Int),
            (Int | Float, Int | Float) => Some(Float),
            (Any, Int | Float | Any) | (Int | Float, Any) => Some(Any),
            (Str, Str) if op == BinaryOp::Add => Some(Str),
            (Any, Str) | (Str, Any) if op == BinaryOp::Add => Some(Any),
            _ => None,
        };
    }
    if op.is_comparison() {
        return (lhs.is_numeric() && rhs.is_numeric()).then_some(Bool);
    }
    let logical = |ty: Type| matches!(ty, Bool | Any);
    (logical(lhs) && logical(rhs)).then_some(Bool)
}

pub fn unary_result(op: UnaryOp, operand: Type) -> Option<Type> {
    match op {
        UnaryOp::Not => matches!(operand, Type::Bool | Type::Any).then_some(Type::Bool),
        UnaryOp::Neg => operand.is_numeric().then_some(operand),
    }
}

/// `int(..)` / `float(..)` accept numbers, strings and `any`.
pub fn cast_result(target: CastTarget, operand: Type) -> Option<Type> {
    if !matches!(operand, Type::Int | Type::Float | Type::Str | Type::Any) {
        return None;
    }
    Some(match target {
        CastTarget::Int => Type::Int,
        CastTarget::Float => Type::Float,
    })
}
