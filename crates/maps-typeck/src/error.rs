//! Compile errors raised while resolving and concretizing expressions.
//!
//! Errors are collected into [`CompilationState`](crate::state::CompilationState)
//! rather than aborting, so one pass reports as many problems as it finds.

use std::fmt;

use maps_common::{Severity, Span};

use crate::ty::Type;

#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    /// Name resolution found no definition for an identifier.
    UnknownIdentifier { name: String, span: Span },
    /// Name resolution found no definition for an operator.
    UnknownOperator { name: String, span: Span },
    /// A requested coercion is undefined for these types.
    CastFailure { from: Type, to: Type, span: Span },
    /// Numeric text that is neither an Int nor a Float.
    InvalidNumber { text: String, span: Span },
    /// Precedence climbing ended with other than one operand.
    StackNotReduced { remaining: usize, span: Span },
    /// Types disagree and no cast bridges them.
    TypeMismatch { expected: Type, found: Type, span: Span },
    /// A call that still leaves parameters unbound where a value is needed.
    ArityShortfall {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    TooManyArguments {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    NotAFunction { name: String, ty: Type, span: Span },
    /// Two operands with no operator between them.
    ExpectedOperator { span: Span },
    /// An operator with nothing to apply to.
    MissingOperand { span: Span },
    /// A term kind that cannot appear in a termed expression.
    UnexpectedTerm { what: &'static str, span: Span },
    /// No native representation could be chosen.
    NotConcretizable { ty: Type, span: Span },
    /// An empty expression used where a value is needed.
    EmptyExpression { span: Span },
    /// Reference to a forward declaration that never got a body.
    Undefined { name: String, span: Span },
    /// The expression contains a term that already failed upstream. Never
    /// reported again.
    ContainsError { span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnknownIdentifier { span, .. }
            | CompileError::UnknownOperator { span, .. }
            | CompileError::CastFailure { span, .. }
            | CompileError::InvalidNumber { span, .. }
            | CompileError::StackNotReduced { span, .. }
            | CompileError::TypeMismatch { span, .. }
            | CompileError::ArityShortfall { span, .. }
            | CompileError::TooManyArguments { span, .. }
            | CompileError::NotAFunction { span, .. }
            | CompileError::ExpectedOperator { span }
            | CompileError::MissingOperand { span }
            | CompileError::UnexpectedTerm { span, .. }
            | CompileError::NotConcretizable { span, .. }
            | CompileError::EmptyExpression { span }
            | CompileError::Undefined { span, .. }
            | CompileError::ContainsError { span } => *span,
        }
    }

    /// Errors that were already reported where they originated.
    pub fn is_already_reported(&self) -> bool {
        matches!(self, CompileError::ContainsError { .. })
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownIdentifier { name, .. } => {
                write!(f, "unknown identifier `{}`", name)
            }
            CompileError::UnknownOperator { name, .. } => {
                write!(f, "unknown operator `{}`", name)
            }
            CompileError::CastFailure { from, to, .. } => {
                write!(f, "cannot cast `{}` to `{}`", from, to)
            }
            CompileError::InvalidNumber { text, .. } => {
                write!(f, "{} is not a valid number", text)
            }
            CompileError::StackNotReduced { remaining, .. } => {
                write!(
                    f,
                    "internal error: expression reduced to {} operands instead of 1",
                    remaining
                )
            }
            CompileError::TypeMismatch {
                expected, found, ..
            } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)
            }
            CompileError::ArityShortfall {
                callee,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "`{}` expects {} arguments, only {} given",
                    callee, expected, found
                )
            }
            CompileError::TooManyArguments {
                callee,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "too many arguments to `{}`: expected {}, found {}",
                    callee, expected, found
                )
            }
            CompileError::NotAFunction { name, ty, .. } => {
                write!(f, "`{}` has type `{}` and cannot be called", name, ty)
            }
            CompileError::ExpectedOperator { .. } => write!(f, "expected an operator"),
            CompileError::MissingOperand { .. } => write!(f, "operator is missing an operand"),
            CompileError::UnexpectedTerm { what, .. } => {
                write!(f, "unexpected {} in expression", what)
            }
            CompileError::NotConcretizable { ty, .. } => {
                write!(f, "cannot decide a concrete type for a value of type `{}`", ty)
            }
            CompileError::EmptyExpression { .. } => write!(f, "empty expression has no value"),
            CompileError::Undefined { name, .. } => write!(f, "`{}` is undefined", name),
            CompileError::ContainsError { .. } => {
                write!(f, "expression contains an earlier error")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// A reported error together with its severity.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: CompileError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.error)
    }
}
