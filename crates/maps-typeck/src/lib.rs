//! Resolution and type checking for the Maps language.
//!
//! Name resolution hands this crate termed expressions: ordered runs of
//! operands, operator references and minus signs. [`resolve`] turns each
//! run into a call tree using the operators' own fixity and precedence,
//! [`call`] binds and coerces arguments as calls are built, and
//! [`concretize`] picks native representations for the numeric types that
//! stayed abstract through resolution.
//!
//! The type system is gradual: `Hole` marks a type that is not yet known and
//! `Absurd` marks the type of erroneous expressions. Function types are
//! interned in a per-unit [`TypeStore`], so types with the same signature
//! are identical.

pub mod ast;
pub mod builtins;
pub mod call;
pub mod cast;
pub mod concretize;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod inline;
pub mod resolve;
pub mod state;
pub mod store;
pub mod ty;

pub use ast::{AstStore, DefId, ExprId, ExprKind, Expression, StmtId, Value};
pub use diagnostics::{render_all, render_diagnostic};
pub use error::{CompileError, Diagnostic};
pub use state::CompilationState;
pub use store::TypeStore;
pub use ty::{Builtin, DeferredBool, Type};

/// Resolve every queued termed expression, then concretize the unit.
///
/// Both passes run even when resolution fails, so every error in the unit
/// is reported. Returns whether the unit is valid.
pub fn check(state: &mut CompilationState) -> bool {
    let resolved = state.resolve_all();
    let concretized = concretize::concretize_all(state);
    log::info!(
        "checked unit: {} diagnostics, resolved: {}, concretized: {}",
        state.diagnostics().len(),
        resolved,
        concretized
    );
    state.is_valid
}
