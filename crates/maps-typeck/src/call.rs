//! Call construction and argument coercion.

use maps_common::Span;

use crate::ast::{AstStore, DefId, ExprId, ExprKind, Expression};
use crate::error::CompileError;
use crate::store::TypeStore;
use crate::ty::{Builtin, DeferredBool, Type};

/// Build (but do not allocate) a call of `callee` with `args`.
///
/// Arguments are coerced to the parameter types in place. `MissingArg`
/// entries, and positions past the end of `args`, are unbound; if any
/// remain the call is partial and its type is the function type over the
/// unbound parameters, otherwise it is the callee's return type.
pub fn create_call(
    types: &mut TypeStore,
    ast: &mut AstStore,
    callee: DefId,
    args: Vec<ExprId>,
    span: Span,
) -> Result<Expression, CompileError> {
    let callee_type = ast.definition_type(callee);

    let Some(function) = callee_type.as_function() else {
        if !args.is_empty() {
            return Err(CompileError::NotAFunction {
                name: ast.def(callee).name.clone(),
                ty: callee_type.clone(),
                span,
            });
        }
        return Ok(Expression::new(
            ExprKind::Call { callee, args },
            callee_type.clone(),
            span,
        ));
    };

    if args.len() > function.arity() {
        return Err(CompileError::TooManyArguments {
            callee: ast.def(callee).name.clone(),
            expected: function.arity(),
            found: args.len(),
            span,
        });
    }

    for (&arg, param) in args.iter().zip(&function.param_types) {
        coerce_arg(ast, arg, param)?;
    }

    let unbound: Vec<Type> = function
        .param_types
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            args.get(*i)
                .map_or(true, |arg| matches!(ast.expr(*arg).kind, ExprKind::MissingArg))
        })
        .map(|(_, ty)| ty.clone())
        .collect();

    let ty = if unbound.is_empty() {
        function.return_type.clone()
    } else {
        types.get_function_type(&function.return_type, &unbound, function.is_pure)
    };

    Ok(Expression::new(ExprKind::Call { callee, args }, ty, span))
}

/// Make `arg` acceptable as a `param`, casting known values when needed.
fn coerce_arg(ast: &mut AstStore, arg: ExprId, param: &Type) -> Result<(), CompileError> {
    let expr = ast.expr_mut(arg);

    if matches!(expr.kind, ExprKind::MissingArg) {
        if expr.ty.is(Builtin::Hole) {
            expr.ty = param.clone();
        }
        return Ok(());
    }

    if expr.ty == *param || expr.ty.is(Builtin::Absurd) || param.is(Builtin::Hole) {
        return Ok(());
    }

    if expr.ty.is(Builtin::Hole) {
        expr.ty = param.clone();
        return Ok(());
    }

    // Numbers stay deferred until the call is concretized.
    if param.is(Builtin::Number) && expr.ty.is_numeric() == DeferredBool::True {
        return Ok(());
    }
    if expr.ty.is(Builtin::Number) && param.is_numeric() == DeferredBool::True {
        return Ok(());
    }

    if matches!(expr.kind, ExprKind::KnownValue(_)) {
        let from = expr.ty.clone();
        if from.cast_to(param, expr) {
            return Ok(());
        }
        return Err(CompileError::CastFailure {
            from,
            to: param.clone(),
            span: expr.span,
        });
    }

    Err(CompileError::TypeMismatch {
        expected: param.clone(),
        found: expr.ty.clone(),
        span: expr.span,
    })
}
