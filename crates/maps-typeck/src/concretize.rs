//! Concretization: choosing a native representation for every value.
//!
//! Runs after resolution. Literals still typed `NumberLiteral` or `Number`
//! become Int when their text allows it and Float otherwise. Calls to the
//! generic arithmetic builtins are narrowed to the widest numeric type among
//! their arguments. Pure constants are substituted at their use sites
//! unless `debug-no-inline` is set. Anything that ends up without a native
//! type is a compile error.

use rustc_hash::FxHashSet;

use crate::ast::{DefId, DefinitionBody, ExprId, ExprKind, StatementKind, StmtId};
use crate::call::create_call;
use crate::error::CompileError;
use crate::inline;
use crate::resolve::negation_for;
use crate::state::CompilationState;
use crate::ty::{Builtin, DeferredBool, Type};

/// Concretize a single expression tree.
pub fn concretize(state: &mut CompilationState, id: ExprId) -> Result<(), CompileError> {
    Concretizer::new(state).expr(id)
}

/// Concretize everything reachable from the unit's root statements,
/// reporting each failure. Returns `is_valid`.
pub fn concretize_all(state: &mut CompilationState) -> bool {
    let roots = state.ast.roots().to_vec();
    let mut concretizer = Concretizer::new(state);
    for stmt in roots {
        concretizer.statement(stmt);
    }
    state.is_valid
}

struct Concretizer<'a> {
    state: &'a mut CompilationState,
    /// Definitions whose body is being concretized or substituted right now.
    in_progress: FxHashSet<DefId>,
    done: FxHashSet<DefId>,
}

impl<'a> Concretizer<'a> {
    fn new(state: &'a mut CompilationState) -> Self {
        Concretizer {
            state,
            in_progress: FxHashSet::default(),
            done: FxHashSet::default(),
        }
    }

    fn report(&mut self, result: Result<(), CompileError>) {
        if let Err(err) = result {
            if !err.is_already_reported() {
                self.state.error(err);
            }
        }
    }

    // ── Statements ──

    fn statement(&mut self, id: StmtId) {
        match self.state.ast.stmt(id).kind.clone() {
            StatementKind::Expression(expr) | StatementKind::Return(expr) => {
                let result = self.expr(expr);
                self.report(result);
            }
            StatementKind::Let(def) => {
                let result = self.definition(def);
                self.report(result);
            }
            StatementKind::Block(stmts) => {
                for stmt in stmts {
                    self.statement(stmt);
                }
            }
            StatementKind::Empty | StatementKind::Deleted => {}
        }
    }

    /// Concretize a definition's body once. Errors inside it are reported
    /// here; callers only learn that the body is unusable.
    fn definition(&mut self, def: DefId) -> Result<(), CompileError> {
        let body = match self.state.ast.def(def).body {
            DefinitionBody::Expression(body) => body,
            DefinitionBody::Statement(stmt) => {
                if self.done.insert(def) {
                    self.statement(stmt);
                }
                return Ok(());
            }
            DefinitionBody::Builtin | DefinitionBody::Undefined => return Ok(()),
        };
        if self.done.contains(&def) || self.in_progress.contains(&def) {
            return Ok(());
        }

        self.in_progress.insert(def);
        let result = self.expr(body);
        self.in_progress.remove(&def);
        self.done.insert(def);

        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                let span = err.span();
                self.report(Err(err));
                Err(CompileError::ContainsError { span })
            }
        }
    }

    // ── Expressions ──

    fn expr(&mut self, id: ExprId) -> Result<(), CompileError> {
        let expr = self.state.ast.expr(id);
        let (span, ty) = (expr.span, expr.ty.clone());
        match expr.kind.clone() {
            ExprKind::KnownValue(_) => self.value(id)?,
            ExprKind::Reference(def) | ExprKind::OperatorReference(def) => {
                self.reference(id, def)?
            }
            ExprKind::Call { callee, args } => self.call(id, callee, args)?,
            ExprKind::PartiallyAppliedMinus(inner) => self.negation(id, inner)?,
            ExprKind::Empty => return Err(CompileError::EmptyExpression { span }),
            ExprKind::SyntaxError => return Err(CompileError::ContainsError { span }),
            ExprKind::Termed(_)
            | ExprKind::MinusSign
            | ExprKind::MissingArg
            | ExprKind::NotImplemented
            | ExprKind::Deleted => {
                return Err(CompileError::NotConcretizable { ty, span })
            }
        }
        self.check_declared(id)?;
        self.ensure_native(id)
    }

    fn value(&mut self, id: ExprId) -> Result<(), CompileError> {
        let ty = self.state.ast.expr(id).ty.clone();
        if ty.is_native() == DeferredBool::True {
            return Ok(());
        }
        if ty.concretize(self.state.ast.expr_mut(id)) {
            let expr = self.state.ast.expr(id);
            log::debug!(
                "concretized literal at {}..{} to {}",
                expr.span.start,
                expr.span.end,
                expr.ty
            );
            return Ok(());
        }

        let expr = self.state.ast.expr(id);
        match (&expr.kind, ty.is_numeric()) {
            (ExprKind::KnownValue(value), DeferredBool::True) => {
                Err(CompileError::InvalidNumber {
                    text: value.to_string(),
                    span: expr.span,
                })
            }
            _ => Err(CompileError::NotConcretizable { ty, span: expr.span }),
        }
    }

    /// Substitute `id` with the body of `def` and concretize the result.
    fn try_inline(&mut self, id: ExprId, def: DefId) -> Result<bool, CompileError> {
        if self.in_progress.contains(&def) || !inline::inline(self.state, id) {
            return Ok(false);
        }
        self.in_progress.insert(def);
        let result = self.expr(id);
        self.in_progress.remove(&def);
        result.map(|()| true)
    }

    fn reference(&mut self, id: ExprId, def: DefId) -> Result<(), CompileError> {
        if self.try_inline(id, def)? {
            return Ok(());
        }
        self.definition(def)?;

        let ty = self.state.ast.definition_type(def);
        let definition = self.state.ast.def(def);
        if ty.is(Builtin::Absurd) {
            return Err(CompileError::ContainsError {
                span: self.state.ast.expr(id).span,
            });
        }
        if definition.is_undefined() && ty.is(Builtin::Hole) {
            return Err(CompileError::Undefined {
                name: definition.name.clone(),
                span: self.state.ast.expr(id).span,
            });
        }
        self.state.ast.expr_mut(id).ty = ty;
        Ok(())
    }

    fn call(&mut self, id: ExprId, callee: DefId, args: Vec<ExprId>) -> Result<(), CompileError> {
        let callee_type = self.state.ast.definition_type(callee);
        let span = self.state.ast.expr(id).span;

        if self.state.ast.is_partial_call(id) {
            let bound = args
                .iter()
                .filter(|arg| !matches!(self.state.ast.expr(**arg).kind, ExprKind::MissingArg))
                .count();
            return Err(CompileError::ArityShortfall {
                callee: self.state.ast.def(callee).name.clone(),
                expected: callee_type.arity(),
                found: bound,
                span,
            });
        }

        if args.is_empty() && self.try_inline(id, callee)? {
            return Ok(());
        }
        self.definition(callee)?;

        for &arg in &args {
            self.expr(arg)?;
        }

        let Some(function) = callee_type.as_function() else {
            self.state.ast.expr_mut(id).ty = callee_type.clone();
            return Ok(());
        };

        // Generic numeric parameters all take the widest argument type.
        let numeric_args: Vec<ExprId> = args
            .iter()
            .zip(&function.param_types)
            .filter(|(_, param)| param.is(Builtin::Number))
            .map(|(arg, _)| *arg)
            .collect();
        let unified = if numeric_args
            .iter()
            .any(|arg| self.state.ast.expr(*arg).ty.is(Builtin::Float))
        {
            Type::FLOAT
        } else {
            Type::INT
        };

        for (&arg, param) in args.iter().zip(&function.param_types) {
            let target = if param.is(Builtin::Number) {
                &unified
            } else {
                param
            };
            self.coerce(arg, target)?;
        }

        if function.return_type.is(Builtin::Number) {
            self.state.ast.expr_mut(id).ty = unified;
        }
        Ok(())
    }

    fn coerce(&mut self, arg: ExprId, target: &Type) -> Result<(), CompileError> {
        let expr = self.state.ast.expr_mut(arg);
        if expr.ty == *target {
            return Ok(());
        }
        let from = expr.ty.clone();
        if matches!(expr.kind, ExprKind::KnownValue(_)) && from.cast_to(target, expr) {
            return Ok(());
        }
        if target.is(Builtin::Float) && self.widens_to_float(arg) {
            self.widen_to_float(arg);
            return Ok(());
        }
        Err(CompileError::TypeMismatch {
            expected: target.clone(),
            found: from,
            span: self.state.ast.expr(arg).span,
        })
    }

    // ── Widening ──

    /// The callee a call should use once its operands are Float, if the
    /// call can be re-typed at all: generic arithmetic keeps its callee,
    /// Int negation switches to Float negation.
    fn float_callee(&self, callee: DefId) -> Option<DefId> {
        let builtins = &self.state.builtins;
        if callee == builtins.unary_minus {
            return Some(builtins.unary_minus_float);
        }
        let ty = self.state.ast.definition_type(callee);
        let function = ty.as_function()?;
        function.return_type.is(Builtin::Number).then_some(callee)
    }

    /// Arguments of `callee` that follow the call's own type when re-typed.
    fn follows_call_type(&self, callee: DefId, param: &Type) -> bool {
        callee == self.state.builtins.unary_minus || param.is(Builtin::Number)
    }

    /// Whether the Int subtree `id` can be rebuilt as Float: literals, and
    /// generic arithmetic or negation over such subtrees.
    fn widens_to_float(&self, id: ExprId) -> bool {
        let expr = self.state.ast.expr(id);
        if expr.ty.is(Builtin::Float) {
            return true;
        }
        if !expr.ty.is(Builtin::Int) {
            return false;
        }
        match &expr.kind {
            ExprKind::KnownValue(_) => true,
            ExprKind::Call { callee, args } => {
                if self.float_callee(*callee).is_none() {
                    return false;
                }
                let callee_type = self.state.ast.definition_type(*callee);
                let Some(function) = callee_type.as_function() else {
                    return false;
                };
                args.iter()
                    .zip(&function.param_types)
                    .filter(|(_, param)| self.follows_call_type(*callee, param))
                    .all(|(arg, _)| self.widens_to_float(*arg))
            }
            _ => false,
        }
    }

    /// Rebuild `id` as Float. Only called after `widens_to_float`.
    fn widen_to_float(&mut self, id: ExprId) {
        let expr = self.state.ast.expr(id);
        if expr.ty.is(Builtin::Float) {
            return;
        }
        match expr.kind.clone() {
            ExprKind::KnownValue(_) => {
                let expr = self.state.ast.expr_mut(id);
                Type::INT.cast_to(&Type::FLOAT, expr);
            }
            ExprKind::Call { callee, args } => {
                let Some(float_callee) = self.float_callee(callee) else {
                    return;
                };
                let callee_type = self.state.ast.definition_type(callee);
                if let Some(function) = callee_type.as_function() {
                    for (&arg, param) in args.iter().zip(&function.param_types) {
                        if self.follows_call_type(callee, param) {
                            self.widen_to_float(arg);
                        }
                    }
                }
                let expr = self.state.ast.expr_mut(id);
                expr.kind = ExprKind::Call {
                    callee: float_callee,
                    args,
                };
                expr.ty = Type::FLOAT;
                log::debug!("widened call to `{}` to Float", self.state.ast.def(float_callee).name);
            }
            _ => {}
        }
    }

    /// A lone `-x` becomes a negation call once `x` has a native type.
    fn negation(&mut self, id: ExprId, inner: ExprId) -> Result<(), CompileError> {
        self.expr(inner)?;
        let negate = negation_for(self.state, inner);
        let span = self.state.ast.expr(id).span;
        let state = &mut *self.state;
        let call = create_call(&mut state.types, &mut state.ast, negate, vec![inner], span)?;
        state.ast.replace_expr(id, call);
        self.expr(id)
    }

    fn check_declared(&mut self, id: ExprId) -> Result<(), CompileError> {
        let expr = self.state.ast.expr(id);
        let Some(declared) = expr.declared_type.clone() else {
            return Ok(());
        };
        if expr.ty == declared {
            return Ok(());
        }
        self.coerce(id, &declared)
    }

    fn ensure_native(&self, id: ExprId) -> Result<(), CompileError> {
        let expr = self.state.ast.expr(id);
        if expr.ty.is_native() == DeferredBool::True {
            return Ok(());
        }
        Err(CompileError::NotConcretizable {
            ty: expr.ty.clone(),
            span: expr.span,
        })
    }
}
