//! Flat-term resolution.
//!
//! Turns a termed expression (an ordered run of already name-resolved terms)
//! into a call tree. Operator fixity, precedence and associativity are data
//! on the operator's definition, so the grammar is not fixed: this is
//! precedence climbing over a classified term stream.
//!
//! - Operands directly following a function operand are its arguments
//!   (juxtaposition), up to the function's arity.
//! - Prefix and postfix operators apply to the adjacent operand before any
//!   binary operator is considered.
//! - A binary operator reduces pending operators that bind at least as
//!   tightly, then waits for its right operand.
//! - A binary operator with no left (or right) operand is a section: the
//!   empty side becomes a `MissingArg`.
//!
//! The resolved node keeps its identity; only its kind and type change.

use maps_common::Span;

use crate::ast::{Associativity, DefId, ExprId, ExprKind, Expression, Fixity, Value};
use crate::call::create_call;
use crate::error::CompileError;
use crate::state::CompilationState;
use crate::ty::{Builtin, DeferredBool, Type};

// ── Binding Power ──────────────────────────────────────────────────────

/// Returns (left_bp, right_bp) for a binary operator.
///
/// Left-associative: left < right, so an operator of the same precedence
/// arriving later reduces the pending one first. Right- and
/// both-associative operators swap the pair so the later one nests.
/// Computed in `u64` so every `u32` precedence has distinct powers.
fn binding_power(precedence: u32, associativity: Associativity) -> (u64, u64) {
    let base = u64::from(precedence) * 2 + 1;
    match associativity {
        Associativity::Left => (base, base + 1),
        Associativity::Right | Associativity::Both => (base + 1, base),
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingOp {
    def: DefId,
    l_bp: u64,
    r_bp: u64,
    span: Span,
}

/// A term after classification.
#[derive(Debug, Clone, Copy)]
enum Term {
    Operand(ExprId),
    Prefix(DefId, Span),
    Postfix(DefId, Span),
    Binary(PendingOp),
    MinusSign(Span),
}

// ── Entry Point ────────────────────────────────────────────────────────

/// Resolve the termed expression `id` in place.
///
/// Nodes that are not termed expressions are left alone. On failure the
/// node becomes a `SyntaxError`, the unit is marked invalid, and the error
/// is recorded unless it stems from a term that had already failed.
pub fn resolve(state: &mut CompilationState, id: ExprId) -> Result<(), CompileError> {
    let (terms, span) = match &state.ast.expr(id).kind {
        ExprKind::Termed(terms) => (terms.clone(), state.ast.expr(id).span),
        _ => return Ok(()),
    };

    log::trace!("resolving {} terms at {}..{}", terms.len(), span.start, span.end);

    match resolve_terms(state, &terms, span) {
        Ok(resolved) => {
            state.ast.replace_expr(id, resolved);
            log::debug!(
                "resolved termed expression at {}..{} to {}",
                span.start,
                span.end,
                state.ast.expr(id).ty
            );
            Ok(())
        }
        Err(err) => {
            let expr = state.ast.expr_mut(id);
            expr.kind = ExprKind::SyntaxError;
            expr.ty = Type::ABSURD;
            state.is_valid = false;
            if !err.is_already_reported() {
                state.error(err.clone());
            }
            Err(err)
        }
    }
}

fn resolve_terms(
    state: &mut CompilationState,
    terms: &[ExprId],
    span: Span,
) -> Result<Expression, CompileError> {
    match terms {
        [] => Ok(Expression::sentinel(ExprKind::Empty, span)),
        [only] => {
            let mut resolver = Resolver::new(state, terms, span);
            match resolver.classify(*only)? {
                Term::Operand(id) => Ok(resolver.state.ast.expr(id).clone()),
                Term::MinusSign(span) => Err(CompileError::MissingOperand { span }),
                // A lone operator is a value referring to it.
                Term::Prefix(..) | Term::Postfix(..) | Term::Binary(_) => {
                    Ok(resolver.state.ast.expr(*only).clone())
                }
            }
        }
        [first, second] if matches!(state.ast.expr(*first).kind, ExprKind::MinusSign) => {
            let mut resolver = Resolver::new(state, terms, span);
            match resolver.classify(*second)? {
                Term::Operand(operand)
                    if resolver.state.ast.expr(operand).ty.is_numeric() == DeferredBool::True =>
                {
                    Ok(partially_applied_minus(resolver.state, operand, span))
                }
                _ => resolver.run(),
            }
        }
        _ => Resolver::new(state, terms, span).run(),
    }
}

/// `-x` on its own: keep the operand, remember the negation.
fn partially_applied_minus(state: &CompilationState, operand: ExprId, span: Span) -> Expression {
    let ty = if state.ast.expr(operand).ty.is(Builtin::Float) {
        Type::FLOAT
    } else {
        Type::INT
    };
    Expression::new(ExprKind::PartiallyAppliedMinus(operand), ty, span)
}

/// The negation builtin suited to `operand`: Float negation for values that
/// are or will become floats, Int negation otherwise.
pub(crate) fn negation_for(state: &CompilationState, operand: ExprId) -> DefId {
    let expr = state.ast.expr(operand);
    let is_float = match (&expr.kind, expr.ty.builtin()) {
        (_, Some(Builtin::Float)) => true,
        (ExprKind::KnownValue(Value::String(text)), Some(Builtin::NumberLiteral)) => {
            text.parse::<i64>().is_err()
        }
        _ => false,
    };
    if is_float {
        state.builtins.unary_minus_float
    } else {
        state.builtins.unary_minus
    }
}

// ── Resolver ───────────────────────────────────────────────────────────

struct Resolver<'a> {
    state: &'a mut CompilationState,
    terms: &'a [ExprId],
    pos: usize,
    span: Span,
    operands: Vec<ExprId>,
    ops: Vec<PendingOp>,
    /// Prefix operators waiting for their operand, outermost first.
    prefixes: Vec<(DefId, Span)>,
    expect_operand: bool,
}

impl<'a> Resolver<'a> {
    fn new(state: &'a mut CompilationState, terms: &'a [ExprId], span: Span) -> Self {
        Resolver {
            state,
            terms,
            pos: 0,
            span,
            operands: Vec::new(),
            ops: Vec::new(),
            prefixes: Vec::new(),
            expect_operand: true,
        }
    }

    fn run(mut self) -> Result<Expression, CompileError> {
        while self.pos < self.terms.len() {
            let id = self.terms[self.pos];
            self.pos += 1;
            let term = self.classify(id)?;
            log::trace!("term {:?}, expecting operand: {}", term, self.expect_operand);

            match term {
                Term::Operand(operand) => {
                    if !self.expect_operand {
                        return Err(CompileError::ExpectedOperator {
                            span: self.state.ast.expr(operand).span,
                        });
                    }
                    let operand = self.normalize_operand(operand)?;
                    let operand = self.apply_juxtaposed(operand)?;
                    let operand = self.apply_prefixes(operand)?;
                    self.operands.push(operand);
                    self.expect_operand = false;
                }
                Term::MinusSign(span) => {
                    if self.expect_operand {
                        self.prefixes.push((self.state.builtins.unary_minus, span));
                    } else {
                        let minus = self.state.builtins.minus;
                        let op = self.pending_binary(minus, span).ok_or(
                            CompileError::UnexpectedTerm {
                                what: "minus sign",
                                span,
                            },
                        )?;
                        self.push_binary(op)?;
                    }
                }
                Term::Prefix(def, span) => {
                    if !self.expect_operand {
                        return Err(CompileError::UnexpectedTerm {
                            what: "prefix operator",
                            span,
                        });
                    }
                    self.prefixes.push((def, span));
                }
                Term::Postfix(def, span) => {
                    if self.expect_operand {
                        return Err(CompileError::MissingOperand { span });
                    }
                    let operand = self.pop_operand()?;
                    let applied = self.call(def, vec![operand], span)?;
                    self.operands.push(applied);
                }
                Term::Binary(op) => {
                    if self.expect_operand {
                        if !self.operands.is_empty()
                            || !self.ops.is_empty()
                            || !self.prefixes.is_empty()
                        {
                            return Err(CompileError::MissingOperand { span: op.span });
                        }
                        // Left section: `(+ 1)`.
                        let missing = self.state.ast.missing_arg(Type::HOLE, op.span);
                        self.operands.push(missing);
                    }
                    self.push_binary(op)?;
                }
            }
        }

        if self.expect_operand {
            if let Some(&(_, span)) = self.prefixes.last() {
                return Err(CompileError::MissingOperand { span });
            }
            match self.ops.last() {
                // Right section: `(1 +)`.
                Some(op) => {
                    let missing = self.state.ast.missing_arg(Type::HOLE, op.span);
                    self.operands.push(missing);
                }
                None => return Err(CompileError::MissingOperand { span: self.span }),
            }
        }

        while let Some(op) = self.ops.pop() {
            self.reduce(op)?;
        }

        match self.operands.as_slice() {
            [result] => Ok(self.state.ast.expr(*result).clone()),
            rest => Err(CompileError::StackNotReduced {
                remaining: rest.len(),
                span: self.span,
            }),
        }
    }

    // ── Terms ──

    /// Classify one term, resolving it first if it is itself termed.
    fn classify(&mut self, id: ExprId) -> Result<Term, CompileError> {
        let span = self.state.ast.expr(id).span;
        if matches!(self.state.ast.expr(id).kind, ExprKind::Termed(_)) {
            resolve(self.state, id).map_err(|_| CompileError::ContainsError { span })?;
        }
        // The definition may have been resolved since the reference was made.
        if let ExprKind::Reference(def) | ExprKind::OperatorReference(def) =
            self.state.ast.expr(id).kind
        {
            let ty = self.state.ast.definition_type(def);
            self.state.ast.expr_mut(id).ty = ty;
        }
        match &self.state.ast.expr(id).kind {
            ExprKind::SyntaxError => Err(CompileError::ContainsError { span }),
            ExprKind::NotImplemented => Err(CompileError::UnexpectedTerm {
                what: "unimplemented construct",
                span,
            }),
            ExprKind::Deleted => Err(CompileError::UnexpectedTerm {
                what: "deleted expression",
                span,
            }),
            ExprKind::MinusSign => Ok(Term::MinusSign(span)),
            ExprKind::OperatorReference(def) => {
                let def = *def;
                let fixity = self.state.ast.def(def).operator.map(|op| op.fixity);
                Ok(match fixity {
                    Some(Fixity::Prefix) => Term::Prefix(def, span),
                    Some(Fixity::Postfix) => Term::Postfix(def, span),
                    Some(Fixity::Binary { .. }) => match self.pending_binary(def, span) {
                        Some(op) => Term::Binary(op),
                        None => Term::Operand(id),
                    },
                    None => Term::Operand(id),
                })
            }
            ExprKind::Termed(_)
            | ExprKind::Empty
            | ExprKind::KnownValue(_)
            | ExprKind::Reference(_)
            | ExprKind::Call { .. }
            | ExprKind::PartiallyAppliedMinus(_)
            | ExprKind::MissingArg => Ok(Term::Operand(id)),
        }
    }

    fn pending_binary(&self, def: DefId, span: Span) -> Option<PendingOp> {
        match self.state.ast.def(def).operator?.fixity {
            Fixity::Binary {
                precedence,
                associativity,
            } => {
                let (l_bp, r_bp) = binding_power(precedence, associativity);
                Some(PendingOp {
                    def,
                    l_bp,
                    r_bp,
                    span,
                })
            }
            Fixity::Prefix | Fixity::Postfix => None,
        }
    }

    /// A partially applied minus inside a longer run is an ordinary negation.
    fn normalize_operand(&mut self, id: ExprId) -> Result<ExprId, CompileError> {
        let ExprKind::PartiallyAppliedMinus(inner) = self.state.ast.expr(id).kind else {
            return Ok(id);
        };
        let negate = negation_for(self.state, inner);
        let span = self.state.ast.expr(id).span;
        self.call(negate, vec![inner], span)
    }

    /// Number of argument slots juxtaposed operands may still fill.
    fn open_slots(&self, id: ExprId) -> usize {
        let expr = self.state.ast.expr(id);
        match &expr.kind {
            ExprKind::Reference(def) => self.state.ast.definition_type(*def).arity(),
            ExprKind::Call { callee, args } if self.state.ast.is_partial_call(id) => {
                let arity = self.state.ast.definition_type(*callee).arity();
                let missing = args
                    .iter()
                    .filter(|arg| matches!(self.state.ast.expr(**arg).kind, ExprKind::MissingArg))
                    .count();
                arity.saturating_sub(args.len()) + missing
            }
            _ => 0,
        }
    }

    /// Take following operand terms as arguments of `callee`, if it is a
    /// function with open parameters.
    fn apply_juxtaposed(&mut self, callee: ExprId) -> Result<ExprId, CompileError> {
        let slots = self.open_slots(callee);
        let mut args = Vec::new();
        while args.len() < slots && self.pos < self.terms.len() {
            let next = self.terms[self.pos];
            match self.classify(next)? {
                Term::Operand(arg) => {
                    self.pos += 1;
                    args.push(self.normalize_operand(arg)?);
                }
                _ => break,
            }
        }
        if args.is_empty() {
            return Ok(callee);
        }

        let callee_expr = self.state.ast.expr(callee).clone();
        let span = args
            .iter()
            .fold(callee_expr.span, |span, arg| span.merge(self.state.ast.expr(*arg).span));

        match callee_expr.kind {
            ExprKind::Reference(def) => self.call(def, args, span),
            ExprKind::Call {
                callee: def,
                args: bound,
            } => {
                let mut fresh = args.into_iter();
                let mut combined: Vec<ExprId> = bound
                    .into_iter()
                    .map(|arg| {
                        if matches!(self.state.ast.expr(arg).kind, ExprKind::MissingArg) {
                            fresh.next().unwrap_or(arg)
                        } else {
                            arg
                        }
                    })
                    .collect();
                combined.extend(fresh);
                self.call(def, combined, span)
            }
            _ => Ok(callee),
        }
    }

    fn apply_prefixes(&mut self, mut operand: ExprId) -> Result<ExprId, CompileError> {
        while let Some((def, span)) = self.prefixes.pop() {
            let def = if def == self.state.builtins.unary_minus {
                negation_for(self.state, operand)
            } else {
                def
            };
            let span = span.merge(self.state.ast.expr(operand).span);
            operand = self.call(def, vec![operand], span)?;
        }
        Ok(operand)
    }

    // ── Stacks ──

    fn push_binary(&mut self, op: PendingOp) -> Result<(), CompileError> {
        while let Some(top) = self.ops.last().copied() {
            if top.r_bp <= op.l_bp {
                break;
            }
            self.ops.pop();
            self.reduce(top)?;
        }
        self.ops.push(op);
        self.expect_operand = true;
        Ok(())
    }

    fn pop_operand(&mut self) -> Result<ExprId, CompileError> {
        self.operands.pop().ok_or(CompileError::StackNotReduced {
            remaining: 0,
            span: self.span,
        })
    }

    fn reduce(&mut self, op: PendingOp) -> Result<(), CompileError> {
        let rhs = self.pop_operand()?;
        let lhs = self.pop_operand()?;
        let span = self
            .state
            .ast
            .expr(lhs)
            .span
            .merge(self.state.ast.expr(rhs).span);
        let call = self.call(op.def, vec![lhs, rhs], span)?;
        self.operands.push(call);
        Ok(())
    }

    fn call(&mut self, callee: DefId, args: Vec<ExprId>, span: Span) -> Result<ExprId, CompileError> {
        let state = &mut *self.state;
        let expr = create_call(&mut state.types, &mut state.ast, callee, args, span)?;
        Ok(state.ast.alloc_expr(expr))
    }
}
