//! Arena-owned AST nodes consumed and produced by the resolver.
//!
//! Expressions, definitions and statements live in [`AstStore`] for the
//! whole compilation unit and are addressed by index handles. Nodes are
//! never freed; a node that is logically removed becomes
//! [`ExprKind::Deleted`] / [`StatementKind::Deleted`].

use std::fmt;

use maps_common::Span;

use crate::ty::Type;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub u32);

/// A compile-time known value.
///
/// Numeric literals whose representation is undecided are stored as
/// `String` text with type `NumberLiteral` until cast or concretized.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Result of resolving zero terms.
    Empty,
    KnownValue(Value),
    Reference(DefId),
    OperatorReference(DefId),
    /// Unstructured input to the resolver.
    Termed(Vec<ExprId>),
    Call {
        callee: DefId,
        args: Vec<ExprId>,
    },
    MinusSign,
    PartiallyAppliedMinus(ExprId),
    /// An unfilled parameter slot in a partial call.
    MissingArg,
    SyntaxError,
    NotImplemented,
    Deleted,
}

impl ExprKind {
    /// Kinds that are always typed `Absurd`.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            ExprKind::Empty | ExprKind::SyntaxError | ExprKind::NotImplemented | ExprKind::Deleted
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    /// Never absent: unknown is `Hole`.
    pub ty: Type,
    pub declared_type: Option<Type>,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExprKind, ty: Type, span: Span) -> Self {
        Self {
            kind,
            ty,
            declared_type: None,
            span,
        }
    }

    pub fn sentinel(kind: ExprKind, span: Span) -> Self {
        debug_assert!(kind.is_sentinel());
        Self::new(kind, Type::ABSURD, span)
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::KnownValue(v) => Some(v),
            _ => None,
        }
    }
}

/// Operator position and binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
    Binary {
        precedence: u32,
        associativity: Associativity,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    Both,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Operator {
    pub fixity: Fixity,
}

impl Operator {
    pub fn prefix() -> Self {
        Operator { fixity: Fixity::Prefix }
    }

    pub fn postfix() -> Self {
        Operator { fixity: Fixity::Postfix }
    }

    pub fn binary(precedence: u32, associativity: Associativity) -> Self {
        Operator {
            fixity: Fixity::Binary {
                precedence,
                associativity,
            },
        }
    }

    pub fn is_unary(&self) -> bool {
        !matches!(self.fixity, Fixity::Binary { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DefinitionBody {
    Expression(ExprId),
    Statement(StmtId),
    Builtin,
    /// Forward-declared, never given a body.
    Undefined,
}

/// A named binding, possibly an operator.
#[derive(Clone, Debug)]
pub struct Definition {
    pub name: String,
    pub body: DefinitionBody,
    pub declared_type: Option<Type>,
    pub operator: Option<Operator>,
    pub span: Span,
}

impl Definition {
    pub fn is_undefined(&self) -> bool {
        matches!(self.body, DefinitionBody::Undefined)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    Expression(ExprId),
    Let(DefId),
    Return(ExprId),
    Block(Vec<StmtId>),
    Empty,
    Deleted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

// ── Store ──────────────────────────────────────────────────────────────

/// Arena for every node of one compilation unit.
#[derive(Debug, Default)]
pub struct AstStore {
    expressions: Vec<Expression>,
    definitions: Vec<Definition>,
    statements: Vec<Statement>,
    roots: Vec<StmtId>,
}

impl AstStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&self, id: ExprId) -> &Expression {
        &self.expressions[id.0 as usize]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expression {
        &mut self.expressions[id.0 as usize]
    }

    pub fn def(&self, id: DefId) -> &Definition {
        &self.definitions[id.0 as usize]
    }

    pub fn def_mut(&mut self, id: DefId) -> &mut Definition {
        &mut self.definitions[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.statements[id.0 as usize]
    }

    pub fn roots(&self) -> &[StmtId] {
        &self.roots
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn alloc_expr(&mut self, expr: Expression) -> ExprId {
        let id = ExprId(self.expressions.len() as u32);
        self.expressions.push(expr);
        id
    }

    pub fn alloc_def(&mut self, def: Definition) -> DefId {
        let id = DefId(self.definitions.len() as u32);
        self.definitions.push(def);
        id
    }

    pub fn alloc_stmt(&mut self, kind: StatementKind, span: Span) -> StmtId {
        let id = StmtId(self.statements.len() as u32);
        self.statements.push(Statement { kind, span });
        id
    }

    pub fn push_root(&mut self, stmt: StmtId) {
        self.roots.push(stmt);
    }

    // ── Expression constructors ──

    pub fn int(&mut self, value: i64, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(ExprKind::KnownValue(Value::Int(value)), Type::INT, span))
    }

    pub fn float(&mut self, value: f64, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(
            ExprKind::KnownValue(Value::Float(value)),
            Type::FLOAT,
            span,
        ))
    }

    pub fn boolean(&mut self, value: bool, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(
            ExprKind::KnownValue(Value::Boolean(value)),
            Type::BOOLEAN,
            span,
        ))
    }

    pub fn string(&mut self, value: impl Into<String>, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(
            ExprKind::KnownValue(Value::String(value.into())),
            Type::STRING,
            span,
        ))
    }

    /// A numeric literal kept as text until its representation is decided.
    pub fn number_literal(&mut self, text: impl Into<String>, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(
            ExprKind::KnownValue(Value::String(text.into())),
            Type::NUMBER_LITERAL,
            span,
        ))
    }

    pub fn reference(&mut self, def: DefId, span: Span) -> ExprId {
        let ty = self.definition_type(def);
        let kind = match self.def(def).operator {
            Some(_) => ExprKind::OperatorReference(def),
            None => ExprKind::Reference(def),
        };
        self.alloc_expr(Expression::new(kind, ty, span))
    }

    pub fn minus_sign(&mut self, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(ExprKind::MinusSign, Type::HOLE, span))
    }

    pub fn termed(&mut self, terms: Vec<ExprId>, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(ExprKind::Termed(terms), Type::HOLE, span))
    }

    pub fn missing_arg(&mut self, ty: Type, span: Span) -> ExprId {
        self.alloc_expr(Expression::new(ExprKind::MissingArg, ty, span))
    }

    pub fn syntax_error(&mut self, span: Span) -> ExprId {
        self.alloc_expr(Expression::sentinel(ExprKind::SyntaxError, span))
    }

    pub fn not_implemented(&mut self, span: Span) -> ExprId {
        self.alloc_expr(Expression::sentinel(ExprKind::NotImplemented, span))
    }

    /// Tombstone an expression in place.
    pub fn delete_expr(&mut self, id: ExprId) {
        let expr = self.expr_mut(id);
        expr.kind = ExprKind::Deleted;
        expr.ty = Type::ABSURD;
    }

    /// Overwrite `id` with `replacement`, keeping its span and declared type.
    pub fn replace_expr(&mut self, id: ExprId, replacement: Expression) {
        let expr = self.expr_mut(id);
        expr.kind = replacement.kind;
        expr.ty = replacement.ty;
    }

    /// Clone an expression subtree into fresh nodes and return the new root
    /// (not allocated). Used when a definition body is substituted at a use
    /// site so that the two copies can be concretized independently.
    pub fn deep_copy(&mut self, id: ExprId) -> Expression {
        let mut copy = self.expr(id).clone();
        copy.kind = match copy.kind {
            ExprKind::Call { callee, args } => {
                let args = args
                    .into_iter()
                    .map(|arg| {
                        let arg_copy = self.deep_copy(arg);
                        self.alloc_expr(arg_copy)
                    })
                    .collect();
                ExprKind::Call { callee, args }
            }
            ExprKind::PartiallyAppliedMinus(inner) => {
                let inner_copy = self.deep_copy(inner);
                ExprKind::PartiallyAppliedMinus(self.alloc_expr(inner_copy))
            }
            ExprKind::Termed(terms) => {
                let terms = terms
                    .into_iter()
                    .map(|term| {
                        let term_copy = self.deep_copy(term);
                        self.alloc_expr(term_copy)
                    })
                    .collect();
                ExprKind::Termed(terms)
            }
            other => other,
        };
        copy
    }

    // ── Definitions ──

    /// A definition whose value is an expression.
    pub fn define(&mut self, name: impl Into<String>, body: ExprId, span: Span) -> DefId {
        self.alloc_def(Definition {
            name: name.into(),
            body: DefinitionBody::Expression(body),
            declared_type: None,
            operator: None,
            span,
        })
    }

    /// A definition with a known type and no body of its own.
    pub fn define_builtin(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        operator: Option<Operator>,
    ) -> DefId {
        self.alloc_def(Definition {
            name: name.into(),
            body: DefinitionBody::Builtin,
            declared_type: Some(ty),
            operator,
            span: Span::synthetic(),
        })
    }

    /// A forward declaration with a type but no body.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type, span: Span) -> DefId {
        self.alloc_def(Definition {
            name: name.into(),
            body: DefinitionBody::Undefined,
            declared_type: Some(ty),
            operator: None,
            span,
        })
    }

    /// The type a reference to `def` has: declared, else the body's.
    pub fn definition_type(&self, def: DefId) -> Type {
        let definition = self.def(def);
        if let Some(ty) = &definition.declared_type {
            return ty.clone();
        }
        match &definition.body {
            DefinitionBody::Expression(body) => self.expr(*body).ty.clone(),
            DefinitionBody::Statement(_) | DefinitionBody::Builtin | DefinitionBody::Undefined => {
                Type::HOLE
            }
        }
    }

    /// Whether the call node `id` leaves any parameter of its callee unbound.
    pub fn is_partial_call(&self, id: ExprId) -> bool {
        let ExprKind::Call { callee, args } = &self.expr(id).kind else {
            return false;
        };
        let arity = self.definition_type(*callee).arity();
        args.len() < arity
            || args
                .iter()
                .any(|arg| matches!(self.expr(*arg).kind, ExprKind::MissingArg))
    }

    /// Every expression reachable from `id`, including `id`, in pre-order.
    pub fn reachable(&self, id: ExprId) -> Vec<ExprId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            match &self.expr(next).kind {
                ExprKind::Call { args, .. } => stack.extend(args.iter().rev()),
                ExprKind::Termed(terms) => stack.extend(terms.iter().rev()),
                ExprKind::PartiallyAppliedMinus(inner) => stack.push(*inner),
                _ => {}
            }
        }
        out
    }
}
