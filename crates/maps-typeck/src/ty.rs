//! Type representation for the Maps gradual type system.
//!
//! A [`Type`] is either one of the fixed builtins, a user-declared named
//! type, or a [`FunctionType`] handed out by the
//! [`TypeStore`](crate::store::TypeStore). Equality on `Type` is
//! structural everywhere; pointer identity of store-issued function types is
//! only a memoization guarantee, checked with [`Type::is_identical`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ast::Expression;
use crate::cast::{self, CastFn, ConcretizeFn};

/// Identifier of a type within one [`TypeStore`](crate::store::TypeStore).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// A three-valued answer for type attributes that may not be known yet.
///
/// Literal types are provisional, so "not decided" has to be kept apart from
/// "decided no".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeferredBool {
    True,
    False,
    Maybe,
}

impl DeferredBool {
    /// `True` only if every input is `True`, `False` if any is `False`.
    pub fn all(values: impl IntoIterator<Item = DeferredBool>) -> DeferredBool {
        let mut result = DeferredBool::True;
        for value in values {
            match value {
                DeferredBool::False => return DeferredBool::False,
                DeferredBool::Maybe => result = DeferredBool::Maybe,
                DeferredBool::True => {}
            }
        }
        result
    }
}

impl From<bool> for DeferredBool {
    fn from(value: bool) -> Self {
        if value {
            DeferredBool::True
        } else {
            DeferredBool::False
        }
    }
}

/// The builtin types every store starts with. Discriminants are their ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Builtin {
    /// Valueless: errors and empty expressions.
    Absurd = 0,
    /// Not known yet. Must never reach code generation.
    Hole = 1,
    Void = 2,
    Boolean = 3,
    Int = 4,
    Float = 5,
    String = 6,
    /// Abstract numeric operand type of generic arithmetic.
    Number = 7,
    /// A numeric literal whose representation is undecided.
    NumberLiteral = 8,
}

impl Builtin {
    pub const ALL: [Builtin; 9] = [
        Builtin::Absurd,
        Builtin::Hole,
        Builtin::Void,
        Builtin::Boolean,
        Builtin::Int,
        Builtin::Float,
        Builtin::String,
        Builtin::Number,
        Builtin::NumberLiteral,
    ];

    pub fn id(self) -> TypeId {
        TypeId(self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Absurd => "Absurd",
            Builtin::Hole => "Hole",
            Builtin::Void => "Void",
            Builtin::Boolean => "Boolean",
            Builtin::Int => "Int",
            Builtin::Float => "Float",
            Builtin::String => "String",
            Builtin::Number => "Number",
            Builtin::NumberLiteral => "NumberLiteral",
        }
    }

    pub fn is_native(self) -> DeferredBool {
        match self {
            Builtin::Void | Builtin::Boolean | Builtin::Int | Builtin::Float | Builtin::String => {
                DeferredBool::True
            }
            Builtin::Hole => DeferredBool::Maybe,
            Builtin::Absurd | Builtin::Number | Builtin::NumberLiteral => DeferredBool::False,
        }
    }

    pub fn is_castable_to_native(self) -> DeferredBool {
        match self {
            Builtin::Absurd => DeferredBool::False,
            Builtin::Hole => DeferredBool::Maybe,
            _ => DeferredBool::True,
        }
    }

    pub fn is_numeric(self) -> DeferredBool {
        match self {
            Builtin::Int | Builtin::Float | Builtin::Number | Builtin::NumberLiteral => {
                DeferredBool::True
            }
            Builtin::Hole => DeferredBool::Maybe,
            _ => DeferredBool::False,
        }
    }

    pub fn is_integral(self) -> DeferredBool {
        match self {
            Builtin::Int => DeferredBool::True,
            Builtin::Hole | Builtin::Number | Builtin::NumberLiteral => DeferredBool::Maybe,
            _ => DeferredBool::False,
        }
    }
}

/// A user-declared nominal type.
///
/// Identity is the name; the store id is excluded from `PartialEq` and
/// `Hash` so types from different stores still compare by value.
#[derive(Clone)]
pub struct NamedType {
    pub id: TypeId,
    pub name: String,
    pub is_type_alias: bool,
    pub cast_fn: CastFn,
    pub concretize_fn: ConcretizeFn,
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.is_type_alias == other.is_type_alias
    }
}

impl Eq for NamedType {}

impl Hash for NamedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.is_type_alias.hash(state);
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_type_alias", &self.is_type_alias)
            .finish()
    }
}

/// A function type. Equal iff return type, parameter types and purity match;
/// `id` is excluded from `PartialEq` and `Hash`.
#[derive(Clone, Debug)]
pub struct FunctionType {
    pub id: TypeId,
    pub return_type: Type,
    pub param_types: Vec<Type>,
    pub is_pure: bool,
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        self.is_pure == other.is_pure
            && self.return_type == other.return_type
            && self.param_types == other.param_types
    }
}

impl Eq for FunctionType {}

impl Hash for FunctionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.return_type.hash(state);
        self.param_types.hash(state);
        self.is_pure.hash(state);
    }
}

impl FunctionType {
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }
}

/// A Maps type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(Builtin),
    Named(Arc<NamedType>),
    Function(Arc<FunctionType>),
}

impl Type {
    pub const ABSURD: Type = Type::Builtin(Builtin::Absurd);
    pub const HOLE: Type = Type::Builtin(Builtin::Hole);
    pub const VOID: Type = Type::Builtin(Builtin::Void);
    pub const BOOLEAN: Type = Type::Builtin(Builtin::Boolean);
    pub const INT: Type = Type::Builtin(Builtin::Int);
    pub const FLOAT: Type = Type::Builtin(Builtin::Float);
    pub const STRING: Type = Type::Builtin(Builtin::String);
    pub const NUMBER: Type = Type::Builtin(Builtin::Number);
    pub const NUMBER_LITERAL: Type = Type::Builtin(Builtin::NumberLiteral);

    pub fn id(&self) -> TypeId {
        match self {
            Type::Builtin(b) => b.id(),
            Type::Named(n) => n.id,
            Type::Function(f) => f.id,
        }
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self {
            Type::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is(&self, builtin: Builtin) -> bool {
        self.builtin() == Some(builtin)
    }

    /// Same store-issued object: builtins by value, everything else by pointer.
    pub fn is_identical(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Builtin(a), Type::Builtin(b)) => a == b,
            (Type::Named(a), Type::Named(b)) => Arc::ptr_eq(a, b),
            (Type::Function(a), Type::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function(_))
    }

    /// Number of parameters; zero for anything that is not a function.
    pub fn arity(&self) -> usize {
        self.as_function().map_or(0, FunctionType::arity)
    }

    /// Non-functions count as pure.
    pub fn is_pure(&self) -> bool {
        self.as_function().map_or(true, |f| f.is_pure)
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, Type::Named(_))
    }

    pub fn is_type_alias(&self) -> bool {
        match self {
            Type::Named(n) => n.is_type_alias,
            _ => false,
        }
    }

    pub fn is_native(&self) -> DeferredBool {
        match self {
            Type::Builtin(b) => b.is_native(),
            Type::Named(_) => DeferredBool::False,
            Type::Function(f) => DeferredBool::all(
                std::iter::once(f.return_type.is_native())
                    .chain(f.param_types.iter().map(Type::is_native)),
            ),
        }
    }

    pub fn is_castable_to_native(&self) -> DeferredBool {
        match self {
            Type::Builtin(b) => b.is_castable_to_native(),
            Type::Named(_) => DeferredBool::Maybe,
            Type::Function(f) => DeferredBool::all(
                std::iter::once(f.return_type.is_castable_to_native())
                    .chain(f.param_types.iter().map(Type::is_castable_to_native)),
            ),
        }
    }

    pub fn is_numeric(&self) -> DeferredBool {
        match self {
            Type::Builtin(b) => b.is_numeric(),
            _ => DeferredBool::False,
        }
    }

    pub fn is_integral(&self) -> DeferredBool {
        match self {
            Type::Builtin(b) => b.is_integral(),
            _ => DeferredBool::False,
        }
    }

    /// Try to coerce `expr`, currently typed `self`, into `target`.
    ///
    /// On success `expr.ty` (and for literals its value) is rewritten. On
    /// failure `expr` is left untouched.
    pub fn cast_to(&self, target: &Type, expr: &mut Expression) -> bool {
        if target.is(Builtin::Hole) || target.is(Builtin::Absurd) {
            return false;
        }
        if self == target {
            return true;
        }
        let cast_fn = match self {
            Type::Builtin(b) => cast::cast_fn(*b),
            Type::Named(n) => n.cast_fn,
            Type::Function(_) => cast::not_castable,
        };
        cast_fn(target, expr)
    }

    /// Force `expr` into its nearest native representation.
    pub fn concretize(&self, expr: &mut Expression) -> bool {
        let concretize_fn = match self {
            Type::Builtin(b) => cast::concretize_fn(*b),
            Type::Named(n) => n.concretize_fn,
            Type::Function(_) => cast::not_concretizable,
        };
        concretize_fn(expr)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Builtin(b) => write!(f, "{}", b.name()),
            Type::Named(n) => write!(f, "{}", n.name),
            Type::Function(func) => {
                write!(f, "(")?;
                for (i, param) in func.param_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                let arrow = if func.is_pure { "->" } else { "=>" };
                write!(f, ") {} {}", arrow, func.return_type)
            }
        }
    }
}
