//! Built-in definitions.
//!
//! Registers the functions and operators every compilation unit starts
//! with. Arithmetic is typed over the abstract `Number`, which is narrowed
//! to Int or Float when the call is concretized.

use rustc_hash::FxHashMap;

use crate::ast::{Associativity, AstStore, DefId, Operator};
use crate::store::TypeStore;
use crate::ty::Type;

/// Handles to the builtin definitions.
#[derive(Clone, Debug)]
pub struct Builtins {
    pub print: DefId,
    pub plus: DefId,
    pub minus: DefId,
    pub times: DefId,
    pub divide: DefId,
    pub equals: DefId,
    pub not: DefId,
    /// Prefix negation, target of `-x`.
    pub unary_minus: DefId,
    /// Negation of values that are not integers.
    pub unary_minus_float: DefId,
    by_name: FxHashMap<&'static str, DefId>,
}

impl Builtins {
    pub fn get(&self, name: &str) -> Option<DefId> {
        self.by_name.get(name).copied()
    }
}

/// Register all builtins into `ast`, creating their types in `types`.
///
/// | name          | type                       | operator             |
/// |---------------|----------------------------|----------------------|
/// | `print`       | `(String) => Void`         |                      |
/// | `+` `-`       | `(Number, Number) -> Number` | binary, 1, left    |
/// | `*`           | `(Number, Number) -> Number` | binary, 2, left    |
/// | `/`           | `(Number, Number) -> Number` | binary, 3, left    |
/// | `==`          | `(Number, Number) -> Boolean`| binary, 0, left    |
/// | `!`           | `(Boolean) -> Boolean`     | prefix               |
/// | `unary_minus` | `(Int) -> Int`             | prefix               |
/// | `unary_minus_float` | `(Float) -> Float`   | prefix               |
pub fn register_builtins(types: &mut TypeStore, ast: &mut AstStore) -> Builtins {
    let mut by_name = FxHashMap::default();

    // ── Functions ──────────────────────────────────────────────────

    let string_to_void = types.get_function_type(&Type::VOID, &[Type::STRING], false);
    let print = ast.define_builtin("print", string_to_void, None);
    by_name.insert("print", print);

    // ── Arithmetic ─────────────────────────────────────────────────

    let arithmetic = types.get_function_type(&Type::NUMBER, &[Type::NUMBER, Type::NUMBER], true);
    let mut binary = |name: &'static str, precedence: u32, ty: &Type| {
        let def = ast.define_builtin(
            name,
            ty.clone(),
            Some(Operator::binary(precedence, Associativity::Left)),
        );
        by_name.insert(name, def);
        def
    };
    let plus = binary("+", 1, &arithmetic);
    let minus = binary("-", 1, &arithmetic);
    let times = binary("*", 2, &arithmetic);
    let divide = binary("/", 3, &arithmetic);

    let comparison =
        types.get_function_type(&Type::BOOLEAN, &[Type::NUMBER, Type::NUMBER], true);
    let equals = binary("==", 0, &comparison);

    // ── Unary ──────────────────────────────────────────────────────

    let bool_to_bool = types.get_function_type(&Type::BOOLEAN, &[Type::BOOLEAN], true);
    let not = ast.define_builtin("!", bool_to_bool, Some(Operator::prefix()));
    by_name.insert("!", not);

    let int_to_int = types.get_function_type(&Type::INT, &[Type::INT], true);
    let unary_minus = ast.define_builtin("unary_minus", int_to_int, Some(Operator::prefix()));
    by_name.insert("unary_minus", unary_minus);

    let float_to_float = types.get_function_type(&Type::FLOAT, &[Type::FLOAT], true);
    let unary_minus_float =
        ast.define_builtin("unary_minus_float", float_to_float, Some(Operator::prefix()));
    by_name.insert("unary_minus_float", unary_minus_float);

    Builtins {
        print,
        plus,
        minus,
        times,
        divide,
        equals,
        not,
        unary_minus,
        unary_minus_float,
        by_name,
    }
}
