//! Per-type cast and concretization behaviour.
//!
//! Every builtin type has a cast function (`from` type is implied by which
//! function runs) and a concretize function. Casts only ever rewrite
//! `KnownValue` expressions; anything else is rejected and left untouched.

use crate::ast::{ExprKind, Expression, Value};
use crate::ty::{Builtin, Type};

/// Coerce an expression of the owning type into `target`.
pub type CastFn = fn(target: &Type, expr: &mut Expression) -> bool;

/// Force an expression of the owning type into a native type.
pub type ConcretizeFn = fn(expr: &mut Expression) -> bool;

pub(crate) fn cast_fn(builtin: Builtin) -> CastFn {
    match builtin {
        Builtin::Absurd | Builtin::Hole | Builtin::Void => not_castable,
        Builtin::Boolean => cast_from_boolean,
        Builtin::Int => cast_from_int,
        Builtin::Float => cast_from_float,
        Builtin::String => cast_from_string,
        Builtin::Number | Builtin::NumberLiteral => cast_from_number,
    }
}

pub(crate) fn concretize_fn(builtin: Builtin) -> ConcretizeFn {
    match builtin {
        Builtin::Absurd | Builtin::Hole => not_concretizable,
        Builtin::Void | Builtin::Boolean | Builtin::Int | Builtin::Float | Builtin::String => {
            is_concrete
        }
        Builtin::Number | Builtin::NumberLiteral => concretize_number,
    }
}

fn set_value(expr: &mut Expression, value: Value, ty: Type) {
    expr.kind = ExprKind::KnownValue(value);
    expr.ty = ty;
}

fn known_value(expr: &Expression) -> Option<&Value> {
    match &expr.kind {
        ExprKind::KnownValue(value) => Some(value),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    text.parse::<i64>().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

pub fn not_castable(_target: &Type, _expr: &mut Expression) -> bool {
    false
}

fn cast_from_boolean(target: &Type, expr: &mut Expression) -> bool {
    let Some(&Value::Boolean(b)) = known_value(expr) else {
        return false;
    };
    if target.is(Builtin::String) {
        let text = if b { "true" } else { "false" };
        set_value(expr, Value::String(text.to_string()), Type::STRING);
        return true;
    }
    false
}

fn cast_from_int(target: &Type, expr: &mut Expression) -> bool {
    let Some(&Value::Int(i)) = known_value(expr) else {
        return false;
    };
    match target.builtin() {
        Some(Builtin::Float) => set_value(expr, Value::Float(i as f64), Type::FLOAT),
        Some(Builtin::String) => set_value(expr, Value::String(i.to_string()), Type::STRING),
        _ => return false,
    }
    true
}

fn cast_from_float(target: &Type, expr: &mut Expression) -> bool {
    let Some(&Value::Float(x)) = known_value(expr) else {
        return false;
    };
    if target.is(Builtin::String) {
        set_value(expr, Value::String(format!("{:.6}", x)), Type::STRING);
        return true;
    }
    false
}

fn cast_from_string(target: &Type, expr: &mut Expression) -> bool {
    let Some(Value::String(text)) = known_value(expr) else {
        return false;
    };
    match target.builtin() {
        Some(Builtin::Int) => match parse_int(text) {
            Some(i) => set_value(expr, Value::Int(i), Type::INT),
            None => return false,
        },
        Some(Builtin::Float) => match parse_float(text) {
            Some(x) => set_value(expr, Value::Float(x), Type::FLOAT),
            None => return false,
        },
        _ => return false,
    }
    true
}

/// `Number` and `NumberLiteral` values carry either their literal text or an
/// already-parsed numeric value.
fn cast_from_number(target: &Type, expr: &mut Expression) -> bool {
    let Some(value) = known_value(expr) else {
        return false;
    };
    let converted = match (target.builtin(), value) {
        (Some(Builtin::Int), Value::String(text)) => parse_int(text).map(Value::Int),
        (Some(Builtin::Int), Value::Int(i)) => Some(Value::Int(*i)),
        (Some(Builtin::Float), Value::String(text)) => parse_float(text).map(Value::Float),
        (Some(Builtin::Float), Value::Int(i)) => Some(Value::Float(*i as f64)),
        (Some(Builtin::Float), Value::Float(x)) => Some(Value::Float(*x)),
        (Some(Builtin::String), Value::String(text)) => Some(Value::String(text.clone())),
        (Some(Builtin::String), Value::Int(i)) => Some(Value::String(i.to_string())),
        (Some(Builtin::String), Value::Float(x)) => Some(Value::String(format!("{:.6}", x))),
        _ => None,
    };
    match converted {
        Some(value) => {
            set_value(expr, value, target.clone());
            true
        }
        None => false,
    }
}

fn is_concrete(_expr: &mut Expression) -> bool {
    true
}

pub fn not_concretizable(_expr: &mut Expression) -> bool {
    false
}

/// Int if the value fits one, else Float.
fn concretize_number(expr: &mut Expression) -> bool {
    cast_from_number(&Type::INT, expr) || cast_from_number(&Type::FLOAT, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maps_common::Span;

    fn literal(value: Value, ty: Type) -> Expression {
        Expression::new(ExprKind::KnownValue(value), ty, Span::new(0, 3))
    }

    #[test]
    fn string_to_int_rejects_trailing_garbage() {
        let mut expr = literal(Value::String("12a".into()), Type::STRING);
        assert!(!Type::STRING.cast_to(&Type::INT, &mut expr));
        assert_eq!(expr.kind, ExprKind::KnownValue(Value::String("12a".into())));
        assert_eq!(expr.ty, Type::STRING);
    }

    #[test]
    fn number_literal_to_string_keeps_text() {
        let mut expr = literal(Value::String("007".into()), Type::NUMBER_LITERAL);
        assert!(Type::NUMBER_LITERAL.cast_to(&Type::STRING, &mut expr));
        assert_eq!(expr.kind, ExprKind::KnownValue(Value::String("007".into())));
        assert_eq!(expr.ty, Type::STRING);
    }

    #[test]
    fn int_to_string() {
        let mut expr = literal(Value::Int(-42), Type::INT);
        assert!(Type::INT.cast_to(&Type::STRING, &mut expr));
        assert_eq!(expr.kind, ExprKind::KnownValue(Value::String("-42".into())));
    }

    #[test]
    fn never_cast_to_sentinels() {
        let mut expr = literal(Value::Int(1), Type::INT);
        assert!(!Type::INT.cast_to(&Type::HOLE, &mut expr));
        assert!(!Type::INT.cast_to(&Type::ABSURD, &mut expr));
        assert_eq!(expr.ty, Type::INT);
    }

    #[test]
    fn cast_to_same_type_is_a_no_op() {
        let mut expr = literal(Value::Boolean(false), Type::BOOLEAN);
        assert!(Type::BOOLEAN.cast_to(&Type::BOOLEAN, &mut expr));
        assert_eq!(expr.kind, ExprKind::KnownValue(Value::Boolean(false)));
    }

    #[test]
    fn concretize_number_literal_falls_back_to_float() {
        let mut expr = literal(Value::String("1e3".into()), Type::NUMBER_LITERAL);
        assert!(Type::NUMBER_LITERAL.concretize(&mut expr));
        assert_eq!(expr.kind, ExprKind::KnownValue(Value::Float(1000.0)));
        assert_eq!(expr.ty, Type::FLOAT);
    }

    #[test]
    fn concretize_rejects_garbage() {
        let mut expr = literal(Value::String("1.2.3".into()), Type::NUMBER_LITERAL);
        assert!(!Type::NUMBER_LITERAL.concretize(&mut expr));
        assert_eq!(expr.ty, Type::NUMBER_LITERAL);
    }

    #[test]
    fn only_known_values_cast() {
        let mut expr = Expression::new(ExprKind::MissingArg, Type::INT, Span::new(0, 0));
        assert!(!Type::INT.cast_to(&Type::FLOAT, &mut expr));
        assert_eq!(expr.kind, ExprKind::MissingArg);
    }
}
