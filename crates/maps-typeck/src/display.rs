//! Human-readable rendering of expression trees, for logs and tests.
//!
//! Binary operator calls print infix and parenthesized, other calls print
//! as `name(args)`, unbound slots as `_`. With the `print-all-types` option
//! every node is followed by `: Type`.

use maps_common::{CompilerOption, CompilerOptions};

use crate::ast::{AstStore, ExprId, ExprKind, Fixity, Value};
use crate::ty::Builtin;

pub fn expression_to_string(ast: &AstStore, id: ExprId) -> String {
    let mut out = String::new();
    let with_types = CompilerOptions::get_bool(CompilerOption::PrintAllTypes);
    write_expression(ast, id, with_types, &mut out);
    out
}

fn write_expression(ast: &AstStore, id: ExprId, with_types: bool, out: &mut String) {
    let expr = ast.expr(id);
    match &expr.kind {
        ExprKind::KnownValue(Value::String(text)) if expr.ty.is(Builtin::String) => {
            out.push('"');
            out.push_str(text);
            out.push('"');
        }
        ExprKind::KnownValue(value) => out.push_str(&value.to_string()),
        ExprKind::Reference(def) | ExprKind::OperatorReference(def) => {
            out.push_str(&ast.def(*def).name)
        }
        ExprKind::Call { callee, args } => {
            let definition = ast.def(*callee);
            let is_binary = matches!(
                definition.operator.map(|op| op.fixity),
                Some(Fixity::Binary { .. })
            );
            if is_binary && args.len() == 2 {
                out.push('(');
                write_expression(ast, args[0], with_types, out);
                out.push(' ');
                out.push_str(&definition.name);
                out.push(' ');
                write_expression(ast, args[1], with_types, out);
                out.push(')');
            } else {
                out.push_str(&definition.name);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_expression(ast, *arg, with_types, out);
                }
                out.push(')');
            }
        }
        ExprKind::Termed(terms) => {
            out.push('[');
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_expression(ast, *term, with_types, out);
            }
            out.push(']');
        }
        ExprKind::PartiallyAppliedMinus(inner) => {
            out.push('-');
            write_expression(ast, *inner, with_types, out);
        }
        ExprKind::MinusSign => out.push('-'),
        ExprKind::MissingArg => out.push('_'),
        ExprKind::Empty => out.push_str("()"),
        ExprKind::SyntaxError => out.push_str("<syntax error>"),
        ExprKind::NotImplemented => out.push_str("<not implemented>"),
        ExprKind::Deleted => out.push_str("<deleted>"),
    }
    if with_types {
        out.push_str(": ");
        out.push_str(&expr.ty.to_string());
    }
}
