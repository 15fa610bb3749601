//! Constant substitution of references and nullary calls.
//!
//! A use site is replaced by a fresh copy of its definition's body when the
//! definition is pure and fully defined, and either takes no parameters or
//! the use site asks for exactly the definition's type. Impure and
//! forward-declared definitions are never substituted.

use maps_common::{CompilerOption, CompilerOptions};

use crate::ast::{DefId, DefinitionBody, ExprId, ExprKind};
use crate::state::CompilationState;

/// Try to substitute the reference or call `id`. Returns whether it was
/// replaced.
pub fn inline(state: &mut CompilationState, id: ExprId) -> bool {
    if CompilerOptions::get_bool(CompilerOption::DebugNoInline) {
        return false;
    }

    match &state.ast.expr(id).kind {
        ExprKind::Reference(def) => {
            let def = *def;
            substitute_value_reference(state, id, def)
        }
        ExprKind::Call { callee, args } => {
            let (callee, nullary) = (*callee, args.is_empty());
            inline_call(state, id, callee, nullary)
        }
        _ => false,
    }
}

fn inline_call(state: &mut CompilationState, id: ExprId, callee: DefId, nullary: bool) -> bool {
    if !state.ast.definition_type(callee).is_pure() || !nullary {
        return false;
    }

    let original = state.ast.expr(id).kind.clone();
    state.ast.expr_mut(id).kind = ExprKind::Reference(callee);
    if substitute_value_reference(state, id, callee) {
        log::debug!("inlined nullary call to `{}`", state.ast.def(callee).name);
        return true;
    }
    state.ast.expr_mut(id).kind = original;
    false
}

fn substitute_value_reference(state: &mut CompilationState, id: ExprId, def: DefId) -> bool {
    let definition = state.ast.def(def);
    let body = match definition.body {
        DefinitionBody::Expression(body) => body,
        DefinitionBody::Undefined => {
            log::debug!("`{}` is undefined, not substituting", definition.name);
            return false;
        }
        DefinitionBody::Statement(_) | DefinitionBody::Builtin => return false,
    };

    let expr = state.ast.expr(id);
    if let (Some(callee_declared), Some(declared)) =
        (&definition.declared_type, &expr.declared_type)
    {
        if callee_declared != declared {
            log::warn!(
                "not substituting `{}`: declared types differ ({} != {})",
                definition.name,
                declared,
                callee_declared
            );
            return false;
        }
    }

    let callee_type = state.ast.definition_type(def);
    if callee_type.is_function() {
        if !callee_type.is_pure() {
            log::debug!("`{}` is impure, not substituting", definition.name);
            return false;
        }
        let declared_matches = expr.declared_type.as_ref() == Some(&callee_type);
        if !declared_matches && callee_type.arity() != 0 {
            return false;
        }
    }

    let body_kind = &state.ast.expr(body).kind;
    if body_kind.is_sentinel()
        || matches!(
            body_kind,
            ExprKind::Termed(_) | ExprKind::MinusSign | ExprKind::MissingArg
        )
    {
        return false;
    }

    let name = definition.name.clone();
    let copy = state.ast.deep_copy(body);
    state.ast.replace_expr(id, copy);
    log::debug!("substituted value of `{}`", name);
    true
}
