//! Integration tests for flat-term resolution.
//!
//! Each test builds a termed expression the way name resolution would hand
//! it over, drains the worklist, and inspects the resulting call tree.

use maps_common::Span;
use maps_typeck::ast::{Associativity, Operator};
use maps_typeck::display::expression_to_string;
use maps_typeck::{AstStore, Builtin, CompilationState, CompileError, ExprId, ExprKind, Type, Value};

// ── Helpers ────────────────────────────────────────────────────────────

fn sp(start: u32, end: u32) -> Span {
    Span::new(start, end)
}

/// Pre-order shape of a tree: the precedence digit for each binary call,
/// `v` for everything else.
fn shape(ast: &AstStore, id: ExprId) -> String {
    let mut out = String::new();
    write_shape(ast, id, &mut out);
    out
}

fn write_shape(ast: &AstStore, id: ExprId, out: &mut String) {
    match &ast.expr(id).kind {
        ExprKind::Call { callee, args } => {
            match ast.def(*callee).operator.map(|op| op.fixity) {
                Some(maps_typeck::ast::Fixity::Binary { precedence, .. }) => {
                    out.push_str(&precedence.to_string())
                }
                _ => out.push('v'),
            }
            for arg in args {
                write_shape(ast, *arg, out);
            }
        }
        _ => out.push('v'),
    }
}

/// `0 op 1 op 2 ...` with the builtin operator of each given precedence.
fn binary_run(state: &mut CompilationState, precedences: &[u32]) -> ExprId {
    let mut terms = Vec::new();
    let mut offset = 0;
    terms.push(state.ast.int(0, sp(0, 1)));
    for (i, precedence) in precedences.iter().enumerate() {
        let op = match precedence {
            1 => state.builtins.plus,
            2 => state.builtins.times,
            3 => state.builtins.divide,
            other => panic!("no builtin operator with precedence {}", other),
        };
        offset += 2;
        terms.push(state.ast.reference(op, sp(offset, offset + 1)));
        offset += 2;
        terms.push(state.ast.int(i as i64 + 1, sp(offset, offset + 1)));
    }
    state.termed(terms, sp(0, offset + 1))
}

fn resolved(state: &mut CompilationState, id: ExprId) -> String {
    assert!(state.resolve_all(), "errors: {:?}", state.diagnostics());
    expression_to_string(&state.ast, id)
}

fn error_messages(state: &CompilationState) -> Vec<String> {
    state.errors().map(|e| e.to_string()).collect()
}

// ── Precedence and Associativity ───────────────────────────────────────

#[test]
fn test_higher_precedence_nests_deeper() {
    let mut state = CompilationState::new();
    let id = binary_run(&mut state, &[1, 2, 1]);
    assert!(state.resolve_all());
    assert_eq!(shape(&state.ast, id), "11v2vvv");
    insta::assert_snapshot!(expression_to_string(&state.ast, id), @"((0 + (1 * 2)) + 3)");
}

#[test]
fn test_long_mixed_precedence_run() {
    let mut state = CompilationState::new();
    let id = binary_run(&mut state, &[1, 2, 2, 2, 1, 2, 2, 2, 3, 3, 2, 2, 1]);
    assert!(state.resolve_all());
    assert_eq!(shape(&state.ast, id), "111v222vvvv22222vvv33vvvvvv");
}

#[test]
fn test_left_associative_same_precedence() {
    let mut state = CompilationState::new();
    let id = binary_run(&mut state, &[1, 1, 1]);
    insta::assert_snapshot!(resolved(&mut state, id), @"(((0 + 1) + 2) + 3)");
}

#[test]
fn test_right_associative_operator_nests_right() {
    let mut state = CompilationState::new();
    let ty = state
        .types
        .get_function_type(&Type::NUMBER, &[Type::NUMBER, Type::NUMBER], true);
    let pow = state
        .ast
        .define_builtin("^", ty, Some(Operator::binary(4, Associativity::Right)));

    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(pow, sp(2, 3)),
        state.ast.int(2, sp(4, 5)),
        state.ast.reference(pow, sp(6, 7)),
        state.ast.int(3, sp(8, 9)),
    ];
    let id = state.termed(terms, sp(0, 9));
    insta::assert_snapshot!(resolved(&mut state, id), @"(1 ^ (2 ^ 3))");
}

#[test]
fn test_prefix_operator_binds_before_binary() {
    let mut state = CompilationState::new();
    let not = state.builtins.not;
    let equals = state.builtins.equals;
    let terms = vec![
        state.ast.reference(not, sp(0, 1)),
        state.ast.boolean(true, sp(1, 5)),
    ];
    let id = state.termed(terms, sp(0, 5));
    insta::assert_snapshot!(resolved(&mut state, id), @"!(true)");
    assert_eq!(state.ast.expr(id).ty, Type::BOOLEAN);

    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(equals, sp(2, 4)),
        state.ast.int(2, sp(5, 6)),
    ];
    let id = state.termed(terms, sp(0, 6));
    insta::assert_snapshot!(resolved(&mut state, id), @"(1 == 2)");
    assert_eq!(state.ast.expr(id).ty, Type::BOOLEAN);
}

// ── Minus ──────────────────────────────────────────────────────────────

#[test]
fn test_lone_minus_is_partially_applied() {
    let mut state = CompilationState::new();
    let minus = state.ast.minus_sign(sp(0, 1));
    let five = state.ast.int(5, sp(1, 2));
    let id = state.termed(vec![minus, five], sp(0, 2));

    assert!(state.resolve_all());
    assert_eq!(state.ast.expr(id).kind, ExprKind::PartiallyAppliedMinus(five));
    assert_eq!(state.ast.expr(id).ty, Type::INT);
    // the operand is kept as it was
    assert_eq!(state.ast.expr(five).kind, ExprKind::KnownValue(Value::Int(5)));
    insta::assert_snapshot!(expression_to_string(&state.ast, id), @"-5");
}

#[test]
fn test_minus_after_binary_operator_negates() {
    let mut state = CompilationState::new();
    let plus = state.builtins.plus;
    let terms = vec![
        state.ast.int(7, sp(0, 1)),
        state.ast.reference(plus, sp(2, 3)),
        state.ast.minus_sign(sp(4, 5)),
        state.ast.int(2, sp(6, 7)),
    ];
    let id = state.termed(terms, sp(0, 7));
    insta::assert_snapshot!(resolved(&mut state, id), @"(7 + unary_minus(2))");
}

#[test]
fn test_minus_between_operands_subtracts() {
    let mut state = CompilationState::new();
    let terms = vec![
        state.ast.int(7, sp(0, 1)),
        state.ast.minus_sign(sp(2, 3)),
        state.ast.int(2, sp(4, 5)),
    ];
    let id = state.termed(terms, sp(0, 5));
    insta::assert_snapshot!(resolved(&mut state, id), @"(7 - 2)");
}

#[test]
fn test_negating_a_string_fails_to_cast() {
    let mut state = CompilationState::new();
    let terms = vec![state.ast.minus_sign(sp(0, 1)), state.ast.string("a", sp(1, 4))];
    let id = state.termed(terms, sp(0, 4));

    assert!(!state.resolve_all());
    assert_eq!(state.ast.expr(id).kind, ExprKind::SyntaxError);
    insta::assert_debug_snapshot!(error_messages(&state), @r###"
    [
        "cannot cast `String` to `Int`",
    ]
    "###);
}

// ── Sections ───────────────────────────────────────────────────────────

#[test]
fn test_left_section_leaves_first_slot_open() {
    let mut state = CompilationState::new();
    let plus = state.builtins.plus;
    let terms = vec![state.ast.reference(plus, sp(0, 1)), state.ast.int(1, sp(2, 3))];
    let id = state.termed(terms, sp(0, 3));

    insta::assert_snapshot!(resolved(&mut state, id), @"(_ + 1)");
    assert_eq!(state.ast.expr(id).ty.to_string(), "(Number) -> Number");
    assert!(state.ast.is_partial_call(id));
}

#[test]
fn test_right_section_leaves_last_slot_open() {
    let mut state = CompilationState::new();
    let times = state.builtins.times;
    let terms = vec![state.ast.int(3, sp(0, 1)), state.ast.reference(times, sp(2, 3))];
    let id = state.termed(terms, sp(0, 3));

    insta::assert_snapshot!(resolved(&mut state, id), @"(3 * _)");
    assert_eq!(state.ast.expr(id).ty.to_string(), "(Number) -> Number");
}

#[test]
fn test_section_applied_to_following_operand() {
    let mut state = CompilationState::new();
    let plus = state.builtins.plus;
    let section_terms = vec![state.ast.reference(plus, sp(1, 2)), state.ast.int(1, sp(3, 4))];
    let section = state.ast.termed(section_terms, sp(0, 5));
    let two = state.ast.int(2, sp(6, 7));
    let id = state.termed(vec![section, two], sp(0, 7));

    insta::assert_snapshot!(resolved(&mut state, id), @"(2 + 1)");
    assert!(!state.ast.is_partial_call(id));
}

// ── Juxtaposition ──────────────────────────────────────────────────────

fn declare_add3(state: &mut CompilationState) -> maps_typeck::DefId {
    let ty = state
        .types
        .get_function_type(&Type::INT, &[Type::INT, Type::INT, Type::INT], true);
    state.ast.declare("add3", ty, sp(0, 4))
}

#[test]
fn test_juxtaposed_operands_are_arguments() {
    let mut state = CompilationState::new();
    let add3 = declare_add3(&mut state);
    let terms = vec![
        state.ast.reference(add3, sp(0, 4)),
        state.ast.int(1, sp(5, 6)),
        state.ast.int(2, sp(7, 8)),
        state.ast.int(3, sp(9, 10)),
    ];
    let id = state.termed(terms, sp(0, 10));

    insta::assert_snapshot!(resolved(&mut state, id), @"add3(1, 2, 3)");
    assert_eq!(state.ast.expr(id).ty, Type::INT);
}

#[test]
fn test_partial_application_and_continuation() {
    let mut state = CompilationState::new();
    let add3 = declare_add3(&mut state);
    let inner_terms = vec![state.ast.reference(add3, sp(1, 5)), state.ast.int(1, sp(6, 7))];
    let inner = state.ast.termed(inner_terms, sp(0, 8));
    let id = state.termed(vec![inner], sp(0, 8));

    insta::assert_snapshot!(resolved(&mut state, id), @"add3(1)");
    assert_eq!(state.ast.expr(id).ty.to_string(), "(Int, Int) -> Int");

    let rest = vec![inner, state.ast.int(2, sp(9, 10)), state.ast.int(3, sp(11, 12))];
    let full = state.termed(rest, sp(0, 12));
    insta::assert_snapshot!(resolved(&mut state, full), @"add3(1, 2, 3)");
    assert_eq!(state.ast.expr(full).ty, Type::INT);
}

#[test]
fn test_application_binds_tighter_than_operators() {
    let mut state = CompilationState::new();
    let add3 = declare_add3(&mut state);
    let times = state.builtins.times;
    let terms = vec![
        state.ast.int(2, sp(0, 1)),
        state.ast.reference(times, sp(2, 3)),
        state.ast.reference(add3, sp(4, 8)),
        state.ast.int(1, sp(9, 10)),
        state.ast.int(2, sp(11, 12)),
        state.ast.int(3, sp(13, 14)),
    ];
    let id = state.termed(terms, sp(0, 14));
    insta::assert_snapshot!(resolved(&mut state, id), @"(2 * add3(1, 2, 3))");
}

#[test]
fn test_operand_after_full_application_needs_operator() {
    let mut state = CompilationState::new();
    let print = state.builtins.print;
    let terms = vec![
        state.ast.reference(print, sp(0, 5)),
        state.ast.string("a", sp(6, 9)),
        state.ast.string("b", sp(10, 13)),
    ];
    state.termed(terms, sp(0, 13));

    assert!(!state.resolve_all());
    assert!(matches!(
        state.errors().next(),
        Some(CompileError::ExpectedOperator { span }) if *span == sp(10, 13)
    ));
}

// ── Degenerate Runs ────────────────────────────────────────────────────

#[test]
fn test_single_term_is_unwrapped_in_place() {
    let mut state = CompilationState::new();
    let five = state.ast.int(5, sp(0, 1));
    let id = state.termed(vec![five], sp(0, 1));

    assert!(state.resolve_all());
    assert_eq!(state.ast.expr(id).kind, ExprKind::KnownValue(Value::Int(5)));
    assert_eq!(state.ast.expr(id).ty, Type::INT);
}

#[test]
fn test_zero_terms_is_empty_and_absurd() {
    let mut state = CompilationState::new();
    let id = state.termed(Vec::new(), sp(0, 2));

    assert!(state.resolve_all());
    assert_eq!(state.ast.expr(id).kind, ExprKind::Empty);
    assert!(state.ast.expr(id).ty.is(Builtin::Absurd));
}

#[test]
fn test_resolved_tree_has_no_holes() {
    let mut state = CompilationState::new();
    let id = binary_run(&mut state, &[1, 2, 3, 1]);
    assert!(state.resolve_all());

    for node in state.ast.reachable(id) {
        let expr = state.ast.expr(node);
        assert!(
            !expr.ty.is(Builtin::Hole),
            "{} has type Hole",
            expression_to_string(&state.ast, node)
        );
        assert!(!matches!(expr.kind, ExprKind::Termed(_)));
    }
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn test_unknown_identifier_poisons_enclosing_run() {
    let mut state = CompilationState::new();
    let plus = state.builtins.plus;
    let one = state.ast.int(1, sp(0, 1));
    let op = state.ast.reference(plus, sp(2, 3));
    let unknown = state.unknown_identifier("y", sp(4, 5));
    let id = state.termed(vec![one, op, unknown], sp(0, 5));

    assert!(!state.resolve_all());
    assert_eq!(state.ast.expr(id).kind, ExprKind::SyntaxError);
    assert!(state.ast.expr(id).ty.is(Builtin::Absurd));
    // only the original failure is reported
    insta::assert_debug_snapshot!(error_messages(&state), @r###"
    [
        "unknown identifier `y`",
    ]
    "###);
}

#[test]
fn test_worklist_reports_every_failure() {
    let mut state = CompilationState::new();
    let adjacent = vec![state.ast.int(1, sp(0, 1)), state.ast.int(2, sp(2, 3))];
    state.termed(adjacent, sp(0, 3));
    let lone_minus = vec![state.ast.minus_sign(sp(4, 5))];
    state.termed(lone_minus, sp(4, 5));
    let fine = binary_run(&mut state, &[1]);

    assert_eq!(state.pending(), 3);
    assert!(!state.resolve_all());
    assert_eq!(state.pending(), 0);
    insta::assert_debug_snapshot!(error_messages(&state), @r###"
    [
        "expected an operator",
        "operator is missing an operand",
    ]
    "###);
    assert!(matches!(state.ast.expr(fine).kind, ExprKind::Call { .. }));
}

#[test]
fn test_dangling_prefix_operator() {
    let mut state = CompilationState::new();
    let not = state.builtins.not;
    let equals = state.builtins.equals;
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(equals, sp(2, 4)),
        state.ast.reference(not, sp(5, 6)),
    ];
    state.termed(terms, sp(0, 6));

    assert!(!state.resolve_all());
    assert!(matches!(
        state.errors().next(),
        Some(CompileError::MissingOperand { span }) if *span == sp(5, 6)
    ));
}

// ── Postfix and Both-Associative Operators ─────────────────────────────

fn define_fact(state: &mut CompilationState) -> maps_typeck::DefId {
    let ty = state.types.get_function_type(&Type::INT, &[Type::INT], true);
    state
        .ast
        .define_builtin("fact", ty, Some(Operator::postfix()))
}

fn define_arithmetic(
    state: &mut CompilationState,
    name: &str,
    operator: Operator,
) -> maps_typeck::DefId {
    let ty = state
        .types
        .get_function_type(&Type::NUMBER, &[Type::NUMBER, Type::NUMBER], true);
    state.ast.define_builtin(name, ty, Some(operator))
}

#[test]
fn test_postfix_applies_to_right_operand_of_binary() {
    let mut state = CompilationState::new();
    let fact = define_fact(&mut state);
    let plus = state.builtins.plus;
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(plus, sp(2, 3)),
        state.ast.int(3, sp(4, 5)),
        state.ast.reference(fact, sp(5, 9)),
    ];
    let id = state.termed(terms, sp(0, 9));
    insta::assert_snapshot!(resolved(&mut state, id), @"(1 + fact(3))");
}

#[test]
fn test_postfix_as_only_operator() {
    let mut state = CompilationState::new();
    let fact = define_fact(&mut state);
    let terms = vec![
        state.ast.int(3, sp(0, 1)),
        state.ast.reference(fact, sp(1, 5)),
    ];
    let id = state.termed(terms, sp(0, 5));
    insta::assert_snapshot!(resolved(&mut state, id), @"fact(3)");
    assert_eq!(state.ast.expr(id).ty, Type::INT);
}

#[test]
fn test_dangling_postfix_operator() {
    let mut state = CompilationState::new();
    let fact = define_fact(&mut state);
    let plus = state.builtins.plus;
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(plus, sp(2, 3)),
        state.ast.reference(fact, sp(4, 8)),
    ];
    state.termed(terms, sp(0, 8));

    assert!(!state.resolve_all());
    assert!(matches!(
        state.errors().next(),
        Some(CompileError::MissingOperand { span }) if *span == sp(4, 8)
    ));
}

#[test]
fn test_both_associative_chain_nests_right() {
    let mut state = CompilationState::new();
    let join = define_arithmetic(&mut state, "<>", Operator::binary(2, Associativity::Both));
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(join, sp(2, 4)),
        state.ast.int(2, sp(5, 6)),
        state.ast.reference(join, sp(7, 9)),
        state.ast.int(3, sp(10, 11)),
    ];
    let id = state.termed(terms, sp(0, 11));
    insta::assert_snapshot!(resolved(&mut state, id), @"(1 <> (2 <> 3))");
}

#[test]
fn test_largest_precedence_operator_resolves() {
    let mut state = CompilationState::new();
    let at = define_arithmetic(&mut state, "@", Operator::binary(u32::MAX, Associativity::Left));
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(at, sp(2, 3)),
        state.ast.int(2, sp(4, 5)),
    ];
    let id = state.termed(terms, sp(0, 5));
    insta::assert_snapshot!(resolved(&mut state, id), @"(1 @ 2)");

    let plus = state.builtins.plus;
    let terms = vec![
        state.ast.int(1, sp(0, 1)),
        state.ast.reference(at, sp(2, 3)),
        state.ast.int(2, sp(4, 5)),
        state.ast.reference(plus, sp(6, 7)),
        state.ast.int(3, sp(8, 9)),
    ];
    let id = state.termed(terms, sp(0, 9));
    insta::assert_snapshot!(resolved(&mut state, id), @"((1 @ 2) + 3)");
}

// ── References ─────────────────────────────────────────────────────────

#[test]
fn test_reference_made_before_definition_resolves_takes_its_type() {
    let mut state = CompilationState::new();
    let plus = state.builtins.plus;
    let body_terms = vec![
        state.ast.int(1, sp(8, 9)),
        state.ast.reference(plus, sp(10, 11)),
        state.ast.int(2, sp(12, 13)),
    ];
    let body = state.termed(body_terms, sp(8, 13));
    let x = state.ast.define("x", body, sp(4, 5));
    let early = state.ast.reference(x, sp(15, 16));
    assert_eq!(state.ast.expr(early).ty, Type::HOLE);

    let id = state.termed(vec![early], sp(15, 16));
    assert!(state.resolve_all());
    assert_eq!(state.ast.expr(id).ty, Type::NUMBER);
    assert!(matches!(state.ast.expr(id).kind, ExprKind::Reference(def) if def == x));
}
