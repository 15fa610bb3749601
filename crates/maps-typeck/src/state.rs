//! Per-compilation-unit state: stores, builtins, diagnostics and the
//! worklist of termed expressions awaiting resolution.

use std::collections::VecDeque;

use maps_common::{Severity, Span};

use crate::ast::{AstStore, ExprId};
use crate::builtins::{self, Builtins};
use crate::error::{CompileError, Diagnostic};
use crate::resolve;
use crate::store::TypeStore;

pub struct CompilationState {
    pub types: TypeStore,
    pub ast: AstStore,
    pub builtins: Builtins,
    /// False once any error has been reported. Code generation must not run
    /// on an invalid unit.
    pub is_valid: bool,
    diagnostics: Vec<Diagnostic>,
    unresolved: VecDeque<ExprId>,
}

impl Default for CompilationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationState {
    pub fn new() -> Self {
        let mut types = TypeStore::new();
        let mut ast = AstStore::new();
        let builtins = builtins::register_builtins(&mut types, &mut ast);
        CompilationState {
            types,
            ast,
            builtins,
            is_valid: true,
            diagnostics: Vec::new(),
            unresolved: VecDeque::new(),
        }
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Record a diagnostic. Errors invalidate the unit.
    pub fn report(&mut self, severity: Severity, error: CompileError) {
        let span = error.span();
        log::log!(
            severity.log_level(),
            "{}..{}: {}",
            span.start,
            span.end,
            error
        );
        if severity.is_error() {
            self.is_valid = false;
        }
        self.diagnostics.push(Diagnostic { severity, error });
    }

    pub fn error(&mut self, error: CompileError) {
        self.report(Severity::Error, error);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompileError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .map(|d| &d.error)
    }

    // ── Name resolution output ─────────────────────────────────────────

    /// Stand-in for an identifier name resolution could not find: reports it
    /// and yields a `SyntaxError` term.
    pub fn unknown_identifier(&mut self, name: &str, span: Span) -> ExprId {
        self.error(CompileError::UnknownIdentifier {
            name: name.to_string(),
            span,
        });
        self.ast.syntax_error(span)
    }

    pub fn unknown_operator(&mut self, name: &str, span: Span) -> ExprId {
        self.error(CompileError::UnknownOperator {
            name: name.to_string(),
            span,
        });
        self.ast.syntax_error(span)
    }

    // ── Worklist ─────────────────────────────────────────────────────

    /// Allocate a termed expression and queue it for resolution.
    pub fn termed(&mut self, terms: Vec<ExprId>, span: Span) -> ExprId {
        let id = self.ast.termed(terms, span);
        self.enqueue(id);
        id
    }

    pub fn enqueue(&mut self, id: ExprId) {
        self.unresolved.push_back(id);
    }

    pub fn pending(&self) -> usize {
        self.unresolved.len()
    }

    /// Resolve every queued termed expression. Failures are recorded and the
    /// queue keeps draining. Returns `is_valid`.
    pub fn resolve_all(&mut self) -> bool {
        let mut failures = 0usize;
        while let Some(id) = self.unresolved.pop_front() {
            if resolve::resolve(self, id).is_err() {
                failures += 1;
            }
        }
        log::debug!("resolved worklist, {} failures", failures);
        self.is_valid
    }
}
