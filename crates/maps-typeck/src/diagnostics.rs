//! Ariadne-based rendering of compile diagnostics.
//!
//! Each diagnostic gets an error code, the error's message, and a label on
//! its span. Output is uncoloured unless the `diagnostic-color` option is
//! set, so rendered text is stable in tests.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use maps_common::{CompilerOption, CompilerOptions, Severity};

use crate::error::{CompileError, Diagnostic};

// ── Error Codes ────────────────────────────────────────────────────────

fn error_code(err: &CompileError) -> &'static str {
    match err {
        CompileError::UnknownIdentifier { .. } => "E0001",
        CompileError::UnknownOperator { .. } => "E0002",
        CompileError::CastFailure { .. } => "E0003",
        CompileError::InvalidNumber { .. } => "E0004",
        CompileError::StackNotReduced { .. } => "E0005",
        CompileError::TypeMismatch { .. } => "E0006",
        CompileError::ArityShortfall { .. } => "E0007",
        CompileError::TooManyArguments { .. } => "E0008",
        CompileError::NotAFunction { .. } => "E0009",
        CompileError::ExpectedOperator { .. } => "E0010",
        CompileError::MissingOperand { .. } => "E0011",
        CompileError::UnexpectedTerm { .. } => "E0012",
        CompileError::NotConcretizable { .. } => "E0013",
        CompileError::EmptyExpression { .. } => "E0014",
        CompileError::Undefined { .. } => "E0015",
        CompileError::ContainsError { .. } => "E0016",
    }
}

/// Label text for the primary span.
fn label_message(err: &CompileError) -> String {
    match err {
        CompileError::UnknownIdentifier { .. } => "not found in this scope".to_string(),
        CompileError::UnknownOperator { .. } => "no such operator".to_string(),
        CompileError::CastFailure { to, .. } => format!("cannot become `{}`", to),
        CompileError::InvalidNumber { .. } => "not an Int or a Float".to_string(),
        CompileError::StackNotReduced { .. } => "in this expression".to_string(),
        CompileError::TypeMismatch { expected, found, .. } => {
            format!("expected {}, found {}", expected, found)
        }
        CompileError::ArityShortfall { expected, found, .. } => {
            format!("{} of {} arguments given", found, expected)
        }
        CompileError::TooManyArguments { expected, .. } => {
            format!("takes {} arguments", expected)
        }
        CompileError::NotAFunction { ty, .. } => format!("this has type `{}`", ty),
        CompileError::ExpectedOperator { .. } => "operator expected before this".to_string(),
        CompileError::MissingOperand { .. } => "nothing to apply this to".to_string(),
        CompileError::UnexpectedTerm { .. } => "not allowed here".to_string(),
        CompileError::NotConcretizable { ty, .. } => format!("still `{}` here", ty),
        CompileError::EmptyExpression { .. } => "empty".to_string(),
        CompileError::Undefined { .. } => "declared but never defined".to_string(),
        CompileError::ContainsError { .. } => "see earlier error".to_string(),
    }
}

fn help_message(err: &CompileError) -> Option<&'static str> {
    match err {
        CompileError::StackNotReduced { .. } => {
            Some("this is a compiler bug: the operator table or term run is malformed")
        }
        CompileError::ArityShortfall { .. } => {
            Some("supply the remaining arguments to use this as a value")
        }
        CompileError::InvalidNumber { .. } => Some("numbers look like `12` or `3.5`"),
        _ => None,
    }
}

/// Render one diagnostic against its source text.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str, _filename: &str) -> String {
    let config = Config::default()
        .with_color(CompilerOptions::get_bool(CompilerOption::DiagnosticColor));
    let source_len = source.len();

    // Clamp a range to be valid within source bounds.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        // ariadne needs at least a one-character span
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let error = &diagnostic.error;
    let span = error.span();
    let range = clamp(span.start as usize..span.end as usize);
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };
    let color = match diagnostic.severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Note => Color::Blue,
    };

    let mut builder = Report::build(kind, range.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label_message(error))
                .with_color(color),
        );
    if let Some(help) = help_message(error) {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return format!("{}[{}]: {}", diagnostic.severity, error_code(error), error);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render every diagnostic, in report order, separated by blank lines.
pub fn render_all(diagnostics: &[Diagnostic], source: &str, filename: &str) -> String {
    diagnostics
        .iter()
        .map(|d| render_diagnostic(d, source, filename))
        .collect::<Vec<_>>()
        .join("\n")
}
