//! Diagnostics produced by the brace cleanup pass.

use oxc_diagnostics::OxcDiagnostic;
use oxc_span::Span;

#[cold]
pub fn stray_closer(text: &str, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::warn(format!("unexpected '{text}' with nothing left open"))
        .with_label(span)
}

#[cold]
pub fn mismatched_closer(
    found: &str,
    opener: &str,
    opener_line: u32,
    span: Span,
) -> OxcDiagnostic {
    OxcDiagnostic::error(format!(
        "unexpected '{found}' for '{opener}' opened on line {opener_line}"
    ))
    .with_label(span)
}

#[cold]
pub fn expected_while(found: &str, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::error(format!("expected 'while' after the 'do' block, got '{found}'"))
        .with_label(span)
}

#[cold]
pub fn expected_paren(statement: &str, found: &str, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::error(format!("expected '(' after '{statement}', got '{found}'"))
        .with_label(span)
}

#[cold]
pub fn expected_while_of_do_semicolon(found: &str, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::error(format!(
        "expected a semicolon after 'while (...)' of a 'do' loop, got '{found}'"
    ))
    .with_label(span)
}

#[cold]
pub fn unbalanced_define(brace_level: u32, line: u32) -> OxcDiagnostic {
    OxcDiagnostic::warn(format!(
        "unbalanced #define block braces on line {line}, out-level is {brace_level}"
    ))
}

#[cold]
pub fn broken_statement_stage(kind: &str, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::error(format!(
        "statement '{kind}' closed in a stage that cannot close"
    ))
    .with_label(span)
}
