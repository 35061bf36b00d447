//! Ariadne-based rendering of resolution errors.
//!
//! Each [`ResolveError`] variant has a stable code. Output is either a
//! human-readable report (optionally colored) or one JSON object per error.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::ResolveError;

/// How diagnostics are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticOptions {
    pub color: bool,
    pub json: bool,
}

impl DiagnosticOptions {
    /// Plain text without ANSI escapes, for tests and piped output.
    pub fn colorless() -> Self {
        DiagnosticOptions {
            color: false,
            json: false,
        }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &ResolveError) -> &'static str {
    match err {
        ResolveError::UndefinedVariable { .. } => "B0001",
        ResolveError::TypeNotFound { .. } => "B0002",
        ResolveError::AmbiguousPackageOrValue { .. } => "B0003",
        ResolveError::NoSuchField { .. } => "B0004",
        ResolveError::NoSuchMethod { .. } => "B0005",
        ResolveError::OperatorMismatch { .. } => "B0006",
    }
}

// ── Span Helpers ───────────────────────────────────────────────────────

fn text_range_to_range(range: rowan::TextRange) -> Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    start..end
}

/// Clamp to the source and widen empty spans to one character.
fn clamp(range: Range<usize>, source_len: usize) -> Range<usize> {
    let s = range.start.min(source_len);
    let e = range.end.min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len)
    } else {
        s..e
    }
}

fn label_and_help(err: &ResolveError) -> (String, Option<String>) {
    match err {
        ResolveError::UndefinedVariable { name, .. } => (
            "not declared".to_string(),
            Some(format!("declare `{}` as a variable of the layout", name)),
        ),
        ResolveError::TypeNotFound { type_name, .. } => (
            format!("declared as `{}`", type_name),
            Some("check the type name and the imports of this layout".to_string()),
        ),
        ResolveError::AmbiguousPackageOrValue { .. } => (
            "this is a type, not a value".to_string(),
            Some("access a static field or method of the type instead".to_string()),
        ),
        ResolveError::NoSuchField { owner, .. } => (format!("not a member of `{}`", owner), None),
        ResolveError::NoSuchMethod { owner, .. } => {
            (format!("no matching method on `{}`", owner), None)
        }
        ResolveError::OperatorMismatch { op, .. } => {
            (format!("invalid operands for `{}`", op), None)
        }
    }
}

/// Render a resolution error against the layout source.
///
/// Errors without a span are reported without a source label.
pub fn render_diagnostic(
    error: &ResolveError,
    source: &str,
    filename: &str,
    options: &DiagnosticOptions,
) -> String {
    if options.json {
        return render_json(error, source, filename);
    }

    let config = Config::default().with_color(options.color);
    let source_len = source.len();
    let span = clamp(
        error.span().map(text_range_to_range).unwrap_or(0..0),
        source_len,
    );
    let (label, help) = label_and_help(error);

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config);
    if error.span().is_some() {
        builder.add_label(Label::new(span).with_message(label).with_color(Color::Red));
    }
    if let Some(help) = help {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return format!("error[{}]: {}\n", error_code(error), error);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// One-line JSON form of a diagnostic.
pub fn render_json(error: &ResolveError, source: &str, filename: &str) -> String {
    let (label, help) = label_and_help(error);
    let spans = match error.span() {
        Some(range) => {
            let range = clamp(text_range_to_range(range), source.len());
            serde_json::json!([{
                "start": range.start,
                "end": range.end,
                "label": label,
            }])
        }
        None => serde_json::json!([]),
    };
    serde_json::json!({
        "code": error_code(error),
        "severity": "error",
        "message": error.to_string(),
        "file": filename,
        "spans": spans,
        "fix": help,
    })
    .to_string()
}
