//! Ariadne-based rendering of type-system errors against their source text.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use ks_common::{ErrorCode, LineIndex, Location};

use crate::error::{TypeError, TypeSystemErrorCode};

/// Rendering switches.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    pub color: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

impl DiagnosticOptions {
    /// No ANSI escapes; used by tests and non-terminal sinks.
    pub fn colorless() -> Self {
        Self { color: false }
    }
}

fn location_span(location: Option<&Location>, source: &str) -> Range<usize> {
    match location {
        Some(location) if location.is_provided() => {
            let index = LineIndex::new(source);
            let start = index.offset(location.start) as usize;
            let end = index.offset(location.end) as usize;
            start..end
        }
        _ => 0..source.len(),
    }
}

fn label_message(error: &TypeError) -> String {
    match error.code {
        TypeSystemErrorCode::IncompatibleTypes => format!(
            "expected {}, found {}",
            error.argument("type1").unwrap_or("?"),
            error.argument("type2").unwrap_or("?")
        ),
        TypeSystemErrorCode::TypeNotFound => "unknown type".to_string(),
        TypeSystemErrorCode::SubstitutionNotFound => "unbound type parameter".to_string(),
        TypeSystemErrorCode::CyclicAlias => "alias refers back to itself".to_string(),
        _ => error.message(),
    }
}

fn help(error: &TypeError) -> Option<String> {
    match error.code {
        TypeSystemErrorCode::TypeNotFound => Some(format!(
            "register '{}' or import the module that declares it",
            error.argument("type").unwrap_or_default()
        )),
        TypeSystemErrorCode::InvalidNumberOfParameters => Some(format!(
            "apply exactly {} parameters",
            error.argument("number").unwrap_or("?")
        )),
        TypeSystemErrorCode::CyclicAlias => {
            Some("make one of the types in the chain concrete".to_string())
        }
        TypeSystemErrorCode::TypeAlreadyRegistered => Some(format!(
            "'{}' is already declared here or in a parent registry; pick another name",
            error.argument("type").unwrap_or_default()
        )),
        TypeSystemErrorCode::TypeNameShouldStartWithUpperCase => {
            Some("capitalize the first letter of the type name".to_string())
        }
        TypeSystemErrorCode::TypeParamNameShouldStartWithLowerCase => {
            Some("type parameters start with a lowercase letter".to_string())
        }
        _ => None,
    }
}

/// Render `error` as a labeled report over `source`.
///
/// Errors without a provided location are attached to the whole source.
pub fn render_diagnostic(
    error: &TypeError,
    source: &str,
    _filename: &str,
    options: DiagnosticOptions,
) -> String {
    let config = Config::default().with_color(options.color);
    let source_len = source.len();

    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        // ariadne needs at least one character to point at.
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };
    let span = clamp(location_span(error.location.as_ref(), source));

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(error.code.name())
        .with_message(error.message())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(label_message(error))
                .with_color(Color::Red),
        );
    if let Some(help) = help(error) {
        builder = builder.with_help(help);
    }

    let mut buf = Vec::new();
    if builder
        .finish()
        .write(Source::from(source), &mut buf)
        .is_err()
    {
        return error.to_string();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render every error in order, typically the errors of a partial registry.
pub fn render_errors(
    errors: &[TypeError],
    source: &str,
    filename: &str,
    options: DiagnosticOptions,
) -> Vec<String> {
    errors
        .iter()
        .map(|error| render_diagnostic(error, source, filename, options))
        .collect()
}
