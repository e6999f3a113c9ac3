//! Rendering model for resolution diagnostics.
//!
//! Sentinels carry [`EdmError`](crate::semantic::EdmError) values. When a
//! caller wants to show them to a person, each error is lowered into a
//! [`Diag`] and then into a [`miette::Report`] with the schema document as
//! source context.

use crate::ast::Span;
use miette::{Diagnostic, LabeledSpan, Report, Severity};
use std::fmt;

/// Whether a label marks the offending reference or a related declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// Where the error was written.
    Primary,
    /// A declaration the error refers to, such as one overload of an
    /// ambiguous call.
    Secondary,
}

/// A span of the schema document with explanatory text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagLabel {
    /// Byte range in the schema document.
    pub span: Span,
    /// Text rendered next to the underlined span.
    pub message: String,
    pub role: LabelRole,
}

impl DiagLabel {
    /// A label on the offending span.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Primary,
        }
    }

    /// A label on a related declaration.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Secondary,
        }
    }
}

/// A renderable error diagnostic.
///
/// `code` holds the stable error-code name (for example
/// `BadUnresolvedType`) so reports can be filtered by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    /// The headline, identical to the error message.
    pub message: String,
    /// Primary label first, then secondary labels in declaration order.
    pub labels: Vec<DiagLabel>,
    /// How to repair the schema, when the error code has a known fix.
    pub help: Option<String>,
    /// The [`EdmErrorCode`](crate::semantic::EdmErrorCode) name.
    pub code: Option<String>,
}

impl Diag {
    /// An error with no labels, help or code yet.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            labels: Vec::new(),
            help: None,
            code: None,
        }
    }

    /// Appends `label` after the existing ones.
    pub fn with_label(mut self, label: DiagLabel) -> Self {
        self.labels.push(label);
        self
    }

    /// Appends a primary label.
    pub fn with_primary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.with_label(DiagLabel::primary(span, message))
    }

    /// Appends a secondary label.
    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.with_label(DiagLabel::secondary(span, message))
    }

    /// Replaces the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the code shown next to the headline.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// The schema document a set of diagnostics refers to.
#[derive(Debug, Clone)]
pub struct SourceFile {
    content: String,
    name: Option<String>,
}

impl SourceFile {
    /// An anonymous document.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }

    /// A document whose file name is shown in rendered reports.
    pub fn with_name(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: Some(name.into()),
        }
    }

    /// The full document text spans index into.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The file name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Clamps a span into the document so stale locations never panic miette.
    pub fn clamp_span(&self, span: &Span) -> Span {
        let len = self.content.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        start..end
    }
}

/// Lowers every diagnostic into a report over `source`.
pub fn convert_diagnostics_to_reports(diagnostics: &[Diag], source: &SourceFile) -> Vec<Report> {
    diagnostics
        .iter()
        .map(|diag| convert_diag_to_report(diag, source))
        .collect()
}

/// Lowers one diagnostic into a report over `source`.
pub fn convert_diag_to_report(diag: &Diag, source: &SourceFile) -> Report {
    let report = Report::new(build_diagnostic(diag, source));
    match source.name() {
        Some(name) => {
            report.with_source_code(miette::NamedSource::new(name, source.content().to_string()))
        }
        None => report.with_source_code(source.content().to_string()),
    }
}

fn build_diagnostic(diag: &Diag, source: &SourceFile) -> BuiltDiagnostic {
    let labels = diag
        .labels
        .iter()
        .map(|label| {
            let clamped = source.clamp_span(&label.span);
            let span = (clamped.start, clamped.end - clamped.start);
            match label.role {
                LabelRole::Primary => {
                    LabeledSpan::new_primary_with_span(Some(label.message.clone()), span)
                }
                LabelRole::Secondary => LabeledSpan::new_with_span(Some(label.message.clone()), span),
            }
        })
        .collect();

    BuiltDiagnostic {
        message: diag.message.clone(),
        code: diag.code.clone(),
        help: diag.help.clone(),
        labels,
    }
}

#[derive(Debug)]
struct BuiltDiagnostic {
    message: String,
    code: Option<String>,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for BuiltDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BuiltDiagnostic {}

impl Diagnostic for BuiltDiagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<EntityType Name="Order" BaseType="NS.Missing"/>"#;

    #[test]
    fn clamp_keeps_spans_inside_document() {
        let src = SourceFile::new("hello");
        assert_eq!(src.clamp_span(&(0..10)), 0..5);
        assert_eq!(src.clamp_span(&(10..20)), 5..5);
        let inverted = std::ops::Range { start: 3, end: 2 };
        assert_eq!(src.clamp_span(&inverted), 3..3);
    }

    #[test]
    fn report_carries_code_and_help() {
        let source = SourceFile::with_name(DOC, "model.csdl.xml");
        let diag = Diag::error("The type 'NS.Missing' could not be found.")
            .with_primary_label(34..46, "unresolved base type")
            .with_help("declare the type or fix the namespace")
            .with_code("BadUnresolvedType");

        let built = build_diagnostic(&diag, &source);
        assert_eq!(built.code.as_deref(), Some("BadUnresolvedType"));
        assert_eq!(built.severity(), Some(Severity::Error));
        assert!(built.labels[0].primary());

        let report = convert_diag_to_report(&diag, &source);
        assert_eq!(report.to_string(), "The type 'NS.Missing' could not be found.");
        assert_eq!(
            report.help().map(|help| help.to_string()).as_deref(),
            Some("declare the type or fix the namespace")
        );
    }

    #[test]
    fn secondary_labels_are_not_primary() {
        let source = SourceFile::new(DOC);
        let diag = Diag::error("ambiguous")
            .with_primary_label(0..11, "call")
            .with_secondary_label(12..23, "candidate");
        let built = build_diagnostic(&diag, &source);
        assert!(built.labels[0].primary());
        assert!(!built.labels[1].primary());
        assert_eq!(built.labels[1].label(), Some("candidate"));
    }

    #[test]
    fn out_of_bounds_label_does_not_panic() {
        let source = SourceFile::new("short");
        let diags = vec![
            Diag::error("one").with_primary_label(0..100, "clamped"),
            Diag::error("two"),
        ];
        let reports = convert_diagnostics_to_reports(&diags, &source);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].to_string(), "two");
    }
}
