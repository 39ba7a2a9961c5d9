use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

/// Character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Name,
    Type,
    Input,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "Lexical",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Name => "Name",
            ErrorKind::Type => "Type",
            ErrorKind::Input => "Input",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lexical, span, message)
    }

    pub fn lex_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Lexical, span, message, help)
    }

    pub fn syntax_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Syntax, span, message)
    }

    pub fn syntax_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Syntax, span, message, help)
    }

    pub fn name_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Name, span, message, help)
    }

    pub fn type_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Type, span, message)
    }

    pub fn type_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Type, span, message, help)
    }

    pub fn input_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Input, span, message, help)
    }

    /// The help text shown to the user, falling back to a generic hint.
    pub fn suggestion(&self) -> &str {
        self.help
            .as_deref()
            .unwrap_or("Fix the error in your code and run it again.")
    }

    /// 1-based line of `source` the error points at.
    pub fn line_in(&self, source: &str) -> usize {
        source
            .chars()
            .take(self.span.start)
            .filter(|&c| c == '\n')
            .count()
            + 1
    }

    /// Render the error to stderr as an annotated source snippet.
    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::Lexical => Color::Red,
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Name => Color::Blue,
            ErrorKind::Type => Color::Magenta,
            ErrorKind::Input => Color::Cyan,
        };

        let kind_str = format!("{} Error", self.kind);

        // Keep the label inside the source so empty or trailing spans still render.
        let source_len = source.chars().count();
        let start = self.span.start.min(source_len);
        let end = self.span.end.clamp(start, source_len);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .eprint((filename, Source::from(source)))
    }
}
