/// Shared diagnostic types for the Melon compiler
///
/// Every stage of the pipeline reports problems through the same shape:
/// a kind (which fixes the error code), a message, a source location, and
/// an optional human-readable hint. External tooling renders diagnostics
/// from this shape, so it must stay stable.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Line/column position inside a single source file.
///
/// Tokens and AST nodes carry a `Span`; the owning file name is attached
/// when a diagnostic is built, which keeps the per-node footprint small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Attach a file name, producing a full diagnostic location.
    pub fn in_file(self, file: impl Into<String>) -> Location {
        Location {
            file: file.into(),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Full source location: file, line, column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Diagnostic taxonomy. The kind fixes the code prefix reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexing and parsing failures (fatal, abort the pipeline).
    Syntax,
    /// Schema, tool, parameter and type-shape problems (accumulated).
    Type,
    /// Pointer resolution failures (fatal on first unresolved pointer).
    Pointer,
    /// Cross-reference and structural semantic problems (accumulated).
    Validation,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "E100",
            ErrorKind::Type => "E200",
            ErrorKind::Pointer => "E300",
            ErrorKind::Validation => "E400",
        }
    }
}

/// A structured compiler diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error {}: {} ({})", .kind.code(), .message, .location)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Location,
    pub hint: Option<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            hint: None,
        }
    }

    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self::new(ErrorKind::Syntax, message, location)
    }

    pub fn type_error(message: impl Into<String>, location: Location) -> Self {
        Self::new(ErrorKind::Type, message, location)
    }

    pub fn pointer(message: impl Into<String>, location: Location) -> Self {
        Self::new(ErrorKind::Pointer, message, location)
    }

    pub fn validation(message: impl Into<String>, location: Location) -> Self {
        Self::new(ErrorKind::Validation, message, location)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Multi-line rendering used by the CLI.
    pub fn render(&self) -> String {
        let mut out = format!("error {}: {}\n", self.code(), self.message);
        out.push_str(&format!("  --> {}\n", self.location));
        if let Some(hint) = &self.hint {
            out.push_str(&format!("hint: {}\n", hint));
        }
        out
    }
}

/// A non-fatal diagnostic. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub location: Location,
}

impl Warning {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_follow_taxonomy() {
        assert_eq!(ErrorKind::Syntax.code(), "E100");
        assert_eq!(ErrorKind::Type.code(), "E200");
        assert_eq!(ErrorKind::Pointer.code(), "E300");
        assert_eq!(ErrorKind::Validation.code(), "E400");
    }

    #[test]
    fn display_includes_code_and_location() {
        let err = CompileError::syntax("Unexpected character: '@'", Location::new("agent.mln", 3, 7));
        let text = err.to_string();
        assert!(text.contains("E100"));
        assert!(text.contains("agent.mln:3:7"));
    }

    #[test]
    fn render_includes_hint_when_present() {
        let err = CompileError::pointer(
            "Unknown ontology: ont",
            Location::new("<input>", 1, 1),
        )
        .with_hint("Ontology 'ont' was not imported. Check your import statements.");

        let rendered = err.render();
        assert!(rendered.starts_with("error E300:"));
        assert!(rendered.contains("hint: Ontology 'ont'"));
    }
}
