/// Token definitions for the Melon language

use std::fmt;

use melon_diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Import,
    From,
    As,
    Prompt,
    Meta,
    Schema,
    Persona,
    Axiom,
    Traits,
    Example,
    Positive,
    Negative,
    On,
    Proc,
    Tools,
    Tool,
    Checksum,
    ConfidenceToken,

    // Type keywords
    String,
    Int,
    Float,
    Bool,
    Json,
    Array,
    Enum,
    Pointer,

    // Literals
    StringLiteral,
    NumberLiteral,
    True,
    False,

    Identifier,

    // Operators and delimiters
    Arrow,   // ->
    Pipe,    // |
    Caret,   // ^
    Section, // §
    Colon,   // :
    Comma,   // ,
    Dot,     // .
    Equals,  // =
    LParen,  // (
    RParen,  // )
    LBrace,  // {
    RBrace,  // }

    Eof,
}

impl TokenKind {
    /// Whether this kind came from the keyword table. Keywords may reappear
    /// as pointer path segments (`ontology.tools.search`), so the parser
    /// needs to tell them apart from literals and punctuation.
    pub fn is_keyword(self) -> bool {
        keyword_kind(self)
    }
}

fn keyword_kind(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Import
            | TokenKind::From
            | TokenKind::As
            | TokenKind::Prompt
            | TokenKind::Meta
            | TokenKind::Schema
            | TokenKind::Persona
            | TokenKind::Axiom
            | TokenKind::Traits
            | TokenKind::Example
            | TokenKind::Positive
            | TokenKind::Negative
            | TokenKind::On
            | TokenKind::Proc
            | TokenKind::Tools
            | TokenKind::Tool
            | TokenKind::Checksum
            | TokenKind::ConfidenceToken
            | TokenKind::String
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Bool
            | TokenKind::Json
            | TokenKind::Array
            | TokenKind::Enum
            | TokenKind::Pointer
            | TokenKind::True
            | TokenKind::False
    )
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Keyword table. Pure static lookup, no initialization order to worry about.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "prompt" => TokenKind::Prompt,
        "meta" => TokenKind::Meta,
        "schema" => TokenKind::Schema,
        "persona" => TokenKind::Persona,
        "axiom" => TokenKind::Axiom,
        "traits" => TokenKind::Traits,
        "example" => TokenKind::Example,
        "positive" => TokenKind::Positive,
        "negative" => TokenKind::Negative,
        "on" => TokenKind::On,
        "proc" => TokenKind::Proc,
        "tools" => TokenKind::Tools,
        "tool" => TokenKind::Tool,
        "checksum" => TokenKind::Checksum,
        "confidence_token" => TokenKind::ConfidenceToken,
        "string" => TokenKind::String,
        "int" => TokenKind::Int,
        "float" => TokenKind::Float,
        "bool" => TokenKind::Bool,
        "json" => TokenKind::Json,
        "array" => TokenKind::Array,
        "enum" => TokenKind::Enum,
        "Pointer" => TokenKind::Pointer,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// A single lexical token. Produced once by the lexer, consumed
/// left-to-right by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}, '{}', {})", self.kind, self.text, self.span)
    }
}
