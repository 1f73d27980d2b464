/// Lexer for the Melon language
///
/// Converts `.mln` source text into a token stream ending in an EOF
/// sentinel. The lexer is fail-fast: the first bad character, unterminated
/// string, or unterminated block comment aborts with a syntax error at the
/// exact line and column.

pub mod token;

pub use token::{keyword, Token, TokenKind};

use melon_diagnostics::{CompileError, Result, Span};

pub struct Lexer {
    chars: Vec<char>,
    file: String,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

/// Tokenize a source string, labeling diagnostics with `file`.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>> {
    Lexer::new(source, file).tokenize()
}

impl Lexer {
    pub fn new(source: &str, file: impl Into<String>) -> Self {
        Self {
            chars: source.chars().collect(),
            file: file.into(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while self.pos < self.chars.len() {
            self.skip_whitespace();
            if self.pos >= self.chars.len() {
                break;
            }

            let c = self.peek(0);

            if c == '/' && self.peek(1) == '/' {
                self.skip_line_comment();
                continue;
            }

            if c == '/' && self.peek(1) == '*' {
                self.skip_block_comment()?;
                continue;
            }

            if c == '"' {
                let token = self.read_string()?;
                self.tokens.push(token);
                continue;
            }

            if c.is_ascii_digit() || (c == '-' && self.peek(1).is_ascii_digit()) {
                let token = self.read_number();
                self.tokens.push(token);
                continue;
            }

            if c.is_ascii_alphabetic() || c == '_' {
                let token = self.read_identifier();
                self.tokens.push(token);
                continue;
            }

            if c == '-' && self.peek(1) == '>' {
                let span = self.span();
                self.advance(2);
                self.tokens.push(Token::new(TokenKind::Arrow, "->", span));
                continue;
            }

            if let Some(token) = self.read_single_char() {
                self.tokens.push(token);
                continue;
            }

            return Err(self.error(format!("Unexpected character: '{}'", c)));
        }

        let span = self.span();
        self.tokens.push(Token::new(TokenKind::Eof, "", span));
        Ok(self.tokens)
    }

    fn read_string(&mut self) -> Result<Token> {
        let start = self.span();
        self.advance(1); // opening quote

        let mut value = String::new();
        while self.pos < self.chars.len() && self.peek(0) != '"' {
            if self.peek(0) == '\\' {
                self.advance(1);
                let escaped = self.peek(0);
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    // Unknown escapes pass through literally.
                    other => value.push(other),
                }
                self.advance(1);
            } else {
                value.push(self.peek(0));
                self.advance(1);
            }
        }

        if self.peek(0) != '"' {
            return Err(self.error("Unterminated string literal"));
        }

        self.advance(1); // closing quote
        Ok(Token::new(TokenKind::StringLiteral, value, start))
    }

    fn read_number(&mut self) -> Token {
        let start = self.span();
        let mut value = String::new();

        if self.peek(0) == '-' {
            value.push('-');
            self.advance(1);
        }

        while self.peek(0).is_ascii_digit() {
            value.push(self.peek(0));
            self.advance(1);
        }

        // Only take the '.' when a digit follows, so a trailing period is
        // left for the parser instead of being misread as a decimal point.
        if self.peek(0) == '.' && self.peek(1).is_ascii_digit() {
            value.push('.');
            self.advance(1);
            while self.peek(0).is_ascii_digit() {
                value.push(self.peek(0));
                self.advance(1);
            }
        }

        Token::new(TokenKind::NumberLiteral, value, start)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.span();
        let mut value = String::new();

        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == '_' {
            value.push(self.peek(0));
            self.advance(1);
        }

        let kind = keyword(&value).unwrap_or(TokenKind::Identifier);
        Token::new(kind, value, start)
    }

    fn read_single_char(&mut self) -> Option<Token> {
        let c = self.peek(0);
        let start = self.span();

        let kind = match c {
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '§' => TokenKind::Section,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Equals,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            _ => return None,
        };

        self.advance(1);
        Some(Token::new(kind, c.to_string(), start))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() {
            match self.peek(0) {
                ' ' | '\t' | '\r' => self.advance(1),
                '\n' => {
                    self.advance(1);
                    self.line += 1;
                    self.column = 1;
                }
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.chars.len() && self.peek(0) != '\n' {
            self.advance(1);
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.advance(2); // skip /*

        while self.pos < self.chars.len() {
            if self.peek(0) == '*' && self.peek(1) == '/' {
                self.advance(2);
                return Ok(());
            }
            if self.peek(0) == '\n' {
                self.line += 1;
                self.column = 1;
            }
            self.advance(1);
        }

        Err(self.error("Unterminated block comment"))
    }

    fn peek(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if self.pos < self.chars.len() {
                self.pos += 1;
                self.column += 1;
            }
        }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(message, self.span().in_file(&self.file))
    }
}
