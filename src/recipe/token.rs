//! Recipe tokens and source positions

use serde::Serialize;

/// Position of a token in the recipe text
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    /// Byte offset from the start of the recipe
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Token categories produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `[A-Za-z0-9]+`
    Ident(String),
    /// `->`
    Arrow,
    /// `save(`
    SaveOpen,
    /// `)`
    CloseParen,
    /// `;`
    Semicolon,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Arrow => f.write_str("->"),
            TokenKind::SaveOpen => f.write_str("save("),
            TokenKind::CloseParen => f.write_str(")"),
            TokenKind::Semicolon => f.write_str(";"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
