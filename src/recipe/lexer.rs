//! Recipe tokenizer
//!
//! Splits recipe text into identifiers, `->`, `save(`, `)` and `;`.
//! Whitespace, including newlines, only separates tokens.

use super::token::{Span, Token, TokenKind};
use crate::error::{SyntaxError, SyntaxErrorKind};

pub struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, stopping at the first bad character
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        while let Some(&(offset, c)) = self.chars.peek() {
            let span = Span {
                offset,
                line: self.line,
                column: self.column,
            };

            if c.is_whitespace() {
                self.bump();
                continue;
            }

            let kind = match c {
                ';' => {
                    self.bump();
                    TokenKind::Semicolon
                }
                ')' => {
                    self.bump();
                    TokenKind::CloseParen
                }
                '-' => {
                    self.bump();
                    match self.chars.peek() {
                        Some(&(_, '>')) => {
                            self.bump();
                            TokenKind::Arrow
                        }
                        _ => {
                            return Err(SyntaxError::new(
                                SyntaxErrorKind::UnexpectedChar('-'),
                                span,
                            ))
                        }
                    }
                }
                c if c.is_ascii_alphanumeric() => self.ident(offset),
                other => return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedChar(other), span)),
            };

            tokens.push(Token::new(kind, span));
        }

        Ok(tokens)
    }

    /// Position just past the last character
    pub fn end_span(src: &str) -> Span {
        let mut line = 1;
        let mut column = 1;
        for c in src.chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Span {
            offset: src.len(),
            line,
            column,
        }
    }

    fn ident(&mut self, start: usize) -> TokenKind {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            end = i + c.len_utf8();
            self.bump();
        }

        let word = &self.src[start..end];
        if word == "save" {
            if let Some(&(_, '(')) = self.chars.peek() {
                self.bump();
                return TokenKind::SaveOpen;
            }
        }
        TokenKind::Ident(word.to_string())
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}
