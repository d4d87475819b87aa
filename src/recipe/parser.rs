//! Recursive-descent recipe parser
//!
//! ```text
//! document   := statement+
//! statement  := source ( '->' step )+ ';'
//! step       := action | sink
//! sink       := identifier | 'save(' identifier ')' | 'drop'
//! ```
//!
//! Parsing is fail-fast: the first error rejects the whole document.

use log::debug;

use super::ast::{ActionName, PipelineStatement, RecipeDocument, SinkSpec, SourceRef};
use super::lexer::Lexer;
use super::token::{Span, Token, TokenKind};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::stems::Stem;

/// Sink keyword that discards the statement it ends
pub const DROP_KEYWORD: &str = "drop";

/// Parse recipe text into a document
pub fn parse(text: &str) -> Result<RecipeDocument, SyntaxError> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens, Lexer::end_span(text)).document()
}

enum Terminal {
    Sink(SinkSpec),
    Drop,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Span,
}

impl Parser {
    fn new(tokens: Vec<Token>, eof: Span) -> Self {
        Self { tokens, pos: 0, eof }
    }

    fn document(mut self) -> Result<RecipeDocument, SyntaxError> {
        if self.tokens.is_empty() {
            return Err(SyntaxError::new(SyntaxErrorKind::EmptyDocument, self.eof));
        }

        let mut statements = Vec::new();
        let mut written = 0;
        while self.peek().is_some() {
            match self.statement()? {
                Some(statement) => statements.push(statement),
                None => debug!("Discarding statement {} (ends in drop)", written),
            }
            written += 1;
        }

        Ok(RecipeDocument { statements })
    }

    /// Parse one statement; `None` when it ends in `drop`
    fn statement(&mut self) -> Result<Option<PipelineStatement>, SyntaxError> {
        let (source, span) = self.source()?;

        match self.next() {
            Some(Token {
                kind: TokenKind::Arrow,
                ..
            }) => {}
            Some(Token {
                kind: TokenKind::Semicolon,
                span,
            }) => return Err(SyntaxError::new(SyntaxErrorKind::MissingSink, span)),
            other => return Err(self.unexpected(other, "'->'")),
        }

        let mut actions = Vec::new();
        loop {
            let token = self.next();
            match token {
                Some(Token {
                    kind: TokenKind::Arrow | TokenKind::Semicolon,
                    span,
                }) => return Err(SyntaxError::new(SyntaxErrorKind::EmptyStep, span)),
                Some(Token {
                    kind: TokenKind::SaveOpen,
                    span: open,
                }) => {
                    let name = self.save_name(open)?;
                    let sink = SinkSpec {
                        name,
                        retained: true,
                    };
                    self.terminator(&sink.to_string(), open)?;
                    return Ok(Some(PipelineStatement {
                        source,
                        actions,
                        sink,
                        span,
                    }));
                }
                Some(Token {
                    kind: TokenKind::Ident(word),
                    span: word_span,
                }) => {
                    if self.peek_is(&TokenKind::Arrow) {
                        let action = ActionName::from_keyword(&word).ok_or_else(|| {
                            SyntaxError::new(SyntaxErrorKind::SinkMidChain(word.clone()), word_span)
                        })?;
                        actions.push(action);
                        self.pos += 1;
                        continue;
                    }

                    let terminal = Self::terminal(word, word_span)?;
                    let text = match &terminal {
                        Terminal::Sink(sink) => sink.to_string(),
                        Terminal::Drop => DROP_KEYWORD.to_string(),
                    };
                    self.terminator(&text, word_span)?;
                    return Ok(match terminal {
                        Terminal::Sink(sink) => Some(PipelineStatement {
                            source,
                            actions,
                            sink,
                            span,
                        }),
                        Terminal::Drop => None,
                    });
                }
                other => return Err(self.unexpected(other, "an action or sink")),
            }
        }
    }

    fn source(&mut self) -> Result<(SourceRef, Span), SyntaxError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(word),
                span,
            }) => {
                if let Some(action) = ActionName::from_keyword(&word) {
                    return Err(SyntaxError::new(SyntaxErrorKind::ActionAsSource(action), span));
                }
                let source = match Stem::from_name(&word) {
                    Some(stem) => SourceRef::Primitive(stem),
                    None => SourceRef::Defined(word),
                };
                Ok((source, span))
            }
            other => Err(self.unexpected(other, "a source name")),
        }
    }

    fn terminal(word: String, span: Span) -> Result<Terminal, SyntaxError> {
        if let Some(action) = ActionName::from_keyword(&word) {
            return Err(SyntaxError::new(SyntaxErrorKind::ActionAsSink(action), span));
        }
        if word == DROP_KEYWORD {
            return Ok(Terminal::Drop);
        }
        Ok(Terminal::Sink(SinkSpec {
            name: word,
            retained: false,
        }))
    }

    /// Identifier and `)` following `save(`
    fn save_name(&mut self, open: Span) -> Result<String, SyntaxError> {
        let name = match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) if name == DROP_KEYWORD => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken {
                        found: name,
                        expected: "a sink name",
                    },
                    span,
                ))
            }
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name,
            Some(Token {
                kind: TokenKind::CloseParen,
                ..
            }) => return Err(SyntaxError::new(SyntaxErrorKind::EmptySaveName, open)),
            other => return Err(self.unexpected(other, "a sink name")),
        };

        match self.next() {
            Some(Token {
                kind: TokenKind::CloseParen,
                ..
            }) => Ok(name),
            other => Err(self.unexpected(other, "')'")),
        }
    }

    /// Expect `;` after the sink written as `sink_text` at `sink_span`
    fn terminator(&mut self, sink_text: &str, sink_span: Span) -> Result<(), SyntaxError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Semicolon,
                ..
            }) => Ok(()),
            Some(Token {
                kind: TokenKind::Arrow,
                ..
            }) => Err(SyntaxError::new(
                SyntaxErrorKind::SinkMidChain(sink_text.to_string()),
                sink_span,
            )),
            other => Err(self.unexpected(other, "';'")),
        }
    }

    fn unexpected(&self, token: Option<Token>, expected: &'static str) -> SyntaxError {
        match token {
            Some(token) => SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken {
                    found: token.kind.to_string(),
                    expected,
                },
                token.span,
            ),
            None => SyntaxError::new(SyntaxErrorKind::UnexpectedEof { expected }, self.eof),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek().map(|t| &t.kind == kind).unwrap_or(false)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}
