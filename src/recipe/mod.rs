//! Recipe Language
//!
//! Text → [`RecipeDocument`]. A recipe is a list of statements of the form
//! `source -> action -> ... -> sink;`, where the sink may be wrapped in
//! `save(...)` to include it in the final mix.

mod ast;
mod lexer;
mod parser;
mod token;

pub use ast::{ActionName, PipelineStatement, RecipeDocument, SinkSpec, SourceRef};
pub use lexer::Lexer;
pub use parser::{parse, DROP_KEYWORD};
pub use token::{Span, Token, TokenKind};
