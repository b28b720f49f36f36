//! DDL lexer.
//!
//! A hand-written tokenizer for SQLite `CREATE TABLE` statements. Tokens
//! carry byte spans so the parser can recover expressions verbatim.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
