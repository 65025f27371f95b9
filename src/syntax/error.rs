//! Syntax errors carry a flat offset; callers resolve it through the
//! [`FileSet`](super::pos::FileSet) when reporting.

use super::pos::Pos;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntaxErrorKind {
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("malformed number literal")]
    MalformedNumber,
    #[error("unexpected {found}, expected {expected}")]
    Unexpected { found: String, expected: String },
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
}

/// A lexer or parser error at a specific offset.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct SyntaxError {
    pub pos: Pos,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(pos: Pos, kind: SyntaxErrorKind) -> Self {
        Self { pos, kind }
    }
}
