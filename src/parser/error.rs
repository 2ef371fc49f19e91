use super::token::Token;
use thiserror::Error;

#[derive(Clone, PartialEq, Debug, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, PartialEq, Debug, Error)]
pub enum LexErrorKind {
    #[error("inconsistent indentation")]
    InconsistentIndentation,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unexpected character: {0}")]
    UnexpectedCharacter(char),
    #[error("invalid number literal `{0}`, largest supported integer is {max}", max = i64::MAX)]
    InvalidNumber(String),
}

#[derive(Clone, PartialEq, Debug, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, at: &Token) -> Self {
        Self {
            message: message.into(),
            line: at.line,
            column: at.column,
        }
    }

    pub fn expected(what: &str, found: &Token) -> Self {
        Self::new(format!("expected {what}, found {}", found.kind), found)
    }
}
