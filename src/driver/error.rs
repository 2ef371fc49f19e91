use std::io;

use termion::color;
use thiserror::Error;

use crate::codegen::CodegenError;
use crate::parser::{LexError, SyntaxError};
use crate::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no input: pass a FILE, --inline SOURCE or --stdin")]
    NoInput,
    #[error("failed to read `{path}`: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to write `{path}`: {source}")]
    Write { path: String, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("semantic analysis reported {0} error(s)")]
    Semantic(usize),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl DriverError {
    /// The phase that failed, used as the message prefix.
    pub fn phase(&self) -> &'static str {
        match self {
            DriverError::NoInput
            | DriverError::Read { .. }
            | DriverError::Write { .. }
            | DriverError::Io(_)
            | DriverError::Json(_) => "io error",
            DriverError::Lex(_) => "lexical error",
            DriverError::Syntax(_) => "syntax error",
            DriverError::Semantic(_) => "semantic error",
            DriverError::Runtime(_) => "runtime error",
            DriverError::Codegen(_) => "codegen error",
        }
    }

    pub fn render(&self) -> String {
        match self {
            // already reads "runtime error at instruction N: ..."
            DriverError::Runtime(err) => err.to_string(),
            other => format!("{}: {other}", other.phase()),
        }
    }
}

/// Wraps `text` in a terminal colour when `tty` is set.
pub fn paint<C: color::Color>(text: &str, c: C, tty: bool) -> String {
    if tty {
        format!("{}{text}{}", color::Fg(c), color::Fg(color::Reset))
    } else {
        text.to_string()
    }
}
