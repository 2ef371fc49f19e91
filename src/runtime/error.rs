use thiserror::Error;

use super::{MAX_CALL_DEPTH, MAX_SEQUENCE_LEN};

/// A fatal interpreter failure at instruction `pc`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("runtime error at instruction {pc}: {kind}")]
pub struct RuntimeError {
    pub pc: usize,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(pc: usize, kind: RuntimeErrorKind) -> Self {
        Self { pc, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error("division by zero")]
    DivisionByZero,
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("undefined label `{0}`")]
    UnresolvedLabel(String),
    #[error("call to undefined function `{0}`")]
    UnknownFunction(String),
    #[error("function `{function}` expects {expected} argument(s), got {got}")]
    WrongArgCount {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("key {0} not found")]
    KeyNotFound(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("value error: {0}")]
    ValueError(String),
    #[error("malformed {0} instruction")]
    MalformedInstruction(&'static str),
    #[error("maximum call depth of {} exceeded", MAX_CALL_DEPTH)]
    CallDepthExceeded,
    #[error("cannot order lists that contain themselves")]
    CyclicComparison,
    #[error("sequence longer than {} elements", MAX_SEQUENCE_LEN)]
    SequenceTooLong,
}
