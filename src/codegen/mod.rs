mod translator;
mod var_table;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ir::Instruction;

use self::translator::Translator;

pub use var_table::VarId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("assembly output does not support {0}")]
    Unsupported(String),
    #[error("call to undefined function `{0}`")]
    UnknownFunction(String),
    #[error("function `{function}` expects {expected} argument(s), got {got}")]
    ArgCount {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("malformed {0} instruction")]
    Malformed(&'static str),
}

/// Translates TAC into a NASM source for a 16-bit DOS `.COM` program.
///
/// Only the integer subset is supported: every variable is a signed word,
/// string literals may appear directly in `print`, and user functions may
/// not recurse. `/` truncates towards zero.
pub fn emit_assembly(
    instructions: &[Instruction],
    function_params: &BTreeMap<String, Vec<String>>,
) -> Result<String, CodegenError> {
    Translator::new(function_params).translate(instructions)
}
