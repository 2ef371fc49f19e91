pub mod codegen;
pub mod driver;
pub mod ir;
pub mod op;
pub mod parser;
pub mod runtime;
pub mod semantic;

pub use codegen::{emit_assembly, CodegenError};
pub use driver::{Config, Driver, DriverError};
pub use ir::{generate_tac, optimize, Instruction, Opcode, Operand, Optimized, TacProgram};
pub use parser::ast::Program;
pub use parser::{parse, tokenize, LexError, SyntaxError, Token};
pub use runtime::{interpret, RuntimeError, RuntimeErrorKind, Value};
pub use semantic::{analyze, Analysis};

/// Everything the front half of the pipeline produces for one source text.
#[derive(Debug)]
pub struct Compiled {
    pub program: Program,
    pub tac: TacProgram,
    pub optimized: Optimized,
}

/// Lexes, parses, lowers and optimizes `source`. Semantic analysis is
/// advisory and left to the caller.
pub fn compile(source: &str) -> Result<Compiled, DriverError> {
    let program = parse(tokenize(source)?)?;
    let tac = generate_tac(&program);
    let optimized = optimize(tac.instructions.clone());

    Ok(Compiled {
        program,
        tac,
        optimized,
    })
}
