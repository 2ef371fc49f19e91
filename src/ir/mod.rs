mod cfg;
mod cfg_vizualizer;
mod lowering;
mod optimizer;
mod tac;

#[cfg(test)]
mod tests;

pub use cfg::{Block, BlockId, Cfg};
pub use cfg_vizualizer::{cfg_to_dot, cfg_to_svg};
pub use lowering::{func_label, generate_tac, BUILTIN_PREFIX, FUNC_LABEL_PREFIX};
pub use optimizer::{optimize, Optimized, MAX_ITERATIONS};
pub use tac::{is_temp, render, render_numbered, Instruction, Opcode, Operand, TacProgram};
