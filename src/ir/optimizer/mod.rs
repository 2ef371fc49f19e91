mod cleanup;
mod dce;
mod fold;
mod propagate;
mod strength;

use super::tac::Instruction;
pub use cleanup::{remove_dead_jumps, remove_self_assignments};
pub use dce::remove_dead_instructions;
pub use fold::fold_constants;
pub use propagate::propagate_constants;
pub use strength::reduce_strength;

pub const MAX_ITERATIONS: usize = 10;

type Pass = fn(Vec<Instruction>, &mut Vec<String>) -> Vec<Instruction>;

const PASSES: [Pass; 6] = [
    fold_constants,
    propagate_constants,
    remove_dead_instructions,
    reduce_strength,
    remove_self_assignments,
    remove_dead_jumps,
];

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Optimized {
    pub instructions: Vec<Instruction>,
    pub applied_rewrites: Vec<String>,
}

/// Runs every pass in order until an iteration leaves the instructions
/// unchanged, or `MAX_ITERATIONS` is reached.
pub fn optimize(instructions: Vec<Instruction>) -> Optimized {
    let mut current = instructions;
    let mut applied_rewrites = vec![];

    for _ in 0..MAX_ITERATIONS {
        let next = PASSES
            .iter()
            .fold(current.clone(), |instrs, pass| pass(instrs, &mut applied_rewrites));

        if next == current {
            break;
        }

        current = next;
    }

    Optimized {
        instructions: current,
        applied_rewrites,
    }
}
