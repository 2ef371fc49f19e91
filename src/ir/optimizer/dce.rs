use crate::ir::tac::{is_temp, Instruction};
use std::collections::HashSet;

/// Removes instructions that define a temporary nobody reads. Usage is
/// computed to a fixpoint starting from side-effecting instructions and from
/// every instruction that writes a user variable.
pub fn remove_dead_instructions(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    let used = compute_used(&instrs);

    instrs
        .into_iter()
        .filter(|instr| {
            let live = is_live(instr, &used);
            if !live {
                log.push(format!("dead code elimination: removed `{instr}`"));
            }
            live
        })
        .collect()
}

fn is_live(instr: &Instruction, used: &HashSet<String>) -> bool {
    if instr.op.has_side_effects() {
        return true;
    }

    match instr.dest() {
        Some(dest) => !is_temp(dest) || used.contains(dest),
        None => true,
    }
}

fn compute_used(instrs: &[Instruction]) -> HashSet<String> {
    let mut used: HashSet<String> = HashSet::new();

    for instr in instrs {
        for name in instr.used_names().into_iter().chain(instr.dest()) {
            if !is_temp(name) {
                used.insert(name.to_string());
            }
        }
    }

    loop {
        let mut changed = false;

        for instr in instrs.iter().rev() {
            if !is_live(instr, &used) {
                continue;
            }

            for name in instr.used_names() {
                if !used.contains(name) {
                    used.insert(name.to_string());
                    changed = true;
                }
            }
        }

        if !changed {
            return used;
        }
    }
}
