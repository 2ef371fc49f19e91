use crate::ir::tac::{Instruction, Opcode};

/// Drops `x = x`.
pub fn remove_self_assignments(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    instrs
        .into_iter()
        .filter(|instr| {
            let redundant = instr.op == Opcode::Assign
                && instr.dest().is_some()
                && instr.arg1.as_ref().and_then(|src| src.as_name()) == instr.dest();

            if redundant {
                log.push(format!("redundant assignment: removed `{instr}`"));
            }
            !redundant
        })
        .collect()
}

/// Drops a `goto L` that is immediately followed by `L:`.
pub fn remove_dead_jumps(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    let mut out: Vec<Instruction> = Vec::with_capacity(instrs.len());

    for instr in instrs.into_iter() {
        if let Some(label) = instr.label_name() {
            let jumps_here = out
                .last()
                .filter(|prev| prev.op == Opcode::Goto)
                .and_then(|prev| prev.jump_target())
                == Some(label);

            if jumps_here {
                if let Some(jump) = out.pop() {
                    log.push(format!("dead jump elimination: removed `{jump}`"));
                }
            }
        }

        out.push(instr);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tac::{render, Operand};
    use pretty_assertions::assert_eq;

    #[test]
    fn self_assignment() {
        let instrs = vec![
            Instruction::assign(Operand::name("x"), Operand::name("x")),
            Instruction::assign(Operand::name("y"), Operand::name("x")),
        ];
        let mut log = vec![];

        let out = remove_self_assignments(instrs, &mut log);

        assert_eq!(render(&out), "x = y");
        assert_eq!(log, vec!["redundant assignment: removed `x = x`"]);
    }

    #[test]
    fn jump_to_next_label() {
        let instrs = vec![
            Instruction::goto("L1"),
            Instruction::label("L1"),
            Instruction::goto("L0"),
            Instruction::label("L2"),
            Instruction::if_false(Operand::name("c"), "L3"),
            Instruction::label("L3"),
        ];
        let mut log = vec![];

        let out = remove_dead_jumps(instrs, &mut log);

        assert_eq!(render(&out), "L1:\ngoto L0\nL2:\nif_false c goto L3\nL3:");
        assert_eq!(log.len(), 1);
    }
}
