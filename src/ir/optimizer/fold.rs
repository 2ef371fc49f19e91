use crate::ir::tac::{Instruction, Opcode, Operand};
use crate::op::Number;

/// Replaces arithmetic on two numeric literals, and negation of one, with an
/// ASSIGN of the computed value. Division or modulo by a literal zero is left
/// alone so it still fails at run time.
pub fn fold_constants(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    instrs
        .into_iter()
        .map(|instr| match fold(&instr) {
            Some(folded) => {
                log.push(format!("constant folding: `{instr}` => `{folded}`"));
                folded
            }
            None => instr,
        })
        .collect()
}

fn fold(instr: &Instruction) -> Option<Instruction> {
    let dest = instr.result.clone()?;
    let lhs = instr.arg1.as_ref().and_then(Operand::as_number)?;

    let value = if instr.op == Opcode::Neg {
        lhs.negate()
    } else if instr.op.is_arithmetic() {
        let rhs = instr.arg2.as_ref().and_then(Operand::as_number)?;
        let op = instr.op.binary_op()?;

        Number::arithmetic(op, lhs, rhs).ok()?
    } else {
        return None;
    };

    Some(Instruction::assign(Operand::Number(value), dest))
}
