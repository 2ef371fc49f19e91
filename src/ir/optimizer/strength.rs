use crate::ir::tac::{Instruction, Opcode, Operand};
use crate::op::Number;

/// Algebraic identities on integer literals: `x*0`, `x*1`, `1*x`, `x+0` and
/// `0+x` become plain assignments.
pub fn reduce_strength(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    instrs
        .into_iter()
        .map(|instr| match reduce(&instr) {
            Some(reduced) => {
                log.push(format!("strength reduction: `{instr}` => `{reduced}`"));
                reduced
            }
            None => instr,
        })
        .collect()
}

fn int_literal(operand: &Operand) -> Option<i64> {
    match operand {
        Operand::Number(Number::Int(i)) => Some(*i),
        _ => None,
    }
}

fn reduce(instr: &Instruction) -> Option<Instruction> {
    let (lhs, rhs, dest) = match (&instr.arg1, &instr.arg2, &instr.result) {
        (Some(lhs), Some(rhs), Some(dest)) => (lhs, rhs, dest),
        _ => return None,
    };

    let src = match (instr.op, int_literal(lhs), int_literal(rhs)) {
        (Opcode::Mul, _, Some(0)) | (Opcode::Mul, Some(0), _) => Operand::Number(Number::Int(0)),
        (Opcode::Mul, _, Some(1)) | (Opcode::Add, _, Some(0)) => lhs.clone(),
        (Opcode::Mul, Some(1), _) | (Opcode::Add, Some(0), _) => rhs.clone(),
        _ => return None,
    };

    Some(Instruction::assign(src, dest.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tac::render;
    use pretty_assertions::assert_eq;

    fn int(i: i64) -> Operand {
        Operand::Number(Number::Int(i))
    }

    #[test]
    fn identities() {
        let x = Operand::name("x");
        let t = Operand::name("t0");
        let instrs = vec![
            Instruction::binary(Opcode::Mul, x.clone(), int(0), t.clone()),
            Instruction::binary(Opcode::Mul, int(0), x.clone(), t.clone()),
            Instruction::binary(Opcode::Mul, x.clone(), int(1), t.clone()),
            Instruction::binary(Opcode::Mul, int(1), x.clone(), t.clone()),
            Instruction::binary(Opcode::Add, x.clone(), int(0), t.clone()),
            Instruction::binary(Opcode::Add, int(0), x.clone(), t.clone()),
            Instruction::binary(Opcode::Sub, x.clone(), int(0), t.clone()),
        ];
        let mut log = vec![];

        let out = reduce_strength(instrs, &mut log);

        let expected = "t0 = 0\nt0 = 0\nt0 = x\nt0 = x\nt0 = x\nt0 = x\nt0 = x - 0";
        assert_eq!(render(&out), expected);
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn float_literals_are_not_identities() {
        let instr = Instruction::binary(
            Opcode::Mul,
            Operand::name("x"),
            Operand::Number(Number::Float(1.0)),
            Operand::name("t0"),
        );
        let mut log = vec![];

        let out = reduce_strength(vec![instr.clone()], &mut log);

        assert_eq!(out, vec![instr]);
    }

    #[test]
    fn identity_ignores_operand_type() {
        // names carry no type, so a list `xs * 1` becomes an alias of `xs`
        let instr = Instruction::binary(
            Opcode::Mul,
            Operand::name("xs"),
            int(1),
            Operand::name("ys"),
        );
        let mut log = vec![];

        let out = reduce_strength(vec![instr], &mut log);

        assert_eq!(render(&out), "ys = xs");
    }
}
