use crate::ir::tac::{Instruction, Opcode, Operand};
use std::collections::HashMap;

/// Forward substitution of variables known to hold a literal. Knowledge is
/// dropped at every label since control may join there from elsewhere.
pub fn propagate_constants(instrs: Vec<Instruction>, log: &mut Vec<String>) -> Vec<Instruction> {
    let mut known: HashMap<String, Operand> = HashMap::new();
    let mut out = Vec::with_capacity(instrs.len());

    for mut instr in instrs.into_iter() {
        if instr.op == Opcode::Label {
            known.clear();
            out.push(instr);
            continue;
        }

        if !known.is_empty() {
            let before = instr.to_string();
            let mut changed = false;

            for operand in instr.reads_mut() {
                changed |= substitute(operand, &known);
            }

            if changed {
                log.push(format!("constant propagation: `{before}` => `{instr}`"));
            }
        }

        if let Some(dest) = instr.dest() {
            known.remove(dest);

            if instr.op == Opcode::Assign {
                if let Some(src) = instr.arg1.as_ref().filter(|src| src.is_literal()) {
                    known.insert(dest.to_string(), src.clone());
                }
            }
        }

        out.push(instr);
    }

    out
}

fn substitute(operand: &mut Operand, known: &HashMap<String, Operand>) -> bool {
    match operand {
        Operand::Name(name) => match known.get(name.as_str()) {
            Some(value) => {
                *operand = value.clone();
                true
            }
            None => false,
        },
        Operand::Args(args) => {
            let mut changed = false;
            for arg in args.iter_mut() {
                changed |= substitute(arg, known);
            }
            changed
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tac::render;
    use crate::op::Number;
    use pretty_assertions::assert_eq;

    fn int(i: i64) -> Operand {
        Operand::Number(Number::Int(i))
    }

    fn name(n: &str) -> Operand {
        Operand::name(n)
    }

    #[test]
    fn substitutes_until_redefined() {
        let instrs = vec![
            Instruction::assign(int(5), name("x")),
            Instruction::binary(Opcode::Add, name("x"), name("y"), name("t0")),
            Instruction::new(
                Opcode::Call,
                Some(Operand::label("f")),
                Some(Operand::Args(vec![name("x")])),
                Some(name("x")),
            ),
            Instruction::print(name("x")),
        ];
        let mut log = vec![];

        let out = propagate_constants(instrs, &mut log);

        assert_eq!(render(&out), "x = 5\nt0 = 5 + y\nx = f(5)\nprint(x)");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn labels_reset_knowledge() {
        let instrs = vec![
            Instruction::assign(int(0), name("i")),
            Instruction::label("L0"),
            Instruction::binary(Opcode::Lt, name("i"), int(3), name("t0")),
        ];
        let mut log = vec![];

        let out = propagate_constants(instrs.clone(), &mut log);

        assert_eq!(out, instrs);
    }

    #[test]
    fn store_value_and_strings_propagate() {
        let instrs = vec![
            Instruction::assign(Operand::Str("k".to_string()), name("key")),
            Instruction::new(Opcode::DictSet, Some(name("d")), Some(name("key")), Some(name("key"))),
        ];
        let mut log = vec![];

        let out = propagate_constants(instrs, &mut log);

        assert_eq!(render(&out), "key = \"k\"\nd[\"k\"] = \"k\"");
    }

    #[test]
    fn jump_labels_are_untouched() {
        let instrs = vec![
            Instruction::assign(int(1), name("L1")),
            Instruction::goto("L1"),
        ];
        let mut log = vec![];

        let out = propagate_constants(instrs.clone(), &mut log);

        assert_eq!(out, instrs);
    }
}
