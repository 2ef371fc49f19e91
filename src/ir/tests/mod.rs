
use super::{generate_tac, optimize, render, TacProgram};
use crate::parser::{parse, tokenize};
use pretty_assertions::assert_eq;

fn lower(source: &str) -> TacProgram {
    let tokens = tokenize(source).expect("source lexes");
    let program = parse(tokens).expect("source parses");

    generate_tac(&program)
}

fn assert_tac(source: &str, expected: &str) {
    let tac = lower(source);

    assert_eq!(expected.trim(), render(&tac.instructions));
}

fn assert_optimized_tac(source: &str, expected: &str) {
    let tac = lower(source);
    let optimized = optimize(tac.instructions);

    assert_eq!(expected.trim(), render(&optimized.instructions));
}
