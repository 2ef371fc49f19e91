use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use crate::ir::{generate_tac, optimize, Instruction, Opcode, Operand, TacProgram};
use crate::op::Number;
use crate::parser::{parse, tokenize};

use super::{interpret, RuntimeError, RuntimeErrorKind, MAX_CALL_DEPTH};

fn lower(source: &str) -> TacProgram {
    let tokens = tokenize(source).expect("source lexes");
    let program = parse(tokens).expect("source parses");

    generate_tac(&program)
}

fn no_input(prompt: Option<&str>) -> String {
    panic!("unexpected input request: {prompt:?}")
}

fn run_unoptimized(source: &str) -> Result<String, RuntimeError> {
    let tac = lower(source);

    interpret(&tac.instructions, &tac.function_params, no_input)
}

fn run(source: &str) -> Result<String, RuntimeError> {
    let tac = lower(source);
    let optimized = optimize(tac.instructions);

    interpret(&optimized.instructions, &tac.function_params, no_input)
}

/// Checks the output with and without optimization.
fn assert_output(source: &str, expected: &str) {
    assert_eq!(run_unoptimized(source).as_deref(), Ok(expected), "unoptimized");
    assert_eq!(run(source).as_deref(), Ok(expected), "optimized");
}

fn assert_error(source: &str, expected: RuntimeErrorKind) {
    for result in [run_unoptimized(source), run(source)] {
        match result {
            Err(err) => assert_eq!(err.kind, expected),
            Ok(output) => panic!("expected {expected:?}, got output {output:?}"),
        }
    }
}

fn int(i: i64) -> Operand {
    Operand::Number(Number::Int(i))
}

#[test]
fn sum_of_two_variables() {
    assert_output("x = 5\ny = 10\nsuma = x + y\nprint(suma)", "15");
}

#[test]
fn if_else_takes_the_true_branch() {
    let source = "x = 5\ny = 10\nsuma = x + y\nif suma > 12:\n    print(\"Mayor\")\nelse:\n    print(\"Menor\")";

    assert_output(source, "Mayor");
}

#[test]
fn fibonacci() {
    let source = r#"
n = 10
a = 0
b = 1
i = 0
while i < n:
    print(a)
    c = a + b
    a = b
    b = c
    i = i + 1
"#;

    assert_output(source, "0\n1\n1\n2\n3\n5\n8\n13\n21\n34");
}

#[test]
fn division_by_zero_fails_at_the_instruction() {
    let instrs = vec![
        Instruction::assign(int(1), Operand::name("x")),
        Instruction::assign(int(0), Operand::name("y")),
        Instruction::binary(
            Opcode::Div,
            Operand::name("x"),
            Operand::name("y"),
            Operand::name("result"),
        ),
        Instruction::print(Operand::name("result")),
    ];

    let err = interpret(&instrs, &BTreeMap::new(), no_input).unwrap_err();

    assert_eq!(err, RuntimeError::new(2, RuntimeErrorKind::DivisionByZero));
    assert_eq!(err.to_string(), "runtime error at instruction 2: division by zero");
}

#[test]
fn literal_division_by_zero_survives_optimization() {
    assert_error("x = 1\ny = 0\nprint(x % y)", RuntimeErrorKind::DivisionByZero);
}

#[test]
fn dead_temporary_does_not_change_output() {
    let instrs = vec![
        Instruction::binary(Opcode::Add, int(1), int(2), Operand::name("t0")),
        Instruction::print(Operand::Str("done".to_string())),
    ];

    let optimized = optimize(instrs.clone());
    assert_eq!(
        optimized.instructions,
        vec![Instruction::print(Operand::Str("done".to_string()))]
    );

    let params = BTreeMap::new();
    assert_eq!(
        interpret(&instrs, &params, no_input),
        interpret(&optimized.instructions, &params, no_input)
    );
}

#[test]
fn callee_cannot_touch_caller_variables() {
    let source = r#"
def f(n):
    n = n + 100
    return n
n = 1
y = f(n)
print(n, y)
"#;

    assert_output(source, "1 101");
}

#[test]
fn callee_sees_only_its_parameters() {
    let source = "def f():\n    return secret\nsecret = 1\nprint(f())";

    assert_error(source, RuntimeErrorKind::UndefinedVariable("secret".to_string()));
}

#[test]
fn recursion() {
    let source = r#"
def fact(n):
    if n < 2:
        return 1
    return n * fact(n - 1)
print(fact(10))
"#;

    assert_output(source, "3628800");
}

#[test]
fn main_is_the_entry_point() {
    let source = r#"
def greet(who):
    print("hello " + who)
def main():
    greet("main")
print("top level")
"#;

    assert_output(source, "hello main");
}

#[test]
fn function_without_return_yields_none() {
    assert_output("def f():\n    print(\"x\")\nprint(f())", "x\nNone");
}

#[test]
fn lists_and_for_each() {
    let source = r#"
xs = [3, 1, 2]
xs.append(5)
xs.remove(1)
total = 0
for x in xs:
    total = total + x
print(total, xs, len(xs))
"#;

    assert_output(source, "10 [3, 2, 5] 3");
}

#[test]
fn lists_are_shared() {
    assert_output("a = [1]\nb = a\nb.append(2)\nb[0] = 7\nprint(a)", "[7, 2]");
}

#[test]
fn dicts() {
    let source = "d = {\"a\": 1}\nd[\"b\"] = 2\nd[\"a\"] = 5\nprint(d[\"a\"] + d[\"b\"], d)";

    assert_output(source, "7 {'a': 5, 'b': 2}");
}

#[test]
fn numeric_semantics() {
    assert_output("print(7 / 2, 7 % 3, -7 % 3, 2 * 1.5, 4 / 2)", "3.5 1 2 3.0 2.0");
}

#[test]
fn strings() {
    assert_output(
        "s = \"ab\" * 2 + \"!\"\nprint(s, len(s), s[0], s == \"abab!\", s < \"b\")",
        "abab! 5 a True True",
    );
}

#[test]
fn builtins() {
    assert_output(
        "print(int(\"42\") + 1, float(3), str(12) + \"!\", int(2.9))",
        "43 3.0 12! 2",
    );
}

#[test]
fn user_functions_shadow_builtins() {
    assert_output("def len(x):\n    return 0\nprint(len([1, 2]))", "0");
}

#[test]
fn for_each_ignores_user_len() {
    assert_output(
        "def len(x):\n    return 0\nfor v in [1, 2]:\n    print(v, len(v))",
        "1 0\n2 0",
    );
}

#[test]
fn self_containing_list_prints() {
    assert_output(
        "xs = [1]\nxs.append(xs)\nprint(xs, xs == xs)\nd = {}\nd[\"d\"] = d\nprint(d)",
        "[1, [...]] True\n{'d': {...}}",
    );
}

#[test]
fn oversized_repeat_is_an_error() {
    assert_error(
        "s = \"ab\" * 9999999999999999\nprint(len(s))",
        RuntimeErrorKind::SequenceTooLong,
    );
}

#[test]
fn fizzbuzz() {
    let source = r#"
for i in range(1, 16):
    if i % 15 == 0:
        print("FizzBuzz")
    elif i % 3 == 0:
        print("Fizz")
    elif i % 5 == 0:
        print("Buzz")
    else:
        print(i)
"#;

    assert_output(
        source,
        "1\n2\nFizz\n4\nBuzz\nFizz\n7\n8\nFizz\nBuzz\n11\nFizz\n13\n14\nFizzBuzz",
    );
}

#[test]
fn input_goes_through_the_callback() {
    let tac = lower("name = input(\"Name? \")\nprint(\"Hi \" + name)");
    let mut prompts = vec![];

    let output = interpret(&tac.instructions, &tac.function_params, |prompt| {
        prompts.push(prompt.map(str::to_string));
        "Ada".to_string()
    });

    assert_eq!(output.as_deref(), Ok("Name? \nHi Ada"));
    assert_eq!(prompts, vec![Some("Name? ".to_string())]);
}

#[test]
fn input_without_prompt() {
    let tac = lower("x = int(input())\nprint(x * 2)");

    let output = interpret(&tac.instructions, &tac.function_params, |prompt| {
        assert_eq!(prompt, None);
        "21".to_string()
    });

    assert_eq!(output.as_deref(), Ok("42"));
}

#[test]
fn undefined_variable() {
    let err = run("print(y)").unwrap_err();

    assert_eq!(err, RuntimeError::new(0, RuntimeErrorKind::UndefinedVariable("y".to_string())));
}

#[test]
fn unknown_function() {
    assert_error("foo(1)", RuntimeErrorKind::UnknownFunction("foo".to_string()));
}

#[test]
fn wrong_argument_count() {
    assert_error(
        "def f(a):\n    return a\nprint(f(1, 2))",
        RuntimeErrorKind::WrongArgCount {
            function: "f".to_string(),
            expected: 1,
            got: 2,
        },
    );
    assert_error(
        "print(len())",
        RuntimeErrorKind::WrongArgCount {
            function: "len".to_string(),
            expected: 1,
            got: 0,
        },
    );
}

#[test]
fn index_out_of_range() {
    assert_error(
        "xs = [1]\nprint(xs[3])",
        RuntimeErrorKind::IndexOutOfRange { index: 3, len: 1 },
    );
}

#[test]
fn subscripting_a_number() {
    assert_error(
        "x = 1\nprint(x[0])",
        RuntimeErrorKind::TypeError("int is not subscriptable".to_string()),
    );
}

#[test]
fn missing_label() {
    let instrs = vec![Instruction::print(int(1)), Instruction::goto("L9")];

    let err = interpret(&instrs, &BTreeMap::new(), no_input).unwrap_err();

    assert_eq!(err, RuntimeError::new(1, RuntimeErrorKind::UnresolvedLabel("L9".to_string())));
}

#[test]
fn runaway_recursion_is_stopped() {
    let err = run("def f(n):\n    return f(n)\nprint(f(1))").unwrap_err();

    assert_eq!(err.kind, RuntimeErrorKind::CallDepthExceeded);
    assert_eq!(
        err.kind.to_string(),
        format!("maximum call depth of {MAX_CALL_DEPTH} exceeded")
    );
}

#[test]
fn top_level_return_halts() {
    let instrs = vec![
        Instruction::print(int(1)),
        Instruction::ret(None),
        Instruction::print(int(2)),
    ];

    assert_eq!(interpret(&instrs, &BTreeMap::new(), no_input).as_deref(), Ok("1"));
}
