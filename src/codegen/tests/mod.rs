use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use crate::ir::{generate_tac, Instruction, Opcode, Operand};
use crate::op::Number;
use crate::parser::{parse, tokenize};

use super::{emit_assembly, CodegenError};

fn compile(source: &str) -> Result<String, CodegenError> {
    let tokens = tokenize(source).expect("source lexes");
    let program = parse(tokens).expect("source parses");
    let tac = generate_tac(&program);

    emit_assembly(&tac.instructions, &tac.function_params)
}

fn int(i: i64) -> Operand {
    Operand::Number(Number::Int(i))
}

#[test]
fn straight_line_code() {
    let instrs = vec![
        Instruction::assign(int(5), Operand::name("x")),
        Instruction::binary(Opcode::Add, Operand::name("x"), int(1), Operand::name("t0")),
        Instruction::print(Operand::name("t0")),
    ];

    let asm = emit_assembly(&instrs, &BTreeMap::new()).unwrap();

    let text = r#"
start:
    mov ax, 5
    mov [v0], ax
    mov ax, [v0]
    mov bx, 1
    add ax, bx
    mov [v1], ax
    mov ax, [v1]
    call __print_num
    call __print_newline
    jmp __exit
"#;
    assert!(asm.starts_with("bits 16\ncpu 386\norg 100h\n"), "{asm}");
    assert!(asm.contains(text), "{asm}");
    assert!(asm.ends_with("v0 dw 0 ; x\nv1 dw 0 ; t0\n"), "{asm}");
}

#[test]
fn printed_strings_become_data() {
    let asm = compile("print(\"it's\", 2)\nprint(\"it's\")").unwrap();

    assert!(asm.contains("    mov dx, s0\n    call __print_str\n    call __print_space\n    mov ax, 2\n    call __print_num\n"));
    assert!(asm.contains("s0 db 'it', 39, 's', '$'\n"));
    assert!(!asm.contains("s1 db"));
}

#[test]
fn comparisons_and_branches() {
    let asm = compile("x = 3\nif x >= 2:\n    print(1)\nelse:\n    print(0)").unwrap();

    assert!(asm.contains("    cmp ax, bx\n    setge al\n    movzx ax, al\n"));
    assert!(asm.contains("    test ax, ax\n    jz L0\n"));
    assert!(asm.contains("    jmp L1\nL0:\n"));
}

#[test]
fn division_checks_for_zero() {
    let asm = compile("x = 7\ny = x % 2").unwrap();

    assert!(asm.contains("    test bx, bx\n    jz __div_zero\n    cwd\n    idiv bx\n    mov ax, dx\n"));
}

#[test]
fn functions_get_their_own_slots() {
    let source = "def add(a, b):\n    return a + b\na = 1\nprint(add(a, 3))";
    let asm = compile(source).unwrap();

    assert!(asm.contains("    call func_add\n"));
    assert!(asm.contains("    call __print_newline\n    jmp __exit\nfunc_add:\n"));
    assert!(asm.contains("    add ax, bx\n    mov [v4], ax\n    mov ax, [v4]\n    ret\n"), "{asm}");
    assert!(asm.contains("; a\n"));
    assert!(asm.contains("; add.a\n"));
    assert!(asm.contains("; add.b\n"));
}

#[test]
fn main_runs_first() {
    let asm = compile("def main():\n    print(1)\nprint(2)").unwrap();

    assert!(asm.contains("start:\n    call func_main\n    jmp __exit\n"));
    assert!(asm.contains("func_main:\n    mov ax, 1\n    call __print_num\n"));
    assert!(asm.contains("    xor ax, ax\n    ret\n"));
}

#[test]
fn unsupported_programs() {
    let cases = [
        ("xs = [1]", CodegenError::Unsupported("lists".to_string())),
        ("d = {}", CodegenError::Unsupported("dicts".to_string())),
        ("x = input()", CodegenError::Unsupported("input".to_string())),
        ("print(1.5)", CodegenError::Unsupported("floating point values".to_string())),
        (
            "print(70000)",
            CodegenError::Unsupported("integer 70000 outside the 16-bit range".to_string()),
        ),
        (
            "s = \"a\"",
            CodegenError::Unsupported("string values outside of print".to_string()),
        ),
        ("print(len(\"ab\"))", CodegenError::Unsupported("builtin `len`".to_string())),
        (
            "def f(n):\n    return g(n)\ndef g(n):\n    return f(n)\nprint(f(1))",
            CodegenError::Unsupported("recursive call to `f`".to_string()),
        ),
    ];

    for (source, expected) in cases {
        assert_eq!(compile(source), Err(expected), "{source}");
    }
}

#[test]
fn bad_calls() {
    assert_eq!(
        compile("foo(1)"),
        Err(CodegenError::UnknownFunction("foo".to_string()))
    );
    assert_eq!(
        compile("def f(a):\n    return a\nf()"),
        Err(CodegenError::ArgCount {
            function: "f".to_string(),
            expected: 1,
            got: 0,
        })
    );
    assert_eq!(
        CodegenError::Unsupported("lists".to_string()).to_string(),
        "assembly output does not support lists"
    );
}
