use std::collections::{BTreeMap, HashMap};

use crate::ir::{func_label, Instruction, Opcode, Operand, BUILTIN_PREFIX, FUNC_LABEL_PREFIX};
use crate::op::{BinaryOp, Number};
use crate::runtime::BUILTINS;

use super::var_table::VarTable;
use super::CodegenError;

const HEADER: &str = "\
bits 16
cpu 386
org 100h

section .text
start:
";

const ROUTINES: &str = "
__exit:
    mov ax, 4C00h
    int 21h

__div_zero:
    mov dx, __msg_div_zero
    mov ah, 09h
    int 21h
    mov ax, 4C01h
    int 21h

; prints ax as a signed decimal
__print_num:
    push ax
    push bx
    push cx
    push dx
    test ax, ax
    jns .digits
    push ax
    mov dl, '-'
    mov ah, 02h
    int 21h
    pop ax
    neg ax
.digits:
    xor cx, cx
    mov bx, 10
.divide:
    xor dx, dx
    div bx
    push dx
    inc cx
    test ax, ax
    jnz .divide
.emit:
    pop dx
    add dl, '0'
    mov ah, 02h
    int 21h
    loop .emit
    pop dx
    pop cx
    pop bx
    pop ax
    ret

; dx points at a '$'-terminated string
__print_str:
    mov ah, 09h
    int 21h
    ret

__print_space:
    mov dl, ' '
    mov ah, 02h
    int 21h
    ret

__print_newline:
    mov dx, __crlf
    mov ah, 09h
    int 21h
    ret
";

const DATA: &str = "
section .data
__crlf db 13, 10, '$'
__msg_div_zero db 'division by zero', 13, 10, '$'
";

pub struct Translator<'a> {
    function_params: &'a BTreeMap<String, Vec<String>>,
    vars: VarTable<'a>,
    strings: Vec<&'a str>,
    text: String,
    scope: Option<&'a str>,
}

impl<'a> Translator<'a> {
    pub fn new(function_params: &'a BTreeMap<String, Vec<String>>) -> Self {
        Self {
            function_params,
            vars: VarTable::new(),
            strings: vec![],
            text: String::new(),
            scope: None,
        }
    }

    pub fn translate(mut self, instrs: &'a [Instruction]) -> Result<String, CodegenError> {
        check_calls(instrs, self.function_params)?;

        let main = func_label("main");
        let has_main = instrs
            .iter()
            .any(|instr| instr.label_name() == Some(main.as_str()));
        if has_main {
            self.emit(&format!("call {main}"));
            self.emit("jmp __exit");
        }

        for instr in instrs.iter() {
            self.translate_instr(instr)?;
        }
        if self.scope.is_none() {
            self.exit();
        }

        let mut asm = String::from(HEADER);
        asm.push_str(&self.text);
        asm.push_str(ROUTINES);
        asm.push_str(DATA);

        for (i, s) in self.strings.iter().enumerate() {
            asm.push_str(&format!("s{i} db {}\n", nasm_string(s)));
        }
        for (id, name) in self.vars.slots() {
            asm.push_str(&format!("{id} dw 0 ; {name}\n"));
        }

        Ok(asm)
    }

    fn translate_instr(&mut self, instr: &'a Instruction) -> Result<(), CodegenError> {
        let malformed = || CodegenError::Malformed(instr.op.name());

        if let Some(op) = instr.op.binary_op() {
            self.load("ax", instr.arg1.as_ref().ok_or_else(malformed)?)?;
            self.load("bx", instr.arg2.as_ref().ok_or_else(malformed)?)?;
            self.translate_binop(op);

            return self.store(instr);
        }

        match instr.op {
            Opcode::Assign => {
                self.load("ax", instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.store(instr)?;
            }
            Opcode::Neg => {
                self.load("ax", instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.emit("neg ax");
                self.store(instr)?;
            }
            Opcode::Not => {
                self.load("ax", instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.emit("test ax, ax");
                self.emit("setz al");
                self.emit("movzx ax, al");
                self.store(instr)?;
            }
            Opcode::Print => self.translate_print(instr.arg1.as_ref())?,
            Opcode::Label => {
                let label = instr.label_name().ok_or_else(malformed)?;
                if let Some(func) = label.strip_prefix(FUNC_LABEL_PREFIX) {
                    if self.scope.is_none() {
                        self.exit();
                    }
                    self.scope = Some(func);
                }
                self.text.push_str(&format!("{label}:\n"));
            }
            Opcode::Goto => {
                let label = instr.jump_target().ok_or_else(malformed)?;
                self.emit(&format!("jmp {label}"));
            }
            Opcode::IfFalse => {
                self.load("ax", instr.arg1.as_ref().ok_or_else(malformed)?)?;
                let label = instr.jump_target().ok_or_else(malformed)?;
                self.emit("test ax, ax");
                self.emit(&format!("jz {label}"));
            }
            Opcode::Call => {
                let callee = instr
                    .arg1
                    .as_ref()
                    .and_then(|callee| callee.as_label().or(callee.as_name()))
                    .ok_or_else(malformed)?;
                let function_params = self.function_params;
                let params = function_params
                    .get(callee)
                    .ok_or_else(|| CodegenError::UnknownFunction(callee.to_string()))?;

                for (param, arg) in params.iter().zip(call_args(instr.arg2.as_ref())) {
                    self.load("ax", arg)?;
                    let slot = self.vars.get_id(Some(callee), param);
                    self.emit(&format!("mov [{slot}], ax"));
                }
                self.emit(&format!("call {}", func_label(callee)));

                if instr.dest().is_some() {
                    self.store(instr)?;
                }
            }
            Opcode::Return => {
                if self.scope.is_none() {
                    self.exit();
                    return Ok(());
                }

                match instr.arg1.as_ref() {
                    Some(value) => self.load("ax", value)?,
                    None => self.emit("xor ax, ax"),
                }
                self.emit("ret");
            }
            Opcode::ListCreate
            | Opcode::ListAppend
            | Opcode::ListRemove
            | Opcode::ListGet
            | Opcode::ListSet => return Err(CodegenError::Unsupported("lists".to_string())),
            Opcode::DictCreate | Opcode::DictGet | Opcode::DictSet => {
                return Err(CodegenError::Unsupported("dicts".to_string()))
            }
            Opcode::Input => return Err(CodegenError::Unsupported("input".to_string())),
            // binary opcodes are handled above
            _ => return Err(malformed()),
        }

        Ok(())
    }

    // Operands are in ax and bx, the result is left in ax.
    fn translate_binop(&mut self, op: BinaryOp) {
        let set = match op {
            BinaryOp::Plus => return self.emit("add ax, bx"),
            BinaryOp::Minus => return self.emit("sub ax, bx"),
            BinaryOp::Multiply => return self.emit("imul bx"),
            BinaryOp::Divide | BinaryOp::Modulo => {
                self.emit("test bx, bx");
                self.emit("jz __div_zero");
                self.emit("cwd");
                self.emit("idiv bx");
                if op == BinaryOp::Modulo {
                    self.emit("mov ax, dx");
                }
                return;
            }
            BinaryOp::Equal => "sete",
            BinaryOp::NotEqual => "setne",
            BinaryOp::Lt => "setl",
            BinaryOp::Gt => "setg",
            BinaryOp::Lte => "setle",
            BinaryOp::Gte => "setge",
        };

        self.emit("cmp ax, bx");
        self.emit(&format!("{set} al"));
        self.emit("movzx ax, al");
    }

    fn translate_print(&mut self, arg: Option<&'a Operand>) -> Result<(), CodegenError> {
        for (i, item) in call_args(arg).into_iter().enumerate() {
            if i > 0 {
                self.emit("call __print_space");
            }

            match item {
                Operand::Str(s) => {
                    let label = self.intern(s)?;
                    self.emit(&format!("mov dx, {label}"));
                    self.emit("call __print_str");
                }
                other => {
                    self.load("ax", other)?;
                    self.emit("call __print_num");
                }
            }
        }

        self.emit("call __print_newline");
        Ok(())
    }

    fn load(&mut self, reg: &str, operand: &'a Operand) -> Result<(), CodegenError> {
        match operand {
            Operand::Number(Number::Int(i)) => {
                let word = i16::try_from(*i).map_err(|_| {
                    CodegenError::Unsupported(format!("integer {i} outside the 16-bit range"))
                })?;
                self.emit(&format!("mov {reg}, {word}"));
            }
            Operand::Number(Number::Float(_)) => {
                return Err(CodegenError::Unsupported("floating point values".to_string()))
            }
            Operand::Str(_) => {
                return Err(CodegenError::Unsupported(
                    "string values outside of print".to_string(),
                ))
            }
            Operand::Name(name) => {
                let slot = self.vars.get_id(self.scope, name);
                self.emit(&format!("mov {reg}, [{slot}]"));
            }
            Operand::Label(_) | Operand::Args(_) => {
                return Err(CodegenError::Unsupported(format!("operand `{operand}`")))
            }
        }

        Ok(())
    }

    fn store(&mut self, instr: &'a Instruction) -> Result<(), CodegenError> {
        let dest = instr
            .dest()
            .ok_or(CodegenError::Malformed(instr.op.name()))?;
        let slot = self.vars.get_id(self.scope, dest);
        self.emit(&format!("mov [{slot}], ax"));

        Ok(())
    }

    fn intern(&mut self, s: &'a str) -> Result<String, CodegenError> {
        if s.contains('$') {
            return Err(CodegenError::Unsupported("`$` in a printed string".to_string()));
        }

        let index = match self.strings.iter().position(|known| *known == s) {
            Some(index) => index,
            None => {
                self.strings.push(s);
                self.strings.len() - 1
            }
        };

        Ok(format!("s{index}"))
    }

    // Top-level code ends the program instead of falling into a function.
    fn exit(&mut self) {
        if !self.text.ends_with("    jmp __exit\n") {
            self.emit("jmp __exit");
        }
    }

    fn emit(&mut self, line: &str) {
        self.text.push_str("    ");
        self.text.push_str(line);
        self.text.push('\n');
    }
}

fn call_args(operand: Option<&Operand>) -> Vec<&Operand> {
    match operand {
        None => vec![],
        Some(Operand::Args(args)) => args.iter().collect(),
        Some(single) => vec![single],
    }
}

/// `'$'`-terminated NASM byte list; quotes and control characters become
/// numeric bytes.
fn nasm_string(s: &str) -> String {
    let mut parts = vec![];
    let mut run = String::new();

    for c in s.chars() {
        if c == '\'' || c.is_control() {
            if !run.is_empty() {
                parts.push(format!("'{run}'"));
                run.clear();
            }
            parts.push((c as u32).to_string());
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        parts.push(format!("'{run}'"));
    }
    parts.push("'$'".to_string());

    parts.join(", ")
}

/// Every callee must be a user function called with the right number of
/// arguments, and no function may reach itself: parameters live in static
/// slots.
fn check_calls(
    instrs: &[Instruction],
    function_params: &BTreeMap<String, Vec<String>>,
) -> Result<(), CodegenError> {
    let mut calls: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut scope = None;

    for instr in instrs.iter() {
        if let Some(func) = instr
            .label_name()
            .and_then(|label| label.strip_prefix(FUNC_LABEL_PREFIX))
        {
            scope = Some(func);
        }
        if instr.op != Opcode::Call {
            continue;
        }

        let Some(callee) = instr
            .arg1
            .as_ref()
            .and_then(|callee| callee.as_label().or(callee.as_name()))
        else {
            return Err(CodegenError::Malformed(instr.op.name()));
        };

        let Some(params) = function_params.get(callee) else {
            let name = callee.strip_prefix(BUILTIN_PREFIX).unwrap_or(callee);
            if BUILTINS.contains(&name) {
                return Err(CodegenError::Unsupported(format!("builtin `{name}`")));
            }
            return Err(CodegenError::UnknownFunction(callee.to_string()));
        };

        let got = call_args(instr.arg2.as_ref()).len();
        if got != params.len() {
            return Err(CodegenError::ArgCount {
                function: callee.to_string(),
                expected: params.len(),
                got,
            });
        }

        if let Some(caller) = scope {
            calls.entry(caller).or_default().push(callee);
        }
    }

    let mut state = HashMap::new();
    for func in calls.keys() {
        if let Some(callee) = find_cycle(*func, &calls, &mut state) {
            return Err(CodegenError::Unsupported(format!(
                "recursive call to `{callee}`"
            )));
        }
    }

    Ok(())
}

#[derive(Copy, Clone, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

fn find_cycle<'a>(
    func: &'a str,
    calls: &BTreeMap<&'a str, Vec<&'a str>>,
    state: &mut HashMap<&'a str, Visit>,
) -> Option<&'a str> {
    match state.get(func) {
        Some(Visit::Done) => return None,
        Some(Visit::InProgress) => return Some(func),
        None => {}
    }

    state.insert(func, Visit::InProgress);
    for callee in calls.get(func).into_iter().flatten() {
        if let Some(cycle) = find_cycle(*callee, calls, state) {
            return Some(cycle);
        }
    }
    state.insert(func, Visit::Done);

    None
}
