mod call_frame;
mod error;
mod op;
mod value;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use crate::ir::{func_label, Instruction, Opcode, Operand, BUILTIN_PREFIX};

use self::call_frame::{CallFrame, Env};

pub use error::{RuntimeError, RuntimeErrorKind};
pub use value::Value;

/// Nested user calls deeper than this abort instead of growing without bound.
pub const MAX_CALL_DEPTH: usize = 1000;
/// Longest string or list that `+` and `*` will build.
pub const MAX_SEQUENCE_LEN: usize = 1 << 26;

/// Functions CALL resolves when no user function of that name exists.
pub const BUILTINS: [&str; 4] = ["len", "str", "int", "float"];

/// Runs `instructions` to completion and returns the printed lines joined by
/// newlines. `input` is asked for a line whenever an INPUT executes.
pub fn interpret<F>(
    instructions: &[Instruction],
    function_params: &BTreeMap<String, Vec<String>>,
    input: F,
) -> Result<String, RuntimeError>
where
    F: FnMut(Option<&str>) -> String,
{
    Interpreter::new(instructions, function_params, input).run()
}

enum Flow {
    Next,
    Jump(usize),
    Halt,
}

struct Interpreter<'p, F> {
    instructions: &'p [Instruction],
    function_params: &'p BTreeMap<String, Vec<String>>,
    labels: HashMap<&'p str, usize>,
    env: Env,
    frames: Vec<CallFrame>,
    output: Vec<String>,
    input: F,
}

impl<'p, F> Interpreter<'p, F>
where
    F: FnMut(Option<&str>) -> String,
{
    fn new(
        instructions: &'p [Instruction],
        function_params: &'p BTreeMap<String, Vec<String>>,
        input: F,
    ) -> Self {
        let mut labels = HashMap::new();
        for (pc, instr) in instructions.iter().enumerate() {
            if let Some(label) = instr.label_name() {
                labels.entry(label).or_insert(pc);
            }
        }

        Self {
            instructions,
            function_params,
            labels,
            env: Env::new(),
            frames: vec![],
            output: vec![],
            input,
        }
    }

    fn run(mut self) -> Result<String, RuntimeError> {
        let instructions = self.instructions;
        let mut pc = self.labels.get(func_label("main").as_str()).copied().unwrap_or(0);

        while let Some(instr) = instructions.get(pc) {
            match self.dispatch_instruction(pc, instr) {
                Ok(Flow::Next) => pc += 1,
                Ok(Flow::Jump(target)) => pc = target,
                Ok(Flow::Halt) => break,
                Err(kind) => return Err(RuntimeError::new(pc, kind)),
            }
        }

        Ok(self.output.join("\n"))
    }

    fn dispatch_instruction(
        &mut self,
        pc: usize,
        instr: &'p Instruction,
    ) -> Result<Flow, RuntimeErrorKind> {
        let malformed = || RuntimeErrorKind::MalformedInstruction(instr.op.name());

        if let Some(op) = instr.op.binary_op() {
            let lhs = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
            let rhs = self.eval(instr.arg2.as_ref().ok_or_else(malformed)?)?;
            let value = op::binary(op, &lhs, &rhs)?;
            self.store(instr, value)?;

            return Ok(Flow::Next);
        }

        match instr.op {
            Opcode::Assign => {
                let value = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.store(instr, value)?;
            }
            Opcode::Neg => {
                let value = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.store(instr, op::negate(&value)?)?;
            }
            Opcode::Not => {
                let value = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                self.store(instr, op::not(&value))?;
            }
            Opcode::Print => {
                let line = self
                    .eval_args(instr.arg1.as_ref())?
                    .iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.output.push(line);
            }
            Opcode::Label => {}
            Opcode::Goto => {
                let label = instr.jump_target().ok_or_else(malformed)?;
                return self.resolve(label).map(Flow::Jump);
            }
            Opcode::IfFalse => {
                let cond = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                let label = instr.jump_target().ok_or_else(malformed)?;
                if !cond.is_truthy() {
                    return self.resolve(label).map(Flow::Jump);
                }
            }
            Opcode::ListCreate => self.store(instr, Value::new_list(vec![]))?,
            Opcode::DictCreate => self.store(instr, Value::new_dict())?,
            Opcode::ListAppend | Opcode::ListRemove => {
                let target = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                let value = self.eval(instr.arg2.as_ref().ok_or_else(malformed)?)?;
                if instr.op == Opcode::ListAppend {
                    op::append(&target, value)?;
                } else {
                    op::remove(&target, &value)?;
                }
            }
            // Element access dispatches on the container's runtime type, so
            // the LIST_ and DICT_ flavours behave the same.
            Opcode::ListGet | Opcode::DictGet => {
                let container = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                let key = self.eval(instr.arg2.as_ref().ok_or_else(malformed)?)?;
                self.store(instr, op::get_item(&container, &key)?)?;
            }
            Opcode::ListSet | Opcode::DictSet => {
                let container = self.eval(instr.arg1.as_ref().ok_or_else(malformed)?)?;
                let key = self.eval(instr.arg2.as_ref().ok_or_else(malformed)?)?;
                let value = self.eval(instr.result.as_ref().ok_or_else(malformed)?)?;
                op::set_item(&container, key, value)?;
            }
            Opcode::Call => {
                let callee = instr
                    .arg1
                    .as_ref()
                    .and_then(|callee| callee.as_label().or(callee.as_name()))
                    .ok_or_else(malformed)?;
                let args = self.eval_args(instr.arg2.as_ref())?;

                return self.call(pc, callee, args, instr.dest());
            }
            Opcode::Return => {
                let value = match instr.arg1.as_ref() {
                    Some(operand) => self.eval(operand)?,
                    None => Value::None,
                };

                return Ok(match self.frames.pop() {
                    Some(frame) => {
                        let return_pc = frame.get_return_pc();
                        self.env = frame.restore(value);
                        Flow::Jump(return_pc)
                    }
                    None => Flow::Halt,
                });
            }
            Opcode::Input => {
                let prompt = match instr.arg1.as_ref() {
                    Some(operand) => Some(self.eval(operand)?.to_string()),
                    None => None,
                };
                if let Some(prompt) = prompt.as_ref().filter(|p| !p.is_empty()) {
                    self.output.push(prompt.clone());
                }

                let line = (self.input)(prompt.as_deref());
                self.store(instr, Value::Str(line))?;
            }
            // binary opcodes are handled above
            _ => return Err(malformed()),
        }

        Ok(Flow::Next)
    }

    fn call(
        &mut self,
        pc: usize,
        callee: &str,
        args: Vec<Value>,
        result: Option<&str>,
    ) -> Result<Flow, RuntimeErrorKind> {
        let function_params = self.function_params;
        let (name, user_function) = match callee.strip_prefix(BUILTIN_PREFIX) {
            Some(name) => (name, None),
            None => (callee, function_params.get(callee)),
        };
        let Some(params) = user_function else {
            let value = builtin(name, &args)?;
            if let Some(result) = result {
                self.env.insert(result.to_string(), value);
            }

            return Ok(Flow::Next);
        };

        if params.len() != args.len() {
            return Err(RuntimeErrorKind::WrongArgCount {
                function: callee.to_string(),
                expected: params.len(),
                got: args.len(),
            });
        }
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeErrorKind::CallDepthExceeded);
        }

        let entry = self.resolve(&func_label(callee))?;
        let callee_env: Env = params.iter().cloned().zip(args).collect();
        let saved_env = std::mem::replace(&mut self.env, callee_env);

        self.frames
            .push(CallFrame::new(pc + 1, saved_env, result.map(str::to_string)));

        Ok(Flow::Jump(entry))
    }

    fn resolve(&self, label: &str) -> Result<usize, RuntimeErrorKind> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| RuntimeErrorKind::UnresolvedLabel(label.to_string()))
    }

    fn eval(&self, operand: &Operand) -> Result<Value, RuntimeErrorKind> {
        match operand {
            Operand::Number(n) => Ok((*n).into()),
            Operand::Str(s) => Ok(Value::str(s.as_str())),
            Operand::Name(name) | Operand::Label(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.clone())),
            Operand::Args(_) => Err(RuntimeErrorKind::TypeError(
                "argument list used as a value".to_string(),
            )),
        }
    }

    fn eval_args(&self, operand: Option<&Operand>) -> Result<Vec<Value>, RuntimeErrorKind> {
        match operand {
            None => Ok(vec![]),
            Some(Operand::Args(args)) => args.iter().map(|arg| self.eval(arg)).collect(),
            Some(single) => Ok(vec![self.eval(single)?]),
        }
    }

    fn store(&mut self, instr: &Instruction, value: Value) -> Result<(), RuntimeErrorKind> {
        let dest = instr
            .dest()
            .ok_or(RuntimeErrorKind::MalformedInstruction(instr.op.name()))?;
        self.env.insert(dest.to_string(), value);

        Ok(())
    }
}

fn builtin(name: &str, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    if !BUILTINS.contains(&name) {
        return Err(RuntimeErrorKind::UnknownFunction(name.to_string()));
    }

    let [arg] = args else {
        return Err(RuntimeErrorKind::WrongArgCount {
            function: name.to_string(),
            expected: 1,
            got: args.len(),
        });
    };

    match name {
        "len" => op::len(arg),
        "str" => Ok(Value::Str(arg.to_string())),
        "int" => op::to_int(arg),
        _ => op::to_float(arg),
    }
}
