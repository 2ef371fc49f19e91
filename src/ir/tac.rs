use crate::op::{BinaryOp, Number};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Opcode {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Print,
    Label,
    Goto,
    IfFalse,
    ListCreate,
    ListAppend,
    ListRemove,
    ListGet,
    ListSet,
    DictCreate,
    DictGet,
    DictSet,
    Call,
    Return,
    Input,
}

impl Opcode {
    pub fn from_binary(op: BinaryOp) -> Opcode {
        match op {
            BinaryOp::Plus => Opcode::Add,
            BinaryOp::Minus => Opcode::Sub,
            BinaryOp::Multiply => Opcode::Mul,
            BinaryOp::Divide => Opcode::Div,
            BinaryOp::Modulo => Opcode::Mod,
            BinaryOp::Equal => Opcode::Eq,
            BinaryOp::NotEqual => Opcode::Neq,
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Lte => Opcode::Lte,
            BinaryOp::Gte => Opcode::Gte,
        }
    }

    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            Opcode::Add => BinaryOp::Plus,
            Opcode::Sub => BinaryOp::Minus,
            Opcode::Mul => BinaryOp::Multiply,
            Opcode::Div => BinaryOp::Divide,
            Opcode::Mod => BinaryOp::Modulo,
            Opcode::Eq => BinaryOp::Equal,
            Opcode::Neq => BinaryOp::NotEqual,
            Opcode::Lt => BinaryOp::Lt,
            Opcode::Gt => BinaryOp::Gt,
            Opcode::Lte => BinaryOp::Lte,
            Opcode::Gte => BinaryOp::Gte,
            _ => return None,
        })
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod
        )
    }

    /// Instructions whose effect is visible outside of the value they compute.
    /// These are never removed by dead code elimination.
    pub fn has_side_effects(self) -> bool {
        matches!(
            self,
            Opcode::Print
                | Opcode::IfFalse
                | Opcode::Return
                | Opcode::Call
                | Opcode::ListCreate
                | Opcode::ListAppend
                | Opcode::ListRemove
                | Opcode::ListGet
                | Opcode::ListSet
                | Opcode::DictCreate
                | Opcode::DictGet
                | Opcode::DictSet
                | Opcode::Label
                | Opcode::Goto
                | Opcode::Input
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Assign => "ASSIGN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Not => "NOT",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Lte => "LTE",
            Opcode::Gte => "GTE",
            Opcode::Print => "PRINT",
            Opcode::Label => "LABEL",
            Opcode::Goto => "GOTO",
            Opcode::IfFalse => "IF_FALSE",
            Opcode::ListCreate => "LIST_CREATE",
            Opcode::ListAppend => "LIST_APPEND",
            Opcode::ListRemove => "LIST_REMOVE",
            Opcode::ListGet => "LIST_GET",
            Opcode::ListSet => "LIST_SET",
            Opcode::DictCreate => "DICT_CREATE",
            Opcode::DictGet => "DICT_GET",
            Opcode::DictSet => "DICT_SET",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Input => "INPUT",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Operand {
    Number(Number),
    Str(String),
    /// A variable or compiler temporary.
    Name(String),
    /// A jump target, or the callee of a CALL.
    Label(String),
    /// Ordered argument list of a CALL or a multi-argument PRINT.
    Args(Vec<Operand>),
}

impl Operand {
    pub fn name(name: impl Into<String>) -> Self {
        Operand::Name(name.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Operand::Label(name.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Operand::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Number(_) | Operand::Str(_))
    }

    /// Every variable name this operand reads, looking through argument lists.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Operand::Name(name) => vec![name.as_str()],
            Operand::Args(args) => args.iter().flat_map(|arg| arg.names()).collect(),
            _ => vec![],
        }
    }
}

/// Compiler temporaries are `t<digits>` or anything starting with `_`.
pub fn is_temp(name: &str) -> bool {
    if name.starts_with('_') {
        return true;
    }

    match name.strip_prefix('t') {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    pub op: Opcode,
    pub arg1: Option<Operand>,
    pub arg2: Option<Operand>,
    pub result: Option<Operand>,
}

impl Instruction {
    pub fn new(
        op: Opcode,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) -> Self {
        Self {
            op,
            arg1,
            arg2,
            result,
        }
    }

    pub fn assign(src: Operand, dest: Operand) -> Self {
        Self::new(Opcode::Assign, Some(src), None, Some(dest))
    }

    pub fn binary(op: Opcode, lhs: Operand, rhs: Operand, dest: Operand) -> Self {
        Self::new(op, Some(lhs), Some(rhs), Some(dest))
    }

    pub fn unary(op: Opcode, src: Operand, dest: Operand) -> Self {
        Self::new(op, Some(src), None, Some(dest))
    }

    pub fn label(name: &str) -> Self {
        Self::new(Opcode::Label, Some(Operand::label(name)), None, None)
    }

    pub fn goto(label: &str) -> Self {
        Self::new(Opcode::Goto, Some(Operand::label(label)), None, None)
    }

    pub fn if_false(cond: Operand, label: &str) -> Self {
        Self::new(Opcode::IfFalse, Some(cond), Some(Operand::label(label)), None)
    }

    pub fn print(src: Operand) -> Self {
        Self::new(Opcode::Print, Some(src), None, None)
    }

    pub fn ret(value: Option<Operand>) -> Self {
        Self::new(Opcode::Return, value, None, None)
    }

    /// Element and key stores read their `result` operand instead of
    /// writing it.
    pub fn is_store(&self) -> bool {
        matches!(self.op, Opcode::ListSet | Opcode::DictSet)
    }

    /// The variable this instruction defines, if any.
    pub fn dest(&self) -> Option<&str> {
        if self.is_store() {
            return None;
        }

        self.result.as_ref().and_then(Operand::as_name)
    }

    /// The label a GOTO or IF_FALSE jumps to.
    pub fn jump_target(&self) -> Option<&str> {
        match self.op {
            Opcode::Goto => self.arg1.as_ref().and_then(Operand::as_label),
            Opcode::IfFalse => self.arg2.as_ref().and_then(Operand::as_label),
            _ => None,
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        match self.op {
            Opcode::Label => self.arg1.as_ref().and_then(Operand::as_label),
            _ => None,
        }
    }

    /// The operands this instruction reads.
    pub fn reads(&self) -> Vec<&Operand> {
        let mut reads: Vec<&Operand> = [&self.arg1, &self.arg2]
            .into_iter()
            .flatten()
            .filter(|operand| !matches!(operand, Operand::Label(_)))
            .collect();

        if self.is_store() {
            reads.extend(self.result.as_ref());
        }

        reads
    }

    pub fn reads_mut(&mut self) -> Vec<&mut Operand> {
        let is_store = self.is_store();
        let mut reads: Vec<&mut Operand> = [&mut self.arg1, &mut self.arg2]
            .into_iter()
            .flatten()
            .filter(|operand| !matches!(operand, Operand::Label(_)))
            .collect();

        if is_store {
            reads.extend(self.result.as_mut());
        }

        reads
    }

    /// Every variable name this instruction reads.
    pub fn used_names(&self) -> Vec<&str> {
        self.reads().into_iter().flat_map(Operand::names).collect()
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{n}"),
            Operand::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Operand::Name(name) | Operand::Label(name) => f.write_str(name),
            Operand::Args(args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                Ok(())
            }
        }
    }
}

struct Slot<'a>(&'a Option<Operand>);

impl fmt::Display for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(operand) => write!(f, "{operand}"),
            None => f.write_str("_"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a1 = Slot(&self.arg1);
        let a2 = Slot(&self.arg2);
        let res = Slot(&self.result);

        if let Some(op) = self.op.binary_op() {
            return write!(f, "{res} = {a1} {op} {a2}");
        }

        match self.op {
            Opcode::Assign => write!(f, "{res} = {a1}"),
            Opcode::Neg => write!(f, "{res} = -{a1}"),
            Opcode::Not => write!(f, "{res} = not {a1}"),
            Opcode::Print => match &self.arg1 {
                Some(arg) => write!(f, "print({arg})"),
                None => f.write_str("print()"),
            },
            Opcode::Label => write!(f, "{a1}:"),
            Opcode::Goto => write!(f, "goto {a1}"),
            Opcode::IfFalse => write!(f, "if_false {a1} goto {a2}"),
            Opcode::ListCreate => write!(f, "{res} = []"),
            Opcode::DictCreate => write!(f, "{res} = {{}}"),
            Opcode::ListAppend => write!(f, "{a1}.append({a2})"),
            Opcode::ListRemove => write!(f, "{a1}.remove({a2})"),
            Opcode::ListGet | Opcode::DictGet => write!(f, "{res} = {a1}[{a2}]"),
            Opcode::ListSet | Opcode::DictSet => write!(f, "{a1}[{a2}] = {res}"),
            Opcode::Call => {
                if self.result.is_some() {
                    write!(f, "{res} = ")?;
                }
                match &self.arg2 {
                    Some(args) => write!(f, "{a1}({args})"),
                    None => write!(f, "{a1}()"),
                }
            }
            Opcode::Return => match &self.arg1 {
                Some(value) => write!(f, "return {value}"),
                None => f.write_str("return"),
            },
            Opcode::Input => match &self.arg1 {
                Some(prompt) => write!(f, "{res} = input({prompt})"),
                None => write!(f, "{res} = input()"),
            },
            // binary opcodes returned above
            _ => write!(f, "{} {a1} {a2} {res}", self.op.name()),
        }
    }
}

/// Output of TAC generation: the flat instruction list plus each function's
/// ordered parameter names.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TacProgram {
    pub instructions: Vec<Instruction>,
    pub function_params: BTreeMap<String, Vec<String>>,
}

/// One instruction per line, in the textual form used by the golden tests.
pub fn render(instructions: &[Instruction]) -> String {
    instructions
        .iter()
        .map(|instr| instr.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Listing with instruction indices, labels flush left, for stage dumps.
pub fn render_numbered(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for (pc, instr) in instructions.iter().enumerate() {
        if instr.op == Opcode::Label {
            out.push_str(&format!("{pc:>4}  {instr}\n"));
        } else {
            out.push_str(&format!("{pc:>4}      {instr}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(n: &str) -> Operand {
        Operand::name(n)
    }

    fn int(i: i64) -> Operand {
        Operand::Number(Number::Int(i))
    }

    #[test]
    fn renders_every_form() {
        let instrs = vec![
            Instruction::assign(int(5), name("x")),
            Instruction::binary(Opcode::Add, name("x"), int(1), name("t0")),
            Instruction::binary(Opcode::Lte, name("x"), name("y"), name("t1")),
            Instruction::unary(Opcode::Neg, name("x"), name("t2")),
            Instruction::unary(Opcode::Not, name("t1"), name("t3")),
            Instruction::print(Operand::Str("hi \"you\"".to_string())),
            Instruction::label("L0"),
            Instruction::goto("L0"),
            Instruction::if_false(name("t1"), "L0"),
            Instruction::new(Opcode::ListCreate, None, None, Some(name("t4"))),
            Instruction::new(Opcode::DictCreate, None, None, Some(name("t5"))),
            Instruction::new(Opcode::ListAppend, Some(name("t4")), Some(int(1)), None),
            Instruction::new(Opcode::ListRemove, Some(name("t4")), Some(int(1)), None),
            Instruction::new(Opcode::ListGet, Some(name("t4")), Some(int(0)), Some(name("t6"))),
            Instruction::new(
                Opcode::DictSet,
                Some(name("t5")),
                Some(Operand::Str("k".to_string())),
                Some(int(2)),
            ),
            Instruction::new(
                Opcode::Call,
                Some(Operand::label("f")),
                Some(Operand::Args(vec![name("x"), int(2)])),
                Some(name("t7")),
            ),
            Instruction::new(Opcode::Call, Some(Operand::label("g")), None, Some(name("t8"))),
            Instruction::ret(Some(name("t7"))),
            Instruction::ret(None),
            Instruction::new(Opcode::Input, Some(Operand::Str("? ".to_string())), None, Some(name("t9"))),
        ];

        let expected = r#"x = 5
t0 = x + 1
t1 = x <= y
t2 = -x
t3 = not t1
print("hi \"you\"")
L0:
goto L0
if_false t1 goto L0
t4 = []
t5 = {}
t4.append(1)
t4.remove(1)
t6 = t4[0]
t5["k"] = 2
t7 = f(x, 2)
t8 = g()
return t7
return
t9 = input("? ")"#;

        assert_eq!(render(&instrs), expected);
    }

    #[test]
    fn temp_names() {
        assert!(is_temp("t0"));
        assert!(is_temp("t12"));
        assert!(is_temp("_idx"));
        assert!(!is_temp("t"));
        assert!(!is_temp("total"));
        assert!(!is_temp("x"));
    }

    #[test]
    fn stores_read_their_result_slot() {
        let set = Instruction::new(Opcode::ListSet, Some(name("xs")), Some(name("i")), Some(name("v")));

        assert_eq!(set.dest(), None);
        assert_eq!(set.used_names(), vec!["xs", "i", "v"]);
    }

    #[test]
    fn labels_are_not_reads() {
        let jump = Instruction::if_false(name("c"), "L3");
        let call = Instruction::new(
            Opcode::Call,
            Some(Operand::label("f")),
            Some(Operand::Args(vec![name("a"), name("b")])),
            Some(name("t0")),
        );

        assert_eq!(jump.used_names(), vec!["c"]);
        assert_eq!(jump.jump_target(), Some("L3"));
        assert_eq!(call.used_names(), vec!["a", "b"]);
        assert_eq!(call.dest(), Some("t0"));
    }
}
