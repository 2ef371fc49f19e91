use super::tac::{Instruction, Opcode, Operand, TacProgram};
use crate::op::{Number, UnaryOp};
use crate::parser::ast::{Block, Expr, Iterable, Method, Program, Stmt};
use std::collections::{BTreeMap, HashSet, VecDeque};

pub const FUNC_LABEL_PREFIX: &str = "func_";

pub fn func_label(name: &str) -> String {
    format!("{FUNC_LABEL_PREFIX}{name}")
}

/// Callee prefix for calls that must reach a builtin even when a user
/// function shares its name. No identifier can contain the dot.
pub const BUILTIN_PREFIX: &str = "builtin.";

/// Lowers a whole program. Top level code comes first; when functions exist
/// it is closed by a bare `return` and followed by one `func_<name>:` section
/// per function.
pub fn generate_tac(program: &Program) -> TacProgram {
    let mut generator = TacGenerator::new(program);

    for stmt in program.statements.iter() {
        generator.gen_stmt(stmt);
    }

    if !generator.pending_funcs.is_empty() {
        generator.emit(Instruction::ret(None));
    }

    while let Some(func) = generator.pending_funcs.pop_front() {
        generator.gen_func(func);
    }

    TacProgram {
        instructions: generator.instructions,
        function_params: generator.function_params,
    }
}

struct PendingFunc<'a> {
    name: &'a str,
    params: &'a [String],
    body: &'a Block,
}

struct TacGenerator<'a> {
    instructions: Vec<Instruction>,
    function_params: BTreeMap<String, Vec<String>>,
    pending_funcs: VecDeque<PendingFunc<'a>>,
    user_names: HashSet<String>,
    temp_counter: usize,
    label_counter: usize,
}

impl<'a> TacGenerator<'a> {
    fn new(program: &Program) -> Self {
        let mut user_names = HashSet::new();
        collect_names_in_stmts(&program.statements, &mut user_names);

        Self {
            instructions: vec![],
            function_params: BTreeMap::new(),
            pending_funcs: VecDeque::new(),
            user_names,
            temp_counter: 0,
            label_counter: 0,
        }
    }

    fn emit(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    fn new_temp(&mut self) -> Operand {
        loop {
            let name = format!("t{}", self.temp_counter);
            self.temp_counter += 1;

            if !self.user_names.contains(&name) {
                return Operand::Name(name);
            }
        }
    }

    fn new_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn gen_func(&mut self, func: PendingFunc<'a>) {
        self.function_params
            .insert(func.name.to_string(), func.params.to_vec());

        self.emit(Instruction::label(&func_label(func.name)));
        self.gen_stmts(&func.body.statements);

        if !matches!(func.body.statements.last(), Some(Stmt::Return { .. })) {
            self.emit(Instruction::ret(None));
        }
    }

    fn gen_stmts(&mut self, stmts: &'a [Stmt]) {
        for stmt in stmts.iter() {
            self.gen_stmt(stmt);
        }
    }

    fn gen_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Assignment {
                identifier, value, ..
            }
            | Stmt::Declaration {
                identifier,
                value: Some(value),
                ..
            } => {
                let src = self.gen_expr(value);
                self.emit(Instruction::assign(src, Operand::name(identifier)));
            }
            Stmt::Declaration { value: None, .. } => {}
            Stmt::IndexAssignment {
                target,
                index,
                value,
                ..
            } => {
                let key = self.gen_expr(index);
                let src = self.gen_expr(value);
                let op = subscript_op(&key, Opcode::ListSet, Opcode::DictSet);

                self.emit(Instruction::new(
                    op,
                    Some(Operand::name(target)),
                    Some(key),
                    Some(src),
                ));
            }
            Stmt::Print { args, .. } => {
                let mut operands: Vec<Operand> = args.iter().map(|arg| self.gen_expr(arg)).collect();

                let arg = match operands.len() {
                    0 => None,
                    1 => operands.pop(),
                    _ => Some(Operand::Args(operands)),
                };
                self.emit(Instruction::new(Opcode::Print, arg, None, None));
            }
            Stmt::If {
                condition,
                then_block,
                elif_parts,
                else_block,
                ..
            } => self.gen_if(condition, then_block, elif_parts, else_block.as_ref()),
            Stmt::While {
                condition, body, ..
            } => {
                let start = self.new_label();
                let end = self.new_label();

                self.emit(Instruction::label(&start));
                let cond = self.gen_expr(condition);
                self.emit(Instruction::if_false(cond, &end));
                self.gen_stmts(&body.statements);
                self.emit(Instruction::goto(&start));
                self.emit(Instruction::label(&end));
            }
            Stmt::For {
                variable,
                iterable: Iterable::Range { start, stop },
                body,
                ..
            } => self.gen_for_range(variable, start.as_ref(), stop, body),
            Stmt::For {
                variable,
                iterable: Iterable::Expr(seq),
                body,
                ..
            } => self.gen_for_each(variable, seq, body),
            Stmt::Function {
                name, params, body, ..
            } => self.pending_funcs.push_back(PendingFunc {
                name,
                params,
                body,
            }),
            Stmt::Return { value, .. } => {
                let value = value.as_ref().map(|v| self.gen_expr(v));
                self.emit(Instruction::ret(value));
            }
            Stmt::MethodCall {
                target,
                method,
                argument,
                ..
            } => {
                let arg = self.gen_expr(argument);
                let op = match method {
                    Method::Append => Opcode::ListAppend,
                    Method::Remove => Opcode::ListRemove,
                };

                self.emit(Instruction::new(op, Some(Operand::name(target)), Some(arg), None));
            }
            Stmt::Expr { expr, .. } => {
                self.gen_expr(expr);
            }
        }
    }

    fn gen_if(
        &mut self,
        condition: &'a Expr,
        then_block: &'a Block,
        elif_parts: &'a [(Expr, Block)],
        else_block: Option<&'a Block>,
    ) {
        let cond = self.gen_expr(condition);

        if elif_parts.is_empty() && else_block.is_none() {
            let end = self.new_label();
            self.emit(Instruction::if_false(cond, &end));
            self.gen_stmts(&then_block.statements);
            self.emit(Instruction::label(&end));
            return;
        }

        let mut next = self.new_label();
        let end = self.new_label();

        self.emit(Instruction::if_false(cond, &next));
        self.gen_stmts(&then_block.statements);
        self.emit(Instruction::goto(&end));

        for (i, (elif_cond, block)) in elif_parts.iter().enumerate() {
            self.emit(Instruction::label(&next));

            let is_last = i + 1 == elif_parts.len() && else_block.is_none();
            let target = if is_last { end.clone() } else { self.new_label() };

            let cond = self.gen_expr(elif_cond);
            self.emit(Instruction::if_false(cond, &target));
            self.gen_stmts(&block.statements);
            self.emit(Instruction::goto(&end));

            next = target;
        }

        if let Some(block) = else_block {
            self.emit(Instruction::label(&next));
            self.gen_stmts(&block.statements);
        }

        self.emit(Instruction::label(&end));
    }

    fn gen_for_range(
        &mut self,
        variable: &'a str,
        start: Option<&'a Expr>,
        stop: &'a Expr,
        body: &'a Block,
    ) {
        let first = match start {
            Some(start) => self.gen_expr(start),
            None => Operand::Number(Number::Int(0)),
        };

        // the bound is evaluated once, a copy protects it from the body
        let mut bound = self.gen_expr(stop);
        if matches!(bound, Operand::Name(_)) {
            let copy = self.new_temp();
            self.emit(Instruction::assign(bound, copy.clone()));
            bound = copy;
        }

        let counter = Operand::name(variable);
        self.emit(Instruction::assign(first, counter.clone()));

        self.gen_counting_loop(counter, bound, |gen| {
            gen.gen_stmts(&body.statements);
        });
    }

    fn gen_for_each(&mut self, variable: &'a str, seq: &'a Expr, body: &'a Block) {
        let seq = self.gen_expr(seq);

        let len = self.new_temp();
        self.emit(Instruction::new(
            Opcode::Call,
            Some(Operand::label(format!("{BUILTIN_PREFIX}len"))),
            Some(Operand::Args(vec![seq.clone()])),
            Some(len.clone()),
        ));

        let index = self.new_temp();
        self.emit(Instruction::assign(Operand::Number(Number::Int(0)), index.clone()));

        self.gen_counting_loop(index.clone(), len, |gen| {
            gen.emit(Instruction::new(
                Opcode::ListGet,
                Some(seq),
                Some(index),
                Some(Operand::name(variable)),
            ));
            gen.gen_stmts(&body.statements);
        });
    }

    // start: if_false counter < bound goto end; body; counter += 1; goto start; end:
    fn gen_counting_loop(
        &mut self,
        counter: Operand,
        bound: Operand,
        body: impl FnOnce(&mut Self),
    ) {
        let start = self.new_label();
        let end = self.new_label();

        self.emit(Instruction::label(&start));
        let cond = self.new_temp();
        self.emit(Instruction::binary(Opcode::Lt, counter.clone(), bound, cond.clone()));
        self.emit(Instruction::if_false(cond, &end));

        body(self);

        let next = self.new_temp();
        self.emit(Instruction::binary(
            Opcode::Add,
            counter.clone(),
            Operand::Number(Number::Int(1)),
            next.clone(),
        ));
        self.emit(Instruction::assign(next, counter));
        self.emit(Instruction::goto(&start));
        self.emit(Instruction::label(&end));
    }

    fn gen_expr(&mut self, expr: &'a Expr) -> Operand {
        match expr {
            Expr::Number { value, .. } => Operand::Number(*value),
            Expr::String { value, .. } => Operand::Str(value.clone()),
            Expr::Identifier { name, .. } => Operand::name(name),
            Expr::BinaryOp {
                left, op, right, ..
            } => {
                let lhs = self.gen_expr(left);
                let rhs = self.gen_expr(right);
                let dest = self.new_temp();

                self.emit(Instruction::binary(Opcode::from_binary(*op), lhs, rhs, dest.clone()));
                dest
            }
            Expr::UnaryOp { op, operand, .. } => {
                let src = self.gen_expr(operand);
                let dest = self.new_temp();
                let opcode = match op {
                    UnaryOp::Negate => Opcode::Neg,
                    UnaryOp::Not => Opcode::Not,
                };

                self.emit(Instruction::unary(opcode, src, dest.clone()));
                dest
            }
            Expr::List { elements, .. } => {
                let dest = self.new_temp();
                self.emit(Instruction::new(Opcode::ListCreate, None, None, Some(dest.clone())));

                for element in elements {
                    let value = self.gen_expr(element);
                    self.emit(Instruction::new(
                        Opcode::ListAppend,
                        Some(dest.clone()),
                        Some(value),
                        None,
                    ));
                }

                dest
            }
            Expr::Dict { items, .. } => {
                let dest = self.new_temp();
                self.emit(Instruction::new(Opcode::DictCreate, None, None, Some(dest.clone())));

                for (key, value) in items {
                    let key = self.gen_expr(key);
                    let value = self.gen_expr(value);
                    self.emit(Instruction::new(
                        Opcode::DictSet,
                        Some(dest.clone()),
                        Some(key),
                        Some(value),
                    ));
                }

                dest
            }
            Expr::Index { base, index, .. } => {
                let base = self.gen_expr(base);
                let key = self.gen_expr(index);
                let op = subscript_op(&key, Opcode::ListGet, Opcode::DictGet);
                let dest = self.new_temp();

                self.emit(Instruction::new(op, Some(base), Some(key), Some(dest.clone())));
                dest
            }
            Expr::Call { function, args, .. } => {
                let args: Vec<Operand> = args.iter().map(|arg| self.gen_expr(arg)).collect();
                let dest = self.new_temp();
                let args = if args.is_empty() {
                    None
                } else {
                    Some(Operand::Args(args))
                };

                self.emit(Instruction::new(
                    Opcode::Call,
                    Some(Operand::label(function)),
                    args,
                    Some(dest.clone()),
                ));
                dest
            }
            Expr::Input { prompt, .. } => {
                let prompt = prompt.as_ref().map(|p| self.gen_expr(p));
                let dest = self.new_temp();

                self.emit(Instruction::new(Opcode::Input, prompt, None, Some(dest.clone())));
                dest
            }
        }
    }
}

// string literal keys select the dict form, anything else the list form
fn subscript_op(key: &Operand, list_op: Opcode, dict_op: Opcode) -> Opcode {
    match key {
        Operand::Str(_) => dict_op,
        _ => list_op,
    }
}

fn collect_names_in_stmts(stmts: &[Stmt], names: &mut HashSet<String>) {
    for stmt in stmts {
        collect_names_in_stmt(stmt, names);
    }
}

fn collect_names_in_stmt(stmt: &Stmt, names: &mut HashSet<String>) {
    match stmt {
        Stmt::Assignment {
            identifier, value, ..
        } => {
            names.insert(identifier.clone());
            collect_names_in_expr(value, names);
        }
        Stmt::Declaration {
            identifier, value, ..
        } => {
            names.insert(identifier.clone());
            if let Some(value) = value {
                collect_names_in_expr(value, names);
            }
        }
        Stmt::IndexAssignment {
            target,
            index,
            value,
            ..
        } => {
            names.insert(target.clone());
            collect_names_in_expr(index, names);
            collect_names_in_expr(value, names);
        }
        Stmt::Print { args, .. } => args.iter().for_each(|a| collect_names_in_expr(a, names)),
        Stmt::If {
            condition,
            then_block,
            elif_parts,
            else_block,
            ..
        } => {
            collect_names_in_expr(condition, names);
            collect_names_in_stmts(&then_block.statements, names);
            for (cond, block) in elif_parts {
                collect_names_in_expr(cond, names);
                collect_names_in_stmts(&block.statements, names);
            }
            if let Some(block) = else_block {
                collect_names_in_stmts(&block.statements, names);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            collect_names_in_expr(condition, names);
            collect_names_in_stmts(&body.statements, names);
        }
        Stmt::For {
            variable,
            iterable,
            body,
            ..
        } => {
            names.insert(variable.clone());
            match iterable {
                Iterable::Range { start, stop } => {
                    if let Some(start) = start {
                        collect_names_in_expr(start, names);
                    }
                    collect_names_in_expr(stop, names);
                }
                Iterable::Expr(expr) => collect_names_in_expr(expr, names),
            }
            collect_names_in_stmts(&body.statements, names);
        }
        Stmt::Function {
            name, params, body, ..
        } => {
            names.insert(name.clone());
            names.extend(params.iter().cloned());
            collect_names_in_stmts(&body.statements, names);
        }
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                collect_names_in_expr(value, names);
            }
        }
        Stmt::MethodCall {
            target, argument, ..
        } => {
            names.insert(target.clone());
            collect_names_in_expr(argument, names);
        }
        Stmt::Expr { expr, .. } => collect_names_in_expr(expr, names),
    }
}

fn collect_names_in_expr(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Number { .. } | Expr::String { .. } => {}
        Expr::Identifier { name, .. } => {
            names.insert(name.clone());
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_names_in_expr(left, names);
            collect_names_in_expr(right, names);
        }
        Expr::UnaryOp { operand, .. } => collect_names_in_expr(operand, names),
        Expr::List { elements, .. } => elements.iter().for_each(|e| collect_names_in_expr(e, names)),
        Expr::Dict { items, .. } => {
            for (key, value) in items {
                collect_names_in_expr(key, names);
                collect_names_in_expr(value, names);
            }
        }
        Expr::Index { base, index, .. } => {
            collect_names_in_expr(base, names);
            collect_names_in_expr(index, names);
        }
        Expr::Call { function, args, .. } => {
            names.insert(function.clone());
            args.iter().for_each(|a| collect_names_in_expr(a, names));
        }
        Expr::Input { prompt, .. } => {
            if let Some(prompt) = prompt {
                collect_names_in_expr(prompt, names);
            }
        }
    }
}
