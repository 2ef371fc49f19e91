mod scope;

pub use scope::{SymbolTable, Type, TypeInfo};

use crate::op::{BinaryOp, Number, UnaryOp};
use crate::parser::ast::{Block, Expr, Iterable, Program, Stmt};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const BUILTINS: [(&str, Type); 4] = [
    ("len", Type::Int),
    ("str", Type::Str),
    ("int", Type::Int),
    ("float", Type::Float),
];

/// Advisory findings of the semantic pass. Nothing here stops compilation on
/// its own; callers decide what to do with `errors`.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct Analysis {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub symbol_table: BTreeMap<String, TypeInfo>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Error, Debug)]
enum SemanticError {
    #[error("use of undeclared variable `{0}`")]
    Undeclared(String),

    #[error("call to undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("`{0}` is not a function")]
    NotCallable(String),

    #[error("function `{name}` expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch: unsupported operand types for `{op}`: {lhs} and {rhs}")]
    Mismatch { op: BinaryOp, lhs: Type, rhs: Type },

    #[error("type mismatch: bad operand type for unary `-`: {0}")]
    BadNegate(Type),

    #[error("type mismatch: {0} is not subscriptable")]
    NotSubscriptable(Type),

    #[error("type mismatch: `{0}` is {1}, not a list")]
    NotAList(String, Type),

    #[error("`return` outside of a function")]
    ReturnOutsideFunction,

    #[error("redefinition of function `{0}`")]
    Redefined(String),
}

#[derive(Error, Debug)]
enum SemanticWarning {
    #[error("variable `{0}` may be used before it is initialized")]
    Uninitialized(String),

    #[error("possible division by zero")]
    DivisionByZero,

    #[error("top-level statements are not executed when `main` is defined")]
    UnreachableTopLevel,
}

pub fn analyze(program: &Program) -> Analysis {
    let mut analyzer = Analyzer {
        table: SymbolTable::new(),
        function_depth: 0,
        analysis: Analysis::default(),
    };

    analyzer.hoist_functions(&program.statements);

    let has_main = program
        .statements
        .iter()
        .any(|stmt| matches!(stmt, Stmt::Function { name, .. } if name == "main"));
    if has_main {
        if let Some(stmt) = program
            .statements
            .iter()
            .find(|stmt| !matches!(stmt, Stmt::Function { .. }))
        {
            analyzer.warning(stmt.line(), SemanticWarning::UnreachableTopLevel);
        }
    }

    for stmt in program.statements.iter() {
        analyzer.check_stmt(stmt);
    }

    let mut analysis = analyzer.analysis;
    analysis.symbol_table = analyzer.table.into_global().into_iter().collect();
    analysis
}

struct Analyzer {
    table: SymbolTable,
    function_depth: usize,
    analysis: Analysis,
}

impl Analyzer {
    fn error(&mut self, line: usize, err: SemanticError) {
        self.analysis.errors.push(format!("line {line}: {err}"));
    }

    fn warning(&mut self, line: usize, warning: SemanticWarning) {
        self.analysis.warnings.push(format!("line {line}: {warning}"));
    }

    fn hoist_functions(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Function {
                name, params, line, ..
            } = stmt
            {
                if let Some(TypeInfo {
                    typ: Type::Function,
                    ..
                }) = self.table.lookup(name)
                {
                    self.error(*line, SemanticError::Redefined(name.clone()));
                }

                self.table.declare(name, TypeInfo::function(params.len()));
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.table.push_scope();
        for stmt in block.statements.iter() {
            self.check_stmt(stmt);
        }
        self.table.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assignment {
                identifier, value, ..
            } => {
                let typ = self.infer(value);
                self.table.assign(identifier, typ);
            }
            Stmt::Declaration {
                identifier, value, ..
            } => match value {
                Some(value) => {
                    let typ = self.infer(value);
                    self.table.declare(identifier, TypeInfo::var(typ));
                }
                None => self.table.declare(identifier, TypeInfo::uninitialized()),
            },
            Stmt::IndexAssignment {
                target,
                index,
                value,
                line,
            } => {
                let typ = self.read_var(target, *line);
                if !matches!(typ, Type::List | Type::Dict | Type::Unknown) {
                    self.error(*line, SemanticError::NotSubscriptable(typ));
                }
                self.infer(index);
                self.infer(value);
            }
            Stmt::Print { args, .. } => {
                for arg in args {
                    self.infer(arg);
                }
            }
            Stmt::If {
                condition,
                then_block,
                elif_parts,
                else_block,
                ..
            } => {
                self.infer(condition);
                self.check_block(then_block);

                for (cond, block) in elif_parts {
                    self.infer(cond);
                    self.check_block(block);
                }

                if let Some(block) = else_block {
                    self.check_block(block);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.infer(condition);
                self.check_block(body);
            }
            Stmt::For {
                variable,
                iterable,
                body,
                ..
            } => {
                let element = match iterable {
                    Iterable::Range { start, stop } => {
                        if let Some(start) = start {
                            self.infer(start);
                        }
                        self.infer(stop);
                        Type::Int
                    }
                    Iterable::Expr(expr) => {
                        self.infer(expr);
                        Type::Unknown
                    }
                };

                self.table.push_scope();
                self.table.declare(variable, TypeInfo::var(element));
                for stmt in body.statements.iter() {
                    self.check_stmt(stmt);
                }
                self.table.pop_scope();
            }
            Stmt::Function {
                name,
                params,
                body,
                ..
            } => {
                // top level definitions were hoisted before the walk
                if self.table.depth() > 1 {
                    self.table.declare(name, TypeInfo::function(params.len()));
                }

                self.table.push_scope();
                for param in params {
                    self.table.declare(param, TypeInfo::var(Type::Unknown));
                }

                self.function_depth += 1;
                self.hoist_functions(&body.statements);
                for stmt in body.statements.iter() {
                    self.check_stmt(stmt);
                }
                self.function_depth -= 1;

                self.table.pop_scope();
            }
            Stmt::Return { value, line } => {
                if self.function_depth == 0 {
                    self.error(*line, SemanticError::ReturnOutsideFunction);
                }

                if let Some(value) = value {
                    self.infer(value);
                }
            }
            Stmt::MethodCall {
                target,
                argument,
                line,
                ..
            } => {
                let typ = self.read_var(target, *line);
                if !matches!(typ, Type::List | Type::Unknown) {
                    self.error(*line, SemanticError::NotAList(target.clone(), typ));
                }
                self.infer(argument);
            }
            Stmt::Expr { expr, .. } => {
                self.infer(expr);
            }
        }
    }

    fn read_var(&mut self, name: &str, line: usize) -> Type {
        match self.table.lookup(name) {
            None => {
                self.error(line, SemanticError::Undeclared(name.to_string()));
                Type::Unknown
            }
            Some(info) if !info.initialized => {
                let typ = info.typ;
                self.warning(line, SemanticWarning::Uninitialized(name.to_string()));
                typ
            }
            Some(info) => info.typ,
        }
    }

    fn infer(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Number {
                value: Number::Int(_),
                ..
            } => Type::Int,
            Expr::Number {
                value: Number::Float(_),
                ..
            } => Type::Float,
            Expr::String { .. } => Type::Str,
            Expr::Identifier { name, line } => self.read_var(name, *line),
            Expr::BinaryOp {
                left,
                op,
                right,
                line,
            } => {
                let lhs = self.infer(left);
                let rhs = self.infer(right);

                if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) {
                    if let Expr::Number { value, .. } = right.as_ref() {
                        if value.is_zero() {
                            self.warning(*line, SemanticWarning::DivisionByZero);
                        }
                    }
                }

                if op.is_comparison() {
                    return Type::Bool;
                }

                match binary_type(*op, lhs, rhs) {
                    Some(typ) => typ,
                    None => {
                        self.error(*line, SemanticError::Mismatch { op: *op, lhs, rhs });
                        Type::Unknown
                    }
                }
            }
            Expr::UnaryOp { op, operand, line } => {
                let typ = self.infer(operand);

                match op {
                    UnaryOp::Not => Type::Bool,
                    UnaryOp::Negate => match typ {
                        Type::Bool => Type::Int,
                        Type::Int | Type::Float | Type::Unknown => typ,
                        _ => {
                            self.error(*line, SemanticError::BadNegate(typ));
                            Type::Unknown
                        }
                    },
                }
            }
            Expr::List { elements, .. } => {
                for element in elements {
                    self.infer(element);
                }
                Type::List
            }
            Expr::Dict { items, .. } => {
                for (key, value) in items {
                    self.infer(key);
                    self.infer(value);
                }
                Type::Dict
            }
            Expr::Index { base, index, line } => {
                let typ = self.infer(base);
                self.infer(index);

                match typ {
                    Type::List | Type::Dict | Type::Unknown => Type::Unknown,
                    Type::Str => Type::Str,
                    _ => {
                        self.error(*line, SemanticError::NotSubscriptable(typ));
                        Type::Unknown
                    }
                }
            }
            Expr::Call {
                function,
                args,
                line,
            } => {
                for arg in args {
                    self.infer(arg);
                }

                self.check_call(function, args.len(), *line)
            }
            Expr::Input { prompt, .. } => {
                if let Some(prompt) = prompt {
                    self.infer(prompt);
                }
                Type::Str
            }
        }
    }

    fn check_call(&mut self, function: &str, argc: usize, line: usize) -> Type {
        let (expected, result) = match self.table.lookup(function) {
            Some(TypeInfo {
                typ: Type::Function,
                arity,
                ..
            }) => (arity.unwrap_or(argc), Type::Unknown),
            Some(_) => {
                self.error(line, SemanticError::NotCallable(function.to_string()));
                return Type::Unknown;
            }
            None => match BUILTINS.iter().find(|(name, _)| *name == function) {
                Some((_, result)) => (1, *result),
                None => {
                    self.error(line, SemanticError::UndefinedFunction(function.to_string()));
                    return Type::Unknown;
                }
            },
        };

        if expected != argc {
            self.error(
                line,
                SemanticError::Arity {
                    name: function.to_string(),
                    expected,
                    found: argc,
                },
            );
        }

        result
    }
}

fn binary_type(op: BinaryOp, lhs: Type, rhs: Type) -> Option<Type> {
    if lhs == Type::Unknown || rhs == Type::Unknown {
        return Some(Type::Unknown);
    }

    if lhs.is_numeric() && rhs.is_numeric() {
        return Some(match op {
            BinaryOp::Divide => Type::Float,
            _ if lhs == Type::Float || rhs == Type::Float => Type::Float,
            _ => Type::Int,
        });
    }

    match (op, lhs, rhs) {
        (BinaryOp::Plus, Type::Str, Type::Str) => Some(Type::Str),
        (BinaryOp::Plus, Type::List, Type::List) => Some(Type::List),
        (BinaryOp::Multiply, Type::Str, Type::Int) | (BinaryOp::Multiply, Type::Int, Type::Str) => {
            Some(Type::Str)
        }
        (BinaryOp::Multiply, Type::List, Type::Int) | (BinaryOp::Multiply, Type::Int, Type::List) => {
            Some(Type::List)
        }
        _ => None,
    }
}
