use crate::op::{BinaryOp, Number, UnaryOp};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        identifier: String,
        value: Expr,
        line: usize,
    },
    IndexAssignment {
        target: String,
        index: Expr,
        value: Expr,
        line: usize,
    },
    Declaration {
        identifier: String,
        value: Option<Expr>,
        line: usize,
    },
    Print {
        args: Vec<Expr>,
        line: usize,
    },
    If {
        condition: Expr,
        then_block: Block,
        elif_parts: Vec<(Expr, Block)>,
        else_block: Option<Block>,
        line: usize,
    },
    While {
        condition: Expr,
        body: Block,
        line: usize,
    },
    For {
        variable: String,
        iterable: Iterable,
        body: Block,
        line: usize,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Block,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    MethodCall {
        target: String,
        method: Method,
        argument: Expr,
        line: usize,
    },
    Expr {
        expr: Expr,
        line: usize,
    },
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum Iterable {
    Range { start: Option<Expr>, stop: Expr },
    Expr(Expr),
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub enum Method {
    Append,
    Remove,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: Number,
        line: usize,
    },
    String {
        value: String,
        line: usize,
    },
    Identifier {
        name: String,
        line: usize,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },
    List {
        elements: Vec<Expr>,
        line: usize,
    },
    Dict {
        items: Vec<(Expr, Expr)>,
        line: usize,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },
    Call {
        function: String,
        args: Vec<Expr>,
        line: usize,
    },
    Input {
        prompt: Option<Box<Expr>>,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Assignment { line, .. }
            | Stmt::IndexAssignment { line, .. }
            | Stmt::Declaration { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Function { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::MethodCall { line, .. }
            | Stmt::Expr { line, .. } => *line,
        }
    }
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Number { line, .. }
            | Expr::String { line, .. }
            | Expr::Identifier { line, .. }
            | Expr::BinaryOp { line, .. }
            | Expr::UnaryOp { line, .. }
            | Expr::List { line, .. }
            | Expr::Dict { line, .. }
            | Expr::Index { line, .. }
            | Expr::Call { line, .. }
            | Expr::Input { line, .. } => *line,
        }
    }
}
