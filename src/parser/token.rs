use crate::op::{BinaryOp, Number};
use std::fmt;

#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    Number(Number),
    String(String),
    Ident(String),
    KeyWord(KeyWord),
    Ctrl(Ctrl),

    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum KeyWord {
    Print,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Range,
    Var,
    Def,
    Return,
    Input,
    Not,
}

impl KeyWord {
    pub fn from_word(word: &str) -> Option<KeyWord> {
        Some(match word {
            "print" => KeyWord::Print,
            "if" => KeyWord::If,
            "elif" => KeyWord::Elif,
            "else" => KeyWord::Else,
            "while" => KeyWord::While,
            "for" => KeyWord::For,
            "in" => KeyWord::In,
            "range" => KeyWord::Range,
            "var" => KeyWord::Var,
            "def" => KeyWord::Def,
            "return" => KeyWord::Return,
            "input" => KeyWord::Input,
            "not" => KeyWord::Not,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyWord::Print => "print",
            KeyWord::If => "if",
            KeyWord::Elif => "elif",
            KeyWord::Else => "else",
            KeyWord::While => "while",
            KeyWord::For => "for",
            KeyWord::In => "in",
            KeyWord::Range => "range",
            KeyWord::Var => "var",
            KeyWord::Def => "def",
            KeyWord::Return => "return",
            KeyWord::Input => "input",
            KeyWord::Not => "not",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Ctrl {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    DoubleEqual,
    NotEqual,
    Lt,
    Gt,
    Lte,
    Gte,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    Colon,
    Comma,
    Period,
}

impl Ctrl {
    pub fn as_comparison(&self) -> Option<BinaryOp> {
        match self {
            Ctrl::DoubleEqual => Some(BinaryOp::Equal),
            Ctrl::NotEqual => Some(BinaryOp::NotEqual),
            Ctrl::Lt => Some(BinaryOp::Lt),
            Ctrl::Gt => Some(BinaryOp::Gt),
            Ctrl::Lte => Some(BinaryOp::Lte),
            Ctrl::Gte => Some(BinaryOp::Gte),
            _ => None,
        }
    }

    pub fn as_additive(&self) -> Option<BinaryOp> {
        match self {
            Ctrl::Plus => Some(BinaryOp::Plus),
            Ctrl::Minus => Some(BinaryOp::Minus),
            _ => None,
        }
    }

    pub fn as_multiplicative(&self) -> Option<BinaryOp> {
        match self {
            Ctrl::Multiply => Some(BinaryOp::Multiply),
            Ctrl::Divide => Some(BinaryOp::Divide),
            Ctrl::Modulo => Some(BinaryOp::Modulo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ctrl::Plus => "+",
            Ctrl::Minus => "-",
            Ctrl::Multiply => "*",
            Ctrl::Divide => "/",
            Ctrl::Modulo => "%",
            Ctrl::Equal => "=",
            Ctrl::DoubleEqual => "==",
            Ctrl::NotEqual => "!=",
            Ctrl::Lt => "<",
            Ctrl::Gt => ">",
            Ctrl::Lte => "<=",
            Ctrl::Gte => ">=",
            Ctrl::LeftParen => "(",
            Ctrl::RightParen => ")",
            Ctrl::LeftBracket => "[",
            Ctrl::RightBracket => "]",
            Ctrl::LeftCurly => "{",
            Ctrl::RightCurly => "}",
            Ctrl::Colon => ":",
            Ctrl::Comma => ",",
            Ctrl::Period => ".",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number `{n}`"),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Ident(name) => write!(f, "identifier `{name}`"),
            TokenKind::KeyWord(kw) => write!(f, "keyword `{}`", kw.as_str()),
            TokenKind::Ctrl(ctrl) => write!(f, "`{}`", ctrl.as_str()),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Dedent => f.write_str("dedent"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.kind)
    }
}
