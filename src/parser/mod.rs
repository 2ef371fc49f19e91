pub mod ast;
mod error;
mod lexer;
mod parser;
mod token;

pub use error::{LexError, LexErrorKind, SyntaxError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Ctrl, KeyWord, Token, TokenKind};

use ast::Program;

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

pub fn parse(tokens: Vec<Token>) -> Result<Program, SyntaxError> {
    Parser::new(tokens).build_ast()
}
