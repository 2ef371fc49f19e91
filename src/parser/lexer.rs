use super::error::{LexError, LexErrorKind};
use super::token::{Ctrl, KeyWord, Token, TokenKind};
use crate::op::Number;
use core::iter::Peekable;
use core::str::Chars;

const TAB_WIDTH: usize = 4;

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            indent_stack: vec![0],
            at_line_start: true,
            tokens: vec![],
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start {
                self.at_line_start = false;
                if !self.lex_indentation()? {
                    continue;
                }
            }

            self.skip_spaces();
            self.skip_comment();

            let Some(&c) = self.chars.peek() else {
                break;
            };

            let (line, column) = (self.line, self.column);
            let kind = match c {
                '\n' => {
                    self.advance();
                    self.at_line_start = true;
                    TokenKind::Newline
                }
                '"' | '\'' => self.lex_string()?,
                c if c.is_ascii_digit() => self.lex_num()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(),
                _ => TokenKind::Ctrl(self.lex_ctrl()?),
            };

            self.tokens.push(Token::new(kind, line, column));
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent);
        }
        self.push(TokenKind::Eof);

        Ok(self.tokens)
    }

    /// Measures the leading whitespace of a logical line and emits the
    /// matching INDENT/DEDENT tokens. Returns false when the line was blank or
    /// held only a comment, in which case it has been consumed entirely.
    fn lex_indentation(&mut self) -> Result<bool, LexError> {
        let mut indent = 0;
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' => indent += 1,
                '\t' => indent += TAB_WIDTH,
                _ => break,
            }
            self.advance();
        }

        self.skip_comment();
        match self.chars.peek().copied() {
            None => return Ok(false),
            Some('\n') => {
                self.advance();
                self.at_line_start = true;
                return Ok(false);
            }
            Some('\r') if self.second() == Some('\n') => {
                self.advance();
                self.advance();
                self.at_line_start = true;
                return Ok(false);
            }
            _ => {}
        }

        let top = self.current_indent();
        if indent > top {
            self.indent_stack.push(indent);
            self.push(TokenKind::Indent);
        } else if indent < top {
            while indent < self.current_indent() {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent);
            }

            if indent != self.current_indent() {
                return Err(self.error(LexErrorKind::InconsistentIndentation));
            }
        }

        Ok(true)
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn skip_spaces(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.chars.peek() {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        let starts_comment = match self.chars.peek().copied() {
            Some('#') => true,
            Some('/') => self.second() == Some('/'),
            _ => false,
        };

        if starts_comment {
            while let Some(&c) = self.chars.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match KeyWord::from_word(&word) {
            Some(kw) => TokenKind::KeyWord(kw),
            None => TokenKind::Ident(word),
        }
    }

    fn lex_num(&mut self) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        let number = if is_float {
            text.parse().ok().map(Number::Float)
        } else {
            text.parse().ok().map(Number::Int)
        };

        number
            .map(TokenKind::Number)
            .ok_or_else(|| self.error(LexErrorKind::InvalidNumber(text)))
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        let (line, column) = (self.line, self.column);
        let unterminated = LexError {
            kind: LexErrorKind::UnterminatedString,
            line,
            column,
        };

        let Some(quote) = self.advance() else {
            return Err(unterminated);
        };

        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(unterminated),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    None | Some('\n') => return Err(unterminated),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn lex_ctrl(&mut self) -> Result<Ctrl, LexError> {
        let (line, column) = (self.line, self.column);
        let Some(c) = self.advance() else {
            return Err(self.error(LexErrorKind::UnexpectedCharacter('\0')));
        };

        let ctrl = match c {
            '=' if self.read('=') => Ctrl::DoubleEqual,
            '!' if self.read('=') => Ctrl::NotEqual,
            '<' if self.read('=') => Ctrl::Lte,
            '>' if self.read('=') => Ctrl::Gte,
            '=' => Ctrl::Equal,
            '<' => Ctrl::Lt,
            '>' => Ctrl::Gt,
            '+' => Ctrl::Plus,
            '-' => Ctrl::Minus,
            '*' => Ctrl::Multiply,
            '/' => Ctrl::Divide,
            '%' => Ctrl::Modulo,
            '(' => Ctrl::LeftParen,
            ')' => Ctrl::RightParen,
            '[' => Ctrl::LeftBracket,
            ']' => Ctrl::RightBracket,
            '{' => Ctrl::LeftCurly,
            '}' => Ctrl::RightCurly,
            ':' => Ctrl::Colon,
            ',' => Ctrl::Comma,
            '.' => Ctrl::Period,
            other => {
                return Err(LexError {
                    kind: LexErrorKind::UnexpectedCharacter(other),
                    line,
                    column,
                })
            }
        };

        Ok(ctrl)
    }

    fn read(&mut self, c: char) -> bool {
        if self.chars.peek() == Some(&c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn second(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.line, self.column));
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            line: self.line,
            column: self.column,
        }
    }
}
