use super::ast::{Block, Expr, Iterable, Method, Program, Stmt};
use super::error::SyntaxError;
use super::token::{Ctrl, KeyWord, Token, TokenKind};
use crate::op::UnaryOp;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (line, column) = tokens.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, line, column));
        }

        Self { tokens, pos: 0 }
    }

    pub fn build_ast(&mut self) -> Result<Program, SyntaxError> {
        let mut statements = vec![];

        loop {
            self.skip_newlines();

            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Indent => {
                    return Err(SyntaxError::new("unexpected indent", self.peek()));
                }
                _ => statements.push(self.parse_stmt()?),
            }
        }

        Ok(Program { statements })
    }

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        self.expect(Ctrl::Colon)?;
        self.expect_kind(TokenKind::Newline, "newline after `:`")?;
        self.skip_newlines();

        if self.peek().kind != TokenKind::Indent {
            return Err(SyntaxError::new("expected indented block", self.peek()));
        }
        self.advance();

        let mut statements = vec![];
        loop {
            self.skip_newlines();

            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => statements.push(self.parse_stmt()?),
            }
        }

        Ok(Block { statements })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.peek().line;

        let stmt = match self.peek().kind {
            TokenKind::KeyWord(KeyWord::If) => return self.parse_if(),
            TokenKind::KeyWord(KeyWord::While) => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;

                return Ok(Stmt::While {
                    condition,
                    body,
                    line,
                });
            }
            TokenKind::KeyWord(KeyWord::For) => return self.parse_for(),
            TokenKind::KeyWord(KeyWord::Def) => return self.parse_def(),
            TokenKind::KeyWord(KeyWord::Print) => {
                self.advance();
                self.expect(Ctrl::LeftParen)?;
                let args = self.parse_args(Ctrl::RightParen)?;

                Stmt::Print { args, line }
            }
            TokenKind::KeyWord(KeyWord::Return) => {
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };

                Stmt::Return { value, line }
            }
            TokenKind::KeyWord(KeyWord::Var) => {
                self.advance();
                let identifier = self.expect_ident()?;
                let value = if self.eat(Ctrl::Equal) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };

                Stmt::Declaration {
                    identifier,
                    value,
                    line,
                }
            }
            TokenKind::Ident(_) => self.parse_ident_stmt()?,
            _ => return Err(SyntaxError::expected("statement", self.peek())),
        };

        self.end_stmt()?;

        Ok(stmt)
    }

    // assignment, index assignment, method call or call statement; all of
    // them start with an expression rooted at an identifier
    fn parse_ident_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.peek().line;
        let expr = self.parse_postfix()?;

        if self.eat(Ctrl::Equal) {
            let value = self.parse_expr()?;

            return match expr {
                Expr::Identifier { name, .. } => Ok(Stmt::Assignment {
                    identifier: name,
                    value,
                    line,
                }),
                Expr::Index { base, index, .. } => match *base {
                    Expr::Identifier { name, .. } => Ok(Stmt::IndexAssignment {
                        target: name,
                        index: *index,
                        value,
                        line,
                    }),
                    _ => Err(self.error_at_line("expected assignable target", line)),
                },
                _ => Err(self.error_at_line("expected assignable target", line)),
            };
        }

        if self.peek().kind == TokenKind::Ctrl(Ctrl::Period) {
            let Expr::Identifier { name: target, .. } = expr else {
                return Err(SyntaxError::expected("`=`", self.peek()));
            };
            self.advance();

            let method_token = self.advance();
            let method = match &method_token.kind {
                TokenKind::Ident(m) if m == "append" => Method::Append,
                TokenKind::Ident(m) if m == "remove" => Method::Remove,
                _ => return Err(SyntaxError::expected("`append` or `remove`", &method_token)),
            };

            self.expect(Ctrl::LeftParen)?;
            let argument = self.parse_expr()?;
            self.expect(Ctrl::RightParen)?;

            return Ok(Stmt::MethodCall {
                target,
                method,
                argument,
                line,
            });
        }

        match expr {
            Expr::Call { .. } => Ok(Stmt::Expr { expr, line }),
            _ => Err(SyntaxError::expected("`=`", self.peek())),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.advance().line;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let mut elif_parts = vec![];
        let mut else_block = None;

        loop {
            self.skip_newlines();

            match self.peek().kind {
                TokenKind::KeyWord(KeyWord::Elif) => {
                    self.advance();
                    let cond = self.parse_expr()?;
                    let block = self.parse_block()?;
                    elif_parts.push((cond, block));
                }
                TokenKind::KeyWord(KeyWord::Else) => {
                    self.advance();
                    else_block = Some(self.parse_block()?);
                    break;
                }
                _ => break,
            }
        }

        Ok(Stmt::If {
            condition,
            then_block,
            elif_parts,
            else_block,
            line,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.advance().line;
        let variable = self.expect_ident()?;
        self.expect_kind(TokenKind::KeyWord(KeyWord::In), "`in`")?;

        let iterable = if self.peek().kind == TokenKind::KeyWord(KeyWord::Range) {
            self.advance();
            self.expect(Ctrl::LeftParen)?;
            let first = self.parse_expr()?;
            let iterable = if self.eat(Ctrl::Comma) {
                let stop = self.parse_expr()?;
                Iterable::Range {
                    start: Some(first),
                    stop,
                }
            } else {
                Iterable::Range {
                    start: None,
                    stop: first,
                }
            };
            self.expect(Ctrl::RightParen)?;

            iterable
        } else {
            Iterable::Expr(self.parse_expr()?)
        };

        let body = self.parse_block()?;

        Ok(Stmt::For {
            variable,
            iterable,
            body,
            line,
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.advance().line;
        let name = self.expect_ident()?;
        self.expect(Ctrl::LeftParen)?;

        let mut params = vec![];
        if !self.eat(Ctrl::RightParen) {
            loop {
                params.push(self.expect_ident()?);

                if self.eat(Ctrl::Comma) {
                    continue;
                }

                self.expect(Ctrl::RightParen)?;
                break;
            }
        }

        let body = self.parse_block()?;

        Ok(Stmt::Function {
            name,
            params,
            body,
            line,
        })
    }

    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_comparison()
    }

    // at most one comparison operator, `a < b < c` leaves `< c` behind
    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_arithmetic()?;

        let op = match &self.peek().kind {
            TokenKind::Ctrl(ctrl) => ctrl.as_comparison(),
            _ => None,
        };

        let Some(op) = op else {
            return Ok(left);
        };

        let line = self.advance().line;
        let right = self.parse_arithmetic()?;

        Ok(Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            line,
        })
    }

    fn parse_arithmetic(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::Ctrl(ctrl) => ctrl.as_additive(),
                _ => None,
            };
            let Some(op) = op else {
                return Ok(left);
            };

            let line = self.advance().line;
            let right = self.parse_term()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                line,
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::Ctrl(ctrl) => ctrl.as_multiplicative(),
                _ => None,
            };
            let Some(op) = op else {
                return Ok(left);
            };

            let line = self.advance().line;
            let right = self.parse_factor()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                line,
            };
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek().kind {
            TokenKind::Ctrl(Ctrl::Minus) => UnaryOp::Negate,
            TokenKind::KeyWord(KeyWord::Not) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };

        let line = self.advance().line;
        let operand = self.parse_factor()?;

        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            line,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_atom()?;

        while self.peek().kind == TokenKind::Ctrl(Ctrl::LeftBracket) {
            let line = self.advance().line;
            let index = self.parse_expr()?;
            self.expect(Ctrl::RightBracket)?;

            expr = Expr::Index {
                base: Box::new(expr),
                index: Box::new(index),
                line,
            };
        }

        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.advance();
        let line = token.line;

        let atom = match token.kind {
            TokenKind::Number(value) => Expr::Number { value, line },
            TokenKind::String(value) => Expr::String { value, line },
            TokenKind::Ident(name) => {
                if self.eat(Ctrl::LeftParen) {
                    let args = self.parse_args(Ctrl::RightParen)?;

                    Expr::Call {
                        function: name,
                        args,
                        line,
                    }
                } else {
                    Expr::Identifier { name, line }
                }
            }
            TokenKind::KeyWord(KeyWord::Input) => {
                self.expect(Ctrl::LeftParen)?;
                let prompt = if self.eat(Ctrl::RightParen) {
                    None
                } else {
                    let prompt = self.parse_expr()?;
                    self.expect(Ctrl::RightParen)?;
                    Some(Box::new(prompt))
                };

                Expr::Input { prompt, line }
            }
            TokenKind::Ctrl(Ctrl::LeftParen) => {
                let expr = self.parse_expr()?;
                self.expect(Ctrl::RightParen)?;

                expr
            }
            TokenKind::Ctrl(Ctrl::LeftBracket) => {
                let elements = self.parse_args(Ctrl::RightBracket)?;

                Expr::List { elements, line }
            }
            TokenKind::Ctrl(Ctrl::LeftCurly) => {
                let mut items = vec![];
                if !self.eat(Ctrl::RightCurly) {
                    loop {
                        let key = self.parse_expr()?;
                        self.expect(Ctrl::Colon)?;
                        let value = self.parse_expr()?;
                        items.push((key, value));

                        if self.eat(Ctrl::Comma) {
                            continue;
                        }

                        self.expect(Ctrl::RightCurly)?;
                        break;
                    }
                }

                Expr::Dict { items, line }
            }
            _ => return Err(SyntaxError::expected("expression", &token)),
        };

        Ok(atom)
    }

    // comma separated expressions up to and including `close`
    fn parse_args(&mut self, close: Ctrl) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = vec![];
        if self.eat(close) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);

            if self.eat(Ctrl::Comma) {
                continue;
            }

            self.expect(close)?;
            return Ok(args);
        }
    }

    fn at_stmt_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        )
    }

    fn end_stmt(&mut self) -> Result<(), SyntaxError> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            _ => Err(SyntaxError::expected("newline", self.peek())),
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }

        token
    }

    fn eat(&mut self, ctrl: Ctrl) -> bool {
        if self.peek().kind == TokenKind::Ctrl(ctrl) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ctrl: Ctrl) -> Result<(), SyntaxError> {
        let what = format!("`{}`", ctrl.as_str());
        self.expect_kind(TokenKind::Ctrl(ctrl), &what)
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<(), SyntaxError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(SyntaxError::expected(what, self.peek()))
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            _ => Err(SyntaxError::expected("identifier", &token)),
        }
    }

    fn error_at_line(&self, message: &str, line: usize) -> SyntaxError {
        SyntaxError {
            message: message.to_string(),
            line,
            column: self.peek().column,
        }
    }
}
