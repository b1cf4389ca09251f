use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::{CompileError, CompileErrorKind};
use super::lexer::{Spanned, Token};

/// Parse a token stream (as produced by [`super::lexer::lex`]) into an expression tree.
pub fn parse(tokens: &[Spanned]) -> Result<Expr, CompileError> {
    let mut parser = Parser::new(tokens);
    if parser.peek() == &Token::Eof {
        return Err(CompileError::new(CompileErrorKind::Empty, 0, ""));
    }
    let expr = parser.parse_expr()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn unexpected(&self) -> CompileError {
        let cur = self.cur();
        let kind = if cur.token == Token::Eof {
            CompileErrorKind::UnexpectedEnd
        } else {
            CompileErrorKind::UnexpectedToken
        };
        CompileError::new(kind, cur.offset, cur.text.clone())
    }

    fn expect(&mut self, token: Token) -> Result<(), CompileError> {
        if self.peek() == &token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn take_ident(&mut self) -> Result<(String, usize), CompileError> {
        if let Token::Ident(name) = self.peek().clone() {
            let offset = self.advance().offset;
            Ok((name, offset))
        } else {
            Err(self.unexpected())
        }
    }

    // -- Precedence levels, lowest first ---------------------------

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_and()?;
        while self.peek() == &Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == &Token::And {
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Token::Eq => BinaryOp::Eq,
            Token::Neq => BinaryOp::Neq,
            Token::Lt => BinaryOp::Lt,
            Token::Lte => BinaryOp::Lte,
            Token::Gt => BinaryOp::Gt,
            Token::Gte => BinaryOp::Gte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek() {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Token::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(e)
            }
            Token::Ident(_) => self.parse_reference(),
            _ => Err(self.unexpected()),
        }
    }

    /// `name`, `name(args)`, `Slot.Field` or `Slot.method(args)`.
    fn parse_reference(&mut self) -> Result<Expr, CompileError> {
        let (name, offset) = self.take_ident()?;

        if self.peek() == &Token::LParen {
            let args = self.parse_args()?;
            return Ok(Expr::Call { name, args, offset });
        }

        if self.peek() != &Token::Dot {
            return Ok(Expr::Ident { name, offset });
        }
        self.advance();
        let (member, _) = self.take_ident()?;
        if self.peek() == &Token::LParen {
            let args = self.parse_args()?;
            return Ok(Expr::Method {
                slot: name,
                name: member,
                args,
                offset,
            });
        }
        Ok(Expr::Field {
            slot: name,
            field: member,
            offset,
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == &Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
