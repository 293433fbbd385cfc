use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, Spanned, Token};
use super::ExprError;

/// Maximum height of the expression tree. Parentheses, unary operators and
/// each operator in a chain like `a + b + c` all add a level, so every
/// recursive walk over a parsed tree stays within this bound.
pub const MAX_DEPTH: usize = 256;

/// Parse an expression string into a tree.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr(1, 0)?;

    match parser.peek() {
        None => Ok(expr),
        Some(spanned) => Err(unexpected(spanned)),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn peek_binary(&self) -> Option<BinaryOp> {
        let op = match self.peek()?.token {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::Ne,
            Token::AndAnd => BinaryOp::And,
            Token::OrOr => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing: consume operators binding at least as tightly as `min_prec`.
    fn parse_expr(&mut self, min_prec: u8, depth: usize) -> Result<Expr, ExprError> {
        check_depth(depth)?;
        let mut lhs = self.parse_unary(depth)?;
        // Each folded operator puts the tree built so far one level deeper
        let mut height = depth;

        while let Some(op) = self.peek_binary() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            height += 1;
            check_depth(height)?;
            // All binary operators are left-associative
            let rhs = self.parse_expr(prec + 1, height)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        check_depth(depth)?;
        let op = match self.peek().map(|s| &s.token) {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Bang) => Some(UnaryOp::Not),
            // Unary plus is a no-op
            Some(Token::Plus) => {
                self.pos += 1;
                return self.parse_unary(depth + 1);
            }
            _ => None,
        };

        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.parse_unary(depth + 1)?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_primary(depth),
        }
    }

    fn parse_primary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let spanned = self.advance().ok_or(ExprError::UnexpectedEnd)?;
        match spanned.token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::LParen => {
                let inner = self.parse_expr(1, depth + 1)?;
                match self.advance() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(unexpected(&other)),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            _ => Err(unexpected(&spanned)),
        }
    }
}

fn check_depth(depth: usize) -> Result<(), ExprError> {
    if depth > MAX_DEPTH {
        Err(ExprError::TooDeep { limit: MAX_DEPTH })
    } else {
        Ok(())
    }
}

fn unexpected(spanned: &Spanned) -> ExprError {
    ExprError::UnexpectedToken {
        found: describe(&spanned.token),
        offset: spanned.offset,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => n.to_string(),
        Token::Ident(name) => name.clone(),
        Token::True => "true".to_string(),
        Token::False => "false".to_string(),
        Token::Plus => "+".to_string(),
        Token::Minus => "-".to_string(),
        Token::Star => "*".to_string(),
        Token::Slash => "/".to_string(),
        Token::Percent => "%".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Gt => ">".to_string(),
        Token::Ge => ">=".to_string(),
        Token::Lt => "<".to_string(),
        Token::Le => "<=".to_string(),
        Token::EqEq => "==".to_string(),
        Token::NotEq => "!=".to_string(),
        Token::AndAnd => "&&".to_string(),
        Token::OrOr => "||".to_string(),
        Token::Bang => "!".to_string(),
    }
}
