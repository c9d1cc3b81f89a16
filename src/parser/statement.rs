//! Statement-level parser for the scripting language.
//!
//! Breakpoint conditions are checked by parsing them as a statement list,
//! so this covers expressions, assignments and the block statements a
//! user might mistakenly type as a condition.

use super::lexer::{Keyword, Lexer, Token, TokenKind};
use super::types::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
    PreIncrement,
    PreDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
    Transpose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    OrOr,
    AndAnd,
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Range,
    Add,
    Sub,
    Mul,
    Div,
    LeftDiv,
    ElemMul,
    ElemDiv,
    Pow,
    ElemPow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Ident(String),
    /// A bare `:` inside an index.
    Colon,
    /// `end` inside an index.
    End,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
        brace: bool,
    },
    Field {
        target: Box<Expr>,
        name: String,
    },
    Matrix(Vec<Vec<Expr>>),
    Cell(Vec<Vec<Expr>>),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `x += 1` and friends.
    OpAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    /// Plain `=` assignment. Compound operators like `+=` do not count.
    pub fn is_assignment(&self) -> bool {
        matches!(self, Expr::Assign { .. })
    }

    fn is_assignable(&self) -> bool {
        match self {
            Expr::Ident(_) | Expr::Index { .. } | Expr::Field { .. } => true,
            Expr::Matrix(rows) => {
                rows.len() == 1 && !rows[0].is_empty() && rows[0].iter().all(Expr::is_assignable)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Break,
    Continue,
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expr),
    Control(ControlKind),
    If {
        clauses: Vec<(Expr, Vec<Statement>)>,
        otherwise: Vec<Statement>,
    },
    While {
        condition: Expr,
        body: Vec<Statement>,
    },
    For {
        binding: Expr,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn expression(&self) -> Option<&Expr> {
        match self {
            Statement::Expression(expr) => Some(expr),
            _ => None,
        }
    }
}

/// The parse service used to check breakpoint conditions.
pub trait StatementParser {
    fn parse_statement_list(&self, source: &str) -> Result<Vec<Statement>, ParseError>;
}

/// Parser for the interpreter's own statement syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptParser;

impl StatementParser for ScriptParser {
    fn parse_statement_list(&self, source: &str) -> Result<Vec<Statement>, ParseError> {
        parse_statement_list(source)
    }
}

pub fn parse_statement_list(source: &str) -> Result<Vec<Statement>, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        index_depth: 0,
        nesting: 0,
    };
    let statements = parser.statement_list(&[])?;
    parser.expect_eof()?;
    Ok(statements)
}

/// Deepest nesting of groups, unary operators or blocks the parser accepts.
const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    index_depth: usize,
    nesting: usize,
}

impl Parser {
    fn current(&self) -> &TokenKind {
        // the token list always ends in Eof
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)].kind
    }

    fn column(&self) -> usize {
        let last = self.tokens.len() - 1;
        self.tokens[self.pos.min(last)].column
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.current() == kind
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.column())
    }

    /// Run `f` one nesting level deeper, failing once the limit is hit.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        self.nesting += 1;
        let out = f(self);
        self.nesting -= 1;
        out
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.at(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {:?}", self.current())))
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        match self.current() {
            TokenKind::Eof => Ok(()),
            other => Err(self.error(format!("unexpected {other:?}"))),
        }
    }

    fn at_separator(&self) -> bool {
        matches!(
            self.current(),
            TokenKind::Semicolon | TokenKind::Comma | TokenKind::Newline
        )
    }

    fn at_terminator(&self, terminators: &[Keyword]) -> bool {
        match self.current() {
            TokenKind::Eof => true,
            TokenKind::Keyword(kw) => terminators.contains(kw),
            _ => false,
        }
    }

    fn statement_list(&mut self, terminators: &[Keyword]) -> Result<Vec<Statement>, ParseError> {
        self.nested(|p| p.statements_until(terminators))
    }

    fn statements_until(&mut self, terminators: &[Keyword]) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.at_separator() {
                self.advance();
            }
            if self.at_terminator(terminators) {
                return Ok(statements);
            }
            statements.push(self.statement()?);
            if !self.at_separator() && !self.at_terminator(terminators) {
                return Err(self.error(format!("unexpected {:?}", self.current())));
            }
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.current().clone() {
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                Ok(Statement::Control(ControlKind::Break))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                Ok(Statement::Control(ControlKind::Continue))
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                Ok(Statement::Control(ControlKind::Return))
            }
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                let condition = self.expr()?;
                let body = self.statement_list(&[Keyword::End])?;
                self.expect(TokenKind::Keyword(Keyword::End), "'end'")?;
                Ok(Statement::While { condition, body })
            }
            TokenKind::Keyword(Keyword::For) => {
                self.advance();
                let binding = self.expr()?;
                let body = self.statement_list(&[Keyword::End])?;
                self.expect(TokenKind::Keyword(Keyword::End), "'end'")?;
                Ok(Statement::For { binding, body })
            }
            TokenKind::Keyword(Keyword::Function) => {
                Err(self.error("function definition not allowed here"))
            }
            TokenKind::Keyword(kw) => Err(self.error(format!("unexpected keyword {kw:?}"))),
            _ => Ok(Statement::Expression(self.expr()?)),
        }
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let mut clauses = Vec::new();
        let mut otherwise = Vec::new();
        let stops = [Keyword::Elseif, Keyword::Else, Keyword::End];

        let condition = self.expr()?;
        let body = self.statement_list(&stops)?;
        clauses.push((condition, body));

        loop {
            match self.advance() {
                TokenKind::Keyword(Keyword::Elseif) => {
                    let condition = self.expr()?;
                    let body = self.statement_list(&stops)?;
                    clauses.push((condition, body));
                }
                TokenKind::Keyword(Keyword::Else) => {
                    otherwise = self.statement_list(&[Keyword::End])?;
                    self.expect(TokenKind::Keyword(Keyword::End), "'end'")?;
                    break;
                }
                TokenKind::Keyword(Keyword::End) => break,
                _ => return Err(self.error("'if' without matching 'end'")),
            }
        }

        Ok(Statement::If { clauses, otherwise })
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.binary(0)?;

        let compound = match self.current() {
            TokenKind::Equal => None,
            TokenKind::PlusEqual => Some(BinaryOp::Add),
            TokenKind::MinusEqual => Some(BinaryOp::Sub),
            TokenKind::StarEqual => Some(BinaryOp::Mul),
            TokenKind::SlashEqual => Some(BinaryOp::Div),
            _ => return Ok(lhs),
        };
        if !lhs.is_assignable() {
            return Err(self.error("invalid assignment target"));
        }
        self.advance();
        let value = Box::new(self.nested(Self::expr)?);
        let target = Box::new(lhs);

        Ok(match compound {
            None => Expr::Assign { target, value },
            Some(op) => Expr::OpAssign { op, target, value },
        })
    }

    /// Binary operators from loosest (level 0) to tightest.
    fn binary_op(kind: &TokenKind, level: usize) -> Option<BinaryOp> {
        let op = match (level, kind) {
            (0, TokenKind::PipePipe) => BinaryOp::OrOr,
            (1, TokenKind::AmpAmp) => BinaryOp::AndAnd,
            (2, TokenKind::Pipe) => BinaryOp::Or,
            (3, TokenKind::Amp) => BinaryOp::And,
            (4, TokenKind::EqualEqual) => BinaryOp::Equal,
            (4, TokenKind::NotEqual) => BinaryOp::NotEqual,
            (4, TokenKind::Less) => BinaryOp::Less,
            (4, TokenKind::LessEqual) => BinaryOp::LessEqual,
            (4, TokenKind::Greater) => BinaryOp::Greater,
            (4, TokenKind::GreaterEqual) => BinaryOp::GreaterEqual,
            (5, TokenKind::Colon) => BinaryOp::Range,
            (6, TokenKind::Plus) => BinaryOp::Add,
            (6, TokenKind::Minus) => BinaryOp::Sub,
            (7, TokenKind::Star) => BinaryOp::Mul,
            (7, TokenKind::Slash) => BinaryOp::Div,
            (7, TokenKind::Backslash) => BinaryOp::LeftDiv,
            (7, TokenKind::DotStar) => BinaryOp::ElemMul,
            (7, TokenKind::DotSlash) => BinaryOp::ElemDiv,
            _ => return None,
        };
        Some(op)
    }

    /// Every group, index list and assignment value starts at level 0,
    /// so that is where nesting is counted.
    fn binary(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level == 0 {
            return self.nested(|p| p.binary_level(0));
        }
        self.binary_level(level)
    }

    fn binary_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level > 7 {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = Self::binary_op(self.current(), level) {
            self.advance();
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
        match kind {
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
            _ => None,
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(op) = Self::unary_op(self.current()) {
            self.advance();
            let operand = Box::new(self.nested(Self::unary)?);
            return Ok(Expr::Unary { op, operand });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let mut base = self.postfix()?;
        loop {
            let op = match self.current() {
                TokenKind::Caret => BinaryOp::Pow,
                TokenKind::DotCaret => BinaryOp::ElemPow,
                _ => return Ok(base),
            };
            self.advance();
            // a sign is allowed directly after the operator, as in 2^-1
            let exponent = match Self::unary_op(self.current()) {
                Some(uop) => {
                    self.advance();
                    Expr::Unary {
                        op: uop,
                        operand: Box::new(self.postfix()?),
                    }
                }
                None => self.postfix()?,
            };
            base = Expr::Binary {
                op,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            };
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            expr = match self.current() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.index_args(TokenKind::RParen, "')'")?;
                    Expr::Index {
                        target: Box::new(expr),
                        args,
                        brace: false,
                    }
                }
                TokenKind::LBrace => {
                    self.advance();
                    let args = self.index_args(TokenKind::RBrace, "'}'")?;
                    Expr::Index {
                        target: Box::new(expr),
                        args,
                        brace: true,
                    }
                }
                TokenKind::Dot => {
                    self.advance();
                    match self.advance() {
                        TokenKind::Ident(name) => Expr::Field {
                            target: Box::new(expr),
                            name,
                        },
                        _ => return Err(self.error("expected field name after '.'")),
                    }
                }
                TokenKind::Transpose => {
                    self.advance();
                    Expr::Postfix {
                        op: PostfixOp::Transpose,
                        operand: Box::new(expr),
                    }
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    Expr::Postfix {
                        op: PostfixOp::Increment,
                        operand: Box::new(expr),
                    }
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    Expr::Postfix {
                        op: PostfixOp::Decrement,
                        operand: Box::new(expr),
                    }
                }
                _ => return Ok(expr),
            };
        }
    }

    fn index_args(&mut self, close: TokenKind, what: &str) -> Result<Vec<Expr>, ParseError> {
        self.index_depth += 1;
        let mut args = Vec::new();
        if !self.at(&close) {
            loop {
                let magic_colon = self.at(&TokenKind::Colon)
                    && matches!(
                        self.tokens.get(self.pos + 1).map(|t| &t.kind),
                        Some(k) if *k == close || *k == TokenKind::Comma
                    );
                if magic_colon {
                    self.advance();
                    args.push(Expr::Colon);
                } else {
                    args.push(self.binary(0)?);
                }
                if self.at(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.index_depth -= 1;
        self.expect(close, what)?;
        Ok(args)
    }

    fn starts_operand(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Ident(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Not
        )
    }

    /// Rows of a `[...]` or `{...}` literal. Elements may be separated by
    /// commas or just whitespace.
    fn rows(&mut self, close: TokenKind, what: &str) -> Result<Vec<Vec<Expr>>, ParseError> {
        self.index_depth += 1;
        let mut rows = Vec::new();
        let mut row = Vec::new();
        loop {
            match self.current() {
                k if *k == close => break,
                TokenKind::Semicolon | TokenKind::Newline => {
                    self.advance();
                    rows.push(std::mem::take(&mut row));
                }
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Eof => break,
                _ => {
                    row.push(self.binary(0)?);
                    let next = self.current();
                    let separated = *next == close
                        || matches!(
                            next,
                            TokenKind::Comma | TokenKind::Semicolon | TokenKind::Newline
                        )
                        || Self::starts_operand(next);
                    if !separated {
                        return Err(self.error(format!("unexpected {next:?} in matrix")));
                    }
                }
            }
        }
        if !row.is_empty() || !rows.is_empty() {
            rows.push(row);
        }
        self.index_depth -= 1;
        self.expect(close, what)?;
        Ok(rows)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.current().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            TokenKind::Keyword(Keyword::End) if self.index_depth > 0 => {
                self.advance();
                Ok(Expr::End)
            }
            TokenKind::LParen => {
                self.advance();
                // parentheses reset the `end` context
                let depth = std::mem::take(&mut self.index_depth);
                let inner = self.binary(0);
                self.index_depth = depth;
                let inner = inner?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(Expr::Matrix(self.rows(TokenKind::RBracket, "']'")?))
            }
            TokenKind::LBrace => {
                self.advance();
                Ok(Expr::Cell(self.rows(TokenKind::RBrace, "'}'")?))
            }
            other => Err(self.error(format!("expected an expression, found {other:?}"))),
        }
    }
}
