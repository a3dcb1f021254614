//! Recursive-descent parser with precedence climbing.
//!
//! The grammar is layout-driven: blocks are `: NEWLINE INDENT ... DEDENT`.
//! A program is `miaou` statements `meow`; anything after `meow` is ignored.
//! Statement-initial identifiers need one extra decision (assignment target,
//! command-style call, or plain expression) which is resolved by a bounded
//! token scan rather than backtracking.

use crate::diag::MeowError;
use crate::token::{Token, TokenKind};

pub mod ast;

use ast::{BinaryOp, Expression, Literal, Program, Statement, UnaryOp};

pub type ParseResult<T> = Result<T, MeowError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, "", crate::token::Position::default()));
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        self.skip_newlines();

        if matches!(self.current().kind, TokenKind::Eof) {
            return Err(MeowError::new("E004"));
        }
        if !matches!(self.current().kind, TokenKind::Miaou) {
            return Err(MeowError::new("E001").at(self.current().pos));
        }
        self.advance();
        self.skip_newlines();

        let mut statements = Vec::new();
        while !matches!(self.current().kind, TokenKind::Meow | TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }

        if !matches!(self.current().kind, TokenKind::Meow) {
            return Err(MeowError::new("E002").at(self.current().pos));
        }

        Ok(Program { statements })
    }

    // ----- Statements -----

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current().kind {
            TokenKind::Si => self.parse_if(),
            TokenKind::TantQue => self.parse_while(),
            TokenKind::Repeter => self.parse_repeat(),
            TokenKind::PourChaque => self.parse_foreach(),
            TokenKind::Fonction => self.parse_function_def(),
            TokenKind::Retour => self.parse_return(),
            TokenKind::Essayer => self.parse_try(),
            TokenKind::Importer => self.parse_import(),
            TokenKind::Stop => {
                let pos = self.current().pos;
                self.advance();
                self.end_of_statement()?;
                Ok(Statement::Break { pos })
            }
            TokenKind::Suivant => {
                let pos = self.current().pos;
                self.advance();
                self.end_of_statement()?;
                Ok(Statement::Continue { pos })
            }
            TokenKind::Identifier(_) => self.parse_identifier_statement(),
            _ => {
                let expr = self.parse_expression()?;
                self.end_of_statement()?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    /// A statement starting with an identifier is one of three things:
    /// an assignment (`x = ...`, `xs[i] = ...`), a command-style call
    /// (`ecrire "bonjour"`), or a plain expression statement.
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;

        if self.scans_as_assignment() {
            let target = self.parse_postfix()?;
            self.expect_kind(&TokenKind::Assign, "'='")?;
            let value = self.parse_expression()?;
            self.end_of_statement()?;
            return match target {
                Expression::Identifier { name, .. } => Ok(Statement::Assign { name, value, pos }),
                Expression::Index { target, index, .. } => Ok(Statement::IndexAssign {
                    target: *target,
                    index: *index,
                    value,
                    pos,
                }),
                other => Err(self
                    .unexpected("une variable ou un accès par index")
                    .at(other.position())),
            };
        }

        if is_command_argument_start(&self.peek_kind(1)) {
            let callee = self.parse_primary()?;
            let mut args = vec![self.parse_expression()?];
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                if matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof) {
                    break;
                }
                args.push(self.parse_expression()?);
            }
            self.end_of_statement()?;
            return Ok(Statement::Expr(Expression::Call {
                callee: Box::new(callee),
                args,
                pos,
            }));
        }

        let expr = self.parse_expression()?;
        self.end_of_statement()?;
        Ok(Statement::Expr(expr))
    }

    /// Looks ahead from a statement-initial identifier for a postfix chain
    /// (`[...]`, `.name`, `(...)`) that ends in `=` before the end of line.
    fn scans_as_assignment(&self) -> bool {
        let mut i = self.pos + 1;
        loop {
            match self.kind_at(i) {
                TokenKind::Assign => return true,
                TokenKind::Dot => {
                    if matches!(self.kind_at(i + 1), TokenKind::Identifier(_)) {
                        i += 2;
                    } else {
                        return false;
                    }
                }
                TokenKind::LBracket | TokenKind::LParen => {
                    let mut depth = 1usize;
                    i += 1;
                    while depth > 0 {
                        match self.kind_at(i) {
                            TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => {
                                depth += 1
                            }
                            TokenKind::RBracket | TokenKind::RParen | TokenKind::RBrace => {
                                depth -= 1
                            }
                            TokenKind::Eof => return false,
                            _ => {}
                        }
                        i += 1;
                    }
                }
                _ => return false,
            }
        }
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let condition = self.parse_expression()?;
        if matches!(self.current().kind, TokenKind::Alors) {
            self.advance();
        }
        let then_body = self.parse_block()?;

        let mut elif_branches = Vec::new();
        while matches!(self.current().kind, TokenKind::SinonSi) {
            self.advance();
            let elif_condition = self.parse_expression()?;
            if matches!(self.current().kind, TokenKind::Alors) {
                self.advance();
            }
            elif_branches.push((elif_condition, self.parse_block()?));
        }

        let else_body = if matches!(self.current().kind, TokenKind::Sinon) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_body,
            elif_branches,
            else_body,
            pos,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Statement::While {
            condition,
            body,
            pos,
        })
    }

    fn parse_repeat(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let count = self.parse_expression()?;
        self.expect_keyword(&TokenKind::Fois, "'fois'")?;
        let body = self.parse_block()?;
        Ok(Statement::Repeat { count, body, pos })
    }

    fn parse_foreach(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let binding = self.expect_identifier()?;
        self.expect_keyword(&TokenKind::Dans, "'dans'")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Statement::ForEach {
            binding,
            iterable,
            body,
            pos,
        })
    }

    fn parse_function_def(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let name = self.expect_identifier()?;
        self.expect_kind(&TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        if !matches!(self.current().kind, TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                if matches!(self.current().kind, TokenKind::RParen) {
                    break;
                }
                params.push(self.expect_identifier()?);
            }
        }
        self.expect_closing(&TokenKind::RParen, "')'")?;

        let body = self.parse_block()?;
        Ok(Statement::FunctionDef {
            name,
            params,
            body,
            pos,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        if matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof) {
            self.end_of_statement()?;
            return Ok(Statement::Return { value: None, pos });
        }
        let value = self.parse_expression()?;
        self.end_of_statement()?;
        Ok(Statement::Return {
            value: Some(value),
            pos,
        })
    }

    fn parse_try(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let body = self.parse_block()?;

        self.expect_keyword(&TokenKind::Sauf, "'sauf'")?;
        let mut binding = None;
        if matches!(self.current().kind, TokenKind::Erreur) {
            self.advance();
            if let TokenKind::Identifier(name) = &self.current().kind {
                binding = Some(name.clone());
                self.advance();
            }
        }
        let handler = self.parse_block()?;

        Ok(Statement::TryExcept {
            body,
            binding,
            handler,
            pos,
        })
    }

    fn parse_import(&mut self) -> ParseResult<Statement> {
        let pos = self.current().pos;
        self.advance();
        let module = self.expect_identifier()?;
        self.end_of_statement()?;
        Ok(Statement::Import { module, pos })
    }

    /// `: NEWLINE INDENT statement+ DEDENT`. An empty block is a syntax
    /// error (there is no `pass` equivalent).
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect_keyword(&TokenKind::Colon, "':'")?;
        self.expect_kind(&TokenKind::Newline, "fin de ligne")?;
        self.expect_kind(&TokenKind::Indent, "un bloc indenté")?;

        let mut statements = Vec::new();
        while !matches!(self.current().kind, TokenKind::Dedent | TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.expect_kind(&TokenKind::Dedent, "fin de bloc")?;
        Ok(statements)
    }

    // ----- Expressions, lowest to highest precedence -----

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_and()?;
        while matches!(self.current().kind, TokenKind::Ou) {
            let pos = self.current().pos;
            self.advance();
            let right = self.parse_and()?;
            expr = Expression::Binary {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_not()?;
        while matches!(self.current().kind, TokenKind::Et) {
            let pos = self.current().pos;
            self.advance();
            let right = self.parse_not()?;
            expr = Expression::Binary {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> ParseResult<Expression> {
        if matches!(self.current().kind, TokenKind::Non) {
            let pos = self.current().pos;
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                pos,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            // A bare `=` in expression position reads as equality.
            let op = match self.current().kind {
                TokenKind::Equal | TokenKind::Assign => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            let pos = self.current().pos;
            self.advance();
            let right = self.parse_additive()?;
            expr = Expression::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.current().pos;
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Expression::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_power()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let pos = self.current().pos;
            self.advance();
            let right = self.parse_power()?;
            expr = Expression::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn parse_power(&mut self) -> ParseResult<Expression> {
        let base = self.parse_unary()?;
        if matches!(self.current().kind, TokenKind::StarStar) {
            let pos = self.current().pos;
            self.advance();
            // Right-associative.
            let exponent = self.parse_power()?;
            return Ok(Expression::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
                pos,
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if matches!(self.current().kind, TokenKind::Minus) {
            let pos = self.current().pos;
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                pos,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        // A bare identifier may be applied to one following expression
        // without parentheses (`demander nombre "ton age ?"`). Only the
        // first postfix step, and never after `[`/`(`/`.`.
        let mut bare_callable = matches!(expr, Expression::Identifier { .. });
        loop {
            if bare_callable && is_command_argument_start(&self.current().kind) {
                let pos = expr.position();
                let arg = self.parse_additive()?;
                expr = Expression::Call {
                    callee: Box::new(expr),
                    args: vec![arg],
                    pos,
                };
                bare_callable = false;
                continue;
            }
            bare_callable = false;
            match self.current().kind {
                TokenKind::LParen => {
                    let pos = expr.position();
                    self.advance();
                    let args = self.parse_comma_separated(&TokenKind::RParen, "')'")?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                        pos,
                    };
                }
                TokenKind::LBracket => {
                    let pos = self.current().pos;
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_closing(&TokenKind::RBracket, "']'")?;
                    expr = Expression::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                        pos,
                    };
                }
                TokenKind::Dot => {
                    let pos = self.current().pos;
                    self.advance();
                    let name = self.expect_identifier()?;
                    expr = Expression::Attribute {
                        target: Box::new(expr),
                        name,
                        pos,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let pos = self.current().pos;
        let expr = match &self.current().kind {
            TokenKind::Integer(value) => {
                let value = *value;
                self.advance();
                Expression::Literal {
                    value: Literal::Integer(value),
                    pos,
                }
            }
            TokenKind::Float(value) => {
                let value = *value;
                self.advance();
                Expression::Literal {
                    value: Literal::Float(value),
                    pos,
                }
            }
            TokenKind::Str(value) => {
                let value = value.clone();
                self.advance();
                Expression::Literal {
                    value: Literal::Text(value),
                    pos,
                }
            }
            TokenKind::Boolean(value) => {
                let value = *value;
                self.advance();
                Expression::Literal {
                    value: Literal::Boolean(value),
                    pos,
                }
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Expression::Identifier { name, pos }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_closing(&TokenKind::RParen, "')'")?;
                inner
            }
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_comma_separated(&TokenKind::RBracket, "']'")?;
                Expression::List { elements, pos }
            }
            TokenKind::LBrace => {
                self.advance();
                let pairs = self.parse_dict_pairs()?;
                Expression::Dict { pairs, pos }
            }
            _ => return Err(self.unexpected("une expression")),
        };
        Ok(expr)
    }

    /// Comma-separated expressions up to `close`; trailing comma permitted.
    fn parse_comma_separated(
        &mut self,
        close: &TokenKind,
        close_name: &str,
    ) -> ParseResult<Vec<Expression>> {
        let mut items = Vec::new();
        if &self.current().kind != close {
            items.push(self.parse_expression()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                if &self.current().kind == close {
                    break;
                }
                items.push(self.parse_expression()?);
            }
        }
        self.expect_closing(close, close_name)?;
        Ok(items)
    }

    fn parse_dict_pairs(&mut self) -> ParseResult<Vec<(Expression, Expression)>> {
        let mut pairs = Vec::new();
        if !matches!(self.current().kind, TokenKind::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.expect_keyword(&TokenKind::Colon, "':'")?;
                let value = self.parse_expression()?;
                pairs.push((key, value));
                if !matches!(self.current().kind, TokenKind::Comma) {
                    break;
                }
                self.advance();
                if matches!(self.current().kind, TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect_closing(&TokenKind::RBrace, "'}'")?;
        Ok(pairs)
    }

    // ----- Cursor helpers -----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.kind_at(self.pos + offset).clone()
    }

    fn kind_at(&self, index: usize) -> &TokenKind {
        self.tokens
            .get(index)
            .map(|token| &token.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn end_of_statement(&mut self) -> ParseResult<()> {
        match self.current().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("fin de ligne")),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("un identifiant"))
        }
    }

    /// Unexpected token at the current position (`E100`).
    fn unexpected(&self, expected: &str) -> MeowError {
        let token = self.current();
        MeowError::new("E100")
            .at(token.pos)
            .with_instruction(token.lexeme.clone())
            .with_detail("got", token.kind.describe())
            .with_detail("expected", expected)
    }

    /// Generic expectation (`E100`).
    fn expect_kind(&mut self, kind: &TokenKind, name: &str) -> ParseResult<()> {
        if &self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(name))
        }
    }

    /// Required keyword or colon (`E104`).
    fn expect_keyword(&mut self, kind: &TokenKind, name: &str) -> ParseResult<()> {
        if &self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            let token = self.current();
            Err(MeowError::new("E104")
                .at(token.pos)
                .with_instruction(token.lexeme.clone())
                .with_detail("expected", name))
        }
    }

    /// Required closing delimiter (`E105`).
    fn expect_closing(&mut self, kind: &TokenKind, name: &str) -> ParseResult<()> {
        if &self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            let token = self.current();
            Err(MeowError::new("E105")
                .at(token.pos)
                .with_instruction(token.lexeme.clone())
                .with_detail("expected", name))
        }
    }
}

pub fn parse_tokens(tokens: Vec<Token>) -> ParseResult<Program> {
    Parser::new(tokens).parse_program()
}

/// Parses normalized source straight to a program.
pub fn parse_source(source: &str) -> ParseResult<Program> {
    parse_tokens(crate::lexer::tokenize(source)?)
}

/// Tokens that may start an argument of a command-style call. `(` stays a
/// postfix call and `[` stays indexing, so neither can open the first
/// argument; `-` keeps its binary reading.
fn is_command_argument_start(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Str(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::Boolean(_)
            | TokenKind::Identifier(_)
            | TokenKind::Non
            | TokenKind::LBrace
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(source: &str) -> Program {
        parse_source(source).expect("parse should succeed")
    }

    fn parse_err(source: &str) -> MeowError {
        parse_source(source).expect_err("parse should fail")
    }

    fn body(source: &str) -> Vec<Statement> {
        parse(source).statements
    }

    #[test]
    fn requires_miaou_and_meow_markers() {
        assert_eq!(parse_err("ecrire 1\nmeow\n").code(), "E001");
        assert_eq!(parse_err("miaou\necrire 1\n").code(), "E002");
        assert_eq!(parse_err("   \n\n").code(), "E004");
    }

    #[test]
    fn empty_body_parses_to_no_statements() {
        assert!(body("miaou\nmeow\n").is_empty());
    }

    #[test]
    fn text_after_meow_is_ignored() {
        let program = parse("miaou\nx = 1\nmeow\nn'importe quoi\n");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let statements = body("miaou\nx = 2 + 3 * 4\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, right, .. } = value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(
            matches!(**right, Expression::Binary { op: BinaryOp::Mul, .. }),
            "3 * 4 must nest under +"
        );
    }

    #[test]
    fn power_is_right_associative() {
        let statements = body("miaou\nx = 2 ** 3 ** 2\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, left, right, .. } = value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(
            **left,
            Expression::Literal { value: Literal::Integer(2), .. }
        ));
        assert!(matches!(**right, Expression::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn comparison_is_left_associative_and_accepts_bare_equals() {
        let statements = body("miaou\nx = 1 = 2 == 3\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, left, .. } = value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Equal);
        assert!(matches!(**left, Expression::Binary { op: BinaryOp::Equal, .. }));
    }

    #[test]
    fn command_style_call_collects_arguments_to_end_of_line() {
        let statements = body("miaou\necrire \"a\", 1 + 2, x\nmeow\n");
        let Statement::Expr(Expression::Call { callee, args, .. }) = &statements[0] else {
            panic!("expected call statement");
        };
        assert!(
            matches!(&**callee, Expression::Identifier { name, .. } if name == "ecrire")
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn composite_builtin_name_works_in_command_position() {
        let statements = body("miaou\nnom = demander texte \"ton nom ?\"\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Call { callee, .. } = value else {
            panic!("expected call");
        };
        assert!(matches!(
            &**callee,
            Expression::Identifier { name, .. } if name == "demander texte"
        ));
    }

    #[test]
    fn index_assignment_targets_parse() {
        let statements = body("miaou\nxs[0] = 5\nmeow\n");
        assert!(matches!(&statements[0], Statement::IndexAssign { .. }));

        let statements = body("miaou\nxs[0][1] = 5\nmeow\n");
        let Statement::IndexAssign { target, .. } = &statements[0] else {
            panic!("expected index assignment");
        };
        assert!(matches!(target, Expression::Index { .. }));
    }

    #[test]
    fn plain_index_expression_is_not_an_assignment() {
        let statements = body("miaou\necrire xs[0] == 5\nmeow\n");
        assert!(matches!(&statements[0], Statement::Expr(_)));
    }

    #[test]
    fn if_elif_else_chain() {
        let source = indoc! {r#"
            miaou
            si x > 0 alors:
                ecrire "positif"
            sinon si x = 0:
                ecrire "nul"
            sinon:
                ecrire "negatif"
            meow
        "#};
        let statements = body(source);
        let Statement::If {
            elif_branches,
            else_body,
            ..
        } = &statements[0]
        else {
            panic!("expected if statement");
        };
        assert_eq!(elif_branches.len(), 1);
        assert!(else_body.is_some());
    }

    #[test]
    fn missing_colon_is_a_keyword_error() {
        let err = parse_err("miaou\nsi x\n    ecrire x\nmeow\n");
        assert_eq!(err.code(), "E104");
    }

    #[test]
    fn empty_block_is_rejected() {
        let err = parse_err("miaou\nsi x:\nmeow\n");
        assert_eq!(err.code(), "E100");
    }

    #[test]
    fn missing_closing_delimiters_are_e105() {
        assert_eq!(parse_err("miaou\nx = (1 + 2\nmeow\n").code(), "E105");
        assert_eq!(parse_err("miaou\nx = [1, 2\nmeow\n").code(), "E105");
    }

    #[test]
    fn function_def_with_params_and_return() {
        let source = indoc! {r#"
            miaou
            fonction carre(n):
                retour n * n
            ecrire carre(7)
            meow
        "#};
        let statements = body(source);
        let Statement::FunctionDef { name, params, body, .. } = &statements[0] else {
            panic!("expected function definition");
        };
        assert_eq!(name, "carre");
        assert_eq!(params, &["n".to_string()]);
        assert!(matches!(body[0], Statement::Return { value: Some(_), .. }));
    }

    #[test]
    fn try_except_binds_error_name() {
        let source = indoc! {r#"
            miaou
            essayer:
                ecrire 1 / 0
            sauf erreur e:
                ecrire e
            meow
        "#};
        let statements = body(source);
        let Statement::TryExcept { binding, .. } = &statements[0] else {
            panic!("expected try/except");
        };
        assert_eq!(binding.as_deref(), Some("e"));
    }

    #[test]
    fn repeat_requires_fois() {
        let err = parse_err("miaou\nrepeter 3:\n    ecrire compteur\nmeow\n");
        assert_eq!(err.code(), "E104");
    }

    #[test]
    fn foreach_and_import_statements() {
        let source = indoc! {r#"
            miaou
            importer util
            pour chaque c dans xs:
                ecrire c
            meow
        "#};
        let statements = body(source);
        assert!(matches!(&statements[0], Statement::Import { module, .. } if module == "util"));
        assert!(
            matches!(&statements[1], Statement::ForEach { binding, .. } if binding == "c")
        );
    }

    #[test]
    fn dict_literals_with_trailing_comma() {
        let statements = body("miaou\nd = {\"a\": 1, \"b\": 2,}\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Dict { pairs, .. } = value else {
            panic!("expected dict literal");
        };
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn attribute_access_chains_after_import() {
        let statements = body("miaou\necrire util.doubler(21)\nmeow\n");
        let Statement::Expr(Expression::Call { args, .. }) = &statements[0] else {
            panic!("expected command call");
        };
        let Expression::Call { callee, .. } = &args[0] else {
            panic!("expected inner call");
        };
        assert!(matches!(&**callee, Expression::Attribute { name, .. } if name == "doubler"));
    }

    #[test]
    fn unary_minus_binds_tighter_than_power() {
        let statements = body("miaou\nx = -2 ** 2\nmeow\n");
        let Statement::Assign { value, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, left, .. } = value else {
            panic!("expected power expression");
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(**left, Expression::Unary { op: UnaryOp::Neg, .. }));
    }
}
