//! # Parser
//!
//! Recursive-descent parser over the token stream produced by the lexer
//! (§4.3). Parsing is fatal on the first mismatch: there is no error
//! recovery, so a syntax error yields exactly one [`ParseError`] and no
//! tree (§7).
//!
//! Expression parsing is precedence climbing implemented as a chain of
//! mutually recursive functions, one per precedence level, from `||`
//! (loosest) down through `&&`, equality, relational, additive,
//! multiplicative, unary, to primary expressions (tightest).

pub mod ast;

#[cfg(test)]
mod tests;

use crate::error::ParseError;
use crate::lexer::token::{Token, TokenKind};
use ast::{
    ArrayLen, BinaryOp, Block, Expr, FuncCall, FuncDecl, Location, Param, Program, Stmt, Type,
    UnaryOp, VarDecl,
};

pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    log::debug!("parse: {} tokens", tokens.len());
    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.parse_program()?;
    log::debug!(
        "parse: {} global var decl(s), {} function(s)",
        program.var_decls.len(),
        program.func_decls.len()
    );
    Ok(program)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

enum CallOrLocation {
    Call(FuncCall),
    Location(Location),
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn line(&self) -> usize {
        self.current().line
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        ParseError::new(expected, self.current().describe(), self.line())
    }

    fn is_keyword(&self, word: &str) -> bool {
        self.current().is_keyword(word)
    }

    fn is_symbol(&self, sym: &str) -> bool {
        self.current().is_symbol(sym)
    }

    fn is_type_start(&self) -> bool {
        self.is_keyword("int") || self.is_keyword("bool") || self.is_keyword("void")
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<(), ParseError> {
        if self.is_symbol(sym) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("'{sym}'")))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("'{word}'")))
        }
    }

    fn expect_id(&mut self) -> Result<String, ParseError> {
        if self.current().kind == TokenKind::Id {
            Ok(self.advance().text)
        } else {
            Err(self.error("an identifier"))
        }
    }

    // ── Program ──────────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut var_decls = Vec::new();
        let mut func_decls = Vec::new();

        while self.current().kind != TokenKind::Eof {
            if self.is_keyword("def") {
                func_decls.push(self.parse_func_decl()?);
            } else if self.is_type_start() {
                var_decls.extend(self.parse_var_decl()?);
            } else {
                return Err(self.error("'def' or a type"));
            }
        }

        Ok(Program {
            var_decls,
            func_decls,
        })
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        if self.is_keyword("int") {
            self.advance();
            Ok(Type::Int)
        } else if self.is_keyword("bool") {
            self.advance();
            Ok(Type::Bool)
        } else if self.is_keyword("void") {
            self.advance();
            Ok(Type::Void)
        } else {
            Err(self.error("a type"))
        }
    }

    /// A declaration statement can name several declarators of the same
    /// base type: `int a, b[4], c;`. Each becomes its own [`VarDecl`].
    fn parse_var_decl(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let ty = self.parse_type()?;
        let mut decls = Vec::new();

        loop {
            let name_line = self.line();
            let name = self.expect_id()?;
            let array_len = if self.is_symbol("[") {
                self.advance();
                let len_line = self.line();
                let value = self.parse_int_literal()?;
                self.expect_symbol("]")?;
                Some(ArrayLen {
                    value,
                    line: len_line,
                })
            } else {
                None
            };
            decls.push(VarDecl {
                ty,
                name,
                array_len,
                line: name_line,
            });

            if self.is_symbol(",") {
                self.advance();
                continue;
            }
            break;
        }

        self.expect_symbol(";")?;
        Ok(decls)
    }

    fn parse_int_literal(&mut self) -> Result<i64, ParseError> {
        match &self.current().kind {
            TokenKind::DecimalLit(v) | TokenKind::HexLit(v) => {
                let v = *v;
                self.advance();
                Ok(v)
            }
            _ => Err(self.error("an integer literal")),
        }
    }

    // ── Functions ────────────────────────────────────────────────

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        let line = self.line();
        self.expect_keyword("def")?;
        let return_ty = self.parse_type()?;
        let name = self.expect_id()?;
        self.expect_symbol("(")?;
        let params = if self.is_symbol(")") {
            Vec::new()
        } else {
            self.parse_params()?
        };
        self.expect_symbol(")")?;
        let body = self.parse_block()?;

        Ok(FuncDecl {
            return_ty,
            name,
            params,
            body,
            line,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = vec![self.parse_param()?];
        while self.is_symbol(",") {
            self.advance();
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let line = self.line();
        let ty = self.parse_type()?;
        let name = self.expect_id()?;
        Ok(Param { ty, name, line })
    }

    // ── Blocks and statements ────────────────────────────────────

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect_symbol("{")?;
        let mut var_decls = Vec::new();
        while self.is_type_start() {
            var_decls.extend(self.parse_var_decl()?);
        }
        let mut stmts = Vec::new();
        while !self.is_symbol("}") {
            stmts.push(self.parse_stmt()?);
        }
        self.expect_symbol("}")?;
        Ok(Block { var_decls, stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        if self.is_keyword("if") {
            return self.parse_conditional();
        }
        if self.is_keyword("while") {
            return self.parse_while();
        }
        if self.is_keyword("return") {
            return self.parse_return();
        }
        if self.is_keyword("break") {
            let line = self.line();
            self.advance();
            self.expect_symbol(";")?;
            return Ok(Stmt::Break { line });
        }
        if self.is_keyword("continue") {
            let line = self.line();
            self.advance();
            self.expect_symbol(";")?;
            return Ok(Stmt::Continue { line });
        }

        let line = self.line();
        match self.parse_call_or_location()? {
            CallOrLocation::Call(call) => {
                self.expect_symbol(";")?;
                Ok(Stmt::Call(call))
            }
            CallOrLocation::Location(target) => {
                self.expect_symbol("=")?;
                let value = self.parse_expr()?;
                self.expect_symbol(";")?;
                Ok(Stmt::Assignment {
                    target,
                    value,
                    line,
                })
            }
        }
    }

    fn parse_conditional(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword("if")?;
        self.expect_symbol("(")?;
        let cond = self.parse_expr()?;
        self.expect_symbol(")")?;
        let then_block = self.parse_block()?;
        let else_block = if self.is_keyword("else") {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::Conditional {
            cond,
            then_block,
            else_block,
            line,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword("while")?;
        self.expect_symbol("(")?;
        let cond = self.parse_expr()?;
        self.expect_symbol(")")?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword("return")?;
        let value = if self.is_symbol(";") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_symbol(";")?;
        Ok(Stmt::Return { value, line })
    }

    /// Disambiguates `Id '(' ...` (a call) from `Id ('[' ...)?` (a
    /// location) with a single token of lookahead after the identifier.
    fn parse_call_or_location(&mut self) -> Result<CallOrLocation, ParseError> {
        let line = self.line();
        let name = self.expect_id()?;

        if self.is_symbol("(") {
            self.advance();
            let args = if self.is_symbol(")") {
                Vec::new()
            } else {
                self.parse_args()?
            };
            self.expect_symbol(")")?;
            return Ok(CallOrLocation::Call(FuncCall { name, args, line }));
        }

        let index = if self.is_symbol("[") {
            self.advance();
            let idx = self.parse_expr()?;
            self.expect_symbol("]")?;
            Some(Box::new(idx))
        } else {
            None
        };
        Ok(CallOrLocation::Location(Location { name, index, line }))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![self.parse_expr()?];
        while self.is_symbol(",") {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    // ── Expressions ──────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.is_symbol("||") {
            let line = self.line();
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_eq_expr()?;
        while self.is_symbol("&&") {
            let line = self.line();
            self.advance();
            let right = self.parse_eq_expr()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_eq_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_rel_expr()?;
        loop {
            let op = if self.is_symbol("==") {
                BinaryOp::Eq
            } else if self.is_symbol("!=") {
                BinaryOp::Ne
            } else {
                break;
            };
            let line = self.line();
            self.advance();
            let right = self.parse_rel_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_rel_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_add_expr()?;
        loop {
            let op = if self.is_symbol("<=") {
                BinaryOp::Le
            } else if self.is_symbol(">=") {
                BinaryOp::Ge
            } else if self.is_symbol("<") {
                BinaryOp::Lt
            } else if self.is_symbol(">") {
                BinaryOp::Gt
            } else {
                break;
            };
            let line = self.line();
            self.advance();
            let right = self.parse_add_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_add_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul_expr()?;
        loop {
            let op = if self.is_symbol("+") {
                BinaryOp::Add
            } else if self.is_symbol("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let line = self.line();
            self.advance();
            let right = self.parse_mul_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_mul_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = if self.is_symbol("*") {
                BinaryOp::Mul
            } else if self.is_symbol("/") {
                BinaryOp::Div
            } else if self.is_symbol("%") {
                BinaryOp::Mod
            } else {
                break;
            };
            let line = self.line();
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        if self.is_symbol("-") {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                line,
            });
        }
        if self.is_symbol("!") {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_base_expr()
    }

    fn parse_base_expr(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();

        if self.is_symbol("(") {
            self.advance();
            let inner = self.parse_expr()?;
            self.expect_symbol(")")?;
            return Ok(inner);
        }

        if self.is_keyword("true") {
            self.advance();
            return Ok(Expr::BoolLit { value: true, line });
        }
        if self.is_keyword("false") {
            self.advance();
            return Ok(Expr::BoolLit { value: false, line });
        }

        match &self.current().kind {
            TokenKind::DecimalLit(v) | TokenKind::HexLit(v) => {
                let value = *v;
                self.advance();
                Ok(Expr::IntLit { value, line })
            }
            TokenKind::StringLit(s) => {
                let value = s.clone();
                self.advance();
                Ok(Expr::StringLit { value, line })
            }
            TokenKind::Id => match self.parse_call_or_location()? {
                CallOrLocation::Call(call) => Ok(Expr::Call(call)),
                CallOrLocation::Location(loc) => Ok(Expr::Location(loc)),
            },
            _ => Err(self.error("an expression")),
        }
    }
}
