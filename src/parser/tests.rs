#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::lexer::lex;
    use crate::parser::ast::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn parse_ok(input: &str) -> Program {
        let tokens = lex(input).expect("expected successful lex");
        parse(&tokens).expect("expected successful parse")
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = lex(input).expect("expected successful lex");
        parse(&tokens).expect_err("expected a parse error")
    }

    #[test]
    fn empty_program() {
        let program = parse_ok("");
        assert!(program.var_decls.is_empty());
        assert!(program.func_decls.is_empty());
    }

    #[test]
    fn global_var_decl() {
        let program = parse_ok("int x;");
        assert_eq!(program.var_decls.len(), 1);
        assert_eq!(program.var_decls[0].name, "x");
        assert_eq!(program.var_decls[0].ty, Type::Int);
        assert!(program.var_decls[0].array_len.is_none());
    }

    #[test]
    fn global_array_decl() {
        let program = parse_ok("bool flags[4];");
        let decl = &program.var_decls[0];
        assert_eq!(decl.ty, Type::Bool);
        assert_eq!(decl.array_len.as_ref().unwrap().value, 4);
    }

    #[test]
    fn multi_declarator_var_decl() {
        let program = parse_ok("int a, b[4], c;");
        assert_eq!(program.var_decls.len(), 3);
        assert_eq!(program.var_decls[0].name, "a");
        assert!(program.var_decls[0].array_len.is_none());
        assert_eq!(program.var_decls[1].name, "b");
        assert_eq!(program.var_decls[1].array_len.as_ref().unwrap().value, 4);
        assert_eq!(program.var_decls[2].name, "c");
    }

    #[test]
    fn void_function_no_params() {
        let program = parse_ok("def void f() { }");
        let f = &program.func_decls[0];
        assert_eq!(f.name, "f");
        assert_eq!(f.return_ty, Type::Void);
        assert!(f.params.is_empty());
    }

    #[test]
    fn function_with_params() {
        let program = parse_ok("def int add(int a, int b) { return a+b; }");
        let f = &program.func_decls[0];
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].name, "a");
        assert_eq!(f.params[1].ty, Type::Int);
    }

    #[test]
    fn block_with_locals_and_statements() {
        let program = parse_ok("def int main() { int i; i = 0; return i; }");
        let body = &program.func_decls[0].body;
        assert_eq!(body.var_decls.len(), 1);
        assert_eq!(body.stmts.len(), 2);
        assert!(matches!(body.stmts[0], Stmt::Assignment { .. }));
        assert!(matches!(body.stmts[1], Stmt::Return { .. }));
    }

    #[test]
    fn if_without_else() {
        let program = parse_ok("def void f() { if (true) { } }");
        let stmt = &program.func_decls[0].body.stmts[0];
        match stmt {
            Stmt::Conditional {
                else_block, cond, ..
            } => {
                assert!(else_block.is_none());
                assert!(matches!(cond, Expr::BoolLit { value: true, .. }));
            }
            _ => panic!("expected a conditional"),
        }
    }

    #[test]
    fn if_with_else() {
        let program = parse_ok("def void f() { if (false) { } else { } }");
        let stmt = &program.func_decls[0].body.stmts[0];
        assert!(matches!(
            stmt,
            Stmt::Conditional {
                else_block: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let program = parse_ok("def void f() { while (true) { break; continue; } }");
        let stmt = &program.func_decls[0].body.stmts[0];
        match stmt {
            Stmt::While { body, .. } => {
                assert!(matches!(body.stmts[0], Stmt::Break { .. }));
                assert!(matches!(body.stmts[1], Stmt::Continue { .. }));
            }
            _ => panic!("expected a while loop"),
        }
    }

    #[test]
    fn bare_call_statement() {
        let program = parse_ok("def void f() { print_int(1); }");
        assert!(matches!(
            program.func_decls[0].body.stmts[0],
            Stmt::Call(_)
        ));
    }

    #[test]
    fn array_location_assignment() {
        let program = parse_ok("int a[4]; def void f() { a[1] = 2; }");
        let stmt = &program.func_decls[0].body.stmts[0];
        match stmt {
            Stmt::Assignment { target, .. } => {
                assert_eq!(target.name, "a");
                assert!(target.index.is_some());
            }
            _ => panic!("expected an assignment"),
        }
    }

    #[test]
    fn call_vs_location_disambiguation() {
        let program = parse_ok("def void f() { g(); x = y; }");
        assert!(matches!(program.func_decls[0].body.stmts[0], Stmt::Call(_)));
        match &program.func_decls[0].body.stmts[1] {
            Stmt::Assignment { value, .. } => {
                assert!(matches!(value, Expr::Location(_)));
            }
            _ => panic!("expected an assignment"),
        }
    }

    #[test]
    fn operator_precedence_climbing() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        let program = parse_ok("def int f() { return 1+2*3; }");
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Return {
                value: Some(Expr::Binary { op, left, right, .. }),
                ..
            } => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(**left, Expr::IntLit { value: 1, .. }));
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected 1 + (2*3)"),
        }
    }

    #[test]
    fn logical_operators_are_loosest() {
        let program = parse_ok("def bool f() { return 1 < 2 && 3 < 4 || 5 < 6; }");
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Return {
                value: Some(Expr::Binary { op, .. }),
                ..
            } => assert_eq!(*op, BinaryOp::Or),
            _ => panic!("expected the outermost operator to be ||"),
        }
    }

    #[test]
    fn unary_operators_bind_tighter_than_binary() {
        let program = parse_ok("def int f() { return -1+2; }");
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Return {
                value: Some(Expr::Binary { op, left, .. }),
                ..
            } => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(
                    **left,
                    Expr::Unary {
                        op: UnaryOp::Neg,
                        ..
                    }
                ));
            }
            _ => panic!("expected (-1)+2"),
        }
    }

    #[test]
    fn parenthesized_expression() {
        let program = parse_ok("def int f() { return (1+2)*3; }");
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Return {
                value: Some(Expr::Binary { op, left, .. }),
                ..
            } => {
                assert_eq!(*op, BinaryOp::Mul);
                assert!(matches!(**left, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            _ => panic!("expected (1+2)*3"),
        }
    }

    #[test]
    fn function_call_with_args() {
        let program = parse_ok("def int f() { return g(1, 2+3); }");
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Return {
                value: Some(Expr::Call(call)),
                ..
            } => {
                assert_eq!(call.name, "g");
                assert_eq!(call.args.len(), 2);
            }
            _ => panic!("expected a call expression"),
        }
    }

    #[test]
    fn string_literal_argument() {
        let program = parse_ok(r#"def void f() { print_str("hi\n"); }"#);
        match &program.func_decls[0].body.stmts[0] {
            Stmt::Call(call) => match &call.args[0] {
                Expr::StringLit { value, .. } => assert_eq!(value, "hi\n"),
                _ => panic!("expected a string literal argument"),
            },
            _ => panic!("expected a call statement"),
        }
    }

    #[test]
    fn missing_semicolon_is_a_parse_error() {
        let err = parse_err("def int main() { return 1 }");
        assert_eq!(err.line, 1);
        assert!(err.expected.contains(';'));
    }

    #[test]
    fn expected_expression_after_operator() {
        let err = parse_err("def int main() { return 1+; }");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn def_required_for_function() {
        let err = parse_err("int f() { return 0; }");
        assert!(err.expected.contains("def") || err.expected.contains("type"));
    }

    #[test]
    fn void_array_length_must_be_literal() {
        let err = parse_err("int a[x];");
        assert_eq!(err.line, 1);
    }
}
