#[cfg(test)]
mod parser_tests {
    use brewin::ast::*;
    use brewin::error::BrewinError;
    use brewin::parser::parse_program;

    fn main_body(source: &str) -> Vec<Stmt> {
        let program = parse_program(source).unwrap();
        let main = program
            .functions
            .iter()
            .find(|f| f.name.as_deref() == Some("main"))
            .expect("main should be parsed");

        main.body.clone()
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn test_parser_functions_and_ref_params() {
        let program =
            parse_program("func f(a, ref b) { return a; } func f(x) { } func main() { }").unwrap();

        assert_eq!(program.functions.len(), 3);

        let f = &program.functions[0];
        assert_eq!(f.name.as_deref(), Some("f"));
        assert_eq!(f.arity(), 2);
        assert!(!f.params[0].by_ref);
        assert!(f.params[1].by_ref);
        assert_eq!(program.functions[1].arity(), 1);
    }

    #[test]
    fn test_parser_precedence() {
        let body = main_body("func main() { x = 1 + 2 * 3 == 7 && !false; }");

        let expected = Expr::Binary {
            op: BinaryOp::And,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Equal,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Int(1)),
                    right: Box::new(Expr::Binary {
                        op: BinaryOp::Mul,
                        left: Box::new(Expr::Int(2)),
                        right: Box::new(Expr::Int(3)),
                    }),
                }),
                right: Box::new(Expr::Int(7)),
            }),
            right: Box::new(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Bool(false)),
            }),
        };

        assert_eq!(
            body,
            vec![Stmt::Assign {
                target: Target::Variable("x".to_string()),
                value: expected,
            }]
        );
    }

    #[test]
    fn test_parser_subtraction_is_left_associative() {
        let body = main_body("func main() { x = 10 - 3 - 2; }");

        let Stmt::Assign { value, .. } = &body[0] else {
            panic!("Expected assignment, got {:?}", body[0]);
        };

        assert_eq!(
            *value,
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: Box::new(Expr::Int(10)),
                    right: Box::new(Expr::Int(3)),
                }),
                right: Box::new(Expr::Int(2)),
            }
        );
    }

    #[test]
    fn test_parser_objects_fields_and_methods() {
        let body = main_body("func main() { o = @; o.x = 5; o.m(o.x, 1); y = o.m(); }");

        assert_eq!(
            body[0],
            Stmt::Assign {
                target: Target::Variable("o".to_string()),
                value: Expr::Object,
            }
        );
        assert_eq!(
            body[1],
            Stmt::Assign {
                target: Target::Field {
                    object: "o".to_string(),
                    field: "x".to_string(),
                },
                value: Expr::Int(5),
            }
        );
        assert_eq!(
            body[2],
            Stmt::Call(Call::Method {
                objref: "o".to_string(),
                name: "m".to_string(),
                args: vec![
                    Expr::Field {
                        object: "o".to_string(),
                        field: "x".to_string(),
                    },
                    Expr::Int(1),
                ],
            })
        );
        assert!(matches!(
            &body[3],
            Stmt::Assign { value: Expr::Call(Call::Method { args, .. }), .. } if args.is_empty()
        ));
    }

    #[test]
    fn test_parser_control_flow_and_lambda() {
        let body = main_body(
            "func main() {
                 if (x) { return; } else { print(1); }
                 while (i < 3) { i = i + 1; }
                 f = lambda(a, ref b) { return a; };
             }",
        );

        match &body[0] {
            Stmt::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                assert_eq!(*condition, var("x"));
                assert_eq!(*then_branch, vec![Stmt::Return(None)]);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("Expected if/else, got {:?}", other),
        }

        assert!(matches!(&body[1], Stmt::While { body, .. } if body.len() == 1));

        match &body[2] {
            Stmt::Assign {
                value: Expr::Lambda(decl),
                ..
            } => {
                assert!(decl.name.is_none());
                assert_eq!(decl.display_name(), "lambda");
                assert_eq!(decl.arity(), 2);
                assert!(decl.params[1].by_ref);
                assert_eq!(decl.body, vec![Stmt::Return(Some(var("a")))]);
            }
            other => panic!("Expected lambda assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_errors_report_line() {
        let err = parse_program("func main() {\n x = ;\n}").unwrap_err();
        assert!(matches!(err, BrewinError::Parse { line: 2, .. }));
        assert_eq!(err.to_string(), "[line 2] Error: Expected expression");

        assert!(matches!(
            parse_program("x = 1;"),
            Err(BrewinError::Parse { .. })
        ));
        assert!(matches!(
            parse_program("func main() { 1 + 2; }"),
            Err(BrewinError::Parse { .. })
        ));
        assert!(matches!(
            parse_program("func main() { print(1) }"),
            Err(BrewinError::Parse { .. })
        ));
    }

    #[test]
    fn test_parser_ast_serializes_to_json() {
        let program = parse_program("func main() { print(\"hi\"); }").unwrap();
        let json = serde_json::to_value(&program).unwrap();

        assert_eq!(json["functions"][0]["name"], "main");
        assert_eq!(
            json["functions"][0]["body"][0]["Call"]["Function"]["name"],
            "print"
        );
    }
}
