#[cfg(test)]
mod interpreter_tests {
    use brewin::console::Console;
    use brewin::error::BrewinError;
    use brewin::interpreter::Interpreter;
    use brewin::parser::parse_program;
    use brewin::run_source;

    /// Run `source` with `input` as stdin and return the output lines.
    fn run_with_input(source: &str, input: &str) -> Result<Vec<String>, BrewinError> {
        let mut reader: &[u8] = input.as_bytes();
        let mut output: Vec<u8> = Vec::new();

        run_source(source, &mut reader, &mut output)?;

        Ok(String::from_utf8(output)
            .unwrap()
            .lines()
            .map(String::from)
            .collect())
    }

    fn run(source: &str) -> Result<Vec<String>, BrewinError> {
        run_with_input(source, "")
    }

    fn assert_output(source: &str, expected: &[&str]) {
        match run(source) {
            Ok(lines) => assert_eq!(lines, expected, "Unexpected output for:\n{}", source),
            Err(e) => panic!("Program failed with {} for:\n{}", e, source),
        }
    }

    fn assert_name_error(source: &str) {
        match run(source) {
            Err(BrewinError::Name(_)) => {}
            other => panic!("Expected NameError, got {:?} for:\n{}", other, source),
        }
    }

    fn assert_type_error(source: &str) {
        match run(source) {
            Err(BrewinError::Type(_)) => {}
            other => panic!("Expected TypeError, got {:?} for:\n{}", other, source),
        }
    }

    // ───────────────────────────── values ─────────────────────────────

    #[test]
    fn test_scalars_are_copied_on_assignment() {
        assert_output(
            r#"func main() { a = 5; b = a; b = 6; print(a, " ", b); }"#,
            &["5 6"],
        );
    }

    #[test]
    fn test_objects_share_identity() {
        assert_output(
            "func main() {
                 a = @; a.x = 1;
                 b = a; b.x = 2;
                 print(a.x);
                 print(a == b);
                 c = @;
                 print(a == c);
             }",
            &["2", "true", "false"],
        );
    }

    #[test]
    fn test_equality_edge_cases() {
        assert_output(
            r#"func main() {
                 print(nil == nil);
                 print(1 == "1");
                 print(1 == true);
                 print(0 == false);
                 print("a" != "b");
                 print(nil != 0);
             }"#,
            &["true", "false", "true", "true", "true", "true"],
        );
    }

    #[test]
    fn test_floor_division() {
        assert_output(
            "func main() { print(7 / 2); print((0 - 7) / 2); print(-7 / 2); print(6 / 3); }",
            &["3", "-4", "-4", "2"],
        );
    }

    #[test]
    fn test_printable_forms() {
        assert_output(
            "func f() { } func main() { print(f); print(lambda() { }); print(@); print(f()); print(true); }",
            &["<function f>", "<lambda>", "<object>", "nil", "true"],
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_type_error(r#"func main() { x = 1 + "a"; }"#);
        assert_type_error("func main() { x = true - 1; }");
        assert_type_error(r#"func main() { x = "a" < "b"; }"#);
        assert_type_error(r#"func main() { x = !"a"; }"#);
        assert_type_error("func main() { x = nil && true; }");
        assert_type_error("func main() { x = 1 / 0; }");
    }

    // ───────────────────────────── control flow ─────────────────────────────

    #[test]
    fn test_while_and_block_scoping() {
        assert_output(
            "func main() {
                 i = 0; s = 0;
                 while (i < 5) { i = i + 1; s = s + i; }
                 print(s);
                 if (2) { x = 1; s = 0; } else { s = 99; }
                 print(s);
             }",
            &["15", "0"],
        );

        assert_name_error("func main() { if (true) { t = 1; } print(t); }");
    }

    #[test]
    fn test_conditions_must_be_bool_or_int() {
        assert_type_error(r#"func main() { if ("s") { } }"#);
        assert_type_error("func main() { while (nil) { } }");
    }

    #[test]
    fn test_return_unwinds_nested_frames() {
        let source = "
            func find() {
                i = 0;
                while (true) {
                    if (i == 3) { return i; }
                    i = i + 1;
                }
            }
            func main() { print(find()); }";

        let program = parse_program(source).unwrap();
        let mut input: &[u8] = b"";
        let mut output: Vec<u8> = Vec::new();
        let mut interpreter = Interpreter::new(&program, Console::new(&mut input, &mut output));

        interpreter.run().unwrap();
        assert_eq!(interpreter.environment().depth(), 0);

        drop(interpreter);
        assert_eq!(String::from_utf8(output).unwrap(), "3\n");
    }

    #[test]
    fn test_recursion_and_fall_through_nil() {
        assert_output(
            "func fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); }
             func nothing() { x = 1; }
             func main() { print(fact(10)); print(nothing()); }",
            &["3628800", "nil"],
        );
    }

    // ───────────────────────────── functions ─────────────────────────────

    #[test]
    fn test_overloads_dispatch_on_arity() {
        assert_output(
            "func f(a) { return 1; } func f(a, b) { return 2; }
             func main() { print(f(0), f(0, 0)); }",
            &["12"],
        );
    }

    #[test]
    fn test_ambiguous_bare_function_reference() {
        assert_name_error("func f() { } func f(a) { } func main() { g = f; }");
    }

    #[test]
    fn test_overloaded_name_is_ambiguous_even_as_variable() {
        assert_name_error("func f() { } func f(a) { } func main() { f = 5; print(f); }");
    }

    #[test]
    fn test_functions_as_values() {
        assert_output(
            "func apply(g, v) { return g(v); }
             func double(n) { return n * 2; }
             func main() { h = double; print(apply(h, 21)); print(h == double); }",
            &["42", "true"],
        );
    }

    #[test]
    fn test_callee_sees_caller_variables() {
        assert_output("func g() { print(y); } func main() { y = 7; g(); }", &["7"]);
    }

    #[test]
    fn test_call_errors() {
        assert_name_error("func main() { nope(); }");
        assert_name_error("func f(a) { } func main() { f(); }");
        assert_name_error("func main() { print(missing); }");
        assert_type_error("func main() { x = 5; x(); }");
        assert_type_error("func main() { f = lambda(a) { }; f(); }");
    }

    #[test]
    fn test_missing_main() {
        match run("func helper() { }") {
            Err(e @ BrewinError::Name(_)) => {
                assert_eq!(e.to_string(), "NameError: No main() function was found")
            }
            other => panic!("Expected NameError, got {:?}", other),
        }
    }

    // ───────────────────────────── parameters ─────────────────────────────

    #[test]
    fn test_by_value_parameters_are_isolated() {
        assert_output(
            "func set(v) { v = 3; }
             func main() { x = 1; set(x); print(x); }",
            &["1"],
        );
    }

    #[test]
    fn test_two_level_ref_cascade() {
        assert_output(
            "func inner(ref q) { q = 10; }
             func outer(ref p) { inner(p); print(p); }
             func main() { x = 100; outer(x); print(x); }",
            &["10", "10"],
        );
    }

    #[test]
    fn test_ref_with_non_variable_argument_binds_by_value() {
        assert_output(
            "func bump(ref n) { n = n + 1; return n; }
             func main() { o = @; o.x = 1; print(bump(5)); print(bump(o.x)); print(o.x); }",
            &["6", "2", "1"],
        );
    }

    #[test]
    fn test_object_arguments_are_deep_copied_unless_ref() {
        assert_output(
            "func mutate(o) { o.x = 99; }
             func mutate_ref(ref o) { o.x = 42; }
             func main() { a = @; a.x = 1; mutate(a); print(a.x); mutate_ref(a); print(a.x); }",
            &["1", "42"],
        );
    }

    #[test]
    fn test_deep_copy_keeps_cycles() {
        assert_output(
            "func f(o) { print(o.me == o); print(o == a); }
             func main() { a = @; a.me = a; f(a); }",
            &["true", "false"],
        );
    }

    #[test]
    fn test_returned_objects_are_copies() {
        assert_output(
            "func get(ref o) { return o; }
             func main() { a = @; a.x = 1; b = get(a); b.x = 5; print(a.x); print(b.x); }",
            &["1", "5"],
        );
    }

    // ───────────────────────────── objects ─────────────────────────────

    #[test]
    fn test_proto_fallback_and_write_isolation() {
        assert_output(
            "func main() {
                 p = @; p.greet = 1;
                 c = @; c.proto = p;
                 print(c.greet);
                 c.greet = 2;
                 print(p.greet);
                 print(c.greet);
                 p.late = 3;
                 print(c.late);
             }",
            &["1", "1", "2", "3"],
        );
    }

    #[test]
    fn test_field_errors() {
        assert_type_error("func main() { o = @; o.proto = 5; }");
        assert_name_error("func main() { o = @; print(o.missing); }");
        assert_type_error("func main() { x = 1; print(x.y); }");
        assert_name_error("func main() { print(nobody.y); }");
        assert_name_error("func main() { o = @; o.m(); }");
        assert_type_error("func main() { o = @; o.m = 1; o.m(); }");
    }

    #[test]
    fn test_methods_bind_this() {
        assert_output(
            r#"func incr() { this.count = this.count + 1; }
             func main() {
                 base = @;
                 base.name = "base";
                 base.hello = lambda() { print("hi ", this.name); };
                 obj = @; obj.proto = base; obj.name = "obj";
                 obj.hello();
                 obj.count = 0;
                 obj.inc = incr;
                 obj.inc(); obj.inc();
                 print(obj.count);
             }"#,
            &["hi obj", "2"],
        );
    }

    #[test]
    fn test_methods_take_arguments() {
        assert_output(
            "func main() {
                 o = @;
                 o.set = lambda(v) { this.x = v; };
                 o.set(5);
                 print(o.x);
             }",
            &["5"],
        );
    }

    #[test]
    fn test_method_reassigning_this_rebinds_receiver() {
        assert_output(
            "func reset() { this = @; this.v = 9; }
             func main() {
                 o = @; o.v = 1; o.reset = reset;
                 keep = o;
                 o.reset();
                 print(o.v);
                 print(keep.v);
                 print(o == keep);
             }",
            &["9", "1", "false"],
        );
    }

    // ───────────────────────────── closures ─────────────────────────────

    #[test]
    fn test_closure_captures_by_value() {
        assert_output(
            "func main() { x = 1; f = lambda() { print(x); }; x = 2; f(); }",
            &["1"],
        );
    }

    #[test]
    fn test_closure_mutation_persists_but_stays_private() {
        assert_output(
            "func main() {
                 c = 0;
                 counter = lambda() { c = c + 1; print(c); };
                 counter(); counter();
                 print(c);
             }",
            &["1", "2", "0"],
        );
    }

    #[test]
    fn test_closure_shares_captured_objects() {
        assert_output(
            "func main() { o = @; o.v = 1; f = lambda() { o.v = 5; }; f(); print(o.v); }",
            &["5"],
        );
    }

    #[test]
    fn test_parameters_shadow_captures() {
        assert_output(
            "func main() { x = 1; f = lambda(x) { print(x); }; f(9); print(x); }",
            &["9", "1"],
        );
    }

    #[test]
    fn test_returned_lambda_keeps_its_environment() {
        assert_output(
            "func make(n) { return lambda(k) { return n + k; }; }
             func main() { add5 = make(5); print(add5(3)); n = 100; print(add5(1)); }",
            &["8", "6"],
        );
    }

    #[test]
    fn test_lambda_arguments_are_deep_copied() {
        assert_output(
            "func run(g) { g(); g(); }
             func main() {
                 c = 0;
                 counter = lambda() { c = c + 1; print(c); };
                 run(counter);
                 counter();
             }",
            &["1", "2", "1"],
        );
    }

    #[test]
    fn test_reads_reach_one_level_into_captured_lambdas() {
        assert_output(
            "func main() {
                 keeper = nil;
                 if (true) { secret = 42; keeper = lambda() { }; }
                 reader = lambda() { print(secret); };
                 reader();
             }",
            &["42"],
        );
    }

    #[test]
    fn test_nested_capture_lookup_prefers_earliest_capture() {
        let source = "func main() {
                 f = nil; g = nil;
                 if (true) { y = 1; f = lambda() { }; y = 2; g = lambda() { }; }
                 h = lambda() { print(y); };
                 h();
             }";

        for _ in 0..8 {
            assert_eq!(run(source).unwrap(), vec!["1"]);
        }
    }

    #[test]
    fn test_lambda_ref_parameter() {
        assert_output(
            "func main() { inc = lambda(ref v) { v = v + 1; }; y = 1; inc(y); print(y); }",
            &["2"],
        );
    }

    #[test]
    fn test_lambda_identity() {
        assert_output(
            "func main() { f = lambda() { }; g = f; h = lambda() { }; print(f == g); print(f == h); }",
            &["true", "false"],
        );
    }

    // ───────────────────────────── input ─────────────────────────────

    #[test]
    fn test_input_builtins() {
        let lines = run_with_input(
            r#"func main() { n = inputi("Enter: "); s = inputs(); print(n + 1, s); }"#,
            "41\nhello\n",
        )
        .unwrap();

        assert_eq!(lines, vec!["Enter: ", "42hello"]);
    }

    #[test]
    fn test_input_errors() {
        assert!(matches!(
            run_with_input("func main() { n = inputi(); }", "abc\n"),
            Err(BrewinError::Type(_))
        ));
        assert!(matches!(
            run_with_input("func main() { s = inputs(); }", ""),
            Err(BrewinError::Type(_))
        ));
        assert!(matches!(
            run_with_input(r#"func main() { s = inputs("a", "b"); }"#, "x\n"),
            Err(BrewinError::Name(_))
        ));
        // inputi takes the line as typed: whitespace or a sign is rejected.
        assert!(matches!(
            run_with_input("func main() { n = inputi(); }", " 5\n"),
            Err(BrewinError::Type(_))
        ));
        assert!(matches!(
            run_with_input("func main() { n = inputi(); }", "-5\n"),
            Err(BrewinError::Type(_))
        ));
    }

    #[test]
    fn test_front_end_errors_surface_through_run_source() {
        assert!(matches!(run("func main() { $ }"), Err(BrewinError::Lex { .. })));
        assert!(matches!(
            run("func main() { x = ; }"),
            Err(BrewinError::Parse { .. })
        ));
    }
}
