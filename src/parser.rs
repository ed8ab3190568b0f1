/*!
Recursive‑descent parser for Brewin.

Consumes the token slice produced by [`Scanner`](crate::scanner::Scanner) and
builds the owned AST in [`crate::ast`]. Each token is consumed once, so parsing
is Θ(n) in the number of tokens; call‑stack depth grows with syntactic nesting.

Parser lifecycle is logged at `info`, descent into functions and statements
at `debug`.

## Grammar

```text
program    → function* EOF ;
function   → "func" IDENT "(" params? ")" block ;
params     → param ( "," param )* ;
param      → "ref"? IDENT ;
block      → "{" statement* "}" ;
statement  → "if" "(" expression ")" block ( "else" block )?
           | "while" "(" expression ")" block
           | "return" expression? ";"
           | target "=" expression ";"
           | callee "(" arguments? ")" ";" ;
target     → IDENT ( "." IDENT )? ;
expression → or ;
or         → and ( "||" and )* ;
and        → equality ( "&&" equality )* ;
equality   → comparison ( ( "==" | "!=" ) comparison )* ;
comparison → term ( ( "<" | "<=" | ">" | ">=" ) term )* ;
term       → factor ( ( "+" | "-" ) factor )* ;
factor     → unary ( ( "*" | "/" ) unary )* ;
unary      → ( "-" | "!" ) unary | primary ;
primary    → INT | STRING | "true" | "false" | "nil" | "@"
           | "lambda" "(" params? ")" block
           | IDENT ( "." IDENT )? ( "(" arguments? ")" )?
           | "(" expression ")" ;
```
*/

use std::rc::Rc;

use crate::ast::{BinaryOp, Call, Expr, FuncDecl, Param, Program, Stmt, Target, UnaryOp};
use crate::error::{BrewinError, Result};
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARGS: usize = 255;

/// Scan and parse a complete program in one step.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens: Vec<Token<'_>> = Scanner::new(source).scan_all()?;

    Parser::new(&tokens).parse()
}

/// Cursor over a scanned token buffer that ends in `EOF`.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    /// Parse an entire program and return its function catalog.
    pub fn parse(&mut self) -> Result<Program> {
        info!("Parsing program");

        let mut functions: Vec<Rc<FuncDecl>> = Vec::new();

        while !self.is_at_end() {
            self.consume(TokenType::FUNC, "Expected 'func' at top level")?;
            functions.push(Rc::new(self.function()?));
        }

        info!("Parsed {} functions", functions.len());

        Ok(Program { functions })
    }

    fn function(&mut self) -> Result<FuncDecl> {
        let keyword: &Token<'_> = self.previous();
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expected function name")?;

        debug!("Entering function '{}'", name.lexeme);

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name")?;
        let params: Vec<Param> = self.parameters()?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body")?;
        let body: Vec<Stmt> = self.block()?;

        Ok(FuncDecl {
            name: Some(name.lexeme.to_string()),
            params,
            body,
            line: keyword.line,
        })
    }

    /// Parameter list after the opening `(`, including the closing `)`.
    fn parameters(&mut self) -> Result<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(BrewinError::parse(
                        self.peek().line,
                        "Cannot have more than 255 parameters",
                    ));
                }

                let by_ref: bool = self.matches(TokenType::REF);
                let name = self.consume(TokenType::IDENTIFIER, "Expected parameter name")?;

                params.push(Param {
                    name: name.lexeme.to_string(),
                    by_ref,
                });

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        Ok(params)
    }

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else {
            self.assignment_or_call()
        }
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' after if condition")?;
        let then_branch: Vec<Stmt> = self.block()?;

        let else_branch: Option<Vec<Stmt>> = if self.matches(TokenType::ELSE) {
            self.consume(TokenType::LEFT_BRACE, "Expected '{' after 'else'")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' after while condition")?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;

        Ok(Stmt::Return(value))
    }

    /// `name = …;`, `obj.field = …;`, `name(…);` or `obj.method(…);`
    fn assignment_or_call(&mut self) -> Result<Stmt> {
        let first: &Token<'_> =
            self.consume(TokenType::IDENTIFIER, "Expected statement")?;

        let second: Option<&Token<'_>> = if self.matches(TokenType::DOT) {
            Some(self.consume(TokenType::IDENTIFIER, "Expected field name after '.'")?)
        } else {
            None
        };

        if self.matches(TokenType::EQUAL) {
            let target = match second {
                Some(field) => Target::Field {
                    object: first.lexeme.to_string(),
                    field: field.lexeme.to_string(),
                },
                None => Target::Variable(first.lexeme.to_string()),
            };

            let value: Expr = self.expression()?;
            self.consume(TokenType::SEMICOLON, "Expected ';' after assignment")?;

            return Ok(Stmt::Assign { target, value });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let call: Call = self.finish_call(first, second)?;
            self.consume(TokenType::SEMICOLON, "Expected ';' after call")?;

            return Ok(Stmt::Call(call));
        }

        Err(BrewinError::parse(
            self.peek().line,
            "Expected '=' or '(' after name",
        ))
    }

    /// Statements up to and including the closing `}`.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(statements)
    }

    fn expression(&mut self) -> Result<Expr> {
        self.logical_or()
    }

    /// One left‑associative precedence level.
    fn binary_level(
        &mut self,
        operators: &[(TokenType, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        'outer: loop {
            for (tt, op) in operators {
                if self.matches(tt.clone()) {
                    let right: Expr = next(self)?;

                    expr = Expr::Binary {
                        op: *op,
                        left: Box::new(expr),
                        right: Box::new(right),
                    };

                    continue 'outer;
                }
            }

            return Ok(expr);
        }
    }

    fn logical_or(&mut self) -> Result<Expr> {
        self.binary_level(&[(TokenType::OR_OR, BinaryOp::Or)], Self::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        self.binary_level(&[(TokenType::AND_AND, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::EQUAL_EQUAL, BinaryOp::Equal),
                (TokenType::BANG_EQUAL, BinaryOp::NotEqual),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::LESS_EQUAL, BinaryOp::LessEqual),
                (TokenType::LESS, BinaryOp::Less),
                (TokenType::GREATER_EQUAL, BinaryOp::GreaterEqual),
                (TokenType::GREATER, BinaryOp::Greater),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::PLUS, BinaryOp::Add),
                (TokenType::MINUS, BinaryOp::Sub),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::STAR, BinaryOp::Mul),
                (TokenType::SLASH, BinaryOp::Div),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = if self.matches(TokenType::MINUS) {
            UnaryOp::Neg
        } else if self.matches(TokenType::BANG) {
            UnaryOp::Not
        } else {
            return self.primary();
        };

        let operand: Expr = self.unary()?;

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Bool(false));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Bool(true));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Nil);
        }
        if self.matches(TokenType::AT) {
            return Ok(Expr::Object);
        }

        if let TokenType::INT(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Int(n));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Str(s.clone()));
        }

        if self.matches(TokenType::LAMBDA) {
            return self.lambda();
        }

        if self.matches(TokenType::IDENTIFIER) {
            let first: &Token<'_> = self.previous();

            let second: Option<&Token<'_>> = if self.matches(TokenType::DOT) {
                Some(self.consume(TokenType::IDENTIFIER, "Expected field name after '.'")?)
            } else {
                None
            };

            if self.matches(TokenType::LEFT_PAREN) {
                return Ok(Expr::Call(self.finish_call(first, second)?));
            }

            return Ok(match second {
                Some(field) => Expr::Field {
                    object: first.lexeme.to_string(),
                    field: field.lexeme.to_string(),
                },
                None => Expr::Variable(first.lexeme.to_string()),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(expr);
        }

        Err(BrewinError::parse(self.peek().line, "Expected expression"))
    }

    fn lambda(&mut self) -> Result<Expr> {
        let keyword: &Token<'_> = self.previous();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'lambda'")?;
        let params: Vec<Param> = self.parameters()?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before lambda body")?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Expr::Lambda(Rc::new(FuncDecl {
            name: None,
            params,
            body,
            line: keyword.line,
        })))
    }

    /// Arguments after the opening `(`; `second` is the method name for
    /// `objref.method(…)` calls.
    fn finish_call(&mut self, first: &Token<'_>, second: Option<&Token<'_>>) -> Result<Call> {
        let mut args: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if args.len() >= MAX_ARGS {
                    return Err(BrewinError::parse(
                        self.peek().line,
                        "Cannot have more than 255 arguments",
                    ));
                }

                args.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(match second {
            Some(method) => Call::Method {
                objref: first.lexeme.to_string(),
                name: method.lexeme.to_string(),
                args,
            },
            None => Call::Function {
                name: first.lexeme.to_string(),
                args,
            },
        })
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(BrewinError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.tokens
            .get(self.current)
            .map_or(true, |t| matches!(t.token_type, TokenType::EOF))
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;

        &tokens[self.current.min(tokens.len().saturating_sub(1))]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;

        &tokens[self.current.saturating_sub(1)]
    }
}
