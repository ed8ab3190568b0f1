use log::trace;
use serde::Serialize;
use std::fmt;
use std::mem;

/// Token kinds. Only `STRING` and `INT` carry a payload, the decoded literal.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// '@' (object literal)
    AT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '&&'
    AND_AND,

    /// '||'
    OR_OR,

    /// Variable, function, field or parameter name
    IDENTIFIER,

    /// String literal, quotes stripped
    STRING(String),

    /// An integer literal
    INT(i64),

    /// 'else'
    ELSE,

    /// 'false'
    FALSE,

    /// 'func'
    FUNC,

    /// 'if'
    IF,

    /// 'lambda'
    LAMBDA,

    /// 'nil'
    NIL,

    /// 'ref'
    REF,

    /// 'return'
    RETURN,

    /// 'true'
    TRUE,

    /// 'while'
    WHILE,

    EOF,
}

// Kinds compare by variant only, so `check(TokenType::INT(0))` matches any int.
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl fmt::Display for TokenType {
    /// The bare variant name, without payload.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::STRING(_) => f.write_str("STRING"),
            TokenType::INT(_) => f.write_str("INT"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    pub token_type: TokenType,

    /// Source text of the token, borrowed from the scanned buffer.
    pub lexeme: &'a str,

    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        trace!("Token {:?} {:?} on line {}", token_type, lexeme, line);

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

/// `KIND lexeme literal`, with `null` for tokens that carry no literal.
impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = itoa::Buffer::new();
        let literal: &str = match &self.token_type {
            TokenType::STRING(s) => s,
            TokenType::INT(n) => buf.format(*n),
            _ => "null",
        };

        write!(f, "{} {} {}", self.token_type, self.lexeme, literal)
    }
}
