//! Lexer for Brewin source text.
//!
//! [`Scanner`] walks the source bytes once and yields `Result<Token>` items.
//! Whitespace and both comment forms are dropped; a lexical error is yielded
//! in place of the offending token and scanning resumes after it. The final
//! item is always a single `EOF` token.
//!
//! Recognised input:
//!
//! - punctuation `( ) { } , . ; @` and operators `+ - * / = == ! != < <= > >= && ||`
//! - decimal integer literals (a leading `-` is a separate token)
//! - `"..."` strings, no escapes, may cross lines
//! - identifiers `[A-Za-z_][A-Za-z0-9_]*`, keywords looked up in [`KEYWORDS`]
//! - `// line` and `/* block */` comments
//!
//! ```rust
//! use brewin::scanner::Scanner;
//!
//! let tokens = Scanner::new("func main() { print(1); }").scan_all().unwrap();
//! assert_eq!(tokens.len(), 12);
//! ```

use crate::error::{BrewinError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

/// Reserved words.
pub static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"func"   => TokenType::FUNC,
    b"if"     => TokenType::IF,
    b"lambda" => TokenType::LAMBDA,
    b"nil"    => TokenType::NIL,
    b"ref"    => TokenType::REF,
    b"return" => TokenType::RETURN,
    b"true"   => TokenType::TRUE,
    b"while"  => TokenType::WHILE,
};

/// Streaming lexer. Emitted tokens borrow their lexemes from `src`.
pub struct Scanner<'a> {
    src: &'a str,
    /// Byte offset where the current lexeme begins.
    start: usize,
    /// Next byte to examine.
    curr: usize,
    line: usize,
    /// Kind recognised by the last `scan_token`, if it produced a token.
    pending: Option<TokenType>,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    /// Scan the whole input, stopping at the first lexical error.
    pub fn scan_all(self) -> Result<Vec<Token<'a>>> {
        self.collect()
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it. Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    /// Consume the next byte if it is `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick `double` when the next byte is `second`, otherwise `single`.
    #[inline(always)]
    fn one_or_two(&mut self, second: u8, double: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(second) {
            double
        } else {
            single
        }
    }

    /// Scan a *single* token starting at `self.curr`. Whitespace and comments
    /// are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'@' => self.pending = Some(TokenType::AT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b'*' => self.pending = Some(TokenType::STAR),

            b'!' => {
                let tt = self.one_or_two(b'=', TokenType::BANG_EQUAL, TokenType::BANG);
                self.pending = Some(tt);
            }

            b'=' => {
                let tt = self.one_or_two(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL);
                self.pending = Some(tt);
            }

            b'<' => {
                let tt = self.one_or_two(b'=', TokenType::LESS_EQUAL, TokenType::LESS);
                self.pending = Some(tt);
            }

            b'>' => {
                let tt = self.one_or_two(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER);
                self.pending = Some(tt);
            }

            b'&' | b'|' => {
                if !self.match_byte(b) {
                    return Err(BrewinError::lex(
                        self.line,
                        format!("Unexpected character: {}", b as char),
                    ));
                }

                let tt = if b == b'&' {
                    TokenType::AND_AND
                } else {
                    TokenType::OR_OR
                };

                self.pending = Some(tt);
            }

            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            b'/' => {
                if self.match_byte(b'/') {
                    if let Some(pos) = memchr(b'\n', &self.bytes()[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                if self.match_byte(b'*') {
                    return self.skip_block_comment();
                }

                self.pending = Some(TokenType::SLASH);
            }

            b'"' => {
                return self.parse_string();
            }

            b'0'..=b'9' => {
                return self.parse_int();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                return Err(BrewinError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        }

        Ok(())
    }

    /// Skip a `/* … */` comment; `self.curr` points just past the opening `/*`.
    fn skip_block_comment(&mut self) -> Result<()> {
        let rest: &[u8] = &self.bytes()[self.curr..];

        let Some(pos) = memmem::find(rest, b"*/") else {
            return Err(BrewinError::lex(self.line, "Unterminated comment."));
        };

        self.line += memchr::memchr_iter(b'\n', &rest[..pos]).count();
        self.curr += pos + 2;

        Ok(())
    }

    /// String literal body; the opening quote is already consumed.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(BrewinError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a decimal integer literal.
    fn parse_int(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: i64 = s.parse::<i64>().map_err(|_| {
            BrewinError::lex(self.line, format!("Integer literal out of range: {}", s))
        })?;

        self.pending = Some(TokenType::INT(n));

        Ok(())
    }

    /// Identifier or keyword.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes()[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let src: &'a str = self.src;
                let lex: &'a str = &src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
