//! A minimal indentation-sensitive tokenizer for the YAML subset this
//! crate understands: scalars, quoted strings, numbers, block and
//! inline lists, block maps, and `#` comments. Not a general YAML
//! parser — just enough for flat server configuration files.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Text(String),
    StringLit(String),
    Number(u64),
    Colon,
    Dash,
    LBracket,
    RBracket,
    Comma,
    Newline,
    Indent(usize),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text(s) => write!(f, "{s}"),
            TokenKind::StringLit(s) => write!(f, "\"{s}\""),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dash => write!(f, "-"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Newline => write!(f, "\\n"),
            TokenKind::Indent(n) => write!(f, "{:1$}", "", n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.chars().peekable(), line: 1, col: 1 }
    }

    fn advance(&mut self) {
        if let Some(c) = self.input.next() {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.input.peek()
    }

    fn loc(&self) -> Loc {
        Loc { line: self.line, col: self.col }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        let mut at_line_start = true;

        while self.peek().is_some() {
            if at_line_start && *self.peek().unwrap() != '\n' {
                self.lex_indent(&mut tokens);
                at_line_start = false;
                continue;
            }

            let loc = self.loc();
            let c = *self.peek().unwrap();

            if c == '#' {
                self.skip_comment();
                continue;
            }

            match c {
                ':' => {
                    tokens.push(Token { kind: TokenKind::Colon, loc });
                    self.advance();
                }
                '-' => self.lex_dash(&mut tokens, loc),
                '[' => {
                    tokens.push(Token { kind: TokenKind::LBracket, loc });
                    self.advance();
                }
                ']' => {
                    tokens.push(Token { kind: TokenKind::RBracket, loc });
                    self.advance();
                }
                ',' => {
                    tokens.push(Token { kind: TokenKind::Comma, loc });
                    self.advance();
                }
                '\n' => {
                    tokens.push(Token { kind: TokenKind::Newline, loc });
                    self.advance();
                    at_line_start = true;
                }
                q if q == '"' || q == '\'' => self.lex_quoted(&mut tokens, loc, q),
                c if c.is_whitespace() => self.advance(),
                _ => self.lex_text_or_number(&mut tokens, loc)?,
            }
        }

        Ok(tokens)
    }

    fn lex_indent(&mut self, tokens: &mut Vec<Token>) {
        let loc = self.loc();
        let mut spaces = 0;
        while let Some(&w) = self.peek() {
            match w {
                ' ' => {
                    spaces += 1;
                    self.advance();
                }
                '\t' => {
                    spaces += 4;
                    self.advance();
                }
                _ => break,
            }
        }
        if let Some(&next) = self.peek() {
            if next != '\n' && next != '#' {
                tokens.push(Token { kind: TokenKind::Indent(spaces), loc });
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_dash(&mut self, tokens: &mut Vec<Token>, loc: Loc) {
        self.advance();
        let is_separator = match self.peek() {
            Some(n) => n.is_whitespace(),
            None => true,
        };
        if is_separator {
            tokens.push(Token { kind: TokenKind::Dash, loc });
            return;
        }
        let mut val = String::from("-");
        while let Some(&n) = self.peek() {
            if n.is_alphanumeric() || "._-/".contains(n) {
                val.push(n);
                self.advance();
            } else {
                break;
            }
        }
        tokens.push(Token { kind: TokenKind::Text(val), loc });
    }

    fn lex_quoted(&mut self, tokens: &mut Vec<Token>, loc: Loc, quote: char) {
        self.advance();
        let mut val = String::new();
        while let Some(&c) = self.peek() {
            if c == quote {
                self.advance();
                break;
            }
            val.push(c);
            self.advance();
        }
        tokens.push(Token { kind: TokenKind::StringLit(val), loc });
    }

    fn lex_text_or_number(&mut self, tokens: &mut Vec<Token>, loc: Loc) -> Result<(), String> {
        let mut val = String::new();
        while let Some(&n) = self.peek() {
            if n.is_alphanumeric() || "._-/".contains(n) {
                val.push(n);
                self.advance();
            } else {
                break;
            }
        }
        if val.is_empty() {
            let c = *self.peek().unwrap();
            return Err(format!("unexpected character '{c}' at {}", self.loc()));
        }
        if let Ok(num) = val.parse::<u64>() {
            tokens.push(Token { kind: TokenKind::Number(num), loc });
        } else {
            tokens.push(Token { kind: TokenKind::Text(val), loc });
        }
        Ok(())
    }
}
