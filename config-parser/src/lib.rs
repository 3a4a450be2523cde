//! Hand-rolled parser for the small YAML subset used by this server's
//! optional configuration overlay: scalars, block/inline lists, and
//! block maps, indentation-delimited. No `serde`, no `serde_yaml` — the
//! whole stack is a lexer, a recursive-descent parser driven by
//! indentation bookkeeping, and a `FromYaml` trait that struct fields
//! implement either primitively or via `#[derive(FromYaml)]` from the
//! `config-parser-derive` crate.

mod lexer;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

pub use lexer::{Lexer, Loc, Token, TokenKind};

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub loc: Option<Loc>,
    pub context: Vec<String>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>, loc: Option<Loc>) -> Self {
        Self { message: message.into(), loc, context: Vec::new() }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "\x1b[31mconfig error\x1b[0m at {loc}: {}", self.message)?,
            None => write!(f, "\x1b[31mconfig error\x1b[0m: {}", self.message)?,
        }
        for ctx in self.context.iter().rev() {
            write!(f, "\n  while parsing {ctx}")?;
        }
        Ok(())
    }
}

impl Error for ConfigError {}

pub type ParseResult<T> = Result<T, ConfigError>;

/// Cursor over a token stream with the indentation helpers the
/// block-map/block-list grammar needs.
pub struct ConfigParser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl ConfigParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.cursor).map(|t| &t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.cursor + offset).map(|t| &t.kind)
    }

    fn peek_loc(&self) -> Option<Loc> {
        self.tokens.get(self.cursor).map(|t| t.loc)
    }

    fn next_token(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.cursor).cloned();
        if t.is_some() {
            self.cursor += 1;
        }
        t
    }

    fn consume(&mut self, expected: std::mem::Discriminant<TokenKind>) -> ParseResult<Token> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(t) if std::mem::discriminant(&t.kind) == expected => Ok(t),
            Some(t) => Err(ConfigError::new(format!("unexpected token `{}`", t.kind), Some(t.loc))),
            None => Err(ConfigError::new("unexpected end of input", loc)),
        }
    }

    fn consume_key(&mut self) -> ParseResult<String> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Text(s), .. }) => Ok(s),
            Some(Token { kind: TokenKind::StringLit(s), .. }) => Ok(s),
            Some(t) => Err(ConfigError::new(format!("expected a key, found `{}`", t.kind), Some(t.loc))),
            None => Err(ConfigError::new("expected a key", loc)),
        }
    }

    /// Skip blank lines (pure Newline tokens with nothing else on them).
    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), Some(TokenKind::Newline)) {
            self.cursor += 1;
        }
    }

    fn skip_newlines_only(&mut self) {
        self.skip_newlines();
    }

    fn parse_scalar_string(&mut self) -> ParseResult<String> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Text(s), .. }) => Ok(s),
            Some(Token { kind: TokenKind::StringLit(s), .. }) => Ok(s),
            Some(Token { kind: TokenKind::Number(n), .. }) => Ok(n.to_string()),
            Some(t) => Err(ConfigError::new(format!("expected a scalar value, found `{}`", t.kind), Some(t.loc))),
            None => Err(ConfigError::new("expected a scalar value", loc)),
        }
    }

    fn parse_scalar_number(&mut self) -> ParseResult<u64> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Number(n), .. }) => Ok(n),
            Some(Token { kind: TokenKind::Text(s), loc }) => s
                .parse::<u64>()
                .map_err(|_| ConfigError::new(format!("expected a number, found `{s}`"), Some(loc))),
            Some(t) => Err(ConfigError::new(format!("expected a number, found `{}`", t.kind), Some(t.loc))),
            None => Err(ConfigError::new("expected a number", loc)),
        }
    }

    /// Skip whatever value follows a `key:` that a caller doesn't know
    /// how to interpret, including nested blocks at deeper indentation.
    fn skip_value(&mut self, min_indent: usize) -> ParseResult<()> {
        if matches!(self.peek_kind(), Some(TokenKind::Newline)) {
            self.cursor += 1;
            loop {
                self.skip_newlines();
                match self.peek_kind() {
                    Some(TokenKind::Indent(n)) if *n > min_indent => {
                        self.cursor += 1;
                        while !matches!(self.peek_kind(), Some(TokenKind::Newline) | None) {
                            self.cursor += 1;
                        }
                        if matches!(self.peek_kind(), Some(TokenKind::Newline)) {
                            self.cursor += 1;
                        }
                    }
                    _ => break,
                }
            }
            return Ok(());
        }
        while !matches!(self.peek_kind(), Some(TokenKind::Newline) | None) {
            self.cursor += 1;
        }
        Ok(())
    }

    /// Look at the indentation of the upcoming line without consuming
    /// it, deciding whether the current block continues. `struct_indent`
    /// records the level the first field of this block established, so
    /// later fields at a different level are caught as malformed.
    fn check_indentation(
        &mut self,
        min_indent: usize,
        struct_indent: &mut Option<usize>,
    ) -> ParseResult<bool> {
        let (indent, loc) = match self.peek_kind() {
            Some(TokenKind::Indent(n)) => (*n, self.peek_loc().unwrap()),
            Some(_) => (0, self.peek_loc().unwrap()),
            None => return Ok(false),
        };

        if indent <= min_indent {
            return Ok(false);
        }

        match struct_indent {
            Some(expected) if *expected != indent => Err(ConfigError::new(
                format!("inconsistent indentation: expected {expected} spaces, found {indent}"),
                Some(loc),
            )),
            Some(_) => Ok(true),
            None => {
                *struct_indent = Some(indent);
                Ok(true)
            }
        }
    }

    fn is_end_of_block(&self, min_indent: usize) -> bool {
        match self.peek_kind() {
            None => true,
            Some(TokenKind::Indent(n)) => *n <= min_indent,
            Some(_) => min_indent > 0,
        }
    }

    /// Consumes the leading Indent token for a block line, if present.
    fn enter_line(&mut self) {
        if matches!(self.peek_kind(), Some(TokenKind::Indent(_))) {
            self.cursor += 1;
        }
    }

    /// Drives a `key: value` block for struct derives. `handle_field` is
    /// called with each key found; it should parse and stash the value,
    /// returning `Ok(true)` if it recognized the key or `Ok(false)` if
    /// the value should be skipped as unknown.
    pub fn parse_struct(
        &mut self,
        min_indent: usize,
        mut handle_field: impl FnMut(&mut ConfigParser, &str) -> ParseResult<bool>,
    ) -> ParseResult<()> {
        if matches!(self.peek_kind(), Some(TokenKind::Newline)) {
            self.cursor += 1;
        }
        self.skip_newlines();

        let mut struct_indent = None;
        loop {
            if !self.check_indentation(min_indent, &mut struct_indent)? {
                break;
            }
            self.enter_line();
            if self.is_end_of_block(min_indent) {
                break;
            }
            let key = self.consume_key()?;
            self.consume(std::mem::discriminant(&TokenKind::Colon))?;
            let recognized = handle_field(self, &key).map_err(|e| e.with_context(format!("field `{key}`")))?;
            if !recognized {
                self.skip_value(struct_indent.unwrap_or(min_indent))?;
            }
            self.skip_newlines();
        }
        Ok(())
    }

    fn parse_inline_list<T: FromYaml>(&mut self) -> ParseResult<Vec<T>> {
        self.consume(std::mem::discriminant(&TokenKind::LBracket))?;
        let mut items = Vec::new();
        loop {
            if matches!(self.peek_kind(), Some(TokenKind::RBracket)) {
                self.cursor += 1;
                break;
            }
            items.push(T::from_yaml(self, 0)?);
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.cursor += 1;
                }
                Some(TokenKind::RBracket) => {
                    self.cursor += 1;
                    break;
                }
                _ => {
                    return Err(ConfigError::new("expected `,` or `]` in inline list", self.peek_loc()));
                }
            }
        }
        Ok(items)
    }

    fn parse_block_list<T: FromYaml>(&mut self, min_indent: usize) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        let mut list_indent = None;
        loop {
            if !self.check_indentation(min_indent, &mut list_indent)? {
                break;
            }
            self.enter_line();
            if !matches!(self.peek_kind(), Some(TokenKind::Dash)) {
                break;
            }
            self.cursor += 1;
            items.push(T::from_yaml(self, list_indent.unwrap())?);
            self.skip_newlines();
        }
        Ok(items)
    }

}

/// Implemented by anything that can be parsed out of this YAML subset,
/// either primitively (see the impls below) or via
/// `#[derive(config_parser_derive::FromYaml)]` on a plain struct.
pub trait FromYaml: Sized {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self>;

    fn from_str(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input)
            .tokenize()
            .map_err(|e| ConfigError::new(e, None))?;
        let mut parser = ConfigParser::new(tokens);
        parser.skip_newlines_only();
        let value = Self::from_yaml(&mut parser, 0)?;
        parser.skip_newlines_only();
        if parser.peek_kind().is_some() {
            return Err(ConfigError::new(
                format!("unexpected trailing content: `{}`", parser.peek_kind().unwrap()),
                parser.peek_loc(),
            ));
        }
        Ok(value)
    }
}

impl FromYaml for String {
    fn from_yaml(parser: &mut ConfigParser, _min_indent: usize) -> ParseResult<Self> {
        parser.parse_scalar_string()
    }
}

impl FromYaml for u16 {
    fn from_yaml(parser: &mut ConfigParser, _min_indent: usize) -> ParseResult<Self> {
        let loc = parser.peek_loc();
        let n = parser.parse_scalar_number()?;
        u16::try_from(n).map_err(|_| ConfigError::new(format!("{n} does not fit in a u16"), loc))
    }
}

impl FromYaml for u32 {
    fn from_yaml(parser: &mut ConfigParser, _min_indent: usize) -> ParseResult<Self> {
        let loc = parser.peek_loc();
        let n = parser.parse_scalar_number()?;
        u32::try_from(n).map_err(|_| ConfigError::new(format!("{n} does not fit in a u32"), loc))
    }
}

impl FromYaml for usize {
    fn from_yaml(parser: &mut ConfigParser, _min_indent: usize) -> ParseResult<Self> {
        Ok(parser.parse_scalar_number()? as usize)
    }
}

impl FromYaml for bool {
    fn from_yaml(parser: &mut ConfigParser, _min_indent: usize) -> ParseResult<Self> {
        let s = parser.parse_scalar_string()?;
        match s.as_str() {
            "true" | "on" | "yes" => Ok(true),
            "false" | "off" | "no" => Ok(false),
            other => Err(ConfigError::new(format!("expected a boolean, found `{other}`"), None)),
        }
    }
}

impl<T: FromYaml> FromYaml for Option<T> {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        T::from_yaml(parser, min_indent).map(Some)
    }
}

impl<T: FromYaml> FromYaml for Vec<T> {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        if matches!(parser.peek_kind(), Some(TokenKind::LBracket)) {
            return parser.parse_inline_list();
        }
        if matches!(parser.peek_kind(), Some(TokenKind::Newline)) {
            parser.cursor += 1;
        }
        parser.skip_newlines();
        parser.parse_block_list(min_indent)
    }
}

impl<K, V> FromYaml for HashMap<K, V>
where
    K: FromStr + Eq + Hash,
    K::Err: fmt::Display,
    V: FromYaml,
{
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        let mut map = HashMap::new();
        if matches!(parser.peek_kind(), Some(TokenKind::Newline)) {
            parser.cursor += 1;
        }
        parser.skip_newlines();

        let mut map_indent = None;
        loop {
            if !parser.check_indentation(min_indent, &mut map_indent)? {
                break;
            }
            parser.enter_line();
            if parser.is_end_of_block(min_indent) {
                break;
            }
            let loc = parser.peek_loc();
            let raw_key = parser.consume_key()?;
            let key = K::from_str(&raw_key)
                .map_err(|e| ConfigError::new(format!("invalid map key `{raw_key}`: {e}"), loc))?;
            parser.consume(std::mem::discriminant(&TokenKind::Colon))?;
            let value = V::from_yaml(parser, map_indent.unwrap())
                .map_err(|e| e.with_context(format!("key `{raw_key}`")))?;
            if map.contains_key(&key) {
                return Err(ConfigError::new(format!("duplicate key `{raw_key}`"), loc));
            }
            map.insert(key, value);
            parser.skip_newlines();
        }

        Ok(map)
    }
}
