// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

//! The figure directive embedded in code cells:
//!
//! ```text
//! Image("path/to/figure.png", metadata={"ID": "fig1", "caption": "Load path"})
//! ```
//!
//! The metadata argument is read as a literal. Only strings (with the usual
//! prefixes, triple quotes, escapes and implicit concatenation), numbers,
//! `True`/`False`/`None`, lists, tuples and mappings are accepted; nothing is
//! ever evaluated.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_LITERAL_DEPTH: usize = 32;

#[derive(Clone, Debug, PartialEq)]
pub struct FigureDirective {
    pub path: String,
    pub metadata: DirectiveMetadata,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DirectiveMetadata {
    Absent,
    Parsed(Map<String, Value>),
    Malformed(LiteralError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Finds the first well-formed `call("path"...)` occurrence in `source`.
pub fn find_figure_directive(source: &str, call: &str) -> Option<FigureDirective> {
    if call.is_empty() {
        return None;
    }
    source
        .match_indices(call)
        .filter(|(start, _)| is_call_boundary(source, *start))
        .find_map(|(start, _)| parse_directive_at(&source[start + call.len()..]))
}

fn is_call_boundary(source: &str, start: usize) -> bool {
    source[..start]
        .chars()
        .next_back()
        .is_none_or(|ch| !(ch.is_alphanumeric() || ch == '_'))
}

fn parse_directive_at(rest: &str) -> Option<FigureDirective> {
    let rest = rest.strip_prefix('(')?;
    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|ch| matches!(ch, '"' | '\''))?;
    let body = &rest[quote.len_utf8()..];
    let end = body.find(['"', '\''])?;
    if end == 0 {
        return None;
    }
    let path = body[..end].to_string();
    let after_path = &body[end + 1..];

    Some(FigureDirective {
        path,
        metadata: parse_metadata_argument(after_path),
    })
}

fn parse_metadata_argument(rest: &str) -> DirectiveMetadata {
    let Some(rest) = rest.trim_start().strip_prefix(',') else {
        return DirectiveMetadata::Absent;
    };
    let Some(rest) = rest.trim_start().strip_prefix("metadata") else {
        return DirectiveMetadata::Absent;
    };
    let Some(rest) = rest.trim_start().strip_prefix('=') else {
        return DirectiveMetadata::Absent;
    };
    let rest = rest.trim_start();
    if !rest.starts_with('{') {
        return DirectiveMetadata::Absent;
    }

    match LiteralParser::new(rest).parse_mapping(0) {
        Ok(map) => DirectiveMetadata::Parsed(map),
        Err(err) => DirectiveMetadata::Malformed(err),
    }
}

#[cfg(test)]
fn parse_mapping_literal(text: &str) -> Result<Map<String, Value>, LiteralError> {
    let mut parser = LiteralParser::new(text);
    let map = parser.parse_mapping(0)?;
    parser.skip_trivia();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(map)
}

struct LiteralParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else if ch == '#' {
                // Comment until end of line.
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_LITERAL_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        self.skip_trivia();
        if self.at_string() {
            return self.parse_string().map(Value::String);
        }
        match self.peek() {
            Some('{') => self.parse_mapping(depth).map(Value::Object),
            Some('[') => self.parse_sequence(depth, '[', ']'),
            Some('(') => self.parse_sequence(depth, '(', ')'),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                self.parse_number()
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_keyword(),
            Some(ch) => Err(self.error(format!("unexpected character `{ch}`"))),
            None => Err(self.error("unexpected end of literal")),
        }
    }

    fn parse_mapping(&mut self, depth: usize) -> Result<Map<String, Value>, LiteralError> {
        self.skip_trivia();
        if !self.eat('{') {
            return Err(self.error("expected `{`"));
        }
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(map);
            }
            let key = self.parse_key()?;
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.error("expected `:` after mapping key"));
            }
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(map);
            }
            return Err(self.error("expected `,` or `}` in mapping"));
        }
    }

    fn parse_key(&mut self) -> Result<String, LiteralError> {
        if self.at_string() {
            return self.parse_string();
        }
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                let value = self.parse_number()?;
                Ok(value.to_string())
            }
            _ => Err(self.error("mapping keys must be strings or numbers")),
        }
    }

    fn parse_sequence(
        &mut self,
        depth: usize,
        open: char,
        close: char,
    ) -> Result<Value, LiteralError> {
        self.eat(open);
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            return Err(self.error(format!("expected `,` or `{close}` in sequence")));
        }
    }

    fn string_prefix_len(&self) -> Option<usize> {
        let rest = &self.text[self.pos..];
        let prefix_len = rest
            .bytes()
            .take_while(|byte| matches!(byte, b'r' | b'R' | b'b' | b'B' | b'u' | b'U'))
            .count();
        if !matches!(rest.as_bytes().get(prefix_len), Some(b'"' | b'\'')) {
            return None;
        }
        let prefix = rest[..prefix_len].to_ascii_lowercase();
        matches!(prefix.as_str(), "" | "r" | "u" | "b" | "br" | "rb").then_some(prefix_len)
    }

    fn at_string(&self) -> bool {
        self.string_prefix_len().is_some()
    }

    fn at_doubled(&self, quote: char) -> bool {
        let mut rest = self.text[self.pos..].chars();
        rest.next() == Some(quote) && rest.next() == Some(quote)
    }

    // Adjacent literals concatenate.
    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let mut out = self.parse_string_piece()?;
        loop {
            let resume = self.pos;
            self.skip_trivia();
            if !self.at_string() {
                self.pos = resume;
                return Ok(out);
            }
            out.push_str(&self.parse_string_piece()?);
        }
    }

    fn parse_string_piece(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let Some(prefix_len) = self.string_prefix_len() else {
            return Err(self.error("expected string"));
        };
        let prefix = self.text[start..start + prefix_len].to_ascii_lowercase();
        let raw = prefix.contains('r');
        let bytes = prefix.contains('b');
        self.pos += prefix_len;

        let Some(quote) = self.bump() else {
            return Err(self.error("expected string"));
        };
        let triple = self.at_doubled(quote);
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(unterminated(start));
            };
            match ch {
                '\n' if !triple => return Err(unterminated(start)),
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.parse_escape(&mut out, bytes)?,
                ch if ch == quote && !triple => return Ok(out),
                ch if ch == quote && self.at_doubled(quote) => {
                    self.pos += 2;
                    return Ok(out);
                }
                ch => out.push(ch),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String, bytes: bool) -> Result<(), LiteralError> {
        let escape_start = self.pos - 1;
        let Some(ch) = self.bump() else {
            return Err(unterminated(escape_start));
        };
        match ch {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(ch),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut code = ch.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    let Some(digit) = self.peek().and_then(|ch| ch.to_digit(8)) else {
                        break;
                    };
                    code = code * 8 + digit;
                    self.pos += 1;
                }
                out.push(code_point(code, escape_start)?);
            }
            'x' => {
                let code = self.parse_hex_digits(2, escape_start)?;
                out.push(code_point(code, escape_start)?);
            }
            'u' if !bytes => {
                let code = self.parse_hex_digits(4, escape_start)?;
                out.push(code_point(code, escape_start)?);
            }
            'U' if !bytes => {
                let code = self.parse_hex_digits(8, escape_start)?;
                out.push(code_point(code, escape_start)?);
            }
            'N' if !bytes => out.push(self.parse_named_escape(escape_start)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_digits(&mut self, count: usize, escape_start: usize) -> Result<u32, LiteralError> {
        let code = self.text[self.pos..]
            .get(..count)
            .filter(|digits| digits.chars().all(|ch| ch.is_ascii_hexdigit()))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok());
        let Some(code) = code else {
            return Err(LiteralError {
                offset: escape_start,
                message: format!("truncated escape: expected {count} hex digits"),
            });
        };
        self.pos += count;
        Ok(code)
    }

    fn parse_named_escape(&mut self, escape_start: usize) -> Result<char, LiteralError> {
        let name = self.text[self.pos..].strip_prefix('{').and_then(|rest| {
            let end = rest.find(['}', '\n'])?;
            rest[end..].starts_with('}').then(|| &rest[..end])
        });
        let Some(name) = name else {
            return Err(LiteralError {
                offset: escape_start,
                message: "malformed `\\N{...}` escape".to_string(),
            });
        };
        let ch = unicode_names2::character(name).ok_or_else(|| LiteralError {
            offset: escape_start,
            message: format!("unknown character name `{name}`"),
        })?;
        self.pos += name.len() + 2;
        Ok(ch)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.pos += 1;
                    }
                    continue;
                }
                _ => break,
            }
            self.pos += 1;
        }

        let literal = self.text[start..self.pos].replace('_', "");
        let literal = literal.strip_prefix('+').unwrap_or(&literal);
        if !is_float && let Ok(int) = literal.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError {
                offset: start,
                message: format!("invalid number `{literal}`"),
            })
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        match &self.text[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            name => Err(LiteralError {
                offset: start,
                message: format!("`{name}` is not a literal"),
            }),
        }
    }
}

fn unterminated(start: usize) -> LiteralError {
    LiteralError {
        offset: start,
        message: "unterminated string".to_string(),
    }
}

fn code_point(code: u32, escape_start: usize) -> Result<char, LiteralError> {
    char::from_u32(code).ok_or_else(|| LiteralError {
        offset: escape_start,
        message: format!("escape does not name a character: U+{code:04X}"),
    })
}
