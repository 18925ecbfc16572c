//! The tokenizer of the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        config::Config,
        error::{
            Error,
            Result,
        },
        file::Coordinate,
        token::{
            Token,
            TokenKind,
        },
    },
    std::collections::VecDeque,
};

const TRIM: char = '-';
const KEEP: char = '+';
const ESCAPE: char = '\\';
const RAW: &str = "raw";
const ENDRAW: &str = "endraw";

const OPERATORS_2: [&str; 6] = [ "**", "//", "==", "!=", "<=", ">=", ];
const OPERATORS_1: [char; 19] = [
    '+', '-', '*', '/', '%', '<', '>', '=', '(', ')', '[', ']', '{', '}',
    '.', ',', ':', '|', '~',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Comment,
    Variable,
    Block,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Comment,
    Variable,
    Block,
}

/// Turns template source into [`Token`]s.
///
/// The lexer is a lazy iterator. It yields a final [`TokenKind::Eof`]
/// token and stops after the first error.
///
/// ```rust
/// use tessera_core::{ Config, Lexer, TokenKind };
///
/// let config = Config::default();
/// let kinds = Lexer::new("inline", "a{{ b }}", &config)
///     .map(|t| t.unwrap().kind)
///     .collect::<Vec<TokenKind>>();
///
/// assert_eq!(kinds, vec![
///     TokenKind::Data,
///     TokenKind::VariableBegin,
///     TokenKind::Whitespace,
///     TokenKind::Name,
///     TokenKind::Whitespace,
///     TokenKind::VariableEnd,
///     TokenKind::Eof,
/// ]);
/// ```
pub
struct Lexer<'a> {
    name: String,
    input: &'a str,
    config: &'a Config,
    pos: usize,
    coord: Coordinate,
    state: State,
    delimiters: Vec<char>,
    pending: VecDeque<Token>,
    trim_next: bool,
    after_block: bool,
    block_words: Vec<String>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub
    fn new<S: Into<String>>(name: S, input: &'a str, config: &'a Config) -> Self {
        Self {
            name: name.into(),
            input,
            config,
            pos: 0,
            coord: Coordinate::default(),
            state: State::Data,
            delimiters: Vec::new(),
            pending: VecDeque::new(),
            trim_next: false,
            after_block: false,
            block_words: Vec::new(),
            done: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let text = &self.input[self.pos..self.pos + len];
        let token = Token::new(kind, text, self.pos, self.coord);
        self.coord.advance(text);
        self.pos += len;
        self.pending.push_back(token.clone());
        token
    }

    fn emit_data(&mut self, len: usize, next_modifier: Option<char>, next_is_block: bool) {
        if len == 0 {
            self.trim_next = false;
            self.after_block = false;
            return;
        }

        let text = &self.input[self.pos..self.pos + len];
        let mut token = Token::new(TokenKind::Data, text, self.pos, self.coord);
        token.trim_left = self.trim_next;
        token.strip_newline = self.after_block && self.config.trim_blocks;
        token.trim_right = next_modifier == Some(TRIM);
        token.lstrip = next_is_block &&
            self.config.lstrip_blocks &&
            next_modifier != Some(KEEP);

        self.coord.advance(text);
        self.pos += len;
        self.trim_next = false;
        self.after_block = false;
        self.pending.push_back(token);
    }

    fn begin_delimiter(&self, region: Region) -> &'a str {
        match region {
            Region::Comment => &self.config.comment_start_string,
            Region::Variable => &self.config.variable_start_string,
            Region::Block => &self.config.block_start_string,
        }
    }

    fn end_delimiter(&self, region: Region) -> &'a str {
        match region {
            Region::Comment => &self.config.comment_end_string,
            Region::Variable => &self.config.variable_end_string,
            Region::Block => &self.config.block_end_string,
        }
    }

    // The earliest start delimiter in the remaining input. On a tie the
    // longest delimiter wins.
    fn find_begin(&self) -> Option<(usize, Region)> {
        let rest = self.rest();
        let mut found: Option<(usize, usize, Region)> = None;

        for region in [ Region::Comment, Region::Variable, Region::Block, ] {
            let delimiter = self.begin_delimiter(region);
            if let Some(idx) = rest.find(delimiter) {
                let better = match found {
                    None => true,
                    Some((f_idx, f_len, _)) => idx < f_idx ||
                        (idx == f_idx && delimiter.len() > f_len),
                };

                if better {
                    found = Some((idx, delimiter.len(), region));
                }
            }
        }

        found.map(|(idx, _, region)| (idx, region))
    }

    fn modifier_at(&self, offset: usize) -> Option<char> {
        match self.input[offset..].chars().next() {
            Some(TRIM) => Some(TRIM),
            Some(KEEP) => Some(KEEP),
            _ => None,
        }
    }

    fn lex_data(&mut self) -> Result<()> {
        let (idx, region) = match self.find_begin() {
            Some(found) => found,
            None => {
                let len = self.rest().len();
                self.emit_data(len, None, false);
                self.emit(TokenKind::Eof, 0);
                self.done = true;
                return Ok(());
            },
        };

        let begin = self.begin_delimiter(region);
        let mut modifier = self.modifier_at(self.pos + idx + begin.len());
        if region == Region::Variable && modifier == Some(KEEP) {
            modifier = None;
        }

        self.emit_data(idx, modifier, region != Region::Variable);

        let len = begin.len() + modifier.map(|m| m.len_utf8()).unwrap_or(0);
        match region {
            Region::Comment => {
                self.emit(TokenKind::CommentBegin, len);
                self.state = State::Comment;
            },
            Region::Variable => {
                self.emit(TokenKind::VariableBegin, len);
                self.state = State::Variable;
            },
            Region::Block => {
                self.emit(TokenKind::BlockBegin, len);
                self.block_words.clear();
                self.state = State::Block;
            },
        }

        Ok(())
    }

    fn lex_comment(&mut self) -> Result<()> {
        let end = self.end_delimiter(Region::Comment);
        let idx = match self.rest().find(end) {
            Some(idx) => idx,
            None => {
                return Err(Error::UnterminatedTag(
                    "comment".to_owned(),
                    self.coord,
                    self.name.clone(),
                ));
            },
        };

        let body = &self.rest()[..idx];
        let trim = body.ends_with(TRIM);
        let body_len = if trim { idx - TRIM.len_utf8() } else { idx };

        if body_len > 0 {
            self.emit(TokenKind::Comment, body_len);
        }

        let end_len = end.len() + if trim { TRIM.len_utf8() } else { 0 };
        self.emit(TokenKind::CommentEnd, end_len);

        self.trim_next = trim;
        self.after_block = true;
        self.state = State::Data;
        Ok(())
    }

    fn lex_raw(&mut self) -> Result<()> {
        let begin = self.begin_delimiter(Region::Block);
        let end = self.end_delimiter(Region::Block);

        let mut search = self.pos;
        loop {
            let idx = match self.input[search..].find(begin) {
                Some(idx) => search + idx,
                None => {
                    return Err(Error::UnterminatedTag(
                        RAW.to_owned(),
                        self.coord,
                        self.name.clone(),
                    ));
                },
            };

            let after = idx + begin.len();
            let modifier = self.modifier_at(after);
            let inner = &self.input[after + modifier.map(|m| m.len_utf8()).unwrap_or(0)..];
            let inner_trimmed = inner.trim_start();

            if let Some(tail) = inner_trimmed.strip_prefix(ENDRAW) {
                let tail = tail.trim_start();
                let tail = tail.strip_prefix(TRIM).unwrap_or(tail);
                if tail.starts_with(end) {
                    let len = idx - self.pos;
                    self.emit_data(len, modifier, true);
                    self.state = State::Data;
                    return Ok(());
                }
            }

            search = after;
        }
    }

    fn lex_expression(&mut self, region: Region) -> Result<()> {
        if self.eof() {
            if let Some(expected) = self.delimiters.last() {
                return Err(Error::UnclosedDelimiter(*expected, self.coord, self.name.clone()));
            }

            let tag = match region {
                Region::Variable => "variable",
                _ => "block",
            };
            return Err(Error::UnterminatedTag(tag.to_owned(), self.coord, self.name.clone()));
        }

        let rest = self.rest();

        if self.delimiters.is_empty() {
            let end = self.end_delimiter(region);
            let trimmed = rest.strip_prefix(TRIM).filter(|r| r.starts_with(end));
            let kept = rest.strip_prefix(KEEP)
                .filter(|r| region == Region::Block && r.starts_with(end));

            if rest.starts_with(end) || trimmed.is_some() || kept.is_some() {
                let modifier_len = if trimmed.is_some() || kept.is_some() { 1 } else { 0 };
                let kind = match region {
                    Region::Variable => TokenKind::VariableEnd,
                    _ => TokenKind::BlockEnd,
                };
                self.emit(kind, end.len() + modifier_len);

                self.trim_next = trimmed.is_some();
                self.after_block = region == Region::Block && kept.is_none();
                self.state = if region == Region::Block &&
                    self.block_words.len() == 1 &&
                    self.block_words[0] == RAW
                {
                    State::Raw
                }
                else {
                    State::Data
                };

                return Ok(());
            }
        }

        let c = match rest.chars().next() {
            Some(c) => c,
            None => return Ok(()),
        };

        if c.is_whitespace() {
            let len = rest.find(|ch: char| !ch.is_whitespace()).unwrap_or(rest.len());
            self.emit(TokenKind::Whitespace, len);
        }
        else if c == '"' || c == '\'' {
            self.lex_string(c)?;
        }
        else if c.is_ascii_digit() {
            self.lex_number()?;
        }
        else if c.is_alphabetic() || c == '_' {
            let len = rest.find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            let token = self.emit(TokenKind::Name, len);
            if region == Region::Block {
                self.block_words.push(token.text);
            }
        }
        else if let Some(op) = OPERATORS_2.iter().find(|op| rest.starts_with(**op)) {
            let token = self.emit(TokenKind::Operator, op.len());
            if region == Region::Block {
                self.block_words.push(token.text);
            }
        }
        else if OPERATORS_1.contains(&c) {
            match c {
                '(' => self.delimiters.push(')'),
                '[' => self.delimiters.push(']'),
                '{' => self.delimiters.push('}'),
                ')' | ']' | '}' => {
                    if self.delimiters.last() != Some(&c) {
                        return Err(Error::UnexpectedDelimiter(c, self.coord, self.name.clone()));
                    }
                    self.delimiters.pop();
                },
                _ => (),
            }

            let token = self.emit(TokenKind::Operator, c.len_utf8());
            if region == Region::Block {
                self.block_words.push(token.text);
            }
        }
        else {
            return Err(Error::UnexpectedCharacter(c, self.coord, self.name.clone()));
        }

        Ok(())
    }

    fn lex_string(&mut self, quote: char) -> Result<()> {
        let rest = self.rest();
        let mut escaped = false;

        for (idx, c) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
            }
            else if c == ESCAPE {
                escaped = true;
            }
            else if c == quote {
                self.emit(TokenKind::String, idx + c.len_utf8());
                self.block_words.push(String::new());
                return Ok(());
            }
        }

        Err(Error::UnterminatedString(self.coord, self.name.clone()))
    }

    fn lex_number(&mut self) -> Result<()> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let digits = |from: usize| {
            from + bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
        };

        let mut len = digits(0);
        let mut kind = TokenKind::Integer;

        if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).map_or(false, u8::is_ascii_digit) {
            len = digits(len + 1);
            kind = TokenKind::Float;

            if bytes.get(len) == Some(&b'.') {
                let bad_len = len + 1 + bytes[len + 1..].iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'.')
                    .count();
                return Err(Error::InvalidNumber(
                    rest[..bad_len].to_owned(),
                    self.coord,
                    self.name.clone(),
                ));
            }
        }

        if matches!(bytes.get(len), Some(b'e') | Some(b'E')) {
            let sign = matches!(bytes.get(len + 1), Some(b'+') | Some(b'-')) as usize;
            if bytes.get(len + 1 + sign).map_or(false, u8::is_ascii_digit) {
                len = digits(len + 1 + sign);
                kind = TokenKind::Float;
            }
        }

        self.emit(kind, len);
        self.block_words.push(String::new());
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        match self.state {
            State::Data => self.lex_data(),
            State::Comment => self.lex_comment(),
            State::Variable => self.lex_expression(Region::Variable),
            State::Block => self.lex_expression(Region::Block),
            State::Raw => self.lex_raw(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }

            if self.done {
                return None;
            }

            if let Err(e) = self.step() {
                self.done = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Tokenize a whole source at once.
pub
fn tokenize<S: Into<String>>(name: S, input: &str, config: &Config) -> Result<Vec<Token>> {
    Lexer::new(name, input, config).collect()
}
