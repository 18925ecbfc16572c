//! Tokens and the buffered token stream of the Tessera Templating Engine.
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
        error::Result,
        file::Coordinate,
    },
    std::{
        collections::VecDeque,
        fmt::{
            Display,
            Formatter,
            Result as FmtResult,
        },
    },
};

/// The lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Data,
    CommentBegin,
    Comment,
    CommentEnd,
    VariableBegin,
    VariableEnd,
    BlockBegin,
    BlockEnd,
    Whitespace,
    Name,
    String,
    Integer,
    Float,
    Operator,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_str(match self {
            Self::Data => "data",
            Self::CommentBegin => "comment begin",
            Self::Comment => "comment",
            Self::CommentEnd => "comment end",
            Self::VariableBegin => "variable begin",
            Self::VariableEnd => "variable end",
            Self::BlockBegin => "block begin",
            Self::BlockEnd => "block end",
            Self::Whitespace => "whitespace",
            Self::Name => "name",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Operator => "operator",
            Self::Eof => "end of template",
        })
    }
}

/// A single lexical token.
///
/// `text` is always the exact source slice, so joining the text of every
/// token of a template gives back its source. The trim flags only carry
/// meaning on [`TokenKind::Data`] tokens.
#[derive(Debug, Clone, PartialEq)]
pub
struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
    pub coord: Coordinate,
    /// Strip leading whitespace (the previous tag ended with `-`).
    pub trim_left: bool,
    /// Strip trailing whitespace (the next tag starts with `-`).
    pub trim_right: bool,
    /// Strip spaces and tabs before the next block tag on its line.
    pub lstrip: bool,
    /// Remove the first newline (the previous tag was a block tag and
    /// `trim_blocks` is on).
    pub strip_newline: bool,
}

impl Token {
    pub(crate)
    fn new<S: Into<String>>(kind: TokenKind, text: S, offset: usize, coord: Coordinate) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
            coord,
            trim_left: false,
            trim_right: false,
            lstrip: false,
            strip_newline: false,
        }
    }

    /// Whether the token is the given operator.
    pub
    fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// Whether the token is the given name or keyword.
    pub
    fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }
}

impl Display for Token {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            TokenKind::Eof => fmtr.write_str("end of template"),
            _ => fmtr.write_str(&self.text),
        }
    }
}

/// A buffered, peekable token stream with single-token backup.
///
/// Whitespace tokens are skipped. Tokens are pulled lazily, so a lexing
/// error surfaces from whichever call first needs the broken token.
pub
struct TokenStream<'a> {
    source: Box<dyn Iterator<Item = Result<Token>> + 'a>,
    buffer: VecDeque<Token>,
    last: Option<Token>,
    end: Option<Token>,
}

impl<'a> TokenStream<'a> {
    /// Stream tokens from a lexer or any other token iterator.
    pub
    fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = Result<Token>> + 'a
    {
        Self {
            source: Box::new(source),
            buffer: VecDeque::new(),
            last: None,
            end: None,
        }
    }

    /// Stream an already collected list of tokens, ending with an `Eof`
    /// token positioned at `end`.
    pub
    fn from_tokens(tokens: Vec<Token>, end: &Token) -> Self {
        let mut tokens = tokens;
        tokens.push(Token::new(TokenKind::Eof, "", end.offset, end.coord));
        Self::new(tokens.into_iter().map(Ok))
    }

    // Leaves at least one token in the buffer on success.
    fn fill(&mut self) -> Result<()> {
        while self.buffer.is_empty() {
            if let Some(end) = &self.end {
                self.buffer.push_back(end.clone());
                break;
            }

            match self.source.next() {
                Some(Ok(token)) => {
                    if token.kind == TokenKind::Whitespace {
                        continue;
                    }
                    if token.kind == TokenKind::Eof {
                        self.end = Some(token.clone());
                    }
                    self.buffer.push_back(token);
                },
                Some(Err(e)) => return Err(e),
                None => {
                    let coord = self.last.as_ref().map(|t| t.coord).unwrap_or_default();
                    let offset = self.last.as_ref().map(|t| t.offset + t.text.len()).unwrap_or(0);
                    self.end = Some(Token::new(TokenKind::Eof, "", offset, coord));
                },
            }
        }

        Ok(())
    }

    /// Look at the next token without consuming it.
    pub
    fn peek(&mut self) -> Result<&Token> {
        self.fill()?;
        Ok(&self.buffer[0])
    }

    /// Consume the next token. At the end of the stream this keeps
    /// returning the `Eof` token.
    pub
    fn next(&mut self) -> Result<Token> {
        self.fill()?;
        let token = self.buffer.remove(0).unwrap_or_else(|| unreachable!());
        self.last = Some(token.clone());
        Ok(token)
    }

    /// Push the last consumed token back onto the stream.
    pub
    fn backup(&mut self) {
        if let Some(token) = self.last.take() {
            self.buffer.push_front(token);
        }
    }

    /// The last consumed token.
    pub
    fn last(&self) -> Option<&Token> {
        self.last.as_ref()
    }

    /// Whether only the `Eof` token remains.
    pub
    fn is_end(&mut self) -> Result<bool> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }
}
