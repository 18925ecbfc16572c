//! Source positions and file reading for the Tessera Templating Engine.
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
    crate::error::{
        Error,
        Result,
    },
    std::{
        fmt::{ Display, Formatter, Result as FmtResult, },
        fs::read_to_string,
        path::Path,
    },
};

const NEWLINE: char = '\n';
const CARRIAGE_RETURN: char = '\r';

/// Read a template source from disk, normalizing `\r\n` line endings.
pub(crate)
fn read_file<P: AsRef<Path>>(p: P) -> Result<String> {
    let content = read_to_string(&p).map_err(|e| Error::IO(e, p.as_ref().into()))?;

    if !content.contains(CARRIAGE_RETURN) {
        return Ok(content);
    }

    let mut output = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == CARRIAGE_RETURN && chars.peek() == Some(&NEWLINE) {
            continue;
        }

        output.push(c);
    }

    Ok(output)
}

/// A zero-based line and position within a template source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub
struct Coordinate {
    line: usize,
    position: usize,
}

impl Coordinate {
    pub(crate)
    fn new(line: usize, position: usize) -> Self {
        Self { line, position, }
    }

    /// The zero-based line.
    pub
    fn line(&self) -> usize {
        self.line
    }

    /// The zero-based position (in characters) within the line.
    pub
    fn position(&self) -> usize {
        self.position
    }

    /// Advance the coordinate past `text`.
    pub(crate)
    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == NEWLINE {
                self.line += 1;
                self.position = 0;
            }
            else {
                self.position += 1;
            }
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_fmt(format_args!(
            "line {} position {}",
            self.line + 1,
            self.position + 1
        ))
    }
}
