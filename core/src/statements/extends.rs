//! The `extends` control structure.
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

use crate::{
    error::Result,
    parser::Parser,
    statements::Statement,
};

/// `{% extends "parent" %}`
///
/// The parent is loaded and parsed while the tag is parsed; rendering the
/// tag itself writes nothing.
#[derive(Debug, Clone)]
pub
struct ExtendsStatement {
    pub parent: String,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let (parent, token) = args.parse_string()?;
    args.expect_end()?;

    parser.extend(&parent, &token)?;

    Ok(Statement::Extends(ExtendsStatement { parent, }))
}
