//! Keywords and operators of the expression grammar.
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


pub(crate)
const OR: &str = "or";

pub(crate)
const AND: &str = "and";

pub(crate)
const NOT: &str = "not";

pub(crate)
const IN: &str = "in";

pub(crate)
const IS: &str = "is";

pub(crate)
const IF: &str = "if";

pub(crate)
const ELSE: &str = "else";

pub(crate)
const AS: &str = "as";

pub(crate)
const IGNORE: &str = "ignore";

pub(crate)
const MISSING: &str = "missing";

pub(crate)
const CONTEXT: &str = "context";

pub(crate)
const WITHOUT: &str = "without";

pub(crate)
const SUPER: &str = "super";

pub(crate)
const LOOP: &str = "loop";

pub(crate)
const NONE: [&str; 2] = [ "none", "None", ];

pub(crate)
const TRUE: [&str; 2] = [ "true", "True", ];

pub(crate)
const FALSE: [&str; 2] = [ "false", "False", ];

pub(crate)
const PIPE: &str = "|";

pub(crate)
const DOT: &str = ".";

pub(crate)
const COMMA: &str = ",";

pub(crate)
const COLON: &str = ":";

pub(crate)
const ASSIGN: &str = "=";

pub(crate)
const LPAREN: &str = "(";

pub(crate)
const RPAREN: &str = ")";

pub(crate)
const LBRACKET: &str = "[";

pub(crate)
const RBRACKET: &str = "]";

pub(crate)
const LBRACE: &str = "{";

pub(crate)
const RBRACE: &str = "}";
