//! Names of the built-in control structures and their end tags.
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
const IF: &str = "if";

pub(crate)
const ELIF: &str = "elif";

pub(crate)
const ELSE: &str = "else";

pub(crate)
const ENDIF: &str = "endif";

pub(crate)
const FOR: &str = "for";

pub(crate)
const ENDFOR: &str = "endfor";

pub(crate)
const BLOCK: &str = "block";

pub(crate)
const ENDBLOCK: &str = "endblock";

pub(crate)
const EXTENDS: &str = "extends";

pub(crate)
const MACRO: &str = "macro";

pub(crate)
const ENDMACRO: &str = "endmacro";

pub(crate)
const INCLUDE: &str = "include";

pub(crate)
const IMPORT: &str = "import";

pub(crate)
const FROM: &str = "from";

pub(crate)
const SET: &str = "set";

pub(crate)
const ENDSET: &str = "endset";

pub(crate)
const WITH: &str = "with";

pub(crate)
const ENDWITH: &str = "endwith";

pub(crate)
const FILTER: &str = "filter";

pub(crate)
const ENDFILTER: &str = "endfilter";

pub(crate)
const AUTOESCAPE: &str = "autoescape";

pub(crate)
const ENDAUTOESCAPE: &str = "endautoescape";

pub(crate)
const RAW: &str = "raw";

pub(crate)
const ENDRAW: &str = "endraw";
