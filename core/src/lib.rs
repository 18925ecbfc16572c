//! Tessera: a Jinja-style template parsing and rendering engine.
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

mod builtins;
mod config;
mod context;
mod env;
mod error;
mod eval;
mod file;
mod lexer;
mod loader;
pub mod nodes;
mod parser;
mod path;
mod render;
mod statements;
mod token;
mod value;

#[cfg(test)]
mod test;

pub use {
    builtins::{
        Filter,
        FilterFn,
        Filters,
        GlobalFn,
        Globals,
        Test,
        TestFn,
        Tests,
    },
    config::Config,
    context::Context,
    env::Environment,
    error::{
        Error,
        EvalError,
        EvalErrorKind,
        Result,
    },
    eval::Evaluator,
    file::Coordinate,
    lexer::{
        tokenize,
        Lexer,
    },
    loader::{
        FileSystemLoader,
        Loader,
        MemoryLoader,
    },
    nodes::Template,
    parser::Parser,
    render::{
        escape,
        Renderer,
    },
    statements::{
        AutoescapeStatement,
        BlockStatement,
        ControlStructure,
        ExtendsStatement,
        FilterStatement,
        ForStatement,
        FromImportStatement,
        IfStatement,
        ImportStatement,
        IncludeStatement,
        RawStatement,
        Registry,
        SetBlockStatement,
        SetStatement,
        Statement,
        StatementParser,
        WithStatement,
    },
    token::{
        Token,
        TokenKind,
        TokenStream,
    },
    value::{
        Function,
        NativeFn,
        Number,
        Signature,
        Value,
        VarArgs,
    },
};
