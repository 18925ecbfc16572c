//! Control structures of the Tessera Templating Engine.
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

mod autoescape;
mod block;
mod extends;
mod filter;
mod for_loop;
mod if_else;
mod import;
mod include;
mod macros;
mod raw;
mod set;
mod with;

pub use {
    autoescape::AutoescapeStatement,
    block::BlockStatement,
    extends::ExtendsStatement,
    filter::FilterStatement,
    for_loop::ForStatement,
    if_else::IfStatement,
    import::{
        FromImportStatement,
        ImportStatement,
    },
    include::IncludeStatement,
    raw::RawStatement,
    set::{
        SetBlockStatement,
        SetStatement,
    },
    with::WithStatement,
};

use {
    crate::{
        context::Context,
        error::Result,
        nodes::{
            MacroDef,
            StatementBlock,
        },
        parser::{
            consts::block as tag,
            Parser,
        },
        render::Renderer,
    },
    std::{
        collections::HashMap,
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        rc::Rc,
        sync::Arc,
    },
};

/// A control structure registered from outside the crate.
///
/// Built-in structures are variants of [`Statement`]; anything else is
/// parsed by a function added to the [`Registry`] and stored as a
/// `ControlStructure`.
pub
trait ControlStructure: Debug + Send + Sync {
    /// Render the structure into `out`.
    fn execute(
        &self,
        renderer: &mut Renderer<'_>,
        node: &StatementBlock,
        ctx: &Rc<Context>,
        out: &mut String,
    ) -> Result<()>;
}

/// A parsed control structure.
#[derive(Debug, Clone)]
pub enum Statement {
    If(IfStatement),
    For(ForStatement),
    Block(BlockStatement),
    Extends(ExtendsStatement),
    Macro(Arc<MacroDef>),
    Include(IncludeStatement),
    Import(ImportStatement),
    FromImport(FromImportStatement),
    Set(SetStatement),
    SetBlock(SetBlockStatement),
    With(WithStatement),
    Filter(FilterStatement),
    Autoescape(AutoescapeStatement),
    Raw(RawStatement),
    Extension(Arc<dyn ControlStructure>),
}

impl Statement {
    /// Render the structure into `out`.
    pub
    fn execute(
        &self,
        renderer: &mut Renderer<'_>,
        node: &StatementBlock,
        ctx: &Rc<Context>,
        out: &mut String,
    ) -> Result<()> {
        match self {
            Self::If(s) => s.execute(renderer, ctx, out),
            Self::For(s) => s.execute(renderer, ctx, out),
            Self::Block(s) => s.execute(renderer, ctx, out),
            Self::Extends(_) => Ok(()),
            Self::Macro(def) => {
                macros::define(renderer, def, ctx);
                Ok(())
            },
            Self::Include(s) => s.execute(renderer, node, ctx, out),
            Self::Import(s) => s.execute(renderer, node, ctx),
            Self::FromImport(s) => s.execute(renderer, node, ctx),
            Self::Set(s) => s.execute(renderer, ctx),
            Self::SetBlock(s) => s.execute(renderer, ctx),
            Self::With(s) => s.execute(renderer, ctx, out),
            Self::Filter(s) => s.execute(renderer, ctx, out),
            Self::Autoescape(s) => s.execute(renderer, ctx, out),
            Self::Raw(s) => s.execute(renderer, ctx, out),
            Self::Extension(s) => s.execute(renderer, node, ctx, out),
        }
    }

    /// Whether the statement declares something a template exports:
    /// variables, macros and imports. These run ahead of the root template
    /// for every child in an inheritance chain, and are all that runs of
    /// an imported template.
    pub
    fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::Macro(_) |
            Self::Set(_) |
            Self::SetBlock(_) |
            Self::Import(_) |
            Self::FromImport(_)
        )
    }
}

/// Parses a control structure: the document parser positioned after the
/// tag, and a parser over the tag's inline arguments.
pub
type StatementParser = Arc<
    dyn Fn(&mut Parser<'_>, &mut Parser<'_>) -> Result<Statement> + Send + Sync
>;

/// Maps tag names to the parsers of their control structures.
#[derive(Clone)]
pub
struct Registry {
    parsers: HashMap<String, StatementParser>,
}

impl Registry {
    /// A registry without any control structures.
    pub
    fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register `parser` for tags named `name`, replacing any previous
    /// registration.
    pub
    fn register<S, F>(&mut self, name: S, parser: F)
    where
        S: Into<String>,
        F: Fn(&mut Parser<'_>, &mut Parser<'_>) -> Result<Statement> + Send + Sync + 'static
    {
        self.parsers.insert(name.into(), Arc::new(parser));
    }

    pub
    fn get(&self, name: &str) -> Option<&StatementParser> {
        self.parsers.get(name)
    }

    pub
    fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }
}

impl Default for Registry {
    /// The built-in control structures.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(tag::IF, if_else::parse);
        registry.register(tag::FOR, for_loop::parse);
        registry.register(tag::BLOCK, block::parse);
        registry.register(tag::EXTENDS, extends::parse);
        registry.register(tag::MACRO, macros::parse);
        registry.register(tag::INCLUDE, include::parse);
        registry.register(tag::IMPORT, import::parse_import);
        registry.register(tag::FROM, import::parse_from);
        registry.register(tag::SET, set::parse);
        registry.register(tag::WITH, with::parse);
        registry.register(tag::FILTER, filter::parse);
        registry.register(tag::AUTOESCAPE, autoescape::parse);
        registry.register(tag::RAW, raw::parse);
        registry
    }
}

impl Debug for Registry {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        let mut names = self.parsers.keys().collect::<Vec<&String>>();
        names.sort();
        fmtr.debug_struct("Registry").field("parsers", &names).finish()
    }
}
