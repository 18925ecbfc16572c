//! The `import` and `from … import` control structures.
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
        context::Context,
        error::{
            Error,
            EvalError,
            Result,
        },
        nodes::{
            Expr,
            StatementBlock,
            Template,
        },
        parser::{
            consts::{
                block as tag,
                exp,
            },
            Parser,
        },
        render::Renderer,
        statements::{
            include::{
                load_first,
                parse_context_clause,
                template_names,
            },
            Statement,
        },
        token::Token,
        value::Value,
    },
    indexmap::IndexMap,
    std::{
        rc::Rc,
        sync::Arc,
    },
    tracing::debug,
};

/// `{% import name as alias [with context] %}`
#[derive(Debug, Clone)]
pub
struct ImportStatement {
    pub template: Expr,
    pub alias: String,
    pub with_context: bool,
}

/// `{% from name import a [as b], … [with context] %}`
#[derive(Debug, Clone)]
pub
struct FromImportStatement {
    pub template: Expr,
    pub names: Vec<(Token, Option<String>)>,
    pub with_context: bool,
}

pub(crate)
fn parse_import(_: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let template = args.parse_expression()?;
    args.expect_keyword(exp::AS)?;
    let alias = args.expect_name()?;
    let with_context = parse_context_clause(args, false)?;
    args.expect_end()?;

    Ok(Statement::Import(ImportStatement {
        template,
        alias: alias.text,
        with_context,
    }))
}

pub(crate)
fn parse_from(_: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let template = args.parse_expression()?;
    args.expect_keyword(tag::IMPORT)?;

    let mut names = Vec::new();
    loop {
        let name = args.expect_name()?;
        let alias = match args.match_name(exp::AS)? {
            true => Some(args.expect_name()?.text),
            false => None,
        };
        names.push((name, alias));

        if !args.match_op(exp::COMMA)? {
            break;
        }
    }

    let with_context = parse_context_clause(args, false)?;
    args.expect_end()?;

    Ok(Statement::FromImport(FromImportStatement {
        template,
        names,
        with_context,
    }))
}

// Load the template named by `expr` and run its declarations, returning
// everything it binds at the top level.
fn exports(
    r: &Renderer<'_>,
    node: &StatementBlock,
    expr: &Expr,
    with_context: bool,
    ctx: &Rc<Context>,
) -> Result<IndexMap<String, Value>> {
    let value = r.eval(expr, ctx)?;
    let names = template_names(&value).map_err(|e| r.fail(e, expr.token()))?;
    let wrap = |e: Error| Error::Include(Box::new(e), node.token.coord, r.template().name.clone());

    let template: Arc<Template> = load_first(r, &names)
        .map_err(wrap)?
        .ok_or_else(|| wrap(Error::TemplateNotFound(names.join(", "))))?;

    debug!(template = template.name.as_str(), "importing");

    let data = match with_context {
        true => ctx.clone(),
        false => r.env().globals_context(),
    };

    let module = Renderer::nested(r.env(), template, data, r.auto_escape(), r.depth() + 1)
        .map_err(|e| r.fail(e, &node.token))?;

    let frame = module.globals().inherit();
    let chain = module.chain().clone();
    for template in chain.iter().rev() {
        module.scoped(template.clone()).declare(&template.root, &frame).map_err(wrap)?;
    }

    Ok(frame.locals())
}

impl ImportStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, node: &StatementBlock, ctx: &Rc<Context>) -> Result<()> {
        let exports = exports(r, node, &self.template, self.with_context, ctx)?;
        ctx.set(self.alias.as_str(), Value::dict(exports));
        Ok(())
    }
}

impl FromImportStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, node: &StatementBlock, ctx: &Rc<Context>) -> Result<()> {
        let exports = exports(r, node, &self.template, self.with_context, ctx)?;
        for (name, alias) in self.names.iter() {
            let value = exports.get(&name.text).cloned().ok_or_else(|| r.fail(
                EvalError::undefined(format!("cannot import name '{}'", name.text)),
                name,
            ))?;
            ctx.set(alias.as_deref().unwrap_or(&name.text), value);
        }
        Ok(())
    }
}
