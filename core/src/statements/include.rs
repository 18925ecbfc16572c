//! The `include` control structure.
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
        statements::Statement,
        value::Value,
    },
    std::{
        rc::Rc,
        sync::Arc,
    },
    tracing::debug,
};

/// `{% include name [ignore missing] [with context|without context] %}`
///
/// `name` may evaluate to a list of names, in which case the first one that
/// exists is rendered.
#[derive(Debug, Clone)]
pub
struct IncludeStatement {
    pub template: Expr,
    pub ignore_missing: bool,
    pub with_context: bool,
}

/// Parse an optional `with context` or `without context` suffix.
pub(crate)
fn parse_context_clause(args: &mut Parser<'_>, default: bool) -> Result<bool> {
    if args.match_name(exp::WITHOUT)? {
        args.expect_keyword(exp::CONTEXT)?;
        return Ok(false);
    }

    if args.peek()?.is_name(tag::WITH) {
        args.next()?;
        args.expect_keyword(exp::CONTEXT)?;
        return Ok(true);
    }

    Ok(default)
}

pub(crate)
fn parse(_: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let template = args.parse_expression()?;

    let ignore_missing = if args.match_name(exp::IGNORE)? {
        args.expect_keyword(exp::MISSING)?;
        true
    }
    else {
        false
    };

    let with_context = parse_context_clause(args, true)?;
    args.expect_end()?;

    Ok(Statement::Include(IncludeStatement {
        template,
        ignore_missing,
        with_context,
    }))
}

/// The names a template expression evaluated to.
pub(crate)
fn template_names(value: &Value) -> std::result::Result<Vec<String>, EvalError> {
    match value {
        Value::Str { text, .. } => Ok(vec![ text.to_string(), ]),
        Value::List(items) => items.iter()
            .map(|item| match item.as_str() {
                Some(name) => Ok(name.to_owned()),
                None => Err(EvalError::type_error(format!(
                    "template names must be strings, not {}",
                    item.type_name(),
                ))),
            })
            .collect(),
        v => Err(EvalError::type_error(format!(
            "template names must be strings, not {}",
            v.type_name(),
        ))),
    }
}

/// Load the first template of `names` that exists.
pub(crate)
fn load_first(r: &Renderer<'_>, names: &[String]) -> Result<Option<Arc<Template>>> {
    for name in names.iter() {
        match r.load(name) {
            Ok(template) => return Ok(Some(template)),
            Err(Error::TemplateNotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

impl IncludeStatement {
    pub(crate)
    fn execute(
        &self,
        r: &mut Renderer<'_>,
        node: &StatementBlock,
        ctx: &Rc<Context>,
        out: &mut String,
    ) -> Result<()> {
        let value = r.eval(&self.template, ctx)?;
        let names = template_names(&value).map_err(|e| r.fail(e, self.template.token()))?;
        let wrap = |e: Error| Error::Include(Box::new(e), node.token.coord, r.template().name.clone());

        let template = match load_first(r, &names).map_err(wrap)? {
            Some(template) => template,
            None if self.ignore_missing => return Ok(()),
            None => return Err(wrap(Error::TemplateNotFound(names.join(", ")))),
        };

        debug!(template = template.name.as_str(), "including");

        let data = match self.with_context {
            true => ctx.clone(),
            false => r.env().globals_context(),
        };

        let mut renderer = Renderer::nested(r.env(), template, data, r.auto_escape(), r.depth() + 1)
            .map_err(|e| r.fail(e, &node.token))?;
        renderer.render(out).map_err(wrap)
    }
}
