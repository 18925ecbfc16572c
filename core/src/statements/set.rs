//! The `set` control structure, in both its assignment and block forms.
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
            EvalError,
            Result,
        },
        nodes::{
            Expr,
            Invocation,
            Wrapper,
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
        token::Token,
        value::Value,
    },
    std::rc::Rc,
};

/// `{% set a[, b…] = expr %}`
#[derive(Debug, Clone)]
pub
struct SetStatement {
    pub targets: Vec<String>,
    pub value: Expr,
    pub token: Token,
}

/// `{% set name [| filter…] %}…{% endset %}`
#[derive(Debug, Clone)]
pub
struct SetBlockStatement {
    pub target: String,
    pub filters: Vec<Invocation>,
    pub body: Wrapper,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let targets = args.parse_targets()?;
    let token = targets[0].clone();

    if args.match_op(exp::ASSIGN)? {
        let first = args.parse_expression()?;
        let value = if args.match_op(exp::COMMA)? {
            let mut items = vec![ first, ];
            while !args.is_end()? {
                items.push(args.parse_expression()?);
                if !args.match_op(exp::COMMA)? {
                    break;
                }
            }
            Expr::Tuple(items, token.clone())
        }
        else {
            first
        };

        return Ok(Statement::Set(SetStatement {
            targets: targets.into_iter().map(|t| t.text).collect(),
            value,
            token,
        }));
    }

    if targets.len() > 1 {
        return Err(args.invalid("a set block takes a single target", &targets[1]));
    }

    let filters = match args.match_op(exp::PIPE)? {
        true => args.parse_filter_chain()?,
        false => Vec::new(),
    };
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDSET, ])?;
    end.expect_end()?;

    Ok(Statement::SetBlock(SetBlockStatement {
        target: token.text,
        filters,
        body,
    }))
}

impl SetStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>) -> Result<()> {
        let value = r.eval(&self.value, ctx)?;

        if let [ target, ] = self.targets.as_slice() {
            ctx.set(target.as_str(), value);
            return Ok(());
        }

        let items = value.iterate().map_err(|e| r.fail(e, &self.token))?;
        if items.len() != self.targets.len() {
            return Err(r.fail(
                EvalError::type_error(format!(
                    "cannot unpack {} values into {} targets",
                    items.len(),
                    self.targets.len(),
                )),
                &self.token,
            ));
        }

        for (target, item) in self.targets.iter().zip(items) {
            ctx.set(target.as_str(), item);
        }
        Ok(())
    }
}

impl SetBlockStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>) -> Result<()> {
        let text = r.capture(&self.body, ctx)?;
        let mut value = r.markup(text);

        if let Some(first) = self.filters.first() {
            value = match r.evaluator(ctx).apply_filters(value, &self.filters) {
                Value::Error(e) => return Err(r.fail(e, &first.token)),
                v => v,
            };
        }

        ctx.set(self.target.as_str(), value);
        Ok(())
    }
}
