//! The `if` control structure.
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
        error::Result,
        nodes::{
            Expr,
            Wrapper,
        },
        parser::{
            consts::block as tag,
            Parser,
        },
        render::Renderer,
        statements::Statement,
    },
    std::rc::Rc,
};

/// `{% if %}…{% elif %}…{% else %}…{% endif %}`
#[derive(Debug, Clone)]
pub
struct IfStatement {
    pub branches: Vec<(Expr, Wrapper)>,
    pub otherwise: Option<Wrapper>,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let mut branches = Vec::new();
    let mut otherwise = None;

    let mut condition = args.parse_expression()?;
    loop {
        let (body, mut end) = parser.wrap_until(&[ tag::ELIF, tag::ELSE, tag::ENDIF, ])?;
        let end_tag = body.end_tag.clone().unwrap_or_default();
        branches.push((condition, body));

        match end_tag.as_str() {
            tag::ELIF => {
                condition = end.parse_expression()?;
                end.expect_end()?;
            },
            tag::ELSE => {
                end.expect_end()?;
                let (body, mut end) = parser.wrap_until(&[ tag::ENDIF, ])?;
                end.expect_end()?;
                otherwise = Some(body);
                break;
            },
            _ => {
                end.expect_end()?;
                break;
            },
        }
    }

    Ok(Statement::If(IfStatement { branches, otherwise, }))
}

impl IfStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        for (condition, body) in self.branches.iter() {
            if r.eval(condition, ctx)?.is_truthy() {
                return r.render_wrapper(body, ctx, out);
            }
        }

        match &self.otherwise {
            Some(body) => r.render_wrapper(body, ctx, out),
            None => Ok(()),
        }
    }
}
