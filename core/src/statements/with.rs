//! The `with` control structure.
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
            consts::{
                block as tag,
                exp,
            },
            Parser,
        },
        render::Renderer,
        statements::Statement,
    },
    std::rc::Rc,
};

/// `{% with a = expr[, b = expr…] %}…{% endwith %}`
#[derive(Debug, Clone)]
pub
struct WithStatement {
    pub assignments: Vec<(String, Expr)>,
    pub body: Wrapper,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let mut assignments = Vec::new();
    while !args.is_end()? {
        let name = args.expect_name()?;
        args.expect_op(exp::ASSIGN)?;
        assignments.push((name.text, args.parse_expression()?));

        if !args.match_op(exp::COMMA)? {
            break;
        }
    }
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDWITH, ])?;
    end.expect_end()?;

    Ok(Statement::With(WithStatement { assignments, body, }))
}

impl WithStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let frame = ctx.inherit();
        for (name, expr) in self.assignments.iter() {
            frame.set(name.as_str(), r.eval(expr, ctx)?);
        }
        r.render_wrapper(&self.body, &frame, out)
    }
}
