//! The `autoescape` control structure.
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
            Const,
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

/// `{% autoescape [expr] %}…{% endautoescape %}`
///
/// Without an argument escaping is turned on.
#[derive(Debug, Clone)]
pub
struct AutoescapeStatement {
    pub enabled: Expr,
    pub body: Wrapper,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let enabled = match args.is_end()? {
        true => Expr::Literal(Const::Bool(true), args.peek()?.clone()),
        false => args.parse_expression()?,
    };
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDAUTOESCAPE, ])?;
    end.expect_end()?;

    Ok(Statement::Autoescape(AutoescapeStatement { enabled, body, }))
}

impl AutoescapeStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let enabled = r.eval(&self.enabled, ctx)?.is_truthy();
        let previous = r.auto_escape();

        r.set_auto_escape(enabled);
        let result = r.render_wrapper(&self.body, ctx, out);
        r.set_auto_escape(previous);

        result
    }
}
