//! The `filter` control structure.
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
            Invocation,
            Wrapper,
        },
        parser::{
            consts::block as tag,
            Parser,
        },
        render::Renderer,
        statements::Statement,
        value::Value,
    },
    std::rc::Rc,
};

/// `{% filter name[(args)] [| name…] %}…{% endfilter %}`
#[derive(Debug, Clone)]
pub
struct FilterStatement {
    pub filters: Vec<Invocation>,
    pub body: Wrapper,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let filters = args.parse_filter_chain()?;
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDFILTER, ])?;
    end.expect_end()?;

    Ok(Statement::Filter(FilterStatement { filters, body, }))
}

impl FilterStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let text = r.capture(&self.body, &ctx.inherit())?;
        let value = match r.evaluator(ctx).apply_filters(r.markup(text), &self.filters) {
            Value::Error(e) => return Err(r.fail(e, &self.filters[0].token)),
            v => v,
        };
        r.write_value(&value, out);
        Ok(())
    }
}
