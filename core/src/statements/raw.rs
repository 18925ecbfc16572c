//! The `raw` control structure.
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
        nodes::Wrapper,
        parser::{
            consts::block as tag,
            Parser,
        },
        render::Renderer,
        statements::Statement,
    },
    std::rc::Rc,
};

/// `{% raw %}…{% endraw %}`
///
/// The lexer hands the body over as a single data token.
#[derive(Debug, Clone)]
pub
struct RawStatement {
    pub body: Wrapper,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    args.expect_end()?;
    let (body, mut end) = parser.wrap_until(&[ tag::ENDRAW, ])?;
    end.expect_end()?;
    Ok(Statement::Raw(RawStatement { body, }))
}

impl RawStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        r.render_wrapper(&self.body, ctx, out)
    }
}
