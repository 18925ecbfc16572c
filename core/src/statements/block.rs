//! The `block` control structure and `super()`.
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
            Template,
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
        value::{
            Function,
            Value,
        },
    },
    std::{
        rc::Rc,
        sync::Arc,
    },
    tracing::trace,
};

/// `{% block name %}…{% endblock [name] %}`
#[derive(Debug, Clone)]
pub
struct BlockStatement {
    pub name: String,
    pub body: Arc<Wrapper>,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let name = args.expect_name()?;
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDBLOCK, ])?;
    if !end.is_end()? {
        let closing = end.expect_name()?;
        if closing.text != name.text {
            return Err(end.invalid(
                format!("block '{}' closed by endblock '{}'", name.text, closing.text),
                &closing,
            ));
        }
    }
    end.expect_end()?;

    let body = Arc::new(body);
    parser.register_block(&name.text, body.clone(), &name)?;

    Ok(Statement::Block(BlockStatement {
        name: name.text,
        body,
    }))
}

// The override of a block in one template of the chain.
type Override = (Arc<Template>, Arc<Wrapper>);

impl BlockStatement {
    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let overrides = r.chain()
            .iter()
            .filter_map(|t| t.blocks.get(&self.name).map(|w| (t.clone(), w.clone())))
            .collect::<Vec<Override>>();

        if overrides.is_empty() {
            return r.render_wrapper(&self.body, &ctx.inherit(), out);
        }

        trace!(block = self.name.as_str(), overrides = overrides.len(), "rendering block");
        render_override(r, Rc::from(overrides), 0, ctx, out)
    }
}

// Render the override at `idx`, binding `super` to the one after it.
fn render_override(
    r: &Renderer<'_>,
    overrides: Rc<[Override]>,
    idx: usize,
    ctx: &Rc<Context>,
    out: &mut String,
) -> Result<()> {
    let (template, body) = overrides[idx].clone();
    let frame = ctx.inherit();

    if idx + 1 < overrides.len() {
        let chain = r.chain().clone();
        let globals = r.globals().clone();
        let parent = ctx.clone();
        let overrides = overrides.clone();

        frame.set(exp::SUPER, Function::new(exp::SUPER, move |ev, _| {
            let renderer = Renderer::from_parts(
                ev.env(),
                overrides[idx + 1].0.clone(),
                chain.clone(),
                globals.clone(),
                ev.auto_escape(),
                ev.depth(),
            );

            let mut buffer = String::new();
            match render_override(&renderer, overrides.clone(), idx + 1, &parent, &mut buffer) {
                Ok(()) => Value::safe(buffer),
                Err(e) => Value::Error(e.into_eval()),
            }
        }));
    }

    r.scoped(template).render_wrapper(&body, &frame, out)
}
