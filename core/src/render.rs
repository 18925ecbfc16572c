//! Rendering of parsed templates for the Tessera Templating Engine.
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
        env::Environment,
        error::{
            Error,
            EvalError,
            Result,
        },
        eval::Evaluator,
        nodes::{
            Expr,
            Node,
            Output,
            Template,
            Wrapper,
        },
        token::Token,
        value::Value,
    },
    std::{
        rc::Rc,
        sync::Arc,
    },
    tracing::trace,
};

/// Escape `& < > " '` for HTML.
pub
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Walks the nodes of a template and writes its output.
///
/// `template` is the template whose nodes are being walked: the one a
/// block override, macro or include came from. `chain` is the inheritance
/// chain of the render, most derived first, which is where blocks are
/// looked up.
pub
struct Renderer<'e> {
    env: &'e Environment,
    template: Arc<Template>,
    chain: Rc<[Arc<Template>]>,
    globals: Rc<Context>,
    auto_escape: bool,
    /// How many includes, imports and macro calls enclose this renderer.
    depth: usize,
}

impl<'e> Renderer<'e> {
    /// A renderer for `template` over the data frame `globals`.
    pub
    fn new(env: &'e Environment, template: Arc<Template>, globals: Rc<Context>) -> Self {
        let chain = Rc::from(template.chain());
        Self {
            env,
            template,
            chain,
            globals,
            auto_escape: env.config().auto_escape,
            depth: 0,
        }
    }

    pub(crate)
    fn from_parts(
        env: &'e Environment,
        template: Arc<Template>,
        chain: Rc<[Arc<Template>]>,
        globals: Rc<Context>,
        auto_escape: bool,
        depth: usize,
    ) -> Self {
        Self {
            env,
            template,
            chain,
            globals,
            auto_escape,
            depth,
        }
    }

    /// A renderer for a separate render of `template` (an include, an
    /// import or a macro body) `depth` levels down. Fails once `depth`
    /// passes the configured recursion limit.
    pub(crate)
    fn nested(
        env: &'e Environment,
        template: Arc<Template>,
        globals: Rc<Context>,
        auto_escape: bool,
        depth: usize,
    ) -> std::result::Result<Self, EvalError> {
        let limit = env.config().recursion_limit;
        if depth > limit {
            return Err(EvalError::runtime(format!(
                "maximum recursion depth of {} exceeded rendering {:?}",
                limit,
                template.name,
            )));
        }

        let chain = Rc::from(template.chain());
        Ok(Self::from_parts(env, template, chain, globals, auto_escape, depth))
    }

    /// A renderer for nodes of `template` within the same render.
    pub(crate)
    fn scoped(&self, template: Arc<Template>) -> Renderer<'e> {
        Self::from_parts(
            self.env,
            template,
            self.chain.clone(),
            self.globals.clone(),
            self.auto_escape,
            self.depth,
        )
    }

    pub
    fn env(&self) -> &'e Environment {
        self.env
    }

    /// The template whose nodes are being rendered.
    pub
    fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub
    fn chain(&self) -> &Rc<[Arc<Template>]> {
        &self.chain
    }

    /// The data frame of the render.
    pub
    fn globals(&self) -> &Rc<Context> {
        &self.globals
    }

    pub
    fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    pub
    fn depth(&self) -> usize {
        self.depth
    }

    pub
    fn set_auto_escape(&mut self, auto_escape: bool) {
        self.auto_escape = auto_escape;
    }

    pub
    fn evaluator(&self, ctx: &Rc<Context>) -> Evaluator<'e> {
        Evaluator::new(self.env, ctx.clone(), self.auto_escape).at_depth(self.depth)
    }

    /// An evaluation failure located at `token`.
    pub
    fn fail(&self, e: EvalError, token: &Token) -> Error {
        Error::Eval(e, token.coord, self.template.name.clone())
    }

    /// Evaluate `expr`, turning an error value into an [`Error::Eval`].
    pub
    fn eval(&self, expr: &Expr, ctx: &Rc<Context>) -> Result<Value> {
        match self.evaluator(ctx).eval(expr) {
            Value::Error(e) => Err(self.fail(e, expr.token())),
            v => Ok(v),
        }
    }

    /// Render the template, starting at the root of its inheritance chain.
    ///
    /// Before the root runs, every derived template runs its declarations
    /// (root-most first) into the shared template frame, so variables and
    /// macros it sets are visible to the blocks it overrides.
    pub
    fn render(&mut self, out: &mut String) -> Result<()> {
        let frame = self.globals.inherit();
        let chain = self.chain.clone();

        let (root, derived) = match chain.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        for template in derived.iter().rev() {
            trace!(template = template.name.as_str(), "running declarations");
            self.scoped(template.clone()).declare(&template.root, &frame)?;
        }

        self.scoped(root.clone()).render_wrapper(&root.root, &frame, out)
    }

    /// Run the top-level declarations of `wrapper`, discarding output.
    pub
    fn declare(&mut self, wrapper: &Wrapper, ctx: &Rc<Context>) -> Result<()> {
        let mut discard = String::new();
        for node in wrapper.nodes.iter() {
            if let Node::Statement(block) = node {
                if block.statement.is_declaration() {
                    block.statement.execute(self, block, ctx, &mut discard)?;
                }
            }
        }
        Ok(())
    }

    /// Render every node of `wrapper` into `out`.
    pub
    fn render_wrapper(&mut self, wrapper: &Wrapper, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        for node in wrapper.nodes.iter() {
            self.render_node(node, ctx, out)?;
        }
        Ok(())
    }

    /// Render `wrapper` into a new buffer.
    pub
    fn capture(&mut self, wrapper: &Wrapper, ctx: &Rc<Context>) -> Result<String> {
        let mut out = String::new();
        self.render_wrapper(wrapper, ctx, &mut out)?;
        Ok(out)
    }

    fn render_node(&mut self, node: &Node, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        match node {
            Node::Data(data) => out.push_str(data.trimmed()),
            Node::Comment(_) => (),
            Node::Output(output) => self.render_output(output, ctx, out)?,
            Node::Statement(block) => {
                trace!(tag = block.name.as_str(), "executing statement");
                block.statement.execute(self, block, ctx, out)?;
            },
        }
        Ok(())
    }

    fn render_output(&mut self, output: &Output, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let expr = match &output.condition {
            Some(condition) => {
                if self.eval(condition, ctx)?.is_truthy() {
                    Some(&output.expr)
                }
                else {
                    output.alternative.as_ref()
                }
            },
            None => Some(&output.expr),
        };

        if let Some(expr) = expr {
            let value = self.eval(expr, ctx)?;
            self.write_value(&value, out);
        }

        Ok(())
    }

    /// Write the string form of `value`, escaped when auto-escaping and the
    /// value is not safe.
    pub
    fn write_value(&self, value: &Value, out: &mut String) {
        if self.auto_escape && !value.is_safe() {
            out.push_str(&escape(&value.to_output()));
        }
        else {
            out.push_str(&value.to_output());
        }
    }

    /// Wrap rendered text as a value, safe when auto-escaping since it was
    /// escaped as it was written.
    pub
    fn markup(&self, text: String) -> Value {
        if self.auto_escape {
            return Value::safe(text);
        }
        Value::from(text)
    }

    /// Load a template relative to the template being rendered.
    pub
    fn load(&self, name: &str) -> Result<Arc<Template>> {
        self.env.load_with(name, &self.template.loader)
    }
}
