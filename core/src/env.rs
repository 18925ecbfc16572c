//! The environment tying configuration, loader and registries together.
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
        builtins::{
            Filters,
            Globals,
            Tests,
        },
        config::Config,
        context::Context,
        error::{
            EvalError,
            Result,
        },
        eval::Evaluator,
        loader::Loader,
        nodes::Template,
        parser::Parser,
        render::Renderer,
        statements::{
            Registry,
            Statement,
        },
        value::{
            Function,
            Value,
            VarArgs,
        },
    },
    serde_json::Value as JsonValue,
    std::{
        collections::HashMap,
        rc::Rc,
        sync::{
            Arc,
            Mutex,
        },
    },
    tracing::debug,
};

/// Everything a render needs that outlives it: configuration, the loader,
/// the control structure, filter, test and global registries, and a cache
/// of parsed templates.
///
/// Cloning is cheap and clones share the cache.
///
/// ```rust
/// use tessera_core::{ Config, Context, Environment, MemoryLoader, };
///
/// let loader = MemoryLoader::new().with("hello", "Hello {{ name }}!");
/// let env = Environment::new(Config::default(), loader).unwrap();
///
/// let ctx = Context::new();
/// ctx.set("name", "World");
/// assert_eq!("Hello World!", env.render("hello", &ctx).unwrap());
/// ```
#[derive(Debug, Clone)]
pub
struct Environment {
    config: Arc<Config>,
    loader: Arc<dyn Loader>,
    registry: Arc<Registry>,
    filters: Arc<Filters>,
    tests: Arc<Tests>,
    globals: Arc<Globals>,
    cache: Arc<Mutex<HashMap<String, Arc<Template>>>>,
}

impl Environment {
    /// An environment with the built-in control structures, filters, tests
    /// and globals.
    pub
    fn new<L: Loader + 'static>(config: Config, loader: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            loader: Arc::new(loader),
            registry: Arc::new(Registry::default()),
            filters: Arc::new(Filters::default()),
            tests: Arc::new(Tests::default()),
            globals: Arc::new(Globals::default()),
            cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Register a control structure parsed by `parser` for tags named `name`.
    pub
    fn with_statement<S, F>(mut self, name: S, parser: F) -> Self
    where
        S: Into<String>,
        F: Fn(&mut Parser<'_>, &mut Parser<'_>) -> Result<Statement> + Send + Sync + 'static
    {
        Arc::make_mut(&mut self.registry).register(name, parser);
        self.cache = Arc::new(Mutex::new(HashMap::new()));
        self
    }

    pub
    fn with_filter<S, F>(mut self, name: S, filter: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Evaluator, Value, &VarArgs) -> Value + Send + Sync + 'static
    {
        Arc::make_mut(&mut self.filters).register(name, filter);
        self
    }

    pub
    fn with_test<S, F>(mut self, name: S, test: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Context, &Value, &VarArgs) -> std::result::Result<bool, EvalError> + Send + Sync + 'static
    {
        Arc::make_mut(&mut self.tests).register(name, test);
        self
    }

    pub
    fn with_global_fn<S, F>(mut self, name: S, func: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Evaluator, VarArgs) -> Value + Send + Sync + 'static
    {
        Arc::make_mut(&mut self.globals).register(name, func);
        self
    }

    pub
    fn with_global<S: Into<String>>(mut self, name: S, value: JsonValue) -> Self {
        Arc::make_mut(&mut self.globals).insert(name, value);
        self
    }

    pub
    fn config(&self) -> &Config {
        &self.config
    }

    pub
    fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    pub
    fn registry(&self) -> &Registry {
        &self.registry
    }

    pub
    fn filters(&self) -> &Filters {
        &self.filters
    }

    pub
    fn tests(&self) -> &Tests {
        &self.tests
    }

    pub
    fn globals(&self) -> &Globals {
        &self.globals
    }

    /// A new root frame holding the global functions and values.
    pub
    fn globals_context(&self) -> Rc<Context> {
        let ctx = Context::new();
        for (name, func) in self.globals.functions() {
            let func = func.clone();
            ctx.set(name.as_str(), Function::new(name, move |ev, args| func(ev, args)));
        }
        for (name, value) in self.globals.values() {
            ctx.set(name.as_str(), Value::from(value));
        }
        ctx
    }

    /// Load the template `name` through the environment's loader.
    pub
    fn get_template(&self, name: &str) -> Result<Arc<Template>> {
        self.load_with(name, &self.loader)
    }

    /// Load the template `name` through `loader`.
    pub
    fn load_with(&self, name: &str, loader: &Arc<dyn Loader>) -> Result<Arc<Template>> {
        let resolved = loader.resolve(name)?;
        self.load_resolved(&resolved, loader, Vec::new())
    }

    pub(crate)
    fn load_resolved(
        &self,
        resolved: &str,
        loader: &Arc<dyn Loader>,
        extending: Vec<String>,
    ) -> Result<Arc<Template>> {
        if let Some(template) = self.cached(resolved) {
            debug!(template = resolved, "template cache hit");
            return Ok(template);
        }

        debug!(template = resolved, "loading template");
        let source = loader.read(resolved)?;
        let scoped = loader.inherit(resolved)?;
        let template = Arc::new(Parser::parse_template(self, resolved, &source, scoped, extending)?);

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(resolved.to_owned(), template.clone());

        Ok(template)
    }

    fn cached(&self, resolved: &str) -> Option<Arc<Template>> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(resolved)
            .cloned()
    }

    /// Forget every parsed template.
    pub
    fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Parse `source` as a template called `name`, without caching it.
    pub
    fn parse_str(&self, name: &str, source: &str) -> Result<Arc<Template>> {
        Ok(Arc::new(Parser::parse_template(self, name, source, self.loader.clone(), Vec::new())?))
    }

    /// Render the template `name` with the bindings of `ctx`.
    pub
    fn render(&self, name: &str, ctx: &Rc<Context>) -> Result<String> {
        let template = self.get_template(name)?;
        self.render_template(template, ctx)
    }

    /// Render a parsed template with the bindings of `ctx`.
    pub
    fn render_template(&self, template: Arc<Template>, ctx: &Rc<Context>) -> Result<String> {
        debug!(template = template.name.as_str(), "rendering");

        let data = self.globals_context().inherit();
        data.extend(ctx.flatten());

        let mut out = String::new();
        Renderer::new(self, template, data).render(&mut out)?;
        Ok(out)
    }

    /// Render template source directly.
    pub
    fn render_str(&self, source: &str, ctx: &Rc<Context>) -> Result<String> {
        let template = self.parse_str("<string>", source)?;
        self.render_template(template, ctx)
    }

    /// Render the template `name` with a JSON object as its context.
    pub
    fn render_json(&self, name: &str, json: &JsonValue) -> Result<String> {
        let ctx = Context::from_json(json)?;
        self.render(name, &ctx)
    }
}
