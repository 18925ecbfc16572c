//! Registries of filters, tests and global functions, and the built-in library.
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

mod filters;
mod globals;
mod tests;

use {
    crate::{
        context::Context,
        error::EvalError,
        eval::Evaluator,
        value::{
            Value,
            VarArgs,
        },
    },
    serde_json::Value as JsonValue,
    indexmap::IndexMap,
    std::{
        collections::HashMap,
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        sync::Arc,
    },
};

/// The body of a filter: the evaluator, the piped value and the arguments.
pub type FilterFn = dyn Fn(&Evaluator, Value, &VarArgs) -> Value + Send + Sync;

/// The body of a test.
pub type TestFn = dyn Fn(&Context, &Value, &VarArgs) -> Result<bool, EvalError> + Send + Sync;

/// The body of a global function.
pub type GlobalFn = dyn Fn(&Evaluator, VarArgs) -> Value + Send + Sync;

/// A registered filter.
///
/// An undefined-aware filter receives undefined errors as its input
/// instead of having them propagated past it.
#[derive(Clone)]
pub
struct Filter {
    func: Arc<FilterFn>,
    undefined_aware: bool,
}

impl Filter {
    pub
    fn undefined_aware(&self) -> bool {
        self.undefined_aware
    }

    pub
    fn call(&self, ev: &Evaluator, input: Value, args: &VarArgs) -> Value {
        (self.func)(ev, input, args)
    }
}

/// Filters by name.
#[derive(Clone)]
pub
struct Filters {
    filters: HashMap<String, Filter>,
}

impl Filters {
    pub
    fn empty() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    pub
    fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    pub
    fn register<S, F>(&mut self, name: S, func: F)
    where
        S: Into<String>,
        F: Fn(&Evaluator, Value, &VarArgs) -> Value + Send + Sync + 'static
    {
        self.filters.insert(name.into(), Filter {
            func: Arc::new(func),
            undefined_aware: false,
        });
    }

    pub
    fn register_undefined_aware<S, F>(&mut self, name: S, func: F)
    where
        S: Into<String>,
        F: Fn(&Evaluator, Value, &VarArgs) -> Value + Send + Sync + 'static
    {
        self.filters.insert(name.into(), Filter {
            func: Arc::new(func),
            undefined_aware: true,
        });
    }
}

impl Default for Filters {
    fn default() -> Self {
        let mut filters = Self::empty();
        filters::register(&mut filters);
        filters
    }
}

impl Debug for Filters {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        let mut names = self.filters.keys().collect::<Vec<&String>>();
        names.sort();
        fmtr.debug_struct("Filters").field("filters", &names).finish()
    }
}

/// A registered test.
#[derive(Clone)]
pub
struct Test {
    func: Arc<TestFn>,
    undefined_aware: bool,
}

impl Test {
    pub
    fn undefined_aware(&self) -> bool {
        self.undefined_aware
    }

    pub
    fn call(&self, ctx: &Context, input: &Value, args: &VarArgs) -> Result<bool, EvalError> {
        (self.func)(ctx, input, args)
    }
}

/// Tests by name.
#[derive(Clone)]
pub
struct Tests {
    tests: HashMap<String, Test>,
}

impl Tests {
    pub
    fn empty() -> Self {
        Self {
            tests: HashMap::new(),
        }
    }

    pub
    fn get(&self, name: &str) -> Option<&Test> {
        self.tests.get(name)
    }

    pub
    fn register<S, F>(&mut self, name: S, func: F)
    where
        S: Into<String>,
        F: Fn(&Context, &Value, &VarArgs) -> Result<bool, EvalError> + Send + Sync + 'static
    {
        self.tests.insert(name.into(), Test {
            func: Arc::new(func),
            undefined_aware: false,
        });
    }

    pub
    fn register_undefined_aware<S, F>(&mut self, name: S, func: F)
    where
        S: Into<String>,
        F: Fn(&Context, &Value, &VarArgs) -> Result<bool, EvalError> + Send + Sync + 'static
    {
        self.tests.insert(name.into(), Test {
            func: Arc::new(func),
            undefined_aware: true,
        });
    }
}

impl Default for Tests {
    fn default() -> Self {
        let mut tests = Self::empty();
        tests::register(&mut tests);
        tests
    }
}

impl Debug for Tests {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        let mut names = self.tests.keys().collect::<Vec<&String>>();
        names.sort();
        fmtr.debug_struct("Tests").field("tests", &names).finish()
    }
}

/// Global functions and values bound into every render.
#[derive(Clone)]
pub
struct Globals {
    functions: IndexMap<String, Arc<GlobalFn>>,
    values: IndexMap<String, JsonValue>,
}

impl Globals {
    pub
    fn empty() -> Self {
        Self {
            functions: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    pub
    fn register<S, F>(&mut self, name: S, func: F)
    where
        S: Into<String>,
        F: Fn(&Evaluator, VarArgs) -> Value + Send + Sync + 'static
    {
        self.functions.insert(name.into(), Arc::new(func));
    }

    pub
    fn insert<S: Into<String>>(&mut self, name: S, value: JsonValue) {
        self.values.insert(name.into(), value);
    }

    pub
    fn functions(&self) -> impl Iterator<Item = (&String, &Arc<GlobalFn>)> {
        self.functions.iter()
    }

    pub
    fn values(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.values.iter()
    }
}

impl Default for Globals {
    fn default() -> Self {
        let mut globals = Self::empty();
        globals::register(&mut globals);
        globals
    }
}

impl Debug for Globals {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.debug_struct("Globals")
            .field("functions", &self.functions.keys().collect::<Vec<&String>>())
            .field("values", &self.values)
            .finish()
    }
}
