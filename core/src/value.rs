//! Runtime values of the Tessera Templating Engine.
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
        error::EvalError,
        eval::Evaluator,
    },
    indexmap::IndexMap,
    serde_json::{
        Map as JsonMap,
        Number as JsonNumber,
        Value as JsonValue,
    },
    std::{
        cmp::Ordering,
        fmt::{
            Debug,
            Display,
            Formatter,
            Result as FmtResult,
        },
        rc::Rc,
    },
};

/// The body of a callable value.
pub type NativeFn = dyn Fn(&Evaluator, VarArgs) -> Value;

/// The declared parameters of a callable, used to validate a call before
/// the callable runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub
struct Signature {
    pub params: Vec<String>,
    /// How many of the leading `params` must be bound.
    pub required: usize,
    /// Extra positional arguments are accepted.
    pub variadic: bool,
}

impl Signature {
    pub
    fn new<S: Into<String>>(params: Vec<S>, required: usize) -> Self {
        Self {
            params: params.into_iter().map(|p| p.into()).collect(),
            required,
            variadic: false,
        }
    }

    /// Check the argument count and keyword names of a call.
    pub
    fn check(&self, name: &str, args: &VarArgs) -> Result<(), EvalError> {
        if !self.variadic && args.args.len() > self.params.len() {
            return Err(EvalError::call(format!(
                "{}() takes at most {} argument(s) but {} were given",
                name,
                self.params.len(),
                args.args.len(),
            )));
        }

        for (key, _) in args.kwargs.iter() {
            match self.params.iter().position(|p| p == key) {
                None => {
                    return Err(EvalError::call(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        name,
                        key,
                    )));
                },
                Some(idx) if idx < args.args.len() => {
                    return Err(EvalError::call(format!(
                        "{}() got multiple values for argument '{}'",
                        name,
                        key,
                    )));
                },
                Some(_) => (),
            }
        }

        for (idx, param) in self.params.iter().enumerate().take(self.required) {
            if idx >= args.args.len() && !args.kwargs.contains_key(param) {
                return Err(EvalError::call(format!(
                    "{}() missing required argument '{}'",
                    name,
                    param,
                )));
            }
        }

        Ok(())
    }
}

/// A callable value: a macro, a bound method, `super`, `loop.cycle` or a
/// global function.
#[derive(Clone)]
pub
struct Function {
    name: Rc<str>,
    signature: Option<Rc<Signature>>,
    func: Rc<NativeFn>,
}

impl Function {
    pub
    fn new<S, F>(name: S, func: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&Evaluator, VarArgs) -> Value + 'static
    {
        Self {
            name: Rc::from(name.as_ref()),
            signature: None,
            func: Rc::new(func),
        }
    }

    pub
    fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(Rc::new(signature));
        self
    }

    pub
    fn name(&self) -> &str {
        &self.name
    }

    pub
    fn signature(&self) -> Option<&Signature> {
        self.signature.as_deref()
    }

    /// Validate the arguments against the signature, then invoke.
    pub
    fn call(&self, ev: &Evaluator, args: VarArgs) -> Value {
        if let Some(signature) = &self.signature {
            if let Err(e) = signature.check(&self.name, &args) {
                return Value::Error(e);
            }
        }

        (self.func)(ev, args)
    }
}

impl Debug for Function {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_fmt(format_args!("<function {}>", self.name))
    }
}

/// Positional and keyword arguments of a call, filter or test.
#[derive(Debug, Clone, Default)]
pub
struct VarArgs {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl VarArgs {
    pub
    fn new(args: Vec<Value>, kwargs: IndexMap<String, Value>) -> Self {
        Self { args, kwargs, }
    }

    pub
    fn positional(args: Vec<Value>) -> Self {
        Self { args, kwargs: IndexMap::new(), }
    }

    pub
    fn get(&self, idx: usize) -> Option<&Value> {
        self.args.get(idx)
    }

    pub
    fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// The positional argument at `idx`, or else the keyword `name`.
    pub
    fn arg(&self, idx: usize, name: &str) -> Option<&Value> {
        self.args.get(idx).or_else(|| self.kwargs.get(name))
    }

    pub
    fn len(&self) -> usize {
        self.args.len() + self.kwargs.len()
    }

    pub
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail when more than `max` positional arguments, or any keyword not
    /// in `allowed`, were passed.
    pub
    fn expect(&self, what: &str, max: usize, allowed: &[&str]) -> Result<(), EvalError> {
        if self.args.len() > max {
            return Err(EvalError::call(format!(
                "{} takes at most {} argument(s) but {} were given",
                what,
                max,
                self.args.len(),
            )));
        }

        if let Some(key) = self.kwargs.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(EvalError::call(format!(
                "{} got an unexpected keyword argument '{}'",
                what,
                key,
            )));
        }

        Ok(())
    }
}

/// A number extracted from a value for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

/// A dynamically typed template value.
///
/// `Error` values are how evaluation failures travel through expressions;
/// every operation checks its operands for them first.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str {
        text: Rc<str>,
        /// Already escaped, not to be escaped again on output.
        safe: bool,
    },
    List(Rc<Vec<Value>>),
    Dict(Rc<IndexMap<String, Value>>),
    Function(Function),
    Error(EvalError),
}

impl Value {
    /// A string marked as already escaped.
    pub
    fn safe<S: AsRef<str>>(text: S) -> Self {
        Self::Str { text: Rc::from(text.as_ref()), safe: true, }
    }

    pub
    fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(items))
    }

    pub
    fn dict(map: IndexMap<String, Value>) -> Self {
        Self::Dict(Rc::new(map))
    }

    pub
    fn function(f: Function) -> Self {
        Self::Function(f)
    }

    pub
    fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub
    fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub
    fn is_safe(&self) -> bool {
        matches!(self, Self::Str { safe: true, .. })
    }

    pub
    fn is_string(&self) -> bool {
        matches!(self, Self::Str { .. })
    }

    pub
    fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    pub
    fn error(&self) -> Option<&EvalError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Move an error value into `Err`.
    pub
    fn into_result(self) -> Result<Value, EvalError> {
        match self {
            Self::Error(e) => Err(e),
            v => Ok(v),
        }
    }

    pub
    fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str { .. } => "str",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Function(_) => "function",
            Self::Error(_) => "error",
        }
    }

    pub
    fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str { text, .. } => !text.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            Self::Function(_) => true,
            Self::Error(_) => false,
        }
    }

    pub
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the value; booleans count as integers.
    pub
    fn as_number(&self) -> Option<Number> {
        match self {
            Self::Bool(b) => Some(Number::Int(*b as i64)),
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    pub
    fn as_int(&self) -> Option<i64> {
        match self.as_number()? {
            Number::Int(i) => Some(i),
            Number::Float(_) => None,
        }
    }

    pub
    fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub
    fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// The number of items of a string, list or dict.
    pub
    fn len(&self) -> Option<usize> {
        match self {
            Self::Str { text, .. } => Some(text.chars().count()),
            Self::List(l) => Some(l.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }

    /// The value as printed by `{{ }}`.
    pub
    fn to_output(&self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Str { text, .. } => text.to_string(),
            Self::Error(e) => e.to_string(),
            v => v.repr(),
        }
    }

    /// A Python style representation, strings quoted.
    pub
    fn repr(&self) -> String {
        match self {
            Self::Nil => "None".to_owned(),
            Self::Bool(true) => "True".to_owned(),
            Self::Bool(false) => "False".to_owned(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Str { text, .. } => {
                let mut out = String::with_capacity(text.len() + 2);
                out.push('\'');
                for c in text.chars() {
                    match c {
                        '\'' => out.push_str("\\'"),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        c => out.push(c),
                    }
                }
                out.push('\'');
                out
            },
            Self::List(items) => {
                let items = items.iter().map(|v| v.repr()).collect::<Vec<String>>();
                format!("[{}]", items.join(", "))
            },
            Self::Dict(map) => {
                let items = map.iter()
                    .map(|(k, v)| format!("{}: {}", Value::from(k.as_str()).repr(), v.repr()))
                    .collect::<Vec<String>>();
                format!("{{{}}}", items.join(", "))
            },
            Self::Function(f) => format!("<function {}>", f.name()),
            Self::Error(e) => format!("<error {}>", e),
        }
    }

    /// Deep equality, with ints, floats and booleans compared numerically.
    pub
    fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Str { text: a, .. }, Self::Str { text: b, .. }) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            },
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| {
                    b.get(k).map_or(false, |w| v.equals(w))
                })
            },
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(&a.func, &b.func),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(Number::Int(x)), Some(Number::Int(y))) => x == y,
                (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
                _ => false,
            },
        }
    }

    /// Ordering for `<`, `<=`, `>` and `>=`.
    ///
    /// Numbers compare numerically. When either side is a string and
    /// neither is a number, the string forms are compared. Lists compare
    /// item by item.
    pub
    fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => return Ok(a.cmp(&b)),
            (Some(a), Some(b)) => {
                return a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(|| {
                    EvalError::type_error("cannot order NaN")
                });
            },
            (None, None) if self.is_string() || other.is_string() => {
                return Ok(self.to_output().cmp(&other.to_output()));
            },
            _ => (),
        }

        if let (Self::List(a), Self::List(b)) = (self, other) {
            for (x, y) in a.iter().zip(b.iter()) {
                match x.compare(y)? {
                    Ordering::Equal => continue,
                    ord => return Ok(ord),
                }
            }
            return Ok(a.len().cmp(&b.len()));
        }

        Err(EvalError::type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            self.type_name(),
            other.type_name(),
        )))
    }

    /// The items a `for` loop walks: list items, dict keys or characters.
    pub
    fn iterate(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Self::Nil => Ok(Vec::new()),
            Self::List(items) => Ok(items.as_ref().clone()),
            Self::Dict(map) => Ok(map.keys().map(|k| Value::from(k.as_str())).collect()),
            Self::Str { text, .. } => Ok(text.chars().map(|c| Value::from(c.to_string())).collect()),
            v => Err(EvalError::type_error(format!(
                "'{}' object is not iterable",
                v.type_name()
            ))),
        }
    }

    /// Membership for the `in` operator.
    pub
    fn contains(&self, item: &Value) -> Result<bool, EvalError> {
        match self {
            Self::List(items) => Ok(items.iter().any(|v| v.equals(item))),
            Self::Dict(map) => Ok(match item {
                Self::Str { text, .. } => map.contains_key(text.as_ref()),
                v if v.is_number() => map.contains_key(&v.to_output()),
                _ => false,
            }),
            Self::Str { text, .. } => match item {
                Self::Str { text: needle, .. } => Ok(text.contains(needle.as_ref())),
                v => Err(EvalError::type_error(format!(
                    "'in <string>' requires string as left operand, not {}",
                    v.type_name()
                ))),
            },
            v => Err(EvalError::type_error(format!(
                "argument of type '{}' is not iterable",
                v.type_name()
            ))),
        }
    }

    /// Item lookup: list or string index (negative from the end) or dict
    /// key. `None` when there is no such item.
    pub
    fn get_item(&self, key: &Value) -> Option<Value> {
        match self {
            Self::List(items) => {
                let idx = normalize_index(key.as_int()?, items.len())?;
                items.get(idx).cloned()
            },
            Self::Str { text, .. } => {
                let chars = text.chars().collect::<Vec<char>>();
                let idx = normalize_index(key.as_int()?, chars.len())?;
                chars.get(idx).map(|c| Value::from(c.to_string()))
            },
            Self::Dict(map) => match key {
                Self::Str { text, .. } => map.get(text.as_ref()).cloned(),
                k if k.is_number() || matches!(k, Self::Nil) => map.get(&k.to_output()).cloned(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Attribute lookup: built-in methods of strings, lists and dicts.
    pub
    fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Self::Dict(_) => dict_method(self, name),
            Self::Str { .. } => str_method(self, name),
            Self::List(_) => list_method(self, name),
            _ => None,
        }
    }

    /// `value[start:stop:step]` with Python semantics: negative bounds
    /// count from the end and out of range bounds are clamped.
    pub
    fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Value, EvalError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(EvalError::runtime("slice step cannot be zero"));
        }

        match self {
            Self::List(items) => {
                let indices = slice_indices(items.len(), start, stop, step);
                Ok(Value::list(indices.into_iter().map(|i| items[i].clone()).collect()))
            },
            Self::Str { text, safe } => {
                let chars = text.chars().collect::<Vec<char>>();
                let indices = slice_indices(chars.len(), start, stop, step);
                let sliced = indices.into_iter().map(|i| chars[i]).collect::<String>();
                Ok(Self::Str { text: Rc::from(sliced), safe: *safe, })
            },
            Self::Nil => Ok(Self::Nil),
            v => Err(EvalError::type_error(format!(
                "'{}' object is not subscriptable",
                v.type_name()
            ))),
        }
    }

    /// Convert into JSON, failing for functions and errors.
    pub
    fn to_json(&self) -> Result<JsonValue, EvalError> {
        Ok(match self {
            Self::Nil => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => JsonNumber::from_f64(*f).map(JsonValue::Number).unwrap_or(JsonValue::Null),
            Self::Str { text, .. } => JsonValue::String(text.to_string()),
            Self::List(items) => JsonValue::Array(
                items.iter().map(|v| v.to_json()).collect::<Result<Vec<JsonValue>, EvalError>>()?
            ),
            Self::Dict(map) => {
                let mut out = JsonMap::new();
                for (k, v) in map.iter() {
                    out.insert(k.clone(), v.to_json()?);
                }
                JsonValue::Object(out)
            },
            Self::Function(f) => {
                return Err(EvalError::type_error(format!(
                    "function {} is not JSON serializable", f.name()
                )));
            },
            Self::Error(e) => return Err(e.clone()),
        })
    }
}

pub(crate)
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    }
    else if f.is_infinite() {
        if f > 0.0 { "inf".to_owned() } else { "-inf".to_owned() }
    }
    else if f == f.trunc() && f.abs() < 1e16 {
        format!("{:.1}", f)
    }
    else {
        format!("{}", f)
    }
}

fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if idx < 0 { idx + len } else { idx };
    if idx < 0 || idx >= len {
        return None;
    }
    Some(idx as usize)
}

fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let adjust = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };

    let mut out = Vec::new();
    if step > 0 {
        let start = start.map(|s| adjust(s, 0, len)).unwrap_or(0);
        let stop = stop.map(|s| adjust(s, 0, len)).unwrap_or(len);
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }
    else {
        let start = start.map(|s| adjust(s, -1, len - 1)).unwrap_or(len - 1);
        let stop = stop.map(|s| adjust(s, -1, len - 1)).unwrap_or(-1);
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }
    out
}

fn string_arg(args: &VarArgs, idx: usize, name: &str) -> Option<String> {
    args.arg(idx, name).and_then(|v| v.as_str().map(|s| s.to_owned()))
}

fn bound<F>(this: &Value, name: &str, f: F) -> Value
where
    F: Fn(&Value, &VarArgs) -> Value + 'static
{
    let this = this.clone();
    Value::Function(Function::new(name, move |_, args| f(&this, &args)))
}

fn dict_method(this: &Value, name: &str) -> Option<Value> {
    let method = match name {
        "items" => bound(this, name, |v, _| {
            let map = v.as_dict().cloned().unwrap_or_default();
            Value::list(map.into_iter()
                .map(|(k, v)| Value::list(vec![ Value::from(k), v, ]))
                .collect())
        }),
        "keys" => bound(this, name, |v, _| {
            let map = v.as_dict().cloned().unwrap_or_default();
            Value::list(map.into_keys().map(Value::from).collect())
        }),
        "values" => bound(this, name, |v, _| {
            let map = v.as_dict().cloned().unwrap_or_default();
            Value::list(map.into_values().collect())
        }),
        "get" => bound(this, name, |v, args| {
            let key = args.arg(0, "key").cloned().unwrap_or(Value::Nil);
            v.get_item(&key)
                .unwrap_or_else(|| args.arg(1, "default").cloned().unwrap_or(Value::Nil))
        }),
        _ => return None,
    };

    Some(method)
}

fn str_method(this: &Value, name: &str) -> Option<Value> {
    fn text(v: &Value) -> String {
        v.as_str().unwrap_or_default().to_owned()
    }

    let method = match name {
        "upper" => bound(this, name, |v, _| Value::from(text(v).to_uppercase())),
        "lower" => bound(this, name, |v, _| Value::from(text(v).to_lowercase())),
        "strip" => bound(this, name, |v, args| match string_arg(args, 0, "chars") {
            Some(chars) => Value::from(text(v).trim_matches(|c| chars.contains(c)).to_owned()),
            None => Value::from(text(v).trim().to_owned()),
        }),
        "lstrip" => bound(this, name, |v, args| match string_arg(args, 0, "chars") {
            Some(chars) => Value::from(text(v).trim_start_matches(|c| chars.contains(c)).to_owned()),
            None => Value::from(text(v).trim_start().to_owned()),
        }),
        "rstrip" => bound(this, name, |v, args| match string_arg(args, 0, "chars") {
            Some(chars) => Value::from(text(v).trim_end_matches(|c| chars.contains(c)).to_owned()),
            None => Value::from(text(v).trim_end().to_owned()),
        }),
        "startswith" => bound(this, name, |v, args| match string_arg(args, 0, "prefix") {
            Some(prefix) => Value::Bool(text(v).starts_with(&prefix)),
            None => Value::Error(EvalError::call("startswith() requires a string argument")),
        }),
        "endswith" => bound(this, name, |v, args| match string_arg(args, 0, "suffix") {
            Some(suffix) => Value::Bool(text(v).ends_with(&suffix)),
            None => Value::Error(EvalError::call("endswith() requires a string argument")),
        }),
        "split" => bound(this, name, |v, args| {
            let s = text(v);
            let parts = match string_arg(args, 0, "sep") {
                Some(sep) if sep.is_empty() => {
                    return Value::Error(EvalError::runtime("empty separator"));
                },
                Some(sep) => s.split(sep.as_str()).map(Value::from).collect(),
                None => s.split_whitespace().map(Value::from).collect(),
            };
            Value::list(parts)
        }),
        "replace" => bound(this, name, |v, args| {
            match (string_arg(args, 0, "old"), string_arg(args, 1, "new")) {
                (Some(old), Some(new)) => Value::from(text(v).replace(&old, &new)),
                _ => Value::Error(EvalError::call("replace() requires two string arguments")),
            }
        }),
        "title" => bound(this, name, |v, _| Value::from(title_case(&text(v)))),
        "capitalize" => bound(this, name, |v, _| Value::from(capitalize(&text(v)))),
        _ => return None,
    };

    Some(method)
}

fn list_method(this: &Value, name: &str) -> Option<Value> {
    let method = match name {
        "index" => bound(this, name, |v, args| {
            let needle = args.arg(0, "value").cloned().unwrap_or(Value::Nil);
            let items = v.as_list().unwrap_or_default();
            match items.iter().position(|item| item.equals(&needle)) {
                Some(idx) => Value::Int(idx as i64),
                None => Value::Error(EvalError::runtime(format!(
                    "{} is not in list", needle.repr()
                ))),
            }
        }),
        "count" => bound(this, name, |v, args| {
            let needle = args.arg(0, "value").cloned().unwrap_or(Value::Nil);
            let items = v.as_list().unwrap_or_default();
            Value::Int(items.iter().filter(|item| item.equals(&needle)).count() as i64)
        }),
        _ => return None,
    };

    Some(method)
}

pub(crate)
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

pub(crate)
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            }
            else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        }
        else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

impl Debug for Value {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Str { safe: true, .. } => fmtr.write_fmt(format_args!("Safe({})", self.repr())),
            Self::Error(e) => fmtr.write_fmt(format_args!("Error({:?})", e)),
            _ => fmtr.write_str(&self.repr()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_str(&self.to_output())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Error(a), Self::Error(b)) => a == b,
            (a, b) => a.equals(b),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str { text: Rc::from(s), safe: false, }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str { text: Rc::from(s), safe: false, }
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::dict(map)
    }
}

impl From<EvalError> for Value {
    fn from(e: EvalError) -> Self {
        Self::Error(e)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(|v| v.into()).unwrap_or(Self::Nil)
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Nil,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::from(s.as_str()),
            JsonValue::Array(items) => Self::list(items.iter().map(Value::from).collect()),
            JsonValue::Object(map) => Self::dict(map.iter()
                .map(|(k, v)| (k.clone(), Value::from(v)))
                .collect()),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Self::from(&json)
    }
}
