//! Expression evaluation for the Tessera Templating Engine.
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
            EvalError,
            EvalErrorKind,
        },
        nodes::{
            BinaryOp,
            Const,
            Expr,
            Invocation,
            UnaryOp,
        },
        render::escape,
        value::{
            Number,
            Value,
            VarArgs,
        },
    },
    indexmap::IndexMap,
    std::{
        cmp::Ordering,
        rc::Rc,
    },
};

/// The most bytes of a string, or items of a list, `*` may produce.
const MAX_REPEAT_LEN: usize = 1 << 24;

macro_rules! check {
    ($value:expr) => {
        match $value {
            Value::Error(e) => return Value::Error(e),
            v => v,
        }
    };
}

/// Computes [`Value`]s from expressions against a [`Context`].
///
/// Failures never panic or return early through `Result`: they become
/// [`Value::Error`] and flow outwards, gaining the text of every enclosing
/// expression on the way.
#[derive(Clone)]
pub
struct Evaluator<'e> {
    env: &'e Environment,
    ctx: Rc<Context>,
    auto_escape: bool,
    strict: bool,
    depth: usize,
}

impl<'e> Evaluator<'e> {
    pub
    fn new(env: &'e Environment, ctx: Rc<Context>, auto_escape: bool) -> Self {
        Self {
            env,
            ctx,
            auto_escape,
            strict: env.config().strict_undefined,
            depth: 0,
        }
    }

    /// The same evaluator, nested `depth` renders deep.
    pub(crate)
    fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// How many includes, imports and macro calls enclose the evaluation.
    pub
    fn depth(&self) -> usize {
        self.depth
    }

    pub
    fn env(&self) -> &'e Environment {
        self.env
    }

    pub
    fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    /// Whether output is being escaped at this point of the render.
    pub
    fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    pub
    fn strict(&self) -> bool {
        self.strict
    }

    /// An evaluator over another context, keeping every other setting.
    pub
    fn with_context(&self, ctx: Rc<Context>) -> Evaluator<'e> {
        Self {
            env: self.env,
            ctx,
            auto_escape: self.auto_escape,
            strict: self.strict,
            depth: self.depth,
        }
    }

    // An evaluator that reports undefined names as errors, so tests and
    // filters that care about undefined-ness can tell them from `none`.
    fn probing(&self) -> Evaluator<'e> {
        Self {
            strict: true,
            ..self.clone()
        }
    }

    fn undefined(&self, message: String) -> Value {
        if self.strict {
            return Value::Error(EvalError::undefined(message));
        }

        Value::Nil
    }

    /// Evaluate an expression.
    pub
    fn eval(&self, expr: &Expr) -> Value {
        match self.eval_inner(expr) {
            Value::Error(e) => Value::Error(e.with_context(expr.to_string())),
            v => v,
        }
    }

    fn eval_inner(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(c, _) => match c {
                Const::None => Value::Nil,
                Const::Bool(b) => Value::Bool(*b),
                Const::Int(i) => Value::Int(*i),
                Const::Float(f) => Value::Float(*f),
                Const::Str(s) => Value::from(s.as_str()),
            },
            Expr::Name(name, _) => match self.ctx.get(name) {
                Some(v) => v,
                None => self.undefined(format!("'{}' is undefined", name)),
            },
            Expr::List(items, _) | Expr::Tuple(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(check!(self.eval(item)));
                }
                Value::list(values)
            },
            Expr::Dict(pairs, _) => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (k, v) in pairs.iter() {
                    let key = match check!(self.eval(k)) {
                        Value::Str { text, .. } => text.to_string(),
                        key if key.is_number() || key.is_nil() => key.to_output(),
                        key => return Value::Error(EvalError::type_error(format!(
                            "dict keys must be strings, not {}",
                            key.type_name(),
                        ))),
                    };
                    map.insert(key, check!(self.eval(v)));
                }
                Value::dict(map)
            },
            Expr::Unary(op, operand, _) => {
                let value = check!(self.eval(operand));
                unary(*op, value)
            },
            Expr::Binary(BinaryOp::And, left, right, _) => {
                let left = check!(self.eval(left));
                if !left.is_truthy() {
                    return left;
                }
                self.eval(right)
            },
            Expr::Binary(BinaryOp::Or, left, right, _) => {
                let left = check!(self.eval(left));
                if left.is_truthy() {
                    return left;
                }
                self.eval(right)
            },
            Expr::Binary(op, left, right, _) => {
                let left = check!(self.eval(left));
                let right = check!(self.eval(right));
                binary(*op, left, right, self.auto_escape)
            },
            Expr::GetAttr(target, attr, _) => {
                let target = check!(self.eval(target));
                self.get_attr(&target, attr)
            },
            Expr::GetItem(target, index, _) => {
                let target = check!(self.eval(target));
                let index = check!(self.eval(index));
                self.get_item(&target, &index)
            },
            Expr::GetSlice { target, start, stop, step, .. } => {
                let target = check!(self.eval(target));
                let mut bounds = [ None, None, None, ];
                for (idx, bound) in [ start, stop, step, ].into_iter().enumerate() {
                    if let Some(bound) = bound {
                        bounds[idx] = match check!(self.eval(bound)) {
                            Value::Nil => None,
                            v => match v.as_int() {
                                Some(i) => Some(i),
                                None => return Value::Error(EvalError::type_error(format!(
                                    "slice indices must be integers or none, not {}",
                                    v.type_name(),
                                ))),
                            },
                        };
                    }
                }
                match target.slice(bounds[0], bounds[1], bounds[2]) {
                    Ok(v) => v,
                    Err(e) => Value::Error(e),
                }
            },
            Expr::Call { target, args, kwargs, .. } => {
                let target = check!(self.eval(target));
                let args = match self.eval_arguments(args, kwargs) {
                    Ok(args) => args,
                    Err(e) => return Value::Error(e),
                };
                self.call(&target, args)
            },
            Expr::Filtered(expr, filters) => self.eval_filters(expr, filters),
            Expr::Test { expr, test, negated } => self.eval_test(expr, test, *negated),
            Expr::Undefined(name, _) => Value::Error(EvalError::undefined(format!(
                "parameter '{}' was not given", name
            ))),
        }
    }

    /// Evaluate call arguments, stopping at the first error.
    pub
    fn eval_arguments(&self, args: &[Expr], kwargs: &[(String, Expr)]) -> Result<VarArgs, EvalError> {
        let mut out = VarArgs::default();
        for arg in args.iter() {
            out.args.push(self.eval(arg).into_result()?);
        }
        for (name, arg) in kwargs.iter() {
            out.kwargs.insert(name.clone(), self.eval(arg).into_result()?);
        }
        Ok(out)
    }

    /// Attribute access: methods first, then items.
    pub
    fn get_attr(&self, target: &Value, attr: &str) -> Value {
        if let Some(v) = target.get_attr(attr) {
            return v;
        }

        let key = match attr.parse::<i64>() {
            Ok(i) if target.as_list().is_some() => Value::Int(i),
            _ => Value::from(attr),
        };
        if let Some(v) = target.get_item(&key) {
            return v;
        }

        self.undefined(format!("{} has no attribute '{}'", target.type_name(), attr))
    }

    /// Item access: items first, then attributes named by a string key.
    pub
    fn get_item(&self, target: &Value, index: &Value) -> Value {
        if let Some(v) = target.get_item(index) {
            return v;
        }

        if let Some(v) = index.as_str().and_then(|name| target.get_attr(name)) {
            return v;
        }

        match target {
            Value::List(_) | Value::Str { .. } if index.as_int().is_some() => {
                self.undefined(format!("index {} is out of range", index.repr()))
            },
            Value::List(_) | Value::Str { .. } | Value::Dict(_) | Value::Nil => {
                self.undefined(format!("{} has no item {}", target.type_name(), index.repr()))
            },
            t => Value::Error(EvalError::type_error(format!(
                "'{}' object is not subscriptable",
                t.type_name(),
            ))),
        }
    }

    /// Invoke a callable value.
    pub
    fn call(&self, target: &Value, args: VarArgs) -> Value {
        match target {
            Value::Function(f) => f.call(self, args),
            Value::Nil if !self.strict => Value::Error(EvalError::undefined(
                "cannot call an undefined value"
            )),
            t => Value::Error(EvalError::type_error(format!(
                "'{}' object is not callable",
                t.type_name(),
            ))),
        }
    }

    /// Apply the registered filter `name`.
    pub
    fn apply_filter(&self, name: &str, input: Value, args: &VarArgs) -> Value {
        let filter = match self.env.filters().get(name) {
            Some(f) => f,
            None => return Value::Error(EvalError::new(
                EvalErrorKind::Unknown,
                format!("no filter named '{}'", name),
            )),
        };

        if let Value::Error(e) = &input {
            if !(filter.undefined_aware() && e.is_undefined()) {
                return input;
            }
        }

        filter.call(self, input, args)
    }

    /// Apply the registered test `name`.
    pub
    fn apply_test(&self, name: &str, input: &Value, args: &VarArgs) -> Result<bool, EvalError> {
        let test = self.env.tests().get(name).ok_or_else(|| EvalError::new(
            EvalErrorKind::Unknown,
            format!("no test named '{}'", name),
        ))?;

        if let Value::Error(e) = input {
            if !(test.undefined_aware() && e.is_undefined()) {
                return Err(e.clone());
            }
        }

        test.call(&self.ctx, input, args)
    }

    fn eval_filters(&self, expr: &Expr, filters: &[Invocation]) -> Value {
        let aware = filters.first()
            .and_then(|f| self.env.filters().get(&f.name))
            .map_or(false, |f| f.undefined_aware());

        let value = if aware {
            self.probing().eval(expr)
        }
        else {
            check!(self.eval(expr))
        };

        self.apply_filters(value, filters)
    }

    /// Pipe `value` through each filter of `filters` in turn.
    pub
    fn apply_filters(&self, mut value: Value, filters: &[Invocation]) -> Value {
        for filter in filters.iter() {
            let args = match self.eval_arguments(&filter.args, &filter.kwargs) {
                Ok(args) => args,
                Err(e) => return Value::Error(e),
            };
            value = match self.apply_filter(&filter.name, value, &args) {
                Value::Error(e) => return Value::Error(e.with_context(filter.to_string())),
                v => v,
            };
        }

        value
    }

    fn eval_test(&self, expr: &Expr, test: &Invocation, negated: bool) -> Value {
        let aware = self.env.tests().get(&test.name).map_or(false, |t| t.undefined_aware());

        let value = if aware {
            self.probing().eval(expr)
        }
        else {
            check!(self.eval(expr))
        };

        let args = match self.eval_arguments(&test.args, &test.kwargs) {
            Ok(args) => args,
            Err(e) => return Value::Error(e),
        };

        match self.apply_test(&test.name, &value, &args) {
            Ok(b) => Value::Bool(b != negated),
            Err(e) => Value::Error(e),
        }
    }
}

fn type_mismatch(op: &str, left: &Value, right: &Value) -> Value {
    Value::Error(EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name(),
    )))
}

fn overflow() -> Value {
    Value::Error(EvalError::runtime("integer overflow"))
}

fn unary(op: UnaryOp, value: Value) -> Value {
    match (op, value.as_number()) {
        (UnaryOp::Not, _) => Value::Bool(!value.is_truthy()),
        (UnaryOp::Neg, Some(Number::Int(i))) => i.checked_neg().map_or_else(overflow, Value::Int),
        (UnaryOp::Neg, Some(Number::Float(f))) => Value::Float(-f),
        (UnaryOp::Pos, Some(Number::Int(i))) => Value::Int(i),
        (UnaryOp::Pos, Some(Number::Float(f))) => Value::Float(f),
        (_, None) => Value::Error(EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            value.type_name(),
        ))),
    }
}

/// Join the string forms of two values. When auto-escaping and either side
/// is safe, the other side is escaped and the result is safe.
pub(crate)
fn concat(left: &Value, right: &Value, auto_escape: bool) -> Value {
    if auto_escape && (left.is_safe() || right.is_safe()) {
        let render = |v: &Value| match v.is_safe() {
            true => v.to_output(),
            false => escape(&v.to_output()),
        };
        return Value::safe(format!("{}{}", render(left), render(right)));
    }

    let joined = format!("{}{}", left.to_output(), right.to_output());
    if left.is_safe() && right.is_safe() {
        return Value::safe(joined);
    }

    Value::from(joined)
}

fn repeat(items: &Value, times: i64) -> Value {
    let times = usize::try_from(times).unwrap_or(0);
    let too_long = || Value::Error(EvalError::runtime(format!(
        "repeating {} {} times exceeds the maximum length of {}",
        items.type_name(),
        times,
        MAX_REPEAT_LEN,
    )));

    match items {
        Value::Str { text, safe } => match text.len().checked_mul(times) {
            Some(len) if len <= MAX_REPEAT_LEN => Value::Str {
                text: Rc::from(text.repeat(times)),
                safe: *safe,
            },
            _ => too_long(),
        },
        Value::List(list) => match list.len().checked_mul(times) {
            Some(len) if len <= MAX_REPEAT_LEN => {
                let mut out = Vec::with_capacity(len);
                for _ in 0..times {
                    out.extend(list.iter().cloned());
                }
                Value::list(out)
            },
            _ => too_long(),
        },
        v => Value::Error(EvalError::type_error(format!(
            "can't multiply sequence of type '{}'", v.type_name()
        ))),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        return q.checked_sub(1);
    }
    Some(q)
}

fn modulo(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        return Some(r + b);
    }
    Some(r)
}

/// Apply a binary operator to two evaluated, non-error operands.
pub(crate)
fn binary(op: BinaryOp, left: Value, right: Value, auto_escape: bool) -> Value {
    use Number::{ Float, Int, };

    let result = match op {
        BinaryOp::Eq => return Value::Bool(left.equals(&right)),
        BinaryOp::Ne => return Value::Bool(!left.equals(&right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            return match left.compare(&right) {
                Ok(ord) => Value::Bool(match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                }),
                Err(e) => Value::Error(e),
            };
        },
        BinaryOp::In | BinaryOp::NotIn => {
            return match right.contains(&left) {
                Ok(b) => Value::Bool(b == (op == BinaryOp::In)),
                Err(e) => Value::Error(e),
            };
        },
        BinaryOp::Concat => return concat(&left, &right, auto_escape),
        BinaryOp::And | BinaryOp::Or => {
            // short circuiting happens in the evaluator
            return if (op == BinaryOp::And) == left.is_truthy() { right } else { left };
        },
        _ => (left.as_number(), right.as_number()),
    };

    match (op, result) {
        (BinaryOp::Add, (Some(Int(a)), Some(Int(b)))) => a.checked_add(b).map_or_else(overflow, Value::Int),
        (BinaryOp::Sub, (Some(Int(a)), Some(Int(b)))) => a.checked_sub(b).map_or_else(overflow, Value::Int),
        (BinaryOp::Mul, (Some(Int(a)), Some(Int(b)))) => a.checked_mul(b).map_or_else(overflow, Value::Int),
        (BinaryOp::Add, (Some(a), Some(b))) => Value::Float(a.as_f64() + b.as_f64()),
        (BinaryOp::Sub, (Some(a), Some(b))) => Value::Float(a.as_f64() - b.as_f64()),
        (BinaryOp::Mul, (Some(a), Some(b))) => Value::Float(a.as_f64() * b.as_f64()),
        (BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod, (Some(_), Some(b))) if b.as_f64() == 0.0 => {
            Value::Error(EvalError::runtime("division by zero"))
        },
        (BinaryOp::Div, (Some(a), Some(b))) => Value::Float(a.as_f64() / b.as_f64()),
        (BinaryOp::FloorDiv, (Some(Int(a)), Some(Int(b)))) => floor_div(a, b).map_or_else(overflow, Value::Int),
        (BinaryOp::FloorDiv, (Some(a), Some(b))) => Value::Float((a.as_f64() / b.as_f64()).floor()),
        (BinaryOp::Mod, (Some(Int(a)), Some(Int(b)))) => modulo(a, b).map_or_else(overflow, Value::Int),
        (BinaryOp::Mod, (Some(a), Some(b))) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            Value::Float(a - b * (a / b).floor())
        },
        (BinaryOp::Pow, (Some(Int(a)), Some(Int(b)))) if b >= 0 => match u32::try_from(b) {
            Ok(b) => a.checked_pow(b).map_or_else(overflow, Value::Int),
            Err(_) => overflow(),
        },
        (BinaryOp::Pow, (Some(a), Some(b))) => Value::Float(a.as_f64().powf(b.as_f64())),
        (BinaryOp::Add, _) => match (&left, &right) {
            (Value::Str { .. }, Value::Str { .. }) => concat(&left, &right, auto_escape),
            (Value::List(a), Value::List(b)) => {
                let mut out = a.as_ref().clone();
                out.extend(b.iter().cloned());
                Value::list(out)
            },
            _ => type_mismatch(op.symbol(), &left, &right),
        },
        (BinaryOp::Mul, (None, Some(Int(n)))) => repeat(&left, n),
        (BinaryOp::Mul, (Some(Int(n)), None)) => repeat(&right, n),
        _ => type_mismatch(op.symbol(), &left, &right),
    }
}
