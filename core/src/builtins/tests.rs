//! The built-in tests.
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
        builtins::Tests,
        context::Context,
        error::EvalError,
        value::{
            Value,
            VarArgs,
        },
    },
    std::{
        cmp::Ordering,
        rc::Rc,
    },
};

type TestResult = Result<bool, EvalError>;

pub(crate)
fn register(tests: &mut Tests) {
    tests.register_undefined_aware("defined", |_: &Context, v: &Value, args: &VarArgs| {
        args.expect("defined", 0, &[])?;
        Ok(!v.is_error())
    });
    tests.register_undefined_aware("undefined", |_: &Context, v: &Value, args: &VarArgs| {
        args.expect("undefined", 0, &[])?;
        Ok(v.is_error())
    });

    tests.register("none", kind(|v| v.is_nil()));
    tests.register("boolean", kind(|v| matches!(v, Value::Bool(_))));
    tests.register("true", kind(|v| matches!(v, Value::Bool(true))));
    tests.register("false", kind(|v| matches!(v, Value::Bool(false))));
    tests.register("number", kind(|v| v.is_number()));
    tests.register("integer", kind(|v| matches!(v, Value::Int(_))));
    tests.register("float", kind(|v| matches!(v, Value::Float(_))));
    tests.register("string", kind(|v| v.is_string()));
    tests.register("mapping", kind(|v| matches!(v, Value::Dict(_))));
    tests.register("iterable", kind(|v| v.iterate().is_ok() && !v.is_nil()));
    tests.register("sequence", kind(|v| v.len().is_some()));
    tests.register("callable", kind(|v| matches!(v, Value::Function(_))));
    tests.register("escaped", kind(|v| v.is_safe()));
    tests.register("lower", kind(|v| v.as_str().map_or(false, |s| s.to_lowercase() == s)));
    tests.register("upper", kind(|v| v.as_str().map_or(false, |s| s.to_uppercase() == s)));

    tests.register("odd", |_: &Context, v: &Value, args: &VarArgs| {
        args.expect("odd", 0, &[])?;
        Ok(integer(v, "odd")?.rem_euclid(2) == 1)
    });
    tests.register("even", |_: &Context, v: &Value, args: &VarArgs| {
        args.expect("even", 0, &[])?;
        Ok(integer(v, "even")?.rem_euclid(2) == 0)
    });
    tests.register("divisibleby", divisible_by);

    for name in [ "eq", "==", "equalto", ] {
        tests.register(name, |_: &Context, v: &Value, args: &VarArgs| {
            Ok(v.equals(operand(args, "eq")?))
        });
    }
    for name in [ "ne", "!=", ] {
        tests.register(name, |_: &Context, v: &Value, args: &VarArgs| {
            Ok(!v.equals(operand(args, "ne")?))
        });
    }
    for name in [ "lt", "<", "lessthan", ] {
        tests.register(name, order(&[ Ordering::Less, ]));
    }
    for name in [ "le", "<=", ] {
        tests.register(name, order(&[ Ordering::Less, Ordering::Equal, ]));
    }
    for name in [ "gt", ">", "greaterthan", ] {
        tests.register(name, order(&[ Ordering::Greater, ]));
    }
    for name in [ "ge", ">=", ] {
        tests.register(name, order(&[ Ordering::Greater, Ordering::Equal, ]));
    }

    tests.register("in", |_: &Context, v: &Value, args: &VarArgs| {
        operand(args, "in")?.contains(v)
    });
    tests.register("sameas", |_: &Context, v: &Value, args: &VarArgs| {
        Ok(same(v, operand(args, "sameas")?))
    });
}

// A test of the value's type alone.
fn kind<F>(f: F) -> impl Fn(&Context, &Value, &VarArgs) -> TestResult + Send + Sync + 'static
where
    F: Fn(&Value) -> bool + Send + Sync + 'static
{
    move |_, value, args| {
        args.expect("test", 0, &[])?;
        Ok(f(value))
    }
}

fn order(accepted: &'static [Ordering]) -> impl Fn(&Context, &Value, &VarArgs) -> TestResult + Send + Sync + 'static {
    move |_, value, args| {
        let other = operand(args, "comparison")?;
        Ok(accepted.contains(&value.compare(other)?))
    }
}

// The single argument of a comparison test.
fn operand<'a>(args: &'a VarArgs, test: &str) -> Result<&'a Value, EvalError> {
    args.expect(test, 1, &[ "value", ])?;
    args.arg(0, "value").ok_or_else(|| EvalError::call(format!(
        "test '{}' requires an argument",
        test,
    )))
}

fn integer(value: &Value, test: &str) -> Result<i64, EvalError> {
    match value {
        Value::Int(i) => Ok(*i),
        v => Err(EvalError::type_error(format!(
            "test '{}' requires an integer, not {}",
            test,
            v.type_name(),
        ))),
    }
}

fn divisible_by(_: &Context, value: &Value, args: &VarArgs) -> TestResult {
    let divisor = operand(args, "divisibleby")?;
    let divisor = integer(divisor, "divisibleby")?;
    if divisor == 0 {
        return Err(EvalError::runtime("division by zero"));
    }
    Ok(integer(value, "divisibleby")?.rem_euclid(divisor) == 0)
}

// Identity: containers by reference, everything else by type and value.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y),
        (Value::Dict(x), Value::Dict(y)) => Rc::ptr_eq(x, y),
        (Value::Function(_), Value::Function(_)) => a.equals(b),
        _ => a.type_name() == b.type_name() && a.equals(b),
    }
}
