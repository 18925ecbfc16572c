//! The built-in global functions.
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

use crate::{
    builtins::Globals,
    error::EvalError,
    eval::Evaluator,
    value::{
        Value,
        VarArgs,
    },
};

pub(crate)
fn register(globals: &mut Globals) {
    globals.register("range", |_: &Evaluator, args: VarArgs| {
        range(&args).unwrap_or_else(Value::Error)
    });
    globals.register("dict", |_: &Evaluator, args: VarArgs| {
        if !args.args.is_empty() {
            return Value::Error(EvalError::call("dict() takes keyword arguments only"));
        }
        Value::dict(args.kwargs)
    });
    globals.register("raise_exception", |_: &Evaluator, args: VarArgs| {
        let message = args.arg(0, "message")
            .map(|v| v.to_output())
            .unwrap_or_else(|| "exception raised from template".to_owned());
        Value::Error(EvalError::runtime(message))
    });
}

fn integer(args: &VarArgs, idx: usize) -> Result<Option<i64>, EvalError> {
    match args.get(idx) {
        None => Ok(None),
        Some(v) => v.as_int().map(Some).ok_or_else(|| EvalError::type_error(format!(
            "range() arguments must be integers, not {}",
            v.type_name(),
        ))),
    }
}

// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
fn range(args: &VarArgs) -> Result<Value, EvalError> {
    args.expect("range()", 3, &[])?;
    let (start, stop) = match (integer(args, 0)?, integer(args, 1)?) {
        (Some(stop), None) => (0, stop),
        (Some(start), Some(stop)) => (start, stop),
        _ => return Err(EvalError::call("range() expected at least 1 argument")),
    };
    let step = integer(args, 2)?.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::runtime("range() step must not be zero"));
    }

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(Value::list(out))
}
