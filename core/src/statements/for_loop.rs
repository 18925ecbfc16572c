//! The `for` control structure.
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
        error::{
            EvalError,
            Result,
        },
        nodes::{
            Expr,
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
        token::Token,
        value::{
            Function,
            Value,
        },
    },
    indexmap::IndexMap,
    std::rc::Rc,
};

/// `{% for a[, b] in items [if cond] %}…[{% else %}…]{% endfor %}`
#[derive(Debug, Clone)]
pub
struct ForStatement {
    pub targets: Vec<String>,
    pub iterable: Expr,
    pub condition: Option<Expr>,
    pub body: Wrapper,
    pub otherwise: Option<Wrapper>,
    pub token: Token,
}

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let targets = args.parse_targets()?;
    let token = targets[0].clone();
    if targets.len() > 2 {
        return Err(args.invalid("a for loop takes one or two targets", &targets[2]));
    }

    args.expect_keyword(exp::IN)?;
    let iterable = args.parse_expression()?;
    let condition = match args.match_name(exp::IF)? {
        true => Some(args.parse_expression()?),
        false => None,
    };

    let (body, mut end) = parser.wrap_until(&[ tag::ELSE, tag::ENDFOR, ])?;
    end.expect_end()?;

    let otherwise = match body.end_tag.as_deref() {
        Some(tag::ELSE) => {
            let (otherwise, mut end) = parser.wrap_until(&[ tag::ENDFOR, ])?;
            end.expect_end()?;
            Some(otherwise)
        },
        _ => None,
    };

    Ok(Statement::For(ForStatement {
        targets: targets.into_iter().map(|t| t.text).collect(),
        iterable,
        condition,
        body,
        otherwise,
        token,
    }))
}

impl ForStatement {
    // The values bound to the targets for one item.
    fn bindings(&self, key: Value, item: Value) -> std::result::Result<Vec<Value>, EvalError> {
        if self.targets.len() == 1 {
            return Ok(vec![ item, ]);
        }

        if let Value::Str { .. } = key {
            return Ok(vec![ key, item, ]);
        }

        match item.as_list() {
            Some(pair) if pair.len() == 2 => Ok(pair.to_vec()),
            _ => Err(EvalError::type_error(format!(
                "cannot unpack {} into {} targets",
                item.repr(),
                self.targets.len(),
            ))),
        }
    }

    // Ordered (key, item) pairs: dict keys and values, or list indices and
    // items.
    fn pairs(&self, iterable: &Value) -> std::result::Result<Vec<(Value, Value)>, EvalError> {
        match iterable {
            Value::Dict(map) => Ok(map.iter()
                .map(|(k, v)| {
                    let key = Value::from(k.as_str());
                    match self.targets.len() {
                        1 => (key.clone(), key),
                        _ => (key, v.clone()),
                    }
                })
                .collect()),
            v => Ok(v.iterate()?
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item))
                .collect()),
        }
    }

    fn bind(&self, frame: &Rc<Context>, values: Vec<Value>) {
        for (target, value) in self.targets.iter().zip(values) {
            frame.set(target.as_str(), value);
        }
    }

    pub(crate)
    fn execute(&self, r: &mut Renderer<'_>, ctx: &Rc<Context>, out: &mut String) -> Result<()> {
        let iterable = r.eval(&self.iterable, ctx)?;
        let pairs = self.pairs(&iterable).map_err(|e| r.fail(e, self.iterable.token()))?;

        let mut items = Vec::with_capacity(pairs.len());
        for (key, item) in pairs {
            let values = self.bindings(key, item).map_err(|e| r.fail(e, &self.token))?;
            if let Some(condition) = &self.condition {
                let probe = ctx.inherit();
                self.bind(&probe, values.clone());
                if !r.eval(condition, &probe)?.is_truthy() {
                    continue;
                }
            }
            items.push(values);
        }

        if items.is_empty() {
            if let Some(otherwise) = &self.otherwise {
                return r.render_wrapper(otherwise, ctx, out);
            }
            return Ok(());
        }

        let length = items.len();
        let seen = items.iter()
            .map(|v| match v.as_slice() {
                [ item, ] => item.clone(),
                values => Value::list(values.to_vec()),
            })
            .collect::<Vec<Value>>();
        for (idx, values) in items.into_iter().enumerate() {
            let frame = ctx.inherit();
            self.bind(&frame, values);
            frame.set(exp::LOOP, loop_object(idx, length, &seen));
            r.render_wrapper(&self.body, &frame, out)?;
        }

        Ok(())
    }
}

fn loop_object(idx: usize, length: usize, items: &[Value]) -> Value {
    let mut map = IndexMap::new();
    map.insert("index".to_owned(), Value::from(idx + 1));
    map.insert("index0".to_owned(), Value::from(idx));
    map.insert("revindex".to_owned(), Value::from(length - idx));
    map.insert("revindex0".to_owned(), Value::from(length - idx - 1));
    map.insert("first".to_owned(), Value::Bool(idx == 0));
    map.insert("last".to_owned(), Value::Bool(idx + 1 == length));
    map.insert("length".to_owned(), Value::from(length));
    map.insert("depth".to_owned(), Value::from(1_usize));
    map.insert(
        "previtem".to_owned(),
        idx.checked_sub(1).and_then(|i| items.get(i)).cloned().unwrap_or_default(),
    );
    map.insert("nextitem".to_owned(), items.get(idx + 1).cloned().unwrap_or_default());
    map.insert("cycle".to_owned(), Value::Function(Function::new("cycle", move |_, args| {
        if args.args.is_empty() {
            return Value::Error(EvalError::call("cycle() requires at least one argument"));
        }
        args.args[idx % args.args.len()].clone()
    })));
    Value::dict(map)
}
