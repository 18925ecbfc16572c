//! The built-in filters.
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
        builtins::Filters,
        error::EvalError,
        eval::{
            binary,
            Evaluator,
        },
        nodes::BinaryOp,
        render::escape,
        value::{
            capitalize,
            title_case,
            Value,
            VarArgs,
        },
    },
    std::cmp::Ordering,
};

type FilterResult = Result<Value, EvalError>;

// Lift a fallible filter body into a registrable filter.
fn lift<F>(f: F) -> impl Fn(&Evaluator, Value, &VarArgs) -> Value + Send + Sync + 'static
where
    F: Fn(&Evaluator, Value, &VarArgs) -> FilterResult + Send + Sync + 'static
{
    move |ev, value, args| f(ev, value, args).unwrap_or_else(Value::Error)
}

pub(crate)
fn register(filters: &mut Filters) {
    filters.register_undefined_aware("default", lift(default));
    filters.register_undefined_aware("d", lift(default));
    filters.register("escape", lift(escape_filter));
    filters.register("e", lift(escape_filter));
    filters.register("safe", lift(safe));
    filters.register("upper", lift(upper));
    filters.register("lower", lift(lower));
    filters.register("title", lift(title));
    filters.register("capitalize", lift(capitalize_filter));
    filters.register("trim", lift(trim));
    filters.register("length", lift(length));
    filters.register("count", lift(length));
    filters.register("first", lift(first));
    filters.register("last", lift(last));
    filters.register("join", lift(join));
    filters.register("list", lift(list));
    filters.register("reverse", lift(reverse));
    filters.register("sort", lift(sort));
    filters.register("unique", lift(unique));
    filters.register("sum", lift(sum));
    filters.register("min", lift(min));
    filters.register("max", lift(max));
    filters.register("int", lift(int));
    filters.register("float", lift(float));
    filters.register("string", lift(string));
    filters.register("abs", lift(abs));
    filters.register("round", lift(round));
    filters.register("replace", lift(replace));
    filters.register("indent", lift(indent));
    filters.register("truncate", lift(truncate));
    filters.register("wordcount", lift(wordcount));
    filters.register("tojson", lift(tojson));
    filters.register("items", lift(items));
    filters.register("dictsort", lift(dictsort));
    filters.register("map", lift(map));
    filters.register("select", lift(|ev, v, args| select(ev, v, args, true)));
    filters.register("reject", lift(|ev, v, args| select(ev, v, args, false)));
    filters.register("selectattr", lift(|ev, v, args| select_attr(ev, v, args, true)));
    filters.register("rejectattr", lift(|ev, v, args| select_attr(ev, v, args, false)));
    filters.register("batch", lift(batch));
    filters.register("attr", lift(attr));
}

fn flag(args: &VarArgs, idx: usize, name: &str, default: bool) -> bool {
    args.arg(idx, name).map_or(default, |v| v.is_truthy())
}

fn int_arg(args: &VarArgs, idx: usize, name: &str, default: i64) -> Result<i64, EvalError> {
    match args.arg(idx, name) {
        None | Some(Value::Nil) => Ok(default),
        Some(v) => v.as_int().ok_or_else(|| EvalError::type_error(format!(
            "argument '{}' must be an integer, not {}",
            name,
            v.type_name(),
        ))),
    }
}

fn str_arg(args: &VarArgs, idx: usize, name: &str) -> Option<String> {
    match args.arg(idx, name) {
        None | Some(Value::Nil) => None,
        Some(v) => Some(v.to_output()),
    }
}

fn required<'a>(args: &'a VarArgs, idx: usize, name: &str, filter: &str) -> Result<&'a Value, EvalError> {
    args.arg(idx, name).ok_or_else(|| EvalError::call(format!(
        "{}() missing required argument '{}'",
        filter,
        name,
    )))
}

// A string result, safe when the input was.
fn keep_safety(input: &Value, text: String) -> Value {
    match input.is_safe() {
        true => Value::safe(text),
        false => Value::from(text),
    }
}

fn sequence(value: &Value, filter: &str) -> Result<Vec<Value>, EvalError> {
    value.iterate().map_err(|e| EvalError::type_error(format!("{}: {}", filter, e.message())))
}

// Follow a dotted attribute path, `a.b.0`.
fn attribute(ev: &Evaluator, value: &Value, path: &str) -> Value {
    let mut value = value.clone();
    for part in path.split('.') {
        value = ev.get_attr(&value, part);
        if value.is_error() {
            break;
        }
    }
    value
}

// The value a sequence is ordered by.
fn sort_key(ev: &Evaluator, value: &Value, attr: Option<&str>, case_sensitive: bool) -> FilterResult {
    let key = match attr {
        Some(path) => attribute(ev, value, path).into_result()?,
        None => value.clone(),
    };

    Ok(match key.as_str() {
        Some(s) if !case_sensitive => Value::from(s.to_lowercase()),
        _ => key,
    })
}

fn sort_values(keyed: &mut [(Value, Value)], reverse: bool) -> Result<(), EvalError> {
    let mut failure = None;
    keyed.sort_by(|a, b| {
        let ord = a.0.compare(&b.0).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            Ordering::Equal
        });
        match reverse {
            true => ord.reverse(),
            false => ord,
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn default(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("default()", 2, &[ "default_value", "boolean", ])?;
    let fallback = args.arg(0, "default_value").cloned().unwrap_or_else(|| Value::from(""));
    let boolean = flag(args, 1, "boolean", false);

    match value {
        Value::Error(e) if e.is_undefined() => Ok(fallback),
        Value::Error(e) => Err(e),
        v if boolean && !v.is_truthy() => Ok(fallback),
        v => Ok(v),
    }
}

fn escape_filter(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("escape()", 0, &[])?;
    if value.is_safe() {
        return Ok(value);
    }
    Ok(Value::safe(escape(&value.to_output())))
}

fn safe(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("safe()", 0, &[])?;
    Ok(Value::safe(value.to_output()))
}

fn upper(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("upper()", 0, &[])?;
    Ok(keep_safety(&value, value.to_output().to_uppercase()))
}

fn lower(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("lower()", 0, &[])?;
    Ok(keep_safety(&value, value.to_output().to_lowercase()))
}

fn title(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("title()", 0, &[])?;
    Ok(keep_safety(&value, title_case(&value.to_output())))
}

fn capitalize_filter(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("capitalize()", 0, &[])?;
    Ok(keep_safety(&value, capitalize(&value.to_output())))
}

fn trim(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("trim()", 1, &[ "chars", ])?;
    let text = value.to_output();
    let trimmed = match str_arg(args, 0, "chars") {
        Some(chars) => text.trim_matches(|c| chars.contains(c)).to_owned(),
        None => text.trim().to_owned(),
    };
    Ok(keep_safety(&value, trimmed))
}

fn length(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("length()", 0, &[])?;
    match value.len() {
        Some(len) => Ok(Value::from(len)),
        None if value.is_nil() => Ok(Value::Int(0)),
        None => Err(EvalError::type_error(format!(
            "object of type '{}' has no len()",
            value.type_name(),
        ))),
    }
}

fn first(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("first()", 0, &[])?;
    Ok(sequence(&value, "first")?.into_iter().next().unwrap_or_default())
}

fn last(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("last()", 0, &[])?;
    Ok(sequence(&value, "last")?.pop().unwrap_or_default())
}

fn join(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("join()", 2, &[ "d", "attribute", ])?;
    let delimiter = args.arg(0, "d").cloned().unwrap_or_else(|| Value::from(""));
    let attr = str_arg(args, 1, "attribute");

    let mut items = Vec::new();
    for item in sequence(&value, "join")? {
        items.push(match &attr {
            Some(path) => attribute(ev, &item, path).into_result()?,
            None => item,
        });
    }

    if !ev.auto_escape() {
        let parts = items.iter().map(|v| v.to_output()).collect::<Vec<String>>();
        return Ok(Value::from(parts.join(&delimiter.to_output())));
    }

    let escaped = |v: &Value| match v.is_safe() {
        true => v.to_output(),
        false => escape(&v.to_output()),
    };
    let parts = items.iter().map(escaped).collect::<Vec<String>>();
    Ok(Value::safe(parts.join(&escaped(&delimiter))))
}

fn list(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("list()", 0, &[])?;
    Ok(Value::list(sequence(&value, "list")?))
}

fn reverse(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("reverse()", 0, &[])?;
    if let Some(text) = value.as_str() {
        return Ok(keep_safety(&value, text.chars().rev().collect()));
    }

    let mut items = sequence(&value, "reverse")?;
    items.reverse();
    Ok(Value::list(items))
}

fn sort(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("sort()", 3, &[ "reverse", "case_sensitive", "attribute", ])?;
    let reverse = flag(args, 0, "reverse", false);
    let case_sensitive = flag(args, 1, "case_sensitive", false);
    let attr = str_arg(args, 2, "attribute");

    let mut keyed = Vec::new();
    for item in sequence(&value, "sort")? {
        keyed.push((sort_key(ev, &item, attr.as_deref(), case_sensitive)?, item));
    }
    sort_values(&mut keyed, reverse)?;

    Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect()))
}

fn unique(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("unique()", 2, &[ "case_sensitive", "attribute", ])?;
    let case_sensitive = flag(args, 0, "case_sensitive", false);
    let attr = str_arg(args, 1, "attribute");

    let mut seen: Vec<Value> = Vec::new();
    let mut out = Vec::new();
    for item in sequence(&value, "unique")? {
        let key = sort_key(ev, &item, attr.as_deref(), case_sensitive)?;
        if !seen.iter().any(|k| k.equals(&key)) {
            seen.push(key);
            out.push(item);
        }
    }

    Ok(Value::list(out))
}

fn sum(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("sum()", 2, &[ "attribute", "start", ])?;
    let attr = str_arg(args, 0, "attribute");
    let mut total = args.arg(1, "start").cloned().unwrap_or(Value::Int(0));

    for item in sequence(&value, "sum")? {
        let item = match &attr {
            Some(path) => attribute(ev, &item, path).into_result()?,
            None => item,
        };
        total = binary(BinaryOp::Add, total, item, ev.auto_escape()).into_result()?;
    }

    Ok(total)
}

fn extreme(ev: &Evaluator, value: Value, args: &VarArgs, name: &str, wanted: Ordering) -> FilterResult {
    args.expect(name, 2, &[ "case_sensitive", "attribute", ])?;
    let case_sensitive = flag(args, 0, "case_sensitive", false);
    let attr = str_arg(args, 1, "attribute");

    let mut best: Option<(Value, Value)> = None;
    for item in value.iterate()? {
        let key = sort_key(ev, &item, attr.as_deref(), case_sensitive)?;
        best = match best {
            Some((k, v)) if key.compare(&k)? != wanted => Some((k, v)),
            _ => Some((key, item)),
        };
    }

    Ok(best.map(|(_, v)| v).unwrap_or_default())
}

fn min(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    extreme(ev, value, args, "min()", Ordering::Less)
}

fn max(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    extreme(ev, value, args, "max()", Ordering::Greater)
}

fn int(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("int()", 2, &[ "default", "base", ])?;
    let default = int_arg(args, 0, "default", 0)?;
    let base = int_arg(args, 1, "base", 10)?;
    let radix = u32::try_from(base)
        .ok()
        .filter(|b| (2..=36).contains(b))
        .ok_or_else(|| EvalError::runtime(format!("int() base must be between 2 and 36, not {}", base)))?;

    Ok(Value::Int(match &value {
        Value::Bool(b) => *b as i64,
        Value::Int(i) => *i,
        Value::Float(f) if f.is_finite() => f.trunc() as i64,
        Value::Str { text, .. } => {
            let text = text.trim().replace('_', "");
            i64::from_str_radix(&text, radix)
                .ok()
                .or_else(|| match radix {
                    10 => text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64),
                    _ => None,
                })
                .unwrap_or(default)
        },
        _ => default,
    }))
}

fn float(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("float()", 1, &[ "default", ])?;
    let default = match args.arg(0, "default") {
        Some(v) => v.as_number().map(|n| n.as_f64()).unwrap_or(0.0),
        None => 0.0,
    };

    Ok(Value::Float(match &value {
        Value::Str { text, .. } => text.trim().parse::<f64>().unwrap_or(default),
        v => v.as_number().map(|n| n.as_f64()).unwrap_or(default),
    }))
}

fn string(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("string()", 0, &[])?;
    if value.is_string() {
        return Ok(value);
    }
    Ok(Value::from(value.to_output()))
}

fn abs(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("abs()", 0, &[])?;
    match value {
        Value::Int(i) => i.checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::runtime("integer overflow")),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        v => Err(EvalError::type_error(format!(
            "bad operand type for abs(): '{}'",
            v.type_name(),
        ))),
    }
}

fn round(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("round()", 2, &[ "precision", "method", ])?;
    let precision = int_arg(args, 0, "precision", 0)?;
    let method = str_arg(args, 1, "method").unwrap_or_else(|| "common".to_owned());

    let number = value.as_number().ok_or_else(|| EvalError::type_error(format!(
        "round() requires a number, not {}",
        value.type_name(),
    )))?;

    let scale = 10_f64.powi(precision.clamp(-308, 308) as i32);
    let scaled = number.as_f64() * scale;
    let rounded = match method.as_str() {
        "common" => scaled.round(),
        "ceil" => scaled.ceil(),
        "floor" => scaled.floor(),
        m => return Err(EvalError::runtime(format!(
            "round() method must be 'common', 'ceil' or 'floor', not '{}'",
            m,
        ))),
    };

    Ok(Value::Float(rounded / scale))
}

fn replace(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("replace()", 3, &[ "old", "new", "count", ])?;
    let old = required(args, 0, "old", "replace")?.to_output();
    let new = required(args, 1, "new", "replace")?.to_output();
    let text = value.to_output();

    let replaced = match args.arg(2, "count").and_then(|v| v.as_int()) {
        Some(count) if count >= 0 => text.replacen(&old, &new, count as usize),
        _ => text.replace(&old, &new),
    };

    Ok(keep_safety(&value, replaced))
}

fn indent(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("indent()", 3, &[ "width", "first", "blank", ])?;
    let width = match args.arg(0, "width") {
        Some(Value::Str { text, .. }) => text.to_string(),
        _ => " ".repeat(usize::try_from(int_arg(args, 0, "width", 4)?).unwrap_or(0)),
    };
    let first = flag(args, 1, "first", false);
    let blank = flag(args, 2, "blank", false);

    let text = value.to_output();
    let lines = text.split('\n')
        .enumerate()
        .map(|(idx, line)| match (idx, line.is_empty()) {
            (0, _) if !first => line.to_owned(),
            (_, true) if !blank => line.to_owned(),
            _ => format!("{}{}", width, line),
        })
        .collect::<Vec<String>>();

    Ok(keep_safety(&value, lines.join("\n")))
}

fn truncate(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("truncate()", 4, &[ "length", "killwords", "end", "leeway", ])?;
    let length = usize::try_from(int_arg(args, 0, "length", 255)?).unwrap_or(0);
    let killwords = flag(args, 1, "killwords", false);
    let end = str_arg(args, 2, "end").unwrap_or_else(|| "...".to_owned());
    let leeway = usize::try_from(int_arg(args, 3, "leeway", 5)?).unwrap_or(0);

    let text = value.to_output();
    let chars = text.chars().collect::<Vec<char>>();
    if chars.len() <= length + leeway {
        return Ok(value);
    }

    let keep = length.saturating_sub(end.chars().count());
    let head = chars[..keep].iter().collect::<String>();
    let head = match killwords {
        true => head,
        false => match head.rfind(' ') {
            Some(idx) => head[..idx].to_owned(),
            None => head,
        },
    };

    Ok(keep_safety(&value, format!("{}{}", head, end)))
}

fn wordcount(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("wordcount()", 0, &[])?;
    Ok(Value::from(value.to_output().split_whitespace().count()))
}

fn tojson(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("tojson()", 1, &[ "indent", ])?;
    let json = value.to_json()?;

    let text = match args.arg(0, "indent").and_then(|v| v.as_int()) {
        Some(width) => {
            let indent = " ".repeat(usize::try_from(width).unwrap_or(0));
            let mut out = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            serde::Serialize::serialize(&json, &mut serializer)
                .map_err(|e| EvalError::runtime(e.to_string()))?;
            String::from_utf8(out).map_err(|e| EvalError::runtime(e.to_string()))?
        },
        None => serde_json::to_string(&json).map_err(|e| EvalError::runtime(e.to_string()))?,
    };

    let text = text.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\'', "\\u0027");
    Ok(Value::safe(text))
}

fn items(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("items()", 0, &[])?;
    match &value {
        Value::Dict(map) => Ok(Value::list(map.iter()
            .map(|(k, v)| Value::list(vec![ Value::from(k.as_str()), v.clone(), ]))
            .collect())),
        Value::Nil => Ok(Value::list(Vec::new())),
        v => Err(EvalError::type_error(format!(
            "items() requires a dict, not {}",
            v.type_name(),
        ))),
    }
}

fn dictsort(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("dictsort()", 3, &[ "case_sensitive", "by", "reverse", ])?;
    let case_sensitive = flag(args, 0, "case_sensitive", false);
    let by_value = match str_arg(args, 1, "by").as_deref() {
        None | Some("key") => false,
        Some("value") => true,
        Some(other) => return Err(EvalError::runtime(format!(
            "dictsort() can only sort by 'key' or 'value', not '{}'",
            other,
        ))),
    };
    let reverse = flag(args, 2, "reverse", false);

    let map = value.as_dict().ok_or_else(|| EvalError::type_error(format!(
        "dictsort() requires a dict, not {}",
        value.type_name(),
    )))?;

    let mut keyed = Vec::new();
    for (k, v) in map.iter() {
        let key = match by_value {
            true => v.clone(),
            false => Value::from(k.as_str()),
        };
        let key = match key.as_str() {
            Some(s) if !case_sensitive => Value::from(s.to_lowercase()),
            _ => key,
        };
        keyed.push((key, Value::list(vec![ Value::from(k.as_str()), v.clone(), ])));
    }
    sort_values(&mut keyed, reverse)?;

    Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect()))
}

// Split off the leading name argument of map/select style filters.
fn rest(args: &VarArgs, from: usize) -> VarArgs {
    VarArgs::new(args.args.iter().skip(from).cloned().collect(), args.kwargs.clone())
}

fn map(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    let items = sequence(&value, "map")?;

    if let Some(path) = args.kwarg("attribute") {
        let path = path.to_output();
        let default = args.kwarg("default");
        return Ok(Value::list(items.iter()
            .map(|item| match (attribute(ev, item, &path), default) {
                (Value::Nil, Some(d)) => Ok(d.clone()),
                (Value::Error(e), Some(d)) if e.is_undefined() => Ok(d.clone()),
                (v, _) => v.into_result(),
            })
            .collect::<Result<Vec<Value>, EvalError>>()?));
    }

    let name = required(args, 0, "filter", "map")?.to_output();
    let args = rest(args, 1);
    Ok(Value::list(items.into_iter()
        .map(|item| ev.apply_filter(&name, item, &args).into_result())
        .collect::<Result<Vec<Value>, EvalError>>()?))
}

fn select(ev: &Evaluator, value: Value, args: &VarArgs, keep: bool) -> FilterResult {
    let test = args.get(0).map(|v| v.to_output());
    let test_args = rest(args, 1);

    let mut out = Vec::new();
    for item in sequence(&value, "select")? {
        let passed = match &test {
            Some(name) => ev.apply_test(name, &item, &test_args)?,
            None => item.is_truthy(),
        };
        if passed == keep {
            out.push(item);
        }
    }

    Ok(Value::list(out))
}

fn select_attr(ev: &Evaluator, value: Value, args: &VarArgs, keep: bool) -> FilterResult {
    let path = required(args, 0, "attribute", "selectattr")?.to_output();
    let test = args.get(1).map(|v| v.to_output());
    let test_args = rest(args, 2);

    let mut out = Vec::new();
    for item in sequence(&value, "selectattr")? {
        let attr = attribute(ev, &item, &path);
        let passed = match &test {
            Some(name) => ev.apply_test(name, &attr, &test_args)?,
            None => attr.into_result()?.is_truthy(),
        };
        if passed == keep {
            out.push(item);
        }
    }

    Ok(Value::list(out))
}

fn batch(_: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("batch()", 2, &[ "linecount", "fill_with", ])?;
    let size = int_arg(args, 0, "linecount", 0)?;
    if size <= 0 {
        return Err(EvalError::runtime("batch() size must be positive"));
    }
    let size = size as usize;
    let fill = args.arg(1, "fill_with").cloned();

    let items = sequence(&value, "batch")?;
    let mut out = Vec::new();
    for chunk in items.chunks(size) {
        let mut row = chunk.to_vec();
        if let Some(fill) = &fill {
            row.resize(size, fill.clone());
        }
        out.push(Value::list(row));
    }

    Ok(Value::list(out))
}

fn attr(ev: &Evaluator, value: Value, args: &VarArgs) -> FilterResult {
    args.expect("attr()", 1, &[ "name", ])?;
    let name = required(args, 0, "name", "attr")?.to_output();
    ev.get_attr(&value, &name).into_result()
}
