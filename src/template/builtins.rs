//! Functions available to every template

use indexmap::IndexMap;

use super::eval::MAX_ITERATIONS;
use crate::value::{Function, Value};

pub(crate) fn builtins() -> IndexMap<String, Value> {
    let mut table = IndexMap::new();

    macro_rules! builtin_funcs {
        ($($name:ident => $func:expr),* $(,)?) => {
            $(
                table.insert(
                    stringify!($name).to_string(),
                    Value::Func(Function::new(stringify!($name), $func)),
                );
            )*
        };
    }

    builtin_funcs! {
        len   => len,
        round => round,
        floor => |args: &[Value]| unary_number("floor", args).map(|n| Value::Number(n.floor())),
        ceil  => |args: &[Value]| unary_number("ceil", args).map(|n| Value::Number(n.ceil())),
        abs   => |args: &[Value]| unary_number("abs", args).map(|n| Value::Number(n.abs())),
        min   => |args: &[Value]| extreme("min", args, f64::min),
        max   => |args: &[Value]| extreme("max", args, f64::max),
        range => range,
        str   => |args: &[Value]| match args {
            [v] => Ok(Value::Text(v.to_string())),
            _ => Err(arity("str", 1, args.len())),
        },
        join  => join,
        xml   => |args: &[Value]| match args {
            [v] => Ok(Value::Text(escape_xml(&v.to_string()))),
            _ => Err(arity("xml", 1, args.len())),
        },
    }

    table
}

fn arity(name: &str, expected: usize, given: usize) -> String {
    format!("{name}() takes {expected} argument(s) ({given} given)")
}

fn number(name: &str, v: &Value) -> Result<f64, String> {
    v.as_number()
        .ok_or_else(|| format!("{name}() expects a number, got {}", v.type_name()))
}

fn unary_number(name: &str, args: &[Value]) -> Result<f64, String> {
    match args {
        [v] => number(name, v),
        _ => Err(arity(name, 1, args.len())),
    }
}

fn len(args: &[Value]) -> Result<Value, String> {
    let n = match args {
        [Value::Text(s)] => s.chars().count(),
        [Value::List(items)] => items.len(),
        [Value::Map(map)] => map.len(),
        [Value::Null] => 0,
        [other] => return Err(format!("len() of {}", other.type_name())),
        _ => return Err(arity("len", 1, args.len())),
    };
    Ok(Value::from(n))
}

/// `round(x)` or `round(x, digits)`, halves away from zero
fn round(args: &[Value]) -> Result<Value, String> {
    let (x, digits) = match args {
        [x] => (number("round", x)?, 0),
        [x, d] => (number("round", x)?, number("round", d)? as i32),
        _ => return Err(arity("round", 2, args.len())),
    };
    let scale = 10f64.powi(digits);
    Ok(Value::Number((x * scale).round() / scale))
}

/// `min(a, b, ...)` or `min(list)`; empty values are skipped
fn extreme(name: &str, args: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value, String> {
    let items = match args {
        [Value::List(items)] => items.as_slice(),
        _ => args,
    };
    let mut best: Option<f64> = None;
    for item in items.iter().filter(|v| !v.is_null()) {
        let n = number(name, item)?;
        best = Some(best.map_or(n, |b| pick(b, n)));
    }
    Ok(best.map(Value::Number).unwrap_or(Value::Null))
}

/// `range(n)` is `0..n`, `range(a, b)` is `a..b`
fn range(args: &[Value]) -> Result<Value, String> {
    let (start, end) = match args {
        [n] => (0, number("range", n)? as i64),
        [a, b] => (number("range", a)? as i64, number("range", b)? as i64),
        _ => return Err(arity("range", 2, args.len())),
    };
    if end.saturating_sub(start) > MAX_ITERATIONS as i64 {
        return Err(format!(
            "range({start}, {end}) is longer than the {MAX_ITERATIONS} item limit"
        ));
    }
    Ok(Value::List((start..end).map(Value::from).collect()))
}

fn join(args: &[Value]) -> Result<Value, String> {
    let (items, sep) = match args {
        [Value::List(items)] => (items, String::new()),
        [Value::List(items), sep] => (items, sep.to_string()),
        [other, ..] if args.len() <= 2 => {
            return Err(format!("join() expects a list, got {}", other.type_name()));
        }
        _ => return Err(arity("join", 2, args.len())),
    };
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    Ok(Value::Text(parts.join(&sep)))
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
