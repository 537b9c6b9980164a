//! Template evaluation

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Write;

use indexmap::IndexMap;
use miette::NamedSource;

use super::ast::*;
use super::Context;
use crate::errors::TemplateError;
use crate::value::{Value, fmt_num};

/// Upper bound on loop iterations across one render
pub(crate) const MAX_ITERATIONS: usize = 1_000_000;

static NULL: Value = Value::Null;

/// Variable scopes for one render: loop/set frames over the caller's context
/// over the built-in functions
pub(crate) struct Scope<'a> {
    frames: Vec<IndexMap<String, Value>>,
    context: &'a Context,
    builtins: &'a IndexMap<String, Value>,
    name: &'a str,
    source: &'a str,
    iterations: usize,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        name: &'a str,
        source: &'a str,
        context: &'a Context,
        builtins: &'a IndexMap<String, Value>,
    ) -> Self {
        Self {
            frames: vec![IndexMap::new()],
            context,
            builtins,
            name,
            source,
            iterations: 0,
        }
    }

    fn error(&self, span: Span, message: impl Into<String>) -> TemplateError {
        TemplateError::Eval {
            message: message.into(),
            src: NamedSource::new(self.name, self.source.to_string()),
            span: span.into(),
            help: None,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.context.get(name))
            .or_else(|| self.builtins.get(name))
    }

    /// Rebind the nearest existing frame variable, or define it locally
    fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    pub(crate) fn render(&mut self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(expr) => {
                    let value = self.eval(expr)?;
                    // Writing into a String cannot fail
                    let _ = write!(out, "{value}");
                }
                Node::Set { name, value } => {
                    let value = self.eval(value)?;
                    self.assign(name, value);
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = false;
                    for (cond, body) in branches {
                        if self.eval(cond)?.truthy() {
                            self.render(body, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.render(otherwise, out)?;
                    }
                }
                Node::For { var, iter, body } => self.render_loop(var, iter, body, out)?,
            }
        }
        Ok(())
    }

    fn render_loop(
        &mut self,
        var: &str,
        iter: &Expr,
        body: &[Node],
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let items = match self.eval(iter)? {
            Value::List(items) => items,
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| {
                    Value::from_iter([("key", Value::Text(key)), ("value", value)])
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(self.error(
                    iter.span,
                    format!("cannot loop over {}", other.type_name()),
                ));
            }
        };

        let length = items.len();
        self.frames.push(IndexMap::new());
        for (index, item) in items.into_iter().enumerate() {
            self.iterations += 1;
            if self.iterations > MAX_ITERATIONS {
                self.frames.pop();
                return Err(self.error(iter.span, "loop iteration limit exceeded"));
            }
            let loop_info = Value::from_iter([
                ("index", Value::from(index)),
                ("number", Value::from(index + 1)),
                ("first", Value::Bool(index == 0)),
                ("last", Value::Bool(index + 1 == length)),
                ("length", Value::from(length)),
            ]);
            if let Some(frame) = self.frames.last_mut() {
                frame.insert(var.to_string(), item);
                frame.insert("loop".to_string(), loop_info);
            }
            if let Err(e) = self.render(body, out) {
                self.frames.pop();
                return Err(e);
            }
        }
        self.frames.pop();
        Ok(())
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Result<Value, TemplateError> {
        match &expr.kind {
            ExprKind::Literal(v) => Ok(v.clone()),
            ExprKind::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            ExprKind::Var(_) | ExprKind::Attr(..) | ExprKind::Index(..) => {
                self.eval_path(expr).map(Cow::into_owned)
            }
            ExprKind::Call(callee, args) => {
                let callee_value = self.eval(callee)?;
                let Value::Func(func) = callee_value else {
                    return Err(self.error(
                        callee.span,
                        format!("{} is not callable", callee_value.type_name()),
                    ));
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                func.call(&args).map_err(|message| self.error(expr.span, message))
            }
            ExprKind::Unary(op, operand) => {
                let v = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
                    UnaryOp::Neg => match v.as_number() {
                        Some(n) => Ok(Value::Number(-n)),
                        None => Err(self.error(
                            expr.span,
                            format!("cannot negate {}", v.type_name()),
                        )),
                    },
                }
            }
            ExprKind::Binary(lhs, op, rhs) => match op {
                BinaryOp::And => {
                    let l = self.eval(lhs)?;
                    if !l.truthy() { Ok(l) } else { self.eval(rhs) }
                }
                BinaryOp::Or => {
                    let l = self.eval(lhs)?;
                    if l.truthy() { Ok(l) } else { self.eval(rhs) }
                }
                _ => {
                    let l = self.eval(lhs)?;
                    let r = self.eval(rhs)?;
                    self.binary(l, *op, r, expr.span)
                }
            },
        }
    }

    /// Resolve variable/attribute/index chains by reference where possible
    fn eval_path(&self, expr: &Expr) -> Result<Cow<'_, Value>, TemplateError> {
        match &expr.kind {
            ExprKind::Var(name) => match self.lookup(name) {
                Some(value) => Ok(Cow::Borrowed(value)),
                None => {
                    let mut known: Vec<&str> = self.context.names().collect();
                    known.sort_unstable();
                    Err(TemplateError::Eval {
                        message: format!("undefined variable: {name}"),
                        src: NamedSource::new(self.name, self.source.to_string()),
                        span: expr.span.into(),
                        help: Some(format!("context provides: {}", known.join(", "))),
                    })
                }
            },
            ExprKind::Attr(base, name) => {
                let key = Value::Text(name.clone());
                match self.eval_path(base)? {
                    Cow::Borrowed(base) => self.member(base, &key, expr.span).map(Cow::Borrowed),
                    Cow::Owned(base) => self
                        .member(&base, &key, expr.span)
                        .map(|v| Cow::Owned(v.clone())),
                }
            }
            ExprKind::Index(base, key) => {
                let key = self.eval(key)?;
                match self.eval_path(base)? {
                    Cow::Borrowed(base) => self.member(base, &key, expr.span).map(Cow::Borrowed),
                    Cow::Owned(base) => self
                        .member(&base, &key, expr.span)
                        .map(|v| Cow::Owned(v.clone())),
                }
            }
            _ => self.eval(expr).map(Cow::Owned),
        }
    }

    /// `base.key` / `base[key]`; missing members read as null
    fn member<'v>(&self, base: &'v Value, key: &Value, span: Span) -> Result<&'v Value, TemplateError> {
        match (base, key) {
            (Value::List(items), Value::Number(n)) => {
                let len = items.len() as i64;
                let i = n.trunc() as i64;
                let i = if i < 0 { len + i } else { i };
                Ok(usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .unwrap_or(&NULL))
            }
            (Value::Map(map), Value::Text(k)) => Ok(map.get(k.as_str()).unwrap_or(&NULL)),
            (Value::Map(map), Value::Number(n)) => Ok(map.get(&fmt_num(*n)).unwrap_or(&NULL)),
            (Value::Null, _) => Ok(&NULL),
            (base, key) => Err(self.error(
                span,
                format!("cannot index {} with {}", base.type_name(), key.type_name()),
            )),
        }
    }

    fn binary(&self, l: Value, op: BinaryOp, r: Value, span: Span) -> Result<Value, TemplateError> {
        use BinaryOp::*;
        match op {
            And => Ok(if l.truthy() { r } else { l }),
            Or => Ok(if l.truthy() { l } else { r }),
            Eq => Ok(Value::Bool(loosely_equal(&l, &r))),
            Ne => Ok(Value::Bool(!loosely_equal(&l, &r))),
            Lt | Le | Gt | Ge => {
                let ord = compare(&l, &r).ok_or_else(|| {
                    self.error(
                        span,
                        format!("cannot compare {} with {}", l.type_name(), r.type_name()),
                    )
                })?;
                Ok(Value::Bool(match op {
                    Lt => ord == Ordering::Less,
                    Le => ord != Ordering::Greater,
                    Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                }))
            }
            Concat => Ok(Value::Text(format!("{l}{r}"))),
            Add => match (l, r) {
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (l, r) if is_plain_text(&l) || is_plain_text(&r) => {
                    Ok(Value::Text(format!("{l}{r}")))
                }
                (l, r) => self.arithmetic(l, op, r, span),
            },
            Sub | Mul | Div | Rem => self.arithmetic(l, op, r, span),
        }
    }

    fn arithmetic(&self, l: Value, op: BinaryOp, r: Value, span: Span) -> Result<Value, TemplateError> {
        let (Some(a), Some(b)) = (number_operand(&l), number_operand(&r)) else {
            return Err(self.error(
                span,
                format!(
                    "unsupported operands for arithmetic: {} and {}",
                    l.type_name(),
                    r.type_name()
                ),
            ));
        };
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
                return Err(self.error(span, "division by zero"));
            }
            BinaryOp::Div => a / b,
            _ => a % b,
        };
        Ok(Value::Number(result))
    }
}

/// Text counts as plain text (not a number) for `+` when it does not parse
fn is_plain_text(v: &Value) -> bool {
    matches!(v, Value::Text(s) if s.trim().parse::<f64>().is_err())
}

fn number_operand(v: &Value) -> Option<f64> {
    match v {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_number(),
    }
}

fn loosely_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Number(a), Value::Text(_)) => r.as_number() == Some(*a),
        (Value::Text(_), Value::Number(b)) => l.as_number() == Some(*b),
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => number_operand(l)?.partial_cmp(&number_operand(r)?),
    }
}
