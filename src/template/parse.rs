//! Parse pest pairs into template AST nodes

use miette::NamedSource;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::ast::*;
use crate::errors::TemplateError;
use crate::value::Value;

#[derive(Parser)]
#[grammar = "template/grammar.pest"]
struct TemplateParser;

/// Parse template source into nodes
pub fn parse(name: &str, source: &str) -> Result<Vec<Node>, TemplateError> {
    let pairs = TemplateParser::parse(Rule::template, source)
        .map_err(|e| syntax_error(name, source, e))?;

    let builder = Builder { name, source };
    for pair in pairs {
        if pair.as_rule() == Rule::template {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::nodes {
                    return builder.nodes(inner);
                }
            }
        }
    }
    Ok(Vec::new())
}

fn syntax_error(name: &str, source: &str, e: pest::error::Error<Rule>) -> TemplateError {
    let (start, end) = match e.location {
        pest::error::InputLocation::Pos(p) => (p, p),
        pest::error::InputLocation::Span(span) => span,
    };
    TemplateError::Syntax {
        message: e.variant.message().into_owned(),
        src: NamedSource::new(name, source.to_string()),
        span: Span::new(start, end.max(start)).into(),
    }
}

/// Markers kept only while a node list is being assembled
enum Built {
    Node(Node),
    Comment,
}

struct Builder<'a> {
    name: &'a str,
    source: &'a str,
}

impl Builder<'_> {
    fn error(&self, span: Span, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            message: message.into(),
            src: NamedSource::new(self.name, self.source.to_string()),
            span: span.into(),
        }
    }

    fn nodes(&self, pair: Pair<Rule>) -> Result<Vec<Node>, TemplateError> {
        let mut built = Vec::new();
        for inner in pair.into_inner() {
            built.push(self.node(inner)?);
        }
        Ok(strip_tag_indentation(built))
    }

    fn node(&self, pair: Pair<Rule>) -> Result<Built, TemplateError> {
        let span = Span::from(pair.as_span());
        let node = match pair.as_rule() {
            Rule::text => Node::Text(pair.as_str().to_string()),
            Rule::comment => return Ok(Built::Comment),
            Rule::output => Node::Output(self.first_expr(pair)?),
            Rule::set_tag => {
                let mut inner = pair.into_inner();
                let name = inner.next().map(|p| p.as_str().to_string());
                let value = inner.next().map(|p| self.expr(p)).transpose()?;
                match (name, value) {
                    (Some(name), Some(value)) => Node::Set { name, value },
                    _ => return Err(self.error(span, "malformed set tag")),
                }
            }
            Rule::for_block => {
                let mut inner = pair.into_inner();
                let tag = inner
                    .next()
                    .ok_or_else(|| self.error(span, "missing for tag"))?;
                let mut tag_inner = tag.into_inner();
                let var = tag_inner
                    .next()
                    .map(|p| p.as_str().to_string())
                    .ok_or_else(|| self.error(span, "missing loop variable"))?;
                let iter = tag_inner
                    .next()
                    .map(|p| self.expr(p))
                    .transpose()?
                    .ok_or_else(|| self.error(span, "missing loop expression"))?;
                let body = match inner.next() {
                    Some(nodes) => self.nodes(nodes)?,
                    None => Vec::new(),
                };
                Node::For { var, iter, body }
            }
            Rule::if_block => {
                let mut branches = Vec::new();
                let mut otherwise = Vec::new();
                let mut inner = pair.into_inner().peekable();
                while let Some(part) = inner.next() {
                    match part.as_rule() {
                        Rule::if_tag => {
                            let cond = self.first_expr(part)?;
                            let body = match inner.next_if(|p| p.as_rule() == Rule::nodes) {
                                Some(nodes) => self.nodes(nodes)?,
                                None => Vec::new(),
                            };
                            branches.push((cond, body));
                        }
                        Rule::elif_branch => {
                            let mut parts = part.into_inner();
                            let cond = match parts.next() {
                                Some(tag) => self.first_expr(tag)?,
                                None => return Err(self.error(span, "malformed elif")),
                            };
                            let body = match parts.next() {
                                Some(nodes) => self.nodes(nodes)?,
                                None => Vec::new(),
                            };
                            branches.push((cond, body));
                        }
                        Rule::else_branch => {
                            if let Some(nodes) = part.into_inner().next() {
                                otherwise = self.nodes(nodes)?;
                            }
                        }
                        _ => {}
                    }
                }
                Node::If {
                    branches,
                    otherwise,
                }
            }
            rule => {
                return Err(self.error(span, format!("unexpected {rule:?} in template")));
            }
        };
        Ok(Built::Node(node))
    }

    /// The expression inside an output or tag pair
    fn first_expr(&self, pair: Pair<Rule>) -> Result<Expr, TemplateError> {
        let span = Span::from(pair.as_span());
        match pair.into_inner().find(|p| p.as_rule() == Rule::expr) {
            Some(expr) => self.expr(expr),
            None => Err(self.error(span, "missing expression")),
        }
    }

    fn expr(&self, pair: Pair<Rule>) -> Result<Expr, TemplateError> {
        let span = Span::from(pair.as_span());
        match pair.as_rule() {
            Rule::expr => match pair.into_inner().next() {
                Some(inner) => self.expr(inner),
                None => Err(self.error(span, "empty expression")),
            },
            Rule::or_expr | Rule::and_expr | Rule::cmp_expr | Rule::sum_expr | Rule::product => {
                let mut inner = pair.into_inner();
                let first = inner
                    .next()
                    .ok_or_else(|| self.error(span, "empty expression"))?;
                let mut lhs = self.expr(first)?;
                while let Some(op) = inner.next() {
                    let op_span = Span::from(op.as_span());
                    let op = BinaryOp::from_token(op.as_str())
                        .ok_or_else(|| self.error(op_span, "unknown operator"))?;
                    let rhs = match inner.next() {
                        Some(rhs) => self.expr(rhs)?,
                        None => return Err(self.error(op_span, "missing right operand")),
                    };
                    let span = lhs.span.to(rhs.span);
                    lhs = Expr {
                        kind: ExprKind::Binary(Box::new(lhs), op, Box::new(rhs)),
                        span,
                    };
                }
                Ok(lhs)
            }
            Rule::not_expr | Rule::unary => {
                let mut inner = pair.into_inner();
                let first = inner
                    .next()
                    .ok_or_else(|| self.error(span, "empty expression"))?;
                let op = match first.as_rule() {
                    Rule::not_op => UnaryOp::Not,
                    Rule::neg_op => UnaryOp::Neg,
                    _ => return self.expr(first),
                };
                let operand = match inner.next() {
                    Some(operand) => self.expr(operand)?,
                    None => return Err(self.error(span, "missing operand")),
                };
                Ok(Expr {
                    kind: ExprKind::Unary(op, Box::new(operand)),
                    span,
                })
            }
            Rule::postfix => {
                let mut inner = pair.into_inner();
                let first = inner
                    .next()
                    .ok_or_else(|| self.error(span, "empty expression"))?;
                let mut base = self.expr(first)?;
                for suffix in inner {
                    let suffix_span = Span::from(suffix.as_span());
                    let kind = match suffix.as_rule() {
                        Rule::attr => {
                            let name = suffix
                                .into_inner()
                                .next()
                                .map(|p| p.as_str().to_string())
                                .ok_or_else(|| self.error(suffix_span, "missing attribute"))?;
                            ExprKind::Attr(Box::new(base), name)
                        }
                        Rule::index => {
                            let key = match suffix.into_inner().next() {
                                Some(key) => self.expr(key)?,
                                None => return Err(self.error(suffix_span, "missing index")),
                            };
                            ExprKind::Index(Box::new(base), Box::new(key))
                        }
                        Rule::call => {
                            let args = suffix
                                .into_inner()
                                .map(|arg| self.expr(arg))
                                .collect::<Result<Vec<_>, _>>()?;
                            ExprKind::Call(Box::new(base), args)
                        }
                        rule => {
                            return Err(self.error(suffix_span, format!("unexpected {rule:?}")));
                        }
                    };
                    base = Expr {
                        kind,
                        span: span.to(suffix_span),
                    };
                }
                Ok(base)
            }
            Rule::list => {
                let items = pair
                    .into_inner()
                    .map(|item| self.expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr {
                    kind: ExprKind::List(items),
                    span,
                })
            }
            Rule::number => {
                let n: f64 = pair
                    .as_str()
                    .parse()
                    .map_err(|_| self.error(span, "invalid number"))?;
                Ok(literal(Value::Number(n), span))
            }
            Rule::string => {
                let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                Ok(literal(Value::Text(unescape(raw)), span))
            }
            Rule::boolean => Ok(literal(Value::Bool(pair.as_str() == "true"), span)),
            Rule::null => Ok(literal(Value::Null, span)),
            Rule::ident => Ok(Expr {
                kind: ExprKind::Var(pair.as_str().to_string()),
                span,
            }),
            rule => Err(self.error(span, format!("unexpected {rule:?} in expression"))),
        }
    }
}

fn literal(value: Value, span: Span) -> Expr {
    Expr {
        kind: ExprKind::Literal(value),
        span,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Drop the indentation in front of a tag line and discard comments.
///
/// Text that ends in a newline followed only by blanks loses the blanks when
/// the next node is a tag (or the end of the enclosing body), so indented
/// control tags leave no trace in the output.
fn strip_tag_indentation(built: Vec<Built>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(built.len());
    let mut iter = built.into_iter().peekable();
    let mut at_line_start = true;
    while let Some(item) = iter.next() {
        match item {
            Built::Comment => {
                at_line_start = true;
            }
            Built::Node(Node::Text(mut text)) => {
                let before_tag = match iter.peek() {
                    None => true,
                    Some(Built::Comment) => true,
                    Some(Built::Node(next)) => !matches!(next, Node::Text(_) | Node::Output(_)),
                };
                if before_tag {
                    match text.rfind('\n') {
                        Some(nl) if text[nl + 1..].chars().all(|c| c == ' ' || c == '\t') => {
                            text.truncate(nl + 1);
                        }
                        None if at_line_start && text.chars().all(|c| c == ' ' || c == '\t') => {
                            text.clear();
                        }
                        _ => {}
                    }
                }
                at_line_start = false;
                if !text.is_empty() {
                    out.push(Node::Text(text));
                }
            }
            Built::Node(node) => {
                at_line_start = !matches!(node, Node::Output(_));
                out.push(node);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Node> {
        match parse("test", source) {
            Ok(nodes) => nodes,
            Err(e) => panic!("failed to parse {source:?}: {e}"),
        }
    }

    #[test]
    fn parse_plain_text() {
        let nodes = parse_ok("<svg/>");
        assert!(matches!(&nodes[..], [Node::Text(t)] if t == "<svg/>"));
    }

    #[test]
    fn parse_output_with_attribute_chain() {
        let nodes = parse_ok("{{ calc.plot.left }}");
        let [Node::Output(expr)] = &nodes[..] else {
            panic!("expected a single output node");
        };
        assert!(matches!(&expr.kind, ExprKind::Attr(_, name) if name == "left"));
    }

    #[test]
    fn parse_precedence() {
        let nodes = parse_ok("{{ 1 + 2 * 3 }}");
        let [Node::Output(expr)] = &nodes[..] else {
            panic!("expected a single output node");
        };
        let ExprKind::Binary(_, op, rhs) = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(rhs.kind, ExprKind::Binary(_, BinaryOp::Mul, _)));
    }

    #[test]
    fn parse_if_elif_else() {
        let nodes = parse_ok("{% if a %}A{% elif b %}B{% else %}C{% endif %}");
        let [Node::If { branches, otherwise }] = &nodes[..] else {
            panic!("expected if node");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(otherwise.len(), 1);
    }

    #[test]
    fn parse_for_and_set() {
        let nodes = parse_ok("{% set total = 0 %}{% for v in values %}{{ v }}{% endfor %}");
        assert!(matches!(&nodes[0], Node::Set { name, .. } if name == "total"));
        assert!(matches!(&nodes[1], Node::For { var, .. } if var == "v"));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(parse("test", "{{ and }}").is_err());
        let nodes = parse_ok("{{ index }}");
        assert!(matches!(&nodes[0], Node::Output(e) if matches!(&e.kind, ExprKind::Var(v) if v == "index")));
    }

    #[test]
    fn modulo_does_not_swallow_tag_close() {
        let nodes = parse_ok("{% set x = 7 % 3 %}{% set y = x %}");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn tag_lines_leave_no_blank_lines() {
        let nodes = parse_ok("<g>\n  {% if a %}\n  <rect/>\n  {% endif %}\n</g>");
        let Node::Text(head) = &nodes[0] else {
            panic!("expected text");
        };
        assert_eq!(head, "<g>\n");
        let Node::If { branches, .. } = &nodes[1] else {
            panic!("expected if");
        };
        assert!(matches!(&branches[0].1[..], [Node::Text(t)] if t == "  <rect/>\n"));
        assert!(matches!(&nodes[2], Node::Text(t) if t == "</g>"));
    }

    #[test]
    fn unterminated_block_is_a_syntax_error() {
        let err = parse("broken", "{% if a %}never closed").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { .. }));
    }

    #[test]
    fn strings_unescape() {
        let nodes = parse_ok(r#"{{ "a\"b" ~ 'c' }}"#);
        let [Node::Output(expr)] = &nodes[..] else {
            panic!("expected output");
        };
        let ExprKind::Binary(lhs, BinaryOp::Concat, _) = &expr.kind else {
            panic!("expected concat");
        };
        assert!(matches!(&lhs.kind, ExprKind::Literal(Value::Text(s)) if s == "a\"b"));
    }
}
