//! The template language through its public surface.

use svg_graph::{Context, Engine, Function, Template, TemplateError, TemplateRenderer, Value};

fn render(source: &str, context: &Context) -> Result<String, TemplateError> {
    Engine::new().render("test", source, context)
}

fn points() -> Context {
    let calc = Value::from_iter([(
        "points",
        Value::from(vec![
            Value::from_iter([("x", 1.5), ("y", 2.0)]),
            Value::from_iter([("x", 3.25), ("y", 4.0)]),
        ]),
    )]);
    let mut ctx = Context::new();
    ctx.insert("calc", calc).insert("show", true);
    ctx
}

#[test]
fn tag_lines_leave_no_blank_lines() {
    let source = "\
<g>
{% if show %}
  {% for p in calc.points %}
  <circle cx=\"{{ p.x }}\" cy=\"{{ p.y }}\"/>
  {% endfor %}
{% endif %}
</g>
";
    insta::assert_snapshot!(render(source, &points()).unwrap(), @r#"
    <g>
      <circle cx="1.5" cy="2"/>
      <circle cx="3.25" cy="4"/>
    </g>
    "#);
}

#[test]
fn comments_vanish() {
    let out = render("{# heading #}\na{# inline #}b", &Context::new()).unwrap();
    assert_eq!(out, "ab");
}

#[test]
fn elif_chains_pick_the_first_truthy_branch() {
    let source = "{% for n in [0, 1, 2] %}{% if n == 0 %}zero{% elif n == 1 %}one{% else %}many{% endif %};{% endfor %}";
    assert_eq!(render(source, &Context::new()).unwrap(), "zero;one;many;");
}

#[test]
fn expressions_follow_precedence() {
    let out = render(
        "{{ 1 + 2 * 3 }} {{ (1 + 2) * 3 }} {{ 7 % 4 }} {{ -2 - -3 }} {{ 'a' ~ (1 + 1) }} {{ not 0 and 'yes' }}",
        &Context::new(),
    )
    .unwrap();
    insta::assert_snapshot!(out, @"7 9 3 1 a2 yes");
}

#[test]
fn builtins_cover_common_formatting() {
    let out = render(
        "{{ round(3.14159, 2) }} {{ len('wedge') }} {{ max(1, 9, 4) }} {{ min([3, 2]) }} {{ join(range(3), '-') }} {{ xml('<a & b>') }}",
        &Context::new(),
    )
    .unwrap();
    insta::assert_snapshot!(out, @"3.14 5 9 2 0-1-2 &lt;a &amp; b&gt;");
}

#[test]
fn context_functions_are_callable() {
    let mut ctx = Context::new();
    ctx.insert("sin", Function::numeric("sin", f64::sin))
        .insert("half", Function::numeric("half", |x| x / 2.0));
    assert_eq!(render("{{ sin(0) }} {{ half(5) }}", &ctx).unwrap(), "0 2.5");
}

#[test]
fn syntax_errors_point_into_the_source() {
    let err = Template::parse("broken", "ok {% if %} no").unwrap_err();
    let TemplateError::Syntax { span, .. } = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(span.offset() >= 3, "{span:?}");
}

#[test]
fn calling_a_non_function_is_an_error() {
    let err = render("{{ calc(1) }}", &points()).unwrap_err();
    assert!(matches!(err, TemplateError::Eval { .. }));
}

#[test]
fn unterminated_loops_are_syntax_errors() {
    let err = render("{% for x in [1] %}{{ x }}", &Context::new()).unwrap_err();
    assert!(matches!(err, TemplateError::Syntax { .. }));
}

#[test]
fn oversized_ranges_fail_instead_of_allocating() {
    let err = render("{{ len(range(1e12)) }}", &Context::new()).unwrap_err();
    assert!(matches!(err, TemplateError::Eval { .. }));
}
