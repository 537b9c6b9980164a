//! Facade behaviour shared by every chart variant.

use regex_lite::Regex;
use svg_graph::{
    Bar, BarHorizontal, BarLine, Context, DataSet, Document, Graph, GraphError, HeatMap, Line,
    Pie, TemplateError, TemplateRenderer, TimeSeries, Value, Values, Variant, Xy, options,
};

fn svg(doc: Document) -> String {
    match doc {
        Document::Svg(svg) => svg,
        Document::Gzip(_) => panic!("expected plain svg"),
    }
}

fn field_keyed() -> Vec<Variant> {
    vec![
        Line.into(),
        Bar.into(),
        BarHorizontal.into(),
        BarLine.into(),
        Pie.into(),
    ]
}

#[test]
fn field_keyed_variants_require_fields() {
    for variant in field_keyed() {
        let kind = svg_graph::Chart::kind(&variant);
        let err = Graph::new(variant.clone(), options! {}).unwrap_err();
        assert!(
            matches!(err, GraphError::InvalidConfiguration { .. }),
            "{kind}: {err:?}"
        );
        Graph::new(variant, options! { fields => vec!["Jan", "Feb", "Mar"] })
            .unwrap_or_else(|e| panic!("{kind}: {e:?}"));
    }
}

#[test]
fn coordinate_variants_construct_without_fields() {
    for variant in [Variant::from(Xy), TimeSeries.into(), HeatMap::default().into()] {
        Graph::new(variant, options! {}).unwrap();
    }
}

#[test]
fn burn_needs_data() {
    let mut graph = Graph::new(Line, options! { fields => vec!["a", "b"] }).unwrap();
    assert!(matches!(graph.burn(), Err(GraphError::NoData)));
    graph.add_data(DataSet::new(vec![1.0, 2.0])).unwrap();
    assert!(graph.burn().is_ok());
}

#[test]
fn clear_data_reproduces_a_fresh_graph() {
    let overrides = || options! { fields => vec!["a", "b", "c"], key => true };
    let first = || DataSet::new(vec![3.0, 1.0, 4.0]).title("first");

    let mut reused = Graph::new(Bar, overrides()).unwrap();
    reused
        .add_data(DataSet::new(vec![9.0, 9.0, 9.0]).title("stale"))
        .unwrap();
    reused.burn().unwrap();
    reused.clear_data();
    assert!(reused.data().is_empty());
    reused.add_data(first()).unwrap();

    let mut fresh = Graph::new(Bar, overrides()).unwrap();
    fresh.add_data(first()).unwrap();

    assert_eq!(svg(reused.burn().unwrap()), svg(fresh.burn().unwrap()));
}

#[test]
fn clear_data_resets_single_set_variants() {
    let pie = || Graph::new(Pie, options! { fields => vec!["a", "b", "c"], key => true }).unwrap();
    let mut reused = pie();
    reused.add_data(DataSet::new(vec![5.0, 5.0, 5.0])).unwrap();
    reused.burn().unwrap();
    reused.clear_data();
    reused.add_data(DataSet::new(vec![1.0, 2.0, 7.0])).unwrap();
    let mut fresh = pie();
    fresh.add_data(DataSet::new(vec![1.0, 2.0, 7.0])).unwrap();
    assert_eq!(svg(reused.burn().unwrap()), svg(fresh.burn().unwrap()));

    let by_value = |cell: &svg_graph::CellSample<'_>| format!("v{:?}", cell.value);
    let table = |a: f64, b: f64| {
        DataSet::new(Values::table([
            vec![Value::from("x"), Value::from("a"), Value::from("b")],
            vec![Value::from("Mon"), Value::from(a), Value::from(b)],
        ]))
    };
    let heat = || Graph::new(HeatMap::with_colors(by_value), options! {}).unwrap();
    let mut reused = heat();
    reused.add_data(table(9.0, 9.0)).unwrap();
    reused.burn().unwrap();
    reused.clear_data();
    assert!(matches!(reused.burn(), Err(GraphError::NoData)));
    reused.add_data(table(1.0, 3.0)).unwrap();
    let mut fresh = heat();
    fresh.add_data(table(1.0, 3.0)).unwrap();
    assert_eq!(svg(reused.burn().unwrap()), svg(fresh.burn().unwrap()));
}

#[test]
fn get_and_set_round_trip_every_option() {
    let mut graph = Graph::new(Pie, options! { fields => vec!["a"] }).unwrap();
    let names: Vec<String> = graph.config().names().map(String::from).collect();
    for name in names {
        let value = graph.get(&name).unwrap().clone();
        assert_eq!(graph.set(&name, value.clone()).unwrap(), &value, "{name}");
        assert_eq!(graph.get(&name).unwrap(), &value, "{name}");
    }
    assert_eq!(graph.set("show_shadow", false).unwrap(), &Value::Bool(false));
}

#[test]
fn unknown_names_are_errors() {
    let mut graph = Graph::new(Line, options! { fields => vec!["a"] }).unwrap();
    assert!(matches!(
        graph.get("colour"),
        Err(GraphError::UnknownOption { chart: "Line", .. })
    ));
    assert!(matches!(
        graph.set("colour", "red"),
        Err(GraphError::UnknownOption { .. })
    ));
    assert!(!graph.config().contains("colour"));
}

#[test]
fn single_set_variants_reject_a_second_set() {
    let mut pie = Graph::new(Pie, options! { fields => vec!["a", "b"] }).unwrap();
    pie.add_data(DataSet::new(vec![1.0, 2.0])).unwrap();
    assert!(matches!(
        pie.add_data(DataSet::new(vec![1.0, 2.0])),
        Err(GraphError::TooManyDataSets { chart: "Pie" })
    ));

    let mut heat = Graph::new(HeatMap::with_colors(|_| "red".into()), options! {}).unwrap();
    let table = || {
        Values::table([
            vec![Value::from("x"), Value::from("a")],
            vec![Value::from("Mon"), Value::from(1)],
        ])
    };
    heat.add_data(DataSet::new(table())).unwrap();
    assert!(matches!(
        heat.add_data(DataSet::new(table())),
        Err(GraphError::TooManyDataSets { chart: "HeatMap" })
    ));
    assert_eq!(heat.data().len(), 1);
}

#[test]
fn multi_set_variants_append() {
    for variant in [Variant::from(Line), Bar.into()] {
        let mut graph = Graph::new(variant, options! { fields => vec!["a", "b"] }).unwrap();
        graph.add_data(DataSet::new(vec![1.0, 2.0])).unwrap();
        graph.add_data(DataSet::new(vec![3.0, 4.0])).unwrap();
        assert_eq!(graph.data().len(), 2);
        graph.burn().unwrap();
    }
}

#[test]
fn empty_axis_order_is_missing() {
    let mut graph = Graph::new(
        HeatMap::default(),
        options! { y_axis_order => Vec::<String>::new() },
    )
    .unwrap();
    assert!(matches!(
        graph.add_data(DataSet::new(Values::table([vec![Value::from("x")]]))),
        Err(GraphError::MissingAxisOrder)
    ));
}

#[test]
fn documents_are_svg_1_0() {
    let mut graph = Graph::new(
        Line,
        options! { fields => vec!["a", "b"], width => 640, height => 480 },
    )
    .unwrap();
    graph.add_data(DataSet::new(vec![1.0, 2.0])).unwrap();
    let svg = svg(graph.burn().unwrap());

    assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
    assert!(svg.contains("<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.0//EN\""));
    assert!(svg.ends_with("</svg>\n"));
    assert!(svg.contains("<style type=\"text/css\">"));

    let root = Regex::new(r#"<svg [^>]*width="([^"]+)" height="([^"]+)" viewBox="0 0 ([^"]+)""#)
        .unwrap();
    let caps = root.captures(&svg).unwrap();
    assert_eq!(&caps[1], "640");
    assert_eq!(&caps[2], "480");
    assert_eq!(&caps[3], "640 480");
}

#[test]
fn style_sheets_replace_inline_styles() {
    let mut graph = Graph::new(
        Bar,
        options! { fields => vec!["a"], style_sheet => "/css/graph.css" },
    )
    .unwrap();
    graph.add_data(DataSet::new(vec![1.0])).unwrap();
    let svg = svg(graph.burn().unwrap());
    assert!(svg.contains(r#"<?xml-stylesheet href="/css/graph.css" type="text/css"?>"#));
    assert!(!svg.contains("<style"));
}

#[test]
fn compression_degrades_gracefully() {
    let mut graph = Graph::new(Line, options! { fields => vec!["a"], compress => true }).unwrap();
    graph.add_data(DataSet::new(vec![1.0])).unwrap();
    let doc = graph.burn().unwrap();
    if cfg!(feature = "compress") {
        assert!(doc.is_compressed());
        assert_eq!(&doc.into_bytes()[..2], &[0x1f, 0x8b]);
    } else {
        let svg = svg(doc);
        assert!(svg.ends_with(svg_graph::compress::UNAVAILABLE));
        assert!(svg.contains("</svg>"));
    }
}

/// Records the variables it was handed instead of rendering
#[derive(Default)]
struct Recorder {
    names: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
}

impl TemplateRenderer for Recorder {
    fn render(&mut self, name: &str, _: &str, context: &Context) -> Result<String, TemplateError> {
        self.names
            .borrow_mut()
            .extend(context.names().map(String::from));
        Ok(format!("<svg>{name}</svg>"))
    }
}

#[test]
fn renderers_receive_config_data_calc_and_trig_helpers() {
    let recorder = Recorder::default();
    let names = recorder.names.clone();
    let mut graph = Graph::new(Pie, options! { fields => vec!["a"] })
        .unwrap()
        .with_renderer(recorder);
    graph.add_data(DataSet::new(vec![1.0])).unwrap();
    assert_eq!(svg(graph.burn().unwrap()), "<svg>Pie</svg>");
    assert_eq!(*names.borrow(), ["config", "data", "calc", "sin", "cos"]);
}

#[test]
fn template_failures_are_render_errors() {
    struct Broken;
    impl TemplateRenderer for Broken {
        fn render(&mut self, name: &str, _: &str, context: &Context) -> Result<String, TemplateError> {
            svg_graph::Template::parse(name, "{{ calc.width + }}")?.render(context)
        }
    }

    let mut graph = Graph::new(Xy, options! {}).unwrap().with_renderer(Broken);
    graph.add_data(DataSet::new(vec![(1.0, 2.0)])).unwrap();
    let err = graph.burn().unwrap_err();
    let GraphError::Render { chart, source } = &err else {
        panic!("expected a render error, got {err:?}");
    };
    assert_eq!(*chart, "XY");
    assert!(matches!(source, TemplateError::Syntax { .. }));
}
