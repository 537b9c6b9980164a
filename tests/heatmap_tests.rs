//! Heat map normalization and layout through the facade.

use regex_lite::Regex;
use svg_graph::chart::heatmap::magnitude;
use svg_graph::{CellSample, DataSet, Graph, GraphError, HeatMap, Record, Value, Values, options};

/// Deterministic colors naming the cell they were picked for
fn named(sample: &CellSample<'_>) -> String {
    format!("{}/{}", sample.x, sample.field)
}

fn week() -> Values {
    Values::table([
        vec![Value::from("x"), Value::from("c"), Value::from("b")],
        vec![Value::from("Mon"), Value::from(1), Value::from(2)],
        vec![Value::from("Tuesday"), Value::from(3), Value::from(4)],
    ])
}

fn record(x: &str, c: f64, b: f64) -> Record {
    [
        ("x".to_string(), Value::from(x)),
        ("b".to_string(), Value::from(b)),
        ("c".to_string(), Value::from(c)),
    ]
    .into_iter()
    .collect()
}

fn burn(graph: &mut Graph) -> String {
    graph.burn().unwrap().as_svg().unwrap().to_string()
}

#[test]
fn header_order_matches_explicit_order() {
    let mut from_header = Graph::new(HeatMap::with_colors(named), options! {}).unwrap();
    from_header.add_data(DataSet::new(week())).unwrap();

    let mut explicit = Graph::new(
        HeatMap::with_colors(named),
        options! { y_axis_order => vec!["c", "b"] },
    )
    .unwrap();
    explicit
        .add_data(DataSet::new(vec![
            record("Mon", 1.0, 2.0),
            record("Tuesday", 3.0, 4.0),
        ]))
        .unwrap();

    assert_eq!(from_header.data().first(), explicit.data().first());
    assert_eq!(burn(&mut from_header), burn(&mut explicit));
}

#[test]
fn cells_are_placed_row_by_column() {
    let mut graph = Graph::new(HeatMap::with_colors(named), options! {}).unwrap();
    graph.add_data(DataSet::new(week())).unwrap();
    let svg = burn(&mut graph);

    let root = Regex::new(r#"<svg [^>]*width="([^"]+)" height="([^"]+)""#).unwrap();
    let caps = root.captures(&svg).unwrap();
    assert_eq!((&caps[1], &caps[2]), ("61", "109"));

    let cell = Regex::new(r#"<rect x="([^"]+)" y="([^"]+)" width="15" height="15" fill="([^"]+)""#)
        .unwrap();
    let cells: Vec<String> = cell
        .captures_iter(&svg)
        .map(|c| format!("{},{}={}", &c[1], &c[2], &c[3]))
        .collect();
    insta::assert_snapshot!(cells.join("\n"), @r"
    19,67=Mon/c
    19,83=Mon/b
    35,67=Tuesday/c
    35,83=Tuesday/b
    ");
}

#[test]
fn labels_run_along_both_edges() {
    let mut graph = Graph::new(HeatMap::with_colors(named), options! {}).unwrap();
    graph.add_data(DataSet::new(week())).unwrap();
    let svg = burn(&mut graph);

    let x_labels = Regex::new(r#"transform="rotate\(-90 [^"]*\)" class="xAxisLabels">([^<]*)<"#)
        .unwrap();
    let xs: Vec<&str> = x_labels
        .captures_iter(&svg)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();
    assert_eq!(xs, ["Mon", "Tuesday"]);

    let y_labels = Regex::new(r#"text-anchor="end" class="yAxisLabels">([^<]*)<"#).unwrap();
    let ys: Vec<&str> = y_labels
        .captures_iter(&svg)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();
    assert_eq!(ys, ["c", "b"]);
}

#[test]
fn hidden_labels_keep_the_grid() {
    let mut graph = Graph::new(
        HeatMap::with_colors(named),
        options! { show_x_labels => false, show_y_labels => false },
    )
    .unwrap();
    graph.add_data(DataSet::new(week())).unwrap();
    let svg = burn(&mut graph);
    assert!(!svg.contains("class=\"xAxisLabels\">"));
    assert!(!svg.contains("class=\"yAxisLabels\">"));
    assert_eq!(svg.matches("class=\"heatCell\">").count(), 4);
}

#[test]
fn default_colors_are_random_rgb() {
    let mut graph = Graph::new(HeatMap::default(), options! {}).unwrap();
    graph.add_data(DataSet::new(week())).unwrap();
    let svg = burn(&mut graph);
    let fill = Regex::new(r#"fill="rgb\((\d+),(\d+),(\d+)\)" class="heatCell""#).unwrap();
    let channels: Vec<u32> = fill
        .captures_iter(&svg)
        .flat_map(|c| (1..=3).map(move |i| c[i].parse::<u32>().unwrap()))
        .collect();
    assert_eq!(channels.len(), 12);
    assert!(channels.iter().all(|c| *c < 255));
}

#[test]
fn magnitude_strategy_uses_the_data_extents() {
    let mut graph = Graph::new(HeatMap::with_colors(magnitude), options! {}).unwrap();
    graph.add_data(DataSet::new(week())).unwrap();
    let grid = graph.data().first().unwrap().grid().unwrap();
    assert_eq!(grid.rows[0].cells[0].color, "rgb(247,251,255)");
    assert_eq!(grid.rows[1].cells[1].color, "rgb(8,48,107)");
}

#[test]
fn empty_cells_are_kept() {
    let mut graph = Graph::new(HeatMap::with_colors(named), options! {}).unwrap();
    graph
        .add_data(DataSet::new(Values::table([
            vec![Value::from("x"), Value::from("a")],
            vec![Value::from("Mon"), Value::Null],
        ])))
        .unwrap();
    let svg = burn(&mut graph);
    assert!(svg.contains("<title>Mon a: -</title>"));
}

#[test]
fn malformed_rows_are_rejected() {
    let mut graph = Graph::new(HeatMap::with_colors(named), options! {}).unwrap();
    let err = graph
        .add_data(DataSet::new(Values::table([
            vec![Value::from("x"), Value::from("a")],
            vec![Value::Null, Value::from(1)],
        ])))
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidRow { index: 1, .. }));

    let err = graph
        .add_data(DataSet::new(Values::table([
            vec![Value::from("x"), Value::from("a")],
            vec![Value::from("Mon"), Value::from("lots")],
        ])))
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidRow { index: 1, .. }));

    let err = Graph::new(
        HeatMap::default(),
        options! { y_axis_order => vec!["a", "z"] },
    )
    .unwrap()
    .add_data(DataSet::new(Values::table([
        vec![Value::from("x"), Value::from("a")],
        vec![Value::from("Mon"), Value::from(1)],
    ])))
    .unwrap_err();
    assert!(matches!(err, GraphError::InvalidRow { index: 0, .. }));
    assert!(graph.data().is_empty());
}

#[test]
fn positional_data_is_unsupported() {
    let mut graph = Graph::new(HeatMap::default(), options! {}).unwrap();
    let err = graph.add_data(DataSet::new(vec![1.0, 2.0])).unwrap_err();
    assert!(matches!(
        err,
        GraphError::UnsupportedData { chart: "HeatMap", shape: "positional" }
    ));
}

#[test]
fn block_sizes_are_validated() {
    for overrides in [
        options! { block_width => 0 },
        options! { block_height => -3 },
        options! { gutter_width => -1 },
    ] {
        let err = Graph::new(HeatMap::default(), overrides).unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfiguration { .. }));
    }
}
