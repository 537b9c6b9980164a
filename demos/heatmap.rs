//! Render a heat map of weekly activity, colored by magnitude.

use svg_graph::chart::heatmap::magnitude;
use svg_graph::{DataSet, Graph, HeatMap, Value, Values, options};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let hours = ["morning", "noon", "evening", "night"];
    let mut header = vec![Value::from("x")];
    header.extend(hours.iter().map(|h| Value::from(*h)));

    let mut rows = vec![header];
    for (day, base) in [("Mon", 3.0), ("Tue", 5.0), ("Wed", 2.0), ("Thu", 8.0), ("Fri", 6.0)] {
        let mut row = vec![Value::from(day)];
        row.extend((0..hours.len()).map(|i| Value::from(base * (i as f64 + 1.0) % 10.0)));
        rows.push(row);
    }

    let mut graph = Graph::new(
        HeatMap::with_colors(magnitude),
        options! { block_width => 24, block_height => 24, gutter_width => 2 },
    )?;
    graph.add_data(DataSet::new(Values::Table(rows)))?;
    let doc = graph.burn()?;
    print!("{}", String::from_utf8_lossy(&doc.into_bytes()));
    Ok(())
}
