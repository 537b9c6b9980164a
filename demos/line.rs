//! Render a stacked line graph with a formatted value axis.

use svg_graph::{DataSet, Function, Graph, Line, Value, options};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut graph = Graph::new(
        Line,
        options! {
            fields => vec!["Q1", "Q2", "Q3", "Q4"],
            width => 640,
            height => 400,
            stacked => true,
            area_fill => true,
            key => true,
            key_position => "bottom",
            show_y_title => true,
            y_title => "Revenue",
            y_label_formatter => Function::formatter("money", |v: &Value| format!("${v}k")),
        },
    )?;
    graph.add_data(DataSet::new(vec![10.0, 14.0, 9.0, 17.0]).title("Hardware"))?;
    graph.add_data(DataSet::new(vec![4.0, 6.0, 11.0, 12.0]).title("Services"))?;

    let doc = graph.burn()?;
    print!("{}", String::from_utf8_lossy(&doc.into_bytes()));
    Ok(())
}
