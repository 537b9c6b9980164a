//! Render a pie chart to stdout, or to the file named by the first argument.
//!
//! Run with `cargo run --example pie --features tracing` to see layout logs.

use svg_graph::{DataSet, Graph, Pie, options};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let mut graph = Graph::new(
        Pie,
        options! {
            fields => vec!["Jan", "Feb", "Mar"],
            show_graph_title => true,
            graph_title => "First quarter",
            key => true,
            expand_greatest => true,
            show_data_labels => true,
        },
    )?;
    graph.add_data(DataSet::new(vec![12.0, 45.0, 21.0]).title("Sales"))?;
    write(graph.burn()?.into_bytes())
}

fn write(bytes: Vec<u8>) -> miette::Result<()> {
    match std::env::args().nth(1) {
        Some(path) => std::fs::write(&path, bytes)
            .map_err(|e| miette::miette!("cannot write {path}: {e}")),
        None => {
            print!("{}", String::from_utf8_lossy(&bytes));
            Ok(())
        }
    }
}
