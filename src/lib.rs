//! Templated SVG charts.
//!
//! A [`Graph`] owns one chart [`Variant`], its [`Config`] and the data sets
//! added to it. [`Graph::burn`] lays the chart out, renders the variant's
//! template through a [`TemplateRenderer`] and returns the SVG [`Document`],
//! optionally gzip-compressed.
//!
//! ```
//! use svg_graph::{DataSet, Graph, Line, options};
//!
//! let mut graph = Graph::new(
//!     Line::default(),
//!     options! {
//!         fields => vec!["Jan", "Feb", "Mar"],
//!         show_graph_title => true,
//!         graph_title => "Sales",
//!     },
//! )?;
//! graph.add_data(DataSet::new(vec![12.0, 45.0, 21.0]).title("2024"))?;
//! let doc = graph.burn()?;
//! assert!(doc.as_svg().is_some_and(|svg| svg.contains("Sales")));
//! # Ok::<(), svg_graph::GraphError>(())
//! ```

pub mod chart;
pub mod compress;
pub mod config;
pub mod data;
pub mod errors;
mod graph;
mod log;
pub mod template;
pub mod value;

pub use chart::{
    Bar, BarHorizontal, BarLine, BarStack, CellSample, Chart, ColorStrategy, HeatMap, Line, Pie,
    TimeSeries, Variant, Xy,
};
pub use compress::Document;
pub use config::{Config, Options};
pub use data::{DataSet, DataStore, Record, StoredSet, Values};
pub use errors::{GraphError, Result, TemplateError};
pub use graph::Graph;
pub use template::{Context, Engine, Template, TemplateRenderer};
pub use value::{Function, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_convert_from_chart_types() {
        let variants: Vec<Variant> = vec![
            Line.into(),
            Bar.into(),
            BarHorizontal.into(),
            BarLine.into(),
            Xy.into(),
            TimeSeries.into(),
            Pie.into(),
            HeatMap::default().into(),
        ];
        let kinds: Vec<&str> = variants.iter().map(Chart::kind).collect();
        assert_eq!(
            kinds,
            ["Line", "Bar", "BarHorizontal", "BarLine", "XY", "TimeSeries", "Pie", "HeatMap"]
        );
    }

    #[test]
    fn every_variant_declares_the_common_options() {
        for variant in [Variant::from(Line), Variant::from(Pie), Variant::from(HeatMap::new())] {
            let config = Config::seeded(variant.kind(), variant.defaults());
            for name in ["width", "height", "style_sheet", "compress", "graph_title"] {
                assert!(config.contains(name), "{} lacks {name}", variant.kind());
            }
        }
    }
}
