//! Chart variants.
//!
//! Every variant implements [`Chart`]: it declares its option defaults,
//! validates the seeded config, normalizes incoming data sets, computes the
//! layout the template draws from, and names its template. [`Variant`] is the
//! closed union the graph facade dispatches over.

pub mod axis;
mod bar;
mod bar_horizontal;
mod bar_line;
pub mod heatmap;
mod line;
pub mod pie;
mod time_series;
mod xy;

use enum_dispatch::enum_dispatch;
use serde::Serialize;

use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, SetBody, StoredSet, Values};
use crate::errors::{GraphError, Result};
use crate::value::Value;

pub use bar::{Bar, BarStack};
pub use bar_horizontal::BarHorizontal;
pub use bar_line::BarLine;
pub use heatmap::{CellSample, ColorStrategy, HeatMap};
pub use line::Line;
pub use pie::Pie;
pub use time_series::TimeSeries;
pub use xy::Xy;

/// Approximate advance of one label character, in px
pub(crate) const CHAR_WIDTH: f64 = 8.0;
/// Outer margin around the drawing, in px
pub(crate) const PADDING: f64 = 10.0;
pub(crate) const TITLE_FONT: f64 = 16.0;
pub(crate) const SUBTITLE_FONT: f64 = 12.0;
/// Side of a key color swatch, in px
pub(crate) const KEY_BOX: f64 = 12.0;
pub(crate) const KEY_GAP: f64 = 5.0;

/// The hooks a chart variant supplies to the graph facade
#[enum_dispatch]
pub trait Chart {
    /// Display name used in errors and logs
    fn kind(&self) -> &'static str;

    /// Every option this variant understands, with its default value
    fn defaults(&self) -> Options;

    /// Check the config after defaults and overrides are applied
    fn validate(&self, config: &Config) -> Result<()>;

    /// Validate and normalize one data set against what is already stored
    fn accept(&self, config: &Config, data: &DataStore, set: DataSet) -> Result<StoredSet>;

    /// Derived values for the template, recomputed on every render
    fn layout(&self, _config: &Config, _data: &DataStore) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Template source rendered by `burn`
    fn template(&self) -> &'static str;
}

/// All chart variants
#[enum_dispatch(Chart)]
#[derive(Clone, Debug)]
pub enum Variant {
    Line,
    Bar,
    BarHorizontal,
    BarLine,
    Xy,
    TimeSeries,
    Pie,
    HeatMap,
}

// ============================================================================
// Shared defaults
// ============================================================================

/// Options every variant declares
pub(crate) fn common_options() -> Options {
    crate::options! {
        width => 500,
        height => 300,
        style_sheet => "",
        show_graph_title => false,
        graph_title => "Graph Title",
        show_graph_subtitle => false,
        graph_subtitle => "Graph Sub Title",
        compress => false,
    }
}

/// Options shared by the variants drawn on x/y axes
pub(crate) fn axis_options() -> Options {
    crate::options! {
        show_x_labels => true,
        show_y_labels => true,
        rotate_x_labels => false,
        stagger_x_labels => false,
        show_x_title => false,
        x_title => "X Field names",
        show_y_title => false,
        y_title => "Y Scale",
        show_data_values => true,
        min_scale_value => Value::Null,
        scale_divisions => Value::Null,
        key => false,
        key_position => "right",
        y_label_formatter => Value::Null,
    }
}

/// Concatenate option tables; later tables override earlier entries
pub(crate) fn merge(tables: impl IntoIterator<Item = Options>) -> Options {
    let mut merged: Options = Vec::new();
    for (name, value) in tables.into_iter().flatten() {
        match merged.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => merged.push((name, value)),
        }
    }
    merged
}

/// Canvas size from the `width`/`height` options
pub(crate) fn canvas(config: &Config) -> Result<(f64, f64)> {
    let width = config.number("width")?;
    let height = config.number("height")?;
    if !(width > 0.0 && height > 0.0) {
        return Err(GraphError::invalid(format!(
            "canvas must have a positive size, got {width}x{height}"
        )));
    }
    Ok((width, height))
}

// ============================================================================
// Field-keyed data
// ============================================================================

/// Construction check for variants keyed by the `fields` option
pub(crate) fn require_fields(config: &Config) -> Result<()> {
    if config.list("fields")?.is_empty() {
        return Err(GraphError::invalid(
            "`fields` must name at least one field",
        ));
    }
    Ok(())
}

/// Align a positional or keyed data set with the declared fields
pub(crate) fn accept_fields(chart: &'static str, config: &Config, set: DataSet) -> Result<StoredSet> {
    let fields = config.list("fields")?;
    if fields.is_empty() {
        return Err(GraphError::MissingFields { chart });
    }

    let values = match set.values {
        Values::Positional(values) => {
            if values.len() > fields.len() {
                return Err(GraphError::row(
                    fields.len(),
                    format!("{} values for {} fields", values.len(), fields.len()),
                ));
            }
            fields
                .into_iter()
                .enumerate()
                .map(|(i, field)| (field, values.get(i).copied().flatten()))
                .collect()
        }
        Values::Keyed(keyed) => {
            if let Some((index, (name, _))) = keyed
                .iter()
                .enumerate()
                .find(|(_, (name, _))| !fields.contains(name))
            {
                return Err(GraphError::row(index, format!("unknown field `{name}`")));
            }
            fields
                .into_iter()
                .map(|field| {
                    let value = keyed.get(&field).copied();
                    (field, value)
                })
                .collect()
        }
        other => {
            return Err(GraphError::UnsupportedData {
                chart,
                shape: other.shape(),
            });
        }
    };

    crate::log::debug!(chart, title = ?set.title, "accepted field data");
    Ok(StoredSet {
        title: set.title,
        body: SetBody::Fields(values),
    })
}

/// Values of one stored set in the order of `fields`
pub(crate) fn field_values(set: &StoredSet, fields: &[String]) -> Vec<Option<f64>> {
    match set.fields() {
        Some(values) => fields
            .iter()
            .map(|field| values.get(field).copied().flatten())
            .collect(),
        None => vec![None; fields.len()],
    }
}

/// Key text for a data set: its title, or its position
pub(crate) fn series_title(set: &StoredSet, index: usize) -> String {
    set.title
        .clone()
        .unwrap_or_else(|| format!("Series {}", index + 1))
}

// ============================================================================
// Titles
// ============================================================================

/// A positioned piece of text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub anchor: &'static str,
    /// Rotation in degrees about the label's anchor point
    pub rotate: Option<f64>,
}

impl Label {
    pub(crate) fn new(x: f64, y: f64, text: impl Into<String>, anchor: &'static str) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            anchor,
            rotate: None,
        }
    }

    pub(crate) fn rotated(mut self, degrees: f64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// Graph title and subtitle, centered above the drawing
#[derive(Debug, Clone, Default, Serialize)]
pub struct Titles {
    pub title: Option<Label>,
    pub subtitle: Option<Label>,
    /// Vertical space the titles take up
    pub height: f64,
}

pub(crate) fn titles(config: &Config, width: f64) -> Result<Titles> {
    let mut titles = Titles::default();
    let center = width / 2.0;
    if config.flag("show_graph_title")? {
        titles.height += TITLE_FONT + KEY_GAP;
        titles.title = Some(Label::new(
            center,
            PADDING + titles.height - KEY_GAP,
            config.text("graph_title")?,
            "middle",
        ));
    }
    if config.flag("show_graph_subtitle")? {
        titles.height += SUBTITLE_FONT + KEY_GAP;
        titles.subtitle = Some(Label::new(
            center,
            PADDING + titles.height - KEY_GAP,
            config.text("graph_subtitle")?,
            "middle",
        ));
    }
    Ok(titles)
}

/// Serialize a layout record for the template context
pub(crate) fn to_calc<T: Serialize>(layout: &T) -> Result<Option<Value>> {
    Value::from_serialize(layout)
        .map(Some)
        .map_err(|e| GraphError::invalid(format!("layout is not representable: {e}")))
}

/// Length of the longest string, in characters
pub(crate) fn longest<'a>(texts: impl IntoIterator<Item = &'a str>) -> usize {
    texts
        .into_iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_config() -> Config {
        Config::seeded(
            "Test",
            merge([
                common_options(),
                crate::options! { fields => vec!["Jan", "Feb", "Mar"] },
            ]),
        )
    }

    #[test]
    fn merge_keeps_first_position_and_last_value() {
        let merged = merge([
            crate::options! { a => 1, b => 2 },
            crate::options! { a => 3, c => 4 },
        ]);
        let names: Vec<_> = merged.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(merged[0].1, Value::from(3));
    }

    #[test]
    fn positional_values_align_with_fields() {
        let stored = accept_fields(
            "Test",
            &fields_config(),
            DataSet::new(vec![Some(1.0), None]),
        )
        .unwrap();
        let values = stored.fields().unwrap();
        assert_eq!(values["Jan"], Some(1.0));
        assert_eq!(values["Feb"], None);
        assert_eq!(values["Mar"], None);
    }

    #[test]
    fn extra_positional_values_are_rejected() {
        let err = accept_fields(
            "Test",
            &fields_config(),
            DataSet::new(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRow { index: 3, .. }));
    }

    #[test]
    fn keyed_values_follow_declared_order() {
        let stored = accept_fields(
            "Test",
            &fields_config(),
            DataSet::new(Values::keyed([("Mar", 3.0), ("Jan", 1.0)])),
        )
        .unwrap();
        let names: Vec<_> = stored.fields().unwrap().keys().cloned().collect();
        assert_eq!(names, ["Jan", "Feb", "Mar"]);

        let err = accept_fields(
            "Test",
            &fields_config(),
            DataSet::new(Values::keyed([("Apr", 3.0)])),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRow { index: 0, .. }));
    }

    #[test]
    fn empty_fields_are_missing_at_accept() {
        let mut config = fields_config();
        config.set("fields", Vec::<String>::new()).unwrap();
        let err = accept_fields("Test", &config, DataSet::new(vec![1.0])).unwrap_err();
        assert!(matches!(err, GraphError::MissingFields { chart: "Test" }));
        assert!(matches!(
            require_fields(&config),
            Err(GraphError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn point_data_is_unsupported_for_fields() {
        let err = accept_fields(
            "Test",
            &fields_config(),
            DataSet::new(vec![(1.0, 2.0)]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnsupportedData { shape: "point", .. }
        ));
    }

    #[test]
    fn titles_stack_below_padding() {
        let mut config = fields_config();
        config.set("show_graph_title", true).unwrap();
        config.set("show_graph_subtitle", true).unwrap();
        let titles = titles(&config, 400.0).unwrap();
        let title = titles.title.unwrap();
        let subtitle = titles.subtitle.unwrap();
        assert_eq!(title.x, 200.0);
        assert_eq!(title.y, PADDING + TITLE_FONT);
        assert!(subtitle.y > title.y);
        assert_eq!(titles.height, TITLE_FONT + SUBTITLE_FONT + 2.0 * KEY_GAP);
    }
}
