//! Heat maps: a grid of colored blocks, one per row and y field.
//!
//! Rows run left to right in the order given; y fields run top to bottom in
//! the resolved axis order. The axis order comes from the `y_axis_order`
//! option, or else from the header row of table data. Cell colors are
//! decided once, when the data set is accepted, by a replaceable
//! [`ColorStrategy`].

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use super::{CHAR_WIDTH, Chart, Label, PADDING};
use crate::config::{Config, Options};
use crate::data::{Cell, DataSet, DataStore, Grid, GridRow, Record, SetBody, StoredSet, Values};
use crate::errors::{GraphError, Result};
use crate::value::Value;

const TEMPLATE: &str = concat!(
    include_str!("../../templates/header.svg"),
    include_str!("../../templates/heatmap.svg"),
    include_str!("../../templates/footer.svg"),
);

/// What a color strategy knows about one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample<'a> {
    pub x: &'a str,
    pub field: &'a str,
    pub value: Option<f64>,
    /// Extents over every cell of the data set
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Decides the fill color of a cell
pub type ColorStrategy = Arc<dyn Fn(&CellSample<'_>) -> String + Send + Sync>;

/// A uniformly random `rgb(r,g,b)`, ignoring the cell
pub fn random_rgb(_: &CellSample<'_>) -> String {
    let mut rng = rand::rng();
    format!(
        "rgb({},{},{})",
        rng.random_range(0..255),
        rng.random_range(0..255),
        rng.random_range(0..255)
    )
}

/// Light to dark blue by the cell's position between the data set's extents
pub fn magnitude(sample: &CellSample<'_>) -> String {
    let (Some(value), Some(min), Some(max)) = (sample.value, sample.min, sample.max) else {
        return "rgb(238,238,238)".to_string();
    };
    let t = if max > min { (value - min) / (max - min) } else { 0.0 };
    let mix = |light: f64, dark: f64| (light + (dark - light) * t).round() as u8;
    format!("rgb({},{},{})", mix(247.0, 8.0), mix(251.0, 48.0), mix(255.0, 107.0))
}

#[derive(Clone)]
pub struct HeatMap {
    colors: ColorStrategy,
}

impl HeatMap {
    /// A heat map with random cell colors
    pub fn new() -> Self {
        Self {
            colors: Arc::new(random_rgb),
        }
    }

    /// A heat map whose cell colors come from `colors`
    pub fn with_colors<F>(colors: F) -> Self
    where
        F: Fn(&CellSample<'_>) -> String + Send + Sync + 'static,
    {
        Self {
            colors: Arc::new(colors),
        }
    }
}

impl Default for HeatMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeatMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatMap").finish_non_exhaustive()
    }
}

impl Chart for HeatMap {
    fn kind(&self) -> &'static str {
        "HeatMap"
    }

    fn defaults(&self) -> Options {
        super::merge([
            super::common_options(),
            crate::options! {
                y_axis_order => Vec::<String>::new(),
                block_width => 15,
                block_height => 15,
                gutter_width => 1,
                show_x_labels => true,
                show_y_labels => true,
            },
        ])
    }

    fn validate(&self, config: &Config) -> Result<()> {
        config.list("y_axis_order")?;
        for name in ["block_width", "block_height"] {
            if config.number(name)? <= 0.0 {
                return Err(GraphError::invalid(format!("`{name}` must be positive")));
            }
        }
        if config.number("gutter_width")? < 0.0 {
            return Err(GraphError::invalid("`gutter_width` must not be negative"));
        }
        Ok(())
    }

    fn accept(&self, config: &Config, data: &DataStore, set: DataSet) -> Result<StoredSet> {
        if !data.is_empty() {
            return Err(GraphError::TooManyDataSets { chart: self.kind() });
        }
        let explicit = config.list("y_axis_order")?;
        let (axis, rows) = match set.values {
            Values::Table(table) => from_table(explicit, table)?,
            Values::Records(records) => from_records(explicit, &records)?,
            other => {
                return Err(GraphError::UnsupportedData {
                    chart: self.kind(),
                    shape: other.shape(),
                });
            }
        };
        crate::log::debug!(rows = rows.len(), axis = ?axis, "accepted heat map data");
        Ok(StoredSet {
            title: set.title,
            body: SetBody::Grid(self.colorize(axis, rows)),
        })
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        super::to_calc(&layout(config, data)?)
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }
}

/// A row before coloring: its x label and one value per axis field
type RawRow = (String, Vec<Option<f64>>);

impl HeatMap {
    fn colorize(&self, axis: Vec<String>, rows: Vec<RawRow>) -> Grid {
        let present = || rows.iter().flat_map(|(_, values)| values.iter().flatten().copied());
        let min = present().reduce(f64::min);
        let max = present().reduce(f64::max);
        let colored = rows
            .iter()
            .map(|(x, values)| GridRow {
                x: x.clone(),
                cells: axis
                    .iter()
                    .zip(values)
                    .map(|(field, value)| Cell {
                        value: *value,
                        color: (self.colors)(&CellSample {
                            x,
                            field,
                            value: *value,
                            min,
                            max,
                        }),
                    })
                    .collect(),
            })
            .collect();
        Grid {
            axis,
            rows: colored,
        }
    }
}

/// Table data: a header row `[x, field, ...]` followed by `[x, value, ...]` rows
fn from_table(explicit: Vec<String>, table: Vec<Vec<Value>>) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut table = table.into_iter();
    let header: Vec<String> = table
        .next()
        .map(|row| row.iter().skip(1).map(ToString::to_string).collect())
        .unwrap_or_default();
    let axis = if explicit.is_empty() { header.clone() } else { explicit };
    if axis.is_empty() {
        return Err(GraphError::MissingAxisOrder);
    }

    let columns = axis
        .iter()
        .map(|field| {
            header
                .iter()
                .position(|h| h == field)
                .map(|p| p + 1)
                .ok_or_else(|| GraphError::row(0, format!("header has no `{field}` column")))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = table
        .enumerate()
        .map(|(i, row)| {
            let index = i + 1;
            let x = row_label(row.first(), index)?;
            let values = axis
                .iter()
                .zip(&columns)
                .map(|(field, column)| match row.get(*column) {
                    Some(value) => cell_value(value, field, index),
                    None => Err(GraphError::row(index, format!("missing `{field}`"))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((x, values))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((axis, rows))
}

/// Record data: each record has `x` and one key per axis field
fn from_records(explicit: Vec<String>, records: &[Record]) -> Result<(Vec<String>, Vec<RawRow>)> {
    if explicit.is_empty() {
        return Err(GraphError::MissingAxisOrder);
    }
    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let x = row_label(record.get("x"), index)?;
            let values = explicit
                .iter()
                .map(|field| match record.get(field) {
                    Some(value) => cell_value(value, field, index),
                    None => Err(GraphError::row(index, format!("missing `{field}`"))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((x, values))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((explicit, rows))
}

fn row_label(x: Option<&Value>, index: usize) -> Result<String> {
    match x {
        None | Some(Value::Null) => Err(GraphError::row(index, "missing `x`")),
        Some(x) => Ok(x.to_string()),
    }
}

fn cell_value(value: &Value, field: &str, index: usize) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_number()
            .map(Some)
            .ok_or_else(|| GraphError::row(index, format!("`{field}` is not a number: {other}"))),
    }
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRect {
    pub row: usize,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub value: Option<f64>,
    pub label: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatMapLayout {
    pub width: f64,
    pub height: f64,
    pub title: Option<Label>,
    pub subtitle: Option<Label>,
    /// Longest data set title
    pub max_key_size: usize,
    /// Number of rows
    pub max_x: usize,
    /// Number of y fields
    pub max_y: usize,
    pub max_x_label_length: usize,
    pub max_y_label_length: usize,
    pub cells: Vec<CellRect>,
    pub x_labels: Vec<Label>,
    pub y_labels: Vec<Label>,
}

pub(crate) fn layout(config: &Config, data: &DataStore) -> Result<HeatMapLayout> {
    let grid = data.first().and_then(StoredSet::grid).ok_or(GraphError::NoData)?;
    let block_width = config.number("block_width")?;
    let block_height = config.number("block_height")?;
    let gutter = config.number("gutter_width")?;

    let max_key_size = super::longest(data.iter().filter_map(|set| set.title.as_deref()));
    let max_x = grid.rows.len();
    let max_y = grid.axis.len();
    let max_x_label_length = super::longest(grid.rows.iter().map(|row| row.x.as_str()));
    let max_y_label_length = super::longest(grid.axis.iter().map(String::as_str));

    let y_label_room = CHAR_WIDTH * max_y_label_length as f64;
    let x_label_room = CHAR_WIDTH * max_x_label_length as f64;
    let width = 2.0 * PADDING + y_label_room + 1.0 + max_x as f64 * (block_width + gutter);
    let titles = super::titles(config, width)?;
    let height =
        2.0 * PADDING + x_label_room + 1.0 + max_y as f64 * (block_height + gutter) + titles.height;
    let origin_x = PADDING + y_label_room + 1.0;
    let origin_y = PADDING + x_label_room + 1.0 + titles.height;

    let mut cells = Vec::with_capacity(max_x * max_y);
    for (row, grid_row) in grid.rows.iter().enumerate() {
        for (column, (cell, field)) in grid_row.cells.iter().zip(&grid.axis).enumerate() {
            cells.push(CellRect {
                row,
                column,
                x: origin_x + row as f64 * (block_width + gutter),
                y: origin_y + column as f64 * (block_height + gutter),
                width: block_width,
                height: block_height,
                color: cell.color.clone(),
                value: cell.value,
                label: grid_row.x.clone(),
                field: field.clone(),
            });
        }
    }

    let x_labels = if config.flag("show_x_labels")? {
        grid.rows
            .iter()
            .enumerate()
            .map(|(row, grid_row)| {
                Label::new(
                    origin_x + row as f64 * (block_width + gutter) + block_width / 2.0 + 4.0,
                    origin_y - 2.0,
                    grid_row.x.clone(),
                    "start",
                )
                .rotated(-90.0)
            })
            .collect()
    } else {
        Vec::new()
    };
    let y_labels = if config.flag("show_y_labels")? {
        grid.axis
            .iter()
            .enumerate()
            .map(|(column, field)| {
                Label::new(
                    origin_x - 2.0,
                    origin_y + column as f64 * (block_height + gutter) + block_height / 2.0 + 4.0,
                    field.clone(),
                    "end",
                )
            })
            .collect()
    } else {
        Vec::new()
    };

    crate::log::debug!(width, height, max_x, max_y, "heat map layout");
    Ok(HeatMapLayout {
        width,
        height,
        title: titles.title,
        subtitle: titles.subtitle,
        max_key_size,
        max_x,
        max_y,
        max_x_label_length,
        max_y_label_length,
        cells,
        x_labels,
        y_labels,
    })
}
