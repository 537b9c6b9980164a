//! Scatter and line plots of x/y pairs

use super::axis::{
    self, AXIS_TEMPLATE, AxisFrame, AxisLayout, Decorations, Dot, Scale, Series, area_path,
    line_path,
};
use super::{Chart, series_title};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, Point, Record, SetBody, StoredSet, Values};
use crate::errors::{GraphError, Result};
use crate::value::{Value, fmt_num};

#[derive(Debug, Clone, Default)]
pub struct Xy;

pub(crate) fn xy_options() -> Options {
    super::merge([
        super::common_options(),
        super::axis_options(),
        crate::options! {
            x_title => "X Scale",
            show_lines => true,
            show_data_points => true,
            area_fill => false,
            min_x_value => Value::Null,
            scale_x_divisions => Value::Null,
            x_label_formatter => Value::Null,
        },
    ])
}

impl Chart for Xy {
    fn kind(&self) -> &'static str {
        "XY"
    }

    fn defaults(&self) -> Options {
        xy_options()
    }

    fn validate(&self, config: &Config) -> Result<()> {
        axis::validate_axis(config)?;
        config.opt_number("min_x_value")?;
        config.opt_number("scale_x_divisions")?;
        config.formatter("x_label_formatter")?;
        Ok(())
    }

    fn accept(&self, _config: &Config, _data: &DataStore, set: DataSet) -> Result<StoredSet> {
        let points = match set.values {
            Values::Positional(flat) => pairs(&flat)?,
            Values::Points(points) => points.into_iter().map(|(x, y)| Point { x, y }).collect(),
            Values::Records(records) => records
                .iter()
                .enumerate()
                .map(|(i, record)| {
                    Ok(Point {
                        x: coordinate(record, "x", i)?,
                        y: coordinate(record, "y", i)?,
                    })
                })
                .collect::<Result<_>>()?,
            other => {
                return Err(GraphError::UnsupportedData {
                    chart: self.kind(),
                    shape: other.shape(),
                });
            }
        };
        crate::log::debug!(points = points.len(), "accepted xy data");
        Ok(StoredSet {
            title: set.title,
            body: SetBody::Points(points),
        })
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        let formatter = config.formatter("x_label_formatter")?;
        let layout = plot(
            config,
            data,
            |lo, hi| {
                Ok(Scale::nice(
                    lo,
                    hi,
                    config.opt_number("min_x_value")?,
                    config.opt_number("scale_x_divisions")?,
                ))
            },
            |x| axis::format_value(formatter, "x_label_formatter", x),
        )?;
        super::to_calc(&layout)
    }

    fn template(&self) -> &'static str {
        AXIS_TEMPLATE
    }
}

/// Flattened `x1, y1, x2, y2, ...` values
fn pairs(flat: &[Option<f64>]) -> Result<Vec<Point>> {
    if flat.len() % 2 == 1 {
        return Err(GraphError::row(
            flat.len() / 2,
            "odd number of values; expected x, y pairs",
        ));
    }
    flat.chunks(2)
        .enumerate()
        .map(|(i, pair)| match pair {
            [Some(x), Some(y)] => Ok(Point { x: *x, y: *y }),
            _ => Err(GraphError::row(i, "empty coordinate")),
        })
        .collect()
}

fn coordinate(record: &Record, key: &str, index: usize) -> Result<f64> {
    let value = record
        .get(key)
        .ok_or_else(|| GraphError::row(index, format!("missing `{key}`")))?;
    value
        .as_number()
        .ok_or_else(|| GraphError::row(index, format!("`{key}` is not a number: {value}")))
}

/// Lay out point series against an x scale chosen by the caller
pub(crate) fn plot(
    config: &Config,
    data: &DataStore,
    x_scale: impl FnOnce(f64, f64) -> Result<Scale>,
    x_label: impl Fn(f64) -> Result<String>,
) -> Result<AxisLayout> {
    let sets: Vec<(String, Vec<Point>)> = data
        .iter()
        .enumerate()
        .map(|(i, set)| {
            let mut points = set.points().map(<[Point]>::to_vec).unwrap_or_default();
            points.sort_by(|a, b| a.x.total_cmp(&b.x));
            (series_title(set, i), points)
        })
        .collect();

    let all = || sets.iter().flat_map(|(_, points)| points.iter());
    let x_extent = axis::extent(all().map(|p| p.x));
    let y_extent = axis::extent(all().map(|p| p.y));
    let x_scale = x_scale(x_extent.0, x_extent.1)?;
    let y_scale = axis::value_scale(config, y_extent.0, y_extent.1)?;

    let x_texts = x_scale
        .ticks()
        .into_iter()
        .map(&x_label)
        .collect::<Result<Vec<_>>>()?;
    let y_texts = axis::tick_texts(config, &y_scale, "y_label_formatter")?;
    let key_titles: Vec<String> = sets.iter().map(|(title, _)| title.clone()).collect();
    let frame = AxisFrame::new(
        config,
        Decorations {
            x_labels: &x_texts,
            y_labels: &y_texts,
            key_titles: &key_titles,
        },
    )?;

    let show_lines = config.flag("show_lines")?;
    let area_fill = config.flag("area_fill")?;
    let show_values = config.flag("show_data_values")?;
    let floor = frame.y_of(&y_scale, axis::baseline(&y_scale));

    let series = sets
        .into_iter()
        .enumerate()
        .map(|(index, (title, points))| {
            let mut series = Series::new(index, title);
            series.points = points
                .iter()
                .map(|p| {
                    let (x, y) = (frame.x_of(&x_scale, p.x), frame.y_of(&y_scale, p.y));
                    Dot {
                        x,
                        y,
                        value: p.y,
                        label: show_values.then(|| axis::value_label(x, y, fmt_num(p.y))),
                    }
                })
                .collect();
            let coords: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.y)).collect();
            if show_lines {
                series.line = line_path(&coords);
            }
            if area_fill {
                series.area = area_path(&coords, floor);
            }
            series
        })
        .collect();

    let (x_labels, x_guides) = frame.horizontal_axis(&x_scale, x_texts);
    let (y_labels, y_guides) = frame.vertical_axis(&y_scale, y_texts);
    Ok(frame.finish(x_labels, y_labels, x_guides, y_guides, series, y_extent))
}
