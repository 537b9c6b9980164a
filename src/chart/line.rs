//! Line graphs over the declared fields

use super::axis::{
    self, AXIS_TEMPLATE, AxisFrame, AxisLayout, Decorations, Dot, Series, area_path, line_path,
};
use super::{Chart, accept_fields, field_values, series_title};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, StoredSet};
use crate::errors::Result;
use crate::value::{Value, fmt_num};

/// One line per data set, one point per field
#[derive(Debug, Clone, Default)]
pub struct Line;

impl Chart for Line {
    fn kind(&self) -> &'static str {
        "Line"
    }

    fn defaults(&self) -> Options {
        super::merge([
            super::common_options(),
            super::axis_options(),
            crate::options! {
                fields => Vec::<String>::new(),
                show_data_points => true,
                area_fill => false,
                stacked => false,
            },
        ])
    }

    fn validate(&self, config: &Config) -> Result<()> {
        super::require_fields(config)?;
        axis::validate_axis(config)
    }

    fn accept(&self, config: &Config, _data: &DataStore, set: DataSet) -> Result<StoredSet> {
        accept_fields(self.kind(), config, set)
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        super::to_calc(&layout(config, data)?)
    }

    fn template(&self) -> &'static str {
        AXIS_TEMPLATE
    }
}

/// Running totals across data sets, field by field
fn stack(sets: &mut [(String, Vec<Option<f64>>)]) {
    let width = sets.first().map_or(0, |(_, values)| values.len());
    let mut totals = vec![0.0; width];
    for (_, values) in sets.iter_mut() {
        for (value, total) in values.iter_mut().zip(totals.iter_mut()) {
            if let Some(v) = value {
                *total += *v;
                *v = *total;
            }
        }
    }
}

pub(crate) fn layout(config: &Config, data: &DataStore) -> Result<AxisLayout> {
    let fields = config.list("fields")?;
    let raw: Vec<(String, Vec<Option<f64>>)> = data
        .iter()
        .enumerate()
        .map(|(i, set)| (series_title(set, i), field_values(set, &fields)))
        .collect();
    let mut plotted = raw.clone();
    if config.flag("stacked")? {
        stack(&mut plotted);
    }

    let extent = axis::extent(
        plotted
            .iter()
            .flat_map(|(_, values)| values.iter().flatten().copied()),
    );
    let scale = axis::value_scale(config, extent.0, extent.1)?;
    let y_texts = axis::tick_texts(config, &scale, "y_label_formatter")?;
    let key_titles: Vec<String> = raw.iter().map(|(title, _)| title.clone()).collect();

    let frame = AxisFrame::new(
        config,
        Decorations {
            x_labels: &fields,
            y_labels: &y_texts,
            key_titles: &key_titles,
        },
    )?;

    let xs = frame.spread(fields.len());
    let x_labels = frame.x_labels(xs.iter().copied().zip(fields.iter().cloned()));
    let (y_labels, y_guides) = frame.vertical_axis(&scale, y_texts);
    let floor = frame.y_of(&scale, axis::baseline(&scale));
    let show_values = config.flag("show_data_values")?;
    let area_fill = config.flag("area_fill")?;

    let series = plotted
        .into_iter()
        .zip(raw)
        .enumerate()
        .map(|(index, ((title, values), (_, own)))| {
            let mut series = Series::new(index, title);
            for ((value, own), x) in values.iter().zip(&own).zip(&xs) {
                let (Some(value), Some(own)) = (value, own) else {
                    continue;
                };
                let y = frame.y_of(&scale, *value);
                series.points.push(Dot {
                    x: *x,
                    y,
                    value: *own,
                    label: show_values.then(|| axis::value_label(*x, y, fmt_num(*own))),
                });
            }
            let coords: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.y)).collect();
            series.line = line_path(&coords);
            if area_fill {
                series.area = area_path(&coords, floor);
            }
            series
        })
        .collect();

    crate::log::debug!(min = scale.min, max = scale.max, step = scale.step, "line scale");
    Ok(frame.finish(x_labels, y_labels, Vec::new(), y_guides, series, extent))
}
