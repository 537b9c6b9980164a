//! Bars for the first data set with lines for the rest

use super::axis::{
    self, AXIS_TEMPLATE, AxisFrame, AxisLayout, BarRect, Decorations, Dot, Series, line_path,
};
use super::{Chart, accept_fields, field_values, series_title};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, StoredSet};
use crate::errors::Result;
use crate::value::{Value, fmt_num};

#[derive(Debug, Clone, Default)]
pub struct BarLine;

impl Chart for BarLine {
    fn kind(&self) -> &'static str {
        "BarLine"
    }

    fn defaults(&self) -> Options {
        super::merge([
            super::common_options(),
            super::axis_options(),
            crate::options! {
                fields => Vec::<String>::new(),
                bar_gap => true,
                show_data_points => true,
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

fn layout(config: &Config, data: &DataStore) -> Result<AxisLayout> {
    let fields = config.list("fields")?;
    let sets: Vec<(String, Vec<Option<f64>>)> = data
        .iter()
        .enumerate()
        .map(|(i, set)| (series_title(set, i), field_values(set, &fields)))
        .collect();

    let extent = axis::extent(
        sets.iter()
            .flat_map(|(_, values)| values.iter().flatten().copied()),
    );
    let scale = axis::value_scale(config, extent.0, extent.1)?;
    let y_texts = axis::tick_texts(config, &scale, "y_label_formatter")?;
    let key_titles: Vec<String> = sets.iter().map(|(title, _)| title.clone()).collect();
    let frame = AxisFrame::new(
        config,
        Decorations {
            x_labels: &fields,
            y_labels: &y_texts,
            key_titles: &key_titles,
        },
    )?;

    let (slot, centers) = frame.slots(fields.len());
    let used = if config.flag("bar_gap")? { slot * 0.8 } else { slot };
    let floor = frame.y_of(&scale, axis::baseline(&scale));
    let show_values = config.flag("show_data_values")?;

    let series = sets
        .into_iter()
        .enumerate()
        .map(|(index, (title, values))| {
            let mut series = Series::new(index, title);
            for (value, center) in values.iter().zip(&centers) {
                let Some(value) = *value else { continue };
                let y = frame.y_of(&scale, value);
                let label = show_values.then(|| axis::value_label(*center, y.min(floor), fmt_num(value)));
                if index == 0 {
                    series.bars.push(BarRect {
                        x: center - used / 2.0,
                        y: y.min(floor),
                        width: used,
                        height: (floor - y).abs(),
                        value,
                        label,
                    });
                } else {
                    series.points.push(Dot {
                        x: *center,
                        y,
                        value,
                        label,
                    });
                }
            }
            let coords: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.y)).collect();
            series.line = line_path(&coords);
            series
        })
        .collect();

    let x_labels = frame.x_labels(centers.iter().copied().zip(fields.iter().cloned()));
    let (y_labels, y_guides) = frame.vertical_axis(&scale, y_texts);
    Ok(frame.finish(x_labels, y_labels, Vec::new(), y_guides, series, extent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_set_is_bars_rest_are_lines() {
        let mut config = Config::seeded("BarLine", BarLine.defaults());
        config
            .apply(crate::options! { fields => vec!["q1", "q2", "q3"] })
            .unwrap();
        let mut data = DataStore::default();
        for values in [vec![3.0, 5.0, 4.0], vec![2.0, 6.0, 1.0]] {
            data.push(BarLine.accept(&config, &data, DataSet::new(values)).unwrap());
        }
        let layout = layout(&config, &data).unwrap();
        assert_eq!(layout.series[0].bars.len(), 3);
        assert!(layout.series[0].points.is_empty());
        assert!(layout.series[0].line.is_none());
        assert_eq!(layout.series[1].points.len(), 3);
        assert!(layout.series[1].bars.is_empty());
        assert!(layout.series[1].line.is_some());
        let bar = &layout.series[0].bars[1];
        let point = &layout.series[1].points[1];
        assert!((bar.x + bar.width / 2.0 - point.x).abs() < 1e-9);
    }
}
