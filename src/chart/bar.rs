//! Vertical and horizontal bar graphs

use super::axis::{
    self, AXIS_TEMPLATE, AxisFrame, AxisLayout, BarRect, Decorations, Scale, Series,
};
use super::{Chart, KEY_GAP, Label, accept_fields, field_values, series_title};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, StoredSet};
use crate::errors::{GraphError, Result};
use crate::value::{Value, fmt_num};

/// How bars of several data sets share a field's slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarStack {
    /// Side by side
    Side,
    /// Full width, drawn over each other
    Overlap,
    /// Stacked end to end
    Top,
}

impl BarStack {
    pub(crate) fn from_config(config: &Config) -> Result<Self> {
        match config.text("stack")?.as_str() {
            "side" => Ok(BarStack::Side),
            "overlap" => Ok(BarStack::Overlap),
            "top" => Ok(BarStack::Top),
            other => Err(GraphError::invalid(format!(
                "`stack` must be `side`, `overlap` or `top`, got `{other}`"
            ))),
        }
    }
}

/// One bar per field and data set
#[derive(Debug, Clone, Default)]
pub struct Bar;

pub(crate) fn bar_options() -> Options {
    super::merge([
        super::common_options(),
        super::axis_options(),
        crate::options! {
            fields => Vec::<String>::new(),
            bar_gap => true,
            stack => "side",
        },
    ])
}

pub(crate) fn validate_bars(config: &Config) -> Result<()> {
    super::require_fields(config)?;
    BarStack::from_config(config)?;
    axis::validate_axis(config)
}

impl Chart for Bar {
    fn kind(&self) -> &'static str {
        "Bar"
    }

    fn defaults(&self) -> Options {
        bar_options()
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_bars(config)
    }

    fn accept(&self, config: &Config, _data: &DataStore, set: DataSet) -> Result<StoredSet> {
        accept_fields(self.kind(), config, set)
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        super::to_calc(&layout(config, data, Orientation::Vertical)?)
    }

    fn template(&self) -> &'static str {
        AXIS_TEMPLATE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Vertical,
    Horizontal,
}

/// Value ranges `(from, to)` of every bar, per data set and field
fn spans(sets: &[Vec<Option<f64>>], stack: BarStack) -> Vec<Vec<Option<(f64, f64)>>> {
    let width = sets.first().map_or(0, Vec::len);
    let mut above = vec![0.0; width];
    let mut below = vec![0.0; width];
    sets.iter()
        .map(|values| {
            values
                .iter()
                .enumerate()
                .map(|(field, value)| {
                    let v = (*value)?;
                    if stack != BarStack::Top {
                        return Some((0.0, v));
                    }
                    let acc = if v >= 0.0 { &mut above[field] } else { &mut below[field] };
                    let from = *acc;
                    *acc += v;
                    Some((from, *acc))
                })
                .collect()
        })
        .collect()
}

pub(crate) fn layout(config: &Config, data: &DataStore, orientation: Orientation) -> Result<AxisLayout> {
    let fields = config.list("fields")?;
    let stack = BarStack::from_config(config)?;
    let gap = config.flag("bar_gap")?;
    let titles: Vec<String> = data
        .iter()
        .enumerate()
        .map(|(i, set)| series_title(set, i))
        .collect();
    let values: Vec<Vec<Option<f64>>> = data.iter().map(|set| field_values(set, &fields)).collect();
    let spans = spans(&values, stack);

    let extent = axis::extent(
        spans
            .iter()
            .flatten()
            .flatten()
            .flat_map(|(from, to)| [*from, *to]),
    );
    let scale = axis::value_scale(config, extent.0, extent.1)?;
    let vertical = orientation == Orientation::Vertical;
    let formatter_option = if vertical {
        "y_label_formatter"
    } else {
        "x_label_formatter"
    };
    let value_texts = axis::tick_texts(config, &scale, formatter_option)?;

    let frame = AxisFrame::new(
        config,
        if vertical {
            Decorations {
                x_labels: &fields,
                y_labels: &value_texts,
                key_titles: &titles,
            }
        } else {
            Decorations {
                x_labels: &value_texts,
                y_labels: &fields,
                key_titles: &titles,
            }
        },
    )?;

    let (slot, centers) = if vertical {
        frame.slots(fields.len())
    } else {
        frame.rows(fields.len())
    };
    let used = if gap { slot * 0.8 } else { slot };
    let thickness = match stack {
        BarStack::Side => used / values.len().max(1) as f64,
        BarStack::Overlap | BarStack::Top => used,
    };
    let show_values = config.flag("show_data_values")?;

    let series = titles
        .into_iter()
        .zip(spans)
        .enumerate()
        .map(|(index, (title, spans))| {
            let mut series = Series::new(index, title);
            for ((span, center), value) in spans.iter().zip(&centers).zip(&values[index]) {
                let (Some((from, to)), Some(value)) = (span, value) else {
                    continue;
                };
                let lead = match stack {
                    BarStack::Side => center - used / 2.0 + index as f64 * thickness,
                    BarStack::Overlap | BarStack::Top => center - used / 2.0,
                };
                series.bars.push(bar_rect(
                    &frame,
                    &scale,
                    orientation,
                    lead,
                    thickness,
                    (*from, *to),
                    *value,
                    show_values,
                ));
            }
            series
        })
        .collect();

    let category_labels = centers.iter().copied().zip(fields.iter().cloned());
    let layout = if vertical {
        let x_labels = frame.x_labels(category_labels);
        let (y_labels, y_guides) = frame.vertical_axis(&scale, value_texts);
        frame.finish(x_labels, y_labels, Vec::new(), y_guides, series, extent)
    } else {
        let y_labels = frame.y_labels(category_labels);
        let (x_labels, x_guides) = frame.horizontal_axis(&scale, value_texts);
        frame.finish(x_labels, y_labels, x_guides, Vec::new(), series, extent)
    };
    crate::log::debug!(
        bars = layout.series.iter().map(|s| s.bars.len()).sum::<usize>(),
        "bar layout"
    );
    Ok(layout)
}

#[allow(clippy::too_many_arguments)]
fn bar_rect(
    frame: &AxisFrame,
    scale: &Scale,
    orientation: Orientation,
    lead: f64,
    thickness: f64,
    (from, to): (f64, f64),
    value: f64,
    show_values: bool,
) -> BarRect {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let (lo, hi) = (lo.clamp(scale.min, scale.max), hi.clamp(scale.min, scale.max));
    let text = fmt_num(value);
    match orientation {
        Orientation::Vertical => {
            let (top, bottom) = (frame.y_of(scale, hi), frame.y_of(scale, lo));
            BarRect {
                x: lead,
                y: top,
                width: thickness,
                height: bottom - top,
                value,
                label: show_values.then(|| axis::value_label(lead + thickness / 2.0, top, text)),
            }
        }
        Orientation::Horizontal => {
            let (left, right) = (frame.x_of(scale, lo), frame.x_of(scale, hi));
            BarRect {
                x: left,
                y: lead,
                width: right - left,
                height: thickness,
                value,
                label: show_values
                    .then(|| Label::new(right + KEY_GAP, lead + thickness / 2.0 + 4.0, text, "start")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(overrides: Options) -> Config {
        let mut config = Config::seeded("Bar", Bar.defaults());
        config.apply(overrides).unwrap();
        config
    }

    fn store(config: &Config, sets: Vec<Vec<f64>>) -> DataStore {
        let mut data = DataStore::default();
        for values in sets {
            data.push(Bar.accept(config, &data, DataSet::new(values)).unwrap());
        }
        data
    }

    #[test]
    fn unknown_stack_mode_is_invalid() {
        let config = config(crate::options! { fields => vec!["a"], stack => "diagonal" });
        assert!(matches!(
            Bar.validate(&config),
            Err(GraphError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn side_bars_split_the_slot() {
        let config = config(crate::options! { fields => vec!["a", "b"], bar_gap => false });
        let data = store(&config, vec![vec![4.0, 2.0], vec![1.0, 3.0]]);
        let layout = layout(&config, &data, Orientation::Vertical).unwrap();
        let slot = layout.plot.width / 2.0;
        let first = &layout.series[0].bars[0];
        let second = &layout.series[1].bars[0];
        assert!((first.width - slot / 2.0).abs() < 1e-9);
        assert!((second.x - (first.x + first.width)).abs() < 1e-9);
        assert!((first.y + first.height - layout.plot.bottom).abs() < 1e-9);
    }

    #[test]
    fn top_stacking_raises_the_scale() {
        let config = config(crate::options! { fields => vec!["a"], stack => "top" });
        let data = store(&config, vec![vec![4.0], vec![3.0]]);
        let layout = layout(&config, &data, Orientation::Vertical).unwrap();
        assert_eq!(layout.max, 7.0);
        let lower = &layout.series[0].bars[0];
        let upper = &layout.series[1].bars[0];
        assert!((upper.y + upper.height - lower.y).abs() < 1e-9);
        assert_eq!(upper.label.as_ref().unwrap().text, "3");
    }

    #[test]
    fn negative_bars_hang_below_zero() {
        let config = config(crate::options! { fields => vec!["a", "b"] });
        let data = store(&config, vec![vec![5.0, -5.0]]);
        let layout = layout(&config, &data, Orientation::Vertical).unwrap();
        let up = &layout.series[0].bars[0];
        let down = &layout.series[0].bars[1];
        assert!((up.y + up.height - down.y).abs() < 1e-9);
        assert!((up.height - down.height).abs() < 1e-9);
    }
}
