//! Shared layout for the variants drawn on x/y axes.
//!
//! A variant collects its labels and key titles, asks [`AxisFrame`] for the
//! plot rectangle left over after titles, labels and the key, and then fills
//! an [`AxisLayout`] with per-series geometry in plot coordinates. All axis
//! variants render through the same template body.

use serde::Serialize;

use super::{CHAR_WIDTH, KEY_BOX, KEY_GAP, Label, PADDING, SUBTITLE_FONT, TITLE_FONT, Titles};
use crate::config::Config;
use crate::errors::{GraphError, Result};
use crate::value::{Function, Value, fmt_num};

/// Number of series colors in the stylesheet palette
pub const PALETTE_SIZE: usize = 12;

/// Template shared by every axis variant
pub(crate) const AXIS_TEMPLATE: &str = concat!(
    include_str!("../../templates/header.svg"),
    include_str!("../../templates/axis.svg"),
    include_str!("../../templates/footer.svg"),
);

const TARGET_TICKS: f64 = 10.0;
const MAX_TICKS: usize = 100;

// ============================================================================
// Scales
// ============================================================================

/// A linear value range split into equal steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Scale {
    /// Cover `min..=max` starting at `floor` (or `min(0, min)`), stepping by
    /// `divisions` when given and by a 1/2/5 multiple of a power of ten
    /// otherwise.
    pub fn nice(min: f64, max: f64, floor: Option<f64>, divisions: Option<f64>) -> Scale {
        let lo = floor.unwrap_or_else(|| min.min(0.0));
        let mut hi = max.max(lo);
        if hi == lo {
            hi = lo + 1.0;
        }

        let auto = nice_step((hi - lo) / TARGET_TICKS);
        let mut step = match divisions {
            Some(d) if d > 0.0 && d.is_finite() => d,
            _ => auto,
        };
        if (hi - lo) / step > MAX_TICKS as f64 {
            crate::log::warn!(step, "scale divisions too fine, using automatic step");
            step = auto;
        }

        let lo = match floor {
            Some(lo) => lo,
            None => (lo / step + 1e-9).floor() * step,
        };
        let steps = ((hi - lo) / step - 1e-9).ceil().max(1.0);
        Scale {
            min: lo,
            max: lo + steps * step,
            step,
        }
    }

    /// `intervals` equal steps from `min` to `max`, without rounding
    pub fn even(min: f64, max: f64, intervals: usize) -> Scale {
        let max = if max > min { max } else { min + 1.0 };
        let intervals = intervals.max(1);
        Scale {
            min,
            max,
            step: (max - min) / intervals as f64,
        }
    }

    pub fn ticks(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count.min(MAX_TICKS))
            .map(|i| self.min + i as f64 * self.step)
            .collect()
    }

    /// Offset of `value` along an axis `length` px long
    pub fn offset(&self, value: f64, length: f64) -> f64 {
        (value - self.min) / (self.max - self.min) * length
    }
}

/// Smallest 1, 2 or 5 times a power of ten that is at least `raw`
fn nice_step(raw: f64) -> f64 {
    if !(raw > 0.0 && raw.is_finite()) {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Smallest and largest present value, or `(0, 0)` when there are none
pub(crate) fn extent(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 0.0))
}

/// Scale for the value axis from the `min_scale_value`/`scale_divisions` options
pub(crate) fn value_scale(config: &Config, min: f64, max: f64) -> Result<Scale> {
    Ok(Scale::nice(
        min,
        max,
        config.opt_number("min_scale_value")?,
        config.opt_number("scale_divisions")?,
    ))
}

/// Tick labels of a scale, formatted through the formatter option `option`
pub(crate) fn tick_texts(config: &Config, scale: &Scale, option: &str) -> Result<Vec<String>> {
    let formatter = config.formatter(option)?;
    scale
        .ticks()
        .into_iter()
        .map(|tick| format_value(formatter, option, tick))
        .collect()
}

/// The value zero, clamped into the scale
pub(crate) fn baseline(scale: &Scale) -> f64 {
    0f64.clamp(scale.min, scale.max)
}

/// Format a number through an optional label formatter
pub(crate) fn format_value(formatter: Option<&Function>, option: &str, value: f64) -> Result<String> {
    match formatter {
        None => Ok(fmt_num(value)),
        Some(f) => f
            .call(&[Value::Number(value)])
            .map(|v| v.to_string())
            .map_err(|e| GraphError::invalid(format!("`{option}` failed on {value}: {e}"))),
    }
}

// ============================================================================
// Layout records
// ============================================================================

/// The plot rectangle, in canvas px
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Frame {
    fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            right: left + width,
            bottom: top + height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyEntry {
    pub class: usize,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub text_x: f64,
    pub text_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: f64,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub label: Option<Label>,
}

/// Geometry of one data set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub index: usize,
    /// Palette slot, 1-based
    pub class: usize,
    pub title: String,
    pub bars: Vec<BarRect>,
    pub points: Vec<Dot>,
    /// SVG path data of the connecting line
    pub line: Option<String>,
    /// SVG path data of the filled area under the line
    pub area: Option<String>,
}

impl Series {
    pub(crate) fn new(index: usize, title: String) -> Self {
        Self {
            index,
            class: palette_class(index),
            title,
            ..Self::default()
        }
    }
}

pub(crate) fn palette_class(index: usize) -> usize {
    index % PALETTE_SIZE + 1
}

/// Everything the axis template draws
#[derive(Debug, Clone, Serialize)]
pub struct AxisLayout {
    pub width: f64,
    pub height: f64,
    pub title: Option<Label>,
    pub subtitle: Option<Label>,
    pub plot: Frame,
    pub x_labels: Vec<Label>,
    pub y_labels: Vec<Label>,
    /// x positions of vertical guide lines
    pub x_guides: Vec<f64>,
    /// y positions of horizontal guide lines
    pub y_guides: Vec<f64>,
    pub x_title: Option<Label>,
    pub y_title: Option<Label>,
    pub series: Vec<Series>,
    pub key: Vec<KeyEntry>,
    /// Extents of the plotted values
    pub min: f64,
    pub max: f64,
}

// ============================================================================
// Frame computation
// ============================================================================

/// Plot frame plus the surrounding decorations of an axis graph
pub(crate) struct AxisFrame {
    pub width: f64,
    pub height: f64,
    pub plot: Frame,
    titles: Titles,
    key: Vec<KeyEntry>,
    x_title: Option<Label>,
    y_title: Option<Label>,
    show_x_labels: bool,
    show_y_labels: bool,
    rotate_x_labels: bool,
    stagger_x_labels: bool,
}

/// Label and key text that the plot frame must leave room for
pub(crate) struct Decorations<'a> {
    pub x_labels: &'a [String],
    pub y_labels: &'a [String],
    pub key_titles: &'a [String],
}

impl AxisFrame {
    pub(crate) fn new(config: &Config, decorations: Decorations<'_>) -> Result<Self> {
        let (width, height) = super::canvas(config)?;
        let titles = super::titles(config, width)?;
        let show_x_labels = config.flag("show_x_labels")?;
        let show_y_labels = config.flag("show_y_labels")?;
        let rotate_x_labels = config.flag("rotate_x_labels")?;
        let stagger_x_labels = config.flag("stagger_x_labels")?;
        let show_x_title = config.flag("show_x_title")?;
        let show_y_title = config.flag("show_y_title")?;
        let key = config.flag("key")? && !decorations.key_titles.is_empty();
        let key_bottom = key_position(config)? == KeyPosition::Bottom;

        let key_width =
            KEY_BOX + KEY_GAP + CHAR_WIDTH * super::longest(decorations.key_titles.iter().map(String::as_str)) as f64;

        let mut left = PADDING;
        if show_y_labels {
            left += CHAR_WIDTH * super::longest(decorations.y_labels.iter().map(String::as_str)) as f64 + KEY_GAP;
        }
        if show_y_title {
            left += TITLE_FONT + KEY_GAP;
        }

        let mut right = PADDING;
        if key && !key_bottom {
            right += key_width + PADDING;
        }

        let top = PADDING + titles.height;

        let mut bottom = PADDING;
        if show_x_labels {
            bottom += KEY_GAP
                + if rotate_x_labels {
                    CHAR_WIDTH * super::longest(decorations.x_labels.iter().map(String::as_str)) as f64
                } else {
                    SUBTITLE_FONT
                };
            if stagger_x_labels && !rotate_x_labels {
                bottom += SUBTITLE_FONT;
            }
        }
        if show_x_title {
            bottom += TITLE_FONT + KEY_GAP;
        }
        if key && key_bottom {
            bottom += KEY_BOX + PADDING;
        }

        let plot = Frame::new(
            left,
            top,
            (width - left - right).max(1.0),
            (height - top - bottom).max(1.0),
        );

        let mut entries = Vec::new();
        if key {
            let mut x = if key_bottom { plot.left } else { width - PADDING - key_width };
            for (index, text) in decorations.key_titles.iter().enumerate() {
                let y = if key_bottom {
                    height - PADDING - KEY_BOX
                } else {
                    plot.top + index as f64 * (KEY_BOX + KEY_GAP)
                };
                entries.push(KeyEntry {
                    class: palette_class(index),
                    text: text.clone(),
                    x,
                    y,
                    size: KEY_BOX,
                    text_x: x + KEY_BOX + KEY_GAP,
                    text_y: y + KEY_BOX - 2.0,
                });
                if key_bottom {
                    x += KEY_BOX + KEY_GAP + CHAR_WIDTH * text.chars().count() as f64 + PADDING;
                }
            }
        }

        let x_title = if show_x_title {
            let reserve = if key && key_bottom { KEY_BOX + PADDING } else { 0.0 };
            Some(Label::new(
                plot.left + plot.width / 2.0,
                height - PADDING - reserve,
                config.text("x_title")?,
                "middle",
            ))
        } else {
            None
        };
        let y_title = if show_y_title {
            Some(
                Label::new(
                    PADDING + TITLE_FONT,
                    plot.top + plot.height / 2.0,
                    config.text("y_title")?,
                    "middle",
                )
                .rotated(-90.0),
            )
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            plot,
            titles,
            key: entries,
            x_title,
            y_title,
            show_x_labels,
            show_y_labels,
            rotate_x_labels,
            stagger_x_labels,
        })
    }

    /// Labels under the plot at the given x positions
    pub(crate) fn x_labels(&self, labels: impl IntoIterator<Item = (f64, String)>) -> Vec<Label> {
        if !self.show_x_labels {
            return Vec::new();
        }
        labels
            .into_iter()
            .enumerate()
            .map(|(i, (x, text))| {
                if self.rotate_x_labels {
                    Label::new(x, self.plot.bottom + KEY_GAP, text, "start").rotated(90.0)
                } else {
                    let stagger = if self.stagger_x_labels && i % 2 == 1 {
                        SUBTITLE_FONT
                    } else {
                        0.0
                    };
                    Label::new(x, self.plot.bottom + SUBTITLE_FONT + stagger, text, "middle")
                }
            })
            .collect()
    }

    /// Labels left of the plot at the given y positions
    pub(crate) fn y_labels(&self, labels: impl IntoIterator<Item = (f64, String)>) -> Vec<Label> {
        if !self.show_y_labels {
            return Vec::new();
        }
        labels
            .into_iter()
            .map(|(y, text)| Label::new(self.plot.left - KEY_GAP, y + 4.0, text, "end"))
            .collect()
    }

    /// Canvas y of a value on a vertical scale
    pub(crate) fn y_of(&self, scale: &Scale, value: f64) -> f64 {
        self.plot.bottom - scale.offset(value, self.plot.height)
    }

    /// Canvas x of a value on a horizontal scale
    pub(crate) fn x_of(&self, scale: &Scale, value: f64) -> f64 {
        self.plot.left + scale.offset(value, self.plot.width)
    }

    /// Labels and horizontal guides for a vertical value scale
    pub(crate) fn vertical_axis(&self, scale: &Scale, texts: Vec<String>) -> (Vec<Label>, Vec<f64>) {
        let guides: Vec<f64> = scale.ticks().iter().map(|t| self.y_of(scale, *t)).collect();
        let labels = self.y_labels(guides.iter().copied().zip(texts));
        (labels, guides)
    }

    /// Labels and vertical guides for a horizontal value scale
    pub(crate) fn horizontal_axis(&self, scale: &Scale, texts: Vec<String>) -> (Vec<Label>, Vec<f64>) {
        let guides: Vec<f64> = scale.ticks().iter().map(|t| self.x_of(scale, *t)).collect();
        let labels = self.x_labels(guides.iter().copied().zip(texts));
        (labels, guides)
    }

    /// Centers of `count` equal slots across the plot width
    pub(crate) fn slots(&self, count: usize) -> (f64, Vec<f64>) {
        let width = self.plot.width / count.max(1) as f64;
        let centers = (0..count)
            .map(|i| self.plot.left + width * (i as f64 + 0.5))
            .collect();
        (width, centers)
    }

    /// Centers of `count` equal slots down the plot height
    pub(crate) fn rows(&self, count: usize) -> (f64, Vec<f64>) {
        let height = self.plot.height / count.max(1) as f64;
        let centers = (0..count)
            .map(|i| self.plot.top + height * (i as f64 + 0.5))
            .collect();
        (height, centers)
    }

    /// Evenly spread points from the left to the right edge of the plot
    pub(crate) fn spread(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.plot.left + self.plot.width / 2.0],
            n => (0..n)
                .map(|i| self.plot.left + self.plot.width * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }

    pub(crate) fn finish(
        self,
        x_labels: Vec<Label>,
        y_labels: Vec<Label>,
        x_guides: Vec<f64>,
        y_guides: Vec<f64>,
        series: Vec<Series>,
        (min, max): (f64, f64),
    ) -> AxisLayout {
        AxisLayout {
            width: self.width,
            height: self.height,
            title: self.titles.title,
            subtitle: self.titles.subtitle,
            plot: self.plot,
            x_labels,
            y_labels,
            x_guides,
            y_guides,
            x_title: self.x_title,
            y_title: self.y_title,
            series,
            key: self.key,
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyPosition {
    Right,
    Bottom,
}

pub(crate) fn key_position(config: &Config) -> Result<KeyPosition> {
    match config.text("key_position")?.as_str() {
        "right" => Ok(KeyPosition::Right),
        "bottom" => Ok(KeyPosition::Bottom),
        other => Err(GraphError::invalid(format!(
            "`key_position` must be `right` or `bottom`, got `{other}`"
        ))),
    }
}

/// Construction checks shared by the axis variants
pub(crate) fn validate_axis(config: &Config) -> Result<()> {
    super::canvas(config)?;
    key_position(config)?;
    config.opt_number("min_scale_value")?;
    if let Some(d) = config.opt_number("scale_divisions")? {
        if d <= 0.0 {
            return Err(GraphError::invalid("`scale_divisions` must be positive"));
        }
    }
    config.formatter("y_label_formatter")?;
    Ok(())
}

// ============================================================================
// Paths
// ============================================================================

/// `M x y L x y ...` through the points, or `None` for fewer than two
pub(crate) fn line_path(points: &[(f64, f64)]) -> Option<String> {
    if points.len() < 2 {
        return None;
    }
    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&format!("{} {}", fmt_num(*x), fmt_num(*y)));
    }
    Some(d)
}

/// The line path closed down to `baseline`
pub(crate) fn area_path(points: &[(f64, f64)], baseline: f64) -> Option<String> {
    let line = line_path(points)?;
    let (first, last) = (points.first()?, points.last()?);
    Some(format!(
        "M{} {} {} L{} {} Z",
        fmt_num(first.0),
        fmt_num(baseline),
        line.replacen('M', "L", 1),
        fmt_num(last.0),
        fmt_num(baseline),
    ))
}

/// Value label above a point
pub(crate) fn value_label(x: f64, y: f64, text: String) -> Label {
    Label::new(x, y - KEY_GAP, text, "middle")
}
