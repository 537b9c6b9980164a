//! Pie charts.
//!
//! Wedges run clockwise from twelve o'clock in declared field order. A
//! wedge's angles come from the running sum of the values before it; its
//! label sits on the half-angle between its start and end. Percentages are
//! rounded to whole numbers for display only; arc flags use the exact share.
//!
//! A pie whose values sum to zero has no meaningful angles. [`wedges`]
//! reports that as [`GraphError::DegenerateData`]; the layout then draws an
//! outline circle with every wedge at zero degrees and 0%.

use glam::DVec2;
use serde::Serialize;

use super::axis::{KeyEntry, palette_class};
use super::{
    CHAR_WIDTH, Chart, KEY_BOX, KEY_GAP, Label, PADDING, SUBTITLE_FONT, accept_fields, field_values,
};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, StoredSet};
use crate::errors::{GraphError, Result};
use crate::value::{Value, fmt_num};

/// Distance a displaced wedge moves out from the center, in px
pub const EXPAND_OFFSET: f64 = 10.0;

const TEMPLATE: &str = concat!(
    include_str!("../../templates/header.svg"),
    include_str!("../../templates/pie.svg"),
    include_str!("../../templates/footer.svg"),
);

#[derive(Debug, Clone, Default)]
pub struct Pie;

impl Chart for Pie {
    fn kind(&self) -> &'static str {
        "Pie"
    }

    fn defaults(&self) -> Options {
        super::merge([
            super::common_options(),
            crate::options! {
                fields => Vec::<String>::new(),
                show_shadow => true,
                shadow_size => 5,
                shadow_offset => 10,
                expanded => false,
                expand_greatest => false,
                key => false,
                key_placement => "R",
                show_data_labels => false,
                show_actual_values => false,
                show_percent => true,
                show_key_data_labels => true,
                show_key_actual_values => true,
                show_key_percent => false,
            },
        ])
    }

    fn validate(&self, config: &Config) -> Result<()> {
        super::require_fields(config)?;
        super::canvas(config)?;
        KeyPlacement::from_config(config)?;
        if config.number("shadow_size")? < 0.0 {
            return Err(GraphError::invalid("`shadow_size` must not be negative"));
        }
        config.number("shadow_offset")?;
        Ok(())
    }

    fn accept(&self, config: &Config, data: &DataStore, set: DataSet) -> Result<StoredSet> {
        if !data.is_empty() {
            return Err(GraphError::TooManyDataSets { chart: self.kind() });
        }
        let stored = accept_fields(self.kind(), config, set)?;
        if let Some(values) = stored.fields() {
            if let Some((index, _)) = values
                .values()
                .enumerate()
                .find(|(_, v)| v.is_some_and(|v| v < 0.0 || !v.is_finite()))
            {
                return Err(GraphError::row(index, "pie values must be finite and not negative"));
            }
        }
        Ok(stored)
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        super::to_calc(&layout(config, data)?)
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }
}

// ============================================================================
// Wedge geometry
// ============================================================================

/// Which wedges are pulled out of the pie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Off,
    /// Every wedge
    All,
    /// The first wedge holding the largest value
    Greatest,
}

impl Expansion {
    /// `expanded` takes precedence over `expand_greatest`
    pub(crate) fn from_config(config: &Config) -> Result<Self> {
        Ok(if config.flag("expanded")? {
            Expansion::All
        } else if config.flag("expand_greatest")? {
            Expansion::Greatest
        } else {
            Expansion::Off
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wedge {
    pub index: usize,
    pub class: usize,
    pub field: String,
    pub value: Option<f64>,
    /// Rounded percentage of the total
    pub percent: f64,
    /// Exact fraction of the total
    pub share: f64,
    /// Angles in radians, clockwise from twelve o'clock
    pub start_angle: f64,
    pub end_angle: f64,
    pub mid_angle: f64,
    /// Wedge tip and arc endpoints, displacement included
    pub apex_x: f64,
    pub apex_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub large_arc: bool,
    /// The wedge is the whole pie
    pub full: bool,
    pub displaced: bool,
    pub dx: f64,
    pub dy: f64,
    /// Label alignment for the quadrant the half-angle points into
    pub anchor: &'static str,
    pub baseline: &'static str,
    pub label: String,
}

/// Unit vector at `angle` radians clockwise from twelve o'clock, y down
fn direction(angle: f64) -> DVec2 {
    DVec2::new(angle.sin(), -angle.cos())
}

fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Rounded percentage of `value` in `total`
pub fn percent(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        (100.0 * value / total).round()
    } else {
        0.0
    }
}

/// Sum of the present values
pub fn total(values: &[(String, Option<f64>)]) -> f64 {
    values.iter().filter_map(|(_, v)| *v).sum()
}

/// Compute wedge geometry for `values` in order.
///
/// Fails with [`GraphError::DegenerateData`] when the values sum to zero.
pub fn wedges(
    values: &[(String, Option<f64>)],
    center: DVec2,
    radius: f64,
    expansion: Expansion,
) -> Result<Vec<Wedge>> {
    let total = total(values);
    if !(total > 0.0 && total.is_finite()) {
        return Err(GraphError::DegenerateData);
    }

    let max_value = values
        .iter()
        .filter_map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let greatest = values.iter().position(|(_, v)| *v == Some(max_value));

    let mut cumulative = 0.0;
    let mut wedges = Vec::with_capacity(values.len());
    for (index, (field, value)) in values.iter().enumerate() {
        let v = value.unwrap_or(0.0);
        let start_angle = degrees_to_radians(cumulative / total * 360.0);
        let mid_angle = degrees_to_radians((cumulative + v / 2.0) / total * 360.0);
        cumulative += v;
        let end_angle = degrees_to_radians(cumulative / total * 360.0);
        let share = v / total;

        let displaced = match expansion {
            Expansion::Off => false,
            Expansion::All => true,
            Expansion::Greatest => greatest == Some(index),
        };
        let mid = direction(mid_angle);
        let offset = if displaced { mid * EXPAND_OFFSET } else { DVec2::ZERO };
        let apex = center + offset;
        let start = apex + direction(start_angle) * radius;
        let end = apex + direction(end_angle) * radius;

        wedges.push(Wedge {
            index,
            class: palette_class(index),
            field: field.clone(),
            value: *value,
            percent: percent(v, total),
            share,
            start_angle,
            end_angle,
            mid_angle,
            apex_x: apex.x,
            apex_y: apex.y,
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            large_arc: share >= 0.5,
            full: v == total,
            displaced,
            dx: offset.x,
            dy: offset.y,
            anchor: if mid.x >= 0.0 { "start" } else { "end" },
            baseline: if mid.y >= 0.0 { "hanging" } else { "auto" },
            label: String::new(),
        });
    }
    Ok(wedges)
}

/// Every wedge at zero degrees, for a pie with nothing to divide
fn zero_wedges(values: &[(String, Option<f64>)], center: DVec2, radius: f64) -> Vec<Wedge> {
    let top = center + direction(0.0) * radius;
    values
        .iter()
        .enumerate()
        .map(|(index, (field, value))| Wedge {
            index,
            class: palette_class(index),
            field: field.clone(),
            value: *value,
            percent: 0.0,
            share: 0.0,
            start_angle: 0.0,
            end_angle: 0.0,
            mid_angle: 0.0,
            apex_x: center.x,
            apex_y: center.y,
            start_x: top.x,
            start_y: top.y,
            end_x: top.x,
            end_y: top.y,
            large_arc: false,
            full: false,
            displaced: false,
            dx: 0.0,
            dy: 0.0,
            anchor: "start",
            baseline: "auto",
            label: String::new(),
        })
        .collect()
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPlacement {
    Right,
    Left,
    Top,
    Bottom,
}

impl KeyPlacement {
    pub(crate) fn from_config(config: &Config) -> Result<Self> {
        match config.text("key_placement")?.to_ascii_uppercase().as_str() {
            "R" => Ok(KeyPlacement::Right),
            "L" => Ok(KeyPlacement::Left),
            "T" => Ok(KeyPlacement::Top),
            "B" => Ok(KeyPlacement::Bottom),
            other => Err(GraphError::invalid(format!(
                "`key_placement` must be one of R, L, T or B, got `{other}`"
            ))),
        }
    }
}

/// Soft halo drawn under the pie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    /// Gradient stop where the halo starts to fade, in percent of `r`
    pub inner: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieLayout {
    pub width: f64,
    pub height: f64,
    pub title: Option<Label>,
    pub subtitle: Option<Label>,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    /// Distance of wedge labels from the (displaced) center
    pub label_radius: f64,
    pub total: f64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Values sum to zero; wedges are all empty
    pub degenerate: bool,
    pub wedges: Vec<Wedge>,
    pub shadow: Option<Shadow>,
    pub key: Vec<KeyEntry>,
}

/// `name value (pct%)`, each part only when its flag is set
fn compose(parts: [(bool, String); 3]) -> String {
    parts
        .into_iter()
        .filter(|(show, text)| *show && !text.is_empty())
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn layout(config: &Config, data: &DataStore) -> Result<PieLayout> {
    let (width, height) = super::canvas(config)?;
    let titles = super::titles(config, width)?;
    let fields = config.list("fields")?;
    let values: Vec<(String, Option<f64>)> = match data.first() {
        Some(set) => fields.iter().cloned().zip(field_values(set, &fields)).collect(),
        None => fields.iter().map(|f| (f.clone(), None)).collect(),
    };
    let total = total(&values);
    let present = || values.iter().filter_map(|(_, v)| *v);
    let min_value = present().reduce(f64::min);
    let max_value = present().reduce(f64::max);

    let texts = |value: &Option<f64>, field: &str, flags: [bool; 3]| {
        let amount = value.map(fmt_num).unwrap_or_default();
        let share = format!("{}%", fmt_num(percent(value.unwrap_or(0.0), total)));
        let share = if flags[0] || flags[1] { format!("({share})") } else { share };
        compose([(flags[0], field.to_string()), (flags[1], amount), (flags[2], share)])
    };

    // Key
    let placement = KeyPlacement::from_config(config)?;
    let key_flags = [
        config.flag("show_key_data_labels")?,
        config.flag("show_key_actual_values")?,
        config.flag("show_key_percent")?,
    ];
    let key_texts: Vec<String> = if config.flag("key")? {
        values
            .iter()
            .map(|(field, value)| texts(value, field.as_str(), key_flags))
            .collect()
    } else {
        Vec::new()
    };
    let key_width =
        KEY_BOX + KEY_GAP + CHAR_WIDTH * super::longest(key_texts.iter().map(String::as_str)) as f64;
    let key_height = key_texts.len() as f64 * (KEY_BOX + KEY_GAP);

    let (mut left, mut right) = (PADDING, width - PADDING);
    let (mut top, mut bottom) = (PADDING + titles.height, height - PADDING);
    let mut key = Vec::new();
    if !key_texts.is_empty() {
        let mut x = match placement {
            KeyPlacement::Right => width - PADDING - key_width,
            _ => PADDING,
        };
        let row_y = match placement {
            KeyPlacement::Top => top,
            _ => height - PADDING - KEY_BOX,
        };
        let column_top = top + ((bottom - top - key_height) / 2.0).max(0.0);
        for (index, text) in key_texts.iter().enumerate() {
            let y = match placement {
                KeyPlacement::Right | KeyPlacement::Left => {
                    column_top + index as f64 * (KEY_BOX + KEY_GAP)
                }
                KeyPlacement::Top | KeyPlacement::Bottom => row_y,
            };
            key.push(KeyEntry {
                class: palette_class(index),
                text: text.clone(),
                x,
                y,
                size: KEY_BOX,
                text_x: x + KEY_BOX + KEY_GAP,
                text_y: y + KEY_BOX - 2.0,
            });
            if matches!(placement, KeyPlacement::Top | KeyPlacement::Bottom) {
                x += KEY_BOX + KEY_GAP + CHAR_WIDTH * text.chars().count() as f64 + PADDING;
            }
        }
        match placement {
            KeyPlacement::Right => right -= key_width + PADDING,
            KeyPlacement::Left => left += key_width + PADDING,
            KeyPlacement::Top => top += KEY_BOX + PADDING,
            KeyPlacement::Bottom => bottom -= KEY_BOX + PADDING,
        }
    }

    // Wedge labels
    let label_flags = [
        config.flag("show_data_labels")?,
        config.flag("show_actual_values")?,
        config.flag("show_percent")?,
    ];
    let labels: Vec<String> = values
        .iter()
        .map(|(field, value)| texts(value, field.as_str(), label_flags))
        .collect();
    let label_room = super::longest(labels.iter().map(String::as_str)) as f64 * CHAR_WIDTH;
    let (label_w, label_h) = if label_room > 0.0 {
        (label_room + KEY_GAP, SUBTITLE_FONT + KEY_GAP)
    } else {
        (0.0, 0.0)
    };

    let expansion = Expansion::from_config(config)?;
    let mut radius = ((right - left) / 2.0 - label_w).min((bottom - top) / 2.0 - label_h);
    if expansion != Expansion::Off {
        radius -= EXPAND_OFFSET;
    }
    let radius = radius.max(1.0);
    let center = DVec2::new((left + right) / 2.0, (top + bottom) / 2.0);

    let (mut wedges, degenerate) = match wedges(&values, center, radius, expansion) {
        Ok(wedges) => (wedges, false),
        Err(GraphError::DegenerateData) => {
            crate::log::warn!(fields = values.len(), "pie values sum to zero, drawing empty pie");
            (zero_wedges(&values, center, radius), true)
        }
        Err(e) => return Err(e),
    };
    for (wedge, label) in wedges.iter_mut().zip(labels) {
        wedge.label = label;
    }

    let shadow = if config.flag("show_shadow")? && !wedges.iter().any(|w| w.displaced) {
        let offset = config.number("shadow_offset")?;
        let r = radius * (1.0 + config.number("shadow_size")? / 100.0);
        Some(Shadow {
            cx: center.x + offset,
            cy: center.y + offset,
            r,
            inner: 100.0 * radius / r,
        })
    } else {
        None
    };

    crate::log::debug!(total, radius, degenerate, wedges = wedges.len(), "pie layout");
    Ok(PieLayout {
        width,
        height,
        title: titles.title,
        subtitle: titles.subtitle,
        cx: center.x,
        cy: center.y,
        radius,
        label_radius: radius + KEY_GAP,
        total,
        min_value,
        max_value,
        degenerate,
        wedges,
        shadow,
        key,
    })
}
