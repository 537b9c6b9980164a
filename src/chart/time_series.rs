//! XY plots with dates along the x axis

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::axis::{self, AXIS_TEMPLATE, Scale};
use super::xy::{self, xy_options};
use super::Chart;
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, Point, SetBody, StoredSet, Values};
use crate::errors::{GraphError, Result};
use crate::value::Value;

/// Tick intervals when `scale_x_divisions` is unset
const DEFAULT_INTERVALS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct TimeSeries;

impl Chart for TimeSeries {
    fn kind(&self) -> &'static str {
        "TimeSeries"
    }

    fn defaults(&self) -> Options {
        super::merge([
            xy_options(),
            crate::options! {
                x_title => "Time",
                x_label_format => "%Y-%m-%d",
            },
        ])
    }

    fn validate(&self, config: &Config) -> Result<()> {
        axis::validate_axis(config)?;
        let format = config.text("x_label_format")?;
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(GraphError::invalid(format!(
                "`x_label_format` is not a valid date format: {format}"
            )));
        }
        time_option(config, "min_x_value")?;
        divisions(config)?;
        Ok(())
    }

    fn accept(&self, _config: &Config, _data: &DataStore, set: DataSet) -> Result<StoredSet> {
        let points = match set.values {
            Values::Table(rows) => rows
                .iter()
                .enumerate()
                .map(|(i, row)| match row.as_slice() {
                    [x, y] => sample(x, y, i),
                    _ => Err(GraphError::row(i, "expected a [time, value] pair")),
                })
                .collect::<Result<Vec<_>>>()?,
            Values::Records(records) => records
                .iter()
                .enumerate()
                .map(|(i, record)| {
                    let x = record.get("x").ok_or_else(|| GraphError::row(i, "missing `x`"))?;
                    let y = record.get("y").ok_or_else(|| GraphError::row(i, "missing `y`"))?;
                    sample(x, y, i)
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(GraphError::UnsupportedData {
                    chart: self.kind(),
                    shape: other.shape(),
                });
            }
        };
        Ok(StoredSet {
            title: set.title,
            body: SetBody::Points(points),
        })
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        let format = config.text("x_label_format")?;
        let start = time_option(config, "min_x_value")?;
        let step = divisions(config)?;
        let layout = xy::plot(
            config,
            data,
            |lo, hi| {
                let lo = start.unwrap_or(lo);
                Ok(match step {
                    Some(step) => Scale::nice(lo, hi, Some(lo), Some(step)),
                    None => Scale::even(lo, hi, DEFAULT_INTERVALS),
                })
            },
            |seconds| format_time(seconds, &format),
        )?;
        super::to_calc(&layout)
    }

    fn template(&self) -> &'static str {
        AXIS_TEMPLATE
    }
}

fn sample(x: &Value, y: &Value, index: usize) -> Result<Point> {
    let x = match x {
        Value::Text(text) => parse_time(text)
            .ok_or_else(|| GraphError::row(index, format!("unparseable date `{text}`")))?,
        other => other
            .as_number()
            .ok_or_else(|| GraphError::row(index, format!("`x` is not a date: {other}")))?,
    };
    let y = y
        .as_number()
        .ok_or_else(|| GraphError::row(index, format!("`y` is not a number: {y}")))?;
    Ok(Point { x, y })
}

/// Seconds since the epoch of `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, as UTC
pub(crate) fn parse_time(text: &str) -> Option<f64> {
    let text = text.trim();
    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(datetime.and_utc().timestamp() as f64)
}

fn format_time(seconds: f64, format: &str) -> Result<String> {
    let datetime = DateTime::from_timestamp(seconds.round() as i64, 0)
        .ok_or_else(|| GraphError::invalid(format!("time {seconds} is out of range")))?;
    let mut text = String::new();
    write!(text, "{}", datetime.format(format))
        .map_err(|_| GraphError::invalid(format!("cannot format time with `{format}`")))?;
    Ok(text)
}

/// `min_x_value` as a date or a timestamp
fn time_option(config: &Config, name: &str) -> Result<Option<f64>> {
    match config.get(name)? {
        Value::Text(text) if !text.trim().is_empty() => parse_time(text)
            .map(Some)
            .ok_or_else(|| GraphError::invalid(format!("`{name}` is not a date: {text}"))),
        _ => config.opt_number(name),
    }
}

/// Tick spacing in seconds: a number, or text such as `"2 days"`
fn divisions(config: &Config) -> Result<Option<f64>> {
    let text = match config.get("scale_x_divisions")? {
        Value::Text(text) if !text.trim().is_empty() => text.clone(),
        _ => return config.opt_number("scale_x_divisions"),
    };
    let mut parts = text.split_whitespace();
    let (Some(count), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return config.opt_number("scale_x_divisions");
    };
    let count: f64 = count
        .parse()
        .map_err(|_| GraphError::invalid(format!("`scale_x_divisions` has a bad count: {text}")))?;
    let unit = match unit.trim_end_matches('s') {
        "second" => 1.0,
        "minute" => 60.0,
        "hour" => 3_600.0,
        "day" => 86_400.0,
        "week" => 604_800.0,
        "month" => 2_592_000.0,
        "year" => 31_536_000.0,
        other => {
            return Err(GraphError::invalid(format!(
                "`scale_x_divisions` has an unknown unit: {other}"
            )));
        }
    };
    Ok(Some(count * unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(overrides: Options) -> Config {
        let mut config = Config::seeded("TimeSeries", TimeSeries.defaults());
        config.apply(overrides).unwrap();
        config
    }

    #[test]
    fn dates_parse_with_and_without_time() {
        assert_eq!(parse_time("1970-01-02"), Some(86_400.0));
        assert_eq!(parse_time("1970-01-01 01:00:00"), Some(3_600.0));
        assert_eq!(parse_time("01/02/1970"), None);
    }

    #[test]
    fn division_units() {
        let config = config(crate::options! { scale_x_divisions => "2 days" });
        assert_eq!(divisions(&config).unwrap(), Some(172_800.0));
        let config = config_with_divisions(Value::from(60));
        assert_eq!(divisions(&config).unwrap(), Some(60.0));
        let config = config_with_divisions(Value::from("3 fortnights"));
        assert!(divisions(&config).is_err());
    }

    fn config_with_divisions(value: Value) -> Config {
        config(vec![("scale_x_divisions", value)])
    }

    #[test]
    fn bad_label_format_is_rejected() {
        let config = config(crate::options! { x_label_format => "%Y-%Q" });
        assert!(matches!(
            TimeSeries.validate(&config),
            Err(GraphError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn unparseable_dates_are_invalid_rows() {
        let config = config(Vec::new());
        let err = TimeSeries
            .accept(
                &config,
                &DataStore::default(),
                DataSet::new(Values::table([
                    vec![Value::from("2024-01-01"), Value::from(3)],
                    vec![Value::from("yesterday"), Value::from(4)],
                ])),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRow { index: 1, .. }));
    }

    #[test]
    fn ticks_are_labelled_as_dates() {
        let config = config(crate::options! { scale_x_divisions => "1 day" });
        let mut data = DataStore::default();
        data.push(
            TimeSeries
                .accept(
                    &config,
                    &data,
                    DataSet::new(Values::table([
                        vec![Value::from("2024-03-01"), Value::from(3)],
                        vec![Value::from("2024-03-03"), Value::from(5)],
                    ])),
                )
                .unwrap(),
        );
        let layout = TimeSeries.layout(&config, &data).unwrap().unwrap();
        let labels: Vec<String> = layout.as_map().unwrap()["x_labels"]
            .as_list()
            .unwrap()
            .iter()
            .map(|l| l.as_map().unwrap()["text"].to_string())
            .collect();
        assert_eq!(labels, ["2024-03-01", "2024-03-02", "2024-03-03"]);
    }
}
