//! Bar graphs with the fields running down the y axis

use super::axis::AXIS_TEMPLATE;
use super::bar::{self, Orientation};
use super::{Chart, accept_fields};
use crate::config::{Config, Options};
use crate::data::{DataSet, DataStore, StoredSet};
use crate::errors::Result;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct BarHorizontal;

impl Chart for BarHorizontal {
    fn kind(&self) -> &'static str {
        "BarHorizontal"
    }

    fn defaults(&self) -> Options {
        super::merge([
            bar::bar_options(),
            crate::options! {
                x_title => "Y Scale",
                y_title => "X Field names",
                x_label_formatter => Value::Null,
            },
        ])
    }

    fn validate(&self, config: &Config) -> Result<()> {
        bar::validate_bars(config)?;
        config.formatter("x_label_formatter")?;
        Ok(())
    }

    fn accept(&self, config: &Config, _data: &DataStore, set: DataSet) -> Result<StoredSet> {
        accept_fields(self.kind(), config, set)
    }

    fn layout(&self, config: &Config, data: &DataStore) -> Result<Option<Value>> {
        super::to_calc(&bar::layout(config, data, Orientation::Horizontal)?)
    }

    fn template(&self) -> &'static str {
        AXIS_TEMPLATE
    }
}
