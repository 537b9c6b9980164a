//! Config store: the closed, per-variant option set behind a graph.
//!
//! Options are seeded once from the variant's defaults and then overridden
//! by the caller. Reading or writing a name the defaults never declared is
//! an `UnknownOption` error, so typos surface instead of silently creating
//! new keys.

use indexmap::IndexMap;

use crate::errors::{GraphError, Result};
use crate::value::{Function, Value};

/// Declare an ordered option table.
///
/// ```
/// let table = svg_graph::options! {
///     width => 500,
///     fields => vec!["Jan", "Feb"],
///     key => true,
/// };
/// assert_eq!(table.len(), 3);
/// ```
#[macro_export]
macro_rules! options {
    ($($name:ident => $value:expr),* $(,)?) => {{
        let table: $crate::Options = vec![$((stringify!($name), $crate::Value::from($value))),*];
        table
    }};
}

/// Option table as produced by [`options!`]
pub type Options = Vec<(&'static str, Value)>;

/// The option values of one graph
#[derive(Debug, Clone)]
pub struct Config {
    chart: &'static str,
    values: IndexMap<String, Value>,
}

impl Config {
    /// Seed from a variant's defaults
    pub(crate) fn seeded(chart: &'static str, defaults: Options) -> Self {
        let values = defaults
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self { chart, values }
    }

    /// Apply caller overrides in iteration order; later duplicates win
    pub(crate) fn apply<I, K, V>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in overrides {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Current value of an option
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| self.unknown(name))
    }

    /// Overwrite an option in place, returning the stored value
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&Value> {
        let chart = self.chart;
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(&*slot)
            }
            None => Err(GraphError::UnknownOption {
                name: name.to_string(),
                chart,
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Declared option names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn chart(&self) -> &'static str {
        self.chart
    }

    fn unknown(&self, name: &str) -> GraphError {
        GraphError::UnknownOption {
            name: name.to_string(),
            chart: self.chart,
        }
    }

    // ------------------------------------------------------------------------
    // Typed readers
    // ------------------------------------------------------------------------

    pub fn number(&self, name: &str) -> Result<f64> {
        let value = self.get(name)?;
        value
            .as_number()
            .ok_or_else(|| mismatch(name, "a number", value))
    }

    /// A number, or `None` when the option is null or empty text ("auto")
    pub fn opt_number(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            Value::Text(s) if s.trim().is_empty() => Ok(None),
            value => value
                .as_number()
                .map(Some)
                .ok_or_else(|| mismatch(name, "a number", value)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.truthy())
    }

    pub fn text(&self, name: &str) -> Result<String> {
        let value = self.get(name)?;
        match value {
            Value::List(_) | Value::Map(_) | Value::Func(_) => Err(mismatch(name, "text", value)),
            _ => Ok(value.to_string()),
        }
    }

    /// An ordered list of names such as `fields`
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        match self.get(name)? {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => Ok(items.iter().map(ToString::to_string).collect()),
            value => Err(mismatch(name, "a list", value)),
        }
    }

    /// A label formatter, or `None` for default number formatting
    pub fn formatter(&self, name: &str) -> Result<Option<&Function>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            Value::Func(f) => Ok(Some(f)),
            value => Err(mismatch(name, "a function", value)),
        }
    }

    /// Options as a template value
    pub fn to_value(&self) -> Value {
        Value::Map(self.values.clone())
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> GraphError {
    GraphError::invalid(format!(
        "option `{name}` must be {expected}, got {}",
        got.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config::seeded(
            "Test",
            options! {
                width => 500,
                fields => Vec::<String>::new(),
                graph_title => "Title",
                min_scale_value => Value::Null,
            },
        )
    }

    #[test]
    fn get_and_set_round_trip() {
        let mut config = sample();
        assert_eq!(config.get("width").unwrap(), &Value::from(500));
        assert_eq!(config.set("width", 640).unwrap(), &Value::from(640));
        assert_eq!(config.number("width").unwrap(), 640.0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut config = sample();
        assert!(matches!(
            config.get("colour"),
            Err(GraphError::UnknownOption { .. })
        ));
        assert!(matches!(
            config.set("colour", "red"),
            Err(GraphError::UnknownOption { .. })
        ));
        assert!(!config.contains("colour"));
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut config = sample();
        config
            .apply([("width", Value::from(300)), ("width", Value::from(320))])
            .unwrap();
        assert_eq!(config.number("width").unwrap(), 320.0);
    }

    #[test]
    fn typed_readers_report_mismatches() {
        let config = sample();
        assert!(matches!(
            config.number("graph_title"),
            Err(GraphError::InvalidConfiguration { .. })
        ));
        assert!(config.list("fields").unwrap().is_empty());
        assert_eq!(config.opt_number("min_scale_value").unwrap(), None);
        assert_eq!(config.text("graph_title").unwrap(), "Title");
    }
}
