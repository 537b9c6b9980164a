//! The graph facade: config, data and rendering for one chart.

use std::fmt;

use crate::chart::{Chart, Variant};
use crate::compress::{self, Document};
use crate::config::Config;
use crate::data::{DataSet, DataStore};
use crate::errors::{GraphError, Result};
use crate::template::{Context, Engine, TemplateRenderer};
use crate::value::{Function, Value};

/// One chart: its options, its data sets and the renderer that draws it.
///
/// ```
/// use svg_graph::{DataSet, Graph, Pie, options};
///
/// let mut graph = Graph::new(Pie::default(), options! { fields => vec!["Jan", "Feb"] })?;
/// graph.add_data(DataSet::new(vec![1.0, 3.0]))?;
/// let svg = graph.burn()?.into_bytes();
/// assert!(svg.starts_with(b"<?xml"));
/// # Ok::<(), svg_graph::GraphError>(())
/// ```
pub struct Graph {
    variant: Variant,
    config: Config,
    data: DataStore,
    calc: Value,
    renderer: Box<dyn TemplateRenderer>,
}

impl Graph {
    /// Seed the variant's defaults, apply `overrides` and validate the result
    pub fn new<I, K, V>(variant: impl Into<Variant>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let variant = variant.into();
        let mut config = Config::seeded(variant.kind(), variant.defaults());
        config.apply(overrides)?;
        variant.validate(&config)?;
        crate::log::debug!(chart = variant.kind(), "graph constructed");
        Ok(Self {
            variant,
            config,
            data: DataStore::default(),
            calc: Value::Null,
            renderer: Box::new(Engine::new()),
        })
    }

    /// Render through `renderer` instead of the built-in engine
    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn kind(&self) -> &'static str {
        self.variant.kind()
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current value of a declared option
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.config.get(name)
    }

    /// Overwrite a declared option.
    ///
    /// The variant revalidates the config; a rejected value is rolled back.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&Value> {
        let previous = self.config.get(name)?.clone();
        self.config.set(name, value)?;
        if let Err(e) = self.variant.validate(&self.config) {
            self.config.set(name, previous)?;
            return Err(e);
        }
        self.config.get(name)
    }

    /// Validate, normalize and append one data set
    pub fn add_data(&mut self, set: DataSet) -> Result<()> {
        let stored = self.variant.accept(&self.config, &self.data, set)?;
        self.data.push(stored);
        crate::log::debug!(chart = self.kind(), sets = self.data.len(), "data added");
        Ok(())
    }

    /// Drop every data set; options are kept
    pub fn clear_data(&mut self) {
        self.data.clear();
        self.calc = Value::Null;
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Layout values from the most recent `burn`
    pub fn calculated(&self) -> &Value {
        &self.calc
    }

    /// Lay out and render the graph
    pub fn burn(&mut self) -> Result<Document> {
        if self.data.is_empty() {
            return Err(GraphError::NoData);
        }
        let chart = self.kind();
        self.calc = self
            .variant
            .layout(&self.config, &self.data)?
            .unwrap_or(Value::Null);

        let data = self
            .data
            .to_value()
            .map_err(|e| GraphError::invalid(format!("data is not representable: {e}")))?;
        let mut context = Context::new();
        context
            .insert("config", self.config.to_value())
            .insert("data", data)
            .insert("calc", self.calc.clone())
            .insert("sin", Function::numeric("sin", f64::sin))
            .insert("cos", Function::numeric("cos", f64::cos));

        let svg = self
            .renderer
            .render(chart, self.variant.template(), &context)
            .map_err(|source| GraphError::Render { chart, source })?;
        crate::log::debug!(chart, bytes = svg.len(), "rendered");

        if self.config.flag("compress")? {
            Ok(compress::compress(svg))
        } else {
            Ok(Document::Svg(svg))
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("variant", &self.variant)
            .field("config", &self.config)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
