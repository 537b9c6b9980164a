//! The template language used to turn layout results into SVG markup.
//!
//! Templates are parsed with a pest grammar into a small AST and then
//! evaluated against a [`Context`]. Syntax and evaluation failures are
//! [`TemplateError`] diagnostics pointing into the template source.

pub mod ast;
mod builtins;
mod eval;
pub mod parse;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use indexmap::IndexMap;

use crate::errors::TemplateError;
use crate::value::Value;

/// Variables visible to a template render
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
    nodes: Vec<ast::Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            name: name.to_string(),
            source: source.to_string(),
            nodes: parse::parse(name, source)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[ast::Node] {
        &self.nodes
    }

    /// Render with the built-in functions only
    pub fn render(&self, context: &Context) -> Result<String, TemplateError> {
        self.render_with(context, &builtins::builtins())
    }

    fn render_with(
        &self,
        context: &Context,
        builtins: &IndexMap<String, Value>,
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len() * 2);
        let mut scope = eval::Scope::new(&self.name, &self.source, context, builtins);
        scope.render(&self.nodes, &mut out)?;
        Ok(out)
    }
}

/// Turns a template and a context into rendered text.
///
/// Graphs own one renderer and reuse it for every `burn`.
pub trait TemplateRenderer {
    fn render(&mut self, name: &str, source: &str, context: &Context) -> Result<String, TemplateError>;
}

/// The built-in renderer; parsed templates are cached by name
pub struct Engine {
    cache: HashMap<String, Template>,
    builtins: IndexMap<String, Value>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            builtins: builtins::builtins(),
        }
    }

    /// Number of cached templates
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compile<'c>(
        cache: &'c mut HashMap<String, Template>,
        name: &str,
        source: &str,
    ) -> Result<&'c Template, TemplateError> {
        match cache.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().source != source {
                    crate::log::debug!(template = name, "template source changed, reparsing");
                    entry.insert(Template::parse(name, source)?);
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                crate::log::debug!(template = name, "parsing template");
                Ok(entry.insert(Template::parse(name, source)?))
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cached", &self.cache.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TemplateRenderer for Engine {
    fn render(&mut self, name: &str, source: &str, context: &Context) -> Result<String, TemplateError> {
        let template = Self::compile(&mut self.cache, name, source)?;
        template.render_with(context, &self.builtins)
    }
}
