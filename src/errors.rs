//! Error types with rich diagnostics using miette
//!
//! Graph errors are programmer or input errors and are never retried.
//! Template errors carry the template source and a span so that a bad
//! template points at the offending expression.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Graph Errors
// ============================================================================

/// Errors raised by the graph facade and the chart variants
#[derive(Error, Diagnostic, Debug)]
pub enum GraphError {
    #[error("unknown option `{name}` for {chart} graphs")]
    #[diagnostic(
        code(svg_graph::config::unknown_option),
        help("only options declared by the chart's defaults can be read or set")
    )]
    UnknownOption { name: String, chart: &'static str },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(svg_graph::config::invalid))]
    InvalidConfiguration { message: String },

    #[error("no fields configured for {chart} graph")]
    #[diagnostic(
        code(svg_graph::data::missing_fields),
        help("set the `fields` option to a non-empty list before adding data")
    )]
    MissingFields { chart: &'static str },

    #[error("heat map has no y axis order")]
    #[diagnostic(
        code(svg_graph::data::missing_axis_order),
        help("set `y_axis_order` or supply a header row as the first table row")
    )]
    MissingAxisOrder,

    #[error("{chart} graphs accept a single data set")]
    #[diagnostic(
        code(svg_graph::data::too_many_data_sets),
        help("call `clear_data` before adding a replacement data set")
    )]
    TooManyDataSets { chart: &'static str },

    #[error("invalid row {index}: {reason}")]
    #[diagnostic(code(svg_graph::data::invalid_row))]
    InvalidRow { index: usize, reason: String },

    #[error("{chart} graphs cannot take {shape} data")]
    #[diagnostic(code(svg_graph::data::unsupported))]
    UnsupportedData {
        chart: &'static str,
        shape: &'static str,
    },

    #[error("no data to graph")]
    #[diagnostic(
        code(svg_graph::data::no_data),
        help("call `add_data` at least once before `burn`")
    )]
    NoData,

    #[error("data values sum to zero")]
    #[diagnostic(code(svg_graph::data::degenerate))]
    DegenerateData,

    #[error("failed to render {chart} template")]
    #[diagnostic(code(svg_graph::render))]
    Render {
        chart: &'static str,
        #[source]
        #[diagnostic_source]
        source: TemplateError,
    },
}

impl GraphError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn row(index: usize, reason: impl Into<String>) -> Self {
        GraphError::InvalidRow {
            index,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Template Errors
// ============================================================================

/// Errors that occur while parsing or evaluating a template
#[derive(Error, Diagnostic, Debug)]
pub enum TemplateError {
    #[error("template syntax error: {message}")]
    #[diagnostic(code(svg_graph::template::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("{message}")]
    #[diagnostic(code(svg_graph::template::eval))]
    Eval {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("while evaluating this")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
    },
}

impl TemplateError {
    /// The error message without source decoration
    pub fn message(&self) -> &str {
        match self {
            TemplateError::Syntax { message, .. } | TemplateError::Eval { message, .. } => message,
        }
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
