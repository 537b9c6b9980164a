//! Rendered documents and optional gzip output.
//!
//! Compression is best effort: when the crate is built without the
//! `compress` feature, or the encoder fails, the plain SVG is returned with
//! a trailing comment saying why.

/// Appended when gzip output was requested but is not compiled in
pub const UNAVAILABLE: &str =
    "<!-- compression unavailable: built without the compress feature -->\n";

/// The output of [`Graph::burn`](crate::Graph::burn)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Svg(String),
    Gzip(Vec<u8>),
}

impl Document {
    /// The SVG text, unless the document is compressed
    pub fn as_svg(&self) -> Option<&str> {
        match self {
            Document::Svg(svg) => Some(svg.as_str()),
            Document::Gzip(_) => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Document::Gzip(_))
    }

    /// Bytes ready to be written to a file
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Document::Svg(svg) => svg.into_bytes(),
            Document::Gzip(bytes) => bytes,
        }
    }
}

#[cfg(feature = "compress")]
pub(crate) fn compress(mut svg: String) -> Document {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    let gzipped = encoder
        .write_all(svg.as_bytes())
        .and_then(|()| encoder.finish());
    match gzipped {
        Ok(bytes) => {
            crate::log::debug!(svg = svg.len(), gzip = bytes.len(), "compressed document");
            Document::Gzip(bytes)
        }
        Err(e) => {
            crate::log::warn!(error = %e, "gzip failed, returning plain svg");
            svg.push_str(&format!("<!-- compression failed: {e} -->\n"));
            Document::Svg(svg)
        }
    }
}

#[cfg(not(feature = "compress"))]
pub(crate) fn compress(mut svg: String) -> Document {
    crate::log::warn!("compression requested but the compress feature is disabled");
    svg.push_str(UNAVAILABLE);
    Document::Svg(svg)
}
