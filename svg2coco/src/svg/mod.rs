mod reader;
pub mod parse;

pub use reader::read_drawing;

use crate::geometry::{OutOfRange, Viewport};
use crate::svg::parse::PathError;

#[derive(Debug, Clone)]
pub struct StrokePath {
    pub d: String,
    pub stroke: String, // empty when the attribute is absent
}

#[derive(Debug, Clone)]
pub struct Drawing {
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub paths: Vec<StrokePath>,
}

#[derive(Debug, thiserror::Error)]
pub enum DrawingError {
    #[error("no svg element in document")]
    MissingSvgElement,
    #[error("svg element has no `viewBox` attribute")]
    MissingViewBox,
    #[error("unusable `viewBox` attribute: `{value}`")]
    BadViewBox { value: String },
    #[error("svg element has no `{name}` attribute")]
    MissingDimension { name: &'static str },
    #[error("unusable `{name}` attribute: `{value}`")]
    BadDimension { name: &'static str, value: String },
    #[error("path element has no `d` attribute, available attributes: `{attrs:?}`")]
    MissingPathData { attrs: Vec<String> },
    #[error("could not decode path `{d}`: {source}")]
    BadPathData { d: String, source: PathError },
    #[error("path `{d}` decodes to no points")]
    EmptyPath { d: String },
    #[error("path `{d}` projects off the pixel grid: {source}")]
    PathOutOfRange { d: String, source: OutOfRange },
    #[error("invalid xml: {0}")]
    Xml(String),
}
