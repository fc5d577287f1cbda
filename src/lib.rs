// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svgtiny` is an in-memory scene graph for the SVG Tiny 1.2 profile.

It models the document as a typed DOM with a CSS-like cascading style
model that is resolved at draw time, and provides:

- rendering into an external 2-D drawing surface (the [`Surface`] trait);
- re-serialization back into SVG markup;
- document-level tables for `use`/gradient/pattern cross-references,
  resolved lazily and cycle-guarded.

The markup parser, the rasterizer and the text shaper are external
collaborators: a parser builds the tree through the public node API,
while rendering calls out through [`Surface`] and [`TextShaper`].
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::question_mark)]
#![allow(clippy::too_many_arguments)]

pub mod geom;

mod document;
mod node;
mod shapes;
mod state;
mod structure;
mod style;
mod text;
mod writer;

pub use tiny_skia_path;

pub use document::{Document, DocumentParser, SvgFont, SvgGlyph};
pub use node::{Conditions, Kind, Node, NodeData, NodeExt};
pub use shapes::{Ellipse, Image, ImageData, Line, Markers, Path, Poly, Rect, Use};
pub use state::{
    ClipLayer, DrawContext, PaintState, ResolvedFont, ResolvedGradient, ResolvedPaint, Surface,
    TextRun, TextShaper,
};
pub use structure::{
    ClipPath, ClipShape, Marker, MarkerOrient, MarkerUnits, Pattern, Switch,
};
pub use style::{
    BaseGradient, Color, CompOp, DisplayMode, Fill, FillRule, Font, FontStyle, FontVariant,
    GradientKind, LineCap, LineJoin, NamedStyle, Opacity, Paint, RadialGradientValues,
    SolidColor, SpreadMethod, Stop, Stroke, StrokeMiterlimit, Style, TextAnchor, Units,
};
pub use text::{Text, TextItem, Tspan, XmlSpace};
pub use writer::{Indent, WriteOptions};

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// Only UTF-8 content are supported.
    NotAnUtf8Str,

    /// Compressed SVG must use the GZip algorithm.
    MalformedGZip,

    /// The decompressed data is not an SVG document.
    NotAnSvg,

    /// Failed to read the input.
    Io(std::io::Error),

    /// The external parser rejected the document.
    ParsingFailed,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::NotAnUtf8Str => {
                write!(f, "provided data has not an UTF-8 encoding")
            }
            Error::MalformedGZip => {
                write!(f, "provided data has a malformed GZip content")
            }
            Error::NotAnSvg => {
                write!(f, "provided data is not an SVG document")
            }
            Error::Io(ref e) => {
                write!(f, "failed to read the input cause {}", e)
            }
            Error::ParsingFailed => {
                write!(f, "SVG data parsing failed")
            }
        }
    }
}

impl std::error::Error for Error {}

trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
