// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Style property value objects.
//!
//! Unlike a resolved tree, every property here tracks whether it was
//! explicitly set on its element: an unset property (`None`) inherits the
//! ancestor's resolved value during drawing and is never serialized.

use std::collections::HashMap;
use std::rc::Rc;

use strict_num::{NonZeroPositiveF32, NormalizedF32};
use tiny_skia_path::Transform;

/// An alpha value normalized to the 0.0..=1.0 range.
pub type Opacity = NormalizedF32;

/// An RGB color.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    /// Red component.
    pub red: u8,
    /// Green component.
    pub green: u8,
    /// Blue component.
    pub blue: u8,
}

impl Color {
    /// Constructs a new `Color` from RGB values.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color { red, green, blue }
    }

    /// Constructs a new `Color` set to black.
    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }

    /// Constructs a new `Color` set to white.
    #[inline]
    pub fn white() -> Color {
        Color::new_rgb(255, 255, 255)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

/// A paint value: a color, a reference to a paint server, or nothing.
///
/// References are stored as ids and resolved lazily against the owning
/// [`Document`](crate::Document) tables, so cloning a document can never
/// leave a paint pointing into the source tree.
#[derive(Clone, PartialEq, Debug)]
pub enum Paint {
    /// The explicit `none` value.
    None,
    /// A plain color.
    Color(Color),
    /// A `url(#id)` reference to a named style or a pattern node.
    Ref(String),
}

/// A fill rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FillRule {
    /// `nonzero`
    NonZero,
    /// `evenodd`
    EvenOdd,
}

impl Default for FillRule {
    fn default() -> Self {
        Self::NonZero
    }
}

/// A line cap.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineCap {
    /// `butt`
    Butt,
    /// `round`
    Round,
    /// `square`
    Square,
}

impl Default for LineCap {
    fn default() -> Self {
        Self::Butt
    }
}

/// A line join.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineJoin {
    /// `miter`
    Miter,
    /// `round`
    Round,
    /// `bevel`
    Bevel,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter
    }
}

/// A stroke miter limit.
///
/// Just like `f32`, but immutable and guarantee to be >= 1.0.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StrokeMiterlimit(f32);

impl StrokeMiterlimit {
    /// Creates a new `StrokeMiterlimit` value.
    #[inline]
    pub fn new(n: f32) -> Self {
        debug_assert!(n.is_finite());
        debug_assert!(n >= 1.0);

        let n = if !(n >= 1.0) { 1.0 } else { n };

        StrokeMiterlimit(n)
    }

    /// Returns an underlying value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Default for StrokeMiterlimit {
    #[inline]
    fn default() -> Self {
        StrokeMiterlimit::new(4.0)
    }
}

impl From<f32> for StrokeMiterlimit {
    #[inline]
    fn from(n: f32) -> Self {
        Self::new(n)
    }
}

/// A text anchor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextAnchor {
    /// `start`
    Start,
    /// `middle`
    Middle,
    /// `end`
    End,
}

impl Default for TextAnchor {
    fn default() -> Self {
        Self::Start
    }
}

/// A font style.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FontStyle {
    /// `normal`
    Normal,
    /// `italic`
    Italic,
    /// `oblique`
    Oblique,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self::Normal
    }
}

/// A font variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FontVariant {
    /// `normal`
    Normal,
    /// `small-caps`
    SmallCaps,
}

impl Default for FontVariant {
    fn default() -> Self {
        Self::Normal
    }
}

/// An element display mode.
///
/// SVG Tiny inherits the full CSS value list even though only `none` has an
/// effect on rendering.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum DisplayMode {
    Inline,
    Block,
    ListItem,
    RunIn,
    Compact,
    Marker,
    Table,
    InlineTable,
    TableRowGroup,
    TableHeaderGroup,
    TableFooterGroup,
    TableRow,
    TableColumnGroup,
    TableColumn,
    TableCell,
    TableCaption,
    None,
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::Inline
    }
}

/// A composition mode, written as the SVG 1.2 `comp-op` property.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum CompOp {
    Clear,
    Src,
    Dst,
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Plus,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl Default for CompOp {
    fn default() -> Self {
        Self::SrcOver
    }
}

/// A coordinate interpretation mode for paint servers and clip paths.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Units {
    /// Absolute document coordinates.
    UserSpaceOnUse,
    /// Fractions of the referencing shape's bounding box.
    ObjectBoundingBox,
}

/// Explicitly-set fill sub-properties.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Fill {
    /// `fill`
    pub paint: Option<Paint>,
    /// `fill-opacity`
    pub opacity: Option<Opacity>,
    /// `fill-rule`
    pub rule: Option<FillRule>,
}

/// Explicitly-set stroke sub-properties.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Stroke {
    /// `stroke`
    pub paint: Option<Paint>,
    /// `stroke-width`
    pub width: Option<NonZeroPositiveF32>,
    /// `stroke-opacity`
    pub opacity: Option<Opacity>,
    /// `stroke-dasharray`; an empty list is the explicit `none`.
    pub dash_array: Option<Vec<f32>>,
    /// `stroke-dashoffset`
    pub dash_offset: Option<f32>,
    /// `stroke-linecap`
    pub line_cap: Option<LineCap>,
    /// `stroke-linejoin`
    pub line_join: Option<LineJoin>,
    /// `stroke-miterlimit`
    pub miter_limit: Option<StrokeMiterlimit>,
}

/// Explicitly-set font sub-properties.
///
/// `text-anchor` rides along with the font since it cascades identically.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Font {
    /// `font-family`
    pub family: Option<String>,
    /// `font-size`
    pub size: Option<NonZeroPositiveF32>,
    /// `font-style`
    pub style: Option<FontStyle>,
    /// `font-weight`; 400 is normal, 700 is bold.
    pub weight: Option<u16>,
    /// `font-variant`
    pub variant: Option<FontVariant>,
    /// `text-anchor`
    pub anchor: Option<TextAnchor>,
}

/// The sparse per-node style table.
///
/// Each `None` property is "not set here" and inherits during drawing.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Style {
    /// Fill sub-properties.
    pub fill: Option<Fill>,
    /// Stroke sub-properties.
    pub stroke: Option<Stroke>,
    /// Font sub-properties.
    pub font: Option<Font>,
    /// `transform`, pre-concatenated with the ancestor transform.
    pub transform: Option<Transform>,
    /// `opacity`, multiplied into the group opacity.
    pub opacity: Option<Opacity>,
    /// `comp-op`
    pub comp_op: Option<CompOp>,
    /// `clip-path`, as the referenced element id.
    pub clip_path: Option<String>,
    /// `clip-rule`
    pub clip_rule: Option<FillRule>,
    /// `display`
    pub display: Option<DisplayMode>,
    /// `viewport-fill`
    pub viewport_fill: Option<Paint>,
}

impl Style {
    /// Checks that no property is explicitly set.
    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }
}

/// A gradient stop.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Stop {
    /// Gradient stop offset.
    pub offset: NormalizedF32,
    /// Gradient stop color.
    pub color: Color,
    /// Gradient stop opacity.
    pub opacity: Opacity,
}

/// A spread method.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpreadMethod {
    /// `pad`
    Pad,
    /// `reflect`
    Reflect,
    /// `repeat`
    Repeat,
}

impl Default for SpreadMethod {
    fn default() -> Self {
        Self::Pad
    }
}

/// Properties shared by all gradient kinds.
#[derive(Clone, PartialEq, Debug)]
pub struct BaseGradient {
    /// Coordinate system of the gradient geometry.
    pub units: Units,

    /// Gradient transform.
    pub transform: Transform,

    /// Gradient spread method.
    pub spread_method: SpreadMethod,

    /// A list of `stop` elements.
    ///
    /// May be empty when `stop_link` supplies the stops.
    pub stops: Vec<Stop>,

    /// An `xlink:href` reference to another named style that provides
    /// the stop list. Resolved lazily through the document table.
    pub stop_link: Option<String>,
}

/// Geometry of a single gradient kind.
#[derive(Clone, PartialEq, Debug)]
pub enum GradientKind {
    /// A linear gradient along the `(x1, y1)`-`(x2, y2)` line.
    Linear {
        /// The `x1` coordinate.
        x1: f32,
        /// The `y1` coordinate.
        y1: f32,
        /// The `x2` coordinate.
        x2: f32,
        /// The `y2` coordinate.
        y2: f32,
    },
    /// A radial gradient.
    Radial(RadialGradientValues),
    /// A conical gradient around a center point.
    ///
    /// Renderable, but not expressible in SVG Tiny markup; the writer
    /// warns and skips it.
    Conical {
        /// The center `x` coordinate.
        cx: f32,
        /// The center `y` coordinate.
        cy: f32,
        /// Start angle in degrees.
        angle: f32,
    },
}

/// Radial gradient geometry.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RadialGradientValues {
    /// The `cx` coordinate.
    pub cx: f32,
    /// The `cy` coordinate.
    pub cy: f32,
    /// The radius.
    pub r: f32,
    /// The focal point `x` coordinate.
    pub fx: f32,
    /// The focal point `y` coordinate.
    pub fy: f32,
}

/// A `solidColor` paint server.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SolidColor {
    /// `solid-color`
    pub color: Color,
    /// `solid-opacity`
    pub opacity: Opacity,
}

/// A reusable, document-owned paint server.
///
/// Stored in the document's named-style table and shared by reference
/// counting; nodes refer to entries by id only.
#[derive(Clone, PartialEq, Debug)]
pub enum NamedStyle {
    /// A `solidColor` element.
    Solid(SolidColor),
    /// A gradient element.
    Gradient {
        /// Shared gradient properties.
        base: BaseGradient,
        /// Kind-specific geometry.
        kind: GradientKind,
    },
}

/// The document's named-style table.
pub(crate) type NamedStyles = HashMap<String, Rc<NamedStyle>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_style_is_empty() {
        assert!(Style::default().is_empty());

        let mut style = Style::default();
        style.fill = Some(Fill {
            paint: Some(Paint::Color(Color::black())),
            ..Fill::default()
        });
        assert!(!style.is_empty());
    }

    #[test]
    fn miter_limit_clamps() {
        assert_eq!(StrokeMiterlimit::from(4.0).get(), 4.0);
    }
}
