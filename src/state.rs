// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The draw-time paint state and the external collaborator traits.
//!
//! Instead of mutating a shared painter, drawing threads an explicit
//! [`PaintState`] stack through the call tree: applying a node's style
//! pushes a cascaded copy, reverting pops it. Every exit path of a draw
//! function must pop exactly what it pushed.

use std::rc::Rc;

use strict_num::NonZeroPositiveF32;
use tiny_skia_path::{NonZeroRect, Point, Size, Transform};

use crate::shapes::ImageData;
use crate::structure::ClipShape;
use crate::style::{
    Color, CompOp, FillRule, FontStyle, FontVariant, GradientKind, LineCap, LineJoin, Opacity,
    SpreadMethod, Stop, StrokeMiterlimit, TextAnchor, Units,
};

/// A fully resolved paint server.
#[derive(Clone)]
pub enum ResolvedPaint {
    /// A plain color with a server-level opacity.
    Color(Color, Opacity),
    /// A gradient with a concrete stop list.
    Gradient(Rc<ResolvedGradient>),
    /// A pattern node; consumers fill by tiling its content.
    Pattern(crate::Node),
}

impl std::fmt::Debug for ResolvedPaint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ResolvedPaint::Color(c, o) => f.debug_tuple("Color").field(c).field(o).finish(),
            ResolvedPaint::Gradient(g) => f.debug_tuple("Gradient").field(g).finish(),
            ResolvedPaint::Pattern(node) => {
                write!(f, "Pattern({:?})", node.borrow().id)
            }
        }
    }
}

/// A gradient with its stop links already resolved.
#[derive(Clone, Debug)]
pub struct ResolvedGradient {
    /// Kind-specific geometry.
    pub kind: GradientKind,
    /// Coordinate system of the geometry.
    pub units: Units,
    /// Gradient transform.
    pub transform: Transform,
    /// Spread method.
    pub spread_method: SpreadMethod,
    /// The concrete stop list.
    pub stops: Vec<Stop>,
}

/// A resolved font request handed to the text shaper and the surface.
#[derive(Clone, PartialEq, Debug)]
pub struct ResolvedFont {
    /// Font family.
    pub family: String,
    /// Font size in pixels.
    pub size: f32,
    /// Font style.
    pub style: FontStyle,
    /// Font weight; 400 is normal, 700 is bold.
    pub weight: u16,
    /// Font variant.
    pub variant: FontVariant,
}

impl Default for ResolvedFont {
    fn default() -> Self {
        ResolvedFont {
            family: "Arial".to_string(),
            size: 12.0,
            style: FontStyle::Normal,
            weight: 400,
            variant: FontVariant::Normal,
        }
    }
}

/// One applied clip, intersected with everything beneath it.
///
/// The union of `shapes` forms this layer's region; the effective clip is
/// the intersection of all layers reachable through `prev`.
#[derive(Clone, Debug)]
pub struct ClipLayer {
    /// Shapes whose union is this layer's region, in device coordinates.
    pub shapes: Vec<ClipShape>,
    /// The outer clip, if any.
    pub prev: Option<Rc<ClipLayer>>,
}

/// The resolved drawing state active while a node draws.
///
/// This is the cascade's output: every field holds a concrete value,
/// inherited or default.
#[derive(Clone, Debug)]
pub struct PaintState {
    /// Accumulated transform, device space from user space.
    pub transform: Transform,

    /// Fill paint; `None` disables filling.
    pub fill: Option<ResolvedPaint>,
    /// Fill rule.
    pub fill_rule: FillRule,
    /// Fill opacity.
    pub fill_opacity: Opacity,

    /// Stroke paint; `None` disables stroking.
    pub stroke: Option<ResolvedPaint>,
    /// Stroke width.
    pub stroke_width: NonZeroPositiveF32,
    /// Stroke opacity.
    pub stroke_opacity: Opacity,
    /// Stroke dash pattern; empty means solid.
    pub dash_array: Vec<f32>,
    /// Stroke dash offset.
    pub dash_offset: f32,
    /// Stroke line cap.
    pub line_cap: LineCap,
    /// Stroke line join.
    pub line_join: LineJoin,
    /// Stroke miter limit.
    pub miter_limit: StrokeMiterlimit,

    /// Current font.
    pub font: ResolvedFont,
    /// Text anchor.
    pub text_anchor: TextAnchor,

    /// Accumulated group opacity.
    pub opacity: f32,
    /// Composition mode.
    pub comp_op: CompOp,
    /// Active clip, if any.
    pub clip: Option<Rc<ClipLayer>>,
}

impl Default for PaintState {
    /// The document's initial render state: black fill, no stroke,
    /// "Arial" 12, full opacity, source-over, unclipped.
    fn default() -> Self {
        PaintState {
            transform: Transform::identity(),
            fill: Some(ResolvedPaint::Color(Color::black(), Opacity::ONE)),
            fill_rule: FillRule::NonZero,
            fill_opacity: Opacity::ONE,
            stroke: None,
            stroke_width: NonZeroPositiveF32::new(1.0).unwrap(),
            stroke_opacity: Opacity::ONE,
            dash_array: Vec::new(),
            dash_offset: 0.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: StrokeMiterlimit::default(),
            font: ResolvedFont::default(),
            text_anchor: TextAnchor::Start,
            opacity: 1.0,
            comp_op: CompOp::SrcOver,
            clip: None,
        }
    }
}

impl PaintState {
    /// Returns a copy prepared for the fill pass: stroking disabled,
    /// global opacity multiplied by the fill opacity.
    pub(crate) fn fill_pass(&self) -> PaintState {
        let mut state = self.clone();
        state.stroke = None;
        state.opacity *= self.fill_opacity.get();
        state
    }

    /// Returns a copy prepared for the stroke pass: filling disabled,
    /// global opacity multiplied by the stroke opacity.
    pub(crate) fn stroke_pass(&self) -> PaintState {
        let mut state = self.clone();
        state.fill = None;
        state.opacity *= self.stroke_opacity.get();
        state
    }
}

/// A positioned run of text ready for drawing.
#[derive(Clone, PartialEq, Debug)]
pub struct TextRun {
    /// The text content.
    pub text: String,
    /// The starting baseline position in user coordinates.
    pub pos: Point,
}

/// The external 2-D drawing surface.
///
/// The scene graph resolves styles, transforms and clips itself; every
/// primitive receives the complete [`PaintState`] it must be drawn with.
/// Fill and stroke arrive as two separate calls with independent opacity.
pub trait Surface {
    /// Fills and/or strokes a path.
    fn draw_path(&mut self, path: &tiny_skia_path::Path, state: &PaintState);

    /// Draws a rectangle with optional rounded corners.
    fn draw_rect(&mut self, rect: NonZeroRect, rx: f32, ry: f32, state: &PaintState);

    /// Draws an ellipse inscribed in `rect`.
    fn draw_ellipse(&mut self, rect: NonZeroRect, state: &PaintState);

    /// Draws a line segment.
    fn draw_line(&mut self, p1: Point, p2: Point, state: &PaintState);

    /// Draws a closed polygon.
    fn draw_polygon(&mut self, points: &[Point], state: &PaintState);

    /// Draws an open polyline.
    fn draw_polyline(&mut self, points: &[Point], state: &PaintState);

    /// Draws an encoded raster image into `rect`.
    fn draw_image(&mut self, image: &ImageData, rect: NonZeroRect, state: &PaintState);

    /// Draws a run of text at its baseline position using `state.font`.
    fn draw_text(&mut self, run: &TextRun, state: &PaintState);

    /// Renders a tile once via `content` into an offscreen buffer of
    /// `tile` size, then paints it repeatedly until `region` is covered.
    /// `state.transform` maps the tile origin; `state.clip` confines the
    /// tiling to the consumer's outline.
    fn draw_tiles(
        &mut self,
        region: NonZeroRect,
        tile: Size,
        state: &PaintState,
        content: &mut dyn FnMut(&mut dyn Surface),
    );
}

/// The external text-shaping service.
pub trait TextShaper {
    /// Returns the advance width of `text` at the given font.
    fn measure(&self, text: &str, font: &ResolvedFont) -> f32;
}

/// A stand-in shaper for bounds queries made without a real one.
///
/// Advances half an em per character, which keeps text extents roughly
/// proportional without a font backend.
#[derive(Debug)]
pub(crate) struct FallbackShaper;

impl TextShaper for FallbackShaper {
    fn measure(&self, text: &str, font: &ResolvedFont) -> f32 {
        text.chars().count() as f32 * font.size * 0.5
    }
}

/// The explicit state context threaded through every draw call.
pub struct DrawContext<'a> {
    surface: &'a mut dyn Surface,
    shaper: &'a dyn TextShaper,
    state: PaintState,
    saved: Vec<PaintState>,
    /// Target bounds active while drawing pattern content with
    /// object-bounding-box content units.
    pub(crate) pattern_target: Option<NonZeroRect>,
}

impl<'a> std::fmt::Debug for DrawContext<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("state", &self.state)
            .field("depth", &self.saved.len())
            .finish()
    }
}

impl<'a> DrawContext<'a> {
    /// Creates a context over the given collaborators with the default
    /// render state.
    pub fn new(surface: &'a mut dyn Surface, shaper: &'a dyn TextShaper) -> Self {
        Self::with_state(surface, shaper, PaintState::default())
    }

    /// Creates a context with an explicit initial state.
    pub fn with_state(
        surface: &'a mut dyn Surface,
        shaper: &'a dyn TextShaper,
        state: PaintState,
    ) -> Self {
        DrawContext {
            surface,
            shaper,
            state,
            saved: Vec::new(),
            pattern_target: None,
        }
    }

    /// The currently active state.
    #[inline]
    pub fn state(&self) -> &PaintState {
        &self.state
    }

    /// The drawing surface.
    #[inline]
    pub fn surface(&mut self) -> &mut dyn Surface {
        self.surface
    }

    /// The text shaper.
    #[inline]
    pub fn shaper(&self) -> &'a dyn TextShaper {
        self.shaper
    }

    /// Makes `state` active, saving the previous one.
    pub(crate) fn push(&mut self, state: PaintState) {
        self.saved.push(std::mem::replace(&mut self.state, state));
    }

    /// Restores the previously saved state.
    pub(crate) fn pop(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }
}
