// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The document: tree root, named tables, viewport math and the
//! animation clock.

use std::cell::Cell;
use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tiny_skia_path::{NonZeroRect, PathBuilder, Point, Rect, Size, Transform};

use crate::geom::map_rect_to_rect;
use crate::node::{self, Kind, Node, NodeData, NodeExt};
use crate::state::{
    DrawContext, PaintState, ResolvedGradient, ResolvedPaint, Surface, TextShaper,
};
use crate::style::{DisplayMode, NamedStyle, NamedStyles, Opacity, Paint, Style};
use crate::{Error, OptionLog};

/// One glyph of an embedded SVG font, in font units.
#[derive(Clone, Debug)]
pub struct SvgGlyph {
    /// The character this glyph renders.
    pub unicode: char,
    /// Advance width in font units; `None` falls back to the font's.
    pub horiz_adv_x: Option<f32>,
    /// The outline, y-up in font units. Spacing glyphs have none.
    pub path: Option<Rc<tiny_skia_path::Path>>,
}

/// An embedded SVG font: a glyph table in a 1000-units-per-em box by
/// default.
#[derive(Clone, Debug)]
pub struct SvgFont {
    /// The `font-family` this font serves.
    pub family: String,
    /// Size of the em box in font units.
    pub units_per_em: f32,
    /// Default advance width in font units.
    pub horiz_adv_x: f32,
    /// Glyphs by character.
    pub glyphs: HashMap<char, SvgGlyph>,
    /// The `missing-glyph` fallback.
    pub missing_glyph: Option<SvgGlyph>,
}

impl SvgFont {
    /// Creates an empty font for `family`.
    pub fn new(family: &str) -> Self {
        SvgFont {
            family: family.to_string(),
            units_per_em: 1000.0,
            horiz_adv_x: 0.0,
            glyphs: HashMap::new(),
            missing_glyph: None,
        }
    }

    /// Registers a glyph.
    pub fn add_glyph(&mut self, glyph: SvgGlyph) {
        self.glyphs.insert(glyph.unicode, glyph);
    }

    fn scale(&self, size: f32) -> f32 {
        if self.units_per_em.is_finite() && self.units_per_em > 0.0 {
            size / self.units_per_em
        } else {
            size / 1000.0
        }
    }

    fn lookup(&self, c: char) -> Option<&SvgGlyph> {
        self.glyphs.get(&c).or(self.missing_glyph.as_ref())
    }

    /// Advance width of one character at the given font size.
    pub fn char_width(&self, c: char, size: f32) -> f32 {
        let adv = self
            .lookup(c)
            .and_then(|g| g.horiz_adv_x)
            .unwrap_or(self.horiz_adv_x);
        adv * self.scale(size)
    }

    /// Advance width of a string at the given font size.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c, size)).sum()
    }

    /// The glyph outline scaled to `size` and placed at the pen
    /// position, flipped into screen coordinates.
    pub(crate) fn glyph_outline(
        &self,
        c: char,
        size: f32,
        pen: Point,
    ) -> Option<tiny_skia_path::Path> {
        let glyph = self.lookup(c)?;
        let path = glyph.path.as_ref()?;
        let s = self.scale(size);
        path.as_ref()
            .clone()
            .transform(Transform::from_row(s, 0.0, 0.0, -s, pen.x, pen.y))
    }
}

/// The external markup parser.
///
/// Parsing XML is out of scope here; a parser builds the tree through
/// the public node and document API and hands the result back.
pub trait DocumentParser {
    /// Parses SVG markup into a document.
    fn parse(&self, text: &str) -> Result<Document, Error>;
}

/// An SVG Tiny 1.2 document.
///
/// Owns the node tree, the named-node and named-style tables, the
/// embedded fonts and the animation clock.
pub struct Document {
    root: Node,
    size: Size,
    width_percent: bool,
    height_percent: bool,
    view_box: Option<NonZeroRect>,

    named_nodes: HashMap<String, Node>,
    named_styles: NamedStyles,
    fonts: HashMap<String, Rc<SvgFont>>,
    xml_classes: Vec<String>,

    animated: bool,
    animation_duration: f64,
    fps: u32,
    time: Cell<Option<Instant>>,
    first_render: Cell<bool>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("size", &self.size)
            .field("view_box", &self.view_box)
            .field("named_nodes", &self.named_nodes.len())
            .field("named_styles", &self.named_styles.len())
            .field("animated", &self.animated)
            .finish()
    }
}

impl Document {
    /// Creates an empty document of the given size.
    pub fn new(size: Size) -> Self {
        Document {
            root: Node::new(NodeData::new(Kind::Group)),
            size,
            width_percent: false,
            height_percent: false,
            view_box: None,
            named_nodes: HashMap::new(),
            named_styles: NamedStyles::new(),
            fonts: HashMap::new(),
            xml_classes: Vec::new(),
            animated: false,
            animation_duration: 0.0,
            fps: 30,
            time: Cell::new(None),
            first_render: Cell::new(true),
        }
    }

    /// The tree root. Always a structural node; the `svg` element's own
    /// properties live on it.
    pub fn root(&self) -> Node {
        self.root.clone()
    }

    /// The document size in user units.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Sets the document size. The percent flags record whether the
    /// original `width`/`height` attributes were percentages, which
    /// only serialization cares about.
    pub fn set_size(&mut self, size: Size, width_percent: bool, height_percent: bool) {
        self.size = size;
        self.width_percent = width_percent;
        self.height_percent = height_percent;
    }

    /// Whether the `width` attribute was a percentage.
    pub fn width_is_percent(&self) -> bool {
        self.width_percent
    }

    /// Whether the `height` attribute was a percentage.
    pub fn height_is_percent(&self) -> bool {
        self.height_percent
    }

    /// The `viewBox` rectangle, if any.
    pub fn view_box(&self) -> Option<NonZeroRect> {
        self.view_box
    }

    /// Sets the `viewBox` rectangle.
    pub fn set_view_box(&mut self, view_box: Option<NonZeroRect>) {
        self.view_box = view_box;
    }

    /// Registers a node under its id for cross-referencing.
    pub fn add_named_node(&mut self, node: Node) {
        let id = node.borrow().id.clone();
        if !id.is_empty() {
            self.named_nodes.insert(id, node);
        }
    }

    /// Looks a node up by id.
    pub fn node_by_id(&self, id: &str) -> Option<Node> {
        self.named_nodes.get(id).cloned()
    }

    /// Checks that an element with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.named_nodes.contains_key(id)
    }

    /// Registers a named paint server.
    pub fn add_named_style(&mut self, id: &str, style: NamedStyle) {
        self.named_styles.insert(id.to_string(), Rc::new(style));
    }

    /// Looks a named paint server up by id.
    pub fn named_style(&self, id: &str) -> Option<Rc<NamedStyle>> {
        self.named_styles.get(id).cloned()
    }

    pub(crate) fn named_styles(&self) -> &NamedStyles {
        &self.named_styles
    }

    /// Registers an embedded SVG font under its family.
    pub fn add_font(&mut self, font: SvgFont) {
        self.fonts.insert(font.family.clone(), Rc::new(font));
    }

    /// Looks an embedded SVG font up by family.
    pub fn font(&self, family: &str) -> Option<Rc<SvgFont>> {
        self.fonts.get(family).cloned()
    }

    pub(crate) fn fonts(&self) -> &HashMap<String, Rc<SvgFont>> {
        &self.fonts
    }

    /// Records document-level `class` names, keeping each once.
    pub fn append_xml_classes(&mut self, classes: &[String]) {
        for class in classes {
            if !self.xml_classes.contains(class) {
                self.xml_classes.push(class.clone());
            }
        }
    }

    /// The recorded document-level `class` names.
    pub fn xml_class_list(&self) -> &[String] {
        &self.xml_classes
    }

    /// Whether the document declared animation content.
    pub fn animated(&self) -> bool {
        self.animated
    }

    /// Marks the document as animated and sets the total duration in
    /// seconds.
    pub fn set_animated(&mut self, animated: bool, duration: f64) {
        self.animated = animated;
        self.animation_duration = duration;
    }

    /// Total animation duration in seconds.
    pub fn animation_duration(&self) -> f64 {
        self.animation_duration
    }

    /// Sets the animation frame rate. Defaults to 30.
    pub fn set_frames_per_second(&mut self, fps: u32) {
        self.fps = fps;
    }

    /// The current animation frame, derived from the running clock and
    /// clamped to the animation's end.
    pub fn current_frame(&self) -> i32 {
        if !self.animated || self.animation_duration <= 0.0 {
            return 0;
        }

        let elapsed = self
            .time
            .get()
            .map_or(0.0, |t| t.elapsed().as_secs_f64());
        let percentage = (elapsed / self.animation_duration).min(1.0);
        let total_frames = self.fps as f64 * self.animation_duration;
        (percentage * total_frames) as i32
    }

    /// Rewinds or advances the clock so that drawing resumes from
    /// `frame`. Lossy for frames past the animation's end.
    pub fn set_current_frame(&self, frame: i32) {
        if !self.animated || self.animation_duration <= 0.0 {
            return;
        }

        let total_frames = self.fps as f64 * self.animation_duration;
        if total_frames <= 0.0 {
            return;
        }
        let percentage = frame as f64 / total_frames;
        let elapsed = (self.animation_duration * percentage).max(0.0);
        let now = Instant::now();
        self.time
            .set(Some(now.checked_sub(Duration::from_secs_f64(elapsed)).unwrap_or(now)));
    }

    /// Renders the whole document with its natural viewport.
    pub fn draw(&self, surface: &mut dyn Surface, shaper: &dyn TextShaper) {
        self.draw_to(surface, shaper, None, None);
    }

    /// Renders `source` (defaulting to the `viewBox`, then to the
    /// document rect) scaled into `target` (defaulting to the source
    /// size at the origin).
    pub fn draw_to(
        &self,
        surface: &mut dyn Surface,
        shaper: &dyn TextShaper,
        target: Option<NonZeroRect>,
        source: Option<NonZeroRect>,
    ) {
        if self.animated && self.time.get().is_none() {
            self.time.set(Some(Instant::now()));
        }

        if self.root.borrow().style.display == Some(DisplayMode::None) {
            return;
        }

        // Warm the bounds caches before the first draw; cross-reference
        // resolution during drawing queries them freely.
        if self.first_render.get() {
            self.first_render.set(false);
            self.root.transformed_bounds(self);
        }

        let source_rect = self.source_rect(source);
        let mut state = PaintState::default();
        state.transform = map_source_to_target(target, source_rect);

        let mut ctx = DrawContext::with_state(surface, shaper, state);

        self.draw_viewport_fill(&mut ctx, source_rect);

        node::apply_style(&self.root, self, &mut ctx);
        for child in self.root.children() {
            node::draw(&child, self, &mut ctx);
        }
        node::revert_style(&mut ctx);
    }

    /// Renders a single element by id, scaled into `target` from the
    /// element's own bounds, with its ancestors' styles applied but
    /// their transforms ignored.
    pub fn draw_node(
        &self,
        id: &str,
        surface: &mut dyn Surface,
        shaper: &dyn TextShaper,
        target: Option<NonZeroRect>,
    ) {
        let node = match self
            .node_by_id(id)
            .log_none(|| log::warn!("element '{}' not found, skipping rendering", id))
        {
            Some(n) => n,
            None => return,
        };

        if self.animated && self.time.get().is_none() {
            self.time.set(Some(Instant::now()));
        }
        if !node.borrow().should_render() {
            return;
        }

        let mut state = PaintState::default();
        if let (Some(target), Some(bounds)) = (target, node.transformed_bounds(self)) {
            if let Some(bounds) = bounds.to_non_zero_rect() {
                state.transform = map_rect_to_rect(bounds, target);
            }
        }

        // Replay the ancestor styles root-first so paints and fonts
        // inherit, but keep the element positioned by `target` alone.
        let original_transform = state.transform;
        let chain: Vec<Node> = node.ancestors().skip(1).collect();
        for ancestor in chain.iter().rev() {
            state = cascade(&ancestor.borrow().style, &state, self);
        }
        state.transform = original_transform;

        let mut ctx = DrawContext::with_state(surface, shaper, state);
        node::draw(&node, self, &mut ctx);
    }

    /// Bounds of an element by id, falling back to the whole document
    /// when the id is unknown.
    pub fn bounds_of(&self, id: &str) -> Option<Rect> {
        match self.node_by_id(id) {
            Some(node) => node.transformed_bounds(self),
            None => self.root.transformed_bounds(self),
        }
    }

    /// The transform mapping an element's coordinates into document
    /// coordinates: the product of its ancestors' transforms.
    pub fn transform_of(&self, id: &str) -> Option<Transform> {
        let node = self.node_by_id(id)?;
        let mut ts = Transform::identity();
        let chain: Vec<Node> = node.ancestors().skip(1).collect();
        for ancestor in chain.iter().rev() {
            if let Some(t) = ancestor.borrow().style.transform {
                ts = ts.pre_concat(t);
            }
        }
        Some(ts)
    }

    fn source_rect(&self, source: Option<NonZeroRect>) -> NonZeroRect {
        source
            .or(self.view_box)
            .unwrap_or_else(|| self.size.to_non_zero_rect(0.0, 0.0))
    }

    fn draw_viewport_fill(&self, ctx: &mut DrawContext, source: NonZeroRect) {
        let paint = match self.root.borrow().style.viewport_fill {
            Some(ref paint) => paint.clone(),
            None => return,
        };
        let fill = match resolve_paint(self, &paint) {
            Some(f) => f,
            None => return,
        };

        let mut state = ctx.state().clone();
        state.fill = Some(fill);
        state.stroke = None;
        let path = PathBuilder::from_rect(source.to_rect());
        ctx.surface().draw_path(&path, &state.fill_pass());
    }

    /// Loads a document from a file, transparently decompressing
    /// gzip-compressed content.
    pub fn load_file(
        path: &std::path::Path,
        parser: &dyn DocumentParser,
    ) -> Result<Document, Error> {
        let data = std::fs::read(path)?;
        Document::load_data(&data, parser)
    }

    /// Loads a document from a reader.
    pub fn load_reader(
        reader: &mut dyn Read,
        parser: &dyn DocumentParser,
    ) -> Result<Document, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Document::load_data(&data, parser)
    }

    /// Loads a document from raw bytes: sniffs the gzip magic, checks
    /// the content actually looks like SVG, then hands the text to the
    /// parser.
    pub fn load_data(data: &[u8], parser: &dyn DocumentParser) -> Result<Document, Error> {
        let text = decode_source(data)?;
        parser.parse(&text)
    }
}

impl Clone for Document {
    /// Deep-copies the tree and re-links the named-node table onto the
    /// copies; named styles and fonts are immutable and stay shared.
    fn clone(&self) -> Self {
        let root = self.root.make_deep_copy();

        let mut named_nodes = HashMap::new();
        for node in root.descendants() {
            let id = node.borrow().id.clone();
            if !id.is_empty() {
                named_nodes.insert(id, node.clone());
            }
        }

        Document {
            root,
            size: self.size,
            width_percent: self.width_percent,
            height_percent: self.height_percent,
            view_box: self.view_box,
            named_nodes,
            named_styles: self.named_styles.clone(),
            fonts: self.fonts.clone(),
            xml_classes: self.xml_classes.clone(),
            animated: self.animated,
            animation_duration: self.animation_duration,
            fps: self.fps,
            time: Cell::new(self.time.get()),
            first_render: Cell::new(true),
        }
    }
}

/// The transform scaling `source` into `target`; `target` defaults to
/// the source size at the origin, which recovers user coordinates.
fn map_source_to_target(target: Option<NonZeroRect>, source: NonZeroRect) -> Transform {
    let target =
        match target.or_else(|| NonZeroRect::from_xywh(0.0, 0.0, source.width(), source.height())) {
            Some(t) => t,
            None => return Transform::identity(),
        };
    map_rect_to_rect(source, target)
}

fn decode_source(data: &[u8]) -> Result<String, Error> {
    let raw;
    let bytes = if data.starts_with(&[0x1f, 0x8b]) {
        let mut decoded = Vec::with_capacity(data.len() * 2);
        let mut decoder = flate2::read::GzDecoder::new(data);
        decoder
            .read_to_end(&mut decoded)
            .map_err(|_| Error::MalformedGZip)?;
        raw = decoded;
        raw.as_slice()
    } else {
        data
    };

    let text = std::str::from_utf8(bytes).map_err(|_| Error::NotAnUtf8Str)?;
    if !is_svg_source(text) {
        return Err(Error::NotAnSvg);
    }
    Ok(text.to_string())
}

fn is_svg_source(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<?xml")
        || text.starts_with("<svg")
        || text.starts_with("<!--")
        || text.starts_with("<!DOCTYPE svg")
}

/// Applies a node's set properties over the inherited state.
///
/// This is the style cascade: every `Some` property overrides, every
/// `None` inherits. Paint references resolve through the document's
/// named tables here, so the output state is fully concrete.
pub(crate) fn cascade(style: &Style, parent: &PaintState, doc: &Document) -> PaintState {
    let mut state = parent.clone();

    if let Some(ts) = style.transform {
        state.transform = state.transform.pre_concat(ts);
    }

    if let Some(ref fill) = style.fill {
        if let Some(ref paint) = fill.paint {
            state.fill = resolve_paint(doc, paint);
        }
        if let Some(opacity) = fill.opacity {
            state.fill_opacity = opacity;
        }
        if let Some(rule) = fill.rule {
            state.fill_rule = rule;
        }
    }

    if let Some(ref stroke) = style.stroke {
        if let Some(ref paint) = stroke.paint {
            state.stroke = resolve_paint(doc, paint);
        }
        if let Some(width) = stroke.width {
            state.stroke_width = width;
        }
        if let Some(opacity) = stroke.opacity {
            state.stroke_opacity = opacity;
        }
        if let Some(ref dashes) = stroke.dash_array {
            state.dash_array = dashes.clone();
        }
        if let Some(offset) = stroke.dash_offset {
            state.dash_offset = offset;
        }
        if let Some(cap) = stroke.line_cap {
            state.line_cap = cap;
        }
        if let Some(join) = stroke.line_join {
            state.line_join = join;
        }
        if let Some(limit) = stroke.miter_limit {
            state.miter_limit = limit;
        }
    }

    if let Some(ref font) = style.font {
        if let Some(ref family) = font.family {
            state.font.family = family.clone();
        }
        if let Some(size) = font.size {
            state.font.size = size.get();
        }
        if let Some(font_style) = font.style {
            state.font.style = font_style;
        }
        if let Some(weight) = font.weight {
            state.font.weight = weight;
        }
        if let Some(variant) = font.variant {
            state.font.variant = variant;
        }
        if let Some(anchor) = font.anchor {
            state.text_anchor = anchor;
        }
    }

    if let Some(opacity) = style.opacity {
        state.opacity *= opacity.get();
    }
    if let Some(comp_op) = style.comp_op {
        state.comp_op = comp_op;
    }

    state
}

/// Resolves a paint value against the document's named tables.
///
/// Unresolvable references degrade to no paint.
pub(crate) fn resolve_paint(doc: &Document, paint: &Paint) -> Option<ResolvedPaint> {
    match paint {
        Paint::None => None,
        Paint::Color(color) => Some(ResolvedPaint::Color(*color, Opacity::ONE)),
        Paint::Ref(id) => resolve_server(doc, id),
    }
}

fn resolve_server(doc: &Document, id: &str) -> Option<ResolvedPaint> {
    if let Some(style) = doc.named_styles.get(id) {
        return match style.as_ref() {
            NamedStyle::Solid(solid) => Some(ResolvedPaint::Color(solid.color, solid.opacity)),
            NamedStyle::Gradient { base, kind } => {
                let stops = resolve_stops(doc, base, 0);
                if stops.is_empty() {
                    log::warn!("gradient '{}' has no stops", id);
                    return None;
                }
                Some(ResolvedPaint::Gradient(Rc::new(ResolvedGradient {
                    kind: kind.clone(),
                    units: base.units,
                    transform: base.transform,
                    spread_method: base.spread_method,
                    stops,
                })))
            }
        };
    }

    if let Some(node) = doc.node_by_id(id) {
        if matches!(node.borrow().kind, Kind::Pattern(_)) {
            return Some(ResolvedPaint::Pattern(node));
        }
    }

    log::warn!("paint server '{}' is unresolved", id);
    None
}

/// Follows `xlink:href` stop links, depth-limited against cycles.
fn resolve_stops(doc: &Document, base: &crate::style::BaseGradient, depth: u8) -> Vec<crate::style::Stop> {
    if !base.stops.is_empty() {
        return base.stops.clone();
    }
    if depth > 32 {
        return Vec::new();
    }

    let link = match base.stop_link {
        Some(ref id) => id,
        None => return Vec::new(),
    };
    match doc.named_styles.get(link).map(Rc::as_ref) {
        Some(NamedStyle::Gradient { base, .. }) => resolve_stops(doc, base, depth + 1),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Fill};

    #[test]
    fn svg_source_sniffing() {
        assert!(is_svg_source("<?xml version=\"1.0\"?><svg/>"));
        assert!(is_svg_source("  <svg xmlns=\"x\"/>"));
        assert!(is_svg_source("<!-- header --><svg/>"));
        assert!(is_svg_source("<!DOCTYPE svg PUBLIC \"x\"><svg/>"));
        assert!(!is_svg_source("PK\u{3}\u{4}"));
        assert!(!is_svg_source("<html></html>"));
    }

    #[test]
    fn decode_rejects_truncated_gzip() {
        let err = decode_source(&[0x1f, 0x8b, 0x00]).unwrap_err();
        assert!(matches!(err, Error::MalformedGZip));
    }

    #[test]
    fn cascade_overrides_set_and_inherits_unset() {
        let doc = Document::new(Size::from_wh(100.0, 100.0).unwrap());
        let parent = PaintState::default();

        let mut style = Style::default();
        style.fill = Some(Fill {
            paint: Some(Paint::Color(Color::new_rgb(255, 0, 0))),
            ..Fill::default()
        });

        let state = cascade(&style, &parent, &doc);
        match state.fill {
            Some(ResolvedPaint::Color(c, _)) => assert_eq!(c, Color::new_rgb(255, 0, 0)),
            _ => panic!("fill not resolved"),
        }
        // Unset properties keep their inherited values.
        assert_eq!(state.font.family, parent.font.family);
        assert_eq!(state.stroke_width, parent.stroke_width);
        assert!(state.stroke.is_none());
    }

    #[test]
    fn group_opacity_accumulates() {
        let doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());
        let mut style = Style::default();
        style.opacity = Opacity::new(0.5);

        let state = cascade(&style, &PaintState::default(), &doc);
        let nested = cascade(&style, &state, &doc);
        assert!((nested.opacity - 0.25).abs() < 1e-6);
    }

    #[test]
    fn frame_roundtrip() {
        let mut doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());
        doc.set_animated(true, 2.0);
        doc.set_frames_per_second(30);

        doc.set_current_frame(30);
        let frame = doc.current_frame();
        assert!((29..=31).contains(&frame), "got {}", frame);
    }
}
