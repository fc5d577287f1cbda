// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structure nodes: `g`, `defs`, `switch`, `marker`, `pattern`, `clipPath`.

use std::cell::RefCell;
use std::rc::Rc;

use tiny_skia_path::{NonZeroRect, Path, PathBuilder, Point, Rect, Size, Transform};

use crate::document::Document;
use crate::geom::ApproxZeroUlps;
use crate::node::{self, Kind, Node, NodeExt};
use crate::state::{ClipLayer, DrawContext, PaintState};
use crate::style::{FillRule, Units};

/// The SVG Tiny 1.2 feature set this implementation supports.
///
/// Replaces the original's generated perfect-hash table; the list is small
/// enough for a sorted-slice lookup.
const SUPPORTED_FEATURES: &[&str] = &[
    "http://www.w3.org/Graphics/SVG/feature/1.2/#ConditionalProcessing",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#ConditionalProcessingAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#CoreAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Extensibility",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#ExternalResourcesRequiredAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Font",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Gradient",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#GraphicsAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Hyperlinking",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Image",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#OpacityAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#PaintAttribute",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Prefetch",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#SVG",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#SVG-static",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Shape",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#SolidColor",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Structure",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#Text",
    "http://www.w3.org/Graphics/SVG/feature/1.2/#XlinkAttribute",
];

/// Checks that a `requiredFeatures` entry names a supported feature.
pub(crate) fn is_supported_svg_feature(feature: &str) -> bool {
    SUPPORTED_FEATURES.binary_search(&feature).is_ok()
}

/// A `switch` element.
///
/// Captures the system language at construction; `systemLanguage` entries
/// match when they start with the language's primary subtag.
#[derive(Clone, PartialEq, Debug)]
pub struct Switch {
    system_language: String,
    language_prefix: String,
}

impl Switch {
    /// Creates a switch bound to the given system language, e.g. `en-US`.
    pub fn with_language(language: &str) -> Self {
        let language = language.replace('_', "-");
        let prefix = match language.find('-') {
            Some(idx) => language[..idx].to_string(),
            None => language.clone(),
        };
        Switch {
            system_language: language,
            language_prefix: prefix,
        }
    }

    /// The captured system language.
    pub fn system_language(&self) -> &str {
        &self.system_language
    }

    pub(crate) fn language_prefix(&self) -> &str {
        &self.language_prefix
    }
}

impl Default for Switch {
    /// Captures the language from the `LANG` environment variable,
    /// falling back to `en`.
    fn default() -> Self {
        let lang = std::env::var("LANG").unwrap_or_default();
        let lang = lang.split('.').next().unwrap_or("");
        if lang.is_empty() {
            Switch::with_language("en")
        } else {
            Switch::with_language(lang)
        }
    }
}

pub(crate) fn draw_group(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    node::apply_style(node, doc, ctx);
    for child in node.children() {
        node::draw(&child, doc, ctx);
    }
    node::revert_style(ctx);
}

pub(crate) fn draw_switch(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    let data = node.borrow();
    let prefix = match data.kind {
        Kind::Switch(ref switch) => switch.language_prefix().to_string(),
        _ => return,
    };

    node::apply_style(node, doc, ctx);
    for child in node.children() {
        let qualifies = {
            let child_data = child.borrow();
            child_data.should_render() && child_data.conditions.satisfied(&prefix)
        };
        if qualifies {
            node::draw(&child, doc, ctx);
            break;
        }
    }
    node::revert_style(ctx);
}

/// Marker coordinate interpretation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MarkerUnits {
    /// Scale the marker by the referencing shape's stroke width.
    StrokeWidth,
    /// Draw the marker in user coordinates.
    UserSpaceOnUse,
}

impl Default for MarkerUnits {
    fn default() -> Self {
        Self::StrokeWidth
    }
}

/// Marker orientation.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MarkerOrient {
    /// Rotate to the vertex's tangent-bisector angle.
    Auto,
    /// A fixed angle in clockwise degrees.
    Angle(f32),
}

impl Default for MarkerOrient {
    fn default() -> Self {
        Self::Angle(0.0)
    }
}

/// A `marker` element, stamped at shape vertices.
#[derive(Clone, PartialEq, Debug)]
pub struct Marker {
    /// The `refX`/`refY` reference point.
    pub ref_point: Point,
    /// The `markerWidth`/`markerHeight` size.
    pub size: Size,
    /// The `markerUnits` mode.
    pub units: MarkerUnits,
    /// The `orient` value.
    pub orient: MarkerOrient,
    /// The `viewBox` rectangle, if set.
    pub view_box: Option<NonZeroRect>,
}

impl Default for Marker {
    fn default() -> Self {
        Marker {
            ref_point: Point::zero(),
            size: Size::from_wh(3.0, 3.0).unwrap(),
            units: MarkerUnits::default(),
            orient: MarkerOrient::default(),
            view_box: None,
        }
    }
}

/// Draws a marker at `point`, rotated by `angle` (clockwise degrees) and
/// scaled by `stroke_width` unless the marker uses user-space units.
pub(crate) fn draw_marker(
    marker_node: &Node,
    doc: &Document,
    ctx: &mut DrawContext,
    point: Point,
    angle: f32,
    stroke_width: f32,
) {
    let (ref_point, size, units, orient, view_box) = {
        let data = marker_node.borrow();
        match data.kind {
            Kind::Marker(ref m) => (m.ref_point, m.size, m.units, m.orient, m.view_box),
            _ => return,
        }
    };

    let stroke_width = match units {
        MarkerUnits::UserSpaceOnUse => 1.0,
        MarkerUnits::StrokeWidth => stroke_width,
    };
    let angle = match orient {
        MarkerOrient::Auto => angle,
        MarkerOrient::Angle(a) => a,
    };

    let mut scale = 1.0;
    if let Some(vb) = view_box {
        scale = (size.height() / vb.height()).min(size.width() / vb.width());
    }

    let mut state = ctx.state().clone();
    state.transform = state
        .transform
        .pre_translate(point.x, point.y)
        .pre_concat(rotate_transform(angle))
        .pre_scale(stroke_width, stroke_width)
        .pre_translate(-ref_point.x * scale, -ref_point.y * scale)
        .pre_scale(scale, scale);

    if let Some(vb) = view_box {
        let path = PathBuilder::from_rect(vb.to_rect());
        if let Some(device) = path.transform(state.transform) {
            state.clip = Some(Rc::new(ClipLayer {
                shapes: vec![ClipShape {
                    path: device,
                    rule: FillRule::NonZero,
                    intersect: Vec::new(),
                }],
                prev: state.clip.take(),
            }));
        }
    }

    ctx.push(state);
    node::apply_style(marker_node, doc, ctx);
    for child in marker_node.children() {
        node::draw(&child, doc, ctx);
    }
    node::revert_style(ctx);
    ctx.pop();
}

/// A clockwise rotation in screen coordinates.
fn rotate_transform(degrees: f32) -> Transform {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Transform::from_row(cos, sin, -sin, cos, 0.0, 0.0)
}

/// A `pattern` paint server.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pattern {
    /// Coordinate system of `rect`.
    pub units: Units,
    /// Coordinate system of the pattern content.
    pub content_units: Units,
    /// The tile rectangle; fractions of the consumer's bounding box when
    /// `units` is object-bounding-box.
    pub rect: NonZeroRect,
}

/// Fills the consumer's path region by tiling the pattern's content.
///
/// Invoked by shape nodes after their own style has been reverted, so the
/// active state is the consumer's parent state.
pub(crate) fn draw_tile(
    pattern_node: &Node,
    doc: &Document,
    ctx: &mut DrawContext,
    consumer_path: &Path,
    target_bounds: Rect,
) {
    let pattern = {
        let data = pattern_node.borrow();
        match data.kind {
            Kind::Pattern(ref p) => *p,
            _ => return,
        }
    };

    let mut bounds = pattern.rect.to_rect();
    if pattern.units == Units::ObjectBoundingBox {
        bounds = match Rect::from_xywh(
            pattern.rect.x() * target_bounds.width(),
            pattern.rect.y() * target_bounds.height(),
            pattern.rect.width() * target_bounds.width(),
            pattern.rect.height() * target_bounds.height(),
        ) {
            Some(r) => r,
            None => return,
        };
    }

    let consumer_transform = ctx.state().transform;
    let style_transform = pattern_node.borrow().style.transform;

    node::apply_style(pattern_node, doc, ctx);

    let mut state = ctx.state().clone();

    // The consumer's outline confines the tiling, intersected with any
    // clip the pattern itself declared.
    if let Some(device) = consumer_path.clone().transform(consumer_transform) {
        state.clip = Some(Rc::new(ClipLayer {
            shapes: vec![ClipShape {
                path: device,
                rule: state.fill_rule,
                intersect: Vec::new(),
            }],
            prev: state.clip.take(),
        }));
    }

    let mut anchor_x = bounds.x();
    let mut anchor_y = bounds.y();
    if pattern.units == Units::ObjectBoundingBox {
        anchor_x += target_bounds.x();
        anchor_y += target_bounds.y();
    }

    let region = rect_for_tile(doc.size(), style_transform, bounds, anchor_x, anchor_y);
    let region = match NonZeroRect::from_xywh(
        region.x(),
        region.y(),
        region.width(),
        region.height(),
    ) {
        Some(r) => r,
        None => {
            node::revert_style(ctx);
            return;
        }
    };

    state.transform = state.transform.pre_translate(anchor_x, anchor_y);

    let tile = match Size::from_wh(bounds.width(), bounds.height()) {
        Some(s) => s,
        None => {
            node::revert_style(ctx);
            return;
        }
    };

    let shaper = ctx.shaper();
    let pattern_target = if pattern.content_units == Units::ObjectBoundingBox {
        NonZeroRect::from_xywh(
            target_bounds.x(),
            target_bounds.y(),
            target_bounds.width(),
            target_bounds.height(),
        )
    } else {
        None
    };

    let children: Vec<Node> = pattern_node.children().collect();
    let mut content = |surface: &mut dyn crate::Surface| {
        let mut tile_ctx = DrawContext::new(surface, shaper);
        tile_ctx.pattern_target = pattern_target;
        for child in &children {
            node::draw(child, doc, &mut tile_ctx);
        }
    };

    ctx.surface().draw_tiles(region, tile, &state, &mut content);
    node::revert_style(ctx);
}

/// Computes the tiling rectangle that covers the whole document from the
/// tile anchored at `(pattern_x, pattern_y)`, compensating for the
/// pattern transform's offset, shear and down-scale.
pub(crate) fn rect_for_tile(
    doc_size: Size,
    transform: Option<Transform>,
    tile_bounds: Rect,
    pattern_x: f32,
    pattern_y: f32,
) -> Rect {
    let svg_w = doc_size.width();
    let svg_h = doc_size.height();
    let (mut x, mut y, mut w, mut h) = (0.0f32, 0.0f32, svg_w, svg_h);

    // Keeps the right/bottom edge fixed, like QRectF::setX/setY.
    fn set_left(x: &mut f32, w: &mut f32, new_x: f32) {
        *w = (*x + *w) - new_x;
        *x = new_x;
    }

    let mut offset_x = pattern_x;
    let mut offset_y = pattern_y;
    if let Some(ts) = transform {
        offset_x += ts.tx;
        offset_y += ts.ty;
    }

    let mut extend_w = 0.0;
    while offset_x.abs() > extend_w {
        extend_w += svg_w;
    }
    if !extend_w.approx_zero_ulps(4) {
        set_left(&mut x, &mut w, -extend_w);
        w += extend_w;
    }

    let mut extend_h = 0.0;
    while offset_y.abs() > extend_h {
        extend_h += svg_h;
    }
    if !extend_h.approx_zero_ulps(4) {
        set_left(&mut y, &mut h, -extend_h);
        h += extend_h;
    }

    if let Some(ts) = transform {
        if !ts.sy.approx_zero_ulps(4) {
            // Horizontal shear: kx = sy * tan(angle).
            let extend = tile_bounds.height() * (ts.kx / ts.sy);
            let new_x = x - extend.abs();
            set_left(&mut x, &mut w, new_x);
            w += extend.abs();
        }

        if !ts.sx.approx_zero_ulps(4) {
            // Vertical shear: ky = sx * tan(angle).
            let extend = tile_bounds.width() * (ts.ky / ts.sx);
            let new_y = y - extend.abs();
            set_left(&mut y, &mut h, new_y);
            h += extend.abs();
        }

        // A down-scaling transform shrinks the painted area, so grow the
        // rectangle around the document center to compensate.
        let m11 = ts.sx.abs();
        if m11 < 1.0 && m11 > 0.0 && !m11.approx_zero_ulps(4) {
            let scale = 1.0 / m11;
            let old_w = w;
            let new_x = (x - svg_w / 2.0) * scale + svg_w / 2.0;
            set_left(&mut x, &mut w, new_x);
            w = old_w * scale;
        }

        let m22 = ts.sy.abs();
        if m22 < 1.0 && m22 > 0.0 && !m22.approx_zero_ulps(4) {
            let scale = 1.0 / m22;
            let old_h = h;
            let new_y = (y - svg_h / 2.0) * scale + svg_h / 2.0;
            set_left(&mut y, &mut h, new_y);
            h = old_h * scale;
        }
    }

    Rect::from_xywh(x, y, w, h).unwrap_or(tile_bounds)
}

/// One resolved shape of a clip list.
///
/// The effective region of a list is the union of its shapes, each
/// additionally intersected with every region in its `intersect` list.
#[derive(Clone, Debug)]
pub struct ClipShape {
    /// The geometry.
    pub path: Path,
    /// The effective fill rule.
    pub rule: FillRule,
    /// Regions this shape is intersected with; each entry is the union
    /// of its own shapes.
    pub intersect: Vec<Vec<ClipShape>>,
}

impl ClipShape {
    fn map(&self, ts: Transform) -> Option<ClipShape> {
        let path = self.path.clone().transform(ts)?;
        let mut intersect = Vec::with_capacity(self.intersect.len());
        for group in &self.intersect {
            intersect.push(group.iter().filter_map(|s| s.map(ts)).collect());
        }
        Some(ClipShape {
            path,
            rule: self.rule,
            intersect,
        })
    }
}

/// A `clipPath` element.
#[derive(Clone, Debug)]
pub struct ClipPath {
    /// The `clipPathUnits` mode.
    pub units: Units,
    /// Memoized result of the clip-list resolution.
    resolved: RefCell<Option<Rc<Vec<ClipShape>>>>,
}

impl ClipPath {
    /// Creates a clip path with the given units.
    pub fn new(units: Units) -> Self {
        ClipPath {
            units,
            resolved: RefCell::new(None),
        }
    }

    /// Drops the memoized clip list. Parse-time mutation of the children
    /// must call this.
    pub fn invalidate(&self) {
        *self.resolved.borrow_mut() = None;
    }
}

impl Default for ClipPath {
    fn default() -> Self {
        ClipPath::new(Units::UserSpaceOnUse)
    }
}

/// Applies the clip path referenced by `clip_id` onto `state`.
///
/// An unresolvable reference is a no-op; a resolvable but empty clip
/// list clips everything away.
pub(crate) fn apply_clip(
    state: &mut PaintState,
    clip_id: &str,
    consumer: &Node,
    doc: &Document,
) {
    let clip_node = match doc.node_by_id(clip_id) {
        Some(n) if matches!(n.borrow().kind, Kind::ClipPath(_)) => n,
        _ => {
            log::warn!("clip-path reference '{}' is unresolved", clip_id);
            return;
        }
    };

    let bounds = consumer.transformed_bounds(doc);
    let shapes = clip_shapes_scaled(&clip_node, doc, bounds);

    let device: Vec<ClipShape> = shapes
        .iter()
        .filter_map(|s| s.map(state.transform))
        .collect();
    state.clip = Some(Rc::new(ClipLayer {
        shapes: device,
        prev: state.clip.take(),
    }));
}

/// Returns the clip node's resolved shapes, scaled into `obb_bounds`
/// when the clip uses object-bounding-box units.
fn clip_shapes_scaled(clip_node: &Node, doc: &Document, obb_bounds: Option<Rect>) -> Vec<ClipShape> {
    let list = resolved_clip_list(clip_node, doc);

    let units = match clip_node.borrow().kind {
        Kind::ClipPath(ref cp) => cp.units,
        _ => return Vec::new(),
    };

    if units == Units::ObjectBoundingBox {
        let bounds = match obb_bounds {
            Some(b) => b,
            None => return Vec::new(),
        };
        let ts = Transform::from_row(
            bounds.width(),
            0.0,
            0.0,
            bounds.height(),
            bounds.x(),
            bounds.y(),
        );
        list.iter().filter_map(|s| s.map(ts)).collect()
    } else {
        list.as_ref().clone()
    }
}

/// Resolves and memoizes the clip node's path list: one shape per direct
/// child, intersected with the child's and the clip node's own nested
/// clip styles, mapped through transforms, and tagged with a fill rule.
fn resolved_clip_list(clip_node: &Node, doc: &Document) -> Rc<Vec<ClipShape>> {
    {
        let data = clip_node.borrow();
        if let Kind::ClipPath(ref cp) = data.kind {
            if let Some(list) = cp.resolved.borrow().as_ref() {
                return list.clone();
            }
        }
        if data.recursing.get() {
            return Rc::new(Vec::new());
        }
        data.recursing.set(true);
    }

    let list = Rc::new(parse_clip_path_list(clip_node, doc));

    let data = clip_node.borrow();
    data.recursing.set(false);
    if let Kind::ClipPath(ref cp) = data.kind {
        *cp.resolved.borrow_mut() = Some(list.clone());
    }
    list
}

fn parse_clip_path_list(clip_node: &Node, doc: &Document) -> Vec<ClipShape> {
    let (clip_transform, clip_clip_id, clip_rule) = {
        let data = clip_node.borrow();
        (
            data.style.transform,
            data.style.clip_path.clone(),
            data.style.clip_rule.unwrap_or_default(),
        )
    };

    // The clip node's own nested clip style constrains every entry.
    let own_constraint: Option<Vec<ClipShape>> = clip_clip_id.as_deref().and_then(|id| {
        let nested = doc.node_by_id(id)?;
        if !matches!(nested.borrow().kind, Kind::ClipPath(_)) {
            return None;
        }
        let bounds = clip_node.transformed_bounds(doc);
        Some(clip_shapes_scaled(&nested, doc, bounds))
    });

    let mut list = Vec::new();
    for child in clip_node.children() {
        let geometry = match child.borrow().kind {
            Kind::Use(_) => use_clip_path(&child, doc),
            _ => node_clip_path(&child, doc),
        };
        // A geometry-less child contributes nothing to the region.
        let path = match geometry {
            Some(p) => p,
            None => continue,
        };

        let mut shape = ClipShape {
            path,
            rule: clip_rule,
            intersect: Vec::new(),
        };

        // Intersect with the child's own nested clip style.
        let child_data = child.borrow();
        if let Some(ref id) = child_data.style.clip_path {
            if let Some(nested) = doc.node_by_id(id) {
                if matches!(nested.borrow().kind, Kind::ClipPath(_)) {
                    let bounds = child.transformed_bounds(doc);
                    shape
                        .intersect
                        .push(clip_shapes_scaled(&nested, doc, bounds));
                }
            }
        }
        if let Some(ref constraint) = own_constraint {
            shape.intersect.push(constraint.clone());
        }

        // The clip node's transform applies to every entry; a child with
        // its own, different transform is mapped through that as well.
        if let Some(ts) = clip_transform {
            shape = match shape.map(ts) {
                Some(s) => s,
                None => continue,
            };
        }
        if let Some(child_ts) = child_data.style.transform {
            if Some(child_ts) != clip_transform {
                shape = match shape.map(child_ts) {
                    Some(s) => s,
                    None => continue,
                };
            }
        }

        if let Some(rule) = child_data.style.clip_rule {
            shape.rule = rule;
        }

        list.push(shape);
    }

    list
}

/// Builds the native geometry path of a clip-list child.
fn node_clip_path(node: &Node, doc: &Document) -> Option<Path> {
    let data = node.borrow();
    if !data.should_render() {
        return None;
    }

    match data.kind {
        Kind::Rect(ref rect) => Some(PathBuilder::from_rect(rect.rect.to_rect())),
        Kind::Ellipse(ref ellipse) => {
            let mut pb = PathBuilder::new();
            pb.push_oval(ellipse.rect.to_rect());
            pb.finish()
        }
        Kind::Path(ref path) => Some(path.data.as_ref().clone()),
        Kind::Polygon(ref poly) => {
            let mut pb = PathBuilder::new();
            push_polygon(&mut pb, &poly.points, true);
            pb.finish()
        }
        Kind::Text(_) => crate::text::clip_outline(node, doc),
        _ => None,
    }
}

/// Resolves a `use` clip-list child: the target's geometry (or the union
/// of its children when the target is a container), translated by the
/// `use` offset.
fn use_clip_path(use_node: &Node, doc: &Document) -> Option<Path> {
    let (link_id, start) = match use_node.borrow().kind {
        Kind::Use(ref use_data) => (use_data.link.clone(), use_data.start),
        _ => return None,
    };

    let link = doc.node_by_id(&link_id)?;

    let mut pb = PathBuilder::new();
    match link.borrow().kind {
        Kind::Group | Kind::Switch(_) => {
            for child in link.children() {
                if let Some(p) = node_clip_path(&child, doc) {
                    push_path(&mut pb, &p);
                }
            }
        }
        _ => {
            if let Some(p) = node_clip_path(&link, doc) {
                push_path(&mut pb, &p);
            }
        }
    }

    let path = pb.finish()?;
    path.transform(Transform::from_translate(start.x, start.y))
}

/// Appends all segments of `path` to the builder.
pub(crate) fn push_path(pb: &mut PathBuilder, path: &Path) {
    for seg in path.segments() {
        match seg {
            tiny_skia_path::PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            tiny_skia_path::PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
            tiny_skia_path::PathSegment::QuadTo(p1, p) => pb.quad_to(p1.x, p1.y, p.x, p.y),
            tiny_skia_path::PathSegment::CubicTo(p1, p2, p) => {
                pb.cubic_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y)
            }
            tiny_skia_path::PathSegment::Close => pb.close(),
        }
    }
}

/// Appends a polygon/polyline outline.
pub(crate) fn push_polygon(pb: &mut PathBuilder, points: &[Point], close: bool) {
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        pb.move_to(first.x, first.y);
        for p in iter {
            pb.line_to(p.x, p.y);
        }
        if close {
            pb.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_lookup() {
        assert!(is_supported_svg_feature(
            "http://www.w3.org/Graphics/SVG/feature/1.2/#Shape"
        ));
        assert!(!is_supported_svg_feature(
            "http://www.w3.org/Graphics/SVG/feature/1.2/#Animation"
        ));
        assert!(!is_supported_svg_feature("Shape"));
    }

    #[test]
    fn switch_language_prefix() {
        let switch = Switch::with_language("en-GB");
        assert_eq!(switch.language_prefix(), "en");
        assert_eq!(switch.system_language(), "en-GB");

        let switch = Switch::with_language("fr");
        assert_eq!(switch.language_prefix(), "fr");
    }

    #[test]
    fn tile_rect_covers_document_without_transform() {
        let region = rect_for_tile(
            Size::from_wh(100.0, 100.0).unwrap(),
            None,
            Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(),
            0.0,
            0.0,
        );
        assert_eq!(region, Rect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap());
    }

    #[test]
    fn tile_rect_extends_for_offset() {
        let region = rect_for_tile(
            Size::from_wh(100.0, 100.0).unwrap(),
            None,
            Rect::from_xywh(25.0, 0.0, 10.0, 10.0).unwrap(),
            25.0,
            0.0,
        );
        // The anchor offset forces one whole document width of slack on
        // both sides.
        assert!(region.left() <= -100.0);
        assert!(region.right() >= 100.0);
        assert!(region.top() <= 0.0);
        assert!(region.bottom() >= 100.0);
    }

    #[test]
    fn tile_rect_covers_viewport_under_scale_down_and_skew() {
        let ts = Transform::from_row(0.5, 0.2, 0.3, 0.5, 10.0, 5.0);
        let region = rect_for_tile(
            Size::from_wh(200.0, 150.0).unwrap(),
            Some(ts),
            Rect::from_xywh(20.0, 10.0, 30.0, 30.0).unwrap(),
            20.0,
            10.0,
        );

        // Mapping the computed region through the pattern transform must
        // still cover the full document viewport.
        let mapped = region.transform(ts).unwrap();
        assert!(mapped.left() <= 0.0);
        assert!(mapped.top() <= 0.0);
        assert!(mapped.right() >= 200.0);
        assert!(mapped.bottom() >= 150.0);
    }
}
