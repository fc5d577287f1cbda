// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Graphics leaves: shapes, images and `use` references.

use std::rc::Rc;
use std::sync::Arc;

use tiny_skia_path::{NonZeroRect, PathBuilder, Point};

use crate::document::Document;
use crate::node::{self, Kind, Node, NodeExt};
use crate::state::{DrawContext, PaintState, ResolvedPaint, TextShaper};
use crate::structure;

/// A `path` shape.
#[derive(Clone, Debug)]
pub struct Path {
    /// The geometry, shared with clip-path resolution.
    pub data: Rc<tiny_skia_path::Path>,
    /// Vertex markers.
    pub markers: Markers,
}

impl Path {
    /// Creates a path shape from pre-built geometry.
    pub fn new(data: Rc<tiny_skia_path::Path>) -> Self {
        Path {
            data,
            markers: Markers::default(),
        }
    }
}

/// A `rect` shape.
#[derive(Clone, Copy, Debug)]
pub struct Rect {
    /// The rectangle in user units.
    pub rect: NonZeroRect,
    /// Corner x-radius in user units; 0 is square.
    pub rx: f32,
    /// Corner y-radius in user units; 0 is square.
    pub ry: f32,
}

/// An `ellipse` or `circle` shape.
#[derive(Clone, Copy, Debug)]
pub struct Ellipse {
    /// The enclosing rectangle.
    pub rect: NonZeroRect,
    /// Whether the element was a `circle`. Affects serialization only.
    pub circle: bool,
}

/// A `line` shape. Stroke-only; lines have no interior.
#[derive(Clone, Debug)]
pub struct Line {
    /// Start point.
    pub p1: Point,
    /// End point.
    pub p2: Point,
    /// Vertex markers.
    pub markers: Markers,
}

/// A `polygon` or `polyline` shape.
#[derive(Clone, Debug)]
pub struct Poly {
    /// The vertex list.
    pub points: Vec<Point>,
    /// Vertex markers.
    pub markers: Markers,
}

/// Encoded raster image data.
#[derive(Clone, Debug)]
pub enum ImageData {
    /// A PNG file.
    Png(Arc<Vec<u8>>),
    /// A JPEG file.
    Jpeg(Arc<Vec<u8>>),
    /// A GIF file.
    Gif(Arc<Vec<u8>>),
}

impl ImageData {
    /// The MIME type of the encoded data.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageData::Png(_) => "image/png",
            ImageData::Jpeg(_) => "image/jpeg",
            ImageData::Gif(_) => "image/gif",
        }
    }

    /// The raw encoded bytes.
    pub fn data(&self) -> &[u8] {
        match self {
            ImageData::Png(ref d) | ImageData::Jpeg(ref d) | ImageData::Gif(ref d) => d,
        }
    }
}

/// An `image` element. The data stays encoded; decoding is the
/// surface's business.
#[derive(Clone, Debug)]
pub struct Image {
    /// Encoded image data.
    pub data: ImageData,
    /// Placement rectangle in user units.
    pub rect: NonZeroRect,
}

/// A `use` reference, resolved lazily by id.
#[derive(Clone, Debug)]
pub struct Use {
    /// The `x`/`y` offset.
    pub start: Point,
    /// Id of the referenced node.
    pub link: String,
}

/// The `marker-start`/`marker-mid`/`marker-end` references of a shape.
///
/// Ids are stored raw; resolution happens at draw time so that markers
/// defined after the shape still apply.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Markers {
    /// `marker-start`
    pub start: Option<String>,
    /// `marker-mid`
    pub mid: Option<String>,
    /// `marker-end`
    pub end: Option<String>,
}

impl Markers {
    /// Checks that no marker is referenced.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.mid.is_none() && self.end.is_none()
    }
}

/// Draws a graphics leaf: style application, fill and stroke passes,
/// markers, then a pattern tiling pass if the fill was a pattern.
pub(crate) fn draw(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    node::apply_style(node, doc, ctx);

    let mut state = ctx.state().clone();

    // Direct children of a pattern with object-bounding-box content
    // units draw their fractional coordinates scaled to the target.
    let ratio_scale = match ctx.pattern_target {
        Some(tb) if parent_is_pattern(node) => Some(tb),
        _ => None,
    };
    if let Some(tb) = ratio_scale {
        state.transform = state.transform.pre_scale(tb.width(), tb.height());
    }

    // A pattern fill suppresses the fill pass here; the tiling happens
    // after the style is reverted, under the parent state.
    let fill_pattern = match state.fill {
        Some(ResolvedPaint::Pattern(ref pattern)) => {
            let pattern = pattern.clone();
            state.fill = None;
            Some(pattern)
        }
        _ => None,
    };

    {
        let data = node.borrow();
        match data.kind {
            Kind::Path(ref path) => {
                if state.fill.is_some() {
                    ctx.surface().draw_path(&path.data, &state.fill_pass());
                }
                if state.stroke.is_some() {
                    ctx.surface().draw_path(&path.data, &state.stroke_pass());
                }
            }
            Kind::Rect(ref rect) => {
                if state.fill.is_some() {
                    ctx.surface()
                        .draw_rect(rect.rect, rect.rx, rect.ry, &state.fill_pass());
                }
                if state.stroke.is_some() {
                    ctx.surface()
                        .draw_rect(rect.rect, rect.rx, rect.ry, &state.stroke_pass());
                }
            }
            Kind::Ellipse(ref ellipse) => {
                if state.fill.is_some() {
                    ctx.surface().draw_ellipse(ellipse.rect, &state.fill_pass());
                }
                if state.stroke.is_some() {
                    ctx.surface()
                        .draw_ellipse(ellipse.rect, &state.stroke_pass());
                }
            }
            Kind::Line(ref line) => {
                if state.stroke.is_some() {
                    ctx.surface()
                        .draw_line(line.p1, line.p2, &state.stroke_pass());
                }
            }
            Kind::Polygon(ref poly) => {
                if state.fill.is_some() {
                    ctx.surface().draw_polygon(&poly.points, &state.fill_pass());
                }
                if state.stroke.is_some() {
                    ctx.surface()
                        .draw_polygon(&poly.points, &state.stroke_pass());
                }
            }
            Kind::Polyline(ref poly) => {
                // The interior of a polyline fills as a closed polygon;
                // only the stroke stays open.
                if state.fill.is_some() {
                    ctx.surface().draw_polygon(&poly.points, &state.fill_pass());
                }
                if state.stroke.is_some() {
                    ctx.surface()
                        .draw_polyline(&poly.points, &state.stroke_pass());
                }
            }
            Kind::Image(ref image) => {
                let mut state = state.clone();
                state.opacity *= state.fill_opacity.get();
                ctx.surface().draw_image(&image.data, image.rect, &state);
            }
            _ => {}
        }
    }

    node::revert_style(ctx);

    draw_markers(node, doc, ctx);

    if let Some(pattern) = fill_pattern {
        if let Some((path, bounds)) = fill_outline(node) {
            structure::draw_tile(&pattern, doc, ctx, &path, bounds);
        }
    }
}

fn parent_is_pattern(node: &Node) -> bool {
    node.parent()
        .map_or(false, |p| matches!(p.borrow().kind, Kind::Pattern(_)))
}

/// The shape's outline and bounds in its local space, used as the
/// pattern tiling region.
fn fill_outline(node: &Node) -> Option<(tiny_skia_path::Path, tiny_skia_path::Rect)> {
    let data = node.borrow();
    match data.kind {
        Kind::Rect(ref rect) => {
            let r = rect.rect.to_rect();
            Some((PathBuilder::from_rect(r), r))
        }
        Kind::Ellipse(ref ellipse) => {
            let mut pb = PathBuilder::new();
            pb.push_oval(ellipse.rect.to_rect());
            pb.finish().map(|p| (p, ellipse.rect.to_rect()))
        }
        Kind::Path(ref path) => {
            // A single-vertex path has no interior to tile.
            if path.data.segments().count() <= 1 {
                return None;
            }
            let bounds = path.data.compute_tight_bounds()?;
            Some((path.data.as_ref().clone(), bounds))
        }
        Kind::Polygon(ref poly) | Kind::Polyline(ref poly) => {
            let mut pb = PathBuilder::new();
            structure::push_polygon(&mut pb, &poly.points, false);
            let p = pb.finish()?;
            let bounds = p.compute_tight_bounds()?;
            Some((p, bounds))
        }
        _ => None,
    }
}

/// Stamps the resolved start/mid/end markers at the shape's vertices.
///
/// Runs after the shape's style is reverted, so markers draw under the
/// parent state like the rest of the referenced content does.
fn draw_markers(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    let (markers, apexes, stroke_width) = {
        let data = node.borrow();
        let markers = match data.kind {
            Kind::Path(ref p) => p.markers.clone(),
            Kind::Polygon(ref p) | Kind::Polyline(ref p) => p.markers.clone(),
            Kind::Line(ref l) => l.markers.clone(),
            _ => return,
        };
        if markers.is_empty() {
            return;
        }
        let apexes = match data.kind {
            Kind::Path(ref p) => path_apexes(&p.data),
            Kind::Polygon(ref p) => poly_apexes(&p.points, true),
            Kind::Polyline(ref p) => poly_apexes(&p.points, false),
            Kind::Line(ref l) => line_apexes(l),
            _ => return,
        };
        // Markers scale by the shape's own stroke width, 1 when unset.
        let stroke_width = data
            .style
            .stroke
            .as_ref()
            .and_then(|s| s.width)
            .map_or(1.0, |w| w.get());
        (markers, apexes, stroke_width)
    };

    if apexes.is_empty() {
        return;
    }

    if let Some(marker) = resolve_marker(node, doc, markers.start.as_deref()) {
        let (point, angle) = apexes[0];
        structure::draw_marker(&marker, doc, ctx, point, angle, stroke_width);
    }

    if apexes.len() > 2 {
        if let Some(marker) = resolve_marker(node, doc, markers.mid.as_deref()) {
            for &(point, angle) in &apexes[1..apexes.len() - 1] {
                structure::draw_marker(&marker, doc, ctx, point, angle, stroke_width);
            }
        }
    }

    if apexes.len() > 1 {
        if let Some(marker) = resolve_marker(node, doc, markers.end.as_deref()) {
            let (point, angle) = apexes[apexes.len() - 1];
            structure::draw_marker(&marker, doc, ctx, point, angle, stroke_width);
        }
    }
}

/// Resolves a marker reference, rejecting ids that name an ancestor of
/// the shape, which would recurse.
fn resolve_marker(node: &Node, doc: &Document, id: Option<&str>) -> Option<Node> {
    let id = id?;
    if id.is_empty() || node.ancestors().skip(1).any(|a| a.borrow().id == id) {
        return None;
    }
    let marker = doc.node_by_id(id)?;
    if matches!(marker.borrow().kind, Kind::Marker(_)) {
        Some(marker)
    } else {
        None
    }
}

/// The direction angle of `from -> to` in clockwise screen degrees.
fn direction_angle(from: Point, to: Point) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    // atan2 with negated y gives the y-up angle; screen angles run the
    // other way around.
    let up = (-dy).atan2(dx).to_degrees();
    (360.0 - up).rem_euclid(360.0)
}

/// The marker rotation at `point` between its neighbor vertices: the
/// incoming-edge bisector, rotated a quarter turn.
///
/// Degenerate neighbors fall back to the remaining edge's direction, or
/// to the origin ray when both coincide.
fn rotate_angle(left: Point, right: Point, point: Point) -> f32 {
    if right == point && left == point {
        return direction_angle(Point::zero(), point);
    }
    if left == point {
        return direction_angle(point, right);
    }
    if right == point {
        return direction_angle(left, point);
    }

    // Angles in y-up convention, like the bisector math expects.
    let a1 = (360.0 - direction_angle(left, point)).rem_euclid(360.0);
    let a2 = (360.0 - direction_angle(right, point)).rem_euclid(360.0);
    let delta = (a2 - a1).rem_euclid(360.0);
    let bisector = a1 + delta / 2.0;
    (360.0 - (bisector - 90.0)).rem_euclid(360.0)
}

fn line_apexes(line: &Line) -> Vec<(Point, f32)> {
    let angle = direction_angle(line.p1, line.p2);
    vec![(line.p1, angle), (line.p2, angle)]
}

/// Computes the vertex/angle list of a poly shape. A polygon closes
/// implicitly and duplicates its first apex at the end so that both
/// start and end markers stamp the seam.
fn poly_apexes(points: &[Point], polygon: bool) -> Vec<(Point, f32)> {
    if points.len() < 2 {
        return Vec::new();
    }

    let n = points.len();
    let closed = polygon || points[0] == points[n - 1];
    let mut target = Vec::with_capacity(n + 1);

    for i in 0..n {
        let point = points[i];
        let (left, right) = if i == 0 {
            (if closed { points[n - 1] } else { point }, points[1])
        } else if i == n - 1 {
            (points[i - 1], if closed { points[0] } else { point })
        } else {
            (points[i - 1], points[i + 1])
        };
        target.push((point, rotate_angle(left, right, point)));
    }

    if polygon {
        target.push(target[0]);
    }
    target
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ElKind {
    Move,
    Line,
    Curve,
    Data,
}

#[derive(Clone, Copy, Debug)]
struct El {
    pt: Point,
    kind: ElKind,
}

/// Expands a path into a flat element list: one entry per on-curve or
/// control point, with curves contributing three entries.
fn flatten_path(path: &tiny_skia_path::Path) -> Vec<El> {
    let mut els = Vec::new();
    let mut cur = Point::zero();
    let mut start = Point::zero();

    let mut push = |pt: Point, kind: ElKind| els.push(El { pt, kind });

    for seg in path.segments() {
        match seg {
            tiny_skia_path::PathSegment::MoveTo(p) => {
                push(p, ElKind::Move);
                start = p;
                cur = p;
            }
            tiny_skia_path::PathSegment::LineTo(p) => {
                push(p, ElKind::Line);
                cur = p;
            }
            tiny_skia_path::PathSegment::QuadTo(p1, p) => {
                // Degree-elevate to a cubic to keep one element shape.
                let c1 = Point::from_xy(
                    cur.x + 2.0 / 3.0 * (p1.x - cur.x),
                    cur.y + 2.0 / 3.0 * (p1.y - cur.y),
                );
                let c2 = Point::from_xy(
                    p.x + 2.0 / 3.0 * (p1.x - p.x),
                    p.y + 2.0 / 3.0 * (p1.y - p.y),
                );
                push(c1, ElKind::Curve);
                push(c2, ElKind::Data);
                push(p, ElKind::Data);
                cur = p;
            }
            tiny_skia_path::PathSegment::CubicTo(p1, p2, p) => {
                push(p1, ElKind::Curve);
                push(p2, ElKind::Data);
                push(p, ElKind::Data);
                cur = p;
            }
            tiny_skia_path::PathSegment::Close => {
                if cur != start {
                    push(start, ElKind::Line);
                    cur = start;
                }
            }
        }
    }
    els
}

/// Computes the vertex/angle list of a path.
///
/// When a subpath closes back onto its start point, the angle computed
/// at the closing vertex is written back onto the subpath's first apex
/// so both ends of the seam agree.
fn path_apexes(path: &tiny_skia_path::Path) -> Vec<(Point, f32)> {
    let els = flatten_path(path);
    let cnt = els.len();
    let mut target: Vec<(Point, f32)> = Vec::new();

    let mut start_p = Point::zero();
    let mut estart = 0usize;
    let mut tstart = 0usize;
    let mut sub_close = false;

    let mut idx = 0;
    while idx < cnt {
        let (left, current, right) = match els[idx].kind {
            ElKind::Move => {
                let c = els[idx];
                let l = if idx > 0 { els[idx - 1] } else { c };
                let r = if idx != cnt - 1 { els[idx + 1] } else { c };
                start_p = c.pt;
                estart = idx;
                tstart = target.len();
                (l.pt, c.pt, r.pt)
            }
            ElKind::Line => {
                let c = els[idx];
                let mut l = if idx > 0 { els[idx - 1] } else { c };
                let mut r = if idx != cnt - 1 { els[idx + 1] } else { c };
                if c.pt == start_p && cnt > 2 && idx >= 1 && estart + 2 <= cnt {
                    sub_close = true;
                    l = els[idx - 1];
                    r = els[estart + 1];
                }
                (l.pt, c.pt, r.pt)
            }
            ElKind::Curve => {
                let c1 = els[idx];
                let c2 = els[idx + 1];
                let ce = els[idx + 2];
                let mut l = if c2.pt == ce.pt { c1 } else { c2 };
                let mut r = if idx + 3 < cnt { els[idx + 3] } else { ce };
                if r.kind == ElKind::Curve && ce.pt == r.pt && idx + 4 < cnt {
                    r = els[idx + 4];
                }
                if ce.pt == start_p && cnt > 2 && estart + 2 <= cnt {
                    sub_close = true;
                    l = els[idx + 1];
                    r = els[estart + 1];
                }
                (l.pt, ce.pt, r.pt)
            }
            ElKind::Data => {
                idx += 1;
                continue;
            }
        };

        let angle = rotate_angle(left, right, current);
        target.push((current, angle));
        if sub_close {
            target[tstart].1 = angle;
            sub_close = false;
        }
        idx += 1;
    }

    target
}

/// Draws a `use` reference: resolve the link, apply the node's style,
/// offset by `x`/`y`, then draw the target guarded against re-entry.
pub(crate) fn draw_use(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    let (link_id, start) = {
        let data = node.borrow();
        if data.recursing.get() {
            return;
        }
        match data.kind {
            Kind::Use(ref use_data) => (use_data.link.clone(), use_data.start),
            _ => return,
        }
    };

    let link = match doc.node_by_id(&link_id) {
        Some(n) => n,
        None => {
            log::warn!("use reference '{}' is unresolved", link_id);
            return;
        }
    };

    node::apply_style(node, doc, ctx);

    let mut state = ctx.state().clone();
    state.transform = state.transform.pre_translate(start.x, start.y);
    ctx.push(state);

    node.borrow().recursing.set(true);
    node::draw(&link, doc, ctx);
    node.borrow().recursing.set(false);

    ctx.pop();
    node::revert_style(ctx);
}

/// Bounds of a graphics leaf under `state`: the local outline, expanded
/// by the stroke when one is set, mapped to device space.
pub(crate) fn bounds(node: &Node, state: &PaintState) -> Option<tiny_skia_path::Rect> {
    let data = node.borrow();

    let path = match data.kind {
        Kind::Image(ref image) => {
            return image.rect.to_rect().transform(state.transform);
        }
        Kind::Path(ref path) => path.data.as_ref().clone(),
        Kind::Rect(ref rect) => PathBuilder::from_rect(rect.rect.to_rect()),
        Kind::Ellipse(ref ellipse) => {
            let mut pb = PathBuilder::new();
            pb.push_oval(ellipse.rect.to_rect());
            pb.finish()?
        }
        Kind::Line(ref line) => {
            let mut pb = PathBuilder::new();
            pb.move_to(line.p1.x, line.p1.y);
            pb.line_to(line.p2.x, line.p2.y);
            pb.finish()?
        }
        Kind::Polygon(ref poly) | Kind::Polyline(ref poly) => {
            let mut pb = PathBuilder::new();
            structure::push_polygon(&mut pb, &poly.points, false);
            pb.finish()?
        }
        _ => return None,
    };

    let path = match state.stroke {
        Some(_) => stroke_expanded(&path, state.stroke_width.get()).unwrap_or(path),
        None => path,
    };
    path.transform(state.transform)?.compute_tight_bounds()
}

fn stroke_expanded(path: &tiny_skia_path::Path, width: f32) -> Option<tiny_skia_path::Path> {
    let stroke = tiny_skia_path::Stroke {
        width,
        ..tiny_skia_path::Stroke::default()
    };
    tiny_skia_path::PathStroker::new().stroke(path, &stroke, 1.0)
}

/// Bounds of a `use`: the target's bounds with the use offset applied,
/// guarded against reference cycles.
pub(crate) fn use_bounds(
    node: &Node,
    doc: &Document,
    state: &PaintState,
    shaper: &dyn TextShaper,
) -> Option<tiny_skia_path::Rect> {
    let (link_id, start) = match node.borrow().kind {
        Kind::Use(ref use_data) => (use_data.link.clone(), use_data.start),
        _ => return None,
    };

    let link = doc.node_by_id(&link_id)?;
    if node.borrow().recursing.get() || node.has_ancestor(&link) {
        return None;
    }

    let mut state = state.clone();
    state.transform = state.transform.pre_translate(start.x, start.y);

    node.borrow().recursing.set(true);
    let bounds = node::bounds_with_style(&link, doc, &state, shaper);
    node.borrow().recursing.set(false);
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point {
        Point::from_xy(x, y)
    }

    #[test]
    fn straight_line_angle_is_zero() {
        assert_eq!(direction_angle(pt(0.0, 0.0), pt(10.0, 0.0)), 0.0);
    }

    #[test]
    fn downward_line_angle_is_ninety() {
        // Screen-clockwise: +y is down.
        assert_eq!(direction_angle(pt(0.0, 0.0), pt(0.0, 10.0)), 90.0);
    }

    #[test]
    fn right_angle_corner_bisects_to_forty_five() {
        let angle = rotate_angle(pt(0.0, 0.0), pt(10.0, 10.0), pt(10.0, 0.0));
        assert!((angle - 45.0).abs() < 1e-4, "got {}", angle);
    }

    #[test]
    fn polyline_endpoint_angles_follow_edges() {
        let points = [pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)];
        let apexes = poly_apexes(&points, false);
        assert_eq!(apexes.len(), 3);
        assert_eq!(apexes[0].1, 0.0);
        assert!((apexes[1].1 - 45.0).abs() < 1e-4);
        assert_eq!(apexes[2].1, 90.0);
    }

    #[test]
    fn polygon_duplicates_first_apex() {
        let points = [pt(0.0, 0.0), pt(10.0, 0.0), pt(5.0, 10.0)];
        let apexes = poly_apexes(&points, true);
        assert_eq!(apexes.len(), 4);
        assert_eq!(apexes[0], apexes[3]);
    }

    #[test]
    fn closed_subpath_start_angle_matches_seam() {
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.line_to(10.0, 0.0);
        pb.line_to(10.0, 10.0);
        pb.line_to(0.0, 0.0);
        let path = pb.finish().unwrap();

        let apexes = path_apexes(&path);
        assert_eq!(apexes.len(), 4);
        // The seam writes the closing vertex's angle back onto the
        // subpath's first apex.
        assert_eq!(apexes[0].1, apexes[3].1);
    }

    #[test]
    fn line_apexes_share_direction() {
        let line = Line {
            p1: pt(0.0, 0.0),
            p2: pt(0.0, 5.0),
            markers: Markers::default(),
        };
        let apexes = line_apexes(&line);
        assert_eq!(apexes[0].1, 90.0);
        assert_eq!(apexes[1].1, 90.0);
    }
}
