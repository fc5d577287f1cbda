// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Text elements.
//!
//! Text resolves in two passes: a one-shot coordinate pass flattens the
//! tspan tree into positioned paragraphs, threading `x`/`y`/`dx`/`dy`
//! lists from parents to children; a per-draw format pass cascades each
//! span's style into a paragraph-aligned state list.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tiny_skia_path::{Path, PathBuilder, Point, Rect, Size};

use crate::document::Document;
use crate::geom::BBox;
use crate::node::{self, Kind, Node};
use crate::state::{DrawContext, PaintState, TextRun, TextShaper};
use crate::style::{Style, TextAnchor};

/// The `xml:space` processing mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum XmlSpace {
    /// Collapse whitespace runs, trim ends, stitch boundary spaces.
    #[default]
    Default,
    /// Keep the text as written.
    Preserve,
}

/// One item of a text element's content.
#[derive(Clone, Debug)]
pub enum TextItem {
    /// A tspan, or the element's direct character data.
    Span(Tspan),
    /// A forced line break inside a text area.
    LineBreak,
}

/// A `tspan`, or the anonymous span wrapping direct character data.
#[derive(Clone, Debug, Default)]
pub struct Tspan {
    /// Element id. Can be empty.
    pub id: String,
    /// Explicitly-set style properties.
    pub style: Style,
    /// Raw character data.
    pub text: String,
    /// Whitespace mode.
    pub mode: XmlSpace,
    /// The `x` coordinate list.
    pub x: Vec<f32>,
    /// The `y` coordinate list.
    pub y: Vec<f32>,
    /// The `dx` offset list.
    pub dx: Vec<f32>,
    /// The `dy` offset list.
    pub dy: Vec<f32>,
    /// Nested tspans.
    pub children: Vec<Tspan>,

    // Paragraph count this span produced, set by the coordinate pass
    // and consumed by the format pass.
    segments: Cell<usize>,
}

impl Tspan {
    /// Creates a span holding plain character data.
    pub fn from_text(text: String, mode: XmlSpace) -> Self {
        Tspan {
            text,
            mode,
            ..Tspan::default()
        }
    }
}

/// The position and offsets a paragraph was assigned.
#[derive(Clone, Debug, Default)]
struct LineCoords {
    valid_x: bool,
    valid_y: bool,
    x: f32,
    y: f32,
    offsets: Vec<Point>,
}

#[derive(Debug, Default)]
struct Resolved {
    paragraphs: Vec<String>,
    coords: Vec<LineCoords>,
}

/// A `text` or `textArea` element.
#[derive(Clone, Debug)]
pub struct Text {
    /// The anchor point.
    pub pos: Point,
    /// The text area size; `None` for plain `text`.
    pub size: Option<Size>,
    /// Whitespace mode applied to direct character data.
    pub mode: XmlSpace,
    /// Spans and line breaks in document order.
    pub items: Vec<TextItem>,

    resolved: RefCell<Option<Rc<Resolved>>>,
}

impl Text {
    /// Creates an empty text element anchored at `pos`.
    pub fn new(pos: Point) -> Self {
        Text {
            pos,
            size: None,
            mode: XmlSpace::Default,
            items: Vec::new(),
            resolved: RefCell::new(None),
        }
    }

    /// Appends a span of direct character data.
    pub fn add_text(&mut self, text: String) {
        self.items.push(TextItem::Span(Tspan::from_text(text, self.mode)));
    }

    /// Drops the resolved paragraphs. Parse-time mutation of the spans
    /// must call this.
    pub fn invalidate(&self) {
        *self.resolved.borrow_mut() = None;
    }

    /// Resolves the paragraph list once and memoizes it.
    fn resolved(&self) -> Rc<Resolved> {
        if let Some(res) = self.resolved.borrow().as_ref() {
            return res.clone();
        }

        let mut res = Resolved::default();
        let mut px = Vec::new();
        let mut py = Vec::new();
        let mut pdx = Vec::new();
        let mut pdy = Vec::new();
        for item in &self.items {
            if let TextItem::Span(ref span) = item {
                process_span_coords(span, &mut res, &mut px, &mut py, &mut pdx, &mut pdy);
            }
        }

        // The very last paragraph never keeps a trailing boundary space.
        if let Some(last) = res.paragraphs.last_mut() {
            if last.ends_with(' ') {
                last.pop();
            }
        }

        let res = Rc::new(res);
        *self.resolved.borrow_mut() = Some(res.clone());
        res
    }

    /// Collects one cascaded state per paragraph, in paragraph order.
    ///
    /// Every span cascades over the text element's own state; reverting
    /// between spans means nesting does not compound here.
    fn formats(&self, doc: &Document, base: &PaintState) -> Vec<PaintState> {
        let mut out = Vec::new();
        for item in &self.items {
            if let TextItem::Span(ref span) = item {
                collect_span_formats(span, doc, base, &mut out);
            }
        }
        out
    }
}

fn collect_span_formats(span: &Tspan, doc: &Document, base: &PaintState, out: &mut Vec<PaintState>) {
    let state = crate::document::cascade(&span.style, base, doc);
    for _ in 0..span.segments.get() {
        out.push(state.clone());
    }
    for child in &span.children {
        collect_span_formats(child, doc, base, out);
    }
}

/// Collapses whitespace runs to single spaces and trims both ends.
fn simplified(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Merges a span's own coordinate list with what its parent passed
/// down: the child's entries win elementwise, and the parent's list is
/// consumed by the span's text length.
fn adjust_parent_coord(parent: &mut Vec<f32>, child: &[f32], text_len: usize) -> Vec<f32> {
    let mut out = Vec::new();
    let mut i = 0;
    while (i < parent.len() || i < child.len()) && (i < text_len || text_len == 0) {
        out.push(if i < child.len() { child[i] } else { parent[i] });
        i += 1;
    }
    let consumed = parent.len().min(text_len);
    parent.drain(0..consumed);
    out
}

/// Turns flat coordinate and offset lists into per-paragraph records:
/// one single-character paragraph per explicit position, with the last
/// paragraph taking the remaining text and offsets.
fn resolve_coord_and_offset(
    coord_x: &[f32],
    coord_y: &[f32],
    offset_x: &[f32],
    offset_y: &[f32],
) -> Vec<LineCoords> {
    let graph_len = coord_x.len().max(coord_y.len());
    let mut out = Vec::new();

    for idx in 0..graph_len.saturating_sub(1) {
        out.push(LineCoords {
            valid_x: idx < coord_x.len(),
            valid_y: idx < coord_y.len(),
            x: coord_x.get(idx).copied().unwrap_or(0.0),
            y: coord_y.get(idx).copied().unwrap_or(0.0),
            offsets: vec![Point::from_xy(
                offset_x.get(idx).copied().unwrap_or(0.0),
                offset_y.get(idx).copied().unwrap_or(0.0),
            )],
        });
    }

    let valid_x = graph_len > 0 && graph_len <= coord_x.len();
    let valid_y = graph_len > 0 && graph_len <= coord_y.len();
    let mut last = LineCoords {
        valid_x,
        valid_y,
        x: if valid_x { coord_x[graph_len - 1] } else { 0.0 },
        y: if valid_y { coord_y[graph_len - 1] } else { 0.0 },
        offsets: Vec::new(),
    };

    let cur = out.len();
    let cnt = offset_x.len().max(offset_y.len());
    for i in cur..cnt {
        last.offsets.push(Point::from_xy(
            offset_x.get(i).copied().unwrap_or(0.0),
            offset_y.get(i).copied().unwrap_or(0.0),
        ));
    }
    out.push(last);
    out
}

fn process_span_coords(
    span: &Tspan,
    res: &mut Resolved,
    parent_x: &mut Vec<f32>,
    parent_y: &mut Vec<f32>,
    parent_dx: &mut Vec<f32>,
    parent_dy: &mut Vec<f32>,
) {
    let mut text = span.text.replace(['\t', '\n'], " ");
    let start_space = text.starts_with(' ') || text.starts_with('\u{a0}');
    let end_space = text.ends_with(' ') || text.ends_with('\u{a0}');

    if span.mode == XmlSpace::Default {
        text = simplified(&text);
        // Stitch collapsed boundary spaces back so adjacent spans stay
        // separated by exactly one.
        if start_space && res.paragraphs.last().map_or(false, |p| !p.ends_with(' ')) {
            text.insert(0, ' ');
        }
        if end_space && !text.is_empty() && !text.ends_with(' ') {
            text.push(' ');
        }
    }

    let chars: Vec<char> = text.chars().collect();
    let text_len = chars.len();

    let mut coord_x = adjust_parent_coord(parent_x, &span.x, text_len);
    let mut coord_y = adjust_parent_coord(parent_y, &span.y, text_len);
    let mut offset_x = adjust_parent_coord(parent_dx, &span.dx, text_len);
    let mut offset_y = adjust_parent_coord(parent_dy, &span.dy, text_len);

    let line_coords = resolve_coord_and_offset(&coord_x, &coord_y, &offset_x, &offset_y);

    let paragraph_size = line_coords.len().min(text_len);
    span.segments.set(paragraph_size);

    for idx in 0..paragraph_size {
        let graph: String = if idx == paragraph_size - 1 {
            chars[idx..].iter().collect()
        } else {
            chars[idx].to_string()
        };
        res.paragraphs.push(graph);
        res.coords.push(line_coords[idx].clone());
    }

    for child in &span.children {
        process_span_coords(
            child,
            res,
            &mut coord_x,
            &mut coord_y,
            &mut offset_x,
            &mut offset_y,
        );
    }
}

/// Advance width of a paragraph, including its extra per-char offsets.
fn line_width(
    graph: &str,
    state: &PaintState,
    offsets: &[Point],
    doc: &Document,
    shaper: &dyn TextShaper,
) -> f32 {
    if graph.is_empty() {
        return 0.0;
    }
    let inc: f32 = offsets.iter().skip(1).map(|p| p.x).sum();
    match doc.font(&state.font.family) {
        Some(font) => font.text_width(graph, state.font.size) + inc,
        None => shaper.measure(graph, &state.font) + inc,
    }
}

pub(crate) fn draw(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    node::apply_style(node, doc, ctx);

    let data = node.borrow();
    let text = match data.kind {
        Kind::Text(ref t) => t,
        _ => {
            drop(data);
            node::revert_style(ctx);
            return;
        }
    };

    let text_state = ctx.state().clone();
    let opacity = text_state.opacity * text_state.fill_opacity.get();
    let anchor = text_state.text_anchor;

    let resolved = text.resolved();
    let formats = text.formats(doc, &text_state);
    let shaper = ctx.shaper();

    let cnt = resolved.paragraphs.len().min(formats.len());
    let mut next_pos = text.pos;
    for i in 0..cnt {
        let coords = &resolved.coords[i];
        let mut pos = Point::from_xy(
            if coords.valid_x { coords.x } else { next_pos.x },
            if coords.valid_y { coords.y } else { next_pos.y },
        );

        // Middle/end anchoring shifts each explicitly positioned run by
        // the total width of the paragraphs it spans.
        if anchor != TextAnchor::Start && (i == 0 || coords.valid_x || coords.valid_y) {
            let mut width = 0.0;
            for j in i..cnt {
                width += line_width(
                    &resolved.paragraphs[j],
                    &formats[j],
                    &resolved.coords[j].offsets,
                    doc,
                    shaper,
                );
                if j + 1 == cnt
                    || resolved.coords[j + 1].valid_x
                    || resolved.coords[j + 1].valid_y
                {
                    break;
                }
            }
            pos.x -= if anchor == TextAnchor::Middle {
                width / 2.0
            } else {
                width
            };
        }

        let mut state = formats[i].clone();
        state.opacity = opacity;
        draw_paragraph(
            ctx,
            doc,
            &resolved.paragraphs[i],
            pos,
            &state,
            &coords.offsets,
            &mut next_pos,
        );
    }

    drop(data);
    node::revert_style(ctx);
}

/// Draws one paragraph: while per-char offsets remain, each character
/// goes out on its own at the offset position; the remainder is drawn
/// as a single run.
fn draw_paragraph(
    ctx: &mut DrawContext,
    doc: &Document,
    graph: &str,
    pos: Point,
    state: &PaintState,
    offsets: &[Point],
    next_pos: &mut Point,
) {
    let chars: Vec<char> = graph.chars().collect();
    let cnt = chars.len();
    let svg_font = doc.font(&state.font.family);
    let shaper = ctx.shaper();

    *next_pos = pos;
    let mut idx = 0;
    while idx < cnt {
        let cur_pos = if idx < offsets.len() {
            Point::from_xy(next_pos.x + offsets[idx].x, next_pos.y + offsets[idx].y)
        } else {
            *next_pos
        };
        let cur_str: String = if idx < offsets.len() {
            chars[idx].to_string()
        } else {
            chars[idx..].iter().collect()
        };

        let width = match svg_font {
            Some(ref font) => {
                draw_font_run(ctx, font, &cur_str, cur_pos, state);
                font.text_width(&cur_str, state.font.size)
            }
            None => {
                let run = TextRun {
                    text: cur_str.clone(),
                    pos: cur_pos,
                };
                ctx.surface().draw_text(&run, state);
                shaper.measure(&cur_str, &state.font)
            }
        };
        *next_pos = Point::from_xy(cur_pos.x + width, cur_pos.y);

        if idx >= offsets.len() {
            break;
        }
        idx += 1;
    }
}

/// Draws a run using the document's SVG font: one filled glyph outline
/// per character.
fn draw_font_run(
    ctx: &mut DrawContext,
    font: &crate::document::SvgFont,
    run: &str,
    pos: Point,
    state: &PaintState,
) {
    let mut pen = pos;
    for c in run.chars() {
        if let Some(path) = font.glyph_outline(c, state.font.size, pen) {
            ctx.surface().draw_path(&path, &state.fill_pass());
        }
        pen.x += font.char_width(c, state.font.size);
    }
}

/// Approximate bounds: one rectangle per paragraph from the shaped
/// line width and the font size.
pub(crate) fn bounds(
    node: &Node,
    doc: &Document,
    state: &PaintState,
    shaper: &dyn TextShaper,
) -> Option<Rect> {
    let data = node.borrow();
    let text = match data.kind {
        Kind::Text(ref t) => t,
        _ => return None,
    };

    let mut bbox = BBox::default();
    for (graph, pos, width, size) in layout_paragraphs(text, doc, state, shaper) {
        if graph.is_empty() {
            continue;
        }
        if let Some(rect) = Rect::from_xywh(pos.x, pos.y - size, width, size) {
            bbox = bbox.expand(rect);
        }
    }

    bbox.to_rect().and_then(|r| r.transform(state.transform))
}

/// Positions every paragraph the way the draw pass would, without the
/// per-character splitting. Returns `(text, pos, width, font_size)`.
fn layout_paragraphs(
    text: &Text,
    doc: &Document,
    state: &PaintState,
    shaper: &dyn TextShaper,
) -> Vec<(String, Point, f32, f32)> {
    let resolved = text.resolved();
    let formats = text.formats(doc, state);
    let anchor = state.text_anchor;

    let cnt = resolved.paragraphs.len().min(formats.len());
    let mut out = Vec::with_capacity(cnt);
    let mut next_pos = text.pos;

    for i in 0..cnt {
        let coords = &resolved.coords[i];
        let mut pos = Point::from_xy(
            if coords.valid_x { coords.x } else { next_pos.x },
            if coords.valid_y { coords.y } else { next_pos.y },
        );

        let own_width = line_width(
            &resolved.paragraphs[i],
            &formats[i],
            &coords.offsets,
            doc,
            shaper,
        );

        if anchor != TextAnchor::Start && (i == 0 || coords.valid_x || coords.valid_y) {
            let mut width = 0.0;
            for j in i..cnt {
                width += line_width(
                    &resolved.paragraphs[j],
                    &formats[j],
                    &resolved.coords[j].offsets,
                    doc,
                    shaper,
                );
                if j + 1 == cnt
                    || resolved.coords[j + 1].valid_x
                    || resolved.coords[j + 1].valid_y
                {
                    break;
                }
            }
            pos.x -= if anchor == TextAnchor::Middle {
                width / 2.0
            } else {
                width
            };
        }

        out.push((
            resolved.paragraphs[i].clone(),
            pos,
            own_width,
            formats[i].font.size,
        ));
        next_pos = Point::from_xy(pos.x + own_width, pos.y);
    }
    out
}

/// Builds the glyph-outline path of the text for clipping.
///
/// Only SVG fonts embedded in the document can contribute outlines; any
/// other family clips to nothing.
pub(crate) fn clip_outline(node: &Node, doc: &Document) -> Option<Path> {
    let data = node.borrow();
    let text = match data.kind {
        Kind::Text(ref t) => t,
        _ => return None,
    };

    let state = crate::document::cascade(&data.style, &PaintState::default(), doc);
    let font = match doc.font(&state.font.family) {
        Some(f) => f,
        None => {
            log::warn!(
                "text in a clip path needs an embedded SVG font for '{}'",
                state.font.family
            );
            return None;
        }
    };

    let mut pb = PathBuilder::new();
    for (graph, pos, _, size) in
        layout_paragraphs(text, doc, &state, &crate::state::FallbackShaper)
    {
        let mut pen = pos;
        for c in graph.chars() {
            if let Some(outline) = font.glyph_outline(c, size, pen) {
                crate::structure::push_path(&mut pb, &outline);
            }
            pen.x += font.char_width(c, size);
        }
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, mode: XmlSpace) -> Tspan {
        Tspan::from_text(text.to_string(), mode)
    }

    fn resolve(items: Vec<TextItem>) -> Vec<String> {
        let mut text = Text::new(Point::zero());
        text.items = items;
        text.resolved().paragraphs.clone()
    }

    #[test]
    fn default_mode_collapses_whitespace() {
        let paragraphs = resolve(vec![TextItem::Span(span(
            "  hello \t\n  world  ",
            XmlSpace::Default,
        ))]);
        assert_eq!(paragraphs, vec!["hello world".to_string()]);
    }

    #[test]
    fn preserve_mode_keeps_text() {
        let paragraphs = resolve(vec![TextItem::Span(span("  a  b ", XmlSpace::Preserve))]);
        // Tabs and newlines still become spaces, nothing else changes,
        // except the trailing boundary space of the whole text.
        assert_eq!(paragraphs, vec!["  a  b".to_string()]);
    }

    #[test]
    fn boundary_space_stitches_adjacent_spans() {
        let paragraphs = resolve(vec![
            TextItem::Span(span("one ", XmlSpace::Default)),
            TextItem::Span(span(" two", XmlSpace::Default)),
        ]);
        assert_eq!(paragraphs, vec!["one ".to_string(), "two".to_string()]);
    }

    #[test]
    fn explicit_coords_split_single_char_paragraphs() {
        let mut s = span("abc", XmlSpace::Default);
        s.x = vec![10.0, 20.0];
        let mut text = Text::new(Point::zero());
        text.items = vec![TextItem::Span(s)];

        let resolved = text.resolved();
        assert_eq!(
            resolved.paragraphs,
            vec!["a".to_string(), "bc".to_string()]
        );
        assert!(resolved.coords[0].valid_x);
        assert_eq!(resolved.coords[0].x, 10.0);
        assert!(resolved.coords[1].valid_x);
        assert_eq!(resolved.coords[1].x, 20.0);
        assert!(!resolved.coords[1].valid_y);
    }

    #[test]
    fn child_coords_win_over_parent() {
        let mut parent = vec![1.0, 2.0, 3.0];
        let out = adjust_parent_coord(&mut parent, &[9.0], 2);
        assert_eq!(out, vec![9.0, 2.0]);
        // The parent list is consumed by the text length.
        assert_eq!(parent, vec![3.0]);
    }

    #[test]
    fn trailing_offsets_stay_on_last_paragraph() {
        let coords = resolve_coord_and_offset(&[5.0], &[], &[1.0, 2.0, 3.0], &[]);
        assert_eq!(coords.len(), 1);
        assert!(coords[0].valid_x);
        assert_eq!(coords[0].offsets.len(), 3);
        assert_eq!(coords[0].offsets[2].x, 3.0);
    }
}
