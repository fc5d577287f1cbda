// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SVG Tiny markup serialization.

use std::fmt::Display;
use std::io::Write;

use tiny_skia_path::{NonZeroRect, Transform};
use xmlwriter::XmlWriter;

pub use xmlwriter::Indent;

use crate::document::{Document, SvgFont, SvgGlyph};
use crate::geom::ApproxZeroUlps;
use crate::node::{Conditions, Kind, Node, NodeData};
use crate::shapes::{ImageData, Markers};
use crate::structure::{Marker, MarkerOrient, MarkerUnits, Pattern};
use crate::style::{
    Color, CompOp, DisplayMode, FillRule, FontStyle, FontVariant, GradientKind, LineCap, LineJoin,
    NamedStyle, Opacity, Paint, SpreadMethod, Style, TextAnchor, Units,
};
use crate::text::{Text, TextItem, Tspan, XmlSpace};

/// XML writing options.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Used to add a custom prefix to each element ID during writing.
    pub id_prefix: Option<String>,

    /// Set the coordinates numeric precision.
    ///
    /// Smaller precision can lead to a malformed output in some cases.
    ///
    /// Default: 8
    pub coordinates_precision: u8,

    /// Set the transform values numeric precision.
    ///
    /// Smaller precision can lead to a malformed output in some cases.
    ///
    /// Default: 8
    pub transforms_precision: u8,

    /// Use single quote marks instead of double quote.
    ///
    /// Default: disabled
    pub use_single_quote: bool,

    /// Set XML nodes indention.
    ///
    /// Default: 4 spaces
    pub indent: Indent,

    /// Set XML attributes indention.
    ///
    /// Default: `None`
    pub attributes_indent: Indent,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            id_prefix: Default::default(),
            coordinates_precision: 8,
            transforms_precision: 8,
            use_single_quote: false,
            indent: Indent::Spaces(4),
            attributes_indent: Indent::None,
        }
    }
}

impl Document {
    /// Writes the document back to SVG Tiny markup.
    ///
    /// Only explicitly-set properties are written; inherited values
    /// never appear in the output.
    pub fn to_string(&self, opt: &WriteOptions) -> String {
        convert(self, opt)
    }
}

fn convert(doc: &Document, opt: &WriteOptions) -> String {
    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: opt.use_single_quote,
        indent: opt.indent,
        attributes_indent: opt.attributes_indent,
    });

    let root = doc.root();

    xml.start_element("svg");
    xml.write_attribute("xmlns", "http://www.w3.org/2000/svg");
    if has_xlink(doc, &root) {
        xml.write_attribute("xmlns:xlink", "http://www.w3.org/1999/xlink");
    }
    xml.write_attribute("version", "1.2");
    xml.write_attribute("baseProfile", "tiny");

    write_dimension(&mut xml, "width", doc.size().width(), doc.width_is_percent());
    write_dimension(&mut xml, "height", doc.size().height(), doc.height_is_percent());

    if let Some(vb) = doc.view_box() {
        xml.write_attribute_fmt(
            "viewBox",
            format_args!("{} {} {} {}", vb.x(), vb.y(), vb.width(), vb.height()),
        );
    }

    {
        let data = root.borrow();
        if !data.xml_class.is_empty() {
            xml.write_attribute("class", &data.xml_class);
        }
        write_style(&data.style, false, opt, &mut xml);
    }

    write_defs(doc, opt, &mut xml);

    for child in root.children() {
        write_element(&child, false, opt, &mut xml);
    }

    xml.end_document()
}

fn write_dimension(xml: &mut XmlWriter, name: &str, value: f32, percent: bool) {
    if percent {
        xml.write_attribute_fmt(name, format_args!("{}%", value));
    } else {
        xml.write_attribute(name, &value);
    }
}

/// Writes the named-style table and the embedded fonts as a `defs`
/// block. Tables are unordered; ids are sorted so output is stable.
fn write_defs(doc: &Document, opt: &WriteOptions, xml: &mut XmlWriter) {
    let mut style_ids: Vec<&String> = doc.named_styles().keys().collect();
    style_ids.sort();

    let mut font_families: Vec<&String> = doc.fonts().keys().collect();
    font_families.sort();

    if style_ids.is_empty() && font_families.is_empty() {
        return;
    }

    xml.start_element("defs");

    for id in style_ids {
        // Checked above.
        let style = match doc.named_style(id) {
            Some(s) => s,
            None => continue,
        };
        write_named_style(id, &style, opt, xml);
    }

    for family in font_families {
        let font = match doc.font(family) {
            Some(f) => f,
            None => continue,
        };
        write_font(&font, opt, xml);
    }

    xml.end_element();
}

fn write_named_style(id: &str, style: &NamedStyle, opt: &WriteOptions, xml: &mut XmlWriter) {
    match style {
        NamedStyle::Solid(solid) => {
            xml.start_element("solidColor");
            xml.write_id_attribute(id, opt);
            xml.write_color("solid-color", solid.color);
            if solid.opacity != Opacity::ONE {
                xml.write_attribute("solid-opacity", &solid.opacity.get());
            }
            xml.end_element();
        }
        NamedStyle::Gradient { base, kind } => {
            match kind {
                GradientKind::Linear { x1, y1, x2, y2 } => {
                    xml.start_element("linearGradient");
                    xml.write_id_attribute(id, opt);
                    xml.write_attribute("x1", x1);
                    xml.write_attribute("y1", y1);
                    xml.write_attribute("x2", x2);
                    xml.write_attribute("y2", y2);
                }
                GradientKind::Radial(v) => {
                    xml.start_element("radialGradient");
                    xml.write_id_attribute(id, opt);
                    xml.write_attribute("cx", &v.cx);
                    xml.write_attribute("cy", &v.cy);
                    xml.write_attribute("r", &v.r);
                    if v.fx != v.cx {
                        xml.write_attribute("fx", &v.fx);
                    }
                    if v.fy != v.cy {
                        xml.write_attribute("fy", &v.fy);
                    }
                }
                GradientKind::Conical { .. } => {
                    // No SVG Tiny markup exists for conical gradients.
                    log::warn!("conical gradient '{}' cannot be serialized, skipping", id);
                    return;
                }
            }

            xml.write_units("gradientUnits", base.units, Units::ObjectBoundingBox);
            xml.write_transform("gradientTransform", base.transform, opt);
            match base.spread_method {
                SpreadMethod::Pad => {}
                SpreadMethod::Reflect => xml.write_attribute("spreadMethod", "reflect"),
                SpreadMethod::Repeat => xml.write_attribute("spreadMethod", "repeat"),
            }

            if let Some(ref link) = base.stop_link {
                xml.write_func_ref("xlink:href", link, opt);
            }

            for stop in &base.stops {
                xml.start_element("stop");
                xml.write_attribute("offset", &stop.offset.get());
                xml.write_color("stop-color", stop.color);
                if stop.opacity != Opacity::ONE {
                    xml.write_attribute("stop-opacity", &stop.opacity.get());
                }
                xml.end_element();
            }

            xml.end_element();
        }
    }
}

fn write_font(font: &SvgFont, opt: &WriteOptions, xml: &mut XmlWriter) {
    xml.start_element("font");
    if font.horiz_adv_x != 0.0 {
        xml.write_attribute("horiz-adv-x", &font.horiz_adv_x);
    }

    xml.start_element("font-face");
    xml.write_attribute("font-family", &font.family);
    xml.write_attribute("units-per-em", &font.units_per_em);
    xml.end_element();

    if let Some(ref glyph) = font.missing_glyph {
        xml.start_element("missing-glyph");
        write_glyph_attrs(glyph, false, opt, xml);
        xml.end_element();
    }

    let mut chars: Vec<&char> = font.glyphs.keys().collect();
    chars.sort();
    for c in chars {
        if let Some(glyph) = font.glyphs.get(c) {
            xml.start_element("glyph");
            write_glyph_attrs(glyph, true, opt, xml);
            xml.end_element();
        }
    }

    xml.end_element();
}

fn write_glyph_attrs(glyph: &SvgGlyph, with_unicode: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    if with_unicode {
        xml.write_attribute_fmt("unicode", format_args!("{}", glyph.unicode));
    }
    if let Some(adv) = glyph.horiz_adv_x {
        xml.write_attribute("horiz-adv-x", &adv);
    }
    if let Some(ref path) = glyph.path {
        write_path_data(path, opt, xml);
    }
}

fn write_element(node: &Node, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    let data = node.borrow();
    match data.kind {
        Kind::Group => {
            xml.start_element("g");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_children(node, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::Defs => {
            xml.start_element("defs");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_children(node, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::Switch(_) => {
            xml.start_element("switch");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_children(node, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::Marker(ref marker) => {
            write_marker(&data, marker, opt, xml);
            write_children(node, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::Pattern(ref pattern) => {
            write_pattern(&data, pattern, opt, xml);
            write_children(node, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::ClipPath(ref clip) => {
            xml.start_element("clipPath");
            write_common_attrs(&data, true, opt, xml);
            xml.write_units("clipPathUnits", clip.units, Units::UserSpaceOnUse);
            write_children(node, true, opt, xml);
            xml.end_element();
        }
        Kind::Path(ref path) => {
            xml.start_element("path");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_markers(&path.markers, opt, xml);
            write_path_data(&path.data, opt, xml);
            xml.end_element();
        }
        Kind::Rect(ref rect) => {
            xml.start_element("rect");
            write_common_attrs(&data, is_clip_path, opt, xml);
            xml.write_rect_attrs(rect.rect);
            if rect.rx > 0.0 {
                xml.write_attribute("rx", &rect.rx);
            }
            if rect.ry > 0.0 {
                xml.write_attribute("ry", &rect.ry);
            }
            xml.end_element();
        }
        Kind::Ellipse(ref ellipse) => {
            let r = ellipse.rect;
            let cx = r.x() + r.width() / 2.0;
            let cy = r.y() + r.height() / 2.0;
            if ellipse.circle {
                xml.start_element("circle");
                write_common_attrs(&data, is_clip_path, opt, xml);
                xml.write_attribute("cx", &cx);
                xml.write_attribute("cy", &cy);
                xml.write_attribute("r", &(r.width() / 2.0));
            } else {
                xml.start_element("ellipse");
                write_common_attrs(&data, is_clip_path, opt, xml);
                xml.write_attribute("cx", &cx);
                xml.write_attribute("cy", &cy);
                xml.write_attribute("rx", &(r.width() / 2.0));
                xml.write_attribute("ry", &(r.height() / 2.0));
            }
            xml.end_element();
        }
        Kind::Line(ref line) => {
            xml.start_element("line");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_markers(&line.markers, opt, xml);
            xml.write_attribute("x1", &line.p1.x);
            xml.write_attribute("y1", &line.p1.y);
            xml.write_attribute("x2", &line.p2.x);
            xml.write_attribute("y2", &line.p2.y);
            xml.end_element();
        }
        Kind::Polygon(ref poly) => {
            xml.start_element("polygon");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_markers(&poly.markers, opt, xml);
            write_points(&poly.points, opt, xml);
            xml.end_element();
        }
        Kind::Polyline(ref poly) => {
            xml.start_element("polyline");
            write_common_attrs(&data, is_clip_path, opt, xml);
            write_markers(&poly.markers, opt, xml);
            write_points(&poly.points, opt, xml);
            xml.end_element();
        }
        Kind::Image(ref image) => {
            xml.start_element("image");
            write_common_attrs(&data, is_clip_path, opt, xml);
            xml.write_rect_attrs(image.rect);
            write_image_data(&image.data, xml);
            xml.end_element();
        }
        Kind::Text(ref text) => {
            write_text(&data, text, is_clip_path, opt, xml);
        }
        Kind::Use(ref use_node) => {
            xml.start_element("use");
            write_common_attrs(&data, is_clip_path, opt, xml);
            if use_node.start.x != 0.0 {
                xml.write_attribute("x", &use_node.start.x);
            }
            if use_node.start.y != 0.0 {
                xml.write_attribute("y", &use_node.start.y);
            }
            let prefix = opt.id_prefix.as_deref().unwrap_or_default();
            xml.write_attribute_fmt("xlink:href", format_args!("#{}{}", prefix, use_node.link));
            xml.end_element();
        }
        Kind::Video => {
            xml.start_element("video");
            write_common_attrs(&data, is_clip_path, opt, xml);
            xml.end_element();
        }
        Kind::Animation => {
            xml.start_element("animation");
            write_common_attrs(&data, is_clip_path, opt, xml);
            xml.end_element();
        }
    }
}

fn write_children(node: &Node, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    for child in node.children() {
        write_element(&child, is_clip_path, opt, xml);
    }
}

fn write_marker(data: &NodeData, marker: &Marker, opt: &WriteOptions, xml: &mut XmlWriter) {
    xml.start_element("marker");
    write_common_attrs(data, false, opt, xml);
    if marker.ref_point.x != 0.0 {
        xml.write_attribute("refX", &marker.ref_point.x);
    }
    if marker.ref_point.y != 0.0 {
        xml.write_attribute("refY", &marker.ref_point.y);
    }
    xml.write_attribute("markerWidth", &marker.size.width());
    xml.write_attribute("markerHeight", &marker.size.height());
    if marker.units == MarkerUnits::UserSpaceOnUse {
        xml.write_attribute("markerUnits", "userSpaceOnUse");
    }
    match marker.orient {
        MarkerOrient::Auto => xml.write_attribute("orient", "auto"),
        MarkerOrient::Angle(a) => {
            if a != 0.0 {
                xml.write_attribute("orient", &a);
            }
        }
    }
    if let Some(vb) = marker.view_box {
        xml.write_attribute_fmt(
            "viewBox",
            format_args!("{} {} {} {}", vb.x(), vb.y(), vb.width(), vb.height()),
        );
    }
}

fn write_pattern(data: &NodeData, pattern: &Pattern, opt: &WriteOptions, xml: &mut XmlWriter) {
    xml.start_element("pattern");
    write_common_attrs(data, false, opt, xml);
    xml.write_rect_attrs(pattern.rect);
    xml.write_units("patternUnits", pattern.units, Units::ObjectBoundingBox);
    xml.write_units(
        "patternContentUnits",
        pattern.content_units,
        Units::UserSpaceOnUse,
    );
}

fn write_text(data: &NodeData, text: &Text, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    if let Some(size) = text.size {
        xml.start_element("textArea");
        write_common_attrs(data, is_clip_path, opt, xml);
        if text.pos.x != 0.0 {
            xml.write_attribute("x", &text.pos.x);
        }
        if text.pos.y != 0.0 {
            xml.write_attribute("y", &text.pos.y);
        }
        xml.write_attribute("width", &size.width());
        xml.write_attribute("height", &size.height());
    } else {
        xml.start_element("text");
        write_common_attrs(data, is_clip_path, opt, xml);
        if text.pos.x != 0.0 {
            xml.write_attribute("x", &text.pos.x);
        }
        if text.pos.y != 0.0 {
            xml.write_attribute("y", &text.pos.y);
        }
    }

    if text.mode == XmlSpace::Preserve {
        xml.write_attribute("xml:space", "preserve");
    }

    for item in &text.items {
        match item {
            TextItem::Span(span) => write_span(span, is_clip_path, opt, xml),
            TextItem::LineBreak => {
                xml.start_element("tbreak");
                xml.end_element();
            }
        }
    }

    xml.end_element();
}

fn write_span(span: &Tspan, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    // Direct character data is stored as an anonymous span; write it
    // back as bare text.
    let plain = span.id.is_empty()
        && span.style.is_empty()
        && span.x.is_empty()
        && span.y.is_empty()
        && span.dx.is_empty()
        && span.dy.is_empty()
        && span.children.is_empty();
    if plain {
        if !span.text.is_empty() {
            xml.write_text(&span.text.replace('&', "&amp;"));
        }
        return;
    }

    xml.start_element("tspan");
    if !span.id.is_empty() {
        xml.write_id_attribute(&span.id, opt);
    }
    write_style(&span.style, is_clip_path, opt, xml);
    xml.write_number_list("x", &span.x);
    xml.write_number_list("y", &span.y);
    xml.write_number_list("dx", &span.dx);
    xml.write_number_list("dy", &span.dy);
    if span.mode == XmlSpace::Preserve {
        xml.write_attribute("xml:space", "preserve");
    }

    if !span.text.is_empty() {
        xml.write_text(&span.text.replace('&', "&amp;"));
    }
    for child in &span.children {
        write_span(child, is_clip_path, opt, xml);
    }

    xml.end_element();
}

fn write_common_attrs(data: &NodeData, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    if !data.id.is_empty() {
        xml.write_id_attribute(&data.id, opt);
    }
    if !data.xml_class.is_empty() {
        xml.write_attribute("class", &data.xml_class);
    }
    if !data.visible {
        xml.write_attribute("visibility", "hidden");
    }
    write_conditions(&data.conditions, xml);
    write_style(&data.style, is_clip_path, opt, xml);
}

fn write_conditions(conditions: &Conditions, xml: &mut XmlWriter) {
    if !conditions.required_features.is_empty() {
        xml.write_attribute("requiredFeatures", &conditions.required_features.join(" "));
    }
    if !conditions.required_extensions.is_empty() {
        xml.write_attribute(
            "requiredExtensions",
            &conditions.required_extensions.join(" "),
        );
    }
    if !conditions.required_languages.is_empty() {
        xml.write_attribute("systemLanguage", &conditions.required_languages.join(","));
    }
    if !conditions.required_formats.is_empty() {
        xml.write_attribute("requiredFormats", &conditions.required_formats.join(" "));
    }
    if !conditions.required_fonts.is_empty() {
        xml.write_attribute("requiredFonts", &conditions.required_fonts.join(" "));
    }
}

/// Writes every explicitly-set style property and nothing else.
fn write_style(style: &Style, is_clip_path: bool, opt: &WriteOptions, xml: &mut XmlWriter) {
    if let Some(ts) = style.transform {
        xml.write_transform("transform", ts, opt);
    }

    if let Some(ref fill) = style.fill {
        if let Some(ref paint) = fill.paint {
            write_paint("fill", paint, opt, xml);
        }
        if let Some(opacity) = fill.opacity {
            xml.write_attribute("fill-opacity", &opacity.get());
        }
        if let Some(rule) = fill.rule {
            let name = if is_clip_path { "clip-rule" } else { "fill-rule" };
            xml.write_attribute(name, fill_rule_name(rule));
        }
    }

    if let Some(ref stroke) = style.stroke {
        if let Some(ref paint) = stroke.paint {
            write_paint("stroke", paint, opt, xml);
        }
        if let Some(width) = stroke.width {
            xml.write_attribute("stroke-width", &width.get());
        }
        if let Some(opacity) = stroke.opacity {
            xml.write_attribute("stroke-opacity", &opacity.get());
        }
        if let Some(ref dashes) = stroke.dash_array {
            if dashes.is_empty() {
                xml.write_attribute("stroke-dasharray", "none");
            } else {
                xml.write_number_list("stroke-dasharray", dashes);
            }
        }
        if let Some(offset) = stroke.dash_offset {
            xml.write_attribute("stroke-dashoffset", &offset);
        }
        if let Some(cap) = stroke.line_cap {
            let name = match cap {
                LineCap::Butt => "butt",
                LineCap::Round => "round",
                LineCap::Square => "square",
            };
            xml.write_attribute("stroke-linecap", name);
        }
        if let Some(join) = stroke.line_join {
            let name = match join {
                LineJoin::Miter => "miter",
                LineJoin::Round => "round",
                LineJoin::Bevel => "bevel",
            };
            xml.write_attribute("stroke-linejoin", name);
        }
        if let Some(limit) = stroke.miter_limit {
            xml.write_attribute("stroke-miterlimit", &limit.get());
        }
    }

    if let Some(ref font) = style.font {
        if let Some(ref family) = font.family {
            xml.write_attribute("font-family", family);
        }
        if let Some(size) = font.size {
            xml.write_attribute("font-size", &size.get());
        }
        if let Some(font_style) = font.style {
            let name = match font_style {
                FontStyle::Normal => "normal",
                FontStyle::Italic => "italic",
                FontStyle::Oblique => "oblique",
            };
            xml.write_attribute("font-style", name);
        }
        if let Some(weight) = font.weight {
            xml.write_attribute("font-weight", &weight);
        }
        if let Some(variant) = font.variant {
            let name = match variant {
                FontVariant::Normal => "normal",
                FontVariant::SmallCaps => "small-caps",
            };
            xml.write_attribute("font-variant", name);
        }
        if let Some(anchor) = font.anchor {
            let name = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            xml.write_attribute("text-anchor", name);
        }
    }

    if let Some(opacity) = style.opacity {
        xml.write_attribute("opacity", &opacity.get());
    }
    if let Some(comp_op) = style.comp_op {
        xml.write_attribute("comp-op", comp_op_name(comp_op));
    }
    if let Some(ref clip_id) = style.clip_path {
        xml.write_func_ref("clip-path", clip_id, opt);
    }
    if let Some(rule) = style.clip_rule {
        xml.write_attribute("clip-rule", fill_rule_name(rule));
    }
    if let Some(display) = style.display {
        xml.write_attribute("display", display_name(display));
    }
    if let Some(ref paint) = style.viewport_fill {
        write_paint("viewport-fill", paint, opt, xml);
    }
}

fn write_paint(name: &str, paint: &Paint, opt: &WriteOptions, xml: &mut XmlWriter) {
    match paint {
        Paint::None => xml.write_attribute(name, "none"),
        Paint::Color(c) => xml.write_color(name, *c),
        Paint::Ref(ref id) => xml.write_func_ref(name, id, opt),
    }
}

fn write_markers(markers: &Markers, opt: &WriteOptions, xml: &mut XmlWriter) {
    if let Some(ref id) = markers.start {
        xml.write_func_ref("marker-start", id, opt);
    }
    if let Some(ref id) = markers.mid {
        xml.write_func_ref("marker-mid", id, opt);
    }
    if let Some(ref id) = markers.end {
        xml.write_func_ref("marker-end", id, opt);
    }
}

fn write_points(points: &[tiny_skia_path::Point], opt: &WriteOptions, xml: &mut XmlWriter) {
    xml.write_attribute_raw("points", |buf| {
        for p in points {
            write_num(p.x, buf, opt.coordinates_precision);
            buf.push(b',');
            write_num(p.y, buf, opt.coordinates_precision);
            buf.push(b' ');
        }
        if !points.is_empty() {
            buf.pop();
        }
    });
}

fn write_path_data(path: &tiny_skia_path::Path, opt: &WriteOptions, xml: &mut XmlWriter) {
    xml.write_attribute_raw("d", |buf| {
        use tiny_skia_path::PathSegment;

        for seg in path.segments() {
            match seg {
                PathSegment::MoveTo(p) => {
                    buf.extend_from_slice(b"M ");
                    write_num(p.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                }
                PathSegment::LineTo(p) => {
                    buf.extend_from_slice(b"L ");
                    write_num(p.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                }
                PathSegment::QuadTo(p1, p) => {
                    buf.extend_from_slice(b"Q ");
                    write_num(p1.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p1.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                }
                PathSegment::CubicTo(p1, p2, p) => {
                    buf.extend_from_slice(b"C ");
                    write_num(p1.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p1.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p2.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p2.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.x, buf, opt.coordinates_precision);
                    buf.push(b' ');
                    write_num(p.y, buf, opt.coordinates_precision);
                    buf.push(b' ');
                }
                PathSegment::Close => {
                    buf.extend_from_slice(b"Z ");
                }
            }
        }

        buf.pop();
    });
}

fn write_image_data(data: &ImageData, xml: &mut XmlWriter) {
    xml.write_attribute_raw("xlink:href", |buf| {
        buf.extend_from_slice(b"data:");
        buf.extend_from_slice(data.mime_type().as_bytes());
        buf.extend_from_slice(b";base64, ");

        let mut enc =
            base64::write::EncoderWriter::new(buf, &base64::engine::general_purpose::STANDARD);
        enc.write_all(data.data()).unwrap();
    });
}

fn has_xlink(doc: &Document, root: &Node) -> bool {
    for style in doc.named_styles().values() {
        if let NamedStyle::Gradient { base, .. } = style.as_ref() {
            if base.stop_link.is_some() {
                return true;
            }
        }
    }

    root.descendants()
        .any(|n| matches!(n.borrow().kind, Kind::Image(_) | Kind::Use(_)))
}

fn fill_rule_name(rule: FillRule) -> &'static str {
    match rule {
        FillRule::NonZero => "nonzero",
        FillRule::EvenOdd => "evenodd",
    }
}

fn display_name(display: DisplayMode) -> &'static str {
    match display {
        DisplayMode::Inline => "inline",
        DisplayMode::Block => "block",
        DisplayMode::ListItem => "list-item",
        DisplayMode::RunIn => "run-in",
        DisplayMode::Compact => "compact",
        DisplayMode::Marker => "marker",
        DisplayMode::Table => "table",
        DisplayMode::InlineTable => "inline-table",
        DisplayMode::TableRowGroup => "table-row-group",
        DisplayMode::TableHeaderGroup => "table-header-group",
        DisplayMode::TableFooterGroup => "table-footer-group",
        DisplayMode::TableRow => "table-row",
        DisplayMode::TableColumnGroup => "table-column-group",
        DisplayMode::TableColumn => "table-column",
        DisplayMode::TableCell => "table-cell",
        DisplayMode::TableCaption => "table-caption",
        DisplayMode::None => "none",
    }
}

fn comp_op_name(comp_op: CompOp) -> &'static str {
    match comp_op {
        CompOp::Clear => "clear",
        CompOp::Src => "src",
        CompOp::Dst => "dst",
        CompOp::SrcOver => "src-over",
        CompOp::DstOver => "dst-over",
        CompOp::SrcIn => "src-in",
        CompOp::DstIn => "dst-in",
        CompOp::SrcOut => "src-out",
        CompOp::DstOut => "dst-out",
        CompOp::SrcAtop => "src-atop",
        CompOp::DstAtop => "dst-atop",
        CompOp::Xor => "xor",
        CompOp::Plus => "plus",
        CompOp::Multiply => "multiply",
        CompOp::Screen => "screen",
        CompOp::Overlay => "overlay",
        CompOp::Darken => "darken",
        CompOp::Lighten => "lighten",
        CompOp::ColorDodge => "color-dodge",
        CompOp::ColorBurn => "color-burn",
        CompOp::HardLight => "hard-light",
        CompOp::SoftLight => "soft-light",
        CompOp::Difference => "difference",
        CompOp::Exclusion => "exclusion",
    }
}

trait XmlWriterExt {
    fn write_id_attribute(&mut self, id: &str, opt: &WriteOptions);
    fn write_color(&mut self, name: &str, color: Color);
    fn write_units(&mut self, name: &str, units: Units, def: Units);
    fn write_transform(&mut self, name: &str, ts: Transform, opt: &WriteOptions);
    fn write_func_ref(&mut self, name: &str, id: &str, opt: &WriteOptions);
    fn write_rect_attrs(&mut self, r: NonZeroRect);
    fn write_number_list(&mut self, name: &str, list: &[f32]);
}

impl XmlWriterExt for XmlWriter {
    fn write_id_attribute(&mut self, id: &str, opt: &WriteOptions) {
        debug_assert!(!id.is_empty());

        if let Some(ref prefix) = opt.id_prefix {
            let full_id = format!("{}{}", prefix, id);
            self.write_attribute("id", &full_id);
        } else {
            self.write_attribute("id", id);
        }
    }

    fn write_color(&mut self, name: &str, c: Color) {
        static CHARS: &[u8] = b"0123456789abcdef";

        #[inline]
        fn int2hex(n: u8) -> (u8, u8) {
            (CHARS[(n >> 4) as usize], CHARS[(n & 0xf) as usize])
        }

        let (r1, r2) = int2hex(c.red);
        let (g1, g2) = int2hex(c.green);
        let (b1, b2) = int2hex(c.blue);

        self.write_attribute_raw(name, |buf| {
            buf.extend_from_slice(&[b'#', r1, r2, g1, g2, b1, b2])
        });
    }

    fn write_units(&mut self, name: &str, units: Units, def: Units) {
        if units != def {
            self.write_attribute(
                name,
                match units {
                    Units::UserSpaceOnUse => "userSpaceOnUse",
                    Units::ObjectBoundingBox => "objectBoundingBox",
                },
            );
        }
    }

    fn write_transform(&mut self, name: &str, ts: Transform, opt: &WriteOptions) {
        if ts.is_identity() {
            return;
        }

        self.write_attribute_raw(name, |buf| {
            buf.extend_from_slice(b"matrix(");
            write_num(ts.sx, buf, opt.transforms_precision);
            buf.push(b' ');
            write_num(ts.ky, buf, opt.transforms_precision);
            buf.push(b' ');
            write_num(ts.kx, buf, opt.transforms_precision);
            buf.push(b' ');
            write_num(ts.sy, buf, opt.transforms_precision);
            buf.push(b' ');
            write_num(ts.tx, buf, opt.transforms_precision);
            buf.push(b' ');
            write_num(ts.ty, buf, opt.transforms_precision);
            buf.extend_from_slice(b")");
        });
    }

    fn write_func_ref(&mut self, name: &str, id: &str, opt: &WriteOptions) {
        debug_assert!(!id.is_empty());
        let prefix = opt.id_prefix.as_deref().unwrap_or_default();
        if name == "xlink:href" {
            self.write_attribute_fmt(name, format_args!("#{}{}", prefix, id));
        } else {
            self.write_attribute_fmt(name, format_args!("url(#{}{})", prefix, id));
        }
    }

    fn write_rect_attrs(&mut self, r: NonZeroRect) {
        self.write_attribute("x", &r.x());
        self.write_attribute("y", &r.y());
        self.write_attribute("width", &r.width());
        self.write_attribute("height", &r.height());
    }

    fn write_number_list(&mut self, name: &str, list: &[f32]) {
        if list.is_empty() {
            return;
        }
        self.write_attribute_raw(name, |buf| {
            for n in list {
                buf.write_fmt(format_args!("{} ", n)).unwrap();
            }
            buf.pop();
        });
    }
}

static POW_VEC: &[f32] = &[
    1.0,
    10.0,
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
    100_000_000.0,
    1_000_000_000.0,
    10_000_000_000.0,
    100_000_000_000.0,
    1_000_000_000_000.0,
];

fn write_num(num: f32, buf: &mut Vec<u8>, precision: u8) {
    // If number is an integer, it's faster to write it as i32.
    if num.fract().approx_zero_ulps(4) {
        write!(buf, "{}", num as i32).unwrap();
        return;
    }

    // Round numbers up to the specified precision to prevent writing
    // ugly numbers like 29.999999999999996.
    let v = (num * POW_VEC[precision as usize]).round() / POW_VEC[precision as usize];

    write!(buf, "{}", v).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeExt;
    use crate::style::Fill;
    use tiny_skia_path::Size;

    #[test]
    fn empty_document() {
        let doc = Document::new(Size::from_wh(100.0, 50.0).unwrap());
        let opt = WriteOptions {
            indent: Indent::None,
            ..WriteOptions::default()
        };
        assert_eq!(
            doc.to_string(&opt),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.2\" \
             baseProfile=\"tiny\" width=\"100\" height=\"50\"/>"
        );
    }

    #[test]
    fn set_only_attributes() {
        let doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());

        let rect = doc.root().append_kind(Kind::Rect(crate::shapes::Rect {
            rect: NonZeroRect::from_xywh(1.0, 2.0, 3.0, 4.0).unwrap(),
            rx: 0.0,
            ry: 0.0,
        }));
        rect.borrow_mut().style.fill = Some(Fill {
            paint: Some(Paint::Color(Color::new_rgb(255, 0, 0))),
            ..Fill::default()
        });

        let opt = WriteOptions {
            indent: Indent::None,
            ..WriteOptions::default()
        };
        let markup = doc.to_string(&opt);
        assert!(markup.contains("fill=\"#ff0000\""), "{}", markup);
        // Inherited-only properties never appear.
        assert!(!markup.contains("stroke"), "{}", markup);
        assert!(!markup.contains("fill-rule"), "{}", markup);
    }

    #[test]
    fn integer_coordinates_written_without_fraction() {
        let mut buf = Vec::new();
        write_num(10.0, &mut buf, 8);
        assert_eq!(buf, b"10");

        buf.clear();
        write_num(1.5, &mut buf, 8);
        assert_eq!(buf, b"1.5");
    }
}
