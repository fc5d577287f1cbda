// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scene graph nodes.
//!
//! The ownership tree is guaranteed acyclic; the reference graph
//! (`use`, fill patterns, clip paths, markers) is not, so traversal
//! guards re-entrancy with per-node recursion flags.

use std::cell::{Cell, Ref};

use tiny_skia_path::Rect;

use crate::document::Document;
use crate::shapes;
use crate::state::{DrawContext, FallbackShaper, PaintState, TextShaper};
use crate::structure::{self, ClipPath, Marker, Pattern, Switch};
use crate::style::{DisplayMode, Style};
use crate::text;

/// Alias for `rctree::Node<NodeData>`.
///
/// Parent links are weak; children are owned in paint order.
pub type Node = rctree::Node<NodeData>;

/// Conditional-processing attributes.
///
/// An empty list is "attribute not present" and is trivially satisfied.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Conditions {
    /// `requiredFeatures`
    pub required_features: Vec<String>,
    /// `requiredExtensions`
    pub required_extensions: Vec<String>,
    /// `systemLanguage`
    pub required_languages: Vec<String>,
    /// `requiredFormats`
    pub required_formats: Vec<String>,
    /// `requiredFonts`
    pub required_fonts: Vec<String>,
}

impl Conditions {
    /// Evaluates all five lists against the supported feature set and the
    /// active system language prefix.
    ///
    /// No extensions, formats or fonts are ever satisfiable, so a
    /// non-empty list there rejects the node.
    pub fn satisfied(&self, language_prefix: &str) -> bool {
        if !self
            .required_features
            .iter()
            .all(|f| structure::is_supported_svg_feature(f))
        {
            return false;
        }

        if !self.required_extensions.is_empty() {
            return false;
        }

        if !self.required_languages.is_empty()
            && !self
                .required_languages
                .iter()
                .any(|lang| lang.starts_with(language_prefix))
        {
            return false;
        }

        self.required_formats.is_empty() && self.required_fonts.is_empty()
    }

    /// Checks that no list is present.
    pub fn is_empty(&self) -> bool {
        self.required_features.is_empty()
            && self.required_extensions.is_empty()
            && self.required_languages.is_empty()
            && self.required_formats.is_empty()
            && self.required_fonts.is_empty()
    }
}

/// The closed set of node kinds.
#[derive(Clone, Debug)]
pub enum Kind {
    /// A `g` container.
    Group,
    /// A `defs` container; children are never drawn, only referenced.
    Defs,
    /// A `switch` container.
    Switch(Switch),
    /// A `marker` definition, stamped at path vertices.
    Marker(Marker),
    /// A `pattern` paint server.
    Pattern(Pattern),
    /// A `clipPath` definition.
    ClipPath(ClipPath),
    /// A `path` shape.
    Path(shapes::Path),
    /// A `rect` shape.
    Rect(shapes::Rect),
    /// An `ellipse` or `circle` shape.
    Ellipse(shapes::Ellipse),
    /// A `line` shape.
    Line(shapes::Line),
    /// A `polygon` shape.
    Polygon(shapes::Poly),
    /// A `polyline` shape.
    Polyline(shapes::Poly),
    /// An `image` element.
    Image(shapes::Image),
    /// A `text` element.
    Text(text::Text),
    /// A `use` reference.
    Use(shapes::Use),
    /// A `video` element; carried but never rendered.
    Video,
    /// An `animation` element; carried but never rendered.
    Animation,
}

impl Kind {
    /// Checks whether this kind owns and traverses children.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Kind::Group
                | Kind::Defs
                | Kind::Switch(_)
                | Kind::Marker(_)
                | Kind::Pattern(_)
                | Kind::ClipPath(_)
        )
    }
}

/// The data stored by every node.
#[derive(Clone, Debug)]
pub struct NodeData {
    /// Element id. Can be empty.
    pub id: String,
    /// The `class` attribute value. Carried for serialization only.
    pub xml_class: String,
    /// The `visibility` flag.
    pub visible: bool,
    /// Conditional-processing attributes.
    pub conditions: Conditions,
    /// Explicitly-set style properties.
    pub style: Style,
    /// Kind-specific payload.
    pub kind: Kind,

    pub(crate) cached_bounds: Cell<Option<Rect>>,
    pub(crate) bounds_valid: Cell<bool>,
    pub(crate) recursing: Cell<bool>,
}

impl NodeData {
    /// Creates node data of the given kind with default attributes.
    pub fn new(kind: Kind) -> Self {
        NodeData {
            id: String::new(),
            xml_class: String::new(),
            visible: true,
            conditions: Conditions::default(),
            style: Style::default(),
            kind,
            cached_bounds: Cell::new(None),
            bounds_valid: Cell::new(false),
            recursing: Cell::new(false),
        }
    }

    /// Checks whether traversal should descend into this node at all.
    ///
    /// Invisible and `display: none` nodes are skipped identically by the
    /// draw pass and the bounds pass.
    pub fn should_render(&self) -> bool {
        self.visible && self.style.display != Some(DisplayMode::None)
    }

    /// Drops the cached bounds. Parse-time mutation must call this after
    /// changing geometry.
    pub fn invalidate_bounds(&self) {
        self.bounds_valid.set(false);
        self.cached_bounds.set(None);
    }
}

/// Helper methods on [`Node`].
pub trait NodeExt {
    /// Returns node's id.
    ///
    /// If a node doesn't have an id - an empty string will be returned.
    fn id(&self) -> Ref<str>;

    /// Appends a new child created from `kind` and returns it.
    fn append_kind(&self, kind: Kind) -> Node;

    /// Checks that `other` is an ancestor of this node.
    fn has_ancestor(&self, other: &Node) -> bool;

    /// Returns the node's bounds with its own style applied, computed
    /// from the default render state and cached.
    ///
    /// Text extents are approximated unless queried through a real
    /// shaper during drawing.
    fn transformed_bounds(&self, doc: &Document) -> Option<Rect>;
}

impl NodeExt for Node {
    #[inline]
    fn id(&self) -> Ref<str> {
        Ref::map(self.borrow(), |v| v.id.as_str())
    }

    fn append_kind(&self, kind: Kind) -> Node {
        let new_node = Node::new(NodeData::new(kind));
        self.append(new_node.clone());
        new_node
    }

    fn has_ancestor(&self, other: &Node) -> bool {
        self.ancestors().skip(1).any(|n| n == *other)
    }

    fn transformed_bounds(&self, doc: &Document) -> Option<Rect> {
        if self.borrow().bounds_valid.get() {
            return self.borrow().cached_bounds.get();
        }

        let bounds = bounds_with_style(self, doc, &PaintState::default(), &FallbackShaper);
        let data = self.borrow();
        data.cached_bounds.set(bounds);
        data.bounds_valid.set(true);
        bounds
    }
}

/// Draws a node, dispatching on its kind.
///
/// Non-renderable nodes are skipped before any style is applied.
pub(crate) fn draw(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    let data = node.borrow();
    if !data.should_render() {
        return;
    }

    match data.kind {
        Kind::Group => structure::draw_group(node, doc, ctx),
        Kind::Switch(_) => structure::draw_switch(node, doc, ctx),
        // Referenced-only containers never draw during traversal.
        Kind::Defs | Kind::Marker(_) | Kind::Pattern(_) | Kind::ClipPath(_) => {}
        Kind::Path(_)
        | Kind::Rect(_)
        | Kind::Ellipse(_)
        | Kind::Line(_)
        | Kind::Polygon(_)
        | Kind::Polyline(_)
        | Kind::Image(_) => shapes::draw(node, doc, ctx),
        Kind::Text(_) => text::draw(node, doc, ctx),
        Kind::Use(_) => shapes::draw_use(node, doc, ctx),
        Kind::Video => {
            log::warn!("video elements are not supported");
        }
        Kind::Animation => {
            log::warn!("animation elements are not supported");
        }
    }
}

/// Returns the node's bounds under `parent_state` with the node's own
/// style applied first, like the draw pass would.
pub(crate) fn bounds_with_style(
    node: &Node,
    doc: &Document,
    parent_state: &PaintState,
    shaper: &dyn TextShaper,
) -> Option<Rect> {
    let data = node.borrow();
    if !data.should_render() {
        return None;
    }

    let state = crate::document::cascade(&data.style, parent_state, doc);
    match data.kind {
        Kind::Group | Kind::Defs | Kind::Switch(_) | Kind::Marker(_) | Kind::Pattern(_)
        | Kind::ClipPath(_) => {
            let mut bbox = crate::geom::BBox::default();
            for child in node.children() {
                if let Some(b) = bounds_with_style(&child, doc, &state, shaper) {
                    bbox = bbox.expand(b);
                }
            }
            bbox.to_rect()
        }
        Kind::Path(_)
        | Kind::Rect(_)
        | Kind::Ellipse(_)
        | Kind::Line(_)
        | Kind::Polygon(_)
        | Kind::Polyline(_)
        | Kind::Image(_) => shapes::bounds(node, &state),
        Kind::Text(_) => text::bounds(node, doc, &state, shaper),
        Kind::Use(_) => shapes::use_bounds(node, doc, &state, shaper),
        Kind::Video | Kind::Animation => None,
    }
}

/// Cascades the node's set properties over the active state and makes
/// the result current. Must be paired with [`revert_style`].
pub(crate) fn apply_style(node: &Node, doc: &Document, ctx: &mut DrawContext) {
    let data = node.borrow();
    let mut state = crate::document::cascade(&data.style, ctx.state(), doc);
    if let Some(ref clip_id) = data.style.clip_path {
        structure::apply_clip(&mut state, clip_id, node, doc);
    }
    drop(data);
    ctx.push(state);
}

/// Restores the state active before the matching [`apply_style`].
pub(crate) fn revert_style(ctx: &mut DrawContext) {
    ctx.pop();
}
