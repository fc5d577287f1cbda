use svgtiny::tiny_skia_path::{NonZeroRect, Point, Size};
use svgtiny::{
    Color, Conditions, Document, Fill, ImageData, Kind, Marker, MarkerOrient, MarkerUnits,
    NodeExt, Opacity, Paint, PaintState, Pattern, ResolvedFont, ResolvedPaint, Stroke, Surface,
    Switch, TextRun, TextShaper, Units,
};

#[derive(Clone, Debug)]
enum Op {
    Path(PaintState),
    Rect(NonZeroRect, PaintState),
    Ellipse(PaintState),
    Line(Point, Point, PaintState),
    Polygon(usize, PaintState),
    Polyline(usize, PaintState),
    Image(PaintState),
    Text(String, PaintState),
    Tiles(NonZeroRect, Size, usize),
}

/// Records every primitive together with the state it arrived with.
#[derive(Default)]
struct RecordingSurface {
    ops: Vec<Op>,
}

impl RecordingSurface {
    fn rects(&self) -> Vec<&PaintState> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect(_, state) => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn draw_path(&mut self, _path: &svgtiny::tiny_skia_path::Path, state: &PaintState) {
        self.ops.push(Op::Path(state.clone()));
    }

    fn draw_rect(&mut self, rect: NonZeroRect, _rx: f32, _ry: f32, state: &PaintState) {
        self.ops.push(Op::Rect(rect, state.clone()));
    }

    fn draw_ellipse(&mut self, _rect: NonZeroRect, state: &PaintState) {
        self.ops.push(Op::Ellipse(state.clone()));
    }

    fn draw_line(&mut self, p1: Point, p2: Point, state: &PaintState) {
        self.ops.push(Op::Line(p1, p2, state.clone()));
    }

    fn draw_polygon(&mut self, points: &[Point], state: &PaintState) {
        self.ops.push(Op::Polygon(points.len(), state.clone()));
    }

    fn draw_polyline(&mut self, points: &[Point], state: &PaintState) {
        self.ops.push(Op::Polyline(points.len(), state.clone()));
    }

    fn draw_image(&mut self, _image: &ImageData, _rect: NonZeroRect, state: &PaintState) {
        self.ops.push(Op::Image(state.clone()));
    }

    fn draw_text(&mut self, run: &TextRun, state: &PaintState) {
        self.ops.push(Op::Text(run.text.clone(), state.clone()));
    }

    fn draw_tiles(
        &mut self,
        region: NonZeroRect,
        tile: Size,
        _state: &PaintState,
        content: &mut dyn FnMut(&mut dyn Surface),
    ) {
        let mut recorder = RecordingSurface::default();
        content(&mut recorder);
        self.ops.push(Op::Tiles(region, tile, recorder.ops.len()));
        self.ops.extend(recorder.ops);
    }
}

struct MonospaceShaper;

impl TextShaper for MonospaceShaper {
    fn measure(&self, text: &str, font: &ResolvedFont) -> f32 {
        text.chars().count() as f32 * font.size * 0.5
    }
}

fn new_document() -> Document {
    Document::new(Size::from_wh(100.0, 100.0).unwrap())
}

fn render(doc: &Document) -> RecordingSurface {
    let mut surface = RecordingSurface::default();
    doc.draw(&mut surface, &MonospaceShaper);
    surface
}

fn color_fill(color: Color) -> Fill {
    Fill {
        paint: Some(Paint::Color(color)),
        ..Fill::default()
    }
}

fn rect_kind(x: f32, y: f32, w: f32, h: f32) -> Kind {
    Kind::Rect(svgtiny::Rect {
        rect: NonZeroRect::from_xywh(x, y, w, h).unwrap(),
        rx: 0.0,
        ry: 0.0,
    })
}

fn fill_color(state: &PaintState) -> Option<Color> {
    match state.fill {
        Some(ResolvedPaint::Color(c, _)) => Some(c),
        _ => None,
    }
}

#[test]
fn unset_properties_inherit_and_set_properties_override() {
    let doc = new_document();
    let group = doc.root().append_kind(Kind::Group);
    group.borrow_mut().style.fill = Some(color_fill(Color::new_rgb(255, 0, 0)));
    group.borrow_mut().style.opacity = Opacity::new(0.5);

    // No fill of its own, inherits red.
    let plain = group.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    let _ = plain;

    // Overrides with blue.
    let styled = group.append_kind(rect_kind(20.0, 0.0, 10.0, 10.0));
    styled.borrow_mut().style.fill = Some(color_fill(Color::new_rgb(0, 0, 255)));

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 2);
    assert_eq!(fill_color(rects[0]), Some(Color::new_rgb(255, 0, 0)));
    assert_eq!(fill_color(rects[1]), Some(Color::new_rgb(0, 0, 255)));

    // Group opacity reaches both children.
    assert!((rects[0].opacity - 0.5).abs() < 1e-6);
    assert!((rects[1].opacity - 0.5).abs() < 1e-6);
}

#[test]
fn fill_none_suppresses_the_fill_pass() {
    let doc = new_document();
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    rect.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::None),
        ..Fill::default()
    });

    let surface = render(&doc);
    assert!(surface.ops.is_empty());
}

#[test]
fn stroked_shape_produces_separate_stroke_pass() {
    let doc = new_document();
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    rect.borrow_mut().style.stroke = Some(Stroke {
        paint: Some(Paint::Color(Color::new_rgb(0, 255, 0))),
        ..Stroke::default()
    });

    let surface = render(&doc);
    let rects = surface.rects();
    // Default black fill plus the stroke pass.
    assert_eq!(rects.len(), 2);
    assert!(rects[0].fill.is_some() && rects[0].stroke.is_none());
    assert!(rects[1].stroke.is_some() && rects[1].fill.is_none());
}

#[test]
fn hidden_nodes_draw_nothing() {
    let doc = new_document();
    let visible = doc.root().append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    let _ = visible;

    let hidden = doc.root().append_kind(rect_kind(20.0, 0.0, 10.0, 10.0));
    hidden.borrow_mut().visible = false;

    let display_none = doc.root().append_kind(Kind::Group);
    display_none.borrow_mut().style.display = Some(svgtiny::DisplayMode::None);
    display_none.append_kind(rect_kind(40.0, 0.0, 10.0, 10.0));

    let surface = render(&doc);
    assert_eq!(surface.rects().len(), 1);
}

#[test]
fn defs_children_are_never_drawn() {
    let doc = new_document();
    let defs = doc.root().append_kind(Kind::Defs);
    defs.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));

    let surface = render(&doc);
    assert!(surface.ops.is_empty());
}

#[test]
fn switch_draws_only_the_first_satisfied_child() {
    let doc = new_document();
    let switch = doc
        .root()
        .append_kind(Kind::Switch(Switch::with_language("de-DE")));

    let english = switch.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    english.borrow_mut().conditions = Conditions {
        required_languages: vec!["en".to_string()],
        ..Conditions::default()
    };

    let german = switch.append_kind(rect_kind(20.0, 0.0, 10.0, 10.0));
    german.borrow_mut().conditions = Conditions {
        required_languages: vec!["de".to_string()],
        ..Conditions::default()
    };
    german.borrow_mut().style.fill = Some(color_fill(Color::new_rgb(0, 0, 255)));

    // Unconditional fallback, never reached.
    switch.append_kind(rect_kind(40.0, 0.0, 10.0, 10.0));

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);
    assert_eq!(fill_color(rects[0]), Some(Color::new_rgb(0, 0, 255)));
}

#[test]
fn switch_skips_children_with_unsupported_extensions() {
    let doc = new_document();
    let switch = doc
        .root()
        .append_kind(Kind::Switch(Switch::with_language("en")));

    let extended = switch.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    extended.borrow_mut().conditions = Conditions {
        required_extensions: vec!["http://example.com/ext".to_string()],
        ..Conditions::default()
    };

    switch.append_kind(rect_kind(20.0, 0.0, 10.0, 10.0));

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);
    if let Op::Rect(r, _) = &surface.ops[0] {
        assert_eq!(r.x(), 20.0);
    } else {
        panic!("expected a rect");
    }
}

#[test]
fn use_draws_the_referenced_subtree_translated() {
    let mut doc = new_document();
    let group = doc.root().append_kind(Kind::Group);
    group.borrow_mut().id = "shape".to_string();
    group.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    doc.add_named_node(group);

    let use_node = doc.root().append_kind(Kind::Use(svgtiny::Use {
        start: Point::from_xy(30.0, 40.0),
        link: "shape".to_string(),
    }));
    let _ = use_node;

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 2);
    // The instance carries the x/y offset in its transform.
    assert_eq!(rects[1].transform.tx, 30.0);
    assert_eq!(rects[1].transform.ty, 40.0);
}

#[test]
fn cyclic_use_terminates() {
    let mut doc = new_document();
    let group = doc.root().append_kind(Kind::Group);
    group.borrow_mut().id = "self".to_string();
    group.append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    group.append_kind(Kind::Use(svgtiny::Use {
        start: Point::from_xy(5.0, 5.0),
        link: "self".to_string(),
    }));
    doc.add_named_node(group);

    // The reference expands once; the nested instance is cut off.
    let surface = render(&doc);
    assert_eq!(surface.rects().len(), 2);
}

#[test]
fn long_use_cycle_terminates_without_stack_overflow() {
    let mut doc = new_document();

    // A reference ring of 500 instances; expansion must stop when the
    // walk re-enters the first one.
    const RING: usize = 500;
    let mut nodes = Vec::with_capacity(RING);
    for i in 0..RING {
        let use_node = doc.root().append_kind(Kind::Use(svgtiny::Use {
            start: Point::from_xy(0.0, 0.0),
            link: format!("u{}", (i + 1) % RING),
        }));
        use_node.borrow_mut().id = format!("u{}", i);
        nodes.push(use_node);
    }
    for node in nodes {
        doc.add_named_node(node);
    }

    let surface = render(&doc);
    assert!(surface.ops.is_empty());
}

#[test]
fn unresolved_use_is_a_no_op() {
    let doc = new_document();
    doc.root().append_kind(Kind::Use(svgtiny::Use {
        start: Point::from_xy(0.0, 0.0),
        link: "missing".to_string(),
    }));

    let surface = render(&doc);
    assert!(surface.ops.is_empty());
}

#[test]
fn cloned_document_is_detached_from_the_original() {
    let mut doc = new_document();
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    rect.borrow_mut().id = "r".to_string();
    rect.borrow_mut().style.fill = Some(color_fill(Color::new_rgb(255, 0, 0)));
    doc.add_named_node(rect.clone());

    let clone = doc.clone();

    // Lookup in the clone must hit the copied node, not the original.
    let cloned_rect = clone.node_by_id("r").unwrap();
    assert!(cloned_rect != rect);

    // Mutating the original leaves the clone untouched.
    rect.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::None),
        ..Fill::default()
    });

    let original = render(&doc);
    let copied = render(&clone);
    assert!(original.rects().is_empty());
    assert_eq!(copied.rects().len(), 1);
    assert_eq!(
        fill_color(copied.rects()[0]),
        Some(Color::new_rgb(255, 0, 0))
    );
}

#[test]
fn auto_oriented_marker_rotates_with_the_line() {
    let mut doc = new_document();

    let marker_node = doc.root().append_kind(Kind::Marker(Marker {
        orient: MarkerOrient::Auto,
        units: MarkerUnits::UserSpaceOnUse,
        ..Marker::default()
    }));
    marker_node.borrow_mut().id = "arrow".to_string();
    marker_node.append_kind(rect_kind(0.0, 0.0, 2.0, 2.0));
    doc.add_named_node(marker_node);

    let line = doc.root().append_kind(Kind::Line(svgtiny::Line {
        p1: Point::from_xy(0.0, 0.0),
        p2: Point::from_xy(10.0, 10.0),
        markers: svgtiny::Markers {
            end: Some("arrow".to_string()),
            ..svgtiny::Markers::default()
        },
    }));
    line.borrow_mut().style.stroke = Some(Stroke {
        paint: Some(Paint::Color(Color::new_rgb(0, 0, 0))),
        ..Stroke::default()
    });

    let surface = render(&doc);
    // Only the end marker is set, so a single stamp.
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);

    // A 45 degree clockwise rotation, translated to the end point.
    let ts = rects[0].transform;
    let cos45 = std::f32::consts::FRAC_1_SQRT_2;
    assert!((ts.sx - cos45).abs() < 1e-4, "{:?}", ts);
    assert!((ts.ky - cos45).abs() < 1e-4, "{:?}", ts);
    assert!((ts.kx + cos45).abs() < 1e-4, "{:?}", ts);
    assert_eq!(ts.tx, 10.0);
    assert_eq!(ts.ty, 10.0);
}

#[test]
fn fixed_orient_marker_ignores_the_path_direction() {
    let mut doc = new_document();

    let marker_node = doc.root().append_kind(Kind::Marker(Marker {
        orient: MarkerOrient::Angle(0.0),
        units: MarkerUnits::UserSpaceOnUse,
        ..Marker::default()
    }));
    marker_node.borrow_mut().id = "dot".to_string();
    marker_node.append_kind(rect_kind(0.0, 0.0, 2.0, 2.0));
    doc.add_named_node(marker_node);

    let line = doc.root().append_kind(Kind::Line(svgtiny::Line {
        p1: Point::from_xy(0.0, 0.0),
        p2: Point::from_xy(10.0, 10.0),
        markers: svgtiny::Markers {
            end: Some("dot".to_string()),
            ..svgtiny::Markers::default()
        },
    }));
    line.borrow_mut().style.stroke = Some(Stroke {
        paint: Some(Paint::Color(Color::new_rgb(0, 0, 0))),
        ..Stroke::default()
    });

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);
    let ts = rects[0].transform;
    assert!((ts.sx - 1.0).abs() < 1e-4, "{:?}", ts);
    assert!(ts.ky.abs() < 1e-4, "{:?}", ts);
}

#[test]
fn clip_path_reference_reaches_the_primitive_state() {
    let mut doc = new_document();

    let clip_node = doc
        .root()
        .append_kind(Kind::ClipPath(svgtiny::ClipPath::default()));
    clip_node.borrow_mut().id = "cp".to_string();
    clip_node.append_kind(rect_kind(0.0, 0.0, 5.0, 5.0));
    doc.add_named_node(clip_node);

    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 50.0, 50.0));
    rect.borrow_mut().style.clip_path = Some("cp".to_string());

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);
    assert!(rects[0].clip.is_some());
}

#[test]
fn unresolved_clip_path_degrades_to_no_clipping() {
    let doc = new_document();
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 50.0, 50.0));
    rect.borrow_mut().style.clip_path = Some("missing".to_string());

    let surface = render(&doc);
    let rects = surface.rects();
    assert_eq!(rects.len(), 1);
    assert!(rects[0].clip.is_none());
}

#[test]
fn pattern_fill_tiles_the_consumer_region() {
    let mut doc = new_document();

    let pattern_node = doc.root().append_kind(Kind::Pattern(Pattern {
        units: Units::UserSpaceOnUse,
        content_units: Units::UserSpaceOnUse,
        rect: NonZeroRect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(),
    }));
    pattern_node.borrow_mut().id = "pat".to_string();
    pattern_node.append_kind(rect_kind(0.0, 0.0, 5.0, 5.0));
    doc.add_named_node(pattern_node);

    let consumer = doc.root().append_kind(rect_kind(0.0, 0.0, 100.0, 100.0));
    consumer.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::Ref("pat".to_string())),
        ..Fill::default()
    });

    let surface = render(&doc);

    let tiles: Vec<_> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::Tiles(region, tile, content_ops) => Some((*region, *tile, *content_ops)),
            _ => None,
        })
        .collect();
    assert_eq!(tiles.len(), 1);

    let (region, tile, content_ops) = tiles[0];
    assert_eq!(tile.width(), 10.0);
    assert_eq!(tile.height(), 10.0);
    // The tiled region covers the whole consumer.
    assert!(region.x() <= 0.0 && region.y() <= 0.0);
    assert!(region.right() >= 100.0 && region.bottom() >= 100.0);
    // The pattern content was rendered into the tile.
    assert_eq!(content_ops, 1);
}
