use svgtiny::tiny_skia_path::{NonZeroRect, Point, Size, Transform};
use svgtiny::{
    BaseGradient, Color, Document, Fill, GradientKind, Indent, Kind, NamedStyle, NodeExt,
    Opacity, Paint, SolidColor, Stop, Stroke, Units, WriteOptions,
};
fn compact() -> WriteOptions {
    WriteOptions {
        indent: Indent::None,
        ..WriteOptions::default()
    }
}

fn rect_kind(x: f32, y: f32, w: f32, h: f32) -> Kind {
    Kind::Rect(svgtiny::Rect {
        rect: NonZeroRect::from_xywh(x, y, w, h).unwrap(),
        rx: 0.0,
        ry: 0.0,
    })
}

#[test]
fn writes_only_set_properties() {
    let doc = Document::new(Size::from_wh(100.0, 100.0).unwrap());
    let group = doc.root().append_kind(Kind::Group);
    group.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::Color(Color::new_rgb(0, 128, 0))),
        ..Fill::default()
    });
    group.borrow_mut().style.transform = Some(Transform::from_translate(10.0, 20.0));

    group.append_kind(rect_kind(0.0, 0.0, 30.0, 40.0));

    assert_eq!(
        doc.to_string(&compact()),
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.2\" baseProfile=\"tiny\" \
         width=\"100\" height=\"100\">\
         <g transform=\"matrix(1 0 0 1 10 20)\" fill=\"#008000\">\
         <rect x=\"0\" y=\"0\" width=\"30\" height=\"40\"/>\
         </g>\
         </svg>"
    );
}

#[test]
fn writes_view_box_and_percent_dimensions() {
    let mut doc = Document::new(Size::from_wh(100.0, 50.0).unwrap());
    doc.set_size(Size::from_wh(100.0, 50.0).unwrap(), true, false);
    doc.set_view_box(NonZeroRect::from_xywh(0.0, 0.0, 200.0, 100.0));

    let markup = doc.to_string(&compact());
    assert!(markup.contains("width=\"100%\""), "{}", markup);
    assert!(markup.contains("height=\"50\""), "{}", markup);
    assert!(markup.contains("viewBox=\"0 0 200 100\""), "{}", markup);
}

#[test]
fn writes_paint_servers_into_defs() {
    let mut doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());
    doc.add_named_style(
        "solid",
        NamedStyle::Solid(SolidColor {
            color: Color::new_rgb(255, 0, 0),
            opacity: Opacity::ONE,
        }),
    );
    doc.add_named_style(
        "grad",
        NamedStyle::Gradient {
            base: BaseGradient {
                units: Units::ObjectBoundingBox,
                transform: Transform::identity(),
                spread_method: svgtiny::SpreadMethod::Reflect,
                stops: vec![
                    Stop {
                        offset: Opacity::ZERO,
                        color: Color::new_rgb(0, 0, 0),
                        opacity: Opacity::ONE,
                    },
                    Stop {
                        offset: Opacity::ONE,
                        color: Color::new_rgb(255, 255, 255),
                        opacity: Opacity::new(0.5).unwrap(),
                    },
                ],
                stop_link: None,
            },
            kind: GradientKind::Linear {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
            },
        },
    );

    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 10.0, 10.0));
    rect.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::Ref("grad".to_string())),
        ..Fill::default()
    });

    let markup = doc.to_string(&compact());
    assert!(markup.contains("<defs>"), "{}", markup);
    assert!(
        markup.contains("<solidColor id=\"solid\" solid-color=\"#ff0000\"/>"),
        "{}",
        markup
    );
    assert!(
        markup.contains("<linearGradient id=\"grad\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"0\" spreadMethod=\"reflect\">"),
        "{}",
        markup
    );
    assert!(
        markup.contains("<stop offset=\"1\" stop-color=\"#ffffff\" stop-opacity=\"0.5\"/>"),
        "{}",
        markup
    );
    assert!(markup.contains("fill=\"url(#grad)\""), "{}", markup);
}

#[test]
fn use_reference_needs_the_xlink_namespace() {
    let mut doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 5.0, 5.0));
    rect.borrow_mut().id = "r".to_string();
    doc.add_named_node(rect);

    doc.root().append_kind(Kind::Use(svgtiny::Use {
        start: Point::from_xy(5.0, 5.0),
        link: "r".to_string(),
    }));

    let markup = doc.to_string(&compact());
    assert!(
        markup.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""),
        "{}",
        markup
    );
    assert!(
        markup.contains("<use x=\"5\" y=\"5\" xlink:href=\"#r\"/>"),
        "{}",
        markup
    );
}

#[test]
fn id_prefix_applies_to_definitions_and_references() {
    let mut doc = Document::new(Size::from_wh(10.0, 10.0).unwrap());
    let rect = doc.root().append_kind(rect_kind(0.0, 0.0, 5.0, 5.0));
    rect.borrow_mut().id = "r".to_string();
    rect.borrow_mut().style.clip_path = Some("cp".to_string());
    doc.add_named_node(rect);

    let opt = WriteOptions {
        id_prefix: Some("x-".to_string()),
        indent: Indent::None,
        ..WriteOptions::default()
    };
    let markup = doc.to_string(&opt);
    assert!(markup.contains("id=\"x-r\""), "{}", markup);
    assert!(markup.contains("clip-path=\"url(#x-cp)\""), "{}", markup);
}

#[test]
fn circles_and_ellipses_write_center_geometry() {
    let doc = Document::new(Size::from_wh(100.0, 100.0).unwrap());
    doc.root().append_kind(Kind::Ellipse(svgtiny::Ellipse {
        rect: NonZeroRect::from_xywh(10.0, 10.0, 20.0, 20.0).unwrap(),
        circle: true,
    }));
    doc.root().append_kind(Kind::Ellipse(svgtiny::Ellipse {
        rect: NonZeroRect::from_xywh(0.0, 0.0, 40.0, 20.0).unwrap(),
        circle: false,
    }));

    let markup = doc.to_string(&compact());
    assert!(
        markup.contains("<circle cx=\"20\" cy=\"20\" r=\"10\"/>"),
        "{}",
        markup
    );
    assert!(
        markup.contains("<ellipse cx=\"20\" cy=\"10\" rx=\"20\" ry=\"10\"/>"),
        "{}",
        markup
    );
}

#[test]
fn clone_serializes_identically() {
    let mut doc = Document::new(Size::from_wh(100.0, 100.0).unwrap());
    doc.set_view_box(NonZeroRect::from_xywh(0.0, 0.0, 100.0, 100.0));
    doc.add_named_style(
        "solid",
        NamedStyle::Solid(SolidColor {
            color: Color::new_rgb(0, 0, 255),
            opacity: Opacity::ONE,
        }),
    );

    let group = doc.root().append_kind(Kind::Group);
    group.borrow_mut().id = "layer".to_string();
    group.borrow_mut().style.opacity = Opacity::new(0.75);
    doc.add_named_node(group.clone());

    let rect = group.append_kind(rect_kind(5.0, 5.0, 20.0, 10.0));
    rect.borrow_mut().style.fill = Some(Fill {
        paint: Some(Paint::Ref("solid".to_string())),
        ..Fill::default()
    });
    rect.borrow_mut().style.stroke = Some(Stroke {
        paint: Some(Paint::Color(Color::new_rgb(0, 0, 0))),
        dash_array: Some(vec![1.0, 2.0]),
        ..Stroke::default()
    });

    doc.root().append_kind(Kind::Use(svgtiny::Use {
        start: Point::from_xy(50.0, 0.0),
        link: "layer".to_string(),
    }));

    let clone = doc.clone();
    let opt = WriteOptions::default();
    assert_eq!(doc.to_string(&opt), clone.to_string(&opt));
}
