use std::collections::HashMap;

use crate::geometry::Viewport;
use crate::svg::{parse, Drawing, DrawingError, StrokePath};

// The first svg tag supplies the header; path tags are collected at any
// depth. Groups carry no transforms in these drawings.
pub fn read_drawing(content: &str) -> Result<Drawing, DrawingError> {
    let parser = svg::read(content).map_err(|e| DrawingError::Xml(e.to_string()))?;

    let mut header: Option<(Viewport, u32, u32)> = None;
    let mut paths = Vec::new();

    for event in parser {
        match event {
            svg::parser::Event::Error(e) => return Err(DrawingError::Xml(e.to_string())),
            svg::parser::Event::Tag(
                "svg",
                svg::node::element::tag::Type::Start | svg::node::element::tag::Type::Empty,
                attrs,
            ) => {
                if header.is_none() {
                    header = Some(read_header(&attrs)?);
                }
            }
            svg::parser::Event::Tag(
                "path",
                svg::node::element::tag::Type::Start | svg::node::element::tag::Type::Empty,
                attrs,
            ) => {
                let d = attrs.get("d").ok_or_else(|| DrawingError::MissingPathData {
                    attrs: sorted_keys(&attrs),
                })?;
                let stroke = attrs
                    .get("stroke")
                    .map(ToString::to_string)
                    .unwrap_or_default();
                paths.push(StrokePath {
                    d: d.to_string(),
                    stroke,
                });
            }
            _ => {}
        }
    }

    let (viewport, width, height) = header.ok_or(DrawingError::MissingSvgElement)?;
    debug!(
        "drawing: {}x{} raster, {} path elements",
        width,
        height,
        paths.len()
    );
    Ok(Drawing {
        viewport,
        width,
        height,
        paths,
    })
}

fn read_header(
    attrs: &HashMap<String, svg::node::Value>,
) -> Result<(Viewport, u32, u32), DrawingError> {
    let viewbox = attrs.get("viewBox").ok_or(DrawingError::MissingViewBox)?;
    let viewport = parse::viewbox(viewbox).ok_or_else(|| DrawingError::BadViewBox {
        value: viewbox.to_string(),
    })?;
    let width = read_dimension(attrs, "width")?;
    let height = read_dimension(attrs, "height")?;
    Ok((viewport, width, height))
}

fn read_dimension(
    attrs: &HashMap<String, svg::node::Value>,
    name: &'static str,
) -> Result<u32, DrawingError> {
    let value = attrs.get(name).ok_or(DrawingError::MissingDimension { name })?;
    parse::pixel_dimension(value).ok_or_else(|| DrawingError::BadDimension {
        name,
        value: value.to_string(),
    })
}

fn sorted_keys(attrs: &HashMap<String, svg::node::Value>) -> Vec<String> {
    let mut keys: Vec<String> = attrs.keys().cloned().collect();
    keys.sort();
    keys
}

#[test]
fn read_drawing_attrs() {
    let content = r##"<svg width="200px" height="200px" viewBox="0 0 100 100">
  <g inkscape:label="layer1">
    <path d="m 10,10 c 1,1 2,2 3,3 4,4 5,5 6,6" stroke="#ff0000" />
  </g>
  <path d="m 0,0 5,0 0,5 z" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    assert_eq!(drawing.width, 200);
    assert_eq!(drawing.height, 200);
    assert_eq!(drawing.viewport.min_x, 0.0);
    assert_eq!(drawing.viewport.width, 100.0);
    assert_eq!(drawing.paths.len(), 2);
    assert_eq!(drawing.paths[0].d, "m 10,10 c 1,1 2,2 3,3 4,4 5,5 6,6");
    assert_eq!(drawing.paths[0].stroke, "#ff0000");
    assert_eq!(drawing.paths[1].stroke, "");
}

#[test]
fn read_drawing_without_paths() {
    let drawing = read_drawing(r#"<svg width="10" height="10" viewBox="0 0 10 10"></svg>"#).unwrap();
    assert!(drawing.paths.is_empty());
}

#[test]
fn header_is_mandatory() {
    let err = read_drawing(r#"<svg width="10" height="10"><path d="m 0,0 1,1" /></svg>"#)
        .unwrap_err();
    assert!(matches!(err, DrawingError::MissingViewBox));

    let err = read_drawing(r#"<svg height="10" viewBox="0 0 10 10" />"#).unwrap_err();
    assert!(matches!(
        err,
        DrawingError::MissingDimension { name: "width" }
    ));

    let err = read_drawing(r#"<svg width="w" height="10" viewBox="0 0 10 10" />"#).unwrap_err();
    assert!(matches!(err, DrawingError::BadDimension { name: "width", .. }));

    let err = read_drawing(r#"<path d="m 0,0 1,1" />"#).unwrap_err();
    assert!(matches!(err, DrawingError::MissingSvgElement));
}

#[test]
fn path_data_is_mandatory() {
    let err = read_drawing(
        r##"<svg width="10" height="10" viewBox="0 0 10 10"><path stroke="#000000" /></svg>"##,
    )
    .unwrap_err();
    match err {
        DrawingError::MissingPathData { attrs } => assert_eq!(attrs, vec!["stroke".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn broken_xml_is_fatal() {
    let err = read_drawing(
        r#"<svg width="10" height="10" viewBox="0 0 10 10"><path d="m 0,0 1,1" </svg>"#,
    )
    .unwrap_err();
    assert!(matches!(err, DrawingError::Xml(_)));
}
