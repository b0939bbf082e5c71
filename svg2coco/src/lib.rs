#[macro_use]
extern crate tracing;

pub mod coco;
pub mod geometry;
pub mod svg;

use std::path::{Path, PathBuf};

use crate::coco::{CocoDataset, DrawingRecord, Shape};
use crate::geometry::{resolve_relative, Bounds};
use crate::svg::parse::{Coordinates, PathDialect};
use crate::svg::{read_drawing, Drawing, DrawingError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input directory `{}` not found or not a directory", .0.display())]
    InputNotFound(PathBuf),
    #[error("could not read `{}`", .path.display())]
    ReadDrawing {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed drawing `{file}`: {source}")]
    MalformedDrawing { file: String, source: DrawingError },
    #[error("unsupported path dialect in `{file}`: `{d}`")]
    UnsupportedPathDialect { file: String, d: String },
    #[error("no annotations produced from `{}`, refusing to emit an empty dataset", .0.display())]
    EmptyDataset(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub fn build_dataset(input: &Path) -> Result<CocoDataset, Error> {
    let files = scan_directory(input)?;
    info!("found {} drawing files in `{}`", files.len(), input.display());

    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        records.push(convert_file(path)?);
    }
    if records.iter().all(|r| r.shapes.is_empty()) {
        return Err(Error::EmptyDataset(input.to_path_buf()));
    }
    Ok(coco::assemble(records))
}

// Sorted so image and annotation ids are stable across runs.
pub fn scan_directory(input: &Path) -> Result<Vec<PathBuf>, Error> {
    if !input.is_dir() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "svg") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn convert_file(path: &Path) -> Result<DrawingRecord, Error> {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path).map_err(|source| Error::ReadDrawing {
        path: path.to_path_buf(),
        source,
    })?;
    let drawing = read_drawing(&content).map_err(|source| Error::MalformedDrawing {
        file: file.clone(),
        source,
    })?;
    convert_drawing(&file, &drawing)
}

pub fn convert_drawing(file: &str, drawing: &Drawing) -> Result<DrawingRecord, Error> {
    let scale = drawing.viewport.scale_to(drawing.width, drawing.height);
    let mut shapes = Vec::with_capacity(drawing.paths.len());

    for path in &drawing.paths {
        let dialect =
            PathDialect::detect(&path.d).ok_or_else(|| Error::UnsupportedPathDialect {
                file: file.to_string(),
                d: path.d.clone(),
            })?;
        let (raw, coords) = dialect.decode(&path.d).map_err(|source| {
            Error::MalformedDrawing {
                file: file.to_string(),
                source: DrawingError::BadPathData {
                    d: path.d.clone(),
                    source,
                },
            }
        })?;
        let absolute = match coords {
            Coordinates::Absolute => raw,
            Coordinates::Relative => resolve_relative(&raw),
        };
        let points = drawing
            .viewport
            .project(scale, &absolute)
            .map_err(|source| Error::MalformedDrawing {
                file: file.to_string(),
                source: DrawingError::PathOutOfRange {
                    d: path.d.clone(),
                    source,
                },
            })?;
        let bounds = Bounds::of(&points).ok_or_else(|| Error::MalformedDrawing {
            file: file.to_string(),
            source: DrawingError::EmptyPath { d: path.d.clone() },
        })?;
        debug!(
            "{file}: {dialect:?} path, {} points, label `{}`",
            points.len(),
            path.stroke
        );
        shapes.push(Shape {
            label: path.stroke.clone(),
            points,
            bounds,
        });
    }

    Ok(DrawingRecord {
        file_name: raster_name(file),
        width: drawing.width,
        height: drawing.height,
        shapes,
    })
}

// The dataset names the exported rasters, not the source files.
fn raster_name(file: &str) -> String {
    match file.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.jpg"),
        None => format!("{file}.jpg"),
    }
}

#[cfg(test)]
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("svg2coco-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn freehand_pipeline() {
    use crate::geometry::PixelPoint;

    let content = r##"<svg width="200px" height="200px" viewBox="0 0 100 100">
  <path d="m 10,10 c 1,1 2,2 3,3 4,4 5,5 6,6" stroke="#ff0000" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let record = convert_drawing("sketch.svg", &drawing).unwrap();

    assert_eq!(record.file_name, "sketch.jpg");
    assert_eq!((record.width, record.height), (200, 200));
    let shape = &record.shapes[0];
    assert_eq!(shape.label, "#ff0000");
    assert_eq!(
        shape.points,
        vec![
            PixelPoint { x: 20, y: 20 },
            PixelPoint { x: 26, y: 26 },
            PixelPoint { x: 38, y: 38 },
        ]
    );
    assert_eq!(shape.bounds.to_bbox(), [20, 20, 18, 18]);
    assert_eq!(shape.bounds.area(), 324);
}

#[test]
fn straight_pipeline() {
    use crate::geometry::PixelPoint;

    let content = r##"<svg width="10px" height="10px" viewBox="0 0 10 10">
  <path d="m 0,0 5,0 0,5 z" stroke="#0000ff" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let record = convert_drawing("triangle.svg", &drawing).unwrap();

    let shape = &record.shapes[0];
    assert_eq!(
        shape.points,
        vec![
            PixelPoint { x: 0, y: 0 },
            PixelPoint { x: 5, y: 0 },
            PixelPoint { x: 5, y: 5 },
        ]
    );
    assert_eq!(shape.bounds.to_bbox(), [0, 0, 5, 5]);
    assert_eq!(shape.bounds.area(), 25);
}

#[test]
fn pen_pipeline() {
    use crate::geometry::PixelPoint;

    let content = r##"<svg width="20px" height="20px" viewBox="0 0 10 10">
  <path d="M 0,0 Q 1,1 2,2 Q 3,3 4,4" stroke="#00ff00" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let record = convert_drawing("pen.svg", &drawing).unwrap();

    // Absolute input skips the resolver; only projection applies.
    assert_eq!(
        record.shapes[0].points,
        vec![PixelPoint { x: 0, y: 0 }, PixelPoint { x: 4, y: 4 }]
    );
}

#[test]
fn foreign_dialect_is_fatal() {
    let content = r##"<svg width="10px" height="10px" viewBox="0 0 10 10">
  <path d="M 0,0 L 5,5" stroke="#000000" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let err = convert_drawing("lines.svg", &drawing).unwrap_err();
    match err {
        Error::UnsupportedPathDialect { file, d } => {
            assert_eq!(file, "lines.svg");
            assert_eq!(d, "M 0,0 L 5,5");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn zero_point_path_is_fatal() {
    let content = r##"<svg width="10px" height="10px" viewBox="0 0 10 10">
  <path d="Q 1,1" stroke="#000000" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let err = convert_drawing("thin.svg", &drawing).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedDrawing {
            source: DrawingError::EmptyPath { .. },
            ..
        }
    ));
}

#[test]
fn oversized_coordinates_are_fatal() {
    let content = r##"<svg width="10px" height="10px" viewBox="0 0 10 10">
  <path d="m -1e300,-1e300 2e300,2e300" stroke="#000000" />
</svg>"##;
    let drawing = read_drawing(content).unwrap();
    let err = convert_drawing("huge.svg", &drawing).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedDrawing {
            source: DrawingError::PathOutOfRange { .. },
            ..
        }
    ));
}

#[test]
fn directory_dataset() {
    let dir = scratch_dir("directory_dataset");
    // Written out of sorted order on purpose.
    std::fs::write(
        dir.join("b.svg"),
        r##"<svg width="10px" height="10px" viewBox="0 0 10 10">
  <path d="m 0,0 5,0 0,5 z" stroke="#ff0000" />
</svg>"##,
    )
    .unwrap();
    std::fs::write(
        dir.join("a.svg"),
        r##"<svg width="200px" height="200px" viewBox="0 0 100 100">
  <path d="m 10,10 c 1,1 2,2 3,3 4,4 5,5 6,6" stroke="#00ff00" />
  <path d="m 1,1 2,0" stroke="#0000ff" />
</svg>"##,
    )
    .unwrap();
    std::fs::write(
        dir.join("c.svg"),
        r#"<svg width="10px" height="10px" viewBox="0 0 10 10"></svg>"#,
    )
    .unwrap();
    std::fs::write(dir.join("notes.txt"), "not a drawing").unwrap();

    let dataset = build_dataset(&dir).unwrap();

    let names: Vec<&str> = dataset.images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert_eq!(dataset.images[0].id, 0);
    assert_eq!(dataset.images[2].id, 2);

    // c.svg holds no paths but keeps its image record.
    assert_eq!(dataset.annotations.len(), 3);
    assert_eq!(dataset.annotations[0].image_id, 0);
    assert_eq!(dataset.annotations[2].image_id, 1);

    let categories: Vec<&str> = dataset
        .categories
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    dbg!(&categories);
    assert_eq!(categories, vec!["#0000ff", "#00ff00", "#ff0000"]);

    let rerun = build_dataset(&dir).unwrap();
    assert_eq!(
        serde_json::to_string(&dataset).unwrap(),
        serde_json::to_string(&rerun).unwrap()
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_directory_is_fatal() {
    let dir = scratch_dir("empty_directory_is_fatal");
    let err = build_dataset(&dir).unwrap_err();
    assert!(matches!(err, Error::EmptyDataset(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn pathless_corpus_is_fatal() {
    let dir = scratch_dir("pathless_corpus_is_fatal");
    std::fs::write(
        dir.join("blank.svg"),
        r#"<svg width="10px" height="10px" viewBox="0 0 10 10"></svg>"#,
    )
    .unwrap();
    let err = build_dataset(&dir).unwrap_err();
    assert!(matches!(err, Error::EmptyDataset(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_directory_is_fatal() {
    let err = build_dataset(Path::new("/no/such/place")).unwrap_err();
    assert!(matches!(err, Error::InputNotFound(_)));
}
