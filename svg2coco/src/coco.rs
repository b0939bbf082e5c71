use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use serde::Serialize;

use crate::geometry::{Bounds, PixelPoint};
use crate::Error;

#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    pub id: u32,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub id: u32,
    #[serde(rename = "categorie_id")]
    pub category_id: u32,
    pub segmentation: Vec<Vec<i64>>,
    pub image_id: u32,
    pub iscrowd: u8,
    pub bbox: [i64; 4],
    pub area: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CocoDataset {
    pub images: Vec<ImageRecord>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
    #[serde(rename = "type")]
    pub kind: String,
    pub licenses: String,
    pub info: String,
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub label: String,
    pub points: Vec<PixelPoint>,
    pub bounds: Bounds,
}

#[derive(Debug, Clone)]
pub struct DrawingRecord {
    pub file_name: String, // raster name, not the source file
    pub width: u32,
    pub height: u32,
    pub shapes: Vec<Shape>,
}

// Records arrive in sorted file order and every id derives from that order,
// so reruns are identical. Category ids are 0..k-1 over the sorted labels.
pub fn assemble(records: Vec<DrawingRecord>) -> CocoDataset {
    let mut labels = BTreeSet::new();
    for record in &records {
        for shape in &record.shapes {
            labels.insert(shape.label.clone());
        }
    }
    let category_ids: BTreeMap<String, u32> = labels
        .into_iter()
        .enumerate()
        .map(|(id, label)| (label, id as u32))
        .collect();

    let categories = category_ids
        .iter()
        .map(|(name, id)| Category {
            id: *id,
            name: name.clone(),
            supercategory: String::new(),
        })
        .collect();

    let mut images = Vec::with_capacity(records.len());
    let mut annotations = Vec::new();
    for (image_id, record) in records.into_iter().enumerate() {
        let image_id = image_id as u32;
        images.push(ImageRecord {
            id: image_id,
            file_name: record.file_name,
            height: record.height,
            width: record.width,
        });
        for shape in record.shapes {
            annotations.push(Annotation {
                id: annotations.len() as u32,
                category_id: category_ids[&shape.label],
                segmentation: vec![shape.points.iter().flat_map(|p| [p.x, p.y]).collect()],
                image_id,
                iscrowd: 0,
                bbox: shape.bounds.to_bbox(),
                area: shape.bounds.area(),
            });
        }
    }

    CocoDataset {
        images,
        annotations,
        categories,
        kind: String::new(),
        licenses: String::new(),
        info: String::new(),
    }
}

pub fn write_dataset<W: Write>(mut writer: W, dataset: &CocoDataset) -> Result<(), Error> {
    info!(
        "writing {} annotations across {} images in {} categories",
        dataset.annotations.len(),
        dataset.images.len(),
        dataset.categories.len()
    );
    serde_json::to_writer_pretty(&mut writer, dataset)?;
    writeln!(writer)?;
    Ok(())
}

#[test]
fn category_ids_follow_label_order() {
    let shape = |label: &str, x: i64| Shape {
        label: label.to_string(),
        points: vec![PixelPoint { x, y: 0 }, PixelPoint { x: x + 2, y: 3 }],
        bounds: Bounds {
            min_x: x,
            min_y: 0,
            max_x: x + 2,
            max_y: 3,
        },
    };
    let records = vec![
        DrawingRecord {
            file_name: "a.jpg".to_string(),
            width: 10,
            height: 10,
            shapes: vec![shape("#ff0000", 0), shape("#0000ff", 4)],
        },
        DrawingRecord {
            file_name: "b.jpg".to_string(),
            width: 20,
            height: 20,
            shapes: vec![shape("#00ff00", 1)],
        },
    ];

    let dataset = assemble(records);
    let names: Vec<&str> = dataset.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["#0000ff", "#00ff00", "#ff0000"]);
    let ids: Vec<u32> = dataset.categories.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    assert_eq!(dataset.annotations[0].category_id, 2);
    assert_eq!(dataset.annotations[0].image_id, 0);
    assert_eq!(dataset.annotations[1].category_id, 0);
    assert_eq!(dataset.annotations[2].category_id, 1);
    assert_eq!(dataset.annotations[2].image_id, 1);
    let ids: Vec<u32> = dataset.annotations.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn wire_format() {
    use serde_json::json;

    let points = vec![
        PixelPoint { x: 0, y: 0 },
        PixelPoint { x: 5, y: 0 },
        PixelPoint { x: 5, y: 5 },
    ];
    let dataset = assemble(vec![DrawingRecord {
        file_name: "triangle.jpg".to_string(),
        width: 10,
        height: 10,
        shapes: vec![Shape {
            label: "#0000ff".to_string(),
            bounds: Bounds::of(&points).unwrap(),
            points,
        }],
    }]);

    let value = serde_json::to_value(&dataset).unwrap();
    assert_eq!(
        value,
        json!({
            "images": [{"id": 0, "file_name": "triangle.jpg", "height": 10, "width": 10}],
            "annotations": [{
                "id": 0,
                "categorie_id": 0,
                "segmentation": [[0, 0, 5, 0, 5, 5]],
                "image_id": 0,
                "iscrowd": 0,
                "bbox": [0, 0, 5, 5],
                "area": 25,
            }],
            "categories": [{"id": 0, "name": "#0000ff", "supercategory": ""}],
            "type": "",
            "licenses": "",
            "info": "",
        })
    );
}

#[test]
fn writes_newline_terminated_json() {
    let dataset = assemble(vec![DrawingRecord {
        file_name: "empty.jpg".to_string(),
        width: 4,
        height: 4,
        shapes: vec![],
    }]);
    let mut out = Vec::new();
    write_dataset(&mut out, &dataset).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with('{'));
    assert!(text.ends_with("}\n"));
}
