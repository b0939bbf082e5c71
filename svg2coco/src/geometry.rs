#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("scaled coordinate ({x}, {y}) cannot land on the pixel grid")]
pub struct OutOfRange {
    pub x: f64,
    pub y: f64,
}

// 2^30: keeps every extent within 2^31 and every box area within 2^62,
// inside i64.
const PIXEL_RANGE: f64 = 1_073_741_824.0;

impl Viewport {
    pub fn scale_to(&self, width: u32, height: u32) -> Scale {
        Scale {
            x: f64::from(width) / self.width,
            y: f64::from(height) / self.height,
        }
    }

    // Rounding is half-away-from-zero.
    pub fn project(&self, scale: Scale, points: &[Point]) -> Result<Vec<PixelPoint>, OutOfRange> {
        points
            .iter()
            .map(|p| {
                let x = ((p.x - self.min_x) * scale.x).round();
                let y = ((p.y - self.min_y) * scale.y).round();
                if x.is_nan() || y.is_nan() || x.abs() > PIXEL_RANGE || y.abs() > PIXEL_RANGE {
                    return Err(OutOfRange { x, y });
                }
                Ok(PixelPoint {
                    x: x as i64,
                    y: y as i64,
                })
            })
            .collect()
    }
}

// The accumulator starts at the origin, so element 0 passes through as is.
pub fn resolve_relative(points: &[Point]) -> Vec<Point> {
    let mut x = 0.0;
    let mut y = 0.0;
    points
        .iter()
        .map(|p| {
            x += p.x;
            y += p.y;
            Point::new(x, y)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Bounds {
    pub fn of(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    // Box area, not polygon area.
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    // [min_x, min_y, width, height]
    pub fn to_bbox(&self) -> [i64; 4] {
        [self.min_x, self.min_y, self.width(), self.height()]
    }
}

#[test]
fn resolve_chain() {
    let chain = [
        Point::new(10.0, 10.0),
        Point::new(3.0, 3.0),
        Point::new(6.0, 6.0),
    ];
    let absolute = resolve_relative(&chain);
    assert_eq!(absolute[0], chain[0]);
    assert_eq!(
        absolute,
        vec![
            Point::new(10.0, 10.0),
            Point::new(13.0, 13.0),
            Point::new(19.0, 19.0),
        ]
    );
    assert!(resolve_relative(&[]).is_empty());
}

#[test]
fn project_to_raster() {
    let viewport = Viewport {
        min_x: 0.0,
        min_y: 0.0,
        width: 100.0,
        height: 100.0,
    };
    let scale = viewport.scale_to(200, 200);
    assert_eq!(scale.x, 2.0);
    assert_eq!(scale.y, 2.0);

    let points = [
        Point::new(10.0, 10.0),
        Point::new(13.0, 13.0),
        Point::new(19.0, 19.0),
    ];
    assert_eq!(
        viewport.project(scale, &points).unwrap(),
        vec![
            PixelPoint { x: 20, y: 20 },
            PixelPoint { x: 26, y: 26 },
            PixelPoint { x: 38, y: 38 },
        ]
    );
    assert!(viewport.project(scale, &[]).unwrap().is_empty());
}

#[test]
fn project_offset_viewport() {
    let viewport = Viewport {
        min_x: -10.0,
        min_y: 5.0,
        width: 20.0,
        height: 20.0,
    };
    let scale = viewport.scale_to(20, 20);
    let projected = viewport.project(scale, &[Point::new(0.0, 0.0)]).unwrap();
    assert_eq!(projected, vec![PixelPoint { x: 10, y: -5 }]);
}

#[test]
fn rounds_half_away_from_zero() {
    let viewport = Viewport {
        min_x: 0.0,
        min_y: 0.0,
        width: 10.0,
        height: 10.0,
    };
    let scale = viewport.scale_to(10, 10);
    let projected = viewport
        .project(scale, &[Point::new(2.5, 3.5), Point::new(-2.5, -0.5)])
        .unwrap();
    assert_eq!(
        projected,
        vec![PixelPoint { x: 3, y: 4 }, PixelPoint { x: -3, y: -1 }]
    );
}

#[test]
fn unprojectable_coordinates() {
    let viewport = Viewport {
        min_x: 0.0,
        min_y: 0.0,
        width: 10.0,
        height: 10.0,
    };
    let scale = viewport.scale_to(10, 10);
    assert!(viewport.project(scale, &[Point::new(1e300, 0.0)]).is_err());
    assert!(viewport.project(scale, &[Point::new(0.0, -1e300)]).is_err());
    assert!(viewport
        .project(scale, &[Point::new(0.0, f64::NAN)])
        .is_err());
    // Anything inside the guard band still projects.
    assert!(viewport.project(scale, &[Point::new(1e6, -1e6)]).is_ok());
}

#[test]
fn bounds_of_points() {
    let points = [
        PixelPoint { x: 20, y: 20 },
        PixelPoint { x: 26, y: 26 },
        PixelPoint { x: 38, y: 38 },
    ];
    let bounds = Bounds::of(&points).unwrap();
    assert_eq!(bounds.to_bbox(), [20, 20, 18, 18]);
    assert_eq!(bounds.area(), 324);
    for p in &points {
        assert!(bounds.min_x <= p.x && p.x <= bounds.max_x);
        assert!(bounds.min_y <= p.y && p.y <= bounds.max_y);
    }

    let single = Bounds::of(&[PixelPoint { x: 7, y: 9 }]).unwrap();
    assert_eq!(single.to_bbox(), [7, 9, 0, 0]);
    assert_eq!(single.area(), 0);

    assert!(Bounds::of(&[]).is_none());
}
