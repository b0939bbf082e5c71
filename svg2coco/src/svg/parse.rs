use nom::{
    character::complete::{char, space0, space1},
    combinator::{all_consuming, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded, separated_pair},
    IResult,
};

use crate::geometry::{Point, Viewport};

// Element 0 of a decoded list is absolute in every dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinates {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDialect {
    CubicRelative,
    QuadraticAbsolute,
    StraightRelative,
}

impl PathDialect {
    // Freehand data also contains `m`, so the `c` check runs first.
    pub fn detect(d: &str) -> Option<Self> {
        if d.contains('c') {
            Some(Self::CubicRelative)
        } else if d.contains('Q') {
            Some(Self::QuadraticAbsolute)
        } else if d.contains('m') {
            Some(Self::StraightRelative)
        } else {
            None
        }
    }

    pub fn decode(self, d: &str) -> Result<(Vec<Point>, Coordinates), PathError> {
        match self {
            Self::CubicRelative => decode_cubic(d).map(|points| (points, Coordinates::Relative)),
            Self::QuadraticAbsolute => Ok((decode_quadratic(d), Coordinates::Absolute)),
            Self::StraightRelative => {
                decode_straight(d).map(|points| (points, Coordinates::Relative))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {dialect} path data, could not consume `{rest}`")]
pub struct PathError {
    dialect: &'static str,
    rest: String,
}

impl PathError {
    fn syntax(dialect: &'static str, err: nom::Err<nom::error::Error<&str>>) -> Self {
        let rest = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.input.chars().take(24).collect(),
            nom::Err::Incomplete(_) => String::new(),
        };
        Self { dialect, rest }
    }
}

fn read_pair(s: &str) -> IResult<&str, Point> {
    let (s, (x, y)) = separated_pair(double, char(','), double)(s)?;
    Ok((s, Point::new(x, y)))
}

fn cubic_body(s: &str) -> IResult<&str, (Point, Vec<Point>)> {
    let (s, _) = space0(s)?;
    let (s, _) = char('m')(s)?;
    let (s, _) = space1(s)?;
    let (s, start) = read_pair(s)?;
    let (s, _) = space1(s)?;
    let (s, _) = char('c')(s)?;
    let (s, _) = space1(s)?;
    let (s, curve) = separated_list1(space1, read_pair)(s)?;
    let (s, _) = opt(preceded(space1, char('z')))(s)?;
    let (s, _) = space0(s)?;
    Ok((s, (start, curve)))
}

// Keeps the start pair, then the third pair of each complete group of three.
fn decode_cubic(d: &str) -> Result<Vec<Point>, PathError> {
    let (_, (start, curve)) =
        all_consuming(cubic_body)(d).map_err(|e| PathError::syntax("freehand curve", e))?;
    let mut points = vec![start];
    points.extend(curve.chunks_exact(3).map(|segment| segment[2]));
    Ok(points)
}

fn straight_body(s: &str) -> IResult<&str, Vec<Point>> {
    let (s, _) = space0(s)?;
    let (s, _) = char('m')(s)?;
    let (s, _) = space1(s)?;
    let (s, points) = separated_list1(space1, read_pair)(s)?;
    let (s, _) = opt(preceded(space1, char('z')))(s)?;
    let (s, _) = space0(s)?;
    Ok((s, points))
}

fn decode_straight(d: &str) -> Result<Vec<Point>, PathError> {
    all_consuming(straight_body)(d)
        .map(|(_, points)| points)
        .map_err(|e| PathError::syntax("straight line", e))
}

// Every float in the data, grouped by four; a group keeps its leading pair
// and a trailing incomplete group contributes nothing.
fn decode_quadratic(d: &str) -> Vec<Point> {
    let values: Vec<f64> = d
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| token.parse::<f64>().ok())
        .collect();
    values
        .chunks_exact(4)
        .map(|group| Point::new(group[0], group[1]))
        .collect()
}

// Exactly four finite space-separated numbers with a positive extent.
pub fn viewbox(value: &str) -> Option<Viewport> {
    let parsed: IResult<&str, Vec<f64>> =
        all_consuming(delimited(space0, separated_list1(space1, double), space0))(value);
    let (_, fields) = parsed.ok()?;
    match fields[..] {
        [min_x, min_y, width, height]
            if fields.iter().all(|v| v.is_finite()) && width > 0.0 && height > 0.0 =>
        {
            Some(Viewport {
                min_x,
                min_y,
                width,
                height,
            })
        }
        _ => None,
    }
}

// Numeric with an optional unit suffix, truncated to whole pixels.
pub fn pixel_dimension(value: &str) -> Option<u32> {
    let digits = value.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let px = digits.trim().parse::<f64>().ok()?;
    if px.is_finite() && px >= 1.0 {
        Some(px as u32)
    } else {
        None
    }
}

#[test]
fn detect_dialect() {
    assert_eq!(
        PathDialect::detect("m 10,10 c 1,1 2,2 3,3"),
        Some(PathDialect::CubicRelative)
    );
    assert_eq!(
        PathDialect::detect("M 1,1 Q 2,2 3,3"),
        Some(PathDialect::QuadraticAbsolute)
    );
    assert_eq!(
        PathDialect::detect("m 0,0 5,0 0,5 z"),
        Some(PathDialect::StraightRelative)
    );
    assert_eq!(PathDialect::detect("M 0,0 L 5,5"), None);
    assert_eq!(PathDialect::detect(""), None);
}

#[test]
fn freehand_curve() {
    let (points, coords) = PathDialect::CubicRelative
        .decode("m 10,10 c 1,1 2,2 3,3 4,4 5,5 6,6")
        .unwrap();
    assert_eq!(coords, Coordinates::Relative);
    assert_eq!(
        points,
        vec![
            Point::new(10.0, 10.0),
            Point::new(3.0, 3.0),
            Point::new(6.0, 6.0),
        ]
    );

    // Incomplete trailing group: only the start point survives.
    let (points, _) = PathDialect::CubicRelative
        .decode("m 1,2 c 3,4 5,6")
        .unwrap();
    assert_eq!(points, vec![Point::new(1.0, 2.0)]);

    // Closed freehand loops carry a trailing close marker.
    let (points, _) = PathDialect::CubicRelative
        .decode("m 0,0 c 1,1 2,2 3,3 z")
        .unwrap();
    assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(3.0, 3.0)]);

    assert!(PathDialect::CubicRelative.decode("m 10,10 c").is_err());
    assert!(PathDialect::CubicRelative.decode("c 1,1").is_err());
}

#[test]
fn straight_lines() {
    let (points, coords) = PathDialect::StraightRelative
        .decode("m 0,0 5,0 0,5 z")
        .unwrap();
    assert_eq!(coords, Coordinates::Relative);
    assert_eq!(
        points,
        vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(0.0, 5.0),
        ]
    );

    let (points, _) = PathDialect::StraightRelative
        .decode("m 266.27,901.16 1.74,-1.78")
        .unwrap();
    assert_eq!(
        points,
        vec![Point::new(266.27, 901.16), Point::new(1.74, -1.78)]
    );

    // Foreign commands are not silently dropped.
    assert!(PathDialect::StraightRelative.decode("m 0,0 q 1,1").is_err());
    assert!(PathDialect::StraightRelative.decode("m").is_err());
}

#[test]
fn pen_curve() {
    let (points, coords) = PathDialect::QuadraticAbsolute
        .decode("M 1,1 Q 2,2 3,3")
        .unwrap();
    assert_eq!(coords, Coordinates::Absolute);
    assert_eq!(points, vec![Point::new(1.0, 1.0)]);

    let (points, _) = PathDialect::QuadraticAbsolute
        .decode("M 0,0 Q 1,1 2,2 Q 3,3 4,4")
        .unwrap();
    assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)]);

    // Space-separated singles decode the same way.
    let (points, _) = PathDialect::QuadraticAbsolute
        .decode("M 0 0 Q 1 1 2 2 Q 3 3 4 4")
        .unwrap();
    assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)]);

    // Fewer than four values yields no points at all.
    let (points, _) = PathDialect::QuadraticAbsolute.decode("M 1,1").unwrap();
    assert!(points.is_empty());
}

#[test]
fn viewbox_attr() {
    let viewport = viewbox("0 0 100 100").unwrap();
    assert_eq!(viewport.min_x, 0.0);
    assert_eq!(viewport.min_y, 0.0);
    assert_eq!(viewport.width, 100.0);
    assert_eq!(viewport.height, 100.0);

    let viewport = viewbox("-10 -5 20 10").unwrap();
    assert_eq!(viewport.min_x, -10.0);
    assert_eq!(viewport.min_y, -5.0);

    assert!(viewbox("0 0 100").is_none());
    assert!(viewbox("0 0 100 100 5").is_none());
    assert!(viewbox("0 0 0 100").is_none());
    assert!(viewbox("a b c d").is_none());
    assert!(viewbox("").is_none());
}

#[test]
fn pixel_dimension_attr() {
    assert_eq!(pixel_dimension("200px"), Some(200));
    assert_eq!(pixel_dimension("200"), Some(200));
    assert_eq!(pixel_dimension("188.97mm"), Some(188));
    assert_eq!(pixel_dimension("793.70079"), Some(793));
    assert_eq!(pixel_dimension(" 64px "), Some(64));
    assert_eq!(pixel_dimension("0px"), None);
    assert_eq!(pixel_dimension("0.8"), None);
    assert_eq!(pixel_dimension("px"), None);
    assert_eq!(pixel_dimension(""), None);
}
