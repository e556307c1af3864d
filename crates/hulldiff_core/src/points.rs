//! Define the `x,y` point line format shared by the harness and the programs under test.
//!
//! ## Notes
//! - One point per line, integer coordinates, no spaces: `-12,40\n`.
//! - No uniqueness or ordering is implied; duplicates are valid input.

use std::fmt;

/// A 2D point with integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Represent a malformed line in a point listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointParseError {
    /// 1-based line number
    pub line: usize,
    pub content: String,
}

impl fmt::Display for PointParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: expected `x,y` with integer coordinates, got {:?}", self.line, self.content)
    }
}

impl std::error::Error for PointParseError {}

/// Render points as newline-terminated `x,y` lines.
///
/// ## Parameters
/// - `points`: Points in the order they should be written.
///
/// ## Returns
/// - `String`: The input text; empty for an empty slice.
pub fn format_points(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 12);
    for p in points {
        out.push_str(&p.to_string());
        out.push('\n');
    }
    out
}

/// Parse `x,y` lines back into points.
///
/// ## Parameters
/// - `text`: Newline separated point lines. Blank lines are ignored.
///
/// ## Returns
/// - `Result<Vec<Point>, PointParseError>`: The points, or the first malformed line.
pub fn parse_points(text: &str) -> Result<Vec<Point>, PointParseError> {
    let mut points = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let err = || PointParseError {
            line: idx + 1,
            content: raw.to_string(),
        };
        let (x, y) = line.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<i64>().map_err(|_| err())?;
        let y = y.trim().parse::<i64>().map_err(|_| err())?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}
