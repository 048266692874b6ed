//! Schematic-space geometry, in millimeters with y growing downwards

use serde::{Deserialize, Serialize};

/// Represents a 2D point in schematic space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Represents a size (width and height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

impl From<Size> for (f64, f64) {
    fn from(s: Size) -> Self {
        (s.width, s.height)
    }
}

/// Represents a bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub position: Point,
    pub size: Size,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            position: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn from_position_and_size(position: Point, size: Size) -> Self {
        Self { position, size }
    }

    pub fn min_x(&self) -> f64 {
        self.position.x
    }

    pub fn min_y(&self) -> f64 {
        self.position.y
    }

    pub fn max_x(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.position.y + self.size.height
    }

    /// Touching edges count as an intersection
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }
}
