//! Plain geometry and image types shared by the camera collaborators and the
//! reading-order sorter.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A detected text region as four corners, clockwise from top-left as the
/// detector reports them. Corners 0 and 2 are opposite.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub corners: [Point; 4],
}

impl BoundingBox {
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned box from its top-left corner and size.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new([
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    pub fn height(&self) -> f64 {
        let [a, _, c, _] = self.corners;
        (c.y - a.y).abs()
    }

    pub fn width(&self) -> f64 {
        let [a, _, c, _] = self.corners;
        (c.x - a.x).abs()
    }

    pub fn center(&self) -> Point {
        let [a, _, c, _] = self.corners;
        Point::new((a.x + c.x) / 2.0, (a.y + c.y) / 2.0)
    }
}

/// One captured camera frame. Pixel layout is whatever the camera and the
/// detector agree on; the pipeline never looks inside.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_metrics_use_opposite_corners() {
        let b = BoundingBox::from_rect(10.0, 20.0, 30.0, 8.0);
        assert_eq!(b.width(), 30.0);
        assert_eq!(b.height(), 8.0);
        assert_eq!(b.center(), Point::new(25.0, 24.0));
    }
}
