use serde::{Deserialize, Serialize};

use crate::LayerId;

/// A 2D point in layout coordinates (nanometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BBox::new(*first, *first);
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Euclidean gap between two boxes; zero when they touch or overlap.
    pub fn gap_to(&self, other: &BBox) -> f64 {
        let dx = (self.min.x - other.max.x).max(other.min.x - self.max.x).max(0.0);
        let dy = (self.min.y - other.max.y).max(other.min.y - self.max.y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// `[min_x, min_y, max_x, max_y]`, the form violation markers carry.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// A rectangle defined by lower-left and upper-right corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub layer_id: LayerId,
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Rect {
    pub fn new(layer_id: LayerId, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            layer_id,
            lower_left: Point::new(x1.min(x2), y1.min(y2)),
            upper_right: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.lower_left, self.upper_right)
    }

    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// A closed polygon defined by a list of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub layer_id: LayerId,
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(layer_id: LayerId, vertices: Vec<Point>) -> Self {
        Self { layer_id, vertices }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    /// Unsigned area (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// A path (track) defined by a centerline and width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub layer_id: LayerId,
    pub points: Vec<Point>,
    pub width: f64,
}

impl Path {
    pub fn new(layer_id: LayerId, points: Vec<Point>, width: f64) -> Self {
        Self {
            layer_id,
            points,
            width,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points).map(|b| b.inflate(self.width / 2.0))
    }

    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

/// A via connecting two layers through a cut layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub bottom_layer: LayerId,
    pub top_layer: LayerId,
    pub cut_layer: LayerId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl Via {
    pub fn new(
        bottom_layer: LayerId,
        top_layer: LayerId,
        cut_layer: LayerId,
        position: Point,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            bottom_layer,
            top_layer,
            cut_layer,
            position,
            width,
            height,
        }
    }

    pub fn bbox(&self) -> BBox {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        BBox::new(
            Point::new(self.position.x - half_w, self.position.y - half_h),
            Point::new(self.position.x + half_w, self.position.y + half_h),
        )
    }

    /// Landing size used for diameter checks.
    pub fn size(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// A geometric primitive in the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeomPrimitive {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
    Via(Via),
}

impl GeomPrimitive {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            GeomPrimitive::Rect(r) => Some(r.bbox()),
            GeomPrimitive::Polygon(p) => p.bbox(),
            GeomPrimitive::Path(p) => p.bbox(),
            GeomPrimitive::Via(v) => Some(v.bbox()),
        }
    }

    /// Every layer the primitive occupies. Vias span bottom, cut and top.
    pub fn layers(&self) -> Vec<LayerId> {
        match self {
            GeomPrimitive::Rect(r) => vec![r.layer_id],
            GeomPrimitive::Polygon(p) => vec![p.layer_id],
            GeomPrimitive::Path(p) => vec![p.layer_id],
            GeomPrimitive::Via(v) => vec![v.bottom_layer, v.cut_layer, v.top_layer],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_between_boxes() {
        let a = BBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = BBox::new(Point::new(13.0, 14.0), Point::new(20.0, 20.0));
        assert!((a.gap_to(&b) - 5.0).abs() < 1e-10);
        assert!((b.gap_to(&a) - 5.0).abs() < 1e-10);

        let overlapping = BBox::new(Point::new(5.0, 5.0), Point::new(15.0, 15.0));
        assert_eq!(a.gap_to(&overlapping), 0.0);
    }

    #[test]
    fn test_polygon_area() {
        let tri = Polygon::new(
            0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(0.0, 10.0),
            ],
        );
        assert!((tri.area() - 50.0).abs() < 1e-10);
        assert_eq!(Polygon::new(0, vec![Point::new(0.0, 0.0)]).area(), 0.0);
    }

    #[test]
    fn test_path_bbox_includes_half_width() {
        let path = Path::new(
            1,
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            20.0,
        );
        let bb = path.bbox().unwrap();
        assert_eq!(bb.to_array(), [-10.0, -10.0, 110.0, 10.0]);
        assert!((path.length() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_via_layers() {
        let via = Via::new(1, 3, 2, Point::new(0.0, 0.0), 40.0, 30.0);
        assert_eq!(GeomPrimitive::Via(via.clone()).layers(), vec![1, 2, 3]);
        assert_eq!(via.size(), 40.0);
    }
}
