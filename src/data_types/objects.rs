use serde::{Deserialize, Serialize};

use super::range::Range;

/// Stable identity of a drawable object within one synthesis pass.
///
/// `row` is the originating row of the object (for multi-point shapes, the
/// first row of the run), which maps selection back to source rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub group: usize,
    pub series: usize,
    pub row: usize,
}

impl ObjectId {
    pub fn new(group: usize, series: usize, row: usize) -> Self {
        Self { group, series, row }
    }
}

/// Closed set of drawable geometry kinds.
///
/// Deliberately a tagged enum rather than an open trait hierarchy: every
/// consumer (bounds, hit-testing, painters) matches exhaustively and the
/// compiler flags a missed variant when one is added.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Point {
        x: f64,
        y: f64,
    },
    /// One gap-free polyline run. `rows[i]` is the source row of `points[i]`.
    Polyline {
        points: Vec<(f64, f64)>,
        rows: Vec<usize>,
    },
    /// Closed fill region; the last point implicitly connects to the first.
    Polygon {
        points: Vec<(f64, f64)>,
    },
    /// Vertical segment from `y0` to `y1` at `x`.
    Impulse {
        x: f64,
        y0: f64,
        y1: f64,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
    },
}

/// One drawable geometry object. Created fresh each synthesis pass and
/// discarded wholesale on the next; `selected`/`hovered` are the only
/// fields mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawableObject {
    pub id: ObjectId,
    pub shape: Shape,
    pub bbox: Range,
    pub tooltip: String,
    pub selected: bool,
    pub hovered: bool,
}

impl DrawableObject {
    pub fn new(id: ObjectId, shape: Shape, tooltip: String) -> Self {
        let bbox = shape_bounds(&shape);
        Self {
            id,
            shape,
            bbox,
            tooltip,
            selected: false,
            hovered: false,
        }
    }
}

/// Data-space bounding box of a shape. Labels get a point bbox; layout of
/// the rendered text is the painter's concern.
pub fn shape_bounds(shape: &Shape) -> Range {
    let mut r = Range::empty();
    match shape {
        Shape::Point { x, y } | Shape::Label { x, y, .. } => r.extend(*x, *y),
        Shape::Polyline { points, .. } | Shape::Polygon { points } => {
            for &(x, y) in points {
                r.extend(x, y);
            }
        }
        Shape::Impulse { x, y0, y1 } => {
            r.extend(*x, *y0);
            r.extend(*x, *y1);
        }
    }
    r
}

/// True when the shape passes within `tol` (data units) of (x, y).
pub fn shape_hit(shape: &Shape, x: f64, y: f64, tol: f64) -> bool {
    match shape {
        Shape::Point { x: px, y: py } | Shape::Label { x: px, y: py, .. } => {
            (px - x).hypot(py - y) <= tol
        }
        Shape::Polyline { points, .. } => points
            .windows(2)
            .any(|w| segment_distance(w[0], w[1], (x, y)) <= tol),
        Shape::Polygon { points } => {
            polygon_contains(points, x, y)
                || closed_edges(points).any(|(a, b)| segment_distance(a, b, (x, y)) <= tol)
        }
        Shape::Impulse { x: px, y0, y1 } => {
            segment_distance((*px, *y0), (*px, *y1), (x, y)) <= tol
        }
    }
}

/// Distance from `p` to the segment `ab`.
pub fn segment_distance(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    let (ax, ay) = a;
    let (bx, by) = b;
    let (px, py) = p;
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

/// Even-odd containment test.
pub fn polygon_contains(points: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    for (a, b) in closed_edges(points) {
        let (ax, ay) = a;
        let (bx, by) = b;
        if (ay > y) != (by > y) {
            let xi = ax + (y - ay) / (by - ay) * (bx - ax);
            if x < xi {
                inside = !inside;
            }
        }
    }
    inside
}

fn closed_edges(points: &[(f64, f64)]) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
    let n = points.len();
    (0..n).filter_map(move |i| {
        if n < 2 {
            return None;
        }
        Some((points[i], points[(i + 1) % n]))
    })
}

/// Intersection of segments `ab` and `cd`, if they properly cross.
/// Returns the crossing point and the parameter along `ab`.
pub fn segment_intersection(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    d: (f64, f64),
) -> Option<((f64, f64), f64)> {
    let r = (b.0 - a.0, b.1 - a.1);
    let s = (d.0 - c.0, d.1 - c.1);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let qp = (c.0 - a.0, c.1 - a.1);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(((a.0 + t * r.0, a.1 + t * r.1), t))
    } else {
        None
    }
}
