//! Collidable 2-D polygons and their affine/expansion transforms.
//!
//! A [`Polygon`] is an ordered sequence of vertices in millimeters. Closed
//! polygons carry an explicit copy of the first vertex at the end, so the
//! segment `(i, i+1)` for `i = n-2` closes the boundary without a special
//! case in the overlap test. Open polygons are plain polylines (single line
//! segments, scratch lines).
//!
//! Every transform returns a freshly allocated polygon; inputs are never
//! mutated. This makes polygons safely shareable read-only across threads.
//!
//! The overlap test is segment-intersection only: a polygon fully enclosed in
//! another without edge crossings is not detected. Petal geometry makes this
//! safe, and the speed matters on the spacetime hot path.

use serde::{Deserialize, Serialize};

use crate::core::math::{from_polar, sin_cos_deg, to_polar};
use crate::error::{KavachError, Result};

/// A 2-D vertex in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in mm
    pub x: f64,
    /// Y coordinate in mm
    pub y: f64,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// An ordered sequence of vertices, optionally closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point2D>,
}

impl Polygon {
    /// Construct from two parallel coordinate arrays.
    ///
    /// When `close` is true and the last point differs from the first, a copy
    /// of the first point is appended. Fails with
    /// [`KavachError::ShapeMismatch`] if the arrays differ in length, and with
    /// [`KavachError::InvalidArgument`] for fewer than 2 points (3 for a
    /// closed polygon) or non-finite coordinates.
    pub fn new(x: &[f64], y: &[f64], close: bool) -> Result<Self> {
        if x.len() != y.len() {
            return Err(KavachError::ShapeMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let points = x
            .iter()
            .zip(y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self::from_points(points, close)
    }

    /// Construct from a vertex list, optionally closing the ring.
    pub fn from_points(mut points: Vec<Point2D>, close: bool) -> Result<Self> {
        let min_points = if close { 3 } else { 2 };
        if points.len() < min_points {
            return Err(KavachError::InvalidArgument(format!(
                "polygon needs at least {} points, got {}",
                min_points,
                points.len()
            )));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(KavachError::InvalidArgument(
                "polygon coordinates must be finite".into(),
            ));
        }
        if close && points.last() != points.first() {
            points.push(points[0]);
        }
        Ok(Self { points })
    }

    /// The vertex list, including the closing duplicate for closed polygons.
    #[inline]
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Number of stored vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the last stored vertex closes the ring.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }

    /// Rotate about the origin by `angle_deg` degrees.
    pub fn rotated(&self, angle_deg: f64) -> Polygon {
        let (sin_a, cos_a) = sin_cos_deg(angle_deg);
        self.map(|p| Point2D::new(p.x * cos_a - p.y * sin_a, p.x * sin_a + p.y * cos_a))
    }

    /// Translate by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        self.map(|p| Point2D::new(p.x + dx, p.y + dy))
    }

    /// Move every vertex by `dr` along the ray from the origin through it.
    ///
    /// Negative `dr` contracts. Vertices exactly at the origin are undefined
    /// inputs (the keepout outlines never contain one); `atan2(0, 0) = 0`
    /// sends such a vertex to `(dr, 0)` rather than NaN.
    pub fn expanded_radially(&self, dr: f64) -> Polygon {
        self.map(|p| {
            debug_assert!(
                p.x != 0.0 || p.y != 0.0,
                "radial expansion of a vertex at the origin"
            );
            let angle = p.y.atan2(p.x);
            let (sin_a, cos_a) = angle.sin_cos();
            Point2D::new(p.x + dr * cos_a, p.y + dr * sin_a)
        })
    }

    /// Fan vertices out (or collapse them) symmetrically about the x-axis.
    ///
    /// Each vertex's polar angle moves away from zero by `da_deg` when
    /// positive, toward negative when already negative; vertices on the
    /// positive x-axis stay put.
    pub fn expanded_angularly(&self, da_deg: f64) -> Polygon {
        let da = da_deg.to_radians();
        self.map(|p| {
            let (r, angle) = to_polar(p.x, p.y);
            let shifted = if angle > 0.0 {
                angle + da
            } else if angle < 0.0 {
                angle - da
            } else {
                angle
            };
            let (x, y) = from_polar(r, shifted);
            Point2D::new(x, y)
        })
    }

    /// Asymmetric x-expansion: add `right` to vertices with `x > 0`, subtract
    /// `left` from vertices with `x < 0`; `x = 0` is unchanged.
    pub fn expanded_x(&self, left: f64, right: f64) -> Polygon {
        self.map(|p| {
            let x = if p.x > 0.0 {
                p.x + right
            } else if p.x < 0.0 {
                p.x - left
            } else {
                p.x
            };
            Point2D::new(x, p.y)
        })
    }

    /// Place a polygon defined in the phi-pivot frame into petal coordinates.
    ///
    /// Rotates by `theta + phi` degrees, then translates to the phi pivot at
    /// `(x0 + r1·cos θ, y0 + r1·sin θ)`.
    pub fn place_as_phi_arm(&self, theta_deg: f64, phi_deg: f64, x0: f64, y0: f64, r1: f64) -> Polygon {
        let (sin_t, cos_t) = sin_cos_deg(theta_deg);
        self.rotated(theta_deg + phi_deg)
            .translated(x0 + r1 * cos_t, y0 + r1 * sin_t)
    }

    /// Place a central-body polygon into petal coordinates: rotate by `theta`
    /// degrees, then translate by `(x0, y0)`.
    pub fn place_as_central_body(&self, theta_deg: f64, x0: f64, y0: f64) -> Polygon {
        self.rotated(theta_deg).translated(x0, y0)
    }

    /// Axis-aligned bounding box as `(xmin, xmax, ymin, ymax)`.
    fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut xmin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymin = f64::INFINITY;
        let mut ymax = f64::NEG_INFINITY;
        for p in &self.points {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        (xmin, xmax, ymin, ymax)
    }

    /// Segment-intersection overlap test with a cheap bounding-box rejection.
    ///
    /// Returns true iff any edge of `self` crosses any edge of `other`.
    /// Parallel segments never intersect here: tangent contact is not a
    /// collision. Short-circuits on the first intersecting pair.
    pub fn collides_with(&self, other: &Polygon) -> bool {
        let (axmin, axmax, aymin, aymax) = self.bounds();
        let (bxmin, bxmax, bymin, bymax) = other.bounds();
        if axmax < bxmin || bxmax < axmin || aymax < bymin || bymax < aymin {
            return false;
        }
        for a in self.points.windows(2) {
            for b in other.points.windows(2) {
                if segments_intersect(a[0], a[1], b[0], b[1]) {
                    return true;
                }
            }
        }
        false
    }

    /// True iff any vertex lies strictly inside the disk of radius `r`
    /// centered at `(cx, cy)`.
    ///
    /// An intentionally loose screen for circular retracted envelopes: a pure
    /// edge-crossing that avoids all vertices is missed, which the calling
    /// policy tolerates.
    pub fn collides_with_circle(&self, cx: f64, cy: f64, r: f64) -> bool {
        let center = Point2D::new(cx, cy);
        let r2 = r * r;
        self.points.iter().any(|p| p.distance_squared(&center) < r2)
    }

    /// Closed circle-approximating polygon with `npts` evenly spaced vertices.
    ///
    /// With `outside` false, vertices lie on the circle of radius
    /// `diameter/2` (inscribed polygon). With `outside` true, vertices lie on
    /// radius `diameter / (2·cos(π/npts))`, making every segment tangent to
    /// the true circle (circumscribed polygon).
    pub fn circle(diameter: f64, npts: usize, outside: bool) -> Result<Polygon> {
        if diameter <= 0.0 || !diameter.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "circle diameter must be positive, got {diameter}"
            )));
        }
        if npts <= 2 {
            return Err(KavachError::InvalidArgument(format!(
                "circle needs more than 2 points, got {npts}"
            )));
        }
        let half_angle = std::f64::consts::PI / npts as f64;
        let radius = if outside {
            diameter / (2.0 * half_angle.cos())
        } else {
            diameter / 2.0
        };
        let step = 2.0 * std::f64::consts::PI / npts as f64;
        let points = (0..npts)
            .map(|k| {
                let (x, y) = from_polar(radius, k as f64 * step);
                Point2D::new(x, y)
            })
            .collect();
        Self::from_points(points, true)
    }

    /// Signed area by the shoelace formula, with an implicit closing edge.
    ///
    /// Positive for counterclockwise winding. The closing duplicate of a
    /// closed polygon contributes zero, so closed and ring-equivalent open
    /// polygons agree.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut twice_area = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice_area += p.x * q.y - q.x * p.y;
        }
        twice_area / 2.0
    }

    /// Verify every coordinate is finite; `context` names the producing
    /// operation in the error.
    pub fn ensure_finite(&self, context: &str) -> Result<()> {
        if self.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(KavachError::NumericDegenerate {
                context: context.to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    fn map<F: Fn(&Point2D) -> Point2D>(&self, f: F) -> Polygon {
        Polygon {
            points: self.points.iter().map(f).collect(),
        }
    }
}

/// 2-D segment intersection between `(a1, a2)` and `(b1, b2)`.
///
/// Parameters of the crossing point along each segment are solved directly;
/// segments intersect iff both lie in `[0, 1]`. A zero determinant means the
/// segments are parallel and is treated as no intersection.
fn segments_intersect(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D) -> bool {
    let da = Point2D::new(a2.x - a1.x, a2.y - a1.y);
    let db = Point2D::new(b2.x - b1.x, b2.y - b1.y);
    let det = db.x * da.y - db.y * da.x;
    if det == 0.0 {
        return false;
    }
    let s = (da.x * (b1.y - a1.y) + da.y * (a1.x - b1.x)) / det;
    let t = (db.x * (a1.y - b1.y) + db.y * (b1.x - a1.x)) / (-det);
    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
}
