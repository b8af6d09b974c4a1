//! Rectangles, points and room sizing in drawing units.
//!
//! Drawing units are canvas pixels at zoom 1; real-world inputs are feet and
//! are converted through [`LayoutConfig::scale`].

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::model::{BoundingBox, Room};

/// Basic two dimensional point used for geometry operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }
}

/// Axis-aligned rectangle, top-left origin, y grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn at(origin: Point, size: Size) -> Self {
        Rect::new(origin.x, origin.y, size.w, size.h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Open-interval overlap test: rectangles that only share an edge do not
    /// overlap, so rooms can sit wall to wall.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Corners in wall order: NW, NE, SE, SW.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// Bounding rectangle of a set of rectangles; `None` when empty.
pub fn bounds_of_rects<'a, I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    rects.into_iter().fold(None, |acc, r| match acc {
        None => Some(*r),
        Some(b) => Some(b.union(r)),
    })
}

pub fn bounds_of(pts: &[Point]) -> (f64, f64, f64, f64) {
    let (mut minx, mut miny, mut maxx, mut maxy) = (
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );
    for p in pts {
        minx = minx.min(p.x);
        miny = miny.min(p.y);
        maxx = maxx.max(p.x);
        maxy = maxy.max(p.y);
    }
    (minx, miny, maxx, maxy)
}

/// Width/height of an arbitrary point list. Empty input yields a zero box.
pub fn bounding_box_of(pts: &[Point]) -> BoundingBox {
    if pts.is_empty() {
        return BoundingBox::default();
    }
    let (minx, miny, maxx, maxy) = bounds_of(pts);
    BoundingBox {
        width: maxx - minx,
        height: maxy - miny,
    }
}

/// Default outline for a room without an explicit polygon, in feet.
pub fn rect_polygon(length: f64, width: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(length, 0.0),
        Point::new(length, width),
        Point::new(0.0, width),
    ]
}

pub fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let (x, y) = (p.x, p.y);
    let mut inside = false;
    let n = poly.len();
    let mut j = n - 1;
    for i in 0..n {
        let xi = poly[i].x;
        let yi = poly[i].y;
        let xj = poly[j].x;
        let yj = poly[j].y;
        let intersect =
            ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi + 1e-12) + xi);
        if intersect {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn floored(v: f64, min: f64) -> f64 {
    if v.is_finite() { v.max(min) } else { min }
}

/// Placeholder size for rooms with unknown geometry. Slightly wider than the
/// minimum so unmeasured rooms read differently from tiny measured ones.
pub fn placeholder_size(cfg: &LayoutConfig) -> Size {
    Size::new(cfg.min_room_width + 6.0, cfg.min_room_height)
}

/// Pixel size of a room at the configured scale, never below the minimums.
pub fn size_of(room: &Room, cfg: &LayoutConfig) -> Size {
    if let Some(d) = &room.dimensions {
        if let (Some(length), Some(width)) = (d.length, d.width) {
            return Size::new(
                floored(length * cfg.scale, cfg.min_room_width),
                floored(width * cfg.scale, cfg.min_room_height),
            );
        }
    }
    if let Some(poly) = &room.polygon {
        let bb = poly.bounding_box();
        if bb.width > 0.0 && bb.height > 0.0 {
            return Size::new(
                floored(bb.width * cfg.scale, cfg.min_room_width),
                floored(bb.height * cfg.scale, cfg.min_room_height),
            );
        }
    }
    placeholder_size(cfg)
}

/// Room outline in drawing units, fitted to `rect`. Polygon rooms keep their
/// shape relative to the bounding box; everything else is the rectangle.
pub fn outline_in(room: &Room, rect: &Rect, cfg: &LayoutConfig) -> Vec<Point> {
    if let Some(poly) = &room.polygon {
        let pts = poly.to_points();
        let bb = bounding_box_of(&pts);
        if pts.len() >= 3 && bb.width > 0.0 && bb.height > 0.0 {
            let (minx, miny, _, _) = bounds_of(&pts);
            let sx = (bb.width * cfg.scale).max(rect.w) / bb.width;
            let sy = (bb.height * cfg.scale).max(rect.h) / bb.height;
            return pts
                .iter()
                .map(|p| Point::new(rect.x + (p.x - minx) * sx, rect.y + (p.y - miny) * sy))
                .collect();
        }
    }
    rect.corners().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimensions, PolygonPoint, RoomPolygon};
    use approx::assert_relative_eq;

    fn room_with(length: Option<f64>, width: Option<f64>) -> Room {
        Room {
            id: 1,
            dimensions: Some(Dimensions {
                length,
                width,
                height: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_size_of_scales_feet() {
        let cfg = LayoutConfig::expanded();
        let s = size_of(&room_with(Some(12.0), Some(10.0)), &cfg);
        assert_relative_eq!(s.w, 72.0);
        assert_relative_eq!(s.h, 60.0);
    }

    #[test]
    fn test_size_of_floors_small_and_negative() {
        let cfg = LayoutConfig::compact();
        let s = size_of(&room_with(Some(0.0), Some(-4.0)), &cfg);
        assert_relative_eq!(s.w, cfg.min_room_width);
        assert_relative_eq!(s.h, cfg.min_room_height);
        let s = size_of(&room_with(Some(f64::NAN), Some(2.0)), &cfg);
        assert_relative_eq!(s.w, cfg.min_room_width);
    }

    #[test]
    fn test_size_of_missing_width_is_placeholder() {
        let cfg = LayoutConfig::compact();
        let s = size_of(&room_with(Some(20.0), None), &cfg);
        assert_eq!(s, placeholder_size(&cfg));
        assert_relative_eq!(s.w, cfg.min_room_width + 6.0);
    }

    #[test]
    fn test_size_of_polygon_uses_bounding_box() {
        let cfg = LayoutConfig::expanded();
        let room = Room {
            polygon: Some(RoomPolygon {
                points: vec![
                    PolygonPoint::Pair([0.0, 0.0]),
                    PolygonPoint::Pair([20.0, 0.0]),
                    PolygonPoint::Pair([20.0, 8.0]),
                    PolygonPoint::Pair([10.0, 15.0]),
                ],
                bounding_box: None,
            }),
            ..Default::default()
        };
        let s = size_of(&room, &cfg);
        assert_relative_eq!(s.w, 120.0);
        assert_relative_eq!(s.h, 90.0);
    }

    #[test]
    fn test_overlap_excludes_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(9.0, 9.0, 5.0, 5.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_bounding_box_of_points() {
        let bb = bounding_box_of(&[
            Point::new(2.0, 3.0),
            Point::new(-1.0, 7.0),
            Point::new(5.0, 4.0),
        ]);
        assert_relative_eq!(bb.width, 6.0);
        assert_relative_eq!(bb.height, 4.0);
        assert_eq!(bounding_box_of(&[]), BoundingBox::default());
    }

    #[test]
    fn test_rect_polygon_and_hit() {
        let poly = rect_polygon(12.0, 10.0);
        assert_eq!(poly.len(), 4);
        assert_eq!(poly[2], Point::new(12.0, 10.0));
        assert!(point_in_polygon(Point::new(6.0, 5.0), &poly));
        assert!(!point_in_polygon(Point::new(13.0, 5.0), &poly));
    }
}
