//! Shared-wall inference between placed rooms.

use serde::Serialize;

use crate::geometry::{Point, Rect};
use crate::model::RoomId;

const EPS: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Segment { a, b }
    }

    pub fn length(&self) -> f64 {
        ((self.b.x - self.a.x).powi(2) + (self.b.y - self.a.y).powi(2)).sqrt()
    }
}

/// Stretch of wall two rooms have in common.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedWall {
    pub room_a: RoomId,
    pub room_b: RoomId,
    pub segment: Segment,
}

fn span(a0: f64, a1: f64, b0: f64, b1: f64) -> Option<(f64, f64)> {
    let lo = a0.max(b0);
    let hi = a1.min(b1);
    (hi - lo > EPS).then_some((lo, hi))
}

/// Common wall of two rectangles, if their edges touch.
pub fn shared_wall(a: &Rect, b: &Rect) -> Option<Segment> {
    let vertical = if (a.right() - b.x).abs() <= EPS {
        Some(a.right())
    } else if (b.right() - a.x).abs() <= EPS {
        Some(a.x)
    } else {
        None
    };
    if let Some(x) = vertical {
        if let Some((y0, y1)) = span(a.y, a.bottom(), b.y, b.bottom()) {
            return Some(Segment::new(Point::new(x, y0), Point::new(x, y1)));
        }
    }
    let horizontal = if (a.bottom() - b.y).abs() <= EPS {
        Some(a.bottom())
    } else if (b.bottom() - a.y).abs() <= EPS {
        Some(a.y)
    } else {
        None
    };
    if let Some(y) = horizontal {
        if let Some((x0, x1)) = span(a.x, a.right(), b.x, b.right()) {
            return Some(Segment::new(Point::new(x0, y), Point::new(x1, y)));
        }
    }
    None
}

/// All pairwise shared walls, in input order.
pub fn find_shared_walls(rects: &[(RoomId, Rect)]) -> Vec<SharedWall> {
    let mut out = Vec::new();
    for (i, (ida, ra)) in rects.iter().enumerate() {
        for (idb, rb) in &rects[i + 1..] {
            if let Some(segment) = shared_wall(ra, rb) {
                out.push(SharedWall {
                    room_a: *ida,
                    room_b: *idb,
                    segment,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_by_side_rooms_share_partial_wall() {
        let a = Rect::new(0.0, 0.0, 72.0, 60.0);
        let b = Rect::new(72.0, 20.0, 60.0, 60.0);
        let seg = shared_wall(&a, &b).unwrap();
        assert_eq!(seg, Segment::new(Point::new(72.0, 20.0), Point::new(72.0, 60.0)));
        assert_eq!(seg.length(), 40.0);
    }

    #[test]
    fn test_corner_touch_is_not_a_wall() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(shared_wall(&a, &b).is_none());
    }

    #[test]
    fn test_find_shared_walls_pairs() {
        let rects = vec![
            (1, Rect::new(0.0, 0.0, 10.0, 10.0)),
            (2, Rect::new(0.0, 10.0, 10.0, 10.0)),
            (3, Rect::new(50.0, 50.0, 10.0, 10.0)),
        ];
        let walls = find_shared_walls(&rects);
        assert_eq!(walls.len(), 1);
        assert_eq!((walls[0].room_a, walls[0].room_b), (1, 2));
        assert_eq!(walls[0].segment.a.y, 10.0);
    }
}
