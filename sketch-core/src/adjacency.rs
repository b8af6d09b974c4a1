//! Floor-plan placement from declared shared walls.
//!
//! This is a greedy breadth-first walk, not a constraint solver: the first
//! edge that places a room wins and later, conflicting edges are dropped.
//! Different edge orders can therefore give different (always
//! non-overlapping) layouts.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::config::LayoutConfig;
use crate::geometry::{Rect, Size, size_of};
use crate::model::{Adjacency, Room, RoomId, WallDirection};
use crate::packer::{GroupLayout, apply_pins, pins_of, settle};

/// Position of `neighbor` when it sits against `dir` wall of `current`.
pub fn neighbor_rect(current: &Rect, dir: WallDirection, neighbor: Size) -> Rect {
    let (x, y) = match dir {
        WallDirection::East => (current.x + current.w, current.y),
        WallDirection::West => (current.x - neighbor.w, current.y),
        WallDirection::South => (current.x, current.y + current.h),
        WallDirection::North => (current.x, current.y - neighbor.h),
    };
    Rect::new(x, y, neighbor.w, neighbor.h)
}

/// Lay out interior rooms from their adjacency edges. Rooms the walk cannot
/// reach, or whose every candidate collides, are row-packed underneath.
///
/// The walk always starts from the first room in input order and ignores
/// stored positions. Pinned rooms are laid over the result afterwards, so
/// moving one room never shifts the others. A room left sitting under a pin
/// is re-attached through its own edges to a placed neighbour, or packed
/// below when no edge gives a free spot.
pub fn layout_adjacency(
    rooms: &[&Room],
    adjacencies: &[Adjacency],
    cfg: &LayoutConfig,
) -> GroupLayout {
    let order: Vec<RoomId> = rooms.iter().map(|r| r.id).collect();
    let sizes: HashMap<RoomId, Size> = rooms.iter().map(|r| (r.id, size_of(r, cfg))).collect();
    let in_set: HashSet<RoomId> = order.iter().copied().collect();

    let mut placed: Vec<(RoomId, Rect)> = Vec::with_capacity(rooms.len());
    let mut visited: HashSet<RoomId> = HashSet::new();
    let mut queue: VecDeque<RoomId> = VecDeque::new();

    if let Some(first) = rooms.first() {
        let s = sizes[&first.id];
        placed.push((first.id, Rect::new(0.0, 0.0, s.w, s.h)));
        visited.insert(first.id);
        queue.push_back(first.id);
    }

    let edges: Vec<&Adjacency> = adjacencies
        .iter()
        .filter(|a| in_set.contains(&a.room_id_a) && in_set.contains(&a.room_id_b))
        .collect();

    while let Some(current) = queue.pop_front() {
        let Some(cur_rect) = placed.iter().find(|(id, _)| *id == current).map(|(_, r)| *r) else {
            continue;
        };
        for edge in edges.iter().filter(|e| e.touches(current)) {
            let Some(other) = edge.other(current) else {
                continue;
            };
            if other == current || visited.contains(&other) {
                continue;
            }
            let Some(dir) = edge.direction_from(current) else {
                debug!("adjacency {} has no usable wall direction", edge.id);
                continue;
            };
            let candidate = neighbor_rect(&cur_rect, dir, sizes[&other]);
            if placed.iter().any(|(_, r)| r.overlaps(&candidate)) {
                debug!(
                    "adjacency {}: room {} collides {} of room {}, left for another edge",
                    edge.id, other, dir, current
                );
                continue;
            }
            placed.push((other, candidate));
            visited.insert(other);
            queue.push_back(other);
        }
    }

    let leftovers: Vec<(RoomId, Size)> = order
        .iter()
        .filter(|id| !visited.contains(id))
        .map(|id| (*id, sizes[id]))
        .collect();
    if !leftovers.is_empty() && !edges.is_empty() {
        debug!("{} room(s) fall back to row packing", leftovers.len());
    }
    let natural = settle(placed, &leftovers, cfg.interior_usable_width, &order, cfg);
    let pins = pins_of(rooms, cfg);
    apply_pins(
        natural,
        &pins,
        cfg.interior_usable_width,
        &order,
        cfg,
        |id, size, placed| reattach(id, size, placed, &edges, cfg),
    )
}

/// First free spot against an already placed neighbour, in edge order.
fn reattach(
    id: RoomId,
    size: Size,
    placed: &[(RoomId, Rect)],
    edges: &[&Adjacency],
    cfg: &LayoutConfig,
) -> Option<Rect> {
    edges.iter().filter(|e| e.touches(id)).find_map(|edge| {
        let other = edge.other(id).filter(|o| *o != id)?;
        let anchor = placed.iter().find(|(pid, _)| *pid == other).map(|(_, r)| *r)?;
        let dir = edge.direction_from(other)?;
        let candidate = neighbor_rect(&anchor, dir, size);
        let on_canvas = candidate.x >= cfg.margin && candidate.y >= cfg.margin;
        (on_canvas && !placed.iter().any(|(_, r)| r.overlaps(&candidate))).then_some(candidate)
    })
}
