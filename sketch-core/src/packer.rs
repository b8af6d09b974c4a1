//! Row packing for independent room groups (exterior rows, roof slopes,
//! elevations and anything the adjacency walk could not place).

use std::collections::HashMap;

use log::debug;

use crate::config::LayoutConfig;
use crate::geometry::{Rect, Size, bounds_of_rects, size_of};
use crate::model::{Room, RoomId};

/// Result of a packing pass, positions relative to the pack origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Packing {
    pub placements: Vec<(RoomId, Rect)>,
    pub width: f64,
    pub height: f64,
}

/// Left-to-right, top-to-bottom row packer.
///
/// Items keep their input order. A row never refuses its first item, so an
/// item wider than `usable_width` still gets a row of its own.
pub fn pack_rows(items: &[(RoomId, Size)], usable_width: f64, gap: f64) -> Packing {
    let mut placements = Vec::with_capacity(items.len());
    let (mut cx, mut cy) = (0.0_f64, 0.0_f64);
    let mut row_h: f64 = 0.0;
    let mut width: f64 = 0.0;
    for &(id, size) in items {
        if cx + size.w > usable_width && cx > 0.0 {
            cx = 0.0;
            cy += row_h + gap;
            row_h = 0.0;
        }
        placements.push((id, Rect::new(cx, cy, size.w, size.h)));
        width = width.max(cx + size.w);
        cx += size.w + gap;
        row_h = row_h.max(size.h);
    }
    let height = if placements.is_empty() { 0.0 } else { cy + row_h };
    Packing {
        placements,
        width,
        height,
    }
}

/// Placed rooms of one section in section-local coordinates. `width` and
/// `height` include the trailing margin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupLayout {
    pub rects: Vec<(RoomId, Rect)>,
    pub width: f64,
    pub height: f64,
}

impl GroupLayout {
    pub fn rect_of(&self, id: RoomId) -> Option<Rect> {
        self.rects.iter().find(|(rid, _)| *rid == id).map(|(_, r)| *r)
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Row-pack a section, keeping user-pinned rooms where they were put.
pub fn layout_rows(rooms: &[&Room], usable_width: f64, cfg: &LayoutConfig) -> GroupLayout {
    let items: Vec<(RoomId, Size)> = rooms.iter().map(|r| (r.id, size_of(r, cfg))).collect();
    let order: Vec<RoomId> = rooms.iter().map(|r| r.id).collect();
    let natural = settle(Vec::new(), &items, usable_width, &order, cfg);
    apply_pins(natural, &pins_of(rooms, cfg), usable_width, &order, cfg, |_, _, _| None)
}

/// Stored rects of the rooms the user has positioned.
pub(crate) fn pins_of(rooms: &[&Room], cfg: &LayoutConfig) -> Vec<(RoomId, Rect)> {
    rooms
        .iter()
        .filter(|r| r.is_pinned())
        .filter_map(|r| {
            let p = r.position?;
            let s = size_of(r, cfg);
            Some((r.id, Rect::new(p.x, p.y, s.w, s.h)))
        })
        .collect()
}

/// Pack `leftovers` below whatever is already placed, then move the group so
/// its minimum x/y equals the margin.
pub(crate) fn settle(
    mut placed: Vec<(RoomId, Rect)>,
    leftovers: &[(RoomId, Size)],
    usable_width: f64,
    order: &[RoomId],
    cfg: &LayoutConfig,
) -> GroupLayout {
    pack_below(&mut placed, leftovers, usable_width, cfg);
    let Some(bounds) = bounds_of_rects(placed.iter().map(|(_, r)| r)) else {
        return GroupLayout::default();
    };
    finish(placed, cfg.margin - bounds.x, cfg.margin - bounds.y, order, cfg)
}

/// Overlay stored positions on a layout computed without them.
///
/// Unpinned rooms keep their rects unless one now overlaps a pinned rect.
/// Those are offered to `relocate` (room, size, everything placed so far)
/// until it stops finding spots, and whatever is left is packed below. The
/// group is only pushed back on-canvas, never snapped to the margin, so
/// neither pinned nor untouched rooms drift.
pub(crate) fn apply_pins<F>(
    natural: GroupLayout,
    pins: &[(RoomId, Rect)],
    usable_width: f64,
    order: &[RoomId],
    cfg: &LayoutConfig,
    mut relocate: F,
) -> GroupLayout
where
    F: FnMut(RoomId, Size, &[(RoomId, Rect)]) -> Option<Rect>,
{
    if pins.is_empty() {
        return natural;
    }
    let mut placed: Vec<(RoomId, Rect)> = pins.to_vec();
    let mut displaced: Vec<(RoomId, Size)> = Vec::new();
    for (id, rect) in natural.rects {
        if pins.iter().any(|(pid, _)| *pid == id) {
            continue;
        }
        if pins.iter().any(|(_, p)| p.overlaps(&rect)) {
            displaced.push((id, rect.size()));
        } else {
            placed.push((id, rect));
        }
    }
    loop {
        let before = displaced.len();
        displaced.retain(|&(id, size)| match relocate(id, size, &placed) {
            Some(rect) => {
                placed.push((id, rect));
                false
            }
            None => true,
        });
        if displaced.is_empty() || displaced.len() == before {
            break;
        }
    }
    if !displaced.is_empty() {
        debug!("{} room(s) under a pinned room packed below", displaced.len());
    }
    pack_below(&mut placed, &displaced, usable_width, cfg);
    let Some(bounds) = bounds_of_rects(placed.iter().map(|(_, r)| r)) else {
        return GroupLayout::default();
    };
    let dx = (cfg.margin - bounds.x).max(0.0);
    let dy = (cfg.margin - bounds.y).max(0.0);
    finish(placed, dx, dy, order, cfg)
}

fn pack_below(
    placed: &mut Vec<(RoomId, Rect)>,
    items: &[(RoomId, Size)],
    usable_width: f64,
    cfg: &LayoutConfig,
) {
    if items.is_empty() {
        return;
    }
    let (ox, oy) = match bounds_of_rects(placed.iter().map(|(_, r)| r)) {
        Some(b) => (b.x, b.bottom() + cfg.gap),
        None => (0.0, 0.0),
    };
    let pack = pack_rows(items, usable_width, cfg.gap);
    placed.extend(
        pack.placements
            .into_iter()
            .map(|(id, r)| (id, r.translate(ox, oy))),
    );
}

fn finish(
    mut placed: Vec<(RoomId, Rect)>,
    dx: f64,
    dy: f64,
    order: &[RoomId],
    cfg: &LayoutConfig,
) -> GroupLayout {
    let rank: HashMap<RoomId, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    placed.sort_by_key(|(id, _)| rank.get(id).copied().unwrap_or(usize::MAX));
    let rects: Vec<(RoomId, Rect)> = placed
        .into_iter()
        .map(|(id, r)| (id, r.translate(dx, dy)))
        .collect();
    let (mut width, mut height) = (0.0_f64, 0.0_f64);
    for (_, r) in &rects {
        width = width.max(r.right());
        height = height.max(r.bottom());
    }
    GroupLayout {
        rects,
        width: width + cfg.margin,
        height: height + cfg.margin,
    }
}
