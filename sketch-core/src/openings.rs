//! Door/window placement on room walls.
//!
//! Rooms are treated as four-walled rectangles (N/E/S/W); polygon rooms use
//! their bounding rectangle.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect};
use crate::model::{Opening, OpeningId, OpeningType, RoomId, WallDirection};
use crate::walls::Segment;

/// Half the drawn wall thickness used to space window lines.
const WINDOW_LINE_OFFSET: f64 = 2.0;

/// Space between neighbouring quantity groups, in unit gaps.
const GROUP_GAP_FACTOR: f64 = 2.0;

/// Visual family of an opening type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolFamily {
    Swing,
    Window,
    Dashed,
}

impl OpeningType {
    pub fn family(&self) -> SymbolFamily {
        match self {
            OpeningType::Door
            | OpeningType::Archway
            | OpeningType::CasedOpening
            | OpeningType::PassThrough
            | OpeningType::SlidingDoor => SymbolFamily::Swing,
            OpeningType::Window => SymbolFamily::Window,
            OpeningType::OverheadDoor | OpeningType::MissingWall | OpeningType::Unknown(_) => {
                SymbolFamily::Dashed
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Quarter circle centred on the hinge, from the open leaf back to the wall.
    SwingArc {
        hinge: Point,
        open: Point,
        closed: Point,
        radius: f64,
    },
    Window { lines: [Segment; 3] },
    DashedBar { segment: Segment },
}

/// One drawn unit of an opening; an opening of quantity `q` yields `q`
/// symbols.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningSymbol {
    pub opening_id: OpeningId,
    pub room_id: RoomId,
    #[serde(serialize_with = "serialize_type")]
    pub opening_type: OpeningType,
    #[serde(serialize_with = "serialize_wall")]
    pub wall: WallDirection,
    pub unit: u32,
    /// Stretch of wall covered by the symbol.
    pub span: Segment,
    pub width: f64,
    pub kind: SymbolKind,
}

fn serialize_type<S: serde::Serializer>(t: &OpeningType, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(t.as_str())
}

fn serialize_wall<S: serde::Serializer>(w: &WallDirection, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(w)
}

/// Wall start point, unit direction along the wall, inward normal, length.
pub fn wall_frame(rect: &Rect, wall: WallDirection) -> (Point, Point, Point, f64) {
    match wall {
        WallDirection::North => (
            Point::new(rect.x, rect.y),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            rect.w,
        ),
        WallDirection::East => (
            Point::new(rect.right(), rect.y),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
            rect.h,
        ),
        WallDirection::South => (
            Point::new(rect.x, rect.bottom()),
            Point::new(1.0, 0.0),
            Point::new(0.0, -1.0),
            rect.w,
        ),
        WallDirection::West => (
            Point::new(rect.x, rect.y),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            rect.h,
        ),
    }
}

/// Wall of an opening: explicit index, then direction label, then a spread
/// by the opening's position in its room's list.
pub fn resolve_wall(opening: &Opening, index: usize) -> WallDirection {
    if let Some(i) = opening.wall_index {
        if !(0..4).contains(&i) {
            debug!(
                "opening {} wall index {} outside the 4-wall model, wrapping",
                opening.id, i
            );
        }
        return WallDirection::from_index(i.rem_euclid(4) as usize);
    }
    if let Some(dir) = opening.wall_direction.as_deref().and_then(WallDirection::parse) {
        return dir;
    }
    WallDirection::from_index(index)
}

/// Symbol width: the scaled true width, capped to a share of the wall.
pub fn symbol_width(opening: &Opening, wall_len: f64, cfg: &LayoutConfig) -> f64 {
    let ft = opening
        .width_ft
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(cfg.default_opening_width_ft);
    (ft * cfg.scale * cfg.opening_scale)
        .min(wall_len * cfg.max_wall_fraction)
        .max(0.0)
}

fn build_kind(family: SymbolFamily, a: Point, b: Point, inward: Point, w: f64) -> SymbolKind {
    match family {
        SymbolFamily::Swing => SymbolKind::SwingArc {
            hinge: a,
            open: a.offset(inward.x * w, inward.y * w),
            closed: b,
            radius: w,
        },
        SymbolFamily::Window => {
            let line = |o: f64| {
                Segment::new(
                    a.offset(inward.x * o, inward.y * o),
                    b.offset(inward.x * o, inward.y * o),
                )
            };
            SymbolKind::Window {
                lines: [
                    line(-WINDOW_LINE_OFFSET),
                    line(0.0),
                    line(WINDOW_LINE_OFFSET),
                ],
            }
        }
        SymbolFamily::Dashed => SymbolKind::DashedBar {
            segment: Segment::new(a, b),
        },
    }
}

/// Place the openings of one room on its rectangle.
///
/// Openings without a `positionOnWall` are laid end to end in input order,
/// one quantity group after another, and the whole run is centred on its
/// wall. A run longer than the wall starts at the wall's start and spills
/// past its end rather than overlapping. `positionOnWall` centres a group at
/// that fraction of the wall instead.
pub fn place_openings(
    room_id: RoomId,
    rect: &Rect,
    openings: &[&Opening],
    cfg: &LayoutConfig,
) -> Vec<OpeningSymbol> {
    let gap = cfg.opening_unit_gap * GROUP_GAP_FACTOR;
    let groups: Vec<Group> = openings
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let wall = resolve_wall(o, i);
            let (_, _, _, wall_len) = wall_frame(rect, wall);
            let w = symbol_width(o, wall_len, cfg);
            let units = o.units();
            if units < o.quantity {
                debug!(
                    "opening {}: quantity {} drawn as {} units",
                    o.id, o.quantity, units
                );
            }
            Group {
                wall,
                w,
                units,
                len: units as f64 * w + (units - 1) as f64 * cfg.opening_unit_gap,
                fraction: o.position_on_wall.filter(|f| f.is_finite()),
            }
        })
        .collect();

    let mut runs: HashMap<WallDirection, f64> = HashMap::new();
    for g in groups.iter().filter(|g| g.fraction.is_none()) {
        *runs.entry(g.wall).or_default() += g.len + gap;
    }
    let mut cursors: HashMap<WallDirection, f64> = HashMap::new();

    let mut out = Vec::new();
    for (opening, g) in openings.iter().zip(&groups) {
        let (start, along, inward, wall_len) = wall_frame(rect, g.wall);
        let first = match g.fraction {
            Some(f) => {
                let center = f.clamp(0.0, 1.0) * wall_len;
                (center - g.len / 2.0).clamp(0.0, (wall_len - g.len).max(0.0))
            }
            None => {
                let cursor = cursors.entry(g.wall).or_insert_with(|| {
                    let run = runs.get(&g.wall).copied().unwrap_or_default() - gap;
                    if run > wall_len {
                        debug!("room {room_id}: openings overrun the {} wall", g.wall);
                    }
                    ((wall_len - run) / 2.0).max(0.0)
                });
                let at = *cursor;
                *cursor += g.len + gap;
                at
            }
        };
        let family = opening.opening_type.family();
        for unit in 0..g.units {
            let s = first + unit as f64 * (g.w + cfg.opening_unit_gap);
            let a = start.offset(along.x * s, along.y * s);
            let b = start.offset(along.x * (s + g.w), along.y * (s + g.w));
            out.push(OpeningSymbol {
                opening_id: opening.id,
                room_id,
                opening_type: opening.opening_type.clone(),
                wall: g.wall,
                unit,
                span: Segment::new(a, b),
                width: g.w,
                kind: build_kind(family, a, b, inward, g.w),
            });
        }
    }
    out
}

/// One opening's quantity group as laid along its wall.
struct Group {
    wall: WallDirection,
    w: f64,
    units: u32,
    len: f64,
    fraction: Option<f64>,
}

/// Place every opening whose room is in `placed`. Openings pointing at rooms
/// outside the sketch are dropped.
pub fn layout_openings(
    placed: &[(RoomId, Rect)],
    openings: &[Opening],
    cfg: &LayoutConfig,
) -> Vec<OpeningSymbol> {
    let mut by_room: HashMap<RoomId, Vec<&Opening>> = HashMap::new();
    for o in openings {
        by_room.entry(o.room_id).or_default().push(o);
    }
    let mut out = Vec::new();
    for (room_id, rect) in placed {
        if let Some(list) = by_room.remove(room_id) {
            out.extend(place_openings(*room_id, rect, &list, cfg));
        }
    }
    for (room_id, list) in by_room {
        for o in list {
            debug!(
                "opening {} references room {} which is not in the sketch, skipped",
                o.id, room_id
            );
        }
    }
    out
}
