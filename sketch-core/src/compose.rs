//! Stacks per-structure, per-view sections into one canvas.

use log::info;
use serde::Serialize;

use crate::adjacency::layout_adjacency;
use crate::classify::{StructureGroup, group_rooms};
use crate::config::LayoutConfig;
use crate::feed::InspectionFeed;
use crate::geometry::{Point, Rect, outline_in};
use crate::model::{
    Adjacency, DEFAULT_STRUCTURE, Dimensions, Opening, Room, RoomId, RoomStatus, ViewType,
};
use crate::openings::{OpeningSymbol, layout_openings};
use crate::packer::{GroupLayout, layout_rows};
use crate::walls::{SharedWall, find_shared_walls};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedRoom {
    pub id: RoomId,
    pub name: String,
    /// Dimension string, `—` when the room has no usable measurements.
    pub label: String,
    pub view: ViewType,
    pub structure: String,
    /// Canvas rectangle.
    pub rect: Rect,
    /// Canvas position of the owning section's content origin.
    pub section_origin: Point,
    pub outline: Vec<Point>,
    pub status: RoomStatus,
    pub damage_count: u32,
    pub photo_count: u32,
    pub pinned: bool,
    pub dimensions: Option<Dimensions>,
}

impl PlacedRoom {
    /// Rectangle relative to its section, the space stored positions live in.
    pub fn local_rect(&self) -> Rect {
        self.rect
            .translate(-self.section_origin.x, -self.section_origin.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub structure: String,
    pub view: ViewType,
    pub title: String,
    /// Top of the title band.
    pub title_y: f64,
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructureHeader {
    pub name: String,
    pub y: f64,
    pub height: f64,
}

/// Renderable geometry of a whole inspection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchLayout {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    /// Inset of titles, headers and unpinned rooms from each section's left
    /// edge.
    pub margin: f64,
    pub rooms: Vec<PlacedRoom>,
    pub openings: Vec<OpeningSymbol>,
    pub shared_walls: Vec<SharedWall>,
    pub sections: Vec<SectionLayout>,
    pub headers: Vec<StructureHeader>,
}

impl SketchLayout {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room(&self, id: RoomId) -> Option<&PlacedRoom> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn position_of(&self, id: RoomId) -> Option<Rect> {
        self.room(id).map(|r| r.rect)
    }

    pub fn symbols_for(&self, id: RoomId) -> impl Iterator<Item = &OpeningSymbol> {
        self.openings.iter().filter(move |s| s.room_id == id)
    }
}

/// Feet with one decimal, trailing `.0` dropped: `12'`, `10.5'`.
pub fn fmt_ft(v: f64) -> String {
    let r = (v * 10.0).round() / 10.0;
    if (r - r.round()).abs() < 1e-9 {
        format!("{}'", r.round() as i64)
    } else {
        format!("{r:.1}'")
    }
}

pub const NO_DIMENSIONS: &str = "—";

pub fn dimension_label(room: &Room) -> String {
    let d = room.dimensions.unwrap_or_default();
    match (d.length, d.width) {
        (Some(l), Some(w)) if l > 0.0 && w > 0.0 => format!("{} × {}", fmt_ft(l), fmt_ft(w)),
        _ => NO_DIMENSIONS.to_string(),
    }
}

fn layout_section(
    view: ViewType,
    rooms: &[&Room],
    adjacencies: &[Adjacency],
    cfg: &LayoutConfig,
) -> GroupLayout {
    match view {
        ViewType::Interior => layout_adjacency(rooms, adjacencies, cfg),
        ViewType::RoofPlan | ViewType::Elevation | ViewType::ExteriorOther => {
            layout_rows(rooms, cfg.usable_width(view), cfg)
        }
    }
}

fn show_headers(groups: &[StructureGroup<'_>]) -> bool {
    groups.len() > 1 || groups.iter().any(|g| g.name != DEFAULT_STRUCTURE)
}

/// Full layout pass over a feed. Pure: the same inputs always produce the
/// same output.
pub fn compose_sketch(feed: &InspectionFeed, cfg: &LayoutConfig) -> SketchLayout {
    compose_parts(&feed.rooms, &feed.openings, &feed.adjacencies, cfg)
}

/// Height accounting: every structure header, every section title band and
/// section body, plus one `section_gap` between consecutive sections.
pub fn compose_parts(
    rooms: &[Room],
    openings: &[Opening],
    adjacencies: &[Adjacency],
    cfg: &LayoutConfig,
) -> SketchLayout {
    let groups = group_rooms(rooms);
    let headers_on = show_headers(&groups);
    let mut out = SketchLayout {
        scale: cfg.scale,
        margin: cfg.margin,
        ..Default::default()
    };
    let mut y = 0.0_f64;
    let mut any_section = false;
    let mut placed_all: Vec<(RoomId, Rect)> = Vec::new();

    for group in &groups {
        for (k, (view, section_rooms)) in group.sections().into_iter().enumerate() {
            if any_section {
                y += cfg.section_gap;
            }
            any_section = true;
            if k == 0 && headers_on {
                out.headers.push(StructureHeader {
                    name: group.name.clone(),
                    y,
                    height: cfg.structure_header_height,
                });
                y += cfg.structure_header_height;
            }
            let title_y = y;
            y += cfg.section_title_height;
            let origin = Point::new(0.0, y);
            let local = layout_section(view, section_rooms, adjacencies, cfg);
            let rects: Vec<(RoomId, Rect)> = local
                .rects
                .iter()
                .map(|(id, r)| (*id, r.translate(origin.x, origin.y)))
                .collect();
            if view == ViewType::Interior {
                out.shared_walls.extend(find_shared_walls(&rects));
            }
            for (room, (_, rect)) in section_rooms.iter().zip(order_like(section_rooms, &rects)) {
                out.rooms.push(PlacedRoom {
                    id: room.id,
                    name: room.name.clone(),
                    label: dimension_label(room),
                    view,
                    structure: group.name.clone(),
                    rect,
                    section_origin: origin,
                    outline: outline_in(room, &rect, cfg),
                    status: room.status,
                    damage_count: room.damage_count,
                    photo_count: room.photo_count,
                    pinned: room.is_pinned(),
                    dimensions: room.dimensions,
                });
            }
            placed_all.extend(rects);
            out.sections.push(SectionLayout {
                structure: group.name.clone(),
                view,
                title: view.title().to_string(),
                title_y,
                origin,
                width: local.width,
                height: local.height,
            });
            out.width = out.width.max(local.width);
            y += local.height;
        }
    }
    out.height = y;
    out.openings = layout_openings(&placed_all, openings, cfg);
    info!(
        "composed sketch: {} rooms, {} sections, {} openings, {:.0}x{:.0}",
        out.rooms.len(),
        out.sections.len(),
        out.openings.len(),
        out.width,
        out.height
    );
    out
}

/// Rectangles reordered to match `rooms`. Group layouts already keep input
/// order; this guards against duplicate ids in a feed.
fn order_like(rooms: &[&Room], rects: &[(RoomId, Rect)]) -> Vec<(RoomId, Rect)> {
    let mut used = vec![false; rects.len()];
    rooms
        .iter()
        .map(|room| {
            let hit = rects
                .iter()
                .enumerate()
                .find(|(i, (id, _))| !used[*i] && *id == room.id);
            match hit {
                Some((i, r)) => {
                    used[i] = true;
                    *r
                }
                None => (room.id, Rect::default()),
            }
        })
        .collect()
}
