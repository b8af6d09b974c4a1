//! Pointer-driven editing of a composed sketch.
//!
//! The editor owns no server state. It keeps the rectangles of the last
//! layout plus a side table of in-gesture overrides, and turns pointer
//! gestures into [`EditorIntent`]s for the caller to carry out.

use std::collections::HashMap;

use log::{debug, warn};

use crate::compose::SketchLayout;
use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, Size, bounds_of_rects};
use crate::model::{Dimensions, OpeningSpec, Position, RoomId, RoomUpdate};

/// Screen = canvas * zoom + origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub origin: Point,
    pub zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        ViewTransform {
            origin: Point::default(),
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn screen_to_canvas(&self, p: Point) -> Point {
        Point::new((p.x - self.origin.x) / self.zoom, (p.y - self.origin.y) / self.zoom)
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.origin.x, p.y * self.zoom + self.origin.y)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.origin = self.origin.offset(dx, dy);
    }

    /// Zoom by `factor` keeping the canvas point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64, min_zoom: f64, max_zoom: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let anchor = self.screen_to_canvas(screen);
        self.zoom = (self.zoom * factor).clamp(min_zoom, max_zoom);
        self.origin = Point::new(screen.x - anchor.x * self.zoom, screen.y - anchor.y * self.zoom);
    }

    /// Transform that centres `content` in a `viewport` with `padding` on
    /// every side.
    pub fn fit(content: &Rect, viewport: Size, padding: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let w = content.w.max(1.0);
        let h = content.h.max(1.0);
        let zx = (viewport.w - 2.0 * padding) / w;
        let zy = (viewport.h - 2.0 * padding) / h;
        let zoom = zx.min(zy).clamp(min_zoom, max_zoom);
        let ox = (viewport.w - w * zoom) / 2.0 - content.x * zoom;
        let oy = (viewport.h - h * zoom) / 2.0 - content.y * zoom;
        ViewTransform {
            origin: Point::new(ox, oy),
            zoom,
        }
    }
}

/// Resize grip of the selected room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::North,
        Handle::NorthEast,
        Handle::East,
        Handle::SouthEast,
        Handle::South,
        Handle::SouthWest,
        Handle::West,
    ];

    pub fn anchor(self, r: &Rect) -> Point {
        let cx = r.x + r.w / 2.0;
        let cy = r.y + r.h / 2.0;
        match self {
            Handle::NorthWest => Point::new(r.x, r.y),
            Handle::North => Point::new(cx, r.y),
            Handle::NorthEast => Point::new(r.right(), r.y),
            Handle::East => Point::new(r.right(), cy),
            Handle::SouthEast => Point::new(r.right(), r.bottom()),
            Handle::South => Point::new(cx, r.bottom()),
            Handle::SouthWest => Point::new(r.x, r.bottom()),
            Handle::West => Point::new(r.x, cy),
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::West | Handle::SouthWest)
    }

    fn moves_right(self) -> bool {
        matches!(self, Handle::NorthEast | Handle::East | Handle::SouthEast)
    }

    fn moves_top(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::North | Handle::NorthEast)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Handle::SouthWest | Handle::South | Handle::SouthEast)
    }

    /// CSS cursor name for hover feedback.
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::NorthWest | Handle::SouthEast => "nwse-resize",
            Handle::NorthEast | Handle::SouthWest => "nesw-resize",
            Handle::North | Handle::South => "ns-resize",
            Handle::East | Handle::West => "ew-resize",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Handle(RoomId, Handle),
    Room(RoomId),
    Canvas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize(Handle),
    Pan,
}

/// Request for the surrounding application.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorIntent {
    /// `None` clears the selection.
    SelectRoom(Option<RoomId>),
    UpdateRoom { room_id: RoomId, update: RoomUpdate },
    CreateOpening { room_id: RoomId, spec: OpeningSpec },
    DeleteRoom(RoomId),
}

#[derive(Clone, Debug)]
struct EditableRoom {
    id: RoomId,
    rect: Rect,
    section_origin: Point,
    dimensions: Option<Dimensions>,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    mode: DragMode,
    room_id: Option<RoomId>,
    start_screen: Point,
    start_canvas: Point,
    start_rect: Rect,
    start_view: Point,
    moved: bool,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub struct SketchEditor {
    cfg: LayoutConfig,
    rooms: Vec<EditableRoom>,
    overrides: HashMap<RoomId, Rect>,
    selected: Option<RoomId>,
    drag: Option<Drag>,
    pending_delete: Option<RoomId>,
    snap: bool,
    pub view: ViewTransform,
}

impl SketchEditor {
    pub fn new(cfg: LayoutConfig) -> Self {
        SketchEditor {
            cfg,
            rooms: Vec::new(),
            overrides: HashMap::new(),
            selected: None,
            drag: None,
            pending_delete: None,
            snap: true,
            view: ViewTransform::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Take in a freshly composed layout. Overrides are dropped except for
    /// the room being dragged right now.
    pub fn refresh(&mut self, layout: &SketchLayout) {
        self.rooms = layout
            .rooms
            .iter()
            .map(|r| EditableRoom {
                id: r.id,
                rect: r.rect,
                section_origin: r.section_origin,
                dimensions: r.dimensions,
            })
            .collect();
        let keep = self.dragging_room();
        self.overrides.retain(|id, _| Some(*id) == keep);
        if let Some(id) = self.selected {
            if !self.has_room(id) {
                self.selected = None;
            }
        }
        if let Some(id) = self.pending_delete {
            if !self.has_room(id) {
                self.pending_delete = None;
            }
        }
    }

    fn has_room(&self, id: RoomId) -> bool {
        self.rooms.iter().any(|r| r.id == id)
    }

    fn base(&self, id: RoomId) -> Option<&EditableRoom> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Current rectangle of a room; an override wins over the layout.
    pub fn rect_of(&self, id: RoomId) -> Option<Rect> {
        self.overrides
            .get(&id)
            .copied()
            .or_else(|| self.base(id).map(|r| r.rect))
    }

    /// Every room with its current rectangle, in drawing order.
    pub fn rects(&self) -> Vec<(RoomId, Rect)> {
        self.rooms
            .iter()
            .map(|r| (r.id, self.overrides.get(&r.id).copied().unwrap_or(r.rect)))
            .collect()
    }

    pub fn has_override(&self, id: RoomId) -> bool {
        self.overrides.contains_key(&id)
    }

    pub fn selected(&self) -> Option<RoomId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<RoomId>) {
        self.selected = id.filter(|id| self.has_room(*id));
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|d| d.mode)
    }

    pub fn dragging_room(&self) -> Option<RoomId> {
        self.drag.and_then(|d| d.room_id)
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.snap = !self.snap;
        self.snap
    }

    pub fn hit_test(&self, screen: Point) -> HitTarget {
        let p = self.view.screen_to_canvas(screen);
        if let Some(id) = self.selected {
            if let Some(rect) = self.rect_of(id) {
                let half = self.cfg.handle_size / 2.0 / self.view.zoom;
                for h in Handle::ALL {
                    let a = h.anchor(&rect);
                    if (p.x - a.x).abs() <= half && (p.y - a.y).abs() <= half {
                        return HitTarget::Handle(id, h);
                    }
                }
            }
        }
        self.rects()
            .iter()
            .rev()
            .find(|(_, r)| r.contains(p))
            .map(|(id, _)| HitTarget::Room(*id))
            .unwrap_or(HitTarget::Canvas)
    }

    fn begin(&mut self, mode: DragMode, room_id: Option<RoomId>, screen: Point) {
        let start_rect = room_id.and_then(|id| self.rect_of(id)).unwrap_or_default();
        self.drag = Some(Drag {
            mode,
            room_id,
            start_screen: screen,
            start_canvas: self.view.screen_to_canvas(screen),
            start_rect,
            start_view: self.view.origin,
            moved: false,
        });
    }

    /// `pan_modifier` is shift or alt held.
    pub fn pointer_down(&mut self, screen: Point, pan_modifier: bool) -> Option<EditorIntent> {
        match self.hit_test(screen) {
            HitTarget::Handle(id, h) => {
                self.begin(DragMode::Resize(h), Some(id), screen);
                None
            }
            HitTarget::Room(id) => {
                self.selected = Some(id);
                self.begin(DragMode::Move, Some(id), screen);
                Some(EditorIntent::SelectRoom(Some(id)))
            }
            HitTarget::Canvas if pan_modifier => {
                self.begin(DragMode::Pan, None, screen);
                None
            }
            HitTarget::Canvas => self
                .selected
                .take()
                .map(|_| EditorIntent::SelectRoom(None)),
        }
    }

    fn snap_to(&self, v: f64, origin: f64) -> f64 {
        let g = self.cfg.grid_size;
        if !self.snap || g <= 0.0 {
            return v;
        }
        origin + ((v - origin) / g).round() * g
    }

    fn moved_rect(&self, d: &Drag, origin: Point, dx: f64, dy: f64) -> Rect {
        let r = d.start_rect;
        Rect::new(
            self.snap_to(r.x + dx, origin.x),
            self.snap_to(r.y + dy, origin.y),
            r.w,
            r.h,
        )
    }

    fn resized_rect(&self, d: &Drag, h: Handle, origin: Point, dx: f64, dy: f64) -> Rect {
        let r = d.start_rect;
        let (mut left, mut top, mut right, mut bottom) = (r.x, r.y, r.right(), r.bottom());
        let (min_w, min_h) = (self.cfg.min_room_width, self.cfg.min_room_height);
        if h.moves_left() {
            left = self.snap_to(left + dx, origin.x).min(right - min_w);
        }
        if h.moves_right() {
            right = self.snap_to(right + dx, origin.x).max(left + min_w);
        }
        if h.moves_top() {
            top = self.snap_to(top + dy, origin.y).min(bottom - min_h);
        }
        if h.moves_bottom() {
            bottom = self.snap_to(bottom + dy, origin.y).max(top + min_h);
        }
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Returns true when something changed and a redraw is due.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        let Some(mut d) = self.drag else {
            return false;
        };
        match d.mode {
            DragMode::Pan => {
                self.view.origin = d.start_view.offset(
                    screen.x - d.start_screen.x,
                    screen.y - d.start_screen.y,
                );
            }
            DragMode::Move | DragMode::Resize(_) => {
                let Some(id) = d.room_id else {
                    return false;
                };
                let Some(origin) = self.base(id).map(|r| r.section_origin) else {
                    return false;
                };
                let p = self.view.screen_to_canvas(screen);
                let (dx, dy) = (p.x - d.start_canvas.x, p.y - d.start_canvas.y);
                let rect = match d.mode {
                    DragMode::Resize(h) => self.resized_rect(&d, h, origin, dx, dy),
                    _ => self.moved_rect(&d, origin, dx, dy),
                };
                if rect == d.start_rect && !d.moved {
                    return false;
                }
                self.overrides.insert(id, rect);
            }
        }
        d.moved = true;
        self.drag = Some(d);
        true
    }

    /// End the gesture. A move or resize yields the update to persist; the
    /// override stays until [`acknowledge`](Self::acknowledge) or the next
    /// refresh.
    pub fn pointer_up(&mut self) -> Option<EditorIntent> {
        let d = self.drag.take()?;
        if !d.moved {
            return None;
        }
        let resized = match d.mode {
            DragMode::Pan => return None,
            DragMode::Move => false,
            DragMode::Resize(_) => true,
        };
        let id = d.room_id?;
        let rect = self.overrides.get(&id).copied()?;
        let base = self.base(id)?;
        let local = rect.translate(-base.section_origin.x, -base.section_origin.y);
        let mut update = RoomUpdate {
            position: Some(Position {
                x: round1(local.x),
                y: round1(local.y),
            }),
            ..Default::default()
        };
        if resized {
            update.dimensions = Some(Dimensions {
                length: Some(round1(rect.w / self.cfg.scale)),
                width: Some(round1(rect.h / self.cfg.scale)),
                height: base.dimensions.and_then(|d| d.height),
            });
        }
        debug!("room {id} edited, persisting {update:?}");
        Some(EditorIntent::UpdateRoom {
            room_id: id,
            update,
        })
    }

    /// The store accepted the write for `room_id`.
    pub fn acknowledge(&mut self, room_id: RoomId) {
        if self.dragging_room() != Some(room_id) {
            self.overrides.remove(&room_id);
        }
    }

    /// The write failed. The optimistic rectangle stays until the next
    /// refresh.
    pub fn persist_failed(&mut self, room_id: RoomId, reason: &str) {
        warn!("saving room {room_id} failed: {reason}");
    }

    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        let factor = if delta_y < 0.0 { 1.1 } else { 1.0 / 1.1 };
        self.view
            .zoom_at(screen, factor, self.cfg.min_zoom, self.cfg.max_zoom);
    }

    /// Fit every room into the viewport.
    pub fn zoom_to_fit(&mut self, viewport: Size, padding: f64) {
        let rects = self.rects();
        if let Some(b) = bounds_of_rects(rects.iter().map(|(_, r)| r)) {
            self.view = ViewTransform::fit(&b, viewport, padding, self.cfg.min_zoom, self.cfg.max_zoom);
        }
    }

    pub fn request_delete(&mut self, room_id: RoomId) {
        if self.has_room(room_id) {
            self.pending_delete = Some(room_id);
        }
    }

    pub fn pending_delete(&self) -> Option<RoomId> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Option<EditorIntent> {
        let id = self.pending_delete.take()?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(EditorIntent::DeleteRoom(id))
    }

    pub fn create_opening(&self, room_id: RoomId, spec: OpeningSpec) -> Option<EditorIntent> {
        self.has_room(room_id)
            .then_some(EditorIntent::CreateOpening { room_id, spec })
    }
}
