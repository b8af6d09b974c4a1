use std::f64::consts::PI;

use sketch_core::compose::{PlacedRoom, SectionLayout, StructureHeader};
use sketch_core::editor::Handle;
use sketch_core::openings::{OpeningSymbol, SymbolKind};
use sketch_core::walls::Segment;
use sketch_core::{Point, Rect, ViewType, fmt_ft, view_color};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

const OPENING_COLOR: &str = "#2563eb";
const PARTITION_COLOR: &str = "#9ca3af";
const SELECT_COLOR: &str = "#f97316";

// Non-deprecated helpers to set canvas styles via property assignment.
pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(color),
    );
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: &[f64]) {
    let arr = js_sys::Array::new();
    for d in dash {
        arr.push(&JsValue::from_f64(*d));
    }
    let _ = ctx.set_line_dash(&arr);
}

fn polygon(ctx: &CanvasRenderingContext2d, pts: &[Point]) {
    let Some(first) = pts.first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in &pts[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
}

fn segment(ctx: &CanvasRenderingContext2d, a: Point, b: Point) {
    ctx.begin_path();
    ctx.move_to(a.x, a.y);
    ctx.line_to(b.x, b.y);
    ctx.stroke();
}

/// Room outline at its current rectangle. A moved room keeps its polygon,
/// a resized one falls back to the rectangle.
pub fn outline_for(room: &PlacedRoom, rect: &Rect) -> Vec<Point> {
    let same_size = (rect.w - room.rect.w).abs() < 1e-9 && (rect.h - room.rect.h).abs() < 1e-9;
    if same_size {
        let dx = rect.x - room.rect.x;
        let dy = rect.y - room.rect.y;
        room.outline.iter().map(|p| p.offset(dx, dy)).collect()
    } else {
        rect.corners().to_vec()
    }
}

/// Body, label and badges of one room in canvas units.
pub fn draw_room(ctx: &CanvasRenderingContext2d, room: &PlacedRoom, rect: &Rect, zoom: f64, scale: f64) {
    let style = room.status.style();
    let outline = outline_for(room, rect);
    let px = 1.0 / zoom.max(1e-6);
    ctx.set_line_width(2.0 * px);
    set_dash(ctx, &[]);
    match room.view {
        ViewType::Interior => {
            polygon(ctx, &outline);
            set_fill_style(ctx, style.fill);
            ctx.fill();
            if style.dash.is_some() {
                set_dash(ctx, &[4.0 * px, 3.0 * px]);
            }
            set_stroke_style(ctx, style.stroke);
            ctx.stroke();
        }
        ViewType::RoofPlan => {
            let color = view_color(room.view);
            polygon(ctx, &outline);
            set_fill_style(ctx, style.fill);
            ctx.fill();
            set_stroke_style(ctx, color);
            ctx.stroke();
            ctx.save();
            ctx.clip();
            ctx.set_global_alpha(0.5);
            ctx.set_line_width(0.6 * px);
            let mut c = rect.x + rect.y + 8.0;
            while c < rect.right() + rect.bottom() {
                segment(ctx, Point::new(c - rect.y, rect.y), Point::new(c - rect.bottom(), rect.bottom()));
                c += 8.0;
            }
            ctx.restore();
            ctx.set_line_width(2.0 * px);
            let mid = rect.center();
            if rect.w >= rect.h {
                segment(ctx, Point::new(rect.x, mid.y), Point::new(rect.right(), mid.y));
            } else {
                segment(ctx, Point::new(mid.x, rect.y), Point::new(mid.x, rect.bottom()));
            }
        }
        ViewType::Elevation => {
            let color = view_color(room.view);
            polygon(ctx, &outline);
            set_fill_style(ctx, style.fill);
            ctx.fill();
            set_stroke_style(ctx, color);
            ctx.stroke();
            ctx.set_line_width(3.0 * px);
            set_stroke_style(ctx, "#44403c");
            segment(
                ctx,
                Point::new(rect.x - 6.0, rect.bottom()),
                Point::new(rect.right() + 6.0, rect.bottom()),
            );
        }
        ViewType::ExteriorOther => {
            polygon(ctx, &outline);
            set_dash(ctx, &[6.0 * px, 4.0 * px]);
            set_stroke_style(ctx, view_color(room.view));
            ctx.stroke();
        }
    }
    set_dash(ctx, &[]);

    // live dimensions while a resize is in flight
    let resized = (rect.w - room.rect.w).abs() > 1e-9 || (rect.h - room.rect.h).abs() > 1e-9;
    let label = if resized && scale > 0.0 {
        format!("{} × {}", fmt_ft(rect.w / scale), fmt_ft(rect.h / scale))
    } else {
        room.label.clone()
    };
    let c = rect.center();
    let font = 9.0_f64.min(rect.h / 3.0).max(1.0);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font(&format!("{font:.2}px sans-serif"));
    set_fill_style(ctx, "#111827");
    let _ = ctx.fill_text(&room.name, c.x, c.y - font * 0.6);
    ctx.set_font(&format!("{:.2}px sans-serif", font * 0.8));
    set_fill_style(ctx, "#4b5563");
    let _ = ctx.fill_text(&label, c.x, c.y + font * 0.6);

    draw_badges(ctx, room, rect);
}

fn draw_badges(ctx: &CanvasRenderingContext2d, room: &PlacedRoom, rect: &Rect) {
    let r = 5.0;
    let mut x = rect.right() - r - 2.0;
    let y = rect.y + r + 2.0;
    for (count, color) in [(room.damage_count, "#dc2626"), (room.photo_count, "#7c3aed")] {
        if count == 0 {
            continue;
        }
        ctx.begin_path();
        let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
        set_fill_style(ctx, color);
        ctx.fill();
        ctx.set_font("7px sans-serif");
        set_fill_style(ctx, "#ffffff");
        let _ = ctx.fill_text(&count.to_string(), x, y);
        x -= 2.0 * r + 2.0;
    }
}

fn shifted(s: &Segment, dx: f64, dy: f64) -> (Point, Point) {
    (s.a.offset(dx, dy), s.b.offset(dx, dy))
}

/// One opening symbol, shifted by the owning room's drag offset.
pub fn draw_opening(ctx: &CanvasRenderingContext2d, sym: &OpeningSymbol, dx: f64, dy: f64, zoom: f64) {
    let px = 1.0 / zoom.max(1e-6);
    let (a, b) = shifted(&sym.span, dx, dy);
    ctx.set_line_width(3.0 * px);
    set_stroke_style(ctx, "#ffffff");
    segment(ctx, a, b);
    ctx.set_line_width(px);
    set_stroke_style(ctx, OPENING_COLOR);
    match sym.kind {
        SymbolKind::SwingArc {
            hinge,
            open,
            closed,
            radius,
        } => {
            let hinge = hinge.offset(dx, dy);
            let open = open.offset(dx, dy);
            let closed = closed.offset(dx, dy);
            segment(ctx, hinge, open);
            let start = (open.y - hinge.y).atan2(open.x - hinge.x);
            let end = (closed.y - hinge.y).atan2(closed.x - hinge.x);
            let mut sweep = end - start;
            while sweep > PI {
                sweep -= 2.0 * PI;
            }
            while sweep <= -PI {
                sweep += 2.0 * PI;
            }
            ctx.begin_path();
            let _ = ctx.arc_with_anticlockwise(hinge.x, hinge.y, radius, start, end, sweep < 0.0);
            ctx.stroke();
        }
        SymbolKind::Window { lines } => {
            for l in &lines {
                let (a, b) = shifted(l, dx, dy);
                segment(ctx, a, b);
            }
        }
        SymbolKind::DashedBar { segment: bar } => {
            set_dash(ctx, &[3.0 * px, 2.0 * px]);
            let (a, b) = shifted(&bar, dx, dy);
            segment(ctx, a, b);
            set_dash(ctx, &[]);
        }
    }
}

pub fn draw_partition(ctx: &CanvasRenderingContext2d, seg: &Segment, zoom: f64) {
    ctx.set_line_width(2.0 / zoom.max(1e-6));
    set_stroke_style(ctx, PARTITION_COLOR);
    segment(ctx, seg.a, seg.b);
}

pub fn draw_section_title(ctx: &CanvasRenderingContext2d, sec: &SectionLayout, margin: f64) {
    ctx.set_text_align("left");
    ctx.set_text_baseline("alphabetic");
    ctx.set_font("9px sans-serif");
    set_fill_style(ctx, view_color(sec.view));
    let _ = ctx.fill_text(&sec.title, margin, sec.origin.y - 3.0);
}

pub fn draw_structure_header(ctx: &CanvasRenderingContext2d, h: &StructureHeader, width: f64, margin: f64) {
    ctx.set_text_align("left");
    ctx.set_text_baseline("alphabetic");
    ctx.set_font("bold 11px sans-serif");
    set_fill_style(ctx, "#111827");
    let _ = ctx.fill_text(&h.name, margin, h.y + h.height - 5.0);
    ctx.set_line_width(1.0);
    set_stroke_style(ctx, "#d1d5db");
    let y = h.y + h.height - 1.0;
    segment(ctx, Point::new(margin, y), Point::new(width - margin, y));
}

pub fn draw_grid(ctx: &CanvasRenderingContext2d, area: &Rect, step: f64, zoom: f64) {
    if step <= 0.0 || step * zoom < 4.0 {
        return;
    }
    ctx.set_line_width(0.5 / zoom.max(1e-6));
    set_stroke_style(ctx, "#eef2f7");
    let mut x = (area.x / step).floor() * step;
    while x <= area.right() {
        segment(ctx, Point::new(x, area.y), Point::new(x, area.bottom()));
        x += step;
    }
    let mut y = (area.y / step).floor() * step;
    while y <= area.bottom() {
        segment(ctx, Point::new(area.x, y), Point::new(area.right(), y));
        y += step;
    }
}

/// Selection outline and resize grips, drawn in screen pixels.
pub fn draw_selection(ctx: &CanvasRenderingContext2d, corners: [Point; 4], handles: &[(Handle, Point)], size: f64) {
    ctx.set_line_width(1.5);
    set_dash(ctx, &[5.0, 3.0]);
    set_stroke_style(ctx, SELECT_COLOR);
    polygon(ctx, &corners);
    ctx.stroke();
    set_dash(ctx, &[]);
    for (_, p) in handles {
        set_fill_style(ctx, "#ffffff");
        ctx.fill_rect(p.x - size / 2.0, p.y - size / 2.0, size, size);
        ctx.stroke_rect(p.x - size / 2.0, p.y - size / 2.0, size, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_core::{RoomStatus, compose::PlacedRoom};

    fn placed(rect: Rect) -> PlacedRoom {
        PlacedRoom {
            id: 1,
            name: "Den".into(),
            label: "10' × 10'".into(),
            view: ViewType::Interior,
            structure: "Main Dwelling".into(),
            rect,
            section_origin: Point::new(0.0, 0.0),
            outline: rect.corners().to_vec(),
            status: RoomStatus::NotStarted,
            damage_count: 0,
            photo_count: 0,
            pinned: false,
            dimensions: None,
        }
    }

    #[test]
    fn test_moved_outline_follows_rect() {
        let room = placed(Rect::new(10.0, 10.0, 30.0, 20.0));
        let moved = Rect::new(15.0, 5.0, 30.0, 20.0);
        let pts = outline_for(&room, &moved);
        assert_eq!(pts[0], Point::new(15.0, 5.0));
        assert_eq!(pts.len(), 4);
    }

    #[test]
    fn test_resized_outline_is_rect() {
        let room = placed(Rect::new(10.0, 10.0, 30.0, 20.0));
        let bigger = Rect::new(10.0, 10.0, 40.0, 20.0);
        assert_eq!(outline_for(&room, &bigger), bigger.corners().to_vec());
    }
}
