use log::debug;
use png::{BitDepth, ColorType, Encoder};
use sketch_core::compose::{PlacedRoom, SectionLayout, SketchLayout, StructureHeader};
use sketch_core::openings::{OpeningSymbol, SymbolKind};
use sketch_core::walls::SharedWall;
use sketch_core::{Point, Rect, ViewType, view_color};

const WALL_WIDTH: f64 = 2.0;
const PARTITION_COLOR: &str = "#9ca3af";
const OPENING_COLOR: &str = "#2563eb";
const DAMAGE_COLOR: &str = "#dc2626";
const PHOTO_COLOR: &str = "#7c3aed";
const EMPTY_W: f64 = 200.0;
const EMPTY_H: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvgOptions {
    /// Output pixels per drawing unit.
    pub px_per_unit: f64,
    /// Grid spacing in drawing units, `None` for no grid.
    pub grid: Option<f64>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            px_per_unit: 2.0,
            grid: None,
        }
    }
}

// Shared PNG encoder: RGBA -> PNG bytes (deterministic for same input)
pub fn encode_rgba_to_png_bytes(
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, width, height);
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        {
            let mut writer = enc.write_header()?;
            writer.write_image_data(rgba)?;
        }
        // enc drops here, releasing the &mut buf borrow
    }
    Ok(buf)
}

pub fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn path_from_points<F>(pts: &[Point], to_px: &F, attrs: &str) -> String
where
    F: Fn(Point) -> (f64, f64),
{
    if pts.is_empty() {
        return String::new();
    }
    let (x0, y0) = to_px(pts[0]);
    let mut out = format!("<path d=\"M {:.2} {:.2}", x0, y0);
    for p in &pts[1..] {
        let (x, y) = to_px(*p);
        out.push_str(&format!(" L {:.2} {:.2}", x, y));
    }
    out.push_str(&format!(" Z\" {attrs}/>\n"));
    out
}

fn line<F>(s: &mut String, a: Point, b: Point, to_px: &F, attrs: &str)
where
    F: Fn(Point) -> (f64, f64),
{
    let (x0, y0) = to_px(a);
    let (x1, y1) = to_px(b);
    s.push_str(&format!(
        "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" {attrs}/>\n",
        x0, y0, x1, y1
    ));
}

/// Diagonal slope hatch inside `r`: lines `x + y = c` clipped to the rect.
fn hatch_lines(r: &Rect, spacing: f64) -> Vec<(Point, Point)> {
    let mut out = Vec::new();
    if spacing <= 0.0 {
        return out;
    }
    let mut c = r.x + r.y + spacing;
    while c < r.right() + r.bottom() {
        let x0 = (c - r.bottom()).max(r.x);
        let x1 = (c - r.y).min(r.right());
        if x1 > x0 {
            out.push((Point::new(x0, c - x0), Point::new(x1, c - x1)));
        }
        c += spacing;
    }
    out
}

/// Ridge along the longer side, through the middle.
fn ridge_line(r: &Rect) -> (Point, Point) {
    let c = r.center();
    if r.w >= r.h {
        (Point::new(r.x, c.y), Point::new(r.right(), c.y))
    } else {
        (Point::new(c.x, r.y), Point::new(c.x, r.bottom()))
    }
}

fn room_body<F>(s: &mut String, room: &PlacedRoom, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    let style = room.status.style();
    let dash = |d: Option<&str>| match d {
        Some(d) => format!(" stroke-dasharray=\"{d}\""),
        None => String::new(),
    };
    let wall = format!("stroke-width=\"{:.2}\"", WALL_WIDTH * k);
    s.push_str(&format!("<g class=\"room {}\" data-room-id=\"{}\">\n", room.view.as_str(), room.id));
    match room.view {
        ViewType::Interior => {
            let attrs = format!(
                "fill=\"{}\" stroke=\"{}\" {wall}{}",
                style.fill,
                style.stroke,
                dash(style.dash)
            );
            s.push_str(&path_from_points(&room.outline, to_px, &attrs));
        }
        ViewType::RoofPlan => {
            let color = view_color(room.view);
            let attrs = format!("fill=\"{}\" stroke=\"{color}\" {wall}", style.fill);
            s.push_str(&path_from_points(&room.outline, to_px, &attrs));
            let thin = format!("stroke=\"{color}\" stroke-width=\"{:.2}\" opacity=\"0.5\"", 0.6 * k);
            for (a, b) in hatch_lines(&room.rect, 8.0) {
                line(s, a, b, to_px, &thin);
            }
            let (a, b) = ridge_line(&room.rect);
            line(s, a, b, to_px, &format!("stroke=\"{color}\" {wall}"));
        }
        ViewType::Elevation => {
            let color = view_color(room.view);
            let attrs = format!("fill=\"{}\" stroke=\"{color}\" {wall}", style.fill);
            s.push_str(&path_from_points(&room.outline, to_px, &attrs));
            let y = room.rect.bottom();
            line(
                s,
                Point::new(room.rect.x - 6.0, y),
                Point::new(room.rect.right() + 6.0, y),
                to_px,
                &format!("class=\"ground\" stroke=\"#44403c\" stroke-width=\"{:.2}\"", 3.0 * k),
            );
        }
        ViewType::ExteriorOther => {
            let color = view_color(room.view);
            let attrs = format!(
                "fill=\"none\" stroke=\"{color}\" {wall} stroke-dasharray=\"{:.1} {:.1}\"",
                6.0 * k,
                4.0 * k
            );
            s.push_str(&path_from_points(&room.outline, to_px, &attrs));
        }
    }
    s.push_str("</g>\n");
}

fn room_text<F>(s: &mut String, room: &PlacedRoom, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    let (cx, cy) = to_px(room.rect.center());
    s.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"#111827\" font-size=\"{:.1}\">{}</text>\n",
        cx,
        cy - 2.0 * k,
        9.0 * k,
        svg_escape(&room.name)
    ));
    s.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"#4b5563\" font-size=\"{:.1}\">{}</text>\n",
        cx,
        cy + 8.0 * k,
        7.0 * k,
        svg_escape(&room.label)
    ));
}

fn badges<F>(s: &mut String, room: &PlacedRoom, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    let r = 5.0;
    let mut x = room.rect.right() - r - 2.0;
    let y = room.rect.y + r + 2.0;
    for (count, color, class) in [
        (room.damage_count, DAMAGE_COLOR, "damage"),
        (room.photo_count, PHOTO_COLOR, "photo"),
    ] {
        if count == 0 {
            continue;
        }
        let (px, py) = to_px(Point::new(x, y));
        s.push_str(&format!(
            "<circle class=\"badge {class}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{color}\" stroke=\"none\"/>\n",
            px,
            py,
            r * k
        ));
        s.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"#ffffff\" stroke=\"none\" font-size=\"{:.1}\">{}</text>\n",
            px,
            py + 2.5 * k,
            7.0 * k,
            count
        ));
        x -= 2.0 * r + 2.0;
    }
}

fn opening_symbol<F>(s: &mut String, sym: &OpeningSymbol, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    // clear the wall under the symbol first
    line(
        s,
        sym.span.a,
        sym.span.b,
        to_px,
        &format!("stroke=\"#ffffff\" stroke-width=\"{:.2}\"", (WALL_WIDTH + 1.0) * k),
    );
    let stroke = format!(
        "class=\"opening {}\" stroke=\"{OPENING_COLOR}\" stroke-width=\"{:.2}\" fill=\"none\"",
        sym.opening_type.as_str(),
        k
    );
    match sym.kind {
        SymbolKind::SwingArc {
            hinge,
            open,
            closed,
            radius,
        } => {
            line(s, hinge, open, to_px, &stroke);
            let (ox, oy) = to_px(open);
            let (cx, cy) = to_px(closed);
            let cross = (open.x - hinge.x) * (closed.y - hinge.y) - (open.y - hinge.y) * (closed.x - hinge.x);
            let sweep = if cross > 0.0 { 1 } else { 0 };
            s.push_str(&format!(
                "<path d=\"M {:.2} {:.2} A {:.2} {:.2} 0 0 {sweep} {:.2} {:.2}\" {stroke}/>\n",
                ox,
                oy,
                radius * k,
                radius * k,
                cx,
                cy
            ));
        }
        SymbolKind::Window { lines } => {
            for seg in lines {
                line(s, seg.a, seg.b, to_px, &stroke);
            }
        }
        SymbolKind::DashedBar { segment } => {
            let dashed = format!("{stroke} stroke-dasharray=\"{:.1} {:.1}\"", 3.0 * k, 2.0 * k);
            line(s, segment.a, segment.b, to_px, &dashed);
        }
    }
}

fn shared_wall<F>(s: &mut String, wall: &SharedWall, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    line(
        s,
        wall.segment.a,
        wall.segment.b,
        to_px,
        &format!(
            "class=\"partition\" stroke=\"{PARTITION_COLOR}\" stroke-width=\"{:.2}\"",
            WALL_WIDTH * k
        ),
    );
}

fn section_title<F>(s: &mut String, sec: &SectionLayout, margin: f64, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    let (x, y) = to_px(Point::new(margin, sec.origin.y - 3.0));
    s.push_str(&format!(
        "<text class=\"section-title\" x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" stroke=\"none\" font-size=\"{:.1}\">{}</text>\n",
        x,
        y,
        view_color(sec.view),
        9.0 * k,
        svg_escape(&sec.title)
    ));
}

fn structure_header<F>(s: &mut String, h: &StructureHeader, width: f64, margin: f64, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    let base = h.y + h.height - 5.0;
    let (x, y) = to_px(Point::new(margin, base));
    s.push_str(&format!(
        "<text class=\"structure-header\" x=\"{:.2}\" y=\"{:.2}\" fill=\"#111827\" stroke=\"none\" font-size=\"{:.1}\" font-weight=\"bold\">{}</text>\n",
        x,
        y,
        11.0 * k,
        svg_escape(&h.name)
    ));
    line(
        s,
        Point::new(margin, h.y + h.height - 1.0),
        Point::new(width - margin, h.y + h.height - 1.0),
        to_px,
        &format!("stroke=\"#d1d5db\" stroke-width=\"{:.2}\"", k),
    );
}

fn grid_lines<F>(s: &mut String, width: f64, height: f64, step: f64, to_px: &F, k: f64)
where
    F: Fn(Point) -> (f64, f64),
{
    if step <= 0.0 {
        return;
    }
    let attrs = format!("stroke=\"#eef2f7\" stroke-width=\"{:.2}\"", 0.5 * k);
    let mut x = 0.0;
    while x <= width {
        line(s, Point::new(x, 0.0), Point::new(x, height), to_px, &attrs);
        x += step;
    }
    let mut y = 0.0;
    while y <= height {
        line(s, Point::new(0.0, y), Point::new(width, y), to_px, &attrs);
        y += step;
    }
}

/// Render a composed sketch. Returns the document and its pixel size.
pub fn build_sketch_svg(layout: &SketchLayout, opts: &SvgOptions) -> (String, u32, u32) {
    let k = opts.px_per_unit;
    let (w_units, h_units) = if layout.is_empty() {
        (EMPTY_W, EMPTY_H)
    } else {
        (layout.width, layout.height)
    };
    let w_px = (w_units * k).ceil().max(1.0) as u32;
    let h_px = (h_units * k).ceil().max(1.0) as u32;
    let to_px = |p: Point| (p.x * k, p.y * k);
    let margin = layout.margin;

    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" stroke=\"#333\" fill=\"none\" stroke-linejoin=\"round\" font-family=\"sans-serif\">\n", w_px, h_px, w_px, h_px));
    s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
    if layout.is_empty() {
        s.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"#6b7280\" stroke=\"none\" font-size=\"{:.1}\">No rooms yet</text>\n",
            EMPTY_W * k / 2.0,
            EMPTY_H * k / 2.0,
            10.0 * k
        ));
        s.push_str("</svg>\n");
        return (s, w_px, h_px);
    }
    if let Some(step) = opts.grid {
        grid_lines(&mut s, layout.width, layout.height, step, &to_px, k);
    }
    for h in &layout.headers {
        structure_header(&mut s, h, layout.width, margin, &to_px, k);
    }
    for sec in &layout.sections {
        section_title(&mut s, sec, margin, &to_px, k);
    }
    for room in &layout.rooms {
        room_body(&mut s, room, &to_px, k);
    }
    for wall in &layout.shared_walls {
        shared_wall(&mut s, wall, &to_px, k);
    }
    for sym in &layout.openings {
        opening_symbol(&mut s, sym, &to_px, k);
    }
    for room in &layout.rooms {
        room_text(&mut s, room, &to_px, k);
        badges(&mut s, room, &to_px, k);
    }
    s.push_str("</svg>\n");
    debug!(
        "rendered sketch svg {}x{} px, {} rooms, {} opening symbols",
        w_px,
        h_px,
        layout.rooms.len(),
        layout.openings.len()
    );
    (s, w_px, h_px)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_core::{InspectionFeed, LayoutConfig};

    fn render(txt: &str) -> String {
        let feed = InspectionFeed::from_json_str(txt).unwrap();
        let layout = feed.layout(&LayoutConfig::expanded());
        build_sketch_svg(&layout, &SvgOptions::default()).0
    }

    #[test]
    fn test_empty_sketch_has_placeholder() {
        let (svg, w, h) = build_sketch_svg(&SketchLayout::default(), &SvgOptions::default());
        assert!(svg.contains("No rooms yet"));
        assert_eq!((w, h), (400, 120));
    }

    #[test]
    fn test_symbols_and_partitions() {
        let svg = render(
            r#"{
            "rooms": [
                {"id": 1, "name": "Kitchen", "dimensions": {"length": 12, "width": 10}, "damageCount": 2},
                {"id": 2, "name": "Dining", "dimensions": {"length": 10, "width": 10}}
            ],
            "openings": [
                {"id": 1, "roomId": 1, "openingType": "door", "wallDirection": "south", "quantity": 2},
                {"id": 2, "roomId": 2, "openingType": "window", "wallIndex": 1}
            ],
            "adjacencies": [{"id": 1, "roomIdA": 1, "roomIdB": 2, "wallDirectionA": "east"}]
        }"#,
        );
        assert_eq!(svg.matches("class=\"opening door\"").count(), 4);
        assert_eq!(svg.matches("class=\"opening window\"").count(), 3);
        assert_eq!(svg.matches("class=\"partition\"").count(), 1);
        assert_eq!(svg.matches("class=\"badge damage\"").count(), 1);
        assert!(!svg.contains("badge photo"));
        assert!(svg.contains("12' × 10'"));
        assert!(svg.contains(">Floor Plan<"));
        assert!(!svg.contains("structure-header"));
    }

    #[test]
    fn test_view_grammars_and_headers() {
        let svg = render(
            r#"{
            "rooms": [
                {"id": 1, "name": "Roof A", "roomType": "exterior_roof_slope", "dimensions": {"length": 30, "width": 20}},
                {"id": 2, "name": "Front", "roomType": "exterior_elevation_front"},
                {"id": 3, "name": "Fence & Gate", "roomType": "exterior_fence", "structure": "Yard"}
            ]
        }"#,
        );
        assert_eq!(svg.matches("class=\"structure-header\"").count(), 2);
        assert_eq!(svg.matches("class=\"ground\"").count(), 1);
        assert!(svg.contains("Fence &amp; Gate"));
        assert!(svg.contains(">Roof Plan<"));
        assert!(svg.contains(">Elevations<"));
        assert!(svg.contains(">Exterior<"));
    }

    #[test]
    fn test_titles_use_configured_margin_next_to_pinned_room() {
        let svg = render(
            r#"{
            "rooms": [
                {"id": 1, "name": "Den", "position": {"x": 200, "y": 150}},
                {"id": 2, "name": "Porch", "roomType": "exterior_porch", "position": {"x": 90, "y": 40}}
            ]
        }"#,
        );
        let k = SvgOptions::default().px_per_unit;
        let x = format!("x=\"{:.2}\"", LayoutConfig::expanded().margin * k);
        assert_eq!(svg.matches("class=\"section-title\"").count(), 2);
        for line in svg.lines().filter(|l| l.contains("class=\"section-title\"")) {
            assert!(line.contains(&x), "{line}");
        }
    }

    #[test]
    fn test_hatch_stays_inside_rect() {
        let r = Rect::new(10.0, 20.0, 50.0, 30.0);
        let lines = hatch_lines(&r, 8.0);
        assert!(!lines.is_empty());
        for (a, b) in lines {
            for p in [a, b] {
                assert!(p.x >= r.x - 1e-9 && p.x <= r.right() + 1e-9);
                assert!(p.y >= r.y - 1e-9 && p.y <= r.bottom() + 1e-9);
            }
        }
    }

    #[test]
    fn test_png_encoder_is_deterministic() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let a = encode_rgba_to_png_bytes(4, 4, &rgba).unwrap();
        let b = encode_rgba_to_png_bytes(4, 4, &rgba).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[1..4], b"PNG");
    }
}
