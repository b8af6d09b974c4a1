use approx::assert_relative_eq;
use sketch_core::openings::SymbolKind;
use sketch_core::{InspectionFeed, LayoutConfig, Rect, ViewType, WallDirection};

fn feed(txt: &str) -> InspectionFeed {
    InspectionFeed::from_json_str(txt).unwrap()
}

#[test]
fn east_west_pair_shares_a_wall() {
    let cfg = LayoutConfig::expanded();
    let f = feed(
        r#"{
        "rooms": [
            {"id": 1, "name": "A", "roomType": "living", "dimensions": {"length": 12, "width": 10}},
            {"id": 2, "name": "B", "roomType": "dining", "dimensions": {"length": 10, "width": 10}}
        ],
        "adjacencies": [
            {"id": 1, "roomIdA": 1, "roomIdB": 2, "wallDirectionA": "east", "wallDirectionB": "west"}
        ]
    }"#,
    );
    let sketch = f.layout(&cfg);
    let a = sketch.room(1).unwrap().local_rect();
    let b = sketch.room(2).unwrap().local_rect();
    assert_eq!(a, Rect::new(cfg.margin, cfg.margin, 72.0, 60.0));
    assert_eq!(b, Rect::new(cfg.margin + 72.0, cfg.margin, 60.0, 60.0));
    assert_eq!(b.x, a.x + a.w);
    assert!(!a.overlaps(&b));
    assert_relative_eq!(sketch.sections[0].width, 132.0 + 2.0 * cfg.margin);
    assert_eq!(sketch.shared_walls.len(), 1);
    assert_relative_eq!(sketch.shared_walls[0].segment.length(), 60.0);
}

#[test]
fn placeholder_exteriors_wrap_at_usable_width() {
    let cfg = LayoutConfig::compact();
    let rooms: Vec<String> = (1..=5)
        .map(|i| format!(r#"{{"id": {i}, "name": "Ext {i}", "roomType": "exterior_fence"}}"#))
        .collect();
    let f = feed(&format!(r#"{{"rooms": [{}]}}"#, rooms.join(",")));
    let sketch = f.layout(&cfg);
    assert_eq!(sketch.sections.len(), 1);
    assert_eq!(sketch.sections[0].view, ViewType::ExteriorOther);
    let rects: Vec<Rect> = sketch.rooms.iter().map(|r| r.local_rect()).collect();
    for r in &rects {
        assert_relative_eq!(r.w, cfg.min_room_width + 6.0);
        assert_relative_eq!(r.h, cfg.min_room_height);
    }
    for r in &rects[1..4] {
        assert_relative_eq!(r.y, rects[0].y);
    }
    assert_relative_eq!(rects[4].x, cfg.margin);
    assert_relative_eq!(rects[4].y, rects[0].bottom() + cfg.gap);
}

#[test]
fn door_pair_on_south_wall() {
    let cfg = LayoutConfig::expanded();
    let f = feed(
        r#"{
        "rooms": [{"id": 1, "name": "Hall", "dimensions": {"length": 12, "width": 10}}],
        "openings": [
            {"id": 1, "roomId": 1, "openingType": "door", "wallDirection": "south",
             "widthFt": 3, "quantity": 2}
        ]
    }"#,
    );
    let sketch = f.layout(&cfg);
    let rect = sketch.position_of(1).unwrap();
    let syms: Vec<_> = sketch.symbols_for(1).collect();
    assert_eq!(syms.len(), 2);
    let cap = (3.0 * 6.0 * 0.5_f64).min(rect.w * 0.35);
    for s in &syms {
        assert_eq!(s.wall, WallDirection::South);
        assert!(s.width <= cap + 1e-9);
        assert_relative_eq!(s.span.a.y, rect.bottom());
        assert!(matches!(s.kind, SymbolKind::SwingArc { .. }));
    }
    assert_relative_eq!(syms[1].span.a.x - syms[0].span.b.x, cfg.opening_unit_gap);
}

#[test]
fn orphan_opening_is_not_rendered() {
    let f = feed(
        r#"{
        "rooms": [{"id": 1, "name": "Hall"}],
        "openings": [
            {"id": 1, "roomId": 1, "openingType": "window"},
            {"id": 2, "roomId": 404, "openingType": "door"}
        ]
    }"#,
    );
    let sketch = f.layout(&LayoutConfig::compact());
    assert_eq!(sketch.openings.len(), 1);
    assert_eq!(sketch.openings[0].opening_id, 1);
}

#[test]
fn garage_gets_its_own_header_and_sections() {
    let f = feed(
        r#"{
        "rooms": [
            {"id": 1, "name": "Kitchen", "roomType": "kitchen"},
            {"id": 2, "name": "Roof", "roomType": "exterior_roof_slope"},
            {"id": 3, "name": "Bay", "structure": "Detached Garage"},
            {"id": 4, "name": "Front", "roomType": "exterior_elevation_front", "structure": "Detached Garage"}
        ]
    }"#,
    );
    let cfg = LayoutConfig::compact();
    let sketch = f.layout(&cfg);
    let heads: Vec<&str> = sketch.headers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(heads, vec!["Main Dwelling", "Detached Garage"]);
    let views: Vec<ViewType> = sketch.sections.iter().map(|s| s.view).collect();
    assert_eq!(
        views,
        vec![
            ViewType::Interior,
            ViewType::RoofPlan,
            ViewType::Interior,
            ViewType::Elevation
        ]
    );
    let body: f64 = sketch.sections.iter().map(|s| s.height).sum();
    let expected = 2.0 * cfg.structure_header_height
        + 4.0 * cfg.section_title_height
        + body
        + 3.0 * cfg.section_gap;
    assert_relative_eq!(sketch.height, expected);
}

#[test]
fn editor_write_back_round_trips_through_feed() {
    use sketch_core::{EditorIntent, SketchEditor};

    let cfg = LayoutConfig::expanded();
    let mut f = feed(
        r#"{"rooms": [
            {"id": 1, "name": "A", "dimensions": {"length": 10, "width": 10}},
            {"id": 2, "name": "B", "dimensions": {"length": 10, "width": 10}}
        ]}"#,
    );
    let mut ed = SketchEditor::new(cfg.clone());
    ed.refresh(&f.layout(&cfg));
    let start = ed.rect_of(2).unwrap();
    let grab = ed.view.canvas_to_screen(start.center());
    ed.pointer_down(grab, false);
    ed.pointer_move(grab.offset(120.0, 0.0));
    let moved = ed.rect_of(2).unwrap();
    let Some(EditorIntent::UpdateRoom { room_id, update }) = ed.pointer_up() else {
        panic!("expected an update");
    };
    f.apply_room_update(room_id, &update).unwrap();
    ed.acknowledge(room_id);
    ed.refresh(&f.layout(&cfg));
    let after = ed.rect_of(2).unwrap();
    assert_relative_eq!(after.x, moved.x);
    assert_relative_eq!(after.y, moved.y);
}

#[test]
fn moving_one_room_leaves_the_other_in_place() {
    use sketch_core::{EditorIntent, SketchEditor};

    let cfg = LayoutConfig::expanded();
    let mut f = feed(
        r#"{"rooms": [
            {"id": 1, "name": "A", "dimensions": {"length": 10, "width": 10}},
            {"id": 2, "name": "B", "dimensions": {"length": 10, "width": 10}}
        ]}"#,
    );
    let mut ed = SketchEditor::new(cfg.clone());
    ed.refresh(&f.layout(&cfg));
    let untouched = ed.rect_of(1).unwrap();
    let grab = ed.view.canvas_to_screen(ed.rect_of(2).unwrap().center());
    ed.pointer_down(grab, false);
    ed.pointer_move(grab.offset(120.0, 0.0));
    let Some(EditorIntent::UpdateRoom { room_id, update }) = ed.pointer_up() else {
        panic!("expected an update");
    };
    f.apply_room_update(room_id, &update).unwrap();
    ed.acknowledge(room_id);

    let sketch = f.layout(&cfg);
    ed.refresh(&sketch);
    assert_eq!(sketch.room(1).unwrap().rect, untouched);
    assert_eq!(ed.rect_of(1), Some(untouched));
    assert!(sketch.room(2).unwrap().pinned);
    assert!(!sketch.room(2).unwrap().rect.overlaps(&untouched));
}

#[test]
fn door_groups_share_a_wall_without_overlap() {
    let cfg = LayoutConfig::expanded();
    let f = feed(
        r#"{
        "rooms": [{"id": 1, "name": "Shop", "dimensions": {"length": 20, "width": 10}}],
        "openings": [
            {"id": 1, "roomId": 1, "openingType": "door", "wallDirection": "north", "quantity": 3},
            {"id": 2, "roomId": 1, "openingType": "door", "wallDirection": "north", "quantity": 3},
            {"id": 3, "roomId": 1, "openingType": "door", "wallDirection": "north", "quantity": 3},
            {"id": 4, "roomId": 1, "openingType": "window", "wallDirection": "south", "quantity": 4000000000}
        ]
    }"#,
    );
    let sketch = f.layout(&cfg);
    let rect = sketch.position_of(1).unwrap();
    let north: Vec<_> = sketch
        .symbols_for(1)
        .filter(|s| s.wall == WallDirection::North)
        .collect();
    assert_eq!(north.len(), 9);
    for (i, a) in north.iter().enumerate() {
        assert!(a.span.a.x >= rect.x && a.span.b.x <= rect.right());
        for b in &north[i + 1..] {
            let apart = a.span.b.x <= b.span.a.x + 1e-9 || b.span.b.x <= a.span.a.x + 1e-9;
            assert!(apart, "{:?} and {:?} overlap", a.span, b.span);
        }
    }
    let south = sketch.symbols_for(1).filter(|s| s.wall == WallDirection::South).count();
    assert_eq!(south, sketch_core::MAX_OPENING_UNITS as usize);
}
