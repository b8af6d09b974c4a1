use std::collections::HashMap;

use proptest::prelude::*;
use sketch_core::geometry::size_of;
use sketch_core::packer::pack_rows;
use sketch_core::{
    Adjacency, Dimensions, LayoutConfig, Opening, OpeningType, Rect, Room, RoomId, Size,
    compose_parts,
};

const DIRECTIONS: [&str; 6] = ["north", "east", "south", "west", "rear", "sideways"];

/// Overlap with a small tolerance so touching edges never count.
fn overlaps(a: &Rect, b: &Rect) -> bool {
    const EPS: f64 = 1e-6;
    a.x + EPS < b.right() && b.x + EPS < a.right() && a.y + EPS < b.bottom() && b.y + EPS < a.bottom()
}

fn room(id: RoomId, dims: Option<(f64, f64)>, room_type: &str) -> Room {
    Room {
        id,
        name: format!("Room {id}"),
        room_type: Some(room_type.to_string()),
        dimensions: dims.map(|(l, w)| Dimensions {
            length: Some(l),
            width: Some(w),
            height: None,
        }),
        ..Default::default()
    }
}

fn rooms_strategy() -> impl Strategy<Value = Vec<Room>> {
    let kinds = prop_oneof![
        Just("kitchen"),
        Just("bedroom"),
        Just("exterior_roof_slope"),
        Just("exterior_elevation_rear"),
        Just("exterior_deck"),
    ];
    proptest::collection::vec(
        (proptest::option::of((1.0..30.0f64, 1.0..30.0f64)), kinds),
        1..14,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (dims, kind))| room(i as RoomId + 1, dims, kind))
            .collect()
    })
}

fn edges_strategy() -> impl Strategy<Value = Vec<Adjacency>> {
    proptest::collection::vec((1..15i64, 1..15i64, 0..6usize, 0..6usize), 0..25).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (a, b, da, db))| Adjacency {
                    id: i as i64 + 1,
                    room_id_a: a,
                    room_id_b: b,
                    wall_direction_a: Some(DIRECTIONS[da].to_string()),
                    wall_direction_b: Some(DIRECTIONS[db].to_string()),
                    shared_wall_length_ft: None,
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn packing_never_overlaps(
        sizes in proptest::collection::vec((1.0..120.0f64, 1.0..120.0f64), 0..40),
        extra in 0.0..300.0f64,
        gap in 0.0..12.0f64,
    ) {
        let items: Vec<(RoomId, Size)> = sizes
            .iter()
            .enumerate()
            .map(|(i, (w, h))| (i as RoomId, Size::new(*w, *h)))
            .collect();
        let widest = sizes.iter().map(|(w, _)| *w).fold(0.0, f64::max);
        let pack = pack_rows(&items, widest + extra, gap);
        prop_assert_eq!(pack.placements.len(), items.len());
        for (i, (_, a)) in pack.placements.iter().enumerate() {
            for (_, b) in &pack.placements[i + 1..] {
                prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn packing_is_order_stable(
        sizes in proptest::collection::vec((1.0..120.0f64, 1.0..120.0f64), 0..40),
        usable in 50.0..400.0f64,
    ) {
        let items: Vec<(RoomId, Size)> = sizes
            .iter()
            .enumerate()
            .map(|(i, (w, h))| (i as RoomId, Size::new(*w, *h)))
            .collect();
        let first = pack_rows(&items, usable, 8.0);
        let second = pack_rows(&items, usable, 8.0);
        prop_assert_eq!(&first, &second);
        let ids: Vec<RoomId> = first.placements.iter().map(|(id, _)| *id).collect();
        let expected: Vec<RoomId> = items.iter().map(|(id, _)| *id).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn every_room_gets_exactly_one_position(
        rooms in rooms_strategy(),
        edges in edges_strategy(),
        expanded in any::<bool>(),
    ) {
        let cfg = if expanded { LayoutConfig::expanded() } else { LayoutConfig::compact() };
        let sketch = compose_parts(&rooms, &[], &edges, &cfg);
        let mut seen: HashMap<RoomId, usize> = HashMap::new();
        for r in &sketch.rooms {
            *seen.entry(r.id).or_default() += 1;
        }
        prop_assert_eq!(seen.len(), rooms.len());
        prop_assert!(seen.values().all(|n| *n == 1));
        for (i, a) in sketch.rooms.iter().enumerate() {
            for b in &sketch.rooms[i + 1..] {
                prop_assert!(!overlaps(&a.rect, &b.rect), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn opening_symbols_match_quantities(
        rooms in rooms_strategy(),
        raw in proptest::collection::vec((1..20i64, 1..6u32, 0..3usize, proptest::option::of(-2..7i64)), 0..20),
    ) {
        let types = ["door", "window", "overhead_door"];
        let openings: Vec<Opening> = raw
            .iter()
            .enumerate()
            .map(|(i, (room_id, qty, t, wall))| Opening {
                id: i as i64 + 1,
                room_id: *room_id,
                opening_type: OpeningType::parse(types[*t]),
                wall_index: *wall,
                quantity: *qty,
                ..Default::default()
            })
            .collect();
        let cfg = LayoutConfig::compact();
        let sketch = compose_parts(&rooms, &openings, &[], &cfg);
        for r in &rooms {
            let want: u32 = openings.iter().filter(|o| o.room_id == r.id).map(|o| o.quantity).sum();
            let got = sketch.symbols_for(r.id).count() as u32;
            prop_assert_eq!(got, want);
        }
        let known: u32 = openings
            .iter()
            .filter(|o| rooms.iter().any(|r| r.id == o.room_id))
            .map(|o| o.quantity)
            .sum();
        prop_assert_eq!(sketch.openings.len() as u32, known);
    }

    #[test]
    fn sizes_never_fall_below_minimum(
        length in proptest::option::of(prop_oneof![-50.0..50.0f64, Just(0.0), Just(f64::NAN)]),
        width in proptest::option::of(prop_oneof![-50.0..50.0f64, Just(0.0), Just(f64::INFINITY)]),
    ) {
        let cfg = LayoutConfig::compact();
        let r = Room {
            id: 1,
            dimensions: Some(Dimensions { length, width, height: None }),
            ..Default::default()
        };
        let s = size_of(&r, &cfg);
        prop_assert!(s.w >= cfg.min_room_width);
        prop_assert!(s.h >= cfg.min_room_height);
    }
}
