//! In-memory inspection store implementing the write interfaces locally.
//!
//! The browser editor talks to a remote store instead; the CLI and the tests
//! use this one.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::compose::{SketchLayout, compose_sketch};
use crate::config::LayoutConfig;
use crate::error::{Result, SketchError};
use crate::model::{
    Adjacency, AdjacencyId, Dimensions, Opening, OpeningId, OpeningSpec, Position, Room,
    RoomId, RoomPolygon, RoomStatus, RoomUpdate,
};

/// Room create payload: a [`Room`] without its id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<RoomPolygon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(default)]
    pub status: RoomStatus,
}

impl NewRoom {
    pub fn into_room(self, id: RoomId) -> Room {
        Room {
            id,
            name: self.name,
            room_type: self.room_type,
            view_type: None,
            structure: self.structure,
            dimensions: self.dimensions,
            position: self.position,
            polygon: self.polygon,
            parent_room_id: self.parent_room_id,
            attachment_type: self.attachment_type,
            status: self.status,
            damage_count: 0,
            photo_count: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionFeed {
    pub rooms: Vec<Room>,
    pub openings: Vec<Opening>,
    pub adjacencies: Vec<Adjacency>,
}

fn check_dimensions(room_id: RoomId, d: &Dimensions) -> Result<()> {
    for (name, v) in [("length", d.length), ("width", d.width), ("height", d.height)] {
        if let Some(v) = v {
            if !v.is_finite() || v < 0.0 {
                return Err(SketchError::InvalidDimensions {
                    room_id,
                    reason: format!("{name} must be a non-negative number, got {v}"),
                });
            }
        }
    }
    Ok(())
}

impl InspectionFeed {
    pub fn from_json_str(txt: &str) -> Result<Self> {
        serde_json::from_str(txt).map_err(SketchError::InvalidFeed)
    }

    pub fn layout(&self, cfg: &LayoutConfig) -> SketchLayout {
        compose_sketch(self, cfg)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    fn room_mut(&mut self, id: RoomId) -> Result<&mut Room> {
        self.rooms
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SketchError::RoomNotFound(id))
    }

    pub fn openings_for(&self, room_id: RoomId) -> Vec<&Opening> {
        self.openings.iter().filter(|o| o.room_id == room_id).collect()
    }

    /// Apply a partial update. Sending the same update twice leaves the feed
    /// as after the first.
    pub fn apply_room_update(&mut self, id: RoomId, update: &RoomUpdate) -> Result<()> {
        if let Some(d) = &update.dimensions {
            check_dimensions(id, d)?;
        }
        let room = self.room_mut(id)?;
        if let Some(p) = update.position {
            room.position = Some(p);
        }
        if let Some(d) = update.dimensions {
            room.dimensions = Some(d);
        }
        if let Some(name) = &update.name {
            room.name = name.clone();
        }
        debug!("room {id} updated");
        Ok(())
    }

    fn next_room_id(&self) -> RoomId {
        self.rooms.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    pub fn add_room(&mut self, room: NewRoom) -> Result<RoomId> {
        let id = self.next_room_id();
        if let Some(d) = &room.dimensions {
            check_dimensions(id, d)?;
        }
        self.rooms.push(room.into_room(id));
        debug!("room {id} created");
        Ok(id)
    }

    /// Remove a room with its openings and adjacencies. Sub-areas that
    /// pointed at it become top-level rooms.
    pub fn remove_room(&mut self, id: RoomId) -> Result<()> {
        let before = self.rooms.len();
        self.rooms.retain(|r| r.id != id);
        if self.rooms.len() == before {
            return Err(SketchError::RoomNotFound(id));
        }
        self.openings.retain(|o| o.room_id != id);
        self.adjacencies.retain(|a| !a.touches(id));
        for room in self.rooms.iter_mut() {
            if room.parent_room_id == Some(id) {
                room.parent_room_id = None;
            }
        }
        debug!("room {id} removed");
        Ok(())
    }

    pub fn add_opening(&mut self, room_id: RoomId, spec: OpeningSpec) -> Result<OpeningId> {
        if self.room(room_id).is_none() {
            return Err(SketchError::RoomNotFound(room_id));
        }
        let id = self.openings.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        self.openings.push(spec.into_opening(id, room_id));
        debug!("opening {id} added to room {room_id}");
        Ok(id)
    }

    pub fn remove_opening(&mut self, id: OpeningId) -> Result<()> {
        let before = self.openings.len();
        self.openings.retain(|o| o.id != id);
        if self.openings.len() == before {
            return Err(SketchError::OpeningNotFound(id));
        }
        Ok(())
    }

    pub fn add_adjacency(
        &mut self,
        room_a: RoomId,
        wall_a: Option<&str>,
        room_b: RoomId,
        wall_b: Option<&str>,
    ) -> Result<AdjacencyId> {
        for id in [room_a, room_b] {
            if self.room(id).is_none() {
                return Err(SketchError::RoomNotFound(id));
            }
        }
        let id = self.adjacencies.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        self.adjacencies.push(Adjacency {
            id,
            room_id_a: room_a,
            room_id_b: room_b,
            wall_direction_a: wall_a.map(str::to_string),
            wall_direction_b: wall_b.map(str::to_string),
            shared_wall_length_ft: None,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OpeningType;

    const FEED: &str = r#"{
        "rooms": [
            {"id": 1, "name": "Kitchen", "roomType": "kitchen",
             "dimensions": {"length": 12, "width": 10}},
            {"id": 2, "name": "Pantry", "roomType": "pantry", "parentRoomId": 1},
            {"id": 5, "name": "Front", "roomType": "exterior_elevation_front"}
        ],
        "openings": [
            {"id": 1, "roomId": 1, "openingType": "door", "wallDirection": "south"},
            {"id": 2, "roomId": 5, "openingType": "window", "quantity": 3}
        ],
        "adjacencies": [
            {"id": 1, "roomIdA": 1, "roomIdB": 2, "wallDirectionA": "east"}
        ]
    }"#;

    #[test]
    fn test_parse_feed() {
        let feed = InspectionFeed::from_json_str(FEED).unwrap();
        assert_eq!(feed.rooms.len(), 3);
        assert_eq!(feed.openings_for(5)[0].quantity, 3);
        assert_eq!(feed.adjacencies[0].wall_direction_b, None);
    }

    #[test]
    fn test_bad_feed_is_invalid_feed() {
        let err = InspectionFeed::from_json_str("{\"rooms\": 3}").unwrap_err();
        assert!(matches!(err, SketchError::InvalidFeed(_)));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut feed = InspectionFeed::from_json_str(FEED).unwrap();
        let update = RoomUpdate {
            position: Some(Position { x: 40.0, y: 20.0 }),
            dimensions: Some(Dimensions {
                length: Some(14.0),
                width: Some(10.0),
                height: Some(8.0),
            }),
            name: None,
        };
        feed.apply_room_update(1, &update).unwrap();
        let once = feed.clone();
        feed.apply_room_update(1, &update).unwrap();
        assert_eq!(feed, once);
        assert_eq!(feed.room(1).unwrap().name, "Kitchen");
    }

    #[test]
    fn test_update_rejects_negative_dimensions() {
        let mut feed = InspectionFeed::from_json_str(FEED).unwrap();
        let update = RoomUpdate {
            dimensions: Some(Dimensions {
                length: Some(-1.0),
                width: None,
                height: None,
            }),
            ..Default::default()
        };
        let err = feed.apply_room_update(1, &update).unwrap_err();
        assert!(matches!(err, SketchError::InvalidDimensions { room_id: 1, .. }));
    }

    #[test]
    fn test_missing_room_is_not_found() {
        let mut feed = InspectionFeed::from_json_str(FEED).unwrap();
        let err = feed.apply_room_update(99, &RoomUpdate::default()).unwrap_err();
        assert!(err.is_not_found());
        assert!(feed.remove_opening(99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_room_cascades() {
        let mut feed = InspectionFeed::from_json_str(FEED).unwrap();
        feed.remove_room(1).unwrap();
        assert!(feed.room(1).is_none());
        assert!(feed.openings_for(1).is_empty());
        assert!(feed.adjacencies.is_empty());
        assert_eq!(feed.room(2).unwrap().parent_room_id, None);
        assert!(feed.remove_room(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_assigns_next_ids() {
        let mut feed = InspectionFeed::from_json_str(FEED).unwrap();
        let id = feed
            .add_room(NewRoom {
                name: "Garage".into(),
                structure: Some("Detached Garage".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(id, 6);
        let oid = feed
            .add_opening(
                id,
                OpeningSpec {
                    opening_type: OpeningType::OverheadDoor,
                    quantity: 1,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(oid, 3);
        assert!(feed.add_opening(77, OpeningSpec::default()).is_err());
        let aid = feed.add_adjacency(1, Some("west"), id, None).unwrap();
        assert_eq!(aid, 2);
    }

    #[test]
    fn test_layout_skips_child_rooms() {
        let feed = InspectionFeed::from_json_str(FEED).unwrap();
        let sketch = feed.layout(&LayoutConfig::compact());
        assert_eq!(sketch.rooms.len(), 2);
        assert!(sketch.position_of(2).is_none());
        assert_eq!(sketch.openings.len(), 4);
    }
}
