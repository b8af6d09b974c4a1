use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, bounding_box_of};

pub type RoomId = i64;
pub type OpeningId = i64;
pub type AdjacencyId = i64;

pub const DEFAULT_STRUCTURE: &str = "Main Dwelling";

/// Real-world room measurements in feet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Section-local drawing position, set once a user has placed the room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

/// Polygon vertex as either `[x, y]` or `{"x": .., "y": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolygonPoint {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl PolygonPoint {
    pub fn to_point(self) -> Point {
        match self {
            PolygonPoint::Pair([x, y]) => Point { x, y },
            PolygonPoint::Object { x, y } => Point { x, y },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPolygon {
    #[serde(default)]
    pub points: Vec<PolygonPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl RoomPolygon {
    pub fn to_points(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.to_point()).collect()
    }

    /// Precomputed box when it is usable, otherwise measured from the points.
    pub fn bounding_box(&self) -> BoundingBox {
        match self.bounding_box {
            Some(bb) if bb.width > 0.0 && bb.height > 0.0 => bb,
            _ => bounding_box_of(&self.to_points()),
        }
    }
}

/// Diagram category of a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewType {
    #[default]
    Interior,
    RoofPlan,
    Elevation,
    ExteriorOther,
}

impl ViewType {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewType::Interior => "interior",
            ViewType::RoofPlan => "roof_plan",
            ViewType::Elevation => "elevation",
            ViewType::ExteriorOther => "exterior_other",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewType::Interior => "Floor Plan",
            ViewType::RoofPlan => "Roof Plan",
            ViewType::Elevation => "Elevations",
            ViewType::ExteriorOther => "Exterior",
        }
    }
}

impl From<String> for ViewType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "roof_plan" => ViewType::RoofPlan,
            "elevation" => ViewType::Elevation,
            "exterior_other" => ViewType::ExteriorOther,
            _ => ViewType::Interior,
        }
    }
}

impl From<ViewType> for String {
    fn from(v: ViewType) -> Self {
        v.as_str().to_string()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::NotStarted => "not_started",
            RoomStatus::InProgress => "in_progress",
            RoomStatus::Complete => "complete",
        }
    }
}

impl From<String> for RoomStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_progress" => RoomStatus::InProgress,
            "complete" => RoomStatus::Complete,
            _ => RoomStatus::NotStarted,
        }
    }
}

impl From<RoomStatus> for String {
    fn from(v: RoomStatus) -> Self {
        v.as_str().to_string()
    }
}

/// Compass wall of a rectangular room. `front/right/rear/left` are accepted
/// as aliases of `north/east/south/west`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallDirection {
    North,
    East,
    South,
    West,
}

impl WallDirection {
    pub const ALL: [WallDirection; 4] = [
        WallDirection::North,
        WallDirection::East,
        WallDirection::South,
        WallDirection::West,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "front" | "n" => Some(WallDirection::North),
            "east" | "right" | "e" => Some(WallDirection::East),
            "south" | "rear" | "back" | "s" => Some(WallDirection::South),
            "west" | "left" | "w" => Some(WallDirection::West),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            WallDirection::North => 0,
            WallDirection::East => 1,
            WallDirection::South => 2,
            WallDirection::West => 3,
        }
    }

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % 4]
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, WallDirection::North | WallDirection::South)
    }
}

impl fmt::Display for WallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WallDirection::North => "north",
            WallDirection::East => "east",
            WallDirection::South => "south",
            WallDirection::West => "west",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
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
    #[serde(default)]
    pub damage_count: u32,
    #[serde(default)]
    pub photo_count: u32,
}

impl Room {
    pub fn structure_name(&self) -> &str {
        match self.structure.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_STRUCTURE,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.position
            .is_some_and(|p| p.x.is_finite() && p.y.is_finite())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OpeningType {
    #[default]
    Door,
    Window,
    OverheadDoor,
    PassThrough,
    Archway,
    CasedOpening,
    MissingWall,
    SlidingDoor,
    Unknown(String),
}

impl OpeningType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "door" | "standard_door" => OpeningType::Door,
            "window" => OpeningType::Window,
            "overhead_door" => OpeningType::OverheadDoor,
            "pass_through" => OpeningType::PassThrough,
            "archway" => OpeningType::Archway,
            "cased_opening" => OpeningType::CasedOpening,
            "missing_wall" => OpeningType::MissingWall,
            "sliding_door" => OpeningType::SlidingDoor,
            _ => OpeningType::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OpeningType::Door => "door",
            OpeningType::Window => "window",
            OpeningType::OverheadDoor => "overhead_door",
            OpeningType::PassThrough => "pass_through",
            OpeningType::Archway => "archway",
            OpeningType::CasedOpening => "cased_opening",
            OpeningType::MissingWall => "missing_wall",
            OpeningType::SlidingDoor => "sliding_door",
            OpeningType::Unknown(s) => s.as_str(),
        }
    }
}

impl From<String> for OpeningType {
    fn from(s: String) -> Self {
        OpeningType::parse(&s)
    }
}

impl From<OpeningType> for String {
    fn from(v: OpeningType) -> Self {
        v.as_str().to_string()
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opening {
    pub id: OpeningId,
    pub room_id: RoomId,
    #[serde(default)]
    pub opening_type: OpeningType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_on_wall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<f64>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Most symbols drawn for a single opening record.
pub const MAX_OPENING_UNITS: u32 = 64;

impl Opening {
    /// Physical unit count to draw: zero is read as one, and anything above
    /// [`MAX_OPENING_UNITS`] is capped.
    pub fn units(&self) -> u32 {
        self.quantity.clamp(1, MAX_OPENING_UNITS)
    }
}

/// Opening payload for the create interface: an [`Opening`] without ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningSpec {
    #[serde(default)]
    pub opening_type: OpeningType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_on_wall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<f64>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl OpeningSpec {
    pub fn into_opening(self, id: OpeningId, room_id: RoomId) -> Opening {
        Opening {
            id,
            room_id,
            opening_type: self.opening_type,
            wall_index: self.wall_index,
            wall_direction: self.wall_direction,
            position_on_wall: self.position_on_wall,
            width_ft: self.width_ft,
            height_ft: self.height_ft,
            quantity: self.quantity,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjacency {
    pub id: AdjacencyId,
    pub room_id_a: RoomId,
    pub room_id_b: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_direction_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_direction_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_wall_length_ft: Option<f64>,
}

impl Adjacency {
    pub fn touches(&self, id: RoomId) -> bool {
        self.room_id_a == id || self.room_id_b == id
    }

    /// Other endpoint of the edge as seen from `from`.
    pub fn other(&self, from: RoomId) -> Option<RoomId> {
        if self.room_id_a == from {
            Some(self.room_id_b)
        } else if self.room_id_b == from {
            Some(self.room_id_a)
        } else {
            None
        }
    }

    /// Wall of `from` that faces the other endpoint. Falls back to the
    /// opposite of the other endpoint's wall when `from`'s is missing.
    pub fn direction_from(&self, from: RoomId) -> Option<WallDirection> {
        let (own, theirs) = if self.room_id_a == from {
            (&self.wall_direction_a, &self.wall_direction_b)
        } else if self.room_id_b == from {
            (&self.wall_direction_b, &self.wall_direction_a)
        } else {
            return None;
        };
        own.as_deref()
            .and_then(WallDirection::parse)
            .or_else(|| {
                theirs
                    .as_deref()
                    .and_then(WallDirection::parse)
                    .map(WallDirection::opposite)
            })
    }
}

/// Partial room update pushed to the external store. Re-sending the same
/// payload is harmless.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RoomUpdate {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.dimensions.is_none() && self.name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_deserializes_camel_case() {
        let txt = r#"{
            "id": 7,
            "name": "Kitchen",
            "roomType": "kitchen",
            "dimensions": {"length": 12, "width": 10},
            "parentRoomId": 3,
            "status": "in_progress",
            "damageCount": 2
        }"#;
        let room: Room = serde_json::from_str(txt).unwrap();
        assert_eq!(room.id, 7);
        assert_eq!(room.room_type.as_deref(), Some("kitchen"));
        assert_eq!(room.parent_room_id, Some(3));
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(room.damage_count, 2);
        assert_eq!(room.photo_count, 0);
        assert_eq!(room.structure_name(), DEFAULT_STRUCTURE);
    }

    #[test]
    fn test_unknown_status_falls_back() {
        let room: Room = serde_json::from_str(r#"{"id":1,"status":"archived"}"#).unwrap();
        assert_eq!(room.status, RoomStatus::NotStarted);
    }

    #[test]
    fn test_opening_type_aliases_and_unknown() {
        assert_eq!(OpeningType::parse("standard_door"), OpeningType::Door);
        assert_eq!(OpeningType::parse("Window"), OpeningType::Window);
        assert_eq!(
            OpeningType::parse("skylight"),
            OpeningType::Unknown("skylight".into())
        );
        let o: Opening =
            serde_json::from_str(r#"{"id":1,"roomId":2,"openingType":"skylight"}"#).unwrap();
        assert_eq!(o.opening_type.as_str(), "skylight");
        assert_eq!(o.quantity, 1);
    }

    #[test]
    fn test_wall_direction_vocabularies() {
        assert_eq!(WallDirection::parse("front"), Some(WallDirection::North));
        assert_eq!(WallDirection::parse("Right"), Some(WallDirection::East));
        assert_eq!(WallDirection::parse("back"), Some(WallDirection::South));
        assert_eq!(WallDirection::parse("left"), Some(WallDirection::West));
        assert_eq!(WallDirection::parse("up"), None);
        assert_eq!(WallDirection::North.opposite(), WallDirection::South);
        assert_eq!(WallDirection::from_index(7), WallDirection::West);
    }

    #[test]
    fn test_adjacency_direction_fallback() {
        let adj = Adjacency {
            id: 1,
            room_id_a: 1,
            room_id_b: 2,
            wall_direction_a: None,
            wall_direction_b: Some("west".into()),
            shared_wall_length_ft: None,
        };
        assert_eq!(adj.direction_from(1), Some(WallDirection::East));
        assert_eq!(adj.direction_from(2), Some(WallDirection::West));
        assert_eq!(adj.direction_from(3), None);
        assert_eq!(adj.other(2), Some(1));
    }

    #[test]
    fn test_polygon_points_accept_both_forms() {
        let poly: RoomPolygon =
            serde_json::from_str(r#"{"points":[[0,0],{"x":4,"y":0},[4,3]]}"#).unwrap();
        let bb = poly.bounding_box();
        assert_eq!(bb.width, 4.0);
        assert_eq!(bb.height, 3.0);
    }
}
