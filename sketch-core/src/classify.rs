//! Structure and view-type bucketing.

use crate::model::{Room, ViewType};

pub const ROOF_SLOPE_TYPE: &str = "exterior_roof_slope";
pub const ELEVATION_PREFIX: &str = "exterior_elevation_";
pub const EXTERIOR_PREFIX: &str = "exterior_";

/// Diagram bucket of a room type tag. A missing tag is interior.
pub fn classify_view(room_type: Option<&str>) -> ViewType {
    match room_type {
        Some(ROOF_SLOPE_TYPE) => ViewType::RoofPlan,
        Some(t) if t.starts_with(ELEVATION_PREFIX) => ViewType::Elevation,
        Some(t) if t.starts_with(EXTERIOR_PREFIX) => ViewType::ExteriorOther,
        _ => ViewType::Interior,
    }
}

pub fn view_of(room: &Room) -> ViewType {
    classify_view(room.room_type.as_deref())
}

/// Grouping key: the room's structure, or the main dwelling when blank.
pub fn structure_key(room: &Room) -> &str {
    room.structure_name()
}

/// Rooms of one structure split by view, in composition order.
#[derive(Clone, Debug, Default)]
pub struct StructureGroup<'a> {
    pub name: String,
    pub interior: Vec<&'a Room>,
    pub roof: Vec<&'a Room>,
    pub elevations: Vec<&'a Room>,
    pub exterior: Vec<&'a Room>,
}

impl<'a> StructureGroup<'a> {
    fn new(name: &str) -> Self {
        StructureGroup {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn bucket_mut(&mut self, view: ViewType) -> &mut Vec<&'a Room> {
        match view {
            ViewType::Interior => &mut self.interior,
            ViewType::RoofPlan => &mut self.roof,
            ViewType::Elevation => &mut self.elevations,
            ViewType::ExteriorOther => &mut self.exterior,
        }
    }

    /// Non-empty sections: interior, roof plan, elevations, other exterior.
    pub fn sections(&self) -> Vec<(ViewType, &[&'a Room])> {
        [
            (ViewType::Interior, self.interior.as_slice()),
            (ViewType::RoofPlan, self.roof.as_slice()),
            (ViewType::Elevation, self.elevations.as_slice()),
            (ViewType::ExteriorOther, self.exterior.as_slice()),
        ]
        .into_iter()
        .filter(|(_, rooms)| !rooms.is_empty())
        .collect()
    }

    pub fn len(&self) -> usize {
        self.interior.len() + self.roof.len() + self.elevations.len() + self.exterior.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition top-level rooms by structure (first appearance order) and view.
/// Sub-areas with a parent room are left out.
pub fn group_rooms(rooms: &[Room]) -> Vec<StructureGroup<'_>> {
    let mut groups: Vec<StructureGroup<'_>> = Vec::new();
    for room in rooms.iter().filter(|r| r.parent_room_id.is_none()) {
        let name = structure_key(room);
        let idx = match groups.iter().position(|g| g.name == name) {
            Some(i) => i,
            None => {
                groups.push(StructureGroup::new(name));
                groups.len() - 1
            }
        };
        groups[idx].bucket_mut(view_of(room)).push(room);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: i64, room_type: Option<&str>, structure: Option<&str>) -> Room {
        Room {
            id,
            room_type: room_type.map(str::to_string),
            structure: structure.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_classification_rule() {
        assert_eq!(classify_view(Some("exterior_roof_slope")), ViewType::RoofPlan);
        assert_eq!(classify_view(Some("exterior_elevation_front")), ViewType::Elevation);
        assert_eq!(classify_view(Some("exterior_fence")), ViewType::ExteriorOther);
        assert_eq!(classify_view(Some("exterior_roof_slope_2")), ViewType::ExteriorOther);
        assert_eq!(classify_view(Some("kitchen")), ViewType::Interior);
        assert_eq!(classify_view(Some("Exterior_fence")), ViewType::Interior);
        assert_eq!(classify_view(None), ViewType::Interior);
    }

    #[test]
    fn test_grouping_by_structure_and_view() {
        let rooms = vec![
            room(1, Some("kitchen"), None),
            room(2, Some("exterior_roof_slope"), Some("Detached Garage")),
            room(3, Some("exterior_elevation_left"), Some("Main Dwelling")),
            room(4, Some("bath"), Some("  ")),
            room(5, Some("bay"), None),
        ];
        let mut with_parent = rooms.clone();
        with_parent[4].parent_room_id = Some(1);
        let groups = group_rooms(&with_parent);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Main Dwelling");
        assert_eq!(
            groups[0].interior.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 4]
        );
        assert_eq!(groups[0].elevations.len(), 1);
        assert_eq!(groups[1].name, "Detached Garage");
        assert_eq!(groups[1].sections().len(), 1);
        assert_eq!(groups[1].sections()[0].0, ViewType::RoofPlan);
        assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), 4);
    }
}
