//! Layout engine for live inspection floor-plan sketches.
//!
//! Everything here is synchronous and free of I/O: a feed of rooms, openings
//! and adjacencies goes in, a [`SketchLayout`] comes out.

pub mod adjacency;
pub mod classify;
pub mod compose;
pub mod config;
pub mod editor;
pub mod error;
pub mod feed;
pub mod geometry;
pub mod model;
pub mod openings;
pub mod packer;
pub mod walls;

pub use compose::{PlacedRoom, SketchLayout, compose_parts, compose_sketch, fmt_ft};
pub use config::LayoutConfig;
pub use editor::{EditorIntent, SketchEditor, ViewTransform};
pub use error::{Result, SketchError};
pub use feed::{InspectionFeed, NewRoom};
pub use geometry::{Point, Rect, Size};
pub use model::{
    Adjacency, Dimensions, MAX_OPENING_UNITS, Opening, OpeningSpec, OpeningType, Position, Room,
    RoomId, RoomStatus, RoomUpdate, ViewType, WallDirection,
};

/// Fill, stroke and dash pattern of a room body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusStyle {
    pub fill: &'static str,
    pub stroke: &'static str,
    /// SVG `stroke-dasharray`, `None` for a solid line.
    pub dash: Option<&'static str>,
}

impl RoomStatus {
    pub fn style(self) -> StatusStyle {
        match self {
            RoomStatus::NotStarted => StatusStyle {
                fill: "#f4f4f5",
                stroke: "#71717a",
                dash: Some("4 3"),
            },
            RoomStatus::InProgress => StatusStyle {
                fill: "#fef9c3",
                stroke: "#ca8a04",
                dash: None,
            },
            RoomStatus::Complete => StatusStyle {
                fill: "#dcfce7",
                stroke: "#16a34a",
                dash: None,
            },
        }
    }
}

/// Accent colour of a view's section title and outline grammar.
pub fn view_color(view: ViewType) -> &'static str {
    match view {
        ViewType::Interior => "#1f2937",
        ViewType::RoofPlan => "#7c2d12",
        ViewType::Elevation => "#1e3a8a",
        ViewType::ExteriorOther => "#065f46",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_styles_differ() {
        let a = RoomStatus::NotStarted.style();
        let b = RoomStatus::InProgress.style();
        let c = RoomStatus::Complete.style();
        assert_ne!(a.fill, b.fill);
        assert_ne!(b.fill, c.fill);
        assert!(a.dash.is_some() && c.dash.is_none());
    }
}
