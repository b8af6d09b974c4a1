use thiserror::Error;

use crate::model::{OpeningId, RoomId};

/// Result type for feed and editor write paths
pub type Result<T> = std::result::Result<T, SketchError>;

/// Errors surfaced by write paths. Layout itself never fails.
#[derive(Error, Debug)]
pub enum SketchError {
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    #[error("Opening {0} not found")]
    OpeningNotFound(OpeningId),

    #[error("Invalid inspection feed: {0}")]
    InvalidFeed(#[source] serde_json::Error),

    #[error("Invalid layout config JSON: {0}")]
    InvalidConfigJson(#[source] serde_json::Error),

    #[error("Invalid layout config: {0}")]
    InvalidConfig(String),

    #[error("Invalid dimensions for room {room_id}: {reason}")]
    InvalidDimensions { room_id: RoomId, reason: String },
}

impl SketchError {
    /// Deleted-while-in-flight targets are treated as success by callers.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SketchError::RoomNotFound(_) | SketchError::OpeningNotFound(_)
        )
    }
}
