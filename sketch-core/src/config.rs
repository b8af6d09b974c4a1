//! Layout constants. Values are in drawing units unless noted otherwise.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};
use crate::model::ViewType;

/// Tunables for one sketch density. Every field has a default so partial
/// JSON overrides are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pixels per foot.
    pub scale: f64,
    pub min_room_width: f64,
    pub min_room_height: f64,
    /// Spacing between row-packed rooms.
    pub gap: f64,
    /// Distance from a section's edge to its contents.
    pub margin: f64,
    pub interior_usable_width: f64,
    pub roof_usable_width: f64,
    pub elevation_usable_width: f64,
    pub exterior_usable_width: f64,
    pub section_gap: f64,
    pub section_title_height: f64,
    pub structure_header_height: f64,
    /// Fraction of an opening's true scaled width used for its symbol.
    pub opening_scale: f64,
    /// Upper bound of a symbol's width relative to its wall.
    pub max_wall_fraction: f64,
    /// Feet; used when an opening has no width.
    pub default_opening_width_ft: f64,
    /// Spacing between repeated symbols of one opening.
    pub opening_unit_gap: f64,
    pub grid_size: f64,
    /// Side of a resize handle in screen pixels.
    pub handle_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig::compact()
    }
}

impl LayoutConfig {
    /// Dense view used in the side panel.
    pub fn compact() -> Self {
        LayoutConfig {
            scale: 3.0,
            min_room_width: 40.0,
            min_room_height: 30.0,
            gap: 8.0,
            margin: 10.0,
            interior_usable_width: 260.0,
            roof_usable_width: 260.0,
            elevation_usable_width: 260.0,
            exterior_usable_width: 260.0,
            section_gap: 16.0,
            section_title_height: 14.0,
            structure_header_height: 20.0,
            opening_scale: 0.5,
            max_wall_fraction: 0.35,
            default_opening_width_ft: 3.0,
            opening_unit_gap: 2.0,
            grid_size: 6.0,
            handle_size: 8.0,
            min_zoom: 0.25,
            max_zoom: 4.0,
        }
    }

    /// Full-canvas view.
    pub fn expanded() -> Self {
        LayoutConfig {
            scale: 6.0,
            interior_usable_width: 520.0,
            roof_usable_width: 520.0,
            elevation_usable_width: 520.0,
            exterior_usable_width: 520.0,
            section_gap: 24.0,
            section_title_height: 18.0,
            structure_header_height: 26.0,
            grid_size: 12.0,
            ..LayoutConfig::compact()
        }
    }

    pub fn from_json_str(txt: &str) -> Result<Self> {
        let cfg: LayoutConfig = serde_json::from_str(txt).map_err(SketchError::InvalidConfigJson)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("scale", self.scale),
            ("min_room_width", self.min_room_width),
            ("min_room_height", self.min_room_height),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(SketchError::InvalidConfig(format!(
                    "{name} must be positive, got {v}"
                )));
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(SketchError::InvalidConfig(
                "min_zoom exceeds max_zoom".to_string(),
            ));
        }
        if self.gap < 0.0 || self.margin < 0.0 || self.grid_size < 0.0 {
            return Err(SketchError::InvalidConfig(
                "gap, margin and grid_size must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn usable_width(&self, view: ViewType) -> f64 {
        match view {
            ViewType::Interior => self.interior_usable_width,
            ViewType::RoofPlan => self.roof_usable_width,
            ViewType::Elevation => self.elevation_usable_width,
            ViewType::ExteriorOther => self.exterior_usable_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = LayoutConfig::from_json_str(r#"{"scale": 5.0}"#).unwrap();
        assert_eq!(cfg.scale, 5.0);
        assert_eq!(cfg.min_room_width, LayoutConfig::compact().min_room_width);
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let err = LayoutConfig::from_json_str(r#"{"scale": 0}"#).unwrap_err();
        assert!(matches!(err, SketchError::InvalidConfig(_)));
    }

    #[test]
    fn test_expanded_doubles_scale() {
        assert_eq!(LayoutConfig::expanded().scale, 2.0 * LayoutConfig::compact().scale);
        assert!(LayoutConfig::expanded().validate().is_ok());
    }
}
