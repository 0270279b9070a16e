use serde::{Deserialize, Serialize};

/// Geographic bounding box in degrees. `north > south` and `east > west`;
/// the map widget never produces antimeridian-crossing viewports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Per-edge movement beyond this discards a completed grid or composite fetch.
pub const GRID_STALE_TOLERANCE_DEG: f64 = 0.5;
/// Single-variable heatmaps cover a broader area, so they tolerate more drift.
pub const HEATMAP_STALE_TOLERANCE_DEG: f64 = 1.0;

impl GeoBounds {
    pub const WORLD: GeoBounds = GeoBounds {
        north: 90.0,
        south: -90.0,
        east: 180.0,
        west: -180.0,
    };

    /// Largest absolute per-edge difference between two boxes, in degrees.
    pub fn max_edge_delta(&self, other: &GeoBounds) -> f64 {
        (self.north - other.north)
            .abs()
            .max((self.south - other.south).abs())
            .max((self.east - other.east).abs())
            .max((self.west - other.west).abs())
    }

    /// Whether any edge moved by more than `tolerance` degrees relative to `other`.
    pub fn moved_beyond(&self, other: &GeoBounds, tolerance: f64) -> bool {
        self.max_edge_delta(other) > tolerance
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &GeoBounds) -> bool {
        self.north >= other.north
            && self.south <= other.south
            && self.east >= other.east
            && self.west <= other.west
    }

    /// Expand by `degrees` on every side, clamped to world bounds.
    pub fn padded(&self, degrees: f64) -> GeoBounds {
        GeoBounds {
            north: (self.north + degrees).min(90.0),
            south: (self.south - degrees).max(-90.0),
            east: (self.east + degrees).min(180.0),
            west: (self.west - degrees).max(-180.0),
        }
    }

    /// Round to centi-degrees so bounds can participate in a hash key.
    pub fn quantized(&self) -> QuantizedBounds {
        QuantizedBounds {
            north: (self.north * 100.0).round() as i32,
            south: (self.south * 100.0).round() as i32,
            east: (self.east * 100.0).round() as i32,
            west: (self.west * 100.0).round() as i32,
        }
    }
}

/// Bounds snapped to centi-degree precision. Hashable cache-key component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedBounds {
    pub north: i32,
    pub south: i32,
    pub east: i32,
    pub west: i32,
}

/// Current map view: bounding box plus integer zoom level. Read-only input
/// derived from the map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: GeoBounds,
    pub zoom: u8,
}
