use serde::{Deserialize, Serialize};

/// Spatial aggregation level of a region layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Country,
    Province,
}

impl Granularity {
    /// `layer` query-parameter value on `/api/combined`.
    pub fn layer_name(self) -> &'static str {
        match self {
            Granularity::Country => "countries",
            Granularity::Province => "provinces",
        }
    }
}

/// Countries below this zoom; provinces from it upward. Countries are
/// coarser and cheaper while the viewport spans continents; provinces only
/// once polygon count per screen pixel stays bounded.
const PROVINCE_ZOOM: u8 = 5;

pub fn granularity(zoom: u8) -> Granularity {
    if zoom < PROVINCE_ZOOM {
        Granularity::Country
    } else {
        Granularity::Province
    }
}

/// Samples per axis requested from `/api/grid`. A tuning ladder, not a
/// correctness invariant, but it must never decrease with zoom: coarse
/// sampling bounds payload size zoomed out, fine sampling bounds blockiness
/// zoomed in.
pub fn sample_resolution(zoom: u8) -> u32 {
    match zoom {
        0..=3 => 30,
        4..=5 => 50,
        6..=7 => 80,
        _ => 120,
    }
}
