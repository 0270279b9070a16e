use serde::{Deserialize, Serialize};

use crate::colors::{Gradient, PRECIPITATION_GRADIENT, SUNSHINE_GRADIENT, TEMPERATURE_GRADIENT};
use crate::geo::{GRID_STALE_TOLERANCE_DEG, HEATMAP_STALE_TOLERANCE_DEG};
use crate::region::RegionProperties;

/// Raw variables served by `/api/grid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVariable {
    Tmin,
    Tmax,
    Prec,
    Sunhours,
}

impl ApiVariable {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVariable::Tmin => "tmin",
            ApiVariable::Tmax => "tmax",
            ApiVariable::Prec => "prec",
            ApiVariable::Sunhours => "sunhours",
        }
    }
}

/// A displayable climate variable. Temperature is derived: the mean of a
/// tmin+tmax fetch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateVariable {
    Temperature,
    Precipitation,
    Sunshine,
}

impl ClimateVariable {
    pub fn gradient(self) -> Gradient {
        match self {
            ClimateVariable::Temperature => TEMPERATURE_GRADIENT,
            ClimateVariable::Precipitation => PRECIPITATION_GRADIENT,
            ClimateVariable::Sunshine => SUNSHINE_GRADIENT,
        }
    }
}

/// Which per-region statistic the choropleth paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionStatistic {
    Temperature,
    Rainfall,
    Sunshine,
    Overall,
}

impl RegionStatistic {
    /// Query-parameter name on the region endpoints.
    pub fn api_name(self) -> &'static str {
        match self {
            RegionStatistic::Temperature => "temperature",
            RegionStatistic::Rainfall => "rainfall",
            RegionStatistic::Sunshine => "sunshine",
            RegionStatistic::Overall => "overall",
        }
    }

    /// The region field this statistic reads. `Overall` has no single field;
    /// it classifies all three means against the preference profile.
    pub fn field_value(self, props: &RegionProperties) -> Option<f64> {
        match self {
            RegionStatistic::Temperature => props.temp_avg,
            RegionStatistic::Rainfall => props.prec_mean,
            RegionStatistic::Sunshine => props.sunhours_mean,
            RegionStatistic::Overall => None,
        }
    }

    pub fn gradient(self) -> Option<Gradient> {
        match self {
            RegionStatistic::Temperature => Some(TEMPERATURE_GRADIENT),
            RegionStatistic::Rainfall => Some(PRECIPITATION_GRADIENT),
            RegionStatistic::Sunshine => Some(SUNSHINE_GRADIENT),
            RegionStatistic::Overall => None,
        }
    }
}

/// What the active overlay shows. One closed enum so every refresh path is
/// matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Raw grid heatmap of one variable.
    Heatmap(ClimateVariable),
    /// Preference-match classification over the grid (composite).
    Overall,
    /// Country/province choropleth of one statistic.
    Regions(RegionStatistic),
}

impl DisplayMode {
    pub fn uses_grid(self) -> bool {
        matches!(self, DisplayMode::Heatmap(_) | DisplayMode::Overall)
    }

    /// Per-edge viewport drift beyond which a completed fetch for this mode
    /// is stale.
    pub fn staleness_tolerance(self) -> f64 {
        match self {
            DisplayMode::Heatmap(_) => HEATMAP_STALE_TOLERANCE_DEG,
            DisplayMode::Overall | DisplayMode::Regions(_) => GRID_STALE_TOLERANCE_DEG,
        }
    }
}
